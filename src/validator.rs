use crate::{
    config::Config,
    engine::{LabelClassifier, LabelScore},
    policy::{self, HouseDecision},
};
use anyhow::{Context, Result};
use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

/// Runs the general classifier and applies the keyword policy to its top-k.
#[derive(Clone)]
pub struct HouseValidator {
    cfg: Config,
    classifier: Arc<dyn LabelClassifier>,
}

pub struct ValidationResult {
    pub decision: HouseDecision,
    pub predictions: Vec<LabelScore>,
}

impl HouseValidator {
    pub fn new(cfg: &Config, classifier: Arc<dyn LabelClassifier>) -> Self {
        Self {
            cfg: cfg.clone(),
            classifier,
        }
    }

    pub fn validate(&self, image: &RgbImage) -> Result<ValidationResult> {
        let predictions = self
            .classifier
            .classify(image, self.cfg.models.top_k)
            .with_context(|| "label classification failed")?;
        let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
        let decision = policy::decide(&self.cfg, &labels);
        debug!(
            verdict = ?decision.verdict,
            matched = ?decision.matched,
            "house validation"
        );
        Ok(ValidationResult {
            decision,
            predictions,
        })
    }
}
