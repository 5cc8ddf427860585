use crate::engine::ConditionModel;
use anyhow::{Context, Result};
use image::RgbImage;
use std::sync::Arc;
use tracing::warn;

/// Maps the condition model's probability to a 0..=100 score.
///
/// Without a model every image scores 0. Higher probability means better
/// condition; that polarity comes from how the model was trained.
#[derive(Clone)]
pub struct DamageScorer {
    model: Option<Arc<dyn ConditionModel>>,
}

impl DamageScorer {
    pub fn new(model: Option<Arc<dyn ConditionModel>>) -> Self {
        if model.is_none() {
            warn!("condition model missing; all images will score 0");
        }
        Self { model }
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    pub fn score(&self, image: &RgbImage) -> Result<u8> {
        let Some(model) = &self.model else {
            return Ok(0);
        };
        let p = model
            .predict(image)
            .with_context(|| "condition scoring failed")?;
        Ok(probability_to_score(p))
    }
}

/// `trunc(p * 100)` clamped to 0..=100; non-finite input scores 0.
pub fn probability_to_score(p: f32) -> u8 {
    if !p.is_finite() {
        return 0;
    }
    (p * 100.0).clamp(0.0, 100.0).trunc() as u8
}
