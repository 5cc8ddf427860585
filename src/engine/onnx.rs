use super::{rank_top_k, ConditionModel, LabelClassifier, LabelScore, ModelDiag, TensorLayout};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use std::path::Path;
use tracing::{debug, info, warn};
use tract_onnx::prelude::*;

/// Bicubic, matching the preprocessing the models were trained with.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

type Plan = TypedRunnableModel<TypedModel>;

/// MobileNetV2-style ImageNet classifier loaded from an ONNX export.
pub struct OnnxLabelClassifier {
    plan: Plan,
    labels: Vec<String>,
    input_size: u32,
    layout: TensorLayout,
}

impl OnnxLabelClassifier {
    pub fn new(cfg: &Config) -> Result<Self> {
        let layout = parse_layout(&cfg.models.layout)?;
        let input_size = cfg.models.input_size;
        let plan = load_plan(Path::new(&cfg.models.classifier_path), input_size, layout)?;
        let labels = load_labels(Path::new(&cfg.models.labels_path))?;
        info!(
            "label classifier loaded: {} ({} labels)",
            cfg.models.classifier_path,
            labels.len()
        );
        Ok(Self {
            plan,
            labels,
            input_size,
            layout,
        })
    }
}

impl LabelClassifier for OnnxLabelClassifier {
    fn classify(&self, image: &RgbImage, top_k: usize) -> Result<Vec<LabelScore>> {
        // MobileNetV2 expects inputs scaled to [-1, 1].
        let input = image_tensor(image, self.input_size, self.layout, |v| {
            f32::from(v) / 127.5 - 1.0
        });
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| anyhow!("classifier inference failed: {e}"))?;
        let first = outputs
            .first()
            .ok_or_else(|| anyhow!("classifier produced no outputs"))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| anyhow!("classifier output is not f32: {e}"))?;
        let mut probs: Vec<f32> = view.iter().copied().collect();

        // Some exports carry a leading background class.
        if probs.len() == self.labels.len() + 1 {
            probs.remove(0);
        }
        if probs.len() != self.labels.len() {
            return Err(anyhow!(
                "classifier output has {} classes but labels file has {}",
                probs.len(),
                self.labels.len()
            ));
        }

        let ranked = rank_top_k(&probs, &self.labels, top_k);
        debug!(?ranked, "classifier top-k");
        Ok(ranked)
    }
}

/// Binary condition classifier with a single sigmoid output.
pub struct OnnxConditionModel {
    plan: Plan,
    input_size: u32,
    layout: TensorLayout,
}

impl OnnxConditionModel {
    pub fn new(cfg: &Config) -> Result<Self> {
        let layout = parse_layout(&cfg.models.layout)?;
        let input_size = cfg.models.input_size;
        let plan = load_plan(Path::new(&cfg.models.condition_model_path), input_size, layout)?;
        info!("condition model loaded: {}", cfg.models.condition_model_path);
        Ok(Self {
            plan,
            input_size,
            layout,
        })
    }

    /// Loads the condition model if one is configured. Load failures are
    /// logged and yield `None` so scoring can run degraded.
    pub fn try_load(cfg: &Config) -> Option<Self> {
        if cfg.models.condition_model_path.is_empty() {
            warn!("no condition model configured");
            return None;
        }
        match Self::new(cfg) {
            Ok(model) => Some(model),
            Err(err) => {
                warn!("condition model unavailable: {:#}", err);
                None
            }
        }
    }
}

impl ConditionModel for OnnxConditionModel {
    fn predict(&self, image: &RgbImage) -> Result<f32> {
        let input = image_tensor(image, self.input_size, self.layout, |v| f32::from(v) / 255.0);
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| anyhow!("condition inference failed: {e}"))?;
        let first = outputs
            .first()
            .ok_or_else(|| anyhow!("condition model produced no outputs"))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| anyhow!("condition output is not f32: {e}"))?;
        view.iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow!("condition model output is empty"))
    }
}

/// Reports whether each configured model loads.
pub fn doctor(cfg: &Config) -> Vec<ModelDiag> {
    let classifier = OnnxLabelClassifier::new(cfg).err();
    let condition = if cfg.models.condition_model_path.is_empty() {
        Some(anyhow!("not configured"))
    } else {
        OnnxConditionModel::new(cfg).err()
    };

    vec![
        ModelDiag {
            name: "label_classifier".into(),
            path: cfg.models.classifier_path.clone(),
            ok: classifier.is_none(),
            error: classifier.map(|e| format!("{e:#}")),
        },
        ModelDiag {
            name: "condition_model".into(),
            path: cfg.models.condition_model_path.clone(),
            ok: condition.is_none(),
            error: condition.map(|e| format!("{e:#}")),
        },
    ]
}

fn parse_layout(s: &str) -> Result<TensorLayout> {
    TensorLayout::parse(s).ok_or_else(|| anyhow!("unknown models.layout: {s}"))
}

fn load_plan(path: &Path, size: u32, layout: TensorLayout) -> Result<Plan> {
    if !path.exists() {
        return Err(anyhow!("model file not found: {}", path.display()));
    }
    let side = size as usize;
    let shape = match layout {
        TensorLayout::Nhwc => [1, side, side, 3],
        TensorLayout::Nchw => [1, 3, side, side],
    };
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|m| m.with_input_fact(0, f32::fact(shape).into()))
        .and_then(|m| m.into_optimized())
        .and_then(|m| m.into_runnable())
        .map_err(|e| anyhow!("loading model {}: {e}", path.display()))
}

fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading labels: {}", path.display()))?;
    let labels: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return Err(anyhow!("labels file is empty: {}", path.display()));
    }
    Ok(labels)
}

/// Resizes to `size`×`size` and packs a batch-of-one f32 tensor.
fn image_tensor(
    image: &RgbImage,
    size: u32,
    layout: TensorLayout,
    normalize: impl Fn(u8) -> f32,
) -> Tensor {
    let resized = image::imageops::resize(image, size, size, RESIZE_FILTER);
    let side = size as usize;
    let array = match layout {
        TensorLayout::Nhwc => {
            tract_ndarray::Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
                normalize(resized[(x as u32, y as u32)][c])
            })
        }
        TensorLayout::Nchw => {
            tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
                normalize(resized[(x as u32, y as u32)][c])
            })
        }
    };
    array.into()
}
