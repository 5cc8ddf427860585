pub mod onnx;
pub mod types;

use anyhow::Result;
use image::RgbImage;

pub use types::{LabelScore, ModelDiag, TensorLayout};

/// General-purpose image classifier (ImageNet label space).
pub trait LabelClassifier: Send + Sync {
    /// Returns the `top_k` predictions in descending confidence. Ties keep
    /// the model's output order.
    fn classify(&self, image: &RgbImage, top_k: usize) -> Result<Vec<LabelScore>>;
}

/// Binary house-condition classifier producing a single probability.
pub trait ConditionModel: Send + Sync {
    fn predict(&self, image: &RgbImage) -> Result<f32>;
}

/// Selects the `top_k` highest entries, stable with respect to index order.
pub fn rank_top_k(probs: &[f32], labels: &[String], top_k: usize) -> Vec<LabelScore> {
    let mut idx: Vec<usize> = (0..probs.len().min(labels.len())).collect();
    idx.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    idx.into_iter()
        .take(top_k)
        .map(|i| LabelScore::new(labels[i].clone(), probs[i]))
        .collect()
}
