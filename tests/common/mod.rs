#![allow(dead_code)]

use anyhow::{anyhow, Result};
use graminscore::{
    config::Config,
    engine::{ConditionModel, LabelClassifier, LabelScore},
    pipeline::Pipeline,
    scorer::DamageScorer,
    validator::HouseValidator,
};
use image::{ImageOutputFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// Returns canned labels keyed by the red channel of the top-left pixel.
pub struct KeyedClassifier {
    pub by_red: HashMap<u8, Vec<&'static str>>,
}

impl KeyedClassifier {
    pub fn new(entries: &[(u8, [&'static str; 5])]) -> Self {
        Self {
            by_red: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
        }
    }
}

impl LabelClassifier for KeyedClassifier {
    fn classify(&self, image: &RgbImage, top_k: usize) -> Result<Vec<LabelScore>> {
        let key = image.get_pixel(0, 0).0[0];
        let labels = self
            .by_red
            .get(&key)
            .ok_or_else(|| anyhow!("no canned labels for red={key}"))?;
        Ok(labels
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, l)| LabelScore::new(*l, 0.5 / (i as f32 + 1.0)))
            .collect())
    }
}

/// Condition probability keyed the same way, with a fallback.
pub struct KeyedCondition {
    pub by_red: HashMap<u8, f32>,
    pub fallback: f32,
}

impl KeyedCondition {
    pub fn constant(p: f32) -> Self {
        Self {
            by_red: HashMap::new(),
            fallback: p,
        }
    }

    pub fn keyed(entries: &[(u8, f32)]) -> Self {
        Self {
            by_red: entries.iter().copied().collect(),
            fallback: 0.0,
        }
    }
}

impl ConditionModel for KeyedCondition {
    fn predict(&self, image: &RgbImage) -> Result<f32> {
        let key = image.get_pixel(0, 0).0[0];
        Ok(self.by_red.get(&key).copied().unwrap_or(self.fallback))
    }
}

pub fn png_bytes(red: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 6, Rgb([red, 120, 90]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub const HOUSE_ROOF: [&str; 5] = ["house", "roof", "door", "sky", "cloud"];
pub const CAT: [&str; 5] = ["cat", "animal", "pet", "fur", "whiskers"];
pub const STONE_WALL: [&str; 5] = ["stone_wall", "cliff", "valley", "alp", "lakeside"];

pub fn pipeline(
    cfg: &Config,
    classifier: KeyedClassifier,
    condition: Option<KeyedCondition>,
) -> Pipeline {
    let condition = condition.map(|c| Arc::new(c) as Arc<dyn ConditionModel>);
    Pipeline::new(
        cfg,
        HouseValidator::new(cfg, Arc::new(classifier)),
        DamageScorer::new(condition),
    )
}
