use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub models: Models,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub uploads: Uploads,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub bind_addr: String,
    pub max_body_bytes: usize,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Models {
    pub classifier_path: String,
    pub labels_path: String,
    /// Empty disables condition scoring (every image scores 0).
    pub condition_model_path: String,
    pub input_size: u32,
    pub top_k: usize,
    /// "nhwc" (Keras export) or "nchw".
    pub layout: String,
}
impl Default for Models {
    fn default() -> Self {
        Self {
            classifier_path: "models/mobilenet_v2.onnx".into(),
            labels_path: "models/imagenet_labels.txt".into(),
            condition_model_path: "models/house_condition.onnx".into(),
            input_size: 224,
            top_k: 5,
            layout: "nhwc".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub reject_keywords: Vec<String>,
    pub house_keywords: Vec<String>,
    pub component_keywords: Vec<String>,
}
impl Default for Validation {
    fn default() -> Self {
        Self {
            reject_keywords: to_strings(&[
                "person", "man", "woman", "face", "dog", "cat", "car", "truck", "food", "text",
                "pattern",
            ]),
            house_keywords: to_strings(&[
                "house",
                "home",
                "building",
                "hut",
                "bungalow",
                "cottage",
                "barn",
                "thatch",
                "ruins",
                "monastery",
                "castle",
            ]),
            component_keywords: to_strings(&["roof", "door", "window", "wall", "patio", "lumber"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Uploads {
    pub allowed_extensions: Vec<String>,
    pub max_file_bytes: u64,
}
impl Default for Uploads {
    fn default() -> Self {
        Self {
            allowed_extensions: to_strings(&["jpg", "jpeg", "png", "webp"]),
            max_file_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub image_max_width: f32,
    pub image_max_height: f32,
    pub wrap_chars: usize,
    pub pdf_filename: String,
    pub write_json: bool,
    pub json_filename: String,
}
impl Default for Report {
    fn default() -> Self {
        Self {
            title: "GraminScore Analysis Report".into(),
            image_max_width: 400.0,
            image_max_height: 300.0,
            wrap_chars: 80,
            pdf_filename: "report.pdf".into(),
            write_json: true,
            json_filename: "report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Debug {
    pub dump_effective_config: bool,
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}
