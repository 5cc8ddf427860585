use serde::{Deserialize, Serialize};

/// One ranked prediction from the general-purpose classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDiag {
    pub name: String,
    pub path: String,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Memory order of the input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

impl TensorLayout {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nhwc" => Some(Self::Nhwc),
            "nchw" => Some(Self::Nchw),
            _ => None,
        }
    }
}
