use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural bucket a photograph's score is aggregated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Roof,
    Wall,
    Door,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Roof => "roof",
            Component::Wall => "wall",
            Component::Door => "door",
        })
    }
}

/// What the label search found, before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detected {
    Roof,
    Door,
    Window,
    Wall,
}

impl Detected {
    /// Windows have no bucket of their own and are scored with walls.
    pub fn bucket(self) -> Component {
        match self {
            Detected::Roof => Component::Roof,
            Detected::Door => Component::Door,
            Detected::Window | Detected::Wall => Component::Wall,
        }
    }
}

const ROOF_KEYWORDS: [&str; 3] = ["roof", "thatch", "tile"];

/// Searches the joined labels for roof, then door, then window keywords.
pub fn detect<S: AsRef<str>>(labels: &[S]) -> Detected {
    let joined = labels
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if ROOF_KEYWORDS.iter().any(|k| joined.contains(k)) {
        Detected::Roof
    } else if joined.contains("door") {
        Detected::Door
    } else if joined.contains("window") {
        Detected::Window
    } else {
        Detected::Wall
    }
}

pub fn tag<S: AsRef<str>>(labels: &[S]) -> Component {
    detect(labels).bucket()
}
