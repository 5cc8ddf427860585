use crate::component::Component;
use serde::{Deserialize, Serialize};

/// Per-component score lists accumulated over one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub roof: Vec<u8>,
    pub wall: Vec<u8>,
    pub door: Vec<u8>,
}

impl ComponentScores {
    pub fn push(&mut self, component: Component, score: u8) {
        match component {
            Component::Roof => self.roof.push(score),
            Component::Wall => self.wall.push(score),
            Component::Door => self.door.push(score),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roof.is_empty() && self.wall.is_empty() && self.door.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Severity::Excellent,
            60..=79 => Severity::Good,
            40..=59 => Severity::Fair,
            _ => Severity::Poor,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Severity::Excellent => {
                "The structure appears to be in Excellent condition. No significant structural defects, cracks, or weathering were detected. The walls and roof appear intact and stable."
            }
            Severity::Good => {
                "The structure is in Good condition. Minor signs of wear or weathering may be present, but the structural integrity appears sound. Routine maintenance is recommended."
            }
            Severity::Fair => {
                "The structure is in Average/Fair condition. There are visible signs of degradation, potential surface cracks, or material fatigue. Immediate inspection is advised to prevent further damage."
            }
            Severity::Poor => {
                "The structure appears to be in Poor/Damaged condition. Significant defects, cracks, or collapse risks were detected. Urgent structural intervention or reconstruction may be required."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub overall: u8,
    pub roof: Option<u8>,
    pub wall: Option<u8>,
    pub door: Option<u8>,
    pub severity: Severity,
    pub description: String,
}

/// Truncated integer mean; `None` for an empty list.
pub fn mean_trunc(scores: &[u8]) -> Option<u8> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    Some((sum / scores.len() as u32) as u8)
}

/// Averages each bucket, then averages the buckets that have a value.
/// With no scored bucket at all the overall score is 0.
pub fn aggregate(scores: &ComponentScores) -> Aggregate {
    let roof = mean_trunc(&scores.roof);
    let wall = mean_trunc(&scores.wall);
    let door = mean_trunc(&scores.door);

    let present: Vec<u8> = [roof, wall, door].into_iter().flatten().collect();
    let overall = mean_trunc(&present).unwrap_or(0);
    let severity = Severity::from_score(overall);

    Aggregate {
        overall,
        roof,
        wall,
        door,
        severity,
        description: severity.description().to_string(),
    }
}
