use crate::config::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// A label matched the acceptance set and none matched the rejection set.
    House,
    /// A label matched the rejection set. Wins over any acceptance match.
    Rejected,
    /// No label matched either set.
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseDecision {
    pub verdict: Verdict,
    pub is_house: bool,
    /// Lowercased top-k labels in classifier order.
    pub labels: Vec<String>,
    /// First `(label, keyword)` pair that decided the verdict.
    pub matched: Option<(String, String)>,
}

impl HouseDecision {
    /// Label shown to the user when the image is skipped.
    pub fn top_label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("Unknown")
    }
}

/// Applies the keyword rule table to the classifier's labels.
///
/// Matching is a case-insensitive substring test, so `carport` hits `car`
/// in the rejection set. Rejection rules are evaluated before acceptance
/// rules over the whole label list.
pub fn decide<S: AsRef<str>>(cfg: &Config, labels: &[S]) -> HouseDecision {
    let labels: Vec<String> = labels.iter().map(|l| l.as_ref().to_lowercase()).collect();
    let v = &cfg.validation;

    if let Some(hit) = first_match(&labels, &v.reject_keywords) {
        return HouseDecision {
            verdict: Verdict::Rejected,
            is_house: false,
            labels,
            matched: Some(hit),
        };
    }

    let accept = v.house_keywords.iter().chain(v.component_keywords.iter());
    let accept: Vec<&String> = accept.collect();
    if let Some(hit) = first_match(&labels, &accept) {
        return HouseDecision {
            verdict: Verdict::House,
            is_house: true,
            labels,
            matched: Some(hit),
        };
    }

    HouseDecision {
        verdict: Verdict::Unknown,
        is_house: false,
        labels,
        matched: None,
    }
}

fn first_match<K: AsRef<str>>(labels: &[String], keywords: &[K]) -> Option<(String, String)> {
    labels.iter().find_map(|label| {
        keywords
            .iter()
            .map(|k| k.as_ref())
            .find(|k| !k.is_empty() && label.contains(&k.to_lowercase()))
            .map(|k| (label.clone(), k.to_string()))
    })
}
