use serde::{Deserialize, Serialize};

use crate::adaptive::profile::PerformanceProfile;

const RECENCY_PENALTY: f64 = -0.5;
const UNKNOWN_DIFFICULTY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
}

impl QuestionDifficulty {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn scale(self) -> f64 {
        match self {
            Self::Easy => 0.25,
            Self::Medium => 0.5,
            Self::Hard => 0.75,
        }
    }
}

pub fn label_scale(label: Option<&str>) -> f64 {
    label
        .and_then(QuestionDifficulty::parse)
        .map(QuestionDifficulty::scale)
        .unwrap_or(UNKNOWN_DIFFICULTY)
}

/// A question the selector can rank.
pub trait AdaptiveCandidate {
    /// `None` for questions without an identifier; those are never treated as recent.
    fn candidate_id(&self) -> Option<&str>;
    fn difficulty_label(&self) -> Option<&str>;
}

pub fn score_candidate<Q: AdaptiveCandidate>(
    candidate: &Q,
    profile: &PerformanceProfile,
) -> f64 {
    let target = profile.current_difficulty_level;
    let closeness = 1.0 - (label_scale(candidate.difficulty_label()) - target).abs();
    let seen = candidate
        .candidate_id()
        .is_some_and(|id| profile.has_recently_seen(id));
    let penalty = if seen { RECENCY_PENALTY } else { 0.0 };
    closeness + penalty
}

/// Highest-scoring candidate; ties keep the earliest one. `None` on an empty pool.
pub fn select_question<'a, Q: AdaptiveCandidate>(
    profile: &PerformanceProfile,
    pool: &'a [Q],
) -> Option<&'a Q> {
    let mut best: Option<(&'a Q, f64)> = None;
    for candidate in pool {
        let score = score_candidate(candidate, profile);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}
