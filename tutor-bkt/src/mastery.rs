//! Mastery status, difficulty and learner-facing insights derived from P(Ln).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::knowledge::StudentKnowledge;
use crate::params::{BktParameters, DEFAULT_BKT_PARAMS};

/// P(Ln) at or above which a concept counts as mastered.
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.95;

/// Fewest attempts before a concept can count as mastered.
pub const MIN_MASTERY_ATTEMPTS: u32 = 3;

/// `p_ln >= threshold` and at least [`MIN_MASTERY_ATTEMPTS`] attempts.
pub fn has_mastered(knowledge: &StudentKnowledge, threshold: f64) -> bool {
    knowledge.p_ln >= threshold && knowledge.attempts >= MIN_MASTERY_ATTEMPTS
}

/// Question difficulty to serve next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Below 0.3 easy, below 0.6 medium, below 0.85 hard, otherwise expert.
pub fn recommended_difficulty(knowledge: &StudentKnowledge) -> Difficulty {
    match knowledge.p_ln {
        p if p < 0.3 => Difficulty::Easy,
        p if p < 0.6 => Difficulty::Medium,
        p if p < 0.85 => Difficulty::Hard,
        _ => Difficulty::Expert,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStatus {
    Struggling,
    Learning,
    Proficient,
    Mastered,
}

impl LearningStatus {
    pub fn from_probability(p_ln: f64) -> Self {
        if p_ln >= DEFAULT_MASTERY_THRESHOLD {
            Self::Mastered
        } else if p_ln >= 0.7 {
            Self::Proficient
        } else if p_ln >= 0.3 {
            Self::Learning
        } else {
            Self::Struggling
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Mastered => {
                "Excellent work! You've mastered this concept. Review it occasionally to keep it fresh."
            }
            Self::Proficient => {
                "Good progress! A few more practice questions will take you to mastery."
            }
            Self::Learning => {
                "You're getting there. Keep practicing to strengthen your understanding."
            }
            Self::Struggling => {
                "This concept needs more work. Revisit the fundamentals and try some easier questions."
            }
        }
    }
}

impl fmt::Display for LearningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Struggling => "struggling",
            Self::Learning => "learning",
            Self::Proficient => "proficient",
            Self::Mastered => "mastered",
        };
        f.write_str(s)
    }
}

/// Summary shown to the learner for one concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningInsights {
    pub status: LearningStatus,
    /// The current P(Ln).
    pub confidence: f64,
    pub recommendation: String,
    /// Rough linear estimate, not a projection of the nonlinear update.
    pub estimated_attempts_to_mastery: u32,
}

/// Insights using the default learning rate for the attempts estimate.
pub fn learning_insights(knowledge: &StudentKnowledge) -> LearningInsights {
    learning_insights_with(knowledge, &DEFAULT_BKT_PARAMS)
}

/// Insights estimating attempts to mastery with `params.p_t`. A non-positive
/// learning rate falls back to the default.
pub fn learning_insights_with(knowledge: &StudentKnowledge, params: &BktParameters) -> LearningInsights {
    let status = LearningStatus::from_probability(knowledge.p_ln);
    let rate = if params.p_t > 0.0 { params.p_t } else { DEFAULT_BKT_PARAMS.p_t };
    let remaining = ((DEFAULT_MASTERY_THRESHOLD - knowledge.p_ln) / rate).ceil().max(0.0);

    LearningInsights {
        status,
        confidence: knowledge.p_ln,
        recommendation: status.recommendation().to_string(),
        estimated_attempts_to_mastery: remaining as u32,
    }
}
