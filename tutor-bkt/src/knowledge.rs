//! Per-learner, per-concept knowledge state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::params::BktParameters;
use crate::update::update_knowledge;

/// What the engine believes about one learner's grasp of one concept.
///
/// Serialized with camelCase field names so records round-trip through the
/// knowledge-state table unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentKnowledge {
    pub concept_id: String,
    /// Current P(Ln), always in `[0, 1]`.
    pub p_ln: f64,
    pub attempts: u32,
    /// Never exceeds `attempts`.
    pub correct_answers: u32,
    pub last_updated: DateTime<Utc>,
}

impl StudentKnowledge {
    /// Fraction of attempts answered correctly, 0 when there are none.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.attempts)
        }
    }
}

/// Fresh state for a concept the learner has never practiced.
pub fn initialize_knowledge(concept_id: impl Into<String>, params: &BktParameters) -> StudentKnowledge {
    initialize_knowledge_at(concept_id, params, Utc::now())
}

/// [`initialize_knowledge`] with an explicit timestamp.
pub fn initialize_knowledge_at(
    concept_id: impl Into<String>,
    params: &BktParameters,
    now: DateTime<Utc>,
) -> StudentKnowledge {
    StudentKnowledge {
        concept_id: concept_id.into(),
        p_ln: params.p_l0,
        attempts: 0,
        correct_answers: 0,
        last_updated: now,
    }
}

/// Fold one answer into the state, returning a new value. The input is not
/// modified.
pub fn record_answer(
    current: &StudentKnowledge,
    is_correct: bool,
    params: &BktParameters,
) -> StudentKnowledge {
    record_answer_at(current, is_correct, params, Utc::now())
}

/// [`record_answer`] with an explicit timestamp.
pub fn record_answer_at(
    current: &StudentKnowledge,
    is_correct: bool,
    params: &BktParameters,
    now: DateTime<Utc>,
) -> StudentKnowledge {
    let p_ln = update_knowledge(current.p_ln, is_correct, params);
    debug!(
        concept_id = %current.concept_id,
        is_correct,
        previous = current.p_ln,
        updated = p_ln,
        "recorded answer"
    );

    StudentKnowledge {
        concept_id: current.concept_id.clone(),
        p_ln,
        attempts: current.attempts.saturating_add(1),
        correct_answers: current.correct_answers.saturating_add(u32::from(is_correct)),
        last_updated: now,
    }
}

/// Rebuild a learner's state from an answer history, oldest first.
pub fn replay_answers<I>(concept_id: impl Into<String>, answers: I, params: &BktParameters) -> StudentKnowledge
where
    I: IntoIterator<Item = bool>,
{
    let now = Utc::now();
    answers
        .into_iter()
        .fold(initialize_knowledge_at(concept_id, params, now), |knowledge, is_correct| {
            record_answer_at(&knowledge, is_correct, params, now)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_BKT_PARAMS;
    use chrono::TimeZone;

    #[test]
    fn initializes_from_prior() {
        let k = initialize_knowledge("pot-odds", &DEFAULT_BKT_PARAMS);
        assert_eq!(k.concept_id, "pot-odds");
        assert_eq!(k.p_ln, 0.10);
        assert_eq!(k.attempts, 0);
        assert_eq!(k.correct_answers, 0);
        assert_eq!(k.accuracy(), 0.0);
    }

    #[test]
    fn records_answer_without_mutating_input() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let k = initialize_knowledge_at("ev", &DEFAULT_BKT_PARAMS, start);

        let next = record_answer_at(&k, true, &DEFAULT_BKT_PARAMS, later);

        assert_eq!(k.attempts, 0);
        assert_eq!(k.last_updated, start);
        assert_eq!(next.attempts, 1);
        assert_eq!(next.correct_answers, 1);
        assert_eq!(next.last_updated, later);
        assert!((next.p_ln - 0.393).abs() < 1e-3);

        let after_miss = record_answer_at(&next, false, &DEFAULT_BKT_PARAMS, later);
        assert_eq!(after_miss.attempts, 2);
        assert_eq!(after_miss.correct_answers, 1);
        assert!(after_miss.p_ln < next.p_ln);
    }

    #[test]
    fn replay_matches_sequential_updates() {
        let answers = [true, false, true, true];
        let replayed = replay_answers("ev", answers, &DEFAULT_BKT_PARAMS);

        let mut p = DEFAULT_BKT_PARAMS.p_l0;
        for correct in answers {
            p = update_knowledge(p, correct, &DEFAULT_BKT_PARAMS);
        }
        assert_eq!(replayed.p_ln, p);
        assert_eq!(replayed.attempts, 4);
        assert_eq!(replayed.correct_answers, 3);
        assert_eq!(replayed.accuracy(), 0.75);
    }

    #[test]
    fn serializes_with_camel_case() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let k = initialize_knowledge_at("ev", &DEFAULT_BKT_PARAMS, start);
        let value = serde_json::to_value(&k).unwrap();
        assert_eq!(value["conceptId"], "ev");
        assert_eq!(value["pLn"], 0.1);
        assert_eq!(value["correctAnswers"], 0);
        assert!(value["lastUpdated"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));

        let back: StudentKnowledge = serde_json::from_value(value).unwrap();
        assert_eq!(back, k);
    }
}
