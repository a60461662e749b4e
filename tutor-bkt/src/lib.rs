//! # tutor-bkt
//!
//! Bayesian Knowledge Tracing for per-concept mastery.
//!
//! Each learner/concept pair carries a [`StudentKnowledge`] record holding
//! P(Ln), the probability the concept is known. Every answer runs through
//! [`update_knowledge`]: the belief is first conditioned on the observation
//! using the slip and guess rates, then the learning rate is applied. From
//! P(Ln) the crate derives mastery, question difficulty, the next review date
//! and learner-facing insights.
//!
//! All functions are pure; persisting the returned state is up to the caller.
//! Two concurrent updates for the same learner and concept will race and the
//! last write wins.
//!
//! ```
//! use tutor_bkt::{DEFAULT_BKT_PARAMS, Difficulty, initialize_knowledge, record_answer, recommended_difficulty};
//!
//! let k = initialize_knowledge("expected-value", &DEFAULT_BKT_PARAMS);
//! let k = record_answer(&k, true, &DEFAULT_BKT_PARAMS);
//! assert!((k.p_ln - 0.393).abs() < 1e-3);
//! assert_eq!(recommended_difficulty(&k), Difficulty::Medium);
//! ```

pub mod knowledge;
pub mod mastery;
pub mod params;
pub mod schedule;
pub mod update;

pub use knowledge::{
    StudentKnowledge, initialize_knowledge, initialize_knowledge_at, record_answer, record_answer_at,
    replay_answers,
};
pub use mastery::{
    DEFAULT_MASTERY_THRESHOLD, Difficulty, LearningInsights, LearningStatus, MIN_MASTERY_ATTEMPTS,
    has_mastered, learning_insights, learning_insights_with, recommended_difficulty,
};
pub use params::{BktParameters, DEFAULT_BKT_PARAMS};
pub use schedule::{
    MAX_REVIEW_INTERVAL_DAYS, is_due_for_review, next_review_date, next_review_date_from,
    review_interval_days,
};
pub use update::{predict_correctness, update_knowledge};
