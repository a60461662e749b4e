//! Spaced-repetition scheduling.

use chrono::{DateTime, Duration, Utc};

use crate::knowledge::StudentKnowledge;

/// Longest interval between reviews, in days.
pub const MAX_REVIEW_INTERVAL_DAYS: u32 = 30;

/// Days until the next review.
///
/// The ease factor `1.3 + 1.7·p` grows with P(Ln). Learners with at least 90%
/// accuracy over three or more attempts get `ease^(attempts/3)` days. Accuracy
/// of 60% or more gives 2 days, anything lower 1 day. The result is capped at
/// [`MAX_REVIEW_INTERVAL_DAYS`] and rounded up.
pub fn review_interval_days(knowledge: &StudentKnowledge) -> u32 {
    let ease_factor = 1.3 + knowledge.p_ln * 1.7;
    let accuracy = knowledge.accuracy();

    let interval = if accuracy >= 0.9 && knowledge.attempts >= 3 {
        ease_factor.powf(f64::from(knowledge.attempts) / 3.0)
    } else if accuracy >= 0.6 {
        2.0
    } else {
        1.0
    };

    interval.min(f64::from(MAX_REVIEW_INTERVAL_DAYS)).ceil() as u32
}

/// When the concept should next be reviewed, counting from now.
pub fn next_review_date(knowledge: &StudentKnowledge) -> DateTime<Utc> {
    next_review_date_from(knowledge, Utc::now())
}

/// [`next_review_date`] counting from `from`.
pub fn next_review_date_from(knowledge: &StudentKnowledge, from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(i64::from(review_interval_days(knowledge)))
}

/// Whether the review scheduled after the last recorded answer has come due.
pub fn is_due_for_review(knowledge: &StudentKnowledge, now: DateTime<Utc>) -> bool {
    now >= next_review_date_from(knowledge, knowledge.last_updated)
}
