//! The belief update and its forward prediction.

use crate::knowledge::StudentKnowledge;
use crate::params::BktParameters;

/// Update P(Ln) after one observed answer.
///
/// Two steps, in this order:
///
/// 1. Condition on the evidence:
///    - correct: `p(1−S) / [p(1−S) + (1−p)G]`
///    - incorrect: `pS / [pS + (1−p)(1−G)]`
/// 2. Apply the learning opportunity: `e + (1−e)T`.
///
/// The result is clamped to `[0, 1]`. An observation with zero likelihood
/// under the parameters (zero denominator) leaves the belief unchanged
/// before the learning step.
pub fn update_knowledge(p_ln: f64, is_correct: bool, params: &BktParameters) -> f64 {
    let (numerator, denominator) = if is_correct {
        let known = p_ln * (1.0 - params.p_s);
        (known, known + (1.0 - p_ln) * params.p_g)
    } else {
        let known = p_ln * params.p_s;
        (known, known + (1.0 - p_ln) * (1.0 - params.p_g))
    };

    let p_evidence = if denominator == 0.0 { p_ln } else { numerator / denominator };
    clamp_probability(p_evidence + (1.0 - p_evidence) * params.p_t)
}

/// Probability of a correct answer on the next attempt: `p(1−S) + (1−p)G`.
pub fn predict_correctness(knowledge: &StudentKnowledge, params: &BktParameters) -> f64 {
    let p_ln = knowledge.p_ln;
    clamp_probability(p_ln * (1.0 - params.p_s) + (1.0 - p_ln) * params.p_g)
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
