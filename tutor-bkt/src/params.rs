//! Model parameters.

use serde::{Deserialize, Serialize};

/// The four BKT parameters. Immutable for the duration of a calculation.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BktParameters {
    /// P(L0): prior probability the concept is already known.
    pub p_l0: f64,
    /// P(T): probability of learning the concept at each practice opportunity.
    pub p_t: f64,
    /// P(S): probability of answering wrong despite knowing the concept.
    pub p_s: f64,
    /// P(G): probability of answering right without knowing the concept.
    pub p_g: f64,
}

/// Default parameters: pL0 = 0.10, pT = 0.15, pS = 0.10, pG = 0.25.
pub const DEFAULT_BKT_PARAMS: BktParameters =
    BktParameters { p_l0: 0.10, p_t: 0.15, p_s: 0.10, p_g: 0.25 };

impl Default for BktParameters {
    fn default() -> Self {
        DEFAULT_BKT_PARAMS
    }
}
