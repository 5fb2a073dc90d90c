//! Arm randomization for new respondents.

use rand::Rng;

use crate::models::Group;

/// Contracted default: 60% of respondents land in the treatment arm.
pub const DEFAULT_TREATMENT_PROBABILITY: f64 = 0.6;

/// Draw an arm with the default treatment probability. Called exactly once
/// per respondent, at session creation.
pub fn assign_group() -> Group {
    assign_group_with(DEFAULT_TREATMENT_PROBABILITY, &mut rand::thread_rng())
}

/// Draw an arm with an explicit probability and RNG. Probabilities outside
/// [0, 1] are clamped.
pub fn assign_group_with<R: Rng + ?Sized>(treatment_probability: f64, rng: &mut R) -> Group {
    if rng.gen_bool(treatment_probability.clamp(0.0, 1.0)) {
        Group::Treatment
    } else {
        Group::Control
    }
}
