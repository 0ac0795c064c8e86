//! The weight-model capability shared by every optimiser.
//!
//! A model holds one scalar weight per base material plus a single complexity
//! weight, and predicts
//!
//! ```text
//! weight(item) = (Σ weight[m] · count[m]) · (1 + complexity_weight · complexity)
//! ```
//!
//! # Invariants
//!
//! - Material weights stay in [`WEIGHT_MIN`, `WEIGHT_MAX`] = [0.1, 100.0].
//! - The complexity weight stays in [`COMPLEXITY_WEIGHT_MIN`, `COMPLEXITY_WEIGHT_MAX`] = [0.1, 10.0].
//! - Unknown materials predict with [`DEFAULT_WEIGHT`] and never fail.
//! - Errors beyond ±[`MAX_ERROR`] are clamped; errors below [`MIN_ERROR`] in
//!   magnitude, and non-finite errors, leave the model untouched.
//! - No internal randomness: the same call sequence gives bit-identical state.

use core::fmt;

use hashbrown::HashMap;

use crate::factory::ModelKind;
use crate::resolver::MaterialCounts;

/// Weight assigned to a material on first touch.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Initial complexity weight.
pub const DEFAULT_COMPLEXITY_WEIGHT: f64 = 1.0;
/// Lower bound for material weights.
pub const WEIGHT_MIN: f64 = 0.1;
/// Upper bound for material weights.
pub const WEIGHT_MAX: f64 = 100.0;
/// Lower bound for the complexity weight.
pub const COMPLEXITY_WEIGHT_MIN: f64 = 0.1;
/// Upper bound for the complexity weight.
pub const COMPLEXITY_WEIGHT_MAX: f64 = 10.0;
/// Error magnitude above which the error is clamped.
pub const MAX_ERROR: f64 = 10.0;
/// Error magnitude below which an update is skipped.
pub const MIN_ERROR: f64 = 1e-8;

/// Online weight predictor. Implemented by
/// [`GradientDescentModel`](crate::gradient::GradientDescentModel) and
/// [`AdamModel`](crate::adam::AdamModel).
pub trait WeightModel: fmt::Debug + Send {
    /// Register `material` at [`DEFAULT_WEIGHT`] if it is not known yet.
    fn initialize_material(&mut self, material: &str);

    /// Predicted weight of an item with the given base materials and recipe depth.
    fn predict_weight(&self, materials: &MaterialCounts, complexity: u32) -> f64;

    /// Apply one optimisation step toward `error = target - prediction`.
    fn update_weights(
        &mut self,
        materials: &MaterialCounts,
        complexity: u32,
        error: f64,
        learning_rate: f64,
    );

    /// Current complexity weight.
    fn complexity_weight(&self) -> f64;

    /// Overwrite the complexity weight, clamped into its bounds.
    fn set_complexity_weight(&mut self, weight: f64);

    /// Current weight of `material`, or [`DEFAULT_WEIGHT`] if unregistered.
    fn weight(&self, material: &str) -> f64;

    /// Number of registered materials.
    fn material_count(&self) -> usize;

    /// Learning rate the model was constructed with.
    fn learning_rate(&self) -> f64;

    /// Which optimiser this is.
    fn kind(&self) -> ModelKind;

    /// Human-readable weight table, materials sorted by descending weight.
    fn describe_weights(&self) -> String;

    /// Print [`describe_weights`](Self::describe_weights) to stdout.
    fn print_weights(&self) {
        println!("{}", self.describe_weights());
    }
}

// ─── Shared helpers ─────────────────────────────────────────────────────────

/// Clamp `error` to ±[`MAX_ERROR`], or `None` if the update should be skipped.
pub(crate) fn effective_error(error: f64) -> Option<f64> {
    if !error.is_finite() {
        return None;
    }
    let error = if error.abs() > MAX_ERROR {
        MAX_ERROR.copysign(error)
    } else {
        error
    };
    if error.abs() < MIN_ERROR {
        None
    } else {
        Some(error)
    }
}

pub(crate) fn clamp_weight(weight: f64) -> f64 {
    weight.clamp(WEIGHT_MIN, WEIGHT_MAX)
}

pub(crate) fn clamp_complexity_weight(weight: f64) -> f64 {
    weight.clamp(COMPLEXITY_WEIGHT_MIN, COMPLEXITY_WEIGHT_MAX)
}

/// The shared prediction formula over a material → weight map.
pub(crate) fn predict(
    weights: &HashMap<String, f64>,
    complexity_weight: f64,
    materials: &MaterialCounts,
    complexity: u32,
) -> f64 {
    let total: f64 = materials
        .iter()
        .map(|(material, &count)| {
            weights.get(material).copied().unwrap_or(DEFAULT_WEIGHT) * count as f64
        })
        .sum();
    total * (1.0 + complexity_weight * f64::from(complexity))
}

/// Weight entries sorted by descending weight, ties broken by name.
pub(crate) fn sorted_weights(weights: &HashMap<String, f64>) -> Vec<(&str, f64)> {
    let mut entries: Vec<(&str, f64)> = weights.iter().map(|(m, &w)| (m.as_str(), w)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_error_clamps_magnitude() {
        assert_eq!(effective_error(25.0), Some(10.0));
        assert_eq!(effective_error(-25.0), Some(-10.0));
        assert_eq!(effective_error(3.5), Some(3.5));
    }

    #[test]
    fn test_effective_error_skips_negligible_and_non_finite() {
        assert_eq!(effective_error(1e-9), None);
        assert_eq!(effective_error(-1e-9), None);
        assert_eq!(effective_error(0.0), None);
        assert_eq!(effective_error(f64::NAN), None);
        assert_eq!(effective_error(f64::INFINITY), None);
    }

    #[test]
    fn test_predict_uses_default_for_unknown() {
        let weights = HashMap::new();
        let mut materials = MaterialCounts::new();
        materials.insert("base:wood".into(), 2);
        assert_eq!(predict(&weights, 1.0, &materials, 0), 2.0);
        // (2 · 1.0) · (1 + 1.0 · 3)
        assert_eq!(predict(&weights, 1.0, &materials, 3), 8.0);
    }

    #[test]
    fn test_sorted_weights_descending() {
        let mut weights = HashMap::new();
        weights.insert("a".to_string(), 1.0);
        weights.insert("b".to_string(), 5.0);
        weights.insert("c".to_string(), 1.0);
        let sorted = sorted_weights(&weights);
        assert_eq!(sorted, vec![("b", 5.0), ("a", 1.0), ("c", 1.0)]);
    }
}
