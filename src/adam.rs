//! Adam (adaptive moment estimation) weight model.
//!
//! Every material carries its own first and second moment; so does the
//! complexity weight. One step counter `t` is shared by all of them and
//! advances once per accepted update call.
//!
//! ```text
//! g  = error · count             (error · complexity for the complexity term)
//! m  = β1·m + (1−β1)·g
//! v  = β2·v + (1−β2)·g²
//! m̂  = m / (1 − β1^t)
//! v̂  = v / (1 − β2^t)
//! w += lr · m̂ / (√v̂ + ε)
//! ```
//!
//! On the first step `m̂ = g` and `v̂ = g²`, so every touched weight moves by
//! almost exactly `lr · sign(g)` regardless of the gradient's magnitude.

use core::fmt::Write as _;

use hashbrown::HashMap;

use crate::factory::ModelKind;
use crate::model::{
    clamp_complexity_weight, clamp_weight, effective_error, predict, sorted_weights, WeightModel,
    DEFAULT_COMPLEXITY_WEIGHT, DEFAULT_WEIGHT,
};
use crate::resolver::MaterialCounts;

/// Exponential decay rate of the first moment.
pub const BETA1: f64 = 0.9;
/// Exponential decay rate of the second moment.
pub const BETA2: f64 = 0.999;
/// Denominator stabiliser.
pub const EPSILON: f64 = 1e-8;

/// First and second moment estimates for one parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Momentum: running mean of the gradient.
    pub momentum: f64,
    /// Velocity: running mean of the squared gradient.
    pub velocity: f64,
}

impl Moments {
    /// Fold `gradient` into the moments and return the bias-corrected step
    /// direction `m̂ / (√v̂ + ε)`.
    fn step(&mut self, gradient: f64, bias1: f64, bias2: f64) -> f64 {
        self.momentum = BETA1 * self.momentum + (1.0 - BETA1) * gradient;
        self.velocity = BETA2 * self.velocity + (1.0 - BETA2) * gradient * gradient;
        let m_hat = self.momentum / bias1;
        let v_hat = self.velocity / bias2;
        m_hat / (v_hat.sqrt() + EPSILON)
    }
}

/// Adam over per-material weights.
#[derive(Clone, Debug)]
pub struct AdamModel {
    weights: HashMap<String, f64>,
    moments: HashMap<String, Moments>,
    complexity_weight: f64,
    complexity_moments: Moments,
    learning_rate: f64,
    step: u64,
}

impl AdamModel {
    /// Construct an empty model.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            weights: HashMap::new(),
            moments: HashMap::new(),
            complexity_weight: DEFAULT_COMPLEXITY_WEIGHT,
            complexity_moments: Moments::default(),
            learning_rate,
            step: 0,
        }
    }

    /// Number of accepted updates so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Momentum of `material` (0.0 if never updated).
    pub fn momentum(&self, material: &str) -> f64 {
        self.moments.get(material).map_or(0.0, |m| m.momentum)
    }

    /// Velocity of `material` (0.0 if never updated).
    pub fn velocity(&self, material: &str) -> f64 {
        self.moments.get(material).map_or(0.0, |m| m.velocity)
    }

    /// Moments of the complexity weight.
    pub fn complexity_moments(&self) -> Moments {
        self.complexity_moments
    }

    /// Iterate over registered (material, weight) pairs (unordered).
    pub fn weights(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(m, &w)| (m.as_str(), w))
    }

    fn bias_corrections(&self) -> (f64, f64) {
        let t = i32::try_from(self.step).unwrap_or(i32::MAX);
        (1.0 - BETA1.powi(t), 1.0 - BETA2.powi(t))
    }
}

impl WeightModel for AdamModel {
    fn initialize_material(&mut self, material: &str) {
        if !self.weights.contains_key(material) {
            self.weights.insert(material.to_owned(), DEFAULT_WEIGHT);
        }
    }

    fn predict_weight(&self, materials: &MaterialCounts, complexity: u32) -> f64 {
        predict(&self.weights, self.complexity_weight, materials, complexity)
    }

    fn update_weights(
        &mut self,
        materials: &MaterialCounts,
        complexity: u32,
        error: f64,
        learning_rate: f64,
    ) {
        let Some(error) = effective_error(error) else {
            return;
        };

        self.step = self.step.saturating_add(1);
        let (bias1, bias2) = self.bias_corrections();

        for (material, &count) in materials {
            let direction = self
                .moments
                .entry(material.clone())
                .or_default()
                .step(error * count as f64, bias1, bias2);
            let weight = self
                .weights
                .entry(material.clone())
                .or_insert(DEFAULT_WEIGHT);
            *weight = clamp_weight(*weight + learning_rate * direction);
        }

        let direction = self
            .complexity_moments
            .step(error * f64::from(complexity), bias1, bias2);
        self.complexity_weight =
            clamp_complexity_weight(self.complexity_weight + learning_rate * direction);
    }

    fn complexity_weight(&self) -> f64 {
        self.complexity_weight
    }

    fn set_complexity_weight(&mut self, weight: f64) {
        self.complexity_weight = clamp_complexity_weight(weight);
    }

    fn weight(&self, material: &str) -> f64 {
        self.weights.get(material).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    fn material_count(&self) -> usize {
        self.weights.len()
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Adam
    }

    fn describe_weights(&self) -> String {
        let mut out = String::from("Material Weights:\n");
        for (material, weight) in sorted_weights(&self.weights) {
            let _ = writeln!(
                out,
                "  {material}: weight={weight:.4}, momentum={:.4}, velocity={:.4}",
                self.momentum(material),
                self.velocity(material),
            );
        }
        let _ = write!(
            out,
            "Complexity Weight: {:.4} (momentum={:.4}, velocity={:.4})",
            self.complexity_weight, self.complexity_moments.momentum, self.complexity_moments.velocity,
        );
        out
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
