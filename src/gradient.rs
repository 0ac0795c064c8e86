//! Plain gradient-descent weight model.
//!
//! Each accepted update moves every touched parameter by `learning_rate · gradient`:
//!
//! ```text
//! weight[m]         += lr · error · count[m]      clamp [0.1, 100]
//! complexity_weight += lr · error · complexity    clamp [0.1, 10]
//! ```
//!
//! No momentum; the weight map is the only state.

use core::fmt::Write as _;

use hashbrown::HashMap;

use crate::factory::ModelKind;
use crate::model::{
    clamp_complexity_weight, clamp_weight, effective_error, predict, sorted_weights, WeightModel,
    DEFAULT_COMPLEXITY_WEIGHT, DEFAULT_WEIGHT,
};
use crate::resolver::MaterialCounts;

/// Stateless-step gradient descent over per-material weights.
#[derive(Clone, Debug)]
pub struct GradientDescentModel {
    weights: HashMap<String, f64>,
    complexity_weight: f64,
    learning_rate: f64,
}

impl GradientDescentModel {
    /// Construct an empty model.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            weights: HashMap::new(),
            complexity_weight: DEFAULT_COMPLEXITY_WEIGHT,
            learning_rate,
        }
    }

    /// Iterate over registered (material, weight) pairs (unordered).
    pub fn weights(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(m, &w)| (m.as_str(), w))
    }
}

impl WeightModel for GradientDescentModel {
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

        for (material, &count) in materials {
            let weight = self
                .weights
                .entry(material.clone())
                .or_insert(DEFAULT_WEIGHT);
            *weight = clamp_weight(*weight + learning_rate * error * count as f64);
        }

        let gradient = error * f64::from(complexity);
        self.complexity_weight =
            clamp_complexity_weight(self.complexity_weight + learning_rate * gradient);
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
        ModelKind::Gradient
    }

    fn describe_weights(&self) -> String {
        let mut out = String::from("Material Weights:\n");
        for (material, weight) in sorted_weights(&self.weights) {
            let _ = writeln!(out, "  {material}: {weight:.4}");
        }
        let _ = write!(out, "Complexity Weight: {:.4}", self.complexity_weight);
        out
    }
}
