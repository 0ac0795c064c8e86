//! Persisted training state and the trained-weights export.
//!
//! # State file
//!
//! ```json
//! { "model1": { "complexity_weight": 1.25 }, "model2": { "complexity_weight": 0.8 } }
//! ```
//!
//! Only each model's complexity weight is carried across sessions. Material
//! weights and Adam moments start fresh in every process.
//!
//! # Trained-weights export
//!
//! ```json
//! { "base_materials": { "minecraft:oak_log": { "weight": 1.02 } },
//!   "items":          { "minecraft:chest":   { "weight": 11.4 } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::model::WeightModel;

/// Persisted scalar state of one model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ModelState {
    /// The model's complexity weight at capture time.
    pub complexity_weight: f64,
}

impl ModelState {
    /// Capture the persisted fields of `model`.
    pub fn capture(model: &dyn WeightModel) -> Self {
        Self {
            complexity_weight: model.complexity_weight(),
        }
    }

    /// Restore into `model`. The complexity weight is clamped on write.
    pub fn apply(&self, model: &mut dyn WeightModel) {
        model.set_complexity_weight(self.complexity_weight);
    }
}

/// State file contents for the two trained models.
///
/// Both keys are optional on read; a missing key leaves that model untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrainingState {
    /// State of the first (plain-gradient) model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model1: Option<ModelState>,
    /// State of the second (Adam) model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model2: Option<ModelState>,
}

impl TrainingState {
    /// Capture both models.
    pub fn capture(model1: &dyn WeightModel, model2: &dyn WeightModel) -> Self {
        Self {
            model1: Some(ModelState::capture(model1)),
            model2: Some(ModelState::capture(model2)),
        }
    }

    /// Restore whichever models are present in this state.
    pub fn apply(&self, model1: &mut dyn WeightModel, model2: &mut dyn WeightModel) {
        if let Some(state) = &self.model1 {
            state.apply(model1);
        }
        if let Some(state) = &self.model2 {
            state.apply(model2);
        }
    }

    /// Write this state as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        write_json(path.as_ref(), self)
    }

    /// Read a state file. A missing file is `Ok(None)`.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, PersistError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistError::Json {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// One exported weight.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct WeightRecord {
    /// Predicted weight.
    pub weight: f64,
}

/// Exported predictions for every base material and craftable item.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrainedWeights {
    /// Per-unit weight of each base material.
    pub base_materials: BTreeMap<String, WeightRecord>,
    /// Predicted weight of each craftable item.
    pub items: BTreeMap<String, WeightRecord>,
}

impl TrainedWeights {
    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        write_json(path.as_ref(), self)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adam::AdamModel;
    use crate::gradient::GradientDescentModel;

    #[test]
    fn test_state_wire_format() {
        let state = TrainingState {
            model1: Some(ModelState { complexity_weight: 1.5 }),
            model2: Some(ModelState { complexity_weight: 0.25 }),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model1": { "complexity_weight": 1.5 },
                "model2": { "complexity_weight": 0.25 }
            })
        );
    }

    #[test]
    fn test_partial_state_applies_present_keys_only() {
        let state: TrainingState =
            serde_json::from_str(r#"{"model2": {"complexity_weight": 3.0}}"#).unwrap();
        let mut gd = GradientDescentModel::new(0.01);
        let mut adam = AdamModel::new(0.01);
        state.apply(&mut gd, &mut adam);
        assert_eq!(gd.complexity_weight(), 1.0);
        assert_eq!(adam.complexity_weight(), 3.0);
    }

    #[test]
    fn test_apply_clamps_out_of_range() {
        let state = TrainingState {
            model1: Some(ModelState { complexity_weight: 99.0 }),
            model2: Some(ModelState { complexity_weight: -1.0 }),
        };
        let mut gd = GradientDescentModel::new(0.01);
        let mut adam = AdamModel::new(0.01);
        state.apply(&mut gd, &mut adam);
        assert_eq!(gd.complexity_weight(), 10.0);
        assert_eq!(adam.complexity_weight(), 0.1);
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(TrainingState::load(dir.path().join("absent.json")).unwrap(), None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut gd = GradientDescentModel::new(0.01);
        gd.set_complexity_weight(2.5);
        let adam = AdamModel::new(0.01);

        let state = TrainingState::capture(&gd, &adam);
        state.save(&path).unwrap();
        assert_eq!(TrainingState::load(&path).unwrap(), Some(state));
    }

    #[test]
    fn test_malformed_state_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(TrainingState::load(&path), Err(PersistError::Json { .. })));
    }
}
