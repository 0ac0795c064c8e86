//! Construct weight models by name.

use core::fmt;
use core::str::FromStr;

use crate::adam::AdamModel;
use crate::error::ModelError;
use crate::gradient::GradientDescentModel;
use crate::model::WeightModel;

/// The available optimisers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModelKind {
    /// [`GradientDescentModel`].
    Gradient,
    /// [`AdamModel`].
    Adam,
}

impl ModelKind {
    /// Factory key for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gradient => "gradient",
            Self::Adam => "adam",
        }
    }

    /// Build a fresh model of this kind.
    pub fn build(self, learning_rate: f64) -> Box<dyn WeightModel> {
        match self {
            Self::Gradient => Box::new(GradientDescentModel::new(learning_rate)),
            Self::Adam => Box::new(AdamModel::new(learning_rate)),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    /// Case-insensitive: `"gradient"`, `"Adam"`, `"ADAM"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gradient" => Ok(Self::Gradient),
            "adam" => Ok(Self::Adam),
            _ => Err(ModelError::UnknownKind(s.to_owned())),
        }
    }
}

/// Create a model from its factory key.
pub fn create_model(kind: &str, learning_rate: f64) -> Result<Box<dyn WeightModel>, ModelError> {
    Ok(kind.parse::<ModelKind>()?.build(learning_rate))
}
