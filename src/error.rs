//! Error types for recipe construction, resolution, model construction, and I/O.
//!
//! Only two conditions are hard failures in the learning core: a malformed
//! recipe entry ([`RecipeError`]) and an unknown model kind ([`ModelError`]).
//! Cycles are a failure only under [`CyclePolicy::FailFast`]. Out-of-range and
//! negligible errors fed to a model are absorbed by clamping and skipping, and
//! never surface here.
//!
//! [`CyclePolicy::FailFast`]: crate::resolver::CyclePolicy::FailFast

use thiserror::Error;

/// Rejected recipe insertions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    /// The crafted item identifier was empty.
    #[error("recipe item identifier must not be empty")]
    EmptyItemId,

    /// An ingredient was listed with a count of zero.
    #[error("ingredient {ingredient} of {item} has a zero count")]
    ZeroCount {
        /// Item whose recipe was rejected.
        item: String,
        /// Offending ingredient.
        ingredient: String,
    },
}

/// Resolution failures. Produced only by the fail-fast cycle policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The expansion path revisited an item already being expanded.
    #[error("recipe cycle at {item}: {}", path.join(" -> "))]
    Cycle {
        /// The repeated item.
        item: String,
        /// Expansion path from the top-level item up to and including the repeat.
        path: Vec<String>,
    },
}

/// Weight-model construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The factory key did not name a known optimiser.
    #[error("unknown model type: {0} (expected \"gradient\" or \"adam\")")]
    UnknownKind(String),
}

/// Recipe file loading failures.
///
/// Individual malformed recipes are skipped, not reported here; only failures
/// that prevent reading the document at all are.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum LoadError {
    /// The recipe file could not be read.
    #[error("failed to read recipes from {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document was not a JSON array of recipe objects.
    #[error("recipe document is not a JSON array: {0}")]
    Json(#[from] serde_json::Error),
}

/// State-file and export failures.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be (de)serialised.
    #[error("malformed state in {}: {source}", path.display())]
    Json {
        /// File being read or written.
        path: std::path::PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
