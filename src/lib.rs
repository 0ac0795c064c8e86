//! # craft-weight
//!
//! Learned item weights for recursive crafting recipes.
//!
//! ---
//!
//! A crafted item is worth what goes into it. Recipes nest, so the value of a
//! chest depends on planks, which depend on logs, and so on down to materials
//! that are gathered rather than crafted. This crate walks that graph and fits
//! a per-material weight so that any item's weight can be predicted from the
//! base materials it expands to and how deep its recipe tree goes.
//!
//! **Resolution** expands an item into a multiset of base materials. An item
//! with no recipe is its own base material. A recipe that loops back on itself
//! is cut at the repeated item (or reported, under [`CyclePolicy::FailFast`]).
//!
//! **Complexity** is the depth of the recipe tree: 0 for base materials, one
//! more than the deepest ingredient otherwise.
//!
//! **Weight models** predict
//!
//! ```text
//! weight(item) = (Σ weight[m] · count[m]) · (1 + complexity_weight · complexity)
//! ```
//!
//! and learn from `target - prediction` one item at a time, with either plain
//! gradient steps or Adam.
//!
//! ## The pipeline
//!
//! ```text
//! recipes.json → load_recipes → Resolver → (materials, complexity) → target_weight
//!                                   ↓                                       ↓
//!                          initialize_material               WeightModel::update_weights
//!                                                                           ↓
//!                                                     TrainingState / TrainedWeights (JSON)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`recipe`] | [`Recipe`], [`RecipeGraph`] | Item → ingredient-count map store |
//! | [`resolver`] | [`Resolver`], [`CyclePolicy`] | Base-material expansion, depth, base-set tracking |
//! | [`model`] | [`WeightModel`] | Shared model capability, bounds, and prediction formula |
//! | [`gradient`] | [`GradientDescentModel`] | Plain gradient steps |
//! | [`adam`] | [`AdamModel`] | Adam with per-material moments |
//! | [`factory`] | [`ModelKind`], [`create_model`] | Build a model by name |
//! | [`target`] | [`target_weight`] | Keyword-table target synthesis |
//! | [`trainer`] | [`Trainer`], [`TrainerConfig`] | Two-model training loop and sessions |
//! | [`loader`] | [`load_recipes`] | Shaped/shapeless JSON recipes (requires `serde`) |
//! | [`snapshot`] | [`TrainingState`], [`TrainedWeights`] | Session state and weight export (requires `serde`) |
//! | [`error`] | [`RecipeError`], [`ResolveError`], [`ModelError`] | Error types |
//!
//! ## Features
//!
//! - `serde` (default): JSON recipe loading, state persistence, and serde
//!   derives on configuration types.
//! - `cli`: the `craft-weight` binary.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod adam;
pub mod error;
pub mod factory;
pub mod gradient;
pub mod model;
pub mod recipe;
pub mod resolver;
pub mod target;
pub mod trainer;

#[cfg(feature = "serde")]
pub mod loader;
#[cfg(feature = "serde")]
pub mod snapshot;

pub use adam::AdamModel;
pub use error::{ModelError, RecipeError, ResolveError};
pub use factory::{create_model, ModelKind};
pub use gradient::GradientDescentModel;
pub use model::WeightModel;
pub use recipe::{Ingredients, Recipe, RecipeGraph};
pub use resolver::{CyclePolicy, MaterialCounts, Resolver};
pub use target::{estimate_material_weight, target_weight};
pub use trainer::{EpochReport, SessionSummary, Trainer, TrainerConfig};

#[cfg(feature = "serde")]
pub use error::{LoadError, PersistError};
#[cfg(feature = "serde")]
pub use loader::{load_recipes, load_recipes_str, LoadSummary};
#[cfg(feature = "serde")]
pub use snapshot::{ModelState, TrainedWeights, TrainingState, WeightRecord};
