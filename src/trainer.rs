//! Two-model training loop over every craftable item.
//!
//! For each item the trainer resolves base materials and complexity,
//! synthesises a target with [`target_weight`], and feeds
//! `target - prediction` to both models. The two models are trained side by
//! side on identical data so their optimisers can be compared.
//!
//! Sessions (feature `serde`) wrap epochs with state-file persistence: the
//! complexity weights are saved after every session, the best session is kept
//! separately, and the best state is restored before the final export.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::model::WeightModel;
use crate::resolver::{MaterialCounts, Resolver};
use crate::target::target_weight;

/// Training-loop settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainerConfig {
    /// Epochs per training session.
    pub epochs_per_session: usize,
    /// Learning rate passed to every update. `None` uses each model's own rate.
    pub learning_rate: Option<f64>,
    /// Upper bound on the number of sessions.
    pub max_sessions: usize,
    /// Stop once the best evaluation error drops below this.
    pub min_error_threshold: f64,
    /// Log average errors every this many epochs.
    pub report_interval: usize,
    /// Seed for the per-epoch item shuffle.
    pub seed: u64,
    /// Directory for state files and the weight export.
    pub output_dir: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs_per_session: 1000,
            learning_rate: None,
            max_sessions: 5,
            min_error_threshold: 0.1,
            report_interval: 10,
            seed: 0,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Mean absolute errors observed during one epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Items that produced an update.
    pub items: usize,
    /// Mean |error| of the first model.
    pub model1_error: f64,
    /// Mean |error| of the second model.
    pub model2_error: f64,
}

/// Result of [`Trainer::train_sessions`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    /// Sessions actually run.
    pub sessions: usize,
    /// Lowest evaluation error seen, if any session was evaluable.
    pub best_error: Option<f64>,
}

/// Resolved training example.
struct Example {
    materials: MaterialCounts,
    complexity: u32,
    target: f64,
}

/// Trains two weight models against synthesised targets.
#[derive(Debug)]
pub struct Trainer {
    model1: Box<dyn WeightModel>,
    model2: Box<dyn WeightModel>,
    resolver: Resolver,
    config: TrainerConfig,
    rng: StdRng,
}

impl Trainer {
    /// Construct a trainer. The shuffle RNG is seeded from `config.seed`.
    pub fn new(
        model1: Box<dyn WeightModel>,
        model2: Box<dyn WeightModel>,
        resolver: Resolver,
        config: TrainerConfig,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            model1,
            model2,
            resolver,
            config,
            rng,
        }
    }

    /// The first model.
    pub fn model1(&self) -> &dyn WeightModel {
        self.model1.as_ref()
    }

    /// The second model.
    pub fn model2(&self) -> &dyn WeightModel {
        self.model2.as_ref()
    }

    /// The resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Mutable access to the resolver.
    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// The active configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Register every known base material in both models.
    pub fn initialize_base_materials(&mut self) {
        for material in self.resolver.base_materials() {
            self.model1.initialize_material(&material);
            self.model2.initialize_material(&material);
        }
    }

    /// Resolve `item` into a training example, or `None` if it has nothing to learn from.
    fn example(&mut self, item: &str) -> Option<Example> {
        let resolved = match self.resolver.resolve_base_materials(item) {
            Ok(materials) => self.resolver.complexity(item).map(|c| (materials, c)),
            Err(err) => Err(err),
        };
        match resolved {
            Ok((materials, _)) if materials.is_empty() => None,
            Ok((materials, complexity)) => {
                let target = target_weight(&materials, complexity);
                Some(Example {
                    materials,
                    complexity,
                    target,
                })
            }
            Err(err) => {
                warn!(item, error = %err, "skipping item");
                None
            }
        }
    }

    /// Predicted weight of `item` under both models, or `None` if it cannot be resolved.
    pub fn predict_item(&mut self, item: &str) -> Option<(f64, f64)> {
        let example = self.example(item)?;
        Some((
            self.model1.predict_weight(&example.materials, example.complexity),
            self.model2.predict_weight(&example.materials, example.complexity),
        ))
    }

    /// Run `epochs` passes over every recipe item in shuffled order.
    ///
    /// Returns the report of the last epoch that updated anything, or `None`
    /// when there are no recipes.
    pub fn train(&mut self, epochs: usize) -> Option<EpochReport> {
        let mut items: Vec<String> = self.resolver.recipe_items().into_iter().collect();
        if items.is_empty() {
            warn!("no recipes found for training");
            return None;
        }
        info!(recipes = items.len(), epochs, "starting training");

        let lr1 = self.config.learning_rate.unwrap_or_else(|| self.model1.learning_rate());
        let lr2 = self.config.learning_rate.unwrap_or_else(|| self.model2.learning_rate());
        let interval = self.config.report_interval.max(1);
        let mut last = None;

        for epoch in 0..epochs {
            items.shuffle(&mut self.rng);
            let mut updated = 0usize;
            let mut total1 = 0.0;
            let mut total2 = 0.0;

            for item in &items {
                let Some(ex) = self.example(item) else {
                    continue;
                };

                let p1 = self.model1.predict_weight(&ex.materials, ex.complexity);
                if !p1.is_nan() {
                    let error = ex.target - p1;
                    self.model1
                        .update_weights(&ex.materials, ex.complexity, error, lr1);
                    total1 += error.abs();
                    updated += 1;
                }

                let p2 = self.model2.predict_weight(&ex.materials, ex.complexity);
                if !p2.is_nan() {
                    let error = ex.target - p2;
                    self.model2
                        .update_weights(&ex.materials, ex.complexity, error, lr2);
                    total2 += error.abs();
                }
            }

            if updated == 0 {
                warn!(epoch, "no valid items in epoch");
                continue;
            }

            let report = EpochReport {
                epoch,
                items: updated,
                model1_error: total1 / updated as f64,
                model2_error: total2 / updated as f64,
            };
            if epoch % interval == 0 {
                info!(
                    epoch,
                    model1 = %self.model1.kind(),
                    model1_error = report.model1_error,
                    model2 = %self.model2.kind(),
                    model2_error = report.model2_error,
                    "average errors"
                );
            }
            last = Some(report);
        }
        debug!(model = %self.model1.kind(), "{}", self.model1.describe_weights());
        debug!(model = %self.model2.kind(), "{}", self.model2.describe_weights());
        last
    }

    /// Mean absolute error of both models over every recipe item.
    ///
    /// `None` when no item is evaluable.
    pub fn evaluate(&mut self) -> Option<f64> {
        let items = self.resolver.recipe_items();
        if items.is_empty() {
            warn!("no recipes found for evaluation");
            return None;
        }

        let mut total = 0.0;
        let mut evaluated = 0usize;
        for item in &items {
            let Some(ex) = self.example(item) else {
                continue;
            };
            let p1 = self.model1.predict_weight(&ex.materials, ex.complexity);
            let p2 = self.model2.predict_weight(&ex.materials, ex.complexity);
            if p1.is_nan() || p2.is_nan() {
                continue;
            }
            total += (ex.target - p1).abs() + (ex.target - p2).abs();
            evaluated += 1;
        }

        if evaluated == 0 {
            warn!("no valid items found for evaluation");
            return None;
        }
        Some(total / (2.0 * evaluated as f64))
    }

    /// Namespace of the first recipe item in sorted order, used to prefix output files.
    pub fn namespace(&self) -> Option<String> {
        self.resolver
            .recipe_items()
            .into_iter()
            .next()
            .map(|item| item.split(':').next().unwrap_or_default().to_owned())
    }
}

#[cfg(feature = "serde")]
mod sessions {
    use std::path::PathBuf;

    use tracing::{info, warn};

    use super::{SessionSummary, Trainer};
    use crate::error::PersistError;
    use crate::resolver::MaterialCounts;
    use crate::snapshot::{TrainedWeights, TrainingState, WeightRecord};

    impl Trainer {
        fn output_path(&self, namespace: &str, suffix: &str) -> PathBuf {
            self.config.output_dir.join(format!("{namespace}_{suffix}"))
        }

        /// Path of the per-session state file, if there are recipes to name it after.
        pub fn state_path(&self) -> Option<PathBuf> {
            self.namespace().map(|ns| self.output_path(&ns, "model_state.json"))
        }

        /// Path of the best-session state file.
        pub fn best_state_path(&self) -> Option<PathBuf> {
            self.namespace()
                .map(|ns| self.output_path(&ns, "best_model_state.json"))
        }

        /// Path of the trained-weights export.
        pub fn weights_path(&self) -> Option<PathBuf> {
            self.namespace().map(|ns| self.output_path(&ns, "weights.json"))
        }

        /// Capture both models' persisted state.
        pub fn capture_state(&self) -> TrainingState {
            TrainingState::capture(self.model1.as_ref(), self.model2.as_ref())
        }

        /// Restore state into both models.
        pub fn apply_state(&mut self, state: &TrainingState) {
            state.apply(self.model1.as_mut(), self.model2.as_mut());
        }

        fn restore_from(&mut self, path: &std::path::Path) -> Result<bool, PersistError> {
            match TrainingState::load(path)? {
                Some(state) => {
                    self.apply_state(&state);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        /// Run up to `max_sessions` training sessions with state persistence,
        /// then restore the best state and write the weight export.
        pub fn train_sessions(&mut self) -> Result<SessionSummary, PersistError> {
            let (Some(state_path), Some(best_path)) = (self.state_path(), self.best_state_path())
            else {
                warn!("no recipes found for training");
                return Ok(SessionSummary {
                    sessions: 0,
                    best_error: None,
                });
            };

            let max_sessions = self.config.max_sessions;
            let epochs = self.config.epochs_per_session;
            let mut best: Option<f64> = None;
            let mut sessions = 0;

            while sessions < max_sessions {
                info!(session = sessions + 1, max_sessions, "starting training session");
                if sessions > 0 {
                    self.restore_from(&state_path)?;
                }

                self.train(epochs);
                let error = self.evaluate();
                self.capture_state().save(&state_path)?;
                sessions += 1;

                match error {
                    Some(error) if best.map_or(true, |b| error < b) => {
                        info!(session = sessions, error, "new best error");
                        best = Some(error);
                        self.capture_state().save(&best_path)?;
                        if error < self.config.min_error_threshold {
                            info!("reached target error threshold, stopping training");
                            break;
                        }
                    }
                    Some(error) => info!(session = sessions, error, "no improvement in this session"),
                    None => warn!(session = sessions, "session could not be evaluated"),
                }
            }

            self.restore_from(&best_path)?;
            self.save_trained_weights()?;
            Ok(SessionSummary {
                sessions,
                best_error: best,
            })
        }

        /// Predictions of the first model for every base material and item.
        pub fn trained_weights(&mut self) -> TrainedWeights {
            let mut out = TrainedWeights::default();
            for material in self.resolver.base_materials() {
                let mut unit = MaterialCounts::new();
                unit.insert(material.clone(), 1);
                let weight = self.model1.predict_weight(&unit, 0);
                out.base_materials.insert(material, WeightRecord { weight });
            }
            for item in self.resolver.recipe_items() {
                if let Some((weight, _)) = self.predict_item(&item) {
                    out.items.insert(item, WeightRecord { weight });
                }
            }
            out
        }

        /// Write [`trained_weights`](Self::trained_weights) to [`weights_path`](Self::weights_path).
        ///
        /// Returns the path written, or `None` when there are no recipes.
        pub fn save_trained_weights(&mut self) -> Result<Option<PathBuf>, PersistError> {
            let Some(path) = self.weights_path() else {
                warn!("no recipes found to save");
                return Ok(None);
            };
            self.trained_weights().save(&path)?;
            info!(path = %path.display(), "saved trained data");
            Ok(Some(path))
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
