//! craft-weight CLI
//!
//! Loads a recipe file, trains a plain-gradient and an Adam weight model side
//! by side, writes the session state and weight export, and prints each
//! craftable item's predictions.
//!
//! ```text
//! craft-weight recipes.json -v --sessions 3 --output-dir out/
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use craft_weight::{create_model, load_recipes, CyclePolicy, Resolver, Trainer, TrainerConfig};

/// Construction rate of both models.
const MODEL_LEARNING_RATE: f64 = 0.01;

/// Learn item weights from crafting recipes
#[derive(Parser)]
#[command(name = "craft-weight")]
#[command(version)]
#[command(about = "Learn item weights from recursive crafting recipes")]
struct Cli {
    /// Recipe file (JSON array of shaped/shapeless recipes)
    #[arg(default_value = "recipes.json")]
    recipes: PathBuf,

    /// JSON trainer configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Epochs per training session
    #[arg(long)]
    epochs: Option<usize>,

    /// Maximum number of training sessions
    #[arg(long)]
    sessions: Option<usize>,

    /// Learning rate for every update (defaults to each model's own rate)
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Seed for the per-epoch shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for state files and the weight export
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// What to do when a recipe refers back to itself
    #[arg(long, value_enum, default_value_t = PolicyArg::Truncate)]
    cycle_policy: PolicyArg,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Truncate,
    FailFast,
}

impl From<PolicyArg> for CyclePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Truncate => CyclePolicy::Truncate,
            PolicyArg::FailFast => CyclePolicy::FailFast,
        }
    }
}

impl Cli {
    fn trainer_config(&self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => TrainerConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            config.epochs_per_session = epochs;
        }
        if let Some(sessions) = self.sessions {
            config.max_sessions = sessions;
        }
        if self.learning_rate.is_some() {
            config.learning_rate = self.learning_rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.trainer_config()?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let model1 = create_model("gradient", MODEL_LEARNING_RATE)?;
    let model2 = create_model("adam", MODEL_LEARNING_RATE)?;

    let mut resolver = Resolver::default();
    resolver.set_policy(cli.cycle_policy.into());
    info!(path = %cli.recipes.display(), "loading recipes");
    let summary = load_recipes(&cli.recipes, &mut resolver)
        .with_context(|| format!("loading recipes from {}", cli.recipes.display()))?;
    info!(loaded = summary.loaded, skipped = summary.skipped, "recipes loaded");

    let mut trainer = Trainer::new(model1, model2, resolver, config);
    trainer.initialize_base_materials();

    let sessions = trainer.train_sessions().context("training sessions")?;
    info!(sessions = sessions.sessions, best_error = ?sessions.best_error, "training finished");

    match trainer.evaluate() {
        Some(error) => println!("Average error after training: {error:.4}"),
        None => println!("Average error after training: n/a"),
    }

    println!();
    println!("Gradient Descent {}", trainer.model1().describe_weights());
    println!();
    println!("Adam {}", trainer.model2().describe_weights());
    println!();
    println!("Predictions:");
    for item in trainer.resolver().recipe_items() {
        if let Some((gradient, adam)) = trainer.predict_item(&item) {
            println!("  {item}: gradient {gradient:.2}, adam {adam:.2}");
        }
    }

    Ok(())
}
