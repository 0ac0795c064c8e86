//! End-to-end: recipe JSON → resolver → two-model training → state files.

#[cfg(feature = "serde")]
mod tests {
    use std::fs;

    use craft_weight::{
        create_model, load_recipes, Resolver, TrainedWeights, Trainer, TrainerConfig,
        TrainingState,
    };

    const RECIPES: &str = r####"[
        {
            "itemName": "minecraft:oak_planks",
            "type": "minecraft:crafting_shapeless",
            "ingredients": [ { "item": "minecraft:oak_log" } ]
        },
        {
            "itemName": "minecraft:stick",
            "type": "minecraft:crafting_shaped",
            "pattern": ["#", "#"],
            "key": { "#": { "item": "minecraft:oak_planks" } }
        },
        {
            "itemName": "minecraft:chest",
            "type": "minecraft:crafting_shaped",
            "pattern": ["###", "# #", "###"],
            "key": { "#": { "item": "minecraft:oak_planks" } }
        },
        {
            "itemName": "minecraft:iron_pickaxe",
            "type": "minecraft:crafting_shaped",
            "pattern": ["III", " S ", " S "],
            "key": { "I": { "item": "minecraft:iron_ingot" }, "S": { "item": "minecraft:stick" } }
        },
        {
            "itemName": "minecraft:iron_ingot",
            "type": "minecraft:smelting"
        }
    ]"####;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn load(dir: &std::path::Path) -> Resolver {
        let path = dir.join("recipes.json");
        fs::write(&path, RECIPES).unwrap();
        let mut resolver = Resolver::default();
        let summary = load_recipes(&path, &mut resolver).unwrap();
        assert_eq!(summary.loaded, 4);
        assert_eq!(summary.skipped, 1);
        resolver
    }

    fn trainer(dir: &std::path::Path, config: TrainerConfig) -> Trainer {
        let mut t = Trainer::new(
            create_model("gradient", 0.01).unwrap(),
            create_model("adam", 0.01).unwrap(),
            load(dir),
            TrainerConfig {
                output_dir: dir.to_path_buf(),
                ..config
            },
        );
        t.initialize_base_materials();
        t
    }

    // ── Loading into training ────────────────────────────────────────────────

    #[test]
    fn test_loaded_graph_feeds_models() {
        let dir = tempfile::tempdir().unwrap();
        let t = trainer(dir.path(), TrainerConfig::default());

        let base = t.resolver().base_materials();
        assert!(base.contains("minecraft:oak_log"));
        assert!(base.contains("minecraft:iron_ingot"));
        assert!(!base.contains("minecraft:chest"));
        assert_eq!(t.model1().material_count(), base.len());
        assert_eq!(t.model2().material_count(), base.len());
    }

    #[test]
    fn test_pickaxe_resolution_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = load(dir.path());
        let materials = resolver
            .resolve_base_materials("minecraft:iron_pickaxe")
            .unwrap();
        // 3 ingots + 2 sticks · 2 planks · 1 log
        assert_eq!(materials.get("minecraft:iron_ingot"), Some(&3));
        assert_eq!(materials.get("minecraft:oak_log"), Some(&4));
        assert_eq!(resolver.complexity("minecraft:iron_pickaxe").unwrap(), 3);
    }

    // ── Sessions and persistence ─────────────────────────────────────────────

    #[test]
    fn test_sessions_write_state_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dir.path(),
            TrainerConfig {
                epochs_per_session: 20,
                max_sessions: 2,
                min_error_threshold: 0.0,
                ..TrainerConfig::default()
            },
        );

        let summary = t.train_sessions().unwrap();
        assert_eq!(summary.sessions, 2);
        assert!(summary.best_error.is_some());

        let state_path = dir.path().join("minecraft_model_state.json");
        let best_path = dir.path().join("minecraft_best_model_state.json");
        let weights_path = dir.path().join("minecraft_weights.json");
        assert_eq!(t.state_path().as_deref(), Some(state_path.as_path()));
        assert!(state_path.exists());
        assert!(best_path.exists());
        assert!(weights_path.exists());

        let best = TrainingState::load(&best_path).unwrap().unwrap();
        assert_eq!(
            best.model1.unwrap().complexity_weight,
            t.model1().complexity_weight(),
            "best state should be restored after the last session"
        );

        let export: TrainedWeights =
            serde_json::from_str(&fs::read_to_string(&weights_path).unwrap()).unwrap();
        assert!(export.base_materials.contains_key("minecraft:oak_log"));
        assert!(export.items.contains_key("minecraft:chest"));
        assert_eq!(export.items.len(), 4);
        let log = export.base_materials["minecraft:oak_log"].weight;
        assert_eq!(log, t.model1().weight("minecraft:oak_log"));
    }

    #[test]
    fn test_threshold_stops_after_first_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dir.path(),
            TrainerConfig {
                epochs_per_session: 5,
                max_sessions: 4,
                min_error_threshold: f64::INFINITY,
                ..TrainerConfig::default()
            },
        );
        assert_eq!(t.train_sessions().unwrap().sessions, 1);
    }

    #[test]
    fn test_state_file_matches_final_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(
            dir.path(),
            TrainerConfig {
                epochs_per_session: 1,
                max_sessions: 1,
                min_error_threshold: 0.0,
                ..TrainerConfig::default()
            },
        );
        t.train_sessions().unwrap();

        let state = TrainingState::load(t.state_path().unwrap()).unwrap().unwrap();
        let saved = state.model2.unwrap().complexity_weight;
        assert!((saved - t.model2().complexity_weight()).abs() < 1e-12);
    }

    #[test]
    fn test_config_from_json_uses_defaults_for_missing_keys() {
        let config: TrainerConfig =
            serde_json::from_str(r#"{"epochs_per_session": 7, "learning_rate": 0.2}"#).unwrap();
        assert_eq!(config.epochs_per_session, 7);
        assert_eq!(config.learning_rate, Some(0.2));
        assert_eq!(config.max_sessions, 5);
        assert_eq!(config.report_interval, 10);
        assert_eq!(config.output_dir, std::path::PathBuf::from("."));
    }

    #[test]
    fn test_empty_recipe_file_trains_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        fs::write(&path, "[]").unwrap();
        let mut resolver = Resolver::default();
        load_recipes(&path, &mut resolver).unwrap();

        let mut t = Trainer::new(
            create_model("gradient", 0.01).unwrap(),
            create_model("adam", 0.01).unwrap(),
            resolver,
            TrainerConfig {
                output_dir: dir.path().to_path_buf(),
                ..TrainerConfig::default()
            },
        );
        let summary = t.train_sessions().unwrap();
        assert_eq!(summary.sessions, 0);
        assert!(summary.best_error.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
