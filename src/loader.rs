//! JSON recipe loading for shaped and shapeless crafting recipes.
//!
//! The document is an array of recipe objects:
//!
//! ```json
//! [
//!   { "itemName": "minecraft:chest", "type": "minecraft:crafting_shaped",
//!     "pattern": ["###", "# #", "###"], "key": { "#": { "item": "minecraft:oak_planks" } } },
//!   { "itemName": "minecraft:flint_and_steel", "type": "minecraft:crafting_shapeless",
//!     "ingredients": [ { "item": "minecraft:iron_ingot" }, { "item": "minecraft:flint" } ] }
//! ]
//! ```
//!
//! Shaped recipes count one unit per non-whitespace pattern cell; shapeless
//! recipes count one unit per listed ingredient. A recipe that fails to
//! deserialise, has an unsupported type, or yields no ingredients is skipped
//! with a warning. Only an unreadable file or a non-array document fails the load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::recipe::{Ingredients, Recipe};
use crate::resolver::Resolver;

/// `type` of a grid-pattern recipe.
pub const SHAPED: &str = "minecraft:crafting_shaped";
/// `type` of an unordered ingredient-list recipe.
pub const SHAPELESS: &str = "minecraft:crafting_shapeless";

/// Outcome of a load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Recipes added to the resolver (replacements included).
    pub loaded: usize,
    /// Entries skipped as malformed, unsupported, or empty.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ItemRef {
    item: String,
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(rename = "itemName")]
    item_name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    pattern: Option<Vec<String>>,
    #[serde(default)]
    key: Option<BTreeMap<String, ItemRef>>,
    #[serde(default)]
    ingredients: Option<Vec<ItemRef>>,
}

impl RawRecipe {
    fn collect_ingredients(&self) -> Ingredients {
        let mut out = Ingredients::new();
        match self.kind.as_str() {
            SHAPED => match (&self.pattern, &self.key) {
                (Some(pattern), Some(key)) => {
                    for row in pattern {
                        for cell in row.chars().filter(|c| !c.is_whitespace()) {
                            let mut buf = [0u8; 4];
                            match key.get(&*cell.encode_utf8(&mut buf)) {
                                Some(entry) => *out.entry(entry.item.clone()).or_insert(0) += 1,
                                None => warn!(
                                    item = %self.item_name,
                                    symbol = %cell,
                                    "no key mapping for pattern symbol"
                                ),
                            }
                        }
                    }
                }
                _ => warn!(item = %self.item_name, "shaped recipe missing pattern or key"),
            },
            SHAPELESS => match &self.ingredients {
                Some(list) => {
                    for entry in list {
                        *out.entry(entry.item.clone()).or_insert(0) += 1;
                    }
                }
                None => warn!(item = %self.item_name, "shapeless recipe missing ingredients"),
            },
            other => debug!(item = %self.item_name, kind = other, "unsupported recipe type"),
        }
        out
    }
}

/// Load every recipe in the file at `path` into `resolver`.
pub fn load_recipes(path: impl AsRef<Path>, resolver: &mut Resolver) -> Result<LoadSummary, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read recipe file");
    load_recipes_str(&content, resolver)
}

/// Load every recipe in the JSON document `json` into `resolver`.
pub fn load_recipes_str(json: &str, resolver: &mut Resolver) -> Result<LoadSummary, LoadError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut summary = LoadSummary::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let raw: RawRecipe = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(index, error = %err, "skipping malformed recipe");
                summary.skipped += 1;
                continue;
            }
        };

        let ingredients = raw.collect_ingredients();
        if ingredients.is_empty() {
            warn!(item = %raw.item_name, "no ingredients found; recipe skipped");
            summary.skipped += 1;
            continue;
        }

        let count = ingredients.len();
        match resolver.add_recipe(raw.item_name.clone(), ingredients) {
            Ok(_) => {
                let units = resolver
                    .graph()
                    .recipe(&raw.item_name)
                    .map_or(0, Recipe::total_units);
                debug!(item = %raw.item_name, ingredients = count, units, "added recipe");
                summary.loaded += 1;
            }
            Err(err) => {
                warn!(item = %raw.item_name, error = %err, "recipe rejected");
                summary.skipped += 1;
            }
        }
    }

    debug!(loaded = summary.loaded, skipped = summary.skipped, "recipe load finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r####"[
        {
            "itemName": "minecraft:chest",
            "type": "minecraft:crafting_shaped",
            "pattern": ["###", "# #", "###"],
            "key": { "#": { "item": "minecraft:oak_planks" } }
        },
        {
            "itemName": "minecraft:oak_planks",
            "type": "minecraft:crafting_shapeless",
            "ingredients": [ { "item": "minecraft:oak_log" } ]
        },
        {
            "itemName": "minecraft:iron_ingot",
            "type": "minecraft:smelting"
        },
        {
            "type": "minecraft:crafting_shapeless",
            "ingredients": []
        }
    ]"####;

    #[test]
    fn test_shaped_counts_cells() {
        let mut resolver = Resolver::default();
        let summary = load_recipes_str(SAMPLE, &mut resolver).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 2, skipped: 2 });

        let chest = resolver.graph().ingredients("minecraft:chest").unwrap();
        assert_eq!(chest.get("minecraft:oak_planks"), Some(&8));
    }

    #[test]
    fn test_shaped_units_match_filled_cells() {
        let mut resolver = Resolver::default();
        load_recipes_str(SAMPLE, &mut resolver).unwrap();
        let chest = resolver.graph().recipe("minecraft:chest").unwrap();
        assert_eq!(chest.total_units(), 8, "3 + 2 + 3 non-blank cells");
    }

    #[test]
    fn test_loaded_recipes_resolve() {
        let mut resolver = Resolver::default();
        load_recipes_str(SAMPLE, &mut resolver).unwrap();
        let resolved = resolver.resolve_base_materials("minecraft:chest").unwrap();
        assert_eq!(resolved.get("minecraft:oak_log"), Some(&8));
        assert_eq!(resolver.complexity("minecraft:chest").unwrap(), 2);
    }

    #[test]
    fn test_shapeless_duplicates_accumulate() {
        let json = r#"[{
            "itemName": "m:mix",
            "type": "minecraft:crafting_shapeless",
            "ingredients": [ {"item": "m:dye"}, {"item": "m:dye"}, {"item": "m:wool"} ]
        }]"#;
        let mut resolver = Resolver::default();
        load_recipes_str(json, &mut resolver).unwrap();
        let mix = resolver.graph().ingredients("m:mix").unwrap();
        assert_eq!(mix.get("m:dye"), Some(&2));
        assert_eq!(mix.get("m:wool"), Some(&1));
    }

    #[test]
    fn test_unmapped_symbols_ignored() {
        let json = r#"[{
            "itemName": "m:thing",
            "type": "minecraft:crafting_shaped",
            "pattern": ["AB", " A"],
            "key": { "A": { "item": "m:a" } }
        }]"#;
        let mut resolver = Resolver::default();
        let summary = load_recipes_str(json, &mut resolver).unwrap();
        assert_eq!(summary.loaded, 1);
        let thing = resolver.graph().ingredients("m:thing").unwrap();
        assert_eq!(thing.len(), 1);
        assert_eq!(thing.get("m:a"), Some(&2));
    }

    #[test]
    fn test_tag_ingredients_skip_recipe() {
        let json = r####"[{
            "itemName": "m:torch",
            "type": "minecraft:crafting_shaped",
            "pattern": ["#", "S"],
            "key": { "#": { "tag": "m:coals" }, "S": { "item": "m:stick" } }
        }]"####;
        let mut resolver = Resolver::default();
        let summary = load_recipes_str(json, &mut resolver).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 0, skipped: 1 });
    }

    #[test]
    fn test_non_array_document_fails() {
        let mut resolver = Resolver::default();
        assert!(matches!(
            load_recipes_str("{\"itemName\": \"x\"}", &mut resolver),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut resolver = Resolver::default();
        let err = load_recipes("/definitely/not/here/recipes.json", &mut resolver).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "err={}", err);
    }
}
