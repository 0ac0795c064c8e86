//! The recipe graph: each craftable item mapped to its direct ingredient multiset.
//!
//! The graph is plain storage. It performs no cycle validation; cycles are the
//! [`Resolver`](crate::resolver::Resolver)'s concern.
//!
//! # Invariants
//!
//! - Every stored ingredient count is ≥ 1. Zero counts are rejected at insertion.
//! - Later insertions for the same item replace the earlier recipe wholesale (no merge).

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::error::RecipeError;

/// Direct ingredient multiset of one recipe: ingredient id → count.
///
/// Ordered so that expansion and summation order are deterministic.
pub type Ingredients = BTreeMap<String, u32>;

// ─── Recipe ─────────────────────────────────────────────────────────────────

/// One crafting recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    item: String,
    ingredients: Ingredients,
}

impl Recipe {
    /// The crafted item identifier.
    pub fn item(&self) -> &str {
        &self.item
    }

    /// The direct ingredients and their counts.
    pub fn ingredients(&self) -> &Ingredients {
        &self.ingredients
    }

    /// Total number of ingredient units consumed by one craft.
    pub fn total_units(&self) -> u64 {
        self.ingredients.values().map(|&c| u64::from(c)).sum()
    }
}

// ─── RecipeGraph ────────────────────────────────────────────────────────────

/// Item id → [`Recipe`] store.
#[derive(Clone, Debug, Default)]
pub struct RecipeGraph {
    recipes: HashMap<String, Recipe>,
}

impl RecipeGraph {
    /// Construct an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the recipe for `item`.
    ///
    /// Returns the replaced recipe, if any. Rejects empty item identifiers and
    /// zero ingredient counts; nothing is stored on rejection.
    pub fn add_recipe(
        &mut self,
        item: impl Into<String>,
        ingredients: Ingredients,
    ) -> Result<Option<Recipe>, RecipeError> {
        let item = item.into();
        if item.is_empty() {
            return Err(RecipeError::EmptyItemId);
        }
        if let Some((ingredient, _)) = ingredients.iter().find(|(_, &count)| count == 0) {
            return Err(RecipeError::ZeroCount {
                item,
                ingredient: ingredient.clone(),
            });
        }
        let recipe = Recipe {
            item: item.clone(),
            ingredients,
        };
        Ok(self.recipes.insert(item, recipe))
    }

    /// Direct ingredients of `item`, or `None` if it has no recipe.
    pub fn ingredients(&self, item: &str) -> Option<&Ingredients> {
        self.recipes.get(item).map(Recipe::ingredients)
    }

    /// The full recipe for `item`, if any.
    pub fn recipe(&self, item: &str) -> Option<&Recipe> {
        self.recipes.get(item)
    }

    /// `true` if `item` has a recipe.
    pub fn has_recipe(&self, item: &str) -> bool {
        self.recipes.contains_key(item)
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// `true` if no recipes are stored.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Iterate over all craftable item identifiers (unordered).
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredients(pairs: &[(&str, u32)]) -> Ingredients {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_add_and_lookup() {
        let mut graph = RecipeGraph::new();
        let replaced = graph
            .add_recipe("item:table", ingredients(&[("base:wood", 4), ("base:stick", 2)]))
            .unwrap();
        assert!(replaced.is_none());
        assert!(graph.has_recipe("item:table"));
        assert!(!graph.has_recipe("base:wood"));
        assert_eq!(graph.ingredients("item:table").unwrap().get("base:wood"), Some(&4));
        assert_eq!(graph.recipe("item:table").unwrap().total_units(), 6);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("item:torch", ingredients(&[("base:coal", 1)])).unwrap();
        let replaced = graph
            .add_recipe("item:torch", ingredients(&[("base:stick", 1)]))
            .unwrap()
            .expect("first recipe should be returned");
        assert_eq!(replaced.ingredients().get("base:coal"), Some(&1));

        let current = graph.ingredients("item:torch").unwrap();
        assert_eq!(current.len(), 1, "recipes are replaced, not merged");
        assert_eq!(current.get("base:stick"), Some(&1));
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut graph = RecipeGraph::new();
        let err = graph
            .add_recipe("item:bad", ingredients(&[("base:wood", 2), ("base:air", 0)]))
            .unwrap_err();
        assert_eq!(
            err,
            RecipeError::ZeroCount {
                item: "item:bad".into(),
                ingredient: "base:air".into()
            }
        );
        assert!(!graph.has_recipe("item:bad"));
    }

    #[test]
    fn test_empty_item_rejected() {
        let mut graph = RecipeGraph::new();
        assert_eq!(
            graph.add_recipe("", ingredients(&[("base:wood", 1)])),
            Err(RecipeError::EmptyItemId)
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_empty_ingredient_set_allowed() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("item:nothing", Ingredients::new()).unwrap();
        assert!(graph.ingredients("item:nothing").unwrap().is_empty());
    }
}
