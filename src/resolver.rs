//! Recursive expansion of recipes into base materials, and recipe depth.
//!
//! # Expansion
//!
//! ```text
//! resolve(x) = { x: 1 }                         if x has no recipe, or x is already on the path
//! resolve(x) = Σ_{(i, n) ∈ recipe(x)} n · resolve(i)   otherwise
//! ```
//!
//! Multiplicities saturate at `u64::MAX` instead of overflowing.
//!
//! The visited set is the current expansion path. Two sibling ingredients that
//! share a sub-recipe each expand it in full; nothing is cached across branches.
//!
//! # Complexity
//!
//! ```text
//! depth(x) = 0                                   if x has no recipe
//! depth(x) = 1 + max_{i ∈ recipe(x)} depth(i)    otherwise (max of nothing = 0)
//! ```
//!
//! A node already on the path contributes 0, which caps depth along a cycle.
//! A depth capped this way is only reported for the item it was asked for; it
//! is never reused while measuring another item.
//!
//! # Cycles
//!
//! [`CyclePolicy::Truncate`] treats the repeated item as a base material
//! (resolution) or as depth 0 (complexity) and carries on silently.
//! [`CyclePolicy::FailFast`] returns [`ResolveError::Cycle`] instead.
//!
//! # Base materials
//!
//! The resolver is the only writer of the base-material set. It grows when a
//! recipe is added with ingredients that have no recipe, and whenever
//! resolution reaches a terminal or repeated item. It never shrinks.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::error::{RecipeError, ResolveError};
use crate::recipe::{Ingredients, Recipe, RecipeGraph};

/// Resolved base-material multiset: base material id → total units required.
pub type MaterialCounts = BTreeMap<String, u64>;

/// What to do when an expansion path revisits an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CyclePolicy {
    /// Treat the repeated item as terminal and keep going.
    #[default]
    Truncate,
    /// Stop and report the cycle.
    FailFast,
}

/// Owns the recipe graph and everything learned while walking it.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    graph: RecipeGraph,
    base_materials: HashSet<String>,
    /// item → (depth, exact). Inexact entries are only served to top-level callers.
    complexity: HashMap<String, (u32, bool)>,
    policy: CyclePolicy,
}

impl Resolver {
    /// Wrap `graph` with the default [`CyclePolicy::Truncate`].
    pub fn new(graph: RecipeGraph) -> Self {
        Self::with_policy(graph, CyclePolicy::default())
    }

    /// Wrap `graph` with an explicit cycle policy.
    ///
    /// Ingredients of the supplied recipes that have no recipe of their own are
    /// registered as base materials immediately.
    pub fn with_policy(graph: RecipeGraph, policy: CyclePolicy) -> Self {
        let mut base_materials = HashSet::new();
        for item in graph.items() {
            if let Some(ingredients) = graph.ingredients(item) {
                for ingredient in ingredients.keys() {
                    if !graph.has_recipe(ingredient) {
                        base_materials.insert(ingredient.clone());
                    }
                }
            }
        }
        Self {
            graph,
            base_materials,
            complexity: HashMap::new(),
            policy,
        }
    }

    /// The active cycle policy.
    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Change the cycle policy. Clears memoised complexities.
    pub fn set_policy(&mut self, policy: CyclePolicy) {
        if self.policy != policy {
            self.policy = policy;
            self.complexity.clear();
        }
    }

    /// Read access to the underlying graph.
    pub fn graph(&self) -> &RecipeGraph {
        &self.graph
    }

    /// Add or replace a recipe.
    ///
    /// Ingredients without a recipe are registered as base materials, and the
    /// complexity memo is invalidated.
    pub fn add_recipe(
        &mut self,
        item: impl Into<String>,
        ingredients: Ingredients,
    ) -> Result<Option<Recipe>, RecipeError> {
        let item = item.into();
        let newly_base: Vec<String> = ingredients
            .keys()
            .filter(|ingredient| !self.graph.has_recipe(ingredient) && **ingredient != item)
            .cloned()
            .collect();
        let replaced = self.graph.add_recipe(item, ingredients)?;
        self.base_materials.extend(newly_base);
        self.complexity.clear();
        Ok(replaced)
    }

    /// Snapshot of every base material discovered so far, sorted.
    pub fn base_materials(&self) -> BTreeSet<String> {
        self.base_materials.iter().cloned().collect()
    }

    /// `true` if `id` has been registered as a base material.
    pub fn is_base_material(&self, id: &str) -> bool {
        self.base_materials.contains(id)
    }

    /// Snapshot of every item that has a recipe, sorted.
    pub fn recipe_items(&self) -> BTreeSet<String> {
        self.graph.items().map(str::to_owned).collect()
    }

    // ── Base-material resolution ───────────────────────────────────────────

    /// Expand `item` into its base-material multiset.
    ///
    /// A terminal item resolves to `{item: 1}`. Under [`CyclePolicy::Truncate`]
    /// this never fails.
    pub fn resolve_base_materials(&mut self, item: &str) -> Result<MaterialCounts, ResolveError> {
        let Self {
            graph,
            base_materials,
            policy,
            ..
        } = self;
        let mut path = Vec::new();
        expand(graph, base_materials, *policy, item, &mut path)
    }

    // ── Complexity ─────────────────────────────────────────────────────────

    /// Recipe depth of `item`: 0 for base materials, else 1 + deepest ingredient.
    ///
    /// The result for `item` is memoised. Intermediate results are memoised too.
    /// A depth cut short by the cycle guard is only ever returned for the item
    /// it was computed from, never reused inside another item's walk, so the
    /// answer does not depend on call order.
    pub fn complexity(&mut self, item: &str) -> Result<u32, ResolveError> {
        if let Some(&(depth, _)) = self.complexity.get(item) {
            return Ok(depth);
        }
        let Self {
            graph,
            complexity,
            policy,
            ..
        } = self;
        let mut path = Vec::new();
        let (depth, exact) = measure(graph, complexity, *policy, item, &mut path)?;
        complexity.insert(item.to_owned(), (depth, exact));
        Ok(depth)
    }

    /// Memoised complexity for `item` without computing it.
    pub fn cached_complexity(&self, item: &str) -> Option<u32> {
        self.complexity.get(item).map(|&(depth, _)| depth)
    }
}

fn cycle_error(item: &str, path: &[&str]) -> ResolveError {
    let mut names: Vec<String> = path.iter().map(|s| (*s).to_owned()).collect();
    names.push(item.to_owned());
    ResolveError::Cycle {
        item: item.to_owned(),
        path: names,
    }
}

fn expand<'a>(
    graph: &'a RecipeGraph,
    base_materials: &mut HashSet<String>,
    policy: CyclePolicy,
    item: &'a str,
    path: &mut Vec<&'a str>,
) -> Result<MaterialCounts, ResolveError> {
    let repeated = path.contains(&item);
    if repeated {
        if policy == CyclePolicy::FailFast {
            return Err(cycle_error(item, path));
        }
        debug!(item, "cycle truncated; treating repeated item as base material");
    }

    let ingredients = match graph.ingredients(item) {
        Some(ingredients) if !repeated => ingredients,
        _ => {
            trace!(item, "base material");
            base_materials.insert(item.to_owned());
            let mut terminal = MaterialCounts::new();
            terminal.insert(item.to_owned(), 1);
            return Ok(terminal);
        }
    };

    path.push(item);
    let mut totals = MaterialCounts::new();
    for (ingredient, &count) in ingredients {
        let resolved = match expand(graph, base_materials, policy, ingredient, path) {
            Ok(resolved) => resolved,
            Err(err) => {
                path.pop();
                return Err(err);
            }
        };
        for (material, units) in resolved {
            let total = totals.entry(material).or_insert(0);
            *total = total.saturating_add(units.saturating_mul(u64::from(count)));
        }
    }
    path.pop();
    Ok(totals)
}

/// Returns `(depth, exact)`; `exact` is false when the cycle guard fired below.
fn measure<'a>(
    graph: &'a RecipeGraph,
    memo: &mut HashMap<String, (u32, bool)>,
    policy: CyclePolicy,
    item: &'a str,
    path: &mut Vec<&'a str>,
) -> Result<(u32, bool), ResolveError> {
    if path.contains(&item) {
        return match policy {
            CyclePolicy::FailFast => Err(cycle_error(item, path)),
            CyclePolicy::Truncate => Ok((0, false)),
        };
    }
    if let Some(&(depth, true)) = memo.get(item) {
        return Ok((depth, true));
    }
    let Some(ingredients) = graph.ingredients(item) else {
        return Ok((0, true));
    };

    path.push(item);
    let mut deepest = 0;
    let mut exact = true;
    for ingredient in ingredients.keys() {
        match measure(graph, memo, policy, ingredient, path) {
            Ok((depth, sub_exact)) => {
                deepest = deepest.max(depth);
                exact &= sub_exact;
            }
            Err(err) => {
                path.pop();
                return Err(err);
            }
        }
    }
    path.pop();

    let depth = deepest.saturating_add(1);
    if exact {
        memo.insert(item.to_owned(), (depth, true));
    }
    Ok((depth, exact))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
