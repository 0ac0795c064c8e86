//! Heuristic target weights used to synthesise training signal.
//!
//! Materials are scored by keyword on the name half of a `namespace:name`
//! identifier. The first matching row of [`MATERIAL_TABLE`] wins.

use crate::resolver::MaterialCounts;

/// Scale applied to the normalised material term.
pub const BASE_WEIGHT: f64 = 0.5;
/// Scale applied to the normalised complexity term.
pub const COMPLEXITY_FACTOR: f64 = 0.1;
/// Ceiling on any synthesised target.
pub const MAX_TARGET_WEIGHT: f64 = 10.0;

/// Weight for identifiers that match no keyword or are not namespaced.
pub const UNKNOWN_MATERIAL_WEIGHT: f64 = 1.0;

/// Keyword rows, checked in order.
pub const MATERIAL_TABLE: &[(&[&str], f64)] = &[
    (&["diamond", "netherite"], 8.0),
    (&["gold", "emerald"], 6.0),
    (&["iron", "copper"], 4.0),
    (&["stone", "cobblestone", "brick"], 2.0),
    (&["wood", "planks", "log"], 1.0),
    (&["string", "paper", "feather"], 0.2),
    (&["stick"], 0.5),
    (&["ingot"], 4.0),
    (&["nugget"], 0.5),
    (&["coal", "redstone"], 1.0),
    (&["dust", "powder"], 0.5),
];

/// Heuristic weight of one unit of `material`.
pub fn estimate_material_weight(material: &str) -> f64 {
    let mut parts = material.split(':');
    let name = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(name), None) => name.to_lowercase(),
        _ => return UNKNOWN_MATERIAL_WEIGHT,
    };
    MATERIAL_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map_or(UNKNOWN_MATERIAL_WEIGHT, |&(_, weight)| weight)
}

/// Synthesised target weight for an item.
///
/// ```text
/// b      = Σ estimate(m) · count(m)
/// target = min(0.5 · b/(1+b) + 0.1 · c/(1+c), 10)
/// ```
pub fn target_weight(materials: &MaterialCounts, complexity: u32) -> f64 {
    let raw: f64 = materials
        .iter()
        .map(|(material, &count)| estimate_material_weight(material) * count as f64)
        .sum();
    let base = raw / (1.0 + raw) * BASE_WEIGHT;
    let c = f64::from(complexity);
    let depth = c / (1.0 + c) * COMPLEXITY_FACTOR;
    (base + depth).min(MAX_TARGET_WEIGHT)
}
