//! Deterministic merging of layered configuration fragments.
//!
//! Fragments are `serde_json` object maps. Two sentinels carry structural
//! meaning: the key or value `"*"` is the wildcard ("every available member",
//! expanded by the caller's context), and the value `false` removes a key that
//! an earlier fragment defined. Merging is a three-pass algorithm so the
//! wildcard/removal/override interaction stays order-independent within a
//! single overlay: removals are collected first, the wildcard is relocated to
//! the front of the normalized ordering, and only then are explicit overrides
//! applied.

use crate::schema::types::SchemaError;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Wildcard sentinel: "every field/operation currently known or derivable".
pub const WILDCARD: &str = "*";

/// The currency of all configuration in the engine. Insertion order is
/// preserved, which the wildcard relocation pass relies on.
pub type ConfigMap = Map<String, Value>;

/// Pass 1: keys the overlay maps to `false`. These are removed from the merge
/// result even when the base defines them, and the marker itself is dropped.
pub(crate) fn collect_removals(overlay: &ConfigMap) -> HashSet<String> {
    overlay
        .iter()
        .filter(|(_, value)| matches!(value, Value::Bool(false)))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Pass 2: relocate a wildcard key to the front of the map so that explicit
/// keys in the same pass are consumed after it and can override a subset of
/// whatever the wildcard expands to.
pub fn hoist_wildcard(map: ConfigMap) -> ConfigMap {
    if !map.contains_key(WILDCARD) {
        return map;
    }
    let mut hoisted = ConfigMap::new();
    if let Some(all) = map.get(WILDCARD) {
        hoisted.insert(WILDCARD.to_string(), all.clone());
    }
    for (key, value) in map {
        if key != WILDCARD {
            hoisted.insert(key, value);
        }
    }
    hoisted
}

/// Pass 3: apply the overlay's explicit values on top of the base. Nested
/// objects merge recursively through [`merge`]; scalars and arrays replace
/// outright.
pub(crate) fn apply_overrides(
    mut base: ConfigMap,
    overlay: &ConfigMap,
    removals: &HashSet<String>,
) -> ConfigMap {
    base.retain(|key, _| !removals.contains(key));
    for (key, value) in overlay {
        if removals.contains(key) {
            continue;
        }
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                *existing = merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    base
}

/// Merges `overlay` onto `base`, later fragment winning per key. The result
/// is normalized: removal markers are consumed, and a wildcard key sits at the
/// front of the ordering. Idempotent for a fixed overlay.
pub fn merge(base: &ConfigMap, overlay: &ConfigMap) -> ConfigMap {
    let removals = collect_removals(overlay);
    let merged = apply_overrides(base.clone(), overlay, &removals);
    hoist_wildcard(merged)
}

/// Checks a config map against an allow-list of recognized top-level keys.
/// An unrecognized key is a configuration error, never a silent ignore.
pub fn assert_valid_config(config: &ConfigMap, allowed: &[&str]) -> Result<(), SchemaError> {
    for key in config.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(SchemaError::Config(format!(
                "Unrecognized config key \"{}\" (allowed: {})",
                key,
                allowed.join(", ")
            )));
        }
    }
    Ok(())
}

/// Checks that every key in a config map is an identifier-shaped name. The
/// wildcard sentinel is exempt.
pub fn assert_valid_keys(config: &ConfigMap) -> Result<(), SchemaError> {
    for key in config.keys() {
        if key == WILDCARD {
            continue;
        }
        let mut chars = key.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !valid {
            return Err(SchemaError::Config(format!(
                "Invalid name \"{}\" in config",
                key
            )));
        }
    }
    Ok(())
}
