//! Localized message catalog
//!
//! Templates use positional `{0}`, `{1}` placeholders. Keys missing from the
//! configured overrides fall back to the built-in English text.

use ahash::AHashMap;
use std::collections::BTreeMap;

pub const NOT_CONFIGURED: &str = "msg_err_not_configured";
pub const CONFLICT_ZONE_MATERIAL: &str = "msg_err_conflict_zone_cannot_edit_material";
pub const WILDERNESS: &str = "msg_cache_block_error_wild";
pub const PLOT: &str = "msg_cache_block_error_plot";
pub const WAR_UNAFFILIATED: &str = "msg_cache_block_error_war_unaffiliated";
pub const CLAIM_LOOKUP: &str = "msg_err_claim_lookup";
pub const SYSTEM_ERROR: &str = "msg_err_system_error";

const DEFAULTS: &[(&str, &str)] = &[
    (NOT_CONFIGURED, "This world is not configured for protection."),
    (
        CONFLICT_ZONE_MATERIAL,
        "You cannot edit this material in a conflict zone ({0} {1}).",
    ),
    (WILDERNESS, "You cannot {0} here (wilderness default protection)."),
    (PLOT, "You cannot {0} in {1}'s territory."),
    (
        WAR_UNAFFILIATED,
        "You cannot {0} here: {1} has no alliance during war.",
    ),
    (CLAIM_LOOKUP, "Plot data at {1} is unavailable, you cannot {0} here."),
    (SYSTEM_ERROR, "Protection is in an error state, all edits are blocked."),
];

/// Message templates keyed by id
#[derive(Debug, Clone)]
pub struct Messages {
    templates: AHashMap<String, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            templates: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Messages {
    /// Built-in templates with `overrides` applied on top
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut messages = Self::default();
        for (key, template) in overrides {
            messages.templates.insert(key.clone(), template.clone());
        }
        messages
    }

    /// Render the template for `key`, substituting `{n}` with `args[n]`
    pub fn get(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.templates.get(key) else {
            return key.to_string();
        };
        let mut out = template.clone();
        for (i, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{}}}", i), arg);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_substitute_args() {
        let messages = Messages::default();
        let text = messages.get(WILDERNESS, &["destroy"]);
        assert_eq!(text, "You cannot destroy here (wilderness default protection).");
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let mut overrides = BTreeMap::new();
        overrides.insert(PLOT.to_string(), "{1}: no {0} for you".to_string());
        let messages = Messages::with_overrides(&overrides);
        assert_eq!(messages.get(PLOT, &["build", "Ashford"]), "Ashford: no build for you");
        assert!(messages.get(NOT_CONFIGURED, &[]).contains("not configured"));
    }

    #[test]
    fn test_unknown_key_renders_key() {
        assert_eq!(Messages::default().get("msg_missing", &["x"]), "msg_missing");
    }
}
