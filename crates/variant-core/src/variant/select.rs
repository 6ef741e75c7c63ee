//! Variant selection: override > requested > fallback chain > default

use crate::config::InputConfig;
use crate::error::BuildError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Upper bound on fallback hops; guards against cyclic `fallbacks` maps.
/// Exhausting it resolves to the default variant.
pub const MAX_FALLBACK_STEPS: usize = 100;

/// How the selected variant was arrived at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReason {
    Override,
    Requested,
    /// Reached through `fallbacks`, starting from `from`
    Fallback { from: String },
    Default,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionReason::Override => write!(f, "override"),
            SelectionReason::Requested => write!(f, "requested"),
            SelectionReason::Fallback { from } => write!(f, "fallback from \"{}\"", from),
            SelectionReason::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub variant: String,
    pub reason: SelectionReason,
}

/// Pick the variant to build for `input_name`
///
/// The returned variant is always one of `available`; if even the default
/// variant has no file the input fails with [`BuildError::VariantUnresolved`].
pub fn select(
    available: &BTreeSet<String>,
    requested: Option<&str>,
    input_name: &str,
    overrides: &HashMap<String, String>,
    config: &InputConfig,
) -> Result<Selection, BuildError> {
    let default = &config.default_variant;

    let (wanted, wanted_reason) = match overrides.get(input_name) {
        Some(variant) => (Some(variant.as_str()), SelectionReason::Override),
        None => (requested, SelectionReason::Requested),
    };

    let mut selection = match wanted.filter(|v| !v.is_empty()) {
        None => Selection {
            variant: default.clone(),
            reason: SelectionReason::Default,
        },
        Some(wanted) => {
            let mut current = wanted.to_string();
            let mut reason = wanted_reason;
            let mut steps = 0;
            while steps < MAX_FALLBACK_STEPS
                && current != *default
                && !available.contains(&current)
            {
                let Some(next) = config.fallbacks.get(&current) else {
                    break;
                };
                current = next.clone();
                reason = SelectionReason::Fallback {
                    from: wanted.to_string(),
                };
                steps += 1;
            }
            Selection {
                variant: current,
                reason,
            }
        }
    };

    if !available.contains(&selection.variant) {
        selection = Selection {
            variant: default.clone(),
            reason: SelectionReason::Default,
        };
    }

    if !available.contains(&selection.variant) {
        return Err(BuildError::VariantUnresolved {
            name: input_name.to_string(),
            default: default.clone(),
        });
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartialInputConfig;
    use std::path::Path;

    fn config(json: &str) -> InputConfig {
        serde_json::from_str::<PartialInputConfig>(json)
            .unwrap()
            .resolve(Path::new("/in/app/fvi.config.json"))
            .unwrap()
    }

    fn tags(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_request_uses_default() {
        let cfg = config(r#"{ "default": "prod" }"#);
        let sel = select(&tags(&["dev", "prod"]), None, "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "prod");
        assert_eq!(sel.reason, SelectionReason::Default);

        let sel = select(&tags(&["dev", "prod"]), Some(""), "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "prod");
    }

    #[test]
    fn test_requested_variant_wins_when_present() {
        let cfg = config(r#"{ "default": "prod", "fallbacks": { "dev": "prod" } }"#);
        let sel = select(&tags(&["dev", "prod"]), Some("dev"), "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "dev");
        assert_eq!(sel.reason, SelectionReason::Requested);
    }

    #[test]
    fn test_override_beats_requested() {
        let cfg = config(r#"{ "default": "a" }"#);
        let sel = select(
            &tags(&["a", "b"]),
            Some("a"),
            "input",
            &overrides(&[("input", "b")]),
            &cfg,
        )
        .unwrap();
        assert_eq!(sel.variant, "b");
        assert_eq!(sel.reason, SelectionReason::Override);
    }

    #[test]
    fn test_override_for_other_input_is_ignored() {
        let cfg = config(r#"{ "default": "a" }"#);
        let sel = select(
            &tags(&["a", "b"]),
            Some("a"),
            "app",
            &overrides(&[("other", "b")]),
            &cfg,
        )
        .unwrap();
        assert_eq!(sel.variant, "a");
    }

    #[test]
    fn test_fallback_bridges_missing_variant() {
        let cfg = config(r#"{ "default": "prod", "fallbacks": { "staging": "prod" } }"#);
        let sel = select(&tags(&["prod"]), Some("staging"), "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "prod");
    }

    #[test]
    fn test_fallback_chain_stops_at_first_present_variant() {
        let cfg = config(
            r#"{ "default": "prod", "fallbacks": { "feature": "dev", "dev": "staging", "staging": "prod" } }"#,
        );
        let sel = select(
            &tags(&["prod", "staging"]),
            Some("feature"),
            "app",
            &overrides(&[]),
            &cfg,
        )
        .unwrap();
        assert_eq!(sel.variant, "staging");
        assert_eq!(
            sel.reason,
            SelectionReason::Fallback {
                from: "feature".to_string()
            }
        );
    }

    #[test]
    fn test_missing_request_without_fallbacks_uses_default() {
        let cfg = config(r#"{ "default": "prod" }"#);
        let sel = select(&tags(&["prod"]), Some("qa"), "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "prod");
        assert_eq!(sel.reason, SelectionReason::Default);
    }

    #[test]
    fn test_cyclic_fallbacks_terminate_and_fail() {
        let cfg = config(r#"{ "default": "c", "fallbacks": { "a": "b", "b": "a" } }"#);
        let err = select(&tags(&[]), Some("a"), "app", &overrides(&[]), &cfg).unwrap_err();
        assert!(matches!(err, BuildError::VariantUnresolved { .. }));
    }

    #[test]
    fn test_cyclic_fallbacks_resolve_to_present_default() {
        let cfg = config(r#"{ "default": "c", "fallbacks": { "a": "b", "b": "a" } }"#);
        let sel = select(&tags(&["c"]), Some("a"), "app", &overrides(&[]), &cfg).unwrap();
        assert_eq!(sel.variant, "c");
        assert_eq!(sel.reason, SelectionReason::Default);
    }

    #[test]
    fn test_unresolved_when_default_has_no_file() {
        let cfg = config(r#"{ "default": "prod" }"#);
        let err = select(&tags(&["dev"]), None, "app", &overrides(&[]), &cfg).unwrap_err();
        match err {
            BuildError::VariantUnresolved { name, default } => {
                assert_eq!(name, "app");
                assert_eq!(default, "prod");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_selection_is_always_available() {
        let cfg = config(
            r#"{ "default": "d", "fallbacks": { "a": "b", "b": "c", "c": "a", "x": "d" } }"#,
        );
        let available = tags(&["b", "d"]);
        for requested in ["a", "b", "c", "d", "x", "y", ""] {
            let sel = select(&available, Some(requested), "app", &overrides(&[]), &cfg).unwrap();
            assert!(available.contains(&sel.variant), "{requested} -> {}", sel.variant);
        }
    }
}
