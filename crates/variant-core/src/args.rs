//! Consumption of `flag` and `key=value` command-line tokens
//!
//! Tokens are order-independent and each is consumed at most once. The
//! consume functions take the token list by value and hand back the residual
//! list next to what they extracted, so callers thread the remainder forward.

use crate::error::ArgError;
use std::path::PathBuf;

/// Remove the first token equal to `flag`
pub fn consume_flag(tokens: Vec<String>, flag: &str) -> (Vec<String>, bool) {
    let mut tokens = tokens;
    match tokens.iter().position(|t| t == flag) {
        Some(index) => {
            tokens.remove(index);
            (tokens, true)
        }
        None => (tokens, false),
    }
}

/// Remove the first `key=value` token and return its value
pub fn consume_key_value(tokens: Vec<String>, key: &str) -> (Vec<String>, Option<String>) {
    let mut tokens = tokens;
    if key.is_empty() {
        return (tokens, None);
    }
    match tokens.iter().position(|t| value_of(t, key).is_some()) {
        Some(index) => {
            let token = tokens.remove(index);
            let value = token[key.len() + 1..].to_string();
            (tokens, Some(value))
        }
        None => (tokens, None),
    }
}

/// Remove every `key=value` token and return their values in order
pub fn consume_all_key_values(tokens: Vec<String>, key: &str) -> (Vec<String>, Vec<String>) {
    if key.is_empty() {
        return (tokens, Vec::new());
    }
    let (matched, remaining): (Vec<String>, Vec<String>) = tokens
        .into_iter()
        .partition(|t| value_of(t, key).is_some());
    let values = matched
        .into_iter()
        .map(|t| t[key.len() + 1..].to_string())
        .collect();
    (remaining, values)
}

fn value_of<'a>(token: &'a str, key: &str) -> Option<&'a str> {
    token.strip_prefix(key)?.strip_prefix('=')
}

/// Options of one build invocation, as given on the command line or in the
/// global config's `options`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Requested variant (the first bare token)
    pub variant: Option<String>,

    /// Root directory searched for input configs
    pub path: Option<PathBuf>,

    /// Global config file
    pub config: Option<PathBuf>,

    /// Only build these inputs (empty = all)
    pub include: Vec<String>,

    /// Never build these inputs
    pub exclude: Vec<String>,

    /// `(input, variant)` pairs; later pairs win for the same input
    pub overrides: Vec<(String, String)>,

    /// `(input, keyword, replacement)` triples
    pub replacements: Vec<(String, String, String)>,

    /// `(keyword, replacement)` pairs
    pub global_replacements: Vec<(String, String)>,

    pub verbose: bool,

    /// Bare tokens left over after the requested variant
    pub ignored: Vec<String>,
}

impl BuildOptions {
    /// Parse a token list into options
    pub fn parse(tokens: Vec<String>) -> Result<Self, ArgError> {
        let (tokens, path) = consume_key_value(tokens, "path");
        let (tokens, config) = consume_key_value(tokens, "config");
        let (tokens, include) = consume_key_value(tokens, "include");
        let (tokens, exclude) = consume_key_value(tokens, "exclude");
        let (tokens, overrides) = consume_all_key_values(tokens, "override");
        let (tokens, legacy_overrides) = consume_all_key_values(tokens, "override-variant");
        let (tokens, replacements) = consume_all_key_values(tokens, "replace");
        let (tokens, global_replacements) = consume_all_key_values(tokens, "global-replace");
        let (tokens, verbose) = consume_flag(tokens, "verbose");

        let overrides = legacy_overrides
            .into_iter()
            .chain(overrides)
            .map(|value| {
                let mut fields = value.splitn(2, ',');
                match (fields.next(), fields.next()) {
                    (Some(name), Some(variant)) => Ok((name.to_string(), variant.to_string())),
                    _ => Err(ArgError::Malformed {
                        key: "override",
                        value,
                        expected: "<name>,<variant>",
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let replacements = replacements
            .into_iter()
            .map(|value| {
                let mut fields = value.splitn(3, ',');
                match (fields.next(), fields.next(), fields.next()) {
                    (Some(name), Some(keyword), Some(replacement)) => Ok((
                        name.to_string(),
                        keyword.to_string(),
                        replacement.to_string(),
                    )),
                    _ => Err(ArgError::Malformed {
                        key: "replace",
                        value,
                        expected: "<name>,<keyword>,<replacement>",
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let global_replacements = global_replacements
            .into_iter()
            .map(|value| {
                let mut fields = value.splitn(2, ',');
                match (fields.next(), fields.next()) {
                    (Some(keyword), Some(replacement)) => {
                        Ok((keyword.to_string(), replacement.to_string()))
                    }
                    _ => Err(ArgError::Malformed {
                        key: "global-replace",
                        value,
                        expected: "<keyword>,<replacement>",
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rest = tokens.into_iter();
        let variant = rest.next();

        Ok(Self {
            variant,
            path: path.map(PathBuf::from),
            config: config.map(PathBuf::from),
            include: split_names(include),
            exclude: split_names(exclude),
            overrides,
            replacements,
            global_replacements,
            verbose,
            ignored: rest.collect(),
        })
    }

    /// Layer these options on top of lower-priority `base` options
    ///
    /// Single-valued options keep `self` when set. Repeatable options keep
    /// `base` entries first so that entries from `self` win per key.
    pub fn layered_over(self, base: BuildOptions) -> BuildOptions {
        BuildOptions {
            variant: self.variant.or(base.variant),
            path: self.path.or(base.path),
            config: self.config.or(base.config),
            include: if self.include.is_empty() {
                base.include
            } else {
                self.include
            },
            exclude: if self.exclude.is_empty() {
                base.exclude
            } else {
                self.exclude
            },
            overrides: base.overrides.into_iter().chain(self.overrides).collect(),
            replacements: base
                .replacements
                .into_iter()
                .chain(self.replacements)
                .collect(),
            global_replacements: base
                .global_replacements
                .into_iter()
                .chain(self.global_replacements)
                .collect(),
            verbose: self.verbose || base.verbose,
            ignored: base.ignored.into_iter().chain(self.ignored).collect(),
        }
    }
}

fn split_names(csv: Option<String>) -> Vec<String> {
    csv.map(|s| {
        s.split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
