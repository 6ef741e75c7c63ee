//! Keyword replacement inside materialized outputs
//!
//! Keywords are regular expressions matched in multi-line mode; every match
//! is replaced. Input-specific keywords run before global ones, one after
//! another over the same buffer, so an earlier replacement can produce text
//! a later keyword matches. In replacement strings `$&` is the whole match,
//! `$1`..`$99` a capture group that exists, and `$$` a literal `$`; any other
//! `$` is kept as written.

use crate::config::{GlobalReplacementUse, InputConfig};
use crate::encoding::TextEncoding;
use crate::error::BuildError;
use crate::log::{self, Logger};
use crate::plan::BuildPlan;
use futures::future::join_all;
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Ordered `keyword -> replacement` list; re-inserting a keyword updates it in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMap(Vec<(String, String)>);

impl KeywordMap {
    pub fn insert(&mut self, keyword: impl Into<String>, replacement: impl Into<String>) {
        let keyword = keyword.into();
        let replacement = replacement.into();
        match self.0.iter_mut().find(|(k, _)| *k == keyword) {
            Some(entry) => entry.1 = replacement,
            None => self.0.push((keyword, replacement)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, r)| (k.as_str(), r.as_str()))
    }
}

/// Replacement rules of one invocation: per input and global
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementTable {
    pub inputs: HashMap<String, KeywordMap>,
    pub global: KeywordMap,
}

impl ReplacementTable {
    /// Build from `(input, keyword, replacement)` and `(keyword, replacement)` entries
    pub fn from_entries(
        replacements: &[(String, String, String)],
        global_replacements: &[(String, String)],
    ) -> Self {
        let mut table = Self::default();
        for (name, keyword, replacement) in replacements {
            table
                .inputs
                .entry(name.clone())
                .or_default()
                .insert(keyword.clone(), replacement.clone());
        }
        for (keyword, replacement) in global_replacements {
            table.global.insert(keyword.clone(), replacement.clone());
        }
        table
    }

    /// Whether the replacement stage runs at all for this input
    pub fn applies_to(&self, config: &InputConfig) -> bool {
        self.inputs.contains_key(&config.name) || config.use_global_replacements.is_enabled()
    }

    /// Ordered keyword list for an input: its own keywords, then the allowed global ones
    pub fn rules_for(&self, name: &str, use_global: &GlobalReplacementUse) -> Vec<(String, String)> {
        let own = self.inputs.get(name).into_iter().flat_map(|map| map.iter());
        let global = self.global.iter().filter(|(k, _)| use_global.allows(k));
        own.chain(global)
            .map(|(k, r)| (k.to_string(), r.to_string()))
            .collect()
    }
}

/// A compiled keyword
#[derive(Debug, Clone)]
pub struct Rule {
    pub keyword: String,
    pub pattern: Regex,
    pub replacement: String,
}

pub fn compile_rules(name: &str, pairs: Vec<(String, String)>) -> Result<Vec<Rule>, BuildError> {
    pairs
        .into_iter()
        .map(|(keyword, replacement)| {
            let pattern = RegexBuilder::new(&keyword)
                .multi_line(true)
                .build()
                .map_err(|source| BuildError::InvalidKeyword {
                    name: name.to_string(),
                    keyword: keyword.clone(),
                    source,
                })?;
            Ok(Rule {
                keyword,
                pattern,
                replacement,
            })
        })
        .collect()
}

/// Apply `rules` in order to `text`; returns the indices of the rules that matched
pub fn replace_in_text(text: &mut String, rules: &[Rule]) -> Vec<usize> {
    let mut matched = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        if rule.pattern.is_match(text) {
            let replaced = rule
                .pattern
                .replace_all(text, |caps: &Captures| {
                    expand_replacement(caps, &rule.replacement)
                })
                .into_owned();
            *text = replaced;
            matched.push(i);
        }
    }
    matched
}

/// Expand `$&`, `$n`, `$nn` and `$$` in `template`; everything else is literal
fn expand_replacement(caps: &Captures, template: &str) -> String {
    let group = |index: usize| {
        (index > 0 && index < caps.len()).then(|| caps.get(index).map_or("", |m| m.as_str()))
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits: Vec<usize> = after
            .chars()
            .take(2)
            .map_while(|c| c.to_digit(10))
            .map(|d| d as usize)
            .collect();

        if after.starts_with('$') {
            out.push('$');
            rest = &after[1..];
        } else if after.starts_with('&') {
            out.push_str(caps.get(0).map_or("", |m| m.as_str()));
            rest = &after[1..];
        } else if let Some(text) = digits
            .get(1)
            .and_then(|d| group(digits[0] * 10 + d))
        {
            out.push_str(text);
            rest = &after[2..];
        } else if let Some(text) = digits.first().and_then(|&d| group(d)) {
            out.push_str(text);
            rest = &after[1..];
        } else {
            out.push('$');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// What the replacement stage did for one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// No rules apply; no file was touched
    NotRequested,
    /// The configured encoding is not a text encoding; files left as copied
    EncodingUnsupported,
    /// Matching keywords, summed over all outputs
    Applied { replaced: usize },
}

/// Rewrite one output file; returns the number of keywords that matched
pub async fn apply(
    name: &str,
    dest: &Path,
    encoding: &TextEncoding,
    rules: &[Rule],
    log: &Logger,
) -> Result<usize, BuildError> {
    log.detail(format!("Running read of output at {}.", log::path(dest)));
    let bytes = fs::read(dest).await;
    let text = bytes.and_then(|b| encoding.decode(&b));
    let mut text = match text {
        Ok(text) => text,
        Err(source) => {
            log.detail_error(format!(
                "read of output at {} failed, reason: {}.",
                log::path(dest),
                source
            ));
            return Err(BuildError::Read {
                name: name.to_string(),
                path: dest.to_path_buf(),
                source,
            });
        }
    };

    log.detail(format!("Trying to replace in output at {}.", log::path(dest)));
    let matched = replace_in_text(&mut text, rules);
    for &i in &matched {
        log.detail(format!(
            "Replaced \"{}\" with \"{}\" in output at {}.",
            rules[i].keyword,
            rules[i].replacement,
            log::path(dest)
        ));
    }

    if !matched.is_empty() {
        let written = match encoding.encode(&text) {
            Ok(bytes) => fs::write(dest, bytes).await,
            Err(e) => Err(e),
        };
        if let Err(source) = written {
            log.detail_error(format!(
                "write to output at {} failed, reason: {}.",
                log::path(dest),
                source
            ));
            return Err(BuildError::Write {
                name: name.to_string(),
                path: dest.to_path_buf(),
                source,
            });
        }
    }

    log.detail_success(format!(
        "Completed {} replacement(s) in output at {}.",
        matched.len(),
        log::path(dest)
    ));
    Ok(matched.len())
}

/// Run the replacement stage over every output of `plan`
///
/// Outputs are rewritten concurrently; the stage fails if any of them fails.
pub async fn apply_all(
    plan: &BuildPlan,
    table: &ReplacementTable,
    log: &Logger,
) -> Result<ReplaceOutcome, BuildError> {
    if !table.applies_to(&plan.config) {
        log.detail(format!(
            "Did not replace in any output of input \"{}\".",
            plan.name
        ));
        return Ok(ReplaceOutcome::NotRequested);
    }

    if !plan.encoding.is_supported() {
        for dest in plan.destinations() {
            log.warning(format!(
                "Did not replace in output at {} because it had the wrong encoding \"{}\" (although still had valid replacements/global-replacements).",
                log::path(dest),
                plan.encoding
            ));
        }
        return Ok(ReplaceOutcome::EncodingUnsupported);
    }

    let rules = compile_rules(
        &plan.name,
        table.rules_for(&plan.name, &plan.config.use_global_replacements),
    )?;

    let results = join_all(
        plan.destinations()
            .map(|dest| apply(&plan.name, dest, &plan.encoding, &rules, log)),
    )
    .await;

    let mut replaced = 0;
    for result in results {
        replaced += result?;
    }
    Ok(ReplaceOutcome::Applied { replaced })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartialInputConfig;
    use crate::variant::Candidate;
    use crate::plan::plan_outputs;
    use std::fs as stdfs;
    use std::path::PathBuf;

    fn rules(pairs: &[(&str, &str)]) -> Vec<Rule> {
        compile_rules(
            "app",
            pairs
                .iter()
                .map(|(k, r)| (k.to_string(), r.to_string()))
                .collect(),
        )
        .unwrap()
    }

    fn entries(triples: &[(&str, &str, &str)]) -> Vec<(String, String, String)> {
        triples
            .iter()
            .map(|(a, b, c)| (a.to_string(), b.to_string(), c.to_string()))
            .collect()
    }

    fn pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    /// Config at `<root>/app/fvi.config.json` with one output `<root>/app/out.txt`
    fn plan_in(root: &Path, json: &str, content: &[u8]) -> BuildPlan {
        let dir = root.join("app");
        stdfs::create_dir_all(&dir).unwrap();
        let src = dir.join("prod.txt");
        stdfs::write(&src, content).unwrap();

        let mut config: PartialInputConfig = serde_json::from_str(json).unwrap();
        config.out_path = Some(String::new());
        config.output_name = Some("out".to_string());
        let config = config.resolve(&dir.join("fvi.config.json")).unwrap();

        let candidate = Candidate::parse(src.clone());
        let plan = plan_outputs(config, &[&candidate]);
        stdfs::copy(&src, &plan.src_dest_pairs[0].1).unwrap();
        plan
    }

    #[test]
    fn test_keyword_map_keeps_first_position() {
        let mut map = KeywordMap::default();
        map.insert("A", "1");
        map.insert("B", "2");
        map.insert("A", "3");
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_rules_order_input_before_global() {
        let table = ReplacementTable::from_entries(
            &entries(&[("app", "X", "Y"), ("web", "X", "W")]),
            &pairs(&[("Y", "Z"), ("Q", "R")]),
        );

        let all = table.rules_for("app", &GlobalReplacementUse::All);
        assert_eq!(all, pairs(&[("X", "Y"), ("Y", "Z"), ("Q", "R")]));

        let only = table.rules_for("app", &GlobalReplacementUse::Only(vec!["Q".to_string()]));
        assert_eq!(only, pairs(&[("X", "Y"), ("Q", "R")]));

        let off = table.rules_for("other", &GlobalReplacementUse::Off);
        assert!(off.is_empty());
    }

    #[test]
    fn test_sequential_application_compounds() {
        let mut text = "X X".to_string();
        let matched = replace_in_text(&mut text, &rules(&[("X", "Y"), ("Y", "Z")]));
        assert_eq!(text, "Z Z");
        assert_eq!(matched, vec![0, 1]);
    }

    #[test]
    fn test_keywords_are_multiline_patterns() {
        let mut text = "host=a\nhost=b\n".to_string();
        replace_in_text(&mut text, &rules(&[("^host=.*$", "host=prod")]));
        assert_eq!(text, "host=prod\nhost=prod\n");

        let mut text = "v1.2".to_string();
        replace_in_text(&mut text, &rules(&[(r"v(\d+)\.(\d+)", "v$2.$1")]));
        assert_eq!(text, "v2.1");
    }

    #[test]
    fn test_dollar_without_group_stays_literal() {
        let mut text = "price=PRICE pass=PASS home=HOME".to_string();
        replace_in_text(
            &mut text,
            &rules(&[("PRICE", "$5"), ("PASS", "p$word"), ("HOME", "$HOME/$")]),
        );
        assert_eq!(text, "price=$5 pass=p$word home=$HOME/$");
    }

    #[test]
    fn test_dollar_references() {
        let mut text = "key=abc".to_string();
        replace_in_text(&mut text, &rules(&[(r"key=(\w+)", "[$&] $$1 $1 $0 $10")]));
        assert_eq!(text, "[key=abc] $1 abc $0 abc0");
    }

    #[test]
    fn test_invalid_keyword_is_an_error() {
        let err = compile_rules("app", pairs(&[("(", "x")])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidKeyword { keyword, .. } if keyword == "("));
    }

    #[tokio::test]
    async fn test_apply_all_input_then_allowed_global() {
        let root = tempfile::tempdir().unwrap();
        let plan = plan_in(
            root.path(),
            r#"{ "default": "prod", "useGlobalReplacements": ["Y"] }"#,
            b"X X",
        );
        let table = ReplacementTable::from_entries(
            &entries(&[("app", "X", "Y")]),
            &pairs(&[("Y", "Z"), ("Z", "never")]),
        );

        let outcome = apply_all(&plan, &table, &Logger::default()).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::Applied { replaced: 2 });
        let dest = &plan.src_dest_pairs[0].1;
        assert_eq!(stdfs::read_to_string(dest).unwrap(), "Z Z");
    }

    #[tokio::test]
    async fn test_apply_all_without_rules_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let plan = plan_in(root.path(), r#"{ "default": "prod" }"#, b"X X");
        let dest = plan.src_dest_pairs[0].1.clone();
        stdfs::remove_file(&dest).unwrap();

        // The output is gone, so any read would fail
        let table = ReplacementTable::from_entries(&entries(&[("web", "X", "Y")]), &pairs(&[("X", "Z")]));
        let outcome = apply_all(&plan, &table, &Logger::default()).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::NotRequested);
    }

    #[tokio::test]
    async fn test_apply_all_unsupported_encoding_is_a_warning() {
        let root = tempfile::tempdir().unwrap();
        let plan = plan_in(
            root.path(),
            r#"{ "default": "prod", "encoding": "base64", "useGlobalReplacements": true }"#,
            b"X",
        );
        let table = ReplacementTable::from_entries(&[], &pairs(&[("X", "Y")]));

        let outcome = apply_all(&plan, &table, &Logger::default()).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::EncodingUnsupported);
        let dest = &plan.src_dest_pairs[0].1;
        assert_eq!(stdfs::read_to_string(dest).unwrap(), "X");
    }

    #[tokio::test]
    async fn test_apply_reports_read_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = PathBuf::from(root.path()).join("missing.txt");
        let err = apply(
            "app",
            &missing,
            &TextEncoding::Utf8,
            &rules(&[("X", "Y")]),
            &Logger::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BuildError::Read { .. }));
    }

    #[tokio::test]
    async fn test_apply_latin1_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let plan = plan_in(
            root.path(),
            r#"{ "default": "prod", "encoding": "latin1" }"#,
            &[b'c', 0xe9, b' ', b'X'],
        );
        let table = ReplacementTable::from_entries(&entries(&[("app", "X", "Y")]), &[]);

        apply_all(&plan, &table, &Logger::default()).await.unwrap();
        let dest = &plan.src_dest_pairs[0].1;
        assert_eq!(stdfs::read(dest).unwrap(), vec![b'c', 0xe9, b' ', b'Y']);
    }
}
