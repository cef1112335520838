//! Regex-based component matching over extracted text.
//!
//! Each rule pairs a literal keyword with a suffix pattern. A rule is
//! compiled to `(?i)<keyword>\s*(<suffix>)` and every non-overlapping match
//! contributes its trimmed capture. Rules run independently over the whole
//! text, so one mention can surface under several rules:
//!
//! ```text
//! "Spindle ABC-123 and Motor XYZ"
//!   spindle -> "ABC-123 and Motor XYZ"
//!   motor   -> "XYZ"
//! ```

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

/// Suffix used by every built-in rule: letters, digits, hyphens and
/// whitespace directly following the keyword.
pub const DEFAULT_SUFFIX: &str = r"[a-zA-Z0-9\-\s]+";

/// Built-in keywords, in evaluation order.
pub const DEFAULT_KEYWORDS: [&str; 5] = ["spindle", "motor", "axis", "controller", "tool changer"];

/// Compiled program size cap per rule.
const RULE_SIZE_LIMIT: usize = 1 << 20;

/// A keyword and the pattern that captures the component name after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRule {
    pub keyword: String,
    pub suffix: String,
}

impl ComponentRule {
    pub fn new(keyword: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            suffix: suffix.into(),
        }
    }

    fn compile(&self) -> Result<Regex, regex::Error> {
        let pattern = format!(r"{}\s*({})", regex::escape(&self.keyword), self.suffix);
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(RULE_SIZE_LIMIT)
            .build()
    }
}

/// The built-in rule table.
pub fn default_rules() -> Vec<ComponentRule> {
    DEFAULT_KEYWORDS
        .iter()
        .map(|k| ComponentRule::new(*k, DEFAULT_SUFFIX))
        .collect()
}

/// Output of [`ComponentMatcher::match_components`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Distinct component names in first-seen order.
    pub components: Vec<String>,
    /// Keywords of rules that could not be evaluated.
    pub skipped_rules: Vec<String>,
}

struct CompiledRule {
    keyword: String,
    regex: Regex,
}

pub struct ComponentMatcher {
    rules: Vec<CompiledRule>,
    skipped: Vec<String>,
}

impl ComponentMatcher {
    pub fn new() -> Self {
        Self::with_rules(&default_rules())
    }

    /// Compiles `rules` in order. A rule that fails to compile is logged and
    /// skipped; the remaining rules are kept.
    pub fn with_rules(rules: &[ComponentRule]) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut skipped = Vec::new();

        for rule in rules {
            match rule.compile() {
                Ok(regex) => compiled.push(CompiledRule {
                    keyword: rule.keyword.clone(),
                    regex,
                }),
                Err(e) => {
                    tracing::error!(keyword = %rule.keyword, error = %e, "skipping component rule");
                    skipped.push(rule.keyword.clone());
                }
            }
        }

        Self {
            rules: compiled,
            skipped,
        }
    }

    /// Keywords of the rules that will be evaluated, in order.
    pub fn keywords(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.keyword.as_str()).collect()
    }

    pub fn match_components(&self, text: &str) -> MatchOutcome {
        let mut outcome = MatchOutcome {
            components: Vec::new(),
            skipped_rules: self.skipped.clone(),
        };

        if text.is_empty() {
            tracing::warn!("no text to match components against");
            return outcome;
        }

        let mut seen: HashSet<String> = HashSet::new();
        for rule in &self.rules {
            let mut hits = 0usize;
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let value = m.as_str().trim();
                hits += 1;
                // An all-whitespace capture trims to nothing.
                if value.is_empty() {
                    continue;
                }
                if seen.insert(value.to_string()) {
                    outcome.components.push(value.to_string());
                }
            }
            tracing::debug!(keyword = %rule.keyword, hits, "rule evaluated");
        }

        tracing::info!(
            unique = outcome.components.len(),
            "component extraction finished"
        );
        outcome
    }
}

impl Default for ComponentMatcher {
    fn default() -> Self {
        Self::new()
    }
}
