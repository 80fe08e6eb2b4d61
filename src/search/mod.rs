//! Search pattern module
//!
//! A [`SearchSpec`] holds the named regular expressions applied to every
//! visited page; a [`MatchSet`] collects what they found across a crawl.

pub mod presets;

use crate::config::SearchConfig;
use crate::crawler::find_pattern;
use crate::ConfigError;
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeMap;

/// Named search patterns, in declaration order
#[derive(Debug, Clone)]
pub struct SearchSpec {
    patterns: Vec<(String, Regex)>,
}

impl SearchSpec {
    /// Compiles a set of named patterns
    ///
    /// Fails if a name is used twice or a pattern does not compile.
    pub fn new<I, K, V>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut compiled: Vec<(String, Regex)> = Vec::new();
        for (name, pattern) in patterns {
            let name = name.into();
            if compiled.iter().any(|(existing, _)| *existing == name) {
                return Err(ConfigError::InvalidPattern(format!(
                    "duplicate pattern name '{}'",
                    name
                )));
            }
            let regex = Regex::new(pattern.as_ref())
                .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", name, e)))?;
            compiled.push((name, regex));
        }
        Ok(Self { patterns: compiled })
    }

    /// Builds the spec from the `[search]` configuration section
    ///
    /// Presets come first, in the order they are listed, followed by the
    /// explicit patterns.
    pub fn from_config(config: &SearchConfig) -> Result<Self, ConfigError> {
        let mut patterns: Vec<(String, String)> = Vec::new();
        for name in &config.presets {
            let pattern = presets::preset(name)
                .ok_or_else(|| ConfigError::InvalidPattern(format!("unknown preset '{}'", name)))?;
            patterns.push((name.clone(), pattern.to_string()));
        }
        for (name, pattern) in &config.patterns {
            patterns.push((name.clone(), pattern.clone()));
        }
        Self::new(patterns)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.patterns.iter().map(|(name, regex)| (name.as_str(), regex))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.iter().any(|(existing, _)| existing == name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Applies every pattern to a parsed page
    pub fn scan(&self, document: &Html) -> MatchSet {
        let mut matches = MatchSet::for_spec(self);
        for (name, regex) in self.iter() {
            let found = find_pattern(document, regex);
            if !found.is_empty() {
                tracing::debug!("Extending search {} with {:?}", name, found);
            }
            matches.extend(name, found);
        }
        matches
    }
}

/// Matches per pattern name
///
/// Every pattern of the spec has an entry, empty until something is found.
/// Matches keep discovery order and are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet(BTreeMap<String, Vec<String>>);

impl MatchSet {
    /// Creates an empty entry for every pattern in `spec`
    pub fn for_spec(spec: &SearchSpec) -> Self {
        Self(spec.names().map(|name| (name.to_string(), Vec::new())).collect())
    }

    pub fn extend(&mut self, name: &str, found: impl IntoIterator<Item = String>) {
        self.0.entry(name.to_string()).or_default().extend(found);
    }

    /// Appends every match of another set
    pub fn merge(&mut self, other: MatchSet) {
        for (name, found) in other.0 {
            self.0.entry(name).or_default().extend(found);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Returns true if the pattern has at least one match
    pub fn has_match(&self, name: &str) -> bool {
        self.0.get(name).map_or(false, |found| !found.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, found)| (name.as_str(), found.as_slice()))
    }

    /// Total number of matches over all patterns
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}
