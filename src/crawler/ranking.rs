//! Ranked table of the hrefs worth following
//!
//! The table is built from the links of the first page that follows hrefs.
//! Hrefs matching one of the ranking patterns come first; otherwise the
//! discovery order is kept.

use crate::url::{validate_href, HrefRules};
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// One validated href
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrefRecord {
    /// The href as written on the page
    pub href: String,

    /// Absolute URL, if the href could be resolved
    pub url: Option<Url>,

    pub external: bool,
    pub relative: bool,

    /// 1 if the href matches a ranking pattern, else 0
    pub ranking: u8,

    /// Number of times the crawl followed this href
    pub clicks: u32,
}

/// Deduplicated hrefs in crawl order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HrefTable {
    records: Vec<HrefRecord>,
}

impl HrefTable {
    /// Validates every link against `base` and ranks the valid ones
    ///
    /// Links are probed one at a time; absolute links cost a HEAD request each.
    pub async fn build(
        client: &Client,
        links: &[String],
        base: &Url,
        rules: &HrefRules,
        ranking: &[Regex],
    ) -> Self {
        let mut records = Vec::new();
        for href in links {
            let check = validate_href(client, href, base, rules).await;
            if !check.is_valid() {
                continue;
            }
            records.push(HrefRecord {
                ranking: ranking_score(href, ranking),
                href: check.href,
                url: check.resolution.resolved,
                external: check.resolution.is_external,
                relative: check.resolution.is_relative,
                clicks: 0,
            });
        }

        let table = Self::from_records(records);
        tracing::debug!("Created href table with {} entries", table.len());
        table
    }

    /// Deduplicates and sorts already validated records
    ///
    /// Records resolving to the same URL collapse into one, placed where the
    /// URL first appeared. A relative record wins over an absolute one.
    /// Unresolved records are all kept.
    pub fn from_records(records: Vec<HrefRecord>) -> Self {
        let mut unique: Vec<HrefRecord> = Vec::with_capacity(records.len());
        for record in records {
            let existing = record.url.as_ref().and_then(|url| {
                unique
                    .iter()
                    .position(|kept| kept.url.as_ref() == Some(url))
            });
            match existing {
                Some(index) => {
                    if record.relative && !unique[index].relative {
                        unique[index] = record;
                    }
                }
                None => unique.push(record),
            }
        }

        // stable: ties keep discovery order
        unique.sort_by(|a, b| b.ranking.cmp(&a.ranking));
        Self { records: unique }
    }

    pub fn records(&self) -> &[HrefRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&HrefRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolved URLs of every external record, in table order
    pub fn externals(&self) -> impl Iterator<Item = &Url> {
        self.records
            .iter()
            .filter(|record| record.external)
            .filter_map(|record| record.url.as_ref())
    }

    pub fn record_click(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            record.clicks += 1;
        }
    }
}

/// Scores an href: 1 if any ranking pattern matches, else 0
pub fn ranking_score(href: &str, patterns: &[Regex]) -> u8 {
    if patterns.iter().any(|pattern| pattern.is_match(href)) {
        1
    } else {
        0
    }
}
