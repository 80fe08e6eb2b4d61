use crate::crawler::{HrefTable, SeedResolution};
use crate::search::MatchSet;
use crate::state::CrawlState;
use crate::url::clean_host;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use url::Url;

/// Outcome of crawling one seed
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// The seed as given by the caller
    pub seed: String,

    /// The seed with the scheme that answered, if any did
    pub url: Option<Url>,

    /// Host of the resolved seed, subdomain included
    pub clean_host: Option<String>,

    pub ssl: Option<bool>,
    pub connection_error: bool,
    pub status_code: Option<u16>,

    /// True once any page of the site returned a response
    pub exists: bool,

    pub matches: MatchSet,

    /// Visited URLs in visiting order
    pub visited: Vec<Url>,

    pub external_urls: Vec<Url>,
    pub frame_counter: u32,
    pub href_counter: u32,

    /// The ranked href table, if any page offered links
    pub hrefs: Option<HrefTable>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Assembles the report from the final crawl state
    pub fn new(
        seed: &str,
        resolution: SeedResolution,
        state: CrawlState,
        started_at: DateTime<Utc>,
    ) -> Self {
        let visited = state.visited().to_vec();
        let external_urls = state.external_urls().to_vec();
        Self {
            seed: seed.to_string(),
            clean_host: resolution.url.as_ref().and_then(clean_host),
            url: resolution.url,
            ssl: resolution.ssl,
            connection_error: resolution.connection_error,
            status_code: resolution.status_code,
            exists: state.exists,
            matches: state.matches,
            visited,
            external_urls,
            frame_counter: state.frame_counter,
            href_counter: state.href_counter,
            hrefs: state.href_table,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => writeln!(f, "Matches in {}", url)?,
            None => writeln!(f, "Matches in {}", self.seed)?,
        }
        for (name, found) in self.matches.iter() {
            writeln!(f, "{} : {:?}", name, found)?;
        }
        Ok(())
    }
}

/// Writes reports as a pretty-printed JSON array
pub fn write_json_reports(path: &Path, reports: &[CrawlReport]) -> crate::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
