use crate::crawler::HrefTable;
use crate::search::{MatchSet, SearchSpec};
use crate::url::branch_of;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Mutable state of one crawl from a single seed
///
/// Every traversal step borrows this mutably; nothing else holds crawl state.
#[derive(Debug, Clone)]
pub struct CrawlState {
    visited: HashSet<Url>,

    /// Visited URLs in the order they were first marked
    visit_order: Vec<Url>,

    /// External URLs seen in href tables, without duplicates
    external_urls: Vec<Url>,

    /// Number of pages that contained at least one frame
    pub frame_counter: u32,

    /// Number of hrefs followed
    pub href_counter: u32,

    /// Number of followed hrefs per top-level path segment
    branch_counts: HashMap<String, u32>,

    stopped: bool,

    /// True once any page of the site returned a response
    pub exists: bool,

    pub matches: MatchSet,

    /// Ranked hrefs of the first page that offered links
    pub href_table: Option<HrefTable>,
}

impl CrawlState {
    /// Creates an empty state with a match entry for every search pattern
    pub fn new(spec: &SearchSpec) -> Self {
        Self {
            visited: HashSet::new(),
            visit_order: Vec::new(),
            external_urls: Vec::new(),
            frame_counter: 0,
            href_counter: 0,
            branch_counts: HashMap::new(),
            stopped: false,
            exists: false,
            matches: MatchSet::for_spec(spec),
            href_table: None,
        }
    }

    /// Marks a URL as visited
    ///
    /// Returns `false` if it had already been visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        if self.visited.insert(url.clone()) {
            self.visit_order.push(url.clone());
            true
        } else {
            false
        }
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    pub fn visited(&self) -> &[Url] {
        &self.visit_order
    }

    pub fn record_external(&mut self, url: &Url) {
        if !self.external_urls.contains(url) {
            self.external_urls.push(url.clone());
        }
    }

    pub fn external_urls(&self) -> &[Url] {
        &self.external_urls
    }

    /// Counts a followed href against its branch and returns the new count
    pub fn record_branch(&mut self, url: &Url) -> u32 {
        let count = self.branch_counts.entry(branch_of(url)).or_insert(0);
        *count += 1;
        *count
    }

    pub fn branch_count(&self, branch: &str) -> u32 {
        self.branch_counts.get(branch).copied().unwrap_or(0)
    }

    /// Sets the stop flag; it is never cleared
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CrawlState {
        let spec = SearchSpec::new([("zip", r"\d{4}")]).unwrap();
        CrawlState::new(&spec)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = state();
        assert!(!state.is_stopped());
        assert!(!state.exists);
        assert_eq!(state.href_counter, 0);
        assert_eq!(state.matches.get("zip"), Some(&[][..]));
    }

    #[test]
    fn test_mark_visited_once() {
        let mut state = state();
        let page = url("https://example.com/a.html");

        assert!(state.mark_visited(&page));
        assert!(!state.mark_visited(&page));
        assert!(state.is_visited(&page));
        assert_eq!(state.visited().len(), 1);
    }

    #[test]
    fn test_visit_order() {
        let mut state = state();
        state.mark_visited(&url("https://example.com/"));
        state.mark_visited(&url("https://example.com/b.html"));
        state.mark_visited(&url("https://example.com/a.html"));

        let order: Vec<&str> = state.visited().iter().map(Url::as_str).collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/",
                "https://example.com/b.html",
                "https://example.com/a.html"
            ]
        );
    }

    #[test]
    fn test_external_deduplicated() {
        let mut state = state();
        let other = url("https://other.org/");
        state.record_external(&other);
        state.record_external(&other);
        assert_eq!(state.external_urls().len(), 1);
    }

    #[test]
    fn test_branch_counts() {
        let mut state = state();
        assert_eq!(state.record_branch(&url("https://example.com/shop/a.html")), 1);
        assert_eq!(state.record_branch(&url("https://example.com/shop/b.html")), 2);
        assert_eq!(state.record_branch(&url("https://example.com/contact.html")), 1);
        assert_eq!(state.branch_count("shop"), 2);
        assert_eq!(state.branch_count("/"), 1);
        assert_eq!(state.branch_count("blog"), 0);
    }

    #[test]
    fn test_stop_is_permanent() {
        let mut state = state();
        state.stop();
        assert!(state.is_stopped());
        state.stop();
        assert!(state.is_stopped());
    }
}
