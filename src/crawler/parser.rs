//! HTML parser for extracting frames, links and pattern matches
//!
//! `scraper::Html` cannot be held across an await point, so a page is parsed
//! and scanned in one synchronous step into an owned [`ScannedPage`].

use crate::search::{MatchSet, SearchSpec};
use regex::Regex;
use scraper::{Html, Node, Selector};

/// Everything the crawl needs from one page
#[derive(Debug, Clone, Default)]
pub struct ScannedPage {
    /// `src` values of `<frame>` elements, in document order
    pub frames: Vec<String>,

    /// Raw `href` values of `<a>` elements, in document order
    pub links: Vec<String>,

    pub matches: MatchSet,
}

/// Parses an HTML document
pub fn parse_html(html: &str) -> Html {
    Html::parse_document(html)
}

/// Parses a page body and extracts frames, links and matches
///
/// # Example
///
/// ```
/// use pattern_crawl::crawler::scan_page;
/// use pattern_crawl::SearchSpec;
///
/// let spec = SearchSpec::new([("zip", r"\d{4}\s?[A-Z]{2}")]).unwrap();
/// let page = scan_page(r#"<a href="contact.html">1234 AB</a>"#, &spec);
/// assert_eq!(page.links, vec!["contact.html"]);
/// assert_eq!(page.matches.get("zip").unwrap(), ["1234 AB"]);
/// ```
pub fn scan_page(html: &str, spec: &SearchSpec) -> ScannedPage {
    let document = parse_html(html);
    ScannedPage {
        frames: find_frames(&document),
        links: find_links(&document),
        matches: spec.scan(&document),
    }
}

/// Returns the `src` of every `<frame>` element
pub fn find_frames(document: &Html) -> Vec<String> {
    select_attr(document, "frame[src]", "src")
}

/// Returns the `href` of every `<a>` element, unresolved
pub fn find_links(document: &Html) -> Vec<String> {
    select_attr(document, "a[href]", "href")
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .collect()
}

/// Returns the first match of `regex` in every text node that matches
///
/// Text split over several elements (`1234 <b>AB</b>`) is not matched as
/// a whole.
pub fn find_pattern(document: &Html, regex: &Regex) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => regex.find(text).map(|m| m.as_str().to_string()),
            _ => None,
        })
        .collect()
}
