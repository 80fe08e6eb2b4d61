//! URL handling module for Pattern-Crawl
//!
//! This module provides registrable-domain extraction and the checks that
//! decide whether an href found on a page is worth following.

mod domain;
mod href;

// Re-export main functions
pub use domain::{clean_host, registrable_domain, split_domain, strip_scheme, DomainParts};
pub use href::{
    branch_depth, check_href, resolve_href, validate_href, HrefCheck, HrefRejection,
    HrefResolution, HrefRules, DEFAULT_VALID_EXTENSIONS,
};

use ::url::Url;

/// Returns the first path segment of a URL when it lies below the site root
///
/// Pages directly under the root (and the root itself) share the `/` branch.
///
/// ```
/// use url::Url;
/// use pattern_crawl::url::branch_of;
///
/// let url = Url::parse("https://example.com/products/shoes.html").unwrap();
/// assert_eq!(branch_of(&url), "products");
/// let url = Url::parse("https://example.com/contact.html").unwrap();
/// assert_eq!(branch_of(&url), "/");
/// ```
pub fn branch_of(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() >= 2 {
        segments[0].to_string()
    } else {
        "/".to_string()
    }
}
