//! Href validation and resolution
//!
//! A link found on a page is only worth following when it looks like an
//! in-scope HTML page. [`check_href`] applies the cheap textual checks;
//! [`resolve_href`] then turns a valid href into an absolute URL, probing the
//! network for hrefs that are already absolute.

use crate::url::domain::{registrable_domain, strip_scheme};
use crate::NetworkErrorKind;
use reqwest::{Client, StatusCode};
use std::fmt;
use url::{ParseError, Url};

/// Extensions accepted when no other set is configured
pub const DEFAULT_VALID_EXTENSIONS: &[&str] = &[".html"];

/// Why an href was rejected by [`check_href`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrefRejection {
    /// The href is a bare `#` or `/`
    Placeholder,
    /// The href contains `#` or `?`
    ForbiddenCharacter,
    /// The href ends in a file extension outside the allowed set
    Extension,
    /// The href contains a colon that is not part of an http(s) scheme
    Colon,
    /// The href points deeper into the site than allowed
    TooDeep { depth: u32, max_depth: u32 },
}

impl fmt::Display for HrefRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => write!(f, "special page link"),
            Self::ForbiddenCharacter => write!(f, "contains a forbidden # or ?"),
            Self::Extension => write!(f, "extension is not an accepted page type"),
            Self::Colon => write!(f, "contains a colon outside the scheme"),
            Self::TooDeep { depth, max_depth } => {
                write!(f, "branch depth {} exceeds maximum {}", depth, max_depth)
            }
        }
    }
}

/// Rules applied to every href on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefRules {
    /// Accepted file extensions, including the leading dot
    pub valid_extensions: Vec<String>,

    /// Maximum branch depth of same-domain hrefs
    pub max_depth: u32,
}

impl Default for HrefRules {
    fn default() -> Self {
        Self {
            valid_extensions: DEFAULT_VALID_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_depth: 1,
        }
    }
}

/// Outcome of resolving an href to an absolute URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HrefResolution {
    /// The absolute URL, if the href could be resolved
    pub resolved: Option<Url>,
    /// The href is absolute and lives on another registrable domain
    pub is_external: bool,
    /// The href was relative and has been joined onto the base URL
    pub is_relative: bool,
    /// The href uses a scheme other than http(s)
    pub invalid_scheme: bool,
    /// The probe failed during the TLS handshake
    pub no_ssl: bool,
    /// The probe could not connect or timed out
    pub connection_error: bool,
}

/// Full result of validating one href
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefCheck {
    pub href: String,
    pub rejection: Option<HrefRejection>,
    pub resolution: HrefResolution,
}

impl HrefCheck {
    /// Returns true if the href passed every textual check
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Applies the textual checks to an href
///
/// The checks run in a fixed order and the first failing one is reported:
///
/// 1. bare `#` or `/`
/// 2. `#` or `?` anywhere
/// 3. a non-empty file extension outside `rules.valid_extensions`
/// 4. a `:` left after removing the http(s) scheme (`mailto:`, `tel:`, ports)
/// 5. for same-domain hrefs, a branch depth above `rules.max_depth`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pattern_crawl::url::{check_href, HrefRejection, HrefRules};
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let rules = HrefRules::default();
/// assert!(check_href("contact.html", &base, &rules).is_ok());
/// assert_eq!(check_href("logo.png", &base, &rules), Err(HrefRejection::Extension));
/// ```
pub fn check_href(href: &str, base: &Url, rules: &HrefRules) -> Result<(), HrefRejection> {
    if href == "#" || href == "/" {
        return Err(HrefRejection::Placeholder);
    }

    if href.contains(|c| c == '#' || c == '?') {
        return Err(HrefRejection::ForbiddenCharacter);
    }

    if let Some(ext) = file_extension(href) {
        let accepted = rules
            .valid_extensions
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(&ext));
        if !accepted {
            return Err(HrefRejection::Extension);
        }
    }

    if strip_scheme(href).contains(':') {
        return Err(HrefRejection::Colon);
    }

    if is_same_domain(href, base) {
        let depth = branch_depth(href, base);
        if depth > rules.max_depth {
            return Err(HrefRejection::TooDeep {
                depth,
                max_depth: rules.max_depth,
            });
        }
    }

    Ok(())
}

/// Returns the lowercase extension of the last path segment, dot included
fn file_extension(href: &str) -> Option<String> {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or("");

    // leading dots belong to the name, as in ".profile"
    let name = segment.trim_start_matches('.');
    let offset = segment.len() - name.len();
    name.rfind('.')
        .map(|dot| segment[offset + dot..].to_lowercase())
}

/// Relative hrefs always count as same-domain
fn is_same_domain(href: &str, base: &Url) -> bool {
    match Url::parse(href) {
        Ok(url) if url.host().is_some() => registrable_domain(&url) == registrable_domain(base),
        _ => true,
    }
}

/// Number of path segments separating an href from the base URL
///
/// A trailing `.html` page does not count as a branch of its own.
pub fn branch_depth(href: &str, base: &Url) -> u32 {
    let href = strip_scheme(href);
    let base = strip_scheme(base.as_str());

    let relative = href.strip_prefix(base.as_str()).unwrap_or(&href);
    let trimmed = relative.strip_prefix('/').unwrap_or(relative);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let mut depth = trimmed.split('/').count() as u32;
    if relative.ends_with(".html") {
        depth = depth.saturating_sub(1);
    }
    depth
}

/// Resolves a valid href to an absolute URL
///
/// Hrefs without a scheme are joined onto `base`. Absolute hrefs are probed
/// with a HEAD request: a 200 resolves them, a non-200 on `http://` is retried
/// once over `https://`, and any failure leaves them unresolved with the
/// matching diagnostic flag set.
pub async fn resolve_href(client: &Client, href: &str, base: &Url) -> HrefResolution {
    let mut resolution = HrefResolution::default();

    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            match base.join(href) {
                Ok(joined) => {
                    resolution.resolved = Some(joined);
                    resolution.is_relative = true;
                }
                Err(e) => tracing::debug!("Cannot join {} onto {}: {}", href, base, e),
            }
            return resolution;
        }
        Err(e) => {
            tracing::debug!("Skipping malformed href {}: {}", href, e);
            return resolution;
        }
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        tracing::debug!("Skipping invalid scheme link {}", href);
        resolution.invalid_scheme = true;
        return resolution;
    }

    loop {
        match client.head(url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                let external = registrable_domain(&url) != registrable_domain(base);
                tracing::debug!("Got 200 code from {} (external: {})", url, external);
                resolution.is_external = external;
                resolution.resolved = Some(url);
                return resolution;
            }
            Ok(response) if url.scheme() == "http" => {
                tracing::debug!("Got {} from {}. Checking with https", response.status(), url);
                if url.set_scheme("https").is_err() {
                    return resolution;
                }
            }
            Ok(response) => {
                tracing::debug!("Failed to resolve {}: HTTP {}", url, response.status());
                return resolution;
            }
            Err(e) => {
                match NetworkErrorKind::from_reqwest(&e) {
                    NetworkErrorKind::Tls => {
                        tracing::debug!("No valid SSL for {}", url);
                        resolution.no_ssl = true;
                    }
                    NetworkErrorKind::Connect | NetworkErrorKind::Timeout => {
                        tracing::info!("Connection error for {}: {}", url, e);
                        resolution.connection_error = true;
                    }
                    kind => tracing::debug!("Failed to probe {} ({}): {}", url, kind, e),
                }
                return resolution;
            }
        }
    }
}

/// Checks an href and, if it is valid, resolves it
pub async fn validate_href(client: &Client, href: &str, base: &Url, rules: &HrefRules) -> HrefCheck {
    match check_href(href, base, rules) {
        Ok(()) => HrefCheck {
            href: href.to_string(),
            rejection: None,
            resolution: resolve_href(client, href, base).await,
        },
        Err(rejection) => {
            tracing::debug!("Skipping {}: {}", href, rejection);
            HrefCheck {
                href: href.to_string(),
                rejection: Some(rejection),
                resolution: HrefResolution::default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn rules(max_depth: u32) -> HrefRules {
        HrefRules {
            max_depth,
            ..HrefRules::default()
        }
    }

    #[test]
    fn test_placeholders_rejected() {
        assert_eq!(check_href("#", &base(), &rules(1)), Err(HrefRejection::Placeholder));
        assert_eq!(check_href("/", &base(), &rules(1)), Err(HrefRejection::Placeholder));
    }

    #[test]
    fn test_forbidden_characters_rejected() {
        assert_eq!(
            check_href("page.html#top", &base(), &rules(1)),
            Err(HrefRejection::ForbiddenCharacter)
        );
        assert_eq!(
            check_href("search.html?q=1", &base(), &rules(1)),
            Err(HrefRejection::ForbiddenCharacter)
        );
    }

    #[test]
    fn test_extension_rejected() {
        assert_eq!(check_href("logo.png", &base(), &rules(1)), Err(HrefRejection::Extension));
        assert_eq!(
            check_href("/files/report.PDF", &base(), &rules(3)),
            Err(HrefRejection::Extension)
        );
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert!(check_href("CONTACT.HTML", &base(), &rules(1)).is_ok());
    }

    #[test]
    fn test_custom_extensions() {
        let rules = HrefRules {
            valid_extensions: vec![".html".to_string(), ".php".to_string()],
            max_depth: 1,
        };
        assert!(check_href("contact.php", &base(), &rules).is_ok());
    }

    #[test]
    fn test_no_extension_accepted() {
        assert!(check_href("contact", &base(), &rules(1)).is_ok());
        assert!(check_href("https://example.com/", &base(), &rules(1)).is_ok());
    }

    #[test]
    fn test_colon_rejected() {
        assert_eq!(check_href("tel:0123456789", &base(), &rules(1)), Err(HrefRejection::Colon));
        assert_eq!(
            check_href("javascript:void(0)", &base(), &rules(1)),
            Err(HrefRejection::Colon)
        );
    }

    #[test]
    fn test_mailto_rejected() {
        // the domain in the address reads as an extension first
        assert!(check_href("mailto:info@example.com", &base(), &rules(1)).is_err());
    }

    #[test]
    fn test_first_failing_check_wins() {
        assert_eq!(
            check_href("image.png?size=2", &base(), &rules(1)),
            Err(HrefRejection::ForbiddenCharacter)
        );
    }

    #[test]
    fn test_branch_depth() {
        assert_eq!(branch_depth("contact.html", &base()), 0);
        assert_eq!(branch_depth("/about/", &base()), 1);
        assert_eq!(branch_depth("/about/team.html", &base()), 1);
        assert_eq!(branch_depth("https://example.com/a/b/c", &base()), 3);
        assert_eq!(branch_depth("http://example.com/a/b.html", &base()), 1);
    }

    #[test]
    fn test_too_deep_rejected() {
        assert_eq!(
            check_href("/a/b/c.html", &base(), &rules(1)),
            Err(HrefRejection::TooDeep {
                depth: 2,
                max_depth: 1
            })
        );
        assert!(check_href("/a/b/c.html", &base(), &rules(2)).is_ok());
    }

    #[test]
    fn test_other_domain_skips_depth_check() {
        assert!(check_href("https://other.org/a/b/c/d", &base(), &rules(1)).is_ok());
    }

    #[tokio::test]
    async fn test_resolve_relative() {
        let client = Client::new();
        let base = Url::parse("https://example.com/dir/index.html").unwrap();
        let resolution = resolve_href(&client, "contact.html", &base).await;

        assert!(resolution.is_relative);
        assert!(!resolution.is_external);
        assert_eq!(
            resolution.resolved.unwrap().as_str(),
            "https://example.com/dir/contact.html"
        );
    }

    #[tokio::test]
    async fn test_resolve_invalid_scheme() {
        let client = Client::new();
        let resolution = resolve_href(&client, "ftp://example.com/file.html", &base()).await;

        assert!(resolution.invalid_scheme);
        assert!(resolution.resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_absolute_external() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/about.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let href = format!("{}/about.html", server.uri());
        let resolution = resolve_href(&client, &href, &base()).await;

        assert_eq!(resolution.resolved.unwrap().as_str(), href);
        assert!(resolution.is_external);
        assert!(!resolution.is_relative);
    }

    #[tokio::test]
    async fn test_resolve_absolute_same_domain() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new();
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let href = format!("{}/about.html", server.uri());
        let resolution = resolve_href(&client, &href, &base).await;

        assert!(resolution.resolved.is_some());
        assert!(!resolution.is_external);
    }

    #[tokio::test]
    async fn test_resolve_missing_page_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new();
        let href = format!("{}/gone.html", server.uri());
        let resolution = resolve_href(&client, &href, &base()).await;

        assert!(resolution.resolved.is_none());
        assert!(!resolution.is_external);
    }

    #[tokio::test]
    async fn test_resolve_connection_refused() {
        let client = Client::new();
        // port 9 (discard) is closed on test machines
        let resolution = resolve_href(&client, "http://127.0.0.1:9/page.html", &base()).await;

        assert!(resolution.resolved.is_none());
        assert!(resolution.connection_error || resolution.no_ssl);
    }

    #[tokio::test]
    async fn test_validate_rejected_href_not_resolved() {
        let client = Client::new();
        let check = validate_href(&client, "photo.jpg", &base(), &rules(1)).await;

        assert!(!check.is_valid());
        assert_eq!(check.rejection, Some(HrefRejection::Extension));
        assert!(check.resolution.resolved.is_none());
    }
}
