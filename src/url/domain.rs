use url::{Host, Url};

/// The host of a URL split into its subdomain and registrable domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    /// Everything left of the registrable domain, without the trailing dot
    pub subdomain: String,

    /// The public-suffix-aware base domain (e.g. `example.co.uk`)
    pub registrable: String,
}

/// Splits the host of a URL into subdomain and registrable domain
///
/// IP hosts and hosts that are themselves a public suffix (such as
/// `localhost`) are returned whole as the registrable part.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pattern_crawl::url::split_domain;
///
/// let url = Url::parse("https://www.example.co.uk/contact.html").unwrap();
/// let parts = split_domain(&url).unwrap();
/// assert_eq!(parts.subdomain, "www");
/// assert_eq!(parts.registrable, "example.co.uk");
/// ```
pub fn split_domain(url: &Url) -> Option<DomainParts> {
    match url.host()? {
        Host::Ipv4(addr) => Some(DomainParts {
            subdomain: String::new(),
            registrable: addr.to_string(),
        }),
        Host::Ipv6(addr) => Some(DomainParts {
            subdomain: String::new(),
            registrable: addr.to_string(),
        }),
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_lowercase();
            let registrable = psl::domain_str(name.as_str())
                .unwrap_or(name.as_str())
                .to_string();
            let subdomain = name
                .strip_suffix(registrable.as_str())
                .map(|rest| rest.trim_end_matches('.'))
                .unwrap_or("")
                .to_string();

            Some(DomainParts {
                subdomain,
                registrable,
            })
        }
    }
}

/// Returns the registrable domain of a URL
pub fn registrable_domain(url: &Url) -> Option<String> {
    split_domain(url).map(|parts| parts.registrable)
}

/// Returns the host of a URL without any path, as subdomain plus registrable domain
///
/// ```
/// use url::Url;
/// use pattern_crawl::url::clean_host;
///
/// let url = Url::parse("http://www.example.com/about/team.html").unwrap();
/// assert_eq!(clean_host(&url), Some("www.example.com".to_string()));
/// ```
pub fn clean_host(url: &Url) -> Option<String> {
    let parts = split_domain(url)?;
    if parts.subdomain.is_empty() {
        Some(parts.registrable)
    } else {
        Some(format!("{}.{}", parts.subdomain, parts.registrable))
    }
}

/// Removes every `http://` and `https://` prefix occurrence from a string
pub fn strip_scheme(url: &str) -> String {
    url.replace("https://", "").replace("http://", "")
}
