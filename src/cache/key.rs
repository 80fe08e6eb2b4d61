use sha2::{Digest, Sha256};

/// Longest readable prefix kept in front of the digest
const KEPT_PREFIX_LEN: usize = 120;

/// Hex digits of the signature digest appended to every key
const DIGEST_LEN: usize = 16;

/// Derives a filesystem-safe cache key from a call signature
///
/// The signature `name('arg1','arg2')` is rendered, every character that is
/// not ASCII alphanumeric or `-` becomes `_`, and runs of `_` collapse into
/// one. The readable part is cut at 120 characters and followed by a
/// SHA-256 digest of the full signature, so signatures that sanitize to the
/// same text still get distinct keys.
///
/// # Examples
///
/// ```
/// use pattern_crawl::cache::call_key;
///
/// let key = call_key("fetch_page", &["https://example.com/"]);
/// assert!(key.starts_with("fetch_page_https_example_com_"));
/// ```
pub fn call_key(name: &str, args: &[&str]) -> String {
    let rendered: Vec<String> = args.iter().map(|arg| format!("'{}'", arg)).collect();
    let signature = format!("{}({})", name, rendered.join(","));

    let mut key = String::with_capacity(signature.len());
    for c in signature.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && key.ends_with('_') {
            continue;
        }
        key.push(c);
    }
    let key = key.trim_matches('_');
    let readable = &key[..key.len().min(KEPT_PREFIX_LEN)];

    let digest = hex::encode(Sha256::digest(signature.as_bytes()));
    format!("{}_{}", readable, &digest[..DIGEST_LEN])
}
