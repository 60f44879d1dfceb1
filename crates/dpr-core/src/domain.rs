//! Hostname and parent-domain extraction.
//!
//! Both functions fail soft: a URL that does not parse (or has no host)
//! yields `None` so callers can fall through to their next strategy.

/// Lower-cased hostname of `url`, or `None` when it cannot be parsed.
///
/// - `extract_domain("https://Docs.Google.com/x")` → `Some("docs.google.com")`
/// - `extract_domain("not a url")` → `None`
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}

/// Parent domain of `url`: the last two dot-separated labels of its hostname.
///
/// `localhost` and hostnames with two labels or fewer are returned whole.
/// This is a naive approximation of the registrable domain; multi-label
/// public suffixes are not recognised, so `news.bbc.co.uk` yields `co.uk`.
pub fn extract_parent_domain(url: &str) -> Option<String> {
    let domain = extract_domain(url)?;
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() <= 2 || domain == "localhost" {
        return Some(domain);
    }
    Some(labels[labels.len() - 2..].join("."))
}
