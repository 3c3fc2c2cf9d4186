//! Best-effort host extraction.
//!
//! Extraction is total: every input yields a string. When a URI cannot be
//! understood as a host, the result degrades to the lowercased input so the
//! value still works as a grouping key.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

static IPV4_WITH_PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}(?::\d+)?$").expect("valid regex")
});
static IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").expect("valid regex"));
static HOST_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid regex"));

const SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "file://"];
const HOST_KEYWORDS: [&str; 5] = ["localhost", "api", "www", "app", "portal"];

/// How a domain value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    /// Input was empty
    Empty,
    /// IPv4 literal, optionally with port, returned verbatim
    IpLiteral,
    /// Bracketed IPv6 literal
    Ipv6Literal,
    /// Schemeless token that does not look like a host
    Opaque,
    /// `localhost`
    Localhost,
    /// A cleaned hostname
    Hostname,
    /// Parsing failed or the host was rejected; value is the lowercased input
    Fallback,
}

/// A domain value together with how it was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// The domain string used as a grouping key
    pub value: String,
    /// Which extraction rule produced the value
    pub kind: DomainKind,
}

impl Domain {
    fn new(value: impl Into<String>, kind: DomainKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

/// Extract the canonical host of a URI.
///
/// # Example
///
/// ```
/// use credupe::normalize::extract_domain;
///
/// assert_eq!(extract_domain("www.Example.com/path"), "example.com");
/// assert_eq!(extract_domain("192.168.1.1:8080/x"), "192.168.1.1:8080");
/// assert_eq!(extract_domain("localhost:3000"), "localhost");
/// assert_eq!(extract_domain(""), "");
/// ```
#[must_use]
pub fn extract_domain(uri: &str) -> String {
    analyze_domain(uri).value
}

/// Extract the canonical host of a URI, reporting which rule applied.
#[must_use]
pub fn analyze_domain(uri: &str) -> Domain {
    let text = uri.trim();
    if text.is_empty() {
        return Domain::new("", DomainKind::Empty);
    }

    let host_part = text.split('/').next().unwrap_or(text);
    if IPV4_WITH_PORT.is_match(host_part) {
        return Domain::new(host_part, DomainKind::IpLiteral);
    }
    if host_part.contains('[') && host_part.contains(']') {
        return Domain::new(host_part, DomainKind::Ipv6Literal);
    }

    let fallback = || Domain::new(text.to_lowercase(), DomainKind::Fallback);
    let lowered = text.to_lowercase();

    let candidate = if SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        text.to_string()
    } else if looks_like_host(&lowered) {
        format!("http://{}", text)
    } else {
        return Domain::new(lowered, DomainKind::Opaque);
    };

    let host = match authority_host(&candidate) {
        Some(h) if !h.is_empty() => h,
        _ => return fallback(),
    };

    if host == "localhost" {
        return Domain::new(host, DomainKind::Localhost);
    }
    if IPV4.is_match(&host) {
        return Domain::new(host, DomainKind::IpLiteral);
    }
    if host.contains('[') {
        return Domain::new(host, DomainKind::Ipv6Literal);
    }
    if !host.contains('.') {
        return fallback();
    }
    if let Err(e) = Url::parse(&candidate) {
        log::trace!("URL parse failed for {:?}: {}", text, e);
        return fallback();
    }

    let host = host.strip_prefix("www.").unwrap_or(&host);
    if !HOST_CHARS.is_match(host)
        || host.starts_with(['.', '-'])
        || host.ends_with(['.', '-'])
    {
        return fallback();
    }

    Domain::new(host, DomainKind::Hostname)
}

/// Host text as written in the authority of `candidate`, lowercased.
///
/// Userinfo and port are dropped. The text is not decoded or re-encoded, so
/// the result only ever contains characters present in the input. An
/// unterminated IPv6 bracket yields `None`.
fn authority_host(candidate: &str) -> Option<String> {
    let (_, rest) = candidate.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let hostport = authority
        .rsplit_once('@')
        .map_or(authority, |(_, hostport)| hostport);
    let host = if hostport.starts_with('[') {
        &hostport[..=hostport.find(']')?]
    } else {
        hostport.split(':').next().unwrap_or(hostport)
    };
    Some(host.to_lowercase())
}

fn looks_like_host(lowered: &str) -> bool {
    let has_inner_dot = lowered
        .find('.')
        .is_some_and(|pos| pos + 1 < lowered.len());
    has_inner_dot || HOST_KEYWORDS.iter().any(|k| lowered.contains(k))
}
