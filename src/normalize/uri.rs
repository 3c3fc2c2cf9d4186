//! URI normalization.

/// Normalize a `login_uri` value for equality comparison.
///
/// All trailing `/` characters are removed; nothing else changes. Scheme,
/// case, query, and fragment are preserved so that distinct URIs never
/// collapse into one key. Empty input stays empty.
///
/// # Example
///
/// ```
/// use credupe::normalize::normalize_uri;
///
/// assert_eq!(normalize_uri("https://a.com/"), "https://a.com");
/// assert_eq!(normalize_uri("https://a.com/login//"), "https://a.com/login");
/// assert_eq!(normalize_uri(""), "");
/// ```
#[must_use]
pub fn normalize_uri(uri: &str) -> String {
    uri.trim_end_matches('/').to_string()
}
