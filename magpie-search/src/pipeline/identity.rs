//! URL identity normalisation for cross-source deduplication.
//!
//! Two results are the same document when their normalised identities
//! compare equal. The transformation is deliberately conservative: it
//! canonicalises what browsers treat as equivalent and leaves the query
//! string untouched, since different queries usually are different pages.

use url::Url;

/// Normalise a URL string into a comparable identity key.
///
/// Applies the following transformations:
///
/// 1. Schemeless input gets an `http://` prefix before parsing.
/// 2. Scheme and host are lowercased and non-ASCII hostnames become their
///    punycode form (both courtesy of the parser).
/// 3. The fragment (`#…`) is removed.
/// 4. A single trailing slash is removed from the path, unless the path
///    is exactly `"/"`.
/// 5. The query string is preserved as-is.
///
/// Never fails: input that cannot be parsed even with a scheme prefix is
/// returned unchanged, so the worst case is exact-string identity.
///
/// # Examples
///
/// ```
/// use magpie_search::normalize_url;
///
/// let a = normalize_url("http://Example.com/path/");
/// let b = normalize_url("http://example.com/path");
/// assert_eq!(a, b);
///
/// assert_eq!(normalize_url("example.com"), normalize_url("http://example.com"));
/// ```
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let mut parsed = match Url::parse(raw) {
        Ok(url) if url.has_host() => url,
        // Bare domains parse as relative or scheme-only URLs; retry as http.
        _ => match Url::parse(&format!("http://{raw}")) {
            Ok(url) if url.has_host() => url,
            _ => return raw.to_string(),
        },
    };

    parsed.set_fragment(None);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        let result = normalize_url("HTTP://Example.COM/Path");
        assert_eq!(result, "http://example.com/Path");
    }

    #[test]
    fn strips_single_trailing_slash() {
        let result = normalize_url("https://example.com/path/");
        assert_eq!(result, "https://example.com/path");
    }

    #[test]
    fn strips_only_one_trailing_slash() {
        let result = normalize_url("https://example.com/path//");
        assert_eq!(result, "https://example.com/path/");
    }

    #[test]
    fn preserves_root_slash() {
        let result = normalize_url("https://example.com/");
        assert_eq!(result, "https://example.com/");
    }

    #[test]
    fn bare_domain_gets_http_scheme() {
        let result = normalize_url("example.com");
        assert_eq!(result, "http://example.com/");
    }

    #[test]
    fn bare_domain_equals_prefixed_form() {
        assert_eq!(
            normalize_url("example.com"),
            normalize_url("http://example.com")
        );
    }

    #[test]
    fn schemeless_path_normalised_like_full_url() {
        let result = normalize_url("example.com/docs/");
        assert_eq!(result, "http://example.com/docs");
    }

    #[test]
    fn host_and_port_without_scheme() {
        // "localhost:8080/x" parses as scheme "localhost" on the first
        // attempt; the host check sends it through the retry.
        let result = normalize_url("localhost:8080/admin");
        assert_eq!(result, "http://localhost:8080/admin");
    }

    #[test]
    fn removes_fragment() {
        let result = normalize_url("https://example.com/page#section");
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn trailing_slash_and_fragment_together() {
        let a = normalize_url("http://Example.com/path/#top");
        let b = normalize_url("http://example.com/path");
        assert_eq!(a, b);
    }

    #[test]
    fn preserves_query_order() {
        let result = normalize_url("https://example.com/search?b=2&a=1");
        assert_eq!(result, "https://example.com/search?b=2&a=1");
    }

    #[test]
    fn strips_slash_before_query() {
        let result = normalize_url("https://example.com/p/?x=1");
        assert_eq!(result, "https://example.com/p?x=1");
    }

    #[test]
    fn preserves_non_default_port() {
        let result = normalize_url("https://example.com:8443/path");
        assert_eq!(result, "https://example.com:8443/path");
    }

    #[test]
    fn idn_host_becomes_punycode() {
        let result = normalize_url("http://münchen.de/");
        assert_eq!(result, "http://xn--mnchen-3ya.de/");
    }

    #[test]
    fn unparseable_input_returned_unchanged() {
        let input = "not a url at all";
        assert_eq!(normalize_url(input), input);
    }

    #[test]
    fn empty_string_returned_unchanged() {
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn plain_url_passes_through() {
        let result = normalize_url("https://example.com/page");
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn idempotent() {
        let once = normalize_url("Example.com/path/?q=1#frag");
        let twice = normalize_url(&once);
        assert_eq!(once, twice);
    }
}
