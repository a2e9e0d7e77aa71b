//! URL canonicalization and hashing.
//!
//! Two URLs that differ only by tracking-parameter presence/order, the
//! `www.` prefix, scheme/host casing, a trailing slash, or a fragment must
//! canonicalize — and therefore hash — identically.

use sha2::{Digest, Sha256};

/// Query parameters known to carry tracking/attribution noise rather than
/// identifying content. Matched case-insensitively; `utm_*` matches any
/// parameter starting with `utm_`.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "mc_cid", "mc_eid", "ref", "source", "_ga", "_gl",
];

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Canonicalize a URL: lowercase scheme/host, strip `www.`, drop the
/// fragment, remove tracking params, sort remaining query params, and
/// strip a trailing slash except on root. Unparseable input is returned
/// unchanged (verbatim), so callers can still hash it deterministically.
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw) else {
        return raw.to_string();
    };

    // Lowercase scheme + host.
    let scheme = parsed.scheme().to_lowercase();
    let _ = parsed.set_scheme(&scheme);
    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        let _ = parsed.set_host(Some(&lowered));
    }

    // Strip leading "www.".
    if let Some(host) = parsed.host_str() {
        if let Some(stripped) = host.strip_prefix("www.") {
            let stripped = stripped.to_string();
            let _ = parsed.set_host(Some(&stripped));
        }
    }

    // Drop fragment.
    parsed.set_fragment(None);

    // Strip tracking params, sort the rest lexicographically.
    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    // Strip trailing slash except on root.
    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// SHA-256 hash of the canonicalized URL, hex-encoded.
pub fn hash(raw: &str) -> String {
    let canonical = canonicalize(raw);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_strips_tracking_params_www_case_trailing_slash_fragment() {
        let input = "https://WWW.Example.COM/article/?utm_source=hn&utm_campaign=test&id=42#top";
        assert_eq!(canonicalize(input), "https://example.com/article?id=42");
    }

    #[test]
    fn idempotent() {
        let input = "https://WWW.Example.COM/article/?utm_source=hn&id=42#top";
        let once = canonicalize(input);
        let twice = canonicalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_www_prefix() {
        assert_eq!(canonicalize("https://www.example.com/a"), "https://example.com/a");
    }

    #[test]
    fn preserves_non_www_subdomain() {
        assert_eq!(canonicalize("https://blog.example.com/a"), "https://blog.example.com/a");
    }

    #[test]
    fn lowercases_scheme_and_host_only() {
        assert_eq!(
            canonicalize("HTTPS://EXAMPLE.COM/Article-Title"),
            "https://example.com/Article-Title"
        );
    }

    #[test]
    fn drops_fragment() {
        assert_eq!(canonicalize("https://example.com/a#section-2"), "https://example.com/a");
    }

    #[test]
    fn strips_trailing_slash_except_root() {
        assert_eq!(canonicalize("https://example.com/a/"), "https://example.com/a");
        assert_eq!(canonicalize("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn sorts_remaining_query_params() {
        assert_eq!(
            canonicalize("https://example.com/a?b=2&a=1"),
            "https://example.com/a?a=1&b=2"
        );
    }

    #[test]
    fn strips_all_known_tracking_params_case_insensitively() {
        let input = "https://example.com/a?UTM_Source=x&fbclid=1&GCLID=2&dclid=3&mc_cid=4&mc_eid=5&ref=6&source=7&_ga=8&_gl=9&keep=yes";
        assert_eq!(canonicalize(input), "https://example.com/a?keep=yes");
    }

    #[test]
    fn all_tracking_removed_drops_query_entirely() {
        assert_eq!(
            canonicalize("https://example.com/a?utm_source=x&utm_campaign=y"),
            "https://example.com/a"
        );
    }

    #[test]
    fn unparseable_url_hashed_verbatim() {
        let raw = "not a url at all";
        assert_eq!(canonicalize(raw), raw);
        // hash() must not panic and must be deterministic
        assert_eq!(hash(raw), hash(raw));
    }

    #[test]
    fn s2_hash_equal_after_tracking_param_and_www_slash_removed() {
        let a = hash("https://example.com/a?utm_source=x");
        let b = hash("https://www.example.com/a/");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_for_different_paths() {
        assert_ne!(hash("https://example.com/a"), hash("https://example.com/b"));
    }

    #[test]
    fn hash_is_hex_sha256_length() {
        let h = hash("https://example.com/a");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
