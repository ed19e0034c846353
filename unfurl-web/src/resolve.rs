//! Image URL normalization.
//!
//! Only the forms that show up in preview metadata are handled: absolute,
//! protocol-relative and site-absolute. Bare relative paths are returned as
//! they are; there is no `.`/`..` segment resolution.

/// Resolve `candidate` against `base`.
///
/// ```
/// use unfurl_web::resolve::resolve_url;
///
/// assert_eq!(
///     resolve_url("https://example.com/a/b", "/img.png"),
///     "https://example.com/img.png"
/// );
/// assert_eq!(
///     resolve_url("https://example.com/a", "//cdn.example.com/i.png"),
///     "https://cdn.example.com/i.png"
/// );
/// ```
pub fn resolve_url(base: &str, candidate: &str) -> String {
    if candidate.is_empty() {
        return String::new();
    }

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return candidate.to_string();
    }

    if candidate.starts_with("//") {
        return format!("https:{candidate}");
    }

    if candidate.starts_with('/') {
        if let Some(origin) = origin_of(base) {
            return format!("{origin}{candidate}");
        }
    }

    candidate.to_string()
}

/// Scheme and host of `base`: everything up to the first `/` after `://`,
/// or all of `base` when there is no such `/`. `None` without `://` or host.
fn origin_of(base: &str) -> Option<&str> {
    let sep = base.find("://")?;
    let after = &base[sep + 3..];
    let host_len = after.find('/').unwrap_or(after.len());
    if host_len == 0 {
        return None;
    }
    Some(&base[..sep + 3 + host_len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidate_stays_empty() {
        assert_eq!(resolve_url("https://example.com", ""), "");
    }

    #[test]
    fn absolute_candidates_pass_through_for_any_base() {
        for base in ["https://example.com/a", "", "not a url", "ftp://x/y"] {
            assert_eq!(
                resolve_url(base, "http://cdn.example.com/a.png"),
                "http://cdn.example.com/a.png"
            );
            assert_eq!(
                resolve_url(base, "https://cdn.example.com/a.png"),
                "https://cdn.example.com/a.png"
            );
        }
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            resolve_url("http://example.com/a", "//cdn.example.com/i.png"),
            "https://cdn.example.com/i.png"
        );
    }

    #[test]
    fn site_absolute_uses_base_origin() {
        assert_eq!(
            resolve_url("https://example.com/a/b", "/img.png"),
            "https://example.com/img.png"
        );
        assert_eq!(
            resolve_url("http://example.com:8080/deep/path?q=1", "/i.png"),
            "http://example.com:8080/i.png"
        );
    }

    #[test]
    fn site_absolute_with_bare_origin_base() {
        assert_eq!(
            resolve_url("https://example.com", "/img.png"),
            "https://example.com/img.png"
        );
    }

    #[test]
    fn site_absolute_without_usable_base_is_unchanged() {
        assert_eq!(resolve_url("example.com/a", "/img.png"), "/img.png");
        assert_eq!(resolve_url("https:///a", "/img.png"), "/img.png");
    }

    #[test]
    fn relative_forms_are_left_alone() {
        let base = "https://example.com/a/b";
        assert_eq!(resolve_url(base, "img.png"), "img.png");
        assert_eq!(resolve_url(base, "../img.png"), "../img.png");
        assert_eq!(resolve_url(base, "#frag"), "#frag");
        assert_eq!(resolve_url(base, "data:image/png;base64,AA"), "data:image/png;base64,AA");
    }
}
