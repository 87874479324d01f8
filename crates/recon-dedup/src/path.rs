//! Path normalization into the Endpoint dedup key, per spec §4.4.

use once_cell::sync::Lazy;
use regex::Regex;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});
static HEX_BLOB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[0-9a-f]{24,}$").expect("valid regex"));
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static BASE64ISH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{20,}$").expect("valid regex"));

const PLACEHOLDER: &str = "{id}";

/// Template dynamic path segments, drop query-param values while keeping
/// sorted names, collapse duplicate slashes, and strip any trailing slash
/// (except for the root path itself).
pub fn normalize_path(url_or_path: &str) -> String {
    let (path_part, query_part) = split_path_and_query(url_or_path);

    let collapsed = collapse_slashes(path_part);
    let segments: Vec<String> = collapsed
        .split('/')
        .map(|segment| {
            if segment.is_empty() {
                segment.to_string()
            } else if is_dynamic_segment(segment) {
                PLACEHOLDER.to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();

    let mut templated = segments.join("/");
    if templated.len() > 1 && templated.ends_with('/') {
        templated.pop();
    }
    if templated.is_empty() {
        templated.push('/');
    }

    match normalize_query_names(query_part) {
        Some(names) => format!("{templated}?{names}"),
        None => templated,
    }
}

fn split_path_and_query(url_or_path: &str) -> (&str, Option<&str>) {
    let without_scheme = url_or_path
        .find("://")
        .map(|idx| &url_or_path[idx + 3..])
        .unwrap_or(url_or_path);
    let path_start = without_scheme.find('/').unwrap_or(without_scheme.len());
    let rest = &without_scheme[path_start..];
    match rest.find('?') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_was_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_was_slash {
                continue;
            }
            prev_was_slash = true;
        } else {
            prev_was_slash = false;
        }
        out.push(ch);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

fn is_dynamic_segment(segment: &str) -> bool {
    UUID_RE.is_match(segment)
        || HEX_BLOB_RE.is_match(segment)
        || NUMERIC_RE.is_match(segment)
        || BASE64ISH_RE.is_match(segment)
}

fn normalize_query_names(query: Option<&str>) -> Option<String> {
    let query = query?;
    if query.is_empty() {
        return None;
    }
    let mut names: Vec<&str> = query
        .split('&')
        .filter_map(|pair| pair.split('=').next())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_unstable();
    names.dedup();
    Some(names.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_uuid_segments() {
        assert_eq!(
            normalize_path("/users/550e8400-e29b-41d4-a716-446655440000/profile"),
            "/users/{id}/profile"
        );
    }

    #[test]
    fn templates_numeric_ids() {
        assert_eq!(normalize_path("/orders/12345"), "/orders/{id}");
    }

    #[test]
    fn collapses_duplicate_slashes_and_trailing_slash() {
        assert_eq!(normalize_path("/a//b///c/"), "/a/b/c");
    }

    #[test]
    fn root_path_keeps_single_slash() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn preserves_sorted_query_names_drops_values() {
        assert_eq!(
            normalize_path("/search?q=rust&sort=desc&q=dup"),
            "/search?q&sort"
        );
    }

    #[test]
    fn strips_scheme_and_host() {
        assert_eq!(
            normalize_path("https://example.com/api/v1/widgets/42"),
            "/api/v1/widgets/{id}"
        );
    }
}
