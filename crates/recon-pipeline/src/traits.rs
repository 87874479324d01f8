//! Capability interfaces composed into each scan service, replacing a single
//! monolithic base class. Grounded on `base_service.py`'s
//! `URLParseMixin`/`URLUtilsMixin`/`ScopeCheckMixin` — process execution is
//! covered separately by `recon_core::tool_runner::ToolAdapter`/`ToolRunner`,
//! so it is not duplicated here.

use recon_scope::is_in_scope;
use recon_core::ScopeRule;

const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2", ".ttf", ".eot", ".mp4",
    ".mp3", ".pdf", ".doc", ".docx", ".htm", ".webp", ".ico",
];

/// URL filtering utilities: drop static assets, recognize JS files, pull a
/// hostname out of a URL.
pub trait UrlFilter {
    fn keep_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        !STATIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    fn is_js_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        lower.ends_with(".js") || lower.contains(".js?")
    }

    fn extract_host(&self, url: &str) -> Option<String> {
        let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
        url::Url::parse(&with_scheme)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Scope validation, delegating to the Scope Evaluator.
pub trait ScopeCheck {
    fn is_in_scope(&self, target: &str, rules: &[ScopeRule]) -> bool {
        is_in_scope(target, rules).unwrap_or(false)
    }

    fn filter_in_scope<'a>(&self, targets: &'a [String], rules: &[ScopeRule]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut in_scope = Vec::new();
        let mut out_of_scope = Vec::new();
        for target in targets {
            if self.is_in_scope(target, rules) {
                in_scope.push(target.as_str());
            } else {
                out_of_scope.push(target.as_str());
            }
        }
        (in_scope, out_of_scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;
    impl UrlFilter for Probe {}
    impl ScopeCheck for Probe {}

    #[test]
    fn filters_static_extensions() {
        let p = Probe;
        assert!(!p.keep_url("https://example.com/app.css"));
        assert!(p.keep_url("https://example.com/api/users"));
    }

    #[test]
    fn recognizes_js_urls() {
        let p = Probe;
        assert!(p.is_js_url("https://example.com/bundle.js"));
        assert!(p.is_js_url("https://example.com/bundle.js?v=2"));
        assert!(!p.is_js_url("https://example.com/bundle.css"));
    }

    #[test]
    fn extracts_host_with_or_without_scheme() {
        let p = Probe;
        assert_eq!(p.extract_host("https://api.example.com/x"), Some("api.example.com".to_string()));
        assert_eq!(p.extract_host("api.example.com"), Some("api.example.com".to_string()));
    }

    #[test]
    fn empty_rules_means_everything_in_scope() {
        let p = Probe;
        assert!(p.is_in_scope("anything.example.com", &[]));
    }
}
