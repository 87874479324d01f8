//! Exclude-first, include-required scope matching.
//!
//! Grounded on `scope_checker.py`'s `ScopeChecker.is_in_scope` /
//! `_matches_rule`: exclude rules win outright, then an include rule must
//! match if any include rule is present at all.

use std::net::IpAddr;

use recon_core::{RuleAction, RuleKind, ScopeRule};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("target has no parseable hostname: {0}")]
    NoHostname(String),
}

/// Returns whether `target` (a bare hostname or a full URL) is in scope
/// under `rules`.
pub fn is_in_scope(target: &str, rules: &[ScopeRule]) -> Result<bool, ScopeError> {
    if rules.is_empty() {
        return Ok(true);
    }

    let domain = extract_hostname(target).ok_or_else(|| ScopeError::NoHostname(target.to_string()))?;

    for rule in rules.iter().filter(|r| r.action == RuleAction::Exclude) {
        if matches_rule(target, &domain, rule) {
            return Ok(false);
        }
    }

    let has_include = rules.iter().any(|r| r.action == RuleAction::Include);
    if !has_include {
        return Ok(true);
    }

    for rule in rules.iter().filter(|r| r.action == RuleAction::Include) {
        if matches_rule(target, &domain, rule) {
            return Ok(true);
        }
    }

    Ok(false)
}

fn extract_hostname(target: &str) -> Option<String> {
    let with_scheme = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{target}")
    };
    url::Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn matches_rule(target: &str, domain: &str, rule: &ScopeRule) -> bool {
    match rule.kind {
        RuleKind::Domain => domain.eq_ignore_ascii_case(&rule.pattern),
        RuleKind::Wildcard => wildcard_matches(domain, &rule.pattern),
        RuleKind::Regex => regex::Regex::new(&rule.pattern)
            .map(|re| re.is_match(target))
            .unwrap_or(false),
        RuleKind::Cidr => domain
            .parse::<IpAddr>()
            .ok()
            .or_else(|| target.parse::<IpAddr>().ok())
            .and_then(|ip| rule.pattern.parse::<ipnetwork::IpNetwork>().ok().map(|net| (ip, net)))
            .map(|(ip, net)| net.contains(ip))
            .unwrap_or(false),
    }
}

/// `*` anchored glob match: `.` is escaped, `*` becomes `.*`, anchored at
/// both ends, matching the original `_matches_rule` wildcard branch.
fn wildcard_matches(domain: &str, pattern: &str) -> bool {
    let mut escaped = String::with_capacity(pattern.len() * 2);
    escaped.push('^');
    for ch in pattern.chars() {
        match ch {
            '.' => escaped.push_str(r"\."),
            '*' => escaped.push_str(".*"),
            other => escaped.push(other),
        }
    }
    escaped.push('$');
    regex::Regex::new(&escaped)
        .map(|re| re.is_match(domain))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rule(kind: RuleKind, pattern: &str, action: RuleAction) -> ScopeRule {
        ScopeRule::new(Uuid::new_v4(), kind, pattern, action)
    }

    #[test]
    fn no_rules_is_in_scope() {
        assert!(is_in_scope("example.com", &[]).unwrap());
    }

    #[test]
    fn exclude_wins_over_include() {
        let rules = vec![
            rule(RuleKind::Domain, "api.example.com", RuleAction::Include),
            rule(RuleKind::Wildcard, "*.example.com", RuleAction::Exclude),
        ];
        assert!(!is_in_scope("api.example.com", &rules).unwrap());
    }

    #[test]
    fn include_required_when_present() {
        let rules = vec![rule(RuleKind::Domain, "api.example.com", RuleAction::Include)];
        assert!(is_in_scope("api.example.com", &rules).unwrap());
        assert!(!is_in_scope("other.example.com", &rules).unwrap());
    }

    #[test]
    fn wildcard_is_anchored() {
        let rules = vec![rule(RuleKind::Wildcard, "*.example.com", RuleAction::Include)];
        assert!(is_in_scope("foo.example.com", &rules).unwrap());
        assert!(!is_in_scope("foo.example.com.evil.net", &rules).unwrap());
    }

    #[test]
    fn regex_is_unanchored_over_full_target() {
        let rules = vec![rule(RuleKind::Regex, r"^https://.*\.internal", RuleAction::Include)];
        assert!(is_in_scope("https://staging.internal/path", &rules).unwrap());
    }

    #[test]
    fn cidr_matches_ip_targets_only() {
        let rules = vec![rule(RuleKind::Cidr, "10.0.0.0/8", RuleAction::Include)];
        assert!(is_in_scope("10.1.2.3", &rules).unwrap());
        assert!(!is_in_scope("example.com", &rules).unwrap());
    }
}
