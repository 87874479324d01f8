//! Hostname normalization, per spec §4.4.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$").expect("valid regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostnameError {
    #[error("not a valid domain: {0}")]
    InvalidDomain(String),
}

/// Lower-cases, strips a trailing dot and surrounding whitespace, then
/// validates the result looks like a domain before returning it.
pub fn normalize_hostname(raw: &str) -> Result<String, HostnameError> {
    let trimmed = raw.trim().trim_end_matches('.').to_lowercase();
    if DOMAIN_RE.is_match(&trimmed) {
        Ok(trimmed)
    } else {
        Err(HostnameError::InvalidDomain(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_trailing_dot() {
        assert_eq!(normalize_hostname("  Example.COM. ").unwrap(), "example.com");
    }

    #[test]
    fn rejects_non_domains() {
        assert_eq!(
            normalize_hostname("not a domain"),
            Err(HostnameError::InvalidDomain("not a domain".to_string()))
        );
        assert!(normalize_hostname("localhost").is_err());
    }

    #[test]
    fn accepts_subdomains() {
        assert!(normalize_hostname("api.staging.example.com").is_ok());
    }
}
