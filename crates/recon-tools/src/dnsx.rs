//! `dnsx -json` adapter, grounded on `dnsx_raw_dto.py`'s field set.

use serde::Deserialize;

use recon_core::tool_runner::{InputMode, ParseOutcome, ToolAdapter};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DnsxRawDto {
    pub host: Option<String>,
    #[serde(default)]
    pub a: Vec<String>,
    #[serde(default)]
    pub aaaa: Vec<String>,
    #[serde(default)]
    pub cname: Vec<String>,
    #[serde(default)]
    pub mx: Vec<String>,
    #[serde(default)]
    pub txt: Vec<String>,
    #[serde(default)]
    pub ns: Vec<String>,
    #[serde(default)]
    pub ptr: Vec<String>,
    pub ttl: Option<i32>,
    #[serde(default)]
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnsxResult {
    pub host: String,
    pub a: Vec<String>,
    pub aaaa: Vec<String>,
    pub cname: Vec<String>,
    pub mx: Vec<String>,
    pub txt: Vec<String>,
    pub ns: Vec<String>,
    pub ptr: Vec<String>,
    pub ttl: Option<i32>,
    pub is_wildcard: bool,
}

/// A record with no `host` can't be linked to anything — skipped, not
/// raised.
fn map(raw: DnsxRawDto) -> Option<DnsxResult> {
    let host = raw.host?;
    Some(DnsxResult {
        host,
        a: raw.a,
        aaaa: raw.aaaa,
        cname: raw.cname,
        mx: raw.mx,
        txt: raw.txt,
        ns: raw.ns,
        ptr: raw.ptr,
        ttl: raw.ttl,
        is_wildcard: raw.wildcard,
    })
}

pub struct DnsxAdapter;

impl ToolAdapter for DnsxAdapter {
    type Record = DnsxResult;

    fn name(&self) -> &'static str {
        "dnsx"
    }

    fn build_args(&self, targets: &[String]) -> Vec<String> {
        let _ = targets;
        vec!["-json".to_string(), "-silent".to_string()]
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Stdin
    }

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
        match serde_json::from_str::<DnsxRawDto>(line).ok().and_then(map) {
            Some(record) => ParseOutcome::Record(record),
            None => ParseOutcome::ParseSkip {
                line: line.to_string(),
                reason: "missing host or malformed json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_full_record() {
        let adapter = DnsxAdapter;
        let line = r#"{"host":"api.example.com","a":["1.2.3.4"],"cname":["edge.cdn.net"],"ttl":300,"wildcard":false}"#;
        match adapter.parse_line(line) {
            ParseOutcome::Record(r) => {
                assert_eq!(r.host, "api.example.com");
                assert_eq!(r.a, vec!["1.2.3.4".to_string()]);
                assert_eq!(r.cname, vec!["edge.cdn.net".to_string()]);
                assert!(!r.is_wildcard);
            }
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn skips_record_without_host() {
        let adapter = DnsxAdapter;
        assert!(matches!(
            adapter.parse_line(r#"{"a":["1.2.3.4"]}"#),
            ParseOutcome::ParseSkip { .. }
        ));
    }
}
