//! `httpx -json` adapter, grounded on `httpx_raw_dto.py` / `httpx_mapper.py`:
//! a record needs both a host and a resolved IP to be usable.

use serde::Deserialize;

use recon_core::tool_runner::{InputMode, ParseOutcome, ToolAdapter};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpxRawDto {
    pub host: Option<String>,
    pub input: Option<String>,
    pub host_ip: Option<String>,
    #[serde(default)]
    pub a: Vec<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_port")]
    pub port: i32,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub status_code: Option<i32>,
}

fn default_scheme() -> String {
    "http".to_string()
}
fn default_port() -> i32 {
    80
}
fn default_path() -> String {
    "/".to_string()
}
fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpxResult {
    pub host: String,
    pub primary_ip: String,
    pub extra_ips: Vec<String>,
    pub scheme: String,
    pub port: i32,
    pub technologies: serde_json::Map<String, serde_json::Value>,
    pub path: String,
    pub method: String,
    pub status_code: Option<i32>,
}

/// Mirrors `HTTPXResultMapper.map`: no host or no resolved IP, and the line
/// is unusable.
fn map(raw: HttpxRawDto) -> Option<HttpxResult> {
    let host = raw.host.or(raw.input)?;
    let primary_ip = raw.host_ip?;

    let mut technologies = serde_json::Map::new();
    for tech in raw.tech {
        technologies.insert(tech, serde_json::Value::Bool(true));
    }

    Some(HttpxResult {
        host,
        primary_ip,
        extra_ips: raw.a,
        scheme: raw.scheme,
        port: raw.port,
        technologies,
        path: if raw.path.is_empty() { "/".to_string() } else { raw.path },
        method: raw.method,
        status_code: raw.status_code,
    })
}

pub struct HttpxAdapter;

impl ToolAdapter for HttpxAdapter {
    type Record = HttpxResult;

    fn name(&self) -> &'static str {
        "httpx"
    }

    fn build_args(&self, targets: &[String]) -> Vec<String> {
        let _ = targets;
        vec!["-json".to_string(), "-silent".to_string(), "-tech-detect".to_string()]
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Stdin
    }

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
        match serde_json::from_str::<HttpxRawDto>(line).ok().and_then(map) {
            Some(record) => ParseOutcome::Record(record),
            None => ParseOutcome::ParseSkip {
                line: line.to_string(),
                reason: "missing host or resolved ip".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_record_with_host_and_ip() {
        let adapter = HttpxAdapter;
        let line = r#"{"host":"api.example.com","host_ip":"1.2.3.4","tech":["nginx"],"status_code":200}"#;
        match adapter.parse_line(line) {
            ParseOutcome::Record(r) => {
                assert_eq!(r.host, "api.example.com");
                assert_eq!(r.primary_ip, "1.2.3.4");
                assert_eq!(r.technologies.get("nginx"), Some(&serde_json::Value::Bool(true)));
                assert_eq!(r.path, "/");
            }
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn falls_back_to_input_when_host_missing() {
        let adapter = HttpxAdapter;
        let line = r#"{"input":"api.example.com","host_ip":"1.2.3.4"}"#;
        match adapter.parse_line(line) {
            ParseOutcome::Record(r) => assert_eq!(r.host, "api.example.com"),
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn skips_record_without_resolved_ip() {
        let adapter = HttpxAdapter;
        assert!(matches!(
            adapter.parse_line(r#"{"host":"api.example.com"}"#),
            ParseOutcome::ParseSkip { .. }
        ));
    }
}
