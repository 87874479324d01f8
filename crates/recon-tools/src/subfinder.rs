//! `subfinder -d <domain> -silent -oJ` adapter: one discovered hostname
//! per line, passed through verbatim (subfinder's JSON lines are already
//! flat strings or `{"host": "..."}` objects depending on version).

use recon_core::tool_runner::{InputMode, ParseOutcome, ToolAdapter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRecord {
    pub hostname: String,
}

pub struct SubfinderAdapter {
    pub domain: String,
}

impl ToolAdapter for SubfinderAdapter {
    type Record = SubdomainRecord;

    fn name(&self) -> &'static str {
        "subfinder"
    }

    fn build_args(&self, _targets: &[String]) -> Vec<String> {
        vec!["-d".to_string(), self.domain.clone(), "-silent".to_string()]
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Argv
    }

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
        let hostname = parse_hostname(line);
        match hostname {
            Some(hostname) if !hostname.is_empty() => {
                ParseOutcome::Record(SubdomainRecord { hostname })
            }
            _ => ParseOutcome::ParseSkip {
                line: line.to_string(),
                reason: "no hostname in line".to_string(),
            },
        }
    }
}

fn parse_hostname(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('{') {
        serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(|v| v.get("host").and_then(|h| h.as_str()).map(str::to_string))
    } else if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text_lines() {
        let adapter = SubfinderAdapter {
            domain: "example.com".into(),
        };
        match adapter.parse_line("api.example.com") {
            ParseOutcome::Record(r) => assert_eq!(r.hostname, "api.example.com"),
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn parses_json_lines() {
        let adapter = SubfinderAdapter {
            domain: "example.com".into(),
        };
        match adapter.parse_line(r#"{"host":"api.example.com","input":"example.com"}"#) {
            ParseOutcome::Record(r) => assert_eq!(r.hostname, "api.example.com"),
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn skips_empty_lines() {
        let adapter = SubfinderAdapter {
            domain: "example.com".into(),
        };
        assert!(matches!(adapter.parse_line(""), ParseOutcome::ParseSkip { .. }));
    }
}
