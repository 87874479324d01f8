//! `naabu -json` adapter: one open port per line, `{"ip": "...", "port": N}`.
//! Naabu's plain-text `host:port` form is accepted as a fallback for
//! `-silent` runs without `-json`.

use serde::Deserialize;

use recon_core::tool_runner::{InputMode, ParseOutcome, ToolAdapter};

#[derive(Debug, Clone, Deserialize)]
struct NaabuRawDto {
    ip: Option<String>,
    host: Option<String>,
    port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPort {
    pub ip: String,
    pub port: u16,
}

pub struct NaabuAdapter {
    pub top_ports: Option<String>,
    pub rate: Option<u32>,
}

impl ToolAdapter for NaabuAdapter {
    type Record = OpenPort;

    fn name(&self) -> &'static str {
        "naabu"
    }

    fn build_args(&self, _targets: &[String]) -> Vec<String> {
        let mut args = vec!["-json".to_string(), "-silent".to_string()];
        if let Some(top_ports) = &self.top_ports {
            args.push("-top-ports".to_string());
            args.push(top_ports.clone());
        }
        if let Some(rate) = self.rate {
            args.push("-rate".to_string());
            args.push(rate.to_string());
        }
        args
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Stdin
    }

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
        if let Some(record) = parse_json(line).or_else(|| parse_plain(line)) {
            ParseOutcome::Record(record)
        } else {
            ParseOutcome::ParseSkip {
                line: line.to_string(),
                reason: "not a recognizable naabu line".to_string(),
            }
        }
    }
}

fn parse_json(line: &str) -> Option<OpenPort> {
    let raw: NaabuRawDto = serde_json::from_str(line).ok()?;
    let ip = raw.ip.or(raw.host)?;
    Some(OpenPort { ip, port: raw.port })
}

fn parse_plain(line: &str) -> Option<OpenPort> {
    let (ip, port) = line.trim().rsplit_once(':')?;
    Some(OpenPort {
        ip: ip.to_string(),
        port: port.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_lines() {
        let adapter = NaabuAdapter { top_ports: None, rate: None };
        match adapter.parse_line(r#"{"ip":"1.2.3.4","port":443}"#) {
            ParseOutcome::Record(r) => assert_eq!(r, OpenPort { ip: "1.2.3.4".into(), port: 443 }),
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn parses_plain_host_colon_port() {
        let adapter = NaabuAdapter { top_ports: None, rate: None };
        match adapter.parse_line("1.2.3.4:8080") {
            ParseOutcome::Record(r) => assert_eq!(r, OpenPort { ip: "1.2.3.4".into(), port: 8080 }),
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }

    #[test]
    fn skips_garbage() {
        let adapter = NaabuAdapter { top_ports: None, rate: None };
        assert!(matches!(adapter.parse_line("not a port line"), ParseOutcome::ParseSkip { .. }));
    }
}
