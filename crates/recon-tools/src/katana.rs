//! `katana -jsonl` adapter: one discovered URL (and its observed method)
//! per line.

use serde::Deserialize;

use recon_core::tool_runner::{InputMode, ParseOutcome, ToolAdapter};

#[derive(Debug, Clone, Deserialize)]
struct KatanaRawDto {
    request: KatanaRequest,
    response: Option<KatanaResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct KatanaRequest {
    endpoint: String,
    #[serde(default = "default_method")]
    method: String,
}

#[derive(Debug, Clone, Deserialize)]
struct KatanaResponse {
    status_code: Option<i32>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledUrl {
    pub url: String,
    pub method: String,
    pub status_code: Option<i32>,
}

pub struct KatanaAdapter {
    pub seed_url: String,
    pub depth: u32,
}

impl ToolAdapter for KatanaAdapter {
    type Record = CrawledUrl;

    fn name(&self) -> &'static str {
        "katana"
    }

    fn build_args(&self, _targets: &[String]) -> Vec<String> {
        vec![
            "-u".to_string(),
            self.seed_url.clone(),
            "-jsonl".to_string(),
            "-silent".to_string(),
            "-depth".to_string(),
            self.depth.to_string(),
        ]
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Argv
    }

    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
        match serde_json::from_str::<KatanaRawDto>(line) {
            Ok(raw) if !raw.request.endpoint.is_empty() => ParseOutcome::Record(CrawledUrl {
                url: raw.request.endpoint,
                method: raw.request.method,
                status_code: raw.response.and_then(|r| r.status_code),
            }),
            _ => ParseOutcome::ParseSkip {
                line: line.to_string(),
                reason: "missing request.endpoint".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_crawled_url() {
        let adapter = KatanaAdapter {
            seed_url: "https://example.com".into(),
            depth: 3,
        };
        let line = r#"{"request":{"endpoint":"https://example.com/api/v1","method":"POST"},"response":{"status_code":201}}"#;
        match adapter.parse_line(line) {
            ParseOutcome::Record(r) => {
                assert_eq!(r.url, "https://example.com/api/v1");
                assert_eq!(r.method, "POST");
                assert_eq!(r.status_code, Some(201));
            }
            ParseOutcome::ParseSkip { .. } => panic!("expected a record"),
        }
    }
}
