//! Target extraction from an event payload: the first non-empty of
//! `subdomains|urls|hosts|ips|targets` wins.

use recon_bus::Event;

const FIELD_PRIORITY: [&str; 5] = ["subdomains", "urls", "hosts", "ips", "targets"];

/// Pull a flat list of string targets out of `event`'s extra payload,
/// preferring the first field in [`FIELD_PRIORITY`] that is present and
/// non-empty.
pub fn extract_targets(event: &Event) -> Vec<String> {
    for field in FIELD_PRIORITY {
        if let Some(values) = event.extra.get(field).and_then(|v| v.as_array()) {
            let targets: Vec<String> = values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
            if !targets.is_empty() {
                return targets;
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with(field: &str, values: Vec<&str>) -> Event {
        let mut e = Event::new("subdomain_discovered");
        e.extra.insert(field.to_string(), json!(values));
        e
    }

    #[test]
    fn prefers_subdomains_over_urls() {
        let mut e = event_with("subdomains", vec!["api.example.com"]);
        e.extra.insert("urls".to_string(), json!(["https://example.com/x"]));
        assert_eq!(extract_targets(&e), vec!["api.example.com".to_string()]);
    }

    #[test]
    fn falls_through_to_next_field_when_first_is_empty() {
        let mut e = Event::new("ports_discovered");
        e.extra.insert("subdomains".to_string(), json!([]));
        e.extra.insert("ips".to_string(), json!(["10.0.0.1"]));
        assert_eq!(extract_targets(&e), vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn no_recognized_field_yields_empty() {
        let e = Event::new("unrelated_event");
        assert!(extract_targets(&e).is_empty());
    }
}
