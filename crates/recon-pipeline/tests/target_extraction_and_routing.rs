//! End-to-end (broker-free) check of seed scenario 5: an event's derived
//! routing key and priority, plus which stage queue it lands on.

use recon_bus::queue_config;
use recon_bus::Event;
use recon_pipeline::{extract_targets, Stage};
use serde_json::json;

#[test]
fn subdomain_discovered_routes_to_discovery_not_analysis() {
    let mut event = Event::new("subdomain_discovered").with_confidence(0.7);
    event.extra.insert("subdomains".to_string(), json!(["api.example.com"]));

    let routing_key = queue_config::routing_key(&event.event);
    let priority = queue_config::confidence_to_priority(event.confidence);

    assert_eq!(routing_key, "discovery.subdomain_discovered");
    assert_eq!(priority, 7);
    assert_eq!(queue_config::queue_for_event(&event.event), Stage::Discovery.queue_name());
    assert_ne!(queue_config::queue_for_event(&event.event), Stage::Analysis.queue_name());

    assert_eq!(extract_targets(&event), vec!["api.example.com".to_string()]);
}

#[test]
fn missing_confidence_defaults_to_priority_five() {
    let event = Event::new("naabu_results_batch");
    assert_eq!(queue_config::confidence_to_priority(event.confidence), 5);
    assert_eq!(queue_config::queue_for_event(&event.event), Stage::Analysis.queue_name());
}
