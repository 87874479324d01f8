//! Fixed topic-exchange / queue layout, grounded on `queue_config.py`.

pub const EXCHANGE_NAME: &str = "scan.events";

pub const DISCOVERY_QUEUE: &str = "discovery";
pub const ENUMERATION_QUEUE: &str = "enumeration";
pub const VALIDATION_QUEUE: &str = "validation";
pub const ANALYSIS_QUEUE: &str = "analysis";

pub const ALL_QUEUES: [&str; 4] = [
    DISCOVERY_QUEUE,
    ENUMERATION_QUEUE,
    VALIDATION_QUEUE,
    ANALYSIS_QUEUE,
];

/// Static event-name -> queue-name table. Unknown events fall back to
/// [`ANALYSIS_QUEUE`] (see [`queue_for_event`]) rather than being rejected.
const EVENT_TO_QUEUE: &[(&str, &str)] = &[
    ("subfinder_scan_requested", DISCOVERY_QUEUE),
    ("subdomain_discovered", DISCOVERY_QUEUE),
    ("asnmap_scan_requested", DISCOVERY_QUEUE),
    ("asn_discovered", DISCOVERY_QUEUE),
    ("cidr_discovered", DISCOVERY_QUEUE),
    ("mapcidr_scan_requested", ENUMERATION_QUEUE),
    ("ips_expanded", ENUMERATION_QUEUE),
    ("cidr_sliced", ENUMERATION_QUEUE),
    ("ips_aggregated", ENUMERATION_QUEUE),
    ("hakip2host_scan_requested", ENUMERATION_QUEUE),
    ("smap_scan_requested", ENUMERATION_QUEUE),
    ("smap_results", ENUMERATION_QUEUE),
    ("ports_discovered", ENUMERATION_QUEUE),
    ("dnsx_basic_scan_requested", VALIDATION_QUEUE),
    ("dnsx_deep_scan_requested", VALIDATION_QUEUE),
    ("dnsx_ptr_scan_requested", VALIDATION_QUEUE),
    ("dnsx_filtered_hosts", VALIDATION_QUEUE),
    ("dnsx_basic_results_batch", VALIDATION_QUEUE),
    ("dnsx_deep_results_batch", VALIDATION_QUEUE),
    ("dnsx_ptr_results_batch", VALIDATION_QUEUE),
    ("httpx_scan_requested", ANALYSIS_QUEUE),
    ("host_discovered", ANALYSIS_QUEUE),
    ("scan_results_batch", ANALYSIS_QUEUE),
    ("tlsx_scan_requested", ANALYSIS_QUEUE),
    ("tlsx_results_batch", ANALYSIS_QUEUE),
    ("cert_san_discovered", ANALYSIS_QUEUE),
    ("gau_scan_requested", ANALYSIS_QUEUE),
    ("gau_discovered", ANALYSIS_QUEUE),
    ("katana_scan_requested", ANALYSIS_QUEUE),
    ("katana_results_batch", ANALYSIS_QUEUE),
    ("js_files_discovered", ANALYSIS_QUEUE),
    ("linkfinder_scan_requested", ANALYSIS_QUEUE),
    ("mantra_scan_requested", ANALYSIS_QUEUE),
    ("mantra_results_batch", ANALYSIS_QUEUE),
    ("ffuf_scan_requested", ANALYSIS_QUEUE),
    ("ffuf_results_batch", ANALYSIS_QUEUE),
    ("subjack_scan_requested", ANALYSIS_QUEUE),
    ("subjack_results_batch", ANALYSIS_QUEUE),
    ("naabu_scan_requested", ANALYSIS_QUEUE),
    ("naabu_results_batch", ANALYSIS_QUEUE),
];

pub fn queue_for_event(event_name: &str) -> &'static str {
    EVENT_TO_QUEUE
        .iter()
        .find(|(name, _)| *name == event_name)
        .map(|(_, queue)| *queue)
        .unwrap_or(ANALYSIS_QUEUE)
}

pub fn routing_key(event_name: &str) -> String {
    format!("{}.{event_name}", queue_for_event(event_name))
}

pub fn queue_binding(queue_name: &str) -> String {
    format!("{queue_name}.#")
}

/// `min(10, max(0, confidence * 10))`. Default confidence 0.5 -> priority 5.
pub fn confidence_to_priority(confidence: f64) -> u8 {
    ((confidence * 10.0) as i64).clamp(0, 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_event_maps_to_its_queue() {
        assert_eq!(queue_for_event("subdomain_discovered"), DISCOVERY_QUEUE);
        assert_eq!(routing_key("subdomain_discovered"), "discovery.subdomain_discovered");
    }

    #[test]
    fn unknown_event_defaults_to_analysis_queue() {
        assert_eq!(queue_for_event("totally_unknown_event"), ANALYSIS_QUEUE);
    }

    #[test]
    fn confidence_clamped_into_priority_range() {
        assert_eq!(confidence_to_priority(0.0), 0);
        assert_eq!(confidence_to_priority(0.5), 5);
        assert_eq!(confidence_to_priority(1.0), 10);
        assert_eq!(confidence_to_priority(1.5), 10);
    }
}
