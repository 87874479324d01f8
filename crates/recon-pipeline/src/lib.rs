//! Pipeline Orchestrator (C8): wires stage queues to scan services, which in
//! turn drive the Tool Runner (C2) and Batch Ingestor (C6) and publish
//! further events back onto the bus (C7).

pub mod error;
pub mod orchestrator;
pub mod scan_service;
pub mod services;
pub mod stage;
pub mod target_extraction;
pub mod traits;

pub use error::PipelineError;
pub use orchestrator::PipelineOrchestrator;
pub use scan_service::{ScanContext, ScanService};
pub use services::{HttpxScanService, SubfinderScanService};
pub use stage::Stage;
pub use target_extraction::extract_targets;
pub use traits::{ScopeCheck, UrlFilter};
