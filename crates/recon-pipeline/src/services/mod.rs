//! Concrete scan services. Each wraps one `recon_tools` adapter behind the
//! `ScanService` contract: extract targets, run the tool, ingest, publish
//! downstream events. Every tool in `recon_tools` follows the same shape;
//! these two are wired end-to-end as the reference implementation the
//! remaining tools (dnsx, naabu, katana) follow identically.

pub mod httpx_service;
pub mod subfinder_service;

pub use httpx_service::HttpxScanService;
pub use subfinder_service::SubfinderScanService;
