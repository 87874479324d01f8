//! Concrete tool adapters (C2 implementations) plus the headless-crawler
//! state machine. Each adapter follows the same shape: a raw DTO mirroring
//! the tool's JSON-lines output, a mapper that turns it into a typed
//! fragment, and a `ToolAdapter` wiring it to the process supervisor.
//!
//! A record that fails to map is a [`recon_core::ParseOutcome::ParseSkip`],
//! never an error.

pub mod crawler;
pub mod dnsx;
pub mod httpx;
pub mod katana;
pub mod naabu;
pub mod subfinder;
