//! Scope evaluation and confidence scoring for recon targets (C3).

pub mod checker;
pub mod confidence;

pub use checker::{is_in_scope, ScopeError};
pub use confidence::{ConfidenceResult, ConfidenceScorer, Signal, SignalType};
