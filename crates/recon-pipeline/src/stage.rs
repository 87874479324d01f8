//! The four pipeline stages and their (non-exhaustive) event edges.

use recon_bus::queue_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Discovery,
    Enumeration,
    Validation,
    Analysis,
}

impl Stage {
    pub fn queue_name(self) -> &'static str {
        match self {
            Stage::Discovery => queue_config::DISCOVERY_QUEUE,
            Stage::Enumeration => queue_config::ENUMERATION_QUEUE,
            Stage::Validation => queue_config::VALIDATION_QUEUE,
            Stage::Analysis => queue_config::ANALYSIS_QUEUE,
        }
    }

    pub const ALL: [Stage; 4] = [Stage::Discovery, Stage::Enumeration, Stage::Validation, Stage::Analysis];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_names_match_the_bus_constants() {
        assert_eq!(Stage::Discovery.queue_name(), queue_config::DISCOVERY_QUEUE);
        assert_eq!(Stage::Analysis.queue_name(), queue_config::ANALYSIS_QUEUE);
    }
}
