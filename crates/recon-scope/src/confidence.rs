//! Weighted-signal confidence scoring, grounded on `confidence_scorer.py`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    DomainRule,
    SanCert,
    PtrRecord,
    AsnMatch,
    CnameChain,
    CdnEdge,
    ReverseWhois,
}

impl SignalType {
    fn weight(self) -> f64 {
        match self {
            SignalType::DomainRule => 1.0,
            SignalType::SanCert => 0.6,
            SignalType::PtrRecord => 0.5,
            SignalType::AsnMatch => 0.4,
            SignalType::ReverseWhois => 0.3,
            SignalType::CnameChain => 0.3,
            SignalType::CdnEdge => 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signal {
    pub signal_type: SignalType,
    pub source: Option<String>,
    pub details: Option<String>,
}

impl Signal {
    pub fn new(signal_type: SignalType) -> Self {
        Self {
            signal_type,
            source: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfidenceResult {
    pub target: String,
    pub score: f64,
    pub signals: Vec<Signal>,
    pub is_in_scope: bool,
}

impl ConfidenceResult {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            score: 0.0,
            signals: Vec::new(),
            is_in_scope: false,
        }
    }

    pub fn add_signal(&mut self, signal: Signal) {
        self.is_in_scope = self.is_in_scope || signal.signal_type == SignalType::DomainRule;
        self.signals.push(signal);
        self.recalculate();
    }

    fn recalculate(&mut self) {
        let total: f64 = self.signals.iter().map(|s| s.signal_type.weight()).sum();
        self.score = total.min(1.0);
    }
}

/// Observed signals for a single target, passed to [`ConfidenceScorer::score_target`].
#[derive(Debug, Clone, Default)]
pub struct ObservedSignals {
    pub domain_match: bool,
    pub san_match: bool,
    pub ptr_match: bool,
    pub asn_match: bool,
    pub cname_match: bool,
    pub cdn_match: bool,
    pub whois_match: bool,
}

pub struct ConfidenceScorer {
    threshold: f64,
}

impl ConfidenceScorer {
    /// Default threshold is 0.6, per the scope evaluator contract.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn score_target(&self, target: &str, observed: &ObservedSignals) -> ConfidenceResult {
        let mut result = ConfidenceResult::new(target);

        if observed.domain_match {
            result.add_signal(Signal::new(SignalType::DomainRule));
        }
        if observed.san_match {
            result.add_signal(Signal::new(SignalType::SanCert));
        }
        if observed.ptr_match {
            result.add_signal(Signal::new(SignalType::PtrRecord));
        }
        if observed.asn_match {
            result.add_signal(Signal::new(SignalType::AsnMatch));
        }
        if observed.cname_match {
            result.add_signal(Signal::new(SignalType::CnameChain));
        }
        if observed.cdn_match {
            result.add_signal(Signal::new(SignalType::CdnEdge));
        }
        if observed.whois_match {
            result.add_signal(Signal::new(SignalType::ReverseWhois));
        }

        result
    }

    pub fn is_confident(&self, result: &ConfidenceResult) -> bool {
        result.score >= self.threshold
    }

    pub fn filter_by_confidence<'a>(
        &self,
        results: &'a [ConfidenceResult],
    ) -> (Vec<&'a ConfidenceResult>, Vec<&'a ConfidenceResult>) {
        results.iter().partition(|r| self.is_confident(r))
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_rule_alone_is_not_confident_but_is_in_scope() {
        let scorer = ConfidenceScorer::default();
        let observed = ObservedSignals {
            domain_match: true,
            ..Default::default()
        };
        let result = scorer.score_target("api.example.com", &observed);
        assert!(result.is_in_scope);
        assert!((result.score - 1.0).abs() < f64::EPSILON);
        assert!(scorer.is_confident(&result));
    }

    #[test]
    fn score_is_clamped_to_one() {
        let scorer = ConfidenceScorer::default();
        let observed = ObservedSignals {
            domain_match: true,
            san_match: true,
            ptr_match: true,
            asn_match: true,
            ..Default::default()
        };
        let result = scorer.score_target("x", &observed);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn weak_signals_without_domain_rule_are_uncertain() {
        let scorer = ConfidenceScorer::default();
        let observed = ObservedSignals {
            cdn_match: true,
            ..Default::default()
        };
        let result = scorer.score_target("cdn.example.net", &observed);
        assert!(!result.is_in_scope);
        assert!(!scorer.is_confident(&result));
    }

    #[test]
    fn filter_by_confidence_partitions() {
        let scorer = ConfidenceScorer::default();
        let confident = scorer.score_target(
            "a",
            &ObservedSignals {
                domain_match: true,
                ..Default::default()
            },
        );
        let uncertain = scorer.score_target(
            "b",
            &ObservedSignals {
                cdn_match: true,
                ..Default::default()
            },
        );
        let results = vec![confident, uncertain];
        let (conf, unc) = scorer.filter_by_confidence(&results);
        assert_eq!(conf.len(), 1);
        assert_eq!(unc.len(), 1);
    }
}
