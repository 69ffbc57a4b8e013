//! Credibility verdicts produced by the evaluator.
//!
//! Scale contract: every score field is an integer in `[0, 100]`, while the
//! `confidence` inside `UncertaintyAssessment` is a fraction in `[0, 1]`.
//! Consumers rely on this mix and do not re-normalize it.

use serde::{Deserialize, Serialize};

use crate::source::Source;

/// Qualitative agreement among sources on one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consensus {
    Strong,
    Weak,
    Conflicting,
}

/// Derived from the number of supporting sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    High,
    Medium,
    Low,
}

/// Verdict for a single claim checked against the run's sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub claim: String,
    pub supporting_sources: Vec<Source>,
    pub contradicting_sources: Vec<Source>,
    /// Integer in `[0, 100]`.
    pub confidence: u32,
    pub consensus: Consensus,
    pub evidence_strength: EvidenceStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    Caution,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyAssessment {
    /// Fraction in `[0, 1]`.
    pub confidence: f64,
    pub factors: Vec<String>,
    pub alternatives: Vec<String>,
    pub recommendation: Recommendation,
    pub risk_level: RiskLevel,
}

/// Sub-scores feeding the overall credibility score, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityBreakdown {
    pub source_quality: u32,
    pub fact_checking: u32,
    pub cross_validation: u32,
    pub temporal_validity: u32,
    pub authority_weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    /// Integer in `[0, 100]`.
    pub overall: u32,
    pub breakdown: CredibilityBreakdown,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

/// Everything the Verify stage produces, computed once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityReport {
    pub cross_validation: Vec<CrossValidationResult>,
    pub uncertainty: UncertaintyAssessment,
    pub score: CredibilityScore,
}
