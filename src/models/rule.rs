use serde::{Deserialize, Serialize};

use crate::models::report::ReportPriority;

/// The fixed set of automated flagging rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MultipleFailedReturns,
    SuspiciousActivityPattern,
    TrustScoreThreshold,
    MultipleReports,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::MultipleFailedReturns,
        RuleKind::SuspiciousActivityPattern,
        RuleKind::TrustScoreThreshold,
        RuleKind::MultipleReports,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RuleKind::MultipleFailedReturns => "multiple_failed_returns",
            RuleKind::SuspiciousActivityPattern => "suspicious_activity_pattern",
            RuleKind::TrustScoreThreshold => "trust_score_threshold",
            RuleKind::MultipleReports => "multiple_reports",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        RuleKind::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::MultipleFailedReturns => "Multiple Failed Returns",
            RuleKind::SuspiciousActivityPattern => "Suspicious Activity Pattern",
            RuleKind::TrustScoreThreshold => "Trust Score Threshold",
            RuleKind::MultipleReports => "Multiple Reports",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleKind::MultipleFailedReturns => {
                "User has three or more active loans overdue by more than a week"
            }
            RuleKind::SuspiciousActivityPattern => {
                "User made five or more borrow requests in the last month and returned fewer than half"
            }
            RuleKind::TrustScoreThreshold => {
                "User's trust score has dropped below the review threshold"
            }
            RuleKind::MultipleReports => {
                "User was reported by five or more distinct members in the last month"
            }
        }
    }

    pub fn priority(self) -> ReportPriority {
        match self {
            RuleKind::MultipleFailedReturns => ReportPriority::High,
            RuleKind::SuspiciousActivityPattern => ReportPriority::Medium,
            RuleKind::TrustScoreThreshold => ReportPriority::Medium,
            RuleKind::MultipleReports => ReportPriority::High,
        }
    }
}

/// A rule entry in the in-memory registry. Rules are constructed once at
/// startup and only their `is_active` flag changes afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FlaggingRule {
    #[serde(rename = "id")]
    pub kind: RuleKind,
    pub name: &'static str,
    pub description: &'static str,
    pub priority: ReportPriority,
    pub is_active: bool,
}

impl FlaggingRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            name: kind.name(),
            description: kind.description(),
            priority: kind.priority(),
            is_active: true,
        }
    }
}

/// The registry in its fixed order, all rules enabled.
pub fn default_rules() -> Vec<FlaggingRule> {
    RuleKind::ALL.into_iter().map(FlaggingRule::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rule_order() {
        let rules = default_rules();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].kind, RuleKind::MultipleFailedReturns);
        assert_eq!(rules[1].kind, RuleKind::SuspiciousActivityPattern);
        assert_eq!(rules[2].kind, RuleKind::TrustScoreThreshold);
        assert_eq!(rules[3].kind, RuleKind::MultipleReports);
        assert!(rules.iter().all(|r| r.is_active));
    }

    #[test]
    fn test_rule_id_roundtrip() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(RuleKind::from_id("unknown_rule"), None);
    }

    #[test]
    fn test_rule_priorities() {
        assert_eq!(
            RuleKind::MultipleFailedReturns.priority(),
            ReportPriority::High
        );
        assert_eq!(
            RuleKind::SuspiciousActivityPattern.priority(),
            ReportPriority::Medium
        );
        assert_eq!(RuleKind::MultipleReports.priority(), ReportPriority::High);
    }
}
