//! Fixed domain vocabulary: business areas, document families and the seven
//! capability-quality categories used by the maturity matrices.
//!
//! These are closed sets. Every lookup here is a `match` on an enum, so a
//! process code can never drift from its business area.

use crate::error::Mita2JsonError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ── Business areas ───────────────────────────────────────────────────────

/// One of the nine MITA business areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BusinessArea {
    BusinessRelationshipManagement,
    CareManagement,
    ContractorManagement,
    EligibilityAndEnrollmentManagement,
    FinancialManagement,
    OperationsManagement,
    PerformanceManagement,
    PlanManagement,
    ProviderManagement,
}

impl BusinessArea {
    /// All areas in code order.
    pub const ALL: [BusinessArea; 9] = [
        BusinessArea::BusinessRelationshipManagement,
        BusinessArea::CareManagement,
        BusinessArea::ContractorManagement,
        BusinessArea::EligibilityAndEnrollmentManagement,
        BusinessArea::FinancialManagement,
        BusinessArea::OperationsManagement,
        BusinessArea::PerformanceManagement,
        BusinessArea::PlanManagement,
        BusinessArea::ProviderManagement,
    ];

    /// The fixed two-letter process code.
    pub fn code(self) -> &'static str {
        match self {
            BusinessArea::BusinessRelationshipManagement => "BR",
            BusinessArea::CareManagement => "CM",
            BusinessArea::ContractorManagement => "CO",
            BusinessArea::EligibilityAndEnrollmentManagement => "EE",
            BusinessArea::FinancialManagement => "FM",
            BusinessArea::OperationsManagement => "OM",
            BusinessArea::PerformanceManagement => "PE",
            BusinessArea::PlanManagement => "PL",
            BusinessArea::ProviderManagement => "PM",
        }
    }

    /// Display name, also used as the source directory name.
    pub fn name(self) -> &'static str {
        match self {
            BusinessArea::BusinessRelationshipManagement => "Business Relationship Management",
            BusinessArea::CareManagement => "Care Management",
            BusinessArea::ContractorManagement => "Contractor Management",
            BusinessArea::EligibilityAndEnrollmentManagement => {
                "Eligibility and Enrollment Management"
            }
            BusinessArea::FinancialManagement => "Financial Management",
            BusinessArea::OperationsManagement => "Operations Management",
            BusinessArea::PerformanceManagement => "Performance Management",
            BusinessArea::PlanManagement => "Plan Management",
            BusinessArea::ProviderManagement => "Provider Management",
        }
    }

    /// Output directory name: lowercase, spaces replaced by underscores.
    pub fn dir_name(self) -> String {
        self.name().to_lowercase().replace(' ', "_")
    }

    /// Look up an area by full name or code, case-insensitively.
    ///
    /// Also accepts the underscore form produced by [`dir_name`](Self::dir_name).
    pub fn from_name(s: &str) -> Option<BusinessArea> {
        let wanted = s.trim().replace('_', " ");
        Self::ALL.into_iter().find(|a| {
            a.code().eq_ignore_ascii_case(&wanted) || a.name().eq_ignore_ascii_case(&wanted)
        })
    }
}

impl fmt::Display for BusinessArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BusinessArea {
    type Err = Mita2JsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusinessArea::from_name(s).ok_or_else(|| Mita2JsonError::UnknownArea(s.to_string()))
    }
}

// Records carry the human-readable name, not the variant identifier.
impl Serialize for BusinessArea {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ── Document families ────────────────────────────────────────────────────

/// The two document families extracted from the MITA appendices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentFamily {
    /// Business Process Template: narrative process with ordered steps.
    Bpt,
    /// Business Capability Matrix: maturity questionnaire.
    Bcm,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 2] = [DocumentFamily::Bpt, DocumentFamily::Bcm];

    /// `BPT` / `BCM`, as used in file names and `document_type`.
    pub fn tag(self) -> &'static str {
        match self {
            DocumentFamily::Bpt => "BPT",
            DocumentFamily::Bcm => "BCM",
        }
    }

    /// `bpt` / `bcm`, as used in source and output directory names.
    pub fn dir_name(self) -> &'static str {
        match self {
            DocumentFamily::Bpt => "bpt",
            DocumentFamily::Bcm => "bcm",
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Capability categories ────────────────────────────────────────────────

/// The seven quality dimensions a capability question is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapabilityCategory {
    #[default]
    Descriptions,
    Timeliness,
    DataAccessAndAccuracy,
    CostEffectiveness,
    EffortAndEfficiency,
    UtilityOrValue,
    AccuracyOfResults,
}

impl CapabilityCategory {
    pub fn label(self) -> &'static str {
        match self {
            CapabilityCategory::Descriptions => "Business Capability Descriptions",
            CapabilityCategory::Timeliness => "Business Capability Quality: Timeliness of Process",
            CapabilityCategory::DataAccessAndAccuracy => {
                "Business Capability Quality: Data Access and Accuracy"
            }
            CapabilityCategory::CostEffectiveness => {
                "Business Capability Quality: Cost Effectiveness"
            }
            CapabilityCategory::EffortAndEfficiency => {
                "Business Capability Quality: Effort to Perform; Efficiency"
            }
            CapabilityCategory::UtilityOrValue => {
                "Business Capability Quality: Utility or Value to Stakeholders"
            }
            CapabilityCategory::AccuracyOfResults => {
                "Business Capability Quality: Accuracy of Process Results"
            }
        }
    }

    /// Map a "Business Capability …" heading row to its category.
    ///
    /// Matching is by substring in a fixed order; `None` means the heading
    /// is not recognised and the caller keeps its current category.
    pub fn from_heading(heading: &str) -> Option<CapabilityCategory> {
        if heading.contains("Descriptions") {
            Some(CapabilityCategory::Descriptions)
        } else if heading.contains("Timeliness") {
            Some(CapabilityCategory::Timeliness)
        } else if heading.contains("Data Access") || heading.contains("Data Accuracy") {
            Some(CapabilityCategory::DataAccessAndAccuracy)
        } else if heading.contains("Cost") {
            Some(CapabilityCategory::CostEffectiveness)
        } else if heading.contains("Effort") || heading.contains("Efficiency") {
            Some(CapabilityCategory::EffortAndEfficiency)
        } else if heading.contains("Utility") || heading.contains("Value") {
            Some(CapabilityCategory::UtilityOrValue)
        } else if heading.contains("Accuracy") {
            Some(CapabilityCategory::AccuracyOfResults)
        } else {
            None
        }
    }
}

impl Serialize for CapabilityCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_fixed() {
        let codes: Vec<&str> = BusinessArea::ALL.iter().map(|a| a.code()).collect();
        assert_eq!(codes, ["BR", "CM", "CO", "EE", "FM", "OM", "PE", "PL", "PM"]);
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = BusinessArea::ALL.iter().map(|a| a.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 9);
    }

    #[test]
    fn from_name_accepts_code_name_and_dir_form() {
        assert_eq!(BusinessArea::from_name("cm"), Some(BusinessArea::CareManagement));
        assert_eq!(
            BusinessArea::from_name("eligibility and enrollment management"),
            Some(BusinessArea::EligibilityAndEnrollmentManagement)
        );
        assert_eq!(
            BusinessArea::from_name("plan_management"),
            Some(BusinessArea::PlanManagement)
        );
        assert_eq!(BusinessArea::from_name("Widgets"), None);
    }

    #[test]
    fn from_str_reports_unknown_area() {
        let err = "Nope".parse::<BusinessArea>().unwrap_err();
        assert!(matches!(err, Mita2JsonError::UnknownArea(_)));
    }

    #[test]
    fn dir_name_is_snake_case() {
        assert_eq!(
            BusinessArea::BusinessRelationshipManagement.dir_name(),
            "business_relationship_management"
        );
    }

    #[test]
    fn area_serialises_as_name() {
        let json = serde_json::to_string(&BusinessArea::FinancialManagement).unwrap();
        assert_eq!(json, "\"Financial Management\"");
    }

    #[test]
    fn family_tags() {
        assert_eq!(DocumentFamily::Bpt.tag(), "BPT");
        assert_eq!(DocumentFamily::Bcm.dir_name(), "bcm");
        assert_eq!(serde_json::to_string(&DocumentFamily::Bcm).unwrap(), "\"BCM\"");
    }

    #[test]
    fn category_heading_mapping_order() {
        assert_eq!(
            CapabilityCategory::from_heading("Business Capability Descriptions"),
            Some(CapabilityCategory::Descriptions)
        );
        assert_eq!(
            CapabilityCategory::from_heading("Business Capability Quality: Data Access and Accuracy"),
            Some(CapabilityCategory::DataAccessAndAccuracy)
        );
        assert_eq!(
            CapabilityCategory::from_heading("Business Capability Quality: Accuracy of Process Results"),
            Some(CapabilityCategory::AccuracyOfResults)
        );
        assert_eq!(
            CapabilityCategory::from_heading("Business Capability Quality: Effort to Perform; Efficiency"),
            Some(CapabilityCategory::EffortAndEfficiency)
        );
        assert_eq!(CapabilityCategory::from_heading("Business Capability"), None);
    }
}
