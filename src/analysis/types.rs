//! Canonical report structures — the normalized shape every analysis
//! produces, regardless of what the upstream model actually returned.
//!
//! Fields stay `Option`/empty here; sentinel substitution ("Not specified",
//! "Not provided") is the renderer's job. Normalization must not need the
//! taxonomy to operate.

use serde::{Deserialize, Serialize};

/// The normalized analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    #[serde(default)]
    pub patient: Patient,
    #[serde(default)]
    pub abnormal_findings: Vec<AbnormalFinding>,
    #[serde(default)]
    pub categorized_analysis: Vec<CategorySummary>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// One row of the abnormal-findings table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbnormalFinding {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Model commentary for one clinical category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Parse an array leniently — skip items that fail to deserialize.
pub(crate) fn parse_array_lenient<T: for<'de> Deserialize<'de>>(
    items: Option<&[serde_json::Value]>,
) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_deserializes_with_all_fields_absent() {
        let report: CanonicalReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report, CanonicalReport::default());
        assert!(report.abnormal_findings.is_empty());
        assert!(report.categorized_analysis.is_empty());
    }

    #[test]
    fn lenient_parsing_skips_non_object_items() {
        let items = vec![
            serde_json::json!({"category": "Lipids & Cardiovascular Risk", "summary": "ok"}),
            serde_json::json!("just a string"),
            serde_json::json!({"category": "Haematology"}),
        ];
        let parsed: Vec<CategorySummary> = parse_array_lenient(Some(&items));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].category.as_deref(), Some("Haematology"));
        assert_eq!(parsed[1].summary, None);
    }

    #[test]
    fn finding_tolerates_partial_rows() {
        let finding: AbnormalFinding =
            serde_json::from_value(serde_json::json!({"test": "CRP", "result": "12 mg/L"}))
                .unwrap();
        assert_eq!(finding.test.as_deref(), Some("CRP"));
        assert_eq!(finding.reference_range, None);
    }
}
