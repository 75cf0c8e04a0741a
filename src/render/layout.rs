//! Report layout — maps a `CanonicalReport` onto the fixed section order
//! used by both the JSON consumers and the PDF export.
//!
//! Sentinel substitution happens here, not during normalization: every
//! field the model omitted renders as "Not specified" (or "Not provided"
//! for reference ranges).

use serde::Serialize;

use crate::analysis::taxonomy;
use crate::analysis::CanonicalReport;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NOT_PROVIDED: &str = "Not provided";
pub const NO_ABNORMAL_FINDINGS: &str = "No abnormal findings detected";

pub const DISCLAIMER: &str = "This report was generated by an automated analysis of a laboratory \
     document and is for informational purposes only. It is not a medical \
     diagnosis. Always discuss results with a qualified healthcare professional.";

/// The fully laid-out report, ready for display or PDF export.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    pub patient: PatientBlock,
    /// Category sections in taxonomy order; categories without a matching
    /// summary are omitted, not rendered empty.
    pub categories: Vec<CategorySection>,
    /// Abnormal-findings rows; empty means "no abnormal findings".
    pub findings: Vec<FindingRow>,
    pub summary: String,
    pub recommendations: String,
    pub follow_up: String,
    pub disclaimer: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientBlock {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub category: &'static str,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindingRow {
    pub test: String,
    pub result: String,
    pub reference_range: String,
    pub note: String,
}

/// Lay out a canonical report in the fixed display order.
pub fn render(report: &CanonicalReport) -> RenderedReport {
    let patient = PatientBlock {
        name: sentinel(report.patient.name.as_deref()),
        age: sentinel(report.patient.age.as_deref()),
        sex: sentinel(report.patient.sex.as_deref()),
        date: sentinel(report.patient.date.as_deref()),
    };

    // Taxonomy drives the order; the model's ordering is irrelevant.
    // Entries naming a category outside the taxonomy are dropped.
    let categories = taxonomy::CATEGORIES
        .iter()
        .filter_map(|&category| {
            report
                .categorized_analysis
                .iter()
                .find(|entry| {
                    entry.category.as_deref().and_then(taxonomy::canonical) == Some(category)
                })
                .map(|entry| CategorySection {
                    category,
                    summary: sentinel(entry.summary.as_deref()),
                })
        })
        .collect();

    let findings = report
        .abnormal_findings
        .iter()
        .map(|f| FindingRow {
            test: sentinel(f.test.as_deref()),
            result: sentinel(f.result.as_deref()),
            reference_range: f
                .reference_range
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_PROVIDED)
                .to_string(),
            note: f.note.as_deref().unwrap_or("").trim().to_string(),
        })
        .collect();

    RenderedReport {
        patient,
        categories,
        findings,
        summary: sentinel(report.summary.as_deref()),
        recommendations: sentinel(report.recommendations.as_deref()),
        follow_up: sentinel(report.follow_up.as_deref()),
        disclaimer: DISCLAIMER,
    }
}

fn sentinel(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_SPECIFIED.to_string(),
    }
}
