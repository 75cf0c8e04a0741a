//! Prompt construction for the external analysis API.
//!
//! `build_analysis_prompt` and `response_schema` describe the SAME report
//! shape — one as instruction text, one as a machine-checked schema for the
//! structured output path. They live side by side in this module so a field
//! added to one is added to the other in the same change.

use crate::analysis::taxonomy;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a clinical laboratory report analyst. Your role is to read a
blood-test report and summarise it for the patient in plain language.

RULES — ABSOLUTE, NO EXCEPTIONS:
1. Base every statement on values explicitly present in the report.
2. Respond with a single JSON object and NOTHING else — no prose before or
   after it, no markdown fences.
3. If a field cannot be determined from the report, output null for it.
4. Preserve exact test values, units, and reference ranges verbatim.
5. Never invent tests, values, or patient details that are not in the report.
"#;

/// Build the per-request analysis prompt. Pure function of its input.
pub fn build_analysis_prompt(note: Option<&str>) -> String {
    let note_block = match note {
        Some(n) if !n.trim().is_empty() => {
            format!("Additional context from the requester:\n{}\n\n", n.trim())
        }
        _ => String::new(),
    };

    let categories = taxonomy::CATEGORIES.join(", ");

    format!(
        r#"{note_block}Analyse the attached blood-test report.

Group test commentary into these categories, using the exact names given
(omit a category entirely when the report has no tests for it):
{categories}

Respond with a JSON object of exactly this shape:

{{
  "patient": {{
    "name": "patient name or null",
    "age": "age as written in the report, or null",
    "sex": "sex as written in the report, or null",
    "date": "report or collection date, or null"
  }},
  "abnormal_findings": [
    {{
      "category": "one of the category names above",
      "test": "test name",
      "result": "value with unit, verbatim",
      "reference_range": "reference range, verbatim, or null",
      "note": "one sentence on what this deviation means"
    }}
  ],
  "categorized_analysis": [
    {{
      "category": "one of the category names above",
      "summary": "2-4 sentences covering every test in that category"
    }}
  ],
  "summary": "overall summary: 3-5 sentences",
  "recommendations": "practical recommendations: 2-4 sentences",
  "follow_up": "suggested follow-up testing or review, 1-2 sentences"
}}

"abnormal_findings" and "categorized_analysis" are arrays; include an empty
array when there is nothing to report. All other fields are free text."#
    )
}

/// The report shape as an upstream-checkable response schema
/// (Gemini `generationConfig.response_schema` dialect).
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "patient": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING", "nullable": true },
                    "age": { "type": "STRING", "nullable": true },
                    "sex": { "type": "STRING", "nullable": true },
                    "date": { "type": "STRING", "nullable": true }
                }
            },
            "abnormal_findings": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING", "nullable": true },
                        "test": { "type": "STRING" },
                        "result": { "type": "STRING" },
                        "reference_range": { "type": "STRING", "nullable": true },
                        "note": { "type": "STRING", "nullable": true }
                    }
                }
            },
            "categorized_analysis": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "summary": { "type": "STRING" }
                    }
                }
            },
            "summary": { "type": "STRING", "nullable": true },
            "recommendations": { "type": "STRING", "nullable": true },
            "follow_up": { "type": "STRING", "nullable": true }
        },
        "required": ["patient", "abnormal_findings", "categorized_analysis"]
    })
}
