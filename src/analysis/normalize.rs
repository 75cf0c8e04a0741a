//! Response normalization — turns the upstream model's unreliable output
//! into a `CanonicalReport`.
//!
//! Recovery chain, first success wins:
//! 1. structured output is used as-is;
//! 2. free text is parsed directly as JSON;
//! 3. the span from the first `{` to the last `}` is extracted and given
//!    textual repairs (newline collapse, single quotes, trailing commas),
//!    then parsed;
//! 4. everything failed — `InvalidModelOutput`, carrying the raw text.
//!
//! The span extraction is a greedy heuristic, not a balanced-brace parse:
//! prose after the object that itself contains `}` widens the span and can
//! break the parse. Known limitation, kept as-is.
//!
//! After any successful parse, `abnormal_findings` and
//! `categorized_analysis` are coerced to arrays (missing or mistyped →
//! empty). A model omitting an empty section is routine, never an error.

use std::sync::OnceLock;

use regex::Regex;

use super::client::ModelOutput;
use super::types::{parse_array_lenient, CanonicalReport, Patient};
use super::AnalysisError;

/// Normalize raw model output into the canonical report shape.
pub fn normalize(output: ModelOutput) -> Result<CanonicalReport, AnalysisError> {
    let value = match output {
        ModelOutput::Structured(value) => value,
        ModelOutput::FreeText(text) => parse_free_text(&text)?,
    };
    Ok(coerce_report(value))
}

/// Recover a JSON object from free-form model text.
fn parse_free_text(text: &str) -> Result<serde_json::Value, AnalysisError> {
    // Direct parse — the happy path when the model obeyed "JSON only".
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Longest bracketed span, then textual repairs.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let repaired = repair_json(&text[start..=end]);
            match serde_json::from_str::<serde_json::Value>(&repaired) {
                Ok(value) if value.is_object() => return Ok(value),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Repaired model output still failed to parse");
                }
            }
        }
    }

    tracing::warn!(len = text.len(), "Model output is not recoverable JSON");
    Err(AnalysisError::InvalidModelOutput {
        raw: text.to_string(),
    })
}

/// Apply the textual repair sequence to a candidate JSON span.
///
/// Heuristic by design: an apostrophe inside legitimate content becomes a
/// stray double quote. Preserved behaviour, see the module docs.
fn repair_json(span: &str) -> String {
    static NEWLINES: OnceLock<Regex> = OnceLock::new();
    static TRAILING_COMMA_BRACE: OnceLock<Regex> = OnceLock::new();
    static TRAILING_COMMA_BRACKET: OnceLock<Regex> = OnceLock::new();

    let newlines = NEWLINES.get_or_init(|| Regex::new(r"[\r\n]+").unwrap());
    let comma_brace = TRAILING_COMMA_BRACE.get_or_init(|| Regex::new(r",\s*\}").unwrap());
    let comma_bracket = TRAILING_COMMA_BRACKET.get_or_init(|| Regex::new(r",\s*\]").unwrap());

    let flat = newlines.replace_all(span, " ");
    let quoted = flat.replace('\'', "\"");
    let no_obj_commas = comma_brace.replace_all(&quoted, "}");
    comma_bracket.replace_all(&no_obj_commas, "]").into_owned()
}

/// Shape coercion: guarantee both array fields, keep everything else as the
/// model sent it. Sentinel defaults are applied at render time, not here.
fn coerce_report(mut value: serde_json::Value) -> CanonicalReport {
    let findings = take_array(&mut value, "abnormal_findings");
    let categories = take_array(&mut value, "categorized_analysis");

    let obj = value.as_object().cloned().unwrap_or_default();

    let patient = obj
        .get("patient")
        .and_then(serde_json::Value::as_object)
        .map(parse_patient_lenient)
        .unwrap_or_default();

    CanonicalReport {
        patient,
        abnormal_findings: parse_array_lenient(findings.as_deref()),
        categorized_analysis: parse_array_lenient(categories.as_deref()),
        summary: string_field(&obj, "summary"),
        recommendations: string_field(&obj, "recommendations"),
        follow_up: string_field(&obj, "follow_up"),
    }
}

/// Field-by-field patient extraction. A model emitting `"age": 40` as a
/// number must not cost us the name next to it, so mistyped fields degrade
/// individually: numbers are stringified, anything else becomes `None`.
fn parse_patient_lenient(obj: &serde_json::Map<String, serde_json::Value>) -> Patient {
    let field = |key: &str| match obj.get(key) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Patient {
        name: field("name"),
        age: field("age"),
        sex: field("sex"),
        date: field("date"),
    }
}

fn take_array(value: &mut serde_json::Value, key: &str) -> Option<Vec<serde_json::Value>> {
    match value.get_mut(key).map(serde_json::Value::take) {
        Some(serde_json::Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn string_field(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}
