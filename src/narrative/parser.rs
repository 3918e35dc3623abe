use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{Confidence, NarrativeResult, VariantCitation};

pub const SUMMARY_UNAVAILABLE: &str = "LLM analysis unavailable.";

/// Removes a leading ```lang line and a trailing ``` marker, then trims.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        text = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.strip_suffix('\n').unwrap_or(rest);
    }
    text.trim()
}

fn parse_document(text: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(kind = json_kind(&other), "LLM response is not a JSON object; using defaults");
            Map::new()
        }
        Err(e) => {
            warn!(error = %e, "LLM JSON parse failed; using defaults");
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_empty_string(Some(item)))
                .collect()
        })
        .unwrap_or_default()
}

fn citation(value: &Value) -> Option<VariantCitation> {
    let entry = value.as_object()?;
    let variant = non_empty_string(entry.get("variant"))?;
    let pmid = match entry.get("pmid") {
        Some(Value::String(s)) if !s.trim().is_empty() && s.trim() != "null" => {
            Some(s.trim().to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let note = non_empty_string(entry.get("note")).unwrap_or_default();
    Some(VariantCitation { variant, pmid, note })
}

fn citations(value: Option<&Value>) -> Vec<VariantCitation> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let kept: Vec<VariantCitation> = items.iter().filter_map(citation).collect();
    let dropped = items.len() - kept.len();
    if dropped > 0 {
        warn!(dropped, "Malformed variant citations dropped");
    }
    kept
}

fn confidence(value: Option<&Value>) -> Confidence {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map(Confidence::new).unwrap_or(Confidence::ZERO)
}

/// Turns raw provider text into a narrative. Never fails: anything missing or
/// malformed falls back to a per-field default.
pub fn parse_response(raw: &str, model: &str) -> NarrativeResult {
    let doc = parse_document(strip_code_fences(raw));

    NarrativeResult {
        clinical_summary: non_empty_string(doc.get("clinical_summary"))
            .unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string()),
        mechanism_explanation: non_empty_string(doc.get("mechanism_explanation"))
            .unwrap_or_default(),
        dosing_recommendations: string_list(doc.get("dosing_recommendations")),
        variant_citations: citations(doc.get("variant_citations")),
        llm_model_used: model.to_string(),
        llm_confidence: confidence(doc.get("llm_confidence")),
    }
}
