use crate::models::{Confidence, NarrativeResult};

pub const DEFAULT_ERROR: &str = "API key not configured or service error";

/// Narrative returned whenever the provider path cannot produce one.
pub fn fallback_analysis(model: &str, error: Option<&str>) -> NarrativeResult {
    let error = error.unwrap_or(DEFAULT_ERROR);
    NarrativeResult {
        clinical_summary: format!(
            "LLM analysis is currently unavailable. Error details: {}. \
             Please review the drug risk assessments and phenotype predictions for clinical guidance.",
            error
        ),
        mechanism_explanation: "Manual review required. Refer to CPIC guidelines at https://cpicpgx.org \
             for detailed pharmacogenomic interaction information."
            .to_string(),
        dosing_recommendations: vec![
            "Consult clinical pharmacist for personalized dosing guidance.".to_string(),
        ],
        variant_citations: Vec::new(),
        llm_model_used: model.to_string(),
        llm_confidence: Confidence::ZERO,
    }
}
