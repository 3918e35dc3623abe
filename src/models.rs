use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    Heterozygous,
    Homozygous,
    Hemizygous,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::Homozygous => "homozygous",
            Zygosity::Hemizygous => "hemizygous",
            Zygosity::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A pharmacogenomic variant called from the patient's VCF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub gene: String,
    pub rsid: Option<String>,
    pub star_allele: Option<String>,
    pub chromosome: String,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub zygosity: Zygosity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypePrediction {
    pub gene: String,
    pub diplotype: String,
    /// Short label, e.g. "IM"
    pub phenotype: String,
    /// Full description, e.g. "Intermediate Metabolizer"
    pub phenotype_full: String,
    pub activity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRiskAssessment {
    pub drug: String,
    pub gene: String,
    pub risk_category: String,
    pub severity: String,
    pub cpic_guideline: String,
    pub recommendation_brief: String,
}

/// Everything the upstream pipeline hands over for one patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub phenotypes: Vec<PhenotypePrediction>,
    #[serde(default)]
    pub drug_risks: Vec<DrugRiskAssessment>,
    #[serde(default)]
    pub drugs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantCitation {
    /// rsID or star allele
    pub variant: String,
    /// PubMed ID, when the model knows one
    pub pmid: Option<String>,
    pub note: String,
}

/// Model confidence, always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    /// Clamps into range; NaN becomes zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Confidence(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Confidence::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// The clinician-facing narrative returned for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResult {
    pub clinical_summary: String,
    pub mechanism_explanation: String,
    pub dosing_recommendations: Vec<String>,
    pub variant_citations: Vec<VariantCitation>,
    pub llm_model_used: String,
    pub llm_confidence: Confidence,
}
