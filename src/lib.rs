//! Clinician-facing pharmacogenomic narratives generated by an external LLM,
//! with a deterministic fallback whenever the provider cannot deliver.

pub mod config;
pub mod instrumentation;
pub mod llm;
pub mod models;
pub mod narrative;

pub use config::{Config, ProviderKind};
pub use llm::{CompletionProvider, Provider, ProviderError};
pub use models::{
    Confidence, DrugRiskAssessment, Findings, NarrativeResult, PhenotypePrediction, Variant,
    VariantCitation, Zygosity,
};
pub use narrative::{NarrativeRun, Narrator, Outcome};
