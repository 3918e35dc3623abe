use std::collections::HashMap;

use pgx_narrative::narrative::{build_prompt, fallback_analysis};
use pgx_narrative::{
    CompletionProvider, Config, DrugRiskAssessment, Findings, Narrator, Outcome,
    PhenotypePrediction, Variant, Zygosity,
};

fn config(pairs: &[(&str, &str)]) -> Config {
    let env: HashMap<&str, &str> = pairs.iter().copied().collect();
    Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

fn codeine_findings() -> Findings {
    Findings {
        variants: vec![Variant {
            gene: "CYP2D6".into(),
            rsid: Some("rs3892097".into()),
            star_allele: None,
            chromosome: "22".into(),
            position: 42130692,
            ref_allele: "G".into(),
            alt_allele: "A".into(),
            zygosity: Zygosity::Heterozygous,
        }],
        phenotypes: vec![PhenotypePrediction {
            gene: "CYP2D6".into(),
            diplotype: "*1/*4".into(),
            phenotype: "Intermediate Metabolizer".into(),
            phenotype_full: "Intermediate Metabolizer".into(),
            activity_score: 1.0,
        }],
        drug_risks: vec![DrugRiskAssessment {
            drug: "codeine".into(),
            gene: "CYP2D6".into(),
            risk_category: "moderate".into(),
            severity: "warning".into(),
            cpic_guideline: "Level A".into(),
            recommendation_brief: "Consider alternative analgesic".into(),
        }],
        drugs: vec!["codeine".into()],
    }
}

#[test]
fn codeine_prompt_mentions_gene_and_drug() {
    let prompt = build_prompt(&codeine_findings());
    assert!(prompt.matches("CYP2D6").count() >= 2);
    assert!(prompt.contains("codeine"));
    assert!(prompt.contains("Drug: CODEINE"));
    assert!(prompt.contains("*1/*4 → Intermediate Metabolizer"));
    assert!(prompt.contains("Activity Score: 1.0"));
}

#[tokio::test]
async fn codeine_without_credential_returns_fallback() {
    let narrator = Narrator::from_config(&config(&[])).unwrap();
    let run = narrator.run(&codeine_findings()).await;

    assert_eq!(run.outcome, Outcome::NoCredential);
    assert_eq!(
        run.analysis,
        fallback_analysis("llama3-8b-8192", Some("no API key configured for openai"))
    );
}

#[tokio::test]
async fn gemini_without_credential_returns_fallback() {
    let narrator = Narrator::from_config(&config(&[("LLM_PROVIDER", "gemini")])).unwrap();
    assert_eq!(narrator.provider().name(), "gemini");

    let result = narrator.narrate(&codeine_findings()).await;
    assert_eq!(result.llm_model_used, "gemini-1.5-flash");
    assert_eq!(result.dosing_recommendations.len(), 1);
    assert!(result.variant_citations.is_empty());
}

#[tokio::test]
async fn unreachable_provider_returns_fallback_with_cause() {
    let narrator = Narrator::from_config(&config(&[
        ("OPENAI_API_KEY", "test-key"),
        ("OPENAI_BASE_URL", "http://127.0.0.1:1/v1"),
        ("LLM_TIMEOUT_SECS", "5"),
    ]))
    .unwrap();
    let run = narrator.run(&codeine_findings()).await;

    assert!(matches!(run.outcome, Outcome::ProviderFailed(_)));
    assert!(run
        .analysis
        .clinical_summary
        .contains("request to LLM API failed"));
    assert_eq!(run.analysis.llm_confidence.value(), 0.0);
}

#[tokio::test]
async fn empty_findings_still_yield_one_result() {
    let narrator = Narrator::from_config(&config(&[])).unwrap();
    let result = narrator.narrate(&Findings::default()).await;
    let confidence = result.llm_confidence.value();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(!result.clinical_summary.is_empty());
}
