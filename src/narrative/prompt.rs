use crate::models::{DrugRiskAssessment, Findings, PhenotypePrediction, Variant};

const PREAMBLE: &str = "You are a clinical pharmacogenomics expert. A patient's VCF file has been analyzed.
Provide a comprehensive pharmacogenomic clinical report based on the following findings.";

const OUTPUT_SCHEMA: &str = r#"Based on the above, provide a structured JSON response with EXACTLY this schema:
{
  "clinical_summary": "<2-3 sentence patient-friendly summary of key pharmacogenomic findings>",
  "mechanism_explanation": "<detailed paragraph explaining the biological mechanisms for the identified variants and how they affect drug metabolism>",
  "dosing_recommendations": [
    "<specific actionable dosing recommendation for each drug>"
  ],
  "variant_citations": [
    {
      "variant": "<rsID or star allele>",
      "pmid": "<PubMed ID if known, else null>",
      "note": "<brief clinical significance note>"
    }
  ],
  "llm_confidence": <float between 0.0 and 1.0 representing your confidence in these recommendations>
}"#;

const RULES: &str = "Rules:
- Be specific and clinically actionable.
- For each drug, reference the relevant gene variant and phenotype.
- CPIC guideline levels should be mentioned where applicable.
- If a drug is CONTRAINDICATED or requires urgent dose adjustment, state it clearly.
- Return ONLY a single valid JSON object: no markdown code fences, no text before or after it.
- llm_confidence must be a float between 0.0 and 1.0.";

fn variant_line(v: &Variant) -> String {
    let mut parts = vec![format!("Gene: {}", v.gene)];
    if let Some(rsid) = &v.rsid {
        parts.push(format!("rsID: {}", rsid));
    }
    if let Some(star) = &v.star_allele {
        parts.push(format!("Star Allele: {}", star));
    }
    parts.push(format!("Position: chr{}:{}", v.chromosome, v.position));
    parts.push(format!(
        "REF/ALT: {}/{} ({})",
        v.ref_allele, v.alt_allele, v.zygosity
    ));
    parts.join(" | ")
}

fn phenotype_line(p: &PhenotypePrediction) -> String {
    format!(
        "- {}: {} → {} ({}), Activity Score: {:?}",
        p.gene, p.diplotype, p.phenotype, p.phenotype_full, p.activity_score
    )
}

fn risk_block(r: &DrugRiskAssessment) -> String {
    format!(
        "- Drug: {} | Gene: {} | Risk: {} | Severity: {} | CPIC: {}\n  Recommendation: {}",
        r.drug.to_uppercase(),
        r.gene,
        r.risk_category,
        r.severity,
        r.cpic_guideline,
        r.recommendation_brief
    )
}

fn section(lines: Vec<String>, empty: &str) -> String {
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}

/// Renders the findings into the instruction sent to the provider.
pub fn build_prompt(findings: &Findings) -> String {
    let variants = section(
        findings.variants.iter().map(variant_line).collect(),
        "No pharmacogenomic variants detected.",
    );
    let phenotypes = section(
        findings.phenotypes.iter().map(phenotype_line).collect(),
        "No phenotype predictions.",
    );
    let risks = section(
        findings.drug_risks.iter().map(risk_block).collect(),
        "No drug interactions assessed.",
    );
    let drugs = if findings.drugs.is_empty() {
        "No drugs specified.".to_string()
    } else {
        findings.drugs.join(", ")
    };

    format!(
        "{PREAMBLE}\n\n\
         === DETECTED GENETIC VARIANTS ===\n{variants}\n\n\
         === PHENOTYPE PREDICTIONS ===\n{phenotypes}\n\n\
         === DRUG RISK ASSESSMENTS (CPIC-based) ===\n{risks}\n\n\
         === DRUGS ANALYZED ===\n{drugs}\n\n\
         {OUTPUT_SCHEMA}\n\n\
         {RULES}\n"
    )
}
