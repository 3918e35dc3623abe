use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::Findings;
use crate::narrative::{NarrativeRun, Outcome};

/// Metadata about one narrative request. Holds no narrative text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub timestamp: String,
    pub provider: String,
    pub model: String,
    pub outcome: String,
    pub error: Option<String>,
    pub latency_ms: u64,
    pub num_variants: usize,
    pub num_phenotypes: usize,
    pub num_drug_risks: usize,
    pub num_drugs: usize,
    pub confidence: f64,
}

impl RunLog {
    pub fn new(provider: &str, findings: &Findings, run: &NarrativeRun) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            provider: provider.to_string(),
            model: run.analysis.llm_model_used.clone(),
            outcome: run.outcome.label().to_string(),
            error: match &run.outcome {
                Outcome::ProviderFailed(reason) => Some(reason.clone()),
                _ => None,
            },
            latency_ms: run.latency_ms,
            num_variants: findings.variants.len(),
            num_phenotypes: findings.phenotypes.len(),
            num_drug_risks: findings.drug_risks.len(),
            num_drugs: findings.drugs.len(),
            confidence: run.analysis.llm_confidence.value(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Provider: {} ({}) | Outcome: {} | Latency: {:.1}s | Confidence: {:.2}",
            self.provider,
            self.model,
            self.outcome,
            self.latency_ms as f64 / 1000.0,
            self.confidence,
        )
    }
}

pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create logs directory")?;
        Ok(Self { dir })
    }

    pub fn write(&self, run_log: &RunLog) -> Result<()> {
        let path = self.dir.join("runs.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(run_log).context("Failed to serialize run log")?;
        writeln!(file, "{}", json).context("Failed to write log")?;

        Ok(())
    }
}
