use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use pgx_narrative::instrumentation::{RunLog, RunLogger};
use pgx_narrative::narrative::build_prompt;
use pgx_narrative::{CompletionProvider, Config, Findings, NarrativeRun, Narrator};

#[derive(Parser)]
#[command(
    name = "pgx-narrative",
    about = "Clinician-facing pharmacogenomic narratives from called variants, phenotypes and drug risks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Append one run-log record per narrative to <DIR>/runs.jsonl
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the narrative for one findings document
    Narrate {
        /// Path to a JSON file with variants, phenotypes, drug_risks and drugs
        path: PathBuf,
    },
    /// Print the prompt that would be sent, without calling the provider
    Prompt {
        /// Path to a JSON findings file
        path: PathBuf,
    },
    /// Generate narratives for a JSONL file of findings, concurrently
    Batch {
        /// Path to JSONL file, one findings document per line
        path: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_findings(path: &Path) -> Result<Findings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read findings file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse findings file: {}", path.display()))
}

fn record(
    logger: Option<&RunLogger>,
    provider: &str,
    findings: &Findings,
    run: &NarrativeRun,
) -> Result<()> {
    let run_log = RunLog::new(provider, findings, run);
    eprintln!("{}", run_log.summary());
    if let Some(logger) = logger {
        logger.write(&run_log)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Commands::Prompt { path } = &cli.command {
        let findings = read_findings(path)?;
        println!("{}", build_prompt(&findings));
        return Ok(());
    }

    let config = Config::from_env()?;
    let narrator = Arc::new(Narrator::from_config(&config).context("Failed to set up LLM provider")?);
    let provider = narrator.provider().name();
    let logger = cli.log_dir.as_deref().map(RunLogger::new).transpose()?;

    match cli.command {
        Commands::Prompt { .. } => {}
        Commands::Narrate { path } => {
            let findings = read_findings(&path)?;
            let run = narrator.run(&findings).await;
            println!("{}", serde_json::to_string_pretty(&run.analysis)?);
            record(logger.as_ref(), provider, &findings, &run)?;
        }
        Commands::Batch { path } => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("Failed to open batch file: {}", path.display()))?;
            let reader = std::io::BufReader::new(file);

            let mut batch: Vec<Findings> = Vec::new();
            for (i, line) in reader.lines().enumerate() {
                let line = line.context("Failed to read line")?;
                if line.trim().is_empty() {
                    continue;
                }
                let findings: Findings = serde_json::from_str(&line)
                    .with_context(|| format!("Failed to parse line {}", i + 1))?;
                batch.push(findings);
            }

            let mut tasks = JoinSet::new();
            for (index, findings) in batch.iter().cloned().enumerate() {
                let narrator = Arc::clone(&narrator);
                tasks.spawn(async move { (index, narrator.run(&findings).await) });
            }

            let mut runs: Vec<Option<NarrativeRun>> = vec![None; batch.len()];
            while let Some(joined) = tasks.join_next().await {
                let (index, run) = joined.context("Narrative task panicked")?;
                runs[index] = Some(run);
            }

            let runs: Vec<NarrativeRun> = runs.into_iter().flatten().collect();
            for (findings, run) in batch.iter().zip(&runs) {
                println!("{}", serde_json::to_string(&run.analysis)?);
                record(logger.as_ref(), provider, findings, run)?;
            }

            if !runs.is_empty() {
                let fallbacks = runs.iter().filter(|r| r.outcome.is_fallback()).count();
                let avg_latency =
                    runs.iter().map(|r| r.latency_ms).sum::<u64>() as f64 / runs.len() as f64;

                eprintln!("\n=== Batch Summary ===");
                eprintln!("Findings: {}", runs.len());
                eprintln!("Generated: {} | Fallback: {}", runs.len() - fallbacks, fallbacks);
                eprintln!("Avg latency: {:.1}s", avg_latency / 1000.0);
            }
        }
    }

    Ok(())
}
