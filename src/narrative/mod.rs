pub mod fallback;
pub mod parser;
pub mod prompt;

use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::config::Config;
use crate::llm::{CompletionProvider, Provider, ProviderError};
use crate::models::{Findings, NarrativeResult};

pub use fallback::fallback_analysis;
pub use parser::parse_response;
pub use prompt::build_prompt;

/// How a narrative was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Generated,
    NoCredential,
    ProviderFailed(String),
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Outcome::Generated)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Generated => "generated",
            Outcome::NoCredential => "no_credential",
            Outcome::ProviderFailed(_) => "provider_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NarrativeRun {
    pub analysis: NarrativeResult,
    pub outcome: Outcome,
    pub latency_ms: u64,
}

/// Entry point for narrative generation. Every call yields exactly one
/// `NarrativeResult`; provider problems end in the fallback narrative.
pub struct Narrator<P = Provider> {
    provider: P,
    timeout: Duration,
}

impl Narrator<Provider> {
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let provider = Provider::from_config(config)?;
        info!(
            provider = provider.name(),
            model = provider.model(),
            "LLM provider configured"
        );
        Ok(Self::new(provider, Duration::from_secs(config.timeout_secs)))
    }
}

impl<P: CompletionProvider> Narrator<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn narrate(&self, findings: &Findings) -> NarrativeResult {
        self.run(findings).await.analysis
    }

    pub async fn run(&self, findings: &Findings) -> NarrativeRun {
        let start = Instant::now();
        let model = self.provider.model();

        let (analysis, outcome) = if !self.provider.has_credential() {
            let reason = ProviderError::NoCredential {
                provider: self.provider.name(),
            };
            info!(provider = self.provider.name(), "{}; skipping LLM analysis", reason);
            (
                fallback_analysis(model, Some(&reason.to_string())),
                Outcome::NoCredential,
            )
        } else {
            let prompt = build_prompt(findings);
            match self.send(&prompt).await {
                Ok(raw) => (parse_response(&raw, model), Outcome::Generated),
                Err(e) => {
                    error!(
                        provider = self.provider.name(),
                        model = model,
                        error = %e,
                        "LLM call failed; using fallback"
                    );
                    let reason = e.to_string();
                    (
                        fallback_analysis(model, Some(&reason)),
                        Outcome::ProviderFailed(reason),
                    )
                }
            }
        };

        NarrativeRun {
            analysis,
            outcome,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn send(&self, prompt: &str) -> Result<String, ProviderError> {
        tokio::time::timeout(self.timeout, self.provider.send(prompt))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Confidence;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Text(&'static str),
        TransportError,
        Hang,
    }

    struct MockProvider {
        credential: bool,
        reply: Reply,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(credential: bool, reply: Reply) -> Self {
            Self {
                credential,
                reply,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn builder_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
    }

    #[async_trait]
    impl CompletionProvider for MockProvider {
        async fn send(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::TransportError => Err(ProviderError::Transport(builder_error())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("{}".to_string())
                }
            }
        }

        fn has_credential(&self) -> bool {
            self.credential
        }

        fn name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn narrator(provider: MockProvider) -> Narrator<MockProvider> {
        Narrator::new(provider, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn missing_credential_skips_the_provider() {
        let narrator = narrator(MockProvider::new(false, Reply::Text("{}")));
        let run = narrator.run(&Findings::default()).await;

        assert_eq!(narrator.provider().calls(), 0);
        assert_eq!(run.outcome, Outcome::NoCredential);
        assert_eq!(
            run.analysis,
            fallback_analysis("mock-model", Some("no API key configured for mock"))
        );
    }

    #[tokio::test]
    async fn successful_reply_is_parsed() {
        let narrator = narrator(MockProvider::new(
            true,
            Reply::Text(
                "```json\n{\"clinical_summary\": \"Poor metabolizer.\", \"llm_confidence\": 0.9}\n```",
            ),
        ));
        let run = narrator.run(&Findings::default()).await;

        assert_eq!(narrator.provider().calls(), 1);
        assert_eq!(run.outcome, Outcome::Generated);
        assert_eq!(run.analysis.clinical_summary, "Poor metabolizer.");
        assert_eq!(run.analysis.llm_confidence.value(), 0.9);
        assert_eq!(run.analysis.llm_model_used, "mock-model");
    }

    #[tokio::test]
    async fn garbage_reply_still_yields_a_result() {
        let narrator = narrator(MockProvider::new(true, Reply::Text("not json at all")));
        let result = narrator.narrate(&Findings::default()).await;
        assert_eq!(result.clinical_summary, parser::SUMMARY_UNAVAILABLE);
        assert_eq!(result.llm_confidence, Confidence::ZERO);
    }

    #[tokio::test]
    async fn transport_error_falls_back_with_cause() {
        let narrator = narrator(MockProvider::new(true, Reply::TransportError));
        let run = narrator.run(&Findings::default()).await;

        assert_eq!(narrator.provider().calls(), 1);
        assert!(run.outcome.is_fallback());
        let expected = ProviderError::Transport(builder_error()).to_string();
        assert!(run.analysis.clinical_summary.contains(&expected));
        assert!(run
            .analysis
            .clinical_summary
            .starts_with("LLM analysis is currently unavailable."));
        assert_eq!(run.analysis.llm_confidence, Confidence::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_times_out_into_fallback() {
        let narrator = narrator(MockProvider::new(true, Reply::Hang));
        let run = narrator.run(&Findings::default()).await;

        assert_eq!(
            run.outcome,
            Outcome::ProviderFailed("LLM API request timed out after 30s".to_string())
        );
        assert!(run.analysis.clinical_summary.contains("timed out after 30s"));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Generated.label(), "generated");
        assert!(!Outcome::Generated.is_fallback());
        assert!(Outcome::NoCredential.is_fallback());
    }
}
