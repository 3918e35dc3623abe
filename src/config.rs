use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

/// Which backend serves narrative requests for this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (OpenAI, Groq, Ollama, ...)
    OpenAi,
    /// Google generative-content API
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            other => anyhow::bail!("Unsupported LLM provider: {}", other),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

/// Connection settings for one backend.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        // An empty key is the same as no key; there is no built-in credential.
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            provider: var("LLM_PROVIDER", "openai").parse()?,
            openai: ProviderSettings {
                api_key: secret("OPENAI_API_KEY"),
                base_url: var("OPENAI_BASE_URL", "https://api.groq.com/openai/v1"),
                model: var("OPENAI_MODEL", "llama3-8b-8192"),
            },
            gemini: ProviderSettings {
                api_key: secret("GEMINI_API_KEY"),
                base_url: var(
                    "GEMINI_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                model: var("GEMINI_MODEL", "gemini-1.5-flash"),
            },
            temperature: var("LLM_TEMPERATURE", "0.2")
                .parse()
                .context("LLM_TEMPERATURE must be a number")?,
            max_tokens: var("LLM_MAX_TOKENS", "2048")
                .parse()
                .context("LLM_MAX_TOKENS must be a number")?,
            timeout_secs: var("LLM_TIMEOUT_SECS", "30")
                .parse()
                .context("LLM_TIMEOUT_SECS must be a number")?,
        })
    }

    /// Settings of the provider selected by `LLM_PROVIDER`.
    pub fn active(&self) -> &ProviderSettings {
        match self.provider {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_select_openai_without_credentials() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.active().model, "llama3-8b-8192");
        assert_eq!(config.active().base_url, "https://api.groq.com/openai/v1");
        assert!(config.openai.api_key.is_none());
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.timeout_secs, 30);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn gemini_selection_uses_gemini_settings() {
        let config = config_from(&[
            ("LLM_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
        ])
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.active().api_key.as_deref(), Some("g-key"));
        assert_eq!(config.active().model, "gemini-2.0-flash");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(config.active().api_key.is_none());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = config_from(&[("LLM_PROVIDER", "cohere")]).unwrap_err();
        assert!(err.to_string().contains("cohere"));
    }

    #[test]
    fn bad_number_is_rejected() {
        assert!(config_from(&[("LLM_MAX_TOKENS", "lots")]).is_err());
    }
}
