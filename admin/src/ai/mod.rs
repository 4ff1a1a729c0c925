//! Completion providers used for quiz generation
//!
//! Each provider turns a single text prompt into free-form text. Parsing the
//! text into a quiz is the caller's job.

mod deepseek;
mod gemini;

pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;

use crate::config::{AiConfig, ProviderKind};
use crate::error::{AdminError, AdminResult};

/// Text completion endpoint
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs and reports
    fn name(&self) -> &str;

    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> AdminResult<String>;
}

/// Build the configured provider
pub fn provider_from_config(
    kind: ProviderKind,
    config: &AiConfig,
    http: reqwest::Client,
) -> AdminResult<Box<dyn CompletionProvider>> {
    match kind {
        ProviderKind::Gemini => {
            let key = config.gemini.api_key.clone().ok_or_else(|| {
                AdminError::Config(
                    "GEMINI_API_KEY (or CKN__AI__GEMINI__API_KEY) is not set".to_string(),
                )
            })?;
            Ok(Box::new(GeminiProvider::new(http, &config.gemini, key)))
        }
        ProviderKind::Deepseek => {
            let key = config.deepseek.api_key.clone().ok_or_else(|| {
                AdminError::Config(
                    "DEEPSEEK_API_KEY (or CKN__AI__DEEPSEEK__API_KEY) is not set".to_string(),
                )
            })?;
            Ok(Box::new(DeepSeekProvider::new(http, &config.deepseek, key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use secrecy::SecretString;

    #[test]
    fn test_missing_key_is_config_error() {
        let config = AppConfig::defaults().unwrap();
        let result = provider_from_config(ProviderKind::Deepseek, &config.ai, reqwest::Client::new());
        assert!(matches!(result, Err(AdminError::Config(_))));
    }

    #[test]
    fn test_builds_named_provider() {
        let mut config = AppConfig::defaults().unwrap();
        config.ai.gemini.api_key = Some(SecretString::new("g-key".to_string()));
        let provider =
            provider_from_config(ProviderKind::Gemini, &config.ai, reqwest::Client::new()).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
