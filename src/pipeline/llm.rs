//! Generation backends: send one prompt, get one raw text reply.
//!
//! [`ProviderGenerator`] implements [`TextGenerator`] on top of an
//! `edgequake-llm` provider. The default is Gemini, built from the API key in
//! [`crate::config::FlashgenConfig::api_key`]. Any other provider name
//! (`openai`, `anthropic`, `ollama`, …) goes through `ProviderFactory`, and
//! those providers read their own keys from the environment.
//!
//! Each request makes exactly one attempt. Every failure, whether network,
//! timeout or provider error, becomes [`GenerationError::BackendFailure`].

use crate::config::FlashgenConfig;
use crate::credentials;
use crate::error::GenerationError;
use crate::prompts::Prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, GeminiProvider, LLMProvider, ProviderFactory};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Raw, unvalidated reply text from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply(String);

impl GenerationReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GenerationReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A text-in/text-out generation service.
pub trait TextGenerator: Send + Sync {
    /// Fail with [`GenerationError::MissingCredential`] if the backend
    /// cannot possibly authenticate. Must not touch the network.
    fn check_credential(&self) -> Result<(), GenerationError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Send `prompt` and return the reply text.
    fn generate(
        &self,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<GenerationReply, GenerationError>> + Send;
}

/// Generation through an `edgequake-llm` provider.
pub struct ProviderGenerator {
    name: String,
    model: String,
    provider: Result<Arc<dyn LLMProvider>, String>,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl fmt::Debug for ProviderGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderGenerator")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("configured", &self.provider.is_ok())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderGenerator {
    /// Gemini unless `config.provider_name` names another provider.
    ///
    /// A construction failure (typically a missing API key) is kept and
    /// reported by [`TextGenerator::check_credential`] when a request runs.
    pub fn from_config(config: &FlashgenConfig) -> Self {
        if config.uses_gemini() {
            info!("Using Gemini model {}", config.model);
            Self::gemini(config)
        } else {
            let name = config.provider_name.as_deref().unwrap_or_default();
            info!("Using provider {} with model {}", name, config.model);
            Self::named(name, config)
        }
    }

    /// Gemini with the key resolved from the secret store or environment.
    pub fn gemini(config: &FlashgenConfig) -> Self {
        let provider = match config.api_key {
            Some(ref key) => {
                let gemini = GeminiProvider::new(key.expose()).with_model(config.model.as_str());
                Ok(Arc::new(gemini) as Arc<dyn LLMProvider>)
            }
            None => Err(credentials::missing_key_hint()),
        };
        Self::build("gemini", provider, config)
    }

    /// Build the named provider through `ProviderFactory` with `config.model`.
    pub fn named(provider_name: &str, config: &FlashgenConfig) -> Self {
        let provider = ProviderFactory::create_llm_provider(provider_name, &config.model)
            .map_err(|e| format!("Provider '{}' could not be configured: {}", provider_name, e));
        if let Err(ref e) = provider {
            warn!("{}", e);
        }
        Self::build(provider_name, provider, config)
    }

    /// Wrap an already constructed provider.
    pub fn from_provider(provider: Arc<dyn LLMProvider>, config: &FlashgenConfig) -> Self {
        let name = provider.name().to_string();
        Self::build(&name, Ok(provider), config)
    }

    fn build(
        name: &str,
        provider: Result<Arc<dyn LLMProvider>, String>,
        config: &FlashgenConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            model: config.model.clone(),
            provider,
            temperature: config.temperature,
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Provider name, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> Result<Arc<dyn LLMProvider>, GenerationError> {
        match self.provider {
            Ok(ref p) => Ok(Arc::clone(p)),
            Err(ref hint) => Err(GenerationError::MissingCredential { hint: hint.clone() }),
        }
    }
}

impl TextGenerator for ProviderGenerator {
    fn check_credential(&self) -> Result<(), GenerationError> {
        self.provider().map(|_| ())
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<GenerationReply, GenerationError> {
        let provider = self.provider()?;

        let messages = vec![ChatMessage::user_with_images(prompt.as_str(), Vec::new())];
        let options = CompletionOptions {
            temperature: self.temperature,
            ..Default::default()
        };

        let start = Instant::now();
        let call = provider.chat(&messages, Some(&options));
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), call).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens in {:?}",
                    self.name,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                if response.content.trim().is_empty() {
                    return Err(GenerationError::BackendFailure {
                        message: "empty reply".to_string(),
                    });
                }
                Ok(GenerationReply::new(response.content))
            }
            Ok(Err(e)) => Err(GenerationError::BackendFailure {
                message: format!("{e}"),
            }),
            Err(_) => Err(GenerationError::BackendFailure {
                message: format!("request timed out after {}s", self.timeout_secs),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::prompts::build_prompt;
    use edgequake_llm::MockProvider;

    #[test]
    fn default_backend_is_gemini() {
        let generator = ProviderGenerator::from_config(&FlashgenConfig::default());
        assert_eq!(generator.name(), "gemini");
        assert_eq!(generator.model(), "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn gemini_without_key_fails_before_network() {
        let generator = ProviderGenerator::gemini(&FlashgenConfig::default());
        assert!(matches!(
            generator.check_credential(),
            Err(GenerationError::MissingCredential { .. })
        ));
        let err = generator
            .generate(&build_prompt("{text}", "x"))
            .await
            .unwrap_err();
        match err {
            GenerationError::MissingCredential { hint } => {
                assert!(hint.contains("GEMINI_API_KEY"), "got: {hint}");
            }
            other => panic!("expected missing credential, got {other:?}"),
        }
    }

    #[test]
    fn gemini_with_key_is_ready() {
        let config = FlashgenConfig::builder()
            .api_key(ApiKey::new("test-key-123").unwrap())
            .model("gemini-2.5-flash")
            .build()
            .unwrap();
        let generator = ProviderGenerator::from_config(&config);
        assert!(generator.check_credential().is_ok());
        assert_eq!(generator.model(), "gemini-2.5-flash");
    }

    #[test]
    fn debug_does_not_leak_key() {
        let config = FlashgenConfig::builder()
            .api_key(ApiKey::new("super-secret-key").unwrap())
            .build()
            .unwrap();
        let shown = format!("{:?}", ProviderGenerator::from_config(&config));
        assert!(!shown.contains("super-secret-key"), "got: {shown}");
    }

    #[tokio::test]
    async fn provider_reply_is_returned_verbatim() {
        let mock = MockProvider::new();
        mock.add_response("Qual é a capital do Brasil?;Brasília").await;
        let generator =
            ProviderGenerator::from_provider(Arc::new(mock), &FlashgenConfig::default());

        assert!(generator.check_credential().is_ok());
        let reply = generator
            .generate(&build_prompt("{text}", "A capital do Brasil é Brasília."))
            .await
            .unwrap();
        assert_eq!(reply.as_str(), "Qual é a capital do Brasil?;Brasília");
    }

    #[tokio::test]
    async fn blank_provider_reply_is_backend_failure() {
        let mock = MockProvider::new();
        mock.add_response("  \n").await;
        let generator =
            ProviderGenerator::from_provider(Arc::new(mock), &FlashgenConfig::default());

        let err = generator
            .generate(&build_prompt("{text}", "texto"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::BackendFailure { .. }));
    }
}
