//! Configuration types for flashcard generation.
//!
//! All request behaviour is controlled through [`FlashgenConfig`], built via
//! its [`FlashgenConfigBuilder`]. The configuration (including the resolved
//! API key) is created once at startup and shared read-only by every
//! request; nothing in the pipeline mutates it.

use crate::credentials;
use crate::error::FlashgenError;
use crate::progress::Observer;
use crate::prompts::TEXT_PLACEHOLDER;
use std::fmt;
use std::path::Path;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Default tesseract language pack.
pub const DEFAULT_OCR_LANGUAGE: &str = "por";

/// Default OCR executable.
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

/// An API key for the generation backend.
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Returns `None` for empty or whitespace-only values.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for flashcard generation.
///
/// Built via [`FlashgenConfig::builder()`], [`FlashgenConfig::from_env()`]
/// or [`FlashgenConfig::default()`] (which has no API key).
///
/// # Example
/// ```rust
/// use anki_flashgen::{ApiKey, FlashgenConfig};
///
/// let config = FlashgenConfig::builder()
///     .model("gemini-2.5-flash")
///     .api_key(ApiKey::new("my-key").unwrap())
///     .api_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct FlashgenConfig {
    /// Generation model identifier. Default: `gemini-2.5-pro`.
    pub model: String,

    /// Route generation through this `edgequake-llm` provider
    /// (`openai`, `anthropic`, `ollama`, …) instead of Gemini.
    /// `None` or `"gemini"` selects Gemini.
    pub provider_name: Option<String>,

    /// Credential for the Gemini provider.
    pub api_key: Option<ApiKey>,

    /// Sampling temperature. `None` leaves the backend default.
    pub temperature: Option<f32>,

    /// Timeout for the single generation call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Timeout for downloading URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Tesseract language pack used for images. Default: `por`.
    pub ocr_language: String,

    /// Tesseract executable name or path. Default: `tesseract`.
    pub tesseract_cmd: String,

    /// Custom prompt template; must contain `{text}`. `None` uses
    /// [`crate::prompts::DEFAULT_PROMPT_TEMPLATE`].
    pub prompt_template: Option<String>,

    /// Strip an outer code fence and invisible characters from the reply
    /// before parsing. Default: false.
    pub strip_fences: bool,

    /// Receives pipeline state transitions.
    pub observer: Option<Observer>,
}

impl Default for FlashgenConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            api_key: None,
            temperature: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            tesseract_cmd: DEFAULT_TESSERACT_CMD.to_string(),
            prompt_template: None,
            strip_fences: false,
            observer: None,
        }
    }
}

impl fmt::Debug for FlashgenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashgenConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("api_key", &self.api_key)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("prompt_template", &self.prompt_template.as_ref().map(|t| t.len()))
            .field("strip_fences", &self.strip_fences)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl FlashgenConfig {
    /// Create a new builder for `FlashgenConfig`.
    pub fn builder() -> FlashgenConfigBuilder {
        FlashgenConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the credential resolved from the default
    /// secret store and the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing credential is not an error here; it surfaces when a request
    /// runs.
    pub fn from_env() -> Result<Self, FlashgenError> {
        let resolved = credentials::resolve_api_key(Path::new(credentials::DEFAULT_SECRETS_PATH));
        let mut builder = Self::builder();
        if let Some(cred) = resolved {
            builder = builder.api_key(cred.key);
        }
        builder.build()
    }

    /// `true` when the Gemini provider handles generation.
    pub fn uses_gemini(&self) -> bool {
        match self.provider_name.as_deref() {
            None => true,
            Some(name) => name.eq_ignore_ascii_case("gemini"),
        }
    }

    /// The active prompt template.
    pub fn template(&self) -> &str {
        self.prompt_template
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_PROMPT_TEMPLATE)
    }
}

/// Builder for [`FlashgenConfig`].
#[derive(Debug)]
pub struct FlashgenConfigBuilder {
    config: FlashgenConfig,
}

impl FlashgenConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.config.api_key = Some(key);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn strip_fences(mut self, v: bool) -> Self {
        self.config.strip_fences = v;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FlashgenConfig, FlashgenError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(FlashgenError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(FlashgenError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(FlashgenError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(FlashgenError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains(TEXT_PLACEHOLDER) {
                return Err(FlashgenError::InvalidConfig(format!(
                    "Prompt template must contain the {TEXT_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(self.config)
    }
}
