//! Request orchestration: capture → extract → prompt → generate → parse.
//!
//! [`Pipeline::run`] sequences the stages in [`crate::pipeline`] for one
//! [`Request`] and reports every state change to the configured
//! [`crate::progress::PipelineObserver`]. Nothing is carried over between
//! runs; each call starts again from [`PipelineState::Idle`].
//!
//! Checks happen before any expensive work:
//!
//! 1. the generation credential is verified before extraction starts;
//! 2. blank extracted text stops the run before a prompt is built.

use crate::config::FlashgenConfig;
use crate::error::FlashgenError;
use crate::output::FlashcardSet;
use crate::pipeline::export::write_export;
use crate::pipeline::extract::{DocumentExtractor, TextExtractor};
use crate::pipeline::input::InputSource;
use crate::pipeline::llm::{ProviderGenerator, TextGenerator};
use crate::pipeline::{parse, postprocess};
use crate::progress::{Observer, PipelineState};
use crate::prompts::build_prompt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The input for one generation run.
///
/// Holds at most one source. Capturing a new source replaces the previous
/// one, so the most recently supplied input always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    source: Option<InputSource>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: InputSource) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Replace the current source, returning the one it displaced.
    pub fn capture(&mut self, source: InputSource) -> Option<InputSource> {
        let previous = self.source.replace(source);
        if let Some(ref prev) = previous {
            debug!("Replacing captured {} input", prev.kind());
        }
        previous
    }

    pub fn source(&self) -> Option<&InputSource> {
        self.source.as_ref()
    }
}

/// Walks the state machine and tells the observer about each step.
struct StateTracker<'a> {
    state: PipelineState,
    observer: Option<&'a Observer>,
}

impl<'a> StateTracker<'a> {
    fn new(observer: Option<&'a Observer>) -> Self {
        Self {
            state: PipelineState::Idle,
            observer,
        }
    }

    fn advance(&mut self, to: PipelineState) {
        debug!("State: {:?} → {:?}", self.state, to);
        if let Some(observer) = self.observer {
            observer.on_transition(&self.state, &to);
        }
        self.state = to;
    }
}

/// One extractor and one generator, sequenced per request.
#[derive(Debug)]
pub struct Pipeline<E, G> {
    extractor: E,
    generator: G,
    config: Arc<FlashgenConfig>,
}

impl Pipeline<DocumentExtractor, ProviderGenerator> {
    /// The production pipeline: `lopdf`/tesseract extraction and the
    /// backend selected by `config`.
    pub fn from_config(config: FlashgenConfig) -> Result<Self, FlashgenError> {
        let extractor = DocumentExtractor::from_config(&config);
        let generator = ProviderGenerator::from_config(&config);
        Ok(Self::new(extractor, generator, config))
    }
}

impl<E: TextExtractor, G: TextGenerator> Pipeline<E, G> {
    pub fn new(extractor: E, generator: G, config: FlashgenConfig) -> Self {
        Self {
            extractor,
            generator,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &FlashgenConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Fail fast when the generator has no usable credential.
    ///
    /// Front-ends call this before loading input so a user is not made to
    /// wait for a download or OCR only to be told the key is missing.
    pub fn ensure_credential(&self) -> Result<(), FlashgenError> {
        self.generator.check_credential().map_err(FlashgenError::from)
    }

    /// Turn `request` into flashcards.
    ///
    /// Ends in exactly one terminal state: `Ready` on success, `NeedsInput`
    /// for [`FlashgenError::EmptyInput`], `Failed` otherwise.
    pub async fn run(&self, request: &Request) -> Result<FlashcardSet, FlashgenError> {
        let mut tracker = StateTracker::new(self.config.observer.as_ref());
        let start = Instant::now();

        let result = self.run_stages(request, &mut tracker).await;
        match result {
            Ok(ref set) => {
                info!(
                    "Generated {} flashcards in {:?}",
                    set.len(),
                    start.elapsed()
                );
                tracker.advance(PipelineState::Ready { cards: set.len() });
            }
            Err(FlashgenError::EmptyInput) => {
                warn!("No text to generate flashcards from");
                tracker.advance(PipelineState::NeedsInput);
            }
            Err(ref e) => tracker.advance(PipelineState::Failed(e.kind())),
        }
        result
    }

    async fn run_stages(
        &self,
        request: &Request,
        tracker: &mut StateTracker<'_>,
    ) -> Result<FlashcardSet, FlashgenError> {
        self.ensure_credential()?;

        let source = request.source().ok_or(FlashgenError::EmptyInput)?;
        tracker.advance(PipelineState::InputCaptured(source.kind()));

        // ── Extract ──────────────────────────────────────────────────────
        tracker.advance(PipelineState::Extracting);
        let text = self.extractor.extract(source).await?;
        info!(
            "Extracted {} characters from {} input",
            text.char_count(),
            source.kind()
        );
        tracker.advance(PipelineState::Extracted {
            chars: text.char_count(),
        });
        if text.is_blank() {
            return Err(FlashgenError::EmptyInput);
        }

        // ── Prompt ───────────────────────────────────────────────────────
        tracker.advance(PipelineState::Prompting);
        let prompt = build_prompt(self.config.template(), text.as_str());

        // ── Generate ─────────────────────────────────────────────────────
        tracker.advance(PipelineState::Generating);
        info!("Requesting flashcards from {}", self.generator.model());
        let reply = self.generator.generate(&prompt).await?;

        // ── Parse ────────────────────────────────────────────────────────
        tracker.advance(PipelineState::Parsing);
        let cleaned;
        let body = if self.config.strip_fences {
            cleaned = postprocess::clean_reply(reply.as_str());
            cleaned.as_str()
        } else {
            reply.as_str()
        };

        parse::parse_reply(body).map_err(|e| {
            debug!("Unparseable reply:\n{}", reply);
            FlashgenError::Parse(e)
        })
    }
}

/// Run a request with the production pipeline built from `config`.
pub async fn generate_flashcards(
    request: &Request,
    config: FlashgenConfig,
) -> Result<FlashcardSet, FlashgenError> {
    Pipeline::from_config(config)?.run(request).await
}

/// Run a request and write the result to `output_path`.
///
/// Nothing is written when generation fails.
pub async fn generate_to_file(
    request: &Request,
    output_path: impl AsRef<Path>,
    config: FlashgenConfig,
) -> Result<FlashcardSet, FlashgenError> {
    let set = generate_flashcards(request, config).await?;
    write_export(output_path, &set).await?;
    Ok(set)
}
