//! # anki-flashgen
//!
//! Turn study material (typed notes, PDF documents or scanned pages) into
//! question/answer flashcards ready for import into Anki.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input
//!  │
//!  ├─ 1. Capture   text, PDF bytes or image bytes (last source wins)
//!  ├─ 2. Extract   PDF text layer via lopdf, images via tesseract (por)
//!  ├─ 3. Prompt    substitute the text into the flashcard template
//!  ├─ 4. Generate  one call to gemini-2.5-pro (or any edgequake-llm provider)
//!  ├─ 5. Parse     `Pergunta;Resposta` lines, all-or-nothing
//!  └─ 6. Export    `;`-delimited UTF-8, no header → flashcards_para_anki.csv
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anki_flashgen::{generate_flashcards, FlashgenConfig, InputSource, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential resolved from .flashgen/secrets.toml or GEMINI_API_KEY
//!     let config = FlashgenConfig::from_env()?;
//!     let request = Request::from_source(InputSource::PlainText(
//!         "A capital do Brasil é Brasília.".into(),
//!     ));
//!     let cards = generate_flashcards(&request, config).await?;
//!     for card in cards.iter() {
//!         println!("{} → {}", card.question(), card.answer());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashgen` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod credentials;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiKey, FlashgenConfig, FlashgenConfigBuilder};
pub use error::{
    ExtractionError, FailureKind, FlashgenError, GenerationError, InputError, ParseError,
};
pub use generate::{generate_flashcards, generate_to_file, Pipeline, Request};
pub use output::{FlashcardRecord, FlashcardSet, RecordError};
pub use pipeline::export::{encode_export, write_export, EXPORT_FILE_NAME};
pub use pipeline::extract::{DocumentExtractor, ExtractedText, TextExtractor};
pub use pipeline::input::{InputSource, SourceKind, SourceSpec};
pub use pipeline::llm::{GenerationReply, ProviderGenerator, TextGenerator};
pub use pipeline::parse::parse_reply;
pub use progress::{NoopObserver, Observer, PipelineObserver, PipelineState};
pub use prompts::{build_prompt, Prompt};
