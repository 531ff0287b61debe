//! Pipeline stages for text-to-flashcard generation.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the orchestrator in [`crate::generate`] only
//! sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompt) ──▶ llm ──▶ postprocess ──▶ parse ──▶ export
//! (bytes)   (lopdf/OCR)              (Gemini) (optional)     (strict)   (;-CSV)
//! ```
//!
//! 1. [`input`]:       read a path, URL or stdin into an [`input::InputSource`]
//! 2. [`extract`]:     turn the source into plain text; images go through
//!    [`encode`] before OCR
//! 3. [`llm`]:         the single generation call; the only stage with
//!    network I/O besides URL downloads
//! 4. [`postprocess`]: optional cleanup of fenced replies
//! 5. [`parse`]:       all-or-nothing `question;answer` parsing
//! 6. [`export`]:      encode and write the import file

pub mod encode;
pub mod export;
pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
pub mod postprocess;
