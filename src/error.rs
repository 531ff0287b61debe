//! Error types for the anki-flashgen library.
//!
//! Every pipeline stage returns its own error enum so a caller can tell
//! *where* a request failed:
//!
//! * [`InputError`]: the user-supplied file, URL or stdin could not be read.
//! * [`ExtractionError`]: the bytes were read but could not become text.
//! * [`GenerationError`]: the generation backend could not be reached or
//!   refused the request.
//! * [`ParseError`]: the backend replied, but not in `Pergunta;Resposta` form.
//!
//! [`FlashgenError`] wraps all of them and is what the top-level entry
//! points return. [`FlashgenError::EmptyInput`] is special: it is a
//! user-input warning rather than a system fault (see
//! [`FlashgenError::is_warning`]).

use crate::pipeline::input::SourceKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the top-level `generate*` functions.
#[derive(Debug, Error)]
pub enum FlashgenError {
    /// No API key resolved for the generation backend.
    #[error("API key not found for the generation backend.\n{hint}")]
    CredentialMissing { hint: String },

    /// The input file, URL or stdin could not be read.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The input was read but could not be converted to text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Extraction succeeded but produced no usable text.
    #[error("No text to turn into flashcards.\nProvide some text, a PDF or an image and try again.")]
    EmptyInput,

    /// The generation backend call failed.
    #[error(transparent)]
    Generation(GenerationError),

    /// The backend reply was not in the expected two-column format.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not write the export file.
    #[error("Failed to write export file '{path}': {source}")]
    ExportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlashgenError {
    /// `true` for conditions that ask the user for more input rather than
    /// reporting a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, FlashgenError::EmptyInput)
    }

    /// Coarse category used by [`crate::progress::PipelineState::Failed`].
    pub fn kind(&self) -> FailureKind {
        match self {
            FlashgenError::CredentialMissing { .. } => FailureKind::CredentialMissing,
            FlashgenError::Input(_) => FailureKind::Input,
            FlashgenError::Extraction(_) => FailureKind::Extraction,
            FlashgenError::EmptyInput => FailureKind::EmptyInput,
            FlashgenError::Generation(_) => FailureKind::Generation,
            FlashgenError::Parse(_) => FailureKind::Parse,
            FlashgenError::InvalidConfig(_) => FailureKind::Config,
            FlashgenError::ExportWriteFailed { .. } => FailureKind::Export,
            FlashgenError::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<GenerationError> for FlashgenError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::MissingCredential { hint } => FlashgenError::CredentialMissing { hint },
            other => FlashgenError::Generation(other),
        }
    }
}

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CredentialMissing,
    Input,
    Extraction,
    EmptyInput,
    Generation,
    Parse,
    Config,
    Export,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::CredentialMissing => "credential missing",
            FailureKind::Input => "input",
            FailureKind::Extraction => "extraction",
            FailureKind::EmptyInput => "empty input",
            FailureKind::Generation => "generation",
            FailureKind::Parse => "parse",
            FailureKind::Config => "configuration",
            FailureKind::Export => "export",
            FailureKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Reading a user-supplied input failed before extraction could start.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading a local file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A text file did not contain valid UTF-8.
    #[error("'{path}' is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },

    /// Reading text from stdin failed.
    #[error("Failed to read text from stdin: {0}")]
    Stdin(#[source] std::io::Error),

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },
}

/// An input source could not be converted to text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The PDF bytes could not be parsed.
    #[error("Could not read the PDF: {detail}")]
    MalformedDocument { detail: String },

    /// The image could not be decoded or the OCR engine could not process it.
    #[error("OCR could not read the image: {detail}")]
    OcrUnavailable { detail: String },
}

impl ExtractionError {
    /// The kind of input the failure originated from.
    pub fn source_kind(&self) -> SourceKind {
        match self {
            ExtractionError::MalformedDocument { .. } => SourceKind::Pdf,
            ExtractionError::OcrUnavailable { .. } => SourceKind::Image,
        }
    }
}

/// The generation backend could not produce a reply.
///
/// No distinction is made between retryable and fatal backend errors: the
/// pipeline makes exactly one attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// No credential configured; detected before any network call.
    #[error("No credential configured for the generation backend.\n{hint}")]
    MissingCredential { hint: String },

    /// The remote call failed for any reason.
    #[error("Generation backend failed: {message}")]
    BackendFailure { message: String },
}

/// The backend reply did not match the two-column `Pergunta;Resposta` format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A non-blank line did not hold exactly two non-empty fields.
    #[error("Reply line {line} is not a 'question;answer' pair ({detail}): {content:?}")]
    SchemaViolation {
        line: usize,
        detail: String,
        content: String,
    },

    /// The reply held no non-blank lines at all.
    #[error("The generation backend returned an empty reply")]
    EmptyReply,
}
