//! Input capture: turn a user-supplied argument into an [`InputSource`].
//!
//! Text can be given literally, read from a file, or read from stdin (`-`).
//! PDFs and images can be local paths or HTTP(S) URLs; URLs are downloaded
//! into memory since both extractors work on byte buffers. Format checks
//! belong to the extractors, not to this stage.

use crate::error::InputError;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// The kind of material the user supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Text,
    Pdf,
    Image,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Text => f.write_str("text"),
            SourceKind::Pdf => f.write_str("PDF"),
            SourceKind::Image => f.write_str("image"),
        }
    }
}

/// Captured input for one request. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub enum InputSource {
    PlainText(String),
    PdfDocument(Vec<u8>),
    ImageDocument(Vec<u8>),
}

impl InputSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            InputSource::PlainText(_) => SourceKind::Text,
            InputSource::PdfDocument(_) => SourceKind::Pdf,
            InputSource::ImageDocument(_) => SourceKind::Image,
        }
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::PlainText(t) => write!(f, "PlainText({} chars)", t.chars().count()),
            InputSource::PdfDocument(b) => write!(f, "PdfDocument({} bytes)", b.len()),
            InputSource::ImageDocument(b) => write!(f, "ImageDocument({} bytes)", b.len()),
        }
    }
}

/// An unresolved source as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Literal text, or `-` for stdin.
    Text(String),
    /// Path to a UTF-8 text file.
    TextFile(String),
    /// Path or URL of a PDF.
    Pdf(String),
    /// Path or URL of a PNG/JPEG image.
    Image(String),
}

impl SourceSpec {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSpec::Text(_) | SourceSpec::TextFile(_) => SourceKind::Text,
            SourceSpec::Pdf(_) => SourceKind::Pdf,
            SourceSpec::Image(_) => SourceKind::Image,
        }
    }

    /// Read the source into memory.
    pub async fn load(&self, download_timeout_secs: u64) -> Result<InputSource, InputError> {
        match self {
            SourceSpec::Text(t) if t == "-" => read_stdin().await.map(InputSource::PlainText),
            SourceSpec::Text(t) => Ok(InputSource::PlainText(t.clone())),
            SourceSpec::TextFile(path) => {
                let bytes = read_local(path).await?;
                String::from_utf8(bytes)
                    .map(InputSource::PlainText)
                    .map_err(|_| InputError::NotUtf8 {
                        path: PathBuf::from(path),
                    })
            }
            SourceSpec::Pdf(arg) => read_bytes(arg, download_timeout_secs)
                .await
                .map(InputSource::PdfDocument),
            SourceSpec::Image(arg) => read_bytes(arg, download_timeout_secs)
                .await
                .map(InputSource::ImageDocument),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read a local file or download a URL.
pub async fn read_bytes(input: &str, timeout_secs: u64) -> Result<Vec<u8>, InputError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, InputError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(InputError::FileNotFound { path })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(InputError::PermissionDenied { path })
        }
        Err(source) => Err(InputError::ReadFailed { path, source }),
    }
}

async fn read_stdin() -> Result<String, InputError> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(InputError::Stdin)?;
    debug!("Read {} chars from stdin", text.chars().count());
    Ok(text)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, InputError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(InputError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
