//! Text extraction: normalise any [`InputSource`] into one plain-text string.
//!
//! * Plain text passes through untouched (blank text is rejected later by
//!   the orchestrator, not here).
//! * PDFs are parsed with `lopdf`; each page's text layer is extracted in
//!   page order and the pages are concatenated with **no** separator.
//! * Images are decoded, re-encoded as PNG and piped through
//!   `tesseract stdin stdout -l <lang>`.
//!
//! PDF parsing is CPU-bound, so it runs inside `spawn_blocking`. OCR runs as
//! an async child process.

use crate::config::FlashgenConfig;
use crate::error::ExtractionError;
use crate::pipeline::encode;
use crate::pipeline::input::InputSource;
use lopdf::Document;
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Text produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// `true` when there is nothing worth prompting with.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Converts an input source into text.
pub trait TextExtractor: Send + Sync {
    fn extract(
        &self,
        source: &InputSource,
    ) -> impl Future<Output = Result<ExtractedText, ExtractionError>> + Send;
}

/// Production extractor: `lopdf` for PDFs, tesseract for images.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    ocr_language: String,
    tesseract_cmd: String,
}

impl DocumentExtractor {
    pub fn new(ocr_language: impl Into<String>, tesseract_cmd: impl Into<String>) -> Self {
        Self {
            ocr_language: ocr_language.into(),
            tesseract_cmd: tesseract_cmd.into(),
        }
    }

    pub fn from_config(config: &FlashgenConfig) -> Self {
        Self::new(&config.ocr_language, &config.tesseract_cmd)
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let bytes = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| ExtractionError::MalformedDocument {
                detail: format!("PDF task panicked: {e}"),
            })??;
        Ok(ExtractedText::new(text))
    }

    async fn extract_image(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let bytes = bytes.to_vec();
        let png = tokio::task::spawn_blocking(move || encode::normalise_image(&bytes))
            .await
            .map_err(|e| ExtractionError::OcrUnavailable {
                detail: format!("image task panicked: {e}"),
            })?
            .map_err(|e| ExtractionError::OcrUnavailable {
                detail: format!("image could not be decoded: {e}"),
            })?;

        let text = run_tesseract(&self.tesseract_cmd, &self.ocr_language, png).await?;
        info!("OCR recognised {} chars", text.chars().count());
        Ok(ExtractedText::new(text))
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::from_config(&FlashgenConfig::default())
    }
}

impl TextExtractor for DocumentExtractor {
    async fn extract(&self, source: &InputSource) -> Result<ExtractedText, ExtractionError> {
        match source {
            InputSource::PlainText(text) => Ok(ExtractedText::new(text.clone())),
            InputSource::PdfDocument(bytes) => self.extract_pdf(bytes).await,
            InputSource::ImageDocument(bytes) => self.extract_image(bytes).await,
        }
    }
}

/// Extract the text layer of every page, in page order, with no separator
/// between pages.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if !has_pdf_header(bytes) {
        let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(ExtractionError::MalformedDocument {
            detail: format!("not a PDF (first bytes: {magic:?})"),
        });
    }

    let mut document =
        Document::load_mem(bytes).map_err(|e| ExtractionError::MalformedDocument {
            detail: e.to_string(),
        })?;
    document
        .catalog()
        .map_err(|e| ExtractionError::MalformedDocument {
            detail: format!("missing document catalog: {e}"),
        })?;

    // Owner-password-only PDFs open with the empty user password.
    if document.is_encrypted() {
        document
            .decrypt("")
            .map_err(|e| ExtractionError::MalformedDocument {
                detail: format!("document is encrypted and could not be opened: {e}"),
            })?;
        debug!("Decrypted PDF with the empty user password");
    }

    let pages = document.get_pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for page_num in pages.keys() {
        let page_text =
            document
                .extract_text(&[*page_num])
                .map_err(|e| ExtractionError::MalformedDocument {
                    detail: format!("page {page_num}: {e}"),
                })?;
        debug!("Page {}: {} chars", page_num, page_text.chars().count());
        text.push_str(&page_text);
    }

    Ok(text)
}

/// `%PDF-` must appear within the first 1024 bytes.
fn has_pdf_header(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

async fn run_tesseract(cmd: &str, language: &str, png: Vec<u8>) -> Result<String, ExtractionError> {
    debug!("Running {} with language '{}'", cmd, language);

    let mut child = Command::new(cmd)
        .args(["stdin", "stdout", "-l", language])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExtractionError::OcrUnavailable {
            detail: format!("could not start '{cmd}': {e}"),
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ExtractionError::OcrUnavailable {
            detail: "OCR process has no stdin".into(),
        })?;

    // Feed stdin while stdout is drained, otherwise a large image can fill
    // both pipes and deadlock.
    let writer = tokio::spawn(async move {
        stdin.write_all(&png).await?;
        stdin.shutdown().await
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| ExtractionError::OcrUnavailable {
            detail: format!("OCR process failed: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::OcrUnavailable {
            detail: format!("{cmd} exited with {}: {}", output.status, stderr.trim()),
        });
    }

    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(ExtractionError::OcrUnavailable {
                detail: format!("could not send image to OCR: {e}"),
            })
        }
        Err(e) => {
            return Err(ExtractionError::OcrUnavailable {
                detail: format!("OCR writer task panicked: {e}"),
            })
        }
    }

    let text = String::from_utf8_lossy(&output.stdout);
    // tesseract terminates each page with a form feed
    Ok(text.trim_end_matches('\u{c}').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build an in-memory PDF with one text line per page.
    fn pdf_with_pages(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_texts.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn pdf_pages_are_concatenated_in_order() {
        let bytes = pdf_with_pages(&["Alpha", "Beta"]);
        let text = extract_pdf_text(&bytes).expect("valid pdf");

        let alpha = text.find("Alpha").expect("page 1 text");
        let beta = text.find("Beta").expect("page 2 text");
        assert!(alpha < beta);

        // Joined with nothing in between: same as concatenating each page.
        let doc = Document::load_mem(&bytes).unwrap();
        let expected = format!(
            "{}{}",
            doc.extract_text(&[1]).unwrap(),
            doc.extract_text(&[2]).unwrap()
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = extract_pdf_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedDocument { .. }));
    }

    #[test]
    fn truncated_pdf_is_malformed() {
        let err = extract_pdf_text(b"%PDF-1.5\n1 0 obj\n<< /Type /Catalog").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedDocument { .. }));
    }

    #[test]
    fn owner_locked_pdf_is_read() {
        let bytes = include_bytes!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/owner_locked.pdf"
        ));
        assert!(Document::load_mem(bytes).unwrap().is_encrypted());

        let text = extract_pdf_text(bytes).expect("empty user password opens it");
        assert!(text.contains("Segredo"), "got: {text:?}");
    }

    #[test]
    fn user_locked_pdf_is_malformed() {
        let bytes = include_bytes!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/user_locked.pdf"
        ));
        match extract_pdf_text(bytes).unwrap_err() {
            ExtractionError::MalformedDocument { detail } => {
                assert!(detail.contains("encrypted"), "got: {detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_detection() {
        assert!(has_pdf_header(b"%PDF-1.7\n"));
        assert!(has_pdf_header(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!has_pdf_header(b"%PD"));
        assert!(!has_pdf_header(b""));
    }

    #[test]
    fn extracted_text_blankness() {
        assert!(ExtractedText::new("").is_blank());
        assert!(ExtractedText::new(" \n\t").is_blank());
        assert!(!ExtractedText::new("a").is_blank());
        assert_eq!(ExtractedText::new("çã").char_count(), 2);
    }

    #[tokio::test]
    async fn plain_text_is_identity() {
        let extractor = DocumentExtractor::default();
        let text = extractor
            .extract(&InputSource::PlainText("  texto  ".into()))
            .await
            .unwrap();
        assert_eq!(text.as_str(), "  texto  ");

        let empty = extractor
            .extract(&InputSource::PlainText(String::new()))
            .await
            .unwrap();
        assert!(empty.is_blank());
    }

    #[tokio::test]
    async fn pdf_source_goes_through_lopdf() {
        let extractor = DocumentExtractor::default();
        let text = extractor
            .extract(&InputSource::PdfDocument(pdf_with_pages(&["Celula"])))
            .await
            .unwrap();
        assert!(text.as_str().contains("Celula"));
    }

    #[tokio::test]
    async fn corrupt_image_is_ocr_unavailable() {
        let extractor = DocumentExtractor::default();
        let err = extractor
            .extract(&InputSource::ImageDocument(b"not an image".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::OcrUnavailable { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn missing_ocr_engine_is_ocr_unavailable() {
        let png = encode::encode_png(&image::DynamicImage::new_rgb8(8, 8)).unwrap();
        let extractor = DocumentExtractor::new("por", "/nonexistent/tesseract-binary");
        let err = extractor
            .extract(&InputSource::ImageDocument(png))
            .await
            .unwrap_err();
        match err {
            ExtractionError::OcrUnavailable { detail } => {
                assert!(detail.contains("could not start"), "got: {detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
