//! Export: serialise a [`FlashcardSet`] into the Anki import format.
//!
//! One `question;answer` line per record, UTF-8, no header row, records
//! joined with `\n` and no trailing newline. Fields are written verbatim;
//! [`FlashcardRecord`](crate::output::FlashcardRecord) already guarantees
//! they contain no `;` or line breaks, so no quoting is needed.

use crate::error::FlashgenError;
use crate::output::FlashcardSet;
use crate::pipeline::parse::FIELD_DELIMITER;
use std::path::Path;
use tracing::info;

/// File name the CLI writes to when no `--output` is given.
pub const EXPORT_FILE_NAME: &str = "flashcards_para_anki.csv";

/// Encode `set` as import-file bytes.
pub fn encode_export(set: &FlashcardSet) -> Vec<u8> {
    let lines: Vec<String> = set
        .iter()
        .map(|r| format!("{}{}{}", r.question(), FIELD_DELIMITER, r.answer()))
        .collect();
    lines.join("\n").into_bytes()
}

/// Write `set` to `path`, creating parent directories as needed.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// half-written import file behind.
pub async fn write_export(path: impl AsRef<Path>, set: &FlashcardSet) -> Result<(), FlashgenError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| FlashgenError::ExportWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, encode_export(set))
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    info!("Wrote {} flashcards to {}", set.len(), path.display());
    Ok(())
}
