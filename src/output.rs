//! Flashcard records and the ordered set handed to the user.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Column names, in export order.
pub const COLUMNS: [&str; 2] = ["Question", "Answer"];

/// Which side of a card a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Question,
    Answer,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Question => f.write_str("question"),
            Column::Answer => f.write_str("answer"),
        }
    }
}

/// A field value that cannot be stored in a flashcard.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("empty {0}")]
    EmptyField(Column),

    #[error("{column} contains forbidden character {ch:?}")]
    ForbiddenChar { column: Column, ch: char },
}

/// One question/answer pair.
///
/// Both fields are non-blank and free of `;`, `\n` and `\r`, so every record
/// exports to exactly one `question;answer` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashcardRecord {
    question: String,
    answer: String,
}

impl FlashcardRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Result<Self, RecordError> {
        let question = question.into();
        let answer = answer.into();
        validate_field(&question, Column::Question)?;
        validate_field(&answer, Column::Answer)?;
        Ok(Self { question, answer })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

fn validate_field(value: &str, column: Column) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::EmptyField(column));
    }
    if let Some(ch) = value.chars().find(|c| matches!(c, ';' | '\n' | '\r')) {
        return Err(RecordError::ForbiddenChar { column, ch });
    }
    Ok(())
}

/// Flashcards in the order the generation backend produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlashcardSet {
    records: Vec<FlashcardRecord>,
}

impl FlashcardSet {
    pub fn from_records(records: Vec<FlashcardRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlashcardRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[FlashcardRecord] {
        &self.records
    }

    /// Render a plain-text table preview with a `Question | Answer` header.
    ///
    /// Cells longer than `max_width` characters are cut with `…`.
    pub fn to_table(&self, max_width: usize) -> String {
        let max_width = max_width.max(4);
        let rows: Vec<[String; 2]> = self
            .records
            .iter()
            .map(|r| [truncate(&r.question, max_width), truncate(&r.answer, max_width)])
            .collect();

        let mut widths = [COLUMNS[0].chars().count(), COLUMNS[1].chars().count()];
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let index_width = rows.len().to_string().len();

        let mut out = String::new();
        out.push_str(&format_row(" ", index_width, COLUMNS, widths[0]));
        out.push_str(&format!(
            "{}-+-{}-+-{}\n",
            "-".repeat(index_width),
            "-".repeat(widths[0]),
            "-".repeat(widths[1])
        ));
        for (i, row) in rows.iter().enumerate() {
            out.push_str(&format_row(
                &(i + 1).to_string(),
                index_width,
                [&row[0], &row[1]],
                widths[0],
            ));
        }
        out
    }
}

impl<'a> IntoIterator for &'a FlashcardSet {
    type Item = &'a FlashcardRecord;
    type IntoIter = std::slice::Iter<'a, FlashcardRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn format_row(index: &str, index_width: usize, cells: [&str; 2], question_width: usize) -> String {
    format!(
        "{:>iw$} | {} | {}\n",
        index,
        pad(cells[0], question_width),
        cells[1],
        iw = index_width
    )
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}\u{2026}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(q: &str, a: &str) -> FlashcardRecord {
        FlashcardRecord::new(q, a).unwrap()
    }

    #[test]
    fn record_rejects_blank_fields() {
        assert_eq!(
            FlashcardRecord::new("", "a").unwrap_err(),
            RecordError::EmptyField(Column::Question)
        );
        assert_eq!(
            FlashcardRecord::new("q", "  ").unwrap_err(),
            RecordError::EmptyField(Column::Answer)
        );
    }

    #[test]
    fn record_rejects_delimiters() {
        assert_eq!(
            FlashcardRecord::new("a;b", "c").unwrap_err(),
            RecordError::ForbiddenChar {
                column: Column::Question,
                ch: ';'
            }
        );
        assert!(FlashcardRecord::new("q", "linha\nquebrada").is_err());
        assert!(FlashcardRecord::new("q\r", "a").is_err());
    }

    #[test]
    fn record_keeps_fields_verbatim() {
        let r = card(" Qual é a capital? ", "Brasília ");
        assert_eq!(r.question(), " Qual é a capital? ");
        assert_eq!(r.answer(), "Brasília ");
    }

    #[test]
    fn set_serialises_as_array() {
        let set = FlashcardSet::from_records(vec![card("Q1", "A1"), card("Q2", "A2")]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"[{"question":"Q1","answer":"A1"},{"question":"Q2","answer":"A2"}]"#
        );
    }

    #[test]
    fn table_has_header_and_rows() {
        let set = FlashcardSet::from_records(vec![
            card("Qual é a capital do Brasil?", "Brasília"),
            card("2+2?", "4"),
        ]);
        let table = set.to_table(60);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Question") && lines[0].contains("Answer"));
        assert!(lines[2].starts_with("1 | Qual é a capital do Brasil?"));
        assert!(lines[3].starts_with("2 | 2+2?"));
        assert!(lines[3].ends_with("| 4"));
    }

    #[test]
    fn table_truncates_long_cells() {
        let long = "x".repeat(100);
        let set = FlashcardSet::from_records(vec![card(&long, "a")]);
        let table = set.to_table(10);
        assert!(table.contains("xxxxxxxxx\u{2026}"));
        assert!(!table.contains(&"x".repeat(11)));
    }
}
