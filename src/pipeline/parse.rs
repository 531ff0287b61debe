//! Strict parsing of a generation reply into a [`FlashcardSet`].
//!
//! The reply must be a sequence of `question;answer` lines. Blank lines are
//! skipped. Any other line that does not split into exactly two non-blank
//! fields rejects the *whole* reply: no partial set is ever returned.

use crate::error::ParseError;
use crate::output::{FlashcardRecord, FlashcardSet};

/// Field delimiter inside a reply line.
pub const FIELD_DELIMITER: char = ';';

/// Parse `reply` into records, preserving line order.
///
/// `\n`, `\r\n` and a bare `\r` all end a line. Line numbers in
/// [`ParseError::SchemaViolation`] are 1-based and count blank lines, so
/// they point at the line as it appears in the reply.
pub fn parse_reply(reply: &str) -> Result<FlashcardSet, ParseError> {
    let normalized = reply.replace("\r\n", "\n").replace('\r', "\n");
    let mut records = Vec::new();

    for (idx, line) in normalized.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let violation = |detail: String| ParseError::SchemaViolation {
            line: idx + 1,
            detail,
            content: line.to_string(),
        };

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() != 2 {
            return Err(violation(format!(
                "expected 2 fields, found {}",
                fields.len()
            )));
        }

        let record =
            FlashcardRecord::new(fields[0], fields[1]).map_err(|e| violation(e.to_string()))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(ParseError::EmptyReply);
    }
    Ok(FlashcardSet::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::export::encode_export;

    #[test]
    fn capital_of_brazil() {
        let set = parse_reply("Qual é a capital do Brasil?;Brasília").unwrap();
        assert_eq!(set.len(), 1);
        let card = &set.records()[0];
        assert_eq!(card.question(), "Qual é a capital do Brasil?");
        assert_eq!(card.answer(), "Brasília");
    }

    #[test]
    fn records_keep_reply_order() {
        let reply = "Q1;A1\nQ2;A2\nQ3;A3\n";
        let set = parse_reply(reply).unwrap();
        let questions: Vec<&str> = set.iter().map(|r| r.question()).collect();
        assert_eq!(questions, ["Q1", "Q2", "Q3"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let set = parse_reply("\nQ1;A1\n   \n\nQ2;A2\n\n").unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn crlf_lines_parse() {
        let set = parse_reply("Q1;A1\r\nQ2;A2\r\n").unwrap();
        assert_eq!(set.records()[1].answer(), "A2");
    }

    #[test]
    fn trailing_carriage_return_is_a_line_end() {
        let set = parse_reply("Q1;A1\r\nQ2;A2\r").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[1].answer(), "A2");

        let set = parse_reply("Q1;A1\rQ2;A2\r").unwrap();
        assert_eq!(set.records()[0].answer(), "A1");
        assert_eq!(set.records()[1].question(), "Q2");
    }

    #[test]
    fn line_numbers_follow_carriage_returns() {
        let err = parse_reply("Q1;A1\r\rquebrado").unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { line: 3, .. }));
    }

    #[test]
    fn fields_are_not_trimmed() {
        let set = parse_reply(" Q ; A ").unwrap();
        assert_eq!(set.records()[0].question(), " Q ");
        assert_eq!(set.records()[0].answer(), " A ");
    }

    #[test]
    fn one_bad_line_rejects_everything() {
        let err = parse_reply("Q1;A1\nsó uma coluna\nQ3;A3").unwrap_err();
        assert_eq!(
            err,
            ParseError::SchemaViolation {
                line: 2,
                detail: "expected 2 fields, found 1".into(),
                content: "só uma coluna".into(),
            }
        );
    }

    #[test]
    fn three_fields_is_a_violation() {
        let err = parse_reply("Q;A;extra").unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { line: 1, .. }));
        assert!(err.to_string().contains("found 3"), "got: {err}");
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let err = parse_reply("Q1;A1\n\n\nquebrado").unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation { line: 4, .. }));
    }

    #[test]
    fn empty_field_is_a_violation() {
        for reply in [";Resposta", "Pergunta;", "Pergunta;   "] {
            let err = parse_reply(reply).unwrap_err();
            assert!(
                matches!(err, ParseError::SchemaViolation { line: 1, .. }),
                "{reply:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_reply() {
        assert_eq!(parse_reply("").unwrap_err(), ParseError::EmptyReply);
        assert_eq!(parse_reply(" \n\n\t\n").unwrap_err(), ParseError::EmptyReply);
    }

    #[test]
    fn export_of_parsed_set_reparses_identically() {
        let reply = "Q1;A1\n\nQ2;A2\nO que é ATP?;Moeda energética da célula";
        let set = parse_reply(reply).unwrap();
        let exported = String::from_utf8(encode_export(&set)).unwrap();
        assert_eq!(parse_reply(&exported).unwrap(), set);
    }
}
