//! Reply cleanup applied before parsing when
//! [`crate::config::FlashgenConfig::strip_fences`] is enabled.
//!
//! Models sometimes wrap the whole answer in a ` ```csv ... ``` ` block or
//! sprinkle zero-width characters into it despite the prompt. These rules
//! undo such wrapping without touching the `question;answer` lines
//! themselves, so a reply that is actually malformed still fails parsing.
//!
//! Rules run in order: fences are stripped on the raw text, then line
//! endings are normalised, then invisible characters are removed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw backend reply.
pub fn clean_reply(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip an outer code fence ────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode ─────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language() {
        let input = "```csv\nQ1;A1\nQ2;A2\n```";
        assert_eq!(clean_reply(input), "Q1;A1\nQ2;A2");
    }

    #[test]
    fn strips_bare_fence_with_surrounding_whitespace() {
        let input = "\n  ```\nQ;A\n```  \n";
        assert_eq!(clean_reply(input), "Q;A");
    }

    #[test]
    fn unfenced_reply_is_unchanged() {
        let input = "Qual é a capital?;Brasília\n";
        assert_eq!(clean_reply(input), input);
    }

    #[test]
    fn inner_fence_is_not_touched() {
        let input = "Intro;texto\n```\nQ;A\n```";
        assert_eq!(clean_reply(input), input);
    }

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(clean_reply("Q1;A1\r\nQ2;A2\r\n"), "Q1;A1\nQ2;A2\n");
        assert_eq!(clean_reply("```\r\nQ;A\r\n```"), "Q;A");
    }

    #[test]
    fn invisible_chars_are_removed() {
        assert_eq!(clean_reply("\u{FEFF}Q\u{200B};A"), "Q;A");
    }
}
