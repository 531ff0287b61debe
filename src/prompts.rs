//! The flashcard prompt template.
//!
//! The template's output-format instruction is load-bearing: the parser in
//! [`crate::pipeline::parse`] accepts only `Pergunta;Resposta` lines and has
//! no fallback grammar. Callers can override the template via
//! [`crate::config::FlashgenConfig::prompt_template`]; the constant here is
//! used only when no override is provided.

use std::fmt;

/// Placeholder replaced by the extracted text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default template. The extracted text goes after `TEXTO ORIGINAL:`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"Aja como um especialista em criar materiais de estudo diretamente para estudantes de escolas, cursos técnicos e faculdade.
Baseado no texto abaixo, extraia os conceitos chave e gere pares de Pergunta e Resposta no formato de flashcards.
A pergunta deve ser clara e a resposta concisa.
Formate a saída EXATAMENTE como: 'Pergunta;Resposta', com cada flashcard em uma nova linha.
NÃO inclua cabeçalhos ou qualquer outro texto antes ou depois dos flashcards.

TEXTO ORIGINAL:
{text}"#;

/// A rendered prompt, ready for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substitute `text` verbatim into `template`.
///
/// Only the first `{text}` is replaced, and the inserted text is never
/// re-scanned, so a `{text}` inside the study material survives unchanged.
///
/// Blank `text` is not rejected here: the pipeline stops with
/// [`crate::FlashgenError::EmptyInput`] before a prompt is built.
pub fn build_prompt(template: &str, text: &str) -> Prompt {
    Prompt(template.replacen(TEXT_PLACEHOLDER, text, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_placeholder_once() {
        assert_eq!(DEFAULT_PROMPT_TEMPLATE.matches(TEXT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn default_template_demands_exact_format() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("'Pergunta;Resposta'"));
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("NÃO inclua cabeçalhos"));
    }

    #[test]
    fn prompt_contains_text_verbatim() {
        let texts = [
            "A capital do Brasil é Brasília.",
            "linha 1\nlinha 2\n\n  indentada",
            "símbolos: ; , \" ' {} $ \\",
            "mitocôndria → ATP",
        ];
        for text in texts {
            let prompt = build_prompt(DEFAULT_PROMPT_TEMPLATE, text);
            assert!(prompt.as_str().contains(text), "missing: {text:?}");
            assert!(!prompt.as_str().contains(TEXT_PLACEHOLDER));
        }
    }

    #[test]
    fn text_goes_after_marker() {
        let prompt = build_prompt(DEFAULT_PROMPT_TEMPLATE, "Fotossíntese");
        let marker = prompt.as_str().find("TEXTO ORIGINAL:").unwrap();
        let text = prompt.as_str().find("Fotossíntese").unwrap();
        assert!(text > marker);
        assert!(prompt.as_str().ends_with("Fotossíntese"));
    }

    #[test]
    fn placeholder_inside_text_is_not_expanded() {
        let prompt = build_prompt("A {text} B", "x {text} y");
        assert_eq!(prompt.as_str(), "A x {text} y B");
    }

    #[test]
    fn blank_text_still_builds_a_prompt() {
        let prompt = build_prompt("Texto:\n{text}\nFim", "   ");
        assert_eq!(prompt.as_str(), "Texto:\n   \nFim");
    }
}
