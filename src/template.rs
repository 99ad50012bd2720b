//! Prompt templates with `{question}` placeholders.
//!
//! Templates use the brace syntax of Python's `str.format`: `{{` and `}}`
//! are literal braces and `{question}` is replaced with the problem text.
//! Substituted text is inserted as-is and never re-scanned.

use crate::error::{CodegenError, Result};
use crate::llm::Prompts;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the placeholder receiving the problem statement.
pub const QUESTION_PLACEHOLDER: &str = "question";

/// A prompt template loaded from disk or built in.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    source: Option<PathBuf>,
}

impl PromptTemplate {
    /// Wrap template text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// The template used when none is configured.
    pub fn builtin() -> Self {
        Self::new(Prompts::solver_template())
    }

    /// Load a template file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CodegenError::TemplateNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        Ok(Self {
            text,
            source: Some(path.to_path_buf()),
        })
    }

    /// Load `path` if given, otherwise the built-in template.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the template was loaded from, if a file.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Fill the `{question}` placeholder with `question`.
    pub fn render(&self, question: &str) -> Result<String> {
        let mut out = String::with_capacity(self.text.len() + question.len());
        let mut substituted = false;
        let mut chars = self.text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let rest = &self.text[pos + 1..];
                    let end = rest.find('}').ok_or_else(|| {
                        CodegenError::Template(format!("unterminated '{{' at byte {}", pos))
                    })?;
                    let name = &rest[..end];
                    if name != QUESTION_PLACEHOLDER {
                        return Err(CodegenError::Template(format!(
                            "unknown placeholder '{{{}}}' at byte {}",
                            name, pos
                        )));
                    }
                    out.push_str(question);
                    substituted = true;
                    // Skip the name and the closing brace.
                    for _ in 0..=name.chars().count() {
                        chars.next();
                    }
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => {
                    return Err(CodegenError::Template(format!(
                        "single '}}' encountered at byte {}",
                        pos
                    )));
                }
                _ => out.push(c),
            }
        }

        if !substituted {
            tracing::warn!(
                "Prompt template {} has no {{{}}} placeholder, problem text not included",
                self.source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<inline>".to_string()),
                QUESTION_PLACEHOLDER
            );
        }

        Ok(out)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_render_substitutes_question() {
        let template = PromptTemplate::new("Solve:\n{question}\nAnswer in Python.");
        let prompt = template.render("Add two numbers.").unwrap();
        assert_eq!(prompt, "Solve:\nAdd two numbers.\nAnswer in Python.");
    }

    #[test]
    fn test_render_handles_escaped_braces() {
        let template = PromptTemplate::new("Reply as {{\"code\": ...}} for {question}");
        let prompt = template.render("task").unwrap();
        assert_eq!(prompt, "Reply as {\"code\": ...} for task");
    }

    #[test]
    fn test_question_braces_are_not_rescanned() {
        let template = PromptTemplate::new("[{question}]");
        let prompt = template.render("set {1, 2} and {question}").unwrap();
        assert_eq!(prompt, "[set {1, 2} and {question}]");
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = PromptTemplate::new("{question} / {question}");
        assert_eq!(template.render("x").unwrap(), "x / x");
    }

    #[test]
    fn test_non_ascii_text_around_placeholder() {
        let template = PromptTemplate::new("问题：{question}。");
        assert_eq!(template.render("Ünïcode").unwrap(), "问题：Ünïcode。");
    }

    #[test]
    fn test_unknown_placeholder_is_error() {
        let template = PromptTemplate::new("{problem}");
        let err = template.render("x").unwrap_err();
        assert!(matches!(err, CodegenError::Template(ref m) if m.contains("problem")));
    }

    #[test]
    fn test_unbalanced_braces_are_errors() {
        assert!(PromptTemplate::new("{question").render("x").is_err());
        assert!(PromptTemplate::new("a } b {question}").render("x").is_err());
    }

    #[test]
    fn test_template_without_placeholder_renders_unchanged() {
        let template = PromptTemplate::new("no placeholder here");
        assert_eq!(template.render("ignored").unwrap(), "no placeholder here");
    }

    #[test]
    fn test_builtin_renders() {
        let prompt = PromptTemplate::builtin().render("Bessie counts cows.").unwrap();
        assert!(prompt.contains("Bessie counts cows."));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Q: {{question}}").unwrap();

        let template = PromptTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.source(), Some(file.path()));
        assert_eq!(template.render("why").unwrap(), "Q: why");
    }

    #[test]
    fn test_missing_file() {
        let result = PromptTemplate::from_file(Path::new("/nonexistent/nova.txt"));
        assert!(matches!(result, Err(CodegenError::TemplateNotFound(_))));
    }
}
