//! Extraction of fenced code blocks from model output.

use regex::Regex;
use std::sync::LazyLock;

/// Opening fence at the start of a line with optional info string, body, closing fence.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```([^\n`]*)\n(.*?)```").expect("Invalid fence regex")
});

/// Program returned when no code can be extracted.
///
/// It runs without error but never prints a correct answer, so the harness
/// scores the task as failed and moves on to the next one.
pub const FAILED_RESPONSE: &str = r#"
import sys

def main():
    input = sys.stdin.read
    data = input().split()

    # canned response, the evaluation for this task fails silently

    print(data)

if __name__ == "__main__":
    main()
"#;

/// Finds the first fenced block for a language in free-form text.
#[derive(Debug, Clone)]
pub struct CodeExtractor {
    language: String,
}

impl CodeExtractor {
    /// Create an extractor for blocks opened with "```<language>".
    pub fn new(language: &str) -> Self {
        Self {
            language: language.trim().to_string(),
        }
    }

    /// Language whose blocks are extracted.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Return the body of the first block tagged with the language, or of
    /// the first untagged block, verbatim.
    pub fn extract(&self, text: &str) -> Option<String> {
        let mut untagged = None;

        // Matches never overlap, so a closing fence cannot open another block.
        for caps in FENCE.captures_iter(text) {
            let info = caps.get(1).map_or("", |m| m.as_str()).trim();
            let body = caps.get(2).map_or("", |m| m.as_str());
            if info.eq_ignore_ascii_case(&self.language) {
                return Some(body.to_string());
            }
            if info.is_empty() && untagged.is_none() {
                untagged = Some(body);
            }
        }

        untagged.map(str::to_string)
    }

    /// Like [`extract`](Self::extract), falling back to [`FAILED_RESPONSE`].
    pub fn extract_or_fallback(&self, text: &str) -> String {
        match self.extract(text) {
            Some(code) => code,
            None => {
                tracing::error!(
                    "no {} code found in model response, returning the canned failure response",
                    self.language
                );
                tracing::debug!("response without code: {}", text);
                FAILED_RESPONSE.to_string()
            }
        }
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new("python")
    }
}
