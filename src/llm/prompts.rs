//! Built-in prompts for solution generation.

/// Collection of prompts used when no template file is configured.
pub struct Prompts;

impl Prompts {
    /// Default solver template. `{question}` receives the problem statement.
    pub fn solver_template() -> &'static str {
        r#"You are an expert competitive programmer. Solve the following USACO problem.

[BEGIN PROBLEM]
{question}
[END PROBLEM]

Requirements:
- Write a complete Python 3 program.
- Read all input from standard input and write the answer to standard output.
- Do not read from or write to files, and do not print anything besides the answer.
- Make sure the solution fits the time and memory limits implied by the constraints.

First explain your approach briefly, then give the full program in a single ```python code block."#
    }

    /// Probe prompt used by connectivity checks.
    pub fn connection_probe() -> &'static str {
        "Say 'hello' and nothing else."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_template_has_placeholder() {
        assert_eq!(Prompts::solver_template().matches("{question}").count(), 1);
        assert!(Prompts::solver_template().contains("```python"));
    }

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!Prompts::connection_probe().is_empty());
    }
}
