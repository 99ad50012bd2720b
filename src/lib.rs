//! usaco-codegen - generates USACO solutions with a hosted LLM.
//!
//! Sends a competitive-programming problem statement to a model behind an
//! OpenAI-compatible gateway and pulls the generated program out of the
//! fenced code block in the reply, ready for a benchmark harness to score.
//!
//! # Quick Start
//!
//! ```no_run
//! use usaco_codegen::{config::Config, solver::Solver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let solver = Solver::from_config(&config)?;
//!     let solution = solver.solve("Bessie has N cows...").await?;
//!
//!     print!("{}", solution.code);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **PromptTemplate**: fills `{question}` in a prompt template
//! - **LlmClient**: OpenAI-compatible API client with optional retry
//! - **CodeExtractor**: finds the fenced code block in a response
//! - **Solver**: the three steps above for one problem
//! - **harness**: batch mode over a harness task document

pub mod config;
pub mod error;
pub mod extract;
pub mod harness;
pub mod llm;
pub mod logging;
pub mod solver;
pub mod template;

// Re-export commonly used types
pub use config::Config;
pub use error::{CodegenError, Result};
pub use extract::{CodeExtractor, FAILED_RESPONSE};
pub use harness::{HarnessInput, HarnessOutput, run_tasks};
pub use llm::LlmClient;
pub use solver::{Solution, Solver};
pub use template::PromptTemplate;
