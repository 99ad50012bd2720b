//! Batch mode for benchmark harnesses.
//!
//! The harness hands over a JSON object mapping task ids to task objects,
//! each with a `description`. Every task comes back with a `response` field
//! holding the generated code. Failed tasks get [`FAILED_RESPONSE`] so the
//! harness scores them as wrong and keeps going.

use crate::error::{CodegenError, Result};
use crate::extract::FAILED_RESPONSE;
use crate::solver::Solver;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Task field holding the problem statement.
pub const DESCRIPTION_FIELD: &str = "description";

/// Task field receiving the generated code.
pub const RESPONSE_FIELD: &str = "response";

/// Tasks supplied by the harness, keyed by task id.
#[derive(Debug, Clone, Default)]
pub struct HarnessInput {
    tasks: Map<String, Value>,
}

impl HarnessInput {
    /// Parse a harness document. Every task must be a JSON object.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| CodegenError::Harness(format!("Invalid harness JSON: {}", e)))?;

        let Value::Object(tasks) = value else {
            return Err(CodegenError::Harness(
                "Harness document must be a JSON object of tasks".to_string(),
            ));
        };

        if let Some((task_id, _)) = tasks.iter().find(|(_, task)| !task.is_object()) {
            return Err(CodegenError::Harness(format!(
                "Task '{}' is not a JSON object",
                task_id
            )));
        }

        Ok(Self { tasks })
    }

    /// Load a harness document from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task ids in sorted order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Problem statement of a task, if present.
    pub fn description(&self, task_id: &str) -> Option<&str> {
        self.tasks
            .get(task_id)
            .and_then(|task| task.get(DESCRIPTION_FIELD))
            .and_then(Value::as_str)
    }
}

/// Harness document with responses filled in.
#[derive(Debug, Clone)]
pub struct HarnessOutput {
    /// Tasks with a `response` field added.
    pub tasks: Map<String, Value>,
    /// Tasks whose code was generated and extracted.
    pub succeeded: usize,
    /// Tasks that received the canned failure response.
    pub failed: usize,
}

impl HarnessOutput {
    /// Generated code for a task.
    pub fn response(&self, task_id: &str) -> Option<&str> {
        self.tasks
            .get(task_id)
            .and_then(|task| task.get(RESPONSE_FIELD))
            .and_then(Value::as_str)
    }

    /// Serialize the output document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.tasks)
            .map_err(|e| CodegenError::Harness(format!("Failed to serialize output: {}", e)))
    }

    /// Write the output document, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
            }
        }
        fs::write(path, self.to_json()?).map_err(|e| CodegenError::io(path, e))
    }
}

/// Solve every task in order, one request at a time.
pub async fn run_tasks(solver: &Solver, input: HarnessInput) -> HarnessOutput {
    let total = input.len();
    let mut tasks = input.tasks;
    let mut succeeded = 0;
    let mut failed = 0;

    for (index, (task_id, task)) in tasks.iter_mut().enumerate() {
        tracing::info!("Processing task {} ({}/{})", task_id, index + 1, total);
        let start = Instant::now();

        let outcome = match task.get(DESCRIPTION_FIELD).and_then(Value::as_str) {
            Some(description) => solver.solve(description).await.map(|s| s.code),
            None => Err(CodegenError::Harness(format!(
                "task has no string '{}' field",
                DESCRIPTION_FIELD
            ))),
        };

        let code = match outcome {
            Ok(code) => {
                succeeded += 1;
                tracing::info!(
                    "Task {} processed successfully in {:.2?}",
                    task_id,
                    start.elapsed()
                );
                code
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    "Error processing task {}: {}. Using the canned response, this task will fail evaluation",
                    task_id,
                    e
                );
                FAILED_RESPONSE.to_string()
            }
        };

        if let Value::Object(fields) = task {
            fields.insert(RESPONSE_FIELD.to_string(), Value::String(code));
        }
    }

    tracing::info!("All tasks done: {} succeeded, {} failed", succeeded, failed);

    HarnessOutput {
        tasks,
        succeeded,
        failed,
    }
}
