//! Configuration for the code generator.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{CodegenError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible gateway (e.g., "http://localhost:4000")
    pub api_base: String,

    /// API key for authentication, empty when the gateway needs none
    #[serde(default)]
    pub api_key: String,

    /// Model name as the gateway knows it
    pub model: String,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of completions requested
    #[serde(default = "default_n")]
    pub n: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_n() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: "bedrock/amazon.nova-lite-v1:0".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            n: default_n(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prompt template and extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Template file; the built-in template is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Info string of the fenced block to extract
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: None,
            language: default_language(),
        }
    }
}

/// Retry settings for rate limits and empty completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first; 0 disables retrying
    #[serde(default)]
    pub max_retries: u32,

    /// Delay unit, multiplied by the attempt number
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Upper bound of the random jitter added to each delay
    #[serde(default = "default_max_jitter_secs")]
    pub max_jitter_secs: u64,
}

fn default_base_delay_secs() -> u64 {
    60
}

fn default_max_jitter_secs() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_secs: default_base_delay_secs(),
            max_jitter_secs: default_max_jitter_secs(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings
    pub llm: LlmConfig,
    /// Prompt template settings
    #[serde(default)]
    pub template: TemplateConfig,
    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    template: Option<TemplateFileSection>,
    retry: Option<RetryFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    n: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TemplateFileSection {
    path: Option<PathBuf>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetryFileSection {
    max_retries: Option<u32>,
    base_delay_secs: Option<u64>,
    max_jitter_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_API_KEY, LLM_MODEL, ...)
    /// 2. Config file (~/.config/usaco-codegen/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                tracing::debug!("Loading config file {}", config_path.display());
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok());

        Ok(config)
    }

    /// Override values from environment-style lookups.
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = lookup("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Some(api_key) = lookup("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(tokens) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = tokens;
        }

        if let Some(temp) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = temp;
        }

        if let Some(n) = lookup("LLM_N").and_then(|v| v.parse().ok()) {
            self.llm.n = n;
        }

        if let Some(secs) = lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = secs;
        }

        if let Some(path) = lookup("PROMPT_TEMPLATE_PATH") {
            self.template.path = Some(PathBuf::from(path));
        }

        if let Some(retries) = lookup("LLM_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.retry.max_retries = retries;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| CodegenError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
            if let Some(n) = llm.n {
                config.llm.n = n;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                config.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(template) = file_config.template {
            if template.path.is_some() {
                config.template.path = template.path;
            }
            if let Some(language) = template.language {
                config.template.language = language;
            }
        }

        if let Some(retry) = file_config.retry {
            if let Some(max_retries) = retry.max_retries {
                config.retry.max_retries = max_retries;
            }
            if let Some(base_delay_secs) = retry.base_delay_secs {
                config.retry.base_delay_secs = base_delay_secs;
            }
            if let Some(max_jitter_secs) = retry.max_jitter_secs {
                config.retry.max_jitter_secs = max_jitter_secs;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "usaco-codegen")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(CodegenError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(CodegenError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.llm.n == 0 {
            return Err(CodegenError::Config(
                "LLM_N must be at least 1".to_string(),
            ));
        }

        if self.template.language.trim().is_empty() {
            return Err(CodegenError::Config(
                "Code block language must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.api_base.is_empty());
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "bedrock/amazon.nova-lite-v1:0");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.llm.n, 1);
        assert_eq!(config.template.language, "python");
        assert!(config.template.path.is_none());
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.base_delay_secs, 60);
    }

    #[test]
    fn test_validate_fails_without_required_fields() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allows_missing_api_key() {
        let config = Config::with_llm("http://localhost:4000", "", "nova");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_llm() {
        let config = Config::with_llm("https://api.example.com", "test-key", "gpt-4");
        assert_eq!(config.llm.api_base, "https://api.example.com");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gpt-4");
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
llm:
  api_base: http://gateway:4000
  temperature: 0.0
template:
  path: prompt_templates/nova.txt
retry:
  max_retries: 10
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.api_base, "http://gateway:4000");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(
            config.template.path.as_deref(),
            Some(Path::new("prompt_templates/nova.txt"))
        );
        assert_eq!(config.template.language, "python");
        assert_eq!(config.retry.max_retries, 10);
        assert_eq!(config.retry.max_jitter_secs, 10);
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = Config::from_yaml("llm: [unclosed");
        assert!(matches!(result, Err(CodegenError::Config(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LLM_API_BASE", "http://env:4000"),
            ("LLM_MODEL", "env-model"),
            ("LLM_MAX_TOKENS", "512"),
            ("LLM_TEMPERATURE", "not-a-number"),
            ("PROMPT_TEMPLATE_PATH", "t.txt"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.api_base, "http://env:4000");
        assert_eq!(config.llm.model, "env-model");
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.template.path, Some(PathBuf::from("t.txt")));
    }
}
