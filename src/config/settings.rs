use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the generative API (without the `/models/...` suffix)
    pub base_url: String,
    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature sent with every request
    pub temperature: f32,
    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,
    /// Transport timeout for a single call
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Directory with `<name>.j2` overrides for the bundled prompt templates
    pub template_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Service directory for per-phase session snapshots
    /// Defaults to ~/.config/grant-forge/runs/
    pub runs_dir: PathBuf,
    /// Final output directory for the exported proposal
    pub active_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.5,
            max_output_tokens: 8192,
            request_timeout_secs: 300,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            runs_dir: default_runs_dir(),
            active_dir: PathBuf::from("./proposals"),
        }
    }
}

/// `<config dir>/grant-forge/runs`, or `./runs` when the platform has no config dir.
pub fn default_runs_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("grant-forge").join("runs"))
        .unwrap_or_else(|| PathBuf::from("./runs"))
}

impl CliConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: CliConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if file doesn't exist
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Ok(Self::default()),
        }
    }
}
