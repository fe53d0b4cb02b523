//! Process configuration.
//!
//! Task tiers and pricing live in an editable JSON models file so model or
//! price changes never need a code change. Credentials and tuning knobs come
//! from environment variables. Everything is loaded once into an
//! [`OrchestratorConfig`] and passed explicitly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::budget::{ModelPricing, PricingTable, TaskConfig, TaskRegistry};
use crate::llm::{GEMINI_API_URL, OPENROUTER_API_URL};
use crate::skills::DetailLevel;

/// Default location of the models file, relative to the working directory.
pub const DEFAULT_MODELS_FILE: &str = "config/models.json";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse models file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

/// Credentials and endpoints for both wire protocols.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: OPENROUTER_API_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: GEMINI_API_URL.to_string(),
        }
    }
}

impl ProviderSettings {
    /// Read from environment variables:
    /// - `OPENROUTER_API_KEY`, `OPENROUTER_BASE_URL`
    /// - `GEMINI_API_KEY`, `GEMINI_BASE_URL`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openrouter_api_key: non_empty_env("OPENROUTER_API_KEY"),
            openrouter_base_url: non_empty_env("OPENROUTER_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            gemini_api_key: non_empty_env("GEMINI_API_KEY"),
            gemini_base_url: non_empty_env("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
        }
    }
}

/// How hard the orchestrator tries before giving up on a model.
///
/// The default is one attempt per model with no backoff: the primary once,
/// then the fallback once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub attempts_per_model: u32,
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            attempts_per_model: 1,
            retry_backoff: Duration::ZERO,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FallbackPolicy {
    /// Read from `PLANCRAFT_TIMEOUT_SECS`, `PLANCRAFT_ATTEMPTS_PER_MODEL`
    /// and `PLANCRAFT_RETRY_BACKOFF_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout = parse_env::<u64>("PLANCRAFT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let attempts_per_model =
            parse_env::<u32>("PLANCRAFT_ATTEMPTS_PER_MODEL")?.unwrap_or(defaults.attempts_per_model);
        let retry_backoff = parse_env::<u64>("PLANCRAFT_RETRY_BACKOFF_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);

        if attempts_per_model == 0 {
            return Err(ConfigError::Env {
                var: "PLANCRAFT_ATTEMPTS_PER_MODEL",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            attempts_per_model,
            retry_backoff,
            timeout,
        })
    }
}

/// Everything the orchestration core needs, constructed once at startup.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub tasks: TaskRegistry,
    pub pricing: PricingTable,
    pub providers: ProviderSettings,
    pub fallback: FallbackPolicy,
    pub skills_dir: Option<PathBuf>,
    pub detail_level: DetailLevel,
}

/// On-disk shape of the models file.
#[derive(Debug, Deserialize)]
struct ModelsFile {
    tasks: HashMap<String, TaskConfig>,
    #[serde(default)]
    pricing: HashMap<String, ModelPricing>,
}

impl OrchestratorConfig {
    /// Load the models file named by `PLANCRAFT_MODELS_FILE` (or the default
    /// path) plus environment settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let models_path = non_empty_env("PLANCRAFT_MODELS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_FILE));

        let mut config = Self::from_models_file(&models_path)?;
        config.providers = ProviderSettings::from_env();
        config.fallback = FallbackPolicy::from_env()?;
        config.skills_dir = non_empty_env("PLANCRAFT_SKILLS_DIR").map(PathBuf::from);
        if let Some(level) = non_empty_env("PLANCRAFT_DETAIL_LEVEL") {
            config.detail_level = level.parse().map_err(|_| ConfigError::Env {
                var: "PLANCRAFT_DETAIL_LEVEL",
                value: level,
            })?;
        }
        Ok(config)
    }

    /// Load tasks and pricing from a models file, with default provider settings.
    pub fn from_models_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_models_json(&contents)?;
        tracing::info!(
            "Loaded {} tasks and {} priced models from {}",
            config.tasks.len(),
            config.pricing.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate a models document.
    pub fn from_models_json(json: &str) -> Result<Self, ConfigError> {
        let file: ModelsFile = serde_json::from_str(json)?;
        validate(&file)?;

        let pricing = PricingTable::new(file.pricing);
        let tasks = TaskRegistry::new(file.tasks);

        for task in tasks.iter() {
            for model in [&task.primary, &task.fallback] {
                if !pricing.is_priced(&model.id) {
                    tracing::warn!(
                        "Task {} uses unpriced model {}; its cost will be reported as zero",
                        task.name,
                        model.id
                    );
                }
            }
        }

        Ok(Self {
            tasks,
            pricing,
            ..Self::default()
        })
    }
}

fn validate(file: &ModelsFile) -> Result<(), ConfigError> {
    for (name, task) in &file.tasks {
        if task.primary.id.trim().is_empty() || task.fallback.id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "task {} has an empty model id",
                name
            )));
        }
        if task.primary == task.fallback {
            return Err(ConfigError::Invalid(format!(
                "task {} uses {} as both primary and fallback",
                name, task.primary.id
            )));
        }
        if task.max_tokens == 0 {
            return Err(ConfigError::Invalid(format!(
                "task {} has max_tokens = 0",
                name
            )));
        }
        if !(0.0..=2.0).contains(&task.temperature) {
            return Err(ConfigError::Invalid(format!(
                "task {} has temperature {} outside [0, 2]",
                name, task.temperature
            )));
        }
    }

    for (model, pricing) in &file.pricing {
        if !(pricing.input_per_million >= 0.0 && pricing.output_per_million >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "model {} has a negative price",
                model
            )));
        }
    }

    Ok(())
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match non_empty_env(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        None => Ok(None),
    }
}
