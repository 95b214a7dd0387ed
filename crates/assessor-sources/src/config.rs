//! Configuration loading and source/sink factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use assessor_core::answer::ConfidenceScale;
use assessor_core::session::{ModeDurations, SessionConfig};
use assessor_core::traits::{NoopTelemetry, QuestionSource, TelemetrySink};

use crate::bank::BankSource;
use crate::http::HttpSource;
use crate::telemetry::{JsonlSink, TracingSink};

/// Where questions come from.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A TOML bank file or a directory of them.
    Bank { path: PathBuf },
    /// A remote question service.
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Bank { path } => f.debug_struct("Bank").field("path", path).finish(),
            SourceConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Where learning events go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TelemetryConfig {
    /// Append one JSON object per line to a file.
    Jsonl { path: PathBuf },
    /// Emit events as tracing records.
    #[default]
    Tracing,
    None,
}

/// Top-level assessor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessorConfig {
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub durations: ModeDurations,
    #[serde(default)]
    pub max_questions: Option<usize>,
    #[serde(default)]
    pub confidence_scale: ConfidenceScale,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./assessor-results")
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            source: None,
            durations: ModeDurations::default(),
            max_questions: None,
            confidence_scale: ConfidenceScale::default(),
            telemetry: TelemetryConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl AssessorConfig {
    /// Session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            durations: self.durations,
            max_questions: self.max_questions,
            confidence_scale: self.confidence_scale,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_source_config(config: &SourceConfig) -> SourceConfig {
    match config {
        SourceConfig::Bank { path } => SourceConfig::Bank {
            path: resolve_path(path),
        },
        SourceConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => SourceConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key
                .as_ref()
                .map(|k| resolve_env_vars(k))
                .filter(|k| !k.is_empty()),
            timeout_secs: *timeout_secs,
        },
    }
}

fn resolve_telemetry_config(config: &TelemetryConfig) -> TelemetryConfig {
    match config {
        TelemetryConfig::Jsonl { path } => TelemetryConfig::Jsonl {
            path: resolve_path(path),
        },
        other => other.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `assessor.toml` in the current directory
/// 2. `~/.config/assessor/config.toml`
///
/// Environment variable overrides: `ASSESSOR_BANK_URL`, `ASSESSOR_API_KEY`.
pub fn load_config() -> Result<AssessorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AssessorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("assessor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AssessorConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML config string and resolve `${VAR}` references.
pub fn parse_config(content: &str) -> Result<AssessorConfig> {
    let mut config: AssessorConfig = toml::from_str(content)?;
    config.source = config.source.as_ref().map(resolve_source_config);
    config.telemetry = resolve_telemetry_config(&config.telemetry);
    Ok(config)
}

fn apply_env_overrides(config: &mut AssessorConfig) {
    if let Ok(url) = std::env::var("ASSESSOR_BANK_URL") {
        match &mut config.source {
            Some(SourceConfig::Http { base_url, .. }) => *base_url = url,
            _ => {
                config.source = Some(SourceConfig::Http {
                    base_url: url,
                    api_key: None,
                    timeout_secs: default_timeout(),
                })
            }
        }
    }

    if let Ok(key) = std::env::var("ASSESSOR_API_KEY") {
        if let Some(SourceConfig::Http { api_key, .. }) = &mut config.source {
            *api_key = Some(key);
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("assessor"))
}

/// Create a question source from its configuration.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn QuestionSource>> {
    match config {
        SourceConfig::Bank { path } => Ok(Box::new(BankSource::open(path))),
        SourceConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => Ok(Box::new(HttpSource::new(
            base_url,
            api_key.clone(),
            *timeout_secs,
        )?)),
    }
}

/// Create a telemetry sink from its configuration.
pub fn create_telemetry(config: &TelemetryConfig) -> Result<Arc<dyn TelemetrySink>> {
    match config {
        TelemetryConfig::Jsonl { path } => Ok(Arc::new(JsonlSink::create(path)?)),
        TelemetryConfig::Tracing => Ok(Arc::new(TracingSink)),
        TelemetryConfig::None => Ok(Arc::new(NoopTelemetry)),
    }
}
