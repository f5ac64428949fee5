use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

// ---------------------------------------------------------------------------
// Gateway section
// ---------------------------------------------------------------------------

/// Connection settings for the external data feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the Government Data Gateway (weather / market / soil).
    pub gateway_url: String,
    /// Base URL of the Base Recommendation Provider.
    pub provider_url: String,
    /// Per-request timeout. A stalled upstream call converts into the
    /// fallback path instead of blocking the pipeline.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8600".into(),
            provider_url: "http://localhost:8601".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine section
// ---------------------------------------------------------------------------

/// Scoring and training constants of the fusion engine.
///
/// These are configuration rather than code so deployments can tune them and
/// tests can pin them. The defaults are the documented contract values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weight of the baseline suitability score in the composite.
    pub baseline_weight: f64,
    /// Historical component when fewer than `min_history_attempts` exist.
    pub neutral_history: f64,
    /// Attempts required before historical success rate is trusted.
    pub min_history_attempts: u32,
    /// Attempts granting the full historical confidence bonus.
    pub strong_history_attempts: u32,
    /// Maximum number of recommendations in a report.
    pub top_n: usize,
    /// Training-set size below which `train()` refuses to run.
    pub min_training_samples: usize,
    /// Retrain after this many accepted feedback records.
    pub retrain_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_weight: 0.60,
            neutral_history: 7.5,
            min_history_attempts: 3,
            strong_history_attempts: 10,
            top_n: 8,
            min_training_samples: 50,
            retrain_interval: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// FasalConfig
// ---------------------------------------------------------------------------

/// Service configuration stored at `~/.fasal/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FasalConfig {
    pub gateway: GatewayConfig,
    pub engine: EngineConfig,
    /// Override for the advisory database path. `None` means
    /// `~/.fasal/advisory.db`.
    pub db_path: Option<PathBuf>,
}

impl FasalConfig {
    /// Returns the base config directory: `~/.fasal/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".fasal"))
    }

    /// Returns the config file path: `~/.fasal/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.fasal/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Resolved path of the advisory database.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::base_dir()?.join("advisory.db")),
        }
    }

    /// Load the configuration, falling back to defaults when the file is
    /// missing or unreadable. A malformed file is logged and replaced by
    /// defaults rather than failing startup.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path (used by tests and embedders).
    pub fn load_from(path: &PathBuf) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Malformed config at {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration as pretty-printed JSON.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}
