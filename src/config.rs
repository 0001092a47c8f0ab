//! Configuration management for fraud scoring

use crate::models::adapter::OutputShape;
use crate::types::{ModelKey, RiskBandThresholds};
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub scoring: ScoringConfig,
    pub presentation: PresentationConfig,
    pub logging: LoggingConfig,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory containing the ONNX model files
    pub models_dir: String,
    /// Number of threads for ONNX inference per model
    pub onnx_threads: usize,
    /// Artifact file name per model key (default: `<key>.onnx`)
    pub artifacts: HashMap<String, String>,
    /// Output shape per model key (default: `svc` named, others positional)
    pub outputs: HashMap<String, OutputShape>,
    /// Class names for class ids 0 and 1 in map-shaped outputs
    pub class_labels: Vec<String>,
}

impl ModelsConfig {
    /// Artifact path of one model
    pub fn artifact_path(&self, key: ModelKey) -> PathBuf {
        let file = self
            .artifacts
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| format!("{}.onnx", key));
        Path::new(&self.models_dir).join(file)
    }

    /// Output shape of one model
    pub fn output_shape(&self, key: ModelKey) -> OutputShape {
        self.outputs
            .get(key.as_str())
            .copied()
            .unwrap_or_else(|| default_output_shape(key))
    }
}

/// The SVC export reports `{non_fraud, fraud}`; the rest report `[normal, fraud]`.
fn default_output_shape(key: ModelKey) -> OutputShape {
    match key {
        ModelKey::Svc => OutputShape::Named,
        _ => OutputShape::Positional,
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: "model".to_string(),
            onnx_threads: 1,
            artifacts: HashMap::new(),
            outputs: HashMap::new(),
            class_labels: vec!["non_fraud".to_string(), "fraud".to_string()],
        }
    }
}

/// Decision thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Mean fraud probability above which the aggregate alert is raised
    pub alert_threshold: f64,
    /// Fraud probability above which a single model's verdict is FRAUDE
    pub model_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 0.5,
            model_threshold: 0.5,
        }
    }
}

/// Report rendering configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PresentationConfig {
    /// Gauge colour bands for the mean fraud probability
    pub risk_bands: RiskBandThresholds,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config/config.toml` and `FRAUD_SCORING__*` variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path; a missing file yields defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("FRAUD_SCORING").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("scoring.alert_threshold", self.scoring.alert_threshold),
            ("scoring.model_threshold", self.scoring.model_threshold),
            ("presentation.risk_bands.low", self.presentation.risk_bands.low),
            ("presentation.risk_bands.high", self.presentation.risk_bands.high),
        ] {
            ensure!((0.0..=1.0).contains(&value), "{} must be within [0, 1], got {}", name, value);
        }
        ensure!(
            self.presentation.risk_bands.low <= self.presentation.risk_bands.high,
            "presentation.risk_bands.low must not exceed presentation.risk_bands.high"
        );
        ensure!(self.models.onnx_threads > 0, "models.onnx_threads must be at least 1");
        ensure!(
            self.models.class_labels.len() == 2,
            "models.class_labels must name exactly two classes"
        );
        for key in self.models.artifacts.keys().chain(self.models.outputs.keys()) {
            key.parse::<ModelKey>()
                .map_err(|e| anyhow::anyhow!("models: {}", e))?;
        }
        Ok(())
    }
}
