use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::detection::DEFAULT_MAX_VELOCITY_KMH;
use crate::output::OutputFormat;

/// Configuration for the travel detection daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// Login history storage
    pub storage: StorageConfig,
    /// GeoIP database
    pub geoip: GeoIpConfig,
    /// Detection rules configuration
    pub detection: DetectionConfig,
    /// Audit output for suspicious travel
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8080"
    pub bind_address: String,
    /// Path accepting login events
    pub path: String,
    /// Worker threads; the number of CPUs when absent
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// MaxMind GeoLite2-City database file
    pub database_path: PathBuf,
}

/// Detection rules configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum plausible travel speed in km/h
    pub max_velocity_kmh: f64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write suspicious verdicts to the audit output
    pub enabled: bool,
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path (stdout when absent)
    pub file_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            enabled: false,
            format: "jsonl".to_string(),
            file_path: Some(PathBuf::from("suspicious_travel.jsonl")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                path: "/v1/".to_string(),
                workers: None,
            },
            storage: StorageConfig {
                database_path: PathBuf::from("data.db"),
            },
            geoip: GeoIpConfig {
                database_path: PathBuf::from("geo/GeoLite2-City.mmdb"),
            },
            detection: DetectionConfig {
                max_velocity_kmh: DEFAULT_MAX_VELOCITY_KMH,
            },
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings the daemon cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let max_velocity = self.detection.max_velocity_kmh;
        if !max_velocity.is_finite() || max_velocity <= 0.0 {
            return Err(format!(
                "detection.max_velocity_kmh must be a positive number, got {}",
                max_velocity
            ));
        }
        if !self.server.path.starts_with('/') {
            return Err(format!("server.path must start with '/', got {:?}", self.server.path));
        }
        if self.server.workers == Some(0) {
            return Err("server.workers must be at least 1".to_string());
        }
        self.output
            .format
            .parse::<OutputFormat>()
            .map_err(|e| format!("output.format: {}", e))?;
        Ok(())
    }
}
