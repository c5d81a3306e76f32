use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use autodial::sequencer::SequencerConfig;

pub const DEFAULT_SHEET_ID: &str = "1UuE_F_zRG2SbHqJL5EZz9g8-9Rr75gUCEBwhLn3jtTg";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialer: DialerConfig,
    pub endpoints: EndpointsConfig,
    pub bridge: BridgeConfig,
    pub storage: StorageConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    pub interval_secs: u64,
    pub post_call_interval_secs: u64,
    pub dnc_countdown_secs: u32,
    pub countdown_tick_ms: u64,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            post_call_interval_secs: 12,
            dnc_countdown_secs: 3,
            countdown_tick_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub dnc_url: String,
    pub reports_url: String,
    pub sms_api_url: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            dnc_url: "https://subd.nocollateralloan.org/dnc.txt".to_string(),
            reports_url: "https://subd.nocollateralloan.org/reports".to_string(),
            sms_api_url: Some("https://api.sms-service.com/send".to_string()),
            request_timeout_ms: 15000,
        }
    }
}

impl EndpointsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host bridge socket; without one calls fall back to `tel:` links
    pub socket_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("autodial"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub sheet_id: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Sequencer timing, optionally overriding the dial interval
    pub fn sequencer(&self, interval_override: Option<u64>) -> SequencerConfig {
        SequencerConfig::default()
            .with_interval(interval_override.unwrap_or(self.dialer.interval_secs))
            .with_post_call_interval(self.dialer.post_call_interval_secs)
            .with_countdown(
                self.dialer.dnc_countdown_secs,
                Duration::from_millis(self.dialer.countdown_tick_ms),
            )
            .with_default_sheet_id(&self.defaults.sheet_id)
    }
}
