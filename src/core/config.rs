use crate::core::rate_table::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BACEN_URL: &str = "https://olinda.bcb.gov.br/olinda/servico/PTAX/versao/v1/odata";
pub const DEFAULT_ECB_URL: &str = "https://data-api.ecb.europa.eu/service";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BacenProviderConfig {
    pub base_url: String,
}

impl Default for BacenProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EcbProviderConfig {
    pub base_url: String,
}

impl Default for EcbProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ECB_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub bacen: BacenProviderConfig,
    #[serde(default)]
    pub ecb: EcbProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Days fetched before the earliest transaction so it has a prior quotation.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or the built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "fxledger")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.lookback_days <= MAX_LOOKBACK_DAYS,
            "lookback_days must be at most {MAX_LOOKBACK_DAYS}, got {}",
            self.lookback_days
        );
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}
