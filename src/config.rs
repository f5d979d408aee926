//! Endpoint and credential configuration.
//!
//! Config is a small JSON document; every key is optional and falls back to
//! the defaults below, so a file only has to name what it changes.
use crate::gateway::{Capability, Endpoint};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current schema version for `config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "AGRO_CONFIG";
/// Environment overrides for lookup credentials.
pub const WEATHER_KEY_ENV: &str = "AGRO_WEATHER_API_KEY";
pub const GEOCODE_TOKEN_ENV: &str = "AGRO_GEOCODE_TOKEN";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointsConfig {
    pub weather: String,
    pub geocode: String,
    pub crop: String,
    pub nutrient: String,
    pub fertilizer: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            weather: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            geocode: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
            crop: "http://localhost:5000/predict".to_string(),
            nutrient: "http://localhost:5001/predict".to_string(),
            fertilizer: "http://localhost:5002/predict".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub schema_version: u32,
    pub endpoints: EndpointsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocode_token: Option<String>,
    /// Whole-request timeout; `null` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        default_config()
    }
}

impl PipelineConfig {
    pub fn endpoint(&self, capability: Capability) -> Endpoint {
        let urls = &self.endpoints;
        match capability {
            Capability::Weather => {
                Endpoint::new(&urls.weather).with_credential(self.weather_api_key.clone())
            }
            Capability::Geocode => {
                Endpoint::new(&urls.geocode).with_credential(self.geocode_token.clone())
            }
            Capability::Crop => Endpoint::new(&urls.crop),
            Capability::Nutrient => Endpoint::new(&urls.nutrient),
            Capability::Fertilizer => Endpoint::new(&urls.fertilizer),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Copy safe to print: credentials replaced by a marker.
    pub fn redacted(&self) -> PipelineConfig {
        let mask = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        PipelineConfig {
            weather_api_key: mask(&self.weather_api_key),
            geocode_token: mask(&self.geocode_token),
            ..self.clone()
        }
    }
}

/// Build the config used when no file is present.
pub fn default_config() -> PipelineConfig {
    PipelineConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        endpoints: EndpointsConfig::default(),
        weather_api_key: None,
        geocode_token: None,
        timeout_ms: Some(DEFAULT_TIMEOUT_MS),
    }
}

/// `<config dir>/agro-pipeline/config.json`, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("agro-pipeline").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Resolve the effective config.
///
/// Order: `explicit`, then `AGRO_CONFIG`, then the platform config path if
/// the file exists, then defaults. Credential env vars win over any file.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let path = explicit
        .map(Path::to_path_buf)
        .or(env_path)
        .or_else(|| default_config_path().filter(|path| path.is_file()));

    let mut config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)?
        }
        None => default_config(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Overlay credential variables; `lookup` stands in for `std::env::var`.
pub fn apply_env_overrides(config: &mut PipelineConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    if let Some(key) = non_empty(WEATHER_KEY_ENV) {
        config.weather_api_key = Some(key);
    }
    if let Some(token) = non_empty(GEOCODE_TOKEN_ENV) {
        config.geocode_token = Some(token);
    }
}

pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    let urls = &config.endpoints;
    for (label, value) in [
        ("weather", &urls.weather),
        ("geocode", &urls.geocode),
        ("crop", &urls.crop),
        ("nutrient", &urls.nutrient),
        ("fertilizer", &urls.fertilizer),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("endpoints.{label} must be non-empty"));
        }
        url::Url::parse(value)
            .with_context(|| format!("endpoints.{label} is not a valid URL ({value:?})"))?;
    }
    if config.timeout_ms == Some(0) {
        return Err(anyhow!("timeout_ms must be positive (use null to disable)"));
    }
    Ok(())
}

/// Pretty JSON for `agro config`, with credentials redacted.
pub fn render_config(config: &PipelineConfig) -> Result<String> {
    serde_json::to_string_pretty(&config.redacted()).context("serialize config")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
