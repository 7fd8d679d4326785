use migralog_core::{AnalysisConfig, CoreError, Location};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "MIGRALOG_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "migralog.toml";
pub const DEFAULT_METEOSTAT_URL: &str = "https://meteostat.p.rapidapi.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    pub postal_code: Option<String>,
    /// ISO country code used to filter gazetteer rows
    pub country: Option<String>,
    /// GeoNames postal-code TSV
    pub gazetteer: Option<PathBuf>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    /// Postal code -> coordinates, checked before the gazetteer
    #[serde(default)]
    pub postal_codes: HashMap<String, Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MeteostatConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    /// Meteostat bulk daily CSV
    pub csv: Option<PathBuf>,
    pub meteostat: Option<MeteostatConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub location: Option<LocationConfig>,
    pub weather: Option<WeatherConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid analysis settings: {0}")]
    Analysis(#[from] CoreError),
}

impl AppConfig {
    /// Load configuration from the MIGRALOG_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&path).exists() {
            Self::load_from(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load and validate a specific file; a missing file is an error here
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.analysis.validate()?;
        Ok(cfg)
    }

    /// Report output directory (default ./report)
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .as_ref()
            .and_then(|o| o.dir.clone())
            .unwrap_or_else(|| PathBuf::from("report"))
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|l| l.postal_code.as_deref())
    }

    /// Coordinates pinned directly in the config, bypassing geocoding
    pub fn fixed_location(&self) -> Option<Location> {
        let loc = self.location.as_ref()?;
        Some(Location {
            latitude: loc.latitude?,
            longitude: loc.longitude?,
            elevation: loc.elevation,
        })
    }

    pub fn weather_csv(&self) -> Option<&Path> {
        self.weather.as_ref().and_then(|w| w.csv.as_deref())
    }

    pub fn meteostat(&self) -> Option<&MeteostatConfig> {
        self.weather.as_ref().and_then(|w| w.meteostat.as_ref())
    }
}

impl MeteostatConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_METEOSTAT_URL)
    }

    /// Per-request timeout (default 30s)
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    /// Extra attempts after the first failure (default 2)
    pub fn retries(&self) -> u32 {
        self.retries.unwrap_or(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migralog_core::ValidityPolicy;
    use std::io::Write;

    #[test]
    fn default_output_dir_is_report() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.output_dir(), PathBuf::from("report"));
        assert_eq!(cfg.analysis.baseline_month, 11);
        assert!(cfg.fixed_location().is_none());
    }

    #[test]
    fn parses_full_file() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [analysis]
            baseline_month = 1
            validity = "warn"
            pressure_delta = 8.5

            [location]
            postal_code = "28105"
            country = "US"
            latitude = 35.11
            longitude = -80.71

            [location.postal_codes.28105]
            latitude = 35.11
            longitude = -80.71

            [weather]
            csv = "weather.csv"

            [weather.meteostat]
            api_key = "secret"
            timeout_secs = 5

            [output]
            dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.analysis.baseline_month, 1);
        assert_eq!(cfg.analysis.validity, ValidityPolicy::Warn);
        assert_eq!(cfg.analysis.pressure_delta, 8.5);
        assert_eq!(cfg.analysis.min_cell_count, 5);
        assert_eq!(cfg.postal_code(), Some("28105"));
        assert_eq!(cfg.fixed_location().unwrap().latitude, 35.11);
        assert!(cfg.location.as_ref().unwrap().postal_codes.contains_key("28105"));
        assert_eq!(cfg.weather_csv(), Some(Path::new("weather.csv")));
        assert_eq!(cfg.output_dir(), PathBuf::from("out"));
    }

    #[test]
    fn meteostat_defaults() {
        let m = MeteostatConfig::default();
        assert_eq!(m.base_url(), DEFAULT_METEOSTAT_URL);
        assert_eq!(m.timeout(), Duration::from_secs(30));
        assert_eq!(m.retries(), 2);
    }

    #[test]
    fn rejects_invalid_baseline_month() {
        let err = AppConfig::from_toml_str("[analysis]\nbaseline_month = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Analysis(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndir = \"elsewhere\"").unwrap();
        let cfg = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.output_dir(), PathBuf::from("elsewhere"));
    }
}
