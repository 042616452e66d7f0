use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::weather::pipeline::FetchMode;
use crate::weather::types::UnitSystem;

const DEFAULT_CITIES: &str = "Istanbul,London,Paris,Tokyo,New York,Berlin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    OpenWeather,
    Mock,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_weather_path: String,
    pub openweather_forecast_path: String,
    pub openweather_icon_base_url: String,
    pub units: UnitSystem,
    pub request_timeout: Duration,
    pub cities: Vec<String>,
    pub source: SourceKind,
    pub fetch_mode: FetchMode,
    pub app_locale: String,
    pub app_timezone: String,
    pub forecast_heading: String,
    pub alert_title: String,
    pub alert_message: String,
    pub assets_dir: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let source = match var("WEATHER_SOURCE", "openweather").to_lowercase().as_str() {
            "openweather" => SourceKind::OpenWeather,
            "mock" => SourceKind::Mock,
            other => anyhow::bail!("WEATHER_SOURCE must be 'openweather' or 'mock', got '{}'", other),
        };

        let openweather_api_key = match (lookup("OPENWEATHER_API_KEY"), source) {
            (Some(key), _) if !key.trim().is_empty() => key,
            (_, SourceKind::Mock) => String::new(),
            _ => anyhow::bail!("OPENWEATHER_API_KEY not set"),
        };

        let units: UnitSystem = var("OPENWEATHER_UNITS", "metric").parse()?;

        let timeout_secs: u64 = var("OPENWEATHER_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| anyhow::anyhow!("OPENWEATHER_TIMEOUT_SECS must be a whole number of seconds"))?;

        let cities: Vec<String> = var("WEATHER_CITIES", DEFAULT_CITIES)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if cities.is_empty() {
            anyhow::bail!("WEATHER_CITIES must name at least one city");
        }

        let fetch_mode: FetchMode = var("FETCH_MODE", "sequential").parse()?;

        Ok(Config {
            openweather_api_key,
            openweather_base_url: var("OPENWEATHER_BASE_URL", "https://api.openweathermap.org"),
            openweather_weather_path: var("OPENWEATHER_WEATHER_PATH", "/data/2.5/weather"),
            openweather_forecast_path: var("OPENWEATHER_FORECAST_PATH", "/data/2.5/forecast"),
            openweather_icon_base_url: var(
                "OPENWEATHER_ICON_BASE_URL",
                "https://openweathermap.org/img/wn",
            ),
            units,
            request_timeout: Duration::from_secs(timeout_secs),
            cities,
            source,
            fetch_mode,
            app_locale: var("APP_LOCALE", "tr_TR"),
            app_timezone: var("APP_TIMEZONE", "Europe/Istanbul"),
            forecast_heading: var("FORECAST_HEADING", "5 Günlük Hava Tahmini"),
            alert_title: var("ALERT_TITLE", "Hata"),
            alert_message: var("ALERT_MESSAGE", "Veri alınırken bir sorun oluştu."),
            assets_dir: var("ASSETS_DIR", "./assets"),
            bind_addr: var("BIND_ADDR", "0.0.0.0:8080"),
        })
    }
}
