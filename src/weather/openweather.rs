use super::types::*;
use super::WeatherSource;
use crate::config::Config;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("unusable payload: {0}")]
    Decode(#[from] DecodeError),
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    weather_path: String,
    forecast_path: String,
    api_key: String,
    units: UnitSystem,
}

impl OpenWeatherClient {
    pub fn new(config: &Config) -> Result<Self, WeatherApiError> {
        Self::with_timeout(config, config.request_timeout)
    }

    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, WeatherApiError> {
        let client = Client::builder()
            .user_agent(concat!("CityWeatherCards/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            weather_path: config.openweather_weather_path.clone(),
            forecast_path: config.openweather_forecast_path.clone(),
            api_key: config.openweather_api_key.clone(),
            units: config.units,
        })
    }

    pub async fn get_current(&self, city: &str) -> Result<CurrentConditions, WeatherApiError> {
        let raw: CurrentWeatherResponse = self.get_json(&self.weather_path, city).await?;
        Ok(CurrentConditions::try_from(raw)?)
    }

    pub async fn get_forecast(&self, city: &str) -> Result<ForecastSeries, WeatherApiError> {
        let raw: ForecastResponse = self.get_json(&self.forecast_path, city).await?;
        Ok(decode_forecast(raw)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        city: &str,
    ) -> Result<T, WeatherApiError> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!("GET {} for {}", url, city);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_query()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &City) -> Result<CurrentConditions, WeatherApiError> {
        self.get_current(&city.name).await
    }

    async fn forecast(&self, city: &City) -> Result<ForecastSeries, WeatherApiError> {
        self.get_forecast(&city.name).await
    }
}
