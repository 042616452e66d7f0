use super::openweather::WeatherApiError;
use super::types::{City, CurrentConditions, ForecastSeries};
use super::WeatherSource;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use thiserror::Error;

/// How the two request phases are scheduled relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Forecasts are requested only after every current-conditions request succeeded.
    Sequential,
    /// Both phases run at once. Alignment and failure semantics are unchanged.
    Concurrent,
}

impl FromStr for FetchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(FetchMode::Sequential),
            "concurrent" => Ok(FetchMode::Concurrent),
            other => anyhow::bail!("FETCH_MODE must be 'sequential' or 'concurrent', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Current,
    Forecast,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Current => f.write_str("current conditions"),
            FetchPhase::Forecast => f.write_str("forecast"),
        }
    }
}

/// The only failure the pipeline reports. Phase and city are kept for logs.
#[derive(Debug, Error)]
#[error("fetching {phase} for {city} failed: {source}")]
pub struct FetchBatchFailed {
    pub phase: FetchPhase,
    pub city: String,
    #[source]
    pub source: WeatherApiError,
}

/// Both result lists, index-aligned with the city list they were fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutput {
    current: Vec<CurrentConditions>,
    forecasts: Vec<ForecastSeries>,
}

impl FetchOutput {
    #[cfg(test)]
    pub(crate) fn from_parts(current: Vec<CurrentConditions>, forecasts: Vec<ForecastSeries>) -> Self {
        Self { current, forecasts }
    }

    pub fn into_parts(self) -> (Vec<CurrentConditions>, Vec<ForecastSeries>) {
        (self.current, self.forecasts)
    }
}

/// Awaits every future and returns their outputs in submission order.
///
/// The first error fails the whole batch; futures still pending at that point are dropped.
pub async fn join_all_or_fail<I, F, T, E>(operations: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    try_join_all(operations).await
}

async fn fetch_current_phase<S: WeatherSource>(
    source: &S,
    cities: &[City],
) -> Result<Vec<CurrentConditions>, FetchBatchFailed> {
    join_all_or_fail(cities.iter().map(|city| async move {
        source.current(city).await.map_err(|err| FetchBatchFailed {
            phase: FetchPhase::Current,
            city: city.name.clone(),
            source: err,
        })
    }))
    .await
}

async fn fetch_forecast_phase<S: WeatherSource>(
    source: &S,
    cities: &[City],
) -> Result<Vec<ForecastSeries>, FetchBatchFailed> {
    join_all_or_fail(cities.iter().map(|city| async move {
        source.forecast(city).await.map_err(|err| FetchBatchFailed {
            phase: FetchPhase::Forecast,
            city: city.name.clone(),
            source: err,
        })
    }))
    .await
}

/// Fetches current conditions and forecasts for every city, all or nothing.
pub async fn fetch_all<S: WeatherSource>(
    source: &S,
    cities: &[City],
    mode: FetchMode,
) -> Result<FetchOutput, FetchBatchFailed> {
    tracing::info!("Fetching weather for {} cities ({:?})", cities.len(), mode);

    let (current, forecasts) = match mode {
        FetchMode::Sequential => {
            let current = fetch_current_phase(source, cities).await?;
            tracing::debug!("Current conditions received for all {} cities", current.len());
            let forecasts = fetch_forecast_phase(source, cities).await?;
            (current, forecasts)
        }
        FetchMode::Concurrent => tokio::try_join!(
            fetch_current_phase(source, cities),
            fetch_forecast_phase(source, cities)
        )?,
    };

    tracing::info!(
        "Fetched {} current conditions and {} forecasts",
        current.len(),
        forecasts.len()
    );

    Ok(FetchOutput { current, forecasts })
}
