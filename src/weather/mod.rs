pub mod mock;
pub mod openweather;
pub mod pipeline;
pub mod types;

use std::future::Future;

use openweather::WeatherApiError;
use types::{City, CurrentConditions, ForecastSeries};

/// Where per-city conditions and forecasts come from.
///
/// Implemented by the live [`openweather::OpenWeatherClient`] and by
/// [`mock::MockWeatherSource`] for offline runs and tests.
pub trait WeatherSource: Send + Sync {
    fn current(
        &self,
        city: &City,
    ) -> impl Future<Output = Result<CurrentConditions, WeatherApiError>> + Send;

    fn forecast(
        &self,
        city: &City,
    ) -> impl Future<Output = Result<ForecastSeries, WeatherApiError>> + Send;
}
