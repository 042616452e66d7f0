use super::openweather::WeatherApiError;
use super::types::*;
use super::WeatherSource;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SAMPLE_CATEGORIES: [(&str, &str); 6] = [
    ("Clear", "01d"),
    ("Clouds", "03d"),
    ("Rain", "10d"),
    ("Snow", "13d"),
    ("Mist", "50d"),
    ("Thunderstorm", "11d"),
];

/// In-memory source with canned data, injectable failures and per-city latency.
#[derive(Default)]
pub struct MockWeatherSource {
    current: HashMap<String, CurrentConditions>,
    forecasts: HashMap<String, ForecastSeries>,
    failing_current: HashSet<String>,
    failing_forecast: HashSet<String>,
    delays: HashMap<String, Duration>,
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
}

impl MockWeatherSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic data for every city: a 40-point, 3-hourly series starting at `now`.
    pub fn sample(cities: &[City], now: DateTime<Utc>) -> Self {
        let start = now.timestamp() - now.timestamp() % (3 * 3600);

        cities.iter().fold(Self::new(), |source, city| {
            let (main, _) = SAMPLE_CATEGORIES[city.index % SAMPLE_CATEGORIES.len()];
            let base_temp = 8.0 + 4.0 * (city.index as f64 * 1.3).sin() + city.index as f64;

            let current = CurrentConditions {
                name: city.name.clone(),
                country: "XX".to_string(),
                category: WeatherCategory::from(main),
                temp: base_temp,
                temp_min: base_temp - 3.0,
                temp_max: base_temp + 4.0,
            };

            let series = (0..40)
                .map(|step| {
                    let (main, icon) =
                        SAMPLE_CATEGORIES[(city.index + step / 8) % SAMPLE_CATEGORIES.len()];
                    // Diurnal swing over a 24h (8-step) cycle.
                    let swing = 3.0 * (step as f64 * std::f64::consts::PI / 4.0).sin();
                    ForecastPoint {
                        timestamp: start + (step as i64) * 3 * 3600,
                        temp: base_temp + swing,
                        category: WeatherCategory::from(main),
                        icon: icon.to_string(),
                    }
                })
                .collect();

            source.with_city(&city.name, current, series)
        })
    }

    pub fn with_city(mut self, name: &str, current: CurrentConditions, forecast: ForecastSeries) -> Self {
        self.current.insert(name.to_string(), current);
        self.forecasts.insert(name.to_string(), forecast);
        self
    }

    async fn respond<T: Clone>(
        &self,
        city: &City,
        failing: &HashSet<String>,
        data: &HashMap<String, T>,
    ) -> Result<T, WeatherApiError> {
        if let Some(delay) = self.delays.get(&city.name) {
            tokio::time::sleep(*delay).await;
        }

        if failing.contains(&city.name) {
            return Err(WeatherApiError::Api {
                status: 500,
                body: format!("mock failure for {}", city.name),
            });
        }

        data.get(&city.name)
            .cloned()
            .ok_or_else(|| WeatherApiError::Api {
                status: 404,
                body: "city not found".to_string(),
            })
    }
}

#[cfg(test)]
impl MockWeatherSource {
    pub fn fail_current(mut self, name: &str) -> Self {
        self.failing_current.insert(name.to_string());
        self
    }

    pub fn fail_forecast(mut self, name: &str) -> Self {
        self.failing_forecast.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for MockWeatherSource {
    async fn current(&self, city: &City) -> Result<CurrentConditions, WeatherApiError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(city, &self.failing_current, &self.current).await
    }

    async fn forecast(&self, city: &City) -> Result<ForecastSeries, WeatherApiError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(city, &self.failing_forecast, &self.forecasts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_sample_covers_every_city() {
        let cities = City::list(["Istanbul", "London", "Paris"]);
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 10, 30, 0).unwrap();
        let source = MockWeatherSource::sample(&cities, now);

        for city in &cities {
            let current = source.current(city).await.unwrap();
            assert_eq!(current.name, city.name);
            assert!(current.temp_min < current.temp && current.temp < current.temp_max);

            let series = source.forecast(city).await.unwrap();
            assert_eq!(series.len(), 40);
            assert!(series.windows(2).all(|w| w[1].timestamp - w[0].timestamp == 10_800));
            assert_eq!(series[0].timestamp % 10_800, 0);
        }
    }

    #[tokio::test]
    async fn test_unknown_city_and_injected_failure() {
        let cities = City::list(["Oslo", "Rome"]);
        let source = MockWeatherSource::sample(&cities[..1], Utc::now()).fail_forecast("Oslo");

        assert!(source.current(&cities[0]).await.is_ok());
        assert!(matches!(
            source.forecast(&cities[0]).await,
            Err(WeatherApiError::Api { status: 500, .. })
        ));
        assert!(matches!(
            source.current(&cities[1]).await,
            Err(WeatherApiError::Api { status: 404, .. })
        ));
        assert_eq!(source.current_calls(), 2);
        assert_eq!(source.forecast_calls(), 1);
    }
}
