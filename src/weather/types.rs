use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tracked city. Its identity is its position in the configured list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub index: usize,
    pub name: String,
}

impl City {
    pub fn list<I, S>(names: I) -> Vec<City>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| City {
                index,
                name: name.into(),
            })
            .collect()
    }
}

/// Coarse condition reported in `weather[0].main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherCategory {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Fog,
    Other(String),
}

impl WeatherCategory {
    pub fn as_str(&self) -> &str {
        match self {
            WeatherCategory::Clear => "Clear",
            WeatherCategory::Clouds => "Clouds",
            WeatherCategory::Rain => "Rain",
            WeatherCategory::Drizzle => "Drizzle",
            WeatherCategory::Thunderstorm => "Thunderstorm",
            WeatherCategory::Snow => "Snow",
            WeatherCategory::Mist => "Mist",
            WeatherCategory::Fog => "Fog",
            WeatherCategory::Other(raw) => raw,
        }
    }
}

impl From<&str> for WeatherCategory {
    fn from(raw: &str) -> Self {
        match raw {
            "Clear" => WeatherCategory::Clear,
            "Clouds" => WeatherCategory::Clouds,
            "Rain" => WeatherCategory::Rain,
            "Drizzle" => WeatherCategory::Drizzle,
            "Thunderstorm" => WeatherCategory::Thunderstorm,
            "Snow" => WeatherCategory::Snow,
            "Mist" => WeatherCategory::Mist,
            "Fog" => WeatherCategory::Fog,
            other => WeatherCategory::Other(other.to_string()),
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WeatherCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
    Standard,
}

impl UnitSystem {
    /// Value of the `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
            UnitSystem::Standard => "K",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown unit system '{0}', expected metric, imperial or standard")]
pub struct UnknownUnitSystem(String);

impl FromStr for UnitSystem {
    type Err = UnknownUnitSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            "standard" => Ok(UnitSystem::Standard),
            _ => Err(UnknownUnitSystem(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub name: String,
    pub country: String,
    pub category: WeatherCategory,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub temp: f64,
    pub category: WeatherCategory,
    pub icon: String,
}

/// 3-hourly points in upstream order.
pub type ForecastSeries = Vec<ForecastPoint>;

// Raw upstream payloads. Only the fields the viewer reads are declared.

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    pub name: String,
    pub sys: CurrentSys,
    pub weather: Vec<WeatherEntry>,
    pub main: MainReadings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSys {
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherEntry {
    pub main: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherEntry>,
}

/// A payload that parsed as JSON but cannot be displayed.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("'weather' array is empty{}", at_suffix(.0))]
    MissingWeather(Option<i64>),
    #[error("forecast entry at {0} has no icon")]
    MissingIcon(i64),
    #[error("temperature field '{0}' is not a finite number")]
    NonFiniteTemperature(&'static str),
}

fn at_suffix(dt: &Option<i64>) -> String {
    dt.map(|dt| format!(" for forecast entry at {}", dt))
        .unwrap_or_default()
}

fn finite(value: f64, field: &'static str) -> Result<f64, DecodeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DecodeError::NonFiniteTemperature(field))
    }
}

impl TryFrom<CurrentWeatherResponse> for CurrentConditions {
    type Error = DecodeError;

    fn try_from(raw: CurrentWeatherResponse) -> Result<Self, Self::Error> {
        let primary = raw.weather.first().ok_or(DecodeError::MissingWeather(None))?;

        Ok(Self {
            category: WeatherCategory::from(primary.main.as_str()),
            temp: finite(raw.main.temp, "temp")?,
            temp_min: finite(raw.main.temp_min, "temp_min")?,
            temp_max: finite(raw.main.temp_max, "temp_max")?,
            name: raw.name,
            country: raw.sys.country,
        })
    }
}

impl TryFrom<ForecastItem> for ForecastPoint {
    type Error = DecodeError;

    fn try_from(item: ForecastItem) -> Result<Self, Self::Error> {
        let primary = item
            .weather
            .into_iter()
            .next()
            .ok_or(DecodeError::MissingWeather(Some(item.dt)))?;
        let icon = primary.icon.ok_or(DecodeError::MissingIcon(item.dt))?;

        Ok(Self {
            timestamp: item.dt,
            temp: finite(item.main.temp, "temp")?,
            category: WeatherCategory::from(primary.main.as_str()),
            icon,
        })
    }
}

pub fn decode_forecast(raw: ForecastResponse) -> Result<ForecastSeries, DecodeError> {
    raw.list.into_iter().map(ForecastPoint::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn current_json() -> serde_json::Value {
        json!({
            "coord": { "lon": 28.95, "lat": 41.01 },
            "weather": [{ "id": 800, "main": "Clear", "description": "açık", "icon": "01d" }],
            "main": { "temp": 21.6, "feels_like": 21.0, "temp_min": 18.2, "temp_max": 24.9, "pressure": 1015, "humidity": 60 },
            "sys": { "country": "TR", "sunrise": 1700000000, "sunset": 1700040000 },
            "name": "Istanbul",
            "cod": 200
        })
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(WeatherCategory::from("Clear"), WeatherCategory::Clear);
        assert_eq!(WeatherCategory::from("Fog"), WeatherCategory::Fog);
        assert_eq!(
            WeatherCategory::from("Haze"),
            WeatherCategory::Other("Haze".to_string())
        );
        assert_eq!(WeatherCategory::from("Haze").as_str(), "Haze");
        // Matching is exact, like the upstream values.
        assert!(matches!(WeatherCategory::from("clear"), WeatherCategory::Other(_)));
    }

    #[test]
    fn test_city_list_preserves_order() {
        let cities = City::list(["Istanbul", "London", "Paris"]);
        assert_eq!(cities.len(), 3);
        assert_eq!(cities[2].index, 2);
        assert_eq!(cities[2].name, "Paris");
    }

    #[test]
    fn test_decode_current() {
        let raw: CurrentWeatherResponse = serde_json::from_value(current_json()).unwrap();
        let current = CurrentConditions::try_from(raw).unwrap();

        assert_eq!(current.name, "Istanbul");
        assert_eq!(current.country, "TR");
        assert_eq!(current.category, WeatherCategory::Clear);
        assert_eq!(current.temp, 21.6);
        assert_eq!(current.temp_min, 18.2);
        assert_eq!(current.temp_max, 24.9);
    }

    #[test]
    fn test_decode_current_without_weather() {
        let mut value = current_json();
        value["weather"] = json!([]);
        let raw: CurrentWeatherResponse = serde_json::from_value(value).unwrap();

        assert_eq!(
            CurrentConditions::try_from(raw),
            Err(DecodeError::MissingWeather(None))
        );
    }

    #[test]
    fn test_shape_mismatch_is_json_error() {
        let mut value = current_json();
        value["main"] = json!({ "temp": "warm" });
        assert!(serde_json::from_value::<CurrentWeatherResponse>(value).is_err());
    }

    #[test]
    fn test_decode_forecast() {
        let raw: ForecastResponse = serde_json::from_value(json!({
            "cod": "200",
            "cnt": 2,
            "list": [
                { "dt": 1700000000, "main": { "temp": 10.4, "temp_min": 9.0, "temp_max": 11.0 },
                  "weather": [{ "main": "Rain", "icon": "10d" }] },
                { "dt": 1700010800, "main": { "temp": 8.0, "temp_min": 7.5, "temp_max": 8.1 },
                  "weather": [{ "main": "Snow", "icon": "13n" }] }
            ]
        }))
        .unwrap();

        let series = decode_forecast(raw).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, 1700000000);
        assert_eq!(series[0].category, WeatherCategory::Rain);
        assert_eq!(series[1].icon, "13n");
    }

    #[test]
    fn test_decode_forecast_missing_icon() {
        let raw: ForecastResponse = serde_json::from_value(json!({
            "list": [
                { "dt": 42, "main": { "temp": 1.0, "temp_min": 1.0, "temp_max": 1.0 },
                  "weather": [{ "main": "Clear" }] }
            ]
        }))
        .unwrap();

        assert_eq!(decode_forecast(raw), Err(DecodeError::MissingIcon(42)));
    }

    #[test]
    fn test_unit_system() {
        assert_eq!("Metric".parse::<UnitSystem>().unwrap(), UnitSystem::Metric);
        assert_eq!(UnitSystem::Imperial.suffix(), "°F");
        assert_eq!(UnitSystem::Standard.as_query(), "standard");
        assert!("celsius".parse::<UnitSystem>().is_err());
    }
}
