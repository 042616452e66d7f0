use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::state::ViewState;
use crate::config::Config;
use crate::weather::types::{CurrentConditions, ForecastPoint, UnitSystem, WeatherCategory};

/// Forecast points are 3 hours apart, so 8 of them span a day.
pub const POINTS_PER_DAY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundImage {
    Sunny,
    Cloudy,
    Rainy,
    Storm,
    Snow,
    Foggy,
    Default,
}

impl BackgroundImage {
    pub fn file_name(&self) -> &'static str {
        match self {
            BackgroundImage::Sunny => "sunny.jpg",
            BackgroundImage::Cloudy => "cloudy.jpg",
            BackgroundImage::Rainy => "rainy.jpg",
            BackgroundImage::Storm => "storm.jpg",
            BackgroundImage::Snow => "snow.jpg",
            BackgroundImage::Foggy => "foggy.jpg",
            BackgroundImage::Default => "default.jpg",
        }
    }

    /// Painted under the image, visible when the asset is missing.
    pub fn fallback_color(&self) -> &'static str {
        match self {
            BackgroundImage::Sunny => "#f6d365",
            BackgroundImage::Cloudy => "#bdc3c7",
            BackgroundImage::Rainy => "#6a85b6",
            BackgroundImage::Storm => "#4b4e6d",
            BackgroundImage::Snow => "#e6f0fa",
            BackgroundImage::Foggy => "#cfd9df",
            BackgroundImage::Default => "#a1c4fd",
        }
    }
}

pub fn select_background(category: &WeatherCategory) -> BackgroundImage {
    match category {
        WeatherCategory::Clear => BackgroundImage::Sunny,
        WeatherCategory::Clouds => BackgroundImage::Cloudy,
        WeatherCategory::Rain | WeatherCategory::Drizzle => BackgroundImage::Rainy,
        WeatherCategory::Thunderstorm => BackgroundImage::Storm,
        WeatherCategory::Snow => BackgroundImage::Snow,
        WeatherCategory::Mist | WeatherCategory::Fog => BackgroundImage::Foggy,
        WeatherCategory::Other(_) => BackgroundImage::Default,
    }
}

/// One point per day: indices 0, 8, 16, ... counted from the series' first point.
pub fn downsample_forecast(series: &[ForecastPoint]) -> Vec<ForecastPoint> {
    series.iter().step_by(POINTS_PER_DAY).cloned().collect()
}

/// Rounds half-up, so 0.5 becomes 1 and -2.5 becomes -2.
pub fn round_temperature(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_temperature(value: f64, units: UnitSystem) -> String {
    format!("{} {}", round_temperature(value), units.suffix())
}

/// Localized weekday name. Timestamps outside chrono's range give an empty label.
pub fn format_day_label(timestamp_secs: i64, tz: &Tz, locale: Locale) -> String {
    match DateTime::from_timestamp(timestamp_secs, 0) {
        Some(utc) => utc.with_timezone(tz).format_localized("%A", locale).to_string(),
        None => String::new(),
    }
}

pub fn format_date_label(now: DateTime<Utc>, tz: &Tz, locale: Locale) -> String {
    now.with_timezone(tz).format_localized("%x", locale).to_string()
}

pub fn forecast_icon_url(base_url: &str, icon: &str) -> String {
    format!("{}/{}@2x.png", base_url.trim_end_matches('/'), icon)
}

/// Fixed presentation choices applied by [`project_view`].
#[derive(Debug, Clone)]
pub struct ProjectionSettings {
    pub timezone: Tz,
    pub locale: Locale,
    pub units: UnitSystem,
    pub icon_base_url: String,
    pub assets_prefix: String,
    pub forecast_heading: String,
}

impl ProjectionSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timezone = config
            .app_timezone
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", config.app_timezone))?;
        let locale = Locale::try_from(config.app_locale.as_str())
            .map_err(|_| anyhow::anyhow!("Invalid locale: {}", config.app_locale))?;

        Ok(Self {
            timezone,
            locale,
            units: config.units,
            icon_base_url: config.openweather_icon_base_url.clone(),
            assets_prefix: "/assets".to_string(),
            forecast_heading: config.forecast_heading.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub loading: bool,
    pub cards: Vec<CityCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityCard {
    pub city_index: usize,
    pub title: String,
    pub date_label: String,
    pub category: String,
    pub temperature: String,
    pub min_max: String,
    pub background: BackgroundView,
    pub forecast_heading: String,
    pub forecast: Vec<ForecastRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackgroundView {
    pub image: BackgroundImage,
    pub url: String,
    pub fallback_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastRow {
    pub timestamp: i64,
    pub day: String,
    pub temperature: String,
    pub category: String,
    pub icon_url: String,
}

pub fn project_view(state: &ViewState, settings: &ProjectionSettings, now: DateTime<Utc>) -> ViewModel {
    if state.loading {
        return ViewModel {
            loading: true,
            cards: Vec::new(),
        };
    }

    let date_label = format_date_label(now, &settings.timezone, settings.locale);
    let cards = state
        .current
        .iter()
        .zip(&state.forecasts)
        .enumerate()
        .map(|(index, (current, series))| project_card(index, current, series, &date_label, settings))
        .collect();

    ViewModel {
        loading: false,
        cards,
    }
}

fn project_card(
    city_index: usize,
    current: &CurrentConditions,
    series: &[ForecastPoint],
    date_label: &str,
    settings: &ProjectionSettings,
) -> CityCard {
    let image = select_background(&current.category);

    let forecast = downsample_forecast(series)
        .into_iter()
        .map(|point| ForecastRow {
            timestamp: point.timestamp,
            day: format_day_label(point.timestamp, &settings.timezone, settings.locale),
            temperature: format_temperature(point.temp, settings.units),
            category: point.category.to_string(),
            icon_url: forecast_icon_url(&settings.icon_base_url, &point.icon),
        })
        .collect();

    CityCard {
        city_index,
        title: format!("{}, {}", current.name, current.country),
        date_label: date_label.to_string(),
        category: current.category.to_string(),
        temperature: format_temperature(current.temp, settings.units),
        min_max: format!(
            "Min {} / Max {}",
            format_temperature(current.temp_min, settings.units),
            format_temperature(current.temp_max, settings.units)
        ),
        background: BackgroundView {
            image,
            url: format!("{}/{}", settings.assets_prefix, image.file_name()),
            fallback_color: image.fallback_color().to_string(),
        },
        forecast_heading: settings.forecast_heading.clone(),
        forecast,
    }
}
