use axum::{extract::State, response::Html, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::view::{
    projector::{project_view, ProjectionSettings, ViewModel},
    render::render_page,
    state::{Alert, ViewStore},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ViewStore>,
    pub settings: Arc<ProjectionSettings>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub loading: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        loading: state.store.snapshot().loading,
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewModel> {
    let snapshot = state.store.snapshot();
    Json(project_view(&snapshot, &state.settings, chrono::Utc::now()))
}

pub async fn get_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.store.alerts())
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.store.snapshot();
    let model = project_view(&snapshot, &state.settings, chrono::Utc::now());
    Html(render_page(&model, &state.store.alerts()))
}

pub fn create_router(state: AppState, assets_dir: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/view", get(get_view))
        .route("/api/alerts", get(get_alerts))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::state::AlertText;
    use crate::weather::mock::MockWeatherSource;
    use crate::weather::pipeline::FetchMode;
    use crate::weather::types::{City, UnitSystem};
    use chrono::Locale;
    use tokio_util::sync::CancellationToken;

    fn app_state() -> AppState {
        AppState {
            store: Arc::new(ViewStore::new(AlertText {
                title: "Hata".to_string(),
                message: "Veri alınırken bir sorun oluştu.".to_string(),
            })),
            settings: Arc::new(ProjectionSettings {
                timezone: chrono_tz::Europe::Istanbul,
                locale: Locale::tr_TR,
                units: UnitSystem::Metric,
                icon_base_url: "https://openweathermap.org/img/wn".to_string(),
                assets_prefix: "/assets".to_string(),
                forecast_heading: "5 Günlük Hava Tahmini".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_view_before_and_after_load() {
        let state = app_state();

        let Json(before) = get_view(State(state.clone())).await;
        assert!(before.loading);
        assert!(before.cards.is_empty());

        let cities = City::list(["Istanbul", "London", "Paris"]);
        let source = MockWeatherSource::sample(&cities, chrono::Utc::now());
        state
            .store
            .load(&source, &cities, FetchMode::Sequential, &CancellationToken::new())
            .await;

        let Json(after) = get_view(State(state.clone())).await;
        assert!(!after.loading);
        assert_eq!(after.cards.len(), 3);
        assert!(after.cards.iter().all(|card| card.forecast.len() == 5));

        let Json(status) = health(State(state.clone())).await;
        assert!(!status.loading);
    }

    #[tokio::test]
    async fn test_alerts_and_page_after_failure() {
        let state = app_state();
        let cities = City::list(["Istanbul", "London"]);
        let source = MockWeatherSource::sample(&cities, chrono::Utc::now()).fail_current("Istanbul");
        state
            .store
            .load(&source, &cities, FetchMode::Concurrent, &CancellationToken::new())
            .await;

        let Json(alerts) = get_alerts(State(state.clone())).await;
        assert_eq!(alerts.len(), 1);

        let Html(page) = index(State(state)).await;
        assert!(page.contains("Veri alınırken bir sorun oluştu."));
        assert!(!page.contains("class=\"spinner\""));
    }
}
