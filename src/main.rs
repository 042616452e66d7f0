use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod routes;
mod view;
mod weather;

use config::{Config, SourceKind};
use routes::{create_router, AppState};
use view::projector::ProjectionSettings;
use view::state::{AlertText, ViewStore};
use weather::mock::MockWeatherSource;
use weather::openweather::OpenWeatherClient;
use weather::pipeline::FetchMode;
use weather::types::City;
use weather::WeatherSource;

/// Runs the one-shot load in the background. It stops without writing if `cancel` fires.
fn spawn_initial_load<S>(
    source: S,
    store: Arc<ViewStore>,
    cities: Vec<City>,
    mode: FetchMode,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: WeatherSource + 'static,
{
    tokio::spawn(async move {
        store.load(&source, &cities, mode, &cancel).await;
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_weather_cards=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = Arc::new(ProjectionSettings::from_config(&config)?);
    let cities = City::list(config.cities.clone());

    let store = Arc::new(ViewStore::new(AlertText {
        title: config.alert_title.clone(),
        message: config.alert_message.clone(),
    }));
    let cancel = CancellationToken::new();

    tracing::info!(
        "Tracking {} cities from {:?} source",
        cities.len(),
        config.source
    );

    let load = match config.source {
        SourceKind::OpenWeather => spawn_initial_load(
            OpenWeatherClient::new(&config)?,
            store.clone(),
            cities,
            config.fetch_mode,
            cancel.clone(),
        ),
        SourceKind::Mock => spawn_initial_load(
            MockWeatherSource::sample(&cities, chrono::Utc::now()),
            store.clone(),
            cities,
            config.fetch_mode,
            cancel.clone(),
        ),
    };

    let mut updates = store.subscribe();
    tokio::spawn(async move {
        if updates.changed().await.is_ok() {
            let settled = updates.borrow_and_update().current.len();
            tracing::info!("View ready with {} city cards", settled);
        }
    });

    let state = AppState { store, settings };

    let app = create_router(state, &config.assets_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server starting on http://{}", config.bind_addr);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    load.await?;

    Ok(())
}
