use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::weather::pipeline::{fetch_all, FetchBatchFailed, FetchMode, FetchOutput};
use crate::weather::types::{City, CurrentConditions, ForecastSeries};
use crate::weather::WeatherSource;

/// Everything the screen renders from. `current[i]` and `forecasts[i]` describe the same city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub loading: bool,
    pub current: Vec<CurrentConditions>,
    pub forecasts: Vec<ForecastSeries>,
}

impl ViewState {
    pub fn initial() -> Self {
        Self {
            loading: true,
            current: Vec::new(),
            forecasts: Vec::new(),
        }
    }

    fn failed() -> Self {
        Self {
            loading: false,
            current: Vec::new(),
            forecasts: Vec::new(),
        }
    }
}

/// User-facing text for the failure notification.
#[derive(Debug, Clone)]
pub struct AlertText {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Transition {
    pub state: ViewState,
    pub alert: Option<Alert>,
}

/// Reducer for the one transition the view ever makes: loading → loaded or loading → failed.
///
/// A result arriving after the state already left `loading` is ignored.
pub fn apply_fetch_result(
    state: &ViewState,
    result: Result<FetchOutput, FetchBatchFailed>,
    text: &AlertText,
    now: DateTime<Utc>,
) -> Transition {
    if !state.loading {
        tracing::warn!("Ignoring fetch result for a view that is no longer loading");
        return Transition {
            state: state.clone(),
            alert: None,
        };
    }

    match result {
        Ok(output) => {
            let (current, forecasts) = output.into_parts();
            Transition {
                state: ViewState {
                    loading: false,
                    current,
                    forecasts,
                },
                alert: None,
            }
        }
        Err(e) => {
            tracing::error!("Weather fetch failed: {}", e);
            Transition {
                state: ViewState::failed(),
                alert: Some(Alert {
                    title: text.title.clone(),
                    message: text.message.clone(),
                    raised_at: now,
                }),
            }
        }
    }
}

/// Holds the published `ViewState` and the alerts raised so far.
///
/// Readers only ever see whole snapshots: the state is replaced in a single `watch` send.
pub struct ViewStore {
    state: watch::Sender<ViewState>,
    alerts: Mutex<Vec<Alert>>,
    alert_text: AlertText,
}

impl ViewStore {
    pub fn new(alert_text: AlertText) -> Self {
        let (state, _) = watch::channel(ViewState::initial());
        Self {
            state,
            alerts: Mutex::new(Vec::new()),
            alert_text,
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn apply(&self, result: Result<FetchOutput, FetchBatchFailed>) {
        let mut raised = None;
        self.state.send_modify(|state| {
            let transition = apply_fetch_result(state, result, &self.alert_text, Utc::now());
            *state = transition.state;
            raised = transition.alert;
        });

        if let Some(alert) = raised {
            self.alerts.lock().push(alert);
        }
    }

    /// Runs the fetch pipeline once and publishes its outcome.
    ///
    /// Returns `false` if `cancel` fired first; the state is then left untouched.
    pub async fn load<S: WeatherSource>(
        &self,
        source: &S,
        cities: &[City],
        mode: FetchMode,
        cancel: &CancellationToken,
    ) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Weather load cancelled before completion");
                false
            }
            result = fetch_all(source, cities, mode) => {
                self.apply(result);
                true
            }
        }
    }
}
