//! Observable weather state and the fetch trigger that feeds it.
//!
//! The controller holds one slot: the last record that was applied, plus the
//! phase of the most recent fetch. Observers subscribe through a
//! [`tokio::sync::watch`] channel and see every change.

use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    Config,
    client::{WeatherClient, validate_city},
    error::FetchError,
    model::{UnitSystem, WeatherRecord},
};

/// Which outcome wins when fetches overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePolicy {
    /// Only the outcome of the most recently started fetch is applied.
    #[default]
    LatestRequest,
    /// Every outcome is applied in the order it resolves.
    LastResolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading { request: u64, city: String },
    Failed(FetchError),
}

/// Four-way summary of a [`WeatherState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Empty,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherState {
    record: Option<Arc<WeatherRecord>>,
    phase: Phase,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            record: None,
            phase: Phase::Idle,
        }
    }
}

impl WeatherState {
    /// The last applied record. A failed fetch never clears it.
    pub fn record(&self) -> Option<&Arc<WeatherRecord>> {
        self.record.as_ref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn status(&self) -> Status {
        match (&self.phase, &self.record) {
            (Phase::Loading { .. }, _) => Status::Loading,
            (Phase::Failed(_), _) => Status::Failed,
            (Phase::Idle, Some(_)) => Status::Loaded,
            (Phase::Idle, None) => Status::Empty,
        }
    }
}

/// Owns the observable weather state and issues fetches against a [`WeatherClient`].
///
/// Cloning is cheap; clones share the same state.
#[derive(Debug, Clone)]
pub struct WeatherController {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: Arc<dyn WeatherClient>,
    units: UnitSystem,
    policy: ResponsePolicy,
    sequence: AtomicU64,
    state: watch::Sender<WeatherState>,
}

impl WeatherController {
    pub fn new(client: Arc<dyn WeatherClient>, units: UnitSystem, policy: ResponsePolicy) -> Self {
        let (state, _) = watch::channel(WeatherState::default());

        Self {
            inner: Arc::new(Inner {
                client,
                units,
                policy,
                sequence: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub fn from_config(client: Arc<dyn WeatherClient>, config: &Config) -> Self {
        Self::new(client, config.units, config.response_policy)
    }

    pub fn units(&self) -> UnitSystem {
        self.inner.units
    }

    pub fn policy(&self) -> ResponsePolicy {
        self.inner.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.inner.state.borrow().clone()
    }

    /// Start a fetch for `city_name` in the background and return its task handle.
    ///
    /// `Loading` is published before this returns. Must be called within a tokio runtime.
    pub fn trigger(&self, city_name: impl Into<String>) -> JoinHandle<()> {
        let city = city_name.into();
        let request = self.begin(&city);
        let this = self.clone();

        tokio::spawn(async move {
            let _ = this.run(request, &city).await;
        })
    }

    /// Fetch `city_name` and wait for the outcome.
    ///
    /// The outcome is returned even when the policy discards it as stale. The fetch runs
    /// on its own task: dropping this future stops the wait, not the fetch, and the
    /// outcome is still published. Must be called within a tokio runtime.
    pub async fn refresh(&self, city_name: &str) -> Result<Arc<WeatherRecord>, FetchError> {
        let request = self.begin(city_name);
        let this = self.clone();
        let city = city_name.to_string();

        let cycle = tokio::spawn(async move { this.run(request, &city).await });
        match cycle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(FetchError::Transport {
                message: err.to_string(),
                timed_out: false,
            }),
        }
    }

    fn begin(&self, city: &str) -> u64 {
        let mut request = 0;
        self.inner.state.send_modify(|state| {
            request = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            state.phase = Phase::Loading {
                request,
                city: city.to_string(),
            };
        });
        debug!(request, city, "Fetch started");
        request
    }

    async fn run(&self, request: u64, city: &str) -> Result<Arc<WeatherRecord>, FetchError> {
        let outcome = match validate_city(city) {
            Ok(city) => self.inner.client.fetch(city, self.inner.units).await.map(Arc::new),
            Err(err) => Err(err),
        };

        self.apply(request, &outcome);
        outcome
    }

    fn apply(&self, request: u64, outcome: &Result<Arc<WeatherRecord>, FetchError>) -> bool {
        let inner = &self.inner;

        inner.state.send_if_modified(|state| {
            if inner.policy == ResponsePolicy::LatestRequest {
                let latest = inner.sequence.load(Ordering::SeqCst);
                if latest != request {
                    debug!(request, latest, "Discarding outcome of superseded fetch");
                    return false;
                }
            }

            match outcome {
                Ok(record) => {
                    info!(request, location = %record.location_name, "Weather updated");
                    state.record = Some(Arc::clone(record));
                    state.phase = Phase::Idle;
                }
                Err(err) => {
                    warn!(request, error = %err, "Weather fetch failed");
                    state.phase = Phase::Failed(err.clone());
                }
            }
            true
        })
    }
}
