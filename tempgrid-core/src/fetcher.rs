//! Loading state for one forecast screen.
//!
//! State moves only through [`FetchState::apply`]. [`ForecastFetcher`] owns
//! the provider and publishes every transition on a `watch` channel, so
//! observers see `Idle → Loading → Loaded | Failed` without sharing mutable
//! fields.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, ForecastResponse},
    provider::ForecastProvider,
};

#[derive(Debug, Clone, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading {
        previous: Option<Arc<ForecastResponse>>,
    },
    Loaded(Arc<ForecastResponse>),
    Failed {
        error: Arc<FetchError>,
        /// Last forecast that decoded successfully, kept across failures.
        previous: Option<Arc<ForecastResponse>>,
    },
}

#[derive(Debug, Clone)]
pub enum FetchEvent {
    Started,
    Succeeded(Arc<ForecastResponse>),
    Failed(Arc<FetchError>),
    /// The in-flight request was dropped before it finished.
    Cancelled,
}

impl FetchState {
    pub fn apply(self, event: FetchEvent) -> FetchState {
        match event {
            FetchEvent::Started => FetchState::Loading { previous: self.into_forecast() },
            FetchEvent::Succeeded(forecast) => FetchState::Loaded(forecast),
            FetchEvent::Failed(error) => {
                FetchState::Failed { error, previous: self.into_forecast() }
            }
            FetchEvent::Cancelled => match self {
                FetchState::Loading { previous: Some(forecast) } => FetchState::Loaded(forecast),
                FetchState::Loading { previous: None } => FetchState::Idle,
                other => other,
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    /// The most recent decoded forecast, if any, regardless of state.
    pub fn forecast(&self) -> Option<&Arc<ForecastResponse>> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { previous } | FetchState::Failed { previous, .. } => {
                previous.as_ref()
            }
            FetchState::Loaded(forecast) => Some(forecast),
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn into_forecast(self) -> Option<Arc<ForecastResponse>> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { previous } | FetchState::Failed { previous, .. } => previous,
            FetchState::Loaded(forecast) => Some(forecast),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<ForecastResponse>),
    Failed(Arc<FetchError>),
    /// Another load was outstanding; this call did nothing.
    AlreadyInFlight,
}

#[derive(Debug)]
pub struct ForecastFetcher {
    provider: Box<dyn ForecastProvider>,
    state: watch::Sender<FetchState>,
}

impl ForecastFetcher {
    pub fn new(provider: Box<dyn ForecastProvider>) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self { provider, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Fetch the forecast for `coords`, ignoring the call if one is pending.
    #[instrument(skip(self), level = "debug")]
    pub async fn load(&self, coords: Coordinates) -> LoadOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            let current = std::mem::take(state);
            *state = current.apply(FetchEvent::Started);
            true
        });

        if !started {
            debug!("forecast fetch already in flight, ignoring");
            return LoadOutcome::AlreadyInFlight;
        }

        let mut guard = InFlight { state: &self.state, armed: true };
        let result = self.provider.fetch_daily(coords).await;
        guard.armed = false;

        match result {
            Ok(forecast) => {
                let forecast = Arc::new(forecast);
                self.transition(FetchEvent::Succeeded(Arc::clone(&forecast)));
                LoadOutcome::Loaded(forecast)
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), "forecast fetch failed");
                let err = Arc::new(err);
                self.transition(FetchEvent::Failed(Arc::clone(&err)));
                LoadOutcome::Failed(err)
            }
        }
    }

    fn transition(&self, event: FetchEvent) {
        transition(&self.state, event);
    }
}

fn transition(state: &watch::Sender<FetchState>, event: FetchEvent) {
    state.send_modify(|state| {
        let current = std::mem::take(state);
        *state = current.apply(event);
        debug!(state = state_name(state), "fetch state changed");
    });
}

fn state_name(state: &FetchState) -> &'static str {
    match state {
        FetchState::Idle => "idle",
        FetchState::Loading { .. } => "loading",
        FetchState::Loaded(_) => "loaded",
        FetchState::Failed { .. } => "failed",
    }
}

/// Rolls the state back out of `Loading` if the load future is dropped.
struct InFlight<'a> {
    state: &'a watch::Sender<FetchState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            transition(self.state, FetchEvent::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Debug)]
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<ForecastResponse, FetchError>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<ForecastResponse, FetchError>>) -> Self {
            Self { responses: Mutex::new(responses.into()), gate: None }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl ForecastProvider for ScriptedProvider {
        async fn fetch_daily(&self, coords: Coordinates) -> Result<ForecastResponse, FetchError> {
            coords.validate()?;
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::HttpStatus(500)))
        }
    }

    fn coords() -> Coordinates {
        Coordinates { lat: 25.6866, lon: -100.3161 }
    }

    #[test]
    fn apply_walks_the_happy_path() {
        let forecast = Arc::new(fixtures::monterrey(1));

        let state = FetchState::Idle.apply(FetchEvent::Started);
        assert!(state.is_loading());
        assert!(state.forecast().is_none());

        let state = state.apply(FetchEvent::Succeeded(Arc::clone(&forecast)));
        assert!(matches!(state, FetchState::Loaded(_)));
        assert!(Arc::ptr_eq(state.forecast().unwrap(), &forecast));
    }

    #[test]
    fn failure_keeps_previous_forecast() {
        let forecast = Arc::new(fixtures::monterrey(1));

        let state = FetchState::Loaded(Arc::clone(&forecast))
            .apply(FetchEvent::Started)
            .apply(FetchEvent::Failed(Arc::new(FetchError::HttpStatus(404))));

        assert!(matches!(state.error(), Some(FetchError::HttpStatus(404))));
        assert!(Arc::ptr_eq(state.forecast().unwrap(), &forecast));
    }

    #[test]
    fn cancel_restores_what_was_there() {
        let forecast = Arc::new(fixtures::monterrey(1));

        let state = FetchState::Idle.apply(FetchEvent::Started).apply(FetchEvent::Cancelled);
        assert!(matches!(state, FetchState::Idle));

        let state = FetchState::Loaded(Arc::clone(&forecast))
            .apply(FetchEvent::Started)
            .apply(FetchEvent::Cancelled);
        assert!(matches!(state, FetchState::Loaded(_)));
    }

    #[tokio::test]
    async fn successful_load_publishes_loaded() {
        let provider = ScriptedProvider::new(vec![Ok(fixtures::monterrey(7))]);
        let fetcher = ForecastFetcher::new(Box::new(provider));
        let mut rx = fetcher.subscribe();

        let outcome = fetcher.load(coords()).await;
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.forecast().unwrap().city.name, "Monterrey");
    }

    #[tokio::test]
    async fn http_404_does_not_replace_stored_forecast() {
        let provider = ScriptedProvider::new(vec![
            Ok(fixtures::monterrey(7)),
            Err(FetchError::HttpStatus(404)),
        ]);
        let fetcher = ForecastFetcher::new(Box::new(provider));

        let LoadOutcome::Loaded(first) = fetcher.load(coords()).await else {
            panic!("first load should succeed");
        };

        let outcome = fetcher.load(coords()).await;
        assert!(matches!(outcome, LoadOutcome::Failed(ref e) if matches!(**e, FetchError::HttpStatus(404))));

        let state = fetcher.state();
        assert!(matches!(state.error(), Some(FetchError::HttpStatus(404))));
        assert!(Arc::ptr_eq(state.forecast().unwrap(), &first));
    }

    #[tokio::test]
    async fn invalid_coordinates_surface_as_failure() {
        let fetcher = ForecastFetcher::new(Box::new(ScriptedProvider::new(vec![])));

        let outcome = fetcher.load(Coordinates { lat: -91.0, lon: 0.0 }).await;
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(matches!(fetcher.state().error(), Some(FetchError::InvalidCoordinates { .. })));
    }

    #[tokio::test]
    async fn second_load_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let provider =
            ScriptedProvider::new(vec![Ok(fixtures::monterrey(7))]).gated(Arc::clone(&gate));
        let fetcher = Arc::new(ForecastFetcher::new(Box::new(provider)));
        let mut rx = fetcher.subscribe();

        let first = tokio::spawn({
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.load(coords()).await }
        });

        rx.wait_for(FetchState::is_loading).await.unwrap();

        let second = fetcher.load(coords()).await;
        assert!(matches!(second, LoadOutcome::AlreadyInFlight));

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, LoadOutcome::Loaded(_)));
        assert!(matches!(fetcher.state(), FetchState::Loaded(_)));
    }

    #[tokio::test]
    async fn dropped_load_rolls_back_to_idle() {
        let gate = Arc::new(Notify::new());
        let provider =
            ScriptedProvider::new(vec![Ok(fixtures::monterrey(7))]).gated(Arc::clone(&gate));
        let fetcher = ForecastFetcher::new(Box::new(provider));

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), fetcher.load(coords()))
                .await;
        assert!(timed_out.is_err());

        assert!(matches!(fetcher.state(), FetchState::Idle));
    }
}
