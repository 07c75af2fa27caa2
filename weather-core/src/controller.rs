//! Owner of the [`ResolutionOutcome`] a surface renders.
//!
//! State changes are described by [`ResolutionOutcome::apply`]; the
//! [`StateController`] is the only writer of the shared cell and surfaces
//! observe it through [`StateController::subscribe`].
//!
//! Starting a resolution cancels the one still in flight, and a superseded
//! task never writes the cell.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ErrorKind, ResolveError},
    location::{self, LocationError, LocationProvider, PermissionGate},
    model::{Coordinates, ResolutionOutcome, WeatherResult},
    service::WeatherService,
};

pub const PERMISSION_NOT_GRANTED: &str = "Location permission not granted";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Triggered,
    Settled(Result<WeatherResult, ResolveError>),
    Reported(String),
    Reset,
}

impl ResolutionOutcome {
    pub fn apply(self, event: Event) -> ResolutionOutcome {
        match (self, event) {
            (_, Event::Triggered) => ResolutionOutcome::Loading,
            (ResolutionOutcome::Loading, Event::Settled(Ok(weather))) => {
                ResolutionOutcome::Success(weather)
            }
            (ResolutionOutcome::Loading, Event::Settled(Err(e))) => {
                ResolutionOutcome::failure(e.kind(), e.to_string())
            }
            // Stale settlement.
            (current, Event::Settled(_)) => current,
            (_, Event::Reported(message)) => {
                ResolutionOutcome::failure(ErrorKind::UserReported, message)
            }
            (_, Event::Reset) => ResolutionOutcome::Idle,
        }
    }
}

#[derive(Debug)]
pub struct StateController {
    service: WeatherService,
    state: Arc<watch::Sender<ResolutionOutcome>>,
    generation: Arc<AtomicU64>,
    lifecycle: CancellationToken,
    in_flight: Option<CancellationToken>,
}

impl StateController {
    pub fn new(service: WeatherService) -> Self {
        let (state, _) = watch::channel(ResolutionOutcome::Idle);

        Self {
            service,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            lifecycle: CancellationToken::new(),
            in_flight: None,
        }
    }

    pub fn outcome(&self) -> ResolutionOutcome {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolutionOutcome> {
        self.state.subscribe()
    }

    /// Must be called from within a tokio runtime.
    pub fn trigger_by_name(&mut self, query: impl Into<String>) -> JoinHandle<()> {
        let query = query.into();
        let service = self.service.clone();

        self.spawn(move |_| async move { service.resolve_by_name(&query).await })
    }

    /// Must be called from within a tokio runtime.
    pub fn trigger_by_coordinates(&mut self, coords: Coordinates) -> JoinHandle<()> {
        let service = self.service.clone();

        self.spawn(move |_| async move { service.resolve_by_coordinates(coords).await })
    }

    /// Resolve weather for wherever `provider` says the device is.
    ///
    /// Returns `None` when `gate` refuses; the outcome is then a
    /// `UserReported` failure and nothing is spawned.
    pub fn trigger_by_location(
        &mut self,
        provider: Arc<dyn LocationProvider>,
        gate: &dyn PermissionGate,
    ) -> Option<JoinHandle<()>> {
        if !gate.ensure_location_permission() {
            self.set_error_message(PERMISSION_NOT_GRANTED);
            return None;
        }

        let service = self.service.clone();
        Some(self.spawn(move |cancel| async move {
            let coords = location::current_location(provider.as_ref(), &cancel)
                .await
                .map_err(ResolveError::from)?;
            tracing::info!(%coords, "location acquired");
            service.resolve_by_coordinates(coords).await
        }))
    }

    /// Show `message` as a failure without contacting any service.
    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.transition(Event::Reported(message.into()));
    }

    pub fn reset(&mut self) {
        self.transition(Event::Reset);
    }

    /// Cancel whatever is in flight. Later triggers are refused and leave the
    /// outcome untouched.
    pub fn shutdown(&mut self) {
        self.lifecycle.cancel();
    }

    /// Cancel the in-flight task, bump the generation and apply `event`,
    /// all under the cell's write lock. Returns the new generation.
    fn transition(&mut self, event: Event) -> u64 {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }

        let mut generation = 0;
        self.state.send_modify(|outcome| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *outcome = std::mem::take(outcome).apply(event);
        });
        generation
    }

    fn spawn<F, Fut>(&mut self, work: F) -> JoinHandle<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<WeatherResult, ResolveError>> + Send + 'static,
    {
        if self.lifecycle.is_cancelled() {
            tracing::warn!("controller is shut down, ignoring trigger");
            return tokio::spawn(async {});
        }

        let generation = self.transition(Event::Triggered);
        let cancel = self.lifecycle.child_token();
        self.in_flight = Some(cancel.clone());

        let work = work(cancel.clone());
        let state = self.state.clone();
        let current = self.generation.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(generation, "resolution superseded");
                    return;
                }
                res = work => res,
            };

            let cancelled = matches!(
                result,
                Err(ResolveError::Location(LocationError::Cancelled))
            );
            if cancelled || cancel.is_cancelled() {
                return;
            }

            state.send_if_modified(|outcome| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *outcome = std::mem::take(outcome).apply(Event::Settled(result));
                true
            });
        })
    }
}

impl Drop for StateController {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}
