//! Input/Display Surface, independent of any presentation technology.
//!
//! The surface owns the `Idle -> Fetching -> Idle` cycle. A concrete front end
//! implements [`SurfaceView`] and drives the surface from a single context:
//! `submit` to start a lookup, then `resolve` to apply the outcome.

use tokio_util::sync::CancellationToken;

use crate::{
    model::{FetchOutcome, WeatherQuery, WeatherSummary},
    service::{FetchHandle, FetchService},
};

/// Presentation hooks the surface calls while running a lookup.
pub trait SurfaceView {
    fn set_trigger_enabled(&mut self, enabled: bool);
    fn set_loading(&mut self, loading: bool);
    fn show_summary(&mut self, summary: &WeatherSummary);
    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Idle,
    Fetching,
}

/// What `submit` did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A lookup is now in flight.
    Started,
    /// Input was empty; an error was shown and no lookup was made.
    Rejected,
    /// A lookup is already in flight; input ignored.
    Busy,
}

#[derive(Debug)]
pub struct Surface<V> {
    service: FetchService,
    view: V,
    pending: Option<FetchHandle>,
}

impl<V: SurfaceView> Surface<V> {
    pub fn new(service: FetchService, view: V) -> Self {
        Self {
            service,
            view,
            pending: None,
        }
    }

    pub fn state(&self) -> SurfaceState {
        if self.pending.is_some() {
            SurfaceState::Fetching
        } else {
            SurfaceState::Idle
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Start a lookup for `input`. Only valid from `Idle`.
    pub fn submit(&mut self, input: &str) -> Submission {
        if self.pending.is_some() {
            tracing::debug!("submit ignored while a lookup is in flight");
            return Submission::Busy;
        }

        let query = match WeatherQuery::new(input) {
            Ok(query) => query,
            Err(err) => {
                self.view.show_error(&err.to_string());
                return Submission::Rejected;
            }
        };

        self.view.set_trigger_enabled(false);
        self.view.set_loading(true);
        self.pending = Some(self.service.spawn(query));

        Submission::Started
    }

    /// Token that cancels the in-flight lookup, if any.
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.pending.as_ref().map(FetchHandle::cancellation_token)
    }

    pub fn cancel(&self) {
        if let Some(handle) = &self.pending {
            handle.cancel();
        }
    }

    /// Wait for the in-flight lookup and apply its outcome to the view.
    ///
    /// Returns `None` when nothing is pending. Afterwards the surface is `Idle`
    /// and the trigger has been re-enabled exactly once.
    ///
    /// Cancel-safe: if this future is dropped before the outcome arrives, the
    /// surface stays `Fetching` and a later `resolve` picks the lookup up again.
    pub async fn resolve(&mut self) -> Option<FetchOutcome> {
        let outcome = self.pending.as_mut()?.wait().await;
        self.pending = None;
        self.deliver(&outcome);
        Some(outcome)
    }

    fn deliver(&mut self, outcome: &FetchOutcome) {
        self.view.set_loading(false);
        match outcome {
            FetchOutcome::Success(summary) => self.view.show_summary(summary),
            FetchOutcome::Failure { message, .. } => self.view.show_error(message),
        }
        self.view.set_trigger_enabled(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FailureKind,
        service::tests::{HangingProvider, StubProvider},
    };
    use std::sync::{Arc, atomic::Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum ViewEvent {
        Trigger(bool),
        Loading(bool),
        Summary(String),
        Error(String),
    }

    #[derive(Debug, Default)]
    struct RecordingView {
        events: Vec<ViewEvent>,
    }

    impl RecordingView {
        fn trigger_changes(&self) -> Vec<bool> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    ViewEvent::Trigger(enabled) => Some(*enabled),
                    _ => None,
                })
                .collect()
        }
    }

    impl SurfaceView for RecordingView {
        fn set_trigger_enabled(&mut self, enabled: bool) {
            self.events.push(ViewEvent::Trigger(enabled));
        }

        fn set_loading(&mut self, loading: bool) {
            self.events.push(ViewEvent::Loading(loading));
        }

        fn show_summary(&mut self, summary: &WeatherSummary) {
            self.events.push(ViewEvent::Summary(summary.city.clone()));
        }

        fn show_error(&mut self, message: &str) {
            self.events.push(ViewEvent::Error(message.to_string()));
        }
    }

    #[tokio::test]
    async fn blank_input_shows_error_without_lookup() {
        let provider = Arc::new(StubProvider::ok());
        let mut surface =
            Surface::new(FetchService::new(provider.clone()), RecordingView::default());

        assert_eq!(surface.submit("   "), Submission::Rejected);
        assert_eq!(surface.state(), SurfaceState::Idle);
        assert_eq!(surface.resolve().await, None);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            surface.view().events,
            vec![ViewEvent::Error("City name cannot be empty!".into())]
        );
    }

    #[tokio::test]
    async fn success_cycle_orders_view_updates() {
        let mut surface =
            Surface::new(FetchService::new(Arc::new(StubProvider::ok())), RecordingView::default());

        assert_eq!(surface.submit(" London "), Submission::Started);
        assert_eq!(surface.state(), SurfaceState::Fetching);

        let outcome = surface.resolve().await.expect("pending lookup");
        assert!(outcome.is_success());
        assert_eq!(surface.state(), SurfaceState::Idle);

        assert_eq!(
            surface.into_view().events,
            vec![
                ViewEvent::Trigger(false),
                ViewEvent::Loading(true),
                ViewEvent::Loading(false),
                ViewEvent::Summary("London".into()),
                ViewEvent::Trigger(true),
            ]
        );
    }

    #[tokio::test]
    async fn failure_shows_message_and_reenables_once() {
        let mut surface = Surface::new(
            FetchService::new(Arc::new(StubProvider::not_found())),
            RecordingView::default(),
        );

        surface.submit("Atlantis");
        let outcome = surface.resolve().await.expect("pending lookup");

        assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFound));
        let view = surface.into_view();
        assert!(view.events.contains(&ViewEvent::Error("City not found.".into())));
        assert_eq!(view.trigger_changes(), vec![false, true]);
    }

    #[tokio::test]
    async fn second_submit_while_fetching_is_busy() {
        let mut surface =
            Surface::new(FetchService::new(Arc::new(HangingProvider)), RecordingView::default());

        assert_eq!(surface.submit("London"), Submission::Started);
        assert_eq!(surface.submit("Paris"), Submission::Busy);
        assert_eq!(surface.submit(""), Submission::Busy);

        surface.cancel();
        let outcome = surface.resolve().await.expect("pending lookup");

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Cancelled));
        assert_eq!(surface.state(), SurfaceState::Idle);
        assert_eq!(surface.view().trigger_changes(), vec![false, true]);
    }

    #[tokio::test]
    async fn cancellation_token_cancels_while_resolving() {
        let mut surface =
            Surface::new(FetchService::new(Arc::new(HangingProvider)), RecordingView::default());

        assert!(surface.cancellation_token().is_none());
        surface.submit("London");

        let token = surface.cancellation_token().expect("lookup in flight");
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            token.cancel();
        });

        let outcome = surface.resolve().await.expect("pending lookup");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Cancelled));
        assert!(surface.view().events.contains(&ViewEvent::Error("Request cancelled.".into())));
    }

    #[tokio::test]
    async fn surface_accepts_new_lookup_after_each_outcome() {
        let provider = Arc::new(StubProvider::ok());
        let mut surface =
            Surface::new(FetchService::new(provider.clone()), RecordingView::default());

        for city in ["London", "Paris", "Tokyo"] {
            assert_eq!(surface.submit(city), Submission::Started);
            surface.resolve().await.expect("pending lookup");
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(surface.view().trigger_changes(), vec![false, true, false, true, false, true]);
    }

    #[tokio::test]
    async fn dropped_resolve_keeps_lookup_pending() {
        let mut surface =
            Surface::new(FetchService::new(Arc::new(HangingProvider)), RecordingView::default());

        surface.submit("London");
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), surface.resolve()).await;
        assert!(timed_out.is_err());

        assert_eq!(surface.state(), SurfaceState::Fetching);
        assert!(surface.cancellation_token().is_some());
        assert_eq!(surface.view().trigger_changes(), vec![false]);

        surface.cancel();
        let outcome = surface.resolve().await.expect("lookup still pending");

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Cancelled));
        assert_eq!(surface.state(), SurfaceState::Idle);
        assert_eq!(surface.view().trigger_changes(), vec![false, true]);
        assert_eq!(surface.view().events.last(), Some(&ViewEvent::Trigger(true)));
        assert!(surface.view().events.contains(&ViewEvent::Loading(false)));
    }
}
