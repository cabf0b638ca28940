//! Fetch Service: runs one lookup per call as a background task.
//!
//! Each [`FetchService::spawn`] call produces a [`FetchHandle`] owning a
//! cancellation token and a single-result completion channel. The task always
//! reports exactly one [`FetchOutcome`], including when cancelled.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    error::{FailureKind, FetchError},
    model::{FetchOutcome, WeatherQuery},
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub struct FetchService {
    provider: Arc<dyn WeatherProvider>,
}

impl FetchService {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Perform a single lookup on the current task. No retries.
    pub async fn fetch(&self, query: &WeatherQuery) -> FetchOutcome {
        let outcome = FetchOutcome::from(self.provider.current(query).await);

        match &outcome {
            FetchOutcome::Success(summary) => {
                tracing::info!(city = %summary.city, "weather lookup succeeded");
            }
            FetchOutcome::Failure { kind, message } => {
                tracing::warn!(city = query.city(), %kind, %message, "weather lookup failed");
            }
        }

        outcome
    }

    /// Run the lookup on a background task. Must be called within a tokio runtime.
    pub fn spawn(&self, query: WeatherQuery) -> FetchHandle {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let service = self.clone();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    tracing::info!(city = query.city(), "weather lookup cancelled");
                    FetchOutcome::from(FetchError::Cancelled)
                }
                outcome = service.fetch(&query) => outcome,
            };

            if tx.send(outcome).is_err() {
                tracing::debug!("fetch handle dropped before outcome was delivered");
            }
        });

        FetchHandle {
            _guard: token.clone().drop_guard(),
            token,
            rx,
        }
    }
}

/// In-flight lookup started by [`FetchService::spawn`].
///
/// Dropping the handle cancels the lookup.
#[derive(Debug)]
pub struct FetchHandle {
    token: CancellationToken,
    _guard: DropGuard,
    rx: oneshot::Receiver<FetchOutcome>,
}

impl FetchHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the single outcome of this lookup.
    pub async fn outcome(mut self) -> FetchOutcome {
        self.wait().await
    }

    /// Wait for the outcome without consuming the handle.
    ///
    /// Cancel-safe: if this future is dropped, the handle still owns the
    /// lookup and can be waited on again. Must not be called again after it
    /// has returned.
    pub(crate) async fn wait(&mut self) -> FetchOutcome {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            // Only reachable if the task panicked or the runtime shut down.
            Err(_) => FetchOutcome::Failure {
                kind: FailureKind::Unknown,
                message: "Weather lookup ended without a result.".to_string(),
            },
        }
    }
}
