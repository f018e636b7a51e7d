//! Cancellation-aware request handles.
//!
//! A spawned request is bound to a [`CancelToken`]. Cancelling the token
//! aborts the in-flight request and guarantees the caller's state update is
//! never invoked afterwards, even when the request had already completed.

use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Cloneable cancellation flag shared between a caller and its requests.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one spawned request.
pub struct RequestHandle<T> {
    id: Uuid,
    token: CancelToken,
    task: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> RequestHandle<T> {
    /// Spawn `fut` on the current runtime, racing it against `token`.
    pub fn spawn<F>(token: CancelToken, fut: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    tracing::debug!("Request {} cancelled before completion", id);
                    Err(Error::Cancelled)
                }
                result = fut => result,
            }
        });

        Self { id, token, task }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Cancel this request and every other request sharing its token.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the request. Returns [`Error::Cancelled`] once cancelled.
    pub async fn join(self) -> Result<T> {
        let result = self
            .task
            .await
            .map_err(|e| Error::Task(format!("Request {} failed to join: {}", self.id, e)))?;

        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        result
    }

    /// Wait for the request and hand the outcome to `update` unless the token
    /// was cancelled in the meantime. Returns whether `update` ran.
    pub async fn deliver<U>(self, update: U) -> bool
    where
        U: FnOnce(Result<T>),
    {
        let token = self.token.clone();
        let id = self.id;
        match self.join().await {
            Err(Error::Cancelled) => {
                tracing::debug!("Dropping result of cancelled request {}", id);
                false
            }
            _ if token.is_cancelled() => false,
            outcome => {
                update(outcome);
                true
            }
        }
    }
}
