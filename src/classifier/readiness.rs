//! The shared model handle and the bounded wait that gates classification
//! on it.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::debug;

use super::error::ClassifierError;
use crate::model::LoadedModel;

/// The lifecycle of the model behind a classifier instance.
///
/// Written exactly once: the background loader moves the state from
/// `Loading` to either `Ready` or `Failed`, and it never changes again.
#[derive(Clone, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Arc<LoadedModel>),
    Failed(ClassifierError),
}

/// Shared slot the background loader publishes into.
///
/// Readers only ever see `Loading` or the final state; the publish helpers
/// ignore any write after the first, which keeps the handle immutable once
/// resolved.
#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<RwLock<LoadState>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current state. `Ready` and `Failed`
    /// payloads are cheap to clone.
    pub fn snapshot(&self) -> LoadState {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn publish_ready(&self, model: LoadedModel) {
        self.publish(LoadState::Ready(Arc::new(model)));
    }

    pub fn publish_failed(&self, error: ClassifierError) {
        self.publish(LoadState::Failed(error));
    }

    fn publish(&self, state: LoadState) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*guard, LoadState::Loading) {
            *guard = state;
        }
    }
}

/// Bounded retry-with-delay wait for model readiness.
///
/// Calls issued before the model finishes loading poll the slot with a
/// fixed delay between attempts instead of failing outright. A terminal
/// load failure short-circuits on first observation without consuming the
/// retry budget; only a model that is genuinely still loading burns
/// attempts. The worst-case wait is `poll_delay * (max_attempts - 1)`.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    pub poll_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_millis(1000),
            max_attempts: 20,
        }
    }
}

impl ReadinessGate {
    pub fn new(poll_delay: Duration, max_attempts: u32) -> Self {
        Self {
            poll_delay,
            max_attempts,
        }
    }

    /// Waits until the slot is ready and returns the loaded model.
    ///
    /// # Errors
    /// - the stored load error, immediately, if the slot is `Failed`
    /// - [`ClassifierError::Timeout`] if the attempt budget runs out while
    ///   the slot is still `Loading`
    pub async fn wait_ready(&self, slot: &ModelSlot) -> Result<Arc<LoadedModel>, ClassifierError> {
        for attempt in 1..=self.max_attempts {
            match slot.snapshot() {
                LoadState::Ready(model) => return Ok(model),
                LoadState::Failed(error) => return Err(error),
                LoadState::Loading => {
                    if attempt == self.max_attempts {
                        break;
                    }
                    debug!(
                        "model still loading, waiting {:?} (attempt {}/{})",
                        self.poll_delay, attempt, self.max_attempts
                    );
                    tokio::time::sleep(self.poll_delay).await;
                }
            }
        }
        Err(ClassifierError::Timeout {
            attempts: self.max_attempts,
        })
    }
}
