//! Single-flight coordination for the refresh protocol.
//!
//! Every caller that needs a refresh while one is already running awaits that
//! same refresh and receives its outcome; only one refresh request reaches
//! the backend.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::error::ClientResult;

type Slot = Arc<OnceCell<ClientResult<()>>>;

#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
    inflight: Mutex<Option<Slot>>,
}

impl RefreshCoordinator {
    /// Join the in-flight refresh, or start one with `refresh` if none is running.
    pub(crate) async fn run<F, Fut>(&self, refresh: F) -> ClientResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<()>>,
    {
        let slot = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match inflight.as_ref() {
                Some(slot) => {
                    tracing::debug!("joining in-flight session refresh");
                    slot.clone()
                }
                None => inflight.insert(Arc::new(OnceCell::new())).clone(),
            }
        };

        // If the caller driving the refresh is dropped, the next waiter runs its own `refresh`.
        let outcome = slot.get_or_init(refresh).await.clone();

        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight.as_ref().is_some_and(|current| Arc::ptr_eq(current, &slot)) {
            *inflight = None;
        }

        outcome
    }
}
