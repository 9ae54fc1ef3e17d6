//! Remote resource state machine.
//!
//! `idle → loading → success(data) | failure(error)`, with `reset` back to
//! idle from anywhere. Each fetch is tagged with a sequence number; only the
//! most recently issued fetch may resolve the state, so responses that land
//! out of order are discarded. `reset` supersedes in-flight fetches too.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::error::ClientResult;

/// `{data, loading, error}` as rendered by a view.
///
/// Never `loading` with an `error` at the same time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState<T> {
    /// Last successful payload; cleared when a new fetch starts.
    data: Option<T>,
    loading: bool,
    /// User-facing failure message of the last fetch.
    error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> ResourceState<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Nothing fetched yet, or reset since.
    pub fn is_idle(&self) -> bool {
        self.data.is_none() && !self.loading && self.error.is_none()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Sequence number of an issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchSeq(u64);

/// Transition of a single resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent<T> {
    /// A fetch was issued; enter `loading`.
    Pending(FetchSeq),
    Fulfilled(FetchSeq, T),
    /// Failure with its user-facing message.
    Rejected(FetchSeq, String),
    /// Back to empty defaults, orphaning any fetch in flight.
    Reset,
}

/// Synchronous core: state plus the last issued sequence number.
#[derive(Debug)]
pub struct ResourceMachine<T> {
    state: ResourceState<T>,
    issued: u64,
}

impl<T> Default for ResourceMachine<T> {
    fn default() -> Self {
        Self {
            state: ResourceState::default(),
            issued: 0,
        }
    }
}

impl<T> ResourceMachine<T> {
    pub fn state(&self) -> &ResourceState<T> {
        &self.state
    }

    /// Issue a new fetch and enter `loading`.
    pub fn begin(&mut self) -> FetchSeq {
        let seq = FetchSeq(self.issued + 1);
        self.apply(ResourceEvent::Pending(seq));
        seq
    }

    /// Apply a transition. Returns `false` when it was stale and ignored.
    pub fn apply(&mut self, event: ResourceEvent<T>) -> bool {
        match event {
            ResourceEvent::Pending(seq) => {
                if seq.0 <= self.issued {
                    return false;
                }
                self.issued = seq.0;
                self.state = ResourceState {
                    data: None,
                    loading: true,
                    error: None,
                };
                true
            }
            ResourceEvent::Fulfilled(seq, data) => {
                if !self.is_current(seq) {
                    return false;
                }
                self.state = ResourceState {
                    data: Some(data),
                    loading: false,
                    error: None,
                };
                true
            }
            ResourceEvent::Rejected(seq, message) => {
                if !self.is_current(seq) {
                    return false;
                }
                self.state = ResourceState {
                    data: None,
                    loading: false,
                    error: Some(message),
                };
                true
            }
            ResourceEvent::Reset => {
                // Bumping `issued` orphans whatever is still in flight.
                self.issued += 1;
                self.state = ResourceState::default();
                true
            }
        }
    }

    fn is_current(&self, seq: FetchSeq) -> bool {
        seq.0 == self.issued && self.state.loading
    }
}

/// Whether a completed fetch made it into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch or a reset was issued meanwhile; the result was dropped.
    Superseded,
}

impl FetchOutcome {
    pub fn is_applied(self) -> bool {
        self == FetchOutcome::Applied
    }
}

/// Shared handle to one resource instance.
#[derive(Debug)]
pub struct Resource<T> {
    name: &'static str,
    fallback: &'static str,
    machine: Arc<Mutex<ResourceMachine<T>>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            fallback: self.fallback,
            machine: Arc::clone(&self.machine),
        }
    }
}

impl<T: Clone> Resource<T> {
    /// `fallback` is shown when a failure carries no backend message.
    pub fn new(name: &'static str, fallback: &'static str) -> Self {
        Self {
            name,
            fallback,
            machine: Arc::new(Mutex::new(ResourceMachine::default())),
        }
    }

    /// Registry name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn with<R>(&self, f: impl FnOnce(&mut ResourceMachine<T>) -> R) -> R {
        let mut machine = self.machine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut machine)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResourceState<T> {
        self.with(|m| m.state().clone())
    }

    pub fn dispatch(&self, event: ResourceEvent<T>) -> bool {
        self.with(|m| m.apply(event))
    }

    pub fn reset(&self) {
        self.dispatch(ResourceEvent::Reset);
    }

    /// Run `request` as a fetch of this resource.
    ///
    /// The lock is never held across the await.
    pub async fn fetch<F>(&self, request: F) -> FetchOutcome
    where
        F: Future<Output = ClientResult<T>>,
    {
        let seq = self.with(|m| m.begin());
        let result = request.await;

        let event = match result {
            Ok(data) => ResourceEvent::Fulfilled(seq, data),
            Err(err) => {
                tracing::debug!(resource = self.name, error = %err, "fetch failed");
                ResourceEvent::Rejected(seq, err.user_message(self.fallback))
            }
        };

        if self.dispatch(event) {
            FetchOutcome::Applied
        } else {
            tracing::debug!(resource = self.name, ?seq, "discarding superseded result");
            FetchOutcome::Superseded
        }
    }
}
