//! Bounded-time failsafe around blocking store calls.
//!
//! Each call holds the busy flag for its duration. If the call is still
//! outstanding when the bound elapses, its hold is given back and a
//! [`Notice::TimedOut`] is surfaced, but the call itself is *not*
//! cancelled: its result is still awaited and still applied when it
//! arrives. A late success therefore mutates state after the user was told
//! the request timed out. That window is accepted. A late result never
//! touches the flag again, so it cannot release a hold taken by another
//! call started in the meantime.

use crate::notice::{Notice, Notifier};
use crate::state::AppState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Failsafe {
    bound: Duration,
    state: Arc<AppState>,
    notifier: Notifier,
}

impl Failsafe {
    pub fn new(bound: Duration, state: Arc<AppState>, notifier: Notifier) -> Self {
        Self {
            bound,
            state,
            notifier,
        }
    }

    pub fn bound(&self) -> Duration {
        self.bound
    }

    /// Run `op` under the failsafe and return its output, however late.
    pub async fn guard<F: Future>(&self, what: &str, op: F) -> F::Output {
        // Given back on timeout or when this future completes or is dropped,
        // whichever comes first.
        let mut hold = Some(self.state.loading.hold());

        tokio::pin!(op);
        let timer = tokio::time::sleep(self.bound);
        tokio::pin!(timer);

        let output = loop {
            tokio::select! {
                biased;
                output = &mut op => break output,
                () = &mut timer, if hold.is_some() => {
                    drop(hold.take());
                    log::warn!("{what}: no response after {:?}, releasing the UI", self.bound);
                    self.notifier.notify(Notice::TimedOut);
                }
            }
        };

        if hold.is_none() {
            log::info!("{what}: late response arrived");
        }
        output
    }
}
