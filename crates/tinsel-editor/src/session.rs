//! Session tracker: folds the auth provider's identity feed into the single
//! current-identity value in [`AppState`].
//!
//! The subscription lives as long as the tracker, which lives as long as
//! the app session.

use crate::state::AppState;
use std::sync::Arc;
use tinsel_core::model::Identity;
use tinsel_store::AuthProvider;
use tokio::task::JoinHandle;

pub struct SessionTracker {
    state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl SessionTracker {
    /// Seed the current identity synchronously, then follow the provider.
    pub fn start(auth: &dyn AuthProvider, state: Arc<AppState>) -> Self {
        let mut changes = auth.identity_changes();
        state.set_identity(changes.borrow_and_update().clone());

        let task = tokio::spawn({
            let state = state.clone();
            async move {
                while changes.changed().await.is_ok() {
                    let identity = changes.borrow_and_update().clone();
                    match &identity {
                        Some(who) => log::info!("signed in as {}", who.id),
                        None => log::info!("signed out"),
                    }
                    state.set_identity(identity);
                }
                log::debug!("identity feed closed");
            }
        });

        Self { state, task }
    }

    pub fn current(&self) -> Option<Identity> {
        self.state.identity()
    }

    /// Call `callback` now with the current identity, then again after
    /// every sign-in and sign-out. Dropping the handle does not stop it.
    pub fn observe_identity<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(Option<&Identity>) + Send + 'static,
    {
        let mut rx = self.state.identity.subscribe();
        callback(rx.borrow_and_update().as_ref());
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                callback(rx.borrow_and_update().as_ref());
            }
        })
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tinsel_store::MemoryAuth;

    #[tokio::test]
    async fn seeds_identity_before_first_change() {
        let noel = Identity::new("u1", "Noel");
        let auth = MemoryAuth::signed_in(noel.clone());
        let state = Arc::new(AppState::new());
        let tracker = SessionTracker::start(&auth, state.clone());
        assert_eq!(tracker.current(), Some(noel));
    }

    #[tokio::test]
    async fn observer_sees_current_then_every_change() {
        let auth = MemoryAuth::new();
        let state = Arc::new(AppState::new());
        let tracker = SessionTracker::start(&auth, state.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _observer = tracker.observe_identity({
            let seen = seen.clone();
            move |identity| {
                seen.lock()
                    .unwrap()
                    .push(identity.map(|i| i.id.as_str().to_string()));
            }
        });
        assert_eq!(*seen.lock().unwrap(), vec![None]);

        let mut identity = state.identity.subscribe();
        auth.set_identity(Some(Identity::new("u9", "Ivy")));
        identity.wait_for(|i| i.is_some()).await.unwrap();
        for _ in 0..16 {
            if seen.lock().unwrap().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("u9".to_string())]
        );
    }
}
