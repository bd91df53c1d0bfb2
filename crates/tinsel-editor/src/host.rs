//! Host environment seam: location, clipboard, and confirmation prompts.
//!
//! In a browser these are the history API, the async clipboard, and
//! `confirm()`. `MemoryHost` stands in for them in tests and the CLI.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[async_trait]
pub trait Host: Send + Sync {
    /// Current location path, e.g. `/tree/abc`.
    fn path(&self) -> String;

    /// Rewrite the location without reloading.
    fn push_path(&self, path: &str);

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), String>;

    /// Ask the user a yes/no question.
    async fn confirm(&self, prompt: &str) -> bool;
}

pub struct MemoryHost {
    history: Mutex<Vec<String>>,
    clipboard: Mutex<Option<String>>,
    clipboard_denied: AtomicBool,
    confirm_answer: AtomicBool,
}

impl MemoryHost {
    /// Start at `path`. Prompts are answered "yes" until told otherwise.
    pub fn at(path: &str) -> Self {
        Self {
            history: Mutex::new(vec![path.to_string()]),
            clipboard: Mutex::new(None),
            clipboard_denied: AtomicBool::new(false),
            confirm_answer: AtomicBool::new(true),
        }
    }

    fn history_lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every path visited, oldest first, including the starting one.
    pub fn history(&self) -> Vec<String> {
        self.history_lock().clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn deny_clipboard(&self, denied: bool) {
        self.clipboard_denied.store(denied, Ordering::Relaxed);
    }

    pub fn answer_prompts(&self, yes: bool) {
        self.confirm_answer.store(yes, Ordering::Relaxed);
    }
}

#[async_trait]
impl Host for MemoryHost {
    fn path(&self) -> String {
        self.history_lock().last().cloned().unwrap_or_default()
    }

    fn push_path(&self, path: &str) {
        log::debug!("location → {path}");
        self.history_lock().push(path.to_string());
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), String> {
        if self.clipboard_denied.load(Ordering::Relaxed) {
            return Err("clipboard permission denied".to_string());
        }
        *self
            .clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }

    async fn confirm(&self, prompt: &str) -> bool {
        let yes = self.confirm_answer.load(Ordering::Relaxed);
        log::debug!("confirm {prompt:?} → {yes}");
        yes
    }
}
