//! User-facing notices: the alerts and warnings the UI shows.

use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A blocking operation outlived the failsafe. It may still finish.
    TimedOut,
    StoreUnavailable,
    CreateTreeFailed,
    SaveFailed,
    DeleteFailed,
    SignInFailed(String),
    LinkCopied,
    CopyFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TimedOut => f.write_str("Request timed out. Please check your connection."),
            Notice::StoreUnavailable => f.write_str("The tree service is unavailable."),
            Notice::CreateTreeFailed => f.write_str("Failed to create tree."),
            Notice::SaveFailed => f.write_str("Failed to save ornament."),
            Notice::DeleteFailed => f.write_str("Failed to delete."),
            Notice::SignInFailed(reason) => write!(f, "Login failed: {reason}"),
            Notice::LinkCopied => f.write_str("Tree link copied to clipboard!"),
            Notice::CopyFailed => f.write_str("Failed to copy link."),
        }
    }
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending half shared by every component that surfaces notices.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, NoticeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notice: Notice) {
        log::info!("notice: {notice}");
        // No UI listening is not an error.
        let _ = self.tx.send(notice);
    }
}
