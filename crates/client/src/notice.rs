//! Transient notifications and busy controls.
//!
//! Every feature action settles at its own boundary: its result becomes a
//! [`Notice`] on a [`NoticeBoard`], which auto-dismisses after
//! [`NOTICE_TTL`]. While an action runs, the control that triggered it is
//! disabled through a [`Control`] guard whose `Drop` restores it on every path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use folio_core::NoticeLevel;
use tracing::debug;

use crate::error::ApiError;

/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// The notice shown when an action fails.
    #[must_use]
    pub fn from_error(err: &ApiError) -> Self {
        Self::error(err.user_message())
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug)]
struct Posted {
    notice: Notice,
    at: Instant,
}

/// Holds at most one notice; a new post replaces the previous one.
///
/// Cloning is cheap; clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    slot: Arc<Mutex<Option<Posted>>>,
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, notice: Notice) {
        self.post_at(notice, Instant::now());
    }

    pub fn post_at(&self, notice: Notice, at: Instant) {
        debug!(level = ?notice.level, text = %notice.text, "notice posted");
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Posted { notice, at });
    }

    #[must_use]
    pub fn current(&self) -> Option<Notice> {
        self.current_at(Instant::now())
    }

    /// The visible notice at `now`, if it has not yet expired.
    #[must_use]
    pub fn current_at(&self, now: Instant) -> Option<Notice> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|posted| now.saturating_duration_since(posted.at) < NOTICE_TTL)
            .map(|posted| posted.notice.clone())
    }

    pub fn dismiss(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Post the notice for an action's result and hand the result back.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error unchanged, after posting it.
    pub fn settle<T>(
        &self,
        result: Result<T, ApiError>,
        success_text: &str,
    ) -> Result<T, ApiError> {
        match &result {
            Ok(_) => self.post(Notice::success(success_text)),
            Err(err) => self.post(Notice::from_error(err)),
        }
        result
    }
}

#[derive(Debug)]
struct ControlState {
    label: String,
    disabled: bool,
}

/// A button stand-in: a label and an enabled flag.
///
/// Clones share the state, so a renderer can watch the control that a
/// controller engages.
#[derive(Debug, Clone)]
pub struct Control {
    state: Arc<Mutex<ControlState>>,
}

impl Control {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState {
                label: label.into(),
                disabled: false,
            })),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.lock().label.clone()
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.lock().disabled
    }

    /// Disable the control and show `busy_label` until the guard drops.
    ///
    /// Returns `None` if the control is already engaged, so a second click
    /// while an action is in flight does nothing.
    #[must_use]
    pub fn try_engage(&self, busy_label: &str) -> Option<Engaged> {
        let mut state = self.lock();
        if state.disabled {
            return None;
        }
        let idle_label = std::mem::replace(&mut state.label, busy_label.to_string());
        state.disabled = true;
        drop(state);

        Some(Engaged {
            control: self.clone(),
            idle_label,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores the control's label and re-enables it on drop.
#[derive(Debug)]
pub struct Engaged {
    control: Control,
    idle_label: String,
}

impl Drop for Engaged {
    fn drop(&mut self) {
        let mut state = self.control.lock();
        state.label = std::mem::take(&mut self.idle_label);
        state.disabled = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires_after_ttl() {
        let board = NoticeBoard::new();
        let t0 = Instant::now();
        board.post_at(Notice::success("Saved"), t0);

        assert_eq!(board.current_at(t0).unwrap().text, "Saved");
        assert!(board.current_at(t0 + Duration::from_millis(4_999)).is_some());
        assert!(board.current_at(t0 + NOTICE_TTL).is_none());
    }

    #[test]
    fn test_new_post_replaces_previous() {
        let board = NoticeBoard::new();
        board.post(Notice::info("first"));
        board.post(Notice::error("second"));
        assert_eq!(board.current().unwrap(), Notice::error("second"));

        board.dismiss();
        assert!(board.current().is_none());
    }

    #[test]
    fn test_settle_posts_error_message_verbatim() {
        let board = NoticeBoard::new();
        let result: Result<(), ApiError> =
            Err(ApiError::application(1, Some("insufficient balance".to_string())));

        assert!(board.settle(result, "Order created successfully!").is_err());
        let notice = board.current().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, "insufficient balance");
    }

    #[test]
    fn test_settle_passes_value_through() {
        let board = NoticeBoard::new();
        assert_eq!(board.settle(Ok(3), "Done"), Ok(3));
        assert_eq!(board.current().unwrap(), Notice::success("Done"));
    }

    #[test]
    fn test_control_restores_on_drop() {
        let button = Control::new("Place Order");
        {
            let _busy = button.try_engage("Placing...").unwrap();
            assert!(button.is_disabled());
            assert_eq!(button.label(), "Placing...");
            assert!(button.try_engage("again").is_none());
        }
        assert!(!button.is_disabled());
        assert_eq!(button.label(), "Place Order");
    }

    #[test]
    fn test_control_restores_on_early_return() {
        fn action(button: &Control) -> Result<(), ApiError> {
            let _busy = button.try_engage("Working...");
            Err(ApiError::Network("down".to_string()))
        }

        let button = Control::new("Go");
        assert!(action(&button).is_err());
        assert_eq!(button.label(), "Go");
        assert!(!button.is_disabled());
    }
}
