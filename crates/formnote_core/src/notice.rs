//! Transient user notices and the external-action error boundary.
//!
//! # Responsibility
//! - Publish short-lived, non-blocking notices through a single-fire event.
//! - Run platform-provided external actions (e.g. opening a mail app) and
//!   turn missing handlers and failures into notices.
//!
//! # Invariants
//! - Notice messages are trimmed; blank messages are dropped.
//! - A failing or panicking external action never propagates to the caller.

use crate::event::single_fire::SingleFireEvent;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Message shown when an error carries no text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "发生未知错误";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// How long a notice stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeDuration {
    Short,
    Long,
}

/// One transient notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration: NoticeDuration,
}

/// Action handed off to another app on the device.
pub trait ExternalAction {
    /// Whether any installed handler can take the action.
    fn can_handle(&self) -> bool;
    /// Starts the action.
    fn launch(&self) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Outcome of [`NoticeCenter::trigger_external_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Launched,
    NoHandler,
    Failed,
}

/// Copy used by [`NoticeCenter::trigger_external_action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMessages {
    /// Shown (long) when nothing can handle the action.
    pub no_handler: String,
    /// Shown (short) when launching fails.
    pub failed: String,
}

/// Publisher of transient notices for one UI controller.
#[derive(Default)]
pub struct NoticeCenter {
    notices: SingleFireEvent<Notice>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event the UI attaches its notice renderer to.
    pub fn notices(&self) -> &SingleFireEvent<Notice> {
        &self.notices
    }

    pub fn show_info(&self, message: &str, duration: NoticeDuration) {
        self.show(NoticeKind::Info, message, duration);
    }

    pub fn show_success(&self, message: &str) {
        self.show(NoticeKind::Success, message, NoticeDuration::Short);
    }

    pub fn show_error(&self, message: &str) {
        self.show(NoticeKind::Error, message, NoticeDuration::Short);
    }

    /// Shows an error's message, or [`UNKNOWN_ERROR_MESSAGE`] when it has none.
    pub fn show_error_from(&self, err: &dyn Error) {
        let message = err.to_string();
        if message.trim().is_empty() {
            self.show_error(UNKNOWN_ERROR_MESSAGE);
        } else {
            self.show_error(&message);
        }
    }

    /// Runs `action` at the boundary, reporting problems as notices.
    pub fn trigger_external_action(
        &self,
        action: &dyn ExternalAction,
        messages: &ActionMessages,
    ) -> ActionOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| {
            if !action.can_handle() {
                return Ok(false);
            }
            action.launch().map(|()| true)
        }));

        match result {
            Ok(Ok(true)) => {
                info!("event=external_action module=notice status=ok");
                ActionOutcome::Launched
            }
            Ok(Ok(false)) => {
                warn!("event=external_action module=notice status=error error_code=no_handler");
                self.show(NoticeKind::Error, &messages.no_handler, NoticeDuration::Long);
                ActionOutcome::NoHandler
            }
            Ok(Err(err)) => {
                error!(
                    "event=external_action module=notice status=error error_code=launch_failed error={err}"
                );
                self.show_error(&messages.failed);
                ActionOutcome::Failed
            }
            Err(_) => {
                error!("event=external_action module=notice status=error error_code=launch_panicked");
                self.show_error(&messages.failed);
                ActionOutcome::Failed
            }
        }
    }

    fn show(&self, kind: NoticeKind, message: &str, duration: NoticeDuration) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        self.notices.publish(Notice {
            kind,
            message: message.to_string(),
            duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{NoticeCenter, NoticeKind, UNKNOWN_ERROR_MESSAGE};
    use std::fmt::{Display, Formatter};

    #[derive(Debug)]
    struct SilentError;

    impl Display for SilentError {
        fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
            Ok(())
        }
    }

    impl std::error::Error for SilentError {}

    #[test]
    fn blank_messages_are_dropped() {
        let center = NoticeCenter::new();
        center.show_success("   ");
        assert!(!center.notices().has_pending_event());
    }

    #[test]
    fn silent_error_uses_fallback_message() {
        let center = NoticeCenter::new();
        center.show_error_from(&SilentError);
        assert!(center.notices().has_pending_event());

        let lifecycle = crate::event::live_value::Lifecycle::started();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let sink = std::sync::Arc::clone(&seen);
        center
            .notices()
            .attach_observer(&lifecycle, move |notice| {
                *sink.lock().unwrap() = notice.cloned();
            })
            .expect("observer attached");

        let notice = seen.lock().unwrap().clone().expect("notice delivered");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, UNKNOWN_ERROR_MESSAGE);
    }
}
