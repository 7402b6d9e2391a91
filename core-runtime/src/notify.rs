//! User-facing failure presentation.
//!
//! Every failure that reaches the user goes through [`ErrorPresenter`]: it is
//! logged first, then handed to the host [`Notifier`] as a transient,
//! dismissible [`Notice`].

use crate::error::{ErrorKind, UserFacingError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A transient notification shown by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub dismissible: bool,
    pub retry_available: bool,
}

/// Host hook that displays notices (toast, snackbar, banner).
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Fallback notifier for hosts without a UI surface; writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        info!(
            title = %notice.title,
            retry_available = notice.retry_available,
            "{}",
            notice.message
        );
    }
}

#[derive(Clone)]
pub struct ErrorPresenter {
    notifier: Arc<dyn Notifier>,
}

impl ErrorPresenter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Log `err`, then notify the host.
    ///
    /// `allow_retry` is the caller's offer of a manual retry; it is only shown
    /// for failures that can succeed on a second attempt.
    pub fn present<E>(&self, err: &E, allow_retry: bool) -> Notice
    where
        E: UserFacingError + ?Sized,
    {
        let kind = err.kind();
        match kind {
            ErrorKind::Configuration => error!(kind = ?kind, error = %err, "Presenting failure"),
            _ => warn!(kind = ?kind, error = %err, "Presenting failure"),
        }

        let notice = Notice {
            title: kind.title().to_string(),
            message: err.user_message(),
            dismissible: true,
            retry_available: allow_retry && err.is_retryable(),
        };

        self.notifier.notify(notice.clone());
        notice
    }
}

impl Default for ErrorPresenter {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

impl std::fmt::Debug for ErrorPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPresenter")
            .field("notifier", &"Notifier { ... }")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mockall::predicate::*;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream unavailable")]
    struct Unavailable;

    impl UserFacingError for Unavailable {
        fn kind(&self) -> ErrorKind {
            ErrorKind::TransientNetwork
        }

        fn user_message(&self) -> String {
            "The tour service is unreachable. Check your connection.".to_string()
        }
    }

    #[test]
    fn test_present_notifies_once_with_retry() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(function(|n: &Notice| {
                n.title == "Network problem" && n.dismissible && n.retry_available
            }))
            .times(1)
            .return_const(());

        let presenter = ErrorPresenter::new(Arc::new(notifier));
        let notice = presenter.present(&Unavailable, true);
        assert!(notice.message.contains("unreachable"));
    }

    #[test]
    fn test_retry_not_offered_for_configuration_errors() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| !n.retry_available)
            .times(1)
            .return_const(());

        let presenter = ErrorPresenter::new(Arc::new(notifier));
        presenter.present(&Error::Config("bad base url".into()), true);
    }

    #[test]
    fn test_notice_serializes_camel_case() {
        let notice = ErrorPresenter::default().present(&Unavailable, false);
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["retryAvailable"], false);
        assert_eq!(json["dismissible"], true);
    }
}
