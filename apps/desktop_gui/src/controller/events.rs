//! UI/backend events and error modeling for the desktop controller.

use scenes_core::RenderedItem;
use shared::error::{ErrorCode, ErrorReport};

#[derive(Debug, Clone)]
pub enum UiEvent {
    Ready(Vec<RenderedItem>),
    Rendered(Vec<RenderedItem>),
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Storage,
    Template,
    Missing,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Advance,
    Restart,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_report(context: UiErrorContext, report: ErrorReport) -> Self {
        let category = match report.code {
            ErrorCode::Storage => UiErrorCategory::Storage,
            ErrorCode::Template => UiErrorCategory::Template,
            ErrorCode::NotFound => UiErrorCategory::Missing,
            ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::Internal => return Self::from_message(context, report.message),
        };
        Self {
            category,
            context,
            message: report.message,
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("sqlite")
            || message_lower.contains("database")
            || message_lower.contains("storage")
            || message_lower.contains("disk")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("template") || message_lower.contains("placeholder") {
            UiErrorCategory::Template
        } else if message_lower.contains("not found")
            || message_lower.contains("unknown")
            || message_lower.contains("no mounted")
        {
            UiErrorCategory::Missing
        } else if message_lower.contains("invalid") || message_lower.contains("malformed") {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Startup and storage failures leave nothing to click; the user has to restart.
    pub fn requires_restart(&self) -> bool {
        self.context == UiErrorContext::BackendStartup || self.category == UiErrorCategory::Storage
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_codes_map_to_categories() {
        let err = UiError::from_report(
            UiErrorContext::Advance,
            ErrorReport::new(ErrorCode::NotFound, "no scene is mounted"),
        );
        assert_eq!(err.category(), UiErrorCategory::Missing);
        assert_eq!(err.context(), UiErrorContext::Advance);
        assert!(!err.requires_restart());
    }

    #[test]
    fn internal_reports_are_classified_by_message() {
        let err = UiError::from_report(
            UiErrorContext::Restart,
            ErrorReport::new(ErrorCode::Internal, "sqlite ping failed"),
        );
        assert_eq!(err.category(), UiErrorCategory::Storage);
        assert!(err.requires_restart());
    }

    #[test]
    fn startup_failures_require_restart() {
        let err = UiError::from_message(UiErrorContext::BackendStartup, "runtime build failed");
        assert_eq!(err.category(), UiErrorCategory::Unknown);
        assert!(err.requires_restart());
        assert_eq!(err.message(), "runtime build failed");
    }
}
