//! Error types for the functional test harness

use std::time::Duration;

use thiserror::Error;

use crate::registry::ProviderKind;

/// Result type alias using the harness error
pub type HarnessResult<T> = Result<T, HarnessError>;

/// WebDriver error codes that describe a page that has not settled yet.
const TRANSIENT_DRIVER_CODES: &[&str] = &[
    "no such element",
    "stale element reference",
    "element not interactable",
    "element click intercepted",
];

#[derive(Error, Debug)]
pub enum HarnessError {
    // === Registry misconfiguration ===
    #[error("Unknown {kind} '{name}': it was never registered")]
    UnknownService { kind: ProviderKind, name: String },

    #[error("{kind} '{name}' is already registered")]
    DuplicateService { kind: ProviderKind, name: String },

    #[error("Circular dependency while resolving: {chain}")]
    CircularDependency { chain: String },

    #[error("{kind} '{name}' is registered as {registered}, requested as {requested}")]
    ServiceTypeMismatch {
        kind: ProviderKind,
        name: String,
        registered: &'static str,
        requested: &'static str,
    },

    // === Retry ===
    #[error("{message} (gave up after {attempts} attempt(s) in {elapsed:?}): {last}")]
    RetryExhausted {
        message: String,
        attempts: u32,
        elapsed: Duration,
        #[source]
        last: Box<HarnessError>,
    },

    /// A condition that is expected to become true once the UI settles.
    #[error("{0}")]
    NotReady(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    // === UI actions ===
    #[error("UI action '{action}' failed: {reason}")]
    UiAction { action: String, reason: String },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Caller marked this failure as definitive; retries stop immediately.
    #[error("{0}")]
    Fatal(String),

    // === Collaborators ===
    #[error("WebDriver error '{code}': {message}")]
    Driver { code: String, message: String },

    #[error("Settings store error: {0}")]
    Settings(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    /// Shorthand for a transient "keep polling" failure.
    pub fn not_ready(message: impl Into<String>) -> Self {
        HarnessError::NotReady(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        HarnessError::Fatal(message.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }

    pub fn ui_action(action: impl Into<String>, reason: impl ToString) -> Self {
        HarnessError::UiAction {
            action: action.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the retry executor may try again after this error.
    ///
    /// Only failures that can plausibly clear up by waiting for the UI are
    /// retryable. Configuration problems, explicit fatal errors and failed UI
    /// actions (which already spent their own retry budget) stop the loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            HarnessError::NotReady(_)
            | HarnessError::ElementNotFound { .. }
            | HarnessError::Assertion(_) => true,
            HarnessError::Driver { code, .. } => TRANSIENT_DRIVER_CODES.contains(&code.as_str()),
            HarnessError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Registry or configuration mistakes; never worth another attempt.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarnessError::UnknownService { .. }
                | HarnessError::DuplicateService { .. }
                | HarnessError::CircularDependency { .. }
                | HarnessError::ServiceTypeMismatch { .. }
                | HarnessError::Config(_)
        )
    }

    /// Innermost cause, unwrapping retry exhaustion.
    pub fn root_cause(&self) -> &HarnessError {
        match self {
            HarnessError::RetryExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(HarnessError::not_ready("dialog not open").is_retryable());
        assert!(HarnessError::ElementNotFound {
            selector: "[data-test-subj=\"x\"]".into()
        }
        .is_retryable());
        assert!(HarnessError::Driver {
            code: "stale element reference".into(),
            message: "gone".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        let unknown = HarnessError::UnknownService {
            kind: ProviderKind::Service,
            name: "nope".into(),
        };
        assert!(!unknown.is_retryable());
        assert!(!HarnessError::fatal("stop").is_retryable());
        assert!(!HarnessError::ui_action("click", "bad selector").is_retryable());
        assert!(!HarnessError::Driver {
            code: "invalid selector".into(),
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_root_cause_unwraps_exhaustion() {
        let err = HarnessError::RetryExhausted {
            message: "waiting".into(),
            attempts: 3,
            elapsed: Duration::from_millis(30),
            last: Box::new(HarnessError::not_ready("still closed")),
        };
        assert!(matches!(err.root_cause(), HarnessError::NotReady(m) if m == "still closed"));
        assert!(err.to_string().contains("3 attempt(s)"));
    }
}
