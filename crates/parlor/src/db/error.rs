//! Storage error types.

use derive_more::{Display, Error};
use tracing::instrument;

use crate::SessionKey;

/// Storage error with location tracking and the store call it came from.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error{}: {} at {}:{}", context(operation, session), message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Store call that failed, such as `"upsert"`.
    pub operation: Option<&'static str>,
    /// Session the call was about, if any.
    pub session: Option<String>,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

fn context(operation: &Option<&'static str>, session: &Option<String>) -> String {
    match (operation, session) {
        (Some(op), Some(key)) => format!(" in {} of {}", op, key),
        (Some(op), None) => format!(" in {}", op),
        (None, Some(key)) => format!(" for {}", key),
        (None, None) => String::new(),
    }
}

impl StoreError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            operation: None,
            session: None,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Names the store call that failed.
    pub fn during(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Attaches the session the failed call was about.
    pub fn for_session(mut self, key: &SessionKey) -> Self {
        self.session = Some(key.to_string());
        self
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
