//! Structured results returned across the service boundary.
//!
//! Every `DependencyService` operation answers with a [`Response`]: either
//! `success: true` plus data, or `success: false` plus a non-empty list of
//! human-readable errors. Rejections never surface as panics or `Err`.

use serde::{Deserialize, Serialize};

use crate::error::{DependencyError, ErrorKind};

/// Outcome of a service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Reasons for failure; empty on success.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Category of the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> Response<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
            error_kind: None,
        }
    }

    /// A failed response describing `error`.
    #[must_use]
    pub fn rejected(error: &DependencyError) -> Self {
        Self {
            success: false,
            data: None,
            errors: error.messages(),
            error_kind: Some(error.kind()),
        }
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Borrow the payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// First error message, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Convert into a plain `Result`, keeping the error list on failure.
    ///
    /// # Errors
    ///
    /// Returns the error messages when the response is a failure.
    pub fn into_result(self) -> std::result::Result<T, Vec<String>> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(self.errors),
        }
    }
}

impl<T> From<std::result::Result<T, DependencyError>> for Response<T> {
    fn from(result: std::result::Result<T, DependencyError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::rejected(&error),
        }
    }
}
