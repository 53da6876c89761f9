//! Error types for the OData query executor.

use std::fmt;

use thiserror::Error;

use crate::localizer::Localizer;

/// A specialized Result type for query execution.
pub type Result<T> = std::result::Result<T, Error>;

/// The pipeline stage at which a hook short-circuited a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// Before the request was sent.
    Request,
    /// After the response arrived, before decoding.
    Response,
    /// After decoding, before the envelope reached the caller.
    Result,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::Request => "request",
            HookStage::Response => "response",
            HookStage::Result => "result",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while executing an OData query.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-success status code.
    #[error("data read failed with HTTP status {status}")]
    DataReadStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body could not be decoded as a query envelope.
    #[error("could not parse response body: {message}")]
    DataParse {
        /// The raw response body.
        body: String,
        /// Decoder message.
        message: String,
    },

    /// The envelope was decoded but carried no `count`.
    #[error("response envelope has no count")]
    DataReadEmpty,

    /// Transport-level failure (connection, TLS, timeout).
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The base address and entity set do not form a valid URL.
    #[error("invalid query url: {0}")]
    InvalidUrl(String),

    /// The call was cancelled through its cancellation token.
    #[error("query was cancelled")]
    Cancelled,

    /// A hook reported the call as handled; the caller must not proceed.
    #[error("query handled by {stage} hook")]
    Handled {
        /// Stage that vetoed the call.
        stage: HookStage,
    },
}

impl Error {
    /// Returns the localization key used to present this error to a user.
    pub fn localization_key(&self) -> &'static str {
        match self {
            Error::DataReadStatus { .. } => "DataReadStatusError",
            Error::DataParse { .. } => "DataParseError",
            Error::DataReadEmpty => "DataReadEmptyError",
            Error::Http(_) | Error::InvalidUrl(_) => "DataReadNetworkError",
            Error::Cancelled | Error::Handled { .. } => "DataReadCancelled",
        }
    }

    /// Resolves a user-facing message through the given localizer.
    pub fn localized(&self, localizer: &dyn Localizer) -> String {
        let key = self.localization_key();
        match self {
            Error::DataReadStatus { status, .. } => localizer.get(key, &[&status.to_string()]),
            Error::DataParse { body, .. } => localizer.get(key, &[body]),
            Error::Http(e) => localizer.get(key, &[&e.to_string()]),
            Error::InvalidUrl(url) => localizer.get(key, &[url]),
            _ => localizer.get(key, &[]),
        }
    }

    /// Returns the HTTP status code for status errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::DataReadStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true when the call was stopped on purpose (cancelled or handled by a hook).
    pub fn is_silent(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Handled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localizer::DefaultLocalizer;

    #[test]
    fn test_status_error_carries_code() {
        let error = Error::DataReadStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.localization_key(), "DataReadStatusError");
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn test_parse_error_localizes_with_body() {
        let error = Error::DataParse {
            body: "<html>oops</html>".to_string(),
            message: "expected value".to_string(),
        };
        let message = error.localized(&DefaultLocalizer);
        assert!(message.contains("<html>oops</html>"));
    }

    #[test]
    fn test_empty_error_key() {
        assert_eq!(Error::DataReadEmpty.localization_key(), "DataReadEmptyError");
        assert_eq!(Error::DataReadEmpty.status(), None);
    }

    #[test]
    fn test_silent_errors() {
        assert!(Error::Cancelled.is_silent());
        assert!(Error::Handled {
            stage: HookStage::Request
        }
        .is_silent());
        assert!(!Error::DataReadEmpty.is_silent());
    }

    #[test]
    fn test_hook_stage_display() {
        let error = Error::Handled {
            stage: HookStage::Response,
        };
        assert_eq!(error.to_string(), "query handled by response hook");
    }
}
