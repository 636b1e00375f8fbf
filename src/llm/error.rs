//! Model backend failures
//!
//! Covers the ways a provider call can go wrong: rejected requests,
//! deadline misses, throttling, and the catch-all for everything else.
//! Stage code never matches on these; it stringifies them into the
//! record so a failed stage leaves a readable trace.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The provider rejected or failed the request
    #[error("API error{}: {message}", fmt_status(.status_code))]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// No reply within the configured deadline
    #[error("Request timed out after {seconds} seconds")]
    TimeoutError { seconds: u64 },

    /// The provider asked us to slow down
    #[error("Rate limit exceeded{}", fmt_retry(.retry_after))]
    RateLimitError { retry_after: Option<u64> },

    #[error("{message}")]
    Other { message: String },
}

fn fmt_status(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

fn fmt_retry(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(seconds) => format!(", retry after {} seconds", seconds),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_includes_status_when_present() {
        let err = BackendError::ApiError {
            message: "bad request".to_string(),
            status_code: Some(400),
        };
        assert_eq!(err.to_string(), "API error (400): bad request");

        let err = BackendError::ApiError {
            message: "connection refused".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "API error: connection refused");
    }

    #[test]
    fn test_timeout_mentions_deadline() {
        let err = BackendError::TimeoutError { seconds: 90 };
        assert_eq!(err.to_string(), "Request timed out after 90 seconds");
    }

    #[test]
    fn test_rate_limit_with_and_without_hint() {
        let hinted = BackendError::RateLimitError {
            retry_after: Some(12),
        };
        assert_eq!(
            hinted.to_string(),
            "Rate limit exceeded, retry after 12 seconds"
        );

        let bare = BackendError::RateLimitError { retry_after: None };
        assert_eq!(bare.to_string(), "Rate limit exceeded");
    }
}
