//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`FetchError`]: The error returned by every remote fetch
//! - [`FailureKind`]: The coarse failure taxonomy the schedulers reason about
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::fmt;

use thiserror::Error;

use crate::models::EndpointKind;

/// Coarse classification of a failed fetch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Rate limited (429) or server error (5xx).
    Transient,
    /// Unauthorized (401) or forbidden (403).
    Auth,
    /// Any other 4xx response.
    Client,
    /// Connection, DNS or timeout failure. No response was received.
    Network,
    /// The response arrived but could not be decoded or reported failure.
    Validation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Auth => write!(f, "auth"),
            Self::Client => write!(f, "client"),
            Self::Network => write!(f, "network"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Errors that can occur while fetching from the remote market.
///
/// Each variant maps onto exactly one [`FailureKind`] and one [`RetryClass`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// Rate limited (HTTP 429) or the server failed (HTTP 5xx).
    #[error("Transient failure on {endpoint}: HTTP {status}")]
    Transient {
        /// The endpoint that failed
        endpoint: EndpointKind,
        /// HTTP status code
        status: u16,
    },

    /// The remote rejected our credentials (HTTP 401/403).
    #[error("Authentication rejected on {endpoint}: HTTP {status}")]
    Auth {
        /// The endpoint that failed
        endpoint: EndpointKind,
        /// HTTP status code
        status: u16,
    },

    /// Any other client error (HTTP 4xx).
    #[error("Client error on {endpoint}: HTTP {status}")]
    Client {
        /// The endpoint that failed
        endpoint: EndpointKind,
        /// HTTP status code
        status: u16,
    },

    /// Transport failure: connect, DNS, TLS or timeout.
    #[error("Network error on {endpoint}: {message}")]
    Network {
        /// The endpoint that failed
        endpoint: EndpointKind,
        /// Description of the transport failure
        message: String,
    },

    /// The payload was malformed or reported `success: false`.
    #[error("Invalid payload from {endpoint}: {message}")]
    Validation {
        /// The endpoint that failed
        endpoint: EndpointKind,
        /// Description of the validation failure
        message: String,
    },
}

impl FetchError {
    /// Classify a non-success HTTP status.
    pub fn from_status(endpoint: EndpointKind, status: u16) -> Self {
        match status {
            429 | 500..=599 => Self::Transient { endpoint, status },
            401 | 403 => Self::Auth { endpoint, status },
            _ => Self::Client { endpoint, status },
        }
    }

    /// Classify a transport-level reqwest error.
    ///
    /// Errors carrying a status (from `error_for_status`) are classified by
    /// that status; everything else, timeouts included, is a network failure.
    pub fn from_reqwest(endpoint: EndpointKind, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(endpoint, status.as_u16());
        }
        if err.is_decode() {
            return Self::Validation {
                endpoint,
                message: err.to_string(),
            };
        }
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self::Network { endpoint, message }
    }

    /// Returns the endpoint this error came from.
    pub fn endpoint(&self) -> EndpointKind {
        match self {
            Self::Transient { endpoint, .. }
            | Self::Auth { endpoint, .. }
            | Self::Client { endpoint, .. }
            | Self::Network { endpoint, .. }
            | Self::Validation { endpoint, .. } => *endpoint,
        }
    }

    /// Returns the HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. }
            | Self::Auth { status, .. }
            | Self::Client { status, .. } => Some(*status),
            Self::Network { .. } | Self::Validation { .. } => None,
        }
    }

    /// Returns the coarse failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient { .. } => FailureKind::Transient,
            Self::Auth { .. } => FailureKind::Auth,
            Self::Client { .. } => FailureKind::Client,
            Self::Network { .. } => FailureKind::Network,
            Self::Validation { .. } => FailureKind::Validation,
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use steamtrack_market_data::errors::{FetchError, RetryClass};
    /// use steamtrack_market_data::EndpointKind;
    ///
    /// let error = FetchError::from_status(EndpointKind::PriceOverview, 429);
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = FetchError::from_status(EndpointKind::PriceOverview, 404);
    /// assert_eq!(error.retry_class(), RetryClass::SkipCycle);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self.kind() {
            FailureKind::Transient | FailureKind::Network | FailureKind::Auth => {
                RetryClass::WithBackoff
            }
            FailureKind::Client | FailureKind::Validation => RetryClass::SkipCycle,
        }
    }
}
