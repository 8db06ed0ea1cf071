//! Error types for the Freenom session engine
//!
//! Every registrar operation returns [`Result`]. Only [`Error::Http`] is
//! retried by the retry budget; all other kinds surface immediately.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::RenewalOutcome;

/// Result type alias for session engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the session engine
#[derive(Error, Debug)]
pub enum Error {
    /// A single failed HTTP attempt (connection, timeout, non-200, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Retry budget exhausted for one HTTP step
    #[error("{step}: {detail}")]
    Transport {
        /// Operation and HTTP step that failed
        step: String,
        /// Message of the final attempt
        detail: String,
    },

    /// A renewal submission failed after earlier rows were already decided
    #[error("{source}")]
    RenewalAborted {
        /// Outcomes recorded before the failed submission
        completed: BTreeMap<String, RenewalOutcome>,
        /// Failure of the submission that aborted the run
        source: Box<Error>,
    },

    /// An anchor pattern did not match the markup it keys on
    #[error("Parse error: {0}")]
    Parse(String),

    /// The operation needs an authenticated session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Credentials were posted but the greeting banner never appeared
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The domain is not owned by the account, even after refreshing the listing
    #[error("Domain not exists: {0}")]
    DomainNotFound(String),

    /// The registrar answered with an error marker or without a success marker
    #[error("Rejected by registrar: {0}")]
    Rejected(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation deliberately not supported
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a transport error for an exhausted HTTP step
    pub fn transport(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transport {
            step: step.into(),
            detail: detail.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "domain not found" error
    pub fn domain_not_found(domain: impl Into<String>) -> Self {
        Self::DomainNotFound(domain.into())
    }

    /// Create a registrar rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a "not implemented" error
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a renewal failure together with the outcomes decided so far
    pub fn renewal_aborted(completed: BTreeMap<String, RenewalOutcome>, source: Error) -> Self {
        Self::RenewalAborted {
            completed,
            source: Box::new(source),
        }
    }

    /// Whether another attempt of the same HTTP step may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
