use std::fmt;
use std::time::Duration;

use crate::sha::Sha;

pub const NOT_FOUND_MESSAGE: &str = "The requested commit, tree or object could not be found.";
pub const INVALID_SHA_MESSAGE: &str = "That isn't a valid SHA ID.";

/// Failure of a single network fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 404 from the server
    NotFound { target: String },
    /// Any other transport or status failure
    Network { target: String, message: String },
    /// Gated fetch exceeded the configured detail timeout
    Timeout { target: String, after: Duration },
    /// Response arrived but could not be understood
    Decode { target: String, message: String },
}

impl FetchError {
    pub fn network(target: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::Network {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            FetchError::NotFound { target }
            | FetchError::Network { target, .. }
            | FetchError::Timeout { target, .. }
            | FetchError::Decode { target, .. } => target,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// Text shown in the user-facing alert
    pub fn user_message(&self) -> String {
        match self {
            FetchError::NotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            FetchError::Network { target, message } | FetchError::Decode { target, message } => {
                format!("There was an error fetching data from {target}:\n{message}")
            }
            FetchError::Timeout { target, after } => format!(
                "There was an error fetching data from {target}:\ntimed out after {}ms",
                after.as_millis()
            ),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound { target } => write!(f, "{target}: not found"),
            FetchError::Network { target, message } => write!(f, "{target}: {message}"),
            FetchError::Timeout { target, after } => {
                write!(f, "{target}: timed out after {}ms", after.as_millis())
            }
            FetchError::Decode { target, message } => {
                write!(f, "{target}: invalid response: {message}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Failure of a navigation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// Search input rejected before any network call
    InvalidSha(String),
    /// The server answered but the commit is still absent from the graph
    CommitNotFound(Sha),
    /// Tree path is not a known node
    UnknownNode(String),
    Fetch(FetchError),
}

impl NavError {
    pub fn user_message(&self) -> String {
        match self {
            NavError::InvalidSha(_) => INVALID_SHA_MESSAGE.to_string(),
            NavError::CommitNotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            NavError::UnknownNode(path) => format!("No tree entry named {path}"),
            NavError::Fetch(e) => e.user_message(),
        }
    }
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidSha(input) => write!(f, "invalid SHA: {input:?}"),
            NavError::CommitNotFound(sha) => write!(f, "commit {sha} not found in graph"),
            NavError::UnknownNode(path) => write!(f, "unknown tree node: {path}"),
            NavError::Fetch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for NavError {
    fn from(e: FetchError) -> Self {
        NavError::Fetch(e)
    }
}
