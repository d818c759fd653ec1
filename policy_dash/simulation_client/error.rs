use thiserror::Error;

/// Coarse failure class, used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced an HTTP response.
    Transport,
    /// The backend answered, but not with a usable result.
    Server,
}

impl FailureKind {
    /// Stable label for logs and events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Server => "server",
        }
    }
}

/// Errors raised while running a simulation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("network error: {0}")]
    Transport(String),
    /// Non-2xx status.
    #[error("request failed with status code {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// A 2xx body that is not a simulation result.
    #[error("malformed simulation response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Status { .. } | Self::Malformed(_) => FailureKind::Server,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
