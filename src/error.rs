use thiserror::Error;

/// Main error type for subvend operations
#[derive(Debug, Error)]
pub enum SubvendError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error(
        "Insufficient permissions on billing scope '{billing_scope}':\n\
         - Ensure the invoice section exists and belongs to the billing profile.\n\
         - Grant the service principal 'Azure subscription creator' on that invoice section.\n\
         Response: {body}"
    )]
    PermissionError { billing_scope: String, body: String },

    #[error("Alias '{alias}' was still throttled (HTTP 429) after {attempts} attempts")]
    ThrottleExhausted { alias: String, attempts: usize },

    #[error("Alias '{alias}' submission rejected: HTTP {status}: {body}")]
    SubmissionError {
        alias: String,
        status: u16,
        body: String,
    },

    /// `status` is `None` when the request never got a response
    #[error(
        "Polling alias '{alias}' failed{}: {body}",
        .status.map(|s| format!(" with HTTP {}", s)).unwrap_or_default()
    )]
    PollRequestError {
        alias: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Provisioning of alias '{alias}' ended in state {state}: {body}")]
    ProvisioningFailed {
        alias: String,
        state: String,
        body: String,
    },

    #[error(
        "Timed out after {elapsed_secs}s waiting for alias '{alias}' (last state: {last_state}). \
         The operation may still complete; resume with `subvend status {alias}`"
    )]
    ProvisioningTimeout {
        alias: String,
        last_state: String,
        elapsed_secs: u64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SubvendError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn permission<S: Into<String>, B: Into<String>>(billing_scope: S, body: B) -> Self {
        Self::PermissionError {
            billing_scope: billing_scope.into(),
            body: body.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Process exit code for this error kind
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthenticationError(_) => 2,
            Self::PermissionError { .. } => 3,
            Self::ThrottleExhausted { .. } => 4,
            Self::SubmissionError { .. } => 5,
            Self::PollRequestError { .. } => 6,
            Self::ProvisioningFailed { .. } => 7,
            Self::ProvisioningTimeout { .. } => 8,
            Self::ConfigError(_) | Self::InvalidArgument(_) => 10,
            _ => 1,
        }
    }
}

/// Result type alias for subvend operations
pub type Result<T> = std::result::Result<T, SubvendError>;
