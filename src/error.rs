use thiserror::Error;

/// Errors that can occur while processing a gateway request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch URL {url}: {message}")]
    FetchFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} is not configured: {message}")]
    NotConfigured { provider: String, message: String },

    #[error("{provider} API error: {message}")]
    Upstream {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`], stable across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request fields.
    InvalidInput,
    /// The URL to process could not be fetched.
    FetchFailed,
    /// The selected provider lacks a credential.
    NotConfigured,
    /// A backend returned an error, broke the connection, or sent garbage.
    UpstreamFailure,
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn not_configured(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::NotConfigured {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Upstream {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Map a non-success backend reply into an upstream failure.
    ///
    /// When the body is JSON carrying an `error` string or an
    /// `error.message` string, that text is used instead of the raw body.
    pub fn from_status(provider: impl Into<String>, status: u16, body: &str) -> Self {
        let detail = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
        let message = if detail.is_empty() {
            format!("{status}")
        } else {
            format!("{status} - {detail}")
        };

        Error::Upstream {
            provider: provider.into(),
            status: Some(status),
            message,
        }
    }

    /// Map a connection-level failure talking to a backend.
    pub fn transport(provider: impl Into<String>, base_url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request to {base_url} timed out: {err}")
        } else if err.is_connect() {
            format!("failed to connect to {base_url}: {err}")
        } else {
            format!("request to {base_url} failed: {err}")
        };

        Error::Upstream {
            provider: provider.into(),
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::FetchFailed { .. } => ErrorKind::FetchFailed,
            Error::NotConfigured { .. } => ErrorKind::NotConfigured,
            Error::Upstream { .. } | Error::Config(_) => ErrorKind::UpstreamFailure,
        }
    }

    /// HTTP status a front-end should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::FetchFailed => 400,
            ErrorKind::NotConfigured => 503,
            ErrorKind::UpstreamFailure => 502,
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;

    match error {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Object(details) => details
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}
