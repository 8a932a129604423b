use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Transport error: {upstream} - {message}")]
    Transport { upstream: String, message: String },

    #[error("Upstream status error: {upstream} returned HTTP {status}")]
    UpstreamStatus { upstream: String, status: u16 },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Unavailable: {message}")]
    Unavailable { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn transport(upstream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            upstream: upstream.into(),
            message: message.into(),
        }
    }

    pub fn upstream_status(upstream: impl Into<String>, status: u16) -> Self {
        Self::UpstreamStatus {
            upstream: upstream.into(),
            status,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status carried by an upstream status error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
