use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use tracing::Level;

/// Raised when a raw status code falls outside 100..=599.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid HTTP status code: {0}")]
pub struct InvalidStatus(pub u16);

/// Problem type from RFC 7807.
///
/// Extends an HTTP status code with an optional URI for further specificity.
/// The title is descriptive text but should stay consistent for a given problem type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemType {
    pub title: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Identifies the problem class; empty means none and is left out of the body
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(skip)]
    pub log_level: Level,
}

fn serialize_status<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Severity used when a problem with this status is logged
pub fn log_level_for(status: StatusCode) -> Level {
    match status.as_u16() {
        403 | 502 => Level::WARN,
        code if code >= 500 => Level::ERROR,
        _ => Level::DEBUG,
    }
}

impl ProblemType {
    /// Problem type for an HTTP status code with no further specificity.
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            title: status.canonical_reason().unwrap_or_default().to_string(),
            status,
            uri: String::new(),
            log_level: log_level_for(status),
        }
    }

    pub fn from_u16(code: u16) -> Result<Self, InvalidStatus> {
        if !(100..=599).contains(&code) {
            return Err(InvalidStatus(code));
        }
        StatusCode::from_u16(code)
            .map(Self::from_status)
            .map_err(|_| InvalidStatus(code))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }
}

/// Helpers for the statuses the decoder and most endpoints reach for
impl ProblemType {
    pub fn bad_request() -> Self {
        Self::from_status(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::from_status(StatusCode::NOT_FOUND)
    }

    pub fn unprocessable_entity() -> Self {
        Self::from_status(StatusCode::UNPROCESSABLE_ENTITY)
    }

    pub fn internal_error() -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
