use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::json;

use super::problem::{Problem, ProblemData};
use super::problem_type::ProblemType;

/// The request body was sent with a media type the endpoint does not decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported Media Type: expecting {}, received {received}", .accepted.join(", "))]
pub struct UnsupportedMediaType {
    pub accepted: Vec<String>,
    pub received: String,
    pub want_utf8: bool,
}

impl UnsupportedMediaType {
    /// Rejection for an endpoint that only takes `application/json` bodies.
    pub fn json(received: impl Into<String>) -> Self {
        Self {
            accepted: vec![mime::APPLICATION_JSON.to_string()],
            received: received.into(),
            want_utf8: true,
        }
    }
}

impl Problem for UnsupportedMediaType {
    fn problem_type(&self) -> ProblemType {
        ProblemType::from_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }

    fn problem_detail(&self) -> String {
        format!("Accepts {}, received {}", self.accepted.join(", "), self.received)
    }

    fn set_problem_headers(&self, headers: &mut HeaderMap) {
        if let Ok(accept) = HeaderValue::from_str(&self.accepted.join(",")) {
            headers.insert(header::ACCEPT, accept);
        }
        if self.want_utf8 {
            headers.insert(header::ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        }
    }

    fn problem_data(&self) -> ProblemData {
        let mut data = ProblemData::new();
        data.insert("accepted_types".to_string(), json!(self.accepted));
        data.insert("received_type".to_string(), json!(self.received));
        data
    }
}
