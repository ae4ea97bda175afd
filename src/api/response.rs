//! Success responses.
//!
//! | Type | Status | Body |
//! |------|--------|------|
//! | [`JsonBody`] | caller's | JSON serialized payload |
//! | [`NoContent`] | 204 | empty |
//! | [`HeadersOnly`] | caller's | empty |
//!
//! Every writer finalizes headers first, then the status, then the body, the same order
//! [`ProblemJson`](crate::errors::ProblemJson) uses.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;

use crate::json::JsonFormat;

pub const APPLICATION_JSON: &str = "application/json";

/// Something that can be written as a complete HTTP response.
///
/// Writing consumes the value, so each response is written exactly once.
pub trait HttpResponse {
    fn into_http_response(self, json: &JsonFormat) -> Response;
}

pub(crate) fn assemble(headers: HeaderMap, status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.headers_mut() = headers;
    *response.status_mut() = status;
    response
}

fn empty_body_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    headers
}

/// Typed JSON body.
#[derive(Debug, Clone)]
pub struct JsonBody<T> {
    pub status: StatusCode,
    pub extra_headers: HeaderMap,
    pub body: T,
}

impl<T: Serialize> JsonBody<T> {
    /// 200 OK with no extra headers
    pub fn ok(body: T) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn created(body: T) -> Self {
        Self::with_status(StatusCode::CREATED, body)
    }

    pub fn with_status(status: StatusCode, body: T) -> Self {
        Self {
            status,
            extra_headers: HeaderMap::new(),
            body,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }
}

impl<T: Serialize> HttpResponse for JsonBody<T> {
    /// # Panics
    ///
    /// If the payload cannot be serialized, which is a type error in `T`.
    fn into_http_response(self, json: &JsonFormat) -> Response {
        let body = match json.to_vec(&self.body) {
            Ok(bytes) => bytes,
            Err(err) => panic!("error serializing JSON response: {err}"),
        };

        let mut headers = self.extra_headers;
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        assemble(headers, self.status, Body::from(body))
    }
}

/// 204 with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl HttpResponse for NoContent {
    fn into_http_response(self, _json: &JsonFormat) -> Response {
        assemble(
            empty_body_headers(HeaderMap::new()),
            StatusCode::NO_CONTENT,
            Body::empty(),
        )
    }
}

/// Status and headers with an empty body.
#[derive(Debug, Clone)]
pub struct HeadersOnly {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl HeadersOnly {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl HttpResponse for HeadersOnly {
    fn into_http_response(self, _json: &JsonFormat) -> Response {
        assemble(empty_body_headers(self.headers), self.status, Body::empty())
    }
}
