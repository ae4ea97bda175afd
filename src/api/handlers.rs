//! Endpoints served by the demo binary

use axum::http::{
    request::Parts,
    HeaderName, HeaderValue, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, Span};
use uuid::Uuid;

use super::response::{HeadersOnly, JsonBody, NoContent};
use crate::errors::{
    problem_or_fallback, register_problem, AnyProblem, Problem, ProblemData, ProblemType,
};
use crate::problemf;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// Health check endpoint
pub async fn health(_parts: Parts, _log: Span) -> Result<JsonBody<HealthResponse>, AnyProblem> {
    Ok(JsonBody::ok(HealthResponse {
        status: "healthy",
        service: "problem-kit",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SumRequest {
    pub values: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct SumResponse {
    pub sum: i64,
    pub count: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("sum of {count} values overflowed i64")]
pub struct Overflow {
    pub count: usize,
}

fn checked_sum(values: &[i64]) -> Result<i64, Overflow> {
    values
        .iter()
        .try_fold(0i64, |acc, value| acc.checked_add(*value))
        .ok_or(Overflow {
            count: values.len(),
        })
}

/// Add up a list of integers
pub async fn sum(_parts: Parts, body: SumRequest, _log: Span) -> Result<JsonBody<SumResponse>, AnyProblem> {
    if body.values.is_empty() {
        return Err(problemf!(ProblemType::unprocessable_entity(), "", "values must not be empty").into());
    }

    let sum = checked_sum(&body.values).map_err(|err| {
        problem_or_fallback(
            err,
            ProblemType::unprocessable_entity(),
            "",
            "The sum does not fit in a 64-bit integer",
        )
    })?;
    debug!(count = body.values.len(), sum, "Computed sum");

    Ok(JsonBody::ok(SumResponse {
        sum,
        count: body.values.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DivideRequest {
    pub dividend: f64,
    pub divisor: f64,
}

#[derive(Debug, Serialize)]
pub struct DivideResponse {
    pub quotient: f64,
}

/// Domain problem raised by [`divide`].
#[derive(Debug, thiserror::Error)]
#[error("refused to divide {dividend} by zero")]
pub struct DivisionByZero {
    pub dividend: f64,
}

impl Problem for DivisionByZero {
    fn problem_type(&self) -> ProblemType {
        ProblemType::unprocessable_entity()
            .with_title("Division by zero")
            .with_uri("/problems/division-by-zero")
    }

    fn problem_detail(&self) -> String {
        "The divisor must not be zero".to_string()
    }

    fn problem_data(&self) -> ProblemData {
        let mut data = ProblemData::new();
        data.insert("dividend".to_string(), json!(self.dividend));
        data
    }

    fn error_data(&self) -> ProblemData {
        let mut data = ProblemData::new();
        data.insert("operation".to_string(), json!("divide"));
        data
    }
}

/// Make the problems raised here recognisable by [`problem_or_fallback`] when wrapped.
pub fn register_problems() {
    register_problem::<DivisionByZero>();
}

/// Divide two numbers
pub async fn divide(_parts: Parts, body: DivideRequest, _log: Span) -> Result<JsonBody<DivideResponse>, AnyProblem> {
    if body.divisor == 0.0 {
        return Err(DivisionByZero {
            dividend: body.dividend,
        }
        .into());
    }

    Ok(JsonBody::ok(DivideResponse {
        quotient: body.dividend / body.divisor,
    }))
}

/// Report a fresh session id in a header, with no body
pub async fn open_session(_parts: Parts, _log: Span) -> Result<HeadersOnly, AnyProblem> {
    let session_id = Uuid::new_v4().to_string();
    let value = HeaderValue::from_str(&session_id).map_err(|err| {
        problem_or_fallback(err, ProblemType::internal_error(), "", "Could not open a session")
    })?;

    Ok(HeadersOnly::new(StatusCode::CREATED).header(HeaderName::from_static(SESSION_HEADER), value))
}

/// End the caller's session
pub async fn close_session(parts: Parts, _log: Span) -> Result<NoContent, AnyProblem> {
    if !parts.headers.contains_key(SESSION_HEADER) {
        return Err(problemf!(
            ProblemType::bad_request(),
            parts.uri.path(),
            "The {SESSION_HEADER} header is required"
        )
        .into());
    }
    Ok(NoContent)
}
