//! Problem documents and typed endpoint adapters for JSON HTTP APIs.
//!
//! Endpoints return [`JsonBody`], [`NoContent`] or [`HeadersOnly`] on success and an
//! [`AnyProblem`] on failure. The adapters in [`api::handler`] decode request bodies, call the
//! endpoint and write whichever of the two it produced.

pub mod api;
pub mod config;
pub mod errors;
pub mod json;
pub mod server;

#[cfg(test)]
mod testing;

pub use api::{
    decode_json_body, handle_blank_request, handle_json_request, HeadersOnly, HttpResponse,
    JsonBody, NoContent,
};
pub use config::{ApiConfig, Config};
pub use errors::{
    log_problem, problem_or_fallback, register_problem, AnyProblem, BasicProblem, Problem, ProblemData, ProblemJson,
    ProblemType, UnsupportedMediaType,
};
pub use json::JsonFormat;
