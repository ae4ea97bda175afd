//! Adapters turning typed endpoint functions into request handlers.
//!
//! An endpoint is an async function taking the request head, the decoded body and the
//! endpoint's tracing span, and returning either an [`HttpResponse`] or a problem:
//!
//! ```
//! use std::sync::Arc;
//! use axum::{http::request::Parts, routing::post_service, Router};
//! use problem_kit::{handle_json_request, AnyProblem, ApiConfig, JsonBody};
//! use serde::Deserialize;
//! use tracing::Span;
//!
//! #[derive(Deserialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! async fn greet(_parts: Parts, body: Greeting, _log: Span) -> Result<JsonBody<String>, AnyProblem> {
//!     Ok(JsonBody::ok(format!("hello {}", body.name)))
//! }
//!
//! let config = Arc::new(ApiConfig::default());
//! let app: Router = Router::new().route("/greet", post_service(handle_json_request("greet", config, greet)));
//! ```
//!
//! Every request produces exactly one response and one log record from the adapter.

use axum::{
    extract::Request,
    http::request::Parts,
    response::Response,
};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::{
    convert::Infallible,
    future::Future,
    marker::PhantomData,
    sync::Arc,
    task::{Context, Poll},
};
use tower::Service;
use tracing::{debug, info_span, Instrument, Span};

use super::decode::decode_json_body;
use super::response::HttpResponse;
use crate::config::ApiConfig;
use crate::errors::{log_problem, AnyProblem, ProblemJson};

fn write_problem(endpoint: &str, config: &ApiConfig, problem: AnyProblem) -> Response {
    log_problem(endpoint, &*problem);
    ProblemJson::new(problem).into_http_response(&config.json)
}

fn finish<T>(endpoint: &str, config: &ApiConfig, outcome: Result<T, AnyProblem>) -> Response
where
    T: HttpResponse,
{
    match outcome {
        Ok(response) => {
            debug!(endpoint = %endpoint, "Finished calling {endpoint}");
            response.into_http_response(&config.json)
        }
        Err(problem) => write_problem(endpoint, config, problem),
    }
}

fn endpoint_span(endpoint: &str) -> Span {
    info_span!("endpoint", endpoint = %endpoint)
}

/// Handler for endpoints that take a JSON request body of type `S`.
pub struct JsonBodyHandler<F, S> {
    name: Arc<str>,
    config: Arc<ApiConfig>,
    endpoint: Arc<F>,
    _body: PhantomData<fn() -> S>,
}

impl<F, S> JsonBodyHandler<F, S> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F, S> Clone for JsonBodyHandler<F, S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: Arc::clone(&self.config),
            endpoint: Arc::clone(&self.endpoint),
            _body: PhantomData,
        }
    }
}

/// Wrap `endpoint` so its body is decoded from JSON before it runs.
///
/// `name` identifies the endpoint in logs.
pub fn handle_json_request<F, Fut, S, T>(
    name: impl Into<String>,
    config: Arc<ApiConfig>,
    endpoint: F,
) -> JsonBodyHandler<F, S>
where
    F: Fn(Parts, S, Span) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AnyProblem>> + Send + 'static,
    S: DeserializeOwned + Send + 'static,
    T: HttpResponse + Send + 'static,
{
    JsonBodyHandler {
        name: Arc::from(name.into()),
        config,
        endpoint: Arc::new(endpoint),
        _body: PhantomData,
    }
}

impl<F, Fut, S, T> Service<Request> for JsonBodyHandler<F, S>
where
    F: Fn(Parts, S, Span) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AnyProblem>> + Send + 'static,
    S: DeserializeOwned + Send + 'static,
    T: HttpResponse + Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let (parts, body) = match decode_json_body::<S>(request, &handler.config).await {
                Ok(decoded) => decoded,
                Err(problem) => return Ok(write_problem(&handler.name, &handler.config, problem)),
            };

            let span = endpoint_span(&handler.name);
            let outcome = (handler.endpoint)(parts, body, span.clone())
                .instrument(span)
                .await;
            Ok(finish(&handler.name, &handler.config, outcome))
        })
    }
}

/// Handler for endpoints that ignore the request body.
pub struct BlankBodyHandler<F> {
    name: Arc<str>,
    config: Arc<ApiConfig>,
    endpoint: Arc<F>,
}

impl<F> BlankBodyHandler<F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F> Clone for BlankBodyHandler<F> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: Arc::clone(&self.config),
            endpoint: Arc::clone(&self.endpoint),
        }
    }
}

/// Wrap `endpoint` without decoding the body; no Content-Type is required.
pub fn handle_blank_request<F, Fut, T>(
    name: impl Into<String>,
    config: Arc<ApiConfig>,
    endpoint: F,
) -> BlankBodyHandler<F>
where
    F: Fn(Parts, Span) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AnyProblem>> + Send + 'static,
    T: HttpResponse + Send + 'static,
{
    BlankBodyHandler {
        name: Arc::from(name.into()),
        config,
        endpoint: Arc::new(endpoint),
    }
}

impl<F, Fut, T> Service<Request> for BlankBodyHandler<F>
where
    F: Fn(Parts, Span) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AnyProblem>> + Send + 'static,
    T: HttpResponse + Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let handler = self.clone();
        let (parts, _body) = request.into_parts();
        Box::pin(async move {
            let span = endpoint_span(&handler.name);
            let outcome = (handler.endpoint)(parts, span.clone()).instrument(span).await;
            Ok(finish(&handler.name, &handler.config, outcome))
        })
    }
}
