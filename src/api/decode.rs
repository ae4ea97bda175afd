//! Content negotiation and JSON body decoding

use axum::{
    body::Bytes,
    extract::Request,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use http_body_util::LengthLimitError;
use mime::Mime;
use serde::de::DeserializeOwned;
use std::error::Error as StdError;

use super::response::APPLICATION_JSON;
use crate::config::ApiConfig;
use crate::errors::{AnyProblem, ProblemType, UnsupportedMediaType};
use crate::problemf;

/// Check the request's declared media type.
///
/// A missing or empty Content-Type passes only when `allow_blank_content_type` is set. Any
/// `charset` parameter is rejected, `utf-8` included.
pub fn negotiate(headers: &HeaderMap, config: &ApiConfig) -> Result<(), UnsupportedMediaType> {
    let raw = headers
        .get(header::CONTENT_TYPE)
        .filter(|value| !value.as_bytes().is_empty());
    if raw.is_none() && config.allow_blank_content_type {
        return Ok(());
    }

    let raw_text = raw
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    let Some(media_type) = raw
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
    else {
        return Err(UnsupportedMediaType::json(raw_text));
    };

    if media_type.essence_str() != APPLICATION_JSON {
        return Err(UnsupportedMediaType::json(media_type.essence_str()));
    }

    if media_type.get_param(mime::CHARSET).is_some() {
        return Err(UnsupportedMediaType {
            accepted: vec![format!("{APPLICATION_JSON}; charset=utf-8")],
            received: raw_text,
            want_utf8: true,
        });
    }

    Ok(())
}

fn too_large(config: &ApiConfig, length: Option<usize>) -> AnyProblem {
    let ptype = ProblemType::from_status(StatusCode::PAYLOAD_TOO_LARGE);
    let problem = match length {
        Some(length) => problemf!(
            ptype,
            "",
            "Request body of {length} bytes exceeds the limit of {} bytes",
            config.max_body_bytes
        ),
        None => problemf!(
            ptype,
            "",
            "Request body exceeds the limit of {} bytes",
            config.max_body_bytes
        ),
    };
    problem.into()
}

fn exceeded_limit(err: &axum::Error) -> bool {
    std::iter::successors(Some(err as &(dyn StdError + 'static)), |cause| (*cause).source())
        .any(|cause| cause.is::<LengthLimitError>())
}

async fn read_body(body: axum::body::Body, config: &ApiConfig) -> Result<Bytes, AnyProblem> {
    axum::body::to_bytes(body, config.max_body_bytes)
        .await
        .map_err(|err| {
            if exceeded_limit(&err) {
                too_large(config, None)
            } else {
                problemf!(ProblemType::bad_request(), "", "Error reading request body: {err}")
                    .with_source(err)
                    .into()
            }
        })
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Negotiate, read and decode a JSON request body.
///
/// Returns the request head alongside the decoded value so the endpoint still sees
/// method, URI and headers.
pub async fn decode_json_body<T>(request: Request, config: &ApiConfig) -> Result<(Parts, T), AnyProblem>
where
    T: DeserializeOwned,
{
    let (parts, body) = request.into_parts();
    negotiate(&parts.headers, config)?;

    if let Some(length) = declared_length(&parts.headers) {
        if length > config.max_body_bytes {
            return Err(too_large(config, Some(length)));
        }
    }

    let bytes = read_body(body, config).await?;

    let value = serde_json::from_slice(&bytes).map_err(|err| {
        problemf!(ProblemType::bad_request(), "", "Error decoding JSON body: {err}").with_source(err)
    })?;

    Ok((parts, value))
}
