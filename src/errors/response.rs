use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::problem::{AnyProblem, ProblemData};
use super::problem_type::ProblemType;
use crate::api::response::{assemble, HttpResponse};
use crate::json::JsonFormat;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Members owned by the problem envelope; problem data may not redefine them.
const RESERVED_MEMBERS: [&str; 5] = ["title", "status", "type", "instance", "detail"];

#[derive(Serialize)]
struct ProblemBody<'a> {
    #[serde(flatten)]
    ptype: ProblemType,
    #[serde(skip_serializing_if = "String::is_empty")]
    instance: String,
    detail: String,
    #[serde(flatten)]
    data: &'a ProblemData,
}

/// A problem written as an `application/problem+json` response.
#[derive(Debug)]
pub struct ProblemJson {
    problem: AnyProblem,
}

impl ProblemJson {
    pub fn new(problem: impl Into<AnyProblem>) -> Self {
        Self {
            problem: problem.into(),
        }
    }

    pub fn problem(&self) -> &AnyProblem {
        &self.problem
    }

    /// Serialized problem document.
    ///
    /// # Panics
    ///
    /// If the problem data redefines a reserved member or cannot be serialized. Both are
    /// programming errors in the problem type, not request failures.
    pub fn raw_body(&self, json: &JsonFormat) -> Vec<u8> {
        let data = self.problem.problem_data();
        if let Some(member) = data.keys().find(|key| RESERVED_MEMBERS.contains(&key.as_str())) {
            panic!("problem data redefines reserved member `{member}`");
        }

        let body = ProblemBody {
            ptype: self.problem.problem_type(),
            instance: self.problem.problem_instance(),
            detail: self.problem.problem_detail(),
            data: &data,
        };
        match json.to_vec(&body) {
            Ok(bytes) => bytes,
            Err(err) => panic!("problem body failed to serialize: {err}"),
        }
    }
}

impl HttpResponse for ProblemJson {
    fn into_http_response(self, json: &JsonFormat) -> Response {
        let body = self.raw_body(json);

        let mut headers = HeaderMap::new();
        self.problem.set_problem_headers(&mut headers);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        assemble(headers, self.problem.problem_type().status, Body::from(body))
    }
}

/// Plain axum handlers can return problems too; they use the default JSON format.
impl IntoResponse for ProblemJson {
    fn into_response(self) -> Response {
        self.into_http_response(&JsonFormat::default())
    }
}

impl IntoResponse for AnyProblem {
    fn into_response(self) -> Response {
        ProblemJson::new(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Problem, UnsupportedMediaType};
    use crate::problemf;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[derive(Debug, thiserror::Error)]
    #[error("quota exhausted for {account}")]
    struct QuotaExhausted {
        account: String,
    }

    impl Problem for QuotaExhausted {
        fn problem_type(&self) -> ProblemType {
            ProblemType::from_status(StatusCode::TOO_MANY_REQUESTS).with_uri("/problems/quota")
        }

        fn problem_detail(&self) -> String {
            "Quota exhausted".to_string()
        }

        fn set_problem_headers(&self, headers: &mut HeaderMap) {
            headers.insert(header::RETRY_AFTER, HeaderValue::from_static("30"));
            // overridden by the writer
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        }

        fn problem_data(&self) -> ProblemData {
            let mut data = ProblemData::new();
            data.insert("limit".to_string(), json!(100));
            data
        }

        fn error_data(&self) -> ProblemData {
            let mut data = ProblemData::new();
            data.insert("account".to_string(), json!(self.account));
            data
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("broken")]
    struct ClashingData;

    impl Problem for ClashingData {
        fn problem_type(&self) -> ProblemType {
            ProblemType::internal_error()
        }

        fn problem_detail(&self) -> String {
            String::new()
        }

        fn problem_data(&self) -> ProblemData {
            let mut data = ProblemData::new();
            data.insert("status".to_string(), json!("fine"));
            data
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_problem_json_body() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "sample parse error foo");
        let problem = problemf!(
            ProblemType::bad_request(),
            "https://example.com/foo",
            "invalid request: {inner}"
        )
        .with_source(inner);

        let body = ProblemJson::new(problem).raw_body(&JsonFormat::default());
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            json!({
                "title": "Bad Request",
                "status": 400,
                "instance": "https://example.com/foo",
                "detail": "invalid request: sample parse error foo"
            })
        );
    }

    #[test]
    fn test_member_order_and_omissions() {
        let problem = problemf!(ProblemType::not_found(), "", "gone");
        let body = ProblemJson::new(problem).raw_body(&JsonFormat::compact());
        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#"{"title":"Not Found","status":404,"detail":"gone"}"#
        );

        let body = ProblemJson::new(QuotaExhausted {
            account: "acme".to_string(),
        })
        .raw_body(&JsonFormat::compact());
        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#"{"title":"Too Many Requests","status":429,"type":"/problems/quota","detail":"Quota exhausted","limit":100}"#
        );
    }

    #[test]
    fn test_empty_detail_is_kept() {
        let problem = problemf!(ProblemType::internal_error(), "", "");
        let body = ProblemJson::new(problem).raw_body(&JsonFormat::compact());
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "");
    }

    #[test]
    #[should_panic(expected = "reserved member `status`")]
    fn test_reserved_member_panics() {
        ProblemJson::new(ClashingData).raw_body(&JsonFormat::compact());
    }

    #[tokio::test]
    async fn test_write_sets_headers_status_and_length() {
        let response = ProblemJson::new(QuotaExhausted {
            account: "acme".to_string(),
        })
        .into_http_response(&JsonFormat::default());

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], APPLICATION_PROBLEM_JSON);
        assert_eq!(headers[header::RETRY_AFTER], "30");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            headers[header::CONTENT_LENGTH],
            bytes.len().to_string().as_str()
        );
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["limit"], 100);
        assert!(json.get("account").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_media_type_response() {
        let response = ProblemJson::new(UnsupportedMediaType::json("text/plain"))
            .into_http_response(&JsonFormat::default());

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.headers()[header::ACCEPT], "application/json");
        assert_eq!(response.headers()[header::ACCEPT_CHARSET], "utf-8");

        let json = body_json(response).await;
        assert_eq!(json["status"], 415);
        assert_eq!(json["title"], "Unsupported Media Type");
        assert_eq!(json["accepted_types"], json!(["application/json"]));
        assert_eq!(json["received_type"], "text/plain");
    }

    #[tokio::test]
    async fn test_any_problem_into_response() {
        let problem = AnyProblem::from(problemf!(ProblemType::not_found(), "", "nothing here"));
        let response = problem.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "nothing here");
    }
}
