//! HTTP surface: response envelopes, body decoding and endpoint adapters

pub mod decode;
pub mod handler;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use decode::{decode_json_body, negotiate};
pub use handler::{handle_blank_request, handle_json_request, BlankBodyHandler, JsonBodyHandler};
pub use response::{HeadersOnly, HttpResponse, JsonBody, NoContent, APPLICATION_JSON};
