use actix_web::http::header::{HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use crate::gateway_config::ResponseMode;
use crate::proxy_service::cors;
use crate::proxy_service::headers::copy_response_headers;
use crate::proxy_service::invoker::UpstreamResponse;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Fixed-shape reply used in [`ResponseMode::Envelope`].
///
/// Exactly one of `data` and `text` is present. An upstream body of `null`
/// serializes as `"data": null`.
#[derive(Debug, Serialize, PartialEq)]
pub struct Envelope {
  pub ok: bool,
  pub status: u16,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
}

impl Envelope {
  pub fn from_upstream(status: StatusCode, body: &[u8]) -> Self {
    let (data, text) = match serde_json::from_slice::<Value>(body) {
      Ok(parsed) => (Some(parsed), None),
      Err(_) => (None, Some(String::from_utf8_lossy(body).into_owned())),
    };

    Envelope {
      ok: status.is_success(),
      status: status.as_u16(),
      data,
      text,
    }
  }
}

/// Writes the upstream reply back to the caller in the configured mode.
pub fn reconstruct(
  mode: ResponseMode,
  method: &Method,
  upstream: UpstreamResponse,
  cors_allow_origin: Option<&HeaderValue>,
) -> HttpResponse {
  let strip_body = *method == Method::HEAD;

  let mut response = match mode {
    ResponseMode::Passthrough => {
      let mut builder = HttpResponse::build(upstream.status);
      copy_response_headers(&upstream.headers, &mut builder);

      if strip_body {
        builder.body(Bytes::new())
      } else {
        builder.body(upstream.body)
      }
    }
    ResponseMode::Envelope => {
      let mut builder = HttpResponse::Ok();
      builder.insert_header((CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8)));

      if strip_body {
        builder.body(Bytes::new())
      } else {
        builder.json(Envelope::from_upstream(upstream.status, &upstream.body))
      }
    }
  };

  cors::decorate(&mut response, cors_allow_origin);
  response
}
