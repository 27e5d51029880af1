//! Failure taxonomy of the forwarding pipeline and its JSON error replies.

use actix_web::http::header::{HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

/// Header carrying the machine-readable error code on gateway error replies.
pub const X_GATEWAY_ERROR: &str = "x-gateway-error";

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  Misconfigured,
  UpstreamTimeout,
  UpstreamUnavailable,
}

impl ErrorCode {
  pub fn status_code(&self) -> StatusCode {
    match self {
      ErrorCode::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
      ErrorCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
      ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorCode::Misconfigured => "MISCONFIGURED",
      ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
      ErrorCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
    }
  }
}

/// Every way a forwarded request can fail. Each variant maps to exactly one reply.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
  #[error("gateway origin is not configured: {0}")]
  Misconfigured(String),

  #[error("upstream did not answer within {timeout_ms} ms")]
  Timeout { timeout_ms: u64 },

  #[error("upstream request failed: {0}")]
  Transport(String),
}

/// Raised when the inbound body cannot be read. Never reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum BodyCaptureError {
  #[error("body stream failed: {0}")]
  Stream(String),

  #[error("unable to re-encode parsed body: {0}")]
  Encode(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: ErrorCode,
  pub message: String,
  pub status: u16,
}

impl GatewayError {
  pub fn code(&self) -> ErrorCode {
    match self {
      GatewayError::Misconfigured(_) => ErrorCode::Misconfigured,
      GatewayError::Timeout { .. } => ErrorCode::UpstreamTimeout,
      GatewayError::Transport(_) => ErrorCode::UpstreamUnavailable,
    }
  }
}

impl From<reqwest::Error> for GatewayError {
  fn from(err: reqwest::Error) -> Self {
    GatewayError::Transport(err.to_string())
  }
}

impl ResponseError for GatewayError {
  fn status_code(&self) -> StatusCode {
    self.code().status_code()
  }

  fn error_response(&self) -> HttpResponse {
    let code = self.code();
    let body = ErrorBody {
      error: code,
      message: self.to_string(),
      status: code.status_code().as_u16(),
    };

    HttpResponse::build(code.status_code())
      .insert_header((CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8")))
      .insert_header((X_GATEWAY_ERROR, code.as_str()))
      .json(body)
  }
}
