//! Preflight replies and the optional allow-origin header.

use actix_web::http::header::{
  HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
  ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
};
use actix_web::{HttpRequest, HttpResponse};

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Answers an OPTIONS request without touching the upstream.
pub fn preflight(request: &HttpRequest, allow_origin: Option<&HeaderValue>) -> HttpResponse {
  let mut builder = HttpResponse::NoContent();

  if let Some(origin) = allow_origin {
    let allow_headers = request
      .headers()
      .get(ACCESS_CONTROL_REQUEST_HEADERS)
      .cloned()
      .unwrap_or_else(|| HeaderValue::from_static("*"));

    builder
      .insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone()))
      .insert_header((ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
      .insert_header((ACCESS_CONTROL_ALLOW_HEADERS, allow_headers))
      .insert_header((ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE));
  }

  builder.finish()
}

/// Sets the allow-origin header on a finished response when CORS is enabled.
pub fn decorate(response: &mut HttpResponse, allow_origin: Option<&HeaderValue>) {
  if let Some(origin) = allow_origin {
    response
      .headers_mut()
      .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
  }
}
