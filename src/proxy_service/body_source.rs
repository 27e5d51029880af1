//! Inbound body capture.
//!
//! Hosts hand the body over in different shapes: already-buffered bytes, a
//! string, a chunk stream, or an object a framework has already parsed. Each
//! shape is a [`BodySource`]; [`HostBody`] picks the first one that yields bytes.

use bytes::{Bytes, BytesMut};
use futures_core::future::LocalBoxFuture;
use futures_core::stream::LocalBoxStream;
use futures_core::Stream;
use futures_util::StreamExt;
use log::warn;
use reqwest::header::HeaderValue;
use reqwest::Method;
use serde_json::Value;
use crate::error::BodyCaptureError;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Bytes obtained from the caller.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CapturedBody {
  pub bytes: Bytes,
  /// Set when the bytes were produced by re-encoding into a type the caller may not have declared.
  pub content_type: Option<HeaderValue>,
}

impl CapturedBody {
  pub fn verbatim(bytes: Bytes) -> Self {
    CapturedBody { bytes, content_type: None }
  }
}

pub trait BodySource {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>>;
}

/// A body the host already buffered.
pub struct RawBytes(pub Bytes);

/// A body the host already decoded to text.
pub struct Text(pub String);

/// A body arriving chunk by chunk.
pub struct StreamSource(pub LocalBoxStream<'static, Result<Bytes, BodyCaptureError>>);

/// A body the host only exposes as a parsed structure.
pub struct ParsedSource {
  pub value: Value,
  /// Content type the caller declared, used to choose the re-encoding.
  pub content_type: Option<String>,
}

impl BodySource for RawBytes {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>> {
    Box::pin(async move { Ok(CapturedBody::verbatim(self.0)) })
  }
}

impl BodySource for Text {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>> {
    Box::pin(async move { Ok(CapturedBody::verbatim(Bytes::from(self.0.into_bytes()))) })
  }
}

impl StreamSource {
  /// Adapts any fallible chunk stream, e.g. an actix `Payload`.
  pub fn new<S, E>(stream: S) -> Self
  where
    S: Stream<Item = Result<Bytes, E>> + 'static,
    E: std::fmt::Display,
  {
    StreamSource(
      stream
        .map(|chunk| chunk.map_err(|err| BodyCaptureError::Stream(err.to_string())))
        .boxed_local(),
    )
  }
}

impl BodySource for StreamSource {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>> {
    let mut stream = self.0;

    Box::pin(async move {
      let (size, _) = stream.size_hint();
      let mut body_buffer = BytesMut::with_capacity(size);

      while let Some(chunk) = stream.next().await {
        body_buffer.extend_from_slice(&chunk?);
      }

      Ok(CapturedBody::verbatim(body_buffer.freeze()))
    })
  }
}

impl BodySource for ParsedSource {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>> {
    Box::pin(async move { reencode(self.value, self.content_type.as_deref()) })
  }
}

fn reencode(value: Value, content_type: Option<&str>) -> Result<CapturedBody, BodyCaptureError> {
  let is_form = content_type
    .map(|ct| ct.to_ascii_lowercase().contains(FORM_URL_ENCODED))
    .unwrap_or(false);

  if is_form {
    match &value {
      Value::Object(fields) => {
        let pairs: Vec<(&str, String)> = fields
          .iter()
          .map(|(name, field)| (name.as_str(), form_value(field)))
          .collect();

        let encoded = serde_urlencoded::to_string(pairs)
          .map_err(|err| BodyCaptureError::Encode(err.to_string()))?;

        return Ok(CapturedBody::verbatim(Bytes::from(encoded)));
      }
      // A bare string under a form content type is the already-encoded form.
      Value::String(encoded) => return Ok(CapturedBody::verbatim(Bytes::from(encoded.clone()))),
      _ => warn!("Parsed form body is not an object; forwarding it as JSON under the caller's form content type"),
    }
  }

  let encoded = serde_json::to_vec(&value).map_err(|err| BodyCaptureError::Encode(err.to_string()))?;

  Ok(CapturedBody {
    bytes: Bytes::from(encoded),
    content_type: Some(HeaderValue::from_static(APPLICATION_JSON)),
  })
}

fn form_value(value: &Value) -> String {
  match value {
    Value::String(text) => text.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Everything a host exposes about one request body.
///
/// Resolution order: raw bytes, text, stream, parsed object. An empty host body
/// captures as zero bytes.
#[derive(Default)]
pub struct HostBody {
  pub raw: Option<Bytes>,
  pub text: Option<String>,
  pub stream: Option<StreamSource>,
  pub parsed: Option<ParsedSource>,
}

impl HostBody {
  pub fn streamed(stream: StreamSource) -> Self {
    HostBody {
      stream: Some(stream),
      ..Default::default()
    }
  }
}

impl BodySource for HostBody {
  fn capture(self) -> LocalBoxFuture<'static, Result<CapturedBody, BodyCaptureError>> {
    let HostBody {
      raw,
      text,
      stream,
      parsed,
    } = self;

    if let Some(bytes) = raw {
      return RawBytes(bytes).capture();
    }

    if let Some(text) = text {
      return Text(text).capture();
    }

    if let Some(stream) = stream {
      return stream.capture();
    }

    if let Some(parsed) = parsed {
      return parsed.capture();
    }

    Box::pin(async { Ok(CapturedBody::default()) })
  }
}

/// Read verbs never carry a body upstream, whatever the caller sent.
pub fn method_carries_body(method: &Method) -> bool {
  !matches!(*method, Method::GET | Method::HEAD)
}
