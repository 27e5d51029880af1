use std::net::IpAddr;
use actix_web::HttpResponseBuilder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

/// Header used to carry the chain of client addresses to the upstream.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Fields scoped to a single transport leg. Never forwarded in either direction.
pub const HOP_BY_HOP: [&str; 10] = [
  "connection",
  "keep-alive",
  "proxy-authenticate",
  "proxy-authorization",
  "te",
  "trailers",
  "transfer-encoding",
  "upgrade",
  "host",
  "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
  HOP_BY_HOP.iter().any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Builds the header set sent to the upstream.
///
/// `client_ip` is appended to any `x-forwarded-for` chain the caller already sent.
/// `body_content_type` is the type a re-encoded body was produced in; it is only
/// used when the caller did not declare a content type of its own.
pub fn sanitize_request_headers<'a, I>(
  inbound: I,
  client_ip: Option<IpAddr>,
  body_content_type: Option<&HeaderValue>,
) -> HeaderMap
where
  I: IntoIterator<Item = (&'a HeaderName, &'a HeaderValue)>,
{
  let mut outbound = HeaderMap::new();
  let mut forwarded_for: Vec<Vec<u8>> = Vec::new();

  for (name, value) in inbound {
    if is_hop_by_hop(name.as_str()) {
      continue;
    }

    if name.as_str() == X_FORWARDED_FOR {
      forwarded_for.push(value.as_bytes().to_vec());
      continue;
    }

    outbound.append(name.clone(), value.clone());
  }

  if let Some(ip) = client_ip {
    forwarded_for.push(ip.to_string().into_bytes());
  }

  // Values are merged as raw bytes so a non-UTF-8 chain is kept, not replaced.
  forwarded_for.retain(|entry| !entry.is_empty());
  if !forwarded_for.is_empty() {
    if let Ok(value) = HeaderValue::from_bytes(&forwarded_for.join(&b", "[..])) {
      outbound.insert(HeaderName::from_static(X_FORWARDED_FOR), value);
    }
  }

  if let Some(content_type) = body_content_type {
    if !outbound.contains_key(CONTENT_TYPE) {
      outbound.insert(CONTENT_TYPE, content_type.clone());
    }
  }

  outbound
}

/// Copies every upstream header except the hop-by-hop set onto the caller's response.
pub fn copy_response_headers(upstream: &HeaderMap, response: &mut HttpResponseBuilder) {
  for (name, value) in upstream {
    if is_hop_by_hop(name.as_str()) {
      continue;
    }

    response.append_header((name.clone(), value.clone()));
  }
}
