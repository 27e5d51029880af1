//! Upstream URL resolution from the configured origin template.
//!
//! Three shapes of template are understood:
//!
//! | Template | Result for `/foo?x=1` |
//! |---|---|
//! | `https://api.example.com/v1{path}` | `https://api.example.com/v1/foo?x=1` |
//! | `https://api.example.com/hook.php` or `https://api.example.com/run?key=1` | template unchanged |
//! | `https://api.example.com/` | `https://api.example.com/foo?x=1` |

use reqwest::Url;
use crate::error::GatewayError;

/// Marker replaced by the inbound path and query.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Computes the absolute upstream URL for one inbound request.
///
/// `path_and_query` is the inbound request target as received, always starting with `/`.
pub fn resolve_target(template: &str, path_and_query: &str) -> Result<String, GatewayError> {
  if template.is_empty() {
    return Err(GatewayError::Misconfigured("origin is empty".into()));
  }

  if template.contains(PATH_PLACEHOLDER) {
    let target = template.replacen(PATH_PLACEHOLDER, path_and_query, 1);
    Url::parse(&target)
      .map_err(|err| GatewayError::Misconfigured(format!("origin '{}' does not yield a URL: {}", template, err)))?;
    return Ok(target);
  }

  let origin = Url::parse(template)
    .map_err(|err| GatewayError::Misconfigured(format!("origin '{}' is not a URL: {}", template, err)))?;

  if is_concrete_endpoint(&origin) {
    return Ok(template.to_string());
  }

  let base = template.strip_suffix('/').unwrap_or(template);
  Ok(format!("{}{}", base, path_and_query))
}

/// A template that already names a resource: it has a query string, or its last
/// path segment carries a file extension. Numeric suffixes such as `v1.0` are versions.
fn is_concrete_endpoint(origin: &Url) -> bool {
  if origin.query().is_some() {
    return true;
  }

  origin
    .path_segments()
    .and_then(|mut segments| segments.next_back())
    .and_then(|last| last.rsplit_once('.'))
    .map(|(stem, extension)| {
      !stem.is_empty()
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
        && extension.chars().any(|c| c.is_ascii_alphabetic())
    })
    .unwrap_or(false)
}
