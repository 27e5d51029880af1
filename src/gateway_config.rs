use clap::{Parser, ValueEnum};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Selects how the upstream reply is written back to the caller.
#[derive(Serialize, Deserialize, ValueEnum, PartialEq, Debug, Clone, Copy, Hash, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
  /// Upstream status, headers and bytes are relayed unchanged.
  #[default]
  Passthrough,
  /// Every reply is a `200` JSON object describing the upstream result.
  Envelope,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Single-origin HTTP forwarding gateway")]
pub struct GatewayArgs {
  /// Upstream origin. May contain `{path}` where the inbound path and query are placed.
  #[arg(long, env = "GATEWAY_ORIGIN")]
  pub origin: Option<String>,

  /// Upstream deadline in milliseconds.
  #[arg(long, env = "GATEWAY_TIMEOUT_MS")]
  pub timeout_ms: Option<u64>,

  /// Value for `Access-Control-Allow-Origin`. Empty disables CORS headers.
  #[arg(long, env = "GATEWAY_CORS_ALLOW_ORIGIN")]
  pub cors_allow_origin: Option<String>,

  #[arg(long, env = "GATEWAY_RESPONSE_MODE", value_enum)]
  pub response_mode: Option<ResponseMode>,

  /// Optional YAML file with gateway settings. Flags and env vars take precedence.
  #[arg(long = "config", env = "GATEWAY_CONFIG")]
  pub config_file: Option<PathBuf>,

  #[arg(long, env = "HTTP_BIND", default_value = "0.0.0.0")]
  pub bind: String,

  #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
  pub port: u16,

  #[arg(long, env = "HTTP_WORKER_COUNT", default_value_t = 4)]
  pub workers: usize,

  /// Forward proxy used for the upstream connection.
  #[arg(long, env = "HTTP_PROXY_URL")]
  pub http_proxy: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub proxy_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS")]
  pub proxy_pass: Option<String>,

  #[arg(long, env = "LOG_LEVEL", default_value = "info")]
  pub log_level: LevelFilter,
}

/// Gateway settings as read from a YAML file. Every field is optional.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct GatewayConfigFile {
  pub origin: Option<String>,
  pub timeout_ms: Option<u64>,
  pub cors_allow_origin: Option<String>,
  pub response_mode: Option<ResponseMode>,
}

/// Resolved gateway settings, immutable once the process has started.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct GatewayConfig {
  pub origin: String,
  pub timeout_ms: u64,
  pub cors_allow_origin: Option<String>,
  pub response_mode: ResponseMode,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    GatewayConfig {
      origin: String::new(),
      timeout_ms: DEFAULT_TIMEOUT_MS,
      cors_allow_origin: None,
      response_mode: ResponseMode::default(),
    }
  }
}

impl GatewayConfigFile {
  pub fn load_from_file(file: &File) -> Result<GatewayConfigFile, std::io::Error> {
    let config: GatewayConfigFile =
      serde_yaml::from_reader(file).map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

    Ok(config)
  }
}

impl GatewayConfig {
  /// Merges command line / environment values over the optional file values.
  pub fn resolve(args: &GatewayArgs, file: Option<GatewayConfigFile>) -> GatewayConfig {
    let file = file.unwrap_or_default();

    let origin = args
      .origin
      .clone()
      .or(file.origin)
      .map(|origin| origin.trim().to_string())
      .unwrap_or_default();

    let cors_allow_origin = args
      .cors_allow_origin
      .clone()
      .or(file.cors_allow_origin)
      .filter(|value| !value.trim().is_empty());

    GatewayConfig {
      origin,
      timeout_ms: args.timeout_ms.or(file.timeout_ms).unwrap_or(DEFAULT_TIMEOUT_MS),
      cors_allow_origin,
      response_mode: args.response_mode.or(file.response_mode).unwrap_or_default(),
    }
  }

  /// Reads the optional YAML file named by `args` and merges it.
  pub fn load(args: &GatewayArgs) -> Result<GatewayConfig, std::io::Error> {
    let file = match &args.config_file {
      Some(path) => {
        let fd = File::open(path)?;
        Some(GatewayConfigFile::load_from_file(&fd)?)
      }
      None => None,
    };

    Ok(GatewayConfig::resolve(args, file))
  }

  pub fn is_misconfigured(&self) -> bool {
    self.origin.is_empty()
  }
}

impl Display for ResponseMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ResponseMode::Passthrough => f.write_str("passthrough"),
      ResponseMode::Envelope => f.write_str("envelope"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn args(cli: &[&str]) -> GatewayArgs {
    let mut argv = vec!["origin_gateway"];
    argv.extend_from_slice(cli);
    GatewayArgs::try_parse_from(argv).unwrap()
  }

  #[test]
  fn defaults_apply_without_file() {
    let config = GatewayConfig::resolve(&args(&["--origin", "https://api.example.com"]), None);

    assert_eq!(config.origin, "https://api.example.com");
    assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.cors_allow_origin, None);
    assert_eq!(config.response_mode, ResponseMode::Passthrough);
  }

  #[test]
  fn flags_override_file_values() {
    let file = GatewayConfigFile {
      origin: Some("https://file.example.com".into()),
      timeout_ms: Some(1_000),
      cors_allow_origin: Some("https://app.example.com".into()),
      response_mode: Some(ResponseMode::Envelope),
    };
    let config = GatewayConfig::resolve(&args(&["--timeout-ms", "2500"]), Some(file));

    assert_eq!(config.origin, "https://file.example.com");
    assert_eq!(config.timeout_ms, 2_500);
    assert_eq!(config.cors_allow_origin.as_deref(), Some("https://app.example.com"));
    assert_eq!(config.response_mode, ResponseMode::Envelope);
  }

  #[test]
  fn empty_cors_value_disables_cors() {
    let config = GatewayConfig::resolve(&args(&["--cors-allow-origin", ""]), None);
    assert_eq!(config.cors_allow_origin, None);
  }

  #[test]
  fn missing_origin_is_reported_not_rejected() {
    let config = GatewayConfig::resolve(&args(&[]), None);
    assert!(config.is_misconfigured());
  }

  #[test]
  fn response_mode_parses_from_flag() {
    let parsed = args(&["--response-mode", "envelope", "--log-level", "debug"]);
    assert_eq!(parsed.response_mode, Some(ResponseMode::Envelope));
    assert_eq!(parsed.log_level, LevelFilter::Debug);
  }

  #[test]
  fn loads_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
      file,
      "origin: https://yaml.example.com/{{path}}\ntimeout_ms: 750\nresponse_mode: envelope"
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = GatewayConfig::load(&args(&["--config", &path])).unwrap();

    assert_eq!(config.origin, "https://yaml.example.com/{path}");
    assert_eq!(config.timeout_ms, 750);
    assert_eq!(config.response_mode, ResponseMode::Envelope);
  }

  #[test]
  fn unreadable_yaml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timeout_ms: [not, a, number]").unwrap();

    let path = file.path().to_str().unwrap().to_string();
    assert!(GatewayConfig::load(&args(&["--config", &path])).is_err());
  }
}
