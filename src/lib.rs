//! Single-origin HTTP forwarding gateway.
//!
//! Each inbound request runs through the same stages: the upstream URL is
//! resolved from the origin template, connection-scoped headers are dropped,
//! the body is captured, the upstream is called once under a deadline and its
//! reply is written back either verbatim or as a JSON envelope.

pub mod error;
pub mod gateway_config;
pub mod http_client;
pub mod proxy_service;
pub mod std_logger;
