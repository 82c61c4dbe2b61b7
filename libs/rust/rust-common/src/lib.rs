//! Shared library for cross-cutting concerns in the token client workspace.
//!
//! This crate provides centralized implementations for:
//! - HTTP client configuration and building
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod tracing_config;

pub use http::{HttpConfig, build_http_client};
pub use tracing_config::{TracingConfig, init_tracing};
