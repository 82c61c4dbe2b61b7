//! Shared test utilities for the token client workspace.
//!
//! This crate provides:
//! - Proptest generators for client ids, endpoints, subjects and thumbprints
//! - PEM fixtures: RSA keys and a certificate store directory

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
