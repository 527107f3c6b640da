//! Internal modules for the Ecomflex session client.
//!
//! This library provides command parsing and output helpers used by the
//! ecomflex_client binary.

pub mod commands;
