//! Core types and pure functions for poolgate.
//!
//! This crate holds the functional core shared by the identity client and
//! the application: auth data types, the identity-provider trait, and the
//! runtime configuration record. No I/O happens here.

pub mod auth;
pub mod config;
