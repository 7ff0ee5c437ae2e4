//! Identity provider library crate.
//!
//! Issues OAuth 2.0 client credentials access tokens for a static client
//! catalog and serves self-service account registration backed by a
//! pluggable user store.

pub mod accounts;
pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod templates;
