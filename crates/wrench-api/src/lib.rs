//! Signed REST client for the Rex Radio configuration API.
//!
//! Requests carry `x-signature` (Base64 HMAC-SHA512 over
//! `{timestamp}{METHOD}{path}{body}`), `x-timestamp`, and a JSON content
//! type. See [`client::ApiClient`] for the endpoint surface.

pub mod client;
pub mod error;
pub mod sign;

pub use client::{ApiClient, WriteOutcome, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::ApiError;
