//! HTTP client for the app's managed backend.

mod client;

pub use client::{AgeStatus, BackendClient, ClaimResponse};
