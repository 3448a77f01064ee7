//! Upstream gateway: HTTP fetch functions and SPARQL result normalization.

pub mod bindings;
pub mod client;

pub use client::{UpstreamClient, UpstreamError};
