//! Upstream infrastructure - HTTP access to data providers

mod http_client;

pub use http_client::{HttpUpstreamClient, HttpUpstreamConfig};
