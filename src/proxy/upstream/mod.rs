// Upstream module
pub mod client;

pub use client::UpstreamClient;
