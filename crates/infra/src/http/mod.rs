//! HTTP adapters for the API client port

pub mod client;

pub use client::HttpApiClient;
