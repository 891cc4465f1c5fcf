//! # Boot Notes Core
//!
//! Request-processing services built on the resilience primitives of
//! `bootnotes-common`.
//!
//! This crate contains:
//! - The `ApiClient` port implemented by infrastructure adapters
//! - Client error taxonomy and its mapping to transport status codes
//! - The guarded (limit + exponential backoff) and fixed-delay request
//!   services
//!
//! ## Architecture Principles
//! - Depends only on `bootnotes-common` and `bootnotes-domain`
//! - No HTTP or configuration-loading code
//! - All external calls go through the `ApiClient` trait

pub mod requests;

pub use requests::{
    ApiClient, ApiClientError, ApiErrorKind, GrpcCode, GuardedRequestService,
    ProgrammaticRequestService, RequestError, TransportStatus,
};
