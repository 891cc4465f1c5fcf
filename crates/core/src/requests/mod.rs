//! Outbound request processing under retry and admission control

pub mod error;
pub mod guarded;
pub mod ports;
pub mod programmatic;
pub mod status;

pub use error::{ApiClientError, ApiErrorKind, RequestError};
pub use guarded::GuardedRequestService;
pub use ports::ApiClient;
pub use programmatic::ProgrammaticRequestService;
pub use status::{GrpcCode, TransportStatus};
