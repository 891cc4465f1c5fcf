//! Error conversions for infrastructure adapters

pub mod conversions;

pub use conversions::{error_for_status, error_for_transport, kind_for_status};
