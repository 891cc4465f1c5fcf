//! Common data types used throughout the application

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body returned by the upstream API for a single key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiResponse {
    pub body: String,
}

impl ApiResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}
