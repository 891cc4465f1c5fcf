//! Macro for implementing Display and FromStr for configuration enums
//!
//! Configuration enums are read from environment variables as plain strings
//! (`BOOTNOTES_ADMISSION_MODE=reject`) and written back into logs, so each
//! one needs the same lowercase, case-insensitive string mapping.
//!
//! # Example
//!
//! ```rust
//! use bootnotes_domain::impl_config_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Backend {
//!     Memory,
//!     Http,
//! }
//!
//! impl_config_enum_conversions!(Backend {
//!     Memory => "memory",
//!     Http => "http",
//! });
//!
//! assert_eq!("HTTP".parse::<Backend>().unwrap(), Backend::Http);
//! assert_eq!(Backend::Memory.to_string(), "memory");
//! ```

/// Implements `Display` and `FromStr` for a fieldless configuration enum.
///
/// Parsing ignores ASCII case; the error names the enum and the rejected
/// input so it can be surfaced verbatim in a configuration error.
#[macro_export]
macro_rules! impl_config_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
