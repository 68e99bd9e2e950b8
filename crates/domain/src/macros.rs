//! Macro for implementing Display and FromStr for closed label enums
//!
//! Extraction providers and configuration files speak in lowercase labels
//! (`"meeting"`, `"google"`). This macro keeps the label table in one place.
//!
//! # Example
//!
//! ```rust
//! use schedulr_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Priority {
//!     Low,
//!     High,
//! }
//!
//! impl_domain_enum_conversions!(Priority {
//!     Low => "low",
//!     High => "high",
//! });
//! ```

/// Implements Display and FromStr for a unit-only enum
///
/// - Display writes the label
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_enum_conversions {
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
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
