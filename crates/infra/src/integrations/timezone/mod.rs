//! Coordinate-based timezone lookup.

mod google;

pub use google::GoogleTimezoneLookup;
