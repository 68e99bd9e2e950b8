//! Time utilities and abstractions
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use schedulr_common::time::{Clock, MockClock};
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
//! let clock = MockClock::new(start);
//! clock.advance(Duration::hours(1));
//! assert_eq!(clock.now_utc(), start + Duration::hours(1));
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
