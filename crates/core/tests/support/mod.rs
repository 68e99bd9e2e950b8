//! Shared test helpers for `schedulr-core` integration tests.
//!
//! In-memory collaborators and scripted providers so pipeline tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod calendar;
pub mod extraction;
pub mod repositories;

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use schedulr_common::time::MockClock;
use schedulr_domain::{EventCandidate, EventTime, EventType};

/// Ordered record of collaborator calls shared between mocks.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Clock pinned to 2024-06-01 08:00 UTC.
pub fn fixed_clock() -> MockClock {
    MockClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
}

pub fn candidate(title: &str, time_zone: &str) -> EventCandidate {
    let start = EventTime::new(
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap().and_hms_opt(19, 0, 0).unwrap(),
        time_zone,
    );
    EventCandidate::new(title, start, None, EventType::Event)
}
