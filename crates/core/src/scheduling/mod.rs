//! Calendar scheduling for linked accounts.

pub mod ports;
pub mod scheduler;

pub use ports::{CalendarProvider, LinkedAccountRepository};
pub use scheduler::CalendarScheduler;
