//! Common utilities and helpers

pub mod format;
pub mod time;

pub use format::format_duration;
pub use time::{day_window, local_date_of, local_midnight_ts, naive_local_ts};
