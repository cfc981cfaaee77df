//! Station observation records and their JSON representation.

pub mod day;
pub mod json;
pub mod series;

pub use day::{DayRecord, Sample};
pub use json::{read_json, write_json};
pub use series::{CleanRecord, MonthRecord, SeriesRecord, Timestamp};
