pub mod datetime;

pub use datetime::{clock_stamp, datetime_stamp, unix_seconds};
