use std::time::{SystemTime, UNIX_EPOCH};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn to_local(ts: SystemTime) -> OffsetDateTime {
    let utc = OffsetDateTime::from(ts);
    match UtcOffset::current_local_offset() {
        Ok(offset) => utc.to_offset(offset),
        Err(_) => utc,
    }
}

/// `dd-mm-YYYY hh:MM AM/PM`, the dashboard's display format.
pub fn datetime_stamp() -> String {
    let format = format_description!("[day]-[month]-[year] [hour repr:12]:[minute] [period]");
    now_local().format(&format).unwrap_or_default()
}

/// `hh:MM AM/PM` for a stored timestamp, as shown on the cache status page.
pub fn clock_stamp(ts: SystemTime) -> String {
    let format = format_description!("[hour repr:12]:[minute] [period]");
    to_local(ts).format(&format).unwrap_or_default()
}

pub fn unix_seconds(ts: SystemTime) -> f64 {
    ts.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unix_seconds_round_trips_whole_seconds() {
        let ts = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(unix_seconds(ts), 1_700_000_000.0);
    }

    #[test]
    fn stamps_are_non_empty() {
        assert!(!datetime_stamp().is_empty());
        assert!(!clock_stamp(SystemTime::now()).is_empty());
    }
}
