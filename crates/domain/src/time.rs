//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for outbound command times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Seconds since the unix epoch, the unit the robot expects in commands.
#[must_use]
pub fn unix_seconds(ts: Timestamp) -> i64 {
    ts.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_convert_to_unix_seconds() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(unix_seconds(ts), 1_700_000_000);
    }
}
