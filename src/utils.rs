use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Build the counter-store key for one client identity and policy category
pub fn format_counter_key(identity: &str, category: &str) -> String {
    format!("{}:{}", identity, category)
}

/// Convert a Unix-millisecond timestamp into a UTC datetime
pub fn millis_to_datetime(millis: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_keys_are_scoped_per_category() {
        assert_eq!(format_counter_key("203.0.113.5", "auth"), "203.0.113.5:auth");
        assert_ne!(
            format_counter_key("203.0.113.5", "auth"),
            format_counter_key("203.0.113.5", "contact")
        );
    }

    #[test]
    fn millis_round_trip_through_datetime() {
        let now = now_millis();
        let dt = millis_to_datetime(now);
        assert_eq!(dt.timestamp_millis() as u64, now);
    }
}
