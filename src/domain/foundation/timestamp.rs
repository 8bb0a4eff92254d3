//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by subtracting a standard duration.
    ///
    /// Saturates at the chrono range limits instead of panicking.
    pub fn minus(&self, duration: std::time::Duration) -> Self {
        let delta = Duration::from_std(duration).unwrap_or_else(|_| Duration::days(365_000));
        Self(self.0.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Creates a new timestamp by subtracting the specified number of hours.
    pub fn minus_hours(&self, hours: i64) -> Self {
        Self(self.0 - Duration::hours(hours))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Out-of-range values clamp to the Unix epoch.
    pub fn from_unix_secs(secs: u64) -> Self {
        let dt = Utc
            .timestamp_opt(secs as i64, 0)
            .single()
            .unwrap_or_default();
        Self(dt)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> u64 {
        self.0.timestamp() as u64
    }

    /// RFC 3339 rendering used in logs and DTOs.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_ordering_follows_time() {
        let earlier = Timestamp::from_unix_secs(1_000);
        let later = Timestamp::from_unix_secs(2_000);

        assert!(earlier < later);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
    }

    #[test]
    fn minus_hours_moves_backwards() {
        let ts = Timestamp::from_unix_secs(100_000);
        assert_eq!(ts.minus_hours(24).as_unix_secs(), 100_000 - 86_400);
    }

    #[test]
    fn minus_std_duration_matches_minus_hours() {
        let ts = Timestamp::from_unix_secs(100_000);
        let via_std = ts.minus(std::time::Duration::from_secs(3_600));
        assert_eq!(via_std, ts.minus_hours(1));
    }

    #[test]
    fn duration_since_is_signed() {
        let a = Timestamp::from_unix_secs(1_000);
        let b = Timestamp::from_unix_secs(1_060);

        assert_eq!(b.duration_since(&a).num_seconds(), 60);
        assert_eq!(a.duration_since(&b).num_seconds(), -60);
    }

    #[test]
    fn timestamp_from_unix_secs_works() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(1705276800);
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = Timestamp::from_unix_secs(1705276800);
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
    }
}
