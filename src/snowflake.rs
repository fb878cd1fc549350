//! Conversions between platform snowflake IDs and timestamps.
//!
//! High bits of a snowflake encode creation time relative to a fixed epoch
//! (2015-01-01 UTC), shifted left 22 bits to leave room for worker/process/
//! sequence bits. Numeric ID ordering is chronological ordering.

use chrono::{DateTime, TimeZone, Utc};

pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

pub fn snowflake_to_datetime(id: i64) -> DateTime<Utc> {
    let ms = (id >> 22) + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(|| {
        // An out-of-range snowflake is a data-shape problem elsewhere, not
        // something this pure conversion should panic over.
        Utc.timestamp_opt(0, 0).single().expect("epoch is valid")
    })
}

/// The inverse conversion, used to build a synthetic snowflake "ceiling"
/// for time-based queries (round-trip property P5 only needs millisecond
/// precision, so the low 22 bits are always zero here).
pub fn datetime_to_snowflake(dt: DateTime<Utc>) -> i64 {
    let ms = dt.timestamp_millis() - DISCORD_EPOCH_MS;
    ms << 22
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_millisecond_precision() {
        let id: i64 = 175_928_847_299_117_063; // a real-shaped snowflake
        let dt = snowflake_to_datetime(id);
        let back = datetime_to_snowflake(dt);
        // Only the high 42 bits (timestamp) round-trip; low 22 bits
        // (worker/sequence) are not recoverable from a timestamp alone.
        assert_eq!(back >> 22, id >> 22);
    }

    #[test]
    fn epoch_snowflake_maps_to_epoch() {
        let id: i64 = 0;
        let dt = snowflake_to_datetime(id);
        assert_eq!(dt.timestamp_millis(), DISCORD_EPOCH_MS);
    }

    #[test]
    fn numeric_order_is_chronological_order() {
        let earlier: i64 = 100_000_000_000_000_000;
        let later: i64 = 200_000_000_000_000_000;
        assert!(snowflake_to_datetime(earlier) < snowflake_to_datetime(later));
    }
}
