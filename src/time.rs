//! Time utilities shared across services.
//!
//! All persisted timestamps are Unix seconds (UTC). Nothing in the data
//! model needs sub-second precision.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Fractional hours elapsed since `timestamp`.
///
/// Clamped at zero for timestamps in the future, so rows written by a
/// skewed clock cannot produce a negative age.
pub fn hours_since(timestamp: i64) -> f64 {
    let elapsed = now_timestamp().saturating_sub(timestamp);
    elapsed.max(0) as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_hours_since_past_timestamp() {
        let two_hours_ago = now_timestamp() - 7200;
        let hours = hours_since(two_hours_ago);
        assert!((hours - 2.0).abs() < 0.01, "expected ~2h, got {}", hours);
    }

    #[test]
    fn test_hours_since_future_timestamp_clamps_to_zero() {
        let in_one_hour = now_timestamp() + 3600;
        assert_eq!(hours_since(in_one_hour), 0.0);
    }
}
