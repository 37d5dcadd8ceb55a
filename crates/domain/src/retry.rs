/// How long to wait before resending an uncompleted notification
pub const RESEND_INTERVAL_MILLIS: i64 = 2 * 60 * 1000;

const DEFAULT_MAX_RETRY_COUNT: i32 = 2;

/// Turns the user configured retry count into the number of delivery
/// attempts the dispatcher may use for one occurrence. A missing or negative
/// value falls back to the default, and the initial send counts as an
/// attempt, hence the `+ 1`.
pub fn resolve_max_delivery_attempts(max_retry_count: Option<i32>) -> u32 {
    let retries = match max_retry_count {
        Some(count) if count >= 0 => count,
        _ => DEFAULT_MAX_RETRY_COUNT,
    };
    retries as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_send_counts_as_an_attempt() {
        assert_eq!(resolve_max_delivery_attempts(Some(0)), 1);
        assert_eq!(resolve_max_delivery_attempts(Some(1)), 2);
        assert_eq!(resolve_max_delivery_attempts(Some(5)), 6);
    }

    #[test]
    fn missing_or_negative_retry_count_uses_default() {
        assert_eq!(resolve_max_delivery_attempts(None), 3);
        assert_eq!(resolve_max_delivery_attempts(Some(-1)), 3);
    }
}
