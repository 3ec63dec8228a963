//! Primary-key and timestamp generators used as field defaults

use awesome_orm::Value;
use chrono::Utc;
use uuid::Uuid;

/// 50-character id: zero-padded millisecond timestamp, a random uuid in
/// simple hex form, then `000`. Ids sort by creation time.
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Seconds since the Unix epoch, with sub-second precision
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub(crate) fn next_id_value() -> Value {
    Value::Text(next_id())
}

pub(crate) fn now_value() -> Value {
    Value::Float(now_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_fixed_shape() {
        let id = next_id();
        assert_eq!(id.len(), 50);
        assert!(id.ends_with("000"));
        assert!(id[..15].chars().all(|c| c.is_ascii_digit()));
        assert!(id[15..47].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unique_and_time_ordered() {
        let first = next_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = next_id();
        assert_ne!(first, second);
        assert!(first[..15] < second[..15]);
    }

    #[test]
    fn timestamp_is_in_seconds() {
        let now = now_timestamp();
        // after 2020-01-01 and not in milliseconds
        assert!(now > 1_577_836_800.0);
        assert!(now < 1.0e11);
    }
}
