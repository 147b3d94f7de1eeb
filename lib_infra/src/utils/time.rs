use chrono::Local;

/// Second-resolution timestamp layout, e.g. `2024-03-01 14:05:09`.
pub const INTERNAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Millisecond-resolution timestamp layout used by the JSON log formatter.
pub const INTERNAL_TIME_FORMAT_MILLIS: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Returns the current local time formatted with [`INTERNAL_TIME_FORMAT`].
pub fn current_time() -> String {
    Local::now().format(INTERNAL_TIME_FORMAT).to_string()
}

/// Returns the current local time formatted with [`INTERNAL_TIME_FORMAT_MILLIS`].
pub fn current_time_millis() -> String {
    Local::now().format(INTERNAL_TIME_FORMAT_MILLIS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn current_time_parses_back() {
        let now = current_time();
        assert_eq!(now.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&now, INTERNAL_TIME_FORMAT).is_ok());
    }

    #[test]
    fn current_time_millis_has_three_fraction_digits() {
        let now = current_time_millis();
        let (_, fraction) = now.rsplit_once('.').expect("fraction separator");
        assert_eq!(fraction.len(), 3);
        assert!(NaiveDateTime::parse_from_str(&now, INTERNAL_TIME_FORMAT_MILLIS).is_ok());
    }
}
