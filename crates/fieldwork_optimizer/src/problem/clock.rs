use jiff::{SignedDuration, civil};

/// Minutes elapsed since midnight of the timestamp's own day.
pub fn minutes_since_midnight(datetime: &civil::DateTime) -> i64 {
    datetime.hour() as i64 * 60 + datetime.minute() as i64
}

/// Attaches a minute-of-day offset to a calendar day. Offsets past midnight
/// roll over into the following day.
pub fn datetime_at(day: civil::Date, minutes: i64) -> civil::DateTime {
    day.at(0, 0, 0, 0)
        .saturating_add(SignedDuration::from_mins(minutes))
}

/// Renders the absolute ISO-8601 UTC form the upstream backend expects.
pub fn format_utc(datetime: &civil::DateTime) -> String {
    datetime.strftime("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_minutes_since_midnight() {
        let dt = date(2025, 2, 18).at(8, 30, 0, 0);
        assert_eq!(minutes_since_midnight(&dt), 510);
    }

    #[test]
    fn test_datetime_at_is_inverse() {
        let day = date(2025, 2, 18);
        for minutes in [0, 480, 719, 840, 1019] {
            let dt = datetime_at(day, minutes);
            assert_eq!(dt.date(), day);
            assert_eq!(minutes_since_midnight(&dt), minutes);
        }
    }

    #[test]
    fn test_datetime_at_rolls_over_midnight() {
        let dt = datetime_at(date(2025, 2, 18), 24 * 60 + 30);
        assert_eq!(dt.date(), date(2025, 2, 19));
        assert_eq!(minutes_since_midnight(&dt), 30);
    }

    #[test]
    fn test_format_utc() {
        let dt = date(2025, 2, 18).at(14, 5, 0, 0);
        assert_eq!(format_utc(&dt), "2025-02-18T14:05:00Z");
    }
}
