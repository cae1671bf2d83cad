use jiff::{Span, civil};
use serde::Serialize;

/// Which half of the working day a period covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PeriodKind {
    Morning,
    Afternoon,
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodKind::Morning => write!(f, "morning"),
            PeriodKind::Afternoon => write!(f, "afternoon"),
        }
    }
}

/// A fixed half-day work window, bounds in minutes since midnight.
/// Periods never span midnight and never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    kind: PeriodKind,
    start: i64,
    end: i64,
}

impl Period {
    pub fn new(kind: PeriodKind, start: i64, end: i64) -> Self {
        assert!(start < end, "period bounds must be ordered");
        assert!(end <= 24 * 60, "periods never span midnight");
        Period { kind, start, end }
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

pub fn is_working_day(day: civil::Date) -> bool {
    !matches!(
        day.weekday(),
        civil::Weekday::Saturday | civil::Weekday::Sunday
    )
}

pub fn next_day(day: civil::Date) -> civil::Date {
    day.saturating_add(Span::new().days(1))
}

/// The `count` working days starting from the first working day on or
/// after `from`, in order.
pub fn working_days_from(from: civil::Date, count: usize) -> Vec<civil::Date> {
    let mut days = Vec::with_capacity(count);
    let mut day = from;
    while days.len() < count {
        if is_working_day(day) {
            days.push(day);
        }
        day = next_day(day);
    }
    days
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_weekend_detection() {
        assert!(is_working_day(date(2025, 2, 17))); // Monday
        assert!(is_working_day(date(2025, 2, 21))); // Friday
        assert!(!is_working_day(date(2025, 2, 22))); // Saturday
        assert!(!is_working_day(date(2025, 2, 23))); // Sunday
    }

    #[test]
    fn test_working_days_skip_weekend() {
        // Friday the 21st: the next three working days are Fri, Mon, Tue.
        let days = working_days_from(date(2025, 2, 21), 3);
        assert_eq!(
            days,
            vec![date(2025, 2, 21), date(2025, 2, 24), date(2025, 2, 25)]
        );
    }

    #[test]
    fn test_working_days_start_on_the_next_monday() {
        let days = working_days_from(date(2025, 2, 22), 1);
        assert_eq!(days, vec![date(2025, 2, 24)]);
    }
}
