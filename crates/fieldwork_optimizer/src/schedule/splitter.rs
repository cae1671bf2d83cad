use fxhash::FxHashSet;
use jiff::civil;
use tracing::{debug, warn};

use crate::{
    config::OptimizerConfig,
    problem::{
        appointment::{Appointment, AppointmentId, TimeSlot},
        clock::datetime_at,
        period::working_days_from,
    },
    schedule::delta::AppointmentChange,
};

/// What the splitter decided before per-period optimization starts.
pub struct SplitOutcome {
    /// Multi-day blocks assigned; always part of the run's delta.
    pub changes: Vec<AppointmentChange>,
    /// Appointments the horizon loop must not optimize again.
    pub resolved: FxHashSet<AppointmentId>,
}

/// Pre-processes appointments whose duration exceeds one day's working
/// capacity: they get a fixed multi-day block up front because the routing
/// model cannot span period boundaries.
pub struct MultiDaySplitter<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> MultiDaySplitter<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        MultiDaySplitter { config }
    }

    pub fn split(&self, appointments: &mut [Appointment], today: civil::Date) -> SplitOutcome {
        let capacity = self.config.daily_capacity();
        let mut outcome = SplitOutcome {
            changes: Vec::new(),
            resolved: FxHashSet::default(),
        };

        for appointment in appointments.iter_mut() {
            let duration = appointment.duration_minutes();
            if duration <= capacity {
                continue;
            }

            if !appointment.modifiable {
                // A pinned appointment is immutable input; just keep it out
                // of the per-period optimization.
                debug!(
                    appointment = appointment.id.get(),
                    "multi-day but not modifiable, left untouched"
                );
                outcome.resolved.insert(appointment.id);
                continue;
            }

            let required_days = (duration as u64).div_ceil(capacity as u64) as i64;
            if required_days > self.config.splitter_max_days {
                warn!(
                    appointment = appointment.id.get(),
                    required_days, "exceeds the multi-day safety bound, skipping"
                );
                outcome.resolved.insert(appointment.id);
                continue;
            }

            let earliest = match appointment.client_window.start {
                Some(start) if start.date() > today => start.date(),
                _ => today,
            };
            let days = working_days_from(earliest, required_days as usize);
            let first = days[0];
            let last = days[days.len() - 1];

            let start = datetime_at(first, self.config.morning.start());
            let remainder = duration - capacity * (required_days - 1);
            let end = if remainder >= self.config.afternoon.duration() {
                datetime_at(last, self.config.afternoon.end())
            } else {
                datetime_at(last, self.config.morning.start() + remainder)
            };

            appointment.scheduled = Some(TimeSlot::new(start, end));
            outcome.changes.push(AppointmentChange {
                id: appointment.id,
                start,
                end,
                resources: appointment.assigned_resources.clone(),
            });
            outcome.resolved.insert(appointment.id);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use crate::problem::appointment::AppointmentBuilder;

    use super::*;

    #[test]
    fn test_two_full_days_end_at_end_of_afternoon() {
        let config = OptimizerConfig::default();
        // Exactly twice the daily capacity, starting on a Monday.
        let mut appointments = vec![
            AppointmentBuilder::default()
                .with_id(1)
                .with_duration_minutes(2 * config.daily_capacity())
                .with_gps("48.85, 2.35")
                .with_eligible(&[10])
                .build(),
        ];

        let outcome =
            MultiDaySplitter::new(&config).split(&mut appointments, date(2025, 2, 17));

        assert_eq!(outcome.changes.len(), 1);
        let change = &outcome.changes[0];
        assert_eq!(change.start, date(2025, 2, 17).at(8, 0, 0, 0));
        assert_eq!(change.end, date(2025, 2, 18).at(17, 0, 0, 0));
        assert_eq!(appointments[0].scheduled.unwrap().end, change.end);
    }

    #[test]
    fn test_small_remainder_ends_mid_morning() {
        let config = OptimizerConfig::default();
        // One full day plus one hour: the last day ends at 09:00.
        let mut appointments = vec![
            AppointmentBuilder::default()
                .with_id(1)
                .with_duration_minutes(config.daily_capacity() + 60)
                .with_gps("48.85, 2.35")
                .with_eligible(&[10])
                .build(),
        ];

        let outcome =
            MultiDaySplitter::new(&config).split(&mut appointments, date(2025, 2, 17));

        assert_eq!(outcome.changes[0].end, date(2025, 2, 18).at(9, 0, 0, 0));
    }

    #[test]
    fn test_weekend_does_not_count_as_working_day() {
        let config = OptimizerConfig::default();
        // Two working days starting Friday: Friday and Monday.
        let mut appointments = vec![
            AppointmentBuilder::default()
                .with_id(1)
                .with_duration_minutes(2 * config.daily_capacity())
                .with_gps("48.85, 2.35")
                .with_eligible(&[10])
                .build(),
        ];

        let outcome =
            MultiDaySplitter::new(&config).split(&mut appointments, date(2025, 2, 21));

        assert_eq!(outcome.changes[0].start, date(2025, 2, 21).at(8, 0, 0, 0));
        assert_eq!(outcome.changes[0].end, date(2025, 2, 24).at(17, 0, 0, 0));
    }

    #[test]
    fn test_short_appointments_pass_through() {
        let config = OptimizerConfig::default();
        let mut appointments = vec![
            AppointmentBuilder::default()
                .with_id(1)
                .with_duration_minutes(120)
                .with_gps("48.85, 2.35")
                .with_eligible(&[10])
                .build(),
        ];

        let outcome =
            MultiDaySplitter::new(&config).split(&mut appointments, date(2025, 2, 17));

        assert!(outcome.changes.is_empty());
        assert!(outcome.resolved.is_empty());
        assert!(appointments[0].scheduled.is_none());
    }

    #[test]
    fn test_client_start_pushes_the_block_later() {
        let config = OptimizerConfig::default();
        let mut appointments = vec![
            AppointmentBuilder::default()
                .with_id(1)
                .with_duration_minutes(2 * config.daily_capacity())
                .with_gps("48.85, 2.35")
                .with_eligible(&[10])
                .with_client_window(Some(date(2025, 2, 19).at(0, 0, 0, 0)), None)
                .build(),
        ];

        let outcome =
            MultiDaySplitter::new(&config).split(&mut appointments, date(2025, 2, 17));

        assert_eq!(outcome.changes[0].start, date(2025, 2, 19).at(8, 0, 0, 0));
    }
}
