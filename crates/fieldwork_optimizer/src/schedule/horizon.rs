use fxhash::FxHashSet;
use jiff::civil;
use tracing::{debug, info};

use crate::{
    config::OptimizerConfig,
    problem::{
        appointment::{Appointment, AppointmentId, TimeSlot, resource_pool},
        clock::{datetime_at, minutes_since_midnight},
        period::{PeriodKind, is_working_day, next_day},
    },
    schedule::{
        delta::{AppointmentChange, ScheduleDelta},
        splitter::MultiDaySplitter,
    },
    solver::period_router::PeriodRouter,
};

/// Drives the Period Router across a multi-day horizon and assembles the
/// net changed-appointments delta.
pub struct HorizonScheduler {
    config: OptimizerConfig,
}

impl Default for HorizonScheduler {
    fn default() -> Self {
        HorizonScheduler::new(OptimizerConfig::default())
    }
}

impl HorizonScheduler {
    pub fn new(config: OptimizerConfig) -> Self {
        HorizonScheduler { config }
    }

    /// Optimizes `working_days` working days starting at `today`. Weekends
    /// are skipped and do not consume the day budget. "Today" is injected
    /// so runs are reproducible; the caller owns the clock.
    pub fn run(
        &self,
        appointments: &[Appointment],
        working_days: usize,
        today: civil::Date,
    ) -> ScheduleDelta {
        // Private deep copy: the caller's records are never mutated.
        let mut work: Vec<Appointment> = appointments.to_vec();
        let pool = resource_pool(&work);
        let mut delta = ScheduleDelta::default();

        let split = MultiDaySplitter::new(&self.config).split(&mut work, today);
        let mut resolved: FxHashSet<_> = split.resolved;
        for change in split.changes {
            delta.push(change);
        }

        let router = PeriodRouter::new(&self.config);
        let mut day = today;
        let mut processed = 0;

        while processed < working_days {
            if !is_working_day(day) {
                day = next_day(day);
                continue;
            }

            for period in self.config.periods() {
                let eligible: Vec<usize> = work
                    .iter()
                    .enumerate()
                    .filter(|(_, appointment)| {
                        self.eligible_for_period(appointment, day, period.kind(), &resolved)
                    })
                    .map(|(index, _)| index)
                    .collect();
                if eligible.is_empty() {
                    continue;
                }

                let subset: Vec<Appointment> =
                    eligible.iter().map(|&index| work[index].clone()).collect();
                let result = router.solve(&subset, day, period, &pool);

                for &index in &eligible {
                    let appointment = &mut work[index];
                    let Some(assignment) = result.get(&appointment.id) else {
                        continue;
                    };

                    // Routed appointments are final for this run, written
                    // back or not.
                    resolved.insert(appointment.id);

                    if !appointment.modifiable {
                        continue;
                    }

                    let start = datetime_at(day, assignment.start_minute);
                    let end =
                        datetime_at(day, assignment.start_minute + appointment.duration_minutes());
                    let resources = assignment.resources.clone();

                    let same_slot = appointment.scheduled == Some(TimeSlot::new(start, end));
                    let same_resources = {
                        let mut current = appointment.assigned_resources.clone();
                        current.sort();
                        current.dedup();
                        current == resources
                    };
                    if same_slot && same_resources {
                        continue;
                    }

                    appointment.scheduled = Some(TimeSlot::new(start, end));
                    appointment.assigned_resources = resources.clone();
                    delta.push(AppointmentChange {
                        id: appointment.id,
                        start,
                        end,
                        resources,
                    });
                }
            }

            processed += 1;
            day = next_day(day);
        }

        info!(
            appointments = appointments.len(),
            changed = delta.len(),
            working_days,
            "horizon optimized"
        );
        delta
    }

    /// Period eligibility: unresolved, client window covering the day, and
    /// the desired start falling in the period's half. Desired starts in
    /// the boundary band between the periods go to the morning; window-less
    /// appointments try the morning first and fall through to the
    /// afternoon only if the morning left them unrouted.
    fn eligible_for_period(
        &self,
        appointment: &Appointment,
        day: civil::Date,
        kind: PeriodKind,
        resolved: &FxHashSet<AppointmentId>,
    ) -> bool {
        if resolved.contains(&appointment.id) {
            return false;
        }
        if !appointment.client_window.covers_day(day) {
            debug!(
                appointment = appointment.id.get(),
                %day,
                "outside client window"
            );
            return false;
        }

        match appointment.client_window.start {
            Some(desired) => {
                let desired_kind = if minutes_since_midnight(&desired) >= self.config.afternoon.start()
                {
                    PeriodKind::Afternoon
                } else {
                    PeriodKind::Morning
                };
                desired_kind == kind
            }
            None => true,
        }
    }
}
