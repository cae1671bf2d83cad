use jiff::SignedDuration;

use crate::problem::{
    geopoint::GeoPoint,
    period::{Period, PeriodKind},
};

/// Tunables shared by every engine. The defaults carry the production
/// constants; collaborators may override any of them per run.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub morning: Period,
    pub afternoon: Period,

    /// Start/end location of every resource route within a period.
    pub depot: GeoPoint,

    /// Average travel speed used by the haversine travel-time estimate.
    pub speed_kmh: f64,

    /// Cost of leaving a routing node unvisited.
    pub skip_penalty: i64,

    /// Hard wall-clock budget for one period solve. A timed-out period
    /// yields no assignments and is not retried.
    pub solver_budget: SignedDuration,

    /// Upper bound on ruin-and-recreate rounds within the budget.
    pub max_perturbations: usize,

    /// Maximum on-site waiting before a visit may begin, in minutes.
    pub max_waiting: i64,

    /// Allowed spread between the starts of a multi-resource appointment's
    /// copies. Zero means strict equality.
    pub sync_tolerance: i64,

    /// Working-day lookahead for the replacement selector.
    pub replacement_lookahead_days: usize,

    /// Safety bound on the multi-day splitter, in working days.
    pub splitter_max_days: i64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            morning: Period::new(PeriodKind::Morning, 8 * 60, 12 * 60),
            afternoon: Period::new(PeriodKind::Afternoon, 14 * 60, 17 * 60),
            depot: GeoPoint::new(48.8566, 2.3522),
            speed_kmh: 50.0,
            skip_penalty: 10_000,
            solver_budget: SignedDuration::from_secs(10),
            max_perturbations: 64,
            max_waiting: 30,
            sync_tolerance: 0,
            replacement_lookahead_days: 7,
            splitter_max_days: 30,
        }
    }
}

impl OptimizerConfig {
    pub fn periods(&self) -> [Period; 2] {
        [self.morning, self.afternoon]
    }

    /// Minutes of schedulable work in one day, both periods combined.
    pub fn daily_capacity(&self) -> i64 {
        self.morning.duration() + self.afternoon.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_daily_capacity() {
        let config = OptimizerConfig::default();
        assert_eq!(config.daily_capacity(), 420);
    }
}
