mod common;

use common::{monday, quick_config, resource_ids};
use fieldwork_optimizer::{
    problem::appointment::{AppointmentBuilder, AppointmentId, ResourceId},
    solver::period_router::PeriodRouter,
};

#[test]
fn zero_appointments_yield_an_empty_mapping() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);

    let result = router.solve(&[], monday(), config.morning, &resource_ids(&[10]));
    assert!(result.is_empty());
}

#[test]
fn zero_resources_yield_an_empty_mapping() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(60)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
    ];

    let result = router.solve(&appointments, monday(), config.morning, &[]);
    assert!(result.is_empty());
}

#[test]
fn single_appointment_lands_inside_the_period() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(90)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
    ];

    let result = router.solve(&appointments, monday(), config.morning, &resource_ids(&[10]));

    let assignment = result.get(&AppointmentId::new(1)).expect("scheduled");
    assert!(assignment.start_minute >= config.morning.start());
    assert!(assignment.start_minute + 90 <= config.morning.end());
    assert_eq!(assignment.resources, resource_ids(&[10]));
}

#[test]
fn client_window_bounds_the_scheduled_start() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(60)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .with_client_window(
                Some(monday().at(9, 0, 0, 0)),
                Some(monday().at(11, 0, 0, 0)),
            )
            .build(),
    ];

    let result = router.solve(&appointments, monday(), config.morning, &resource_ids(&[10]));

    let assignment = result.get(&AppointmentId::new(1)).expect("scheduled");
    // Start at or after 09:00, finished by 11:00.
    assert!(assignment.start_minute >= 9 * 60);
    assert!(assignment.start_minute + 60 <= 11 * 60);
}

#[test]
fn resources_stay_inside_the_eligible_set() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(60)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
        AppointmentBuilder::default()
            .with_id(2)
            .with_duration_minutes(60)
            .with_gps("48.90, 2.40")
            .with_eligible(&[11])
            .build(),
    ];

    let result = router.solve(
        &appointments,
        monday(),
        config.morning,
        &resource_ids(&[10, 11]),
    );

    for appointment in &appointments {
        if let Some(assignment) = result.get(&appointment.id) {
            for resource in &assignment.resources {
                assert!(
                    appointment.eligible_resources.contains(resource),
                    "appointment {} got ineligible resource {resource}",
                    appointment.id
                );
            }
        }
    }
    assert_eq!(result.len(), 2);
}

#[test]
fn multi_resource_appointment_gets_exactly_the_required_count() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(90)
            .with_required_resources(2)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10, 11, 12])
            .build(),
    ];

    let result = router.solve(
        &appointments,
        monday(),
        config.morning,
        &resource_ids(&[10, 11, 12]),
    );

    let assignment = result.get(&AppointmentId::new(1)).expect("scheduled");
    assert_eq!(assignment.resources.len(), 2);
    let unique: std::collections::BTreeSet<&ResourceId> = assignment.resources.iter().collect();
    assert_eq!(unique.len(), 2, "copies must run on distinct resources");
}

#[test]
fn understaffable_multi_resource_appointment_is_dropped_whole() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    // Two copies required but only one eligible resource exists: partial
    // assignment would be invalid output, so nothing is returned.
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(90)
            .with_required_resources(2)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
    ];

    let result = router.solve(
        &appointments,
        monday(),
        config.morning,
        &resource_ids(&[10, 11]),
    );

    assert!(result.is_empty());
}

#[test]
fn one_resource_cannot_hold_two_long_appointments() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    // Two 3-hour visits in a 4-hour morning with a single technician: one
    // of them has to be skipped.
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_duration_minutes(180)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
        AppointmentBuilder::default()
            .with_id(2)
            .with_duration_minutes(180)
            .with_gps("48.86, 2.36")
            .with_eligible(&[10])
            .build(),
    ];

    let result = router.solve(&appointments, monday(), config.morning, &resource_ids(&[10]));
    assert_eq!(result.len(), 1);
}

#[test]
fn fixed_appointments_route_as_constraints_but_are_not_reported() {
    let config = quick_config();
    let router = PeriodRouter::new(&config);
    let appointments = vec![
        AppointmentBuilder::default()
            .with_id(1)
            .with_modifiable(false)
            .with_duration_minutes(120)
            .with_gps("48.85, 2.35")
            .with_assigned(&[10])
            .with_client_window(Some(monday().at(8, 0, 0, 0)), None)
            .build(),
        // Long enough that it cannot share the morning with the pinned
        // block on the same resource.
        AppointmentBuilder::default()
            .with_id(2)
            .with_duration_minutes(180)
            .with_gps("48.85, 2.35")
            .with_eligible(&[10])
            .build(),
    ];

    let result = router.solve(&appointments, monday(), config.morning, &resource_ids(&[10]));

    // The pinned appointment never surfaces in the output.
    assert!(result.get(&AppointmentId::new(1)).is_none());
    // And it blocked the movable one from fitting.
    assert!(result.get(&AppointmentId::new(2)).is_none());
}
