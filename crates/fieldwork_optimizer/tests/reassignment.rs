mod common;

use common::monday;
use fieldwork_optimizer::{
    assign::reassign::ReassignmentEngine,
    problem::appointment::{Appointment, AppointmentBuilder, AppointmentId, ResourceId},
};

fn scheduled(
    id: i64,
    criticality: i32,
    assigned: &[i64],
    eligible: &[i64],
    start_hour: i8,
    end_hour: i8,
    gps: &str,
) -> Appointment {
    AppointmentBuilder::default()
        .with_id(id)
        .with_criticality(criticality)
        .with_assigned(assigned)
        .with_eligible(eligible)
        .with_gps(gps)
        .with_scheduled(
            monday().at(start_hour, 0, 0, 0),
            monday().at(end_hour, 0, 0, 0),
        )
        .build()
}

const R: i64 = 1;
const S: i64 = 2;

#[test]
fn equal_criticality_blocks_the_steal() {
    // A and B share criticality 5; B holds the only alternate resource
    // during A's slot. A must be cancelled and B left untouched.
    let a = scheduled(10, 5, &[R], &[S], 8, 10, "48.85, 2.35");
    let b = scheduled(20, 5, &[S], &[S], 9, 11, "48.86, 2.36");

    let touched = ReassignmentEngine::reassign(&[a, b], ResourceId::new(R));

    assert_eq!(touched.len(), 1);
    let a = &touched[0];
    assert_eq!(a.id, AppointmentId::new(10));
    assert!(a.scheduled.is_none(), "A must be cancelled");
    assert!(a.assigned_resources.is_empty());
    assert!(a.alert.is_some());
}

#[test]
fn a_free_resource_fills_the_orphan_without_cancelling() {
    // S is in A's possible pool and has no conflicting appointment.
    let a = scheduled(10, 3, &[R], &[S], 8, 10, "48.85, 2.35");
    let other = scheduled(20, 1, &[S], &[S], 14, 16, "48.86, 2.36"); // no overlap

    let touched = ReassignmentEngine::reassign(&[a, other], ResourceId::new(R));

    assert_eq!(touched.len(), 1);
    let a = &touched[0];
    assert_eq!(a.id, AppointmentId::new(10));
    assert!(a.scheduled.is_some(), "A keeps its slot");
    assert_eq!(a.assigned_resources, vec![ResourceId::new(S)]);
    assert!(a.alert.is_none());
}

#[test]
fn strictly_higher_criticality_steals_and_cancels_the_victim() {
    let a = scheduled(10, 5, &[R], &[S], 8, 10, "48.85, 2.35");
    let victim = scheduled(20, 2, &[S], &[S], 9, 11, "48.86, 2.36");

    let touched = ReassignmentEngine::reassign(&[a, victim], ResourceId::new(R));

    assert_eq!(touched.len(), 2);
    let a = touched.iter().find(|t| t.id == AppointmentId::new(10)).unwrap();
    let victim = touched.iter().find(|t| t.id == AppointmentId::new(20)).unwrap();

    assert_eq!(a.assigned_resources, vec![ResourceId::new(S)]);
    assert!(a.scheduled.is_some());

    assert!(victim.scheduled.is_none());
    assert!(victim.assigned_resources.is_empty());
    let alert = victim.alert.as_deref().unwrap();
    assert!(alert.contains("10"), "alert names the preemptor: {alert}");
}

#[test]
fn candidates_prefer_the_smallest_average_conflict_distance() {
    const T: i64 = 3;
    // Both S and T are stealable; T's conflicting appointment is much
    // closer to the orphan, so T is taken and the near victim cancelled.
    let a = scheduled(10, 5, &[R], &[S, T], 8, 10, "48.8500, 2.3500");
    let far_victim = scheduled(20, 1, &[S], &[S], 9, 11, "44.8000, -0.6000");
    let near_victim = scheduled(30, 1, &[T], &[T], 9, 11, "48.8510, 2.3510");

    let touched = ReassignmentEngine::reassign(&[a, far_victim, near_victim], ResourceId::new(R));

    let a = touched.iter().find(|t| t.id == AppointmentId::new(10)).unwrap();
    assert_eq!(a.assigned_resources, vec![ResourceId::new(T)]);

    assert!(touched.iter().any(|t| t.id == AppointmentId::new(30)));
    assert!(
        !touched.iter().any(|t| t.id == AppointmentId::new(20)),
        "the far appointment keeps its resource"
    );
}

#[test]
fn unfillable_multi_resource_orphan_is_cancelled() {
    // Two resources required, only one candidate available.
    let a = AppointmentBuilder::default()
        .with_id(10)
        .with_criticality(4)
        .with_required_resources(2)
        .with_assigned(&[R, S])
        .with_eligible(&[S])
        .with_gps("48.85, 2.35")
        .with_scheduled(monday().at(8, 0, 0, 0), monday().at(12, 0, 0, 0))
        .build();

    let touched = ReassignmentEngine::reassign(&[a], ResourceId::new(R));

    assert_eq!(touched.len(), 1);
    assert!(touched[0].scheduled.is_none());
    let alert = touched[0].alert.as_deref().unwrap();
    assert!(alert.contains(&R.to_string()), "alert names the absence: {alert}");
}

#[test]
fn the_absent_resource_is_never_chosen_again() {
    // The absent resource also sits in the possible pool; it must not be
    // picked as its own replacement.
    let a = scheduled(10, 3, &[R], &[R, S], 8, 10, "48.85, 2.35");

    let touched = ReassignmentEngine::reassign(&[a], ResourceId::new(R));

    assert_eq!(touched.len(), 1);
    assert_eq!(touched[0].assigned_resources, vec![ResourceId::new(S)]);
}
