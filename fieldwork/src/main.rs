use anyhow::Result;
use fieldwork_optimizer::{
    config::OptimizerConfig,
    problem::{
        appointment::{Appointment, AppointmentBuilder},
        clock::format_utc,
    },
    schedule::horizon::HorizonScheduler,
};
use jiff::{Zoned, civil};
use tracing::{Level, info};

/// A small synthetic tour around the Paris region: the shape of what the
/// upstream normalization stage hands the optimizer.
fn create_demo_appointments(today: civil::Date) -> Vec<Appointment> {
    let morning = today.at(8, 0, 0, 0);
    let afternoon = today.at(14, 0, 0, 0);

    vec![
        // Pinned visit, already agreed with the client.
        AppointmentBuilder::default()
            .with_id(11_673)
            .with_modifiable(false)
            .with_duration_minutes(90)
            .with_gps("48.8708, 2.3421")
            .with_assigned(&[101])
            .with_scheduled(morning, today.at(9, 30, 0, 0))
            .with_client_window(Some(morning), None)
            .build(),
        AppointmentBuilder::default()
            .with_id(11_674)
            .with_duration_minutes(120)
            .with_gps("48.8123, 2.3812")
            .with_eligible(&[101, 102, 103])
            .build(),
        AppointmentBuilder::default()
            .with_id(11_675)
            .with_duration_minutes(60)
            .with_gps("48.9021, 2.2675")
            .with_eligible(&[102, 103])
            .with_client_window(Some(afternoon), None)
            .build(),
        // Two technicians on site at the same time.
        AppointmentBuilder::default()
            .with_id(11_676)
            .with_duration_minutes(90)
            .with_required_resources(2)
            .with_gps("48.7891, 2.4012")
            .with_eligible(&[101, 102, 103])
            .build(),
        AppointmentBuilder::default()
            .with_id(11_677)
            .with_duration_minutes(45)
            .with_gps("48.8402, 2.2921")
            .with_eligible(&[101, 103])
            .build(),
        // Longer than a working day: handled by the multi-day splitter.
        AppointmentBuilder::default()
            .with_id(11_678)
            .with_duration_minutes(900)
            .with_gps("48.9312, 2.3567")
            .with_eligible(&[102])
            .build(),
    ]
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let today = Zoned::now().date();
    let appointments = create_demo_appointments(today);
    info!(count = appointments.len(), %today, "optimizing demo schedule");

    let scheduler = HorizonScheduler::new(OptimizerConfig::default());
    let delta = scheduler.run(&appointments, 3, today);

    for change in delta.iter() {
        info!(
            appointment = change.id.get(),
            start = %format_utc(&change.start),
            end = %format_utc(&change.end),
            resources = ?change.resources,
            "updated"
        );
    }

    info!(changed = delta.len(), "done");
    println!("{}", serde_json::to_string_pretty(&delta)?);

    Ok(())
}
