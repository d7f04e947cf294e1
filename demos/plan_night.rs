//! Plans a winter night from Madrid and checks the resulting sequence
//! against a German equatorial mount.
//!
//! Run with `cargo run --example plan_night`.

use chrono::{NaiveDate, TimeZone, Utc};
use nightplan::mount::{simulate_sequence, MountSafetyConfig};
use nightplan::oracle::{Site, StandardOracle, Twilight};
use nightplan::session::{
    ManualScheduleItem, SchedulerConfig, SessionRequest, SessionScheduler, Strategy,
};
use nightplan::target::{Priority, Target};

fn main() {
    let site = Site::new(40.42, -3.70).with_utc_offset_minutes(60);
    let twilight = Twilight::astronomical(
        Utc.with_ymd_and_hms(2024, 1, 15, 18, 35, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 16, 5, 50, 0).unwrap(),
    );
    let plan_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let targets = vec![
        Target::new("m42", "Orion Nebula", 83.82, -5.39)
            .with_priority(Priority::High)
            .with_desired_exposure(120.0),
        Target::new("m31", "Andromeda Galaxy", 10.68, 41.27).with_desired_exposure(90.0),
        Target::new("ngc2237", "Rosette Nebula", 97.98, 4.95).with_desired_exposure(180.0),
        Target::new("m81", "Bode's Galaxy", 148.89, 69.07),
        Target::new("m51", "Whirlpool Galaxy", 202.47, 47.20).with_priority(Priority::Low),
    ];

    let mount = MountSafetyConfig::default();
    let mut config = SchedulerConfig::new(site)
        .with_strategy(Strategy::Balanced)
        .with_mount(mount.clone());
    config.constraints.enforce_mount_safety = true;

    let lock = ManualScheduleItem::new("m31").starting_at("19:45").lasting(90.0).locked();
    let request = SessionRequest::new(targets, twilight.clone(), plan_date).with_manual_edit(lock);

    let oracle = StandardOracle::new(twilight);
    let plan = SessionScheduler::new(config).schedule(&oracle, &request);

    println!("Plan for the night of {plan_date}");
    for entry in &plan.targets {
        println!(
            "  {:>2}. {:<18} {} -> {}  ({:.1} h, peak {:.0}°, feasibility {:.0}{})",
            entry.order,
            entry.target.name,
            entry.start_time.format("%H:%M"),
            entry.end_time.format("%H:%M"),
            entry.duration.value(),
            entry.max_altitude.value(),
            entry.feasibility.score,
            if entry.is_locked { ", locked" } else { "" },
        );
    }
    println!(
        "Imaging {:.1} h, coverage {:.0}%, efficiency {:.0}%, {} gap(s)",
        plan.total_imaging_time.value(),
        plan.night_coverage,
        plan.efficiency,
        plan.gaps.len()
    );
    for conflict in &plan.conflicts {
        println!("  conflict {conflict}");
    }
    for advice in &plan.recommendations {
        println!("  advice {}", advice.key());
    }
    for warning in &plan.warnings {
        println!("  warning {}", warning.key());
    }

    let simulation = simulate_sequence(&plan.sequence(), &mount, &site);
    println!(
        "Mount: {} slew(s), {:.0} s slewing, {} flip(s), {:.0}° rotation, \
         cable wrap risk: {}, safe: {}",
        simulation.slews.len(),
        simulation.total_slew_time.value(),
        simulation.meridian_flips,
        simulation.cumulative_rotation_deg,
        simulation.cable_wrap_risk,
        simulation.is_safe
    );
    for issue in simulation.checks.iter().flat_map(|c| c.issues.iter()) {
        println!("  {:?} {:?}: {}", issue.severity, issue.kind, issue.message);
    }
}
