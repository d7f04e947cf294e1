//! Sky primitives: sidereal time, horizontal coordinates, lunar position.
//!
//! These are deliberately low precision (arc-minute level); the scheduler
//! samples at minute granularity and compares against limits measured in
//! degrees.

pub mod coordinates;
pub mod moon;
pub mod time;

pub use coordinates::{
    altitude_deg, altitude_from_hour_angle, angular_separation, transit_altitude_deg,
};
pub use moon::{moon_illumination, moon_position};
pub use time::{hour_angle_hours, julian_date, lst_degrees, SIDEREAL_RATIO};
