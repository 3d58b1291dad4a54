pub mod aperture;
pub mod config;
pub mod constants;
mod earth_orientation;
pub mod geometry;
pub mod instrument;
pub mod legacy;
pub mod library;
pub mod observation;
pub mod planner;
pub mod planner_errors;
pub mod resolver;
pub mod sites;
pub mod target;
pub mod time;
pub mod time_series;
pub mod vapp;
