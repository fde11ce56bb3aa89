pub mod builder;
pub mod location_stats;
