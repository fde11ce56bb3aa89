pub mod backfill;
pub mod config;
pub mod encoder;
pub mod temporal;
