pub mod error;
pub mod estimate;
pub mod intensity;
pub mod precip_grid;
pub mod reader;
