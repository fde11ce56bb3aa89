pub mod data_loader;
pub mod error;
pub mod matrix;
pub mod synthetic;
pub mod trainer;
