pub mod error;
pub mod prediction;
pub mod request;
