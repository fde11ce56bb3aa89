use raincast::{CoordinateInput, GridRequest, RainfallEstimator, RaincastError};
use std::env;
use std::path::PathBuf;

/// Usage: `grid_estimate <lat> <lon> [data dir]`
///
/// Averages the precipitation at the coordinate over every `*.HDF5` IMERG granule
/// in the data directory (default `./data`).
#[tokio::main]
async fn main() -> Result<(), RaincastError> {
    let mut args = env::args().skip(1);
    let request = GridRequest {
        lat: args.next().map(CoordinateInput::Text),
        lon: args.next().map(CoordinateInput::Text),
    };
    let data_dir = args.next().map(PathBuf::from).unwrap_or_else(|| "./data".into());

    let estimator = RainfallEstimator::imerg(data_dir);
    let estimate = estimator.estimate_request(&request).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&estimate).unwrap_or_else(|e| e.to_string())
    );
    Ok(())
}
