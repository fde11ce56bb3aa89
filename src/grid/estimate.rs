//! Rainfall estimate at a coordinate, averaged over every grid file in a directory.

use crate::error::RaincastError;
use crate::grid::error::GridError;
use crate::grid::intensity::RainIntensity;
use crate::grid::precip_grid::{GridSample, DEFAULT_MAX_RADIUS};
use crate::grid::reader::GridReader;
use crate::types::request::{GridQuery, GridRequest};
use crate::utils::round_to;
use bon::bon;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_EXTENSION: &str = "HDF5";

/// A sample counts as rainy above this rate (mm/hr).
const RAINY_THRESHOLD: f64 = 0.1;
/// Half-hourly rates are turned into a daily figure with this factor.
const DAILY_FACTOR: f64 = 3.0;
const WILL_RAIN_PROBABILITY: f64 = 30.0;
const WILL_RAIN_RATE: f64 = 0.2;

/// Sample taken from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSample {
    pub path: PathBuf,
    pub sample: GridSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallEstimate {
    pub latitude: f64,
    pub longitude: f64,
    pub average_precipitation_mm_per_hr: f64,
    pub average_daily_precipitation_mm: f64,
    /// Share of files with a rainy sample, in percent.
    pub rain_probability_percent: f64,
    pub will_it_rain: bool,
    pub rain_intensity_category: RainIntensity,
    pub files_used: usize,
}

impl RainfallEstimate {
    /// Combines per-file rates. `None` if `rates` is empty.
    pub fn from_rates(latitude: f64, longitude: f64, rates: &[f64]) -> Option<Self> {
        if rates.is_empty() {
            return None;
        }
        let n = rates.len() as f64;
        let average = rates.iter().sum::<f64>() / n;
        let rainy = rates.iter().filter(|rate| **rate > RAINY_THRESHOLD).count();
        let probability = round_to(rainy as f64 / n * 100.0, 1);

        Some(Self {
            latitude,
            longitude,
            average_precipitation_mm_per_hr: round_to(average, 3),
            average_daily_precipitation_mm: round_to(average * DAILY_FACTOR, 3),
            rain_probability_percent: probability,
            will_it_rain: probability > WILL_RAIN_PROBABILITY || average > WILL_RAIN_RATE,
            rain_intensity_category: RainIntensity::from_rate(average),
            files_used: rates.len(),
        })
    }
}

/// Scans a directory of precipitation files and samples each at a coordinate.
///
/// ```no_run
/// # use raincast::{GridError, GridQuery, GridReader, PrecipGrid, RainfallEstimator};
/// # use std::path::Path;
/// # struct MyReader;
/// # impl GridReader for MyReader {
/// #     fn read(&self, _: &Path) -> Result<PrecipGrid, GridError> { unimplemented!() }
/// # }
/// # async fn run() -> Result<(), GridError> {
/// let estimator = RainfallEstimator::builder(MyReader)
///     .data_dir("/srv/imerg".into())
///     .max_radius(3)
///     .build();
/// let estimate = estimator
///     .estimate(GridQuery { latitude: -33.87, longitude: 151.21 })
///     .await?;
/// println!("{}", estimate.rain_intensity_category);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RainfallEstimator {
    reader: Arc<dyn GridReader>,
    data_dir: PathBuf,
    extension: String,
    max_radius: usize,
}

#[bon]
impl RainfallEstimator {
    /// * `.data_dir(PathBuf)`: defaults to `./data`.
    /// * `.extension(String)`: file name suffix to pick up, defaults to `HDF5`.
    /// * `.max_radius(usize)`: neighbourhood search limit in cells, defaults to 5.
    #[builder]
    pub fn new<R: GridReader + 'static>(
        #[builder(start_fn)] reader: R,
        data_dir: Option<PathBuf>,
        extension: Option<String>,
        max_radius: Option<usize>,
    ) -> Self {
        Self {
            reader: Arc::new(reader),
            data_dir: data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            extension: extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            max_radius: max_radius.unwrap_or(DEFAULT_MAX_RADIUS),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Matching files in the data directory, sorted by name.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, GridError> {
        let wrap = |e| GridError::DirectoryRead(self.data_dir.clone(), e);
        let mut entries = tokio::fs::read_dir(&self.data_dir).await.map_err(wrap)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(wrap)? {
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(self.extension.as_str()));
            if matches && entry.path().is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Samples every matching file. Files that cannot be read or have no valid value
    /// near the target are skipped.
    pub async fn samples(&self, query: GridQuery) -> Result<Vec<FileSample>, GridError> {
        let files = self.list_files().await?;
        let mut samples = Vec::with_capacity(files.len());
        for path in files {
            let reader = Arc::clone(&self.reader);
            let max_radius = self.max_radius;
            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                reader
                    .read(&task_path)
                    .map(|grid| grid.sample(query.latitude, query.longitude, max_radius))
            })
            .await?;
            match result {
                Ok(Some(sample)) => samples.push(FileSample { path, sample }),
                Ok(None) => warn!(
                    "No valid value within {} cells of ({}, {}) in {}",
                    max_radius,
                    query.latitude,
                    query.longitude,
                    path.display()
                ),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(samples)
    }

    pub async fn estimate(&self, query: GridQuery) -> Result<RainfallEstimate, GridError> {
        let samples = self.samples(query).await?;
        let rates: Vec<f64> = samples.iter().map(|s| s.sample.value).collect();
        let estimate = RainfallEstimate::from_rates(query.latitude, query.longitude, &rates)
            .ok_or(GridError::NoData {
                latitude: query.latitude,
                longitude: query.longitude,
            })?;
        info!(
            "Estimated {:.3} mm/hr at ({}, {}) from {} files",
            estimate.average_precipitation_mm_per_hr,
            query.latitude,
            query.longitude,
            estimate.files_used
        );
        Ok(estimate)
    }

    /// Validates a raw request, then estimates. Invalid input never touches the files.
    pub async fn estimate_request(
        &self,
        request: &GridRequest,
    ) -> Result<RainfallEstimate, RaincastError> {
        let query = request.validate()?;
        Ok(self.estimate(query).await?)
    }
}

#[cfg(feature = "hdf5")]
impl RainfallEstimator {
    /// IMERG granules in `data_dir` with the default settings.
    pub fn imerg(data_dir: PathBuf) -> Self {
        Self::builder(crate::grid::reader::Hdf5GridReader::default())
            .data_dir(data_dir)
            .build()
    }
}
