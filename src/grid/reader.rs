use crate::grid::error::GridError;
use crate::grid::precip_grid::PrecipGrid;
use std::path::Path;

/// Loads one precipitation file into a [`PrecipGrid`].
///
/// Implementations are called from blocking tasks and may do synchronous I/O.
pub trait GridReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<PrecipGrid, GridError>;
}

/// Reads GPM IMERG half-hourly granules (`Grid/lat`, `Grid/lon`, `Grid/precipitation`).
#[cfg(feature = "hdf5")]
#[derive(Debug, Clone)]
pub struct Hdf5GridReader {
    pub lat_dataset: String,
    pub lon_dataset: String,
    pub precipitation_dataset: String,
}

#[cfg(feature = "hdf5")]
impl Default for Hdf5GridReader {
    fn default() -> Self {
        Self {
            lat_dataset: "Grid/lat".to_string(),
            lon_dataset: "Grid/lon".to_string(),
            precipitation_dataset: "Grid/precipitation".to_string(),
        }
    }
}

#[cfg(feature = "hdf5")]
impl GridReader for Hdf5GridReader {
    fn read(&self, path: &Path) -> Result<PrecipGrid, GridError> {
        let wrap = |e| GridError::Hdf5(path.to_path_buf(), e);
        let file = hdf5::File::open(path).map_err(wrap)?;

        let read_axis = |name: &str| -> Result<Vec<f64>, GridError> {
            let values = file.dataset(name).map_err(wrap)?.read_raw::<f32>().map_err(wrap)?;
            Ok(values.into_iter().map(f64::from).collect())
        };
        let lat = read_axis(&self.lat_dataset)?;
        let lon = read_axis(&self.lon_dataset)?;

        let precipitation = file.dataset(&self.precipitation_dataset).map_err(wrap)?;
        let shape = precipitation.shape();
        let values = precipitation.read_raw::<f32>().map_err(wrap)?;

        PrecipGrid::from_array(lat, lon, values, &shape)
    }
}
