//! A single precipitation field on a regular latitude/longitude grid, and the
//! nearest-cell lookup with expanding-neighbourhood fallback.

use crate::grid::error::GridError;
use haversine::{distance, Location as HaversineLocation, Units};
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Fill value of masked cells in IMERG products.
pub const MISSING_VALUE: f32 = -9999.9;
/// Largest neighbourhood radius, in cells, searched around a masked cell.
pub const DEFAULT_MAX_RADIUS: usize = 5;

/// A cell holds an observation iff it is finite and not [`MISSING_VALUE`].
pub fn is_valid(value: f32) -> bool {
    value.is_finite() && value != MISSING_VALUE
}

/// Maps longitudes outside `[-180, 180]` back into that range.
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Index of the coordinate closest to `target`; the first one wins ties.
///
/// Returns `0` for an empty slice.
pub fn nearest_index(coords: &[f64], target: f64) -> usize {
    coords
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| OrderedFloat((*c - target).abs()))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Result of [`PrecipGrid::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSample {
    /// Precipitation rate in mm/hr.
    pub value: f64,
    /// `0` for the exact cell, otherwise the neighbourhood radius that produced a value.
    pub radius: usize,
    pub lat_index: usize,
    pub lon_index: usize,
    /// Great-circle distance from the target to the matched cell centre.
    pub distance_km: f64,
}

/// Precipitation values with ascending latitude, stored row-major as `[lat][lon]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
    values: Vec<f32>,
}

impl PrecipGrid {
    /// Builds a grid from a lat-major 2-D field.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>, values: Vec<f32>) -> Result<Self, GridError> {
        let shape = vec![lat.len(), lon.len()];
        Self::from_array(lat, lon, values, &shape)
    }

    /// Builds a grid from a raw array as stored in a file.
    ///
    /// `shape` may be `[lat, lon]` or `[lon, lat]`, optionally preceded by a time
    /// axis and by further axes of length one. A time axis is reduced to the per-cell
    /// mean of its valid values. The latitude axis is flipped if stored descending.
    pub fn from_array(
        mut lat: Vec<f64>,
        lon: Vec<f64>,
        values: Vec<f32>,
        shape: &[usize],
    ) -> Result<Self, GridError> {
        if lat.is_empty() || lon.is_empty() {
            return Err(GridError::EmptyCoordinates);
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(GridError::ValueCountMismatch {
                shape: shape.to_vec(),
                expected,
                found: values.len(),
            });
        }
        let mismatch = || GridError::ShapeMismatch {
            shape: shape.to_vec(),
            lat: lat.len(),
            lon: lon.len(),
        };

        let mut dims = shape;
        while dims.len() > 2 && dims[0] == 1 {
            dims = &dims[1..];
        }
        let (plane, (rows, cols)) = match dims {
            [a, b] => (values, (*a, *b)),
            [time, a, b] => (average_over_time(&values, *time, a * b), (*a, *b)),
            _ => return Err(mismatch()),
        };

        let (n_lat, n_lon) = (lat.len(), lon.len());
        let mut values = if (rows, cols) == (n_lat, n_lon) {
            plane
        } else if (rows, cols) == (n_lon, n_lat) {
            debug!("Precipitation stored lon-major, transposing");
            transpose(&plane, rows, cols)
        } else {
            return Err(mismatch());
        };

        if n_lat > 1 && lat[0] > lat[n_lat - 1] {
            lat.reverse();
            values = values
                .chunks(n_lon)
                .rev()
                .flat_map(|row| row.iter().copied())
                .collect();
        }

        Ok(Self { lat, lon, values })
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.lat
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.lon
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn value(&self, lat_index: usize, lon_index: usize) -> Option<f32> {
        if lat_index >= self.lat.len() || lon_index >= self.lon.len() {
            return None;
        }
        self.values.get(lat_index * self.lon.len() + lon_index).copied()
    }

    /// Mean of the valid values in the square window of `radius` cells around a cell,
    /// clipped to the grid.
    fn window_mean(&self, lat_index: usize, lon_index: usize, radius: usize) -> Option<f64> {
        let (n_lat, n_lon) = self.shape();
        let lat_range = lat_index.saturating_sub(radius)..(lat_index + radius + 1).min(n_lat);
        let lon_range = lon_index.saturating_sub(radius)..(lon_index + radius + 1).min(n_lon);

        let mut sum = 0.0;
        let mut count = 0usize;
        for i in lat_range {
            let row = &self.values[i * n_lon..(i + 1) * n_lon];
            for &value in &row[lon_range.clone()] {
                if is_valid(value) {
                    sum += f64::from(value);
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    /// Precipitation at the cell nearest to `(latitude, longitude)`.
    ///
    /// If that cell is masked, windows of radius `1..=max_radius` are tried in order
    /// and the mean of the valid cells of the first non-empty window is returned.
    /// `None` if every window up to `max_radius` is empty.
    pub fn sample(&self, latitude: f64, longitude: f64, max_radius: usize) -> Option<GridSample> {
        let longitude = normalize_longitude(longitude);
        let lat_index = nearest_index(&self.lat, latitude);
        let lon_index = nearest_index(&self.lon, longitude);

        let (value, radius) = match self.value(lat_index, lon_index) {
            Some(value) if is_valid(value) => (f64::from(value), 0),
            _ => (1..=max_radius).find_map(|radius| {
                self.window_mean(lat_index, lon_index, radius)
                    .map(|mean| (mean, radius))
            })?,
        };

        let distance_km = distance(
            HaversineLocation {
                latitude,
                longitude,
            },
            HaversineLocation {
                latitude: self.lat[lat_index],
                longitude: self.lon[lon_index],
            },
            Units::Kilometers,
        );

        Some(GridSample {
            value,
            radius,
            lat_index,
            lon_index,
            distance_km,
        })
    }
}

fn transpose(values: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut out = vec![0.0; values.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = values[r * cols + c];
        }
    }
    out
}

/// Per-cell mean over `time` consecutive planes of `plane_len` values; cells with
/// no valid value in any plane become [`MISSING_VALUE`].
fn average_over_time(values: &[f32], time: usize, plane_len: usize) -> Vec<f32> {
    (0..plane_len)
        .map(|cell| {
            let (sum, count) = (0..time)
                .map(|t| values[t * plane_len + cell])
                .filter(|v| is_valid(*v))
                .fold((0.0f64, 0usize), |(sum, count), v| {
                    (sum + f64::from(v), count + 1)
                });
            if count == 0 {
                MISSING_VALUE
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect()
}
