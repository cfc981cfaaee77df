//! Bounding-box regions and the grid-cell to region map.

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::{config::ReductionMode, error::PipelineError};

/// An axis-aligned lon/lat box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `[min_lon, max_lon, max_lat, min_lat]`
    pub bounds: [f64; 4],
}

impl Region {
    pub fn new(bounds: [f64; 4]) -> Self {
        Region { name: None, bounds }
    }

    pub fn named(name: &str, bounds: [f64; 4]) -> Self {
        Region {
            name: Some(name.to_string()),
            bounds,
        }
    }

    pub fn min_lon(&self) -> f64 {
        self.bounds[0]
    }

    pub fn max_lon(&self) -> f64 {
        self.bounds[1]
    }

    pub fn max_lat(&self) -> f64 {
        self.bounds[2]
    }

    pub fn min_lat(&self) -> f64 {
        self.bounds[3]
    }

    /// Strict containment: points on the border belong to no region.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon > self.min_lon() && lon < self.max_lon() && lat < self.max_lat() && lat > self.min_lat()
    }

    pub fn is_well_formed(&self) -> bool {
        self.min_lon() < self.max_lon() && self.min_lat() < self.max_lat()
    }
}

/// Region index of every (latitude, longitude) cell of a grid, `None` for
/// cells outside all regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMap {
    cells: Array2<Option<usize>>,
    region_count: usize,
}

impl RegionMap {
    /// Assigns each cell to the first region containing it.
    pub fn build(latitudes: &[f64], longitudes: &[f64], regions: &[Region]) -> Self {
        let cells = Array2::from_shape_fn((latitudes.len(), longitudes.len()), |(y, x)| {
            let (lat, lon) = (latitudes[y], longitudes[x]);
            regions.iter().position(|r| r.contains(lon, lat))
        });

        RegionMap {
            cells,
            region_count: regions.len(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn region_of(&self, row: usize, col: usize) -> Option<usize> {
        self.cells.get((row, col)).copied().flatten()
    }

    /// Number of cells assigned to each region.
    pub fn cell_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.region_count];
        for region in self.cells.iter().flatten() {
            counts[*region] += 1;
        }
        counts
    }

    /// One value per region: the mean (or mean magnitude) of the cells
    /// assigned to it. Unassigned and non-finite cells contribute nothing.
    pub fn reduce(
        &self,
        field: ArrayView2<f64>,
        mode: ReductionMode,
    ) -> Result<Vec<f64>, PipelineError> {
        if field.dim() != self.shape() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.shape(),
                found: field.dim(),
            });
        }

        let mut sums = vec![0.0; self.region_count];
        let mut counts = vec![0usize; self.region_count];

        Zip::from(&self.cells).and(&field).for_each(|region, &value| {
            if let Some(r) = *region {
                if value.is_finite() {
                    sums[r] += match mode {
                        ReductionMode::Mean => value,
                        ReductionMode::MeanAbs => value.abs(),
                    };
                    counts[r] += 1;
                }
            }
        });

        sums.into_iter()
            .zip(counts)
            .enumerate()
            .map(|(r, (sum, count))| {
                if count == 0 {
                    Err(PipelineError::EmptyRegion(r))
                } else {
                    Ok(sum / count as f64)
                }
            })
            .collect()
    }
}

/// Per-cell magnitude of the vector with components `u` and `v`.
pub fn magnitude(u: ArrayView2<f64>, v: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError> {
    if u.dim() != v.dim() {
        return Err(PipelineError::ShapeMismatch {
            expected: u.dim(),
            found: v.dim(),
        });
    }
    Ok(Zip::from(&u).and(&v).map_collect(|a, b| (a * a + b * b).sqrt()))
}

// -- Tests -------------------------------------------------------------------
