//! Gridded reanalysis fields and their reduction to per-region values.

#[cfg(feature = "netcdf")]
pub mod netcdf_source;
pub mod region;
pub mod source;
pub mod table;

use ndarray::Array2;

use crate::error::PipelineError;

#[cfg(feature = "netcdf")]
pub use netcdf_source::NetcdfGridSource;
pub use region::{magnitude, Region, RegionMap};
pub use source::JsonGridSource;
pub use table::{RegionTable, RegionTableBuilder};

/// A dataset of time-indexed scalar fields over a latitude/longitude grid.
pub trait GridSource {
    fn latitudes(&self) -> Result<Vec<f64>, PipelineError>;

    fn longitudes(&self) -> Result<Vec<f64>, PipelineError>;

    /// Number of timesteps stored for `quantity`.
    fn timesteps(&self, quantity: &str) -> Result<usize, PipelineError>;

    /// The `(latitude, longitude)` field of `quantity` at timestep `t`.
    fn frame(&self, quantity: &str, t: usize) -> Result<Array2<f64>, PipelineError>;
}
