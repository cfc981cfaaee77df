//! Gridded fields read from ERA-Interim netCDF files.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::GridSource;
use crate::error::PipelineError;

pub struct NetcdfGridSource {
    path: PathBuf,
    file: netcdf::File,
}

impl NetcdfGridSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(
                path.to_path_buf(),
                std::io::ErrorKind::NotFound.into(),
            ));
        }
        let file = netcdf::open(path).map_err(|e| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(NetcdfGridSource {
            path: path.to_path_buf(),
            file,
        })
    }

    fn malformed(&self, message: String) -> PipelineError {
        PipelineError::MalformedInput {
            path: self.path.clone(),
            message,
        }
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>, PipelineError> {
        self.file
            .variable(name)
            .ok_or_else(|| PipelineError::MissingFeature {
                feature: name.to_string(),
                context: self.path.display().to_string(),
            })
    }

    fn coordinate(&self, name: &str) -> Result<Vec<f64>, PipelineError> {
        self.variable(name)?
            .get_values::<f64, _>(..)
            .map_err(|e| self.malformed(format!("cannot read '{name}': {e}")))
    }
}

impl GridSource for NetcdfGridSource {
    fn latitudes(&self) -> Result<Vec<f64>, PipelineError> {
        self.coordinate("latitude")
    }

    fn longitudes(&self) -> Result<Vec<f64>, PipelineError> {
        self.coordinate("longitude")
    }

    fn timesteps(&self, quantity: &str) -> Result<usize, PipelineError> {
        let var = self.variable(quantity)?;
        var.dimensions()
            .first()
            .map(|d| d.len())
            .ok_or_else(|| self.malformed(format!("'{quantity}' has no dimensions")))
    }

    fn frame(&self, quantity: &str, t: usize) -> Result<Array2<f64>, PipelineError> {
        let var = self.variable(quantity)?;
        let dims = var.dimensions();
        if dims.len() != 3 {
            return Err(self.malformed(format!(
                "'{quantity}' has {} dimensions, expected (time, latitude, longitude)",
                dims.len()
            )));
        }
        let shape = (dims[1].len(), dims[2].len());

        // Packed variables store scaled integers.
        let scale = attribute_f64(&var, "scale_factor").unwrap_or(1.0);
        let offset = attribute_f64(&var, "add_offset").unwrap_or(0.0);
        let fill = attribute_f64(&var, "_FillValue").or_else(|| attribute_f64(&var, "missing_value"));

        let raw = var
            .get_values::<f64, _>((t, .., ..))
            .map_err(|e| self.malformed(format!("cannot read '{quantity}'[{t}]: {e}")))?;

        let values = raw
            .into_iter()
            .map(|v| match fill {
                Some(f) if v == f => f64::NAN,
                _ => v * scale + offset,
            })
            .collect();

        Array2::from_shape_vec(shape, values)
            .map_err(|e| self.malformed(format!("'{quantity}'[{t}]: {e}")))
    }
}

fn attribute_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            netcdf::AttributeValue::Short(s) => Some(s as f64),
            netcdf::AttributeValue::Int(i) => Some(i as f64),
            _ => None,
        })
}
