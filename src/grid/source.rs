//! Gridded fields stored as JSON.
//!
//! ```json
//! {
//!   "latitude": [70.0, 69.67, ...],
//!   "longitude": [19.0, 19.33, ...],
//!   "fields": { "u10": [[[...], ...], ...], "v10": ... }
//! }
//! ```
//!
//! Each field is indexed `[time][latitude][longitude]`.

use std::{collections::BTreeMap, path::Path};

use ndarray::Array2;
use serde::Deserialize;

use super::GridSource;
use crate::{error::PipelineError, reading::read_json};

#[derive(Debug, Deserialize)]
struct RawGrid {
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    fields: BTreeMap<String, Vec<Vec<Vec<f64>>>>,
}

#[derive(Debug, Clone)]
pub struct JsonGridSource {
    name: String,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    fields: BTreeMap<String, Vec<Array2<f64>>>,
}

impl JsonGridSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let raw: RawGrid = read_json(path)?;
        let shape = (raw.latitude.len(), raw.longitude.len());

        let mut fields = BTreeMap::new();
        for (quantity, frames) in raw.fields {
            let frames = frames
                .into_iter()
                .enumerate()
                .map(|(t, rows)| {
                    frame_from_rows(rows, shape).ok_or_else(|| PipelineError::MalformedInput {
                        path: path.to_path_buf(),
                        message: format!(
                            "'{quantity}' timestep {t} does not match the {}x{} grid",
                            shape.0, shape.1
                        ),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            fields.insert(quantity, frames);
        }

        Ok(JsonGridSource {
            name: path.display().to_string(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            fields,
        })
    }

    /// Builds a source from in-memory frames.
    pub fn from_frames(
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        fields: BTreeMap<String, Vec<Array2<f64>>>,
    ) -> Self {
        JsonGridSource {
            name: "in-memory grid".to_string(),
            latitude,
            longitude,
            fields,
        }
    }

    fn field(&self, quantity: &str) -> Result<&[Array2<f64>], PipelineError> {
        self.fields
            .get(quantity)
            .map(Vec::as_slice)
            .ok_or_else(|| PipelineError::MissingFeature {
                feature: quantity.to_string(),
                context: self.name.clone(),
            })
    }
}

fn frame_from_rows(rows: Vec<Vec<f64>>, shape: (usize, usize)) -> Option<Array2<f64>> {
    if rows.len() != shape.0 || rows.iter().any(|row| row.len() != shape.1) {
        return None;
    }
    Array2::from_shape_vec(shape, rows.into_iter().flatten().collect()).ok()
}

impl GridSource for JsonGridSource {
    fn latitudes(&self) -> Result<Vec<f64>, PipelineError> {
        Ok(self.latitude.clone())
    }

    fn longitudes(&self) -> Result<Vec<f64>, PipelineError> {
        Ok(self.longitude.clone())
    }

    fn timesteps(&self, quantity: &str) -> Result<usize, PipelineError> {
        Ok(self.field(quantity)?.len())
    }

    fn frame(&self, quantity: &str, t: usize) -> Result<Array2<f64>, PipelineError> {
        let frames = self.field(quantity)?;
        frames
            .get(t)
            .cloned()
            .ok_or_else(|| PipelineError::MalformedInput {
                path: self.name.clone().into(),
                message: format!("'{quantity}' has {} timesteps, asked for {t}", frames.len()),
            })
    }
}

// -- Tests -------------------------------------------------------------------
