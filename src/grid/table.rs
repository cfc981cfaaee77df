//! Assembles the per-region table, one row per timestep.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};
use ndarray::Array2;

use super::{magnitude, GridSource, RegionMap};
use crate::{
    config::{CalendarConfig, ReduceConfig},
    error::PipelineError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    /// `{quantity}_{region_index}`, base quantities first.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub datetimes: Vec<NaiveDateTime>,
}

/// Accumulates table rows month by month. The region map is computed from the
/// first month's grid and reused for every later one.
pub struct RegionTableBuilder<'a> {
    calendar: &'a CalendarConfig,
    reduce: &'a ReduceConfig,
    map: Option<RegionMap>,
    rows: Vec<Vec<f64>>,
}

impl<'a> RegionTableBuilder<'a> {
    pub fn new(calendar: &'a CalendarConfig, reduce: &'a ReduceConfig) -> Self {
        RegionTableBuilder {
            calendar,
            reduce,
            map: None,
            rows: Vec::new(),
        }
    }

    pub fn region_map(&self) -> Option<&RegionMap> {
        self.map.as_ref()
    }

    /// Reduces every timestep of `month` (1-based) read from `source`.
    pub fn add_month(&mut self, month: usize, source: &dyn GridSource) -> Result<(), PipelineError> {
        let map = self.region_map_for(source)?;
        let timesteps = self.calendar.timesteps_in(month);

        for quantity in self.needed_quantities() {
            let available = source.timesteps(quantity)?;
            if available < timesteps {
                return Err(PipelineError::MalformedInput {
                    path: format!("month {month}").into(),
                    message: format!(
                        "'{quantity}' has {available} timesteps, {timesteps} expected"
                    ),
                });
            }
        }

        info!("Reducing {timesteps} timesteps of month {month}");

        let mut rows = Vec::with_capacity(timesteps);
        for t in 0..timesteps {
            rows.push(self.reduce_timestep(&map, source, t)?);
        }
        self.rows.append(&mut rows);
        self.map = Some(map);

        Ok(())
    }

    pub fn finish(self) -> RegionTable {
        let datetimes = datetime_index(
            self.calendar.year,
            self.calendar.timestep_hours,
            self.rows.len(),
        );

        RegionTable {
            columns: self.reduce.column_names(),
            rows: self.rows,
            datetimes,
        }
    }

    fn region_map_for(&self, source: &dyn GridSource) -> Result<RegionMap, PipelineError> {
        let latitudes = source.latitudes()?;
        let longitudes = source.longitudes()?;

        match &self.map {
            Some(map) if map.shape() == (latitudes.len(), longitudes.len()) => Ok(map.clone()),
            Some(map) => Err(PipelineError::ShapeMismatch {
                expected: map.shape(),
                found: (latitudes.len(), longitudes.len()),
            }),
            None => {
                let map = RegionMap::build(&latitudes, &longitudes, &self.reduce.regions);
                debug!("Cells per region: {:?}", map.cell_counts());
                Ok(map)
            }
        }
    }

    fn needed_quantities(&self) -> Vec<&'a str> {
        let reduce = self.reduce;
        let mut names: Vec<&str> = reduce.quantities.iter().map(String::as_str).collect();
        for d in &reduce.derived {
            for component in [d.u.as_str(), d.v.as_str()] {
                if !names.contains(&component) {
                    names.push(component);
                }
            }
        }
        names
    }

    fn reduce_timestep(
        &self,
        map: &RegionMap,
        source: &dyn GridSource,
        t: usize,
    ) -> Result<Vec<f64>, PipelineError> {
        let mode = self.reduce.mode;
        let mut frames: BTreeMap<&str, Array2<f64>> = BTreeMap::new();
        for quantity in self.needed_quantities() {
            frames.insert(quantity, source.frame(quantity, t)?);
        }

        let mut row = Vec::with_capacity(self.reduce.column_names().len());
        for quantity in &self.reduce.quantities {
            row.extend(map.reduce(frames[quantity.as_str()].view(), mode)?);
        }
        for derived in &self.reduce.derived {
            let u = &frames[derived.u.as_str()];
            let v = &frames[derived.v.as_str()];
            row.extend(map.reduce(magnitude(u.view(), v.view())?.view(), mode)?);
        }

        Ok(row)
    }
}

/// `count` datetimes every `step_hours` from the start of `year`.
pub fn datetime_index(year: i32, step_hours: u32, count: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    (0..count)
        .map(|i| start + Duration::hours(i as i64 * step_hours as i64))
        .collect()
}

// -- Tests -------------------------------------------------------------------
