use std::path::PathBuf;

use anyhow::Result;
use fmi_regions::{
    config::GridFormat,
    grid::{GridSource, JsonGridSource, RegionTableBuilder},
    output::save_table,
    RunConfig,
};
use log::{debug, info};

use super::make_table_file_name;
use crate::cli::create_progress_bar;

/// Reduces the grid of every selected month and saves the region table.
pub fn reduce(config: &RunConfig) -> Result<PathBuf> {
    let reduce = &config.reduce;
    let mut builder = RegionTableBuilder::new(&config.calendar, reduce);
    let pb = create_progress_bar(reduce.months.len() as u64, "Reducing grids...".to_string());

    for &month in &reduce.months {
        let path = config.paths.grid_file(month);
        debug!("Opening {}", path.display());
        let source = open_source(&path, reduce.grid_format)?;
        builder.add_month(month, source.as_ref())?;
        pb.inc(1);
    }
    pb.finish_with_message("Grids reduced");

    if let Some(map) = builder.region_map() {
        info!("Cells per region: {:?}", map.cell_counts());
    }
    let table = builder.finish();

    let file_name = make_table_file_name(config);
    save_table(&table, &file_name, reduce.table_format)?;

    Ok(file_name)
}

fn open_source(path: &std::path::Path, format: GridFormat) -> Result<Box<dyn GridSource>> {
    match format {
        GridFormat::Json => Ok(Box::new(JsonGridSource::open(path)?)),
        #[cfg(feature = "netcdf")]
        GridFormat::Netcdf => Ok(Box::new(fmi_regions::grid::NetcdfGridSource::open(path)?)),
        #[cfg(not(feature = "netcdf"))]
        GridFormat::Netcdf => {
            anyhow::bail!("netCDF grids are not supported by this build, rebuild with --features netcdf")
        }
    }
}

// -- Tests -------------------------------------------------------------------
