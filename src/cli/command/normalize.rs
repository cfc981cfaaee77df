use std::path::PathBuf;

use anyhow::Result;
use fmi_regions::{
    pipeline::{concat_months, normalize as normalize_record},
    reading::{read_json, write_json, CleanRecord},
    RunConfig,
};
use log::info;

use crate::cli::create_spinner;

/// Joins the cleaned months and writes the normalized year.
pub fn normalize(config: &RunConfig) -> Result<PathBuf> {
    let paths = &config.paths;
    let pb = create_spinner("Normalizing year...".to_string());

    let months = (1..=config.calendar.month_lengths.len())
        .map(|month| read_json::<CleanRecord>(&paths.cleaned_file(month)))
        .collect::<Result<Vec<_>, _>>()?;

    let year = concat_months(months)?;
    info!("Normalizing {} timesteps", year.times.len());
    let year = normalize_record(year, config.normalize.scaling)?;

    let out = paths.year_file();
    write_json(&out, &year)?;
    pb.finish_with_message("Year normalized");

    Ok(out)
}

// -- Tests -------------------------------------------------------------------
