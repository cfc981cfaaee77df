use std::path::PathBuf;

use anyhow::{Context, Result};
use fmi_regions::{
    pipeline::{aggregate_month, station_roster},
    reading::{read_json, write_json, DayRecord},
    RunConfig,
};
use log::info;

use crate::cli::create_progress_bar;

/// Joins the day files of every month into `month{m}.json`.
pub fn aggregate(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let paths = &config.paths;
    let reference: DayRecord = read_json(&paths.day_file(0))?;
    let roster = station_roster(&reference, &config.aggregate)?;
    info!("Aggregating {} stations", roster.len());

    let months = &config.calendar.month_lengths;
    let pb = create_progress_bar(months.len() as u64, "Aggregating months...".to_string());
    let mut written = Vec::with_capacity(months.len());

    for (index, &length) in months.iter().enumerate() {
        let month = index + 1;
        let cur_day = config.calendar.first_day_of(month);
        let days = (cur_day..cur_day + length)
            .map(|day| read_json::<DayRecord>(&paths.day_file(day)))
            .collect::<Result<Vec<_>, _>>()?;

        let record = aggregate_month(&days, cur_day, &roster, &config.aggregate)
            .with_context(|| format!("aggregating month {month}"))?;

        let out = paths.month_file(month);
        write_json(&out, &record)?;
        written.push(out);
        pb.inc(1);
    }
    pb.finish_with_message("Months aggregated");

    Ok(written)
}

// -- Tests -------------------------------------------------------------------
