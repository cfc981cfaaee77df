use std::path::PathBuf;

use anyhow::{Context, Result};
use fmi_regions::{
    pipeline::clean_month,
    reading::{read_json, write_json, MonthRecord},
    RunConfig,
};

use crate::cli::create_progress_bar;

/// Cleans every `month{m}.json` into the unnormalized directory.
pub fn clean(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let paths = &config.paths;
    let months = config.calendar.month_lengths.len();
    let pb = create_progress_bar(months as u64, "Cleaning months...".to_string());
    let mut written = Vec::with_capacity(months);

    for month in 1..=months {
        let record: MonthRecord = read_json(&paths.month_file(month))?;
        let cleaned = clean_month(
            record,
            &config.clean.important_features,
            config.clean.imputation,
        )
        .with_context(|| format!("cleaning month {month}"))?;

        let out = paths.cleaned_file(month);
        write_json(&out, &cleaned)?;
        written.push(out);
        pb.inc(1);
    }
    pb.finish_with_message("Months cleaned");

    Ok(written)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use fmi_regions::reading::CleanRecord;
    use tempfile::TempDir;

    use super::*;
    use crate::cli::command::{aggregate, fixtures::write_day_fixtures};

    #[test]
    fn should_clean_aggregated_months() {
        let dir = TempDir::new().unwrap();
        let config = write_day_fixtures(dir.path());
        aggregate(&config).unwrap();

        let written = clean(&config).unwrap();

        assert_eq!(written.len(), 12);
        let march: CleanRecord = read_json(&config.paths.cleaned_file(3)).unwrap();
        assert_eq!(march.feature_names().collect::<Vec<_>>(), vec!["ws_10min"]);
        assert_eq!(march.series("ws_10min", "A"), Some(&[3.0, 3.0][..]));
        assert_eq!(march.series("ws_10min", "B"), Some(&[3.0, 6.0][..]));
    }

    #[test]
    fn should_report_missing_important_feature() {
        let dir = TempDir::new().unwrap();
        let mut config = write_day_fixtures(dir.path());
        aggregate(&config).unwrap();
        config.clean.important_features = vec!["wd_10min".to_string()];

        let err = clean(&config).unwrap_err();
        assert!(format!("{err:#}").contains("wd_10min"));
    }
}
