pub mod aggregate;
pub mod clean;
pub mod normalize;
pub mod reduce;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fmi_regions::RunConfig;
use log::info;

pub use aggregate::aggregate;
pub use clean::clean;
pub use normalize::normalize;
pub use reduce::reduce;

use super::Preset;

/// Runs aggregation, cleaning, normalization and reduction in order.
pub fn run_all(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let mut written = aggregate(config)?;
    written.extend(clean(config)?);
    written.push(normalize(config)?);
    written.push(reduce(config)?);

    info!("All stages finished, {} files written", written.len());

    Ok(written)
}

pub fn init_config(path: &Path, preset: Preset, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }

    let config = match preset {
        Preset::Default => RunConfig::default(),
        Preset::Fmi => RunConfig::fmi_preset(),
    };
    std::fs::write(path, config.to_toml_string()?)
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(path.to_path_buf())
}

/// `{stem}_{year}-{first month}to{last month}.{ext}` in the table directory.
pub fn make_table_file_name(config: &RunConfig) -> PathBuf {
    let reduce = &config.reduce;
    let first = reduce.months.iter().min().copied().unwrap_or(1);
    let last = reduce.months.iter().max().copied().unwrap_or(12);
    let file_name = format!(
        "{}_{}-{:02}to{:02}.{}",
        reduce.table_stem,
        config.calendar.year,
        first,
        last,
        reduce.table_format.extension()
    );

    config.paths.table_dir().join(file_name)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use fmi_regions::{grid::Region, reading::write_json, RunConfig};
    use serde_json::json;

    /// Twelve one-day months, two kept samples per day, stations `A`, `B` and
    /// the excluded `X`.
    pub fn write_day_fixtures(root: &Path) -> RunConfig {
        let mut config = RunConfig::default();
        config.paths.data_root = root.to_path_buf();
        config.calendar.month_lengths = vec![1; 12];
        config.calendar.timestep_hours = 12;
        config.aggregate.excluded_stations = vec!["X".to_string()];
        config.clean.important_features = vec!["ws_10min".to_string()];

        for day in 0..12_usize {
            let base = day as f64;
            let t = day * 2;
            let record = json!({
                "t2m": {
                    "A": [[t, base], [t + 1, base + 0.5], [t + 2, 9.0]],
                    "B": [[t, 1.0], [t + 1, 2.0], [t + 2, 9.0]],
                    "X": [[t, 0.0], [t + 1, 0.0], [t + 2, 0.0]]
                },
                "ws_10min": {
                    "A": [[t, base + 1.0], [t + 1, null], [t + 2, 9.0]],
                    "B": [[t, 3.0], [t + 1, base + 4.0], [t + 2, 9.0]],
                    "X": [[t, 0.0], [t + 1, null], [t + 2, 0.0]]
                }
            });
            write_json(&config.paths.day_file(day), &record).unwrap();
        }

        config
    }

    /// A 2x2 grid for months 1 and 2, split into a western and an eastern
    /// region. `u10` averages to 2 (west) and 4 (east) in absolute value.
    pub fn write_grid_fixtures(config: &mut RunConfig) {
        config.reduce.months = vec![1, 2];
        config.reduce.regions = vec![
            Region::named("west", [19.0, 21.0, 62.0, 59.0]),
            Region::named("east", [21.0, 23.0, 62.0, 59.0]),
        ];

        let u10 = [[1.0, -3.0], [3.0, 5.0]];
        let v10 = [[0.0, 0.0], [0.0, 0.0]];
        for month in [1, 2] {
            let grid = json!({
                "latitude": [61.0, 60.0],
                "longitude": [20.0, 22.0],
                "fields": { "u10": [u10, u10], "v10": [v10, v10] }
            });
            write_json(&config.paths.grid_file(month), &grid).unwrap();
        }
    }
}
