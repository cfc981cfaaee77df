//! Joins per-day observation records into one record per month.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    config::{AggregateConfig, DuplicatePolicy},
    error::PipelineError,
    reading::{DayRecord, MonthRecord, Sample},
};

/// Stations of the reference feature on `reference`, minus the excluded ones.
pub fn station_roster(
    reference: &DayRecord,
    config: &AggregateConfig,
) -> Result<Vec<String>, PipelineError> {
    let stations = reference
        .station_names(&config.reference_feature)
        .ok_or_else(|| PipelineError::MissingFeature {
            feature: config.reference_feature.clone(),
            context: "the reference day".to_string(),
        })?;

    let total = stations.len();
    let roster: Vec<String> = stations
        .into_iter()
        .filter(|s| !config.excluded_stations.contains(s))
        .collect();

    debug!(
        "Station roster: {} of {} stations kept after exclusion",
        roster.len(),
        total
    );

    Ok(roster)
}

/// The station the shared timestamp axis is read from.
pub fn timestamp_station(
    roster: &[String],
    config: &AggregateConfig,
) -> Result<String, PipelineError> {
    match &config.timestamp_station {
        Some(station) if config.excluded_stations.contains(station) => {
            Err(PipelineError::CanonicalStationExcluded(station.clone()))
        }
        Some(station) if !roster.contains(station) => Err(PipelineError::MissingStation {
            feature: config.reference_feature.clone(),
            station: station.clone(),
            context: "the station roster".to_string(),
        }),
        Some(station) => Ok(station.clone()),
        None => roster.first().cloned().ok_or_else(|| {
            PipelineError::Config("no station survives the exclusion list".to_string())
        }),
    }
}

/// Concatenates the days of one month for every feature and rostered station.
///
/// `first_day` is the index of `days[0]` in the whole dataset and only used in
/// error messages.
pub fn aggregate_month(
    days: &[DayRecord],
    first_day: usize,
    roster: &[String],
    config: &AggregateConfig,
) -> Result<MonthRecord, PipelineError> {
    let Some(first) = days.first() else {
        return Ok(MonthRecord::default());
    };
    let features = first.feature_names();
    let time_station = timestamp_station(roster, config)?;

    let mut joined: BTreeMap<String, BTreeMap<String, Vec<Sample>>> = BTreeMap::new();

    for (offset, day) in days.iter().enumerate() {
        let is_final_day = offset + 1 == days.len();
        let context = format!("day {}", first_day + offset);

        for feature in &features {
            let per_station = joined.entry(feature.clone()).or_default();

            for station in roster {
                let samples =
                    day.samples(feature, station)
                        .ok_or_else(|| PipelineError::MissingStation {
                            feature: feature.clone(),
                            station: station.clone(),
                            context: context.clone(),
                        })?;

                per_station
                    .entry(station.clone())
                    .or_default()
                    .extend_from_slice(kept_samples(samples, config.duplicates, is_final_day));
            }
        }
    }

    let times = joined
        .get(&config.reference_feature)
        .and_then(|stations| stations.get(&time_station))
        .map(|samples| samples.iter().map(|(t, _)| t.clone()).collect())
        .ok_or_else(|| PipelineError::MissingFeature {
            feature: config.reference_feature.clone(),
            context: format!("day {first_day}"),
        })?;

    let features = joined
        .into_iter()
        .map(|(feature, stations)| {
            let stations = stations
                .into_iter()
                .map(|(station, samples)| {
                    (station, samples.into_iter().map(|(_, v)| v).collect())
                })
                .collect();
            (feature, stations)
        })
        .collect();

    Ok(MonthRecord { times, features })
}

fn kept_samples(samples: &[Sample], policy: DuplicatePolicy, is_final_day: bool) -> &[Sample] {
    let drop_last = match policy {
        DuplicatePolicy::DropLastEveryDay => true,
        DuplicatePolicy::KeepFinalDay => !is_final_day,
        DuplicatePolicy::KeepAll => false,
    };

    if drop_last {
        &samples[..samples.len().saturating_sub(1)]
    } else {
        samples
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::reading::Timestamp;

    use super::*;

    const STATIONS: [&str; 3] = ["Espoo Nuuksio", "Hanko Russarö", "Oulu lentoasema"];

    // Day `d` has samples at hours 24d, 24d+6, ..., 24d+24 for every station.
    fn day_fixture(d: i64) -> DayRecord {
        let mut day = DayRecord::default();
        for feature in ["t2m", "ws_10min"] {
            let stations = day.features.entry(feature.to_string()).or_default();
            for (i, station) in STATIONS.iter().enumerate() {
                let samples = (0..5)
                    .map(|k| {
                        let hour = 24 * d + 6 * k;
                        (Timestamp::from(hour), Some((hour + i as i64) as f64))
                    })
                    .collect();
                stations.insert(station.to_string(), samples);
            }
        }
        day
    }

    fn config() -> AggregateConfig {
        AggregateConfig {
            excluded_stations: vec!["Oulu lentoasema".to_string()],
            reference_feature: "t2m".to_string(),
            timestamp_station: None,
            duplicates: DuplicatePolicy::DropLastEveryDay,
        }
    }

    #[test]
    fn should_drop_excluded_stations_from_roster() {
        let roster = station_roster(&day_fixture(0), &config()).unwrap();
        assert_eq!(roster, vec!["Espoo Nuuksio", "Hanko Russarö"]);
    }

    #[test]
    fn should_drop_boundary_duplicates() {
        let days = vec![day_fixture(0), day_fixture(1)];
        let config = config();
        let roster = station_roster(&days[0], &config).unwrap();

        let month = aggregate_month(&days, 0, &roster, &config).unwrap();

        let series = month.series("t2m", "Espoo Nuuksio").unwrap();
        assert_eq!(series.len(), 2 * 4);
        assert_eq!(series[..4], [Some(0.0), Some(6.0), Some(12.0), Some(18.0)]);
        assert_eq!(series[4], Some(24.0));
        assert_eq!(month.times.len(), 8);
        assert_eq!(month.times[7], Timestamp::from(42_i64));
        assert!(month.series("t2m", "Oulu lentoasema").is_none());
        assert_eq!(month.station_names("ws_10min").len(), 2);
    }

    #[test]
    fn should_keep_final_sample_when_configured() {
        let days = vec![day_fixture(0), day_fixture(1), day_fixture(2)];
        let mut config = config();
        config.duplicates = DuplicatePolicy::KeepFinalDay;
        let roster = station_roster(&days[0], &config).unwrap();

        let month = aggregate_month(&days, 0, &roster, &config).unwrap();

        assert_eq!(month.times.len(), 4 + 4 + 5);
        assert_eq!(month.times.last(), Some(&Timestamp::from(72_i64)));

        config.duplicates = DuplicatePolicy::KeepAll;
        let month = aggregate_month(&days, 0, &roster, &config).unwrap();
        assert_eq!(month.times.len(), 15);
    }

    #[test]
    fn should_read_times_from_configured_station() {
        let days = vec![day_fixture(0)];
        let mut config = config();
        config.timestamp_station = Some("Hanko Russarö".to_string());
        let roster = station_roster(&days[0], &config).unwrap();

        assert_eq!(timestamp_station(&roster, &config).unwrap(), "Hanko Russarö");
        let month = aggregate_month(&days, 0, &roster, &config).unwrap();
        assert_eq!(month.times.len(), 4);
    }

    #[test]
    fn should_fail_when_timestamp_station_is_excluded() {
        let mut config = config();
        config.timestamp_station = Some("Oulu lentoasema".to_string());
        let roster = station_roster(&day_fixture(0), &config).unwrap();

        let err = timestamp_station(&roster, &config).unwrap_err();

        assert!(matches!(err, PipelineError::CanonicalStationExcluded(s) if s == "Oulu lentoasema"));
    }

    #[test]
    fn should_fail_when_station_missing_from_a_day() {
        let mut second = day_fixture(1);
        second
            .features
            .get_mut("ws_10min")
            .unwrap()
            .remove("Hanko Russarö");
        let days = vec![day_fixture(0), second];
        let config = config();
        let roster = station_roster(&days[0], &config).unwrap();

        let err = aggregate_month(&days, 31, &roster, &config).unwrap_err();

        match err {
            PipelineError::MissingStation { station, context, .. } => {
                assert_eq!(station, "Hanko Russarö");
                assert_eq!(context, "day 32");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
