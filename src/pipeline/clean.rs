//! Selects the important features of a month, drops stations without a leading
//! value, evens out series lengths and fills the remaining gaps.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::{
    config::ImputationPolicy,
    error::PipelineError,
    reading::{CleanRecord, MonthRecord},
};

pub fn clean_month(
    mut record: MonthRecord,
    important: &[String],
    policy: ImputationPolicy,
) -> Result<CleanRecord, PipelineError> {
    let mut selected = BTreeMap::new();
    for feature in important {
        let stations =
            record
                .features
                .remove(feature)
                .ok_or_else(|| PipelineError::MissingFeature {
                    feature: feature.clone(),
                    context: "the month record".to_string(),
                })?;
        selected.insert(feature.clone(), stations);
    }
    let mut record = MonthRecord {
        times: record.times,
        features: selected,
    };

    // A station without a leading value in any important feature is dropped
    // from every feature.
    let unfit: BTreeSet<String> = record
        .iter_series()
        .filter(|(_, _, values)| values.first().copied().flatten().is_none())
        .map(|(_, station, _)| station.to_string())
        .collect();
    for station in &unfit {
        debug!("Dropping station '{station}': no leading value");
        for stations in record.features.values_mut() {
            stations.remove(station);
        }
    }

    // The timestamp axis comes from the reference feature and can be shorter
    // than the important series.
    match record.shortest_series() {
        Some(shortest) => {
            let len = shortest.min(record.times.len());
            if len < record.times.len() || len < shortest {
                warn!(
                    "Truncating month to {} samples ({} timestamps, shortest series {})",
                    len,
                    record.times.len(),
                    shortest
                );
            }
            record.truncate(len);
        }
        None => warn!("No station survived cleaning"),
    }

    let mut features = BTreeMap::new();
    for (feature, stations) in record.features {
        let mut cleaned = BTreeMap::new();
        for (station, values) in stations {
            let gaps = values.iter().filter(|v| v.is_none()).count();
            let filled = impute(&values, policy).ok_or_else(|| PipelineError::EmptySeries {
                feature: feature.clone(),
                station: station.clone(),
            })?;
            if gaps > 0 {
                debug!("Filled {gaps} gaps in '{feature}' / '{station}'");
            }
            cleaned.insert(station, filled);
        }
        features.insert(feature, cleaned);
    }

    Ok(CleanRecord {
        times: record.times,
        features,
    })
}

/// Fills every missing value of `values`. Returns `None` when the series holds
/// no value at all.
///
/// A gap after the last valid value repeats that value. A gap before the first
/// valid value (not produced by [`clean_month`]) takes the first valid value.
pub fn impute(values: &[Option<f64>], policy: ImputationPolicy) -> Option<Vec<f64>> {
    let first_valid = values.iter().flatten().next().copied()?;

    let filled = match policy {
        ImputationPolicy::SinglePass => impute_single_pass(values, first_valid),
        ImputationPolicy::Linear => impute_linear(values, first_valid),
    };

    Some(filled)
}

// Each gap is the midpoint of the value just before it (itself possibly filled
// a step earlier) and the next valid value, so runs of gaps converge towards
// the right-hand value rather than interpolating linearly.
fn impute_single_pass(values: &[Option<f64>], first_valid: f64) -> Vec<f64> {
    let next_valid = next_valid_values(values);
    let mut out: Vec<f64> = Vec::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        let filled = match (*value, out.last(), next_valid[i]) {
            (Some(v), _, _) => v,
            (None, Some(&prev), Some(next)) => round1((prev + next) / 2.0),
            (None, Some(&prev), None) => prev,
            (None, None, _) => first_valid,
        };
        out.push(filled);
    }

    out
}

fn impute_linear(values: &[Option<f64>], first_valid: f64) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(values.len());
    let mut last: Option<(usize, f64)> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else { continue };

        for gap in out.len()..i {
            let filled = match last {
                Some((from_idx, from)) => {
                    let step = (gap - from_idx) as f64;
                    let span = (i - from_idx) as f64;
                    round1(from + (v - from) * step / span)
                }
                None => first_valid,
            };
            out.push(filled);
        }

        out.push(v);
        last = Some((i, v));
    }

    if let Some((_, tail)) = last {
        out.resize(values.len(), tail);
    }

    out
}

// For every index, the first valid value strictly after it.
fn next_valid_values(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut next = vec![None; values.len()];
    let mut upcoming = None;
    for i in (0..values.len()).rev() {
        next[i] = upcoming;
        if values[i].is_some() {
            upcoming = values[i];
        }
    }
    next
}

// One decimal, ties to even on the exact binary value.
fn round1(x: f64) -> f64 {
    format!("{x:.1}").parse().unwrap_or(x)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::reading::Timestamp;

    use super::*;

    fn month_fixture() -> MonthRecord {
        let mut record = MonthRecord::default();
        record.times = (0..6_i64).map(|h| Timestamp::from(h * 6)).collect();

        let ws = record.features.entry("ws_10min".to_string()).or_default();
        ws.insert(
            "Espoo Nuuksio".to_string(),
            vec![Some(2.0), None, Some(3.0), Some(3.5), None, Some(4.1)],
        );
        ws.insert(
            "Hanko Russarö".to_string(),
            vec![Some(5.0), Some(5.2), None, None, Some(6.0)],
        );
        ws.insert(
            "Inari Seitalaassa".to_string(),
            vec![None, Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        );

        let t2m = record.features.entry("t2m".to_string()).or_default();
        t2m.insert("Espoo Nuuksio".to_string(), vec![None; 6]);

        record
    }

    #[test]
    fn should_project_drop_truncate_and_fill() {
        let important = vec!["ws_10min".to_string()];

        let clean = clean_month(month_fixture(), &important, ImputationPolicy::SinglePass).unwrap();

        assert_eq!(clean.feature_names().collect::<Vec<_>>(), vec!["ws_10min"]);
        assert_eq!(
            clean.station_names("ws_10min"),
            vec!["Espoo Nuuksio", "Hanko Russarö"]
        );
        assert_eq!(clean.times.len(), 5);
        assert_eq!(
            clean.series("ws_10min", "Espoo Nuuksio").unwrap(),
            &[2.0, 2.5, 3.0, 3.5, 3.5]
        );
        assert_eq!(
            clean.series("ws_10min", "Hanko Russarö").unwrap(),
            &[5.0, 5.2, 5.6, 5.8, 6.0]
        );
    }

    #[test]
    fn should_drop_station_unfit_in_any_important_feature() {
        let mut record = month_fixture();
        record
            .features
            .get_mut("t2m")
            .unwrap()
            .insert("Hanko Russarö".to_string(), vec![Some(1.0); 6]);
        let important = vec!["ws_10min".to_string(), "t2m".to_string()];

        let clean = clean_month(record, &important, ImputationPolicy::SinglePass).unwrap();

        // Espoo lacks a leading t2m value, Inari a leading ws_10min value.
        assert_eq!(clean.station_names("ws_10min"), vec!["Hanko Russarö"]);
        assert_eq!(clean.station_names("t2m"), vec!["Hanko Russarö"]);
        assert!(clean.iter_series().all(|(_, _, v)| v.len() == 5));
    }

    #[test]
    fn should_fail_on_unknown_important_feature() {
        let important = vec!["rh".to_string()];

        let err = clean_month(month_fixture(), &important, ImputationPolicy::SinglePass)
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingFeature { feature, .. } if feature == "rh"));
    }

    #[test]
    fn should_fill_gap_with_rounded_midpoint() {
        let values = [Some(1.0), None, Some(1.25)];

        let filled = impute(&values, ImputationPolicy::SinglePass).unwrap();

        assert_eq!(filled[1], round1((1.0 + 1.25) / 2.0));
        assert_eq!(filled[1], 1.1);
    }

    #[test]
    fn should_round_exact_ties_to_even() {
        let filled = impute(&[Some(2.0), None, Some(2.5)], ImputationPolicy::SinglePass).unwrap();
        assert_eq!(filled[1], 2.2);

        let filled = impute(&[Some(3.0), None, Some(3.5)], ImputationPolicy::SinglePass).unwrap();
        assert_eq!(filled[1], 3.2);
    }

    #[test]
    fn should_truncate_series_to_timestamp_axis() {
        let mut record = month_fixture();
        record.times.truncate(3);
        let important = vec!["ws_10min".to_string()];

        let clean = clean_month(record, &important, ImputationPolicy::SinglePass).unwrap();

        assert_eq!(clean.times.len(), 3);
        assert!(clean.iter_series().all(|(_, _, v)| v.len() == 3));
        assert_eq!(
            clean.series("ws_10min", "Espoo Nuuksio").unwrap(),
            &[2.0, 2.5, 3.0]
        );
    }

    #[test]
    fn should_chain_midpoints_across_adjacent_gaps() {
        let values = [Some(0.0), None, None, Some(8.0)];

        let filled = impute(&values, ImputationPolicy::SinglePass).unwrap();

        assert_eq!(filled, vec![0.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn should_forward_fill_tail() {
        let values = [Some(3.3), Some(4.4), None, None];

        for policy in [ImputationPolicy::SinglePass, ImputationPolicy::Linear] {
            let filled = impute(&values, policy).unwrap();
            assert_eq!(filled, vec![3.3, 4.4, 4.4, 4.4]);
        }
    }

    #[test]
    fn should_interpolate_linearly_across_gap_run() {
        let values = [Some(0.0), None, None, None, Some(8.0), None, Some(9.0)];

        let filled = impute(&values, ImputationPolicy::Linear).unwrap();

        assert_eq!(filled, vec![0.0, 2.0, 4.0, 6.0, 8.0, 8.5, 9.0]);
    }

    #[test]
    fn should_back_fill_leading_gap() {
        let values = [None, None, Some(2.0), None];

        assert_eq!(
            impute(&values, ImputationPolicy::SinglePass).unwrap(),
            vec![2.0, 2.0, 2.0, 2.0]
        );
        assert_eq!(
            impute(&values, ImputationPolicy::Linear).unwrap(),
            vec![2.0, 2.0, 2.0, 2.0]
        );
    }

    #[test]
    fn should_leave_no_missing_values() {
        let values: Vec<Option<f64>> = (0..50)
            .map(|i| if i % 3 == 1 || i > 45 { None } else { Some(i as f64) })
            .collect();

        for policy in [ImputationPolicy::SinglePass, ImputationPolicy::Linear] {
            let filled = impute(&values, policy).unwrap();
            assert_eq!(filled.len(), values.len());
            assert!(filled.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn should_give_none_for_all_missing_series() {
        assert_eq!(impute(&[None, None], ImputationPolicy::SinglePass), None);
        assert_eq!(impute(&[], ImputationPolicy::Linear), None);
    }
}
