//! Joins cleaned months into a year and normalizes every series.

use log::warn;

use crate::{config::Scaling, error::PipelineError, reading::CleanRecord};

/// Concatenates `months` in order. The feature and station set of the first
/// month is kept; every later month must provide all of its series.
pub fn concat_months(months: Vec<CleanRecord>) -> Result<CleanRecord, PipelineError> {
    let mut months = months.into_iter().enumerate();
    let Some((_, mut year)) = months.next() else {
        return Err(PipelineError::Config("no months to concatenate".to_string()));
    };

    for (index, mut month) in months {
        let context = format!("month {}", index + 1);
        year.times.append(&mut month.times);

        for (feature, stations) in year.features.iter_mut() {
            let mut incoming =
                month
                    .features
                    .remove(feature)
                    .ok_or_else(|| PipelineError::MissingFeature {
                        feature: feature.clone(),
                        context: context.clone(),
                    })?;

            for (station, values) in stations.iter_mut() {
                let mut more =
                    incoming
                        .remove(station)
                        .ok_or_else(|| PipelineError::MissingStation {
                            feature: feature.clone(),
                            station: station.clone(),
                            context: context.clone(),
                        })?;
                values.append(&mut more);
            }

            if !incoming.is_empty() {
                warn!(
                    "Ignoring {} '{}' stations of {} absent from the first month",
                    incoming.len(),
                    feature,
                    context
                );
            }
        }
    }

    Ok(year)
}

/// Mean and population variance of `values`.
pub fn mean_and_variance(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance))
}

/// Centres every series on its mean and divides it by its variance (or
/// standard deviation). A constant series is an error.
pub fn normalize(mut record: CleanRecord, scaling: Scaling) -> Result<CleanRecord, PipelineError> {
    for (feature, stations) in record.features.iter_mut() {
        for (station, values) in stations.iter_mut() {
            let (mean, variance) =
                mean_and_variance(values).ok_or_else(|| PipelineError::EmptySeries {
                    feature: feature.clone(),
                    station: station.clone(),
                })?;

            // Rounding in the mean leaves a tiny variance on constant series.
            let constant = values.iter().all(|x| *x == values[0]);
            if constant || variance == 0.0 || !variance.is_finite() {
                return Err(PipelineError::ZeroVariance {
                    feature: feature.clone(),
                    station: station.clone(),
                });
            }

            let scale = match scaling {
                Scaling::Variance => variance,
                Scaling::StdDev => variance.sqrt(),
            };

            for x in values.iter_mut() {
                *x = (*x - mean) / scale;
            }
        }
    }

    Ok(record)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::reading::Timestamp;

    use super::*;

    fn month(offset: i64, values: &[(&str, Vec<f64>)]) -> CleanRecord {
        let mut record = CleanRecord::default();
        let len = values.first().map(|(_, v)| v.len()).unwrap_or(0) as i64;
        record.times = (0..len).map(|i| Timestamp::from(offset + i)).collect();
        let stations = record.features.entry("ws_10min".to_string()).or_default();
        for (station, v) in values {
            stations.insert(station.to_string(), v.clone());
        }
        record
    }

    #[test]
    fn should_concatenate_months_in_order() {
        let months = vec![
            month(0, &[("a", vec![1.0, 2.0]), ("b", vec![5.0, 6.0])]),
            month(2, &[("a", vec![3.0]), ("b", vec![7.0])]),
            month(3, &[("a", vec![4.0, 4.5]), ("b", vec![8.0, 8.5]), ("c", vec![0.0, 0.0])]),
        ];

        let year = concat_months(months).unwrap();

        assert_eq!(year.series("ws_10min", "a").unwrap(), &[1.0, 2.0, 3.0, 4.0, 4.5]);
        assert_eq!(year.series("ws_10min", "b").unwrap(), &[5.0, 6.0, 7.0, 8.0, 8.5]);
        assert!(year.series("ws_10min", "c").is_none());
        assert_eq!(
            year.times,
            (0..5_i64).map(Timestamp::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn should_fail_when_station_vanishes() {
        let months = vec![
            month(0, &[("a", vec![1.0]), ("b", vec![2.0])]),
            month(1, &[("a", vec![1.0])]),
        ];

        let err = concat_months(months).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::MissingStation { station, context, .. }
                if station == "b" && context == "month 2"
        ));
    }

    #[test]
    fn should_divide_by_variance() {
        let record = month(0, &[("a", vec![1.0, 3.0])]);

        let normalized = normalize(record, Scaling::Variance).unwrap();

        // mean 2, variance 1
        assert_eq!(normalized.series("ws_10min", "a").unwrap(), &[-1.0, 1.0]);

        let record = month(0, &[("a", vec![0.0, 4.0])]);
        let normalized = normalize(record, Scaling::Variance).unwrap();
        // mean 2, variance 4
        assert_eq!(normalized.series("ws_10min", "a").unwrap(), &[-0.5, 0.5]);
    }

    #[test]
    fn should_give_zero_mean_unit_variance_with_std_scaling() {
        let values = vec![2.3, 5.1, 4.4, 9.8, 0.2, 3.3, 7.7];
        let record = month(0, &[("a", values)]);

        let normalized = normalize(record, Scaling::StdDev).unwrap();

        let (mean, variance) =
            mean_and_variance(normalized.series("ws_10min", "a").unwrap()).unwrap();
        assert!(mean.abs() < 1e-12);
        assert!((variance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn should_center_with_variance_scaling() {
        let values = vec![2.3, 5.1, 4.4, 9.8, 0.2, 3.3, 7.7];
        let (_, original_variance) = mean_and_variance(&values).unwrap();
        let record = month(0, &[("a", values)]);

        let normalized = normalize(record, Scaling::Variance).unwrap();

        let (mean, variance) =
            mean_and_variance(normalized.series("ws_10min", "a").unwrap()).unwrap();
        assert!(mean.abs() < 1e-12);
        assert!((variance - 1.0 / original_variance).abs() < 1e-12);
    }

    #[test]
    fn should_report_constant_series_with_inexact_mean() {
        let record = month(0, &[("flat", vec![0.1; 10])]);

        let err = normalize(record, Scaling::Variance).unwrap_err();

        assert!(matches!(err, PipelineError::ZeroVariance { station, .. } if station == "flat"));
    }

    #[test]
    fn should_report_constant_series() {
        let record = month(0, &[("a", vec![1.0, 2.0]), ("flat", vec![3.0, 3.0])]);

        let err = normalize(record, Scaling::Variance).unwrap_err();

        assert!(matches!(err, PipelineError::ZeroVariance { station, .. } if station == "flat"));
    }

    #[test]
    fn should_report_empty_series() {
        let record = month(0, &[("a", vec![])]);

        let err = normalize(record, Scaling::StdDev).unwrap_err();

        assert!(matches!(err, PipelineError::EmptySeries { .. }));
    }
}
