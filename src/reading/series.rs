//! Series records: one value sequence per feature and station, aligned with a
//! shared timestamp axis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A timestamp as it appears in the source files. Either an epoch number or a
/// formatted string; it is carried through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(serde_json::Number),
    Text(String),
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::Number(value.into())
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

/// Feature name -> station name -> values. Serialised as a flat JSON object
/// with the timestamp axis under the reserved `"times"` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord<V> {
    pub times: Vec<Timestamp>,
    #[serde(flatten)]
    pub features: BTreeMap<String, BTreeMap<String, Vec<V>>>,
}

/// Aggregated month, values may be missing.
pub type MonthRecord = SeriesRecord<Option<f64>>;

/// Cleaned month or normalized year, no missing values.
pub type CleanRecord = SeriesRecord<f64>;

impl<V> Default for SeriesRecord<V> {
    fn default() -> Self {
        SeriesRecord {
            times: Vec::new(),
            features: BTreeMap::new(),
        }
    }
}

impl<V> SeriesRecord<V> {
    pub fn feature_names(&self) -> impl Iterator<Item = &String> {
        self.features.keys()
    }

    pub fn station_names(&self, feature: &str) -> Vec<String> {
        self.features
            .get(feature)
            .map(|stations| stations.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn series(&self, feature: &str, station: &str) -> Option<&[V]> {
        self.features
            .get(feature)
            .and_then(|stations| stations.get(station))
            .map(Vec::as_slice)
    }

    /// Iterates every series as `(feature, station, values)`.
    pub fn iter_series(&self) -> impl Iterator<Item = (&str, &str, &Vec<V>)> {
        self.features.iter().flat_map(|(feature, stations)| {
            stations
                .iter()
                .map(move |(station, values)| (feature.as_str(), station.as_str(), values))
        })
    }

    /// Length of the shortest series, `None` if the record holds no series.
    pub fn shortest_series(&self) -> Option<usize> {
        self.iter_series().map(|(_, _, values)| values.len()).min()
    }

    /// Cuts every series and the timestamp axis down to `len`.
    pub fn truncate(&mut self, len: usize) {
        self.times.truncate(len);
        for stations in self.features.values_mut() {
            for values in stations.values_mut() {
                values.truncate(len);
            }
        }
    }
}

// -- Tests -------------------------------------------------------------------
