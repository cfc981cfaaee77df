//! Raw per-day observation files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Timestamp;

/// One `[timestamp, value]` pair.
pub type Sample = (Timestamp, Option<f64>);

/// Feature name -> station name -> samples covering one calendar day,
/// usually including the first sample of the next day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayRecord {
    pub features: BTreeMap<String, BTreeMap<String, Vec<Sample>>>,
}

impl DayRecord {
    pub fn feature_names(&self) -> Vec<String> {
        self.features.keys().cloned().collect()
    }

    pub fn station_names(&self, feature: &str) -> Option<Vec<String>> {
        self.features
            .get(feature)
            .map(|stations| stations.keys().cloned().collect())
    }

    pub fn samples(&self, feature: &str, station: &str) -> Option<&[Sample]> {
        self.features
            .get(feature)
            .and_then(|stations| stations.get(station))
            .map(Vec::as_slice)
    }
}

// -- Tests -------------------------------------------------------------------
