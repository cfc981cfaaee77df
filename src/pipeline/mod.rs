//! The station-observation stages: day-to-month aggregation, cleaning and
//! normalization. Each stage is a pure transform over in-memory records; file
//! handling lives in the command layer.

pub mod aggregate;
pub mod clean;
pub mod normalize;

pub use aggregate::{aggregate_month, station_roster, timestamp_station};
pub use clean::{clean_month, impute};
pub use normalize::{concat_months, normalize};
