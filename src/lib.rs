//! Aggregation, cleaning and normalization of FMI station observations, and
//! reduction of gridded ERA-Interim wind fields to per-region means.
//!
//! The stages run in order, each reading the files the previous one wrote:
//!
//! 1. [`pipeline::aggregate`] joins per-day records into months;
//! 2. [`pipeline::clean`] keeps the important features and fills gaps;
//! 3. [`pipeline::normalize`] joins the months into a normalized year;
//! 4. [`grid`] reduces wind fields to regional values, written by [`output`].

pub mod config;
pub mod error;
pub mod grid;
pub mod output;
pub mod pipeline;
pub mod reading;

pub use config::RunConfig;
pub use error::PipelineError;
