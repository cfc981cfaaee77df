//! Handles serialising the region table to disk as _parquet_ or _feather_.

pub mod table;

pub use table::save_table;
