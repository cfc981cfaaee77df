//! Save the region table to a columnar file.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, RecordBatch, TimestampMillisecondArray},
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    ipc::writer::FileWriter,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::{config::TableFormat, grid::RegionTable};

pub fn save_table(table: &RegionTable, file_path: &Path, format: TableFormat) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(file_path)
        .with_context(|| format!("creating {}", file_path.display()))?;

    let schema = table_schema(table);
    let chunk_size = 100000;

    match format {
        TableFormat::Parquet => {
            let props = WriterProperties::builder()
                .set_compression(parquet::basic::Compression::SNAPPY)
                .build();
            let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
            for start in (0..table.rows.len()).step_by(chunk_size) {
                writer.write(&make_batch(table, &schema, start, chunk_size)?)?;
            }
            writer.close()?;
        }
        TableFormat::Feather => {
            let mut writer = FileWriter::try_new(file, &schema)?;
            for start in (0..table.rows.len()).step_by(chunk_size) {
                writer.write(&make_batch(table, &schema, start, chunk_size)?)?;
            }
            writer.finish()?;
        }
    }

    Ok(())
}

fn table_schema(table: &RegionTable) -> SchemaRef {
    let mut fields: Vec<Field> = table
        .columns
        .iter()
        .map(|name| Field::new(name, DataType::Float64, false))
        .collect();
    fields.push(Field::new(
        "datetime",
        DataType::Timestamp(TimeUnit::Millisecond, None),
        false,
    ));

    Arc::new(Schema::new(fields))
}

fn make_batch(
    table: &RegionTable,
    schema: &SchemaRef,
    start: usize,
    chunk_size: usize,
) -> Result<RecordBatch> {
    let end = (start + chunk_size).min(table.rows.len());
    let rows = &table.rows[start..end];

    let mut columns: Vec<ArrayRef> = (0..table.columns.len())
        .map(|c| Arc::new(Float64Array::from_iter_values(rows.iter().map(|row| row[c]))) as ArrayRef)
        .collect();

    let millis = table.datetimes[start..end]
        .iter()
        .map(|dt| dt.and_utc().timestamp_millis());
    columns.push(Arc::new(TimestampMillisecondArray::from_iter_values(millis)));

    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    Ok(batch)
}

// -- Tests -------------------------------------------------------------------
