use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Datasets, EnhancerMetadataRow, HofMembership, PeakRecord, Table};
use crate::config::DataPaths;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the three datasets of a session.
pub fn load_datasets(paths: &DataPaths) -> Result<Datasets> {
    let metadata_table = load_table(&paths.metadata)?;
    let metadata = EnhancerMetadataRow::from_table(&metadata_table);
    log::info!("Loaded {} metadata rows from {}", metadata.len(), paths.metadata.display());

    let peak_table = load_table(&paths.peaks)?;
    let peaks = PeakRecord::from_table(&peak_table)
        .with_context(|| format!("reading {}", paths.peaks.display()))?;
    log::info!("Loaded {} peak records from {}", peaks.len(), paths.peaks.display());

    let hof = HofMembership::from_table(&load_table(&paths.hof)?);
    log::info!("Loaded {} HOF enhancers from {}", hof.len(), paths.hof.display());

    Ok(Datasets {
        metadata,
        peaks,
        hof,
    })
}

/// Load one table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.feather` / `.arrow` / `.ipc` – Arrow IPC file (what pandas writes with `to_feather`)
/// * `.parquet` / `.pq`
/// * `.csv` – header row, cell types guessed per cell
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "feather" | "arrow" | "ipc" => load_feather(path),
        "parquet" | "pq" => load_parquet(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    };
    table.with_context(|| format!("loading {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(Table { columns, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Arrow-backed loaders
// ---------------------------------------------------------------------------

fn load_feather(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening feather file")?;
    let reader = FileReader::try_new(file, None).context("reading feather schema")?;
    let mut table = Table {
        columns: column_names(&reader.schema()),
        rows: Vec::new(),
    };
    for batch in reader {
        let batch = batch.context("reading feather record batch")?;
        append_batch(&mut table, &batch)?;
    }
    Ok(table)
}

fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let mut table = Table {
        columns: column_names(builder.schema()),
        rows: Vec::new(),
    };
    let reader = builder.build().context("building parquet reader")?;
    for batch in reader {
        let batch = batch.context("reading parquet record batch")?;
        append_batch(&mut table, &batch)?;
    }
    Ok(table)
}

fn column_names(schema: &arrow::datatypes::Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

/// Append a record batch row by row.  Columns that are neither text nor
/// numeric are cast to text first.
fn append_batch(table: &mut Table, batch: &RecordBatch) -> Result<()> {
    let columns = batch
        .columns()
        .iter()
        .map(normalize_column)
        .collect::<Result<Vec<_>>>()?;

    for row in 0..batch.num_rows() {
        table
            .rows
            .push(columns.iter().map(|col| extract_cell(col, row)).collect());
    }
    Ok(())
}

fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64
        | DataType::Null => Ok(col.clone()),
        other => cast(col, &DataType::Utf8)
            .with_context(|| format!("converting {other:?} column to text")),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Float(v as f64))
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        _ => CellValue::Null,
    }
}
