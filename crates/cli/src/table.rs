//! Point clouds as tables: one row per point, one numeric column per coordinate.

use anyhow::{bail, Context, Result};
use nalgebra::DVector;
use polars::prelude::*;
use qrml::Pointcloud;
use std::fs::File;
use std::path::Path;

/// Read a point cloud from `.csv` (header row required) or `.parquet`.
///
/// Every numeric column is a coordinate, in table order; other columns
/// (labels, ids as strings) are ignored.
pub fn read_cloud(path: &Path) -> Result<Pointcloud> {
    let lf = match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, ScanArgsParquet::default())?,
        Some("csv") => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .finish()?,
        _ => bail!("unsupported input {}: expected .csv or .parquet", path.display()),
    };
    let df = lf
        .collect()
        .with_context(|| format!("reading {}", path.display()))?;

    let mut columns = Vec::new();
    for s in df.get_columns().iter().filter(|s| s.dtype().is_numeric()) {
        let cast = s.cast(&DataType::Float64)?;
        let values: Option<Vec<f64>> = cast.f64()?.into_iter().collect();
        let Some(values) = values else {
            bail!("column {} of {} has missing values", s.name(), path.display());
        };
        columns.push(values);
    }
    if columns.is_empty() {
        bail!("{} has no numeric columns", path.display());
    }
    tracing::debug!(rows = df.height(), dims = columns.len(), "point table read");
    let points = (0..df.height())
        .map(|r| DVector::from_iterator(columns.len(), columns.iter().map(|c| c[r])))
        .collect();
    Ok(Pointcloud::new(points)?)
}

/// Write `cloud` as CSV with columns `x0, x1, …`.
pub fn write_cloud(cloud: &Pointcloud, path: &Path) -> Result<()> {
    let columns: Vec<Series> = (0..cloud.dim())
        .map(|c| {
            let values: Vec<f64> = cloud.points().iter().map(|p| p[c]).collect();
            Series::new(format!("x{c}").as_str().into(), values)
        })
        .collect();
    let mut df = DataFrame::new(columns)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
