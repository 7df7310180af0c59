//! Local workbook source (.xlsx, .xlsm, .xlsb, .xls, .ods).
//!
//! The file is reopened on every fetch, so edits saved to disk are picked up
//! by the next cache refresh. Parsing is blocking and runs on tokio's
//! blocking pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};

use super::{resolve_worksheet, rows_from_grid, SheetSource};
use crate::error::DashboardError;
use crate::types::{CellValue, Row};

pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T, DashboardError>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> Result<T, DashboardError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || task(path))
            .await
            .map_err(|e| DashboardError::SourceUnavailable(format!("Workbook reader failed: {}", e)))?
    }
}

#[async_trait]
impl SheetSource for WorkbookSource {
    fn describe(&self) -> String {
        format!("workbook {}", self.path.display())
    }

    async fn worksheet_names(&self) -> Result<Vec<String>, DashboardError> {
        self.run_blocking(|path| read_sheet_names(&path)).await
    }

    async fn fetch(&self, worksheet: &str) -> Result<Vec<Row>, DashboardError> {
        let requested = worksheet.to_string();
        self.run_blocking(move |path| read_worksheet(&path, &requested))
            .await
    }
}

fn open(path: &Path) -> Result<calamine::Sheets<std::io::BufReader<std::fs::File>>, DashboardError> {
    if !path.exists() {
        return Err(DashboardError::SourceUnavailable(format!(
            "Workbook not found at {}",
            path.display()
        )));
    }
    open_workbook_auto(path).map_err(|e| {
        DashboardError::SourceUnavailable(format!("Cannot open {}: {}", path.display(), e))
    })
}

fn read_sheet_names(path: &Path) -> Result<Vec<String>, DashboardError> {
    let workbook = open(path)?;
    Ok(workbook.sheet_names().to_vec())
}

fn read_worksheet(path: &Path, requested: &str) -> Result<Vec<Row>, DashboardError> {
    let mut workbook = open(path)?;
    let available = workbook.sheet_names().to_vec();
    let sheet_name = resolve_worksheet(requested, &available)
        .ok_or_else(|| DashboardError::worksheet_not_found(requested, &available))?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        DashboardError::SourceUnavailable(format!("Cannot read worksheet '{}': {}", sheet_name, e))
    })?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    let rows = rows_from_grid(grid);
    log::debug!(
        "Workbook: read {} row(s) from '{}' ({})",
        rows.len(),
        sheet_name,
        path.display()
    );
    Ok(rows)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) if naive.time() == chrono::NaiveTime::MIN => {
                CellValue::Text(naive.format("%Y-%m-%d").to_string())
            }
            Some(naive) => CellValue::Text(naive.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}
