//! Google Sheets source.

use async_trait::async_trait;

use super::{resolve_worksheet, rows_from_grid, SheetSource};
use crate::error::DashboardError;
use crate::google_api::sheets::{is_unknown_range, SheetsClient};
use crate::types::{CellValue, Row};

pub struct GoogleSheetsSource {
    client: SheetsClient,
}

impl GoogleSheetsSource {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsSource {
    fn describe(&self) -> String {
        format!("Google Sheet {}", self.client.spreadsheet_id())
    }

    async fn worksheet_names(&self) -> Result<Vec<String>, DashboardError> {
        Ok(self.client.sheet_titles().await?)
    }

    async fn fetch(&self, worksheet: &str) -> Result<Vec<Row>, DashboardError> {
        let available = self.client.sheet_titles().await?;
        let title = resolve_worksheet(worksheet, &available)
            .ok_or_else(|| DashboardError::worksheet_not_found(worksheet, &available))?;

        // The tab can disappear between the two calls.
        let values = match self.client.values(&title).await {
            Ok(values) => values,
            Err(err) if is_unknown_range(&err) => {
                return Err(DashboardError::worksheet_not_found(worksheet, &available));
            }
            Err(err) => return Err(err.into()),
        };

        let grid = values
            .into_iter()
            .map(|line| line.iter().map(cell_value).collect())
            .collect();
        let rows = rows_from_grid(grid);
        log::debug!("Google Sheets: read {} row(s) from '{}'", rows.len(), title);
        Ok(rows)
    }
}

fn cell_value(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
        serde_json::Value::String(s) => CellValue::from(s.as_str()),
        serde_json::Value::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}
