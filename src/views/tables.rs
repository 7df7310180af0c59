//! Worksheets rendered as plain tables.

use serde::Serialize;

use super::header_columns;
use crate::types::Row;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn build(rows: &[Row]) -> TableView {
    TableView {
        columns: header_columns(rows),
        rows: rows.to_vec(),
    }
}
