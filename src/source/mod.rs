//! Worksheet sources.
//!
//! Both backends answer the same question, "give me worksheet X as rows",
//! so the cache and the pages never branch on where the data lives.
//!
//! Modules:
//! - workbook: local .xlsx/.xls/.ods file via calamine
//! - google_sheets: Google Sheets API v4

pub mod google_sheets;
pub mod workbook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DashboardError;
use crate::google_api::sheets::SheetsClient;
use crate::google_api::token_store::TokenStore;
use crate::types::{CellValue, Config, Row, SourceKind};
use crate::util::normalize_header;

pub use google_sheets::GoogleSheetsSource;
pub use workbook::WorkbookSource;

/// Read access to the worksheets of one workbook.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Tab names in workbook order.
    async fn worksheet_names(&self) -> Result<Vec<String>, DashboardError>;

    /// Read a worksheet as rows keyed by its header row.
    ///
    /// The name is resolved with [`resolve_worksheet`]; an unknown tab fails
    /// with `WorksheetNotFound`, an unreachable source with `SourceUnavailable`.
    async fn fetch(&self, worksheet: &str) -> Result<Vec<Row>, DashboardError>;
}

/// Build the configured source.
pub fn from_config(config: &Config) -> Result<Arc<dyn SheetSource>, DashboardError> {
    config.validate()?;
    match config.source_kind() {
        SourceKind::Workbook => Ok(Arc::new(WorkbookSource::new(config.workbook_path()))),
        SourceKind::GoogleSheets => {
            let tokens = TokenStore::new(config.credentials_path());
            let client = SheetsClient::new(config.sheet.trim(), tokens);
            Ok(Arc::new(GoogleSheetsSource::new(client)))
        }
    }
}

/// Dashboard keys whose tabs carry a different title in the workbook.
pub const WORKSHEET_ALIASES: &[(&str, &str)] = &[
    ("value_map", "Full price value_map"),
    ("value_map_promo", "promo price value_map"),
    ("top_product", "top_product_full_price"),
    ("top_product_promo", "top_product_promo"),
    ("okr", "2026 OKR"),
    ("2025 okr", "2025 OKR"),
    ("profit_n_loss", "P&L"),
    ("profit per x", "Profit per X"),
    ("cost per x", "Cost per X"),
    ("core -new segments", "Core -New segments"),
];

/// Resolve a requested worksheet name against the tabs that exist.
///
/// Order: exact title, alias table, case-insensitive match on the alias
/// target (or the requested name when there is no alias).
pub fn resolve_worksheet(requested: &str, available: &[String]) -> Option<String> {
    if available.iter().any(|name| name == requested) {
        return Some(requested.to_string());
    }

    let lowered = requested.to_lowercase();
    let target = WORKSHEET_ALIASES
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, title)| *title)
        .unwrap_or(requested);

    if available.iter().any(|name| name == target) {
        return Some(target.to_string());
    }

    available
        .iter()
        .find(|name| name.eq_ignore_ascii_case(target))
        .cloned()
}

/// Turn a raw cell grid into rows keyed by the first (header) row.
///
/// Headers are normalized; blank headers over empty columns are dropped,
/// other blank headers become `Column N`; repeated headers get a `_N` suffix.
/// Rows whose cells are all empty are skipped.
pub fn rows_from_grid(grid: Vec<Vec<CellValue>>) -> Vec<Row> {
    let mut lines = grid.into_iter();
    let Some(header_cells) = lines.next() else {
        return Vec::new();
    };
    let body: Vec<Vec<CellValue>> = lines.collect();

    let mut headers: Vec<Option<String>> = Vec::with_capacity(header_cells.len());
    for (idx, cell) in header_cells.iter().enumerate() {
        let name = normalize_header(&cell.as_text());
        if !name.is_empty() {
            headers.push(Some(name));
            continue;
        }
        let column_has_data = body
            .iter()
            .any(|line| line.get(idx).map(|v| !v.is_empty()).unwrap_or(false));
        headers.push(column_has_data.then(|| format!("Column {}", idx + 1)));
    }
    dedupe_headers(&mut headers);

    body.into_iter()
        .map(|line| {
            let mut cells = line.into_iter();
            headers
                .iter()
                .map(|header| (header, cells.next().unwrap_or_default()))
                .filter_map(|(header, value)| header.clone().map(|h| (h, value)))
                .collect::<Row>()
        })
        .filter(|row| !row.is_blank())
        .collect()
}

fn dedupe_headers(headers: &mut [Option<String>]) {
    let mut seen: Vec<String> = Vec::new();
    for header in headers.iter_mut().flatten() {
        let base = header.clone();
        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        seen.push(candidate.clone());
        *header = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_exact_name() {
        let available = names(&["exe_summary", "org_chart"]);
        assert_eq!(
            resolve_worksheet("org_chart", &available).as_deref(),
            Some("org_chart")
        );
    }

    #[test]
    fn test_resolve_alias() {
        let available = names(&["Full price value_map", "P&L"]);
        assert_eq!(
            resolve_worksheet("value_map", &available).as_deref(),
            Some("Full price value_map")
        );
        assert_eq!(
            resolve_worksheet("profit_n_loss", &available).as_deref(),
            Some("P&L")
        );
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let available = names(&["SWOT", "2026 okr"]);
        assert_eq!(resolve_worksheet("swot", &available).as_deref(), Some("SWOT"));
        assert_eq!(resolve_worksheet("OKR", &available).as_deref(), Some("2026 okr"));
    }

    #[test]
    fn test_resolve_missing() {
        let available = names(&["exe_summary"]);
        assert!(resolve_worksheet("org_chart", &available).is_none());
    }

    #[test]
    fn test_rows_from_grid_uses_header_row() {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["Category ".into(), "Key\u{00A0}Insight".into()],
            vec!["summary".into(), "Strong year".into()],
            vec!["Revenue".into(), CellValue::Number(1250.0)],
        ];
        let rows = rows_from_grid(grid);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["Category", "Key Insight"]);
        assert_eq!(rows[1].number("Key Insight"), Some(1250.0));
    }

    #[test]
    fn test_rows_from_grid_skips_blank_rows_and_pads_short_rows() {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["Name".into(), "Role".into()],
            vec![CellValue::Empty, CellValue::Empty],
            vec!["Aye".into()],
        ];
        let rows = rows_from_grid(grid);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("Name"), "Aye");
        assert_eq!(rows[0].get("Role"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_rows_from_grid_blank_and_duplicate_headers() {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["Point".into(), CellValue::Empty, "Point".into(), CellValue::Empty],
            vec!["P1".into(), "note".into(), "P1b".into(), CellValue::Empty],
        ];
        let rows = rows_from_grid(grid);
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["Point", "Column 2", "Point_2"]
        );
    }

    #[test]
    fn test_rows_from_empty_grid() {
        assert!(rows_from_grid(Vec::new()).is_empty());
        assert!(rows_from_grid(vec![vec!["Only".into(), "Header".into()]]).is_empty());
    }
}
