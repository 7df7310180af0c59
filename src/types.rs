use std::path::PathBuf;
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DashboardError;
use crate::util::{expand_home, parse_number};

/// File extensions that mark `sheet` as a local workbook path.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Application configuration, loaded from ~/.insightboard/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Explicit source kind. Inferred from `sheet` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    /// Google spreadsheet id, or path to a local workbook.
    #[serde(default = "default_sheet", alias = "sheetId", alias = "workbookPath")]
    pub sheet: String,
    /// OAuth authorized-user token JSON for the Google source.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// Maximum age of cached worksheet rows. 0 = always fetch.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

fn default_sheet() -> String {
    "strategic_insight.xlsx".to_string()
}

fn default_credentials_path() -> String {
    "~/.insightboard/credentials.json".to_string()
}

fn default_cache_ttl() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            sheet: default_sheet(),
            credentials_path: default_credentials_path(),
            cache_ttl_seconds: default_cache_ttl(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl Config {
    /// Which source backs the dashboard.
    ///
    /// A spreadsheet-file extension or an existing path means a local
    /// workbook; anything else is treated as a Google spreadsheet id.
    pub fn source_kind(&self) -> SourceKind {
        if let Some(kind) = self.source {
            return kind;
        }
        let path = self.workbook_path();
        let has_workbook_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if has_workbook_ext || path.exists() {
            SourceKind::Workbook
        } else {
            SourceKind::GoogleSheets
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn workbook_path(&self) -> PathBuf {
        expand_home(&self.sheet)
    }

    pub fn credentials_path(&self) -> PathBuf {
        expand_home(&self.credentials_path)
    }

    /// Apply environment overrides on top of the file config.
    ///
    /// `LOCAL_EXCEL_FILE` wins over `GOOGLE_SHEET_ID` when both are set.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DashboardError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty("GOOGLE_SHEET_ID") {
            self.sheet = id.trim().to_string();
            self.source = Some(SourceKind::GoogleSheets);
        }
        if let Some(path) = non_empty("LOCAL_EXCEL_FILE") {
            self.sheet = path.trim().to_string();
            self.source = Some(SourceKind::Workbook);
        }
        if let Some(path) = non_empty("GOOGLE_CREDENTIALS_FILE") {
            self.credentials_path = path.trim().to_string();
        }
        if let Some(ttl) = non_empty("SHEET_CACHE_TTL") {
            self.cache_ttl_seconds = ttl.trim().parse().map_err(|_| {
                DashboardError::Configuration(format!(
                    "SHEET_CACHE_TTL must be a whole number of seconds, got '{}'",
                    ttl
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.sheet.trim().is_empty() {
            return Err(DashboardError::Configuration(
                "`sheet` must name a spreadsheet id or workbook path".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Workbook,
    GoogleSheets,
}

/// What the cache does when a refresh of an existing entry fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshPolicy {
    /// Serve the previous rows when the source is unreachable.
    #[default]
    ServeStale,
    /// Propagate every refresh failure.
    Strict,
}

// ============================================================================
// Worksheet rows
// ============================================================================

/// A single cell as read from a worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Display text. Whole numbers render without a trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_plain_number(*n),
        }
    }

    /// Lenient numeric view: text cells keep only digits, `.` and `-`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
        }
    }

    /// Strict numeric view: text must parse as a number once commas are removed.
    pub fn as_plain_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.replace(',', "").trim().parse().ok(),
        }
    }
}

fn format_plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_str(""),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One worksheet row: column name -> cell, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::insert`].
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column, value.into());
        self
    }

    /// Set a column, replacing an existing cell of the same name.
    pub fn insert(&mut self, column: &str, value: CellValue) {
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    /// Look up a column by exact name, falling back to a case-insensitive match.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.position(column).map(|idx| &self.cells[idx].1)
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.cells
            .iter()
            .position(|(name, _)| name == column)
            .or_else(|| {
                let wanted = column.trim();
                self.cells
                    .iter()
                    .position(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Trimmed display text of a column; empty when absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column)
            .map(|v| v.as_text().trim().to_string())
            .unwrap_or_default()
    }

    /// First candidate column holding a non-empty value.
    pub fn first_text(&self, candidates: &[&str]) -> String {
        candidates
            .iter()
            .map(|c| self.text(c))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    pub fn plain_number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_plain_number)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }

    /// Copy of this row with columns renamed by `rename`.
    ///
    /// When two columns land on the same name, the first non-empty value is kept.
    pub fn renamed(&self, rename: impl Fn(&str) -> Option<String>) -> Row {
        let mut out = Row::new();
        for (name, value) in &self.cells {
            let target = rename(name).unwrap_or_else(|| name.clone());
            match out.cells.iter_mut().find(|(n, _)| *n == target) {
                Some((_, existing)) => {
                    if existing.is_empty() && !value.is_empty() {
                        *existing = value.clone();
                    }
                }
                None => out.cells.push((target, value.clone())),
            }
        }
        out
    }

    /// Insert an empty cell for each column that is not present.
    pub fn ensure_columns(&mut self, columns: &[&str]) {
        for column in columns {
            if !self.has_column(column) {
                self.cells.push((column.to_string(), CellValue::Empty));
            }
        }
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(&name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
