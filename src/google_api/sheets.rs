//! Google Sheets API v4 (read-only)
//!
//! Two calls are enough for the dashboards: the list of tab titles and the
//! unformatted values of one tab.

use serde::Deserialize;
use url::Url;

use super::token_store::TokenStore;
use super::{send_with_retry, GoogleApiError, RetryPolicy};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

pub struct SheetsClient {
    spreadsheet_id: String,
    tokens: TokenStore,
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, tokens: TokenStore) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
            http: reqwest::Client::new(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root (proxies, emulators).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Tab titles in workbook order.
    pub async fn sheet_titles(&self) -> Result<Vec<String>, GoogleApiError> {
        let url = self.spreadsheet_url(&[])?;
        let resp = self
            .get(url, &[("fields", "sheets.properties.title")])
            .await?;
        let meta: SpreadsheetMeta = resp.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Raw cell values of one tab, header row first.
    ///
    /// Trailing empty cells and rows are omitted by the API.
    pub async fn values(&self, title: &str) -> Result<Vec<Vec<serde_json::Value>>, GoogleApiError> {
        let range = a1_sheet_range(title);
        let url = self.spreadsheet_url(&["values", &range])?;
        let resp = self
            .get(
                url,
                &[
                    ("valueRenderOption", "UNFORMATTED_VALUE"),
                    ("dateTimeRenderOption", "FORMATTED_STRING"),
                ],
            )
            .await?;
        let body: ValueRange = resp.json().await?;
        Ok(body.values)
    }

    async fn get(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, GoogleApiError> {
        let access_token = self.tokens.access_token().await?;
        let request = self.http.get(url).bearer_auth(access_token).query(query);
        let resp = send_with_retry(request, &RetryPolicy::default()).await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate();
            return Err(GoogleApiError::AuthExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GoogleApiError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url, GoogleApiError> {
        let invalid = |detail: String| GoogleApiError::ApiError {
            status: 0,
            message: format!("invalid Sheets API URL: {}", detail),
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(self.base_url.clone()))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&self.spreadsheet_id)
            .extend(tail);
        Ok(url)
    }
}

/// A1 range covering a whole tab: the title quoted, inner quotes doubled.
///
/// Example: "Ops' P&L" → "'Ops'' P&L'"
pub fn a1_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// True when a 400 response means the tab in the range does not exist.
pub fn is_unknown_range(err: &GoogleApiError) -> bool {
    match err {
        GoogleApiError::ApiError { status: 400, message } => {
            message.contains("Unable to parse range")
        }
        _ => false,
    }
}
