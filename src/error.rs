//! Error types for dashboard data loading
//!
//! Errors are classified by recoverability:
//! - Retryable: network issues, unreadable workbook, auth refresh failures
//! - RequiresUserAction: renamed tabs, missing columns, bad configuration

use thiserror::Error;

/// Error types for loading and shaping dashboard data
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    // Retryable errors
    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),

    // Requires user action
    #[error("Worksheet '{name}' not found{}", available_suffix(.available))]
    WorksheetNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Worksheet '{worksheet}' is missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch {
        worksheet: String,
        missing: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn available_suffix(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

impl DashboardError {
    pub fn worksheet_not_found(name: &str, available: &[String]) -> Self {
        DashboardError::WorksheetNotFound {
            name: name.to_string(),
            available: available.to_vec(),
        }
    }

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::SourceUnavailable(_))
    }

    /// Returns true if this error requires user action to resolve
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            DashboardError::WorksheetNotFound { .. }
                | DashboardError::SchemaMismatch { .. }
                | DashboardError::Configuration(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::SourceUnavailable(_) => {
                "Check the workbook path or your connection to Google Sheets, then reload."
            }
            DashboardError::WorksheetNotFound { .. } => {
                "A tab was renamed or removed. Restore the tab name in the spreadsheet."
            }
            DashboardError::SchemaMismatch { .. } => {
                "A column header was renamed or removed. Fix the header row in the spreadsheet."
            }
            DashboardError::Configuration(_) => {
                "Check ~/.insightboard/config.json and the environment overrides."
            }
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::SourceUnavailable(err.to_string())
    }
}

/// Serializable error state rendered in place of a page
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageError {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&DashboardError> for PageError {
    fn from(err: &DashboardError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        PageError {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
