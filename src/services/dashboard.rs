// Dashboard service: page rendering on top of the worksheet cache.
// Every page either renders its view or an error state; nothing here panics
// or takes the process down on a bad sheet.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::SheetCache;
use crate::error::{DashboardError, PageError};
use crate::types::Row;
use crate::views::{self, Page, PageSheets, ViewModel};

/// Result of rendering one page
#[derive(Debug, Clone, serde::Serialize)]
#[allow(clippy::large_enum_variant)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageResult {
    Success {
        page: Page,
        title: &'static str,
        view: ViewModel,
    },
    Error {
        page: Page,
        title: &'static str,
        error: PageError,
    },
}

impl PageResult {
    pub fn page(&self) -> Page {
        match self {
            PageResult::Success { page, .. } | PageResult::Error { page, .. } => *page,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageResult::Success { .. })
    }
}

/// p95 latency budget for a page render with a warm cache.
const RENDER_LATENCY_BUDGET_MS: u128 = 300;

#[derive(Clone)]
pub struct Dashboard {
    cache: Arc<SheetCache>,
}

impl Dashboard {
    pub fn new(cache: Arc<SheetCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<SheetCache> {
        &self.cache
    }

    /// Render `page` from cached (or freshly read) worksheet rows.
    pub async fn render(&self, page: Page) -> PageResult {
        let started = Instant::now();
        let result = match self.build_view(page).await {
            Ok(view) => PageResult::Success {
                page,
                title: page.title(),
                view,
            },
            Err(err) => {
                log::warn!("Page '{}' failed: {}", page, err);
                PageResult::Error {
                    page,
                    title: page.title(),
                    error: PageError::from(&err),
                }
            }
        };
        log_latency(page, started);
        result
    }

    /// Worksheet names as the source reports them.
    pub async fn worksheet_names(&self) -> Result<Vec<String>, DashboardError> {
        self.cache.source().worksheet_names().await
    }

    async fn build_view(&self, page: Page) -> Result<ViewModel, DashboardError> {
        let primary = self.cache.rows(page.worksheet()).await?;
        let companion = match page.companion_worksheet() {
            Some(name) => self.companion_rows(page, name).await?,
            None => None,
        };

        let mut sheets = PageSheets::new(&primary);
        if let Some(rows) = companion.as_deref() {
            sheets = sheets.with_companion(rows);
        }
        views::assemble(page, &sheets)
    }

    /// A missing companion tab reads as absent; other failures propagate.
    async fn companion_rows(
        &self,
        page: Page,
        worksheet: &str,
    ) -> Result<Option<Arc<Vec<Row>>>, DashboardError> {
        match self.cache.rows(worksheet).await {
            Ok(rows) => Ok(Some(rows)),
            Err(DashboardError::WorksheetNotFound { .. }) => {
                log::debug!("Page '{}': companion '{}' not present", page, worksheet);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn log_latency(page: Page, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis();
    if elapsed_ms > RENDER_LATENCY_BUDGET_MS {
        log::warn!(
            "render({}) exceeded latency budget: {}ms > {}ms",
            page,
            elapsed_ms,
            RENDER_LATENCY_BUDGET_MS
        );
    } else {
        log::debug!("render({}) completed in {}ms", page, elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::tests::{FakeSource, ManualClock};
    use crate::error::ErrorType;
    use crate::types::RefreshPolicy;

    fn dashboard(source: Arc<FakeSource>) -> Dashboard {
        let cache = SheetCache::new(
            source,
            Arc::new(ManualClock::new()),
            Duration::from_secs(30),
            RefreshPolicy::ServeStale,
        );
        Dashboard::new(Arc::new(cache))
    }

    fn okr_rows() -> Vec<Row> {
        vec![Row::new()
            .with("Years", "2026")
            .with("Functional POVs", "Ops")
            .with("Objective", "Faster delivery")
            .with("Average", 0.5)]
    }

    #[tokio::test]
    async fn test_render_success() {
        let source = Arc::new(FakeSource::new(vec![("okr", okr_rows())]));
        let result = dashboard(source).render(Page::Okr).await;
        assert!(result.is_success());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["page"], "okr");
        assert_eq!(json["title"], "OKR Dashboard: 2025 vs 2026");
        assert_eq!(json["view"]["teams"][0]["team"], "Ops");
        assert_eq!(json["view"]["teams"][0]["avg2026"], 50.0);
    }

    #[tokio::test]
    async fn test_missing_worksheet_is_error_state() {
        let source = Arc::new(FakeSource::new(vec![("okr", okr_rows())]));
        let result = dashboard(source).render(Page::OrgStructure).await;

        match result {
            PageResult::Error { page, error, .. } => {
                assert_eq!(page, Page::OrgStructure);
                assert_eq!(error.error_type, ErrorType::RequiresUserAction);
                assert!(!error.can_retry);
                assert!(error.message.contains("org_chart"));
            }
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_error_state() {
        let rows = vec![Row::new().with("Name", "Aung")];
        let source = Arc::new(FakeSource::new(vec![("org_chart", rows)]));
        let result = dashboard(source).render(Page::OrgStructure).await;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["errorType"], "requiresUserAction");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Reports_To"));
    }

    #[tokio::test]
    async fn test_source_unavailable_is_retryable_error_state() {
        let source = Arc::new(FakeSource::new(vec![("okr", okr_rows())]));
        source.fail(Some(DashboardError::SourceUnavailable("timeout".into())));
        let result = dashboard(source).render(Page::Okr).await;

        match result {
            PageResult::Error { error, .. } => {
                assert_eq!(error.error_type, ErrorType::Retryable);
                assert!(error.can_retry);
            }
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_companion_renders_without_it() {
        let exe = vec![
            Row::new()
                .with("Category", "Revenue")
                .with("Key_Insight", "Up 12%"),
        ];
        let source = Arc::new(FakeSource::new(vec![("exe_summary", exe)]));
        let result = dashboard(source).render(Page::ExecutiveSummary).await;

        match result {
            PageResult::Success {
                view: ViewModel::ExecutiveSummary(view),
                ..
            } => {
                assert_eq!(view.points.len(), 1);
                assert!(view.brand_promise.is_empty());
            }
            other => panic!("expected executive summary, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_companion_rows_are_used() {
        let exe = vec![Row::new()
            .with("Category", "summary")
            .with("Key_Insight", "Strong year")];
        let brand = vec![Row::new()
            .with("Content_Key", "Brand_Promise")
            .with("Content_Value", "Always on time")];
        let source = Arc::new(FakeSource::new(vec![
            ("exe_summary", exe),
            ("brand_promise", brand),
        ]));
        let result = dashboard(source).render(Page::ExecutiveSummary).await;

        match result {
            PageResult::Success {
                view: ViewModel::ExecutiveSummary(view),
                ..
            } => {
                assert_eq!(view.brand_promise, "Always on time");
                assert_eq!(view.summary.as_deref(), Some("Strong year"));
            }
            other => panic!("expected executive summary, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeat_renders_use_cache() {
        let source = Arc::new(FakeSource::new(vec![("okr", okr_rows())]));
        let dashboard = dashboard(source.clone());

        let first = serde_json::to_value(dashboard.render(Page::Okr).await).unwrap();
        let second = serde_json::to_value(dashboard.render(Page::Okr).await).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_worksheet_names_from_source() {
        let source = Arc::new(FakeSource::new(vec![("okr", vec![]), ("swot", vec![])]));
        let names = dashboard(source).worksheet_names().await.unwrap();
        assert_eq!(names, vec!["okr", "swot"]);
    }
}
