use serde::Serialize;

use super::require_columns;
use crate::error::DashboardError;
use crate::types::Row;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummaryView {
    pub brand_promise: String,
    pub mission_statement: String,
    pub dashboard_subtitle: String,
    pub strategic_insight: String,
    pub summary: Option<String>,
    /// KPI rows: everything except the `summary` row.
    pub points: Vec<Row>,
}

pub fn build(
    worksheet: &str,
    rows: &[Row],
    brand_rows: &[Row],
) -> Result<ExecutiveSummaryView, DashboardError> {
    require_columns(worksheet, rows, &["Category", "Key_Insight"])?;

    let mut view = ExecutiveSummaryView {
        brand_promise: String::new(),
        mission_statement: String::new(),
        dashboard_subtitle: String::new(),
        strategic_insight: String::new(),
        summary: None,
        points: Vec::new(),
    };

    let mut summary_override = None;
    for row in brand_rows {
        let key = row.text("Content_Key");
        let value = row.text("Content_Value");
        if key.contains("Brand_Promise") {
            view.brand_promise = value;
        } else if key.contains("Mission_Statement") {
            view.mission_statement = value;
        } else if key.contains("Dashboard_Subtitle") {
            view.dashboard_subtitle = value;
        } else if key.contains("Strategic Insight") {
            view.strategic_insight = value;
        } else if key.contains("Summary") {
            summary_override = Some(value);
        }
    }

    let mut summary_text = None;
    for row in rows {
        if row.text("Category").eq_ignore_ascii_case("summary") {
            summary_text = Some(row.text("Key_Insight"));
        } else {
            view.points.push(row.clone());
        }
    }

    view.summary = summary_override
        .filter(|s| !s.is_empty())
        .or(summary_text);
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exe_rows() -> Vec<Row> {
        vec![
            Row::new()
                .with("Category", "Summary")
                .with("Key_Insight", "Strong year"),
            Row::new()
                .with("Category", "Revenue")
                .with("Key_Insight", "Up 12%"),
            Row::new()
                .with("Category", "Margin")
                .with("Key_Insight", "Flat"),
        ]
    }

    #[test]
    fn test_summary_row_split_from_points() {
        let view = build("exe_summary", &exe_rows(), &[]).unwrap();
        assert_eq!(view.summary.as_deref(), Some("Strong year"));
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.points[0].text("Category"), "Revenue");
        assert!(view.brand_promise.is_empty());
    }

    #[test]
    fn test_brand_rows_fill_header_fields() {
        let brand = vec![
            Row::new()
                .with("Content_Key", "Brand_Promise")
                .with("Content_Value", "Always on time"),
            Row::new()
                .with("Content_Key", "Mission_Statement")
                .with("Content_Value", "Serve every town"),
            Row::new()
                .with("Content_Key", "Strategic Insight 2026")
                .with("Content_Value", "Own the last mile"),
            Row::new()
                .with("Content_Key", "Summary")
                .with("Content_Value", "Board summary"),
        ];
        let view = build("exe_summary", &exe_rows(), &brand).unwrap();
        assert_eq!(view.brand_promise, "Always on time");
        assert_eq!(view.mission_statement, "Serve every town");
        assert_eq!(view.strategic_insight, "Own the last mile");
        assert_eq!(view.summary.as_deref(), Some("Board summary"));
    }

    #[test]
    fn test_blank_summary_override_falls_back() {
        let brand = vec![Row::new()
            .with("Content_Key", "Summary")
            .with("Content_Value", "")];
        let view = build("exe_summary", &exe_rows(), &brand).unwrap();
        assert_eq!(view.summary.as_deref(), Some("Strong year"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let rows = exe_rows();
        assert_eq!(
            build("exe_summary", &rows, &[]).unwrap(),
            build("exe_summary", &rows, &[]).unwrap()
        );
    }

    #[test]
    fn test_missing_key_insight_column() {
        let rows = vec![Row::new().with("Category", "Revenue")];
        let err = build("exe_summary", &rows, &[]).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { missing, .. } if missing == vec!["Key_Insight"]));
    }
}
