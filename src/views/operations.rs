//! Operations health funnel and FNA performance KPIs.

use serde::Serialize;

use super::{group_in_order, require_columns, Group};
use crate::error::DashboardError;
use crate::types::{CellValue, Row};
use crate::util::clean_latex_math;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationHealthView {
    /// Rows whose funnel stage is `insight`.
    pub insights: Vec<Row>,
    /// Stages in first-seen order; a blank stage is `Unassigned`.
    pub stages: Vec<Group<Row>>,
    pub status_counts: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

pub fn operation_health(
    worksheet: &str,
    rows: &[Row],
) -> Result<OperationHealthView, DashboardError> {
    require_columns(worksheet, rows, &["Funnel Stage", "Status"])?;

    let mut insights = Vec::new();
    let mut staged = Vec::new();
    let mut status_counts: Vec<StatusCount> = Vec::new();

    for row in rows {
        let stage = row.text("Funnel Stage");
        if stage.eq_ignore_ascii_case("insight") {
            insights.push(row.clone());
            continue;
        }

        let status = row.text("Status");
        if !status.is_empty() {
            match status_counts.iter_mut().find(|c| c.status == status) {
                Some(entry) => entry.count += 1,
                None => status_counts.push(StatusCount { status, count: 1 }),
            }
        }

        let stage = if stage.is_empty() {
            "Unassigned".to_string()
        } else {
            stage
        };
        staged.push((stage, row.clone()));
    }

    Ok(OperationHealthView {
        insights,
        stages: group_in_order(staged),
        status_counts,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FnaPerformanceView {
    pub rows: Vec<Row>,
    /// KPI categories in first-seen order.
    pub categories: Vec<KpiCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCategory {
    pub name: String,
    pub color: &'static str,
    pub count: usize,
}

const CATEGORY_PALETTE: &[&str] = &[
    "#1976d2", "#ef6c00", "#2e7d32", "#6a1b9a", "#00838f", "#c62828",
];

pub fn fna_performance(rows: &[Row]) -> FnaPerformanceView {
    let mut categories: Vec<KpiCategory> = Vec::new();

    let rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let name = match row.text("KPI Category") {
                c if c.is_empty() => "General".to_string(),
                c => c,
            };
            match categories.iter_mut().find(|c| c.name == name) {
                Some(category) => category.count += 1,
                None => {
                    let color = CATEGORY_PALETTE[categories.len() % CATEGORY_PALETTE.len()];
                    categories.push(KpiCategory {
                        name,
                        color,
                        count: 1,
                    });
                }
            }

            row.cells()
                .iter()
                .map(|(column, value)| {
                    let value = match value {
                        CellValue::Text(text) => CellValue::from(clean_latex_math(text)),
                        other => other.clone(),
                    };
                    (column.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();

    FnaPerformanceView { rows, categories }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(stage: &str, status: &str, metric: &str) -> Row {
        Row::new()
            .with("Funnel Stage", stage)
            .with("Status", status)
            .with("Metric", metric)
    }

    #[test]
    fn test_operation_health_groups_and_counts() {
        let rows = vec![
            op("Pick", "On Track", "Pick rate"),
            op("Insight", "", "Returns spike after 11.11"),
            op("Pack", "At Risk", "Pack time"),
            op("", "On Track", "Unknown stage"),
            op("Pick", "On Track", "Accuracy"),
        ];
        let view = operation_health("operation_health", &rows).unwrap();

        assert_eq!(view.insights.len(), 1);
        let stages: Vec<&str> = view.stages.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(stages, vec!["Pick", "Pack", "Unassigned"]);
        assert_eq!(view.stages[0].items.len(), 2);
        assert_eq!(
            view.status_counts,
            vec![
                StatusCount { status: "On Track".into(), count: 3 },
                StatusCount { status: "At Risk".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_operation_health_requires_status() {
        let rows = vec![Row::new().with("Funnel Stage", "Pick")];
        assert!(operation_health("operation_health", &rows).is_err());
    }

    #[test]
    fn test_fna_categories_and_cleaning() {
        let rows = vec![
            Row::new()
                .with("KPI Category", "Finance")
                .with("KPI", "$\\mathbf{12\\%}$ margin")
                .with("Target", 0.12),
            Row::new().with("KPI Category", "").with("KPI", "Headcount"),
            Row::new().with("KPI Category", "Finance").with("KPI", "Cash"),
        ];
        let view = fna_performance(&rows);

        assert_eq!(view.rows[0].text("KPI"), "12\\% margin");
        assert_eq!(view.rows[0].get("Target"), Some(&CellValue::Number(0.12)));
        assert_eq!(
            view.categories,
            vec![
                KpiCategory { name: "Finance".into(), color: "#1976d2", count: 2 },
                KpiCategory { name: "General".into(), color: "#ef6c00", count: 1 },
            ]
        );
    }

    #[test]
    fn test_fna_palette_wraps() {
        let rows: Vec<Row> = (0..7)
            .map(|i| Row::new().with("KPI Category", format!("C{i}")))
            .collect();
        let view = fna_performance(&rows);
        assert_eq!(view.categories[6].color, view.categories[0].color);
    }
}
