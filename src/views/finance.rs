//! P&L and e-commerce pages.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::{header_columns, require_columns};
use crate::error::DashboardError;
use crate::types::{CellValue, Row};
use crate::util::{format_number, parse_number};

// ============================================================================
// Profit & Loss
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLossView {
    pub rows: Vec<PnlRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlRow {
    pub year: String,
    pub month: String,
    pub label: String,
    pub revenue: f64,
    pub cost_of_sales: f64,
    pub gross_profit: f64,
    pub expense: f64,
    pub net_profit: f64,
}

pub fn profit_and_loss(worksheet: &str, rows: &[Row]) -> Result<ProfitAndLossView, DashboardError> {
    require_columns(worksheet, rows, &["Revenue", "Net Profit"])?;

    let amount = |row: &Row, column: &str| row.plain_number(column).unwrap_or(0.0);

    let mut records: Vec<PnlRow> = rows
        .iter()
        .map(|row| {
            let (year, month) = period(row);
            PnlRow {
                label: format!("{} {}", month, year).trim().to_string(),
                revenue: amount(row, "Revenue"),
                cost_of_sales: amount(row, "Cost of Sales"),
                gross_profit: amount(row, "Gross Profit"),
                expense: amount(row, "Expense"),
                net_profit: amount(row, "Net Profit"),
                year,
                month,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| month_ordinal(&a.month).cmp(&month_ordinal(&b.month)))
            .then_with(|| a.month.cmp(&b.month))
    });

    Ok(ProfitAndLossView { rows: records })
}

/// Year and month from their own columns, else split out of `Date`.
///
/// `Jan-2025`, `Jan 2025`, `01/2025` and `2025-01-31` are understood.
fn period(row: &Row) -> (String, String) {
    let mut year = row.text("Year");
    let mut month = row.text("Month");
    let date = row.text("Date");

    if !date.is_empty() && (year.is_empty() || month.is_empty()) {
        let parts: Vec<&str> = date
            .split(['-', '/', ' '])
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() >= 2 {
            let year_first = parts[0].len() == 4 && parts[0].chars().all(|c| c.is_ascii_digit());
            let (m, y) = if year_first {
                (parts[1], parts[0])
            } else {
                (parts[0], parts[1])
            };
            if month.is_empty() {
                month = m.to_string();
            }
            if year.is_empty() {
                year = y.to_string();
            }
        }
    }
    (year, month)
}

/// Calendar position of a month label; `None` sorts first.
fn month_ordinal(month: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lowered = month.trim().to_lowercase();
    if let Ok(n) = lowered.parse::<u32>() {
        return Some(n);
    }
    MONTHS
        .iter()
        .position(|m| lowered.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

// ============================================================================
// E-commerce: 2024 vs 2025
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomComparisonView {
    pub rows: Vec<EcomMonth>,
    pub summary: EcomSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomMonth {
    pub month: String,
    pub value_2024: f64,
    pub value_2025: f64,
    pub delta: f64,
    pub value_2024_fmt: String,
    pub value_2025_fmt: String,
    pub delta_fmt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomSummary {
    pub total_2024: String,
    pub total_2025: String,
    pub avg_2024: String,
    pub avg_2025: String,
    pub max_month: String,
    pub max_value: String,
    pub min_month: String,
    pub min_value: String,
}

pub fn ecom_comparison(worksheet: &str, rows: &[Row]) -> Result<EcomComparisonView, DashboardError> {
    require_columns(worksheet, rows, &["Months", "2024", "2025"])?;

    let months: Vec<EcomMonth> = rows
        .iter()
        .map(|row| {
            let value_2024 = row.number("2024").unwrap_or(0.0);
            let value_2025 = row.number("2025").unwrap_or(0.0);
            let delta = value_2025 - value_2024;
            EcomMonth {
                month: row.text("Months"),
                value_2024,
                value_2025,
                delta,
                value_2024_fmt: format_number(value_2024, 0),
                value_2025_fmt: format_number(value_2025, 0),
                delta_fmt: format_number(delta, 0),
            }
        })
        .collect();

    let total_2024: f64 = months.iter().map(|m| m.value_2024).sum();
    let total_2025: f64 = months.iter().map(|m| m.value_2025).sum();
    let count = months.len().max(1) as f64;

    // First maximum / first minimum, like a stable scan.
    let max = months
        .iter()
        .fold(None::<&EcomMonth>, |best, m| match best {
            Some(b) if b.value_2025 >= m.value_2025 => Some(b),
            _ => Some(m),
        });
    let is_december = |m: &&EcomMonth| matches!(m.month.to_lowercase().as_str(), "dec" | "december");
    let min_pool: Vec<&EcomMonth> = if months.iter().any(|m| !is_december(&m)) {
        months.iter().filter(|m| !is_december(m)).collect()
    } else {
        months.iter().collect()
    };
    let min = min_pool
        .into_iter()
        .fold(None::<&EcomMonth>, |best, m| match best {
            Some(b) if b.value_2025 <= m.value_2025 => Some(b),
            _ => Some(m),
        });

    let summary = EcomSummary {
        total_2024: format_number(total_2024, 0),
        total_2025: format_number(total_2025, 0),
        avg_2024: format_number(total_2024 / count, 0),
        avg_2025: format_number(total_2025 / count, 0),
        max_month: max.map(|m| m.month.clone()).unwrap_or_else(|| "-".to_string()),
        max_value: format_number(max.map(|m| m.value_2025).unwrap_or(0.0), 0),
        min_month: min.map(|m| m.month.clone()).unwrap_or_else(|| "-".to_string()),
        min_value: format_number(min.map(|m| m.value_2025).unwrap_or(0.0), 0),
    };

    Ok(EcomComparisonView {
        rows: months,
        summary,
    })
}

// ============================================================================
// E-commerce: 2026 target
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomTargetView {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub insight: String,
}

const MONEY_HINTS: &[&str] = &["amount", "target", "sales", "moonshot", "fulfillment"];

pub fn ecom_target(rows: &[Row]) -> EcomTargetView {
    let columns = header_columns(rows);

    let formatted = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let lowered = column.to_lowercase();
                    let value = if MONEY_HINTS.iter().any(|hint| lowered.contains(hint)) {
                        row.get(column)
                            .map(CellValue::as_text)
                            .and_then(|text| parse_number(&text))
                            .map(|n| CellValue::Text(format_number(n, 2)))
                            .unwrap_or_default()
                    } else {
                        row.get(column).cloned().unwrap_or_default()
                    };
                    (column.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();

    EcomTargetView {
        insight: target_insight(rows, &columns),
        columns,
        rows: formatted,
    }
}

/// Insight text: the row labelled "insight" in the first column, else the
/// last long prose row.
fn target_insight(rows: &[Row], columns: &[String]) -> String {
    static LONG_DIGITS: OnceLock<Regex> = OnceLock::new();
    let long_digits = LONG_DIGITS.get_or_init(|| Regex::new(r"\d{3,}").expect("valid regex"));

    let Some(first_column) = columns.first() else {
        return String::new();
    };

    let joined = |row: &Row, skip: usize| -> String {
        columns
            .iter()
            .skip(skip)
            .map(|c| row.text(c))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    if let Some(row) = rows
        .iter()
        .find(|row| row.text(first_column).to_lowercase().contains("insight"))
    {
        return joined(row, 1);
    }

    rows.iter()
        .rev()
        .map(|row| joined(row, 0))
        .find(|text| text.chars().count() > 40 && !long_digits.is_match(text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnl(date: &str, revenue: f64, net: &str) -> Row {
        Row::new()
            .with("Date", date)
            .with("Revenue", revenue)
            .with("Cost of Sales", "1,200")
            .with("Net Profit", net)
    }

    #[test]
    fn test_pnl_period_from_date_and_sorting() {
        let rows = vec![
            pnl("Mar-2025", 3000.0, "300"),
            pnl("Jan-2025", 1000.0, "n/a"),
            pnl("Dec 2024", 900.0, "90"),
            pnl("2025-02-01", 2000.0, "200"),
        ];
        let view = profit_and_loss("P&L", &rows).unwrap();
        let labels: Vec<&str> = view.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Dec 2024", "Jan 2025", "02 2025", "Mar 2025"]);

        let jan = &view.rows[1];
        assert_eq!(jan.revenue, 1000.0);
        assert_eq!(jan.cost_of_sales, 1200.0);
        assert_eq!(jan.net_profit, 0.0);
        assert_eq!(jan.expense, 0.0);
    }

    #[test]
    fn test_pnl_explicit_columns_win() {
        let rows = vec![pnl("Jan-2025", 1.0, "1").with("Year", "2026").with("Month", "Feb")];
        let view = profit_and_loss("P&L", &rows).unwrap();
        assert_eq!(view.rows[0].year, "2026");
        assert_eq!(view.rows[0].month, "Feb");
    }

    #[test]
    fn test_pnl_requires_net_profit() {
        let rows = vec![Row::new().with("Revenue", 1.0)];
        assert!(matches!(
            profit_and_loss("P&L", &rows),
            Err(DashboardError::SchemaMismatch { .. })
        ));
    }

    fn ecom(month: &str, v2024: f64, v2025: &str) -> Row {
        Row::new()
            .with("Months", month)
            .with("2024", v2024)
            .with("2025", v2025)
    }

    #[test]
    fn test_ecom_comparison_summary() {
        let rows = vec![
            ecom("Jan", 1000.0, "1,500"),
            ecom("Feb", 2000.0, "1,200"),
            ecom("Dec", 500.0, "400"),
            ecom("Nov", 4000.0, "6,000"),
        ];
        let view = ecom_comparison("ecom 2024 vs 2025", &rows).unwrap();
        assert_eq!(view.rows[0].delta, 500.0);
        assert_eq!(view.rows[1].delta_fmt, "-800");

        let summary = &view.summary;
        assert_eq!(summary.total_2024, "7,500");
        assert_eq!(summary.total_2025, "9,100");
        assert_eq!(summary.avg_2025, "2,275");
        assert_eq!(summary.max_month, "Nov");
        assert_eq!(summary.max_value, "6,000");
        // December is excluded from the minimum.
        assert_eq!(summary.min_month, "Feb");
        assert_eq!(summary.min_value, "1,200");
    }

    #[test]
    fn test_ecom_comparison_only_december() {
        let rows = vec![ecom("December", 10.0, "5")];
        let view = ecom_comparison("ecom 2024 vs 2025", &rows).unwrap();
        assert_eq!(view.summary.min_month, "December");
    }

    #[test]
    fn test_ecom_comparison_empty() {
        let view = ecom_comparison("ecom 2024 vs 2025", &[]).unwrap();
        assert_eq!(view.summary.max_month, "-");
        assert_eq!(view.summary.avg_2024, "0");
    }

    #[test]
    fn test_ecom_target_formats_money_columns() {
        let rows = vec![
            Row::new()
                .with("Brand", "Acme")
                .with("Target Amount", 1250000.0)
                .with("Note", "steady"),
            Row::new()
                .with("Brand", "Key Insight")
                .with("Target Amount", "")
                .with("Note", "Focus on the top three brands"),
        ];
        let view = ecom_target(&rows);
        assert_eq!(view.columns, vec!["Brand", "Target Amount", "Note"]);
        assert_eq!(view.rows[0].text("Target Amount"), "1,250,000.00");
        assert_eq!(view.rows[0].text("Note"), "steady");
        assert_eq!(view.rows[1].get("Target Amount"), Some(&CellValue::Empty));
        assert_eq!(view.insight, "Focus on the top three brands");
    }

    #[test]
    fn test_ecom_target_insight_fallback_to_long_prose() {
        let rows = vec![
            Row::new().with("Brand", "Acme").with("Sales", 5000.0),
            Row::new()
                .with("Brand", "Growth will come from bundles and repeat buyers in Q3")
                .with("Sales", ""),
        ];
        let view = ecom_target(&rows);
        assert_eq!(
            view.insight,
            "Growth will come from bundles and repeat buyers in Q3"
        );
    }
}
