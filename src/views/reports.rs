//! Narrative finance reports: financial review, profit per X, cost per X.
//!
//! None of these declare required columns. Absent columns read as empty.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{group_in_order, Group};
use crate::types::{CellValue, Row};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReviewView {
    /// Sorted by section name.
    pub sections: Vec<Group<Row>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitPerXView {
    /// First-seen section order.
    pub sections: Vec<Group<Row>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPerXView {
    pub rows: Vec<Row>,
}

const SECTION: &str = "Section";

const PROFIT_TEXT_COLUMNS: &[&str] = &["Data", "Insight", "What to Improve More? (2026 Actions)"];

const COST_COLUMNS: &[&str] = &["Cost per X", "Facts", "Why?", "What to Improve More?"];

pub fn financial_review(rows: &[Row]) -> FinancialReviewView {
    let mut sections: BTreeMap<String, Vec<Row>> = BTreeMap::new();
    for row in rows {
        let section = row.text(SECTION);
        if section.is_empty() {
            continue;
        }
        sections.entry(section).or_default().push(row.clone());
    }

    FinancialReviewView {
        sections: sections
            .into_iter()
            .map(|(name, items)| Group { name, items })
            .collect(),
    }
}

pub fn profit_per_x(rows: &[Row]) -> ProfitPerXView {
    let items = rows.iter().filter_map(|row| {
        let section = row.text(SECTION);
        if section.is_empty() {
            return None;
        }
        let mut item = row.clone();
        item.ensure_columns(&["Segment"]);
        item.ensure_columns(PROFIT_TEXT_COLUMNS);
        for column in PROFIT_TEXT_COLUMNS {
            if let Some(CellValue::Text(text)) = item.get(column) {
                let cleaned = break_tags_to_newlines(text);
                item.insert(column, CellValue::from(cleaned));
            }
        }
        item.insert(SECTION, CellValue::from(section.clone()));
        Some((section, item))
    });

    ProfitPerXView {
        sections: group_in_order(items),
    }
}

/// `<br>` variants and escaped `\n` sequences become real newlines.
fn break_tags_to_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("&lt;br&gt;", "\n")
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
}

pub fn cost_per_x(rows: &[Row]) -> CostPerXView {
    let rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let renamed = row.renamed(cost_column);
            COST_COLUMNS
                .iter()
                .map(|&column| {
                    let text = renamed
                        .get(column)
                        .map(CellValue::as_text)
                        .unwrap_or_default()
                        .replace("\r\n", "\n")
                        .replace('\r', "\n");
                    (column.to_string(), CellValue::from(text))
                })
                .collect::<Row>()
        })
        .collect();

    CostPerXView { rows }
}

fn cost_column(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    let canonical = if lower.contains("cost per x") {
        "Cost per X"
    } else if lower.starts_with("facts") {
        "Facts"
    } else if lower.starts_with("why") {
        "Why?"
    } else if lower.contains("improve") {
        "What to Improve More?"
    } else {
        return None;
    };
    Some(canonical.to_string())
}
