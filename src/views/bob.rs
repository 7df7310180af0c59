//! BOB (business-on-behalf) order split and the review notes beside it.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::require_columns;
use crate::error::DashboardError;
use crate::types::Row;
use crate::util::{format_number, format_percent};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BobView {
    pub rows: Vec<BobRow>,
    pub chart: BobChart,
    pub summary: BobSummary,
    pub review_sections: Vec<ReviewSection>,
    pub reviews: Vec<Review>,
}

/// Display-formatted monthly row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BobRow {
    pub month: String,
    pub bob_order: String,
    pub self_order: String,
    pub grand_total: String,
    pub cs_percent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BobChart {
    pub months: Vec<String>,
    pub bob: Vec<f64>,
    pub self_order: Vec<f64>,
    /// CS% as a percentage (0-100).
    pub cs: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BobSummary {
    pub total_bob: String,
    pub total_self: String,
    pub total_grand: String,
    pub avg_cs: String,
    pub best_month: String,
    pub best_month_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSection {
    pub key: &'static str,
    pub label: &'static str,
}

/// One review row: section key -> parsed chunks, in section order.
/// Serializes as an object keyed by section.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub sections: Vec<(&'static str, Vec<ReviewChunk>)>,
}

impl Review {
    pub fn section(&self, key: &str) -> Option<&[ReviewChunk]> {
        self.sections
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, chunks)| chunks.as_slice())
    }
}

impl Serialize for Review {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (key, chunks) in &self.sections {
            map.serialize_entry(key, chunks)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum ReviewChunk {
    Bullet(String),
    Text(String),
}

const REVIEW_SECTIONS: &[(&str, &str)] = &[
    ("worked", "What Worked?"),
    ("scale", "What needs to scale?"),
    ("not_work", "What did not work?"),
    ("lesson", "What is the lesson learned?"),
    ("next_goal", "What is the next goal for BOB?"),
];

/// Header variants seen in the BOB sheet, lowercased.
const COLUMN_VARIANTS: &[(&str, &str)] = &[
    ("months", "Months"),
    ("month", "Months"),
    ("bob order", "BOB Order"),
    ("bob", "BOB Order"),
    ("boborder", "BOB Order"),
    ("self order", "Self Order"),
    ("self", "Self Order"),
    ("grand total", "Grand Total"),
    ("grand_total", "Grand Total"),
    ("total", "Grand Total"),
    ("cs%", "CS%"),
    ("cs %", "CS%"),
    ("cs percentage", "CS%"),
];

/// Bullet markers, longest first so `->` is not read as `-`.
const BULLET_MARKERS: &[&str] = &["->", "-", "•", "→", "–"];

pub fn build(worksheet: &str, rows: &[Row], review_rows: &[Row]) -> Result<BobView, DashboardError> {
    let rows: Vec<Row> = rows.iter().map(canonical_row).collect();
    require_columns(worksheet, &rows, &["Months"])?;

    let mut table = Vec::with_capacity(rows.len());
    let mut chart = BobChart::default();
    let (mut total_bob, mut total_self, mut total_grand) = (0.0, 0.0, 0.0);
    let mut cs_ratios: Vec<f64> = Vec::new();
    let mut best: Option<(String, f64)> = None;

    for row in &rows {
        let month = row.text("Months");
        let bob = row.number("BOB Order").unwrap_or(0.0);
        let self_order = row.number("Self Order").unwrap_or(0.0);
        let grand = row.number("Grand Total").unwrap_or(0.0);
        let cs = row.number("CS%");

        table.push(BobRow {
            month: month.clone(),
            bob_order: format_number(bob, 0),
            self_order: format_number(self_order, 0),
            grand_total: format_number(grand, 0),
            cs_percent: format_percent(cs),
        });

        chart.months.push(month.clone());
        chart.bob.push(bob);
        chart.self_order.push(self_order);
        chart.cs.push(match cs {
            Some(v) if v.abs() <= 1.0 => v * 100.0,
            Some(v) => v,
            None => 0.0,
        });

        total_bob += bob;
        total_self += self_order;
        total_grand += grand;
        if let Some(v) = cs {
            cs_ratios.push(if v.abs() <= 1.0 { v } else { v / 100.0 });
        }
        if grand > best.as_ref().map(|(_, value)| *value).unwrap_or(0.0) {
            best = Some((month, grand));
        }
    }

    let avg_cs = (!cs_ratios.is_empty()).then(|| cs_ratios.iter().sum::<f64>() / cs_ratios.len() as f64);
    let (best_month, best_value) = best.unwrap_or_else(|| ("-".to_string(), 0.0));

    Ok(BobView {
        rows: table,
        chart,
        summary: BobSummary {
            total_bob: format_number(total_bob, 0),
            total_self: format_number(total_self, 0),
            total_grand: format_number(total_grand, 0),
            avg_cs: format_percent(avg_cs),
            best_month,
            best_month_value: format_number(best_value, 0),
        },
        review_sections: REVIEW_SECTIONS
            .iter()
            .map(|&(key, label)| ReviewSection { key, label })
            .collect(),
        reviews: review_rows.iter().filter_map(parse_review_row).collect(),
    })
}

fn canonical_row(row: &Row) -> Row {
    row.renamed(|name| {
        let key = name.trim().to_lowercase();
        COLUMN_VARIANTS
            .iter()
            .find(|(variant, _)| *variant == key)
            .map(|(_, canonical)| canonical.to_string())
    })
}

fn parse_review_row(row: &Row) -> Option<Review> {
    let sections: Vec<(&'static str, Vec<ReviewChunk>)> = REVIEW_SECTIONS
        .iter()
        .map(|&(key, label)| {
            let chunks = row
                .cells()
                .iter()
                .find(|(column, _)| column.trim().eq_ignore_ascii_case(label))
                .map(|(_, value)| parse_review_text(&value.as_text()))
                .unwrap_or_default();
            (key, chunks)
        })
        .collect();

    sections
        .iter()
        .any(|(_, chunks)| !chunks.is_empty())
        .then_some(Review { sections })
}

/// Split free text into bullet and plain chunks, one per non-blank line.
pub fn parse_review_text(text: &str) -> Vec<ReviewChunk> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            match BULLET_MARKERS.iter().find_map(|marker| line.strip_prefix(marker)) {
                Some(rest) => ReviewChunk::Bullet(rest.trim_start().to_string()),
                None => ReviewChunk::Text(line.to_string()),
            }
        })
        .collect()
}
