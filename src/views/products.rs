//! Top product forecasts with per-product offers from `three_offer`.

use std::collections::BTreeMap;

use serde::Serialize;

use super::require_columns;
use crate::error::DashboardError;
use crate::types::{CellValue, Row};
use crate::util::match_key;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductView {
    pub rows: Vec<Row>,
    /// Product key (lowercased, trimmed name) -> up to three offers.
    pub offers_by_product: BTreeMap<String, Vec<Offer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub title: String,
    pub img: String,
    pub label: String,
}

const NUMERIC_COLUMNS: &[&str] = &[
    "Current_Qty",
    "Sale_Total",
    "Q1_Forecast",
    "Q2_Forecast",
    "Q3_Forecast",
    "Q4_Forecast",
];

const PRODUCT_COLUMNS: &[&str] = &[
    "No",
    "Product",
    "Current_Qty",
    "Sale_Total",
    "Insight",
    "Strategy_Focus",
    "Q1_Forecast",
    "Q2_Forecast",
    "Q3_Forecast",
    "Q4_Forecast",
    "Image_URL",
];

const PRODUCT_KEY: &str = "ProductKey";
const MAX_OFFERS: usize = 3;

pub fn build(
    worksheet: &str,
    rows: &[Row],
    offer_rows: &[Row],
) -> Result<TopProductView, DashboardError> {
    let rows: Vec<Row> = rows.iter().map(|row| row.renamed(product_column)).collect();
    require_columns(worksheet, &rows, &["Product"])?;

    let rows = rows
        .into_iter()
        .map(|mut row| {
            for column in NUMERIC_COLUMNS {
                if row.has_column(column) {
                    let value = row
                        .plain_number(column)
                        .map(CellValue::Number)
                        .unwrap_or_default();
                    row.insert(column, value);
                }
            }
            row.ensure_columns(PRODUCT_COLUMNS);
            let key = match_key(&row.text("Product"));
            row.insert(PRODUCT_KEY, CellValue::from(key));
            row
        })
        .collect();

    Ok(TopProductView {
        rows,
        offers_by_product: offers_by_product(offer_rows),
    })
}

/// Map a sheet header onto the forecast fields. First match wins.
fn product_column(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    let canonical = if lower.contains("qty") {
        "Current_Qty"
    } else if lower.contains("insight") {
        "Insight"
    } else if lower.contains("action") {
        "Strategy_Focus"
    } else if lower == "no" {
        "No"
    } else if lower == "product" {
        "Product"
    } else if lower.contains("sale") {
        "Sale_Total"
    } else if lower.contains("q1") {
        "Q1_Forecast"
    } else if lower.contains("q2") {
        "Q2_Forecast"
    } else if lower.contains("q3") {
        "Q3_Forecast"
    } else if lower.contains("q4") {
        "Q4_Forecast"
    } else if lower.contains("image") {
        "Image_URL"
    } else {
        return None;
    };
    Some(canonical.to_string())
}

fn offers_by_product(offer_rows: &[Row]) -> BTreeMap<String, Vec<Offer>> {
    let mut offers: BTreeMap<String, Vec<Offer>> = BTreeMap::new();
    for row in offer_rows {
        let product = row.text("Product");
        if product.is_empty() {
            continue;
        }
        let entry = offers.entry(match_key(&product)).or_default();
        if entry.len() >= MAX_OFFERS {
            continue;
        }
        entry.push(Offer {
            title: non_empty_or(row.text("Offer"), "Offer details coming soon"),
            img: row.text("Photo_URL"),
            label: non_empty_or(row.text("Offer_Product"), "Offer"),
        });
    }
    offers
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_rows() -> Vec<Row> {
        vec![
            Row::new()
                .with("No", 1.0)
                .with("Product", " Glow Serum ")
                .with("2025 Qty", "1,250")
                .with("Sale Amount", "3,400,000")
                .with("Key Insight", "Top repeat item")
                .with("Action Plan", "Bundle with toner")
                .with("Q1 2026", 300.0)
                .with("Q2 2026", "n/a")
                .with("Image", "https://img/serum.png"),
            Row::new()
                .with("No", 2.0)
                .with("Product", "Sun Gel")
                .with("2025 Qty", "")
                .with("Sale Amount", 900.0)
                .with("Key Insight", "")
                .with("Action Plan", "")
                .with("Q1 2026", "")
                .with("Q2 2026", "")
                .with("Image", ""),
        ]
    }

    #[test]
    fn test_headers_renamed_and_numbers_parsed() {
        let view = build("top_product", &product_rows(), &[]).unwrap();
        let serum = &view.rows[0];
        assert_eq!(serum.get("Current_Qty"), Some(&CellValue::Number(1250.0)));
        assert_eq!(serum.get("Sale_Total"), Some(&CellValue::Number(3_400_000.0)));
        assert_eq!(serum.get("Q1_Forecast"), Some(&CellValue::Number(300.0)));
        assert_eq!(serum.get("Q2_Forecast"), Some(&CellValue::Empty));
        assert_eq!(serum.text("Insight"), "Top repeat item");
        assert_eq!(serum.text("Strategy_Focus"), "Bundle with toner");
        assert_eq!(serum.text("Image_URL"), "https://img/serum.png");
        assert_eq!(serum.text(PRODUCT_KEY), "glow serum");
        // Columns the sheet lacks still exist, empty.
        assert!(serum.has_column("Q4_Forecast"));
        assert!(serum.get("Q4_Forecast").is_some_and(CellValue::is_empty));
    }

    #[test]
    fn test_offers_matched_and_capped() {
        let offers = vec![
            Row::new().with("Product", "GLOW SERUM").with("Offer", "Buy 1 get 1").with("Offer_Product", "Toner").with("Photo_URL", "https://img/toner.png"),
            Row::new().with("Product", "glow serum").with("Offer", "").with("Offer_Product", ""),
            Row::new().with("Product", "Glow Serum").with("Offer", "Free pouch"),
            Row::new().with("Product", "Glow Serum").with("Offer", "Fourth offer"),
            Row::new().with("Product", "").with("Offer", "orphan"),
        ];
        let view = build("top_product", &product_rows(), &offers).unwrap();

        let serum = &view.offers_by_product["glow serum"];
        assert_eq!(serum.len(), 3);
        assert_eq!(
            serum[0],
            Offer {
                title: "Buy 1 get 1".into(),
                img: "https://img/toner.png".into(),
                label: "Toner".into(),
            }
        );
        assert_eq!(serum[1].title, "Offer details coming soon");
        assert_eq!(serum[1].label, "Offer");
        assert_eq!(view.offers_by_product.len(), 1);
    }

    #[test]
    fn test_requires_product_column() {
        let rows = vec![Row::new().with("Item", "Serum")];
        assert!(matches!(
            build("top_product", &rows, &[]),
            Err(DashboardError::SchemaMismatch { .. })
        ));
    }
}
