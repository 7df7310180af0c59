//! Value proposition canvas (full-price and promo variants).

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::require_columns;
use crate::error::DashboardError;
use crate::types::{CellValue, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    FullPrice,
    Promo,
}

impl Variant {
    fn product_category(self) -> &'static str {
        match self {
            Variant::FullPrice => "top-performing full-price brands",
            Variant::Promo => "top promo brands (actual performance):",
        }
    }

    fn service_categories(self) -> &'static [&'static str] {
        match self {
            Variant::FullPrice => &[
                "delivery",
                "return",
                "customer service",
                "delivery tracking",
                "service",
            ],
            Variant::Promo => &[
                "cod",
                "return",
                "customer service",
                "delivery tracking",
                "service",
            ],
        }
    }

    fn demographic_categories(self) -> &'static [&'static str] {
        match self {
            Variant::FullPrice => &[
                "core customer demo",
                "core customer geo",
                "core customer demo + geo",
            ],
            Variant::Promo => &[
                "new customer demo",
                "new customer geo",
                "new customer demo + geo",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMapView {
    pub variant: Variant,
    pub pains: Vec<Row>,
    pub relievers: Vec<Row>,
    pub gains: Vec<Row>,
    pub creators: Vec<Row>,
    pub activities: Vec<Row>,
    pub products: Vec<Row>,
    pub services: Vec<Row>,
    pub demographics: Vec<Row>,
    pub jobs_to_be_done: Vec<Row>,
}

const KEY_IDENTIFIER: &str = "Key_Identifier";
const HEADLINE: &str = "Value/Headline";
const DETAILS: &str = "Details/Rationale";
const CATEGORY: &str = "Content_Category";

pub fn build(
    worksheet: &str,
    rows: &[Row],
    variant: Variant,
) -> Result<ValueMapView, DashboardError> {
    require_columns(worksheet, rows, &["Category"])?;

    let mut view = ValueMapView {
        variant,
        pains: Vec::new(),
        relievers: Vec::new(),
        gains: Vec::new(),
        creators: Vec::new(),
        activities: Vec::new(),
        products: Vec::new(),
        services: Vec::new(),
        demographics: Vec::new(),
        jobs_to_be_done: Vec::new(),
    };

    for row in rows {
        let item = canonical_row(row);
        let category = item.text(CATEGORY).to_lowercase();
        let bucket = match category.as_str() {
            "pain" => &mut view.pains,
            "pain reliever" => &mut view.relievers,
            "gain" => &mut view.gains,
            "gain creator" => &mut view.creators,
            "activity" => &mut view.activities,
            c if c == variant.product_category() => &mut view.products,
            c if variant.service_categories().contains(&c) => &mut view.services,
            c if variant.demographic_categories().contains(&c) => &mut view.demographics,
            c if is_jobs_to_be_done(c) => &mut view.jobs_to_be_done,
            _ => continue,
        };
        bucket.push(item);
    }

    Ok(view)
}

/// Rename sheet headers to the canvas fields.
///
/// Spaces in headers become underscores; `Highlight` wins over
/// `Current_Status` for the details text.
fn canonical_row(row: &Row) -> Row {
    let underscored = row.renamed(|name| Some(name.replace(' ', "_")));
    let details = underscored.first_text(&["Highlight", "Current_Status"]);

    let mut item = underscored.renamed(|name| match name {
        "Point" => Some(KEY_IDENTIFIER.to_string()),
        "Key_Insight" => Some(HEADLINE.to_string()),
        "Category" => Some(CATEGORY.to_string()),
        _ => None,
    });
    item.insert(DETAILS, CellValue::from(details));
    item.ensure_columns(&[KEY_IDENTIFIER, HEADLINE]);
    item
}

/// Variants of "jobs to be done" seen in category cells.
fn is_jobs_to_be_done(category: &str) -> bool {
    static JUST_WORD: OnceLock<Regex> = OnceLock::new();
    static DONE_HINT: OnceLock<Regex> = OnceLock::new();
    let just_word = JUST_WORD.get_or_init(|| Regex::new(r"\bjust\b").expect("valid regex"));
    let done_hint = DONE_HINT.get_or_init(|| Regex::new(r"done|to be done|tbd|jtbd").expect("valid regex"));

    (just_word.is_match(category) && done_hint.is_match(category))
        || category == "just"
        || category.contains("jtbd")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, point: &str) -> Row {
        Row::new()
            .with("Category", category)
            .with("Point", point)
            .with("Key Insight", format!("{point} headline"))
            .with("Highlight", "")
            .with("Current Status", "tracking")
    }

    #[test]
    fn test_rows_bucketed_by_category() {
        let rows = vec![
            row("Pain", "P1"),
            row(" pain reliever ", "R1"),
            row("Gain", "G1"),
            row("Gain Creator", "C1"),
            row("Activity", "A1"),
            row("Top-performing full-price brands", "B1"),
            row("Delivery Tracking", "S1"),
            row("Core customer demo + geo", "D1"),
            row("Just to be done", "J1"),
            row("Unrelated", "X1"),
        ];
        let view = build("value_map", &rows, Variant::FullPrice).unwrap();
        assert_eq!(view.pains.len(), 1);
        assert_eq!(view.relievers.len(), 1);
        assert_eq!(view.gains.len(), 1);
        assert_eq!(view.creators.len(), 1);
        assert_eq!(view.activities.len(), 1);
        assert_eq!(view.products.len(), 1);
        assert_eq!(view.services.len(), 1);
        assert_eq!(view.demographics.len(), 1);
        assert_eq!(view.jobs_to_be_done.len(), 1);
    }

    #[test]
    fn test_fields_renamed_for_canvas() {
        let view = build("value_map", &[row("Pain", "P1")], Variant::FullPrice).unwrap();
        let pain = &view.pains[0];
        assert_eq!(pain.text(KEY_IDENTIFIER), "P1");
        assert_eq!(pain.text(HEADLINE), "P1 headline");
        // Highlight is blank, so the status text is used.
        assert_eq!(pain.text(DETAILS), "tracking");
        assert_eq!(pain.text(CATEGORY), "Pain");
    }

    #[test]
    fn test_highlight_preferred_over_status() {
        let rows = vec![row("Gain", "G1").with("Highlight", "Repeat buyers")];
        let view = build("value_map", &rows, Variant::FullPrice).unwrap();
        assert_eq!(view.gains[0].text(DETAILS), "Repeat buyers");
    }

    #[test]
    fn test_promo_variant_uses_its_own_categories() {
        let rows = vec![
            row("COD", "S1"),
            row("Delivery", "S2"),
            row("Top promo brands (actual performance):", "B1"),
            row("New customer geo", "D1"),
        ];
        let view = build("value_map_promo", &rows, Variant::Promo).unwrap();
        assert_eq!(view.services.len(), 1);
        assert_eq!(view.services[0].text(KEY_IDENTIFIER), "S1");
        assert_eq!(view.products.len(), 1);
        assert_eq!(view.demographics.len(), 1);
    }

    #[test]
    fn test_jobs_to_be_done_variants() {
        assert!(is_jobs_to_be_done("just to be done"));
        assert!(is_jobs_to_be_done("just"));
        assert!(is_jobs_to_be_done("customer jtbd"));
        assert!(is_jobs_to_be_done("jobs just done"));
        assert!(!is_jobs_to_be_done("justice done"));
        assert!(!is_jobs_to_be_done("pain"));
    }

    #[test]
    fn test_missing_category_column() {
        let rows = vec![Row::new().with("Point", "P1")];
        assert!(build("value_map", &rows, Variant::FullPrice).is_err());
    }
}
