//! Page view models.
//!
//! Every dashboard page is a pure function of its worksheet rows (plus an
//! optional companion worksheet). Nothing here touches the cache or the
//! source, so building a page twice from the same rows gives the same view.
//!
//! Modules:
//! - executive: executive summary + brand promise
//! - value_map: full-price and promo value proposition maps
//! - okr: OKR comparison by team and year
//! - org_chart: reporting tree
//! - finance: P&L, e-commerce comparison and target
//! - bob: BOB order split and review notes
//! - reports: profit per X, cost per X, financial review
//! - strategy: trajectories, DNA, roadmap, SWOT, strategy plan
//! - operations: operation health, FNA performance
//! - products: top product forecasts with offers
//! - tables: pass-through tables

pub mod bob;
pub mod executive;
pub mod finance;
pub mod okr;
pub mod operations;
pub mod org_chart;
pub mod products;
pub mod reports;
pub mod strategy;
pub mod tables;
pub mod value_map;

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DashboardError;
use crate::types::Row;

/// One dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    ExecutiveSummary,
    ValueMap,
    ValueMapPromo,
    Okr,
    OrgStructure,
    ProfitAndLoss,
    EcomComparison,
    EcomTarget,
    FinancialReview,
    ProfitPerX,
    CostPerX,
    Trajectories,
    Dna,
    Roadmap,
    Swot,
    StrategyPlan,
    OperationHealth,
    FnaPerformance,
    TopProduct,
    TopProductPromo,
    Bob,
    Segments,
    RetailSwiftOnline,
}

impl Page {
    pub const ALL: &'static [Page] = &[
        Page::ExecutiveSummary,
        Page::ValueMap,
        Page::ValueMapPromo,
        Page::Okr,
        Page::OrgStructure,
        Page::ProfitAndLoss,
        Page::EcomComparison,
        Page::EcomTarget,
        Page::FinancialReview,
        Page::ProfitPerX,
        Page::CostPerX,
        Page::Trajectories,
        Page::Dna,
        Page::Roadmap,
        Page::Swot,
        Page::StrategyPlan,
        Page::OperationHealth,
        Page::FnaPerformance,
        Page::TopProduct,
        Page::TopProductPromo,
        Page::Bob,
        Page::Segments,
        Page::RetailSwiftOnline,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::ExecutiveSummary => "executive_summary",
            Page::ValueMap => "value_map",
            Page::ValueMapPromo => "value_map_promo",
            Page::Okr => "okr",
            Page::OrgStructure => "org_structure",
            Page::ProfitAndLoss => "profit_n_loss",
            Page::EcomComparison => "ecom_comparison",
            Page::EcomTarget => "ecom_target",
            Page::FinancialReview => "financial_review",
            Page::ProfitPerX => "profit_per_x",
            Page::CostPerX => "cost_per_x",
            Page::Trajectories => "trajectories",
            Page::Dna => "dna",
            Page::Roadmap => "roadmap",
            Page::Swot => "swot",
            Page::StrategyPlan => "strategy_plan",
            Page::OperationHealth => "operation_health",
            Page::FnaPerformance => "fna_performance",
            Page::TopProduct => "top_product",
            Page::TopProductPromo => "top_product_promo",
            Page::Bob => "bob",
            Page::Segments => "segments",
            Page::RetailSwiftOnline => "retail_swift_online",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::ExecutiveSummary => "Executive Summary",
            Page::ValueMap => "Value Proposition (Full Price)",
            Page::ValueMapPromo => "Value Proposition (Promo Price)",
            Page::Okr => "OKR Dashboard: 2025 vs 2026",
            Page::OrgStructure => "Organizational Structure",
            Page::ProfitAndLoss => "Profit & Loss",
            Page::EcomComparison | Page::EcomTarget => "E-commerce Performance",
            Page::FinancialReview => "Financial Review",
            Page::ProfitPerX => "Profit per X",
            Page::CostPerX => "Cost per X",
            Page::Trajectories => "Trajectories & Strategic Insights",
            Page::Dna => "Organizational DNA",
            Page::Roadmap => "Roadmap",
            Page::Swot => "SWOT",
            Page::StrategyPlan => "2026 Strategy Plan",
            Page::OperationHealth => "Operations Health",
            Page::FnaPerformance => "FNA Performance",
            Page::TopProduct => "Top 10 Product Forecast",
            Page::TopProductPromo => "Top 10 Product Promo Forecast",
            Page::Bob => "BOB Performance",
            Page::Segments => "Core & New Segments",
            Page::RetailSwiftOnline => "Retail Swift Online",
        }
    }

    /// Worksheet the page is built from. Resolved through the alias table.
    pub fn worksheet(self) -> &'static str {
        match self {
            Page::ExecutiveSummary => "exe_summary",
            Page::ValueMap => "value_map",
            Page::ValueMapPromo => "value_map_promo",
            Page::Okr => "okr",
            Page::OrgStructure => "org_chart",
            Page::ProfitAndLoss => "P&L",
            Page::EcomComparison => "ecom 2024 vs 2025",
            Page::EcomTarget => "2026 Ecom Target",
            Page::FinancialReview => "Financial Review 25",
            Page::ProfitPerX => "Profit per X",
            Page::CostPerX => "Cost per X",
            Page::Trajectories => "trajectories",
            Page::Dna => "dna",
            Page::Roadmap => "roadmap",
            Page::Swot => "swot",
            Page::StrategyPlan => "2026 Strategy plan",
            Page::OperationHealth => "operation_health",
            Page::FnaPerformance => "fna_performance",
            Page::TopProduct => "top_product",
            Page::TopProductPromo => "top_product_promo",
            Page::Bob => "BOB",
            Page::Segments => "Core -New segments",
            Page::RetailSwiftOnline => "Retail_Swift_Online",
        }
    }

    /// Optional second worksheet. A missing companion reads as empty.
    pub fn companion_worksheet(self) -> Option<&'static str> {
        match self {
            Page::ExecutiveSummary => Some("brand_promise"),
            Page::TopProduct | Page::TopProductPromo => Some("three_offer"),
            Page::Bob => Some("BOB_review"),
            _ => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Page {
    type Err = DashboardError;

    /// Accepts the slug in any case, with `-` in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Page::ALL
            .iter()
            .copied()
            .find(|page| page.slug() == wanted)
            .ok_or_else(|| {
                DashboardError::Configuration(format!(
                    "Unknown page '{}'. Run `insightboard pages` for the list.",
                    s.trim()
                ))
            })
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

/// Rows a page is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct PageSheets<'a> {
    pub primary: &'a [Row],
    /// `None` when the page has no companion or the tab is missing.
    pub companion: Option<&'a [Row]>,
}

impl<'a> PageSheets<'a> {
    pub fn new(primary: &'a [Row]) -> Self {
        Self {
            primary,
            companion: None,
        }
    }

    pub fn with_companion(mut self, companion: &'a [Row]) -> Self {
        self.companion = Some(companion);
        self
    }

    fn companion_rows(&self) -> &'a [Row] {
        self.companion.unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ViewModel {
    ExecutiveSummary(executive::ExecutiveSummaryView),
    ValueMap(value_map::ValueMapView),
    Okr(okr::OkrView),
    OrgChart(org_chart::OrgChartView),
    ProfitAndLoss(finance::ProfitAndLossView),
    EcomComparison(finance::EcomComparisonView),
    EcomTarget(finance::EcomTargetView),
    FinancialReview(reports::FinancialReviewView),
    ProfitPerX(reports::ProfitPerXView),
    CostPerX(reports::CostPerXView),
    Trajectories(strategy::TrajectoriesView),
    Dna(strategy::DnaView),
    Roadmap(strategy::RoadmapView),
    Swot(strategy::SwotView),
    StrategyPlan(strategy::StrategyPlanView),
    OperationHealth(operations::OperationHealthView),
    FnaPerformance(operations::FnaPerformanceView),
    TopProduct(products::TopProductView),
    Bob(bob::BobView),
    Table(tables::TableView),
}

/// Build the view model of `page` from its worksheet rows.
///
/// An empty primary worksheet yields an empty view; otherwise missing
/// required columns fail with `SchemaMismatch` and no view is produced.
pub fn assemble(page: Page, sheets: &PageSheets<'_>) -> Result<ViewModel, DashboardError> {
    let rows = sheets.primary;
    let companion = sheets.companion_rows();
    let worksheet = page.worksheet();

    let view = match page {
        Page::ExecutiveSummary => {
            ViewModel::ExecutiveSummary(executive::build(worksheet, rows, companion)?)
        }
        Page::ValueMap => {
            ViewModel::ValueMap(value_map::build(worksheet, rows, value_map::Variant::FullPrice)?)
        }
        Page::ValueMapPromo => {
            ViewModel::ValueMap(value_map::build(worksheet, rows, value_map::Variant::Promo)?)
        }
        Page::Okr => ViewModel::Okr(okr::build(worksheet, rows)?),
        Page::OrgStructure => ViewModel::OrgChart(org_chart::build(worksheet, rows)?),
        Page::ProfitAndLoss => ViewModel::ProfitAndLoss(finance::profit_and_loss(worksheet, rows)?),
        Page::EcomComparison => {
            ViewModel::EcomComparison(finance::ecom_comparison(worksheet, rows)?)
        }
        Page::EcomTarget => ViewModel::EcomTarget(finance::ecom_target(rows)),
        Page::FinancialReview => ViewModel::FinancialReview(reports::financial_review(rows)),
        Page::ProfitPerX => ViewModel::ProfitPerX(reports::profit_per_x(rows)),
        Page::CostPerX => ViewModel::CostPerX(reports::cost_per_x(rows)),
        Page::Trajectories => ViewModel::Trajectories(strategy::trajectories(worksheet, rows)?),
        Page::Dna => ViewModel::Dna(strategy::dna(worksheet, rows)?),
        Page::Roadmap => ViewModel::Roadmap(strategy::roadmap(worksheet, rows)?),
        Page::Swot => ViewModel::Swot(strategy::swot(worksheet, rows)?),
        Page::StrategyPlan => ViewModel::StrategyPlan(strategy::strategy_plan(rows)),
        Page::OperationHealth => {
            ViewModel::OperationHealth(operations::operation_health(worksheet, rows)?)
        }
        Page::FnaPerformance => ViewModel::FnaPerformance(operations::fna_performance(rows)),
        Page::TopProduct | Page::TopProductPromo => {
            ViewModel::TopProduct(products::build(worksheet, rows, companion)?)
        }
        Page::Bob => ViewModel::Bob(bob::build(worksheet, rows, companion)?),
        Page::Segments | Page::RetailSwiftOnline => ViewModel::Table(tables::build(rows)),
    };
    Ok(view)
}

/// Fail with `SchemaMismatch` when `rows` lack any of `required`.
///
/// Every row carries the full header, so the first row is checked.
/// Column names match case-insensitively. No rows, no check.
pub fn require_columns(
    worksheet: &str,
    rows: &[Row],
    required: &[&str],
) -> Result<(), DashboardError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !first.has_column(column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::SchemaMismatch {
            worksheet: worksheet.to_string(),
            missing,
        })
    }
}

/// Named bucket of items, serialized as `{ "name": .., "items": [..] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<T> {
    pub name: String,
    pub items: Vec<T>,
}

/// Group items by key, keeping groups in first-seen order.
pub fn group_in_order<T>(items: impl IntoIterator<Item = (String, T)>) -> Vec<Group<T>> {
    let mut groups: Vec<Group<T>> = Vec::new();
    for (key, item) in items {
        match groups.iter_mut().find(|g| g.name == key) {
            Some(group) => group.items.push(item),
            None => groups.push(Group {
                name: key,
                items: vec![item],
            }),
        }
    }
    groups
}

/// Column names in header order, taken from the first row.
pub fn header_columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default()
}
