//! Strategy pages: trajectories, organizational DNA, roadmap, SWOT and
//! the yearly strategy plan.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{group_in_order, require_columns, Group};
use crate::error::DashboardError;
use crate::types::Row;
use crate::util::clean_latex_math;

// ============================================================================
// Trajectories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoriesView {
    /// `T<n>` rows.
    pub trajectories: Vec<Row>,
    /// `S<n>` rows.
    pub summary: Vec<Row>,
}

pub fn trajectories(worksheet: &str, rows: &[Row]) -> Result<TrajectoriesView, DashboardError> {
    require_columns(worksheet, rows, &["Section_ID"])?;

    let mut view = TrajectoriesView {
        trajectories: Vec::new(),
        summary: Vec::new(),
    };
    for row in rows {
        let id = row.text("Section_ID");
        if is_numbered(&id, 'T') {
            view.trajectories.push(row.clone());
        } else if is_numbered(&id, 'S') {
            view.summary.push(row.clone());
        }
    }
    Ok(view)
}

/// `T1`, `S12`: the prefix followed by at least one digit and nothing else.
fn is_numbered(id: &str, prefix: char) -> bool {
    id.strip_prefix(prefix)
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

// ============================================================================
// DNA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnaView {
    pub core_values: Vec<DnaPoint>,
    pub hygiene_factors: Vec<DnaPoint>,
    pub motivation_factors: Vec<DnaPoint>,
    pub strategic_insight: Vec<DnaPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnaPoint {
    pub point_id: String,
    pub key_item: String,
    pub dna: String,
    pub details: String,
    /// `Content_Area` as written in the sheet.
    pub area: String,
}

pub fn dna(worksheet: &str, rows: &[Row]) -> Result<DnaView, DashboardError> {
    require_columns(worksheet, rows, &["Content_Area", "Point_ID"])?;

    let mut view = DnaView {
        core_values: Vec::new(),
        hygiene_factors: Vec::new(),
        motivation_factors: Vec::new(),
        strategic_insight: Vec::new(),
    };

    for row in rows {
        let area = row.text("Content_Area");
        let section = match area.to_lowercase().as_str() {
            "core values" => &mut view.core_values,
            "hygiene factors" => &mut view.hygiene_factors,
            "motivation factors" => &mut view.motivation_factors,
            "strategic insight" => &mut view.strategic_insight,
            _ => continue,
        };
        section.push(DnaPoint {
            point_id: row.text("Point_ID"),
            key_item: row.text("Key_Item"),
            dna: clean_latex_math(&row.text("DNA")),
            details: clean_latex_math(&row.text("Details/Data_Alignment")),
            area,
        });
    }

    for section in [
        &mut view.core_values,
        &mut view.hygiene_factors,
        &mut view.motivation_factors,
        &mut view.strategic_insight,
    ] {
        section.sort_by_cached_key(|point| point_sort_key(&point.point_id));
    }
    Ok(view)
}

/// `V`, `H` and `M` ids first (numerically), then everything else by text.
fn point_sort_key(id: &str) -> (u8, u64, String) {
    let rank = match id.chars().next() {
        Some('V') => 0,
        Some('H') => 1,
        Some('M') => 2,
        _ => return (3, 0, id.to_string()),
    };
    let number = id[1..].parse().unwrap_or(0);
    (rank, number, String::new())
}

// ============================================================================
// Roadmap
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapView {
    /// Sorted by quarter label.
    pub quarters: Vec<Group<RoadmapItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItem {
    pub activity_id: String,
    pub topic: String,
    pub owner: String,
}

pub fn roadmap(worksheet: &str, rows: &[Row]) -> Result<RoadmapView, DashboardError> {
    require_columns(worksheet, rows, &["Quarter"])?;

    let mut quarters: BTreeMap<String, Vec<RoadmapItem>> = BTreeMap::new();
    for row in rows {
        let quarter = match row.text("Quarter") {
            q if q.is_empty() => "Unassigned".to_string(),
            q => q,
        };
        quarters.entry(quarter).or_default().push(RoadmapItem {
            activity_id: row.first_text(&["Activity_ID", "Activity ID"]),
            topic: row.first_text(&["Key Topic", "Key_Topic", "Key Activity"]),
            owner: row.text("Owner"),
        });
    }

    Ok(RoadmapView {
        quarters: quarters
            .into_iter()
            .map(|(name, items)| Group { name, items })
            .collect(),
    })
}

// ============================================================================
// SWOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwotView {
    /// Categories in first-seen order.
    pub sections: Vec<Group<SwotPoint>>,
    pub key_insights: Vec<KeyInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwotPoint {
    pub id: String,
    pub title: String,
    pub details_2025: String,
    pub details_2026: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyInsight {
    pub title: String,
    pub content: String,
}

pub fn swot(worksheet: &str, rows: &[Row]) -> Result<SwotView, DashboardError> {
    require_columns(worksheet, rows, &["Category"])?;

    let mut key_insights = Vec::new();
    let mut points = Vec::new();

    for row in rows {
        let category = row.text("Category");
        if category.is_empty() {
            continue;
        }
        let id = row.text("Point_ID");
        let title = row.first_text(&["Key_Item", "Key Item"]);
        let details_2025 = row.first_text(&["2025", "2025 Insight"]);
        let details_2026 = row.first_text(&["2026", "2026 Strategy"]);

        if category.eq_ignore_ascii_case("key insight") {
            let content = [details_2025, details_2026, id]
                .into_iter()
                .find(|text| !text.is_empty())
                .unwrap_or_default();
            key_insights.push(KeyInsight { title, content });
            continue;
        }

        points.push((
            category,
            SwotPoint {
                id,
                title,
                details_2025,
                details_2026,
            },
        ));
    }

    Ok(SwotView {
        sections: group_in_order(points),
        key_insights,
    })
}

// ============================================================================
// Strategy plan
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlanView {
    /// Last goal seen in the sheet.
    pub goal: String,
    /// Pillars in first-seen order.
    pub pillars: Vec<Group<StrategyAction>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAction {
    pub goal: String,
    pub phase: String,
    pub quarter: String,
    pub action: String,
    pub photos: Vec<String>,
}

const DEFAULT_GOAL: &str = "2026 Strategy Plan";

pub fn strategy_plan(rows: &[Row]) -> StrategyPlanView {
    let mut current_goal = String::new();
    let mut actions = Vec::with_capacity(rows.len());

    for row in rows {
        let goal = row.text("Goal");
        if !goal.is_empty() {
            current_goal = goal;
        }
        let pillar = match row.text("Strategy Pillar") {
            p if p.is_empty() => "General".to_string(),
            p => p,
        };
        let photos = ["Photo_URL 1", "Photo_URL 2", "Photo_URL 3"]
            .iter()
            .map(|column| row.text(column))
            .filter(|url| !url.is_empty())
            .collect();

        actions.push((
            pillar,
            StrategyAction {
                goal: current_goal.clone(),
                phase: row.text("Phase"),
                quarter: row.text("Quarter"),
                action: row.text("Action"),
                photos,
            },
        ));
    }

    StrategyPlanView {
        goal: if current_goal.is_empty() {
            DEFAULT_GOAL.to_string()
        } else {
            current_goal
        },
        pillars: group_in_order(actions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectories_split_by_section_id() {
        let rows = vec![
            Row::new().with("Section_ID", "T1").with("Title", "Grow online"),
            Row::new().with("Section_ID", "S1").with("Title", "Summary"),
            Row::new().with("Section_ID", "T").with("Title", "bare prefix"),
            Row::new().with("Section_ID", "T2b").with("Title", "suffix"),
            Row::new().with("Section_ID", "T12").with("Title", "Twelve"),
            Row::new().with("Section_ID", "").with("Title", "blank"),
        ];
        let view = trajectories("trajectories", &rows).unwrap();
        assert_eq!(view.trajectories.len(), 2);
        assert_eq!(view.trajectories[1].text("Title"), "Twelve");
        assert_eq!(view.summary.len(), 1);
    }

    #[test]
    fn test_trajectories_requires_section_id() {
        let rows = vec![Row::new().with("Title", "x")];
        assert!(trajectories("trajectories", &rows).is_err());
    }

    fn dna_row(area: &str, id: &str, dna: &str) -> Row {
        Row::new()
            .with("Content_Area", area)
            .with("Point_ID", id)
            .with("Key_Item", format!("item {id}"))
            .with("DNA", dna)
            .with("Details/Data_Alignment", "")
    }

    #[test]
    fn test_dna_sections_sorted_and_cleaned() {
        let rows = vec![
            dna_row("Core Values", "V10", "Ten"),
            dna_row("core values", "V2", "$\\mathbf{Own}$ it"),
            dna_row("Core Values", "X1", "other"),
            dna_row("Hygiene Factors", "H1", "Pay \\rightarrow on time"),
            dna_row("Motivation Factors", "M3", "Growth"),
            dna_row("Strategic Insight", "SI", "Insight"),
            dna_row("Unknown", "V1", "dropped"),
        ];
        let view = dna("dna", &rows).unwrap();
        let ids: Vec<&str> = view.core_values.iter().map(|p| p.point_id.as_str()).collect();
        assert_eq!(ids, vec!["V2", "V10", "X1"]);
        assert_eq!(view.core_values[0].dna, "Own it");
        assert_eq!(view.core_values[0].area, "core values");
        assert_eq!(view.hygiene_factors[0].dna, "Pay → on time");
        assert_eq!(view.motivation_factors.len(), 1);
        assert_eq!(view.strategic_insight.len(), 1);
    }

    #[test]
    fn test_point_sort_key_orders_prefixes() {
        let mut ids = vec!["Z1", "M1", "H2", "V3", "H1", "A"];
        ids.sort_by_key(|id| point_sort_key(id));
        assert_eq!(ids, vec!["V3", "H1", "H2", "M1", "A", "Z1"]);
    }

    #[test]
    fn test_roadmap_grouped_by_sorted_quarter() {
        let rows = vec![
            Row::new()
                .with("Quarter", "Q2")
                .with("Activity ID", "A-3")
                .with("Key Activity", "Loyalty launch")
                .with("owner", "Mya"),
            Row::new()
                .with("Quarter", "Q1")
                .with("Activity ID", "A-1")
                .with("Key Topic", "Warehouse move"),
            Row::new().with("Quarter", "").with("Activity ID", "A-9"),
        ];
        let view = roadmap("roadmap", &rows).unwrap();
        let quarters: Vec<&str> = view.quarters.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(quarters, vec!["Q1", "Q2", "Unassigned"]);
        let q2 = &view.quarters[1].items[0];
        assert_eq!(q2.activity_id, "A-3");
        assert_eq!(q2.topic, "Loyalty launch");
        assert_eq!(q2.owner, "Mya");
        assert_eq!(view.quarters[0].items[0].topic, "Warehouse move");
    }

    #[test]
    fn test_swot_sections_and_key_insights() {
        let rows = vec![
            Row::new()
                .with("Category", "Weakness")
                .with("Point_ID", "W1")
                .with("Key_Item", "Slow delivery")
                .with("2025", "4 days")
                .with("2026", "2 days"),
            Row::new()
                .with("Category", "Strength")
                .with("Point_ID", "S1")
                .with("Key_Item", "Brand"),
            Row::new()
                .with("Category", "Key Insight")
                .with("Point_ID", "K1")
                .with("Key_Item", "Speed wins")
                .with("2025", "")
                .with("2026", "Same-day in Yangon"),
            Row::new().with("Category", "").with("Key_Item", "skipped"),
            Row::new().with("Category", "Weakness").with("Point_ID", "W2"),
        ];
        let view = swot("swot", &rows).unwrap();
        let names: Vec<&str> = view.sections.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Weakness", "Strength"]);
        assert_eq!(view.sections[0].items.len(), 2);
        assert_eq!(view.sections[0].items[0].details_2026, "2 days");
        assert_eq!(
            view.key_insights,
            vec![KeyInsight {
                title: "Speed wins".into(),
                content: "Same-day in Yangon".into(),
            }]
        );
    }

    #[test]
    fn test_strategy_plan_goal_carried_forward() {
        let rows = vec![
            Row::new()
                .with("Goal", "Double online revenue")
                .with("Strategy Pillar", "Growth")
                .with("Action", "Launch app")
                .with("Photo_URL 1", "https://img/1.png")
                .with("Photo_URL 2", "")
                .with("Photo_URL 3", "https://img/3.png"),
            Row::new()
                .with("Goal", "")
                .with("Strategy Pillar", "")
                .with("Action", "Hire analysts"),
            Row::new()
                .with("Goal", "")
                .with("Strategy Pillar", "Growth")
                .with("Action", "Marketplace"),
        ];
        let view = strategy_plan(&rows);
        assert_eq!(view.goal, "Double online revenue");
        let pillars: Vec<&str> = view.pillars.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(pillars, vec!["Growth", "General"]);
        assert_eq!(view.pillars[0].items.len(), 2);
        assert_eq!(view.pillars[1].items[0].goal, "Double online revenue");
        assert_eq!(
            view.pillars[0].items[0].photos,
            vec!["https://img/1.png", "https://img/3.png"]
        );
    }

    #[test]
    fn test_strategy_plan_default_goal() {
        assert_eq!(strategy_plan(&[]).goal, "2026 Strategy Plan");
    }
}
