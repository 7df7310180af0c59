//! OKR comparison: 2025 vs 2026, by functional team.

use std::collections::BTreeSet;

use serde::Serialize;

use super::require_columns;
use crate::error::DashboardError;
use crate::types::{CellValue, Row};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrView {
    pub teams: Vec<OkrTeam>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrTeam {
    pub team: String,
    pub objectives: Vec<OkrObjective>,
    /// Mean of `Average` as a percentage, rounded to 0.1.
    pub avg_2025: Option<f64>,
    pub avg_2026: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrObjective {
    pub objective: String,
    pub items_2025: Vec<Row>,
    pub items_2026: Vec<Row>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Year {
    Y2025,
    Y2026,
}

pub fn build(worksheet: &str, rows: &[Row]) -> Result<OkrView, DashboardError> {
    require_columns(worksheet, rows, &["Years", "Functional POVs", "Objective"])?;

    let tagged: Vec<(Year, String, &Row)> = rows
        .iter()
        .filter_map(|row| {
            let years = row.text("Years");
            let year = if years.contains("2025") {
                Year::Y2025
            } else if years.contains("2026") {
                Year::Y2026
            } else {
                return None;
            };
            Some((year, team_name(row), row))
        })
        .collect();

    let team_names: BTreeSet<&str> = tagged.iter().map(|(_, team, _)| team.as_str()).collect();

    let teams = team_names
        .into_iter()
        .map(|team| {
            let in_team = |year: Year| {
                tagged
                    .iter()
                    .filter(move |(y, t, _)| *y == year && t == team)
                    .map(|(_, _, row)| *row)
            };

            let mut objectives: Vec<OkrObjective> = Vec::new();
            for (year, row) in in_team(Year::Y2025)
                .map(|r| (Year::Y2025, r))
                .chain(in_team(Year::Y2026).map(|r| (Year::Y2026, r)))
            {
                let name = objective_name(row);
                let idx = match objectives.iter().position(|o| o.objective == name) {
                    Some(idx) => idx,
                    None => {
                        objectives.push(OkrObjective {
                            objective: name,
                            items_2025: Vec::new(),
                            items_2026: Vec::new(),
                        });
                        objectives.len() - 1
                    }
                };
                match year {
                    Year::Y2025 => objectives[idx].items_2025.push(row.clone()),
                    Year::Y2026 => objectives[idx].items_2026.push(row.clone()),
                }
            }

            OkrTeam {
                team: team.to_string(),
                objectives,
                avg_2025: average_percent(in_team(Year::Y2025)),
                avg_2026: average_percent(in_team(Year::Y2026)),
            }
        })
        .collect();

    Ok(OkrView { teams })
}

fn team_name(row: &Row) -> String {
    let team = row.text("Functional POVs");
    if team.is_empty() {
        "Other".to_string()
    } else {
        team
    }
}

fn objective_name(row: &Row) -> String {
    let objective = row.text("Objective");
    if objective.is_empty() {
        "No Objective".to_string()
    } else {
        objective
    }
}

/// Ratios (0.7) count as percentages (70.0); text already carrying `%` is
/// taken as a percentage.
fn average_percent<'a>(rows: impl Iterator<Item = &'a Row>) -> Option<f64> {
    let values: Vec<f64> = rows
        .filter_map(|row| match row.get("Average")? {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(n * 100.0),
            CellValue::Text(s) if s.contains('%') => s.replace('%', "").trim().parse().ok(),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().map(|n| n * 100.0),
        })
        .collect();
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
