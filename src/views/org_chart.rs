//! Reporting tree built from `Name` / `Reports_To`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::require_columns;
use crate::error::DashboardError;
use crate::types::Row;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgChartView {
    pub roots: Vec<OrgNode>,
    pub department_colors: BTreeMap<&'static str, &'static str>,
    pub role_colors: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub name: String,
    pub original_name: String,
    pub level: String,
    pub department: String,
    pub role: String,
    pub status: String,
    pub photo_url: String,
    /// Resolved manager name; empty for roots.
    pub reports_to: String,
    pub children: Vec<OrgNode>,
}

const DEPARTMENT_COLORS: &[(&str, &str)] = &[
    ("CEO", "#003366"),
    ("KHIT ZAY", "#007BFF"),
    ("LAST-MILE OPERATION TEAM", "#17a2b8"),
    ("BOB & CUSTOMER CARE TEAM", "#ffc107"),
    ("BUSINESS INTELLIGENCE TEAM", "#dc3545"),
    ("UI/UX TEAM", "#6f42c1"),
    ("DATA-BASED MARKETING TEAM", "#28a745"),
];

const ROLE_COLORS: &[(&str, &str)] = &[
    ("CEO", "#003366"),
    ("Dep. Head of Ecommerce", "#007BFF"),
    ("ASST MANAGER", "#17a2b8"),
    ("Executive", "#6f42c1"),
    ("JUNIOR", "#28a745"),
    ("DEVELOPER", "#6f42c1"),
    ("SNR DESIGNER", "#ffc107"),
    ("STAFF", "#dc3545"),
    ("BOB SALE DRIVE SUPERVISOR", "#ff9800"),
    ("BOB", "#ff9800"),
    ("CC Agent-VIP & Loyalty", "#ff9800"),
    ("CC Agent-Complaint", "#dc3545"),
    ("Vacant", "#b0b8c1"),
    ("EXECUTIVE (Shopper Marketing)", "#6f42c1"),
    ("EXECUTIVE (Buyer Marketing)", "#6f42c1"),
    ("STAFF (Data Analyst) + Virtual Fast Cash", "#28a745"),
];

pub fn build(worksheet: &str, rows: &[Row]) -> Result<OrgChartView, DashboardError> {
    require_columns(worksheet, rows, &["Name", "Reports_To"])?;

    let mut nodes: Vec<OrgNode> = Vec::new();
    let mut raw_managers: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    // Raw vacant label -> generated name; the latest vacancy wins.
    let mut vacant_names: HashMap<String, String> = HashMap::new();
    let mut vacancies = 0;

    for row in rows {
        let original_name = row.text("Name");
        let name = if original_name.is_empty() || original_name.eq_ignore_ascii_case("(vacant)") {
            vacancies += 1;
            let generated = format!("Vacant_{}", vacancies);
            vacant_names.insert(original_name.clone(), generated.clone());
            generated
        } else {
            original_name.clone()
        };

        let node = OrgNode {
            name: name.clone(),
            original_name,
            level: row.text("Level"),
            department: row.text("Department"),
            role: row.text("Role"),
            status: row.text("Status"),
            photo_url: row.text("Photo_URL"),
            reports_to: String::new(),
            children: Vec::new(),
        };
        let manager = row.text("Reports_To");

        // A repeated name replaces the earlier row in place.
        match index.get(&name) {
            Some(&idx) => {
                nodes[idx] = node;
                raw_managers[idx] = manager;
            }
            None => {
                index.insert(name, nodes.len());
                nodes.push(node);
                raw_managers.push(manager);
            }
        }
    }

    let parents: Vec<Option<usize>> = raw_managers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            if raw.is_empty() || raw == "0" {
                return None;
            }
            let resolved = vacant_names.get(raw).unwrap_or(raw);
            index.get(resolved).copied().filter(|&parent| parent != idx)
        })
        .collect();

    let manager_names: Vec<String> = parents
        .iter()
        .map(|parent| parent.map(|p| nodes[p].name.clone()).unwrap_or_default())
        .collect();
    for (node, manager) in nodes.iter_mut().zip(manager_names) {
        node.reports_to = manager;
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut root_ids: Vec<usize> = Vec::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(idx),
            None => root_ids.push(idx),
        }
    }

    let mut placed = vec![false; nodes.len()];
    let mut roots: Vec<OrgNode> = root_ids
        .into_iter()
        .map(|idx| attach(idx, &nodes, &children, &mut placed))
        .collect();

    // Reporting cycles have no root; promote the first member of each.
    for idx in 0..nodes.len() {
        if !placed[idx] {
            log::warn!("Org chart: '{}' is in a reporting cycle", nodes[idx].name);
            let mut root = attach(idx, &nodes, &children, &mut placed);
            root.reports_to.clear();
            roots.push(root);
        }
    }

    Ok(OrgChartView {
        roots,
        department_colors: DEPARTMENT_COLORS.iter().copied().collect(),
        role_colors: ROLE_COLORS.iter().copied().collect(),
    })
}

fn attach(idx: usize, nodes: &[OrgNode], children: &[Vec<usize>], placed: &mut [bool]) -> OrgNode {
    placed[idx] = true;
    let mut node = nodes[idx].clone();
    for &child in &children[idx] {
        if !placed[child] {
            node.children.push(attach(child, nodes, children, placed));
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, reports_to: &str, role: &str) -> Row {
        Row::new()
            .with("Name", name)
            .with("Reports_To", reports_to)
            .with("Role", role)
            .with("Department", "BUSINESS INTELLIGENCE TEAM")
    }

    fn names(nodes: &[OrgNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_tree_from_reports_to() {
        let rows = vec![
            person("Aung", "", "CEO"),
            person("Bo", "Aung", "ASST MANAGER"),
            person("Chit", "Bo", "STAFF"),
            person("Dara", "Aung", "DEVELOPER"),
        ];
        let view = build("org_chart", &rows).unwrap();
        assert_eq!(names(&view.roots), vec!["Aung"]);
        let ceo = &view.roots[0];
        assert_eq!(names(&ceo.children), vec!["Bo", "Dara"]);
        assert_eq!(ceo.children[0].children[0].name, "Chit");
        assert_eq!(ceo.children[0].children[0].reports_to, "Bo");
    }

    #[test]
    fn test_vacant_names_generated_and_resolved() {
        let rows = vec![
            person("Aung", "0", "CEO"),
            person("(Vacant)", "Aung", "Vacant"),
            person("", "Aung", "Vacant"),
            person("Eaint", "(Vacant)", "JUNIOR"),
        ];
        let view = build("org_chart", &rows).unwrap();
        let ceo = &view.roots[0];
        assert_eq!(names(&ceo.children), vec!["Vacant_1", "Vacant_2"]);
        assert_eq!(ceo.children[0].original_name, "(Vacant)");
        assert_eq!(names(&ceo.children[0].children), vec!["Eaint"]);
    }

    #[test]
    fn test_unknown_and_self_managers_become_roots() {
        let rows = vec![
            person("Aung", "", "CEO"),
            person("Bo", "Nobody", "STAFF"),
            person("Chit", "Chit", "STAFF"),
        ];
        let view = build("org_chart", &rows).unwrap();
        assert_eq!(names(&view.roots), vec!["Aung", "Bo", "Chit"]);
        assert!(view.roots.iter().all(|r| r.reports_to.is_empty()));
    }

    #[test]
    fn test_reporting_cycle_is_promoted() {
        let rows = vec![
            person("Aung", "", "CEO"),
            person("Bo", "Chit", "STAFF"),
            person("Chit", "Bo", "STAFF"),
        ];
        let view = build("org_chart", &rows).unwrap();
        assert_eq!(names(&view.roots), vec!["Aung", "Bo"]);
        assert_eq!(names(&view.roots[1].children), vec!["Chit"]);
        assert!(view.roots[1].children[0].children.is_empty());
    }

    #[test]
    fn test_color_maps_present() {
        let view = build("org_chart", &[]).unwrap();
        assert!(view.roots.is_empty());
        assert_eq!(view.department_colors.get("CEO"), Some(&"#003366"));
        assert_eq!(view.role_colors.get("Vacant"), Some(&"#b0b8c1"));
    }

    #[test]
    fn test_missing_reports_to_column() {
        let rows = vec![Row::new().with("Name", "Aung")];
        assert!(matches!(
            build("org_chart", &rows),
            Err(DashboardError::SchemaMismatch { .. })
        ));
    }
}
