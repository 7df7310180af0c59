use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}

/// Normalize a worksheet header cell.
///
/// Non-breaking spaces and tabs become spaces, runs of spaces collapse,
/// and the result is trimmed.
///
/// Example: "Key\u{00A0}\tInsight " → "Key Insight"
pub fn normalize_header(raw: &str) -> String {
    raw.replace(['\u{00A0}', '\t'], " ")
        .split(' ')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a number out of loosely formatted text.
///
/// Commas and spaces are dropped, then everything except digits, `.` and `-`.
///
/// Example: "$\\mathbf{5,250}$" → 5250.0
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Format with thousands separators and a fixed number of decimals.
///
/// Example: (1234567.0, 2) → "1,234,567.00"
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a ratio or percentage for display. Values within ±1 are ratios.
///
/// Example: Some(0.175) → "17.5%", Some(42.0) → "42.0%", None → "-"
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(num) => {
            let pct = if num.abs() <= 1.0 { num * 100.0 } else { num };
            format!("{:.1}%", pct)
        }
    }
}

/// Strip the LaTeX math markup some cells were pasted with.
///
/// Example: "$\\mathbf{17\\%}$ \\rightarrow growth" → "17\\% → growth"
pub fn clean_latex_math(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static INLINE: OnceLock<Regex> = OnceLock::new();
    let bold = BOLD.get_or_init(|| Regex::new(r"\\mathbf\{([^}]*)\}").expect("valid regex"));
    let inline = INLINE.get_or_init(|| Regex::new(r"\$(.*?)\$").expect("valid regex"));

    let text = bold.replace_all(text, "$1");
    let text = text.replace(r"\rightarrow", "→");
    let text = inline.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Lowercased, trimmed key used to match names across worksheets.
pub fn match_key(name: &str) -> String {
    name.trim().to_lowercase()
}
