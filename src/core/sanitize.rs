// src/core/sanitize.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// `C-<major>` with an optional `.<minor>`; used on chart titles.
static COMPETENCY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"C-\d+(?:\.\d+)?").expect("static competency regex"));

/// Dropdown options always carry the full `C-<major>.<minor>` form.
static COMPETENCY_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"C-\d+\.\d+").expect("static option regex"));

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// First competency code in `text`, if any.
pub fn competency_code(text: &str) -> Option<&str> {
    COMPETENCY_CODE.find(text).map(|m| m.as_str())
}

pub fn is_competency_option(text: &str) -> bool {
    COMPETENCY_OPTION.is_match(text)
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Round half away from zero to 2 decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Render a score for CSV: whole numbers keep one decimal ("62.0"),
/// everything else uses the shortest exact form ("48.25").
pub fn format_score(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.1}") } else { format!("{v}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_code() {
        assert_eq!(competency_code("C-3.2 Classifies matter around us"), Some("C-3.2"));
        assert_eq!(competency_code("LO C-10 reads"), Some("C-10"));
        assert_eq!(competency_code("C-8.10 and C-8.11"), Some("C-8.10"));
        assert_eq!(competency_code("All competencies"), None);
    }

    #[test]
    fn option_requires_minor() {
        assert!(is_competency_option("C-4.1 Understands place value"));
        assert!(!is_competency_option("C-4 Understands"));
        assert!(!is_competency_option("Select competency"));
    }

    #[test]
    fn scores_round_and_render() {
        assert_eq!(round2(48.126), 48.13);
        assert_eq!(round2(62.0), 62.0);
        assert_eq!(format_score(62.0), "62.0");
        assert_eq!(format_score(round2(55.129)), "55.13");
    }

    #[test]
    fn whitespace_and_case_helpers() {
        assert_eq!(normalize_ws("  North \t Goa\n"), "North Goa");
        assert!(eq_ci(" INDIA ", "india"));
        assert!(contains_ci("All competencies for Mathematics at a Glance", "glance"));
    }
}
