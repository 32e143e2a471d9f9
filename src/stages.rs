// src/stages.rs
//
// One table per stage with the consolidated column set
// (State, District, Subject, LO_Code, Description, Score).

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::core::sanitize::format_score;
use crate::model::{Observation, Stage, Subject};

pub const STAGE_HEADERS: [&str; 6] = ["State", "District", "Subject", "LO_Code", "Description", "Score"];

#[derive(Clone, Debug, PartialEq)]
pub struct StageRow {
    pub state: String,
    pub district: String,
    pub subject: Subject,
    pub lo_code: String,
    pub description: String,
    pub score: f64,
}

impl StageRow {
    pub fn to_row(&self) -> Vec<String> {
        row![self.state, self.district, self.subject, self.lo_code, self.description, format_score(self.score)]
    }
}

pub struct StageTable {
    pub stage: Stage,
    pub rows: Vec<StageRow>,
}

/// Rows of `stage`, deduplicated on (State, District, Subject, LO_Code)
/// keeping the first, sorted by (State, Subject, LO_Code, District).
pub fn stage_table(observations: &[Observation], stage: Stage) -> StageTable {
    let mut seen: HashSet<(&str, &str, Subject, &str)> = HashSet::new();
    let mut rows: Vec<StageRow> = observations
        .iter()
        .filter(|o| o.stage == stage)
        .filter(|o| seen.insert((o.state.as_str(), o.district.as_str(), o.subject, o.competency_code.as_str())))
        .map(|o| StageRow {
            state: o.state.clone(),
            district: o.district.clone(),
            subject: o.subject,
            lo_code: o.competency_code.clone(),
            description: o.description.clone(),
            score: o.score,
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.state, a.subject.label(), &a.lo_code, &a.district)
            .cmp(&(&b.state, b.subject.label(), &b.lo_code, &b.district))
    });
    StageTable { stage, rows }
}

/* ---------------- Validation report ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub rows: usize,
    pub states: Vec<String>,
    pub subjects: Vec<String>,
    pub lo_codes: Vec<String>,
    pub districts: usize,
    /// (column, empty cell count) for columns that have any.
    pub missing: Vec<(&'static str, usize)>,
}

impl StageTable {
    pub fn report(&self) -> StageReport {
        let states: BTreeSet<&str> = self.rows.iter().map(|r| r.state.as_str()).collect();
        let subjects: BTreeSet<&str> = self.rows.iter().map(|r| r.subject.label()).collect();
        let lo_codes: BTreeSet<&str> = self.rows.iter().map(|r| r.lo_code.as_str()).collect();
        let districts: BTreeSet<(&str, &str)> =
            self.rows.iter().map(|r| (r.state.as_str(), r.district.as_str())).collect();

        let mut empty = [0usize; STAGE_HEADERS.len()];
        for r in &self.rows {
            for (n, cell) in empty.iter_mut().zip(r.to_row()) {
                if cell.trim().is_empty() {
                    *n += 1;
                }
            }
        }
        let missing: Vec<(&'static str, usize)> = STAGE_HEADERS
            .iter()
            .zip(empty)
            .filter(|(_, n)| *n > 0)
            .map(|(name, n)| (*name, n))
            .collect();

        StageReport {
            stage: self.stage,
            rows: self.rows.len(),
            states: states.into_iter().map(String::from).collect(),
            subjects: subjects.into_iter().map(String::from).collect(),
            lo_codes: lo_codes.into_iter().map(String::from).collect(),
            districts: districts.len(),
            missing,
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (Grade {}):", self.stage, self.stage.grade())?;
        writeln!(f, "  Total rows: {}", self.rows)?;
        writeln!(f, "  States: {}", self.states.join(", "))?;
        writeln!(f, "  Subjects: {}", self.subjects.join(", "))?;
        writeln!(f, "  LO Codes: {}", self.lo_codes.join(", "))?;
        writeln!(f, "  Districts: {}", self.districts)?;
        if self.missing.is_empty() {
            writeln!(f, "  All entries complete")
        } else {
            let parts: Vec<String> = self.missing.iter().map(|(c, n)| format!("{c}={n}")).collect();
            writeln!(f, "  WARNING - Missing values: {}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(state: &str, district: &str, stage: Stage, subject: Subject, code: &str, score: f64) -> Observation {
        Observation {
            state: s!(state),
            district: s!(district),
            stage,
            subject,
            competency_code: s!(code),
            description: format!("{code} description"),
            score,
        }
    }

    #[test]
    fn filters_dedups_keeping_first_and_sorts() {
        let all = vec![
            obs("Goa", "South Goa", Stage::Middle, Subject::Science, "C-2.2", 50.0),
            obs("Goa", "North Goa", Stage::Middle, Subject::Science, "C-2.2", 52.0),
            obs("Goa", "North Goa", Stage::Middle, Subject::Science, "C-2.2", 99.0),
            obs("Goa", "North Goa", Stage::Middle, Subject::Language, "C-1.1", 61.0),
            obs("Goa", "North Goa", Stage::Preparatory, Subject::Language, "C-2.1", 70.0),
        ];
        let t = stage_table(&all, Stage::Middle);
        let got: Vec<(&str, &str, f64)> =
            t.rows.iter().map(|r| (r.lo_code.as_str(), r.district.as_str(), r.score)).collect();
        assert_eq!(got, vec![
            ("C-1.1", "North Goa", 61.0),
            ("C-2.2", "North Goa", 52.0),
            ("C-2.2", "South Goa", 50.0),
        ]);
    }

    #[test]
    fn report_lists_coverage_and_missing_cells() {
        let mut all = vec![
            obs("Goa", "North Goa", Stage::Middle, Subject::Science, "C-2.2", 52.0),
            obs("Assam", "Kamrup", Stage::Middle, Subject::Science, "C-3.2", 62.0),
        ];
        all[0].description = s!("");
        let r = stage_table(&all, Stage::Middle).report();
        assert_eq!(r.rows, 2);
        assert_eq!(r.states, vec!["Assam", "Goa"]);
        assert_eq!(r.subjects, vec!["Science"]);
        assert_eq!(r.districts, 2);
        assert_eq!(r.missing, vec![("Description", 1)]);
        assert!(r.to_string().contains("Missing values: Description=1"));
    }

    #[test]
    fn missing_cells_are_counted_per_column() {
        let mut all = vec![
            obs("Goa", "North Goa", Stage::Middle, Subject::Science, "C-2.2", 52.0),
            obs("Goa", "South Goa", Stage::Middle, Subject::Science, "C-2.2", 50.0),
            obs("Goa", "South Goa", Stage::Middle, Subject::Science, "C-2.3", 51.0),
        ];
        all[0].description = s!(" ");
        all[1].description = s!("");
        all[2].district = s!("");
        let r = stage_table(&all, Stage::Middle).report();
        assert_eq!(r.missing, vec![("District", 1), ("Description", 2)]);
    }
}
