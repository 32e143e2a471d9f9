// src/merge.rs
//! Union of normalized batches.
//!
//! Batches are concatenated in the order given; for each
//! (state, district, stage, competency_code) the last row seen wins. A
//! re-scrape of a few states therefore supersedes older data just by being
//! passed later. Superseded rows with a different score are kept aside as
//! `Conflict`s for audit; they never change the outcome.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::model::{Observation, ObservationKey};

#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub key: ObservationKey,
    pub previous: f64,
    pub replacement: f64,
}

pub struct MergeOutput {
    pub rows: Vec<Observation>,
    pub conflicts: Vec<Conflict>,
}

pub fn merge<I>(batches: I) -> MergeOutput
where
    I: IntoIterator<Item = Vec<Observation>>,
{
    let mut slots: Vec<Observation> = Vec::new();
    let mut index: HashMap<ObservationKey, usize> = HashMap::new();
    let mut conflicts = Vec::new();

    for batch in batches {
        for obs in batch {
            let key = obs.key();
            match index.get(&key) {
                Some(&i) => {
                    let prev = &slots[i];
                    if prev.score != obs.score {
                        conflicts.push(Conflict { key, previous: prev.score, replacement: obs.score });
                    }
                    slots[i] = obs;
                }
                None => {
                    index.insert(key, slots.len());
                    slots.push(obs);
                }
            }
        }
    }

    sort_rows(&mut slots);
    if !conflicts.is_empty() {
        logw!("merge: {} keys superseded with a different score", conflicts.len());
    }
    MergeOutput { rows: slots, conflicts }
}

/// (state, district, stage ordinal, competency code). Codes compare as
/// plain strings.
pub fn sort_rows(rows: &mut [Observation]) {
    rows.sort_by(|a, b| {
        (&a.state, &a.district, a.stage.ordinal(), &a.competency_code)
            .cmp(&(&b.state, &b.district, b.stage.ordinal(), &b.competency_code))
    });
}

/* ---------------- Reporting ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSummary {
    pub state: String,
    pub districts: usize,
    pub rows: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub total_rows: usize,
    pub states: usize,
    /// Distinct (state, district) pairs; district names repeat across states.
    pub districts: usize,
    pub competencies: usize,
    pub conflicts: usize,
    pub per_state: Vec<StateSummary>,
}

pub fn summarize(rows: &[Observation], conflicts: usize) -> MergeReport {
    let mut per_state: BTreeMap<&str, (BTreeSet<&str>, usize)> = BTreeMap::new();
    let mut codes: BTreeSet<&str> = BTreeSet::new();

    for r in rows {
        let entry = per_state.entry(r.state.as_str()).or_default();
        entry.0.insert(r.district.as_str());
        entry.1 += 1;
        codes.insert(r.competency_code.as_str());
    }

    let per_state: Vec<StateSummary> = per_state
        .into_iter()
        .map(|(state, (districts, n))| StateSummary { state: s!(state), districts: districts.len(), rows: n })
        .collect();

    MergeReport {
        total_rows: rows.len(),
        states: per_state.len(),
        districts: per_state.iter().map(|s| s.districts).sum(),
        competencies: codes.len(),
        conflicts,
        per_state,
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Total rows: {}", self.total_rows)?;
        writeln!(f, "  Total states: {}", self.states)?;
        writeln!(f, "  Total districts: {}", self.districts)?;
        writeln!(f, "  Total competencies: {}", self.competencies)?;
        if self.conflicts > 0 {
            writeln!(f, "  Superseded scores: {}", self.conflicts)?;
        }
        if !self.per_state.is_empty() {
            writeln!(f, "\nStates included:")?;
            for s in &self.per_state {
                writeln!(f, "  {}: {} districts, {} rows", s.state, s.districts, s.rows)?;
            }
        }
        Ok(())
    }
}
