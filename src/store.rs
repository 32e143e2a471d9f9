// src/store.rs
//
// Reads observation tables (batch, base or merged CSVs) back into memory.
// Columns are found by header name, so files with or without `State_Code`
// load the same way. Rows that do not parse are skipped with a warning.

use std::{fs, path::Path};

use crate::config::consts::{SCORE_MAX, SCORE_MIN};
use crate::core::sanitize::round2;
use crate::csv::{HeaderIndex, parse_rows};
use crate::error::{PipelineError, Result};
use crate::model::{Observation, Stage, Subject};

const REQUIRED: [&str; 7] = [
    "State", "District", "Stage", "Subject",
    "Competency_Code", "Competency_Description", "Score_Percent",
];

pub struct Dataset {
    pub rows: Vec<Observation>,
    pub skipped: usize,
}

pub fn load_observations(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let sep = match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case("tsv") => '\t',
        _ => ',',
    };
    let ds = parse_observations(&text, sep).map_err(|msg| PipelineError::Csv {
        path: path.to_path_buf(),
        msg,
    })?;
    logf!("Loaded {}: {} rows ({} skipped)", path.display(), ds.rows.len(), ds.skipped);
    Ok(ds)
}

pub fn parse_observations(text: &str, sep: char) -> std::result::Result<Dataset, String> {
    let mut rows = parse_rows(text, sep).into_iter();
    let header = rows.next().ok_or_else(|| s!("empty file"))?;
    let idx = HeaderIndex::new(&header)
        .require(&REQUIRED)
        .map_err(|missing| format!("missing column {missing:?}"))?;

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (line, r) in rows.enumerate() {
        match parse_row(&r, &idx) {
            Ok(o) => out.push(o),
            Err(e) => {
                skipped += 1;
                logw!("row {} skipped: {e}", line + 2);
            }
        }
    }
    Ok(Dataset { rows: out, skipped })
}

fn parse_row(r: &[String], idx: &[usize]) -> std::result::Result<Observation, String> {
    let cell = |i: usize| -> std::result::Result<&str, String> {
        r.get(idx[i]).map(|s| s.trim()).ok_or_else(|| format!("short row ({} cells)", r.len()))
    };

    let state = cell(0)?;
    let district = cell(1)?;
    if state.is_empty() || district.is_empty() {
        return Err(s!("empty state or district"));
    }
    let stage: Stage = cell(2)?.parse()?;
    let subject: Subject = cell(3)?.parse()?;
    let competency_code = cell(4)?;
    if competency_code.is_empty() {
        return Err(s!("empty competency code"));
    }
    let raw_score = cell(6)?;
    let score: f64 = raw_score
        .parse()
        .map_err(|_| format!("bad score {raw_score:?}"))?;
    if !score.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(format!("score {raw_score:?} out of range"));
    }
    let score = round2(score);

    Ok(Observation {
        state: s!(state),
        district: s!(district),
        stage,
        subject,
        competency_code: s!(competency_code),
        description: s!(cell(5)?),
        score,
    })
}
