// src/file.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::Taxonomy;
use crate::config::consts::{GROUP_DATA_SUFFIX, GROUP_RESULTS_PREFIX};
use crate::core::sanitize::format_score;
use crate::csv::to_export_string;
use crate::error::{PipelineError, Result};
use crate::merge::Conflict;
use crate::model::Observation;

pub const BATCH_HEADERS: [&str; 7] = [
    "State", "District", "Stage", "Subject",
    "Competency_Code", "Competency_Description", "Score_Percent",
];

pub const MERGED_HEADERS: [&str; 8] = [
    "State", "State_Code", "District", "Stage", "Subject",
    "Competency_Code", "Competency_Description", "Score_Percent",
];

pub const CONFLICT_HEADERS: [&str; 6] = [
    "State", "District", "Stage", "Competency_Code", "Previous_Score", "Replacement_Score",
];

pub fn batch_row(o: &Observation) -> Vec<String> {
    row![
        o.state, o.district, o.stage, o.subject,
        o.competency_code, o.description, format_score(o.score),
    ]
}

pub fn merged_row(o: &Observation, taxonomy: &Taxonomy) -> Vec<String> {
    row![
        o.state, taxonomy.state_code(&o.state), o.district, o.stage, o.subject,
        o.competency_code, o.description, format_score(o.score),
    ]
}

pub fn conflict_row(c: &Conflict) -> Vec<String> {
    row![
        c.key.state, c.key.district, c.key.stage, c.key.competency_code,
        format_score(c.previous), format_score(c.replacement),
    ]
}

/// Write one table, creating the parent directory if needed.
/// Returns the path written to.
pub fn write_table(
    path: &Path,
    headers: Option<&[&str]>,
    rows: &[Vec<String>],
    sep: char,
) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    fs::write(path, to_export_string(headers, rows, sep))?;
    logf!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path.to_path_buf())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        )
        .into());
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

/// Group number from a `group<N>_data.csv` file name.
pub fn group_of_data_file(name: &str) -> Option<u32> {
    name.strip_prefix(GROUP_RESULTS_PREFIX)?
        .strip_suffix(GROUP_DATA_SUFFIX)?
        .parse()
        .ok()
}

/// Every `group<N>_data.csv` in `dir`, ordered by N.
pub fn find_batch_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    if !dir.is_dir() {
        return Err(PipelineError::NoInputs(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() { continue; }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else { continue };
        if let Some(group) = group_of_data_file(name) {
            found.push((group, path));
        }
    }
    found.sort_by_key(|(g, _)| *g);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Stage, Subject};

    #[test]
    fn group_file_names() {
        assert_eq!(group_of_data_file("group4_data.csv"), Some(4));
        assert_eq!(group_of_data_file("group12_data.csv"), Some(12));
        assert_eq!(group_of_data_file("group_data.csv"), None);
        assert_eq!(group_of_data_file("group4_results.json"), None);
    }

    #[test]
    fn batch_files_are_ordered_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["group10_data.csv", "group2_data.csv", "notes.csv", "group1_results.json"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let found = find_batch_files(dir.path()).unwrap();
        let groups: Vec<u32> = found.iter().map(|(g, _)| *g).collect();
        assert_eq!(groups, vec![2, 10]);
    }

    #[test]
    fn merged_row_has_state_code_or_blank() {
        let tax = Taxonomy::default();
        let mut o = Observation {
            state: s!("Assam"),
            district: s!("Kamrup"),
            stage: Stage::Middle,
            subject: Subject::Science,
            competency_code: s!("C-3.2"),
            description: s!("C-3.2 Classifies matter around us"),
            score: 62.0,
        };
        let r = merged_row(&o, &tax);
        assert_eq!(r[1], "IND18");
        assert_eq!(r[3], "Middle Stage");
        assert_eq!(r[7], "62.0");

        o.state = s!("Atlantis");
        assert_eq!(merged_row(&o, &tax)[1], "");
    }
}
