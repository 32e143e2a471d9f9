// src/runner.rs
//
// Top-level pipeline steps. Each step reads immutable inputs from disk,
// produces a new collection and writes it out; nothing is shared between
// steps except files.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{
    collect::{self, Snapshot},
    config::{Taxonomy, options::ExportOptions},
    error::{PipelineError, Result},
    file::{self, BATCH_HEADERS, CONFLICT_HEADERS, MERGED_HEADERS},
    ingest,
    merge::{self, MergeReport},
    normalize::{NormalizeStats, Normalizer},
    progress::Progress,
    stages::{self, STAGE_HEADERS, StageReport},
    store,
};

/// Summary of what was produced.
pub struct RunSummary {
    pub files_written: Vec<PathBuf>,
}

pub struct ConvertSummary {
    pub path: PathBuf,
    pub stats: NormalizeStats,
    pub report: MergeReport,
}

pub struct MergeSummary {
    pub path: PathBuf,
    pub conflicts_path: Option<PathBuf>,
    pub report: MergeReport,
}

pub struct StagesSummary {
    pub files_written: Vec<PathBuf>,
    pub reports: Vec<StageReport>,
}

/* ---------------- collect ---------------- */

/// Flatten captured snapshots for `group` into `group<N>_results.json`.
/// Writes nothing when the group produced no records.
pub fn collect_group(
    taxonomy: &Taxonomy,
    export: &ExportOptions,
    group: u32,
    snapshots_path: &Path,
    mut progress: Option<&mut dyn Progress>,
) -> Result<RunSummary> {
    let states = taxonomy.group(group)?;
    if let Some(p) = progress.as_deref_mut() {
        let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
        p.log(&format!("GROUP {group}: {}", names.join(", ")));
    }

    let snapshots = load_snapshots(snapshots_path)?;
    let records = collect::collect_group(taxonomy, group, &snapshots, reborrow(&mut progress))?;

    if records.is_empty() {
        logw!("No data found for group {group}");
        if let Some(p) = progress.as_deref_mut() {
            p.log(&format!("No data found for group {group}"));
        }
        return Ok(RunSummary { files_written: Vec::new() });
    }

    let path = export.group_results_path(group);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            file::ensure_directory(parent)?;
        }
    }
    fs::write(&path, serde_json::to_string_pretty(&records)?)?;
    logf!("Saved {} records to {}", records.len(), path.display());
    if let Some(p) = progress.as_deref_mut() {
        p.log(&format!("Saved {} records to {}", records.len(), path.display()));
    }
    Ok(RunSummary { files_written: vec![path] })
}

/// Short-lived reborrow of an optional sink, for handing it to a callee and
/// using it again afterwards.
fn reborrow<'s>(progress: &'s mut Option<&mut dyn Progress>) -> Option<&'s mut dyn Progress> {
    progress.as_mut().map(|p| &mut **p as &mut dyn Progress)
}

/// Snapshots are decoded one by one; an undecodable snapshot is a failed
/// unit, not a failed run.
fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let items = match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => items,
        other => vec![other],
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, v) in items.into_iter().enumerate() {
        match serde_json::from_value::<Snapshot>(v) {
            Ok(s) => out.push(s),
            Err(e) => loge!("snapshot #{i} skipped: {e}"),
        }
    }
    Ok(out)
}

/* ---------------- convert ---------------- */

/// `group<N>_results.json` → `group<N>_data.csv`.
pub fn convert_group(
    taxonomy: &Taxonomy,
    export: &ExportOptions,
    group: u32,
    mut progress: Option<&mut dyn Progress>,
) -> Result<ConvertSummary> {
    taxonomy.group(group)?;
    let json_path = export.group_results_path(group);
    let csv_path = export.group_data_path(group);
    if !json_path.exists() {
        return Err(PipelineError::MissingInput(json_path));
    }
    if let Some(p) = progress.as_deref_mut() {
        p.log(&format!("Converting {} to {}...", json_path.display(), csv_path.display()));
    }

    let batch = ingest::load_batch(&json_path)?;
    let normalized = Normalizer::new(taxonomy).normalize_batch(&batch.entries);
    let mut rows = normalized.rows;
    merge::sort_rows(&mut rows);

    let table: Vec<Vec<String>> = rows.iter().map(file::batch_row).collect();
    let path = file::write_table(&csv_path, Some(&BATCH_HEADERS), &table, ',')?;

    let report = merge::summarize(&rows, 0);
    if let Some(p) = progress.as_deref_mut() {
        p.item_done(&path.display().to_string(), rows.len());
    }
    Ok(ConvertSummary { path, stats: normalized.stats, report })
}

/* ---------------- merge ---------------- */

/// Consolidate the base file (if any) and every `group<N>_data.csv`.
///
/// - No batch files: error, nothing written.
/// - `base` given explicitly but missing: error. Otherwise the default base
///   file is used when present.
pub fn merge_batches(
    taxonomy: &Taxonomy,
    export: &ExportOptions,
    base: Option<&Path>,
    out: Option<&Path>,
    conflicts_out: Option<&Path>,
    mut progress: Option<&mut dyn Progress>,
) -> Result<MergeSummary> {
    let batch_files = file::find_batch_files(&export.dir)?;
    if batch_files.is_empty() {
        return Err(PipelineError::NoInputs(export.dir.clone()));
    }

    let base_path = match base {
        Some(b) => Some(export.resolve(b)),
        None => Some(export.base_data_path()).filter(|p| p.exists()),
    };

    let mut inputs: Vec<PathBuf> = Vec::with_capacity(batch_files.len() + 1);
    inputs.extend(base_path);
    inputs.extend(batch_files.into_iter().map(|(_, p)| p));

    if let Some(p) = progress.as_deref_mut() {
        p.log(&format!("Found {} input files:", inputs.len()));
        p.begin(inputs.len());
    }

    let mut batches = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let ds = store::load_observations(path)?;
        if let Some(p) = progress.as_deref_mut() {
            p.item_done(&path.display().to_string(), ds.rows.len());
        }
        batches.push(ds.rows);
    }

    let merged = merge::merge(batches);
    let out_path = out.map(|o| export.resolve(o)).unwrap_or_else(|| export.merged_data_path());
    let table: Vec<Vec<String>> = merged.rows.iter().map(|o| file::merged_row(o, taxonomy)).collect();
    let path = file::write_table(&out_path, Some(&MERGED_HEADERS), &table, export.delim())?;

    let conflicts_path = match conflicts_out {
        Some(c) => {
            let c = export.resolve(c);
            let table: Vec<Vec<String>> = merged.conflicts.iter().map(file::conflict_row).collect();
            Some(file::write_table(&c, Some(&CONFLICT_HEADERS), &table, export.delim())?)
        }
        None => None,
    };

    let report = merge::summarize(&merged.rows, merged.conflicts.len());
    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    Ok(MergeSummary { path, conflicts_path, report })
}

/* ---------------- stages ---------------- */

/// Normalize one results file and write a table per stage. Stages with no
/// rows are reported and skipped.
pub fn build_stage_files(
    taxonomy: &Taxonomy,
    export: &ExportOptions,
    input: &Path,
    mut progress: Option<&mut dyn Progress>,
) -> Result<StagesSummary> {
    let input = export.resolve(input);
    if !input.exists() {
        return Err(PipelineError::MissingInput(input));
    }
    let batch = ingest::load_batch(&input)?;
    let normalized = Normalizer::new(taxonomy).normalize_batch(&batch.entries);

    let mut files_written = Vec::new();
    let mut reports = Vec::new();
    for stage in crate::model::Stage::ALL {
        let table = stages::stage_table(&normalized.rows, stage);
        if table.rows.is_empty() {
            logw!("No data for {stage}");
            if let Some(p) = progress.as_deref_mut() {
                p.log(&format!("WARNING: No data for {stage}"));
            }
            continue;
        }
        let rows: Vec<Vec<String>> = table.rows.iter().map(|r| r.to_row()).collect();
        let path = file::write_table(&export.path_for(stage.file_stem()), Some(&STAGE_HEADERS), &rows, export.delim())?;
        if let Some(p) = progress.as_deref_mut() {
            p.item_done(&path.display().to_string(), rows.len());
        }
        files_written.push(path);
        reports.push(table.report());
    }
    Ok(StagesSummary { files_written, reports })
}
