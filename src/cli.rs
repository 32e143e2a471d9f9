// src/cli.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};

use crate::collect;
use crate::config::Taxonomy;
use crate::config::consts::{CONFLICTS_STEM, DEFAULT_LOG_LEVEL, STORE_DIR};
use crate::config::options::{ExportFormat, ExportOptions};
use crate::progress::ConsoleProgress;
use crate::runner;

/// Flatten and merge PARAKH dashboard captures into CSV tables.
#[derive(Parser, Debug)]
#[command(name = "parakh", version, about)]
pub struct Cli {
    /// Directory holding batch files; outputs are written here too
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// JSON file overriding the built-in taxonomy
    #[arg(long, global = true)]
    pub taxonomy: Option<PathBuf>,

    /// Delimiter for merged, conflict and stage tables
    #[arg(long, global = true, value_enum, default_value_t = Format::Csv)]
    pub format: Format,

    /// Log level for the file log under `.store/`
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Tsv,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f { Format::Csv => ExportFormat::Csv, Format::Tsv => ExportFormat::Tsv }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List state groups
    Groups,

    /// Print the pages to visit for a group
    Targets { group: u32 },

    /// Flatten captured chart snapshots into group<N>_results.json
    Collect {
        group: u32,
        /// Snapshot capture file (JSON array)
        #[arg(long)]
        snapshots: PathBuf,
    },

    /// group<N>_results.json → group<N>_data.csv
    Convert { group: u32 },

    /// Consolidate all group<N>_data.csv files (plus the base file, if any)
    Merge {
        /// Base file merged first; defaults to parakh_competency_data.csv when present
        #[arg(long)]
        base: Option<PathBuf>,
        /// Output file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write superseded scores, to FILE or merge_conflicts.<ext>
        #[arg(long, value_name = "FILE")]
        conflicts: Option<Option<PathBuf>>,
    },

    /// Write one table per stage from a results file
    Stages { input: PathBuf },
}

pub fn run() -> Result<()> {
    execute(Cli::parse())
}

pub fn execute(cli: Cli) -> Result<()> {
    let log_dir = crate::log::init(&cli.log_level, &PathBuf::from(STORE_DIR))?;
    logd!("logging to {}", log_dir.display());

    let taxonomy = match &cli.taxonomy {
        Some(p) => Taxonomy::load(p).wrap_err_with(|| format!("loading taxonomy {}", p.display()))?,
        None => Taxonomy::default(),
    };
    let export = ExportOptions { format: cli.format.into(), dir: cli.dir.clone() };
    let mut progress = ConsoleProgress::default();

    match cli.command {
        Command::Groups => {
            for (n, states) in &taxonomy.groups {
                let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
                println!("{n}: {}", names.join(", "));
            }
        }

        Command::Targets { group } => {
            for t in collect::plan(&taxonomy, group)? {
                println!("{}\t{}\t{}\t{}", t.state_code, t.state_name, t.stage, t.url);
            }
        }

        Command::Collect { group, snapshots } => {
            let snapshots = export.resolve(&snapshots);
            let summary = runner::collect_group(&taxonomy, &export, group, &snapshots, Some(&mut progress))?;
            if summary.files_written.is_empty() {
                println!("Nothing written for group {group}");
            }
        }

        Command::Convert { group } => {
            let s = runner::convert_group(&taxonomy, &export, group, Some(&mut progress))?;
            println!("Converted {} rows to {}", s.report.total_rows, s.path.display());
            println!("Normalize: {:?}", s.stats);
            print!("{}", s.report);
        }

        Command::Merge { base, out, conflicts } => {
            let conflicts = conflicts.map(|c| c.unwrap_or_else(|| export.path_for(CONFLICTS_STEM)));
            let s = runner::merge_batches(
                &taxonomy,
                &export,
                base.as_deref(),
                out.as_deref(),
                conflicts.as_deref(),
                Some(&mut progress),
            )?;
            println!("\nMerged data saved to: {}", s.path.display());
            if let Some(c) = &s.conflicts_path {
                println!("Superseded scores saved to: {}", c.display());
            }
            print!("{}", s.report);
        }

        Command::Stages { input } => {
            let s = runner::build_stage_files(&taxonomy, &export, &input, Some(&mut progress))?;
            for r in &s.reports {
                println!("\n{r}");
            }
            println!("Wrote {} stage files", s.files_written.len());
        }
    }

    logf!("event=run_end");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_merge_flags() {
        let cli = Cli::try_parse_from([
            "parakh", "--dir", "batches", "--format", "tsv", "merge", "--base", "old.csv", "--conflicts",
        ])
        .unwrap();
        assert_eq!(cli.dir, PathBuf::from("batches"));
        assert_eq!(cli.format, Format::Tsv);
        match cli.command {
            Command::Merge { base, out, conflicts } => {
                assert_eq!(base, Some(PathBuf::from("old.csv")));
                assert_eq!(out, None);
                assert_eq!(conflicts, Some(None));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["parakh", "convert", "3", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Convert { group: 3 }));
    }

    #[test]
    fn group_must_be_a_number() {
        assert!(Cli::try_parse_from(["parakh", "convert", "three"]).is_err());
    }
}
