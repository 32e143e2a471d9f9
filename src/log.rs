// src/log.rs
//! File logging for pipeline runs.
//!
//! The `logf!`/`logd!`/`logw!`/`loge!` macros forward to the `log` facade, so
//! they are silent until [`init`] starts the file backend. Operator-facing
//! output goes through `progress::Progress`, not through here.

use std::path::{Path, PathBuf};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use once_cell::sync::OnceCell;

use crate::error::{PipelineError, Result};

const LOG_BASENAME: &str = "parakh_scrape";
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static HANDLE: OnceCell<(PathBuf, LoggerHandle)> = OnceCell::new();

/// Start the file logger once per process. Later calls are no-ops and
/// return the directory of the logger that is already running.
pub fn init(level: &str, dir: &Path) -> Result<PathBuf> {
    let (active, _) = HANDLE.get_or_try_init(|| {
        std::fs::create_dir_all(dir)?;
        let handle = Logger::try_with_str(level)
            .map_err(|e| PipelineError::Logging(format!("invalid log level `{level}`: {e}")))?
            .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
            .rotate(
                Criterion::Size(MAX_LOG_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|e| PipelineError::Logging(format!("failed to start logger: {e}")))?;

        ::log::info!(
            "event=run_start version={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            dir.display()
        );
        Ok::<_, PipelineError>((dir.to_path_buf(), handle))
    })?;
    Ok(active.clone())
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        ::log::info!($($arg)*)
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        ::log::debug!($($arg)*)
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! logw {
    ($($arg:tt)*) => {
        ::log::warn!($($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        ::log::error!($($arg)*)
    };
}
