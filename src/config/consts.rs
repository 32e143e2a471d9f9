// src/config/consts.rs

// Dashboard
pub const DASHBOARD_BASE: &str = "https://dashboard.parakh.ncert.gov.in/en/dashboard/";

// Local log directory
pub const STORE_DIR: &str = ".store";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Batch files (per group)
pub const GROUP_RESULTS_PREFIX: &str = "group";
pub const GROUP_RESULTS_SUFFIX: &str = "_results.json";
pub const GROUP_DATA_SUFFIX: &str = "_data.csv";

// Merge
pub const BASE_DATA_FILE: &str = "parakh_competency_data.csv";
pub const MERGED_DATA_STEM: &str = "parakh_competency_data_all";
pub const CONFLICTS_STEM: &str = "merge_conflicts";

// Charts
pub const SUMMARY_CHART_MARKER: &str = "glance";
pub const NATIONAL_ROW_NAME: &str = "india";
/// Series with this many points or fewer are national-vs-state pairs.
pub const MIN_SUMMARY_POINTS: usize = 2;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

pub fn group_results_file(group: u32) -> String {
    format!("{GROUP_RESULTS_PREFIX}{group}{GROUP_RESULTS_SUFFIX}")
}

pub fn group_data_file(group: u32) -> String {
    format!("{GROUP_RESULTS_PREFIX}{group}{GROUP_DATA_SUFFIX}")
}
