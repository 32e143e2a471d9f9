// src/normalize.rs
//! Raw chart captures → `Observation` rows.
//!
//! ## Filtering
//! - Charts whose title mentions "glance" are multi-subject summaries and
//!   are dropped, as are charts with no competency code in the title.
//! - Series with two points or fewer are the national-vs-state pair, not a
//!   district breakdown. Flat records are exempt: the collector already
//!   applied this rule before it split series into single points.
//! - Points without a score, without a name, named "India" or named after
//!   the state itself are aggregates and are dropped. Scores outside
//!   0..=100 are treated as malformed.
//!
//! ## Subject resolution
//! First hit wins: (stage, code) table, then series-name prefix, then the
//! ordered keyword sets over the title. With no hit the series is dropped.
//!
//! Nothing here is fatal; every drop is counted in `NormalizeStats` and
//! logged at debug level.

use crate::config::Taxonomy;
use crate::config::consts::{MIN_SUMMARY_POINTS, NATIONAL_ROW_NAME, SCORE_MAX, SCORE_MIN, SUMMARY_CHART_MARKER};
use crate::core::sanitize::{competency_code, contains_ci, eq_ci, normalize_ws, round2};
use crate::model::{BatchEntry, Chart, FlatRecord, Observation, Point, Stage, StageEntry, Subject};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub entries_skipped: usize,
    pub charts_seen: usize,
    pub charts_summary: usize,
    pub charts_no_code: usize,
    pub series_short: usize,
    pub series_no_subject: usize,
    pub points_dropped: usize,
    /// Elements that were not valid JSON for their type, by level.
    pub charts_malformed: usize,
    pub series_malformed: usize,
    pub points_malformed: usize,
    pub rows: usize,
}

pub struct Normalized {
    pub rows: Vec<Observation>,
    pub stats: NormalizeStats,
}

/// One chart-level unit of work: the title, its code and the state/stage it
/// was captured under.
struct ChartContext<'a> {
    state: &'a str,
    stage: Stage,
    title: &'a str,
    code: &'a str,
}

pub struct Normalizer<'t> {
    taxonomy: &'t Taxonomy,
}

impl<'t> Normalizer<'t> {
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn normalize_batch(&self, entries: &[BatchEntry]) -> Normalized {
        let mut rows = Vec::new();
        let mut stats = NormalizeStats::default();
        for entry in entries {
            self.normalize_entry(entry, &mut rows, &mut stats);
        }
        stats.rows = rows.len();
        Normalized { rows, stats }
    }

    pub fn normalize_entry(&self, entry: &BatchEntry, out: &mut Vec<Observation>, stats: &mut NormalizeStats) {
        match entry {
            BatchEntry::Nested(e) => self.normalize_stage_entry(e, out, stats),
            BatchEntry::Flat(r) => self.normalize_flat(r, out, stats),
        }
    }

    fn normalize_stage_entry(&self, entry: &StageEntry, out: &mut Vec<Observation>, stats: &mut NormalizeStats) {
        let Some(stage) = parse_stage(&entry.state, &entry.stage, stats) else { return };
        stats.charts_malformed += entry.dropped;
        for chart in &entry.charts {
            self.normalize_chart(&entry.state, stage, chart, out, stats);
        }
    }

    /// Rows for every district point in one chart.
    pub fn normalize_chart(
        &self,
        state: &str,
        stage: Stage,
        chart: &Chart,
        out: &mut Vec<Observation>,
        stats: &mut NormalizeStats,
    ) {
        stats.charts_seen += 1;
        stats.series_malformed += chart.dropped;
        let Some(ctx) = chart_context(state, stage, &chart.title, &chart.title, stats) else { return };

        for series in &chart.series {
            stats.points_malformed += series.dropped;
            if series.data.len() <= MIN_SUMMARY_POINTS {
                stats.series_short += 1;
                continue;
            }
            let Some(subject) = self.resolve_subject(stage, ctx.code, &series.name, ctx.title) else {
                stats.series_no_subject += 1;
                logd!("{state}/{stage}: no subject for {:?} (series {:?})", ctx.title, series.name);
                continue;
            };
            self.emit_points(&ctx, subject, &series.data, out, stats);
        }
    }

    /// Rows for one flat record.
    pub fn normalize_flat(&self, rec: &FlatRecord, out: &mut Vec<Observation>, stats: &mut NormalizeStats) {
        let Some(stage) = parse_stage(&rec.state, &rec.stage, stats) else { return };
        stats.charts_seen += 1;
        stats.points_malformed += rec.dropped;
        let Some(ctx) = chart_context(&rec.state, stage, &rec.chart_title, &rec.competency_code, stats) else { return };

        let Some(subject) = self.resolve_subject(stage, ctx.code, &rec.series_name, ctx.title) else {
            stats.series_no_subject += 1;
            logd!("{}/{stage}: no subject for {:?}", rec.state, ctx.title);
            return;
        };
        self.emit_points(&ctx, subject, &rec.data, out, stats);
    }

    pub fn resolve_subject(&self, stage: Stage, code: &str, series_name: &str, title: &str) -> Option<Subject> {
        self.taxonomy
            .subject_for_code(stage, code)
            .or_else(|| self.taxonomy.subject_for_series(series_name))
            .or_else(|| self.taxonomy.subject_for_title(title))
    }

    fn emit_points(
        &self,
        ctx: &ChartContext<'_>,
        subject: Subject,
        points: &[Point],
        out: &mut Vec<Observation>,
        stats: &mut NormalizeStats,
    ) {
        for p in points {
            match district_score(ctx.state, p) {
                Some((district, score)) => out.push(Observation {
                    state: s!(ctx.state),
                    district,
                    stage: ctx.stage,
                    subject,
                    competency_code: s!(ctx.code),
                    description: s!(ctx.title.trim()),
                    score,
                }),
                None => stats.points_dropped += 1,
            }
        }
    }
}

fn parse_stage(state: &str, stage: &str, stats: &mut NormalizeStats) -> Option<Stage> {
    match stage.parse::<Stage>() {
        Ok(s) => Some(s),
        Err(e) => {
            stats.entries_skipped += 1;
            logw!("{state}: entry skipped: {e}");
            None
        }
    }
}

/// Applies the chart-level exclusions. `code_source` is searched for the
/// competency code first, then the title.
fn chart_context<'a>(
    state: &'a str,
    stage: Stage,
    title: &'a str,
    code_source: &'a str,
    stats: &mut NormalizeStats,
) -> Option<ChartContext<'a>> {
    if contains_ci(title, SUMMARY_CHART_MARKER) {
        stats.charts_summary += 1;
        logd!("{state}/{stage}: summary chart skipped: {title:?}");
        return None;
    }
    let Some(code) = competency_code(code_source).or_else(|| competency_code(title)) else {
        stats.charts_no_code += 1;
        logd!("{state}/{stage}: no competency code in {title:?}");
        return None;
    };
    Some(ChartContext { state, stage, title, code })
}

/// District name and rounded score, or `None` for aggregate/malformed points.
fn district_score(state: &str, p: &Point) -> Option<(String, f64)> {
    let score = p.score?;
    let name = normalize_ws(&p.name);
    if name.is_empty() || eq_ci(&name, NATIONAL_ROW_NAME) || eq_ci(&name, state) {
        return None;
    }
    if !score.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        logd!("{state}/{name}: score {score} out of range");
        return None;
    }
    Some((name, round2(score)))
}
