// src/collect.rs
//! Offline half of collection.
//!
//! A browser session (outside this crate) walks every target from [`plan`],
//! selects each competency option in the dashboard's dropdowns and dumps the
//! charting library's in-memory chart list after each selection. Those dumps
//! are [`Snapshot`]s. This module turns them into flat batch records, one
//! district point per record, the shape `ingest` reads back.
//!
//! ```text
//! plan(group) → (browser) → snapshots.json → collect_group → group<N>_results.json
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::Taxonomy;
use crate::config::consts::{DASHBOARD_BASE, MIN_SUMMARY_POINTS, SUMMARY_CHART_MARKER};
use crate::core::sanitize::{contains_ci, is_competency_option};
use crate::error::Result;
use crate::model::{Chart, Stage};
use crate::progress::Progress;

/// One (state, stage) page to visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub state_code: String,
    pub state_name: String,
    pub stage: Stage,
    pub url: String,
}

pub fn dashboard_url(state_code: &str, stage: Stage) -> String {
    format!("{DASHBOARD_BASE}{state_code}?tab={}", stage.tab_key())
}

/// Targets for a group: states in group order, each with all three stages.
pub fn plan(taxonomy: &Taxonomy, group: u32) -> Result<Vec<Target>> {
    let states = taxonomy.group(group)?;
    Ok(states
        .iter()
        .flat_map(|st| {
            Stage::ALL.iter().map(move |&stage| Target {
                state_code: st.code.clone(),
                state_name: st.name.clone(),
                stage,
                url: dashboard_url(&st.code, stage),
            })
        })
        .collect())
}

/// Dropdown entries that name a competency ("C-4.1 Understands …").
pub fn competency_options<S: AsRef<str>>(options: &[S]) -> Vec<String> {
    options
        .iter()
        .map(|o| o.as_ref().trim())
        .filter(|o| is_competency_option(o))
        .map(String::from)
        .collect()
}

/// Chart list captured with one competency option selected.
/// `error` is set when the page could not be loaded or read.
#[derive(Clone, Debug, Deserialize)]
pub struct Snapshot {
    pub state: String,
    pub stage: String,
    #[serde(default)]
    pub option: String,
    #[serde(default, deserialize_with = "crate::model::lenient_vec")]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointName {
    #[serde(rename = "userOptions")]
    pub user_options: String,
    pub name: String,
    pub parent: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatPoint {
    pub name: PointName,
    pub y: f64,
    pub x: i64,
}

/// Serialized form of `model::FlatRecord`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatRecordOut {
    pub state: String,
    pub stage: String,
    pub competency_code: String,
    pub chart_title: String,
    pub series_name: String,
    pub data: Vec<FlatPoint>,
}

/// Flatten the charts captured for one selected option.
///
/// Kept: charts whose title contains the option text and is not a summary
/// chart; series with more than two points; points with a name and a score.
pub fn flatten_snapshot(state: &str, stage: Stage, option_text: &str, charts: &[Chart]) -> Vec<FlatRecordOut> {
    let code = option_text.split_whitespace().next().unwrap_or("");
    let mut out = Vec::new();

    for chart in charts {
        let title = chart.title.as_str();
        if contains_ci(title, SUMMARY_CHART_MARKER) || !title.contains(option_text) {
            continue;
        }
        for series in &chart.series {
            if series.data.len() <= MIN_SUMMARY_POINTS {
                continue;
            }
            for (x, point) in series.data.iter().enumerate() {
                let name = point.name.trim();
                let Some(score) = point.score else { continue };
                if name.is_empty() {
                    continue;
                }
                out.push(FlatRecordOut {
                    state: s!(state),
                    stage: s!(stage.label()),
                    competency_code: s!(code),
                    chart_title: s!(title),
                    series_name: series.name.clone(),
                    data: vec![FlatPoint {
                        name: PointName { user_options: s!(name), name: s!(name), parent: None },
                        y: score,
                        x: x as i64,
                    }],
                });
            }
        }
    }
    out
}

/// Flatten every snapshot that belongs to `group`. Failed or unreadable
/// snapshots are logged and skipped; the rest of the group continues.
pub fn collect_group(
    taxonomy: &Taxonomy,
    group: u32,
    snapshots: &[Snapshot],
    mut progress: Option<&mut dyn Progress>,
) -> Result<Vec<FlatRecordOut>> {
    let states: HashSet<&str> = taxonomy.group(group)?.iter().map(|s| s.name.as_str()).collect();
    let mine: Vec<&Snapshot> = snapshots.iter().filter(|s| states.contains(s.state.as_str())).collect();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(mine.len());
    }

    let mut out = Vec::new();
    for snap in mine {
        let label = format!("{} - {} - {}", snap.state, snap.stage, snap.option);
        if let Some(err) = &snap.error {
            loge!("{label}: {err}");
            if let Some(p) = progress.as_deref_mut() { p.item_failed(&label, err); }
            continue;
        }
        let stage = match snap.stage.parse::<Stage>() {
            Ok(s) => s,
            Err(e) => {
                loge!("{label}: {e}");
                if let Some(p) = progress.as_deref_mut() { p.item_failed(&label, &e); }
                continue;
            }
        };
        let Some(option) = competency_options(std::slice::from_ref(&snap.option)).pop() else {
            logd!("{label}: not a competency option, skipped");
            continue;
        };
        let records = flatten_snapshot(&snap.state, stage, &option, &snap.charts);
        logd!("{label}: {} records", records.len());
        if let Some(p) = progress.as_deref_mut() { p.item_done(&label, records.len()); }
        out.extend(records);
    }

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Series};

    fn sample_charts() -> Vec<Chart> {
        vec![
            Chart {
                title: s!("All competencies for Science at a glance"),
                series: vec![Series {
                    name: s!("MSSC"),
                    data: vec![Point::new("A", Some(1.0)), Point::new("B", Some(1.0)), Point::new("C", Some(1.0))],
                    ..Default::default()
                }],
                ..Default::default()
            },
            Chart {
                title: s!("C-3.2 Classifies matter around us"),
                series: vec![
                    Series {
                        name: s!("MSSC"),
                        data: vec![Point::new("India", Some(70.0)), Point::new("Assam", Some(55.0))],
                        ..Default::default()
                    },
                    Series {
                        name: s!("MSSC"),
                        data: vec![
                            Point::new("Kamrup", Some(62.0)),
                            Point::new(" ", Some(10.0)),
                            Point::new("Dibrugarh", Some(48.0)),
                            Point::new("Cachar", None),
                        ],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            Chart {
                title: s!("C-2.2 Something else"),
                series: vec![Series {
                    name: s!("MSSC"),
                    data: vec![Point::new("A", Some(1.0)), Point::new("B", Some(1.0)), Point::new("C", Some(1.0))],
                    ..Default::default()
                }],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn plan_covers_every_state_and_stage() {
        let t = plan(&Taxonomy::default(), 4).unwrap();
        assert_eq!(t.len(), 15);
        assert_eq!(t[0].state_name, "Assam");
        assert_eq!(t[0].stage, Stage::Foundational);
        assert_eq!(t[0].url, "https://dashboard.parakh.ncert.gov.in/en/dashboard/IND18?tab=foundation");
        assert_eq!(t[2].stage, Stage::Middle);
        assert!(plan(&Taxonomy::default(), 0).is_err());
    }

    #[test]
    fn padded_option_text_still_matches_its_chart() {
        let snaps = vec![Snapshot {
            state: s!("Assam"), stage: s!("Middle Stage"),
            option: s!("  C-3.2 Classifies matter around us \n"),
            charts: sample_charts(), error: None,
        }];
        let out = collect_group(&Taxonomy::default(), 4, &snaps, None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].competency_code, "C-3.2");
    }

    #[test]
    fn options_filter() {
        let opts = competency_options(&["Select", " C-3.2 Classifies matter ", "C-4 Broken"]);
        assert_eq!(opts, vec!["C-3.2 Classifies matter"]);
    }

    #[test]
    fn flattens_only_the_selected_chart() {
        let recs = flatten_snapshot("Assam", Stage::Middle, "C-3.2 Classifies matter around us", &sample_charts());
        let names: Vec<&str> = recs.iter().map(|r| r.data[0].name.name.as_str()).collect();
        assert_eq!(names, vec!["Kamrup", "Dibrugarh"]);
        assert_eq!(recs[0].competency_code, "C-3.2");
        assert_eq!(recs[0].stage, "Middle Stage");
        assert_eq!(recs[1].data[0].x, 2);
    }

    #[test]
    fn group_collection_skips_failures_and_other_states() {
        let snaps = vec![
            Snapshot {
                state: s!("Assam"), stage: s!("Middle Stage"),
                option: s!("C-3.2 Classifies matter around us"),
                charts: sample_charts(), error: None,
            },
            Snapshot {
                state: s!("Assam"), stage: s!("Preparatory Stage"),
                option: s!("C-3.1 x"), charts: vec![], error: Some(s!("timeout")),
            },
            Snapshot {
                state: s!("Goa"), stage: s!("Middle Stage"),
                option: s!("C-3.2 Classifies matter around us"),
                charts: sample_charts(), error: None,
            },
        ];
        let out = collect_group(&Taxonomy::default(), 4, &snaps, None).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.state == "Assam"));
    }
}
