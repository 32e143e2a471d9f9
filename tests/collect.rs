// tests/collect.rs
use std::fs;

use parakh_scrape::config::Taxonomy;
use parakh_scrape::config::options::ExportOptions;
use parakh_scrape::progress::Progress;
use parakh_scrape::runner;
use parakh_scrape::store;

const SNAPSHOTS: &str = r#"[
  { "state": "Assam", "stage": "Middle Stage",
    "option": "C-3.2 Classifies matter around us",
    "charts": [
      { "title": "All competencies for Science at a glance",
        "series": [ { "name": "MSSC", "data": [ {"name":"a","y":1}, {"name":"b","y":2}, {"name":"c","y":3} ] } ] },
      { "title": "C-3.2 Classifies matter around us",
        "series": [
          { "name": "MSSC", "data": [ {"name":"India","y":61.2}, {"name":"Assam","y":57.8} ] },
          { "name": "MSSC", "data": [ {"name":"Kamrup","y":62.0}, {"name":"Dibrugarh","y":48.0}, {"name":"Cachar","y":null} ] }
        ] }
    ] },
  { "state": "Assam", "stage": "Preparatory Stage", "option": "C-3.1 Observes", "error": "navigation timed out" },
  { "state": "Goa", "stage": "Middle Stage", "option": "C-1.2 Fractions", "charts": [] },
  { "nonsense": true }
]"#;

#[derive(Default)]
struct Tally {
    lines: Vec<String>,
    done: usize,
    failed: usize,
}

impl Progress for Tally {
    fn log(&mut self, msg: &str) {
        self.lines.push(msg.to_string());
    }
    fn item_done(&mut self, _label: &str, _count: usize) {
        self.done += 1;
    }
    fn item_failed(&mut self, _label: &str, _err: &str) {
        self.failed += 1;
    }
}

#[test]
fn snapshots_flow_through_convert() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("snapshots.json"), SNAPSHOTS).unwrap();
    let export = ExportOptions { dir: tmp.path().to_path_buf(), ..Default::default() };
    let t = Taxonomy::default();

    let collected =
        runner::collect_group(&t, &export, 4, &tmp.path().join("snapshots.json"), None).unwrap();
    assert_eq!(collected.files_written, vec![tmp.path().join("group4_results.json")]);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&collected.files_written[0]).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["competency_code"], "C-3.2");
    assert_eq!(records[0]["data"][0]["name"]["userOptions"], "Kamrup");

    let converted = runner::convert_group(&t, &export, 4, None).unwrap();
    let rows = store::load_observations(&converted.path).unwrap().rows;
    let got: Vec<(&str, f64)> = rows.iter().map(|o| (o.district.as_str(), o.score)).collect();
    assert_eq!(got, vec![("Dibrugarh", 48.0), ("Kamrup", 62.0)]);
    assert!(rows.iter().all(|o| o.subject.label() == "Science"));
}

#[test]
fn group_without_data_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("snapshots.json"), SNAPSHOTS).unwrap();
    let export = ExportOptions { dir: tmp.path().to_path_buf(), ..Default::default() };

    let s = runner::collect_group(&Taxonomy::default(), &export, 1, &tmp.path().join("snapshots.json"), None)
        .unwrap();
    assert!(s.files_written.is_empty());
    assert!(!tmp.path().join("group1_results.json").exists());
}

#[test]
fn progress_sink_sees_the_whole_collection() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("snapshots.json"), SNAPSHOTS).unwrap();
    let export = ExportOptions { dir: tmp.path().to_path_buf(), ..Default::default() };
    let mut tally = Tally::default();

    let s = runner::collect_group(
        &Taxonomy::default(), &export, 4, &tmp.path().join("snapshots.json"), Some(&mut tally),
    )
    .unwrap();
    assert_eq!(s.files_written.len(), 1);
    assert_eq!(tally.done, 1);
    assert_eq!(tally.failed, 1);
    assert!(tally.lines.first().unwrap().starts_with("GROUP 4: Assam"));
    assert!(tally.lines.last().unwrap().starts_with("Saved 2 records"));
}
