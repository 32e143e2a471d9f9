// src/model.rs
//
// Canonical record types.
//
// - Chart / Series / Point: one captured chart, with point names already
//   resolved to a plain string (see `NameField`).
// - StageEntry / FlatRecord: the two batch JSON shapes the normalizer accepts.
// - Observation: one output row per (state, district, stage, competency).

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/* ---------------- Stage / Subject ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Foundational Stage")]
    Foundational,
    #[serde(rename = "Preparatory Stage")]
    Preparatory,
    #[serde(rename = "Middle Stage")]
    Middle,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Foundational, Stage::Preparatory, Stage::Middle];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Foundational => "Foundational Stage",
            Stage::Preparatory  => "Preparatory Stage",
            Stage::Middle       => "Middle Stage",
        }
    }

    /// Pedagogical order used for sorting (1..=3), not lexical order.
    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Foundational => 1,
            Stage::Preparatory  => 2,
            Stage::Middle       => 3,
        }
    }

    /// Dashboard `?tab=` key.
    pub fn tab_key(self) -> &'static str {
        match self {
            Stage::Foundational => "foundation",
            Stage::Preparatory  => "preparatory",
            Stage::Middle       => "middle",
        }
    }

    pub fn grade(self) -> u8 {
        match self {
            Stage::Foundational => 3,
            Stage::Preparatory  => 6,
            Stage::Middle       => 9,
        }
    }

    /// Stem of the stage-partitioned export file.
    pub fn file_stem(self) -> &'static str {
        match self {
            Stage::Foundational => "foundational_stage",
            Stage::Preparatory  => "preparatory_stage",
            Stage::Middle       => "middle_stage",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = String;

    /// Accepts the full label ("Middle Stage"), the bare word ("Middle")
    /// or the dashboard tab key ("foundation"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lc = s.trim().to_ascii_lowercase();
        let word = lc.strip_suffix(" stage").unwrap_or(&lc);
        match word {
            "foundational" | "foundation" => Ok(Stage::Foundational),
            "preparatory"                 => Ok(Stage::Preparatory),
            "middle"                      => Ok(Stage::Middle),
            _ => Err(format!("unknown stage: {s:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    Language,
    Mathematics,
    Science,
    #[serde(rename = "Social Science")]
    SocialScience,
    #[serde(rename = "World Around Us")]
    WorldAroundUs,
}

impl Subject {
    pub fn label(self) -> &'static str {
        match self {
            Subject::Language      => "Language",
            Subject::Mathematics   => "Mathematics",
            Subject::Science       => "Science",
            Subject::SocialScience => "Social Science",
            Subject::WorldAroundUs => "World Around Us",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subject {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "language"        => Ok(Subject::Language),
            "mathematics"     => Ok(Subject::Mathematics),
            "science"         => Ok(Subject::Science),
            "social science"  => Ok(Subject::SocialScience),
            "world around us" => Ok(Subject::WorldAroundUs),
            _ => Err(format!("unknown subject: {s:?}")),
        }
    }
}

/* ---------------- Captured chart data ---------------- */

/// A point's `name` as the charting library hands it over: sometimes a
/// plain string, sometimes a point/node object carrying `name` and
/// `userOptions`. Anything else lands in `Other` so one odd point never
/// fails the whole file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NameField {
    Plain(String),
    Structured {
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "userOptions")]
        user_options: Option<Value>,
    },
    Other(Value),
}

impl NameField {
    /// Canonical, trimmed display name. Empty when nothing usable is present.
    pub fn resolve(&self) -> String {
        match self {
            NameField::Plain(s) => s.trim().to_string(),
            NameField::Structured { name, user_options } => {
                let primary = name.as_deref().map(str::trim).unwrap_or("");
                if !primary.is_empty() {
                    return primary.to_string();
                }
                match user_options {
                    Some(Value::String(s)) => s.trim().to_string(),
                    Some(Value::Object(map)) => map
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .unwrap_or_default(),
                    _ => s!(),
                }
            }
            NameField::Other(Value::Number(n)) => n.to_string(),
            NameField::Other(_) => s!(),
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(default)]
    name: Option<NameField>,
    #[serde(default)]
    y: Option<Value>,
}

/// One chart point with its name resolved at ingestion.
/// `score` is `None` when `y` is null, missing, or not a number.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawPoint")]
pub struct Point {
    pub name: String,
    pub score: Option<f64>,
}

impl From<RawPoint> for Point {
    fn from(raw: RawPoint) -> Self {
        Self {
            name: raw.name.map(|n| n.resolve()).unwrap_or_default(),
            score: raw.y.as_ref().and_then(Value::as_f64),
        }
    }
}

impl Point {
    pub fn new(name: &str, score: Option<f64>) -> Self {
        Self { name: s!(name), score }
    }
}

/// One chart series. Points that do not decode are left out and counted in
/// `dropped`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawSeries")]
pub struct Series {
    pub name: String,
    pub data: Vec<Point>,
    pub dropped: usize,
}

#[derive(Deserialize)]
struct RawSeries {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    data: Value,
}

impl From<RawSeries> for Series {
    fn from(raw: RawSeries) -> Self {
        let (data, dropped) = decode_each(raw.data, "point");
        Self { name: raw.name, data, dropped }
    }
}

/// One chart. Series that do not decode are counted in `dropped`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawChart")]
pub struct Chart {
    pub title: String,
    pub series: Vec<Series>,
    pub dropped: usize,
}

#[derive(Deserialize)]
struct RawChart {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    series: Value,
}

impl From<RawChart> for Chart {
    fn from(raw: RawChart) -> Self {
        let (series, dropped) = decode_each(raw.series, "series");
        Self { title: raw.title, series, dropped }
    }
}

/* ---------------- Batch JSON shapes ---------------- */

/// Nested shape: every chart captured for one (state, stage).
/// Charts that do not decode are counted in `dropped`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawStageEntry")]
pub struct StageEntry {
    pub state: String,
    pub stage: String,
    pub charts: Vec<Chart>,
    pub dropped: usize,
}

#[derive(Deserialize)]
struct RawStageEntry {
    state: String,
    stage: String,
    charts: Value,
}

impl From<RawStageEntry> for StageEntry {
    fn from(raw: RawStageEntry) -> Self {
        let (charts, dropped) = decode_each(raw.charts, "chart");
        Self { state: raw.state, stage: raw.stage, charts, dropped }
    }
}

/// Flat shape written by incremental group collection: one point per record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawFlatRecord")]
pub struct FlatRecord {
    pub state: String,
    pub stage: String,
    pub competency_code: String,
    pub chart_title: String,
    pub series_name: String,
    pub data: Vec<Point>,
    pub dropped: usize,
}

#[derive(Deserialize)]
struct RawFlatRecord {
    state: String,
    stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    competency_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    chart_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    series_name: String,
    data: Value,
}

impl From<RawFlatRecord> for FlatRecord {
    fn from(raw: RawFlatRecord) -> Self {
        let (data, dropped) = decode_each(raw.data, "point");
        Self {
            state: raw.state,
            stage: raw.stage,
            competency_code: raw.competency_code,
            chart_title: raw.chart_title,
            series_name: raw.series_name,
            data,
            dropped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Nested(StageEntry),
    Flat(FlatRecord),
}

/* ---------------- Output rows ---------------- */

#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub state: String,
    pub district: String,
    pub stage: Stage,
    pub subject: Subject,
    pub competency_code: String,
    pub description: String,
    pub score: f64,
}

/// Natural dedup key: (state, district, stage, competency_code).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationKey {
    pub state: String,
    pub district: String,
    pub stage: Stage,
    pub competency_code: String,
}

impl Observation {
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            state: self.state.clone(),
            district: self.district.clone(),
            stage: self.stage,
            competency_code: self.competency_code.clone(),
        }
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {} / {}", self.state, self.district, self.stage, self.competency_code)
    }
}

/// Decode a JSON array element by element. Elements that do not decode are
/// logged and counted; `null` is an empty list and any other non-array
/// value counts as one dropped element.
pub fn decode_each<T: DeserializeOwned>(value: Value, what: &str) -> (Vec<T>, usize) {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return (Vec::new(), 0),
        other => {
            logd!("{what} list is not an array: {other}");
            return (Vec::new(), 1);
        }
    };
    let mut out = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for (i, v) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(v) {
            Ok(t) => out.push(t),
            Err(e) => {
                dropped += 1;
                logd!("{what} #{i} skipped: {e}");
            }
        }
    }
    (out, dropped)
}

/// `deserialize_with` form of [`decode_each`] for lists whose skips only
/// need logging.
pub(crate) fn lenient_vec<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(decode_each(Value::deserialize(de)?, "item").0)
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
