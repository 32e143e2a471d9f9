// src/config/taxonomy.rs
//! Lookup tables the normalizer and merger run against.
//!
//! Everything here is data: which subject a (stage, competency) belongs to,
//! which series-name prefixes imply a subject, the ordered keyword sets used
//! as a last resort, the state→code table and the state groups used for
//! batch collection. `Taxonomy::default()` is the built-in PARAKH framework;
//! `Taxonomy::load` swaps in a JSON file, with absent sections falling back
//! to the built-in tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::model::{Stage, Subject};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRef {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub subject: Subject,
    pub words: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    /// stage → competency code → subject
    pub competency_subjects: BTreeMap<Stage, BTreeMap<String, Subject>>,
    /// Ordered; first prefix that matches the series name wins.
    pub series_prefixes: Vec<(String, Subject)>,
    /// Ordered; first set with a word contained in the title wins.
    pub keywords: Vec<KeywordSet>,
    /// state name → state code
    pub state_codes: BTreeMap<String, String>,
    /// group number → states, in collection order
    pub groups: BTreeMap<u32, Vec<StateRef>>,
}

impl Taxonomy {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut tax: Taxonomy = serde_json::from_str(&text)?;
        for set in &mut tax.keywords {
            for w in &mut set.words {
                *w = w.trim().to_lowercase();
            }
        }
        tax.validate()?;
        logf!("taxonomy loaded from {}", path.display());
        Ok(tax)
    }

    fn validate(&self) -> Result<()> {
        if let Some((p, _)) = self.series_prefixes.iter().find(|(p, _)| p.trim().is_empty()) {
            return Err(PipelineError::Taxonomy(format!("empty series prefix {p:?}")));
        }
        if let Some(set) = self.keywords.iter().find(|k| k.words.iter().any(|w| w.is_empty())) {
            return Err(PipelineError::Taxonomy(format!("empty keyword in {} set", set.subject)));
        }
        if let Some((g, _)) = self.groups.iter().find(|(_, states)| states.is_empty()) {
            return Err(PipelineError::Taxonomy(format!("group {g} has no states")));
        }
        Ok(())
    }

    pub fn subject_for_code(&self, stage: Stage, code: &str) -> Option<Subject> {
        self.competency_subjects.get(&stage)?.get(code).copied()
    }

    pub fn subject_for_series(&self, series_name: &str) -> Option<Subject> {
        self.series_prefixes
            .iter()
            .find(|(prefix, _)| series_name.starts_with(prefix.as_str()))
            .map(|(_, subject)| *subject)
    }

    pub fn subject_for_title(&self, title: &str) -> Option<Subject> {
        let lc = title.to_lowercase();
        self.keywords
            .iter()
            .find(|set| set.words.iter().any(|w| lc.contains(w.as_str())))
            .map(|set| set.subject)
    }

    /// Empty string when the state is not in the table.
    pub fn state_code(&self, state: &str) -> &str {
        self.state_codes.get(state).map(String::as_str).unwrap_or("")
    }

    pub fn group(&self, group: u32) -> Result<&[StateRef]> {
        self.groups
            .get(&group)
            .map(Vec::as_slice)
            .ok_or_else(|| PipelineError::UnknownGroup {
                group,
                known: self.groups.keys().map(u32::to_string).collect::<Vec<_>>().join(", "),
            })
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        use Subject::*;

        let code_table = |pairs: &[(&str, Subject)]| -> BTreeMap<String, Subject> {
            pairs.iter().map(|(c, s)| (s!(*c), *s)).collect()
        };

        let mut competency_subjects = BTreeMap::new();
        competency_subjects.insert(Stage::Foundational, code_table(&[
            ("C-10.5", Language), ("C-10.7", Language), ("C-9.7", Language),
            ("C-8.1", Mathematics), ("C-8.2", Mathematics), ("C-8.4", Mathematics),
            ("C-8.5", Mathematics), ("C-8.6", Mathematics), ("C-8.7", Mathematics),
            ("C-8.8", Mathematics), ("C-8.9", Mathematics), ("C-8.10", Mathematics),
            ("C-8.11", Mathematics), ("C-8.12", Mathematics), ("C-8.13", Mathematics),
        ]));
        competency_subjects.insert(Stage::Preparatory, code_table(&[
            ("C-2.1", Language), ("C-2.2", Language),
            ("C-1.1", Mathematics), ("C-1.2", Mathematics), ("C-1.3", Mathematics),
            ("C-1.4", Mathematics), ("C-2.4", Mathematics), ("C-3.3", Mathematics),
            ("C-3.5", Mathematics), ("C-4.1", Mathematics), ("C-4.3", Mathematics),
            ("C-3.1", WorldAroundUs), ("C-3.2", WorldAroundUs),
            ("C-4.7", WorldAroundUs), ("C-5.3", WorldAroundUs),
        ]));
        competency_subjects.insert(Stage::Middle, code_table(&[
            ("C-1.1", Language),
            ("C-1.2", Mathematics), ("C-2.1", Mathematics), ("C-3.1", Mathematics),
            ("C-4.1", Mathematics), ("C-5.1", Mathematics), ("C-6.1", Mathematics),
            ("C-2.2", Science), ("C-2.3", Science), ("C-2.4", Science),
            ("C-3.2", Science), ("C-4.3", Science), ("C-7.3", Science),
            ("C-1.4", SocialScience), ("C-4.2", SocialScience), ("C-6.2", SocialScience),
            ("C-6.3", SocialScience), ("C-6.4", SocialScience), ("C-7.1", SocialScience),
            ("C-7.2", SocialScience), ("C-8.2", SocialScience), ("C-8.3", SocialScience),
            ("C-9.1", SocialScience),
        ]));

        let series_prefixes = [
            ("FSLANG", Language), ("FSMAT", Mathematics),
            ("PSLANG", Language), ("PSMAT", Mathematics), ("PSWAU", WorldAroundUs),
            ("MSLANG", Language), ("MSMAT", Mathematics), ("MSSC", Science), ("MSSS", SocialScience),
        ]
        .iter()
        .map(|(p, s)| (s!(*p), *s))
        .collect();

        let set = |subject: Subject, words: &[&str]| KeywordSet {
            subject,
            words: words.iter().map(|w| s!(*w)).collect(),
        };
        let keywords = vec![
            set(WorldAroundUs, &[
                "natural", "insects", "plants", "birds", "animals", "environment", "sun",
                "moon", "stars", "planets", "resources", "houses", "relationships",
                "geographical features",
            ]),
            set(Language, &[
                "reading", "listening", "comprehension", "stories", "summarises",
                "editorials", "reports", "articles", "text", "visualising",
            ]),
            set(Mathematics, &[
                "numbers", "place value", "patterns", "multiples", "powers", "prime",
                "fractions", "ratio", "shapes", "geometric", "mathematics", "math",
            ]),
            set(Science, &[
                "matter", "solid", "liquid", "gas", "density", "magnetic", "conducting",
                "chemical", "physical", "cells", "photosynthesis", "reproduction",
                "inheritance", "motion", "friction", "pressure", "force", "classifies matter",
            ]),
            set(SocialScience, &[
                "historical", "cultural", "socio-political", "government", "society",
                "archaeological", "sources", "primary and secondary",
            ]),
        ];

        let states: &[(&str, &str)] = &[
            ("IND01", "Jammu & Kashmir"),
            ("IND02", "Himachal Pradesh"),
            ("IND03", "Punjab"),
            ("IND04", "Chandigarh"),
            ("IND05", "Uttarakhand"),
            ("IND06", "Haryana"),
            ("IND07", "NCT of Delhi"),
            ("IND08", "Rajasthan"),
            ("IND09", "Uttar Pradesh"),
            ("IND10", "Bihar"),
            ("IND11", "Sikkim"),
            ("IND12", "Arunachal Pradesh"),
            ("IND13", "Nagaland"),
            ("IND14", "Manipur"),
            ("IND15", "Mizoram"),
            ("IND16", "Tripura"),
            ("IND17", "Meghalaya"),
            ("IND18", "Assam"),
            ("IND19", "West Bengal"),
            ("IND20", "Jharkhand"),
            ("IND21", "Odisha"),
            ("IND22", "Chhattisgarh"),
            ("IND23", "Madhya Pradesh"),
            ("IND24", "Gujarat"),
            ("IND27", "Maharashtra"),
            ("IND28", "Andhra Pradesh"),
            ("IND29", "Karnataka"),
            ("IND30", "Goa"),
            ("IND31", "Lakshadweep"),
            ("IND32", "Kerala"),
            ("IND33", "Tamil Nadu"),
            ("IND34", "Puducherry"),
            ("IND35", "Andaman & Nicobar Islands"),
            ("IND36", "Telangana"),
            ("IND37", "Ladakh"),
            ("IND38", "Daman & Diu and Dadra & Nagar Haveli"),
        ];
        let state_codes = states.iter().map(|(c, n)| (s!(*n), s!(*c))).collect();

        let state_ref = |code: &str| StateRef {
            code: s!(code),
            name: states
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, n)| s!(*n))
                .unwrap_or_default(),
        };
        let group_codes: [(u32, [&str; 5]); 6] = [
            (1, ["IND02", "IND03", "IND04", "IND05", "IND06"]),
            (2, ["IND07", "IND09", "IND10", "IND11", "IND12"]),
            (3, ["IND13", "IND14", "IND15", "IND16", "IND17"]),
            (4, ["IND18", "IND19", "IND21", "IND23", "IND24"]),
            (5, ["IND27", "IND29", "IND30", "IND31", "IND33"]),
            (6, ["IND34", "IND35", "IND36", "IND37", "IND38"]),
        ];
        let groups = group_codes
            .iter()
            .map(|(g, codes)| (*g, codes.iter().map(|c| state_ref(*c)).collect()))
            .collect();

        Self { competency_subjects, series_prefixes, keywords, state_codes, groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_is_stage_scoped() {
        let t = Taxonomy::default();
        assert_eq!(t.subject_for_code(Stage::Middle, "C-3.2"), Some(Subject::Science));
        assert_eq!(t.subject_for_code(Stage::Preparatory, "C-3.2"), Some(Subject::WorldAroundUs));
        assert_eq!(t.subject_for_code(Stage::Foundational, "C-3.2"), None);
    }

    #[test]
    fn series_prefix_lookup() {
        let t = Taxonomy::default();
        assert_eq!(t.subject_for_series("MSSC_C-3.2"), Some(Subject::Science));
        assert_eq!(t.subject_for_series("MSSS"), Some(Subject::SocialScience));
        assert_eq!(t.subject_for_series("Series 1"), None);
    }

    #[test]
    fn keyword_sets_are_checked_in_order() {
        let t = Taxonomy::default();
        // "natural" (World Around Us) beats "numbers" (Mathematics)
        assert_eq!(t.subject_for_title("Uses natural numbers"), Some(Subject::WorldAroundUs));
        assert_eq!(t.subject_for_title("Reads and comprehends TEXT"), Some(Subject::Language));
        assert_eq!(t.subject_for_title("Explains friction"), Some(Subject::Science));
        assert_eq!(t.subject_for_title("Something unrelated"), None);
    }

    #[test]
    fn state_codes_and_groups() {
        let t = Taxonomy::default();
        assert_eq!(t.state_code("Assam"), "IND18");
        assert_eq!(t.state_code("Atlantis"), "");
        let g4 = t.group(4).unwrap();
        assert_eq!(g4[0].name, "Assam");
        assert_eq!(g4.len(), 5);
        assert!(matches!(t.group(9), Err(PipelineError::UnknownGroup { group: 9, .. })));
    }

    #[test]
    fn load_falls_back_to_builtin_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tax.json");
        fs::write(&path, r#"{"series_prefixes":[["XLANG","Language"]]}"#).unwrap();

        let t = Taxonomy::load(&path).unwrap();
        assert_eq!(t.subject_for_series("XLANG-1"), Some(Subject::Language));
        assert_eq!(t.subject_for_series("MSSC"), None);
        assert_eq!(t.state_code("Goa"), "IND30");
    }

    #[test]
    fn load_rejects_empty_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tax.json");
        fs::write(&path, r#"{"groups":{"1":[]}}"#).unwrap();
        assert!(matches!(Taxonomy::load(&path), Err(PipelineError::Taxonomy(_))));
    }
}
