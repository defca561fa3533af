//! Response-code to column-identifier mapping.
//!
//! Every response code a survey can emit (`Q1`, `Q1_other`, `Q2_SQ001`,
//! `Q3_SQ001_SQ002`, ...) is stored in a physical column whose name is derived
//! from the survey, group, and question ids: `<sid>X<gid>X<qid>[suffix]`.
//! [`build_code_mapping`] derives that table from a parsed [`SurveySchema`].

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::survey::{Question, Scale, SurveySchema};

/// Administrative response codes that always map onto themselves.
pub const ADMIN_CODES: [&str; 6] = [
    "id",
    "submitdate",
    "lastpage",
    "startlanguage",
    "startdate",
    "datestamp",
];

/// Insertion-ordered dictionary from response code to column identifier.
///
/// Re-inserting an existing code replaces its column in place, so iteration
/// order stays the order in which codes were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMapping {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl CodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `code -> column`, returning the column it displaced, if any.
    pub fn insert(&mut self, code: String, column: String) -> Option<String> {
        match self.positions.get(&code) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, column)),
            None => {
                self.positions.insert(code.clone(), self.entries.len());
                self.entries.push((code, column));
                None
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.positions
            .get(code)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains_key(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(code, _)| code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, column)| (code.as_str(), column.as_str()))
    }
}

impl Serialize for CodeMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, column) in &self.entries {
            map.serialize_entry(code, column)?;
        }
        map.end()
    }
}

pub fn build_code_mapping(schema: &SurveySchema) -> CodeMapping {
    let mut mapping = CodeMapping::new();
    for code in ADMIN_CODES {
        mapping.insert(code.to_string(), code.to_string());
    }

    for question in &schema.questions {
        for (code, column) in question_columns(schema.survey_id, question) {
            if let Some(previous) = mapping.insert(code.clone(), column) {
                debug!("Response code '{code}' was already mapped to '{previous}'; overwriting");
            }
        }
    }
    mapping
}

fn question_columns(survey_id: u64, question: &Question) -> Vec<(String, String)> {
    let base = format!("{survey_id}X{}X{}", question.gid, question.qid);

    if question.subquestions.is_empty() {
        let mut columns = vec![(question.title.clone(), base.clone())];
        if question.has_other {
            columns.push((format!("{}_other", question.title), format!("{base}other")));
        }
        return columns;
    }

    let (scale0, scale1): (Vec<_>, Vec<_>) = question
        .subquestions
        .iter()
        .partition(|sq| sq.scale == Scale::Primary);

    if scale1.is_empty() {
        scale0
            .iter()
            .map(|sq| {
                (
                    format!("{}_{}", question.title, sq.title),
                    format!("{base}{}", sq.title),
                )
            })
            .collect()
    } else {
        scale0
            .iter()
            .cartesian_product(scale1.iter())
            .map(|(sq0, sq1)| {
                (
                    format!("{}_{}_{}", question.title, sq0.title, sq1.title),
                    format!("{base}{}_{}", sq0.title, sq1.title),
                )
            })
            .collect()
    }
}
