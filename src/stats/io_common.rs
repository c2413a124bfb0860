use std::path::Path;

use log::warn;
use precinct_stats::{RawField, RawVoterRecord};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

// Names are compared after going through normalize_key.
// The precinct keys are shared with the boundary documents.
pub const PRECINCT_KEYS: [&str; 6] = [
    "precinct",
    "precinctid",
    "precid",
    "pct",
    "precinctnumber",
    "precinctname",
];
pub const AGE_KEYS: [&str; 1] = ["age"];
pub const RACE_KEYS: [&str; 2] = ["race", "ethnicity"];
pub const PARTY_KEYS: [&str; 3] = ["party", "partycode", "partyaffiliation"];
pub const VOTED_KEYS: [&str; 3] = ["voted", "hasvoted", "votedflag"];

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Lowercase, without spaces, underscores or dashes.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

pub fn js_to_raw_field(js: &JSValue) -> RawField {
    match js {
        JSValue::Null => RawField::Missing,
        JSValue::Bool(b) => RawField::Bool(*b),
        JSValue::Number(n) => match n.as_f64() {
            Some(x) => RawField::Number(x),
            None => RawField::Missing,
        },
        JSValue::String(s) => RawField::Text(s.clone()),
        // Arrays and objects carry nothing usable.
        _ => RawField::Missing,
    }
}

/// The value under the first of the keys present in the object.
pub fn probe_field(obj: &JSMap<String, JSValue>, keys: &[&str]) -> RawField {
    for key in keys.iter() {
        if let Some((_, v)) = obj.iter().find(|(k, _)| normalize_key(k) == *key) {
            return js_to_raw_field(v);
        }
    }
    RawField::Missing
}

pub fn record_from_object(obj: &JSMap<String, JSValue>) -> RawVoterRecord {
    RawVoterRecord {
        precinct: probe_field(obj, &PRECINCT_KEYS),
        age: probe_field(obj, &AGE_KEYS),
        race: probe_field(obj, &RACE_KEYS),
        party: probe_field(obj, &PARTY_KEYS),
        voted: probe_field(obj, &VOTED_KEYS),
    }
}

fn find_column(header: &[Option<String>], keys: &[&str]) -> Option<usize> {
    keys.iter().find_map(|key| {
        header
            .iter()
            .position(|h| h.as_deref().map(normalize_key).as_deref() == Some(*key))
    })
}

/// The position of each field in the rows of a tabular file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnMapping {
    pub precinct: Option<usize>,
    pub age: Option<usize>,
    pub race: Option<usize>,
    pub party: Option<usize>,
    pub voted: Option<usize>,
}

impl ColumnMapping {
    pub fn from_header(header: &[Option<String>], source: &str) -> ColumnMapping {
        let mapping = ColumnMapping {
            precinct: find_column(header, &PRECINCT_KEYS),
            age: find_column(header, &AGE_KEYS),
            race: find_column(header, &RACE_KEYS),
            party: find_column(header, &PARTY_KEYS),
            voted: find_column(header, &VOTED_KEYS),
        };
        if mapping.precinct.is_none() {
            warn!(
                "{}: no precinct column in the header {:?}, all the records will be unassigned",
                source, header
            );
        }
        if mapping.voted.is_none() {
            warn!("{}: no voted column in the header {:?}", source, header);
        }
        mapping
    }

    pub fn record<F>(&self, cell: F) -> RawVoterRecord
    where
        F: Fn(usize) -> RawField,
    {
        let read = |idx: Option<usize>| idx.map(&cell).unwrap_or_default();
        RawVoterRecord {
            precinct: read(self.precinct),
            age: read(self.age),
            race: read(self.race),
            party: read(self.party),
            voted: read(self.voted),
        }
    }
}
