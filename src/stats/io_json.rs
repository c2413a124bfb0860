// Voter files in JSON format.

use crate::stats::io_common::{record_from_object, simplify_file_name};
use crate::stats::*;

// Checked in this order before falling back to any array field.
const RECORD_ARRAY_KEYS: [&str; 4] = ["voters", "records", "data", "rows"];

fn holds_records(rows: &[JSValue]) -> bool {
    rows.iter().any(|r| r.is_object())
}

pub fn read_json_voters(path: &str) -> BStatsResult<Vec<RawVoterRecord>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let res = parse_json_voters(&js, &simplify_file_name(path))?;
    Ok(res)
}

fn find_record_array(js: &JSValue) -> Option<&Vec<JSValue>> {
    match js {
        JSValue::Array(rows) => Some(rows),
        JSValue::Object(obj) => {
            // The first array holding records. Without any, the first array, so
            // that an empty list of voters is still accepted.
            let candidates: Vec<&Vec<JSValue>> = RECORD_ARRAY_KEYS
                .iter()
                .filter_map(|k| obj.get(*k).and_then(|v| v.as_array()))
                .chain(obj.values().filter_map(|v| v.as_array()))
                .collect();
            candidates
                .iter()
                .find(|rows| holds_records(rows))
                .or_else(|| candidates.first())
                .copied()
        }
        _ => None,
    }
}

fn describe(js: &JSValue) -> &'static str {
    match js {
        JSValue::Null => "null",
        JSValue::Bool(_) => "a boolean",
        JSValue::Number(_) => "a number",
        JSValue::String(_) => "a string",
        JSValue::Array(_) => "an array",
        JSValue::Object(_) => "an object without any array",
    }
}

pub fn parse_json_voters(js: &JSValue, source: &str) -> StatsResult<Vec<RawVoterRecord>> {
    let rows = match find_record_array(js) {
        Some(rows) => rows,
        None => {
            return MalformedInputSnafu {
                reason: format!(
                    "{}: expected an array of records or an object holding one, found {}",
                    source,
                    describe(js)
                ),
            }
            .fail();
        }
    };

    let mut res: Vec<RawVoterRecord> = Vec::with_capacity(rows.len());
    let mut skipped: usize = 0;
    for (idx, row) in rows.iter().enumerate() {
        match row.as_object() {
            Some(obj) => res.push(record_from_object(obj)),
            None => {
                debug!("{}: entry {} is not an object: {:?}", source, idx, row);
                skipped += 1;
            }
        }
    }
    if res.is_empty() && skipped > 0 {
        return MalformedInputSnafu {
            reason: format!("{}: none of the {} entries is a record", source, skipped),
        }
        .fail();
    }
    if skipped > 0 {
        warn!("{}: skipped {} entries that are not records", source, skipped);
    }
    debug!("{}: {} records", source, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_array() {
        let js = json!([
            {"precinct": "101", "age": 30, "race": "White", "party": "DEM", "voted": true},
            {"precinct": 102, "voted": "N"}
        ]);
        let res = parse_json_voters(&js, "test").unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].party, RawField::Text("DEM".to_string()));
        assert_eq!(res[1].precinct, RawField::Number(102.0));
        assert_eq!(res[1].age, RawField::Missing);
    }

    #[test]
    fn wrapped_array() {
        let js = json!({"meta": {"county": "X"}, "voters": [{"precinct": "1"}]});
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 1);
        let js = json!({"count": 2, "entries": [{"precinct": "1"}, {"precinct": "2"}]});
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 2);
    }

    #[test]
    fn record_array_next_to_other_arrays() {
        let js = json!({"errors": [], "voterList": [{"precinct": "1"}, {"precinct": "2"}]});
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 2);
        let js = json!({"codes": [1, 2], "entries": [{"precinct": "1"}]});
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 1);
        let js = json!({"voters": ["x"], "rows": [{"precinct": "1"}, {"precinct": "2"}]});
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 2);
        assert!(parse_json_voters(&json!({"voters": []}), "test")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn empty_array() {
        assert!(parse_json_voters(&json!([]), "test").unwrap().is_empty());
    }

    #[test]
    fn unrecognized_shapes() {
        for js in [json!("voters"), json!(3), json!({"count": 3})] {
            assert!(matches!(
                parse_json_voters(&js, "test"),
                Err(StatsError::MalformedInput { .. })
            ));
        }
        assert!(parse_json_voters(&json!([1, 2, 3]), "test").is_err());
    }

    #[test]
    fn skips_non_objects() {
        let js = json!([{"precinct": "1"}, "garbage", null]);
        assert_eq!(parse_json_voters(&js, "test").unwrap().len(), 1);
    }
}
