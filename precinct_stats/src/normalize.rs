use crate::config::*;

/// The label for parties that could not be read.
pub const UNKNOWN_PARTY: &str = "Unknown";

const MIN_VOTING_AGE: u32 = 18;
const MAX_PLAUSIBLE_AGE: u32 = 120;

// Largest magnitude below which every integer has an exact f64 representation.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Maps a free-text race description to a canonical category.
///
/// The matching is a case-insensitive substring search, tried in a fixed order:
/// white, black, hispanic or latino, asian, native, multiracial. Anything else
/// is `Unknown`.
pub fn normalize_race(raw: &str) -> RaceCategory {
    let s = raw.to_lowercase();
    if s.contains("white") {
        RaceCategory::White
    } else if s.contains("black") {
        RaceCategory::Black
    } else if s.contains("hispanic") || s.contains("latino") {
        RaceCategory::Hispanic
    } else if s.contains("asian") {
        RaceCategory::Asian
    } else if s.contains("native") {
        RaceCategory::Native
    } else if s.contains("multiracial") {
        RaceCategory::Multiracial
    } else {
        RaceCategory::Unknown
    }
}

/// Party codes are kept as free text, only trimmed.
pub fn normalize_party(raw: Option<&str>) -> String {
    match raw.map(|s| s.trim()) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN_PARTY.to_string(),
    }
}

/// Only `true`, the number 1 and the strings "1", "true", "yes", "y" count as having voted.
pub fn normalize_voted(raw: &RawField) -> bool {
    match raw {
        RawField::Bool(b) => *b,
        RawField::Number(x) => *x == 1.0,
        RawField::Text(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ),
        RawField::Missing => false,
    }
}

fn integral_age(x: f64) -> Option<u32> {
    if x.is_finite() && x.fract() == 0.0 && x >= 0.0 && x <= u32::MAX as f64 {
        Some(x as u32)
    } else {
        None
    }
}

/// Spreadsheet exports write whole numbers as "42.0": text is read as a number.
pub fn normalize_age(raw: &RawField) -> Option<u32> {
    let age: u32 = match raw {
        RawField::Number(x) => integral_age(*x)?,
        RawField::Text(s) => integral_age(s.trim().parse::<f64>().ok()?)?,
        _ => return None,
    };
    if (MIN_VOTING_AGE..=MAX_PLAUSIBLE_AGE).contains(&age) {
        Some(age)
    } else {
        None
    }
}

/// Precinct ids are compared as strings. Integral numbers are written without decimals.
pub fn normalize_precinct(raw: &RawField) -> Option<String> {
    match raw {
        RawField::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        RawField::Number(x) if x.fract() == 0.0 && x.abs() <= MAX_EXACT_INTEGER => {
            Some(format!("{}", *x as i64))
        }
        RawField::Number(x) if x.is_finite() => Some(x.to_string()),
        _ => None,
    }
}

fn text_of(raw: &RawField) -> Option<String> {
    match raw {
        RawField::Text(s) => Some(s.clone()),
        RawField::Number(x) => Some(x.to_string()),
        RawField::Bool(_) | RawField::Missing => None,
    }
}

pub fn normalize_record(raw: &RawVoterRecord) -> VoterRecord {
    VoterRecord {
        precinct: normalize_precinct(&raw.precinct),
        age: normalize_age(&raw.age),
        race: normalize_race(text_of(&raw.race).unwrap_or_default().as_str()),
        party: normalize_party(text_of(&raw.party).as_deref()),
        voted: normalize_voted(&raw.voted),
    }
}

pub fn normalize_records(raws: &[RawVoterRecord]) -> Vec<VoterRecord> {
    raws.iter().map(normalize_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_follows_priority_order() {
        assert_eq!(normalize_race("WHITE"), RaceCategory::White);
        assert_eq!(
            normalize_race("Black or African American"),
            RaceCategory::Black
        );
        assert_eq!(normalize_race("Latino"), RaceCategory::Hispanic);
        assert_eq!(normalize_race("Hispanic"), RaceCategory::Hispanic);
        assert_eq!(normalize_race("asian american"), RaceCategory::Asian);
        assert_eq!(
            normalize_race("American Indian or Alaska Native"),
            RaceCategory::Native
        );
        assert_eq!(normalize_race("MultiRacial"), RaceCategory::Multiracial);
        // White wins over the later categories.
        assert_eq!(normalize_race("white hispanic"), RaceCategory::White);
    }

    #[test]
    fn race_is_total() {
        for s in ["", " ", "Other", "12", "???", "blanc", "Two or more"] {
            let c = normalize_race(s);
            assert!(RaceCategory::ALL.contains(&c));
            assert_eq!(c, RaceCategory::Unknown, "input {:?}", s);
        }
    }

    #[test]
    fn voted_flag_shapes() {
        assert!(normalize_voted(&RawField::Bool(true)));
        assert!(!normalize_voted(&RawField::Bool(false)));
        assert!(normalize_voted(&RawField::Number(1.0)));
        assert!(!normalize_voted(&RawField::Number(0.0)));
        assert!(!normalize_voted(&RawField::Number(2.0)));
        assert!(normalize_voted(&RawField::Text("1".to_string())));
        assert!(normalize_voted(&RawField::Text(" TRUE ".to_string())));
        assert!(!normalize_voted(&RawField::Text("0".to_string())));
        assert!(!normalize_voted(&RawField::Text("maybe".to_string())));
        assert!(!normalize_voted(&RawField::Missing));
    }

    #[test]
    fn ages_outside_voting_range_are_dropped() {
        assert_eq!(normalize_age(&RawField::Number(42.0)), Some(42));
        assert_eq!(normalize_age(&RawField::Text(" 67 ".to_string())), Some(67));
        assert_eq!(normalize_age(&RawField::Text("abc".to_string())), None);
        assert_eq!(normalize_age(&RawField::Number(0.0)), None);
        assert_eq!(normalize_age(&RawField::Number(17.0)), None);
        assert_eq!(normalize_age(&RawField::Number(30.5)), None);
        assert_eq!(normalize_age(&RawField::Number(-3.0)), None);
        assert_eq!(normalize_age(&RawField::Missing), None);
    }

    #[test]
    fn spreadsheet_ages_in_text() {
        assert_eq!(normalize_age(&RawField::Text("42.0".to_string())), Some(42));
        assert_eq!(normalize_age(&RawField::Text(" 67.0 ".to_string())), Some(67));
        assert_eq!(normalize_age(&RawField::Text("42.5".to_string())), None);
        assert_eq!(normalize_age(&RawField::Text("17.0".to_string())), None);
        assert_eq!(normalize_age(&RawField::Text("NaN".to_string())), None);
    }

    #[test]
    fn precinct_coercion() {
        assert_eq!(
            normalize_precinct(&RawField::Number(101.0)),
            Some("101".to_string())
        );
        assert_eq!(
            normalize_precinct(&RawField::Text(" 0042 ".to_string())),
            Some("0042".to_string())
        );
        assert_eq!(normalize_precinct(&RawField::Text("  ".to_string())), None);
        assert_eq!(normalize_precinct(&RawField::Bool(true)), None);
        assert_eq!(normalize_precinct(&RawField::Missing), None);
    }

    #[test]
    fn large_numeric_precincts_stay_distinct() {
        let a = normalize_precinct(&RawField::Number(1e19)).unwrap();
        let b = normalize_precinct(&RawField::Number(1e20)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, "10000000000000000000");
        assert_eq!(
            normalize_precinct(&RawField::Number(9_007_199_254_740_992.0)),
            Some("9007199254740992".to_string())
        );
        assert_eq!(normalize_precinct(&RawField::Number(f64::INFINITY)), None);
    }

    #[test]
    fn record_defaults() {
        let r = normalize_record(&RawVoterRecord::default());
        assert_eq!(
            r,
            VoterRecord {
                precinct: None,
                age: None,
                race: RaceCategory::Unknown,
                party: UNKNOWN_PARTY.to_string(),
                voted: false,
            }
        );
    }
}
