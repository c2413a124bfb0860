// Precinct boundaries in GeoJSON format. Only the precinct ids are read.

use std::collections::BTreeSet;

use precinct_stats::normalize::normalize_precinct;

use crate::stats::io_common::{probe_field, simplify_file_name, PRECINCT_KEYS};
use crate::stats::*;

// In a voter file, "name" and "id" identify the voter. Features only carry the precinct.
const FEATURE_ONLY_KEYS: [&str; 2] = ["name", "id"];

fn precinct_id_of(props: &JSMap<String, JSValue>) -> Option<String> {
    PRECINCT_KEYS
        .iter()
        .chain(FEATURE_ONLY_KEYS.iter())
        .find_map(|key| normalize_precinct(&probe_field(props, &[*key])))
}

pub fn parse_boundaries(js: &JSValue, source: &str) -> StatsResult<Vec<String>> {
    let obj = js.as_object().context(MalformedBoundariesSnafu {
        reason: format!("{}: expected a GeoJSON object", source),
    })?;
    match obj.get("type").and_then(|t| t.as_str()) {
        Some("FeatureCollection") => {}
        x => {
            return MalformedBoundariesSnafu {
                reason: format!("{}: expected a FeatureCollection, found {:?}", source, x),
            }
            .fail();
        }
    }
    let features = obj
        .get("features")
        .and_then(|f| f.as_array())
        .context(MalformedBoundariesSnafu {
            reason: format!("{}: missing features", source),
        })?;

    let mut ids: BTreeSet<String> = BTreeSet::new();
    let mut without_id: usize = 0;
    for feature in features.iter() {
        let props = feature.get("properties").and_then(|p| p.as_object());
        match props.and_then(precinct_id_of) {
            Some(pid) => {
                ids.insert(pid);
            }
            None => {
                without_id += 1;
            }
        }
    }
    if without_id > 0 {
        warn!(
            "{}: {} features without a precinct id were ignored",
            source, without_id
        );
    }
    info!("{}: {} precincts in the boundaries", source, ids.len());
    Ok(ids.into_iter().collect())
}

pub fn read_boundaries(path: &str) -> BStatsResult<Vec<String>> {
    info!("Attempting to read boundary file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let res = parse_boundaries(&js, &simplify_file_name(path))?;
    Ok(res)
}
