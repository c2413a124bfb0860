use log::{info, warn};

use std::collections::BTreeSet;

use crate::config::{BoundaryMatch, GlobalAggregate};

/// Reconciles the precincts of an aggregate with the ids found in a boundary document.
pub fn match_boundaries(aggregate: &GlobalAggregate, boundary_ids: &[String]) -> BoundaryMatch {
    let boundaries: BTreeSet<&String> = boundary_ids.iter().collect();
    let precincts: BTreeSet<&String> = aggregate.precincts().keys().collect();
    let res = BoundaryMatch {
        matched: precincts
            .intersection(&boundaries)
            .map(|s| s.to_string())
            .collect(),
        without_voters: boundaries
            .difference(&precincts)
            .map(|s| s.to_string())
            .collect(),
        without_boundary: precincts
            .difference(&boundaries)
            .map(|s| s.to_string())
            .collect(),
    };
    info!(
        "match_boundaries: {} matched, {} without voters, {} without boundary",
        res.matched.len(),
        res.without_voters.len(),
        res.without_boundary.len()
    );
    if !res.without_boundary.is_empty() {
        warn!(
            "match_boundaries: precincts absent from the boundaries: {:?}",
            res.without_boundary
        );
    }
    res
}
