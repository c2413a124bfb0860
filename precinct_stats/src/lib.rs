mod boundaries;
pub mod builder;
mod census;
mod config;
pub mod manual;
mod merge;
pub mod normalize;
mod partition;
mod summary;

use log::{debug, info, warn};
use rayon::prelude::*;

pub use crate::boundaries::match_boundaries;
pub use crate::census::{
    higher_education_share, integrate_census, integrate_census_opt, pearson_correlation,
};
pub use crate::config::*;
pub use crate::merge::{derive_rates, finalize, majority, merge_partials};
pub use crate::normalize::{normalize_record, normalize_records};
pub use crate::partition::partition;
pub use crate::summary::summarize;

/// Division that returns 0 instead of NaN or infinity for a zero denominator.
pub(crate) fn safe_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl PartialAggregate {
    /// Accounts for one record. Only counts are updated.
    fn add_record(&mut self, r: &VoterRecord) {
        self.record_count += 1;
        *self.party_counts.entry(r.party.clone()).or_insert(0) += 1;
        *self.race_counts.entry(r.race).or_insert(0) += 1;
        if let Some(group) = r.age.and_then(AgeGroup::for_age) {
            let tally = &mut self.age_group_turnout[group.index()];
            if r.voted {
                tally.voted += 1;
            } else {
                tally.not_voted += 1;
            }
        }

        match &r.precinct {
            Some(pid) => {
                let p = self.precincts.entry(pid.clone()).or_default();
                p.registered_voters += 1;
                if r.voted {
                    p.voted_count += 1;
                }
                *p.party_counts.entry(r.party.clone()).or_insert(0) += 1;
                *p.race_counts.entry(r.race).or_insert(0) += 1;
                if let Some(age) = r.age {
                    p.total_age_sum += age as u64;
                    p.age_sample_count += 1;
                }
            }
            None => {
                let u = &mut self.unassigned;
                u.records += 1;
                if r.voted {
                    u.voted_count += 1;
                }
                *u.party_counts.entry(r.party.clone()).or_insert(0) += 1;
                *u.race_counts.entry(r.race).or_insert(0) += 1;
            }
        }
    }
}

/// Computes the counts over one chunk of records, in a single pass.
///
/// No rate is derived here: the result can be merged with the results of other chunks.
pub fn aggregate_chunk(records: &[VoterRecord]) -> PartialAggregate {
    let mut res = PartialAggregate::default();
    for r in records.iter() {
        res.add_record(r);
    }
    debug!(
        "aggregate_chunk: {} records, {} precincts, {} without precinct",
        records.len(),
        res.precincts.len(),
        res.unassigned.records
    );
    res
}

/// Aggregates a collection of records.
///
/// Collections larger than the chunk size of the rules are split into chunks
/// which are aggregated independently and then merged. The result does not
/// depend on the chunk size.
///
/// Arguments:
/// * `records` the normalized voter records
/// * `rules` the chunking settings
pub fn aggregate(
    records: &[VoterRecord],
    rules: &AggregationRules,
) -> Result<GlobalAggregate, AggregationErrors> {
    info!(
        "Processing {:?} records, rules: {:?}",
        records.len(),
        rules
    );
    let chunks = partition(records, rules.chunk_size)?;
    let res = if chunks.len() == 1 {
        debug!("aggregate: single pass");
        finalize(aggregate_chunk(records))
    } else {
        info!(
            "aggregate: processing {} chunks (parallel: {})",
            chunks.len(),
            rules.parallel
        );
        if rules.parallel {
            // Tree reduction on the thread pool. The merge is associative and
            // commutative, so the order in which chunks complete does not matter.
            let merged = chunks
                .par_iter()
                .map(|c| aggregate_chunk(c))
                .reduce(PartialAggregate::default, PartialAggregate::merge);
            finalize(merged)
        } else {
            merge_partials(chunks.iter().map(|c| aggregate_chunk(c)).collect())
        }
    };
    report_unassigned(&res);
    Ok(res)
}

/// Warns about the records that were left out of every precinct, and returns their number.
fn report_unassigned(res: &GlobalAggregate) -> u64 {
    let dropped = res.counts.unassigned.records;
    if dropped > 0 {
        warn!(
            "aggregate: {} records without a precinct were only counted in the global tallies",
            dropped
        );
    }
    dropped
}

/// Normalizes the raw records, then aggregates them.
pub fn aggregate_raw(
    records: &[RawVoterRecord],
    rules: &AggregationRules,
) -> Result<GlobalAggregate, AggregationErrors> {
    let normalized = normalize_records(records);
    aggregate(&normalized, rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn record(precinct: Option<&str>, age: Option<u32>, voted: bool) -> VoterRecord {
        VoterRecord {
            precinct: precinct.map(|s| s.to_string()),
            age,
            race: RaceCategory::Hispanic,
            party: "REP".to_string(),
            voted,
        }
    }

    #[test]
    fn single_pass_counts() {
        init();
        let records = vec![
            record(Some("7"), Some(20), true),
            record(Some("7"), None, false),
            record(Some("8"), Some(70), true),
        ];
        let agg = aggregate(&records, &AggregationRules::DEFAULT_RULES).unwrap();
        let p7 = &agg.precincts()["7"];
        assert_eq!(p7.registered_voters, 2);
        assert_eq!(p7.voted_count, 1);
        assert_eq!(p7.total_age_sum, 20);
        assert_eq!(p7.age_sample_count, 1);
        assert_eq!(agg.rates["7"].turnout_percentage, 50.0);
        assert_eq!(agg.rates["7"].average_age, 20.0);
        assert_eq!(agg.rates["7"].majority_party, Some("REP".to_string()));
        assert_eq!(agg.rates["7"].majority_race, Some(RaceCategory::Hispanic));
        let young = agg.counts.age_group_turnout[AgeGroup::From18To24.index()];
        assert_eq!(young, TurnoutTally { voted: 1, not_voted: 0 });
        let old = agg.counts.age_group_turnout[AgeGroup::From65.index()];
        assert_eq!(old, TurnoutTally { voted: 1, not_voted: 0 });
    }

    #[test]
    fn records_without_precinct_only_count_globally() {
        init();
        let records = vec![
            record(Some("1"), Some(40), true),
            record(None, Some(40), true),
        ];
        let agg = aggregate(&records, &AggregationRules::DEFAULT_RULES).unwrap();
        assert_eq!(agg.precincts().len(), 1);
        assert_eq!(agg.counts.party_counts["REP"], 2);
        assert_eq!(agg.counts.unassigned.records, 1);
        assert_eq!(report_unassigned(&agg), 1);
        let bucket = agg.counts.age_group_turnout[AgeGroup::From35To44.index()];
        assert_eq!(bucket.voted, 2);
        assert_eq!(agg.check_invariants(), Ok(()));
    }

    #[test]
    fn chunked_path_is_transparent() {
        init();
        let records: Vec<VoterRecord> = (0..25)
            .map(|idx| {
                record(
                    Some(["a", "b", "c"][idx % 3]),
                    Some(18 + idx as u32),
                    idx % 2 == 0,
                )
            })
            .collect();
        let whole = aggregate(&records, &AggregationRules::DEFAULT_RULES).unwrap();
        for parallel in [true, false] {
            let chunked = aggregate(
                &records,
                &AggregationRules {
                    chunk_size: 4,
                    parallel,
                },
            )
            .unwrap();
            assert_eq!(chunked, whole);
        }
    }

    #[test]
    fn invalid_chunk_size() {
        let res = aggregate(
            &[],
            &AggregationRules {
                chunk_size: 0,
                parallel: false,
            },
        );
        assert_eq!(res, Err(AggregationErrors::InvalidChunkSize(0)));
    }
}
