use crate::config::*;
use crate::safe_ratio;

/// Computes the top-level figures. Pure: calling it twice gives the same result.
pub fn summarize(aggregate: &GlobalAggregate) -> SummaryStatistics {
    let precincts = aggregate.precincts();
    let mut total_registered: u64 = 0;
    let mut total_voted: u64 = 0;
    let mut age_sum: u64 = 0;
    let mut age_samples: u64 = 0;
    for p in precincts.values() {
        total_registered += p.registered_voters;
        total_voted += p.voted_count;
        age_sum += p.total_age_sum;
        age_samples += p.age_sample_count;
    }
    SummaryStatistics {
        total_registered,
        total_voted,
        overall_turnout_percentage: 100.0
            * safe_ratio(total_voted as f64, total_registered as f64),
        precinct_count: precincts.len(),
        average_age: safe_ratio(age_sum as f64, age_samples as f64),
        unassigned_records: aggregate.counts.unassigned.records,
    }
}
