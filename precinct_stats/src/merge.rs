use log::{debug, info};

use std::{
    collections::BTreeMap,
    ops::{Add, AddAssign},
};

use crate::config::*;
use crate::safe_ratio;

// All the merge operations are plain sums of counts. This makes the merge
// associative and commutative, with the empty aggregate as identity.

fn add_counts<K: Ord>(into: &mut BTreeMap<K, u64>, from: BTreeMap<K, u64>) {
    for (k, v) in from {
        *into.entry(k).or_insert(0) += v;
    }
}

impl AddAssign for PrecinctAggregate {
    fn add_assign(&mut self, rhs: PrecinctAggregate) {
        self.registered_voters += rhs.registered_voters;
        self.voted_count += rhs.voted_count;
        add_counts(&mut self.party_counts, rhs.party_counts);
        add_counts(&mut self.race_counts, rhs.race_counts);
        self.total_age_sum += rhs.total_age_sum;
        self.age_sample_count += rhs.age_sample_count;
    }
}

impl AddAssign for TurnoutTally {
    fn add_assign(&mut self, rhs: TurnoutTally) {
        self.voted += rhs.voted;
        self.not_voted += rhs.not_voted;
    }
}

impl AddAssign for UnassignedTally {
    fn add_assign(&mut self, rhs: UnassignedTally) {
        self.records += rhs.records;
        self.voted_count += rhs.voted_count;
        add_counts(&mut self.party_counts, rhs.party_counts);
        add_counts(&mut self.race_counts, rhs.race_counts);
    }
}

impl AddAssign for PartialAggregate {
    fn add_assign(&mut self, rhs: PartialAggregate) {
        self.record_count += rhs.record_count;
        for (pid, p) in rhs.precincts {
            *self.precincts.entry(pid).or_default() += p;
        }
        add_counts(&mut self.party_counts, rhs.party_counts);
        add_counts(&mut self.race_counts, rhs.race_counts);
        for (acc, t) in self
            .age_group_turnout
            .iter_mut()
            .zip(rhs.age_group_turnout.into_iter())
        {
            *acc += t;
        }
        self.unassigned += rhs.unassigned;
    }
}

impl Add for PartialAggregate {
    type Output = PartialAggregate;
    fn add(mut self, rhs: PartialAggregate) -> PartialAggregate {
        self += rhs;
        self
    }
}

impl std::iter::Sum for PartialAggregate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PartialAggregate::default(), |acc, p| acc + p)
    }
}

impl PartialAggregate {
    pub fn merge(self, other: PartialAggregate) -> PartialAggregate {
        self + other
    }
}

/// Merges the partial results of independent chunks, in any order, and derives the rates.
pub fn merge_partials(partials: Vec<PartialAggregate>) -> GlobalAggregate {
    info!("merge_partials: merging {} partial aggregates", partials.len());
    let merged: PartialAggregate = partials.into_iter().sum();
    finalize(merged)
}

/// Derives all the rates from fully merged counts.
///
/// This must only be called once all the partial results have been merged:
/// some rates (the density score) depend on every precinct.
pub fn finalize(counts: PartialAggregate) -> GlobalAggregate {
    let max_registered: u64 = counts
        .precincts
        .values()
        .map(|p| p.registered_voters)
        .max()
        .unwrap_or(0);
    let rates: BTreeMap<String, PrecinctRates> = counts
        .precincts
        .iter()
        .map(|(pid, p)| (pid.clone(), derive_rates(p, max_registered)))
        .collect();
    debug!(
        "finalize: {} records, {} precincts, largest precinct: {}",
        counts.record_count,
        rates.len(),
        max_registered
    );
    GlobalAggregate {
        counts,
        rates,
        turnout_trends: Vec::new(),
        census: None,
    }
}

pub fn derive_rates(p: &PrecinctAggregate, max_registered: u64) -> PrecinctRates {
    PrecinctRates {
        turnout_percentage: 100.0 * safe_ratio(p.voted_count as f64, p.registered_voters as f64),
        average_age: safe_ratio(p.total_age_sum as f64, p.age_sample_count as f64),
        majority_party: majority(&p.party_counts, |s| s.as_str()).cloned(),
        majority_race: majority(&p.race_counts, |r| r.label()).cloned(),
        density_score: safe_ratio(p.registered_voters as f64, max_registered as f64),
    }
}

/// The key with the largest count. Ties go to the smallest label.
pub fn majority<'a, K, F>(counts: &'a BTreeMap<K, u64>, label: F) -> Option<&'a K>
where
    F: Fn(&K) -> &str,
{
    let mut best: Option<(&K, u64)> = None;
    for (k, &c) in counts.iter() {
        best = match best {
            None => Some((k, c)),
            Some((bk, bc)) if c > bc || (c == bc && label(k) < label(bk)) => Some((k, c)),
            x => x,
        };
    }
    best.map(|(k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate, aggregate_chunk, normalize::normalize_records, partition};

    fn raw(precinct: &str, age: u32, race: &str, party: &str, voted: &str) -> RawVoterRecord {
        RawVoterRecord {
            precinct: RawField::Text(precinct.to_string()),
            age: RawField::Number(age as f64),
            race: RawField::Text(race.to_string()),
            party: RawField::Text(party.to_string()),
            voted: RawField::Text(voted.to_string()),
        }
    }

    // Deterministic pseudo-random dataset.
    fn dataset(n: usize, seed: u64) -> Vec<VoterRecord> {
        let races = ["White", "Black", "Latino", "Asian", "Native", "Multiracial", ""];
        let parties = ["DEM", "REP", "IND", "LIB", ""];
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };
        let mut raws: Vec<RawVoterRecord> = Vec::new();
        for _ in 0..n {
            let mut r = raw(
                &format!("P{:02}", next() % 17),
                (next() % 90) as u32 + 10,
                races[next() % races.len()],
                parties[next() % parties.len()],
                if next() % 3 == 0 { "0" } else { "1" },
            );
            if next() % 50 == 0 {
                r.precinct = RawField::Missing;
            }
            raws.push(r);
        }
        normalize_records(&raws)
    }

    #[test]
    fn three_precincts_one_or_two_chunks() {
        let raws = vec![
            raw("A", 30, "white", "DEM", "1"),
            raw("A", 41, "black", "REP", "0"),
            raw("B", 52, "asian", "DEM", "1"),
            raw("B", 25, "latino", "DEM", "1"),
            raw("C", 70, "white", "IND", "0"),
            raw("C", 33, "native", "REP", "1"),
        ];
        let records = normalize_records(&raws);
        let single = finalize(aggregate_chunk(&records));
        let chunked = merge_partials(vec![
            aggregate_chunk(&records[0..3]),
            aggregate_chunk(&records[3..6]),
        ]);
        assert_eq!(single, chunked);
        for pid in ["A", "B", "C"] {
            let p = &chunked.precincts()[pid];
            assert_eq!(p.registered_voters, 2);
            assert_eq!(p, &single.precincts()[pid]);
            assert_eq!(chunked.rates[pid].average_age, single.rates[pid].average_age);
        }
        // B is split across the two chunks.
        assert_eq!(chunked.rates["B"].average_age, 38.5);
        assert_eq!(chunked.rates["B"].turnout_percentage, 100.0);
        assert_eq!(chunked.counts.party_counts["DEM"], 3);
    }

    #[test]
    fn merge_matches_single_pass_for_any_split() {
        let records = dataset(997, 7);
        let single = finalize(aggregate_chunk(&records));
        for chunk_size in [1, 2, 3, 10, 64, 100, 500, 996, 997, 2000] {
            let chunks = partition(&records, chunk_size).unwrap();
            let partials: Vec<PartialAggregate> =
                chunks.iter().map(|c| aggregate_chunk(c)).collect();
            let mut reversed = partials.clone();
            reversed.reverse();
            assert_eq!(merge_partials(partials), single, "chunk size {}", chunk_size);
            assert_eq!(merge_partials(reversed), single, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let records = dataset(300, 11);
        let a = aggregate_chunk(&records[0..100]);
        let b = aggregate_chunk(&records[100..170]);
        let c = aggregate_chunk(&records[170..300]);
        let left = (a.clone() + b.clone()) + c.clone();
        let right = a.clone() + (b.clone() + c.clone());
        let shuffled = c.clone() + a.clone() + b.clone();
        assert_eq!(left, right);
        assert_eq!(left, shuffled);
        assert_eq!(a.clone() + PartialAggregate::default(), a);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let records = dataset(12_345, 3);
        let single = finalize(aggregate_chunk(&records));
        let parallel = aggregate(
            &records,
            &AggregationRules {
                chunk_size: 1000,
                parallel: true,
            },
        )
        .unwrap();
        let sequential = aggregate(
            &records,
            &AggregationRules {
                chunk_size: 1000,
                parallel: false,
            },
        )
        .unwrap();
        assert_eq!(parallel, single);
        assert_eq!(sequential, single);
    }

    #[test]
    fn count_invariants_hold_after_merge() {
        let records = dataset(2_000, 5);
        let agg = aggregate(
            &records,
            &AggregationRules {
                chunk_size: 150,
                parallel: true,
            },
        )
        .unwrap();
        assert_eq!(agg.check_invariants(), Ok(()));
        for p in agg.precincts().values() {
            assert!(p.voted_count <= p.registered_voters);
        }
        let bucketed: u64 = agg
            .counts
            .age_group_turnout
            .iter()
            .map(|t| t.voted + t.not_voted)
            .sum();
        let with_age = records.iter().filter(|r| r.age.is_some()).count() as u64;
        assert_eq!(bucketed, with_age);
    }

    #[test]
    fn majority_ties_use_smallest_label() {
        let mut parties: BTreeMap<String, u64> = BTreeMap::new();
        parties.insert("REP".to_string(), 4);
        parties.insert("DEM".to_string(), 4);
        parties.insert("IND".to_string(), 1);
        assert_eq!(
            majority(&parties, |s| s.as_str()),
            Some(&"DEM".to_string())
        );

        // Declaration order puts White first, but Black sorts first by label.
        let mut races: BTreeMap<RaceCategory, u64> = BTreeMap::new();
        races.insert(RaceCategory::White, 2);
        races.insert(RaceCategory::Black, 2);
        assert_eq!(
            majority(&races, |r| r.label()),
            Some(&RaceCategory::Black)
        );

        let empty: BTreeMap<String, u64> = BTreeMap::new();
        assert_eq!(majority(&empty, |s| s.as_str()), None);
    }

    #[test]
    fn density_is_relative_to_largest_precinct() {
        let raws = vec![
            raw("A", 30, "white", "DEM", "1"),
            raw("A", 31, "white", "DEM", "1"),
            raw("A", 32, "white", "DEM", "1"),
            raw("A", 33, "white", "DEM", "1"),
            raw("B", 34, "white", "DEM", "1"),
        ];
        let agg = finalize(aggregate_chunk(&normalize_records(&raws)));
        assert_eq!(agg.rates["A"].density_score, 1.0);
        assert_eq!(agg.rates["B"].density_score, 0.25);
    }
}
