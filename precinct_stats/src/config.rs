// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A single untyped value, as found in a voter file.
///
/// Readers map whatever their format provides (JSON values, CSV cells,
/// spreadsheet cells) into this type. It is the only place where the
/// string-or-number-or-boolean shape of an input field is represented;
/// everything downstream of the normalizer works on typed values.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum RawField {
    /// The field is absent or null.
    #[default]
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One row of a voter file, before normalization.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawVoterRecord {
    pub precinct: RawField,
    pub age: RawField,
    pub race: RawField,
    pub party: RawField,
    pub voted: RawField,
}

/// The canonical race categories.
///
/// The declaration order is the matching priority used by the normalizer.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum RaceCategory {
    White,
    Black,
    Hispanic,
    Asian,
    Native,
    Multiracial,
    Unknown,
}

impl RaceCategory {
    pub const ALL: [RaceCategory; 7] = [
        RaceCategory::White,
        RaceCategory::Black,
        RaceCategory::Hispanic,
        RaceCategory::Asian,
        RaceCategory::Native,
        RaceCategory::Multiracial,
        RaceCategory::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RaceCategory::White => "White",
            RaceCategory::Black => "Black",
            RaceCategory::Hispanic => "Hispanic",
            RaceCategory::Asian => "Asian",
            RaceCategory::Native => "Native",
            RaceCategory::Multiracial => "Multiracial",
            RaceCategory::Unknown => "Unknown",
        }
    }
}

impl Display for RaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A voter record after normalization. All the aggregation code works on this type.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoterRecord {
    /// None when the precinct could not be read. Such records only count
    /// towards the dataset-wide tallies.
    pub precinct: Option<String>,
    /// None when the age is absent or not a plausible voting age.
    pub age: Option<u32>,
    pub race: RaceCategory,
    pub party: String,
    pub voted: bool,
}

/// The fixed age buckets used for the turnout breakdown.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AgeGroup {
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    From55To64,
    From65,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::From18To24,
        AgeGroup::From25To34,
        AgeGroup::From35To44,
        AgeGroup::From45To54,
        AgeGroup::From55To64,
        AgeGroup::From65,
    ];

    pub fn for_age(age: u32) -> Option<AgeGroup> {
        match age {
            18..=24 => Some(AgeGroup::From18To24),
            25..=34 => Some(AgeGroup::From25To34),
            35..=44 => Some(AgeGroup::From35To44),
            45..=54 => Some(AgeGroup::From45To54),
            55..=64 => Some(AgeGroup::From55To64),
            x if x >= 65 => Some(AgeGroup::From65),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::From18To24 => "18-24",
            AgeGroup::From25To34 => "25-34",
            AgeGroup::From35To44 => "35-44",
            AgeGroup::From45To54 => "45-54",
            AgeGroup::From55To64 => "55-64",
            AgeGroup::From65 => "65+",
        }
    }

    /// Position of this bucket in `AgeGroup::ALL`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

// ******** Output data structures *********

/// Raw counts for one precinct.
///
/// Only counts and sums are stored here. Rates are derived from them once all
/// the partial results have been merged.
/// Invariant: `registered_voters` equals the sum of `party_counts` and the sum
/// of `race_counts`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PrecinctAggregate {
    pub registered_voters: u64,
    pub voted_count: u64,
    pub party_counts: BTreeMap<String, u64>,
    pub race_counts: BTreeMap<RaceCategory, u64>,
    pub total_age_sum: u64,
    pub age_sample_count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TurnoutTally {
    pub voted: u64,
    pub not_voted: u64,
}

/// Records that could not be attached to a precinct.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct UnassignedTally {
    pub records: u64,
    pub voted_count: u64,
    pub party_counts: BTreeMap<String, u64>,
    pub race_counts: BTreeMap<RaceCategory, u64>,
}

/// The counts computed over one chunk of records, or over several merged chunks.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartialAggregate {
    pub record_count: u64,
    pub precincts: BTreeMap<String, PrecinctAggregate>,
    pub party_counts: BTreeMap<String, u64>,
    pub race_counts: BTreeMap<RaceCategory, u64>,
    /// Indexed by `AgeGroup::index`.
    pub age_group_turnout: [TurnoutTally; 6],
    pub unassigned: UnassignedTally,
}

/// Rates derived from the counts of a single precinct.
#[derive(PartialEq, Debug, Clone)]
pub struct PrecinctRates {
    pub turnout_percentage: f64,
    pub average_age: f64,
    pub majority_party: Option<String>,
    pub majority_race: Option<RaceCategory>,
    /// Registered voters relative to the largest precinct, between 0 and 1.
    pub density_score: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TurnoutTrendPoint {
    pub label: String,
    pub turnout_percentage: f64,
}

/// The final result of an aggregation.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct GlobalAggregate {
    pub counts: PartialAggregate,
    pub rates: BTreeMap<String, PrecinctRates>,
    pub turnout_trends: Vec<TurnoutTrendPoint>,
    pub census: Option<CensusIntegration>,
}

impl GlobalAggregate {
    pub fn precincts(&self) -> &BTreeMap<String, PrecinctAggregate> {
        &self.counts.precincts
    }

    /// Checks the count invariants. A failure indicates a programming error.
    pub fn check_invariants(&self) -> Result<(), AggregationErrors> {
        let mut party_sums: BTreeMap<String, u64> = self.counts.unassigned.party_counts.clone();
        let mut race_sums: BTreeMap<RaceCategory, u64> =
            self.counts.unassigned.race_counts.clone();
        for (pid, p) in self.counts.precincts.iter() {
            let party_total: u64 = p.party_counts.values().sum();
            let race_total: u64 = p.race_counts.values().sum();
            if party_total != p.registered_voters || race_total != p.registered_voters {
                return Err(AggregationErrors::BrokenInvariant(format!(
                    "precinct {}: registered {} party sum {} race sum {}",
                    pid, p.registered_voters, party_total, race_total
                )));
            }
            if p.voted_count > p.registered_voters {
                return Err(AggregationErrors::BrokenInvariant(format!(
                    "precinct {}: voted {} > registered {}",
                    pid, p.voted_count, p.registered_voters
                )));
            }
            for (party, c) in p.party_counts.iter() {
                *party_sums.entry(party.clone()).or_insert(0) += c;
            }
            for (race, c) in p.race_counts.iter() {
                *race_sums.entry(*race).or_insert(0) += c;
            }
        }
        if party_sums != self.counts.party_counts || race_sums != self.counts.race_counts {
            return Err(AggregationErrors::BrokenInvariant(
                "global tallies differ from the precinct sums".to_string(),
            ));
        }
        Ok(())
    }
}

// ******** Census data *********

/// County-level census figures, supplied by a lookup outside of this crate.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CensusRecord {
    pub voting_age_population: u64,
    pub median_income: f64,
    pub race_distribution: BTreeMap<String, f64>,
    /// Population (or share) per education level.
    pub education_levels: BTreeMap<String, f64>,
    pub housing_units: u64,
    pub homeownership_rate: f64,
    /// Finer grained estimates, when the lookup could resolve them.
    pub precinct_estimates: BTreeMap<String, PrecinctCensusEstimate>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct PrecinctCensusEstimate {
    pub median_income: Option<f64>,
    pub higher_education_share: Option<f64>,
}

/// Parallel per-precinct series and their correlation coefficient.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CorrelationSummary {
    pub precincts: Vec<String>,
    pub factor: Vec<f64>,
    pub turnout: Vec<f64>,
    pub coefficient: f64,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct CensusIntegration {
    pub total_unregistered: u64,
    pub unregistered_voters: BTreeMap<String, u64>,
    pub estimated_voting_age: BTreeMap<String, u64>,
    pub registration_rate: BTreeMap<String, f64>,
    pub income_turnout: CorrelationSummary,
    pub education_turnout: CorrelationSummary,
}

/// Top-level figures for a dataset.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryStatistics {
    pub total_registered: u64,
    pub total_voted: u64,
    pub overall_turnout_percentage: f64,
    pub precinct_count: usize,
    pub average_age: f64,
    pub unassigned_records: u64,
}

/// Reconciliation between the aggregated precincts and a boundary document.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BoundaryMatch {
    pub matched: Vec<String>,
    /// Precincts present in the boundaries but with no voter.
    pub without_voters: Vec<String>,
    /// Precincts with voters but absent from the boundaries.
    pub without_boundary: Vec<String>,
}

/// Errors that prevent the aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregationErrors {
    InvalidChunkSize(usize),
    BrokenInvariant(String),
}

impl Error for AggregationErrors {}

impl Display for AggregationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationErrors::InvalidChunkSize(x) => {
                write!(f, "invalid chunk size: {}", x)
            }
            AggregationErrors::BrokenInvariant(msg) => {
                write!(f, "aggregation invariant violated: {}", msg)
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationRules {
    /// Above this number of records, the input is split in chunks of this size.
    pub chunk_size: usize,
    /// Runs the chunks on the rayon thread pool.
    pub parallel: bool,
}

impl AggregationRules {
    pub const DEFAULT_CHUNK_SIZE: usize = 5000;

    pub const DEFAULT_RULES: AggregationRules = AggregationRules {
        chunk_size: AggregationRules::DEFAULT_CHUNK_SIZE,
        parallel: true,
    };
}
