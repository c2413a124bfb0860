pub use crate::config::*;

use crate::normalize::normalize_record;

/// A builder for adding voter records one at a time.
///
/// Readers that stream rows can use it instead of collecting raw records first.
///
/// ```
/// use precinct_stats::builder::Builder;
/// use precinct_stats::{AggregationRules, AggregationErrors, RawField, RawVoterRecord};
///
/// let mut builder = Builder::new(&AggregationRules::DEFAULT_RULES)?;
///
/// builder.add_record(&RawVoterRecord {
///     precinct: RawField::Text("12".to_string()),
///     voted: RawField::Text("1".to_string()),
///     ..RawVoterRecord::default()
/// });
///
/// let aggregate = builder.build()?;
/// assert_eq!(aggregate.precincts()["12"].voted_count, 1);
///
/// # Ok::<(), AggregationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AggregationRules,
    pub(crate) _records: Vec<VoterRecord>,
    pub(crate) _turnout_trends: Vec<TurnoutTrendPoint>,
}

impl Builder {
    pub fn new(rules: &AggregationRules) -> Result<Builder, AggregationErrors> {
        if rules.chunk_size == 0 {
            return Err(AggregationErrors::InvalidChunkSize(rules.chunk_size));
        }
        Ok(Builder {
            _rules: rules.clone(),
            _records: Vec::new(),
            _turnout_trends: Vec::new(),
        })
    }

    /// Historical turnout figures, passed through to the final aggregate.
    pub fn turnout_trends(self, trends: &[TurnoutTrendPoint]) -> Builder {
        Builder {
            _turnout_trends: trends.to_vec(),
            ..self
        }
    }

    /// Adds a record that has not been normalized yet.
    pub fn add_record(&mut self, record: &RawVoterRecord) {
        self._records.push(normalize_record(record));
    }

    pub fn add_records(&mut self, records: &[RawVoterRecord]) {
        self._records
            .extend(records.iter().map(normalize_record));
    }

    /// Adds a record that was already normalized.
    pub fn add_voter(&mut self, record: VoterRecord) {
        self._records.push(record);
    }

    pub fn len(&self) -> usize {
        self._records.len()
    }

    pub fn is_empty(&self) -> bool {
        self._records.is_empty()
    }

    pub fn build(&self) -> Result<GlobalAggregate, AggregationErrors> {
        let mut res = crate::aggregate(&self._records, &self._rules)?;
        res.turnout_trends = self._turnout_trends.clone();
        Ok(res)
    }
}
