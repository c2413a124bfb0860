// The census record of a county, as produced by an external lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct PrecinctEstimateFile {
    #[serde(rename = "medianIncome")]
    median_income: Option<f64>,
    #[serde(rename = "higherEducationShare")]
    higher_education_share: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CensusFile {
    #[serde(rename = "votingAgePopulation")]
    voting_age_population: f64,
    #[serde(rename = "medianIncome")]
    median_income: Option<f64>,
    #[serde(rename = "raceDistribution", default)]
    race_distribution: BTreeMap<String, f64>,
    #[serde(rename = "educationLevels", default)]
    education_levels: BTreeMap<String, f64>,
    #[serde(rename = "housingUnits")]
    housing_units: Option<f64>,
    #[serde(rename = "homeownershipRate")]
    homeownership_rate: Option<f64>,
    #[serde(rename = "precinctEstimates", default)]
    precinct_estimates: BTreeMap<String, PrecinctEstimateFile>,
}

fn to_count(x: f64) -> u64 {
    if x.is_finite() && x > 0.0 {
        x.round() as u64
    } else {
        0
    }
}

pub fn parse_census(contents: &str) -> StatsResult<CensusRecord> {
    let cf: CensusFile = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let precinct_estimates: BTreeMap<String, PrecinctCensusEstimate> = cf
        .precinct_estimates
        .into_iter()
        .map(|(pid, e)| {
            (
                pid,
                PrecinctCensusEstimate {
                    median_income: e.median_income,
                    higher_education_share: e.higher_education_share,
                },
            )
        })
        .collect();
    Ok(CensusRecord {
        voting_age_population: to_count(cf.voting_age_population),
        median_income: cf.median_income.unwrap_or(0.0),
        race_distribution: cf.race_distribution,
        education_levels: cf.education_levels,
        housing_units: cf.housing_units.map(to_count).unwrap_or(0),
        homeownership_rate: cf.homeownership_rate.unwrap_or(0.0),
        precinct_estimates,
    })
}

pub fn read_census(path: &str) -> BStatsResult<CensusRecord> {
    info!("Attempting to read census file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let census = parse_census(&contents)?;
    debug!("read_census: {:?}", census);
    Ok(census)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_record() {
        let census = parse_census(
            r#"{
              "votingAgePopulation": 52000,
              "medianIncome": 61000.5,
              "raceDistribution": { "White": 0.6, "Black": 0.4 },
              "educationLevels": { "High school graduate": 6, "Bachelor's degree": 4 },
              "housingUnits": 21000,
              "homeownershipRate": 0.64,
              "precinctEstimates": { "101": { "medianIncome": 48000 } }
            }"#,
        )
        .unwrap();
        assert_eq!(census.voting_age_population, 52000);
        assert_eq!(census.median_income, 61000.5);
        assert_eq!(census.housing_units, 21000);
        assert_eq!(
            census.precinct_estimates["101"],
            PrecinctCensusEstimate {
                median_income: Some(48000.0),
                higher_education_share: None
            }
        );
        assert_eq!(higher_education_share(&census.education_levels), 0.4);
    }

    #[test]
    fn minimal_record() {
        let census = parse_census(r#"{"votingAgePopulation": 300}"#).unwrap();
        assert_eq!(census.voting_age_population, 300);
        assert!(census.education_levels.is_empty());
    }

    #[test]
    fn missing_population() {
        assert!(parse_census(r#"{"medianIncome": 5}"#).is_err());
    }
}
