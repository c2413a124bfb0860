mod config_reader;
mod io_census;
mod io_common;
mod io_csv;
mod io_geojson;
mod io_json;
mod io_xlsx;

use log::{debug, info, warn};

use precinct_stats::builder::Builder;
use precinct_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::stats::config_reader::*;

#[derive(Debug, Snafu)]
pub enum StatsError {
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} is empty"))]
    EmptyExcel { path: String },
    #[snafu(display("Excel file {path} has no worksheet named {worksheet}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display(
        "Excel file {path} has several worksheets, the worksheet name must be provided"
    ))]
    AmbiguousWorksheet { path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Malformed voter file: {reason}"))]
    MalformedInput { reason: String },
    #[snafu(display("Malformed boundary file: {reason}"))]
    MalformedBoundaries { reason: String },
    #[snafu(display("Input type not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No voter file was provided (use --input or --config)"))]
    MissingVoterFiles {},
    #[snafu(display("Aggregation failed"))]
    Aggregation { source: AggregationErrors },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StatsResult<T> = Result<T, StatsError>;
pub type BStatsResult<T> = Result<T, Box<StatsError>>;

fn count_map<K>(counts: &std::collections::BTreeMap<K, u64>, label: impl Fn(&K) -> String) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (k, c) in counts.iter() {
        m.insert(label(k), json!(c));
    }
    JSValue::Object(m)
}

fn precincts_to_json(agg: &GlobalAggregate) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (pid, p) in agg.precincts().iter() {
        let mut js = json!({
            "registeredVoters": p.registered_voters,
            "votedCount": p.voted_count,
            "partyCounts": count_map(&p.party_counts, |s| s.clone()),
            "raceCounts": count_map(&p.race_counts, |r| r.label().to_string()),
            "ageSampleCount": p.age_sample_count,
        });
        if let Some(rates) = agg.rates.get(pid) {
            js["turnoutPercentage"] = json!(rates.turnout_percentage);
            js["averageAge"] = json!(rates.average_age);
            js["majorityParty"] = json!(rates.majority_party);
            js["majorityRace"] = json!(rates.majority_race.map(|r| r.label()));
            js["densityScore"] = json!(rates.density_score);
        }
        m.insert(pid.clone(), js);
    }
    JSValue::Object(m)
}

fn correlation_to_json(c: &CorrelationSummary, factor_name: &str) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("precincts".to_string(), json!(c.precincts));
    m.insert(factor_name.to_string(), json!(c.factor));
    m.insert("turnout".to_string(), json!(c.turnout));
    m.insert("correlation".to_string(), json!(c.coefficient));
    JSValue::Object(m)
}

fn census_to_json(c: &CensusIntegration) -> JSValue {
    let mut precincts: JSMap<String, JSValue> = JSMap::new();
    for (pid, unregistered) in c.unregistered_voters.iter() {
        precincts.insert(
            pid.clone(),
            json!({
                "unregisteredVoters": unregistered,
                "estimatedVotingAge": c.estimated_voting_age.get(pid),
                "registrationRate": c.registration_rate.get(pid),
            }),
        );
    }
    json!({
        "totalUnregistered": c.total_unregistered,
        "precincts": precincts,
        "incomeTurnout": correlation_to_json(&c.income_turnout, "income"),
        "educationTurnout": correlation_to_json(&c.education_turnout, "education"),
    })
}

fn build_summary_js(
    config: &DatasetConfig,
    agg: &GlobalAggregate,
    summary: &SummaryStatistics,
    boundaries: Option<&BoundaryMatch>,
) -> JSValue {
    let c = OutputConfig {
        dataset: config.output_settings.dataset_name.clone(),
        county: config.output_settings.county.clone(),
        state: config.output_settings.state.clone(),
    };
    let age_groups: Vec<JSValue> = AgeGroup::ALL
        .iter()
        .map(|g| {
            let t = agg.counts.age_group_turnout[g.index()];
            json!({"ageGroup": g.label(), "voted": t.voted, "notVoted": t.not_voted})
        })
        .collect();
    let trends: Vec<JSValue> = agg
        .turnout_trends
        .iter()
        .map(|t| json!({"label": t.label, "turnout": t.turnout_percentage}))
        .collect();

    let mut js = json!({
        "config": c,
        "summary": {
            "totalRegistered": summary.total_registered,
            "totalVoted": summary.total_voted,
            "turnoutPercentage": summary.overall_turnout_percentage,
            "precinctCount": summary.precinct_count,
            "averageAge": summary.average_age,
            "unassignedRecords": summary.unassigned_records,
        },
        "precincts": precincts_to_json(agg),
        "partyCounts": count_map(&agg.counts.party_counts, |s| s.clone()),
        "raceCounts": count_map(&agg.counts.race_counts, |r| r.label().to_string()),
        "ageGroupTurnout": age_groups,
        "turnoutTrends": trends,
    });
    if let Some(census) = agg.census.as_ref() {
        js["census"] = census_to_json(census);
    }
    if let Some(b) = boundaries {
        js["boundaries"] = json!({
            "matched": b.matched,
            "withoutVoters": b.without_voters,
            "withoutBoundary": b.without_boundary,
        });
    }
    js
}

fn read_voter_data(cfs: &FileSource) -> BStatsResult<Vec<RawVoterRecord>> {
    let path = cfs.file_path.as_str();
    info!("Attempting to read voter file {:?} ({})", path, cfs.provider);
    let records = match cfs.provider.as_str() {
        "json" | "" => io_json::read_json_voters(path)?,
        "csv" => io_csv::read_csv_voters(path)?,
        "xlsx" | "excel" => io_xlsx::read_xlsx_voters(path, cfs)?,
        x => {
            return Err(Box::new(StatsError::UnknownProvider {
                provider: x.to_string(),
            }));
        }
    };
    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

fn validate_rules(rules: &RulesConfig) -> StatsResult<AggregationRules> {
    let chunk_size = match rules.chunk_size()? {
        Some(0) => whatever!("chunkSize must be a positive number"),
        Some(x) => x,
        None => AggregationRules::DEFAULT_CHUNK_SIZE,
    };
    Ok(AggregationRules {
        chunk_size,
        parallel: rules.parallel.unwrap_or(true),
    })
}

/// Runs the full pipeline on a dataset and returns the JSON summary.
pub fn run_dataset(config: &DatasetConfig) -> BStatsResult<JSValue> {
    info!("config: {:?}", config);
    let rules = validate_rules(&config.rules)?;

    if config.voter_file_sources.is_empty() {
        return Err(Box::new(StatsError::MissingVoterFiles {}));
    }

    let trends: Vec<TurnoutTrendPoint> = config
        .turnout_trends
        .iter()
        .map(|t| TurnoutTrendPoint {
            label: t.label.clone(),
            turnout_percentage: t.turnout,
        })
        .collect();
    let mut builder = Builder::new(&rules)
        .context(AggregationSnafu {})?
        .turnout_trends(&trends);
    for cfs in config.voter_file_sources.iter() {
        let file_data = read_voter_data(cfs)?;
        builder.add_records(&file_data);
    }
    info!("Read {} records in total", builder.len());

    let agg = builder.build().context(AggregationSnafu {})?;
    agg.check_invariants().context(AggregationSnafu {})?;

    // Census data is optional. A census file that cannot be read is reported and skipped.
    let census: Option<CensusRecord> = match config.census_file.as_ref() {
        Some(path) => match io_census::read_census(path) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Census data unavailable, skipping: {}", e);
                None
            }
        },
        None => None,
    };
    let agg = integrate_census_opt(&agg, census.as_ref());

    let boundaries: Option<BoundaryMatch> = match config.boundary_file.as_ref() {
        Some(path) => {
            let ids = io_geojson::read_boundaries(path)?;
            Some(match_boundaries(&agg, &ids))
        }
        None => None,
    };

    let summary = summarize(&agg);
    info!("summary: {:?}", summary);
    Ok(build_summary_js(config, &agg, &summary, boundaries.as_ref()))
}

fn check_reference(computed: &JSValue, reference_path: &str) -> StatsResult<()> {
    let summary_ref = read_summary(reference_path)?;
    if summary_ref != *computed {
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty_computed = serde_json::to_string_pretty(computed).context(ParsingJsonSnafu {})?;
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

fn write_output(js: &JSValue, out_path: Option<&str>) -> StatsResult<()> {
    let pretty_js = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    match out_path {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

/// Applies the command line flags on top of the configuration file, if any.
fn config_from_args(args: &Args) -> BStatsResult<DatasetConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => read_config(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(input) = args.input.as_ref() {
        config.voter_file_sources = vec![FileSource {
            provider: args.input_type.clone().unwrap_or_else(|| "json".to_string()),
            file_path: input.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }];
    }
    if let Some(census) = args.census.as_ref() {
        config.census_file = Some(census.clone());
    }
    if let Some(boundaries) = args.boundaries.as_ref() {
        config.boundary_file = Some(boundaries.clone());
    }
    if let Some(chunk_size) = args.chunk_size {
        config.rules.set_chunk_size(chunk_size);
    }
    if args.sequential {
        config.rules.parallel = Some(false);
    }
    debug!("config_from_args: {:?}", config);
    Ok(config)
}

pub fn run_from_args(args: &Args) -> BStatsResult<()> {
    let config = config_from_args(args)?;
    let summary_js = run_dataset(&config)?;

    let out_path = args
        .out
        .clone()
        .or_else(|| config.output_settings.output_file.clone());
    write_output(&summary_js, out_path.as_deref())?;

    // The reference summary, if provided for comparison
    if let Some(reference) = args.reference.as_ref() {
        check_reference(&summary_js, reference)?;
    }
    Ok(())
}

#[cfg(test)]
fn run_dataset_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests");
    info!("Running test {}", test_name);
    let config_path = format!("{}/{}/{}", test_dir, test_name, config_lpath);
    let summary_path = format!("{}/{}/{}", test_dir, test_name, summary_lpath);
    let res = read_config(&config_path)
        .map_err(Box::new)
        .and_then(|config| run_dataset(&config))
        .and_then(|js| check_reference(&js, &summary_path).map_err(Box::new));
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        if let Some(bt) = snafu::ErrorCompat::backtrace(&*e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_dataset_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
