use crate::stats::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::Path;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "datasetName")]
    pub dataset_name: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

/// The dataset description echoed in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dataset: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(default)]
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    // Accepts both numbers and strings.
    #[serde(rename = "chunkSize")]
    pub _chunk_size: Option<JSValue>,
    pub parallel: Option<bool>,
}

impl RulesConfig {
    pub fn chunk_size(&self) -> StatsResult<Option<usize>> {
        match &self._chunk_size {
            None | Some(JSValue::Null) => Ok(None),
            Some(x) => Ok(Some(read_js_int(x)?)),
        }
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self._chunk_size = Some(JSValue::from(chunk_size));
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TurnoutTrendConfig {
    pub label: String,
    pub turnout: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "voterFileSources", default)]
    pub voter_file_sources: Vec<FileSource>,
    #[serde(rename = "boundaryFile")]
    pub boundary_file: Option<String>,
    #[serde(rename = "censusFile")]
    pub census_file: Option<String>,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(rename = "turnoutTrends", default)]
    pub turnout_trends: Vec<TurnoutTrendConfig>,
}

fn read_js_int(x: &JSValue) -> StatsResult<usize> {
    match x {
        JSValue::Number(n) => n.as_u64().map(|v| v as usize),
        JSValue::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .context(ParsingJsonNumberSnafu {})
}

fn resolve_path(root: &Path, p: &str) -> String {
    let path = Path::new(p);
    if path.is_absolute() {
        p.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

/// Reads a dataset configuration. The paths it contains are resolved against
/// the directory of the configuration file.
pub fn read_config(path: &str) -> StatsResult<DatasetConfig> {
    info!("Attempting to read config file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config = parse_config(&contents)?;
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    debug!("read_config: root directory: {:?}", root);
    for cfs in config.voter_file_sources.iter_mut() {
        cfs.file_path = resolve_path(root, &cfs.file_path);
    }
    config.boundary_file = config.boundary_file.map(|p| resolve_path(root, &p));
    config.census_file = config.census_file.map(|p| resolve_path(root, &p));
    config.output_settings.output_file = config
        .output_settings
        .output_file
        .map(|p| resolve_path(root, &p));
    Ok(config)
}

pub fn parse_config(contents: &str) -> StatsResult<DatasetConfig> {
    let config: DatasetConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> StatsResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
