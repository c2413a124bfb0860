use clap::Parser;

/// This is a precinct statistics program for voter files.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the dataset in JSON format: voter files, boundaries,
    /// census data and processing rules. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of a dataset in JSON format. If provided,
    /// precinctstats will check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the dataset will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The voter file to read. Setting this option overrides the voter files
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) The census record of the county, in JSON format.
    #[clap(long, value_parser)]
    pub census: Option<String>,

    /// (file path, optional) The precinct boundaries, in GeoJSON format.
    #[clap(short, long, value_parser)]
    pub boundaries: Option<String>,

    /// (default 5000) Above this number of records, the voter file is processed in chunks of this size.
    #[clap(long, value_parser)]
    pub chunk_size: Option<usize>,

    // Other arguments
    /// If passed as an argument, processes the chunks one after the other instead of in parallel.
    #[clap(long, takes_value = false)]
    pub sequential: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
