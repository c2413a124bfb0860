// Primitives for reading CSV files.

use csv::ReaderBuilder;

use crate::stats::{
    io_common::{simplify_file_name, ColumnMapping},
    *,
};

fn text_cell(s: Option<&str>) -> RawField {
    match s.map(str::trim) {
        Some(x) if !x.is_empty() => RawField::Text(x.to_string()),
        _ => RawField::Missing,
    }
}

pub fn read_csv_voters(path: &str) -> BStatsResult<Vec<RawVoterRecord>> {
    let source = simplify_file_name(path);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<Option<String>> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|s| Some(s.to_string()))
        .collect();
    let mapping = ColumnMapping::from_header(&header, &source);
    debug!("read_csv_voters: {}: mapping: {:?}", source, mapping);

    let mut res: Vec<RawVoterRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        res.push(mapping.record(|col| text_cell(line.get(col))));
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_file() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/csv_string_flags/voters.csv"
        );
        let res = read_csv_voters(path).unwrap();
        assert_eq!(res.len(), 9);
        assert_eq!(res[0].precinct, RawField::Text("12".to_string()));
        assert_eq!(res[0].voted, RawField::Text("Y".to_string()));
    }

    #[test]
    fn cells() {
        assert_eq!(text_cell(Some(" 42 ")), RawField::Text("42".to_string()));
        assert_eq!(text_cell(Some("  ")), RawField::Missing);
        assert_eq!(text_cell(None), RawField::Missing);
    }
}
