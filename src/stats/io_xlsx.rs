// Voter files as Excel spreadsheets, with a header row.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::stats::{
    io_common::{simplify_file_name, ColumnMapping},
    *,
};

fn cell_to_raw_field(cell: Option<&DataType>) -> RawField {
    match cell {
        Some(DataType::String(s)) if !s.trim().is_empty() => RawField::Text(s.trim().to_string()),
        Some(DataType::Float(f)) => RawField::Number(*f),
        Some(DataType::Int(i)) => RawField::Number(*i as f64),
        Some(DataType::Bool(b)) => RawField::Bool(*b),
        _ => RawField::Missing,
    }
}

fn header_name(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

fn get_range(path: &str, cfs: &FileSource) -> StatsResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    match cfs.excel_worksheet_name.as_ref() {
        Some(worksheet_name) => {
            let wrange = workbook
                .worksheet_range(worksheet_name)
                .context(MissingWorksheetSnafu {
                    path,
                    worksheet: worksheet_name.clone(),
                })?
                .context(OpeningExcelSnafu { path })?;
            Ok(wrange)
        }
        None => {
            let mut worksheets = workbook.worksheets();
            if worksheets.len() > 1 {
                return AmbiguousWorksheetSnafu { path }.fail();
            }
            let (name, wrange) = worksheets.pop().context(EmptyExcelSnafu { path })?;
            debug!("get_range: {}: using worksheet {:?}", path, name);
            Ok(wrange)
        }
    }
}

pub fn read_xlsx_voters(path: &str, cfs: &FileSource) -> BStatsResult<Vec<RawVoterRecord>> {
    let source = simplify_file_name(path);
    let wrange = get_range(path, cfs)?;
    let mut rows = wrange.rows();
    let header: Vec<Option<String>> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(header_name)
        .collect();
    let mapping = ColumnMapping::from_header(&header, &source);
    debug!("read_xlsx_voters: {}: mapping: {:?}", source, mapping);

    let res: Vec<RawVoterRecord> = rows
        .map(|row| mapping.record(|col| cell_to_raw_field(row.get(col))))
        .collect();
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(
            cell_to_raw_field(Some(&DataType::Float(101.0))),
            RawField::Number(101.0)
        );
        assert_eq!(
            cell_to_raw_field(Some(&DataType::String(" Y ".to_string()))),
            RawField::Text("Y".to_string())
        );
        assert_eq!(
            cell_to_raw_field(Some(&DataType::Bool(true))),
            RawField::Bool(true)
        );
        assert_eq!(cell_to_raw_field(Some(&DataType::Empty)), RawField::Missing);
        assert_eq!(cell_to_raw_field(None), RawField::Missing);
    }

    #[test]
    fn missing_file() {
        let cfs = FileSource {
            provider: "xlsx".to_string(),
            file_path: "no_such_file.xlsx".to_string(),
            excel_worksheet_name: None,
        };
        assert!(read_xlsx_voters("no_such_file.xlsx", &cfs).is_err());
    }
}
