// Primitives for reading the semicolon-delimited roster files.

use log::debug;
use snafu::prelude::*;

use crate::dash::*;

pub fn read_csv_roster(path: &str) -> DashResult<RawRoster> {
    let rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut header: Vec<String> = Vec::new();
    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_roster: {:?} {:?}", lineno, line);
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if lineno == 1 {
            header = cells;
        } else {
            rows.push(ParsedRow { lineno, cells });
        }
    }
    if header.is_empty() {
        whatever!("Empty roster file {:?}", path);
    }
    Ok(RawRoster { header, rows })
}
