// Reader for rosters published as Excel workbooks.

use calamine::{open_workbook, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::dash::*;

pub fn read_excel_roster(path: &str, worksheet: Option<&str>) -> DashResult<RawRoster> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut header: Vec<String> = Vec::new();
    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = idx + 1;
        debug!("read_excel_roster: {:?} {:?}", lineno, row);
        let mut cells: Vec<String> = Vec::new();
        for cell in row {
            cells.push(read_cell(lineno, cell)?);
        }
        if lineno == 1 {
            header = cells;
        } else {
            rows.push(ParsedRow { lineno, cells });
        }
    }
    if header.is_empty() {
        return Err(DashError::EmptyExcel {
            path: path.to_string(),
        });
    }
    Ok(RawRoster { header, rows })
}

// Every cell goes through the same typing path as the CSV reader, so
// numeric cells are rendered back to text first.
fn read_cell(lineno: usize, cell: &calamine::DataType) -> DashResult<String> {
    match cell {
        calamine::DataType::String(s) => Ok(s.clone()),
        calamine::DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        calamine::DataType::Float(f) => Ok(format!("{}", f)),
        calamine::DataType::Int(i) => Ok(format!("{}", i)),
        calamine::DataType::Empty => Ok("".to_string()),
        _ => Err(DashError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        }),
    }
}
