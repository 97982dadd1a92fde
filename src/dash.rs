use log::{debug, info, warn};

use roster_ranking::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod io_csv;
pub mod io_excel;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Input file not found or unreadable: {path}"))]
    SourceNotFound {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No readable worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Line {lineno}: cell with an unexpected type: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening delimited file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a delimited line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error serializing the export"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("{path}: {source}"))]
    SchemaMismatch { source: RosterErrors, path: String },
    #[snafu(display("{path}: {source}"))]
    BadRow { source: RosterErrors, path: String },
    #[snafu(display("{source}"))]
    Query { source: RosterErrors },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
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

pub type DashResult<T> = Result<T, DashError>;

/// A row as produced by the readers, before any typing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    /// 1-based line in the source, for error reports.
    pub lineno: usize,
    pub cells: Vec<String>,
}

/// The raw content of a roster source: the header row and every data
/// row, all cells as text.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawRoster {
    pub header: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

fn read_roster(path: &str, args: &Args) -> DashResult<RawRoster> {
    let input_type = args.input_type.as_deref().unwrap_or("csv");
    info!("Attempting to read roster file {:?} as {}", path, input_type);
    match input_type {
        "csv" => io_csv::read_csv_roster(path),
        "excel" => io_excel::read_excel_roster(path, args.excel_worksheet_name.as_deref()),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

fn build_table(path: &str, raw: &RawRoster) -> DashResult<RosterTable> {
    let schema = RosterSchema::detect(&raw.header).context(SchemaMismatchSnafu { path })?;
    debug!("build_table: detected schema {:?}", schema.variant);
    let mut bld = builder::Builder::new(&schema);
    for row in raw.rows.iter() {
        bld.push_row(row.lineno, &row.cells)
            .context(BadRowSnafu { path })?;
    }
    Ok(bld.build())
}

/// Loads the roster through the cache: the file is read every time, but
/// identical content is parsed once per process.
fn load_roster<'a>(
    cache: &'a mut TableCache,
    path: &str,
    args: &Args,
) -> DashResult<&'a RosterTable> {
    let bytes = fs::read(path).context(SourceNotFoundSnafu { path })?;
    cache.get_or_parse(&bytes, || {
        let raw = read_roster(path, args)?;
        build_table(path, &raw)
    })
}

fn build_filter_spec(args: &Args) -> DashResult<FilterSpec> {
    let negro = match args.negro.as_deref() {
        None => None,
        Some(s) => match Flag::parse(s) {
            Some(f) => Some(f),
            None => whatever!("Invalid --negro value {:?}: expected SIM or NAO", s),
        },
    };
    let pcd = match args.pcd.as_deref() {
        None => None,
        Some(s) => match Flag::parse(s) {
            Some(f) => Some(f),
            None => whatever!("Invalid --pcd value {:?}: expected SIM or NAO", s),
        },
    };
    let status = match args.status.as_deref() {
        None => None,
        Some(s) => match Status::parse(s) {
            Some(st) => Some(st),
            None => whatever!("Invalid --status value {:?}: expected VAGA or CR", s),
        },
    };
    Ok(FilterSpec {
        cargo: args.cargo.clone(),
        localidade: args.localidade.clone(),
        negro,
        pcd,
        status,
    })
}

const SORT_CRITERION: &str = "Critério de ordenação: 1º NOTA (maior primeiro), 2º CE (maior primeiro), 3º DATA NASC (mais velhos primeiro)";

fn render_view(result: &QueryResult) {
    println!("Total de registros: {}", result.summary.total);
    println!("Cargos únicos: {}", result.summary.distinct_cargos);
    println!("Localidades únicas: {}", result.summary.distinct_localidades);
    match result.summary.nota_media {
        Some(m) => println!("Nota média: {:.2}", m),
        None => println!("Nota média: -"),
    }
    println!();

    if result.rows.is_empty() {
        println!("Nenhum registro encontrado com os filtros aplicados.");
        return;
    }

    println!("{}", SORT_CRITERION);
    let mut header: Vec<String> = vec!["POSIÇÃO".to_string()];
    header.extend(result.schema.columns().iter().map(|c| c.to_string()));
    let all_cells: Vec<Vec<String>> = result.rows.iter().map(|r| r.display_cells()).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for cells in all_cells.iter() {
        for (i, c) in cells.iter().enumerate() {
            widths[i] = widths[i].max(c.chars().count());
        }
    }
    let render_row = |cells: &[String]| -> String {
        let line = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:w$}", c, w = widths[i]))
            .collect::<Vec<String>>()
            .join("  ");
        line.trim_end().to_string()
    };
    println!("{}", render_row(&header));
    for cells in all_cells.iter() {
        println!("{}", render_row(cells));
    }
}

fn print_selector_options(table: &RosterTable) -> DashResult<()> {
    let fields = [
        FilterField::Cargo,
        FilterField::Localidade,
        FilterField::Negro,
        FilterField::Pcd,
        FilterField::Status,
    ];
    for field in fields {
        if !table.schema.has_column(field.column()) {
            continue;
        }
        let values = distinct_values(table, field).context(QuerySnafu {})?;
        // The implicit no-constraint entry, gendered like the original UI.
        let all = if field == FilterField::Localidade {
            "Todas"
        } else {
            "Todos"
        };
        println!("{}: {}, {}", field.column(), all, values.join(", "));
    }
    Ok(())
}

/// Serializes a projected view back to semicolon-delimited text, with
/// POSIÇÃO prepended and the date in display form.
pub fn export_view(result: &QueryResult) -> DashResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(vec![]);
    let mut header: Vec<String> = vec!["POSIÇÃO".to_string()];
    header.extend(result.schema.columns().iter().map(|c| c.to_string()));
    wtr.write_record(&header).context(CsvWriteSnafu {})?;
    for row in result.rows.iter() {
        wtr.write_record(&row.display_cells())
            .context(CsvWriteSnafu {})?;
    }
    let bytes = match wtr.into_inner() {
        Ok(b) => b,
        Err(e) => whatever!("Error finishing the export: {}", e),
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => whatever!("Export is not valid UTF-8: {}", e),
    }
}

pub fn export_file_name(now: &NaiveDateTime) -> String {
    format!("roster_filtrado_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

fn write_export(dest: &str, result: &QueryResult) -> DashResult<()> {
    let text = export_view(result)?;
    if dest == "stdout" {
        println!("{}", text);
        return Ok(());
    }
    let dest_p = Path::new(dest);
    let p: PathBuf = if dest_p.is_dir() {
        dest_p.join(export_file_name(&Local::now().naive_local()))
    } else {
        PathBuf::from(dest)
    };
    fs::write(&p, text).context(WritingOutputSnafu {
        path: p.display().to_string(),
    })?;
    info!("Wrote export to {:?}", p);
    println!("Dados filtrados exportados para {}", p.display());
    Ok(())
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFilters {
    pub cargo: Option<String>,
    pub localidade: Option<String>,
    pub negro: Option<String>,
    pub pcd: Option<String>,
    pub status: Option<String>,
}

fn build_summary_js(path: &str, spec: &FilterSpec, result: &QueryResult) -> JSValue {
    let filters = AppliedFilters {
        cargo: spec.cargo.clone(),
        localidade: spec.localidade.clone(),
        negro: spec.negro.map(|f| f.as_str().to_string()),
        pcd: spec.pcd.map(|f| f.as_str().to_string()),
        status: spec.status.map(|s| s.as_str().to_string()),
    };
    let schema = match result.schema.variant {
        SchemaVariant::Placement => "placement",
        SchemaVariant::Tally => "tally",
    };
    json!({
        "input": path,
        "schema": schema,
        "filters": filters,
        "metrics": {
            "total": result.summary.total,
            "cargosUnicos": result.summary.distinct_cargos,
            "localidadesUnicas": result.summary.distinct_localidades,
            "notaMedia": result.summary.nota_media,
        }
    })
}

fn write_summary(dest: &str, path: &str, spec: &FilterSpec, result: &QueryResult) -> DashResult<()> {
    let js = build_summary_js(path, spec, result);
    let pretty = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
    if dest == "stdout" {
        println!("{}", pretty);
        return Ok(());
    }
    fs::write(dest, pretty).context(WritingOutputSnafu { path: dest })?;
    info!("Wrote summary to {:?}", dest);
    Ok(())
}

fn check_reference(reference_path: &str, result: &QueryResult) -> DashResult<()> {
    let actual = export_view(result)?;
    let expected = fs::read_to_string(reference_path).context(SourceNotFoundSnafu {
        path: reference_path,
    })?;
    if expected != actual {
        warn!("Found differences with the reference export");
        print_diff(expected.as_str(), actual.as_str(), "\n");
        whatever!("Difference detected between the current view and the reference export");
    }
    Ok(())
}

/// One full dashboard cycle: load (through the cache), filter, sort,
/// project, render, and run the optional export/summary/reference steps.
pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let path = match &args.input {
        Some(p) => p.clone(),
        None => whatever!("No input file provided. Use --input <path>."),
    };

    let mut cache = TableCache::new();
    let table = load_roster(&mut cache, &path, args)?;
    info!(
        "Loaded {} rows with schema {:?}",
        table.len(),
        table.schema.variant
    );

    if args.list_options {
        return print_selector_options(table);
    }

    let spec = build_filter_spec(args)?;
    let result = run_roster_query(table, &spec).context(QuerySnafu {})?;

    render_view(&result);

    if let Some(dest) = &args.export {
        write_export(dest, &result)?;
    }
    if let Some(dest) = &args.out {
        write_summary(dest, &path, &spec, &result)?;
    }
    if let Some(reference) = &args.reference {
        check_reference(reference, &result)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_path(name: &str) -> String {
        format!("{}/test_data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn test_args(name: &str) -> Args {
        Args {
            input: Some(test_path(name)),
            input_type: None,
            excel_worksheet_name: None,
            cargo: None,
            localidade: None,
            negro: None,
            pcd: None,
            status: None,
            list_options: false,
            export: None,
            out: None,
            reference: None,
            verbose: false,
        }
    }

    fn load(name: &str) -> DashResult<RosterTable> {
        let args = test_args(name);
        let path = test_path(name);
        let raw = read_roster(&path, &args)?;
        build_table(&path, &raw)
    }

    #[test]
    fn loads_placement_roster() {
        let table = load("roster_a.csv").unwrap();
        assert_eq!(table.schema.variant, SchemaVariant::Placement);
        assert_eq!(table.len(), 8);
        // Unparseable score cells become null, the rows are kept.
        let gustavo = table
            .rows
            .iter()
            .find(|r| r.inscricao == "240107")
            .unwrap();
        assert!(gustavo.nota.is_null());
        let fabio = table.rows.iter().find(|r| r.inscricao == "240106").unwrap();
        assert!(fabio.ce.is_null());
    }

    #[test]
    fn loads_tally_roster() {
        let table = load("roster_b.csv").unwrap();
        assert_eq!(table.schema.variant, SchemaVariant::Tally);
        assert!(table.rows.iter().all(|r| r.acertos.is_some()));
        assert!(table.rows.iter().all(|r| r.status.is_none()));
    }

    #[test]
    fn loading_twice_yields_equal_tables() {
        assert_eq!(load("roster_a.csv").unwrap(), load("roster_a.csv").unwrap());
    }

    #[test]
    fn missing_source_is_reported() {
        let mut cache = TableCache::new();
        let args = test_args("no_such_file.csv");
        let err = load_roster(&mut cache, &test_path("no_such_file.csv"), &args).unwrap_err();
        assert!(matches!(err, DashError::SourceNotFound { .. }));
    }

    #[test]
    fn unknown_header_is_a_schema_mismatch() {
        let err = load("roster_bad_header.csv").unwrap_err();
        assert!(matches!(err, DashError::SchemaMismatch { .. }));
    }

    #[test]
    fn one_bad_date_aborts_the_load() {
        let err = load("roster_bad_date.csv").unwrap_err();
        match err {
            DashError::BadRow { source, .. } => {
                assert!(matches!(source, RosterErrors::BadDate { lineno: 3, .. }));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn cache_reuses_the_parsed_roster() {
        let mut cache = TableCache::new();
        let args = test_args("roster_a.csv");
        let path = test_path("roster_a.csv");
        let t1 = load_roster(&mut cache, &path, &args).unwrap().clone();
        let t2 = load_roster(&mut cache, &path, &args).unwrap().clone();
        assert_eq!(t1, t2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn full_query_ranks_the_fixture() {
        let table = load("roster_a.csv").unwrap();
        let result = run_roster_query(&table, &FilterSpec::ALL).unwrap();
        let ids: Vec<&str> = result
            .rows
            .iter()
            .map(|r| r.row.inscricao.as_str())
            .collect();
        // 240103 has the best NOTA; 240102 beats 240101 on the birth date
        // tiebreak; 240107 has a null NOTA and ranks last.
        assert_eq!(ids[0], "240103");
        assert_eq!(ids[1], "240102");
        assert_eq!(ids[2], "240101");
        assert_eq!(ids[7], "240107");
    }

    #[test]
    fn selector_values_are_validated() {
        let mut args = test_args("roster_a.csv");
        args.negro = Some("TALVEZ".to_string());
        assert!(build_filter_spec(&args).is_err());
        args.negro = Some("SIM".to_string());
        args.status = Some("DESCLASSIFICADO".to_string());
        assert!(build_filter_spec(&args).is_err());
    }

    #[test]
    fn status_filter_on_tally_roster_is_rejected() {
        let mut args = test_args("roster_b.csv");
        args.status = Some("VAGA".to_string());
        let err = run_dashboard(&args).unwrap_err();
        assert!(matches!(
            err,
            DashError::Query {
                source: RosterErrors::ColumnNotInSchema { .. }
            }
        ));
    }

    #[test]
    fn empty_views_render_and_summarize() {
        let table = load("roster_a.csv").unwrap();
        let spec = FilterSpec {
            cargo: Some("Procurador".to_string()),
            ..FilterSpec::ALL
        };
        let result = run_roster_query(&table, &spec).unwrap();
        assert_eq!(result.summary.total, 0);
        assert_eq!(result.summary.nota_media, None);
        // Rendering an empty view is a normal state, not a crash.
        render_view(&result);
        let text = export_view(&result).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn export_round_trip_recovers_row_values() {
        let table = load("roster_a.csv").unwrap();
        let result = run_roster_query(&table, &FilterSpec::ALL).unwrap();
        let text = export_view(&result).unwrap();

        let rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_reader(text.as_bytes());
        let mut records = rdr.into_records();
        let header: Vec<String> = records
            .next()
            .unwrap()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(header[0], "POSIÇÃO");

        let schema = RosterSchema::detect(&header[1..]).unwrap();
        let mut bld = builder::Builder::new(&schema);
        for (idx, rec) in records.enumerate() {
            let rec = rec.unwrap();
            let cells: Vec<String> = rec.iter().skip(1).map(|s| s.to_string()).collect();
            bld.push_row(idx + 2, &cells).unwrap();
        }
        let reparsed = bld.build();
        let original: Vec<CandidateRow> = result.rows.iter().map(|r| r.row.clone()).collect();
        assert_eq!(reparsed.rows, original);
    }

    #[test]
    fn export_file_name_embeds_the_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        assert_eq!(
            export_file_name(&ts),
            "roster_filtrado_20240501_093005.csv"
        );
    }

    #[test]
    fn reference_check_accepts_the_own_export() {
        let table = load("roster_a.csv").unwrap();
        let result = run_roster_query(&table, &FilterSpec::ALL).unwrap();
        let text = export_view(&result).unwrap();
        let ref_path = std::env::temp_dir().join("rosterdash_reference_test.csv");
        fs::write(&ref_path, &text).unwrap();
        check_reference(&ref_path.display().to_string(), &result).unwrap();

        let filtered = run_roster_query(
            &table,
            &FilterSpec {
                pcd: Some(Flag::Sim),
                ..FilterSpec::ALL
            },
        )
        .unwrap();
        assert!(check_reference(&ref_path.display().to_string(), &filtered).is_err());
    }
}
