use clap::Parser;

/// This is an interactive dashboard over published candidate rosters.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The roster file to load. Semicolon-delimited CSV by default,
    /// see --input-type for the other formats.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or excel. See documentation for
    /// the expected layouts.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default first sheet) When using an Excel file, indicates the name of the
    /// worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If specified, keep only the rows with this CARGO value.
    #[clap(long, value_parser)]
    pub cargo: Option<String>,

    /// If specified, keep only the rows with this LOCALIDADE value.
    #[clap(long, value_parser)]
    pub localidade: Option<String>,

    /// (SIM or NAO) If specified, keep only the rows with this NEGRO value.
    #[clap(long, value_parser)]
    pub negro: Option<String>,

    /// (SIM or NAO) If specified, keep only the rows with this PCD value.
    #[clap(long, value_parser)]
    pub pcd: Option<String>,

    /// (VAGA or CR) If specified, keep only the rows with this STATUS value.
    /// Only meaningful for rosters that carry the STATUS column.
    #[clap(long, value_parser)]
    pub status: Option<String>,

    /// If passed as an argument, prints the values available to each selector
    /// and exits.
    #[clap(long, takes_value = false)]
    pub list_options: bool,

    /// (directory path, file path or 'stdout') If specified, the filtered and
    /// sorted view is exported as semicolon-delimited CSV. A directory receives
    /// a file named roster_filtrado_<timestamp>.csv.
    #[clap(short, long, value_parser)]
    pub export: Option<String>,

    /// (file path or 'stdout') If specified, the run summary (applied filters
    /// and metrics) will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference export. If provided, rosterdash will check that
    /// the current view serializes to the same content.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
