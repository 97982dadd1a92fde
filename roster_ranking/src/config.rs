// ********* Schema descriptors ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// The date format of the `DATA NASC` column, both on input and on display.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

static PLACEMENT_COLUMNS: [&str; 11] = [
    "CARGO",
    "LOCALIDADE",
    "NOME",
    "INSCRICAO",
    "DATA NASC",
    "CG",
    "CE",
    "NOTA",
    "NEGRO",
    "PCD",
    "STATUS",
];

static TALLY_COLUMNS: [&str; 11] = [
    "CARGO",
    "LOCALIDADE",
    "NOME",
    "INSCRICAO",
    "DATA NASC",
    "CG",
    "CE",
    "NOTA",
    "NEGRO",
    "PCD",
    "ACERTOS",
];

/// The two roster layouts observed in published candidate lists.
///
/// Placement rosters carry a `STATUS` column (`VAGA` or `CR`), tally
/// rosters carry an `ACERTOS` column with the raw count of correct
/// answers. Everything else is common to both.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SchemaVariant {
    Placement,
    Tally,
}

/// The declared column set of a loaded roster.
///
/// Display, filtering and export consult this descriptor instead of
/// assuming a single fixed record shape.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RosterSchema {
    pub variant: SchemaVariant,
}

impl RosterSchema {
    /// The column names of this layout, in source order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self.variant {
            SchemaVariant::Placement => &PLACEMENT_COLUMNS,
            SchemaVariant::Tally => &TALLY_COLUMNS,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns().contains(&name)
    }

    /// Matches a header row against the known layouts (order-sensitive,
    /// cells trimmed).
    pub fn detect(header: &[String]) -> Result<RosterSchema, RosterErrors> {
        for variant in [SchemaVariant::Placement, SchemaVariant::Tally] {
            let schema = RosterSchema { variant };
            let columns = schema.columns();
            if columns.len() == header.len()
                && columns.iter().zip(header.iter()).all(|(c, h)| *c == h.trim())
            {
                return Ok(schema);
            }
        }
        Err(RosterErrors::UnknownHeader {
            header: header.to_vec(),
        })
    }
}

// ********* Record data structures ***********

/// A numeric score cell.
///
/// Cells that fail numeric coercion are kept as null rather than
/// rejected, and null orders below every number so that such rows sink
/// to the bottom of the descending ranking.
#[derive(Debug, Clone, Copy)]
pub struct Score(Option<f64>);

impl Score {
    pub const NULL: Score = Score(None);

    /// Lenient coercion: anything that does not parse as a number is null.
    pub fn coerce(cell: &str) -> Score {
        Score(cell.trim().parse::<f64>().ok())
    }

    pub fn from_value(x: f64) -> Score {
        Score(Some(x))
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Display form. Integral values print without a fractional part so
    /// that exported cells read like the source cells; null prints empty.
    pub fn display(&self) -> String {
        match self.0 {
            None => String::new(),
            Some(x) if x.fract() == 0.0 => format!("{}", x as i64),
            Some(x) => format!("{}", x),
        }
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.0, other.0) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a), Some(b)) => a.total_cmp(&b),
        }
    }
}

/// One row of the roster. The three typed columns are coerced, the
/// remaining cells are kept verbatim. `inscricao` is the row identity.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRow {
    pub cargo: String,
    pub localidade: String,
    pub nome: String,
    pub inscricao: String,
    pub data_nasc: NaiveDate,
    pub cg: String,
    pub ce: Score,
    pub nota: Score,
    pub negro: String,
    pub pcd: String,
    /// Filled for placement rosters only.
    pub status: Option<String>,
    /// Filled for tally rosters only.
    pub acertos: Option<String>,
}

/// A full loaded roster. Immutable once built; every derived view
/// borrows or copies from it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterTable {
    pub schema: RosterSchema,
    pub rows: Vec<CandidateRow>,
}

impl RosterTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ********* Filter parameters ***********

/// A `SIM`/`NAO` selector value.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Flag {
    Sim,
    Nao,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Sim => "SIM",
            Flag::Nao => "NAO",
        }
    }

    pub fn parse(s: &str) -> Option<Flag> {
        match s {
            "SIM" => Some(Flag::Sim),
            "NAO" => Some(Flag::Nao),
            _ => None,
        }
    }
}

/// Placement status of a candidate: a direct vacancy or the waiting list.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Status {
    Vaga,
    Cr,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Vaga => "VAGA",
            Status::Cr => "CR",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "VAGA" => Some(Status::Vaga),
            "CR" => Some(Status::Cr),
            _ => None,
        }
    }
}

/// The categorical fields a view can be constrained on.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum FilterField {
    Cargo,
    Localidade,
    Negro,
    Pcd,
    Status,
}

impl FilterField {
    pub fn column(&self) -> &'static str {
        match self {
            FilterField::Cargo => "CARGO",
            FilterField::Localidade => "LOCALIDADE",
            FilterField::Negro => "NEGRO",
            FilterField::Pcd => "PCD",
            FilterField::Status => "STATUS",
        }
    }
}

/// A set of categorical equality constraints, one per filterable field.
/// `None` means no constraint; constraints compose with logical AND.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FilterSpec {
    pub cargo: Option<String>,
    pub localidade: Option<String>,
    pub negro: Option<Flag>,
    pub pcd: Option<Flag>,
    pub status: Option<Status>,
}

impl FilterSpec {
    /// The unconstrained filter: every row passes.
    pub const ALL: FilterSpec = FilterSpec {
        cargo: None,
        localidade: None,
        negro: None,
        pcd: None,
        status: None,
    };
}

// ********* Output data structures ***********

/// A display row of a projected view.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedRow {
    /// 1-based position within the current view only.
    pub posicao: u32,
    /// Birth date in `dd/mm/yyyy` display form.
    pub data_nasc: String,
    pub row: CandidateRow,
}

impl RankedRow {
    /// Cells in schema column order, with POSIÇÃO prepended and the date
    /// in display form.
    pub fn display_cells(&self) -> Vec<String> {
        let r = &self.row;
        let mut cells = vec![
            self.posicao.to_string(),
            r.cargo.clone(),
            r.localidade.clone(),
            r.nome.clone(),
            r.inscricao.clone(),
            self.data_nasc.clone(),
            r.cg.clone(),
            r.ce.display(),
            r.nota.display(),
            r.negro.clone(),
            r.pcd.clone(),
        ];
        if let Some(s) = &r.status {
            cells.push(s.clone());
        }
        if let Some(a) = &r.acertos {
            cells.push(a.clone());
        }
        cells
    }
}

/// Summary metrics over one filtered view.
#[derive(PartialEq, Debug, Clone)]
pub struct ViewSummary {
    pub total: usize,
    pub distinct_cargos: usize,
    pub distinct_localidades: usize,
    /// Mean of the non-null NOTA values. Undefined for an empty view or
    /// when every NOTA is null.
    pub nota_media: Option<f64>,
}

/// The outcome of one filter→sort→project cycle.
#[derive(PartialEq, Debug, Clone)]
pub struct QueryResult {
    pub schema: RosterSchema,
    pub rows: Vec<RankedRow>,
    pub summary: ViewSummary,
}

// ********* Errors ***********

/// Errors surfaced by the engine and the table builder.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RosterErrors {
    /// The header row matches neither known layout.
    UnknownHeader { header: Vec<String> },
    /// A data row does not have one cell per declared column.
    RowWidth {
        lineno: usize,
        expected: usize,
        found: usize,
    },
    /// A `DATA NASC` cell does not parse as `dd/mm/yyyy`. Fatal for the
    /// whole load.
    BadDate { lineno: usize, content: String },
    /// A constraint names a column the loaded schema does not carry.
    ColumnNotInSchema { column: &'static str },
}

impl Error for RosterErrors {}

impl Display for RosterErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterErrors::UnknownHeader { header } => {
                write!(f, "header matches no known roster layout: {:?}", header)
            }
            RosterErrors::RowWidth {
                lineno,
                expected,
                found,
            } => write!(
                f,
                "line {}: expected {} cells, found {}",
                lineno, expected, found
            ),
            RosterErrors::BadDate { lineno, content } => {
                write!(f, "line {}: bad DATA NASC cell {:?}", lineno, content)
            }
            RosterErrors::ColumnNotInSchema { column } => {
                write!(f, "column {} is not part of the loaded schema", column)
            }
        }
    }
}
