pub use crate::config::*;

use chrono::NaiveDate;

/// A builder assembling a typed [`RosterTable`] from raw string rows.
///
/// The readers hand in every cell as text; the builder coerces the three
/// typed columns and routes the variant column according to the schema.
///
/// ```
/// pub use roster_ranking::builder::Builder;
/// pub use roster_ranking::{RosterSchema, SchemaVariant};
/// # use roster_ranking::RosterErrors;
///
/// let schema = RosterSchema { variant: SchemaVariant::Placement };
/// let mut builder = Builder::new(&schema);
/// let cells: Vec<String> = [
///     "Auditor", "Campinas", "ANA LIMA", "1001", "12/03/1990",
///     "20", "10", "80", "NAO", "NAO", "VAGA",
/// ]
/// .iter()
/// .map(|s| s.to_string())
/// .collect();
/// builder.push_row(2, &cells)?;
/// let table = builder.build();
/// assert_eq!(table.len(), 1);
///
/// # Ok::<(), RosterErrors>(())
/// ```
pub struct Builder {
    schema: RosterSchema,
    rows: Vec<CandidateRow>,
}

impl Builder {
    pub fn new(schema: &RosterSchema) -> Builder {
        Builder {
            schema: *schema,
            rows: Vec::new(),
        }
    }

    /// Adds one raw row. `lineno` is the 1-based line in the source and
    /// only appears in error reports.
    ///
    /// `DATA NASC` must parse as `dd/mm/yyyy` or the row is rejected,
    /// which aborts the whole load. `NOTA` and `CE` coerce leniently to
    /// null on failure and the row is kept.
    pub fn push_row(&mut self, lineno: usize, cells: &[String]) -> Result<(), RosterErrors> {
        let expected = self.schema.columns().len();
        if cells.len() != expected {
            return Err(RosterErrors::RowWidth {
                lineno,
                expected,
                found: cells.len(),
            });
        }
        let data_nasc = NaiveDate::parse_from_str(cells[4].trim(), DATE_FORMAT).map_err(|_| {
            RosterErrors::BadDate {
                lineno,
                content: cells[4].clone(),
            }
        })?;
        let (status, acertos) = match self.schema.variant {
            SchemaVariant::Placement => (Some(cells[10].clone()), None),
            SchemaVariant::Tally => (None, Some(cells[10].clone())),
        };
        self.rows.push(CandidateRow {
            cargo: cells[0].clone(),
            localidade: cells[1].clone(),
            nome: cells[2].clone(),
            inscricao: cells[3].clone(),
            data_nasc,
            cg: cells[5].clone(),
            ce: Score::coerce(&cells[6]),
            nota: Score::coerce(&cells[7]),
            negro: cells[8].clone(),
            pcd: cells[9].clone(),
            status,
            acertos,
        });
        Ok(())
    }

    pub fn build(self) -> RosterTable {
        RosterTable {
            schema: self.schema,
            rows: self.rows,
        }
    }
}
