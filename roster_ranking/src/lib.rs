mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeSet, HashMap};

pub use crate::config::*;

/// Applies the categorical constraints of `spec` to the full table.
///
/// The returned view borrows from the table and preserves the original
/// relative order of the rows; nothing is mutated. A `STATUS` constraint
/// against a schema without that column is a caller error and is
/// rejected here.
pub fn filter_view<'a>(
    table: &'a RosterTable,
    spec: &FilterSpec,
) -> Result<Vec<&'a CandidateRow>, RosterErrors> {
    if spec.status.is_some() && !table.schema.has_column("STATUS") {
        return Err(RosterErrors::ColumnNotInSchema { column: "STATUS" });
    }
    let view: Vec<&CandidateRow> = table
        .rows
        .iter()
        .filter(|r| {
            spec.cargo.as_ref().map_or(true, |v| r.cargo == *v)
                && spec.localidade.as_ref().map_or(true, |v| r.localidade == *v)
                && spec.negro.map_or(true, |v| r.negro == v.as_str())
                && spec.pcd.map_or(true, |v| r.pcd == v.as_str())
                && spec
                    .status
                    .map_or(true, |v| r.status.as_deref() == Some(v.as_str()))
        })
        .collect();
    debug!(
        "filter_view: {} of {} rows pass {:?}",
        view.len(),
        table.rows.len(),
        spec
    );
    Ok(view)
}

/// Orders a view by the ranking key: best NOTA first, then best CE, then
/// the oldest candidate (earliest birth date).
///
/// Null scores order below every number, so rows with unparseable cells
/// sink to the bottom. The sort is stable: rows tied on all three keys
/// keep their pre-sort relative order.
pub fn sort_view(view: &mut [&CandidateRow]) {
    view.sort_by(|a, b| {
        b.nota
            .cmp(&a.nota)
            .then_with(|| b.ce.cmp(&a.ce))
            .then_with(|| a.data_nasc.cmp(&b.data_nasc))
    });
}

/// Assigns POSIÇÃO 1..N over a sorted view and formats the birth date
/// for display. No other transformation.
pub fn project_view(view: &[&CandidateRow]) -> Vec<RankedRow> {
    view.iter()
        .enumerate()
        .map(|(idx, r)| RankedRow {
            posicao: (idx + 1) as u32,
            data_nasc: r.data_nasc.format(DATE_FORMAT).to_string(),
            row: (*r).clone(),
        })
        .collect()
}

/// Summary metrics of a view. The mean is `None` for an empty view or
/// when every NOTA is null; an empty view is a normal state, not an
/// error.
pub fn summarize_view(view: &[&CandidateRow]) -> ViewSummary {
    let cargos: BTreeSet<&str> = view.iter().map(|r| r.cargo.as_str()).collect();
    let localidades: BTreeSet<&str> = view.iter().map(|r| r.localidade.as_str()).collect();
    let notas: Vec<f64> = view.iter().filter_map(|r| r.nota.value()).collect();
    let nota_media = if notas.is_empty() {
        None
    } else {
        Some(notas.iter().sum::<f64>() / notas.len() as f64)
    };
    ViewSummary {
        total: view.len(),
        distinct_cargos: cargos.len(),
        distinct_localidades: localidades.len(),
        nota_media,
    }
}

/// The sorted list of distinct values a selector can offer for `field`,
/// in addition to the implicit "all" entry.
pub fn distinct_values(
    table: &RosterTable,
    field: FilterField,
) -> Result<Vec<String>, RosterErrors> {
    if field == FilterField::Status && !table.schema.has_column("STATUS") {
        return Err(RosterErrors::ColumnNotInSchema { column: "STATUS" });
    }
    let mut values: BTreeSet<String> = BTreeSet::new();
    for r in table.rows.iter() {
        let v = match field {
            FilterField::Cargo => r.cargo.as_str(),
            FilterField::Localidade => r.localidade.as_str(),
            FilterField::Negro => r.negro.as_str(),
            FilterField::Pcd => r.pcd.as_str(),
            FilterField::Status => r.status.as_deref().unwrap_or(""),
        };
        values.insert(v.to_string());
    }
    Ok(values.into_iter().collect())
}

/// Runs one full filter→sort→project cycle over the table and computes
/// the summary metrics of the resulting view.
///
/// Every call is a pure function of `(table, spec)`; no state is
/// retained between calls.
pub fn run_roster_query(
    table: &RosterTable,
    spec: &FilterSpec,
) -> Result<QueryResult, RosterErrors> {
    info!(
        "run_roster_query: {} rows, filters: {:?}",
        table.rows.len(),
        spec
    );
    let mut view = filter_view(table, spec)?;
    sort_view(&mut view);
    let summary = summarize_view(&view);
    let rows = project_view(&view);
    debug!(
        "run_roster_query: view size {}, summary {:?}",
        rows.len(),
        summary
    );
    Ok(QueryResult {
        schema: table.schema,
        rows,
        summary,
    })
}

/// Memoization boundary for loaded tables.
///
/// The key is the sha256 digest of the source bytes, so loading
/// identical content twice parses once. Invalidation is process exit or
/// an explicit [`TableCache::clear`].
pub struct TableCache {
    entries: HashMap<String, RosterTable>,
}

impl TableCache {
    pub fn new() -> TableCache {
        TableCache {
            entries: HashMap::new(),
        }
    }

    /// Returns the table for this content, running `parse` only on the
    /// first sighting of the digest.
    pub fn get_or_parse<E, F>(&mut self, source: &[u8], parse: F) -> Result<&RosterTable, E>
    where
        F: FnOnce() -> Result<RosterTable, E>,
    {
        let key = sha256::digest(source);
        if !self.entries.contains_key(&key) {
            let table = parse()?;
            debug!("TableCache: parsed {} rows under {}", table.len(), key);
            self.entries.insert(key.clone(), table);
        } else {
            debug!("TableCache: hit for {}", key);
        }
        Ok(&self.entries[&key])
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TableCache {
    fn default() -> TableCache {
        TableCache::new()
    }
}
