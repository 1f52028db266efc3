use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crate::normalize::Incident;

/// Errors raised while acquiring raw datasets. Partial success is not
/// supported: if any required source fails, the whole load fails and
/// downstream stages see no data.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("source '{source}' is unavailable: {cause}")]
    SourceUnavailable {
        source: String,
        #[source]
        cause: io::Error,
    },

    #[error("source '{source}' is malformed: {cause}")]
    SourceMalformed {
        source: String,
        #[source]
        cause: csv::Error,
    },

    #[error("source '{name}' contains no data rows")]
    EmptySource { name: String },
}

/// One parsed delimited file: a header row naming its columns plus string
/// rows. Field typing happens later, in normalization.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Case-insensitive header lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// First match among several candidate header spellings.
    pub fn column_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.column(name))
    }
}

/// Read a single CSV source from disk.
pub fn read_table(path: &Path) -> Result<RawTable, IngestError> {
    let source = path.display().to_string();
    let file = File::open(path).map_err(|cause| IngestError::SourceUnavailable {
        source: source.clone(),
        cause,
    })?;
    parse_table(source, file)
}

fn parse_table<R: io::Read>(source: String, reader: R) -> Result<RawTable, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let malformed = |cause: csv::Error| IngestError::SourceMalformed {
        source: source.clone(),
        cause,
    };

    let headers = csv_reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(IngestError::EmptySource { name: source });
    }

    Ok(RawTable {
        source,
        headers,
        rows,
    })
}

/// Load all sources, one reader thread per file, joined before returning.
/// The join is all-or-nothing: the first failure wins and no partial data is
/// handed downstream. Tables come back in argument order.
pub fn load_tables(paths: &[PathBuf]) -> Result<Vec<RawTable>, IngestError> {
    thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| scope.spawn(move || read_table(path)))
            .collect();

        let mut tables = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(result) => tables.push(result?),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        Ok(tables)
    })
}

/// Opaque token tying a load back to the generation that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Session-retained rows behind a generation counter. A load that resolves
/// after a newer one began is discarded instead of overwriting fresher state.
#[derive(Debug, Default)]
pub struct DatasetStore {
    rows: Vec<Incident>,
    generation: u64,
}

impl DatasetStore {
    pub fn new() -> DatasetStore {
        DatasetStore::default()
    }

    pub fn rows(&self) -> &[Incident] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Incident> {
        self.rows
    }

    pub fn is_loaded(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Start a load, invalidating any still-unresolved older one.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        LoadToken(self.generation)
    }

    /// Install rows if the token is still current. Returns whether the rows
    /// were accepted.
    pub fn complete_load(&mut self, token: LoadToken, rows: Vec<Incident>) -> bool {
        if token.0 != self.generation {
            log::debug!(
                "discarding stale load (generation {} superseded by {})",
                token.0,
                self.generation
            );
            return false;
        }
        self.rows = rows;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Borough;

    fn parse(source: &str, text: &str) -> Result<RawTable, IngestError> {
        parse_table(source.to_string(), text.as_bytes())
    }

    #[test]
    fn test_parse_table_headers_and_rows() {
        let table = parse("a.csv", "year,borough\n2019,Brooklyn\n2020,Queens\n").unwrap();
        assert_eq!(table.headers, vec!["year", "borough"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2020", "Queens"]);
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = parse("a.csv", "Year,BOROUGH\n2019,Brooklyn\n").unwrap();
        assert_eq!(table.column("year"), Some(0));
        assert_eq!(table.column("borough"), Some(1));
        assert_eq!(table.column("vehicle"), None);
        assert_eq!(table.column_any(&["vehicle", "borough"]), Some(1));
    }

    #[test]
    fn test_header_only_source_is_empty() {
        let err = parse("a.csv", "year,borough\n").unwrap_err();
        assert!(matches!(err, IngestError::EmptySource { .. }));
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        let table = parse("a.csv", "year,borough,vehicle\n2019,Brooklyn\n").unwrap();
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_load_tables_fails_on_missing_source() {
        let paths = vec![PathBuf::from("/nonexistent/collisions.csv")];
        let err = load_tables(&paths).unwrap_err();
        assert!(matches!(err, IngestError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_store_accepts_current_load() {
        let mut store = DatasetStore::new();
        let token = store.begin_load();
        let accepted = store.complete_load(token, vec![Incident::new(2019, Borough::Queens)]);
        assert!(accepted);
        assert!(store.is_loaded());
        assert_eq!(store.rows().len(), 1);
    }

    #[test]
    fn test_store_discards_stale_load() {
        let mut store = DatasetStore::new();
        let stale = store.begin_load();
        let fresh = store.begin_load();
        assert!(store.complete_load(fresh, vec![Incident::new(2020, Borough::Bronx)]));
        // The older load resolves late; it must not clobber the newer rows.
        assert!(!store.complete_load(stale, vec![Incident::new(2019, Borough::Queens)]));
        assert_eq!(store.rows()[0].year, 2020);
    }
}
