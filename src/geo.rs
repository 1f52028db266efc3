use std::collections::HashMap;
use std::path::Path;

use crate::ingest::{read_table, IngestError, RawTable};

/// Static neighborhood → coordinate lookup used to place map markers.
/// Loaded once per session, read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct Centroids {
    map: HashMap<String, (f64, f64)>,
}

impl Centroids {
    pub fn load(path: &Path) -> Result<Centroids, IngestError> {
        let table = read_table(path)?;
        Ok(Centroids::from_table(&table))
    }

    /// Rows without a parseable coordinate pair are skipped.
    pub fn from_table(table: &RawTable) -> Centroids {
        let mut map = HashMap::new();
        let (Some(name_idx), Some(lat_idx), Some(lon_idx)) = (
            table.column("neighborhood"),
            table.column("lat"),
            table.column("lon"),
        ) else {
            return Centroids { map };
        };

        for row in &table.rows {
            let Some(name) = row.get(name_idx).map(|s| s.trim()).filter(|s| !s.is_empty())
            else {
                continue;
            };
            let lat = row.get(lat_idx).and_then(|s| s.trim().parse::<f64>().ok());
            let lon = row.get(lon_idx).and_then(|s| s.trim().parse::<f64>().ok());
            if let (Some(lat), Some(lon)) = (lat, lon) {
                map.insert(name.to_string(), (lat, lon));
            }
        }
        Centroids { map }
    }

    pub fn get(&self, neighborhood: &str) -> Option<(f64, f64)> {
        self.map.get(neighborhood).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
