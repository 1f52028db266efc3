use std::fmt;

use crate::ingest::RawTable;

/// Canonical month labels, indexed by month number minus one.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The five borough labels form a closed enumeration; every dataset variant
/// spells them differently (upper-case, mixed case), so matching is
/// case-insensitive with "Staten Island" as the two-word case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    StatenIsland,
}

impl Borough {
    pub const ALL: [Borough; 5] = [
        Borough::Manhattan,
        Borough::Brooklyn,
        Borough::Queens,
        Borough::Bronx,
        Borough::StatenIsland,
    ];

    /// Parse a raw borough field. Trims and matches case-insensitively;
    /// anything outside the five-borough enumeration is rejected.
    pub fn parse(raw: &str) -> Option<Borough> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "manhattan" => Some(Borough::Manhattan),
            "brooklyn" => Some(Borough::Brooklyn),
            "queens" => Some(Borough::Queens),
            "bronx" => Some(Borough::Bronx),
            "staten island" => Some(Borough::StatenIsland),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Borough::Manhattan => "Manhattan",
            Borough::Brooklyn => "Brooklyn",
            Borough::Queens => "Queens",
            Borough::Bronx => "Bronx",
            Borough::StatenIsland => "Staten Island",
        }
    }
}

impl fmt::Display for Borough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which count family a view is summing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Injured,
    Killed,
}

impl Metric {
    pub fn parse(raw: &str) -> Option<Metric> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "injured" => Some(Metric::Injured),
            "killed" => Some(Metric::Killed),
            _ => None,
        }
    }

    /// Lower-case form used in navigation parameters.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Injured => "injured",
            Metric::Killed => "killed",
        }
    }

    /// Capitalized form used in chart legends.
    pub fn legend(&self) -> &'static str {
        match self {
            Metric::Injured => "Injured",
            Metric::Killed => "Killed",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-classification of injury/fatality counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimCategory {
    Pedestrian,
    Cyclist,
    Motorist,
}

impl VictimCategory {
    pub const ALL: [VictimCategory; 3] = [
        VictimCategory::Pedestrian,
        VictimCategory::Cyclist,
        VictimCategory::Motorist,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VictimCategory::Pedestrian => "Pedestrians",
            VictimCategory::Cyclist => "Cyclists",
            VictimCategory::Motorist => "Motorists",
        }
    }
}

/// One normalized incident record. Immutable once built; numeric fields
/// default to 0 when the source column is absent or non-numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub year: u16,
    pub month: Option<u8>,
    pub time_bin: Option<String>,
    pub borough: Borough,
    pub neighborhood: Option<String>,
    pub vehicle: Option<String>,
    pub total_incidents: u64,
    pub total_injured: u64,
    pub total_killed: u64,
    pub pedestrian_injured: u64,
    pub pedestrian_killed: u64,
    pub cyclist_injured: u64,
    pub cyclist_killed: u64,
    pub motorist_injured: u64,
    pub motorist_killed: u64,
}

impl Incident {
    pub fn new(year: u16, borough: Borough) -> Incident {
        Incident {
            year,
            month: None,
            time_bin: None,
            borough,
            neighborhood: None,
            vehicle: None,
            total_incidents: 0,
            total_injured: 0,
            total_killed: 0,
            pedestrian_injured: 0,
            pedestrian_killed: 0,
            cyclist_injured: 0,
            cyclist_killed: 0,
            motorist_injured: 0,
            motorist_killed: 0,
        }
    }

    pub fn total(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Injured => self.total_injured,
            Metric::Killed => self.total_killed,
        }
    }

    pub fn victims(&self, category: VictimCategory, metric: Metric) -> u64 {
        match (category, metric) {
            (VictimCategory::Pedestrian, Metric::Injured) => self.pedestrian_injured,
            (VictimCategory::Pedestrian, Metric::Killed) => self.pedestrian_killed,
            (VictimCategory::Cyclist, Metric::Injured) => self.cyclist_injured,
            (VictimCategory::Cyclist, Metric::Killed) => self.cyclist_killed,
            (VictimCategory::Motorist, Metric::Injured) => self.motorist_injured,
            (VictimCategory::Motorist, Metric::Killed) => self.motorist_killed,
        }
    }
}

/// Result of normalizing a raw table: surviving incidents plus how many rows
/// were dropped for lacking a derivable year or borough.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub incidents: Vec<Incident>,
    pub dropped: usize,
}

/// Normalize one raw table into incident records.
///
/// The year comes from an explicit `year` column when present, otherwise from
/// the leading segment of the `date` column (`YYYY-MM-DD`). Rows without a
/// derivable year or borough are dropped; the drop is a policy decision, not
/// an error, so it is only counted and logged.
pub fn normalize_table(table: &RawTable) -> Normalized {
    let year_idx = table.column("year");
    let date_idx = table.column("date");
    let month_idx = table.column("month");
    let time_idx = table.column_any(&["time_bin", "time"]);
    let borough_idx = table.column("borough");
    let neighborhood_idx = table.column("neighborhood");
    let vehicle_idx = table.column("vehicle");

    let total_incidents_idx = table.column("total_incidents");
    let total_injured_idx = table.column("total_injured");
    let total_killed_idx = table.column("total_killed");
    // Some dataset variants pluralize the pedestrian columns.
    let ped_injured_idx = table.column_any(&["pedestrian_injured", "pedestrians_injured"]);
    let ped_killed_idx = table.column_any(&["pedestrian_killed", "pedestrians_killed"]);
    let cyc_injured_idx = table.column("cyclist_injured");
    let cyc_killed_idx = table.column("cyclist_killed");
    let mot_injured_idx = table.column("motorist_injured");
    let mot_killed_idx = table.column("motorist_killed");

    let mut incidents = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for row in &table.rows {
        let year = derive_year(field(row, year_idx), field(row, date_idx));
        let borough = field(row, borough_idx).and_then(Borough::parse);
        let (Some(year), Some(borough)) = (year, borough) else {
            dropped += 1;
            continue;
        };

        let mut incident = Incident::new(year, borough);
        incident.month = field(row, month_idx)
            .and_then(|m| m.trim().parse::<u8>().ok())
            .filter(|m| (1..=12).contains(m));
        incident.time_bin = text_field(row, time_idx);
        incident.neighborhood = text_field(row, neighborhood_idx);
        incident.vehicle = text_field(row, vehicle_idx);
        incident.total_incidents = count_field(row, total_incidents_idx);
        incident.total_injured = count_field(row, total_injured_idx);
        incident.total_killed = count_field(row, total_killed_idx);
        incident.pedestrian_injured = count_field(row, ped_injured_idx);
        incident.pedestrian_killed = count_field(row, ped_killed_idx);
        incident.cyclist_injured = count_field(row, cyc_injured_idx);
        incident.cyclist_killed = count_field(row, cyc_killed_idx);
        incident.motorist_injured = count_field(row, mot_injured_idx);
        incident.motorist_killed = count_field(row, mot_killed_idx);
        incidents.push(incident);
    }

    if dropped > 0 {
        log::debug!(
            "dropped {} of {} rows from '{}' (missing year or borough)",
            dropped,
            table.rows.len(),
            table.source
        );
    }

    Normalized { incidents, dropped }
}

/// Normalize several tables, concatenating incidents in table order then row
/// order.
pub fn normalize_all(tables: &[RawTable]) -> Normalized {
    let mut incidents = Vec::new();
    let mut dropped = 0;
    for table in tables {
        let mut normalized = normalize_table(table);
        incidents.append(&mut normalized.incidents);
        dropped += normalized.dropped;
    }
    Normalized { incidents, dropped }
}

fn field<'a>(row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| row.get(i)).map(String::as_str)
}

fn text_field(row: &[String], idx: Option<usize>) -> Option<String> {
    field(row, idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn count_field(row: &[String], idx: Option<usize>) -> u64 {
    field(row, idx)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn derive_year(year_field: Option<&str>, date_field: Option<&str>) -> Option<u16> {
    if let Some(year) = year_field.and_then(|s| s.trim().parse::<u16>().ok()) {
        return Some(year);
    }
    let date = date_field?.trim();
    let leading = date.split('-').next()?;
    leading.parse::<u16>().ok()
}
