use std::collections::HashMap;

use serde::Serialize;

use crate::filter::{FilterState, Selection};
use crate::normalize::{Borough, Incident, VictimCategory, MONTH_NAMES};

/// Number of vehicle-type options offered by the symbol map.
pub const TOP_VEHICLE_COUNT: usize = 6;

/// A grouping dimension. Month and Borough carry a fixed label domain so
/// tables stay aligned across filter changes; the rest use observed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Year,
    Month,
    TimeBin,
    Borough,
    Vehicle,
}

impl GroupKey {
    fn extract(&self, incident: &Incident) -> Option<String> {
        match self {
            GroupKey::Year => Some(incident.year.to_string()),
            GroupKey::Month => incident
                .month
                .map(|m| MONTH_NAMES[usize::from(m) - 1].to_string()),
            GroupKey::TimeBin => incident.time_bin.clone(),
            GroupKey::Borough => Some(incident.borough.label().to_string()),
            GroupKey::Vehicle => incident.vehicle.clone(),
        }
    }

    fn fixed_domain(&self) -> Option<Vec<String>> {
        match self {
            GroupKey::Month => Some(MONTH_NAMES.iter().map(|m| m.to_string()).collect()),
            GroupKey::Borough => Some(Borough::ALL.iter().map(|b| b.label().to_string()).collect()),
            _ => None,
        }
    }

    /// Orders labels observed in the data. Years and time bins sort; vehicle
    /// columns keep first-seen order, matching the source matrix header.
    fn order_observed(&self, observed: &mut Vec<String>) {
        match self {
            GroupKey::Year | GroupKey::TimeBin => observed.sort(),
            _ => {}
        }
    }
}

/// Nested outer-key → inner-key → summed count mapping, zero-filled across
/// the full cross product of its label domains. Always rebuilt whole; never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    outer_labels: Vec<String>,
    inner_labels: Vec<String>,
    cells: Vec<Vec<u64>>,
}

impl AggregateTable {
    pub fn outer_labels(&self) -> &[String] {
        &self.outer_labels
    }

    pub fn inner_labels(&self) -> &[String] {
        &self.inner_labels
    }

    pub fn value_at(&self, outer: usize, inner: usize) -> u64 {
        self.cells[outer][inner]
    }

    pub fn get(&self, outer: &str, inner: &str) -> u64 {
        let Some(o) = self.outer_labels.iter().position(|l| l == outer) else {
            return 0;
        };
        let Some(i) = self.inner_labels.iter().position(|l| l == inner) else {
            return 0;
        };
        self.cells[o][i]
    }

    /// Values for one inner label across all outer labels, in order. This is
    /// the per-category series handed to chart renderers.
    pub fn series(&self, inner: &str) -> Option<Vec<u64>> {
        let i = self.inner_labels.iter().position(|l| l == inner)?;
        Some(self.cells.iter().map(|row| row[i]).collect())
    }

    /// Sum across inner labels for each outer label.
    pub fn row_totals(&self) -> Vec<u64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn max_cell(&self) -> u64 {
        self.cells
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn grand_total(&self) -> u64 {
        self.cells.iter().flat_map(|row| row.iter()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.outer_labels.is_empty() || self.inner_labels.is_empty()
    }
}

/// Group filtered rows by two keys and sum the active metric. Rows missing
/// either key (no month column, no vehicle label) contribute nothing.
pub fn aggregate(
    rows: &[Incident],
    filter: &FilterState,
    outer: GroupKey,
    inner: GroupKey,
) -> AggregateTable {
    let mut sums: HashMap<(String, String), u64> = HashMap::new();
    let mut outer_observed: Vec<String> = Vec::new();
    let mut inner_observed: Vec<String> = Vec::new();

    for incident in rows.iter().filter(|r| filter.matches(r)) {
        let (Some(outer_label), Some(inner_label)) =
            (outer.extract(incident), inner.extract(incident))
        else {
            continue;
        };
        if !outer_observed.contains(&outer_label) {
            outer_observed.push(outer_label.clone());
        }
        if !inner_observed.contains(&inner_label) {
            inner_observed.push(inner_label.clone());
        }
        *sums.entry((outer_label, inner_label)).or_default() += incident.total(filter.metric);
    }

    let outer_labels = match outer.fixed_domain() {
        Some(fixed) => fixed,
        None => {
            outer.order_observed(&mut outer_observed);
            outer_observed
        }
    };
    let inner_labels = match inner.fixed_domain() {
        Some(fixed) => fixed,
        None => {
            inner.order_observed(&mut inner_observed);
            inner_observed
        }
    };

    let cells = outer_labels
        .iter()
        .map(|o| {
            inner_labels
                .iter()
                .map(|i| {
                    sums.get(&(o.clone(), i.clone()))
                        .copied()
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    AggregateTable {
        outer_labels,
        inner_labels,
        cells,
    }
}

/// Pedestrian/cyclist/motorist split for one cell of the matrix view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VictimBreakdown {
    pub pedestrians: u64,
    pub cyclists: u64,
    pub motorists: u64,
}

impl VictimBreakdown {
    pub fn values(&self) -> [u64; 3] {
        [self.pedestrians, self.cyclists, self.motorists]
    }

    pub fn labels() -> [&'static str; 3] {
        [
            VictimCategory::Pedestrian.label(),
            VictimCategory::Cyclist.label(),
            VictimCategory::Motorist.label(),
        ]
    }

    /// All-zero distributions are the caller's signal to suppress the chart.
    pub fn is_empty(&self) -> bool {
        self.values() == [0, 0, 0]
    }
}

/// Sum the three victim-category sub-fields for rows matching the filter
/// plus an exact (month, vehicle) cell.
pub fn victim_breakdown(
    rows: &[Incident],
    filter: &FilterState,
    month: u8,
    vehicle: &str,
) -> VictimBreakdown {
    let mut breakdown = VictimBreakdown {
        pedestrians: 0,
        cyclists: 0,
        motorists: 0,
    };

    for incident in rows.iter().filter(|r| filter.matches(r)) {
        if incident.month != Some(month) || incident.vehicle.as_deref() != Some(vehicle) {
            continue;
        }
        breakdown.pedestrians += incident.victims(VictimCategory::Pedestrian, filter.metric);
        breakdown.cyclists += incident.victims(VictimCategory::Cyclist, filter.metric);
        breakdown.motorists += incident.victims(VictimCategory::Motorist, filter.metric);
    }

    breakdown
}

/// Rank vehicle-type labels by row count under the year selection and keep
/// the top `n`. The sort is stable, so ties keep first-seen order and
/// repeated calls over the same rows return the same list.
pub fn top_vehicles(rows: &[Incident], year: &Selection<u16>, n: usize) -> Vec<String> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for incident in rows {
        if !year.admits(&incident.year) {
            continue;
        }
        let Some(vehicle) = incident.vehicle.as_deref() else {
            continue;
        };
        if !counts.contains_key(vehicle) {
            order.push(vehicle);
        }
        *counts.entry(vehicle).or_default() += 1;
    }

    order.sort_by_key(|vehicle| std::cmp::Reverse(counts[vehicle]));
    order.truncate(n);
    order.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::BoroughFilter;
    use crate::normalize::{Borough, Metric};

    fn incident(year: u16, borough: Borough, injured: u64, killed: u64) -> Incident {
        let mut i = Incident::new(year, borough);
        i.total_injured = injured;
        i.total_killed = killed;
        i
    }

    fn sample_rows() -> Vec<Incident> {
        vec![
            incident(2019, Borough::Brooklyn, 5, 0),
            incident(2019, Borough::Brooklyn, 0, 1),
            incident(2020, Borough::Queens, 3, 0),
        ]
    }

    #[test]
    fn test_year_borough_table_zero_filled() {
        let table = aggregate(
            &sample_rows(),
            &FilterState::default(),
            GroupKey::Year,
            GroupKey::Borough,
        );
        assert_eq!(table.outer_labels(), ["2019", "2020"]);
        assert_eq!(table.inner_labels().len(), 5);
        assert_eq!(table.get("2019", "Brooklyn"), 5);
        assert_eq!(table.get("2020", "Queens"), 3);
        assert_eq!(table.get("2020", "Brooklyn"), 0);
        assert_eq!(table.get("2019", "Staten Island"), 0);
    }

    #[test]
    fn test_killed_metric_selects_other_field() {
        let filter = FilterState {
            metric: Metric::Killed,
            ..FilterState::default()
        };
        let table = aggregate(&sample_rows(), &filter, GroupKey::Year, GroupKey::Borough);
        assert_eq!(table.get("2019", "Brooklyn"), 1);
        assert_eq!(table.get("2020", "Queens"), 0);
    }

    #[test]
    fn test_no_rows_lost_or_double_counted() {
        let rows = sample_rows();
        let table = aggregate(
            &rows,
            &FilterState::default(),
            GroupKey::Year,
            GroupKey::Borough,
        );
        let expected: u64 = rows.iter().map(|r| r.total_injured).sum();
        assert_eq!(table.grand_total(), expected);
    }

    #[test]
    fn test_row_order_permutation_invariant() {
        let mut rows = sample_rows();
        let table = aggregate(
            &rows,
            &FilterState::default(),
            GroupKey::Year,
            GroupKey::Borough,
        );
        rows.reverse();
        let shuffled = aggregate(
            &rows,
            &FilterState::default(),
            GroupKey::Year,
            GroupKey::Borough,
        );
        assert_eq!(table, shuffled);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let rows = sample_rows();
        let filter = FilterState {
            year: Selection::Only(2019),
            ..FilterState::default()
        };
        let first = aggregate(&rows, &filter, GroupKey::Year, GroupKey::Borough);
        let second = aggregate(&rows, &filter, GroupKey::Year, GroupKey::Borough);
        assert_eq!(first, second);
    }

    #[test]
    fn test_month_vehicle_matrix_covers_all_months() {
        let mut row = incident(2019, Borough::Bronx, 4, 0);
        row.month = Some(3);
        row.vehicle = Some("Sedan".to_string());
        let table = aggregate(
            &[row],
            &FilterState::default(),
            GroupKey::Month,
            GroupKey::Vehicle,
        );
        assert_eq!(table.outer_labels().len(), 12);
        assert_eq!(table.get("March", "Sedan"), 4);
        assert_eq!(table.get("April", "Sedan"), 0);
    }

    #[test]
    fn test_rows_without_group_key_skipped() {
        // No month and no vehicle on this row; the matrix ignores it.
        let row = incident(2019, Borough::Bronx, 4, 0);
        let table = aggregate(
            &[row],
            &FilterState::default(),
            GroupKey::Month,
            GroupKey::Vehicle,
        );
        assert_eq!(table.grand_total(), 0);
        assert!(table.inner_labels().is_empty());
    }

    #[test]
    fn test_borough_filter_applies() {
        let filter = FilterState {
            boroughs: BoroughFilter::Any(vec![Borough::Queens]),
            ..FilterState::default()
        };
        let table = aggregate(&sample_rows(), &filter, GroupKey::Year, GroupKey::Borough);
        assert_eq!(table.grand_total(), 3);
    }

    #[test]
    fn test_series_alignment() {
        let table = aggregate(
            &sample_rows(),
            &FilterState::default(),
            GroupKey::Year,
            GroupKey::Borough,
        );
        assert_eq!(table.series("Brooklyn"), Some(vec![5, 0]));
        assert_eq!(table.series("Queens"), Some(vec![0, 3]));
        assert_eq!(table.series("Atlantis"), None);
    }

    #[test]
    fn test_victim_breakdown_all_zero() {
        let mut row = incident(2019, Borough::Bronx, 0, 0);
        row.month = Some(3);
        row.vehicle = Some("Sedan".to_string());
        let filter = FilterState {
            metric: Metric::Killed,
            ..FilterState::default()
        };
        let breakdown = victim_breakdown(&[row], &filter, 3, "Sedan");
        assert_eq!(breakdown.values(), [0, 0, 0]);
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_victim_breakdown_sums_cell_only() {
        let mut a = incident(2019, Borough::Bronx, 0, 0);
        a.month = Some(3);
        a.vehicle = Some("Sedan".to_string());
        a.pedestrian_injured = 2;
        a.cyclist_injured = 1;

        let mut b = a.clone();
        b.month = Some(4); // different cell

        let breakdown = victim_breakdown(&[a, b], &FilterState::default(), 3, "Sedan");
        assert_eq!(breakdown.values(), [2, 1, 0]);
    }

    #[test]
    fn test_top_vehicles_deterministic_with_ties() {
        let mut rows = Vec::new();
        for (vehicle, count) in [("Sedan", 3), ("Taxi", 2), ("Bike", 2), ("Bus", 1)] {
            for _ in 0..count {
                let mut r = incident(2019, Borough::Queens, 1, 0);
                r.vehicle = Some(vehicle.to_string());
                rows.push(r);
            }
        }
        let first = top_vehicles(&rows, &Selection::All, 3);
        assert_eq!(first, ["Sedan", "Taxi", "Bike"]);
        // Taxi and Bike tie at 2; first-seen order must hold across calls.
        let second = top_vehicles(&rows, &Selection::All, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_vehicles_respects_year() {
        let mut a = incident(2019, Borough::Queens, 1, 0);
        a.vehicle = Some("Sedan".to_string());
        let mut b = incident(2020, Borough::Queens, 1, 0);
        b.vehicle = Some("Taxi".to_string());
        let top = top_vehicles(&[a, b], &Selection::Only(2020), 6);
        assert_eq!(top, ["Taxi"]);
    }
}
