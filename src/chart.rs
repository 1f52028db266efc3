use serde::Serialize;

use crate::aggregate::{aggregate, AggregateTable, GroupKey};
use crate::filter::FilterState;
use crate::geo::Centroids;
use crate::normalize::{Borough, Incident, Metric};
use crate::palette::borough_hex;
use crate::scale::marker_radius;

/// One legend entry: a label plus its value per category, aligned with
/// `ChartData::categories`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<u64>,
    /// `#rrggbb`, when the view pins a color (boroughs, pie slices).
    pub color: Option<String>,
}

/// The shape handed to chart renderers: ordered category labels on one axis,
/// one or more numeric series over them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Line view: observed years on the x-axis, one series per borough. All five
/// boroughs appear even when empty so the legend stays stable across metrics.
pub fn yearly_trend(rows: &[Incident], metric: Metric) -> ChartData {
    let filter = FilterState {
        metric,
        ..FilterState::default()
    };
    let table = aggregate(rows, &filter, GroupKey::Year, GroupKey::Borough);

    let series = Borough::ALL
        .iter()
        .map(|borough| ChartSeries {
            label: borough.label().to_string(),
            values: table.series(borough.label()).unwrap_or_default(),
            color: Some(borough_hex(*borough).to_string()),
        })
        .collect();

    let kind = match metric {
        Metric::Injured => "Injury",
        Metric::Killed => "Fatality",
    };
    ChartData {
        title: format!("Yearly {kind} Data by Borough"),
        categories: table.outer_labels().to_vec(),
        series,
    }
}

/// Radar view: one axis per time-of-day bin, totals under the active
/// year/borough filter collapsed into a single series.
pub fn daily_profile(rows: &[Incident], filter: &FilterState) -> ChartData {
    let table = aggregate(rows, filter, GroupKey::TimeBin, GroupKey::Borough);
    ChartData {
        title: "Total Injury Trend Across an Average Day".to_string(),
        categories: table.outer_labels().to_vec(),
        series: vec![ChartSeries {
            label: filter.metric.legend().to_string(),
            values: table.row_totals(),
            color: None,
        }],
    }
}

/// Matrix view: twelve months by observed vehicle types.
pub fn monthly_matrix(rows: &[Incident], filter: &FilterState) -> AggregateTable {
    aggregate(rows, filter, GroupKey::Month, GroupKey::Vehicle)
}

/// One symbol-map marker, sized by incident count and placed at the
/// neighborhood centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub neighborhood: String,
    pub borough: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
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

/// Build map markers for one concrete (year, vehicle) pair. The map only
/// shows markers once both are selected; neighborhoods with no centroid are
/// skipped.
pub fn vehicle_map(
    rows: &[Incident],
    centroids: &Centroids,
    year: u16,
    vehicle: &str,
) -> Vec<MapMarker> {
    rows.iter()
        .filter(|r| r.year == year && r.vehicle.as_deref() == Some(vehicle))
        .filter_map(|r| {
            let neighborhood = r.neighborhood.as_deref()?;
            let (lat, lon) = centroids.get(neighborhood)?;
            Some(MapMarker {
                neighborhood: neighborhood.to_string(),
                borough: r.borough.label().to_string(),
                lat,
                lon,
                radius: marker_radius(r.total_incidents),
                total_incidents: r.total_incidents,
                total_injured: r.total_injured,
                total_killed: r.total_killed,
                pedestrian_injured: r.pedestrian_injured,
                pedestrian_killed: r.pedestrian_killed,
                cyclist_injured: r.cyclist_injured,
                cyclist_killed: r.cyclist_killed,
                motorist_injured: r.motorist_injured,
                motorist_killed: r.motorist_killed,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawTable;

    fn incident(year: u16, borough: Borough, injured: u64) -> Incident {
        let mut i = Incident::new(year, borough);
        i.total_injured = injured;
        i
    }

    #[test]
    fn test_yearly_trend_has_five_series() {
        let rows = vec![
            incident(2019, Borough::Brooklyn, 5),
            incident(2020, Borough::Queens, 3),
        ];
        let chart = yearly_trend(&rows, Metric::Injured);
        assert_eq!(chart.categories, ["2019", "2020"]);
        assert_eq!(chart.series.len(), 5);
        let brooklyn = chart.series.iter().find(|s| s.label == "Brooklyn").unwrap();
        assert_eq!(brooklyn.values, [5, 0]);
        assert_eq!(brooklyn.color.as_deref(), Some("#47D79A"));
    }

    #[test]
    fn test_daily_profile_sums_across_boroughs() {
        let mut a = incident(2019, Borough::Brooklyn, 5);
        a.time_bin = Some("00:00-03:59".to_string());
        let mut b = incident(2019, Borough::Queens, 3);
        b.time_bin = Some("00:00-03:59".to_string());
        let mut c = incident(2019, Borough::Queens, 2);
        c.time_bin = Some("04:00-07:59".to_string());

        let chart = daily_profile(&[a, b, c], &FilterState::default());
        assert_eq!(chart.categories, ["00:00-03:59", "04:00-07:59"]);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].values, [8, 2]);
    }

    #[test]
    fn test_vehicle_map_requires_centroid() {
        let mut known = incident(2019, Borough::Queens, 4);
        known.neighborhood = Some("Astoria".to_string());
        known.vehicle = Some("Sedan".to_string());
        known.total_incidents = 120;
        let mut unknown = known.clone();
        unknown.neighborhood = Some("Lost City".to_string());

        let table = RawTable {
            source: "centroids".to_string(),
            headers: vec!["neighborhood".into(), "lat".into(), "lon".into()],
            rows: vec![vec!["Astoria".into(), "40.76".into(), "-73.92".into()]],
        };
        let centroids = Centroids::from_table(&table);

        let markers = vehicle_map(&[known, unknown], &centroids, 2019, "Sedan");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].neighborhood, "Astoria");
        assert_eq!(markers[0].borough, "Queens");
        assert_eq!(markers[0].radius, 12.0);
    }

    #[test]
    fn test_vehicle_map_filters_year_and_vehicle() {
        let mut a = incident(2019, Borough::Queens, 4);
        a.neighborhood = Some("Astoria".to_string());
        a.vehicle = Some("Sedan".to_string());
        let mut b = a.clone();
        b.year = 2020;
        let mut c = a.clone();
        c.vehicle = Some("Taxi".to_string());

        let table = RawTable {
            source: "centroids".to_string(),
            headers: vec!["neighborhood".into(), "lat".into(), "lon".into()],
            rows: vec![vec!["Astoria".into(), "40.76".into(), "-73.92".into()]],
        };
        let centroids = Centroids::from_table(&table);
        assert_eq!(vehicle_map(&[a, b, c], &centroids, 2019, "Sedan").len(), 1);
    }
}
