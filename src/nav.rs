use crate::filter::{BoroughFilter, FilterState, Selection};
use crate::normalize::{Borough, Metric};

/// A navigation parameter that failed validation on the receiving view.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unrecognized {field} value '{value}'")]
pub struct NavError {
    pub field: &'static str,
    pub value: String,
}

/// The three string parameters passed between views: selected year ("All" or
/// a 4-digit year), metric ("injured"/"killed"), and borough ("All" or a
/// borough name). Borough labels round-trip exactly through the same
/// normalization as ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavParams {
    pub year: Selection<u16>,
    pub metric: Metric,
    pub borough: Selection<Borough>,
}

impl Default for NavParams {
    fn default() -> NavParams {
        NavParams {
            year: Selection::All,
            metric: Metric::Injured,
            borough: Selection::All,
        }
    }
}

impl NavParams {
    /// Serialize as `year=...&type=...&borough=...`.
    pub fn to_query(&self) -> String {
        let year = match self.year {
            Selection::All => "All".to_string(),
            Selection::Only(y) => y.to_string(),
        };
        let borough = match self.borough {
            Selection::All => "All",
            Selection::Only(b) => b.label(),
        };
        format!("year={year}&type={}&borough={borough}", self.metric.label())
    }

    /// Parse a query-parameter string. Missing parameters keep their
    /// defaults, matching how the receiving view treats an absent query.
    pub fn parse(query: &str) -> Result<NavParams, NavError> {
        let mut params = NavParams::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "year" => params.year = parse_year(value)?,
                "type" => {
                    params.metric = Metric::parse(value).ok_or_else(|| NavError {
                        field: "type",
                        value: value.to_string(),
                    })?
                }
                "borough" => params.borough = parse_borough(value)?,
                _ => {}
            }
        }
        Ok(params)
    }

    pub fn into_filter(self) -> FilterState {
        FilterState {
            year: self.year,
            boroughs: match self.borough {
                Selection::All => BoroughFilter::All,
                Selection::Only(b) => BoroughFilter::Any(vec![b]),
            },
            vehicle: None,
            metric: self.metric,
        }
    }
}

/// Payload a line-chart click handler forwards to the matrix view: the
/// clicked (year, borough) point plus which metric's chart was clicked.
pub fn drill_down(
    year_label: &str,
    borough_label: &str,
    metric: Metric,
) -> Result<NavParams, NavError> {
    Ok(NavParams {
        year: parse_year(year_label)?,
        metric,
        borough: parse_borough(borough_label)?,
    })
}

/// Parse a year parameter: "All" or a 4-digit year.
pub fn parse_year(value: &str) -> Result<Selection<u16>, NavError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    if value.len() == 4 {
        if let Ok(year) = value.parse::<u16>() {
            return Ok(Selection::Only(year));
        }
    }
    Err(NavError {
        field: "year",
        value: value.to_string(),
    })
}

/// Parse a borough parameter: "All" or a borough label, normalized the same
/// way ingestion normalizes the column.
pub fn parse_borough(value: &str) -> Result<Selection<Borough>, NavError> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    Borough::parse(value)
        .map(Selection::Only)
        .ok_or_else(|| NavError {
            field: "borough",
            value: value.to_string(),
        })
}
