use crate::normalize::{Borough, Incident, Metric};

/// A dropdown-style selection: everything, or one concrete value. Tagged
/// variants instead of an "All" string sentinel so invalid states don't
/// parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => selected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Borough constraint. The radar view multi-selects boroughs; an empty
/// selection list means no constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoroughFilter {
    All,
    Any(Vec<Borough>),
}

impl BoroughFilter {
    pub fn admits(&self, borough: Borough) -> bool {
        match self {
            BoroughFilter::All => true,
            BoroughFilter::Any(selected) => selected.is_empty() || selected.contains(&borough),
        }
    }
}

/// The current user selection, passed into aggregation as an immutable value.
/// Changing a selection builds a new state; aggregates are always recomputed
/// from scratch against it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub year: Selection<u16>,
    pub boroughs: BoroughFilter,
    pub vehicle: Option<String>,
    pub metric: Metric,
}

impl Default for FilterState {
    fn default() -> FilterState {
        FilterState {
            year: Selection::All,
            boroughs: BoroughFilter::All,
            vehicle: None,
            metric: Metric::Injured,
        }
    }
}

impl FilterState {
    pub fn matches(&self, incident: &Incident) -> bool {
        if !self.year.admits(&incident.year) {
            return false;
        }
        if !self.boroughs.admits(incident.borough) {
            return false;
        }
        match &self.vehicle {
            None => true,
            Some(vehicle) => incident.vehicle.as_deref() == Some(vehicle.as_str()),
        }
    }
}

/// Click-to-select transition: clicking the current selection clears it,
/// clicking anything else selects it.
pub fn toggle<T: PartialEq>(current: Option<T>, clicked: T) -> Option<T> {
    match current {
        Some(selected) if selected == clicked => None,
        _ => Some(clicked),
    }
}
