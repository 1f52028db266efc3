use plotters::style::RGBColor;

use crate::palette::{HEAT_HIGH, HEAT_LOW};

/// Clamped linear map from a data domain to an output range. A degenerate
/// domain (zero or negative span, e.g. `[0, 0]` when no rows matched the
/// filter) collapses to the range minimum instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> LinearScale {
        LinearScale { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span <= 0.0 {
            return self.range.0;
        }
        let t = ((value - self.domain.0) / span).clamp(0.0, 1.0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Two-color intensity ramp for the matrix heat grid.
#[derive(Debug, Clone, Copy)]
pub struct ColorRamp {
    low: RGBColor,
    high: RGBColor,
    scale: LinearScale,
}

impl ColorRamp {
    pub fn new(low: RGBColor, high: RGBColor, max: u64) -> ColorRamp {
        ColorRamp {
            low,
            high,
            scale: LinearScale::new((0.0, max as f64), (0.0, 1.0)),
        }
    }

    /// The heat ramp used by the matrix view, domain `[0, max]`.
    pub fn heat(max: u64) -> ColorRamp {
        ColorRamp::new(HEAT_LOW, HEAT_HIGH, max)
    }

    pub fn color(&self, value: u64) -> RGBColor {
        let t = self.scale.apply(value as f64);
        let lerp = |a: u8, b: u8| (f64::from(a) + t * (f64::from(b) - f64::from(a))).round() as u8;
        RGBColor(
            lerp(self.low.0, self.high.0),
            lerp(self.low.1, self.high.1),
            lerp(self.low.2, self.high.2),
        )
    }
}

/// Symbol-map marker radius: a tenth of the incident total, clamped so tiny
/// neighborhoods stay visible and huge ones stay on the map.
pub fn marker_radius(total_incidents: u64) -> f64 {
    (total_incidents as f64 / 10.0).clamp(2.0, 50.0)
}
