use plotters::style::RGBColor;

use crate::normalize::{Borough, VictimCategory};

/// Matrix heat-grid endpoints.
pub const HEAT_LOW: RGBColor = RGBColor(0xd9, 0xf0, 0xff);
pub const HEAT_HIGH: RGBColor = RGBColor(0x00, 0x4c, 0x8c);

/// Fixed per-borough colors shared by the line chart and the map outlines.
pub fn borough_hex(borough: Borough) -> &'static str {
    match borough {
        Borough::Manhattan => "#47BDEF",
        Borough::Brooklyn => "#47D79A",
        Borough::Queens => "#FFBA00",
        Borough::Bronx => "#660099",
        Borough::StatenIsland => "#883F1C",
    }
}

pub fn borough_color(borough: Borough) -> RGBColor {
    // The table above is all valid hex; fall back to the Manhattan blue.
    parse_hex(borough_hex(borough)).unwrap_or(RGBColor(0x47, 0xBD, 0xEF))
}

/// Pie slice colors, in pedestrian/cyclist/motorist order.
pub fn victim_hex(category: VictimCategory) -> &'static str {
    match category {
        VictimCategory::Pedestrian => "#ffcd56",
        VictimCategory::Cyclist => "#ff6384",
        VictimCategory::Motorist => "#36a2eb",
    }
}

pub fn victim_color(category: VictimCategory) -> RGBColor {
    parse_hex(victim_hex(category)).unwrap_or(RGBColor(0x36, 0xa2, 0xeb))
}

/// Parse a `#rrggbb` string.
pub fn parse_hex(hex: &str) -> Option<RGBColor> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(RGBColor(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#47BDEF"), Some(RGBColor(0x47, 0xBD, 0xEF)));
        assert_eq!(parse_hex("#ffcd56"), Some(RGBColor(0xff, 0xcd, 0x56)));
        assert_eq!(parse_hex("47BDEF"), None);
        assert_eq!(parse_hex("#xyzxyz"), None);
    }

    #[test]
    fn test_every_borough_has_a_color() {
        for borough in Borough::ALL {
            assert!(parse_hex(borough_hex(borough)).is_some());
        }
    }
}
