pub mod charts;

pub use charts::{BoxSeries, ChartRenderer};

use plotters::style::RGBColor;

/// Parse a `#rrggbb` color.
pub fn parse_hex_color(value: &str) -> Option<RGBColor> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
