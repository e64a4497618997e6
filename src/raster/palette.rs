// Color handling for the raster renderer

use plotters::style::RGBColor;

/// Viridis control points, sampled at equal spacing.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "cyan" => Some(RGBColor(0, 255, 255)),
        "magenta" => Some(RGBColor(255, 0, 255)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "pink" => Some(RGBColor(255, 192, 203)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        // matplotlib single-letter shorthands
        "r" => Some(RGBColor(255, 0, 0)),
        "g" => Some(RGBColor(0, 128, 0)),
        "b" => Some(RGBColor(0, 0, 255)),
        "k" => Some(RGBColor(0, 0, 0)),
        "w" => Some(RGBColor(255, 255, 255)),
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

/// Sample the viridis map at `t` in [0, 1].
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (VIRIDIS[lo], VIRIDIS[hi]);
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
