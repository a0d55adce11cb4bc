//! Line colour helpers.

/// Colour used when neither the registry nor OSM provide one.
pub const FALLBACK_COLOR: &str = "#888888";

/// Normalize a hex colour to `#RRGGBB` upper case.
///
/// Accepts `RGB`/`RRGGBB` with or without `#`. Returns `None` for anything
/// else (named colours, malformed values).
///
/// ```
/// use transit_sync::color::normalize_hex;
///
/// assert_eq!(normalize_hex("ee352e").as_deref(), Some("#EE352E"));
/// assert_eq!(normalize_hex("#f00").as_deref(), Some("#FF0000"));
/// assert_eq!(normalize_hex("red"), None);
/// ```
pub fn normalize_hex(value: &str) -> Option<String> {
    let digits = value.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_uppercase()))
}

/// Compare two colour values, as hex when both parse, else case-insensitively.
pub fn same_color(a: &str, b: &str) -> bool {
    match (normalize_hex(a), normalize_hex(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

fn channel(hex: &str, index: usize) -> Option<f64> {
    let byte = u8::from_str_radix(hex.get(1 + index * 2..3 + index * 2)?, 16).ok()?;
    let c = f64::from(byte) / 255.0;
    // sRGB to linear
    Some(if c <= 0.039_28 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    })
}

/// Black or white text, whichever contrasts better with `background`.
pub fn text_color_for(background: &str) -> &'static str {
    let Some(hex) = normalize_hex(background) else {
        return "#FFFFFF";
    };
    let (Some(r), Some(g), Some(b)) = (channel(&hex, 0), channel(&hex, 1), channel(&hex, 2)) else {
        return "#FFFFFF";
    };
    let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    if luminance > 0.179 { "#000000" } else { "#FFFFFF" }
}
