//! Hex color parsing and stroke derivation.

use peniko::Color;

/// Channel value at or above which a fill counts as "near white".
const NEAR_WHITE_THRESHOLD: u8 = 0xF0;

/// Parse a CSS-style hex color (`#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`).
///
/// The leading `#` is optional and digits are case-insensitive.
pub fn parse_hex(input: &str) -> Option<Color> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    let (r, g, b, a) = match hex.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
        4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, a))
}

/// Format a color as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
pub fn to_hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02X}{:02X}{:02X}", rgba.r, rgba.g, rgba.b)
    } else {
        format!("#{:02X}{:02X}{:02X}{:02X}", rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

/// Whether every color channel is at or above the near-white threshold.
pub fn is_near_white(color: Color) -> bool {
    let rgba = color.to_rgba8();
    rgba.r >= NEAR_WHITE_THRESHOLD && rgba.g >= NEAR_WHITE_THRESHOLD && rgba.b >= NEAR_WHITE_THRESHOLD
}

/// Outline color drawn under a text fill.
///
/// White and near-white fills get a black outline, everything else a white one.
pub fn stroke_for(fill: Color) -> Color {
    if is_near_white(fill) {
        Color::BLACK
    } else {
        Color::WHITE
    }
}
