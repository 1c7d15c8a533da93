//! Hex color parsing for the foreground/background fields.

use image::Rgba;

pub const FOREGROUND_FALLBACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const BACKGROUND_FALLBACK: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (case-insensitive).
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    let [r, g, b, a] = match hex.len() {
        3 => [nibble(0)?, nibble(1)?, nibble(2)?, 255],
        4 => [nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?],
        6 => [byte(0)?, byte(2)?, byte(4)?, 255],
        8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
        _ => return None,
    };
    Some(Rgba([r, g, b, a]))
}

/// Parses `value`, falling back to `fallback` when it is not a hex color.
pub(crate) fn resolve(value: &str, fallback: Rgba<u8>, field: &'static str) -> Rgba<u8> {
    parse_hex_color(value).unwrap_or_else(|| {
        tracing::warn!(field, value, "unrecognized color, using default");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_all_forms() {
        assert_eq!(parse_hex_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_hex_color("#FFF"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_hex_color("#1e90ff"), Some(Rgba([0x1e, 0x90, 0xff, 255])));
        assert_eq!(parse_hex_color("#f008"), Some(Rgba([255, 0, 0, 0x88])));
        assert_eq!(parse_hex_color("#11223344"), Some(Rgba([0x11, 0x22, 0x33, 0x44])));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "000000", "#12", "#12345", "#gggggg", "red", "#ﬀﬀﬀ"] {
            assert_eq!(parse_hex_color(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(resolve("nope", BACKGROUND_FALLBACK, "background"), BACKGROUND_FALLBACK);
        assert_eq!(resolve("#000", BACKGROUND_FALLBACK, "background"), FOREGROUND_FALLBACK);
    }
}
