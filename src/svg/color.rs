//! Replacement of literal colors by `currentColor`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// The value that makes a shape inherit the CSS `color` of its context.
pub const CURRENT_COLOR: &str = "currentColor";

/// Attributes that may hold a color.
///
/// `style` is included since inline declarations such as `fill:#000` are as common as presentation attributes.
const COLOR_ATTRIBUTES: [&str; 8] = [
    "fill",
    "stroke",
    "color",
    "stop-color",
    "flood-color",
    "lighting-color",
    "solid-color",
    "style",
];

lazy_static! {
    /// Matches hex triplets and sextuplets as well as `rgb()`, `rgba()`, `hsl()`, and `hsla()` functions.
    static ref COLOR: Regex = Regex::new(concat!(
        r"#(?:[0-9a-fA-F]{3}){1,2}\b",
        r"|rgb\(\s*\d+\s*,\s*\d+\s*,\s*\d+\s*\)",
        r"|rgba\(\s*\d+\s*,\s*\d+\s*,\s*\d+\s*,\s*[\d.]+\s*\)",
        r"|hsl\(\s*\d+\s*,\s*\d+%\s*,\s*\d+%\s*\)",
        r"|hsla\(\s*\d+\s*,\s*\d+%\s*,\s*\d+%\s*,\s*[\d.]+\s*\)",
    ))
    .unwrap();
}

/// Returns whether the attribute with the given qualified name can hold a color.
pub fn is_color_attribute(name: &str) -> bool {
    COLOR_ATTRIBUTES.contains(&name)
}

/// Replaces every literal color in `value` by `currentColor`.
///
/// Values without literal colors, including `none` and URL references to gradients, are returned unchanged.
///
/// ```
/// # use glyphset::svg::color::clear;
/// assert_eq!(clear("#ff0000"), "currentColor");
/// assert_eq!(clear("fill:rgb(0, 0, 0);stroke:#abc"), "fill:currentColor;stroke:currentColor");
/// assert_eq!(clear("none"), "none");
/// ```
pub fn clear(value: &str) -> String {
    COLOR
        .replace_all(value, |caps: &Captures| {
            let found = &caps[0];
            let start = caps.get(0).map_or(0, |m| m.start());
            // `url(#abc)` references an element id
            if value[..start].ends_with("url(") {
                found.to_string()
            } else {
                CURRENT_COLOR.to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_forms() {
        assert_eq!(clear("#FFF"), CURRENT_COLOR);
        assert_eq!(clear("#a1b2c3"), CURRENT_COLOR);
        assert_eq!(clear("rgb(255,0,0)"), CURRENT_COLOR);
        assert_eq!(clear("rgba(255, 0, 0, 0.5)"), CURRENT_COLOR);
        assert_eq!(clear("hsl(120, 100%, 50%)"), CURRENT_COLOR);
        assert_eq!(clear("hsla(120,100%,50%,.3)"), CURRENT_COLOR);
    }

    #[test]
    fn test_clear_leaves_other_values() {
        assert_eq!(clear("none"), "none");
        assert_eq!(clear("url(#gradient)"), "url(#gradient)");
        assert_eq!(clear("url(#abc)"), "url(#abc)");
        assert_eq!(clear("currentColor"), "currentColor");
        // four hex digits are not a color
        assert_eq!(clear("#abcd"), "#abcd");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let once = clear("fill:#000;stroke:rgb(1,2,3);opacity:.5");
        assert_eq!(once, "fill:currentColor;stroke:currentColor;opacity:.5");
        assert_eq!(clear(&once), once);
    }

    #[test]
    fn test_color_attributes() {
        assert!(is_color_attribute("fill"));
        assert!(is_color_attribute("style"));
        assert!(!is_color_attribute("href"));
        assert!(!is_color_attribute("id"));
    }
}
