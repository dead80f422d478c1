//! The stylesheet that makes the font usable from HTML.
//!
//! The stylesheet declares the font family with all three container formats, in order of preference, followed by a base class applying the family and one rule per icon inserting its code point:
//!
//! ```
//! # use glyphset::css::emit_css;
//! # use glyphset::ctx::Context;
//! # use glyphset::data::IconRecord;
//! let records = vec![IconRecord {
//!     name: "home".to_string(),
//!     content: String::new(),
//!     code_point: '\u{E600}',
//! }];
//! let css = emit_css(&records, &Context::default());
//! assert!(css.starts_with("@font-face {\n  font-family: \"iconfont\";\n"));
//! assert!(css.ends_with(".icon-home::before { content: \"\\E600\"; }\n"));
//! ```
//!
//! The `src` descriptor always lists every format, independent of the formats that were produced, so a stylesheet stays valid when fonts are added to the output later.

use crate::ctx::{Context, Format};
use crate::data::IconRecord;
use itertools::Itertools;

/// The formats in the order browsers should prefer them.
const PREFERENCE: [Format; 3] = [Format::Woff2, Format::Woff, Format::Ttf];

/// Returns the stylesheet of an icon font.
///
/// Icon rules follow the order of `records`.
pub fn emit_css(records: &[IconRecord], ctx: &Context) -> String {
    let name = &ctx.name;

    let sources = PREFERENCE
        .iter()
        .map(|format| {
            format!(
                "url('{}.{}') format('{}')",
                name,
                format.extension(),
                format.css_hint()
            )
        })
        .join(",\n       ");

    let mut css = format!(
        "@font-face {{\n  font-family: \"{name}\";\n  src: {sources};\n}}\n\n\
         .{name} {{\n  font-family: \"{name}\" !important;\n  font-size: 16px;\n  font-style: normal;\n  \
         -webkit-font-smoothing: antialiased;\n  -moz-osx-font-smoothing: grayscale;\n}}\n\n",
        name = name,
        sources = sources,
    );

    let rules = records
        .iter()
        .map(|record| {
            format!(
                ".{}-{}::before {{ content: \"\\{:X}\"; }}",
                ctx.icon_prefix, record.name, record.code_point as u32
            )
        })
        .join("\n");

    css.push_str(&rules);
    css.push('\n');

    log::info!("css: {} icon rules", records.len());

    css
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str], code_starter: u32) -> Vec<IconRecord> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| IconRecord {
                name: name.to_string(),
                content: String::new(),
                code_point: char::from_u32(code_starter + index as u32).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_emit_css() {
        let css = emit_css(&records(&["home", "search"], 0xE600), &Context::default());
        let expected = r#"@font-face {
  font-family: "iconfont";
  src: url('iconfont.woff2') format('woff2'),
       url('iconfont.woff') format('woff'),
       url('iconfont.ttf') format('truetype');
}

.iconfont {
  font-family: "iconfont" !important;
  font-size: 16px;
  font-style: normal;
  -webkit-font-smoothing: antialiased;
  -moz-osx-font-smoothing: grayscale;
}

.icon-home::before { content: "\E600"; }
.icon-search::before { content: "\E601"; }
"#;
        assert_eq!(css, expected);
    }

    #[test]
    fn test_emit_css_custom_names() {
        let ctx = Context {
            name: "brand".to_string(),
            icon_prefix: "b".to_string(),
            ..Context::default()
        };
        let css = emit_css(&records(&["logo"], 0xF0000), &ctx);
        assert!(css.contains("url('brand.woff') format('woff')"));
        assert!(css.contains(".brand {\n  font-family: \"brand\" !important;"));
        assert!(css.ends_with(".b-logo::before { content: \"\\F0000\"; }\n"));
    }

    #[test]
    fn test_emit_css_no_zero_padding() {
        let css = emit_css(&records(&["a"], 0xA0), &Context::default());
        assert!(css.ends_with(".icon-a::before { content: \"\\A0\"; }\n"));
    }

    #[test]
    fn test_emit_css_is_deterministic() {
        let records = records(&["x", "y", "z"], 0xE600);
        let ctx = Context::default();
        assert_eq!(emit_css(&records, &ctx), emit_css(&records, &ctx));
    }
}
