//! The context with which a conversion is performed.
//!
//! Options reach a conversion from three places: built-in defaults, a discovered configuration document, and explicit caller overrides.
//! [`resolve`] merges the latter two into a single [`Options`] value, with explicit overrides taking precedence over the document.
//! [`Context::from_options`] then fills in the built-in defaults and validates the result.
//! The context is never mutated after resolution.
//!
//! # Example
//!
//! ```
//! # use glyphset::ctx::{resolve, Context, Options};
//! let discovered = Options::from_json(r#"{ "name": "brand", "iconPrefix": "b" }"#).unwrap();
//! let explicit = Options {
//!     icon_prefix: Some("brand-icon".to_string()),
//!     ..Options::default()
//! };
//! let ctx = Context::from_options(&resolve(Some(discovered), explicit)).unwrap();
//! assert_eq!(ctx.name, "brand");
//! assert_eq!(ctx.icon_prefix, "brand-icon");
//! assert_eq!(ctx.code_starter, 0xE600);
//! ```

use crate::error::{Error, Result};
use crate::sfnt::tables::cmap::EncodingRecord;
use crate::sfnt::tables::name::MAX_NAME_LENGTH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The default font family name.
pub const DEFAULT_NAME: &str = "iconfont";
/// The default CSS class prefix.
pub const DEFAULT_ICON_PREFIX: &str = "icon";
/// The default first code point, the start of the Private Use Area.
pub const DEFAULT_CODE_STARTER: u32 = 0xE600;
/// The default font height, which is also the number of units per em.
pub const DEFAULT_FONT_HEIGHT: u16 = 1000;

/// A set of options where every option may be absent.
///
/// This is the shape of a configuration document as well as of explicit caller overrides.
/// Unknown keys of a document (such as the `input` and `output` directories of a command line front end) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// The font family name; also names the output files.
    pub name: Option<String>,
    /// The CSS class prefix of the per-icon rules.
    pub icon_prefix: Option<String>,
    /// The code point assigned to the first icon.
    pub code_starter: Option<u32>,
    /// Whether literal colors are replaced by `currentColor`.
    pub clear_color: Option<bool>,
    /// The container formats to produce.
    pub formats: Option<Vec<Format>>,
    /// The component framework.
    pub framework: Option<String>,
    /// The file extension of generated components.
    pub extname: Option<String>,
    /// A component template with `$name` and `$svgString` placeholders.
    pub template: Option<String>,
    /// The height of a glyph in font units.
    pub font_height: Option<u16>,
    /// The distance of the baseline from the bottom of a glyph in font units.
    pub descent: Option<i16>,
    /// Whether every glyph advances by the font height.
    pub fixed_width: Option<bool>,
    /// Whether outlines are centered within their advance width.
    pub center_horizontally: Option<bool>,
    /// The optimization level, one of `O0` to `O3`.
    pub optimization: Option<String>,
    /// Encoding record codes of the `cmap` table, e.g. `3/1=4`.
    pub cmap_encoding_records: Option<Vec<String>>,
    /// The creation time written to the font in seconds since the Unix epoch.
    pub timestamp: Option<i64>,
    /// What to do with icons that are not valid SVG markup.
    pub on_malformed: Option<MalformedPolicy>,
}

impl Options {
    /// Parses options from a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Options> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns these options with every option present in `overrides` replaced.
    pub fn merge(self, overrides: Options) -> Options {
        Options {
            name: overrides.name.or(self.name),
            icon_prefix: overrides.icon_prefix.or(self.icon_prefix),
            code_starter: overrides.code_starter.or(self.code_starter),
            clear_color: overrides.clear_color.or(self.clear_color),
            formats: overrides.formats.or(self.formats),
            framework: overrides.framework.or(self.framework),
            extname: overrides.extname.or(self.extname),
            template: overrides.template.or(self.template),
            font_height: overrides.font_height.or(self.font_height),
            descent: overrides.descent.or(self.descent),
            fixed_width: overrides.fixed_width.or(self.fixed_width),
            center_horizontally: overrides.center_horizontally.or(self.center_horizontally),
            optimization: overrides.optimization.or(self.optimization),
            cmap_encoding_records: overrides.cmap_encoding_records.or(self.cmap_encoding_records),
            timestamp: overrides.timestamp.or(self.timestamp),
            on_malformed: overrides.on_malformed.or(self.on_malformed),
        }
    }
}

/// Merges a discovered configuration document with explicit overrides.
///
/// Explicit overrides take precedence over the discovered document.
/// Options absent from both fall back to built-in defaults once the result is turned into a [`Context`].
pub fn resolve(discovered: Option<Options>, explicit: Options) -> Options {
    discovered.unwrap_or_default().merge(explicit)
}

/// The resolved context of the font conversion.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Context {
    /// The font family name.
    pub name: String,
    /// The CSS class prefix of the per-icon rules.
    pub icon_prefix: String,
    /// The code point assigned to the first icon.
    pub code_starter: u32,
    /// Whether literal colors are replaced by `currentColor`.
    pub clear_color: bool,
    /// The container formats to produce.
    pub formats: BTreeSet<Format>,
    /// The height of a glyph in font units, also used as `unitsPerEm`.
    pub font_height: u16,
    /// The distance of the baseline from the bottom of a glyph in font units.
    pub descent: i16,
    /// Whether every glyph advances by the font height.
    pub fixed_width: bool,
    /// Whether outlines are centered within their advance width.
    pub center_horizontally: bool,
    /// The optimization level of the compressed containers.
    pub optimization: Optimization,
    /// Overrides the encoding records of the [`cmap`](crate::sfnt::tables::cmap) table.
    ///
    /// Kept sorted by platform, then encoding, as a `cmap` table lists them; `None` selects the records by the code points in use.
    pub cmap_encoding_records: Option<Vec<EncodingRecord>>,
    /// The creation and modification time of the font in seconds since the Unix epoch.
    pub timestamp: i64,
    /// What to do with icons that are not valid SVG markup.
    pub on_malformed: MalformedPolicy,
}

impl Context {
    /// Creates a context from resolved options, filling absent options with built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if an option is out of range or can not be parsed.
    pub fn from_options(options: &Options) -> Result<Context> {
        let mut ctx = Context::default();

        if let Some(name) = &options.name {
            if name.trim().is_empty() {
                return Err(invalid("name", "the font name must not be empty"));
            }
            if name.encode_utf16().count() > MAX_NAME_LENGTH {
                return Err(invalid(
                    "name",
                    format!("the font name is longer than {} UTF-16 code units", MAX_NAME_LENGTH),
                ));
            }
            ctx.name = name.clone();
        }
        if let Some(prefix) = &options.icon_prefix {
            ctx.icon_prefix = prefix.clone();
        }
        if let Some(code_starter) = options.code_starter {
            ctx.code_starter = code_starter;
        }
        if let Some(clear_color) = options.clear_color {
            ctx.clear_color = clear_color;
        }
        if let Some(formats) = &options.formats {
            ctx.formats = formats.iter().copied().collect();
        }
        if let Some(font_height) = options.font_height {
            if font_height < 16 || font_height > 16384 {
                return Err(invalid(
                    "fontHeight",
                    format!("{} is outside the range 16 to 16384", font_height),
                ));
            }
            ctx.font_height = font_height;
        }
        if let Some(descent) = options.descent {
            ctx.descent = descent;
        }
        if ctx.descent < 0 || ctx.descent as i32 >= ctx.font_height as i32 {
            return Err(invalid(
                "descent",
                format!(
                    "{} must be at least 0 and less than the font height {}",
                    ctx.descent, ctx.font_height
                ),
            ));
        }
        if let Some(fixed_width) = options.fixed_width {
            ctx.fixed_width = fixed_width;
        }
        if let Some(center) = options.center_horizontally {
            ctx.center_horizontally = center;
        }
        if let Some(name) = &options.optimization {
            ctx.optimization = Optimization::from_name(name).ok_or_else(|| {
                invalid("optimization", format!("'{}' is not one of O0 to O3", name))
            })?;
        }
        if let Some(codes) = &options.cmap_encoding_records {
            let mut records = codes
                .iter()
                .map(|code| {
                    EncodingRecord::from_code(code)
                        .map_err(|e| invalid("cmapEncodingRecords", format!("'{}': {}", code, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            records.sort();
            ctx.cmap_encoding_records = Some(records);
        }
        if let Some(timestamp) = options.timestamp {
            ctx.timestamp = timestamp;
        }
        if let Some(policy) = options.on_malformed {
            ctx.on_malformed = policy;
        }

        log::debug!("resolved context: {:?}", ctx);

        Ok(ctx)
    }

    /// Returns the ascent of the font: the font height above the baseline.
    pub fn ascent(&self) -> i16 {
        (self.font_height as i32 - self.descent as i32) as i16
    }

    /// Returns whether the given container format was requested.
    pub fn wants(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context {
            name: DEFAULT_NAME.to_string(),
            icon_prefix: DEFAULT_ICON_PREFIX.to_string(),
            code_starter: DEFAULT_CODE_STARTER,
            clear_color: true,
            formats: Format::ALL.iter().copied().collect(),
            font_height: DEFAULT_FONT_HEIGHT,
            descent: 0,
            fixed_width: false,
            center_horizontally: false,
            optimization: Optimization::default(),
            cmap_encoding_records: None,
            timestamp: 0,
            on_malformed: MalformedPolicy::default(),
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidOption {
        key,
        reason: reason.into(),
    }
}

/// A font container format.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// TrueType: the raw table directory form.
    Ttf,
    /// WOFF 1.0: every table compressed on its own.
    Woff,
    /// WOFF 2.0: all tables compressed as one stream.
    Woff2,
}

impl Format {
    /// All formats in order of increasing compression.
    pub const ALL: [Format; 3] = [Format::Ttf, Format::Woff, Format::Woff2];

    /// The file extension of the format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ttf => "ttf",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }

    /// The format hint used in a CSS `src` descriptor.
    pub fn css_hint(&self) -> &'static str {
        match self {
            Self::Ttf => "truetype",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The treatment of icons whose markup can not be parsed.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole conversion.
    #[default]
    Abort,
    /// Drop the icon with a warning before code points are allocated.
    Skip,
}

/// How hard the compressed containers are squeezed, from `O0` (fastest) to `O3` (smallest).
///
/// The TrueType font is the same at every level; only WOFF and WOFF2 sizes change.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub enum Optimization {
    /// Fast compression for development builds.
    O0,
    /// Moderate compression.
    O1,
    /// Strong compression, suited for distribution.
    #[default]
    O2,
    /// The strongest compression with the largest Brotli window; slow for large icon sets.
    O3,
}

impl Optimization {
    /// All levels, in increasing order.
    pub const ALL: [Optimization; 4] = [Self::O0, Self::O1, Self::O2, Self::O3];

    /// Returns the level named `O0` to `O3`, or `None` for any other name.
    pub fn from_name(name: &str) -> Option<Optimization> {
        Self::ALL.into_iter().find(|level| format!("{:?}", level) == name)
    }

    /// The zlib compression level used for WOFF tables.
    pub fn deflate_level(&self) -> u32 {
        match self {
            Self::O0 => 1,
            Self::O1 => 6,
            Self::O2 | Self::O3 => 9,
        }
    }

    /// The Brotli quality used for the WOFF2 table stream.
    pub fn brotli_quality(&self) -> u32 {
        match self {
            Self::O0 => 4,
            Self::O1 => 9,
            Self::O2 | Self::O3 => 11,
        }
    }

    /// The base-2 logarithm of the Brotli window size.
    pub fn brotli_window(&self) -> u32 {
        match self {
            Self::O3 => 24,
            _ => 22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = Context::from_options(&Options::default()).unwrap();
        assert_eq!(ctx, Context::default());
        assert_eq!(ctx.name, "iconfont");
        assert_eq!(ctx.icon_prefix, "icon");
        assert_eq!(ctx.code_starter, 0xE600);
        assert!(ctx.clear_color);
        assert_eq!(ctx.formats.len(), 3);
        assert_eq!(ctx.ascent(), 1000);
    }

    #[test]
    fn test_precedence() {
        let discovered = Options {
            name: Some("doc".to_string()),
            icon_prefix: Some("doc-prefix".to_string()),
            clear_color: Some(false),
            ..Options::default()
        };
        let explicit = Options {
            name: Some("explicit".to_string()),
            ..Options::default()
        };
        let options = resolve(Some(discovered), explicit);
        assert_eq!(options.name.as_deref(), Some("explicit"));
        assert_eq!(options.icon_prefix.as_deref(), Some("doc-prefix"));
        assert_eq!(options.clear_color, Some(false));
        assert_eq!(options.code_starter, None);

        let ctx = Context::from_options(&options).unwrap();
        assert_eq!(ctx.code_starter, DEFAULT_CODE_STARTER);
        assert!(!ctx.clear_color);
    }

    #[test]
    fn test_from_json_ignores_unknown_keys() {
        let options = Options::from_json(
            r#"{
                "input": "./icons",
                "output": "./fonts",
                "name": "brand",
                "codeStarter": 59000,
                "formats": ["ttf", "woff2"],
                "onMalformed": "skip"
            }"#,
        )
        .unwrap();
        let ctx = Context::from_options(&options).unwrap();
        assert_eq!(ctx.name, "brand");
        assert_eq!(ctx.code_starter, 59000);
        assert!(ctx.wants(Format::Ttf));
        assert!(!ctx.wants(Format::Woff));
        assert!(ctx.wants(Format::Woff2));
        assert_eq!(ctx.on_malformed, MalformedPolicy::Skip);
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        assert!(matches!(
            Options::from_json("{ \"name\": 3 }"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_invalid_options() {
        let options = Options {
            optimization: Some("O9".to_string()),
            ..Options::default()
        };
        assert!(matches!(
            Context::from_options(&options),
            Err(Error::InvalidOption { key: "optimization", .. })
        ));

        let options = Options {
            descent: Some(1000),
            ..Options::default()
        };
        assert!(matches!(
            Context::from_options(&options),
            Err(Error::InvalidOption { key: "descent", .. })
        ));

        let options = Options {
            cmap_encoding_records: Some(vec!["3/1-4".to_string()]),
            ..Options::default()
        };
        assert!(matches!(
            Context::from_options(&options),
            Err(Error::InvalidOption { key: "cmapEncodingRecords", .. })
        ));

        let options = Options {
            name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..Options::default()
        };
        assert!(matches!(
            Context::from_options(&options),
            Err(Error::InvalidOption { key: "name", .. })
        ));

        let options = Options {
            name: Some("x".repeat(MAX_NAME_LENGTH)),
            ..Options::default()
        };
        assert!(Context::from_options(&options).is_ok());
    }

    #[test]
    fn test_encoding_records_are_sorted() {
        let options = Options {
            cmap_encoding_records: Some(vec!["3/1=4".to_string(), "0/3=4".to_string()]),
            ..Options::default()
        };
        let ctx = Context::from_options(&options).unwrap();
        let codes: Vec<String> = ctx
            .cmap_encoding_records
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(codes, ["0/3=4", "3/1=4"]);
    }

    #[test]
    fn test_optimization_order() {
        assert!(Optimization::O0 < Optimization::O3);
        assert!(Optimization::O0.brotli_quality() < Optimization::O2.brotli_quality());
        assert_eq!(Optimization::from_name("O1"), Some(Optimization::O1));
        assert_eq!(Optimization::from_name("fast"), None);
    }
}
