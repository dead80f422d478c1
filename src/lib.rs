//! # Glyphset
//!
//! *Glyphset* compiles SVG icons into an icon font.
//!
//! A conversion takes a list of named SVG documents and produces:
//!
//! - the font in the TrueType, [WOFF](crate::woff), and [WOFF2](crate::woff2) container formats,
//! - a [stylesheet](crate::css) declaring the font and one class per icon,
//! - optionally, a [component](crate::component) per icon for Vue 3, Vue 2, or React.
//!
//! Every stage is a pure function over in-memory data; reading icons from disk and writing the artifacts is left to the caller.
//!
//! ## Stages
//!
//! 1. [`svg::normalize`] strips metadata from each icon and optionally replaces its colors with `currentColor`.
//! 2. [`codepoint::allocate`] assigns consecutive code points from the private use area, in input order.
//! 3. [`glyph::assemble`] converts the outlines to quadratic TrueType contours and compiles the [SFNT](crate::sfnt) tables.
//! 4. [`transcode::transcode`] derives the requested container formats from the TrueType font.
//! 5. [`css::emit_css`] writes the stylesheet.
//!
//! [`convert::convert_font`] runs the whole font pipeline, [`convert::convert_components`] the component pipeline.
//!
//! ## Fully supported components
//!
//! - The [SFNT container format](crate::sfnt) with the tables `head`, `hhea`, `maxp`, `OS/2`, `hmtx`, `cmap`, `loca`, `glyf`, `name`, and `post`.
//! - The [`cmap` table](crate::sfnt::tables::cmap) with [format 4](crate::sfnt::tables::cmap::format4) and [format 12](crate::sfnt::tables::cmap::format12) subtables.
//! - WOFF 1.0 and WOFF 2.0, including the `glyf` transform, with decoders for both.
//!
//! ## Example
//!
//! ```
//! use glyphset::convert::convert_font;
//! use glyphset::ctx::{Context, Options};
//! use glyphset::data::IconSource;
//!
//! let options = Options::from_json(r#"{ "name": "app", "formats": ["woff2"] }"#).unwrap();
//! let ctx = Context::from_options(&options).unwrap();
//! let icons = vec![IconSource::new(
//!     "plus",
//!     r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M11 4h2v7h7v2h-7v7h-2v-7H4v-2h7z"/></svg>"#,
//! )];
//!
//! let output = convert_font(&icons, &ctx).unwrap();
//! assert!(output.font.ttf.is_none());
//! assert!(output.font.woff2.is_some());
//! assert!(output.css.contains(".icon-plus::before { content: \"\\E600\"; }"));
//! ```

#![deny(missing_docs, missing_debug_implementations)]

pub mod codepoint;
pub mod component;
pub mod convert;
pub mod css;
pub mod ctx;
pub mod data;
pub mod error;
pub mod glyph;
pub mod sfnt;
pub mod svg;
pub mod transcode;
pub mod woff;
pub mod woff2;

pub use convert::{convert_components, convert_font, FontOutput};
pub use error::{Error, Result};
