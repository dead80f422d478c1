//! The errors a conversion can fail with.
//!
//! Every variant names the stage it originates from and, where one exists, the icon that caused it.

use crate::ctx::Format;
use crate::glyph::GlyphError;
use crate::sfnt::read::ReadError;
use crate::svg::NormalizeError;
use thiserror::Error;

/// An error that aborts a conversion, or a single icon of it.
#[derive(Debug, Error)]
pub enum Error {
    /// An icon is not a parsable SVG document.
    ///
    /// This error concerns a single icon.
    /// Whether it aborts the run is decided by [`Context::on_malformed`](crate::ctx::Context::on_malformed).
    #[error("icon '{name}' is not valid SVG markup: {source}")]
    MalformedVectorInput {
        /// The name of the icon.
        name: String,
        /// The reason the markup was rejected.
        #[source]
        source: NormalizeError,
    },
    /// There are no icons to convert.
    #[error("no icons to convert; a font needs at least one glyph")]
    EmptyIconSet,
    /// The code point assigned to an icon is not a Unicode scalar value.
    #[error("code point 0x{value:X} assigned to icon '{name}' is not a Unicode scalar value")]
    InvalidCodePoint {
        /// The name of the icon.
        name: String,
        /// The offending value.
        value: u32,
    },
    /// The outline of an icon can not be encoded as a TrueType glyph.
    #[error("icon '{name}' can not be encoded as a glyph: {source}")]
    GlyphAssembly {
        /// The name of the icon.
        name: String,
        /// The reason the outline was rejected.
        #[source]
        source: GlyphError,
    },
    /// The assembled font could not be transcoded into a container format.
    #[error("transcoding the font to {format} failed: {source}")]
    Transcode {
        /// The target container format.
        format: Format,
        /// The structural fault found in the font.
        #[source]
        source: ReadError,
    },
    /// The component framework is not one of the supported frameworks.
    #[error("unsupported framework '{0}'; expected one of 'vue3', 'vue2', 'react'")]
    UnsupportedFramework(String),
    /// An option holds a value outside its valid range.
    #[error("invalid option '{key}': {reason}")]
    InvalidOption {
        /// The key of the option as written in a configuration document.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Config(#[from] serde_json::Error),
}

/// A `Result` with [`Error`] as its error type.
pub type Result<T> = std::result::Result<T, Error>;
