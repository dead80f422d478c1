//! The source data of a conversion and the artifacts it produces.

use crate::ctx::Format;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::Path;

/// An icon as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSource {
    /// The name of the icon, usually the file name without its extension.
    pub name: String,
    /// The SVG markup of the icon.
    pub content: String,
}

impl IconSource {
    /// Creates an icon source.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        IconSource {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Creates an icon source named after a file, without the file's extension.
    ///
    /// Returns `None` if the file name has no stem, such as `.svg`.
    ///
    /// ```
    /// # use glyphset::data::IconSource;
    /// let icon = IconSource::from_file_name("icons/arrow-left.svg", "<svg/>").unwrap();
    /// assert_eq!(icon.name, "arrow-left");
    /// ```
    pub fn from_file_name(file_name: impl AsRef<Path>, content: impl Into<String>) -> Option<Self> {
        let path = file_name.as_ref();
        let stem = path.file_stem()?.to_str()?;

        if stem.is_empty() || path.extension().is_none() {
            return None;
        }

        Some(IconSource::new(stem, content))
    }
}

/// An icon with normalized markup and its assigned code point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRecord {
    /// The name of the icon.
    pub name: String,
    /// The normalized SVG markup of the icon.
    pub content: String,
    /// The code point the icon is rendered for.
    pub code_point: char,
}

/// Maps Unicode scalars to glyph ids.
///
/// A `BTreeMap` is used since a character map is frequently accessed in ascending order of character codes.
pub type CharacterMap = BTreeMap<char, u32>;

/// The binary fonts of a conversion.
///
/// A container is `None` if its format was not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontArtifact {
    /// The TrueType font.
    pub ttf: Option<Bytes>,
    /// The WOFF 1.0 font.
    pub woff: Option<Bytes>,
    /// The WOFF 2.0 font.
    pub woff2: Option<Bytes>,
}

impl FontArtifact {
    /// Returns the font of the given format, if it was produced.
    pub fn get(&self, format: Format) -> Option<&Bytes> {
        match format {
            Format::Ttf => self.ttf.as_ref(),
            Format::Woff => self.woff.as_ref(),
            Format::Woff2 => self.woff2.as_ref(),
        }
    }

    /// Returns the file names and contents of all produced fonts.
    ///
    /// Files are named `{font_name}.{extension}`.
    pub fn files(&self, font_name: &str) -> Vec<(String, Bytes)> {
        Format::ALL
            .iter()
            .filter_map(|&format| {
                self.get(format).map(|data| {
                    (
                        format!("{}.{}", font_name, format.extension()),
                        data.clone(),
                    )
                })
            })
            .collect()
    }
}

/// A generated component source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentArtifact {
    /// The name of the icon the component renders.
    pub name: String,
    /// The source text of the component.
    pub source_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name() {
        let icon = IconSource::from_file_name("home.svg", "<svg/>").unwrap();
        assert_eq!(icon.name, "home");
        assert_eq!(icon.content, "<svg/>");
        assert_eq!(
            IconSource::from_file_name("a/b/user.circle.svg", "").unwrap().name,
            "user.circle"
        );
        assert!(IconSource::from_file_name(".svg", "").is_none());
        assert!(IconSource::from_file_name("README", "").is_none());
    }

    #[test]
    fn test_files() {
        let artifact = FontArtifact {
            ttf: Some(Bytes::from_static(b"ttf")),
            woff: None,
            woff2: Some(Bytes::from_static(b"woff2")),
        };
        let names: Vec<String> = artifact
            .files("iconfont")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["iconfont.ttf", "iconfont.woff2"]);
    }
}
