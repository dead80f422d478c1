//! The conversion pipelines.
//!
//! The font pipeline normalizes the icons, allocates their code points, assembles the TrueType font, transcodes it into the requested containers, and emits the stylesheet.
//! The component pipeline only normalizes the icons and renders a component for each of them.
//!
//! Both pipelines are pure functions of their input: no files are read or written, and the same input always produces the same output.
//!
//! # Example
//!
//! ```
//! # use glyphset::convert::convert_font;
//! # use glyphset::ctx::Context;
//! # use glyphset::data::IconSource;
//! let icons = vec![
//!     IconSource::new("square", r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M2 2h20v20H2z"/></svg>"#),
//!     IconSource::new("bar", r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M2 10h20v4H2z"/></svg>"#),
//! ];
//! let output = convert_font(&icons, &Context::default()).unwrap();
//! assert_eq!(output.glyphs.len(), 2);
//! assert!(output.css.contains(".icon-bar::before { content: \"\\E601\"; }"));
//! assert!(output.font.ttf.is_some() && output.font.woff.is_some() && output.font.woff2.is_some());
//! ```

use crate::component::{self, ComponentContext};
use crate::ctx::{Context, MalformedPolicy};
use crate::data::{ComponentArtifact, FontArtifact, IconRecord, IconSource};
use crate::error::{Error, Result};
use crate::glyph::{self, GlyphTable};
use crate::{codepoint, css, svg, transcode};
use bytes::Bytes;
use rayon::prelude::*;

/// The result of the font pipeline.
#[derive(Debug, Clone)]
pub struct FontOutput {
    /// The icons with normalized markup and their code points, in input order.
    pub records: Vec<IconRecord>,
    /// The glyphs of the font, excluding `.notdef`.
    pub glyphs: GlyphTable,
    /// The fonts of the requested formats.
    pub font: FontArtifact,
    /// The stylesheet.
    pub css: String,
}

impl FontOutput {
    /// Returns the file names and contents of the fonts and the stylesheet.
    ///
    /// Fonts are named `{font_name}.{extension}`, the stylesheet `{font_name}.css`.
    pub fn files(&self, font_name: &str) -> Vec<(String, Bytes)> {
        let mut files = self.font.files(font_name);
        files.push((
            format!("{}.css", font_name),
            Bytes::from(self.css.clone().into_bytes()),
        ));
        files
    }
}

/// Converts icons into a font and its stylesheet.
///
/// # Errors
///
/// - [`Error::EmptyIconSet`] if there are no icons, or every icon was skipped.
/// - [`Error::MalformedVectorInput`] if an icon can not be parsed and the policy is [`MalformedPolicy::Abort`].
/// - [`Error::InvalidCodePoint`] if the code points leave the Unicode scalar values.
/// - [`Error::GlyphAssembly`] if an outline can not be encoded.
/// - [`Error::Transcode`] if a container can not be produced.
///
/// No partial output is returned on failure.
pub fn convert_font(icons: &[IconSource], ctx: &Context) -> Result<FontOutput> {
    if icons.is_empty() {
        return Err(Error::EmptyIconSet);
    }

    log::info!("converting {} icons into font '{}'", icons.len(), ctx.name);

    let normalized = normalize_all(icons, ctx.clear_color, ctx.on_malformed)?;
    let records = codepoint::allocate(normalized, ctx.code_starter)?;
    let (glyphs, ttf) = glyph::assemble(&records, ctx)?;
    let font = transcode::transcode(&ttf, ctx)?;
    let css = css::emit_css(&records, ctx);

    Ok(FontOutput {
        records,
        glyphs,
        font,
        css,
    })
}

/// Converts icons into component sources, in input order.
///
/// # Errors
///
/// - [`Error::EmptyIconSet`] if there are no icons, or every icon was skipped.
/// - [`Error::MalformedVectorInput`] if an icon can not be parsed and the policy is [`MalformedPolicy::Abort`].
pub fn convert_components(icons: &[IconSource], ctx: &ComponentContext) -> Result<Vec<ComponentArtifact>> {
    if icons.is_empty() {
        return Err(Error::EmptyIconSet);
    }

    log::info!("converting {} icons into components", icons.len());

    let normalized = normalize_all(icons, ctx.clear_color, ctx.on_malformed)?;

    if normalized.is_empty() {
        return Err(Error::EmptyIconSet);
    }

    component::emit_components(&normalized, ctx)
}

/// Normalizes the markup of every icon in parallel, keeping the input order.
///
/// With [`MalformedPolicy::Skip`], icons that can not be parsed are dropped with a warning.
fn normalize_all(
    icons: &[IconSource],
    clear_color: bool,
    policy: MalformedPolicy,
) -> Result<Vec<IconSource>> {
    let results: Vec<Result<IconSource>> = icons
        .par_iter()
        .map(|icon| {
            svg::normalize(&icon.content, clear_color)
                .map(|content| IconSource::new(icon.name.clone(), content))
                .map_err(|source| Error::MalformedVectorInput {
                    name: icon.name.clone(),
                    source,
                })
        })
        .collect();

    let mut normalized = Vec::with_capacity(results.len());

    for result in results {
        match (result, policy) {
            (Ok(icon), _) => normalized.push(icon),
            (Err(error), MalformedPolicy::Skip) => log::warn!("skipping icon: {}", error),
            (Err(error), MalformedPolicy::Abort) => return Err(error),
        }
    }

    log::debug!(
        "normalized {} of {} icons",
        normalized.len(),
        icons.len()
    );

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfnt::read::FontFile;

    fn square(name: &str) -> IconSource {
        IconSource::new(
            name,
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path fill="#123456" d="M1 1h14v14H1z"/></svg>"##,
        )
    }

    #[test]
    fn test_convert_font() {
        let icons = vec![square("a"), square("b"), square("c")];
        let output = convert_font(&icons, &Context::default()).unwrap();

        let ttf = output.font.ttf.clone().unwrap();
        let font = FontFile::parse(&ttf).unwrap();
        let map = font.character_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&'\u{E602}'], 3);
        assert_eq!(font.num_glyphs().unwrap(), 4);
        assert!(output.records.iter().all(|r| r.content.contains("currentColor")));
    }

    #[test]
    fn test_convert_font_empty() {
        assert!(matches!(
            convert_font(&[], &Context::default()),
            Err(Error::EmptyIconSet)
        ));
    }

    #[test]
    fn test_convert_font_malformed_policy() {
        let icons = vec![square("a"), IconSource::new("broken", "<svg"), square("c")];

        let ctx = Context::default();
        assert!(matches!(
            convert_font(&icons, &ctx),
            Err(Error::MalformedVectorInput { name, .. }) if name == "broken"
        ));

        let ctx = Context {
            on_malformed: MalformedPolicy::Skip,
            ..Context::default()
        };
        let output = convert_font(&icons, &ctx).unwrap();
        let names: Vec<&str> = output.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(output.records[1].code_point, '\u{E601}');

        let only_broken = vec![IconSource::new("broken", "<svg")];
        assert!(matches!(
            convert_font(&only_broken, &ctx),
            Err(Error::EmptyIconSet)
        ));
    }

    #[test]
    fn test_files() {
        let output = convert_font(&[square("a")], &Context::default()).unwrap();
        let names: Vec<String> = output
            .files("iconfont")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            ["iconfont.ttf", "iconfont.woff", "iconfont.woff2", "iconfont.css"]
        );
    }

    #[test]
    fn test_convert_components() {
        let icons = vec![square("arrow-up"), square("arrow-down")];
        let components = convert_components(&icons, &ComponentContext::default()).unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "arrow-up");
        assert!(components[0].source_text.contains("defineOptions({ name: 'ArrowUp' })"));
        assert!(components[1].source_text.contains("fill=\"currentColor\""));
    }
}
