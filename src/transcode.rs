//! Transcoding of the canonical TrueType font into the requested container formats.
//!
//! Every container is derived from the same canonical font, so all of them decode to identical table data.
//! The compression effort of the containers follows the [`Optimization`](crate::ctx::Optimization) of the context.

use crate::ctx::{Context, Format};
use crate::data::FontArtifact;
use crate::error::{Error, Result};
use crate::{sfnt, woff, woff2};
use bytes::Bytes;

/// Produces the fonts of all requested formats from a TrueType font.
///
/// Formats that were not requested are `None` in the result.
///
/// # Errors
///
/// Returns [`Error::Transcode`] if `canonical` is not a well-formed TrueType font.
pub fn transcode(canonical: &[u8], ctx: &Context) -> Result<FontArtifact> {
    let ttf = sfnt::normalize(canonical).map_err(|source| Error::Transcode {
        format: Format::Ttf,
        source,
    })?;

    let encode = |format: Format| -> Result<Option<Bytes>> {
        if !ctx.wants(format) {
            return Ok(None);
        }

        let optimization = ctx.optimization;
        let encoded = match format {
            Format::Ttf => Ok(ttf.clone()),
            Format::Woff => woff::encode(&ttf, optimization.deflate_level()),
            Format::Woff2 => woff2::encode(
                &ttf,
                optimization.brotli_quality(),
                optimization.brotli_window(),
            ),
        };

        encoded
            .map(Some)
            .map_err(|source| Error::Transcode { format, source })
    };

    let artifact = FontArtifact {
        ttf: encode(Format::Ttf)?,
        woff: encode(Format::Woff)?,
        woff2: encode(Format::Woff2)?,
    };

    for format in Format::ALL {
        if let Some(data) = artifact.get(format) {
            log::info!("{}.{}: {} bytes", ctx.name, format.extension(), data.len());
        }
    }

    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Optimization;
    use crate::glyph::{Glyph, GlyphTable, Point};
    use std::collections::BTreeSet;

    fn font(ctx: &Context) -> Bytes {
        let contour = vec![
            Point { x: 100, y: 0, on_curve: true },
            Point { x: 500, y: 800, on_curve: false },
            Point { x: 900, y: 0, on_curve: true },
        ];
        let table = GlyphTable::new(vec![Glyph {
            name: "peak".to_string(),
            code_point: '\u{E600}',
            contours: vec![contour],
            advance_width: 1000,
        }]);
        sfnt::compile_ttf(&table, ctx)
    }

    #[test]
    fn test_transcode_all_formats() {
        let ctx = Context::default();
        let canonical = font(&ctx);
        let artifact = transcode(&canonical, &ctx).unwrap();

        let ttf = artifact.ttf.clone().unwrap();
        assert_eq!(ttf, canonical);
        assert_eq!(woff::decode(&artifact.woff.unwrap()).unwrap(), ttf);
        assert_eq!(woff2::decode(&artifact.woff2.unwrap()).unwrap(), ttf);
    }

    #[test]
    fn test_transcode_requested_formats() {
        let ctx = Context {
            formats: BTreeSet::from([Format::Woff2]),
            optimization: Optimization::O0,
            ..Context::default()
        };
        let artifact = transcode(&font(&ctx), &ctx).unwrap();
        assert!(artifact.ttf.is_none());
        assert!(artifact.woff.is_none());
        assert!(artifact.woff2.is_some());
    }

    #[test]
    fn test_transcode_rejects_other_data() {
        assert!(matches!(
            transcode(b"not a font", &Context::default()),
            Err(Error::Transcode {
                format: Format::Ttf,
                ..
            })
        ));
    }
}
