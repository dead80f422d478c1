//! Allocation of code points.
//!
//! Icons are assigned consecutive code points in input order, starting at the configured code starter.
//! The allocation depends on nothing but the order of the icons: the same ordered input always yields the same code points.

use crate::data::{IconRecord, IconSource};
use crate::error::{Error, Result};

/// Assigns each icon a code point.
///
/// The `i`-th icon receives `code_starter + i`.
///
/// # Errors
///
/// - [`Error::EmptyIconSet`] if there are no icons.
/// - [`Error::InvalidCodePoint`] if a code point is not a Unicode scalar value, for example because the range reaches into the surrogates.
///
/// # Example
///
/// ```
/// # use glyphset::codepoint::allocate;
/// # use glyphset::data::IconSource;
/// let icons = vec![IconSource::new("home", "<svg/>"), IconSource::new("search", "<svg/>")];
/// let records = allocate(icons, 0xE600).unwrap();
/// assert_eq!(records[0].code_point, '\u{E600}');
/// assert_eq!(records[1].code_point, '\u{E601}');
/// ```
pub fn allocate<I>(icons: I, code_starter: u32) -> Result<Vec<IconRecord>>
where
    I: IntoIterator<Item = IconSource>,
{
    let records = icons
        .into_iter()
        .enumerate()
        .map(|(index, icon)| {
            let value = u32::try_from(index)
                .ok()
                .and_then(|offset| code_starter.checked_add(offset))
                .unwrap_or(u32::MAX);
            let code_point = char::from_u32(value).ok_or_else(|| Error::InvalidCodePoint {
                name: icon.name.clone(),
                value,
            })?;

            log::trace!("'{}' → U+{:04X}", icon.name, value);

            Ok(IconRecord {
                name: icon.name,
                content: icon.content,
                code_point,
            })
        })
        .collect::<Result<Vec<IconRecord>>>()?;

    if records.is_empty() {
        return Err(Error::EmptyIconSet);
    }

    log::info!(
        "allocated {} code points from U+{:04X}",
        records.len(),
        code_starter
    );

    Ok(records)
}
