//! Normalization of SVG icons.
//!
//! [`normalize`] turns arbitrary SVG markup into a compact canonical form:
//!
//! - Comments, processing instructions, editor metadata (`metadata`, `title`, `desc`, and elements or attributes of foreign namespaces such as Inkscape's) are removed.
//! - Groups without attributes are collapsed into their parent; empty groups and `defs` are removed.
//! - Whitespace in attribute values is collapsed and whitespace-only text outside of text content elements is dropped.
//! - The `viewBox` attribute is kept. If it is missing, it is derived from numeric `width` and `height` attributes.
//! - With `clear_color` set, literal colors of presentation attributes and `<style>` sheets are replaced by `currentColor` (see [`color`]).
//!
//! The output is a fixpoint: normalizing normalized markup with the same flag returns it unchanged.

pub mod color;

use itertools::Itertools;
use roxmltree::{Document, Node};
use std::fmt::Write;
use thiserror::Error;

/// The SVG namespace.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace, still used by `xlink:href` in older icons.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Elements that never contribute to rendering.
const NON_RENDERING_ELEMENTS: [&str; 4] = ["metadata", "title", "desc", "script"];
/// Attributes that never contribute to rendering.
const NON_RENDERING_ATTRIBUTES: [&str; 4] = ["version", "baseProfile", "enable-background", "data-name"];
/// Elements whose text content is significant.
const TEXT_CONTENT_ELEMENTS: [&str; 4] = ["text", "tspan", "textPath", "style"];
/// Elements removed when they have no children.
const CONTAINER_ELEMENTS: [&str; 2] = ["g", "defs"];

/// An error raised for markup that is not a usable SVG document.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The markup is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The root element is not an `svg` element.
    #[error("the root element is <{0}>, not <svg>")]
    NotSvg(String),
}

/// Returns the normalized form of an SVG document.
///
/// # Errors
///
/// Fails with [`NormalizeError`] if the markup is not well-formed XML or its root element is not `svg`.
///
/// # Example
///
/// ```
/// # use glyphset::svg::normalize;
/// let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
///   <title>Home</title>
///   <g><path fill="#333" d="M2 2 L22 2 L12 20 Z"/></g>
/// </svg>"##;
/// assert_eq!(
///     normalize(svg, true).unwrap(),
///     r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path fill="currentColor" d="M2 2 L22 2 L12 20 Z"/></svg>"#,
/// );
/// ```
pub fn normalize(markup: &str, clear_color: bool) -> Result<String, NormalizeError> {
    let document = Document::parse(markup)?;
    let root = document.root_element();

    if root.tag_name().name() != "svg" || !is_svg_namespace(root.tag_name().namespace()) {
        return Err(NormalizeError::NotSvg(root.tag_name().name().to_string()));
    }

    let mut element = match Element::from_node(root, clear_color) {
        Some(element) => element,
        None => return Err(NormalizeError::NotSvg(root.tag_name().name().to_string())),
    };

    if element.attribute("viewBox").is_none() {
        if let Some(view_box) = derive_view_box(&element) {
            log::debug!("derived viewBox \"{}\" from width and height", view_box);
            element.attributes.push(("viewBox".to_string(), view_box));
        }
    }

    let uses_xlink = element.any_attribute(|name| name.starts_with("xlink:"));
    let mut out = String::with_capacity(markup.len());
    element.write_root(&mut out, uses_xlink);

    Ok(out)
}

fn is_svg_namespace(namespace: Option<&str>) -> bool {
    namespace.map_or(true, |ns| ns == SVG_NS)
}

/// Returns `0 0 {width} {height}` if both dimensions are plain numbers, optionally in pixels.
fn derive_view_box(element: &Element) -> Option<String> {
    let dimension = |name: &str| -> Option<f64> {
        let value = element.attribute(name)?;
        let number = value.strip_suffix("px").unwrap_or(value).trim();
        number.parse::<f64>().ok().filter(|x| x.is_finite() && *x > 0.0)
    };
    let width = dimension("width")?;
    let height = dimension("height")?;

    Some(format!("0 0 {} {}", width, height))
}

/// A simplified element tree.
#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

#[derive(Debug)]
enum Child {
    Element(Element),
    Text(String),
}

impl Element {
    /// Converts a node and its descendants; returns `None` if the node does not contribute to rendering.
    fn from_node(node: Node, clear_color: bool) -> Option<Element> {
        let name = node.tag_name().name();

        if !is_svg_namespace(node.tag_name().namespace()) || NON_RENDERING_ELEMENTS.contains(&name) {
            log::trace!("dropping element <{}>", name);
            return None;
        }

        let attributes = node
            .attributes()
            .filter_map(|attribute| {
                let qualified = match attribute.namespace() {
                    None => attribute.name().to_string(),
                    Some(XLINK_NS) => format!("xlink:{}", attribute.name()),
                    Some(_) => return None,
                };

                if NON_RENDERING_ATTRIBUTES.contains(&qualified.as_str()) {
                    return None;
                }

                let mut value = attribute.value().split_whitespace().join(" ");

                if clear_color && color::is_color_attribute(&qualified) {
                    value = color::clear(&value);
                }

                Some((qualified, value))
            })
            .collect();

        let keeps_text = TEXT_CONTENT_ELEMENTS.contains(&name);
        // style sheets declare colors in their text
        let clears_text = clear_color && name == "style";
        let mut children = Vec::new();

        for child in node.children() {
            if child.is_element() {
                if let Some(element) = Element::from_node(child, clear_color) {
                    if element.is_collapsible_group() {
                        children.extend(element.children);
                    } else if !element.is_empty_container() {
                        children.push(Child::Element(element));
                    }
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if clears_text {
                    children.push(Child::Text(color::clear(text)));
                } else if keeps_text || !text.trim().is_empty() {
                    children.push(Child::Text(text.to_string()));
                }
            }
        }

        Some(Element {
            name: name.to_string(),
            attributes,
            children,
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn any_attribute<F>(&self, predicate: F) -> bool
    where
        F: Fn(&str) -> bool + Copy,
    {
        self.attributes.iter().any(|(key, _)| predicate(key))
            || self.children.iter().any(|child| match child {
                Child::Element(element) => element.any_attribute(predicate),
                Child::Text(_) => false,
            })
    }

    fn is_collapsible_group(&self) -> bool {
        self.name == "g" && self.attributes.is_empty()
    }

    fn is_empty_container(&self) -> bool {
        CONTAINER_ELEMENTS.contains(&self.name.as_str()) && self.children.is_empty()
    }

    fn write_root(&self, out: &mut String, uses_xlink: bool) {
        let mut namespaces = vec![("xmlns".to_string(), SVG_NS.to_string())];
        if uses_xlink {
            namespaces.push(("xmlns:xlink".to_string(), XLINK_NS.to_string()));
        }
        self.write(out, &namespaces);
    }

    fn write(&self, out: &mut String, extra: &[(String, String)]) {
        out.push('<');
        out.push_str(&self.name);

        for (key, value) in extra.iter().chain(self.attributes.iter()) {
            // writing to a `String` does not fail
            let _ = write!(out, " {}=\"{}\"", key, escape(value, true));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');

        for child in &self.children {
            match child {
                Child::Element(element) => element.write(out, &[]),
                Child::Text(text) => out.push_str(&escape(text, false)),
            }
        }

        let _ = write!(out, "</{}>", self.name);
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: Sketch -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
     version="1.1" width="24" height="24" viewBox="0 0 24 24" sodipodi:docname="home.svg">
  <metadata>generated</metadata>
  <desc>A house</desc>
  <sodipodi:namedview pagecolor="#ffffff"/>
  <defs></defs>
  <g>
    <g fill="#FF0000" stroke="rgb(0, 0, 0)">
      <path d="M 2 2
               L 22 2 L 12 20 Z"/>
    </g>
  </g>
</svg>"##;

    #[test]
    fn test_normalize_strips_metadata() {
        let out = normalize(ICON, false).unwrap();
        assert_eq!(
            out,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24"><g fill="#FF0000" stroke="rgb(0, 0, 0)"><path d="M 2 2 L 22 2 L 12 20 Z"/></g></svg>"##
        );
    }

    #[test]
    fn test_normalize_clears_color() {
        let out = normalize(ICON, true).unwrap();
        assert!(out.contains(r#"<g fill="currentColor" stroke="currentColor">"#));
        assert!(!out.contains("#FF0000"));
    }

    #[test]
    fn test_normalize_clears_style_sheet_colors() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><style>.a{fill:#ff0000}.b{stroke:rgb(0,0,255);fill:url(#g)}</style><rect class="a" width="10" height="10"/></svg>"##;

        let out = normalize(svg, true).unwrap();
        assert!(out.contains("<style>.a{fill:currentColor}.b{stroke:currentColor;fill:url(#g)}</style>"));
        assert_eq!(normalize(&out, true).unwrap(), out);

        let kept = normalize(svg, false).unwrap();
        assert!(kept.contains(".a{fill:#ff0000}"));
    }

    #[test]
    fn test_normalize_preserves_color_without_clear() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect fill="#ff0000" width="10" height="10"/></svg>"##;
        let out = normalize(svg, false).unwrap();
        assert!(out.contains(r##"fill="#ff0000""##));
        assert_eq!(out, svg);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for &clear in &[true, false] {
            let once = normalize(ICON, clear).unwrap();
            let twice = normalize(&once, clear).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_derives_view_box() {
        let svg = r#"<svg width="32px" height="16"><path d="M0 0h32v16z"/></svg>"#;
        let out = normalize(svg, true).unwrap();
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="32px" height="16" viewBox="0 0 32 16"><path d="M0 0h32v16z"/></svg>"#
        );
    }

    #[test]
    fn test_normalize_keeps_xlink() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 4 4"><defs><path id="p" d="M0 0h4v4z"/></defs><use xlink:href="#p"/></svg>"##;
        let out = normalize(svg, true).unwrap();
        assert_eq!(
            out,
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 4 4"><defs><path id="p" d="M0 0h4v4z"/></defs><use xlink:href="#p"/></svg>"##
        );
    }

    #[test]
    fn test_normalize_keeps_text_content() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 4"><text x="0" y="4"> A &amp; B </text></svg>"#;
        let out = normalize(svg, true).unwrap();
        assert!(out.contains("<text x=\"0\" y=\"4\"> A &amp; B </text>"));
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(matches!(
            normalize("<svg><path></svg>", true),
            Err(NormalizeError::Xml(_))
        ));
        assert!(matches!(normalize("not markup", true), Err(NormalizeError::Xml(_))));
        assert!(matches!(
            normalize("<html/>", true),
            Err(NormalizeError::NotSvg(name)) if name == "html"
        ));
    }
}
