//! Conversion of SVG markup to JSX.
//!
//! JSX spells SVG attributes in camelCase (`fill-rule` becomes `fillRule`, `xlink:href` becomes `xlinkHref`), names the `class` attribute `className`, and expects `style` as an object.
//! Attributes with the `data-` or `aria-` prefix keep their spelling.

use crate::svg::{NormalizeError, SVG_NS, XLINK_NS};
use roxmltree::{Document, Node};
use std::fmt::Write;

/// The XML namespace, bound to the `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Returns the camelCase JSX name of an SVG attribute.
///
/// ```
/// # use glyphset::component::jsx::attribute_name;
/// assert_eq!(attribute_name("fill-rule"), "fillRule");
/// assert_eq!(attribute_name("xlink:href"), "xlinkHref");
/// assert_eq!(attribute_name("class"), "className");
/// assert_eq!(attribute_name("aria-hidden"), "aria-hidden");
/// assert_eq!(attribute_name("viewBox"), "viewBox");
/// ```
pub fn attribute_name(name: &str) -> String {
    match name {
        "class" => return "className".to_string(),
        "for" => return "htmlFor".to_string(),
        _ => {}
    }

    if name.starts_with("data-") || name.starts_with("aria-") {
        return name.to_string();
    }

    camel_case(name, &['-', ':'])
}

fn camel_case(name: &str, separators: &[char]) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;

    for c in name.chars() {
        if separators.contains(&c) {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }

    out
}

/// Converts SVG markup to a JSX element.
///
/// `root_attributes` is inserted verbatim into the opening tag of the root element, after its own attributes.
///
/// # Errors
///
/// Fails if the markup is not well-formed XML.
pub fn to_jsx(markup: &str, root_attributes: &str) -> Result<String, NormalizeError> {
    let document = Document::parse(markup)?;
    let root = document.root_element();
    let mut out = String::with_capacity(markup.len() + root_attributes.len());

    let uses_xlink = root
        .descendants()
        .any(|node| node.attributes().any(|a| a.namespace() == Some(XLINK_NS)));

    let mut namespaces = vec![("xmlns", SVG_NS)];
    if uses_xlink {
        namespaces.push(("xmlnsXlink", XLINK_NS));
    }

    write_element(&mut out, root, &namespaces, root_attributes);

    Ok(out)
}

fn write_element(out: &mut String, node: Node, namespaces: &[(&str, &str)], extra: &str) {
    let name = node.tag_name().name();
    let _ = write!(out, "<{}", name);

    for (key, value) in namespaces {
        let _ = write!(out, " {}=\"{}\"", key, value);
    }

    for attribute in node.attributes() {
        let qualified = match attribute.namespace() {
            Some(XLINK_NS) => format!("xlink:{}", attribute.name()),
            Some(XML_NS) => format!("xml:{}", attribute.name()),
            Some(_) => continue,
            None => attribute.name().to_string(),
        };

        if qualified == "style" {
            let _ = write!(out, " style={{{}}}", style_object(attribute.value()));
        } else {
            let _ = write!(
                out,
                " {}=\"{}\"",
                attribute_name(&qualified),
                escape(attribute.value(), true)
            );
        }
    }

    out.push_str(extra);

    let children: Vec<Node> = node
        .children()
        .filter(|child| child.is_element() || child.is_text())
        .collect();

    if children.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');

    for child in children {
        if child.is_element() {
            write_element(out, child, &[], "");
        } else {
            out.push_str(&escape(child.text().unwrap_or_default(), false));
        }
    }

    let _ = write!(out, "</{}>", name);
}

/// Returns the object literal of an inline style declaration.
fn style_object(style: &str) -> String {
    let properties: Vec<String> = style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(property, value)| {
            let property = camel_case(property.trim(), &['-']);
            // `serde_json` quotes and escapes both halves as JavaScript string literals
            format!(
                "{}: {}",
                serde_json::Value::String(property),
                serde_json::Value::String(value.trim().to_string())
            )
        })
        .collect();

    format!("{{ {} }}", properties.join(", "))
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '{' if !attribute => out.push_str("&#123;"),
            '}' if !attribute => out.push_str("&#125;"),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_jsx() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path fill-rule="evenodd" stroke-width="2" class="a" d="M0 0h24v24z"/></svg>"##;
        assert_eq!(
            to_jsx(svg, " {...props}").unwrap(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" {...props}><path fillRule="evenodd" strokeWidth="2" className="a" d="M0 0h24v24z" /></svg>"#
        );
    }

    #[test]
    fn test_to_jsx_xlink() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 4 4"><use xlink:href="#p"/></svg>"##;
        let jsx = to_jsx(svg, "").unwrap();
        assert!(jsx.contains(r#"xmlnsXlink="http://www.w3.org/1999/xlink""#));
        assert!(jsx.contains(r##"<use xlinkHref="#p" />"##));
    }

    #[test]
    fn test_to_jsx_style() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect style="fill: red; stroke-width:2;"/></svg>"#;
        let jsx = to_jsx(svg, "").unwrap();
        assert!(jsx.contains(r#"<rect style={{ "fill": "red", "strokeWidth": "2" }} />"#));
    }

    #[test]
    fn test_to_jsx_text() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text>{a} &amp; b</text></svg>"#;
        let jsx = to_jsx(svg, "").unwrap();
        assert!(jsx.contains("<text>&#123;a&#125; &amp; b</text>"));
    }
}
