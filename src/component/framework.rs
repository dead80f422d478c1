//! The built-in component templates.

use super::jsx;
use crate::svg::NormalizeError;
use std::fmt;

/// A UI framework with a built-in component template.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Framework {
    /// Vue 3 single-file components with `<script setup>`.
    #[default]
    Vue3,
    /// Vue 2 single-file components.
    Vue2,
    /// React function components in TypeScript.
    React,
}

impl Framework {
    /// All supported frameworks.
    pub const ALL: [Framework; 3] = [Framework::Vue3, Framework::Vue2, Framework::React];

    /// Returns the framework of a configuration value, or `None` if it is not supported.
    pub fn from_name(name: &str) -> Option<Framework> {
        Framework::ALL
            .iter()
            .copied()
            .find(|framework| framework.name() == name)
    }

    /// The configuration value naming the framework.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vue3 => "vue3",
            Self::Vue2 => "vue2",
            Self::React => "react",
        }
    }

    /// The file extension of component sources.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Vue3 | Self::Vue2 => "vue",
            Self::React => "tsx",
        }
    }

    /// Renders the component of an icon.
    ///
    /// The root `svg` element forwards the attributes the component receives.
    pub fn render(&self, name: &str, svg: &str) -> Result<String, NormalizeError> {
        let component = pascal_case(name);

        Ok(match self {
            Self::Vue3 => format!(
                "<template>\n  {}\n</template>\n\n<script setup lang=\"ts\">\ndefineOptions({{ name: '{}' }})\n</script>\n",
                forward_attributes(svg, " v-bind=\"$attrs\""),
                component
            ),
            Self::Vue2 => format!(
                "<template>\n  {}\n</template>\n\n<script>\nexport default {{\n  name: '{}',\n}}\n</script>\n",
                forward_attributes(svg, " v-bind=\"$attrs\" v-on=\"$listeners\""),
                component
            ),
            Self::React => format!(
                "import type {{ SVGProps }} from 'react'\n\nexport default function {}(props: SVGProps<SVGSVGElement>) {{\n  return (\n    {}\n  )\n}}\n",
                component,
                jsx::to_jsx(svg, " {...props}")?
            ),
        })
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inserts attributes into the opening tag of the root `svg` element.
fn forward_attributes(svg: &str, attributes: &str) -> String {
    match svg.strip_prefix("<svg") {
        Some(rest) => format!("<svg{}{}", attributes, rest),
        None => {
            log::warn!("markup does not start with <svg>; attributes are not forwarded");
            svg.to_string()
        }
    }
}

/// Returns the PascalCase component name of an icon.
///
/// Every run of characters other than ASCII letters and digits separates words.
/// Names starting with a digit are prefixed with `Icon`, as are names without any letter or digit.
///
/// ```
/// # use glyphset::component::framework::pascal_case;
/// assert_eq!(pascal_case("arrow-left"), "ArrowLeft");
/// assert_eq!(pascal_case("user.circle_filled"), "UserCircleFilled");
/// assert_eq!(pascal_case("4k"), "Icon4k");
/// assert_eq!(pascal_case("--"), "Icon");
/// ```
pub fn pascal_case(name: &str) -> String {
    let mut out: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Icon");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24v24z"/></svg>"#;

    #[test]
    fn test_from_name() {
        for framework in Framework::ALL {
            assert_eq!(Framework::from_name(framework.name()), Some(framework));
        }
        assert_eq!(Framework::from_name("svelte"), None);
        assert_eq!(Framework::from_name("Vue3"), None);
    }

    #[test]
    fn test_render_vue3() {
        let source = Framework::Vue3.render("arrow-left", SVG).unwrap();
        assert_eq!(
            source,
            r#"<template>
  <svg v-bind="$attrs" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24v24z"/></svg>
</template>

<script setup lang="ts">
defineOptions({ name: 'ArrowLeft' })
</script>
"#
        );
    }

    #[test]
    fn test_render_vue2() {
        let source = Framework::Vue2.render("home", SVG).unwrap();
        assert!(source.contains(r#"<svg v-bind="$attrs" v-on="$listeners" xmlns="#));
        assert!(source.contains("export default {\n  name: 'Home',\n}"));
    }

    #[test]
    fn test_render_react() {
        let source = Framework::React.render("home", SVG).unwrap();
        assert!(source.starts_with("import type { SVGProps } from 'react'\n"));
        assert!(source.contains("export default function Home(props: SVGProps<SVGSVGElement>) {"));
        assert!(source.contains(r#"viewBox="0 0 24 24" {...props}><path d="M0 0h24v24z" /></svg>"#));
    }
}
