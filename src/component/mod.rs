//! Generation of UI framework components.
//!
//! Each normalized icon is wrapped in the source of a component that renders it inline.
//! The content of a component is produced by the first available of:
//!
//! 1. a custom render function set with [`ComponentContext::with_renderer`],
//! 2. a template given by the `template` option, in which `$name` is replaced by the icon name and `$svgString` by its markup,
//! 3. the built-in template of the configured [`Framework`].
//!
//! The renderer is selected once when the context is created.
//!
//! # Example
//!
//! ```
//! # use glyphset::component::{emit_components, ComponentContext};
//! # use glyphset::ctx::Options;
//! # use glyphset::data::IconSource;
//! let options = Options {
//!     template: Some("<i title=\"$name\">$svgString</i>".to_string()),
//!     ..Options::default()
//! };
//! let ctx = ComponentContext::from_options(&options).unwrap();
//! let icons = vec![IconSource::new("dot", "<svg/>")];
//! let components = emit_components(&icons, &ctx).unwrap();
//! assert_eq!(components[0].source_text, "<i title=\"dot\"><svg/></i>");
//! ```

pub mod framework;
pub mod jsx;

pub use framework::Framework;

use crate::ctx::{MalformedPolicy, Options};
use crate::data::{ComponentArtifact, IconSource};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// A function rendering the component source of an icon from its name and normalized markup.
pub type RenderFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// The strategy producing component sources.
#[derive(Clone)]
pub enum Renderer {
    /// A caller-supplied function.
    Custom(Arc<RenderFn>),
    /// A template with `$name` and `$svgString` placeholders.
    Template(String),
    /// The built-in template of a framework.
    Builtin(Framework),
}

impl Renderer {
    /// Renders the component source of an icon.
    ///
    /// # Errors
    ///
    /// Fails if a built-in template can not convert the markup.
    pub fn render(&self, name: &str, svg: &str) -> Result<String> {
        match self {
            Renderer::Custom(render) => Ok(render(name, svg)),
            Renderer::Template(template) => Ok(template
                .replace("$name", name)
                .replace("$svgString", svg)),
            Renderer::Builtin(framework) => {
                framework
                    .render(name, svg)
                    .map_err(|source| Error::MalformedVectorInput {
                        name: name.to_string(),
                        source,
                    })
            }
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Custom(_) => f.write_str("Custom(..)"),
            Renderer::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Renderer::Builtin(framework) => f.debug_tuple("Builtin").field(framework).finish(),
        }
    }
}

/// The context with which components are generated.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    /// Whether literal colors are replaced by `currentColor`.
    pub clear_color: bool,
    /// The configured framework.
    pub framework: Framework,
    /// The selected renderer.
    pub renderer: Renderer,
    /// The file extension override.
    pub extname: Option<String>,
    /// The treatment of icons whose markup can not be parsed.
    pub on_malformed: MalformedPolicy,
}

impl ComponentContext {
    /// Creates a component context from resolved options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFramework`] if `framework` names a framework without a built-in template, even if a template is configured.
    pub fn from_options(options: &Options) -> Result<ComponentContext> {
        let framework = match &options.framework {
            Some(name) => Framework::from_name(name)
                .ok_or_else(|| Error::UnsupportedFramework(name.clone()))?,
            None => Framework::default(),
        };

        let renderer = match &options.template {
            Some(template) => Renderer::Template(template.clone()),
            None => Renderer::Builtin(framework),
        };

        let ctx = ComponentContext {
            clear_color: options.clear_color.unwrap_or(true),
            framework,
            renderer,
            extname: options.extname.clone(),
            on_malformed: options.on_malformed.unwrap_or_default(),
        };

        log::debug!("resolved component context: {:?}", ctx);

        Ok(ctx)
    }

    /// Replaces the renderer with a custom render function.
    pub fn with_renderer<F>(mut self, render: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.renderer = Renderer::Custom(Arc::new(render));
        self
    }

    /// Returns the file extension of component sources, without a leading period.
    ///
    /// An `extname` override wins over the extension of the framework.
    pub fn extname(&self) -> &str {
        match &self.extname {
            Some(extname) => extname.trim_start_matches('.'),
            None => self.framework.extension(),
        }
    }
}

impl Default for ComponentContext {
    fn default() -> Self {
        ComponentContext {
            clear_color: true,
            framework: Framework::default(),
            renderer: Renderer::Builtin(Framework::default()),
            extname: None,
            on_malformed: MalformedPolicy::default(),
        }
    }
}

/// Renders a component for each normalized icon, in input order.
///
/// # Errors
///
/// Fails with [`Error::MalformedVectorInput`] if a built-in template can not convert the markup of an icon.
pub fn emit_components(icons: &[IconSource], ctx: &ComponentContext) -> Result<Vec<ComponentArtifact>> {
    let components = icons
        .par_iter()
        .map(|icon| -> Result<ComponentArtifact> {
            log::trace!("rendering component for '{}'", icon.name);
            Ok(ComponentArtifact {
                name: icon.name.clone(),
                source_text: ctx.renderer.render(&icon.name, &icon.content)?,
            })
        })
        .collect::<Result<Vec<ComponentArtifact>>>()?;

    log::info!(
        "rendered {} components with {:?}",
        components.len(),
        ctx.renderer
    );

    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_options_defaults() {
        let ctx = ComponentContext::from_options(&Options::default()).unwrap();
        assert_eq!(ctx.framework, Framework::Vue3);
        assert!(matches!(ctx.renderer, Renderer::Builtin(Framework::Vue3)));
        assert_eq!(ctx.extname(), "vue");
        assert!(ctx.clear_color);
    }

    #[test]
    fn test_from_options_rejects_framework() {
        let options = Options {
            framework: Some("svelte".to_string()),
            template: Some("$svgString".to_string()),
            ..Options::default()
        };
        assert!(matches!(
            ComponentContext::from_options(&options),
            Err(Error::UnsupportedFramework(name)) if name == "svelte"
        ));
    }

    #[test]
    fn test_extname() {
        let options = Options {
            framework: Some("react".to_string()),
            ..Options::default()
        };
        let ctx = ComponentContext::from_options(&options).unwrap();
        assert_eq!(ctx.extname(), "tsx");

        let ctx = ComponentContext {
            extname: Some(".jsx".to_string()),
            ..ctx
        };
        assert_eq!(ctx.extname(), "jsx");
    }

    #[test]
    fn test_renderer_priority() {
        let options = Options {
            framework: Some("react".to_string()),
            template: Some("$name: $svgString".to_string()),
            ..Options::default()
        };
        let ctx = ComponentContext::from_options(&options).unwrap();
        assert_eq!(ctx.renderer.render("a", "<svg/>").unwrap(), "a: <svg/>");

        let ctx = ctx.with_renderer(|name, svg| format!("{}={}", name.to_uppercase(), svg.len()));
        assert_eq!(ctx.renderer.render("a", "<svg/>").unwrap(), "A=6");
        assert_eq!(format!("{:?}", ctx.renderer), "Custom(..)");
    }

    #[test]
    fn test_emit_components_keeps_order() {
        let icons: Vec<IconSource> = (0..50)
            .map(|i| IconSource::new(format!("icon-{}", i), "<svg/>"))
            .collect();
        let ctx = ComponentContext::default().with_renderer(|name, _| name.to_string());
        let components = emit_components(&icons, &ctx).unwrap();
        let names: Vec<&str> = components.iter().map(|c| c.source_text.as_str()).collect();
        let expected: Vec<String> = (0..50).map(|i| format!("icon-{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_emit_components_rejects_malformed_jsx() {
        let options = Options {
            framework: Some("react".to_string()),
            ..Options::default()
        };
        let ctx = ComponentContext::from_options(&options).unwrap();
        let icons = vec![IconSource::new("broken", "<svg>")];
        assert!(matches!(
            emit_components(&icons, &ctx),
            Err(Error::MalformedVectorInput { name, .. }) if name == "broken"
        ));
    }
}
