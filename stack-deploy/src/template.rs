//! Stack file templating.
//!
//! Uses minijinja with its default `{{ ... }}` syntax and strict undefined
//! handling, so a variable missing from the supplied set fails the render
//! instead of silently producing an empty string.

use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value};

/// Renders stack files against a set of template variables.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Compose files are whitespace sensitive
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Render `source` with `variables` as the template context.
    pub fn render(
        &self,
        source: &str,
        variables: &Map<String, Value>,
    ) -> Result<String, minijinja::Error> {
        self.env.render_str(source, variables)
    }
}
