use crate::models::Notebook;
use chrono::Local;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug)]
pub enum RenderError {
    Read(String),
    Syntax(String),
    Execute(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Read(e) => write!(f, "Failed to read template: {}", e),
            RenderError::Syntax(e) => write!(f, "Invalid template: {}", e),
            RenderError::Execute(e) => write!(f, "Failed to render template: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

#[derive(Serialize)]
struct RenderContext<'a> {
    #[serde(flatten)]
    notebook: &'a Notebook,
    generated: String,
}

/// An output template. Values are HTML-escaped whatever the file extension.
pub struct Template {
    env: Environment<'static>,
    name: String,
}

impl Template {
    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| RenderError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_source(&path.display().to_string(), &source)
    }

    pub fn from_source(name: &str, source: &str) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| RenderError::Syntax(e.to_string()))?;

        Ok(Template {
            env,
            name: name.to_string(),
        })
    }

    pub fn render_to<W: Write>(&self, notebook: &Notebook, out: W) -> Result<(), RenderError> {
        let ctx = RenderContext {
            notebook,
            generated: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        };
        let tpl = self
            .env
            .get_template(&self.name)
            .map_err(|e| RenderError::Execute(e.to_string()))?;
        tpl.render_to_write(ctx, out)
            .map_err(|e| RenderError::Execute(e.to_string()))?;
        Ok(())
    }

    pub fn render(&self, notebook: &Notebook) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.render_to(notebook, &mut buf)?;
        String::from_utf8(buf).map_err(|e| RenderError::Execute(e.to_string()))
    }
}
