//! Template rendering
//!
//! A thin wrapper around a tera instance built once at startup from the
//! configured template directory.

use anyhow::{Context as AnyhowContext, Result};
use axum::response::Html;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::models::{PagedResult, User};
use crate::web::error::PageError;

/// Shared tera instance
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    /// Load every `*.html` below the given directory
    pub fn load(dir: &Path) -> Result<Self> {
        let glob = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&glob)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
        tracing::debug!(
            "Loaded {} template(s) from {}",
            tera.get_template_names().count(),
            dir.display()
        );
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template to an HTML response
    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, PageError> {
        let html = self
            .tera
            .render(name, context)
            .map_err(|e| anyhow::anyhow!("Failed to render '{}': {}", name, e))?;
        Ok(Html(html))
    }
}

/// Context seeded with the data every page needs
pub fn base_context(viewer: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("viewer", &viewer);
    context
}

/// Insert the pagination block used by the listing templates
pub fn insert_pagination<T: Serialize>(context: &mut Context, result: &PagedResult<T>) {
    context.insert("page", &result.page);
    context.insert("total_pages", &result.total_pages());
    context.insert("has_next", &result.has_next());
    context.insert("has_prev", &result.has_prev());
    context.insert("prev_page", &result.page.saturating_sub(1).max(1));
    context.insert("next_page", &(result.page + 1));
}
