//! Theme engine
//!
//! Pages are rendered with Tera. The built-in templates are embedded in the
//! binary; a theme directory on disk (`<themes_path>/<name>/`) may override
//! any of them by file name, e.g. `themes/dark/base.html`.

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::models::User;

mod error;

pub use error::ThemeError;

/// Name of the built-in theme
pub const DEFAULT_THEME: &str = "default";

/// Built-in templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct BuiltinTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    tera: Tera,
    themes_path: PathBuf,
    current_theme: String,
}

impl ThemeEngine {
    /// Create a theme engine using the built-in templates overridden by
    /// `themes_path/<theme>`.
    ///
    /// A missing theme directory falls back to the built-in theme with a
    /// warning; a template that fails to parse is an error.
    pub fn new(themes_path: &Path, theme: &str) -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            themes_path: themes_path.to_path_buf(),
            current_theme: DEFAULT_THEME.to_string(),
        };

        if theme != DEFAULT_THEME {
            if let Err(e) = engine.set_theme(theme) {
                tracing::warn!("Theme '{}' unavailable ({}), using built-in theme", theme, e);
            }
        }
        if engine.current_theme == DEFAULT_THEME {
            engine.reload_templates()?;
        }

        Ok(engine)
    }

    /// Engine with only the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            themes_path: PathBuf::new(),
            current_theme: DEFAULT_THEME.to_string(),
        };
        engine.reload_templates()?;
        Ok(engine)
    }

    /// Switch to another theme directory and reload templates.
    ///
    /// On error the current templates stay in place.
    pub fn set_theme(&mut self, theme: &str) -> Result<()> {
        if theme != DEFAULT_THEME && !self.theme_path(theme).is_dir() {
            return Err(ThemeError::NotFound(theme.to_string()).into());
        }

        let previous = std::mem::replace(&mut self.current_theme, theme.to_string());
        if let Err(e) = self.reload_templates() {
            self.current_theme = previous;
            return Err(e);
        }

        tracing::info!("Theme '{}' loaded", theme);
        Ok(())
    }

    /// Rebuild the template set from the built-ins plus the current theme's overrides
    pub fn reload_templates(&mut self) -> Result<()> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in BuiltinTemplates::iter() {
            let file = BuiltinTemplates::get(&name)
                .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
            let content = String::from_utf8(file.data.into_owned())
                .with_context(|| format!("Template {} is not UTF-8", name))?;
            templates.insert(name.to_string(), content);
        }

        if self.current_theme != DEFAULT_THEME {
            let theme_path = self.theme_path(&self.current_theme);
            collect_templates_from_dir(&theme_path, &theme_path, &mut templates)?;
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(error_chain("Failed to load templates", &e)))?;

        self.tera = tera;
        Ok(())
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(error_chain(&format!("Failed to render '{}'", template), &e))
                .into()
        })
    }

    /// Render a page template with the standard variables added to
    /// `context`, falling back to an error page like
    /// [`render_with_fallback`](Self::render_with_fallback).
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &StandardTemplateVars,
    ) -> String {
        let mut full = context.clone();
        full.insert("site_name", &vars.site_name);
        full.insert("request_path", &vars.request_path);
        full.insert("current_user", &vars.current_user);
        full.insert("year", &vars.year);
        full.insert("theme_name", &self.current_theme);
        self.render_with_fallback(template, &full)
    }

    /// Render a template; on failure render `error.html`, and failing that a
    /// plain HTML error page. Never fails.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {:#}", template, e);

                let mut error_context = context.clone();
                error_context.insert("status", &500);
                error_context.insert("message", "The page could not be rendered.");

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::warn!(
                            "Failed to render error template: {:#}, returning plain error page",
                            error_template_err
                        );
                        Self::simple_error_page(500, "The page could not be rendered.")
                    }
                }
            }
        }
    }

    /// Minimal standalone error page, used when templates are unusable
    pub fn simple_error_page(status: u16, message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Error {status}</title>
</head>
<body>
    <h1>Error {status}</h1>
    <p>{message}</p>
    <p><a href="/">Home</a></p>
</body>
</html>"#,
            status = status,
            message = tera::escape_html(message),
        )
    }

    pub fn current_theme(&self) -> &str {
        &self.current_theme
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    fn theme_path(&self, theme: &str) -> PathBuf {
        self.themes_path.join(theme)
    }
}

/// Add every `.html` file under `current` to `templates`, keyed by its path
/// relative to `base`. Existing entries are replaced.
fn collect_templates_from_dir(
    base: &Path,
    current: &Path,
    templates: &mut BTreeMap<String, String>,
) -> Result<()> {
    for entry in fs::read_dir(current).map_err(ThemeError::from)? {
        let path = entry.map_err(ThemeError::from)?.path();

        if path.is_dir() {
            collect_templates_from_dir(base, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let name = path
                .strip_prefix(base)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.insert(name, content);
        }
    }
    Ok(())
}

fn error_chain(prefix: &str, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Variables every page template receives
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    /// Logged-in user, if any
    pub current_user: Option<CurrentUser>,
    pub request_path: String,
    /// Current year (for the footer)
    pub year: i32,
}

/// The logged-in user as templates see it
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl StandardTemplateVars {
    pub fn new(site_name: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            current_user: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    pub fn with_user(mut self, user: Option<&User>) -> Self {
        self.current_user = user.map(CurrentUser::from);
        self
    }
}
