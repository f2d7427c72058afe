//! Page template cache.
//!
//! Each page under `html/pages/` is composed with `html/base.html` and every
//! partial under `html/partials/` into its own [`Tera`] instance, built once at
//! startup and shared read-only between workers. Pages are looked up by file
//! name (`home.html`, `view.html`, ...).
//!
//! Template names end in `.html`, so Tera autoescapes every interpolation.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};
use tracing::debug;

const BASE_TEMPLATE: &str = "base.html";
const PARTIALS_DIR: &str = "partials";
const PAGES_DIR: &str = "pages";
const HUMAN_DATE_FORMAT: &str = "%d %b %Y at %H:%M";

/// Signature shared by every template filter.
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// Errors raised while building the cache or rendering a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateCacheError {
    /// A template file or directory could not be read.
    #[error("failed to read template `{path}`: {message}")]
    Io {
        /// Path relative to the template root.
        path: String,
        /// I/O error detail.
        message: String,
    },
    /// A template failed to parse.
    #[error("failed to parse template `{name}`: {message}")]
    Parse {
        /// Page being composed.
        name: String,
        /// Parser detail including the failing file.
        message: String,
    },
    /// No page is cached under the requested name.
    #[error("the template `{name}` does not exist")]
    NotFound {
        /// Requested page name.
        name: String,
    },
    /// The page failed while rendering.
    #[error("failed to render template `{name}`: {message}")]
    Render {
        /// Page being rendered.
        name: String,
        /// Renderer detail.
        message: String,
    },
}

impl TemplateCacheError {
    fn io(path: impl Into<String>, error: &io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Format an instant as `17 Mar 2026 at 10:15`, converted to UTC first.
///
/// # Examples
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use snippetbox::inbound::http::templates::human_date;
///
/// let cet = FixedOffset::east_opt(3600).unwrap();
/// let at = cet.with_ymd_and_hms(2026, 3, 17, 10, 15, 0).unwrap();
/// assert_eq!(human_date(&at), "17 Mar 2026 at 09:15");
/// ```
#[must_use]
pub fn human_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc).format(HUMAN_DATE_FORMAT).to_string()
}

/// Tera filter wrapping [`human_date`]. Null and empty values render as `""`.
fn human_date_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(raw) if raw.is_empty() => return Ok(Value::String(String::new())),
        Value::String(raw) => raw,
        other => {
            return Err(tera::Error::msg(format!(
                "human_date expects an RFC 3339 timestamp, got {other}"
            )));
        }
    };
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|err| tera::Error::msg(format!("human_date: {err}")))?;
    Ok(Value::String(human_date(&parsed)))
}

/// Filters registered with every page, fixed before the cache is built.
#[derive(Debug, Clone)]
pub struct TemplateFunctions {
    filters: BTreeMap<&'static str, FilterFn>,
}

impl TemplateFunctions {
    /// No filters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// Add or replace a filter.
    #[must_use]
    pub fn with_filter(mut self, name: &'static str, filter: FilterFn) -> Self {
        self.filters.insert(name, filter);
        self
    }

    fn register(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl Default for TemplateFunctions {
    fn default() -> Self {
        Self::empty().with_filter("human_date", human_date_filter)
    }
}

/// Immutable map from page file name to its composed template set.
#[derive(Debug)]
pub struct TemplateCache {
    pages: HashMap<String, Tera>,
}

struct Source {
    name: String,
    body: String,
}

impl TemplateCache {
    /// Build the cache from `root`, which holds `base.html`, `partials/` and
    /// `pages/`.
    ///
    /// # Errors
    /// Any missing file, unreadable directory or parse error fails the build.
    pub fn from_dir(root: &Path, functions: &TemplateFunctions) -> Result<Self, TemplateCacheError> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| TemplateCacheError::io(root.display().to_string(), &err))?;

        let base = Source {
            name: BASE_TEMPLATE.to_owned(),
            body: dir
                .read_to_string(BASE_TEMPLATE)
                .map_err(|err| TemplateCacheError::io(BASE_TEMPLATE, &err))?,
        };
        let partials = read_html_files(&dir, PARTIALS_DIR)?;
        let pages = read_html_files(&dir, PAGES_DIR)?;

        let mut cache = HashMap::with_capacity(pages.len());
        for (file_name, page) in pages {
            let mut tera = Tera::default();
            functions.register(&mut tera);

            let sources = std::iter::once(&base)
                .chain(partials.iter().map(|(_, partial)| partial))
                .chain(std::iter::once(&page))
                .map(|source| (source.name.as_str(), source.body.as_str()));
            tera.add_raw_templates(sources)
                .map_err(|err| TemplateCacheError::Parse {
                    name: file_name.clone(),
                    message: error_chain(&err),
                })?;

            debug!(page = %file_name, "template composed");
            cache.insert(file_name, tera);
        }

        Ok(Self { pages: cache })
    }

    /// Names of every cached page.
    pub fn page_names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Render `page` with `data` into a complete string.
    ///
    /// # Errors
    /// [`TemplateCacheError::NotFound`] for an unknown page and
    /// [`TemplateCacheError::Render`] when serialisation or rendering fails.
    pub fn render<T: Serialize>(&self, page: &str, data: &T) -> Result<String, TemplateCacheError> {
        let tera = self
            .pages
            .get(page)
            .ok_or_else(|| TemplateCacheError::NotFound {
                name: page.to_owned(),
            })?;
        let render_error = |err: &tera::Error| TemplateCacheError::Render {
            name: page.to_owned(),
            message: error_chain(err),
        };
        let context = Context::from_serialize(data).map_err(|err| render_error(&err))?;
        tera.render(&format!("{PAGES_DIR}/{page}"), &context)
            .map_err(|err| render_error(&err))
    }
}

/// Read every `*.html` file in `subdir`, sorted by file name, named
/// `subdir/<file>` so pages can `{% include %}` or `{% extends %}` them.
fn read_html_files(dir: &Dir, subdir: &str) -> Result<Vec<(String, Source)>, TemplateCacheError> {
    let sub = dir
        .open_dir(subdir)
        .map_err(|err| TemplateCacheError::io(subdir, &err))?;
    let entries = sub
        .entries()
        .map_err(|err| TemplateCacheError::io(subdir, &err))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TemplateCacheError::io(subdir, &err))?;
        let is_file = entry
            .file_type()
            .map_err(|err| TemplateCacheError::io(subdir, &err))?
            .is_file();
        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !is_file || !file_name.ends_with(".html") {
            continue;
        }
        let path = format!("{subdir}/{file_name}");
        let body = sub
            .read_to_string(&file_name)
            .map_err(|err| TemplateCacheError::io(path.clone(), &err))?;
        files.push((file_name, Source { name: path, body }));
    }
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

/// Flatten a Tera error and its sources; Tera keeps the useful detail in
/// the source chain.
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
