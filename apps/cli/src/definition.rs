//! # View Definitions
//!
//! A view definition file describes one blueprint declaratively:
//!
//! ```toml
//! keep = ["id", "name"]
//! include = ["audit.toml"]
//!
//! [[fields]]
//! name = "display"
//! source = "name"
//! transform = "uppercase"
//!
//! [[joins]]
//! name = "author"
//! key = "author_id"
//! dir = "authors"
//! ```
//!
//! Files are loaded with the `config` crate, so TOML, JSON and YAML all work.
//! The root file can be overridden from the environment with `BLUEPRINT__` keys,
//! e.g. `BLUEPRINT__KEEP=id,email`.

use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ENV_PREFIX: &str = "BLUEPRINT";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
    #[error("Include cycle{}: {message}", format_context(.context))]
    IncludeCycle { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> String {
    context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

trait DefinitionErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DefinitionError>;
}

impl<T> DefinitionErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DefinitionError> {
        self.map_err(|source| DefinitionError::Config { source, context: Some(context.into()) })
    }
}

impl<T> DefinitionErrorExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DefinitionError> {
        self.map_err(|source| DefinitionError::Io { source, context: Some(context.into()) })
    }
}

/// Contents of one definition file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewDefinition {
    /// Display name, used only in logs and `inspect` output.
    pub name: Option<String>,
    pub keep: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub joins: Vec<JoinSpec>,
    /// Other definition files, relative to this one.
    pub include: Vec<PathBuf>,
}

/// One computed field; compiles to a single synchronous rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    /// Input field (or option, for [`Transform::Option`]) to read. Defaults to `name`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub transform: Transform,
    /// Literal for [`Transform::Constant`].
    #[serde(default)]
    pub value: Value,
}

impl FieldSpec {
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Copy,
    Uppercase,
    Lowercase,
    Trim,
    Length,
    Constant,
    Option,
}

/// A related document looked up on disk; compiles to a single asynchronous rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinSpec {
    pub name: String,
    /// Input field whose value names the document (`<dir>/<value>.json`).
    pub key: String,
    /// Directory of related documents, relative to the definition file.
    pub dir: PathBuf,
    #[serde(default)]
    pub missing: MissingPolicy,
}

/// What a join does when the key or the document is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    Null,
    Error,
}

/// A definition with its includes resolved, recursively.
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub path: PathBuf,
    pub definition: ViewDefinition,
    pub includes: Vec<LoadedView>,
}

impl LoadedView {
    /// Loads `path`, applies environment overrides to it, and loads its includes.
    ///
    /// Join directories are resolved against the directory of the file declaring them.
    ///
    /// # Errors
    /// * [`DefinitionError::Io`] if a file cannot be found.
    /// * [`DefinitionError::Config`] if a file is malformed.
    /// * [`DefinitionError::IncludeCycle`] if a file includes itself, directly or not.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        info!("Loading view definition from {}", path.display());
        let mut stack = Vec::new();
        Self::load_recursive(path, true, &mut stack)
    }

    fn load_recursive(
        path: &Path,
        env_overrides: bool,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Self, DefinitionError> {
        let canonical = path
            .canonicalize()
            .context(format!("Failed to resolve definition {}", path.display()))?;

        if stack.contains(&canonical) {
            return Err(DefinitionError::IncludeCycle {
                message: format!("{} includes itself", canonical.display()).into(),
                context: stack.last().map(|p| format!("included from {}", p.display()).into()),
            });
        }

        let mut definition = read_definition(&canonical, env_overrides)?;
        let base = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        for join in &mut definition.joins {
            join.dir = base.join(&join.dir);
        }

        stack.push(canonical.clone());
        let includes = definition
            .include
            .iter()
            .map(|include| Self::load_recursive(&base.join(include), false, stack))
            .collect::<Result<Vec<_>, _>>()?;
        stack.pop();

        debug!(
            path = %canonical.display(),
            fields = definition.fields.len(),
            joins = definition.joins.len(),
            includes = includes.len(),
            "View definition loaded"
        );

        Ok(Self { path: canonical, definition, includes })
    }

    /// Display name: the `name` key, else the file stem.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.definition.name.as_deref().map_or_else(
            || self.path.file_stem().map_or(Cow::Borrowed("view"), |s| s.to_string_lossy()),
            Cow::Borrowed,
        )
    }
}

fn read_definition(path: &Path, env_overrides: bool) -> Result<ViewDefinition, DefinitionError> {
    let mut builder = Config::builder().add_source(File::from(path).required(true));
    if env_overrides {
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .list_separator(",")
                .with_list_parse_key("keep")
                .with_list_parse_key("include")
                .try_parsing(true),
        );
    }

    builder
        .build()
        .context(format!("Failed to read definition {}", path.display()))?
        .try_deserialize::<ViewDefinition>()
        .context(format!("Failed to deserialize definition {}", path.display()))
}
