//! # Settings File
//!
//! This module defines the YAML settings file read by the `crs-text`
//! binary and the helpers turning it into configured parsers, formatters
//! and a repository handle.
//!
//! ## Key Components
//!
//! - **`Settings`**: the whole file. Every key is optional; an empty file
//!   yields the defaults.
//!
//! - **`DatabaseSettings`**, **`WktSettings`**, **`PipelineSettings`**:
//!   one section each.
//!
//! ## Example
//!
//! ```yaml
//! database:
//!   path: /usr/share/crs-text/proj.json
//!   auxiliary: [/etc/crs-text/local.json]
//!   grid_directories: [/usr/share/proj]
//! wkt:
//!   convention: WKT1_GDAL
//!   multiline: false
//! pipeline:
//!   convention: PROJ_4
//!   use_proj4_init_rules: true
//! strict: true
//! ```
//!
//! Convention names are validated when a formatter is built, not at load
//! time, so a file written for a newer release still loads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::database::DatabaseContext;
use crate::defaults;
use crate::error::{Error, Result};
use crate::pipeline::{ProjConvention, ProjStringFormatter, ProjStringParser};
use crate::suggestions::find_similar;
use crate::wkt::{OutputAxisRule, WktConvention, WktFormatter, WktParser};

/// Location of the metadata repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    /// Primary JSON document. Defaults to
    /// [`defaults::default_database_path`].
    pub path: Option<PathBuf>,
    /// Read-only documents merged into the primary one.
    pub auxiliary: Vec<PathBuf>,
    /// Directories searched for grid files.
    pub grid_directories: Vec<PathBuf>,
}

/// `AXIS` output policy. `Auto` keeps the default of the convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAxis {
    #[default]
    Auto,
    Yes,
    No,
    Wkt1GdalEpsgStyle,
}

impl OutputAxis {
    fn rule(self) -> Option<OutputAxisRule> {
        match self {
            OutputAxis::Auto => None,
            OutputAxis::Yes => Some(OutputAxisRule::Yes),
            OutputAxis::No => Some(OutputAxisRule::No),
            OutputAxis::Wkt1GdalEpsgStyle => Some(OutputAxisRule::Wkt1GdalEpsgStyle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WktSettings {
    pub convention: String,
    pub multiline: bool,
    pub indentation_width: usize,
    pub output_axis: OutputAxis,
}

impl Default for WktSettings {
    fn default() -> Self {
        Self {
            convention: defaults::DEFAULT_WKT_CONVENTION.to_string(),
            multiline: true,
            indentation_width: 4,
            output_axis: OutputAxis::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    pub convention: String,
    /// Resolve `+init=` and shorthands the way PROJ.4 did
    pub use_proj4_init_rules: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            convention: defaults::DEFAULT_PROJ_CONVENTION.to_string(),
            use_proj4_init_rules: false,
        }
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub wkt: WktSettings,
    pub pipeline: PipelineSettings,
    /// Turn parser warnings into errors and make formatters strict
    pub strict: bool,
}

fn unknown_convention(name: &str, valid: &[&str]) -> Error {
    Error::Config {
        message: format!("Unknown convention '{}'", name),
        hint: Some(match find_similar(name, valid) {
            Some(close) => format!("Did you mean '{}'?", close),
            None => format!("Valid conventions are: {}", valid.join(", ")),
        }),
    }
}

impl Settings {
    /// Settings from `path` when given, else from the default settings
    /// file when it exists, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return from_file(path);
        }
        let default_path = defaults::default_settings_path();
        if default_path.is_file() {
            log::debug!("Loading settings from {}", default_path.display());
            return from_file(&default_path);
        }
        Ok(Self::default())
    }

    pub fn wkt_convention(&self) -> Result<WktConvention> {
        WktConvention::parse(&self.wkt.convention).ok_or_else(|| {
            let valid: Vec<&str> = WktConvention::all().iter().map(|c| c.as_str()).collect();
            unknown_convention(&self.wkt.convention, &valid)
        })
    }

    pub fn proj_convention(&self) -> Result<ProjConvention> {
        ProjConvention::parse(&self.pipeline.convention).ok_or_else(|| {
            let valid: Vec<&str> = ProjConvention::all().iter().map(|c| c.as_str()).collect();
            unknown_convention(&self.pipeline.convention, &valid)
        })
    }

    /// Repository path, falling back to the default location.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(defaults::default_database_path)
    }

    /// Handle on the configured repository. The documents are read on the
    /// first query.
    pub fn open_database(&self) -> Result<Arc<DatabaseContext>> {
        let path = self.database_path();
        log::debug!("Using metadata repository {}", path.display());
        let db = DatabaseContext::create_with_auxiliary(path, self.database.auxiliary.clone());
        db.set_grid_directories(self.database.grid_directories.clone())?;
        Ok(db)
    }

    pub fn wkt_formatter(&self, db: Option<Arc<DatabaseContext>>) -> Result<WktFormatter> {
        let mut formatter = WktFormatter::create_with_database(self.wkt_convention()?, db);
        formatter
            .set_multi_line(self.wkt.multiline)
            .set_indentation_width(self.wkt.indentation_width)
            .set_strict(self.strict);
        if let Some(rule) = self.wkt.output_axis.rule() {
            formatter.set_output_axis(rule);
        }
        Ok(formatter)
    }

    pub fn proj_string_formatter(
        &self,
        db: Option<Arc<DatabaseContext>>,
    ) -> Result<ProjStringFormatter> {
        Ok(ProjStringFormatter::create_with_database(
            self.proj_convention()?,
            db,
        ))
    }

    pub fn wkt_parser(&self, db: Option<Arc<DatabaseContext>>) -> WktParser {
        let mut parser = WktParser::new();
        parser.attach_database_context(db).set_strict(self.strict);
        parser
    }

    pub fn proj_string_parser(&self, db: Option<Arc<DatabaseContext>>) -> ProjStringParser {
        let mut parser = ProjStringParser::new();
        parser
            .attach_database_context(db)
            .set_use_proj4_init_rules(self.pipeline.use_proj4_init_rules)
            .set_strict(self.strict);
        parser
    }
}

/// Parse a settings document.
pub fn parse(yaml_content: &str) -> Result<Settings> {
    if yaml_content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(yaml_content).map_err(Error::Yaml)
}

/// Read and parse the settings file at `path`.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
