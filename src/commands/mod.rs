//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `crs-text` command-line tool. Each subcommand is defined in its own file
//! to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the loaded
//!   settings and performs the command's logic.
//!
//! Helpers shared by several commands live here: reading input text and
//! opening the metadata repository.

pub mod convert;
pub mod dialect;
pub mod info;
pub mod operations;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crs_text::config::Settings;
use crs_text::database::DatabaseContext;
use crs_text::factory::AuthorityFactory;
use crs_text::suggestions;

/// Text of an input argument: `-` reads standard input, `@path` reads a
/// file, anything else is taken literally.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        return Ok(text);
    }
    if let Some(path) = input.strip_prefix('@') {
        let path = PathBuf::from(path);
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(input.to_string())
}

/// The configured repository when its primary document exists.
pub fn optional_database(settings: &Settings) -> Result<Option<Arc<DatabaseContext>>> {
    let path = settings.database_path();
    if !path.is_file() {
        log::debug!("No metadata repository at {}", path.display());
        return Ok(None);
    }
    Ok(Some(settings.open_database()?))
}

/// The configured repository, failing with hints when it is missing.
pub fn required_database(settings: &Settings) -> Result<Arc<DatabaseContext>> {
    optional_database(settings)?
        .ok_or_else(|| suggestions::database_not_found(&settings.database_path()))
}

/// Registered names close to `input`, for "did you mean" hints.
pub fn similar_names(db: Option<&Arc<DatabaseContext>>, input: &str) -> Vec<String> {
    let Some(db) = db else {
        return Vec::new();
    };
    AuthorityFactory::create(Arc::clone(db), "")
        .search_names(input, &[], true, 3)
        .map(|found| found.into_iter().map(|m| m.name).collect())
        .unwrap_or_default()
}
