//! # Operations Command Implementation
//!
//! This module implements the `operations` subcommand, which lists the
//! coordinate operations registered between two CRSs, best first.
//!
//! ## Functionality
//!
//! - **Direct operations**: read in both directions; reverse rows are
//!   shown as their inverse.
//! - **Intermediates**: `--via AUTH:CODE` (repeatable) lists paths through
//!   the given CRSs instead.
//! - **Grid filtering**: `--discard-missing-grids` drops operations whose
//!   grids are not available locally.
//! - **Output**: a numbered summary, optionally with the pipeline string
//!   of each operation.

use anyhow::{Context, Result};
use clap::Args;

use crs_text::config::Settings;
use crs_text::factory::{AuthorityFactory, OperationSearch};
use crs_text::model::{CoordinateOperation, Object};

use super::required_database;

/// List coordinate operations between two CRSs
#[derive(Args, Debug)]
pub struct OperationsArgs {
    /// Source CRS as AUTHORITY:CODE
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Target CRS as AUTHORITY:CODE
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Only list paths through this intermediate CRS (repeatable)
    #[arg(long, value_name = "AUTH:CODE")]
    pub via: Vec<String>,

    /// Drop operations whose grids are not available locally
    #[arg(long)]
    pub discard_missing_grids: bool,

    /// With --discard-missing-grids, keep grids registered for download
    #[arg(long, requires = "discard_missing_grids")]
    pub known_grids_available: bool,

    /// Show the pipeline string of each operation
    #[arg(short, long)]
    pub pipeline: bool,

    /// Maximum number of operations to list (0 for all)
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,
}

fn split_code(text: &str) -> Result<(String, String)> {
    let (auth, code) = text
        .split_once(':')
        .with_context(|| format!("'{}' is not of the form AUTHORITY:CODE", text))?;
    Ok((auth.to_ascii_uppercase(), code.to_string()))
}

/// Execute the `operations` command.
pub fn execute(args: OperationsArgs, settings: &Settings) -> Result<()> {
    let db = required_database(settings)?;
    let (source_auth, source_code) = split_code(&args.source)?;
    let (target_auth, target_code) = split_code(&args.target)?;
    let options = OperationSearch {
        discard_if_missing_grid: args.discard_missing_grids,
        consider_known_grids_as_available: args.known_grids_available,
        ..OperationSearch::default()
    };

    let factory = AuthorityFactory::create(db, "");
    let ops = if args.via.is_empty() {
        factory.create_from_crs_codes(&source_auth, &source_code, &target_auth, &target_code, &options)?
    } else {
        let intermediates = args
            .via
            .iter()
            .map(|via| split_code(via))
            .collect::<Result<Vec<_>>>()?;
        factory.create_from_crs_codes_with_intermediates(
            &source_auth,
            &source_code,
            &target_auth,
            &target_code,
            &intermediates,
            &options,
        )?
    };

    let shown = if args.limit == 0 {
        ops.len()
    } else {
        args.limit.min(ops.len())
    };
    println!(
        "{} operation(s) from {} to {}",
        ops.len(),
        args.source,
        args.target
    );
    for (index, op) in ops.iter().take(shown).enumerate() {
        println!("{}", summary_line(index + 1, op));
        if args.pipeline {
            let convention = settings.proj_convention()?;
            match Object::CoordinateOperation(op.clone()).to_proj_string(convention) {
                Ok(text) => println!("   {}", text),
                Err(e) => println!("   ({})", e),
            }
        }
    }
    Ok(())
}

fn summary_line(index: usize, op: &CoordinateOperation) -> String {
    let id = op
        .ids()
        .first()
        .map(|id| format!("{}:{}", id.authority, id.code))
        .unwrap_or_else(|| "-".to_string());
    let accuracy = op
        .accuracy()
        .map(|a| format!("{} m", a))
        .unwrap_or_else(|| "unknown accuracy".to_string());
    let mut line = format!("{:>2}. {} [{}] ({})", index, op.name(), id, accuracy);
    if op.is_deprecated() {
        line.push_str(" DEPRECATED");
    }
    line
}
