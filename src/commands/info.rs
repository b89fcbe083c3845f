//! # Info Command Implementation
//!
//! This module implements the `info` subcommand, which displays information
//! about the metadata repository or about one object.
//!
//! ## Functionality
//!
//! - **Repository Overview**: path, provenance metadata, authorities and the
//!   number of registered CRSs per authority
//! - **Object Details**: kind, name, identifiers, scope and area of use of
//!   any input accepted by `convert`
//! - **Code Listing**: `--codes TYPE` lists the codes of one object type
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crs_text::config::Settings;
use crs_text::create_from_user_input;
use crs_text::database::DatabaseContext;
use crs_text::factory::{AuthorityFactory, ObjectType};
use crs_text::model::{Object, Usage};
use crs_text::suggestions;

use super::{optional_database, read_input, required_database, similar_names};

/// Show information about the metadata repository or an object
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Object to describe (WKT, +proj= string, AUTHORITY:CODE or name)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// List the codes of an object type (crs, ellipsoid, transformation, ...)
    #[arg(long, value_name = "TYPE", conflicts_with = "input")]
    pub codes: Option<String>,

    /// Restrict --codes to one authority
    #[arg(long, value_name = "AUTHORITY", default_value = "")]
    pub authority: String,

    /// Include deprecated objects in --codes
    #[arg(long)]
    pub deprecated: bool,
}

/// Execute the `info` command.
pub fn execute(args: InfoArgs, settings: &Settings) -> Result<()> {
    if let Some(type_name) = &args.codes {
        let db = required_database(settings)?;
        return list_codes(db, type_name, &args.authority, args.deprecated);
    }
    match &args.input {
        Some(input) => describe(&read_input(input)?, settings),
        None => repository_overview(required_database(settings)?),
    }
}

fn repository_overview(db: Arc<DatabaseContext>) -> Result<()> {
    if let Some(path) = db.path() {
        println!("Repository: {}", path.display());
    }
    for path in db.auxiliary_paths() {
        println!("Auxiliary: {}", path.display());
    }

    let authorities = db.get_authorities()?;
    for authority in &authorities {
        if let Some(version) = db.get_metadata(&format!("{}.VERSION", authority))? {
            println!("{} version: {}", authority, version);
        }
    }
    println!("Tables: {}", db.get_database_structure()?.len());
    println!("Authorities: {}", authorities.len());
    for authority in &authorities {
        let factory = AuthorityFactory::create(Arc::clone(&db), authority);
        let crs_count = factory.get_authority_codes(ObjectType::Crs, false)?.len();
        let op_count = factory
            .get_authority_codes(ObjectType::CoordinateOperation, false)?
            .len();
        println!("  {}: {} CRS, {} operations", authority, crs_count, op_count);
    }
    Ok(())
}

fn describe(text: &str, settings: &Settings) -> Result<()> {
    let db = optional_database(settings)?;
    let object = create_from_user_input(text, db.clone(), settings.pipeline.use_proj4_init_rules)
        .map_err(|e| {
            let names = similar_names(db.as_ref(), text.trim());
            suggestions::unrecognized_input(text.trim(), &e, &names)
        })?;

    println!("Kind: {}", object.kind_name());
    println!("Name: {}", object.name());
    let ids = object.ids();
    if !ids.is_empty() {
        let ids: Vec<String> = ids
            .iter()
            .map(|id| format!("{}:{}", id.authority, id.code))
            .collect();
        println!("Identifiers: {}", ids.join(", "));
    }
    if let Some(usage) = usage_of(&object) {
        print_usage(usage);
    }
    if let Object::Crs(crs) = &object {
        if let Some(remarks) = crs.remarks() {
            println!("Remarks: {}", remarks);
        }
    }
    Ok(())
}

fn usage_of(object: &Object) -> Option<&Usage> {
    match object {
        Object::Crs(crs) => Some(crs.usage()),
        Object::CoordinateOperation(op) => op.usage(),
        _ => None,
    }
    .filter(|usage| !usage.is_empty())
}

fn print_usage(usage: &Usage) {
    if let Some(scope) = &usage.scope {
        println!("Scope: {}", scope);
    }
    let Some(extent) = &usage.extent else {
        return;
    };
    if let Some(description) = &extent.description {
        println!("Area of use: {}", description);
    }
    if let Some(bbox) = &extent.bbox {
        println!(
            "Bounds: west {}, south {}, east {}, north {}",
            bbox.west, bbox.south, bbox.east, bbox.north
        );
    }
}

fn list_codes(db: Arc<DatabaseContext>, type_name: &str, authority: &str, deprecated: bool) -> Result<()> {
    let object_type = ObjectType::parse(type_name).ok_or_else(|| {
        let valid: Vec<&str> = ObjectType::variants().iter().map(|t| t.as_str()).collect();
        suggestions::unknown_object_type(type_name, &valid)
    })?;
    let authorities = if authority.is_empty() {
        db.get_authorities()?
    } else {
        vec![authority.to_ascii_uppercase()]
    };
    for authority in authorities {
        let factory = AuthorityFactory::create(Arc::clone(&db), &authority);
        for code in factory.get_authority_codes(object_type, deprecated)? {
            let name = factory.get_description_text(&code)?;
            println!("{}:{}\t{}", authority, code, name);
        }
    }
    Ok(())
}
