//! # Convert Command Implementation
//!
//! This module implements the `convert` subcommand, which reads a CRS or
//! coordinate operation in any accepted form and writes it in the requested
//! WKT or pipeline-string convention.
//!
//! ## Functionality
//!
//! - **Input**: WKT, `+proj=` strings, `AUTH:CODE`, URNs or registered
//!   names; `-` reads standard input and `@FILE` reads a file.
//! - **Output**: any WKT convention (`WKT2_2018`, `WKT1_ESRI`, ...) or
//!   `PROJ5` / `PROJ4`.
//! - **Warnings**: parser warnings are printed to stderr; `--strict` makes
//!   them fatal.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crs_text::config::Settings;
use crs_text::create_from_user_input;
use crs_text::database::DatabaseContext;
use crs_text::model::Object;
use crs_text::pipeline::ProjConvention;
use crs_text::suggestions;
use crs_text::wkt::{guess_dialect, WktConvention, WktDialect};

use super::{optional_database, read_input, similar_names};

/// Convert a CRS or operation between WKT and pipeline strings
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input text, `-` for standard input or `@FILE`
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output convention (WKT2_2018, WKT2_2015, WKT1_GDAL, WKT1_ESRI, PROJ5, PROJ4, ...)
    ///
    /// Defaults to the WKT convention of the settings file.
    #[arg(short = 't', long = "to", value_name = "CONVENTION")]
    pub to: Option<String>,

    /// Write WKT on a single line
    #[arg(long)]
    pub single_line: bool,

    /// Treat parser warnings as errors and make the formatter strict
    #[arg(long)]
    pub strict: bool,

    /// Resolve +datum= and +ellps= through the repository, like PROJ.4
    #[arg(long)]
    pub proj4_init_rules: bool,
}

/// Output target selected by `--to`.
enum Target {
    Wkt(WktConvention),
    Proj(ProjConvention),
}

fn target(name: &str) -> Result<Target> {
    if let Some(convention) = WktConvention::parse(name) {
        return Ok(Target::Wkt(convention));
    }
    if let Some(convention) = ProjConvention::parse(name) {
        return Ok(Target::Proj(convention));
    }
    let valid: Vec<&str> = WktConvention::all()
        .iter()
        .map(|c| c.as_str())
        .chain(ProjConvention::all().iter().map(|c| c.as_str()))
        .collect();
    Err(suggestions::unknown_convention(name, &valid))
}

/// Execute the `convert` command.
pub fn execute(args: ConvertArgs, settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    settings.strict |= args.strict;
    settings.pipeline.use_proj4_init_rules |= args.proj4_init_rules;
    if args.single_line {
        settings.wkt.multiline = false;
    }
    let target = match &args.to {
        Some(name) => target(name)?,
        None => Target::Wkt(settings.wkt_convention()?),
    };

    let text = read_input(&args.input)?;
    let db = optional_database(&settings)?;
    let object = parse(&text, &settings, db.clone()).map_err(|e| {
        let names = similar_names(db.as_ref(), text.trim());
        suggestions::unrecognized_input(text.trim(), &e, &names)
    })?;
    log::info!("Read {} '{}'", object.kind_name(), object.name());

    let output = match target {
        Target::Wkt(convention) => {
            settings.wkt.convention = convention.as_str().to_string();
            let mut formatter = settings.wkt_formatter(db)?;
            object.export_to_wkt(&mut formatter)?;
            formatter.to_string()
        }
        Target::Proj(convention) => {
            settings.pipeline.convention = convention.as_str().to_string();
            let mut formatter = settings.proj_string_formatter(db)?;
            object.export_to_proj_string(&mut formatter)?;
            formatter.to_string()
        }
    };
    println!("{}", output);
    Ok(())
}

/// Parse with the configured parsers so warnings can be reported.
fn parse(
    text: &str,
    settings: &Settings,
    db: Option<Arc<DatabaseContext>>,
) -> crs_text::Result<Object> {
    let trimmed = text.trim();
    let (object, warnings) = if trimmed.starts_with('+') || trimmed.starts_with("proj=") {
        let mut parser = settings.proj_string_parser(db);
        let object = parser.create_from_proj_string(trimmed)?;
        (object, parser.warning_list().to_vec())
    } else if guess_dialect(trimmed) != WktDialect::NotRecognized {
        let mut parser = settings.wkt_parser(db);
        let object = parser.create_from_wkt(trimmed)?;
        (object, parser.warning_list().to_vec())
    } else {
        let object = create_from_user_input(trimmed, db, settings.pipeline.use_proj4_init_rules)?;
        (object, Vec::new())
    };
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crs_text::Error;

    #[test]
    fn test_target_names() {
        assert!(matches!(target("wkt1_gdal").unwrap(), Target::Wkt(WktConvention::Wkt1Gdal)));
        assert!(matches!(target("PROJ4").unwrap(), Target::Proj(ProjConvention::Proj4)));
        assert!(matches!(target("proj").unwrap(), Target::Proj(ProjConvention::Proj5)));

        let message = target("WKT2_2020").err().unwrap().to_string();
        assert!(message.contains("Unknown convention: WKT2_2020"));
    }

    #[test]
    fn test_parse_records_no_error_for_valid_pipeline() {
        let settings = Settings::default();
        let object = parse("+proj=longlat +datum=WGS84", &settings, None).unwrap();
        assert_eq!(object.kind_name(), "geographic CRS");
    }

    #[test]
    fn test_parse_strict_rejects_warnings() {
        let settings = Settings {
            strict: true,
            ..Settings::default()
        };
        let err = parse("+proj=longlat +foo=1", &settings, None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
