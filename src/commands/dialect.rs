//! # Dialect Command Implementation
//!
//! This module implements the `dialect` subcommand, which reports which WKT
//! dialect a text is written in without fully parsing it. With `--check`
//! the text is also parsed and any parser warnings are listed.
//!
//! This command is a safe, read-only operation that does not need a
//! metadata repository.

use anyhow::Result;
use clap::Args;

use crs_text::config::Settings;
use crs_text::wkt::{guess_dialect, WktDialect};

use super::read_input;

/// Detect the WKT dialect of a text
#[derive(Args, Debug)]
pub struct DialectArgs {
    /// Input text, `-` for standard input or `@FILE`
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Also parse the text and report warnings
    #[arg(long)]
    pub check: bool,
}

/// Execute the `dialect` command.
///
/// Prints the dialect name. Fails when the text is not recognized as WKT.
pub fn execute(args: DialectArgs, settings: &Settings) -> Result<()> {
    let text = read_input(&args.input)?;
    let dialect = guess_dialect(&text);
    println!("{}", dialect);
    if dialect == WktDialect::NotRecognized {
        anyhow::bail!("Input is not recognized as WKT");
    }

    if args.check {
        let mut parser = settings.wkt_parser(None);
        let object = parser.create_from_wkt(&text)?;
        println!("{}: {}", object.kind_name(), object.name());
        for warning in parser.warning_list() {
            println!("warning: {}", warning);
        }
    }
    Ok(())
}
