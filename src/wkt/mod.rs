//! # Well-Known Text
//!
//! Reading and writing CRSs and coordinate operations as WKT, in the WKT2
//! (2015 and 2018 revisions, full and simplified), WKT1 GDAL and WKT1 ESRI
//! flavours.
//!
//! ## Key Components
//!
//! - **`node`**: the structural text tree and its tokenizer.
//! - **`dialect`**: classification of input text into a dialect.
//! - **`parser`**: [`WktParser`], text tree to domain objects.
//! - **`formatter`**: [`WktFormatter`], the convention-aware writer.
//! - **`export`**: the object visitor driving the formatter.
//! - **`esri`**: ESRI name morphing.

pub mod dialect;
pub mod esri;
pub mod export;
pub mod formatter;
pub mod node;
pub mod parser;

#[cfg(test)]
mod node_proptest;

pub use dialect::{guess_dialect, WktDialect};
pub use formatter::{format_number, OutputAxisRule, WktConvention, WktFormatter};
pub use node::{WktNode, MAX_RECURSION_LEVEL};
pub use parser::WktParser;
