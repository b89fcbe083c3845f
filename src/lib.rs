//! # crs-text
//!
//! This library reads and writes coordinate reference systems (CRSs) and
//! coordinate operations in their textual interchange forms: Well-Known
//! Text in its WKT2 and WKT1 flavours, and PROJ pipeline strings. It can
//! also resolve authority codes such as `EPSG:4326` against a metadata
//! repository and find the registered operations between two CRSs.
//!
//! ## Quick Example
//!
//! ```
//! use crs_text::pipeline::{ProjConvention, ProjStringParser};
//! use crs_text::wkt::WktConvention;
//!
//! let mut parser = ProjStringParser::new();
//! let crs = parser
//!     .create_from_proj_string("+proj=utm +zone=31 +datum=WGS84")
//!     .unwrap();
//!
//! assert_eq!(
//!     crs.to_proj_string(ProjConvention::Proj4).unwrap(),
//!     "+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs"
//! );
//! assert!(crs.to_wkt(WktConvention::Wkt2_2018).unwrap().starts_with("PROJCRS["));
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Object model (`model`)**: closed enums of units, datums, coordinate
//!   systems, CRSs and coordinate operations, compared with
//!   `is_equivalent_to`.
//! - **WKT (`wkt`)**: the text tree tokenizer, dialect detection,
//!   [`wkt::WktParser`] and the convention-aware [`wkt::WktFormatter`].
//! - **Pipeline strings (`pipeline`)**: [`pipeline::ProjStringParser`] and
//!   [`pipeline::ProjStringFormatter`].
//! - **Metadata repository (`database`, `factory`, `cache`)**: a
//!   [`database::DatabaseContext`] over JSON documents, the
//!   [`factory::AuthorityFactory`] building objects from codes and names,
//!   and the cache of built objects.
//! - **User input (`user_input`)**: one entry point accepting any of the
//!   above forms.
//!
//! ## Settings
//!
//! The `config` module reads the YAML settings file used by the `crs-text`
//! binary and builds configured parsers, formatters and repository handles
//! from it; `defaults` holds the default locations.

pub mod cache;
pub mod config;
pub mod database;
pub mod defaults;
pub mod error;
pub mod factory;
pub mod mappings;
pub mod model;
pub mod pipeline;
pub mod suggestions;
pub mod user_input;
pub mod wkt;

pub use error::{Error, Result};
pub use model::Object;
pub use user_input::create_from_user_input;
