//! # Pipeline Strings
//!
//! Reading and writing PROJ pipeline strings such as
//! `+proj=pipeline +step +proj=axisswap +order=2,1 +step ...`.
//!
//! ## Key Components
//!
//! - **[`tokenize`]**: splits a string into [`ProjTokens`], its steps and
//!   their parameters.
//! - **[`ProjStringFormatter`]**: accumulates steps, handles nested
//!   inversions and removes steps that cancel out when rendered.
//! - **[`ProjStringParser`]**: builds CRSs from single steps and keeps
//!   anything else as a PROJ-based operation.
//! - **`export`**: `Object::to_proj_string` for CRSs and operations.

pub mod export;
pub mod formatter;
pub mod parser;
pub mod tokens;

pub use formatter::{ParamValue, ProjConvention, ProjStringFormatter};
pub use parser::ProjStringParser;
pub use tokens::{tokenize, Param, ProjTokens, Step};
