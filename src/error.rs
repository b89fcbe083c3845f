//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `crs-text` library. It uses the `thiserror` library to create a single
//! `Error` enum that covers every failure mode of the text-interchange layer,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the library. Each variant corresponds to one class of
//!   failure and carries the context needed to report it.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library.
//!
//! ## Taxonomy
//!
//! - `Parse`: malformed or unrecognized WKT / pipeline text, with the byte
//!   offset of the offending input when one is known.
//! - `Format`: an object (or object/convention combination) that has no valid
//!   textual representation.
//! - `Factory`: a generic construction failure against the metadata
//!   repository (malformed stored definition, inconsistent kind).
//! - `NoSuchAuthorityCode`: a `Factory` specialization carrying the authority
//!   and code verbatim. [`Error::is_factory_error`] is true for both.
//! - `Repository`: connection or storage level failure of the metadata
//!   repository. Always fatal to the current operation.
//!
//! Negative lookups (absent grid alternative, absent alias) are not errors:
//! they are returned as `Ok(None)`.

use thiserror::Error;

/// Main error type for crs-text operations
#[derive(Error, Debug)]
pub enum Error {
    /// The input text could not be tokenized or mapped onto an object.
    #[error("Parsing error: {message}{}", offset.map(|o| format!(" (at offset {})", o)).unwrap_or_default())]
    Parse {
        message: String,
        /// Byte offset in the input where the problem was detected
        offset: Option<usize>,
    },

    /// The object cannot be represented under the requested convention.
    #[error("Formatting error: {message}")]
    Format { message: String },

    /// An object could not be built from the metadata repository.
    #[error("Factory error: {message}")]
    Factory { message: String },

    /// The requested authority code does not exist in the repository.
    #[error("No such authority code: {authority}:{code} - {message}")]
    NoSuchAuthorityCode {
        message: String,
        authority: String,
        code: String,
    },

    /// The metadata repository could not be opened or queried.
    #[error("Metadata repository error: {message}")]
    Repository { message: String },

    /// An error occurred while loading the settings file.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Build a [`Error::Parse`] without offset information.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            offset: None,
        }
    }

    /// Build a [`Error::Parse`] pointing at `offset` in the input.
    pub fn parse_at(message: impl Into<String>, offset: usize) -> Self {
        Error::Parse {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Build a [`Error::Format`].
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format {
            message: message.into(),
        }
    }

    /// Build a [`Error::Factory`].
    pub fn factory(message: impl Into<String>) -> Self {
        Error::Factory {
            message: message.into(),
        }
    }

    /// Build a [`Error::NoSuchAuthorityCode`].
    pub fn no_such_code(message: impl Into<String>, authority: &str, code: &str) -> Self {
        Error::NoSuchAuthorityCode {
            message: message.into(),
            authority: authority.to_string(),
            code: code.to_string(),
        }
    }

    /// Build a [`Error::Repository`].
    pub fn repository(message: impl Into<String>) -> Self {
        Error::Repository {
            message: message.into(),
        }
    }

    /// True for `Factory` and its `NoSuchAuthorityCode` specialization.
    pub fn is_factory_error(&self) -> bool {
        matches!(
            self,
            Error::Factory { .. } | Error::NoSuchAuthorityCode { .. }
        )
    }

    /// True for conditions that must abort the current operation regardless
    /// of strictness settings.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Repository { .. } | Error::Io(_) | Error::LockPoisoned { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let error = Error::parse("Unterminated bracket");
        let display = format!("{}", error);
        assert!(display.contains("Parsing error"));
        assert!(display.contains("Unterminated bracket"));
        assert!(!display.contains("offset"));
    }

    #[test]
    fn test_error_display_parse_with_offset() {
        let error = Error::parse_at("Unexpected character", 12);
        let display = format!("{}", error);
        assert!(display.contains("Unexpected character"));
        assert!(display.contains("(at offset 12)"));
    }

    #[test]
    fn test_error_display_no_such_code() {
        let error = Error::no_such_code("not found", "EPSG", "999999999");
        let display = format!("{}", error);
        assert!(display.contains("EPSG:999999999"));
        match error {
            Error::NoSuchAuthorityCode {
                authority, code, ..
            } => {
                assert_eq!(authority, "EPSG");
                assert_eq!(code, "999999999");
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_error_config_with_hint() {
        let error = Error::Config {
            message: "Unknown convention".to_string(),
            hint: Some("Use WKT2_2018".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("Use WKT2_2018"));
    }

    #[test]
    fn test_factory_specialization() {
        assert!(Error::factory("bad row").is_factory_error());
        assert!(Error::no_such_code("missing", "EPSG", "1").is_factory_error());
        assert!(!Error::parse("x").is_factory_error());
        assert!(!Error::repository("x").is_factory_error());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::repository("cannot open").is_fatal());
        assert!(Error::LockPoisoned {
            context: "cache".to_string()
        }
        .is_fatal());
        assert!(!Error::factory("bad row").is_fatal());
        assert!(!Error::parse("x").is_fatal());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
