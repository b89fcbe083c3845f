//! Shared test utilities for integration and E2E tests.
//!
//! This module provides the fixture repository, a temporary directory
//! fixture and a preconfigured command for the `crs-text` binary.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_repository();
//!     fixture.command().args(["info"]).assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_fs::prelude::*;
use crs_text::database::DatabaseContext;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{fixture_database, wkt};
    pub use super::TestFixture;
}

/// Path of the fixture repository document.
pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/proj.json")
}

/// Path of the auxiliary fixture document.
#[allow(dead_code)]
pub fn auxiliary_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/aux.json")
}

/// Handle on the fixture repository.
#[allow(dead_code)]
pub fn fixture_database() -> Arc<DatabaseContext> {
    DatabaseContext::create(fixture_path())
}

/// WKT snippets shared by several tests.
#[allow(dead_code)]
pub mod wkt {
    pub const WGS84_WKT1: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

    pub const WGS84_WKT2: &str = r#"GEOGCRS["WGS 84",
    DATUM["World Geodetic System 1984",
        ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],
    PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],
    CS[ellipsoidal,2],
        AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],
        AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]],
    ID["EPSG",4326]]"#;

    pub const ESRI_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
}

/// A temporary directory holding a copy of the fixture repository and an
/// optional settings file.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Copy the fixture repository to `proj.json`.
    pub fn with_repository(self) -> Self {
        self.temp_dir
            .child("proj.json")
            .write_file(&fixture_path())
            .expect("Failed to copy repository");
        self
    }

    /// Add a settings file `crs-text.yaml` with the given content.
    #[allow(dead_code)]
    pub fn with_settings(self, content: &str) -> Self {
        self.temp_dir
            .child("crs-text.yaml")
            .write_str(content)
            .expect("Failed to write settings file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repository_path(&self) -> PathBuf {
        self.temp_dir.path().join("proj.json")
    }

    #[allow(dead_code)]
    pub fn settings_path(&self) -> PathBuf {
        self.temp_dir.path().join("crs-text.yaml")
    }

    /// Command for the `crs-text` binary running in the fixture directory,
    /// with the repository and settings locations pinned to the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("crs-text");
        cmd.current_dir(self.path())
            .env("CRS_TEXT_DATABASE", self.repository_path())
            .env("XDG_CONFIG_HOME", self.path())
            .env_remove("RUST_LOG");
        if self.settings_path().is_file() {
            cmd.env("CRS_TEXT_CONFIG", self.settings_path());
        } else {
            cmd.env_remove("CRS_TEXT_CONFIG");
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
