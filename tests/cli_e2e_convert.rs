//! End-to-end tests for the `convert` command.
//!
//! These tests invoke the actual CLI binary and validate the behavior of the
//! `convert` subcommand from a user's perspective.

mod common;
use common::prelude::*;

/// Test that convert --help flag shows help information
#[test]
fn test_convert_help() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Convert a CRS or operation between WKT and pipeline strings",
        ));
}

#[test]
fn test_convert_pipeline_to_proj4() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["convert", "+proj=utm +zone=31 +datum=WGS84", "--to", "PROJ4"])
        .assert()
        .success()
        .stdout("+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs\n");
}

#[test]
fn test_convert_code_to_pipeline() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["convert", "EPSG:4326", "--to", "PROJ"])
        .assert()
        .success()
        .stdout("+proj=longlat +datum=WGS84 +no_defs +type=crs\n");
}

#[test]
fn test_convert_wkt1_to_wkt2() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["convert", wkt::WGS84_WKT1, "--to", "WKT2_2018", "--single-line"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984""#))
        .stdout(predicate::str::contains(r#"ID["EPSG",4326]"#));
}

#[test]
fn test_convert_reads_file_and_stdin() {
    let fixture = TestFixture::new().with_file("crs.wkt", wkt::ESRI_WGS84);

    fixture
        .command()
        .args(["convert", "@crs.wkt", "--to", "PROJ"])
        .assert()
        .success()
        .stdout("+proj=longlat +datum=WGS84 +no_defs +type=crs\n");

    fixture
        .command()
        .args(["convert", "-", "--to", "PROJ4"])
        .write_stdin("+proj=longlat +ellps=GRS80")
        .assert()
        .success()
        .stdout("+proj=longlat +ellps=GRS80 +no_defs\n");
}

#[test]
fn test_convert_settings_file_selects_convention() {
    let fixture = TestFixture::new().with_settings("wkt:\n  convention: WKT1_GDAL\n  multiline: false\n");

    fixture
        .command()
        .args(["convert", "+proj=longlat +datum=WGS84"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"GEOGCS["unknown",DATUM["WGS_1984""#));
}

#[test]
fn test_convert_warnings_and_strict() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["convert", "+proj=longlat +datum=WGS84 +foo=1", "--to", "PROJ"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: Unknown parameter +foo"));

    fixture
        .command()
        .args(["convert", "+proj=longlat +datum=WGS84 +foo=1", "--to", "PROJ", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot interpret"));
}

#[test]
fn test_convert_unknown_convention_suggests() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["convert", "+proj=longlat", "--to", "WKT1_GDL"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'WKT1_GDAL'?"));
}

#[test]
fn test_convert_unrecognized_input_suggests_name() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["convert", "DHD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot interpret 'DHD'"))
        .stderr(predicate::str::contains("Did you mean"));
}

#[test]
fn test_convert_operation_to_proj4_fails() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["convert", "urn:ogc:def:coordinateOperation:EPSG::1149", "--to", "PROJ4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Formatting error"));
}
