//! Snapshot tests for CLI output using insta.
//!
//! These tests capture conversion results and listings as inline snapshots,
//! making it easy to review changes to user-facing output.
//!
//! To update snapshots after intentional changes:
//! ```bash
//! cargo insta test --accept
//! ```

mod common;
use common::TestFixture;

/// Strip trailing whitespace from each line for stable snapshots
fn normalize_output(output: &[u8]) -> String {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn stdout_of(fixture: &TestFixture, args: &[&str]) -> String {
    let output = fixture
        .command()
        .args(args)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    normalize_output(&output.stdout)
}

#[test]
fn test_convert_code_to_esri_snapshot() {
    let fixture = TestFixture::new().with_repository();

    insta::assert_snapshot!(
        stdout_of(&fixture, &["convert", "EPSG:4326", "--to", "WKT1_ESRI", "--single-line"]),
        @r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#
    );
}

#[test]
fn test_convert_pipeline_to_proj4_snapshot() {
    let fixture = TestFixture::new();

    insta::assert_snapshot!(
        stdout_of(&fixture, &["convert", "+proj=utm +zone=31 +datum=WGS84", "--to", "PROJ4"]),
        @"+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs"
    );
}

#[test]
fn test_operations_listing_snapshot() {
    let fixture = TestFixture::new().with_repository();

    insta::assert_snapshot!(stdout_of(&fixture, &["operations", "EPSG:4314", "EPSG:4326"]), @r"
    3 operation(s) from EPSG:4314 to EPSG:4326
     1. DHDN to WGS 84 (via ETRS89) [EPSG:99000] (2 m)
     2. DHDN to WGS 84 (2) [EPSG:1777] (3 m)
     3. DHDN to WGS 84 (1) [EPSG:1673] (1 m) DEPRECATED
    ");
}

#[test]
fn test_codes_listing_snapshot() {
    let fixture = TestFixture::new().with_repository();

    insta::assert_snapshot!(stdout_of(&fixture, &["info", "--codes", "projected_crs"]), @r"
    EPSG:25832	ETRS89 / UTM zone 32N
    EPSG:31467	DHDN / 3-degree Gauss-Kruger zone 3
    EPSG:32631	WGS 84 / UTM zone 31N
    ");
}
