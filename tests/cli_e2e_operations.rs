//! End-to-end tests for the `operations` command.

mod common;
use common::prelude::*;

#[test]
fn test_operations_ranked_listing() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "EPSG:4314", "EPSG:4326"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "3 operation(s) from EPSG:4314 to EPSG:4326\n",
        ))
        .stdout(predicate::str::contains(
            " 1. DHDN to WGS 84 (via ETRS89) [EPSG:99000]",
        ))
        .stdout(predicate::str::contains(
            " 2. DHDN to WGS 84 (2) [EPSG:1777] (3 m)\n",
        ))
        .stdout(predicate::str::contains(
            " 3. DHDN to WGS 84 (1) [EPSG:1673] (1 m) DEPRECATED\n",
        ));
}

#[test]
fn test_operations_limit() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "epsg:4314", "epsg:4326", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" 1. DHDN to WGS 84 (via ETRS89)"))
        .stdout(predicate::str::contains(" 2. ").not());
}

#[test]
fn test_operations_via_intermediate() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "EPSG:4275", "EPSG:4258"])
        .assert()
        .success()
        .stdout("0 operation(s) from EPSG:4275 to EPSG:4258\n");

    fixture
        .command()
        .args(["operations", "EPSG:4275", "EPSG:4258", "--via", "EPSG:4326"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "NTF to WGS 84 (1) + Inverse of ETRS89 to WGS 84 (1)",
        ))
        .stdout(predicate::str::contains("(3 m)"));
}

#[test]
fn test_operations_discard_missing_grids() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "EPSG:4314", "EPSG:4258", "--discard-missing-grids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[EPSG:1776]"))
        .stdout(predicate::str::contains("[EPSG:15948]").not());

    fixture
        .command()
        .args([
            "operations",
            "EPSG:4314",
            "EPSG:4258",
            "--discard-missing-grids",
            "--known-grids-available",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(" 1. DHDN to ETRS89 (8) [EPSG:15948] (0.1 m)"));
}

#[test]
fn test_operations_known_grids_requires_discard() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "EPSG:4314", "EPSG:4258", "--known-grids-available"])
        .assert()
        .failure();
}

#[test]
fn test_operations_malformed_code() {
    let fixture = TestFixture::new().with_repository();

    fixture
        .command()
        .args(["operations", "4314", "EPSG:4326"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not of the form AUTHORITY:CODE"));
}

#[test]
fn test_operations_missing_repository() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["operations", "EPSG:4314", "EPSG:4326"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Metadata repository not found"))
        .stderr(predicate::str::contains("hint: Use --database"));
}
