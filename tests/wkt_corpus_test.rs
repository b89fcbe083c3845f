//! WKT corpus tests using datatest-stable for test data discovery
//!
//! Each `.wkt` file under `tests/testdata/wkt` is named after its dialect
//! (`wkt1_gdal_*`, `wkt1_esri_*`, `wkt2_2015_*`, `wkt2_2018_*`). For every
//! file the test verifies that:
//! 1. The dialect is detected from the text alone
//! 2. The text parses without the metadata repository
//! 3. Re-exporting in the detected dialect and parsing again preserves the
//!    name, the identifiers and the pipeline string of the object

use std::path::Path;

use crs_text::pipeline::ProjConvention;
use crs_text::wkt::{guess_dialect, WktConvention, WktDialect, WktParser};

fn expected_dialect(file_name: &str) -> Option<WktDialect> {
    [
        ("wkt1_gdal_", WktDialect::Wkt1Gdal),
        ("wkt1_esri_", WktDialect::Wkt1Esri),
        ("wkt2_2015_", WktDialect::Wkt2_2015),
        ("wkt2_2018_", WktDialect::Wkt2_2018),
    ]
    .into_iter()
    .find(|(prefix, _)| file_name.starts_with(prefix))
    .map(|(_, dialect)| dialect)
}

fn convention_for(dialect: WktDialect) -> WktConvention {
    match dialect {
        WktDialect::Wkt1Gdal => WktConvention::Wkt1Gdal,
        WktDialect::Wkt1Esri => WktConvention::Wkt1Esri,
        WktDialect::Wkt2_2015 => WktConvention::Wkt2_2015,
        _ => WktConvention::Wkt2_2018,
    }
}

/// Test that a WKT corpus file is detected, parsed and re-exported
fn test_wkt_corpus(path: &Path) -> datatest_stable::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read test file {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Bad file name {}", path.display()))?;
    let expected = expected_dialect(file_name)
        .ok_or_else(|| format!("{} does not name its dialect", path.display()))?;

    let dialect = guess_dialect(&content);
    assert_eq!(dialect, expected, "dialect of {}", path.display());

    let object = WktParser::new()
        .create_from_wkt(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    let exported = object
        .to_wkt(convention_for(dialect))
        .map_err(|e| format!("Failed to export {}: {}", path.display(), e))?;
    let reparsed = WktParser::new()
        .create_from_wkt(&exported)
        .map_err(|e| format!("Failed to parse export of {}: {}\n{}", path.display(), e, exported))?;

    assert_eq!(reparsed.name(), object.name(), "name of {}", path.display());
    assert_eq!(reparsed.ids(), object.ids(), "identifiers of {}", path.display());
    assert_eq!(
        reparsed.to_proj_string(ProjConvention::Proj5).ok(),
        object.to_proj_string(ProjConvention::Proj5).ok(),
        "pipeline string of {}",
        path.display()
    );

    Ok(())
}

datatest_stable::harness!(test_wkt_corpus, "tests/testdata/wkt", r".*\.wkt$");
