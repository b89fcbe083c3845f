//! WKT dialect detection.
//!
//! Detection is total: any input, including garbage, maps to exactly one
//! [`WktDialect`]. It looks at the outer keyword first, then at the set of
//! keywords used anywhere in the text (quoted strings are skipped) and at a
//! few ESRI naming markers.

use std::fmt;

/// Recognized WKT variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WktDialect {
    Wkt2_2018,
    Wkt2_2015,
    Wkt1Gdal,
    Wkt1Esri,
    NotRecognized,
}

impl WktDialect {
    pub fn is_wkt1(&self) -> bool {
        matches!(self, WktDialect::Wkt1Gdal | WktDialect::Wkt1Esri)
    }

    pub fn is_wkt2(&self) -> bool {
        matches!(self, WktDialect::Wkt2_2018 | WktDialect::Wkt2_2015)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WktDialect::Wkt2_2018 => "WKT2_2018",
            WktDialect::Wkt2_2015 => "WKT2_2015",
            WktDialect::Wkt1Gdal => "WKT1_GDAL",
            WktDialect::Wkt1Esri => "WKT1_ESRI",
            WktDialect::NotRecognized => "NOT_RECOGNIZED",
        }
    }
}

impl fmt::Display for WktDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const WKT1_KEYWORDS: &[&str] = &[
    "GEOGCS", "GEOCCS", "PROJCS", "VERT_CS", "VERTCS", "COMPD_CS", "LOCAL_CS",
];

const WKT2_KEYWORDS: &[&str] = &[
    "GEODCRS",
    "GEODETICCRS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "PROJCRS",
    "PROJECTEDCRS",
    "VERTCRS",
    "VERTICALCRS",
    "COMPOUNDCRS",
    "ENGCRS",
    "ENGINEERINGCRS",
    "PARAMETRICCRS",
    "TIMECRS",
    "BOUNDCRS",
    "COORDINATEOPERATION",
    "CONVERSION",
    "CONCATENATEDOPERATION",
    "ELLIPSOID",
    "TRF",
    "GEODETICDATUM",
    "VDATUM",
    "VERTICALDATUM",
];

/// Keywords that only exist in WKT2:2018 (ISO 19162:2019).
const WKT2_2018_ONLY_KEYWORDS: &[&str] = &[
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "BASEGEOGCRS",
    "BASEPROJCRS",
    "BASEVERTCRS",
    "CONCATENATEDOPERATION",
    "USAGE",
    "DYNAMIC",
    "FRAMEEPOCH",
    "MODEL",
    "GEOIDMODEL",
    "VELOCITYGRID",
    "ENSEMBLE",
    "DERIVEDPROJCRS",
    "BASEDERIVEDPROJCRS",
    "COORDINATEMETADATA",
    "EPOCH",
    "AXISMINVALUE",
    "AXISMAXVALUE",
    "RANGEMEANING",
];

/// Raw-text markers of ESRI naming conventions.
const ESRI_MARKERS: &[&str] = &[
    "GEOGCS[\"GCS_",
    "DATUM[\"D_",
    "PARAMETER[\"False_Easting\"",
    "PARAMETER[\"Central_Meridian\"",
    "PARAMETER[\"Latitude_Of_Origin\"",
    "PARAMETER[\"Standard_Parallel_1\"",
    "PROJECTION[\"Mercator_Auxiliary_Sphere\"",
    "UNIT[\"Degree\"",
];

/// Keywords of `text`: unquoted tokens immediately followed by an opening
/// bracket, upper-cased.
fn scan_keywords(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut keywords = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut in_quotes = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_quotes {
            if b == b'"' {
                in_quotes = false;
            }
            continue;
        }
        match b {
            b'"' => {
                in_quotes = true;
                token_start = None;
            }
            b'[' | b'(' => {
                if let Some(start) = token_start.take() {
                    keywords.push(text[start..i].trim().to_ascii_uppercase());
                }
            }
            b']' | b')' | b',' => token_start = None,
            b if b.is_ascii_whitespace() => {}
            _ => {
                if token_start.is_none() {
                    token_start = Some(i);
                }
            }
        }
    }
    keywords
}

fn outer_keyword(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    let end = trimmed.find(['[', '('])?;
    let keyword = trimmed[..end].trim();
    if keyword.is_empty() || keyword.contains(char::is_whitespace) || keyword.contains('"') {
        return None;
    }
    Some(keyword.to_ascii_uppercase())
}

/// Classify `text` into one of the WKT dialects. Never fails.
pub fn guess_dialect(text: &str) -> WktDialect {
    let Some(outer) = outer_keyword(text) else {
        return WktDialect::NotRecognized;
    };

    if WKT1_KEYWORDS.contains(&outer.as_str()) {
        let esri_marked = outer == "VERTCS" || ESRI_MARKERS.iter().any(|m| text.contains(m));
        return if esri_marked {
            WktDialect::Wkt1Esri
        } else {
            WktDialect::Wkt1Gdal
        };
    }

    if WKT2_KEYWORDS.contains(&outer.as_str()) {
        let keywords = scan_keywords(text);
        let is_2018 = keywords
            .iter()
            .any(|k| WKT2_2018_ONLY_KEYWORDS.contains(&k.as_str()));
        return if is_2018 {
            WktDialect::Wkt2_2018
        } else {
            WktDialect::Wkt2_2015
        };
    }

    WktDialect::NotRecognized
}
