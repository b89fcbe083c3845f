//! Name tables shared by the WKT and pipeline layers.
//!
//! Each projection method is known under an EPSG name, a WKT1 (GDAL) name,
//! an ESRI name and a PROJ step name. Parameters are matched by EPSG code
//! first and then by any of their names.

use crate::model::{names_match, UnitKind, UnitOfMeasure};

/// A conversion parameter under its various spellings.
#[derive(Debug, PartialEq)]
pub struct ParamMapping {
    pub epsg_code: i32,
    pub epsg_name: &'static str,
    pub wkt1_name: &'static str,
    pub esri_name: &'static str,
    pub kind: UnitKind,
}

impl ParamMapping {
    /// True when `name` designates this parameter in any convention.
    pub fn matches(&self, name: &str) -> bool {
        names_match(name, self.epsg_name)
            || names_match(name, self.wkt1_name)
            || names_match(name, self.esri_name)
    }

    /// Value used when a WKT definition omits the parameter.
    pub fn default_value(&self) -> f64 {
        if self.kind == UnitKind::Scale {
            1.0
        } else {
            0.0
        }
    }

    pub fn default_unit(&self) -> UnitOfMeasure {
        match self.kind {
            UnitKind::Angular => UnitOfMeasure::degree(),
            UnitKind::Scale => UnitOfMeasure::unity(),
            _ => UnitOfMeasure::metre(),
        }
    }
}

/// A method parameter together with its PROJ key for that method.
#[derive(Debug)]
pub struct MethodParam {
    pub param: &'static ParamMapping,
    pub proj_key: &'static str,
}

/// A projection method under its various spellings.
#[derive(Debug)]
pub struct MethodMapping {
    pub epsg_code: i32,
    pub epsg_name: &'static str,
    pub wkt1_name: &'static str,
    pub esri_name: Option<&'static str>,
    pub proj_name: &'static str,
    pub params: &'static [MethodParam],
}

impl MethodMapping {
    pub fn matches(&self, name: &str) -> bool {
        names_match(name, self.epsg_name)
            || names_match(name, self.wkt1_name)
            || self.esri_name.is_some_and(|esri| names_match(name, esri))
    }

    pub fn param_by_code(&self, epsg_code: i32) -> Option<&'static MethodParam> {
        self.params.iter().find(|p| p.param.epsg_code == epsg_code)
    }

    pub fn param_by_name(&self, name: &str) -> Option<&'static MethodParam> {
        self.params.iter().find(|p| p.param.matches(name))
    }

    pub fn param_by_proj_key(&self, key: &str) -> Option<&'static MethodParam> {
        self.params.iter().find(|p| p.proj_key == key)
    }
}

macro_rules! param {
    ($ident:ident, $code:expr, $epsg:expr, $wkt1:expr, $esri:expr, $kind:expr) => {
        pub const $ident: ParamMapping = ParamMapping {
            epsg_code: $code,
            epsg_name: $epsg,
            wkt1_name: $wkt1,
            esri_name: $esri,
            kind: $kind,
        };
    };
}

param!(LAT_NATURAL_ORIGIN, 8801, "Latitude of natural origin", "latitude_of_origin", "Latitude_Of_Origin", UnitKind::Angular);
param!(LON_NATURAL_ORIGIN, 8802, "Longitude of natural origin", "central_meridian", "Central_Meridian", UnitKind::Angular);
param!(SCALE_NATURAL_ORIGIN, 8805, "Scale factor at natural origin", "scale_factor", "Scale_Factor", UnitKind::Scale);
param!(FALSE_EASTING, 8806, "False easting", "false_easting", "False_Easting", UnitKind::Linear);
param!(FALSE_NORTHING, 8807, "False northing", "false_northing", "False_Northing", UnitKind::Linear);
param!(LAT_FALSE_ORIGIN, 8821, "Latitude of false origin", "latitude_of_origin", "Latitude_Of_Origin", UnitKind::Angular);
param!(LON_FALSE_ORIGIN, 8822, "Longitude of false origin", "central_meridian", "Central_Meridian", UnitKind::Angular);
param!(LAT_1ST_PARALLEL, 8823, "Latitude of 1st standard parallel", "standard_parallel_1", "Standard_Parallel_1", UnitKind::Angular);
param!(LAT_2ND_PARALLEL, 8824, "Latitude of 2nd standard parallel", "standard_parallel_2", "Standard_Parallel_2", UnitKind::Angular);
param!(EASTING_FALSE_ORIGIN, 8826, "Easting at false origin", "false_easting", "False_Easting", UnitKind::Linear);
param!(NORTHING_FALSE_ORIGIN, 8827, "Northing at false origin", "false_northing", "False_Northing", UnitKind::Linear);

const NATURAL_ORIGIN_PARAMS: &[MethodParam] = &[
    MethodParam { param: &LAT_NATURAL_ORIGIN, proj_key: "lat_0" },
    MethodParam { param: &LON_NATURAL_ORIGIN, proj_key: "lon_0" },
    MethodParam { param: &SCALE_NATURAL_ORIGIN, proj_key: "k" },
    MethodParam { param: &FALSE_EASTING, proj_key: "x_0" },
    MethodParam { param: &FALSE_NORTHING, proj_key: "y_0" },
];

const FALSE_ORIGIN_PARAMS: &[MethodParam] = &[
    MethodParam { param: &LAT_FALSE_ORIGIN, proj_key: "lat_0" },
    MethodParam { param: &LON_FALSE_ORIGIN, proj_key: "lon_0" },
    MethodParam { param: &LAT_1ST_PARALLEL, proj_key: "lat_1" },
    MethodParam { param: &LAT_2ND_PARALLEL, proj_key: "lat_2" },
    MethodParam { param: &EASTING_FALSE_ORIGIN, proj_key: "x_0" },
    MethodParam { param: &NORTHING_FALSE_ORIGIN, proj_key: "y_0" },
];

const NO_SCALE_PARAMS: &[MethodParam] = &[
    MethodParam { param: &LAT_NATURAL_ORIGIN, proj_key: "lat_0" },
    MethodParam { param: &LON_NATURAL_ORIGIN, proj_key: "lon_0" },
    MethodParam { param: &FALSE_EASTING, proj_key: "x_0" },
    MethodParam { param: &FALSE_NORTHING, proj_key: "y_0" },
];

const EQC_PARAMS: &[MethodParam] = &[
    MethodParam { param: &LAT_1ST_PARALLEL, proj_key: "lat_ts" },
    MethodParam { param: &LON_NATURAL_ORIGIN, proj_key: "lon_0" },
    MethodParam { param: &FALSE_EASTING, proj_key: "x_0" },
    MethodParam { param: &FALSE_NORTHING, proj_key: "y_0" },
];

pub const EPSG_TRANSVERSE_MERCATOR: i32 = 9807;
pub const EPSG_LCC_1SP: i32 = 9801;
pub const EPSG_LCC_2SP: i32 = 9802;
pub const EPSG_MERCATOR_A: i32 = 9804;
pub const EPSG_PSEUDO_MERCATOR: i32 = 1024;

pub static METHODS: &[MethodMapping] = &[
    MethodMapping {
        epsg_code: EPSG_TRANSVERSE_MERCATOR,
        epsg_name: "Transverse Mercator",
        wkt1_name: "Transverse_Mercator",
        esri_name: Some("Transverse_Mercator"),
        proj_name: "tmerc",
        params: NATURAL_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: EPSG_LCC_1SP,
        epsg_name: "Lambert Conic Conformal (1SP)",
        wkt1_name: "Lambert_Conformal_Conic_1SP",
        esri_name: None,
        proj_name: "lcc",
        params: NATURAL_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: EPSG_LCC_2SP,
        epsg_name: "Lambert Conic Conformal (2SP)",
        wkt1_name: "Lambert_Conformal_Conic_2SP",
        esri_name: Some("Lambert_Conformal_Conic"),
        proj_name: "lcc",
        params: FALSE_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: EPSG_MERCATOR_A,
        epsg_name: "Mercator (variant A)",
        wkt1_name: "Mercator_1SP",
        esri_name: Some("Mercator"),
        proj_name: "merc",
        params: NATURAL_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: EPSG_PSEUDO_MERCATOR,
        epsg_name: "Popular Visualisation Pseudo Mercator",
        wkt1_name: "Popular_Visualisation_Pseudo_Mercator",
        esri_name: Some("Mercator_Auxiliary_Sphere"),
        proj_name: "webmerc",
        params: NO_SCALE_PARAMS,
    },
    MethodMapping {
        epsg_code: 9810,
        epsg_name: "Polar Stereographic (variant A)",
        wkt1_name: "Polar_Stereographic",
        esri_name: None,
        proj_name: "stere",
        params: NATURAL_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: 9820,
        epsg_name: "Lambert Azimuthal Equal Area",
        wkt1_name: "Lambert_Azimuthal_Equal_Area",
        esri_name: Some("Lambert_Azimuthal_Equal_Area"),
        proj_name: "laea",
        params: NO_SCALE_PARAMS,
    },
    MethodMapping {
        epsg_code: 9822,
        epsg_name: "Albers Equal Area",
        wkt1_name: "Albers_Conic_Equal_Area",
        esri_name: Some("Albers"),
        proj_name: "aea",
        params: FALSE_ORIGIN_PARAMS,
    },
    MethodMapping {
        epsg_code: 1028,
        epsg_name: "Equidistant Cylindrical",
        wkt1_name: "Equirectangular",
        esri_name: Some("Equidistant_Cylindrical"),
        proj_name: "eqc",
        params: EQC_PARAMS,
    },
];

pub fn method_by_code(epsg_code: i32) -> Option<&'static MethodMapping> {
    METHODS.iter().find(|m| m.epsg_code == epsg_code)
}

pub fn method_by_name(name: &str) -> Option<&'static MethodMapping> {
    METHODS.iter().find(|m| m.matches(name))
}

/// PROJ step names shared by several methods resolve to the first entry;
/// the pipeline parser disambiguates `lcc` itself.
pub fn method_by_proj_name(proj_name: &str) -> Option<&'static MethodMapping> {
    METHODS.iter().find(|m| m.proj_name == proj_name)
}

/// Parameter by any name, looked up across all methods.
pub fn param_by_name(name: &str) -> Option<&'static ParamMapping> {
    METHODS
        .iter()
        .flat_map(|m| m.params.iter())
        .map(|p| p.param)
        .find(|p| p.matches(name))
}

/// An ellipsoid known to PROJ by a short name (`+ellps=`).
#[derive(Debug)]
pub struct EllipsoidMapping {
    pub proj_name: &'static str,
    pub name: &'static str,
    pub epsg_code: i32,
    pub semi_major_axis: f64,
    pub inverse_flattening: f64,
}

pub static ELLIPSOIDS: &[EllipsoidMapping] = &[
    EllipsoidMapping { proj_name: "WGS84", name: "WGS 84", epsg_code: 7030, semi_major_axis: 6378137.0, inverse_flattening: 298.257223563 },
    EllipsoidMapping { proj_name: "GRS80", name: "GRS 1980", epsg_code: 7019, semi_major_axis: 6378137.0, inverse_flattening: 298.257222101 },
    EllipsoidMapping { proj_name: "intl", name: "International 1924", epsg_code: 7022, semi_major_axis: 6378388.0, inverse_flattening: 297.0 },
    EllipsoidMapping { proj_name: "clrk66", name: "Clarke 1866", epsg_code: 7008, semi_major_axis: 6378206.4, inverse_flattening: 294.978698213898 },
    EllipsoidMapping { proj_name: "airy", name: "Airy 1830", epsg_code: 7001, semi_major_axis: 6377563.396, inverse_flattening: 299.3249646 },
    EllipsoidMapping { proj_name: "bessel", name: "Bessel 1841", epsg_code: 7004, semi_major_axis: 6377397.155, inverse_flattening: 299.1528128 },
];

pub fn ellipsoid_by_proj_name(proj_name: &str) -> Option<&'static EllipsoidMapping> {
    ELLIPSOIDS.iter().find(|e| e.proj_name == proj_name)
}

/// Shorthand for an ellipsoid with the given defining parameters.
pub fn ellipsoid_by_parameters(semi_major_axis: f64, inverse_flattening: f64) -> Option<&'static EllipsoidMapping> {
    ELLIPSOIDS.iter().find(|e| {
        crate::model::numbers_match(e.semi_major_axis, semi_major_axis)
            && crate::model::numbers_match(e.inverse_flattening, inverse_flattening)
    })
}

/// A datum known to PROJ by a short name (`+datum=`).
#[derive(Debug)]
pub struct DatumMapping {
    pub proj_name: &'static str,
    pub name: &'static str,
    pub crs_name: &'static str,
    pub epsg_code: i32,
    pub ellipsoid: &'static str,
}

pub static DATUMS: &[DatumMapping] = &[
    DatumMapping { proj_name: "WGS84", name: "World Geodetic System 1984", crs_name: "WGS 84", epsg_code: 6326, ellipsoid: "WGS84" },
    DatumMapping { proj_name: "NAD83", name: "North American Datum 1983", crs_name: "NAD83", epsg_code: 6269, ellipsoid: "GRS80" },
    DatumMapping { proj_name: "NAD27", name: "North American Datum 1927", crs_name: "NAD27", epsg_code: 6267, ellipsoid: "clrk66" },
];

pub fn datum_by_proj_name(proj_name: &str) -> Option<&'static DatumMapping> {
    DATUMS.iter().find(|d| d.proj_name.eq_ignore_ascii_case(proj_name))
}

pub fn datum_by_name(name: &str) -> Option<&'static DatumMapping> {
    DATUMS.iter().find(|d| names_match(d.name, name))
}

/// WKT1 datum spellings that are not a mechanical rewrite of the official
/// name.
static WKT1_DATUM_NAMES: &[(&str, &str)] = &[
    ("World Geodetic System 1984", "WGS_1984"),
    ("World Geodetic System 1972", "WGS_1972"),
    ("North American Datum 1983", "North_American_Datum_1983"),
    ("European Terrestrial Reference System 1989", "European_Terrestrial_Reference_System_1989"),
];

/// Datum name as written by GDAL in WKT1.
pub fn wkt1_datum_name(official: &str) -> String {
    WKT1_DATUM_NAMES
        .iter()
        .find(|(name, _)| *name == official)
        .map(|(_, wkt1)| wkt1.to_string())
        .unwrap_or_else(|| {
            official
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect()
        })
}

/// Official datum name for a WKT1 spelling, when it is a known one.
pub fn datum_name_from_wkt1(wkt1: &str) -> Option<&'static str> {
    WKT1_DATUM_NAMES
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(wkt1))
        .map(|(official, _)| *official)
}

/// Prime meridians known to PROJ by name (`+pm=`), longitude in degrees.
pub static PRIME_MERIDIANS: &[(&str, &str, f64)] = &[
    ("greenwich", "Greenwich", 0.0),
    ("paris", "Paris", 2.337_229_166_666_67),
    ("lisbon", "Lisbon", -9.131_906_111_111_11),
    ("rome", "Rome", 12.452_333_333_333_3),
];

pub fn prime_meridian_by_proj_name(proj_name: &str) -> Option<(&'static str, f64)> {
    PRIME_MERIDIANS
        .iter()
        .find(|(key, _, _)| *key == proj_name)
        .map(|(_, name, lon)| (*name, *lon))
}

pub fn prime_meridian_proj_name(longitude_deg: f64) -> Option<&'static str> {
    PRIME_MERIDIANS
        .iter()
        .find(|(_, _, lon)| (lon - longitude_deg).abs() < 1e-8)
        .map(|(key, _, _)| *key)
}

/// Linear units known to PROJ (`+units=`).
pub static LINEAR_UNITS: &[(&str, &str, f64)] = &[
    ("m", "metre", 1.0),
    ("km", "kilometre", 1000.0),
    ("ft", "foot", 0.3048),
    ("us-ft", "US survey foot", 0.304_800_609_601_219_2),
];

pub fn linear_unit_by_proj_name(proj_name: &str) -> Option<UnitOfMeasure> {
    if proj_name == "m" {
        return Some(UnitOfMeasure::metre());
    }
    if proj_name == "us-ft" {
        return Some(UnitOfMeasure::us_survey_foot());
    }
    LINEAR_UNITS
        .iter()
        .find(|(key, _, _)| *key == proj_name)
        .map(|(_, name, factor)| UnitOfMeasure::new(name, *factor, UnitKind::Linear))
}

pub fn linear_unit_proj_name(unit: &UnitOfMeasure) -> Option<&'static str> {
    LINEAR_UNITS
        .iter()
        .find(|(_, _, factor)| crate::model::numbers_match(*factor, unit.conversion_to_si))
        .map(|(key, _, _)| *key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_lookup_all_spellings() {
        let tm = method_by_name("Transverse Mercator");
        assert_eq!(tm.map(|m| m.epsg_code), Some(EPSG_TRANSVERSE_MERCATOR));
        assert_eq!(method_by_name("Transverse_Mercator").map(|m| m.proj_name), Some("tmerc"));
        assert_eq!(method_by_name("Albers").map(|m| m.epsg_code), Some(9822));
        assert!(method_by_name("Robinson").is_none());
    }

    #[test]
    fn test_method_parameter_lookup() {
        let lcc = method_by_code(EPSG_LCC_2SP).unwrap();
        assert_eq!(lcc.param_by_name("standard_parallel_1").map(|p| p.proj_key), Some("lat_1"));
        assert_eq!(lcc.param_by_proj_key("y_0").map(|p| p.param.epsg_code), Some(8827));

        let eqc = method_by_proj_name("eqc").unwrap();
        assert_eq!(eqc.param_by_code(8823).map(|p| p.proj_key), Some("lat_ts"));
    }

    #[test]
    fn test_parameter_defaults() {
        assert_eq!(SCALE_NATURAL_ORIGIN.default_value(), 1.0);
        assert_eq!(FALSE_EASTING.default_value(), 0.0);
        assert_eq!(LAT_NATURAL_ORIGIN.default_unit(), UnitOfMeasure::degree());
    }

    #[test]
    fn test_datum_tables() {
        assert_eq!(datum_by_proj_name("wgs84").map(|d| d.epsg_code), Some(6326));
        assert_eq!(wkt1_datum_name("World Geodetic System 1984"), "WGS_1984");
        assert_eq!(wkt1_datum_name("Ordnance Survey of Great Britain 1936"), "Ordnance_Survey_of_Great_Britain_1936");
        assert_eq!(datum_name_from_wkt1("WGS_1984"), Some("World Geodetic System 1984"));
        assert!(ellipsoid_by_parameters(6378137.0, 298.257222101).is_some_and(|e| e.proj_name == "GRS80"));
    }

    #[test]
    fn test_units_and_meridians() {
        assert_eq!(linear_unit_by_proj_name("us-ft"), Some(UnitOfMeasure::us_survey_foot()));
        assert_eq!(linear_unit_proj_name(&UnitOfMeasure::metre()), Some("m"));
        assert_eq!(prime_meridian_proj_name(2.33722916666667), Some("paris"));
        assert_eq!(prime_meridian_by_proj_name("greenwich"), Some(("Greenwich", 0.0)));
    }
}
