//! Categories of registered objects.

use std::fmt;

use super::TRANSFORMATION_TABLES;
use crate::database::{str_col, Row};

/// Category of objects, used to enumerate codes and to restrict name
/// searches. Some categories are refinements of a table (geographic CRSs
/// are rows of `geodetic_crs` with a geographic type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    UnitOfMeasure,
    Extent,
    PrimeMeridian,
    Ellipsoid,
    Datum,
    GeodeticReferenceFrame,
    VerticalReferenceFrame,
    CoordinateSystem,
    Crs,
    GeodeticCrs,
    GeocentricCrs,
    GeographicCrs,
    Geographic2dCrs,
    Geographic3dCrs,
    ProjectedCrs,
    VerticalCrs,
    CompoundCrs,
    CoordinateOperation,
    Conversion,
    Transformation,
    ConcatenatedOperation,
}

impl ObjectType {
    /// Every category, in the order used when no restriction is given.
    pub fn all() -> &'static [ObjectType] {
        &[
            ObjectType::Crs,
            ObjectType::CoordinateOperation,
            ObjectType::Datum,
            ObjectType::Ellipsoid,
            ObjectType::PrimeMeridian,
            ObjectType::CoordinateSystem,
            ObjectType::UnitOfMeasure,
            ObjectType::Extent,
        ]
    }

    /// Tables holding objects of this category.
    pub fn tables(&self) -> &'static [&'static str] {
        match self {
            ObjectType::UnitOfMeasure => &["unit_of_measure"],
            ObjectType::Extent => &["extent"],
            ObjectType::PrimeMeridian => &["prime_meridian"],
            ObjectType::Ellipsoid => &["ellipsoid"],
            ObjectType::Datum => &["geodetic_datum", "vertical_datum"],
            ObjectType::GeodeticReferenceFrame => &["geodetic_datum"],
            ObjectType::VerticalReferenceFrame => &["vertical_datum"],
            ObjectType::CoordinateSystem => &["coordinate_system"],
            ObjectType::Crs => &["geodetic_crs", "projected_crs", "vertical_crs", "compound_crs"],
            ObjectType::GeodeticCrs
            | ObjectType::GeocentricCrs
            | ObjectType::GeographicCrs
            | ObjectType::Geographic2dCrs
            | ObjectType::Geographic3dCrs => &["geodetic_crs"],
            ObjectType::ProjectedCrs => &["projected_crs"],
            ObjectType::VerticalCrs => &["vertical_crs"],
            ObjectType::CompoundCrs => &["compound_crs"],
            ObjectType::CoordinateOperation => &[
                "conversion",
                "helmert_transformation",
                "grid_transformation",
                "other_transformation",
                "concatenated_operation",
            ],
            ObjectType::Conversion => &["conversion"],
            ObjectType::Transformation => TRANSFORMATION_TABLES,
            ObjectType::ConcatenatedOperation => &["concatenated_operation"],
        }
    }

    /// Values of the `type` column of `geodetic_crs` accepted by this
    /// category, `None` when every row of its tables is accepted.
    fn geodetic_crs_types(&self) -> Option<&'static [&'static str]> {
        match self {
            ObjectType::GeocentricCrs => Some(&["geocentric"]),
            ObjectType::GeographicCrs => Some(&["geographic 2D", "geographic 3D"]),
            ObjectType::Geographic2dCrs => Some(&["geographic 2D"]),
            ObjectType::Geographic3dCrs => Some(&["geographic 3D"]),
            _ => None,
        }
    }

    /// True when `row` of `table` belongs to this category.
    pub(crate) fn accepts(&self, table: &str, row: &Row) -> bool {
        if !self.tables().contains(&table) {
            return false;
        }
        match self.geodetic_crs_types() {
            Some(types) => str_col(row, "type").is_some_and(|t| types.contains(&t)),
            None => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::UnitOfMeasure => "unit_of_measure",
            ObjectType::Extent => "extent",
            ObjectType::PrimeMeridian => "prime_meridian",
            ObjectType::Ellipsoid => "ellipsoid",
            ObjectType::Datum => "datum",
            ObjectType::GeodeticReferenceFrame => "geodetic_reference_frame",
            ObjectType::VerticalReferenceFrame => "vertical_reference_frame",
            ObjectType::CoordinateSystem => "coordinate_system",
            ObjectType::Crs => "crs",
            ObjectType::GeodeticCrs => "geodetic_crs",
            ObjectType::GeocentricCrs => "geocentric_crs",
            ObjectType::GeographicCrs => "geographic_crs",
            ObjectType::Geographic2dCrs => "geographic_2d_crs",
            ObjectType::Geographic3dCrs => "geographic_3d_crs",
            ObjectType::ProjectedCrs => "projected_crs",
            ObjectType::VerticalCrs => "vertical_crs",
            ObjectType::CompoundCrs => "compound_crs",
            ObjectType::CoordinateOperation => "coordinate_operation",
            ObjectType::Conversion => "conversion",
            ObjectType::Transformation => "transformation",
            ObjectType::ConcatenatedOperation => "concatenated_operation",
        }
    }

    /// Parse the name returned by [`as_str`](Self::as_str), ignoring case
    /// and accepting `-` for `_`.
    pub fn parse(text: &str) -> Option<Self> {
        let wanted = text.trim().to_ascii_lowercase().replace('-', "_");
        ObjectType::variants()
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
    }

    pub fn variants() -> &'static [ObjectType] {
        &[
            ObjectType::UnitOfMeasure,
            ObjectType::Extent,
            ObjectType::PrimeMeridian,
            ObjectType::Ellipsoid,
            ObjectType::Datum,
            ObjectType::GeodeticReferenceFrame,
            ObjectType::VerticalReferenceFrame,
            ObjectType::CoordinateSystem,
            ObjectType::Crs,
            ObjectType::GeodeticCrs,
            ObjectType::GeocentricCrs,
            ObjectType::GeographicCrs,
            ObjectType::Geographic2dCrs,
            ObjectType::Geographic3dCrs,
            ObjectType::ProjectedCrs,
            ObjectType::VerticalCrs,
            ObjectType::CompoundCrs,
            ObjectType::CoordinateOperation,
            ObjectType::Conversion,
            ObjectType::Transformation,
            ObjectType::ConcatenatedOperation,
        ]
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_geographic_refinement() {
        let geographic = row(json!({"type": "geographic 2D"}));
        let geocentric = row(json!({"type": "geocentric"}));
        assert!(ObjectType::GeographicCrs.accepts("geodetic_crs", &geographic));
        assert!(!ObjectType::GeographicCrs.accepts("geodetic_crs", &geocentric));
        assert!(ObjectType::GeocentricCrs.accepts("geodetic_crs", &geocentric));
        assert!(ObjectType::Crs.accepts("geodetic_crs", &geocentric));
        assert!(!ObjectType::Geographic3dCrs.accepts("geodetic_crs", &geographic));
        assert!(!ObjectType::ProjectedCrs.accepts("geodetic_crs", &geographic));
    }

    #[test]
    fn test_transformation_tables_are_shared() {
        assert_eq!(ObjectType::Transformation.tables(), TRANSFORMATION_TABLES);
        let operations = ObjectType::CoordinateOperation.tables();
        assert!(TRANSFORMATION_TABLES.iter().all(|t| operations.contains(t)));
        let transformation = row(json!({"code": "1149"}));
        for table in TRANSFORMATION_TABLES {
            assert!(ObjectType::Transformation.accepts(table, &transformation));
        }
        assert!(!ObjectType::Transformation.accepts("conversion", &transformation));
    }

    #[test]
    fn test_parse_round_trip() {
        for t in ObjectType::variants() {
            assert_eq!(ObjectType::parse(t.as_str()), Some(*t));
        }
        assert_eq!(ObjectType::parse("Projected-CRS"), Some(ObjectType::ProjectedCrs));
        assert_eq!(ObjectType::parse("nothing"), None);
    }
}
