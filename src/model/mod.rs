//! # Domain Object Model
//!
//! The typed object graph that WKT and pipeline strings are parsed into and
//! formatted from. Every object kind is a closed enum variant, so the
//! formatters dispatch with exhaustive `match` expressions.
//!
//! ## Key Components
//!
//! - **`common`**: identifiers, units of measure, extents and usages.
//! - **`datum`**: prime meridians, ellipsoids, geodetic and vertical datums.
//! - **`cs`**: axes and coordinate systems.
//! - **`crs`**: geodetic, projected, vertical and compound CRSs.
//! - **`operation`**: conversions, transformations, concatenated operations
//!   and operations only known through a pipeline string.
//! - **`Object`**: the union of everything the parsers and the authority
//!   factory can return.
//!
//! ## Equivalence
//!
//! `is_equivalent_to` compares defining fields only: names (after
//! canonicalization), numeric values with a relative tolerance, units and
//! axis directions. Identifiers, usages and remarks are ignored.

pub mod common;
pub mod crs;
pub mod cs;
pub mod datum;
pub mod operation;

pub use common::{
    canonicalize_name, Extent, GeographicBoundingBox, Identifier, UnitKind, UnitOfMeasure, Usage,
};
pub use crs::{CompoundCrs, Crs, GeodeticCrs, ProjectedCrs, VerticalCrs};
pub use cs::{Axis, AxisDirection, CoordinateSystem, CsKind};
pub use datum::{Datum, Ellipsoid, GeodeticReferenceFrame, PrimeMeridian, VerticalReferenceFrame};
pub use operation::{
    ConcatenatedOperation, Conversion, CoordinateOperation, OperationMethod, OperationParameter,
    ParameterValue, ProjBasedOperation, Transformation,
};

pub(crate) use common::{names_match, numbers_match};

/// Any object produced by the parsers or the authority factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Unit(UnitOfMeasure),
    PrimeMeridian(PrimeMeridian),
    Ellipsoid(Ellipsoid),
    Datum(Datum),
    CoordinateSystem(CoordinateSystem),
    Crs(Crs),
    CoordinateOperation(CoordinateOperation),
    Extent(Extent),
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Object::Unit(u) => &u.name,
            Object::PrimeMeridian(pm) => &pm.name,
            Object::Ellipsoid(e) => &e.name,
            Object::Datum(d) => d.name(),
            Object::CoordinateSystem(cs) => cs.kind.wkt_name(),
            Object::Crs(crs) => crs.name(),
            Object::CoordinateOperation(op) => op.name(),
            Object::Extent(e) => e.description.as_deref().unwrap_or(""),
        }
    }

    pub fn ids(&self) -> Vec<Identifier> {
        match self {
            Object::Unit(u) => u.id.iter().cloned().collect(),
            Object::PrimeMeridian(pm) => pm.ids.clone(),
            Object::Ellipsoid(e) => e.ids.clone(),
            Object::Datum(d) => d.ids().to_vec(),
            Object::CoordinateSystem(_) => Vec::new(),
            Object::Crs(crs) => crs.ids().to_vec(),
            Object::CoordinateOperation(op) => op.ids().to_vec(),
            Object::Extent(e) => e.ids.clone(),
        }
    }

    /// Human readable kind, used in error messages and CLI output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Unit(_) => "unit of measure",
            Object::PrimeMeridian(_) => "prime meridian",
            Object::Ellipsoid(_) => "ellipsoid",
            Object::Datum(Datum::Geodetic(_)) => "geodetic datum",
            Object::Datum(Datum::Vertical(_)) => "vertical datum",
            Object::CoordinateSystem(_) => "coordinate system",
            Object::Crs(crs) => crs.kind_name(),
            Object::CoordinateOperation(CoordinateOperation::Conversion(_)) => "conversion",
            Object::CoordinateOperation(CoordinateOperation::Transformation(_)) => "transformation",
            Object::CoordinateOperation(CoordinateOperation::Concatenated(_)) => {
                "concatenated operation"
            }
            Object::CoordinateOperation(CoordinateOperation::ProjBased(_)) => "PROJ-based operation",
            Object::Extent(_) => "extent",
        }
    }

    pub fn as_crs(&self) -> Option<&Crs> {
        match self {
            Object::Crs(crs) => Some(crs),
            _ => None,
        }
    }

    pub fn into_crs(self) -> Option<Crs> {
        match self {
            Object::Crs(crs) => Some(crs),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&CoordinateOperation> {
        match self {
            Object::CoordinateOperation(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_equivalent_to(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Unit(a), Object::Unit(b)) => a.is_equivalent_to(b),
            (Object::PrimeMeridian(a), Object::PrimeMeridian(b)) => a.is_equivalent_to(b),
            (Object::Ellipsoid(a), Object::Ellipsoid(b)) => a.is_equivalent_to(b),
            (Object::Datum(a), Object::Datum(b)) => a.is_equivalent_to(b),
            (Object::CoordinateSystem(a), Object::CoordinateSystem(b)) => a.is_equivalent_to(b),
            (Object::Crs(a), Object::Crs(b)) => a.is_equivalent_to(b),
            (Object::CoordinateOperation(a), Object::CoordinateOperation(b)) => {
                a.is_equivalent_to(b)
            }
            (Object::Extent(a), Object::Extent(b)) => a.bbox == b.bbox,
            _ => false,
        }
    }
}

impl From<Crs> for Object {
    fn from(crs: Crs) -> Self {
        Object::Crs(crs)
    }
}

impl From<CoordinateOperation> for Object {
    fn from(op: CoordinateOperation) -> Self {
        Object::CoordinateOperation(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_names() {
        let crs = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        assert_eq!(crs.kind_name(), "geographic CRS");
        assert_eq!(crs.name(), "WGS 84");
        assert_eq!(crs.ids(), vec![Identifier::new("EPSG", "4326")]);
        assert!(crs.as_crs().is_some());
        assert!(crs.as_operation().is_none());

        let unit = Object::Unit(UnitOfMeasure::metre());
        assert_eq!(unit.kind_name(), "unit of measure");
        assert_eq!(unit.ids(), vec![Identifier::new("EPSG", "9001")]);
    }

    #[test]
    fn test_object_equivalence_requires_same_kind() {
        let ellipsoid = Object::Ellipsoid(Ellipsoid::wgs84());
        let datum = Object::Datum(Datum::Geodetic(GeodeticReferenceFrame::wgs84()));
        assert!(!ellipsoid.is_equivalent_to(&datum));
        assert!(ellipsoid.is_equivalent_to(&ellipsoid.clone()));
    }
}
