//! Prime meridians, ellipsoids and datums.

use super::common::{names_match, numbers_match, Identifier, UnitOfMeasure};

/// Origin of longitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimeMeridian {
    pub name: String,
    /// Longitude from Greenwich, expressed in `unit`
    pub longitude: f64,
    pub unit: UnitOfMeasure,
    pub ids: Vec<Identifier>,
}

impl PrimeMeridian {
    pub fn greenwich() -> Self {
        Self {
            name: "Greenwich".to_string(),
            longitude: 0.0,
            unit: UnitOfMeasure::degree(),
            ids: vec![Identifier::new("EPSG", "8901")],
        }
    }

    pub fn is_greenwich(&self) -> bool {
        self.longitude == 0.0
    }

    /// Longitude converted to degrees.
    pub fn longitude_in_degrees(&self) -> f64 {
        self.unit.convert(self.longitude, &UnitOfMeasure::degree())
    }

    pub fn is_equivalent_to(&self, other: &PrimeMeridian) -> bool {
        numbers_match(self.longitude_in_degrees(), other.longitude_in_degrees())
    }
}

/// Reference ellipsoid. An inverse flattening of zero denotes a sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub name: String,
    pub semi_major_axis: f64,
    pub inverse_flattening: f64,
    /// Unit of the semi-major axis
    pub unit: UnitOfMeasure,
    pub ids: Vec<Identifier>,
}

impl Ellipsoid {
    pub fn new(name: &str, semi_major_axis: f64, inverse_flattening: f64) -> Self {
        Self {
            name: name.to_string(),
            semi_major_axis,
            inverse_flattening,
            unit: UnitOfMeasure::metre(),
            ids: Vec::new(),
        }
    }

    pub fn wgs84() -> Self {
        Self {
            ids: vec![Identifier::new("EPSG", "7030")],
            ..Self::new("WGS 84", 6378137.0, 298.257223563)
        }
    }

    pub fn grs1980() -> Self {
        Self {
            ids: vec![Identifier::new("EPSG", "7019")],
            ..Self::new("GRS 1980", 6378137.0, 298.257222101)
        }
    }

    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening == 0.0
    }

    pub fn semi_major_axis_in_metres(&self) -> f64 {
        self.unit.convert(self.semi_major_axis, &UnitOfMeasure::metre())
    }

    /// Equivalence on the defining parameters only.
    pub fn is_equivalent_to(&self, other: &Ellipsoid) -> bool {
        numbers_match(
            self.semi_major_axis_in_metres(),
            other.semi_major_axis_in_metres(),
        ) && numbers_match(self.inverse_flattening, other.inverse_flattening)
    }
}

/// Horizontal datum.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodeticReferenceFrame {
    pub name: String,
    pub ellipsoid: Ellipsoid,
    pub prime_meridian: PrimeMeridian,
    pub anchor: Option<String>,
    pub ids: Vec<Identifier>,
}

impl GeodeticReferenceFrame {
    pub fn wgs84() -> Self {
        Self {
            name: "World Geodetic System 1984".to_string(),
            ellipsoid: Ellipsoid::wgs84(),
            prime_meridian: PrimeMeridian::greenwich(),
            anchor: None,
            ids: vec![Identifier::new("EPSG", "6326")],
        }
    }

    pub fn is_equivalent_to(&self, other: &GeodeticReferenceFrame) -> bool {
        names_match(&self.name, &other.name)
            && self.ellipsoid.is_equivalent_to(&other.ellipsoid)
            && self.prime_meridian.is_equivalent_to(&other.prime_meridian)
    }
}

/// Vertical datum.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalReferenceFrame {
    pub name: String,
    pub anchor: Option<String>,
    pub ids: Vec<Identifier>,
}

impl VerticalReferenceFrame {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            anchor: None,
            ids: Vec::new(),
        }
    }

    pub fn is_equivalent_to(&self, other: &VerticalReferenceFrame) -> bool {
        names_match(&self.name, &other.name)
    }
}

/// Any datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Geodetic(GeodeticReferenceFrame),
    Vertical(VerticalReferenceFrame),
}

impl Datum {
    pub fn name(&self) -> &str {
        match self {
            Datum::Geodetic(d) => &d.name,
            Datum::Vertical(d) => &d.name,
        }
    }

    pub fn ids(&self) -> &[Identifier] {
        match self {
            Datum::Geodetic(d) => &d.ids,
            Datum::Vertical(d) => &d.ids,
        }
    }

    pub fn is_equivalent_to(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Geodetic(a), Datum::Geodetic(b)) => a.is_equivalent_to(b),
            (Datum::Vertical(a), Datum::Vertical(b)) => a.is_equivalent_to(b),
            _ => false,
        }
    }
}
