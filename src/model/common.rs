//! Identifiers, units of measure and extents shared by every object kind.

use std::fmt;

/// Relative tolerance used when comparing defining numeric values.
const RELATIVE_TOLERANCE: f64 = 1e-10;

/// Compare two defining numeric values with a relative tolerance.
pub(crate) fn numbers_match(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= RELATIVE_TOLERANCE * scale
}

/// Reduce a name to its lowercase alphanumeric characters.
///
/// Two names that canonicalize to the same string designate the same object
/// for matching purposes: `"WGS_1984"`, `"WGS 1984"` and `"wgs-1984"` all
/// become `"wgs1984"`.
pub fn canonicalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two object names after canonicalization.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a == b || canonicalize_name(a) == canonicalize_name(b)
}

/// An (authority, code) pair identifying a registered object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    /// Authority name, e.g. `EPSG`
    pub authority: String,
    /// Code within the authority. Codes are opaque strings.
    pub code: String,
    /// Optional version of the registry the code refers to
    pub version: Option<String>,
}

impl Identifier {
    /// Create an identifier without version.
    pub fn new(authority: &str, code: &str) -> Self {
        Self {
            authority: authority.to_string(),
            code: code.to_string(),
            version: None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Physical quantity measured by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Linear,
    Angular,
    Scale,
    Time,
    Parametric,
    None,
}

impl UnitKind {
    /// Parse the unit type names used by the metadata repository.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "length" | "linear" => Some(UnitKind::Linear),
            "angle" | "angular" => Some(UnitKind::Angular),
            "scale" => Some(UnitKind::Scale),
            "time" => Some(UnitKind::Time),
            "parametric" => Some(UnitKind::Parametric),
            "none" => Some(UnitKind::None),
            _ => None,
        }
    }
}

/// A unit of measure with its conversion factor to the SI base unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOfMeasure {
    pub name: String,
    /// Factor converting a value in this unit to metres, radians, unity or seconds
    pub conversion_to_si: f64,
    pub kind: UnitKind,
    pub id: Option<Identifier>,
}

impl UnitOfMeasure {
    /// Create a unit without identifier.
    pub fn new(name: &str, conversion_to_si: f64, kind: UnitKind) -> Self {
        Self {
            name: name.to_string(),
            conversion_to_si,
            kind,
            id: None,
        }
    }

    fn epsg(name: &str, conversion_to_si: f64, kind: UnitKind, code: &str) -> Self {
        Self {
            id: Some(Identifier::new("EPSG", code)),
            ..Self::new(name, conversion_to_si, kind)
        }
    }

    pub fn metre() -> Self {
        Self::epsg("metre", 1.0, UnitKind::Linear, "9001")
    }

    pub fn degree() -> Self {
        Self::epsg(
            "degree",
            std::f64::consts::PI / 180.0,
            UnitKind::Angular,
            "9122",
        )
    }

    pub fn radian() -> Self {
        Self::epsg("radian", 1.0, UnitKind::Angular, "9101")
    }

    pub fn arc_second() -> Self {
        Self::epsg(
            "arc-second",
            std::f64::consts::PI / 180.0 / 3600.0,
            UnitKind::Angular,
            "9104",
        )
    }

    pub fn unity() -> Self {
        Self::epsg("unity", 1.0, UnitKind::Scale, "9201")
    }

    pub fn parts_per_million() -> Self {
        Self::epsg("parts per million", 1e-6, UnitKind::Scale, "9202")
    }

    pub fn us_survey_foot() -> Self {
        Self::epsg(
            "US survey foot",
            0.304_800_609_601_219_2,
            UnitKind::Linear,
            "9003",
        )
    }

    /// Convert `value` expressed in this unit into `other`.
    pub fn convert(&self, value: f64, other: &UnitOfMeasure) -> f64 {
        if self.is_equivalent_to(other) || other.conversion_to_si == 0.0 {
            return value;
        }
        value * self.conversion_to_si / other.conversion_to_si
    }

    /// Two units are equivalent when they measure the same quantity with the
    /// same conversion factor, whatever their names.
    pub fn is_equivalent_to(&self, other: &UnitOfMeasure) -> bool {
        self.kind == other.kind && numbers_match(self.conversion_to_si, other.conversion_to_si)
    }
}

/// A geographic bounding box in degrees.
///
/// `west > east` denotes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicBoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicBoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Area in square degrees, used to rank areas of use.
    pub fn area(&self) -> f64 {
        let width = if self.west <= self.east {
            self.east - self.west
        } else {
            self.east - self.west + 360.0
        };
        width * (self.north - self.south).max(0.0)
    }
}

/// Area of use of an object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extent {
    pub description: Option<String>,
    pub bbox: Option<GeographicBoundingBox>,
    pub ids: Vec<Identifier>,
}

impl Extent {
    /// Area in square degrees, zero when no bounding box is known.
    pub fn area(&self) -> f64 {
        self.bbox.map(|b| b.area()).unwrap_or(0.0)
    }
}

/// Scope and area of use attached to a CRS or operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Usage {
    pub scope: Option<String>,
    pub extent: Option<Extent>,
}

impl Usage {
    pub fn is_empty(&self) -> bool {
        self.scope.is_none() && self.extent.is_none()
    }
}
