//! Coordinate systems and axes.

use super::common::{names_match, UnitKind, UnitOfMeasure};

/// Direction of a coordinate system axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    North,
    South,
    East,
    West,
    Up,
    Down,
    GeocentricX,
    GeocentricY,
    GeocentricZ,
    Other,
}

impl AxisDirection {
    /// Parse a direction keyword, accepting both WKT1 and WKT2 spellings.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "north" => Some(AxisDirection::North),
            "south" => Some(AxisDirection::South),
            "east" => Some(AxisDirection::East),
            "west" => Some(AxisDirection::West),
            "up" => Some(AxisDirection::Up),
            "down" => Some(AxisDirection::Down),
            "geocentricx" => Some(AxisDirection::GeocentricX),
            "geocentricy" => Some(AxisDirection::GeocentricY),
            "geocentricz" => Some(AxisDirection::GeocentricZ),
            "other" => Some(AxisDirection::Other),
            _ => None,
        }
    }

    pub fn wkt2_name(&self) -> &'static str {
        match self {
            AxisDirection::North => "north",
            AxisDirection::South => "south",
            AxisDirection::East => "east",
            AxisDirection::West => "west",
            AxisDirection::Up => "up",
            AxisDirection::Down => "down",
            AxisDirection::GeocentricX => "geocentricX",
            AxisDirection::GeocentricY => "geocentricY",
            AxisDirection::GeocentricZ => "geocentricZ",
            AxisDirection::Other => "unspecified",
        }
    }

    /// WKT1 only knows compass directions; geocentric axes follow the GDAL
    /// convention `OTHER`, `EAST`, `NORTH`.
    pub fn wkt1_name(&self) -> &'static str {
        match self {
            AxisDirection::North | AxisDirection::GeocentricZ => "NORTH",
            AxisDirection::South => "SOUTH",
            AxisDirection::East | AxisDirection::GeocentricY => "EAST",
            AxisDirection::West => "WEST",
            AxisDirection::Up => "UP",
            AxisDirection::Down => "DOWN",
            AxisDirection::GeocentricX | AxisDirection::Other => "OTHER",
        }
    }
}

/// A coordinate system axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub abbreviation: String,
    pub direction: AxisDirection,
    pub unit: UnitOfMeasure,
}

impl Axis {
    pub fn new(name: &str, abbreviation: &str, direction: AxisDirection, unit: UnitOfMeasure) -> Self {
        Self {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            direction,
            unit,
        }
    }

    pub fn is_equivalent_to(&self, other: &Axis) -> bool {
        self.direction == other.direction
            && self.unit.is_equivalent_to(&other.unit)
            && (names_match(&self.name, &other.name)
                || self.name.is_empty()
                || other.name.is_empty())
    }
}

/// Name given to an axis that only carries an abbreviation.
pub fn default_axis_name(abbreviation: &str, direction: AxisDirection) -> String {
    match (abbreviation, direction) {
        ("E", _) | ("X", AxisDirection::East) => "Easting".to_string(),
        ("N", _) | ("Y", AxisDirection::North) => "Northing".to_string(),
        ("Lat", _) => "Geodetic latitude".to_string(),
        ("Lon", _) | ("Long", _) => "Geodetic longitude".to_string(),
        ("h", _) => "Ellipsoidal height".to_string(),
        ("H", _) => "Gravity-related height".to_string(),
        (_, AxisDirection::GeocentricX) => "Geocentric X".to_string(),
        (_, AxisDirection::GeocentricY) => "Geocentric Y".to_string(),
        (_, AxisDirection::GeocentricZ) => "Geocentric Z".to_string(),
        (abbrev, _) => abbrev.to_string(),
    }
}

/// Kind of coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsKind {
    Ellipsoidal,
    Cartesian,
    Vertical,
}

impl CsKind {
    pub fn wkt_name(&self) -> &'static str {
        match self {
            CsKind::Ellipsoidal => "ellipsoidal",
            CsKind::Cartesian => "Cartesian",
            CsKind::Vertical => "vertical",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "ellipsoidal" => Some(CsKind::Ellipsoidal),
            "cartesian" => Some(CsKind::Cartesian),
            "vertical" => Some(CsKind::Vertical),
            _ => None,
        }
    }
}

/// An ordered set of axes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSystem {
    pub kind: CsKind,
    pub axes: Vec<Axis>,
}

impl CoordinateSystem {
    pub fn new(kind: CsKind, axes: Vec<Axis>) -> Self {
        Self { kind, axes }
    }

    /// Latitude, longitude ellipsoidal CS.
    pub fn ellipsoidal_lat_lon(unit: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Ellipsoidal,
            vec![
                Axis::new("Geodetic latitude", "Lat", AxisDirection::North, unit.clone()),
                Axis::new("Geodetic longitude", "Lon", AxisDirection::East, unit),
            ],
        )
    }

    /// Longitude, latitude ellipsoidal CS, the traditional GIS order.
    pub fn ellipsoidal_lon_lat(unit: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Ellipsoidal,
            vec![
                Axis::new("Geodetic longitude", "Lon", AxisDirection::East, unit.clone()),
                Axis::new("Geodetic latitude", "Lat", AxisDirection::North, unit),
            ],
        )
    }

    /// Latitude, longitude, ellipsoidal height CS.
    pub fn ellipsoidal_lat_lon_height(angular: UnitOfMeasure, linear: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Ellipsoidal,
            vec![
                Axis::new("Geodetic latitude", "Lat", AxisDirection::North, angular.clone()),
                Axis::new("Geodetic longitude", "Lon", AxisDirection::East, angular),
                Axis::new("Ellipsoidal height", "h", AxisDirection::Up, linear),
            ],
        )
    }

    pub fn easting_northing(unit: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Cartesian,
            vec![
                Axis::new("Easting", "E", AxisDirection::East, unit.clone()),
                Axis::new("Northing", "N", AxisDirection::North, unit),
            ],
        )
    }

    pub fn geocentric(unit: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Cartesian,
            vec![
                Axis::new("Geocentric X", "X", AxisDirection::GeocentricX, unit.clone()),
                Axis::new("Geocentric Y", "Y", AxisDirection::GeocentricY, unit.clone()),
                Axis::new("Geocentric Z", "Z", AxisDirection::GeocentricZ, unit),
            ],
        )
    }

    pub fn gravity_related_height(unit: UnitOfMeasure) -> Self {
        Self::new(
            CsKind::Vertical,
            vec![Axis::new("Gravity-related height", "H", AxisDirection::Up, unit)],
        )
    }

    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// The unit shared by every axis, if they all agree.
    pub fn common_unit(&self) -> Option<&UnitOfMeasure> {
        let first = &self.axes.first()?.unit;
        self.axes
            .iter()
            .all(|axis| axis.unit == *first)
            .then_some(first)
    }

    /// Unit of the first angular axis.
    pub fn angular_unit(&self) -> Option<&UnitOfMeasure> {
        self.axes
            .iter()
            .map(|axis| &axis.unit)
            .find(|unit| unit.kind == UnitKind::Angular)
    }

    /// Unit of the first linear axis.
    pub fn linear_unit(&self) -> Option<&UnitOfMeasure> {
        self.axes
            .iter()
            .map(|axis| &axis.unit)
            .find(|unit| unit.kind == UnitKind::Linear)
    }

    /// True when the first axis points north (latitude or northing first).
    pub fn is_north_first(&self) -> bool {
        self.axes
            .first()
            .map(|axis| axis.direction == AxisDirection::North)
            .unwrap_or(false)
    }

    /// Same CS with the first two axes swapped.
    pub fn with_swapped_horizontal_axes(&self) -> Self {
        let mut axes = self.axes.clone();
        if axes.len() >= 2 {
            axes.swap(0, 1);
        }
        Self::new(self.kind, axes)
    }

    pub fn is_equivalent_to(&self, other: &CoordinateSystem) -> bool {
        self.kind == other.kind
            && self.axes.len() == other.axes.len()
            && self
                .axes
                .iter()
                .zip(&other.axes)
                .all(|(a, b)| a.is_equivalent_to(b))
    }
}
