//! Coordinate reference systems.

use super::common::{names_match, Identifier, Usage};
use super::cs::{AxisDirection, CoordinateSystem, CsKind};
use super::datum::{GeodeticReferenceFrame, VerticalReferenceFrame};
use super::operation::Conversion;

/// Geographic (ellipsoidal CS) or geocentric (3D Cartesian CS) CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodeticCrs {
    pub name: String,
    pub datum: GeodeticReferenceFrame,
    pub cs: CoordinateSystem,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub remarks: Option<String>,
}

impl GeodeticCrs {
    pub fn new(name: &str, datum: GeodeticReferenceFrame, cs: CoordinateSystem) -> Self {
        Self {
            name: name.to_string(),
            datum,
            cs,
            ids: Vec::new(),
            usage: Usage::default(),
            remarks: None,
        }
    }

    /// EPSG:4326, latitude first.
    pub fn epsg_4326() -> Self {
        Self {
            ids: vec![Identifier::new("EPSG", "4326")],
            ..Self::new(
                "WGS 84",
                GeodeticReferenceFrame::wgs84(),
                CoordinateSystem::ellipsoidal_lat_lon(super::UnitOfMeasure::degree()),
            )
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.cs.kind == CsKind::Ellipsoidal
    }

    pub fn is_geocentric(&self) -> bool {
        self.cs.kind == CsKind::Cartesian && self.cs.dimension() == 3
    }

    /// Same CRS with longitude before latitude, the order traditional GIS
    /// software expects.
    pub fn normalized_for_visualization(&self) -> Self {
        let mut out = self.clone();
        if self.is_geographic() && self.cs.is_north_first() {
            out.cs = self.cs.with_swapped_horizontal_axes();
        }
        out
    }

    pub fn is_equivalent_to(&self, other: &GeodeticCrs) -> bool {
        names_match(&self.name, &other.name)
            && self.datum.is_equivalent_to(&other.datum)
            && self.cs.is_equivalent_to(&other.cs)
    }
}

/// A CRS derived from a geographic CRS through a map projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCrs {
    pub name: String,
    pub base: GeodeticCrs,
    pub conversion: Conversion,
    pub cs: CoordinateSystem,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub remarks: Option<String>,
}

impl ProjectedCrs {
    pub fn new(name: &str, base: GeodeticCrs, conversion: Conversion, cs: CoordinateSystem) -> Self {
        Self {
            name: name.to_string(),
            base,
            conversion,
            cs,
            ids: Vec::new(),
            usage: Usage::default(),
            remarks: None,
        }
    }

    /// Same CRS with easting before northing and a lon/lat base CRS.
    pub fn normalized_for_visualization(&self) -> Self {
        let mut out = self.clone();
        out.base = self.base.normalized_for_visualization();
        if self.cs.is_north_first() {
            out.cs = self.cs.with_swapped_horizontal_axes();
        }
        out
    }

    pub fn is_equivalent_to(&self, other: &ProjectedCrs) -> bool {
        names_match(&self.name, &other.name)
            && self.base.datum.is_equivalent_to(&other.base.datum)
            && self.conversion.is_equivalent_to(&other.conversion)
            && self.cs.is_equivalent_to(&other.cs)
    }
}

/// Gravity-related height or depth CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalCrs {
    pub name: String,
    pub datum: VerticalReferenceFrame,
    pub cs: CoordinateSystem,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub remarks: Option<String>,
}

impl VerticalCrs {
    pub fn new(name: &str, datum: VerticalReferenceFrame, cs: CoordinateSystem) -> Self {
        Self {
            name: name.to_string(),
            datum,
            cs,
            ids: Vec::new(),
            usage: Usage::default(),
            remarks: None,
        }
    }

    pub fn is_depth(&self) -> bool {
        self.cs
            .axes
            .first()
            .map(|axis| axis.direction == AxisDirection::Down)
            .unwrap_or(false)
    }

    pub fn is_equivalent_to(&self, other: &VerticalCrs) -> bool {
        names_match(&self.name, &other.name)
            && self.datum.is_equivalent_to(&other.datum)
            && self.cs.is_equivalent_to(&other.cs)
    }
}

/// Ordered combination of non-repeating component CRSs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundCrs {
    pub name: String,
    pub components: Vec<Crs>,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub remarks: Option<String>,
}

impl CompoundCrs {
    pub fn new(name: &str, components: Vec<Crs>) -> Self {
        Self {
            name: name.to_string(),
            components,
            ids: Vec::new(),
            usage: Usage::default(),
            remarks: None,
        }
    }

    pub fn is_equivalent_to(&self, other: &CompoundCrs) -> bool {
        names_match(&self.name, &other.name)
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.is_equivalent_to(b))
    }
}

/// Any coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    Geodetic(GeodeticCrs),
    Projected(ProjectedCrs),
    Vertical(VerticalCrs),
    Compound(CompoundCrs),
}

impl Crs {
    pub fn name(&self) -> &str {
        match self {
            Crs::Geodetic(c) => &c.name,
            Crs::Projected(c) => &c.name,
            Crs::Vertical(c) => &c.name,
            Crs::Compound(c) => &c.name,
        }
    }

    pub fn ids(&self) -> &[Identifier] {
        match self {
            Crs::Geodetic(c) => &c.ids,
            Crs::Projected(c) => &c.ids,
            Crs::Vertical(c) => &c.ids,
            Crs::Compound(c) => &c.ids,
        }
    }

    pub fn ids_mut(&mut self) -> &mut Vec<Identifier> {
        match self {
            Crs::Geodetic(c) => &mut c.ids,
            Crs::Projected(c) => &mut c.ids,
            Crs::Vertical(c) => &mut c.ids,
            Crs::Compound(c) => &mut c.ids,
        }
    }

    pub fn usage(&self) -> &Usage {
        match self {
            Crs::Geodetic(c) => &c.usage,
            Crs::Projected(c) => &c.usage,
            Crs::Vertical(c) => &c.usage,
            Crs::Compound(c) => &c.usage,
        }
    }

    pub fn usage_mut(&mut self) -> &mut Usage {
        match self {
            Crs::Geodetic(c) => &mut c.usage,
            Crs::Projected(c) => &mut c.usage,
            Crs::Vertical(c) => &mut c.usage,
            Crs::Compound(c) => &mut c.usage,
        }
    }

    pub fn remarks(&self) -> Option<&str> {
        match self {
            Crs::Geodetic(c) => c.remarks.as_deref(),
            Crs::Projected(c) => c.remarks.as_deref(),
            Crs::Vertical(c) => c.remarks.as_deref(),
            Crs::Compound(c) => c.remarks.as_deref(),
        }
    }

    /// Human readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Crs::Geodetic(c) if c.is_geocentric() => "geocentric CRS",
            Crs::Geodetic(c) if c.is_geographic() => "geographic CRS",
            Crs::Geodetic(_) => "geodetic CRS",
            Crs::Projected(_) => "projected CRS",
            Crs::Vertical(_) => "vertical CRS",
            Crs::Compound(_) => "compound CRS",
        }
    }

    /// The geodetic CRS underlying this CRS, if any.
    pub fn geodetic(&self) -> Option<&GeodeticCrs> {
        match self {
            Crs::Geodetic(c) => Some(c),
            Crs::Projected(c) => Some(&c.base),
            Crs::Vertical(_) => None,
            Crs::Compound(c) => c.components.iter().find_map(Crs::geodetic),
        }
    }

    pub fn normalized_for_visualization(&self) -> Crs {
        match self {
            Crs::Geodetic(c) => Crs::Geodetic(c.normalized_for_visualization()),
            Crs::Projected(c) => Crs::Projected(c.normalized_for_visualization()),
            Crs::Vertical(c) => Crs::Vertical(c.clone()),
            Crs::Compound(c) => {
                let mut out = c.clone();
                out.components = c
                    .components
                    .iter()
                    .map(Crs::normalized_for_visualization)
                    .collect();
                Crs::Compound(out)
            }
        }
    }

    /// Compare defining fields, ignoring identifiers, usage and remarks.
    pub fn is_equivalent_to(&self, other: &Crs) -> bool {
        match (self, other) {
            (Crs::Geodetic(a), Crs::Geodetic(b)) => a.is_equivalent_to(b),
            (Crs::Projected(a), Crs::Projected(b)) => a.is_equivalent_to(b),
            (Crs::Vertical(a), Crs::Vertical(b)) => a.is_equivalent_to(b),
            (Crs::Compound(a), Crs::Compound(b)) => a.is_equivalent_to(b),
            _ => false,
        }
    }
}
