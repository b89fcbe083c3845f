//! # WKT Parser
//!
//! Maps a [`WktNode`] tree onto the domain object model. The dialect of the
//! input decides how names are read back: WKT1 GDAL datum spellings and
//! ESRI decorated names are turned into official names, through repository
//! aliases when a repository is attached.
//!
//! ## Warnings
//!
//! Quirks that do not prevent building an object (a missing `PRIMEM` or
//! `UNIT` supplied with a default, an ignored `TOWGS84` clause, an unknown
//! projection parameter) are logged with `log::warn!` and recorded in
//! [`WktParser::warning_list`]. In strict mode they are parse errors.
//!
//! ## Registered Objects
//!
//! Literal content wins by default: an `ID` only attaches identifiers. With
//! [`WktParser::set_prefer_registered_objects`] and an attached repository,
//! CRS, datum and ellipsoid nodes carrying an `ID` are resolved through the
//! authority factory instead, falling back to the literal content (with a
//! warning) when the lookup fails.

use std::sync::Arc;

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::factory::AuthorityFactory;
use crate::mappings;
use crate::model::{
    canonicalize_name, numbers_match, Axis, AxisDirection, CompoundCrs, ConcatenatedOperation,
    Conversion, CoordinateOperation, CoordinateSystem, Crs, CsKind, Datum, Ellipsoid, Extent,
    GeodeticCrs, GeodeticReferenceFrame, GeographicBoundingBox, Identifier, Object,
    OperationMethod, OperationParameter, ParameterValue, PrimeMeridian, ProjBasedOperation,
    ProjectedCrs, Transformation, UnitKind, UnitOfMeasure, Usage, VerticalCrs,
    VerticalReferenceFrame,
};

use super::dialect::{guess_dialect, WktDialect};
use super::export::{INVERSE_OF, PROJ_BASED_METHOD_PREFIX};
use super::node::WktNode;

const UNIT_KEYWORDS: &[&str] = &[
    "UNIT",
    "LENGTHUNIT",
    "ANGLEUNIT",
    "SCALEUNIT",
    "TIMEUNIT",
    "PARAMETRICUNIT",
];

const GEODETIC_CRS_KEYWORDS: &[&str] = &[
    "GEODCRS",
    "GEODETICCRS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "BASEGEODCRS",
    "BASEGEOGCRS",
];

const CRS_KEYWORDS: &[&str] = &[
    "GEOGCS",
    "GEOCCS",
    "PROJCS",
    "VERT_CS",
    "VERTCS",
    "COMPD_CS",
    "GEODCRS",
    "GEODETICCRS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "PROJCRS",
    "PROJECTEDCRS",
    "VERTCRS",
    "VERTICALCRS",
    "COMPOUNDCRS",
];

/// Builds domain objects from WKT text.
#[derive(Debug, Default)]
pub struct WktParser {
    db: Option<Arc<DatabaseContext>>,
    strict: bool,
    prefer_registered_objects: bool,
    warnings: Vec<String>,
}

impl WktParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository used for alias resolution and registered objects.
    pub fn attach_database_context(&mut self, db: Option<Arc<DatabaseContext>>) -> &mut Self {
        self.db = db;
        self
    }

    /// In strict mode every warning is a parse error.
    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn set_prefer_registered_objects(&mut self, prefer: bool) -> &mut Self {
        self.prefer_registered_objects = prefer;
        self
    }

    /// Warnings of the last [`create_from_wkt`](Self::create_from_wkt) call.
    pub fn warning_list(&self) -> &[String] {
        &self.warnings
    }

    pub fn guess_dialect(text: &str) -> WktDialect {
        guess_dialect(text)
    }

    /// Parse `text` into an object.
    pub fn create_from_wkt(&mut self, text: &str) -> Result<Object> {
        self.warnings.clear();
        let node = WktNode::parse(text)?;
        let dialect = guess_dialect(text);
        let mut builder = Builder {
            parser: self,
            esri: dialect == WktDialect::Wkt1Esri,
            wkt1: dialect.is_wkt1(),
        };
        builder.build_object(&node)
    }
}

struct Builder<'a> {
    parser: &'a mut WktParser,
    esri: bool,
    wkt1: bool,
}

fn keyword_in(node: &WktNode, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| node.is(k))
}

fn name_of(node: &WktNode) -> Result<String> {
    match node.children().first() {
        Some(child) if child.is_quoted() => Ok(child.value().to_string()),
        _ => Err(Error::parse(format!("Missing name in {}", node.value()))),
    }
}

fn number_at(node: &WktNode, index: usize) -> Result<f64> {
    let child = node.children().get(index).ok_or_else(|| {
        Error::parse(format!("Missing value at position {} of {}", index + 1, node.value()))
    })?;
    let value: f64 = child.value().trim().parse().map_err(|_| {
        Error::parse(format!(
            "Expected a number at position {} of {}, got '{}'",
            index + 1,
            node.value(),
            child.value()
        ))
    })?;
    if !value.is_finite() {
        return Err(Error::parse(format!(
            "Non-finite value '{}' at position {} of {}",
            child.value(),
            index + 1,
            node.value()
        )));
    }
    Ok(value)
}

fn required_child<'n>(node: &'n WktNode, keywords: &[&str]) -> Result<&'n WktNode> {
    node.look_for_any_child(keywords).ok_or_else(|| {
        Error::parse(format!("Missing {} in {}", keywords[0], node.value()))
    })
}

/// Identifiers from `ID` (WKT2) and `AUTHORITY` (WKT1) children.
fn parse_ids(node: &WktNode) -> Vec<Identifier> {
    node.children()
        .iter()
        .filter(|child| child.is("ID") || child.is("AUTHORITY"))
        .filter_map(|child| {
            let authority = child.child_value(0)?;
            let code = child.child_value(1)?;
            let mut id = Identifier::new(authority, code);
            if child.is("ID") {
                id.version = child
                    .children()
                    .get(2)
                    .filter(|v| v.children().is_empty())
                    .map(|v| v.value().to_string());
            }
            Some(id)
        })
        .collect()
}

fn parse_usage(node: &WktNode) -> Result<Usage> {
    let container = node.look_for_child("USAGE", 0).unwrap_or(node);
    let scope = container
        .look_for_child("SCOPE", 0)
        .and_then(|s| s.child_value(0))
        .map(str::to_string);
    let description = container
        .look_for_child("AREA", 0)
        .and_then(|a| a.child_value(0))
        .map(str::to_string);
    let bbox = match container.look_for_child("BBOX", 0) {
        Some(b) => Some(GeographicBoundingBox::new(
            number_at(b, 1)?,
            number_at(b, 0)?,
            number_at(b, 3)?,
            number_at(b, 2)?,
        )),
        None => None,
    };
    let extent = (description.is_some() || bbox.is_some()).then(|| Extent {
        description,
        bbox,
        ids: Vec::new(),
    });
    Ok(Usage { scope, extent })
}

fn parse_remarks(node: &WktNode) -> Option<String> {
    node.look_for_child("REMARK", 0)
        .and_then(|r| r.child_value(0))
        .map(str::to_string)
}

fn unit_kind_of(node: &WktNode) -> Option<UnitKind> {
    let keyword = node.value().to_ascii_uppercase();
    match keyword.as_str() {
        "LENGTHUNIT" => Some(UnitKind::Linear),
        "ANGLEUNIT" => Some(UnitKind::Angular),
        "SCALEUNIT" => Some(UnitKind::Scale),
        "TIMEUNIT" => Some(UnitKind::Time),
        "PARAMETRICUNIT" => Some(UnitKind::Parametric),
        _ => None,
    }
}

/// Well-known unit matching a parsed one, so that `UNIT["Degree",...]`
/// and `ANGLEUNIT["degree",...]` produce the same object.
fn canonical_unit(name: &str, factor: f64, kind: UnitKind, id: Option<Identifier>) -> UnitOfMeasure {
    let known = [
        UnitOfMeasure::metre(),
        UnitOfMeasure::degree(),
        UnitOfMeasure::radian(),
        UnitOfMeasure::arc_second(),
        UnitOfMeasure::unity(),
        UnitOfMeasure::parts_per_million(),
        UnitOfMeasure::us_survey_foot(),
    ];
    let wanted = match canonicalize_name(name).as_str() {
        "meter" => "metre".to_string(),
        "footus" => "ussurveyfoot".to_string(),
        other => other.to_string(),
    };
    for unit in known {
        let kind_ok = kind == UnitKind::None || unit.kind == kind;
        if kind_ok
            && canonicalize_name(&unit.name) == wanted
            && numbers_match(unit.conversion_to_si, factor)
        {
            return UnitOfMeasure {
                id: id.or(unit.id.clone()),
                ..unit
            };
        }
    }
    UnitOfMeasure {
        id,
        ..UnitOfMeasure::new(name, factor, kind)
    }
}

fn unit_for_kind(kind: UnitKind, angular: &UnitOfMeasure, linear: &UnitOfMeasure) -> UnitOfMeasure {
    match kind {
        UnitKind::Angular => angular.clone(),
        UnitKind::Linear => linear.clone(),
        _ => UnitOfMeasure::unity(),
    }
}

/// Guess the unit kind of a parameter that no table knows.
fn guess_parameter_kind(name: &str) -> UnitKind {
    let lower = name.to_ascii_lowercase();
    if lower.contains("translation") || lower.contains("easting") || lower.contains("northing") {
        UnitKind::Linear
    } else if lower.contains("latitude") || lower.contains("longitude") || lower.contains("meridian") {
        UnitKind::Angular
    } else {
        UnitKind::Scale
    }
}

/// Split `"geodetic latitude (Lat)"` into its name and abbreviation.
fn split_axis_name(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    if let (Some(open), true) = (trimmed.rfind('('), trimmed.ends_with(')')) {
        let name = trimmed[..open].trim();
        let abbreviation = &trimmed[open + 1..trimmed.len() - 1];
        return (name.to_string(), abbreviation.to_string());
    }
    (trimmed.to_string(), String::new())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// WKT1 axis names mapped to their WKT2 name and abbreviation.
fn wkt1_axis_identity(name: &str) -> (String, String) {
    match canonicalize_name(name).as_str() {
        "latitude" | "lat" | "geodeticlatitude" => ("Geodetic latitude".into(), "Lat".into()),
        "longitude" | "lon" | "long" | "geodeticlongitude" => {
            ("Geodetic longitude".into(), "Lon".into())
        }
        "easting" | "x" | "e" => ("Easting".into(), "E".into()),
        "northing" | "y" | "n" => ("Northing".into(), "N".into()),
        "ellipsoidalheight" => ("Ellipsoidal height".into(), "h".into()),
        "gravityrelatedheight" | "height" | "h" => ("Gravity-related height".into(), "H".into()),
        "depth" | "d" => ("Depth".into(), "D".into()),
        _ => (name.to_string(), String::new()),
    }
}

fn default_cs(kind: CsKind, dimension: usize, angular: UnitOfMeasure, linear: UnitOfMeasure) -> CoordinateSystem {
    match (kind, dimension) {
        (CsKind::Ellipsoidal, 3) => CoordinateSystem::ellipsoidal_lat_lon_height(angular, linear),
        (CsKind::Ellipsoidal, _) => CoordinateSystem::ellipsoidal_lat_lon(angular),
        (CsKind::Cartesian, 3) => CoordinateSystem::geocentric(linear),
        (CsKind::Cartesian, _) => CoordinateSystem::easting_northing(linear),
        (CsKind::Vertical, _) => CoordinateSystem::gravity_related_height(linear),
    }
}

/// Official spelling of an ESRI CRS name when no alias is registered.
fn esri_crs_fallback(name: &str) -> String {
    let stem = name.strip_prefix("GCS_").unwrap_or(name);
    let stem = match stem.strip_prefix("WGS_1984") {
        Some(rest) => format!("WGS_84{}", rest),
        None => stem.to_string(),
    };
    stem.replace('_', " ")
}

impl Builder<'_> {
    fn warn(&mut self, message: String) -> Result<()> {
        if self.parser.strict {
            return Err(Error::parse(message));
        }
        log::warn!("{}", message);
        self.parser.warnings.push(message);
        Ok(())
    }

    /// The registered object designated by the node's `ID`, when the
    /// parser prefers registered objects.
    fn registered<T>(
        &mut self,
        node: &WktNode,
        extract: impl FnOnce(Object) -> Option<T>,
    ) -> Result<Option<T>> {
        if !self.parser.prefer_registered_objects {
            return Ok(None);
        }
        let Some(db) = self.parser.db.clone() else {
            return Ok(None);
        };
        let Some(id) = parse_ids(node).into_iter().next() else {
            return Ok(None);
        };
        match AuthorityFactory::create(db, &id.authority).create_object(&id.code) {
            Ok(object) => match extract(object) {
                Some(found) => {
                    log::debug!("Using registered object {} for {}", id, node.value());
                    Ok(Some(found))
                }
                None => {
                    self.warn(format!(
                        "{} does not designate a {} object, using the literal definition",
                        id,
                        node.value()
                    ))?;
                    Ok(None)
                }
            },
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.warn(format!(
                    "Cannot resolve {}: {}, using the literal definition",
                    id, e
                ))?;
                Ok(None)
            }
        }
    }

    /// Official name of an ESRI spelled object.
    fn official_name(
        &mut self,
        alias: &str,
        table: &str,
        fallback: impl FnOnce() -> String,
    ) -> Result<String> {
        if let Some(db) = &self.parser.db {
            if let Some(official) = db.get_official_name_from_alias(alias, table, "ESRI")? {
                return Ok(official);
            }
        }
        Ok(fallback())
    }

    fn build_object(&mut self, node: &WktNode) -> Result<Object> {
        if keyword_in(node, CRS_KEYWORDS) {
            return Ok(Object::Crs(self.build_crs(node)?));
        }
        let keyword = node.value().to_ascii_uppercase();
        match keyword.as_str() {
            "DATUM" | "GEODETICDATUM" | "TRF" => Ok(Object::Datum(Datum::Geodetic(
                self.build_geodetic_datum(node)?,
            ))),
            "VDATUM" | "VERT_DATUM" | "VERTICALDATUM" | "VRF" => Ok(Object::Datum(
                Datum::Vertical(self.build_vertical_datum(node)?),
            )),
            "ELLIPSOID" | "SPHEROID" => Ok(Object::Ellipsoid(self.build_ellipsoid(node)?)),
            "PRIMEM" | "PRIMEMERIDIAN" => Ok(Object::PrimeMeridian(
                self.build_prime_meridian(node, &UnitOfMeasure::degree())?,
            )),
            k if UNIT_KEYWORDS.contains(&k) => Ok(Object::Unit(self.build_unit(node, UnitKind::None)?)),
            "CONVERSION" => self.build_standalone_conversion(node),
            "COORDINATEOPERATION" => Ok(Object::CoordinateOperation(
                CoordinateOperation::Transformation(self.build_transformation(node)?),
            )),
            "CONCATENATEDOPERATION" => Ok(Object::CoordinateOperation(
                CoordinateOperation::Concatenated(self.build_concatenated(node)?),
            )),
            _ => Err(Error::parse(format!(
                "Unsupported WKT object '{}'",
                node.value()
            ))),
        }
    }

    fn build_crs(&mut self, node: &WktNode) -> Result<Crs> {
        if let Some(crs) = self.registered(node, Object::into_crs)? {
            return Ok(crs);
        }
        let keyword = node.value().to_ascii_uppercase();
        match keyword.as_str() {
            "GEOGCS" | "GEOCCS" => Ok(Crs::Geodetic(self.build_geodetic_crs_wkt1(node, false)?)),
            k if GEODETIC_CRS_KEYWORDS.contains(&k) => {
                Ok(Crs::Geodetic(self.build_geodetic_crs_wkt2(node)?))
            }
            "PROJCS" => Ok(Crs::Projected(self.build_projected_crs_wkt1(node)?)),
            "PROJCRS" | "PROJECTEDCRS" => Ok(Crs::Projected(self.build_projected_crs_wkt2(node)?)),
            "VERT_CS" | "VERTCS" => Ok(Crs::Vertical(self.build_vertical_crs_wkt1(node)?)),
            "VERTCRS" | "VERTICALCRS" => Ok(Crs::Vertical(self.build_vertical_crs_wkt2(node)?)),
            "COMPD_CS" | "COMPOUNDCRS" => Ok(Crs::Compound(self.build_compound_crs(node)?)),
            _ => Err(Error::parse(format!(
                "Expected a CRS, got '{}'",
                node.value()
            ))),
        }
    }

    fn build_unit(&mut self, node: &WktNode, default_kind: UnitKind) -> Result<UnitOfMeasure> {
        let kind = unit_kind_of(node).unwrap_or(default_kind);
        let name = name_of(node)?;
        let factor = number_at(node, 1)?;
        if factor <= 0.0 {
            return Err(Error::parse(format!(
                "Invalid conversion factor {} for unit '{}'",
                factor, name
            )));
        }
        Ok(canonical_unit(&name, factor, kind, parse_ids(node).into_iter().next()))
    }

    fn build_ellipsoid(&mut self, node: &WktNode) -> Result<Ellipsoid> {
        let registered = self.registered(node, |o| match o {
            Object::Ellipsoid(e) => Some(e),
            _ => None,
        })?;
        if let Some(ellipsoid) = registered {
            return Ok(ellipsoid);
        }
        let raw_name = name_of(node)?;
        let semi_major_axis = number_at(node, 1)?;
        let inverse_flattening = number_at(node, 2)?;
        if semi_major_axis <= 0.0 || inverse_flattening < 0.0 {
            return Err(Error::parse(format!(
                "Invalid ellipsoid parameters {}, {} for '{}'",
                semi_major_axis, inverse_flattening, raw_name
            )));
        }
        let unit = match node.look_for_any_child(UNIT_KEYWORDS) {
            Some(u) => self.build_unit(u, UnitKind::Linear)?,
            None => UnitOfMeasure::metre(),
        };
        let name = if self.esri {
            self.official_name(&raw_name, "ellipsoid", || {
                mappings::ellipsoid_by_parameters(
                    unit.convert(semi_major_axis, &UnitOfMeasure::metre()),
                    inverse_flattening,
                )
                .map(|m| m.name.to_string())
                .unwrap_or_else(|| raw_name.replace('_', " "))
            })?
        } else {
            raw_name
        };
        Ok(Ellipsoid {
            name,
            semi_major_axis,
            inverse_flattening,
            unit,
            ids: parse_ids(node),
        })
    }

    fn build_prime_meridian(&mut self, node: &WktNode, default_unit: &UnitOfMeasure) -> Result<PrimeMeridian> {
        let name = name_of(node)?;
        let longitude = number_at(node, 1)?;
        let unit = match node.look_for_any_child(UNIT_KEYWORDS) {
            Some(u) => self.build_unit(u, UnitKind::Angular)?,
            None => default_unit.clone(),
        };
        Ok(PrimeMeridian {
            name,
            longitude,
            unit,
            ids: parse_ids(node),
        })
    }

    /// Datum with a Greenwich prime meridian; the enclosing CRS sets the
    /// actual one.
    fn build_geodetic_datum(&mut self, node: &WktNode) -> Result<GeodeticReferenceFrame> {
        let registered = self.registered(node, |o| match o {
            Object::Datum(Datum::Geodetic(d)) => Some(d),
            _ => None,
        })?;
        if let Some(datum) = registered {
            return Ok(datum);
        }
        let raw_name = name_of(node)?;
        let ellipsoid = self.build_ellipsoid(required_child(node, &["ELLIPSOID", "SPHEROID"])?)?;
        if node.look_for_child("TOWGS84", 0).is_some() {
            self.warn(format!("TOWGS84 clause of datum '{}' ignored", raw_name))?;
        }
        let name = if self.esri {
            self.official_name(&raw_name, "geodetic_datum", || {
                let stem = raw_name.strip_prefix("D_").unwrap_or(&raw_name);
                mappings::datum_name_from_wkt1(stem)
                    .map(str::to_string)
                    .unwrap_or_else(|| stem.replace('_', " "))
            })?
        } else if self.wkt1 {
            mappings::datum_name_from_wkt1(&raw_name)
                .map(str::to_string)
                .unwrap_or_else(|| raw_name.replace('_', " "))
        } else {
            raw_name
        };
        Ok(GeodeticReferenceFrame {
            name,
            ellipsoid,
            prime_meridian: PrimeMeridian::greenwich(),
            anchor: node
                .look_for_child("ANCHOR", 0)
                .and_then(|a| a.child_value(0))
                .map(str::to_string),
            ids: parse_ids(node),
        })
    }

    fn build_vertical_datum(&mut self, node: &WktNode) -> Result<VerticalReferenceFrame> {
        let raw_name = name_of(node)?;
        let name = if self.esri {
            self.official_name(&raw_name, "vertical_datum", || raw_name.replace('_', " "))?
        } else {
            raw_name
        };
        Ok(VerticalReferenceFrame {
            name,
            anchor: node
                .look_for_child("ANCHOR", 0)
                .and_then(|a| a.child_value(0))
                .map(str::to_string),
            ids: parse_ids(node),
        })
    }

    fn build_axis_wkt2(
        &mut self,
        node: &WktNode,
        cs_kind: CsKind,
        shared_unit: Option<&UnitOfMeasure>,
    ) -> Result<(Option<usize>, Axis)> {
        let raw_name = name_of(node)?;
        let (name, abbreviation) = split_axis_name(&raw_name);
        let direction = node
            .child_value(1)
            .and_then(AxisDirection::parse)
            .ok_or_else(|| Error::parse(format!("Invalid direction for axis '{}'", raw_name)))?;
        let name = if name.is_empty() {
            mappings_axis_name(&abbreviation, direction)
        } else {
            capitalize(&name)
        };
        let expected = if cs_kind == CsKind::Ellipsoidal
            && !matches!(direction, AxisDirection::Up | AxisDirection::Down)
        {
            UnitKind::Angular
        } else {
            UnitKind::Linear
        };
        let unit = match node.look_for_any_child(UNIT_KEYWORDS) {
            Some(u) => self.build_unit(u, expected)?,
            None => match shared_unit {
                Some(u) if u.kind == expected || u.kind == UnitKind::None => u.clone(),
                _ => {
                    self.warn(format!("Axis '{}' has no unit, assuming a default one", raw_name))?;
                    if expected == UnitKind::Angular {
                        UnitOfMeasure::degree()
                    } else {
                        UnitOfMeasure::metre()
                    }
                }
            },
        };
        let order = node
            .look_for_child("ORDER", 0)
            .and_then(|o| o.child_value(0))
            .and_then(|v| v.parse().ok());
        Ok((order, Axis::new(&name, &abbreviation, direction, unit)))
    }

    /// Coordinate system of a WKT2 CRS node: its `CS` child, the `AXIS`
    /// siblings and the unit shared by the axes.
    fn build_cs_wkt2(&mut self, crs: &WktNode) -> Result<CoordinateSystem> {
        let cs_node = required_child(crs, &["CS"])?;
        let kind_text = cs_node.child_value(0).unwrap_or_default();
        let kind = CsKind::parse(kind_text).ok_or_else(|| {
            Error::parse(format!("Unsupported coordinate system type '{}'", kind_text))
        })?;
        let dimension: usize = cs_node
            .child_value(1)
            .and_then(|d| d.parse().ok())
            .filter(|d| (1..=3).contains(d))
            .ok_or_else(|| Error::parse("Invalid coordinate system dimension"))?;
        let shared_kind = if kind == CsKind::Ellipsoidal {
            UnitKind::Angular
        } else {
            UnitKind::Linear
        };
        let shared_unit = match crs.look_for_any_child(UNIT_KEYWORDS) {
            Some(u) => Some(self.build_unit(u, shared_kind)?),
            None => None,
        };

        let mut axes = Vec::new();
        for axis_node in crs.children().iter().filter(|c| c.is("AXIS")) {
            axes.push(self.build_axis_wkt2(axis_node, kind, shared_unit.as_ref())?);
        }
        if axes.is_empty() {
            self.warn(format!(
                "No AXIS in {} '{}', assuming the conventional axes",
                crs.value(),
                name_of(crs).unwrap_or_default()
            ))?;
            let angular = shared_unit.clone().filter(|u| u.kind == UnitKind::Angular);
            let linear = shared_unit.filter(|u| u.kind == UnitKind::Linear);
            return Ok(default_cs(
                kind,
                dimension,
                angular.unwrap_or_else(UnitOfMeasure::degree),
                linear.unwrap_or_else(UnitOfMeasure::metre),
            ));
        }
        if axes.len() != dimension {
            return Err(Error::parse(format!(
                "{} declares {} axes but has {}",
                crs.value(),
                dimension,
                axes.len()
            )));
        }
        axes.sort_by_key(|(order, _)| order.unwrap_or(usize::MAX));
        Ok(CoordinateSystem::new(
            kind,
            axes.into_iter().map(|(_, axis)| axis).collect(),
        ))
    }

    fn build_axes_wkt1(
        &mut self,
        node: &WktNode,
        angular: &UnitOfMeasure,
        linear: &UnitOfMeasure,
    ) -> Result<Vec<Axis>> {
        let mut axes = Vec::new();
        for axis_node in node.children().iter().filter(|c| c.is("AXIS")) {
            let raw_name = name_of(axis_node)?;
            let direction = axis_node
                .child_value(1)
                .and_then(AxisDirection::parse)
                .ok_or_else(|| Error::parse(format!("Invalid direction for axis '{}'", raw_name)))?;
            let (name, abbreviation) = wkt1_axis_identity(&raw_name);
            let unit = if abbreviation == "Lat" || abbreviation == "Lon" {
                angular.clone()
            } else {
                linear.clone()
            };
            axes.push(Axis::new(&name, &abbreviation, direction, unit));
        }
        Ok(axes)
    }

    fn build_geodetic_crs_wkt1(&mut self, node: &WktNode, is_base: bool) -> Result<GeodeticCrs> {
        let geocentric = node.is("GEOCCS");
        let raw_name = name_of(node)?;
        let unit = match node.look_for_child("UNIT", 0) {
            Some(u) => self.build_unit(
                u,
                if geocentric { UnitKind::Linear } else { UnitKind::Angular },
            )?,
            None => {
                let default = if geocentric {
                    UnitOfMeasure::metre()
                } else {
                    UnitOfMeasure::degree()
                };
                self.warn(format!(
                    "Missing UNIT in {} '{}', assuming {}",
                    node.value(),
                    raw_name,
                    default.name
                ))?;
                default
            }
        };

        let mut datum = self.build_geodetic_datum(required_child(node, &["DATUM"])?)?;
        let pm_unit = if self.esri || geocentric {
            UnitOfMeasure::degree()
        } else {
            unit.clone()
        };
        datum.prime_meridian = match node.look_for_child("PRIMEM", 0) {
            Some(pm) => self.build_prime_meridian(pm, &pm_unit)?,
            None => {
                self.warn(format!(
                    "Missing PRIMEM in {} '{}', assuming Greenwich",
                    node.value(),
                    raw_name
                ))?;
                PrimeMeridian::greenwich()
            }
        };

        let cs = if geocentric {
            CoordinateSystem::geocentric(unit)
        } else {
            let axes = self.build_axes_wkt1(node, &unit, &UnitOfMeasure::metre())?;
            match (axes.is_empty(), is_base) {
                // GDAL only omits the axes of a base CRS, which then follow EPSG order
                (true, true) => CoordinateSystem::ellipsoidal_lat_lon(unit),
                (true, false) => CoordinateSystem::ellipsoidal_lon_lat(unit),
                (false, _) => CoordinateSystem::new(CsKind::Ellipsoidal, axes),
            }
        };

        let name = if self.esri {
            self.official_name(&raw_name, "geodetic_crs", || esri_crs_fallback(&raw_name))?
        } else {
            raw_name
        };
        Ok(GeodeticCrs {
            ids: parse_ids(node),
            ..GeodeticCrs::new(&name, datum, cs)
        })
    }

    fn build_geodetic_crs_wkt2(&mut self, node: &WktNode) -> Result<GeodeticCrs> {
        let name = name_of(node)?;
        let mut datum =
            self.build_geodetic_datum(required_child(node, &["DATUM", "GEODETICDATUM", "TRF"])?)?;
        let is_base = node.is("BASEGEODCRS") || node.is("BASEGEOGCRS");
        let cs = if is_base && node.look_for_child("CS", 0).is_none() {
            let unit = match node.look_for_any_child(UNIT_KEYWORDS) {
                Some(u) => self.build_unit(u, UnitKind::Angular)?,
                None => UnitOfMeasure::degree(),
            };
            CoordinateSystem::ellipsoidal_lat_lon(unit)
        } else {
            self.build_cs_wkt2(node)?
        };
        let pm_unit = match (cs.kind, cs.angular_unit()) {
            (CsKind::Ellipsoidal, Some(unit)) => unit.clone(),
            _ => UnitOfMeasure::degree(),
        };
        datum.prime_meridian = match node.look_for_any_child(&["PRIMEM", "PRIMEMERIDIAN"]) {
            Some(pm) => self.build_prime_meridian(pm, &pm_unit)?,
            // An omitted PRIMEM is Greenwich, expressed in the CS angular unit
            None => PrimeMeridian {
                unit: pm_unit,
                ..PrimeMeridian::greenwich()
            },
        };
        Ok(GeodeticCrs {
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            remarks: parse_remarks(node),
            ..GeodeticCrs::new(&name, datum, cs)
        })
    }

    fn build_method(&mut self, node: &WktNode) -> Result<(OperationMethod, bool)> {
        let method_node = required_child(node, &["METHOD", "PROJECTION"])?;
        let raw = name_of(method_node)?;
        let (name, inverted) = match raw.strip_prefix(INVERSE_OF) {
            Some(stem) => (stem.to_string(), true),
            None => (raw, false),
        };
        Ok((
            OperationMethod {
                name,
                ids: parse_ids(method_node),
            },
            inverted,
        ))
    }

    /// `PARAMETER` and `PARAMETERFILE` children of a WKT2 operation node.
    /// Parameters without unit take the unit of the matching axis.
    fn build_parameters(
        &mut self,
        node: &WktNode,
        method: &OperationMethod,
        angular: &UnitOfMeasure,
        linear: &UnitOfMeasure,
    ) -> Result<Vec<OperationParameter>> {
        let mapping = method
            .epsg_code()
            .and_then(mappings::method_by_code)
            .or_else(|| mappings::method_by_name(&method.name));
        let mut parameters = Vec::new();
        for child in node.children() {
            if child.is("PARAMETERFILE") {
                let name = name_of(child)?;
                let file = child
                    .child_value(1)
                    .ok_or_else(|| Error::parse(format!("Missing file name in '{}'", name)))?;
                parameters.push(OperationParameter {
                    ids: parse_ids(child),
                    ..OperationParameter::new(&name, ParameterValue::File(file.to_string()))
                });
            } else if child.is("PARAMETER") {
                let name = name_of(child)?;
                let ids = parse_ids(child);
                let value = match child.children().get(1) {
                    Some(v) if v.is_quoted() => ParameterValue::Text(v.value().to_string()),
                    _ => {
                        let number = number_at(child, 1)?;
                        let unit = match child.look_for_any_child(UNIT_KEYWORDS) {
                            Some(u) => self.build_unit(u, UnitKind::None)?,
                            None => {
                                let code = crate::model::operation::epsg_code_of(&ids);
                                let kind = mapping
                                    .and_then(|m| {
                                        code.and_then(|c| m.param_by_code(c))
                                            .or_else(|| m.param_by_name(&name))
                                    })
                                    .map(|p| p.param.kind)
                                    .or_else(|| mappings::param_by_name(&name).map(|p| p.kind))
                                    .unwrap_or_else(|| guess_parameter_kind(&name));
                                unit_for_kind(kind, angular, linear)
                            }
                        };
                        ParameterValue::measure(number, unit)
                    }
                };
                parameters.push(OperationParameter {
                    ids,
                    ..OperationParameter::new(&name, value)
                });
            }
        }
        Ok(parameters)
    }

    fn build_conversion_wkt2(
        &mut self,
        node: &WktNode,
        angular: &UnitOfMeasure,
        linear: &UnitOfMeasure,
    ) -> Result<Conversion> {
        let name = name_of(node)?;
        let (method, inverted) = self.build_method(node)?;
        let parameters = self.build_parameters(node, &method, angular, linear)?;
        Ok(Conversion {
            ids: parse_ids(node),
            inverted,
            ..Conversion::new(&name, method, parameters)
        })
    }

    fn build_standalone_conversion(&mut self, node: &WktNode) -> Result<Object> {
        let conversion =
            self.build_conversion_wkt2(node, &UnitOfMeasure::degree(), &UnitOfMeasure::metre())?;
        let operation = match conversion.method.name.strip_prefix(PROJ_BASED_METHOD_PREFIX) {
            Some(definition) => CoordinateOperation::ProjBased(ProjBasedOperation {
                inverted: conversion.inverted,
                ids: conversion.ids.clone(),
                ..ProjBasedOperation::new(&conversion.name, definition)
            }),
            None => CoordinateOperation::Conversion(conversion),
        };
        Ok(Object::CoordinateOperation(operation))
    }

    /// The conversion of a `PROJCS`: parameters follow the method's
    /// parameter order, with defaults for omitted ones.
    fn build_conversion_wkt1(
        &mut self,
        node: &WktNode,
        projection: &str,
        angular: &UnitOfMeasure,
        linear: &UnitOfMeasure,
    ) -> Result<Conversion> {
        let Some(mapping) = mappings::method_by_name(projection) else {
            self.warn(format!("Unknown projection method '{}'", projection))?;
            let mut parameters = Vec::new();
            for p in node.children().iter().filter(|c| c.is("PARAMETER")) {
                parameters.push(OperationParameter::new(
                    &name_of(p)?,
                    ParameterValue::measure(number_at(p, 1)?, UnitOfMeasure::unity()),
                ));
            }
            return Ok(Conversion::new(
                "unnamed",
                OperationMethod::new(&projection.replace('_', " ")),
                parameters,
            ));
        };

        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for p in node.children().iter().filter(|c| c.is("PARAMETER")) {
            let name = name_of(p)?;
            let value = number_at(p, 1)?;
            match mapping.param_by_name(&name) {
                Some(mp) => known.push(OperationParameter::epsg(
                    mp.param.epsg_name,
                    mp.param.epsg_code,
                    ParameterValue::measure(value, unit_for_kind(mp.param.kind, angular, linear)),
                )),
                None => {
                    self.warn(format!(
                        "Unknown parameter '{}' for projection '{}'",
                        name, projection
                    ))?;
                    unknown.push(OperationParameter::new(
                        &name,
                        ParameterValue::measure(value, UnitOfMeasure::unity()),
                    ));
                }
            }
        }

        let mut parameters = Vec::with_capacity(mapping.params.len() + unknown.len());
        for mp in mapping.params {
            let position = known
                .iter()
                .position(|p: &OperationParameter| p.epsg_code() == Some(mp.param.epsg_code));
            parameters.push(match position {
                Some(i) => known.remove(i),
                None => OperationParameter::epsg(
                    mp.param.epsg_name,
                    mp.param.epsg_code,
                    ParameterValue::measure(
                        mp.param.default_value(),
                        unit_for_kind(mp.param.kind, angular, linear),
                    ),
                ),
            });
        }
        parameters.extend(unknown);
        Ok(Conversion::new(
            "unnamed",
            OperationMethod::epsg(mapping.epsg_name, mapping.epsg_code),
            parameters,
        ))
    }

    fn build_projected_crs_wkt1(&mut self, node: &WktNode) -> Result<ProjectedCrs> {
        let raw_name = name_of(node)?;
        let base = self.build_geodetic_crs_wkt1(required_child(node, &["GEOGCS"])?, true)?;
        let linear = match node.look_for_child("UNIT", 0) {
            Some(u) => self.build_unit(u, UnitKind::Linear)?,
            None => {
                self.warn(format!("Missing UNIT in PROJCS '{}', assuming metre", raw_name))?;
                UnitOfMeasure::metre()
            }
        };
        let angular = base
            .cs
            .angular_unit()
            .cloned()
            .unwrap_or_else(UnitOfMeasure::degree);
        let projection = name_of(required_child(node, &["PROJECTION"])?)?;
        let conversion = self.build_conversion_wkt1(node, &projection, &angular, &linear)?;
        let axes = self.build_axes_wkt1(node, &angular, &linear)?;
        let cs = if axes.is_empty() {
            CoordinateSystem::easting_northing(linear)
        } else {
            CoordinateSystem::new(CsKind::Cartesian, axes)
        };
        if node.look_for_child("EXTENSION", 0).is_some() {
            self.warn(format!("EXTENSION clause of '{}' ignored", raw_name))?;
        }
        let name = if self.esri {
            self.official_name(&raw_name, "projected_crs", || esri_crs_fallback(&raw_name))?
        } else {
            raw_name
        };
        Ok(ProjectedCrs {
            ids: parse_ids(node),
            ..ProjectedCrs::new(&name, base, conversion, cs)
        })
    }

    fn build_projected_crs_wkt2(&mut self, node: &WktNode) -> Result<ProjectedCrs> {
        let name = name_of(node)?;
        let base = self.build_geodetic_crs_wkt2(required_child(node, &["BASEGEOGCRS", "BASEGEODCRS"])?)?;
        let cs = self.build_cs_wkt2(node)?;
        let angular = base
            .cs
            .angular_unit()
            .cloned()
            .unwrap_or_else(UnitOfMeasure::degree);
        let linear = cs.linear_unit().cloned().unwrap_or_else(UnitOfMeasure::metre);
        let conversion =
            self.build_conversion_wkt2(required_child(node, &["CONVERSION"])?, &angular, &linear)?;
        Ok(ProjectedCrs {
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            remarks: parse_remarks(node),
            ..ProjectedCrs::new(&name, base, conversion, cs)
        })
    }

    fn build_vertical_crs_wkt1(&mut self, node: &WktNode) -> Result<VerticalCrs> {
        let raw_name = name_of(node)?;
        let datum = self.build_vertical_datum(required_child(node, &["VERT_DATUM", "VDATUM"])?)?;
        let unit = match node.look_for_child("UNIT", 0) {
            Some(u) => self.build_unit(u, UnitKind::Linear)?,
            None => {
                self.warn(format!("Missing UNIT in {} '{}', assuming metre", node.value(), raw_name))?;
                UnitOfMeasure::metre()
            }
        };
        let depth = node
            .children()
            .iter()
            .filter(|c| c.is("PARAMETER"))
            .any(|p| {
                p.child_value(0) == Some("Direction")
                    && number_at(p, 1).map(|v| v < 0.0).unwrap_or(false)
            });
        let axes = self.build_axes_wkt1(node, &UnitOfMeasure::degree(), &unit)?;
        let cs = if !axes.is_empty() {
            CoordinateSystem::new(CsKind::Vertical, axes)
        } else if depth {
            CoordinateSystem::new(
                CsKind::Vertical,
                vec![Axis::new("Depth", "D", AxisDirection::Down, unit)],
            )
        } else {
            CoordinateSystem::gravity_related_height(unit)
        };
        let name = if self.esri {
            self.official_name(&raw_name, "vertical_crs", || raw_name.replace('_', " "))?
        } else {
            raw_name
        };
        Ok(VerticalCrs {
            ids: parse_ids(node),
            ..VerticalCrs::new(&name, datum, cs)
        })
    }

    fn build_vertical_crs_wkt2(&mut self, node: &WktNode) -> Result<VerticalCrs> {
        let name = name_of(node)?;
        let datum =
            self.build_vertical_datum(required_child(node, &["VDATUM", "VERTICALDATUM", "VRF"])?)?;
        let cs = self.build_cs_wkt2(node)?;
        Ok(VerticalCrs {
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            remarks: parse_remarks(node),
            ..VerticalCrs::new(&name, datum, cs)
        })
    }

    fn build_compound_crs(&mut self, node: &WktNode) -> Result<CompoundCrs> {
        let name = name_of(node)?;
        let mut components = Vec::new();
        for child in node.children().iter().filter(|c| keyword_in(c, CRS_KEYWORDS)) {
            components.push(self.build_crs(child)?);
        }
        if components.len() < 2 {
            return Err(Error::parse(format!(
                "Compound CRS '{}' needs at least two components",
                name
            )));
        }
        Ok(CompoundCrs {
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            remarks: parse_remarks(node),
            ..CompoundCrs::new(&name, components)
        })
    }

    fn build_wrapped_crs(&mut self, node: &WktNode, keyword: &str) -> Result<Crs> {
        let wrapper = required_child(node, &[keyword])?;
        let inner = wrapper
            .keyword_children()
            .next()
            .ok_or_else(|| Error::parse(format!("Empty {} in '{}'", keyword, node.value())))?;
        self.build_crs(inner)
    }

    fn build_transformation(&mut self, node: &WktNode) -> Result<Transformation> {
        let name = name_of(node)?;
        let source = self.build_wrapped_crs(node, "SOURCECRS")?;
        let target = self.build_wrapped_crs(node, "TARGETCRS")?;
        let (method, inverted) = self.build_method(node)?;
        let source_cs = source.geodetic().map(|g| g.cs.clone());
        let angular = source_cs
            .as_ref()
            .and_then(|cs| cs.angular_unit().cloned())
            .unwrap_or_else(UnitOfMeasure::degree);
        let linear = source_cs
            .as_ref()
            .and_then(|cs| cs.linear_unit().cloned())
            .unwrap_or_else(UnitOfMeasure::metre);
        let parameters = self.build_parameters(node, &method, &angular, &linear)?;
        let accuracy = match node.look_for_child("OPERATIONACCURACY", 0) {
            Some(a) => Some(number_at(a, 0)?),
            None => None,
        };
        Ok(Transformation {
            accuracy,
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            inverted,
            ..Transformation::new(&name, Arc::new(source), Arc::new(target), method, parameters)
        })
    }

    fn build_concatenated(&mut self, node: &WktNode) -> Result<ConcatenatedOperation> {
        let name = name_of(node)?;
        let mut operations = Vec::new();
        for step in node.children().iter().filter(|c| c.is("STEP")) {
            let inner = step
                .keyword_children()
                .next()
                .ok_or_else(|| Error::parse(format!("Empty STEP in '{}'", name)))?;
            match self.build_object(inner)? {
                Object::CoordinateOperation(op) => operations.push(op),
                other => {
                    return Err(Error::parse(format!(
                        "STEP of '{}' is a {}, not an operation",
                        name,
                        other.kind_name()
                    )))
                }
            }
        }
        if operations.is_empty() {
            return Err(Error::parse(format!("Concatenated operation '{}' has no STEP", name)));
        }
        Ok(ConcatenatedOperation {
            ids: parse_ids(node),
            usage: parse_usage(node)?,
            ..ConcatenatedOperation::new(&name, operations)
        })
    }
}

fn mappings_axis_name(abbreviation: &str, direction: AxisDirection) -> String {
    crate::model::cs::default_axis_name(abbreviation, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wkt::formatter::WktConvention;

    fn parse(text: &str) -> Object {
        WktParser::new().create_from_wkt(text).unwrap()
    }

    fn utm31() -> Crs {
        let degree = UnitOfMeasure::degree();
        let metre = UnitOfMeasure::metre();
        let conversion = Conversion::new(
            "UTM zone 31N",
            OperationMethod::epsg("Transverse Mercator", 9807),
            vec![
                OperationParameter::epsg("Latitude of natural origin", 8801, ParameterValue::measure(0.0, degree.clone())),
                OperationParameter::epsg("Longitude of natural origin", 8802, ParameterValue::measure(3.0, degree)),
                OperationParameter::epsg("Scale factor at natural origin", 8805, ParameterValue::measure(0.9996, UnitOfMeasure::unity())),
                OperationParameter::epsg("False easting", 8806, ParameterValue::measure(500000.0, metre.clone())),
                OperationParameter::epsg("False northing", 8807, ParameterValue::measure(0.0, metre.clone())),
            ],
        );
        Crs::Projected(ProjectedCrs {
            ids: vec![Identifier::new("EPSG", "32631")],
            ..ProjectedCrs::new(
                "WGS 84 / UTM zone 31N",
                GeodeticCrs::epsg_4326(),
                conversion,
                CoordinateSystem::easting_northing(metre),
            )
        })
    }

    #[test]
    fn test_wkt2_round_trips() {
        let objects = [
            Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326())),
            Object::Crs(utm31()),
        ];
        let conventions = [
            WktConvention::Wkt2_2015,
            WktConvention::Wkt2_2015Simplified,
            WktConvention::Wkt2_2018,
            WktConvention::Wkt2_2018Simplified,
        ];
        for object in &objects {
            for convention in conventions {
                let wkt = object.to_wkt(convention).unwrap();
                let mut parser = WktParser::new();
                parser.set_strict(true);
                let parsed = parser.create_from_wkt(&wkt).unwrap();
                assert!(
                    parsed.is_equivalent_to(object),
                    "{} round trip failed:\n{}",
                    convention,
                    wkt
                );
                assert_eq!(parsed.ids(), object.ids());
            }
        }
    }

    #[test]
    fn test_wkt1_gdal_round_trip() {
        let object = Object::Crs(utm31());
        let wkt = object.to_wkt(WktConvention::Wkt1Gdal).unwrap();
        let parsed = parse(&wkt);
        assert!(parsed.is_equivalent_to(&object), "{}", wkt);

        let geographic = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let parsed = parse(&geographic.to_wkt(WktConvention::Wkt1Gdal).unwrap());
        assert!(parsed.is_equivalent_to(&geographic));
        match parsed {
            Object::Crs(Crs::Geodetic(crs)) => {
                assert_eq!(crs.datum.name, "World Geodetic System 1984");
                assert_eq!(crs.datum.ellipsoid.ids, vec![Identifier::new("EPSG", "7030")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_esri_names_unmorphed() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        match parse(wkt) {
            Object::Crs(Crs::Geodetic(crs)) => {
                assert_eq!(crs.name, "WGS 84");
                assert_eq!(crs.datum.name, "World Geodetic System 1984");
                assert_eq!(crs.datum.ellipsoid.name, "WGS 84");
                assert_eq!(crs.cs.axes[0].direction, AxisDirection::East, "ESRI is longitude first");
                assert_eq!(crs.cs.axes[0].unit, UnitOfMeasure::degree());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_esri_projected_parameters() {
        let object = Object::Crs(utm31());
        let wkt = object.to_wkt(WktConvention::Wkt1Esri).unwrap();
        match parse(&wkt) {
            Object::Crs(Crs::Projected(crs)) => {
                let Crs::Projected(original) = utm31() else { unreachable!() };
                assert!(crs.conversion.is_equivalent_to(&original.conversion));
                assert!(crs.base.datum.is_equivalent_to(&original.base.datum));
                assert_eq!(crs.name, "WGS 84 UTM Zone 31N");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_bracket() {
        let err = WktParser::new()
            .create_from_wkt("GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\"")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for wkt in [
            r#"GEOGCS["x",DATUM["y",SPHEROID["z",6378137,298.257223563]],UNIT["degree",NaN]]"#,
            r#"GEOGCS["x",DATUM["y",SPHEROID["z",inf,298.257223563]],UNIT["degree",0.0174532925199433]]"#,
            r#"LENGTHUNIT["metre",-inf]"#,
        ] {
            let err = WktParser::new().create_from_wkt(wkt).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{}: {:?}", wkt, err);
        }
    }

    #[test]
    fn test_invalid_ellipsoid_parameters() {
        for wkt in [
            r#"SPHEROID["s",-1,298.257]"#,
            r#"SPHEROID["s",0,298.257]"#,
            r#"ELLIPSOID["s",6378137,-5,LENGTHUNIT["metre",1]]"#,
        ] {
            let err = WktParser::new().create_from_wkt(wkt).unwrap_err();
            assert!(err.to_string().contains("Invalid ellipsoid parameters"), "{}: {}", wkt, err);
        }
        let Object::Ellipsoid(sphere) = parse(r#"ELLIPSOID["sphere",6371000,0,LENGTHUNIT["metre",1]]"#) else {
            panic!()
        };
        assert_eq!(sphere.inverse_flattening, 0.0);
    }

    #[test]
    fn test_unsupported_keyword() {
        let err = WktParser::new().create_from_wkt("FOO[\"x\"]").unwrap_err();
        assert!(err.to_string().contains("Unsupported WKT object"));
    }

    #[test]
    fn test_warnings_and_strict_mode() {
        let wkt = r#"GEOGCS["x",DATUM["y",SPHEROID["z",6378137,298.257223563],TOWGS84[0,0,0]],UNIT["degree",0.0174532925199433]]"#;
        let mut parser = WktParser::new();
        parser.create_from_wkt(wkt).unwrap();
        assert_eq!(parser.warning_list().len(), 2);
        assert!(parser.warning_list()[0].contains("TOWGS84"));
        assert!(parser.warning_list()[1].contains("PRIMEM"));

        parser.create_from_wkt(&GeodeticCrs::epsg_4326().name).unwrap_err();
        assert!(parser.warning_list().is_empty(), "warnings reset per call");

        parser.set_strict(true);
        let err = parser.create_from_wkt(wkt).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_warnings_are_logged() {
        testing_logger::setup();
        let mut parser = WktParser::new();
        parser
            .create_from_wkt(r#"GEOGCS["x",DATUM["y",SPHEROID["z",6378137,0]],PRIMEM["Greenwich",0]]"#)
            .unwrap();
        testing_logger::validate(|captured| {
            assert!(captured
                .iter()
                .any(|l| l.level == log::Level::Warn && l.body.contains("Missing UNIT")));
        });
    }

    #[test]
    fn test_wkt2_axis_details() {
        let wkt = r#"GEODCRS["x",DATUM["y",ELLIPSOID["z",6378137,298.257223563]],CS[ellipsoidal,2],
            AXIS["longitude (Lon)",east,ORDER[2]],AXIS["latitude (Lat)",north,ORDER[1]],
            ANGLEUNIT["grad",0.015707963267949]]"#;
        match parse(wkt) {
            Object::Crs(Crs::Geodetic(crs)) => {
                assert_eq!(crs.cs.axes[0].name, "Latitude");
                assert_eq!(crs.cs.axes[0].abbreviation, "Lat");
                assert_eq!(crs.cs.axes[1].direction, AxisDirection::East);
                assert_eq!(crs.cs.axes[1].unit.name, "grad");
                assert_eq!(crs.datum.prime_meridian.unit.name, "grad");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_axis_count_mismatch() {
        let wkt = r#"GEODCRS["x",DATUM["y",ELLIPSOID["z",6378137,298.257223563]],CS[ellipsoidal,3],AXIS["(Lat)",north],ANGLEUNIT["degree",0.0174532925199433]]"#;
        assert!(WktParser::new().create_from_wkt(wkt).is_err());
    }

    #[test]
    fn test_usage_and_remarks() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563]],
            CS[ellipsoidal,2],AXIS["(Lat)",north],AXIS["(Lon)",east],ANGLEUNIT["degree",0.0174532925199433],
            USAGE[SCOPE["Horizontal component of 3D system."],AREA["World."],BBOX[-90,-180,90,180]],
            ID["EPSG",4326,"10.0"],REMARK["Note"]]"#;
        let Object::Crs(crs) = parse(wkt) else { panic!() };
        let usage = crs.usage();
        assert_eq!(usage.scope.as_deref(), Some("Horizontal component of 3D system."));
        let extent = usage.extent.as_ref().unwrap();
        assert_eq!(extent.bbox, Some(GeographicBoundingBox::new(-180.0, -90.0, 180.0, 90.0)));
        assert_eq!(crs.remarks(), Some("Note"));
        assert_eq!(crs.ids()[0].version.as_deref(), Some("10.0"));
    }

    #[test]
    fn test_transformation_round_trip() {
        let source = Arc::new(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let mut target_crs = GeodeticCrs::epsg_4326();
        target_crs.name = "Other".to_string();
        let translation = |name: &str, code: i32, v: f64| {
            OperationParameter::epsg(name, code, ParameterValue::measure(v, UnitOfMeasure::metre()))
        };
        let op = Transformation {
            accuracy: Some(2.5),
            ids: vec![Identifier::new("TEST", "1")],
            ..Transformation::new(
                "Shift",
                source,
                Arc::new(Crs::Geodetic(target_crs)),
                OperationMethod::epsg("Geocentric translations (geog2D domain)", 9603),
                vec![
                    translation("X-axis translation", 8605, 1.0),
                    translation("Y-axis translation", 8606, -2.0),
                    translation("Z-axis translation", 8607, 3.5),
                ],
            )
        };
        let object = Object::CoordinateOperation(CoordinateOperation::Transformation(op));
        for convention in [WktConvention::Wkt2_2018, WktConvention::Wkt2_2015Simplified] {
            let wkt = object.to_wkt(convention).unwrap();
            let parsed = parse(&wkt);
            assert!(parsed.is_equivalent_to(&object), "{}", wkt);
            let Object::CoordinateOperation(CoordinateOperation::Transformation(t)) = parsed else {
                panic!()
            };
            assert_eq!(t.accuracy, Some(2.5));
        }
    }

    #[test]
    fn test_inverse_and_proj_based_methods() {
        let mut proj_based = ProjBasedOperation::new("custom", "+proj=affine +xoff=1");
        proj_based.inverted = true;
        let object = Object::CoordinateOperation(CoordinateOperation::ProjBased(proj_based.clone()));
        let parsed = parse(&object.to_wkt(WktConvention::Wkt2_2018).unwrap());
        assert_eq!(parsed, object);

        let wkt = r#"CONVERSION["x",METHOD["Inverse of Transverse Mercator",ID["EPSG",9807]],PARAMETER["False easting",500000,LENGTHUNIT["metre",1]]]"#;
        let Object::CoordinateOperation(CoordinateOperation::Conversion(c)) = parse(wkt) else {
            panic!()
        };
        assert!(c.inverted);
        assert_eq!(c.method.name, "Transverse Mercator");
        assert_eq!(c.method.epsg_code(), Some(9807));
    }

    #[test]
    fn test_concatenated_round_trip() {
        let wgs84 = Arc::new(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let mut other = GeodeticCrs::epsg_4326();
        other.name = "Other".to_string();
        other.ids.clear();
        let other = Arc::new(Crs::Geodetic(other));
        let step = |name: &str, source: &Arc<Crs>, target: &Arc<Crs>| {
            CoordinateOperation::Transformation(Transformation::new(
                name,
                Arc::clone(source),
                Arc::clone(target),
                OperationMethod::new("Null"),
                Vec::new(),
            ))
        };
        let concatenated = Object::CoordinateOperation(CoordinateOperation::Concatenated(
            ConcatenatedOperation::new("chain", vec![step("a", &wgs84, &other), step("b", &other, &wgs84)]),
        ));
        let wkt = concatenated.to_wkt(WktConvention::Wkt2_2018).unwrap();
        let Object::CoordinateOperation(op) = parse(&wkt) else {
            panic!("{}", wkt)
        };
        assert_eq!(op.source_crs().unwrap().name(), "WGS 84");
        assert_eq!(op.target_crs().unwrap().name(), "WGS 84");
        let CoordinateOperation::Concatenated(parsed) = op else {
            panic!("{}", wkt)
        };
        assert_eq!(parsed.operations.len(), 2);
        assert_eq!(parsed.operations[0].target_crs().unwrap().name(), "Other");
        assert_eq!(parsed.operations[1].name(), "b");
    }

    #[test]
    fn test_vertical_and_compound() {
        let wkt = r#"COMPD_CS["WGS 84 + EGM96 height",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AXIS["Latitude",NORTH],AXIS["Longitude",EAST]],VERT_CS["EGM96 height",VERT_DATUM["EGM96 geoid",2005],UNIT["metre",1],AXIS["Gravity-related height",UP],AUTHORITY["EPSG","5773"]]]"#;
        let Object::Crs(Crs::Compound(compound)) = parse(wkt) else { panic!() };
        assert_eq!(compound.components.len(), 2);
        let Crs::Vertical(vertical) = &compound.components[1] else { panic!() };
        assert_eq!(vertical.cs.axes[0].abbreviation, "H");
        assert_eq!(vertical.ids, vec![Identifier::new("EPSG", "5773")]);

        let esri = r#"VERTCS["Depth_Test",VDATUM["Mean_Sea_Level"],PARAMETER["Vertical_Shift",0.0],PARAMETER["Direction",-1.0],UNIT["Meter",1.0]]"#;
        let Object::Crs(Crs::Vertical(depth)) = parse(esri) else { panic!() };
        assert!(depth.is_depth());
        assert_eq!(depth.name, "Depth Test");
        assert_eq!(depth.datum.name, "Mean Sea Level");
    }

    #[test]
    fn test_unknown_projection() {
        let wkt = r#"PROJCS["x",GEOGCS["y",DATUM["z",SPHEROID["s",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Fancy"],PARAMETER["alpha",1],UNIT["metre",1]]"#;
        let mut parser = WktParser::new();
        let Object::Crs(Crs::Projected(crs)) = parser.create_from_wkt(wkt).unwrap() else {
            panic!()
        };
        assert_eq!(crs.conversion.method.name, "Fancy");
        assert_eq!(parser.warning_list().len(), 1);
        assert!(parser.set_strict(true).create_from_wkt(wkt).is_err());
    }

    #[test]
    fn test_wkt1_missing_parameters_get_defaults() {
        let wkt = r#"PROJCS["x",GEOGCS["y",DATUM["WGS_1984",SPHEROID["s",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",9],UNIT["metre",1]]"#;
        let Object::Crs(Crs::Projected(crs)) = parse(wkt) else { panic!() };
        let params = &crs.conversion.parameters;
        assert_eq!(params.len(), 5);
        assert_eq!(params[1].epsg_code(), Some(8802));
        assert_eq!(params[2].value, ParameterValue::measure(1.0, UnitOfMeasure::unity()));
    }

    #[test]
    fn test_standalone_objects() {
        assert_eq!(
            parse(r#"LENGTHUNIT["metre",1,ID["EPSG",9001]]"#),
            Object::Unit(UnitOfMeasure::metre())
        );
        let Object::Ellipsoid(e) = parse(r#"ELLIPSOID["GRS 1980",6378137,298.257222101,LENGTHUNIT["metre",1]]"#) else {
            panic!()
        };
        assert!(e.is_equivalent_to(&Ellipsoid::grs1980()));
        assert!(matches!(
            parse(r#"VDATUM["EGM96 geoid"]"#),
            Object::Datum(Datum::Vertical(_))
        ));
    }

    #[test]
    fn test_split_axis_name() {
        assert_eq!(split_axis_name("geodetic latitude (Lat)"), ("geodetic latitude".into(), "Lat".into()));
        assert_eq!(split_axis_name("(E)"), ("".into(), "E".into()));
        assert_eq!(split_axis_name("Easting"), ("Easting".into(), "".into()));
    }

    const RENAMED_4326: &str = r#"GEOGCS["Local name",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

    #[test]
    fn test_literal_definition_wins_by_default() {
        let mut parser = WktParser::new();
        parser.attach_database_context(Some(crate::factory::tests::fixture()));
        let object = parser.create_from_wkt(RENAMED_4326).unwrap();

        assert_eq!(object.name(), "Local name");
        assert_eq!(object.ids(), vec![Identifier::new("EPSG", "4326")]);
    }

    #[test]
    fn test_prefer_registered_objects() {
        let mut parser = WktParser::new();
        parser
            .attach_database_context(Some(crate::factory::tests::fixture()))
            .set_prefer_registered_objects(true);
        let object = parser.create_from_wkt(RENAMED_4326).unwrap();

        assert_eq!(object.name(), "WGS 84");
        assert!(parser.warning_list().is_empty());
    }

    #[test]
    fn test_prefer_registered_falls_back_to_literal() {
        let wkt = RENAMED_4326.replace("\"4326\"", "\"999999\"");
        let mut parser = WktParser::new();
        parser
            .attach_database_context(Some(crate::factory::tests::fixture()))
            .set_prefer_registered_objects(true);
        let object = parser.create_from_wkt(&wkt).unwrap();

        assert_eq!(object.name(), "Local name");
        assert_eq!(parser.warning_list().len(), 1);
        assert!(parser.warning_list()[0].starts_with("Cannot resolve EPSG:999999"));

        parser.set_strict(true);
        assert!(parser.create_from_wkt(&wkt).is_err());
    }
}
