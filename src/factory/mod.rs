//! # Authority Factory
//!
//! Turns authority codes into domain objects by querying a
//! [`DatabaseContext`]. Each factory is bound to one authority name; every
//! reference found in a row (unit, ellipsoid, base CRS, conversion) is
//! resolved by a factory bound to the authority of that reference.
//!
//! ## Key Components
//!
//! - **`AuthorityFactory`**: the typed creators and code queries.
//! - **`ObjectType`**: categories used to enumerate codes and restrict name
//!   searches.
//! - **`existing`**: lookups of registered objects equivalent to a given one.
//! - **`names`**: fuzzy name search with deterministic ranking.
//! - **`operations`**: coordinate operation path resolution.
//! - **`ranking`**: the pluggable operation comparator.
//!
//! Built objects are cached in the context's [`crate::cache::ObjectCache`].
//! An empty authority name matches rows of any authority for the queries
//! that enumerate (codes, names), never for code lookups.

mod existing;
pub mod names;
pub mod object_type;
pub mod operations;
pub mod ranking;

pub use names::{MatchQuality, NameMatch};
pub use object_type::ObjectType;
pub use operations::OperationSearch;
pub use ranking::{sort_operations, DefaultOperationComparator, OperationComparator};

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::CacheKey;
use crate::database::rows::{
    AxisRow, CelestialBodyRow, CompoundCrsRow, ConversionRow, CoordinateSystemRow, EllipsoidRow,
    ExtentRow, GeodeticCrsRow, GeodeticDatumRow, ObjectKey, OperationRow, ParameterRow,
    PrimeMeridianRow, ProjectedCrsRow, UnitRow, UsageRow, VerticalCrsRow, VerticalDatumRow,
};
use crate::database::{str_col, DatabaseContext, OBJECT_TABLES};
use crate::error::{Error, Result};
use crate::model::{
    Axis, AxisDirection, CompoundCrs, ConcatenatedOperation, Conversion, CoordinateOperation,
    CoordinateSystem, Crs, CsKind, Datum, Ellipsoid, Extent, GeodeticCrs, GeodeticReferenceFrame,
    GeographicBoundingBox, Identifier, Object, OperationMethod, OperationParameter,
    ParameterValue, PrimeMeridian, ProjectedCrs, Transformation, UnitKind, UnitOfMeasure, Usage,
    VerticalCrs, VerticalReferenceFrame,
};
use crate::wkt::WktParser;

/// Tables holding transformations, in lookup order.
pub(crate) const TRANSFORMATION_TABLES: &[&str] = &[
    "helmert_transformation",
    "grid_transformation",
    "other_transformation",
];

/// Tables searched by [`AuthorityFactory::create_object`], in priority order.
const CREATE_OBJECT_TABLES: &[&str] = &[
    "geodetic_crs",
    "projected_crs",
    "vertical_crs",
    "compound_crs",
    "conversion",
    "helmert_transformation",
    "grid_transformation",
    "other_transformation",
    "concatenated_operation",
    "geodetic_datum",
    "vertical_datum",
    "ellipsoid",
    "prime_meridian",
    "coordinate_system",
    "unit_of_measure",
    "extent",
];

const CRS_TABLES: &[&str] = &["geodetic_crs", "projected_crs", "vertical_crs", "compound_crs"];

/// Builds domain objects from the codes of one authority.
#[derive(Debug, Clone)]
pub struct AuthorityFactory {
    db: Arc<DatabaseContext>,
    authority: String,
}

impl AuthorityFactory {
    pub fn create(db: Arc<DatabaseContext>, authority: &str) -> Self {
        Self {
            db,
            authority: authority.to_string(),
        }
    }

    pub fn database_context(&self) -> &Arc<DatabaseContext> {
        &self.db
    }

    pub fn get_authority(&self) -> &str {
        &self.authority
    }

    /// Factory for references to objects of another authority.
    fn for_authority(&self, authority: &str) -> AuthorityFactory {
        AuthorityFactory::create(Arc::clone(&self.db), authority)
    }

    fn identifier(&self, code: &str) -> Identifier {
        Identifier::new(&self.authority, code)
    }

    fn no_such_code(&self, what: &str, code: &str) -> Error {
        Error::no_such_code(
            format!("{} not found: {}:{}", what, self.authority, code),
            &self.authority,
            code,
        )
    }

    fn unexpected(&self, code: &str, expected: &str, found: &Object) -> Error {
        Error::factory(format!(
            "{}:{} is a {}, not a {}",
            self.authority,
            code,
            found.kind_name(),
            expected
        ))
    }

    fn row<T: DeserializeOwned>(
        &self,
        table: &str,
        what: &str,
        code: &str,
    ) -> Result<(ObjectKey, T)> {
        let (key, row) = self
            .db
            .find_object::<T>(table, &self.authority, code)?
            .ok_or_else(|| self.no_such_code(what, code))?;
        if key.deprecated {
            log::warn!(
                "{} {}:{} ({}) is deprecated",
                what,
                self.authority,
                key.code,
                key.name
            );
        }
        Ok((key, row))
    }

    fn exists(&self, table: &str, code: &str) -> Result<bool> {
        Ok(self
            .db
            .find_object::<ObjectKey>(table, &self.authority, code)?
            .is_some())
    }

    fn cached(
        &self,
        table: &str,
        code: &str,
        build: impl FnOnce() -> Result<Object>,
    ) -> Result<Arc<Object>> {
        self.db
            .cache()
            .get_or_process(CacheKey::new(table, &self.authority, code), build)
    }

    /// Scope and extent of the object `code` of `table`.
    fn usage_of(&self, table: &str, code: &str) -> Result<Usage> {
        let rows: Vec<UsageRow> = self.db.query("usage", |row| {
            str_col(row, "object_table_name") == Some(table)
                && str_col(row, "object_auth_name") == Some(self.authority.as_str())
                && str_col(row, "object_code") == Some(code)
        })?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(Usage::default());
        };
        let extent = self
            .for_authority(&row.extent_auth_name)
            .create_extent(&row.extent_code)?;
        Ok(Usage {
            scope: row.scope,
            extent: Some(extent),
        })
    }

    /// Parse a definition stored as WKT.
    fn parse_stored(&self, text: &str, code: &str) -> Result<Object> {
        let mut parser = WktParser::new();
        parser.attach_database_context(Some(Arc::clone(&self.db)));
        parser.create_from_wkt(text).map_err(|e| {
            Error::factory(format!(
                "Invalid stored definition of {}:{}: {}",
                self.authority, code, e
            ))
        })
    }

    pub fn create_unit_of_measure(&self, code: &str) -> Result<UnitOfMeasure> {
        let object = self.cached("unit_of_measure", code, || {
            let (key, row): (ObjectKey, UnitRow) =
                self.row("unit_of_measure", "Unit of measure", code)?;
            let kind = UnitKind::from_type_name(&row.unit_type).ok_or_else(|| {
                Error::factory(format!(
                    "Unit {}:{} has unknown type '{}'",
                    self.authority, code, row.unit_type
                ))
            })?;
            let factor = row.conv_factor.ok_or_else(|| {
                Error::factory(format!(
                    "Unit {}:{} has no conversion factor",
                    self.authority, code
                ))
            })?;
            Ok(Object::Unit(UnitOfMeasure {
                id: Some(self.identifier(&key.code)),
                ..UnitOfMeasure::new(&row.name, factor, kind)
            }))
        })?;
        match object.as_ref() {
            Object::Unit(unit) => Ok(unit.clone()),
            other => Err(self.unexpected(code, "unit of measure", other)),
        }
    }

    pub fn create_extent(&self, code: &str) -> Result<Extent> {
        let object = self.cached("extent", code, || {
            let (key, row): (ObjectKey, ExtentRow) = self.row("extent", "Extent", code)?;
            let bbox = match (row.west_lon, row.south_lat, row.east_lon, row.north_lat) {
                (Some(west), Some(south), Some(east), Some(north)) => {
                    Some(GeographicBoundingBox::new(west, south, east, north))
                }
                _ => None,
            };
            Ok(Object::Extent(Extent {
                description: Some(row.description.unwrap_or(row.name)),
                bbox,
                ids: vec![self.identifier(&key.code)],
            }))
        })?;
        match object.as_ref() {
            Object::Extent(extent) => Ok(extent.clone()),
            other => Err(self.unexpected(code, "extent", other)),
        }
    }

    pub fn create_prime_meridian(&self, code: &str) -> Result<PrimeMeridian> {
        let object = self.cached("prime_meridian", code, || {
            let (key, row): (ObjectKey, PrimeMeridianRow) =
                self.row("prime_meridian", "Prime meridian", code)?;
            let unit = self
                .for_authority(&row.uom_auth_name)
                .create_unit_of_measure(&row.uom_code)?;
            Ok(Object::PrimeMeridian(PrimeMeridian {
                name: row.name,
                longitude: row.longitude,
                unit,
                ids: vec![self.identifier(&key.code)],
            }))
        })?;
        match object.as_ref() {
            Object::PrimeMeridian(pm) => Ok(pm.clone()),
            other => Err(self.unexpected(code, "prime meridian", other)),
        }
    }

    /// Name of the celestial body whose semi-major axis matches `a` (metres)
    /// within the relative `tolerance`.
    pub fn identify_body_from_semi_major_axis(&self, a: f64, tolerance: f64) -> Result<String> {
        let bodies: Vec<CelestialBodyRow> = self.db.query("celestial_body", |_| true)?;
        bodies
            .into_iter()
            .find(|body| (body.semi_major_axis - a).abs() <= tolerance * body.semi_major_axis)
            .map(|body| body.name)
            .ok_or_else(|| {
                Error::factory(format!("No celestial body has a semi-major axis of {} m", a))
            })
    }

    pub fn create_ellipsoid(&self, code: &str) -> Result<Ellipsoid> {
        let object = self.cached("ellipsoid", code, || {
            let (key, row): (ObjectKey, EllipsoidRow) = self.row("ellipsoid", "Ellipsoid", code)?;
            let a = row.semi_major_axis;
            let inverse_flattening = match (row.inv_flattening, row.semi_minor_axis) {
                (Some(rf), _) => rf,
                (None, Some(b)) if b == a => 0.0,
                (None, Some(b)) => a / (a - b),
                (None, None) => {
                    return Err(Error::factory(format!(
                        "Ellipsoid {}:{} has neither an inverse flattening nor a semi-minor axis",
                        self.authority, code
                    )))
                }
            };
            let unit = self
                .for_authority(&row.uom_auth_name)
                .create_unit_of_measure(&row.uom_code)?;
            Ok(Object::Ellipsoid(Ellipsoid {
                unit,
                ids: vec![self.identifier(&key.code)],
                ..Ellipsoid::new(&row.name, a, inverse_flattening)
            }))
        })?;
        match object.as_ref() {
            Object::Ellipsoid(ellipsoid) => Ok(ellipsoid.clone()),
            other => Err(self.unexpected(code, "ellipsoid", other)),
        }
    }

    pub fn create_geodetic_datum(&self, code: &str) -> Result<GeodeticReferenceFrame> {
        let object = self.cached("geodetic_datum", code, || {
            let (key, row): (ObjectKey, GeodeticDatumRow) =
                self.row("geodetic_datum", "Geodetic datum", code)?;
            let ellipsoid = self
                .for_authority(&row.ellipsoid_auth_name)
                .create_ellipsoid(&row.ellipsoid_code)?;
            let prime_meridian = self
                .for_authority(&row.prime_meridian_auth_name)
                .create_prime_meridian(&row.prime_meridian_code)?;
            Ok(Object::Datum(Datum::Geodetic(GeodeticReferenceFrame {
                name: row.name,
                ellipsoid,
                prime_meridian,
                anchor: row.anchor,
                ids: vec![self.identifier(&key.code)],
            })))
        })?;
        match object.as_ref() {
            Object::Datum(Datum::Geodetic(datum)) => Ok(datum.clone()),
            other => Err(self.unexpected(code, "geodetic datum", other)),
        }
    }

    pub fn create_vertical_datum(&self, code: &str) -> Result<VerticalReferenceFrame> {
        let object = self.cached("vertical_datum", code, || {
            let (key, row): (ObjectKey, VerticalDatumRow) =
                self.row("vertical_datum", "Vertical datum", code)?;
            Ok(Object::Datum(Datum::Vertical(VerticalReferenceFrame {
                anchor: row.anchor,
                ids: vec![self.identifier(&key.code)],
                ..VerticalReferenceFrame::new(&row.name)
            })))
        })?;
        match object.as_ref() {
            Object::Datum(Datum::Vertical(datum)) => Ok(datum.clone()),
            other => Err(self.unexpected(code, "vertical datum", other)),
        }
    }

    pub fn create_datum(&self, code: &str) -> Result<Datum> {
        if self.exists("geodetic_datum", code)? {
            return Ok(Datum::Geodetic(self.create_geodetic_datum(code)?));
        }
        if self.exists("vertical_datum", code)? {
            return Ok(Datum::Vertical(self.create_vertical_datum(code)?));
        }
        Err(self.no_such_code("Datum", code))
    }

    pub fn create_coordinate_system(&self, code: &str) -> Result<CoordinateSystem> {
        let object = self.cached("coordinate_system", code, || {
            let (_, row): (ObjectKey, CoordinateSystemRow) =
                self.row("coordinate_system", "Coordinate system", code)?;
            let kind = CsKind::parse(&row.cs_type).ok_or_else(|| {
                Error::factory(format!(
                    "Coordinate system {}:{} has unsupported type '{}'",
                    self.authority, code, row.cs_type
                ))
            })?;
            let mut axis_rows: Vec<AxisRow> = self.db.query("axis", |r| {
                str_col(r, "coordinate_system_auth_name") == Some(self.authority.as_str())
                    && str_col(r, "coordinate_system_code") == Some(code)
            })?;
            axis_rows.sort_by_key(|axis| axis.coordinate_system_order);
            if axis_rows.len() != row.dimension {
                return Err(Error::factory(format!(
                    "Coordinate system {}:{} declares {} axes but has {}",
                    self.authority,
                    code,
                    row.dimension,
                    axis_rows.len()
                )));
            }
            let mut axes = Vec::with_capacity(axis_rows.len());
            for axis in axis_rows {
                let direction = AxisDirection::parse(&axis.orientation).ok_or_else(|| {
                    Error::factory(format!(
                        "Axis '{}' of {}:{} has unknown orientation '{}'",
                        axis.name, self.authority, code, axis.orientation
                    ))
                })?;
                let unit = self
                    .for_authority(&axis.uom_auth_name)
                    .create_unit_of_measure(&axis.uom_code)?;
                axes.push(Axis::new(&axis.name, &axis.abbrev, direction, unit));
            }
            Ok(Object::CoordinateSystem(CoordinateSystem::new(kind, axes)))
        })?;
        match object.as_ref() {
            Object::CoordinateSystem(cs) => Ok(cs.clone()),
            other => Err(self.unexpected(code, "coordinate system", other)),
        }
    }

    pub fn create_geodetic_crs(&self, code: &str) -> Result<GeodeticCrs> {
        let object = self.cached("geodetic_crs", code, || {
            let (_, row): (ObjectKey, GeodeticCrsRow) =
                self.row("geodetic_crs", "Geodetic CRS", code)?;
            let expected = match row.crs_type.as_str() {
                "geocentric" => CsKind::Cartesian,
                t if t.starts_with("geographic") => CsKind::Ellipsoidal,
                other => {
                    return Err(Error::factory(format!(
                        "Geodetic CRS {}:{} has unsupported type '{}'",
                        self.authority, code, other
                    )))
                }
            };
            let mut crs = match row.text_definition.as_deref() {
                Some(text) => match self.parse_stored(text, code)? {
                    Object::Crs(Crs::Geodetic(crs)) => crs,
                    other => return Err(self.unexpected(code, "geodetic CRS", &other)),
                },
                None => {
                    let (Some(cs_auth), Some(cs_code), Some(datum_auth), Some(datum_code)) = (
                        row.coordinate_system_auth_name.as_deref(),
                        row.coordinate_system_code.as_deref(),
                        row.datum_auth_name.as_deref(),
                        row.datum_code.as_deref(),
                    ) else {
                        return Err(Error::factory(format!(
                            "Geodetic CRS {}:{} has neither a definition nor references",
                            self.authority, code
                        )));
                    };
                    let datum = self.for_authority(datum_auth).create_geodetic_datum(datum_code)?;
                    let cs = self.for_authority(cs_auth).create_coordinate_system(cs_code)?;
                    GeodeticCrs::new(&row.name, datum, cs)
                }
            };
            if crs.cs.kind != expected {
                return Err(Error::factory(format!(
                    "Geodetic CRS {}:{} of type '{}' has a {} coordinate system",
                    self.authority,
                    code,
                    row.crs_type,
                    crs.cs.kind.wkt_name()
                )));
            }
            crs.ids = vec![self.identifier(code)];
            crs.usage = self.usage_of("geodetic_crs", code)?;
            Ok(Object::Crs(Crs::Geodetic(crs)))
        })?;
        match object.as_ref() {
            Object::Crs(Crs::Geodetic(crs)) => Ok(crs.clone()),
            other => Err(self.unexpected(code, "geodetic CRS", other)),
        }
    }

    pub fn create_geographic_crs(&self, code: &str) -> Result<GeodeticCrs> {
        let crs = self.create_geodetic_crs(code)?;
        if !crs.is_geographic() {
            return Err(Error::factory(format!(
                "{}:{} is a geocentric CRS, not a geographic CRS",
                self.authority, code
            )));
        }
        Ok(crs)
    }

    pub fn create_vertical_crs(&self, code: &str) -> Result<VerticalCrs> {
        let object = self.cached("vertical_crs", code, || {
            let (_, row): (ObjectKey, VerticalCrsRow) =
                self.row("vertical_crs", "Vertical CRS", code)?;
            let datum = self
                .for_authority(&row.datum_auth_name)
                .create_vertical_datum(&row.datum_code)?;
            let cs = self
                .for_authority(&row.coordinate_system_auth_name)
                .create_coordinate_system(&row.coordinate_system_code)?;
            if cs.kind != CsKind::Vertical {
                return Err(Error::factory(format!(
                    "Vertical CRS {}:{} has a {} coordinate system",
                    self.authority,
                    code,
                    cs.kind.wkt_name()
                )));
            }
            Ok(Object::Crs(Crs::Vertical(VerticalCrs {
                ids: vec![self.identifier(code)],
                usage: self.usage_of("vertical_crs", code)?,
                ..VerticalCrs::new(&row.name, datum, cs)
            })))
        })?;
        match object.as_ref() {
            Object::Crs(Crs::Vertical(crs)) => Ok(crs.clone()),
            other => Err(self.unexpected(code, "vertical CRS", other)),
        }
    }

    fn build_parameters(&self, rows: &[ParameterRow], code: &str) -> Result<Vec<OperationParameter>> {
        rows.iter()
            .map(|p| {
                let value = match (&p.file, p.value, &p.uom_auth_name, &p.uom_code) {
                    (Some(file), ..) => ParameterValue::File(file.clone()),
                    (None, Some(value), Some(uom_auth), Some(uom_code)) => ParameterValue::measure(
                        value,
                        self.for_authority(uom_auth).create_unit_of_measure(uom_code)?,
                    ),
                    (None, Some(value), _, _) => {
                        ParameterValue::measure(value, UnitOfMeasure::unity())
                    }
                    _ => {
                        return Err(Error::factory(format!(
                            "Parameter '{}' of {}:{} has no value",
                            p.name, self.authority, code
                        )))
                    }
                };
                let ids = match (&p.auth_name, &p.code) {
                    (Some(auth), Some(code)) => vec![Identifier::new(auth, code)],
                    _ => Vec::new(),
                };
                Ok(OperationParameter {
                    ids,
                    ..OperationParameter::new(&p.name, value)
                })
            })
            .collect()
    }

    pub fn create_conversion(&self, code: &str) -> Result<Conversion> {
        let object = self.cached("conversion", code, || {
            let (_, row): (ObjectKey, ConversionRow) = self.row("conversion", "Conversion", code)?;
            let method = operation_method(&row.method_name, &row.method_auth_name, &row.method_code);
            let parameters = self.build_parameters(&row.parameters, code)?;
            Ok(Object::CoordinateOperation(CoordinateOperation::Conversion(Conversion {
                ids: vec![self.identifier(code)],
                ..Conversion::new(&row.name, method, parameters)
            })))
        })?;
        match object.as_ref() {
            Object::CoordinateOperation(CoordinateOperation::Conversion(conversion)) => {
                Ok(conversion.clone())
            }
            other => Err(self.unexpected(code, "conversion", other)),
        }
    }

    pub fn create_projected_crs(&self, code: &str) -> Result<ProjectedCrs> {
        let object = self.cached("projected_crs", code, || {
            let (_, row): (ObjectKey, ProjectedCrsRow) =
                self.row("projected_crs", "Projected CRS", code)?;
            let mut crs = match row.text_definition.as_deref() {
                Some(text) => match self.parse_stored(text, code)? {
                    Object::Crs(Crs::Projected(crs)) => crs,
                    other => return Err(self.unexpected(code, "projected CRS", &other)),
                },
                None => {
                    let (
                        Some(cs_auth),
                        Some(cs_code),
                        Some(base_auth),
                        Some(base_code),
                        Some(conv_auth),
                        Some(conv_code),
                    ) = (
                        row.coordinate_system_auth_name.as_deref(),
                        row.coordinate_system_code.as_deref(),
                        row.geodetic_crs_auth_name.as_deref(),
                        row.geodetic_crs_code.as_deref(),
                        row.conversion_auth_name.as_deref(),
                        row.conversion_code.as_deref(),
                    )
                    else {
                        return Err(Error::factory(format!(
                            "Projected CRS {}:{} has neither a definition nor references",
                            self.authority, code
                        )));
                    };
                    let base = self.for_authority(base_auth).create_geodetic_crs(base_code)?;
                    let conversion = self.for_authority(conv_auth).create_conversion(conv_code)?;
                    let cs = self.for_authority(cs_auth).create_coordinate_system(cs_code)?;
                    ProjectedCrs::new(&row.name, base, conversion, cs)
                }
            };
            if crs.cs.kind != CsKind::Cartesian {
                return Err(Error::factory(format!(
                    "Projected CRS {}:{} has a {} coordinate system",
                    self.authority,
                    code,
                    crs.cs.kind.wkt_name()
                )));
            }
            crs.ids = vec![self.identifier(code)];
            crs.usage = self.usage_of("projected_crs", code)?;
            Ok(Object::Crs(Crs::Projected(crs)))
        })?;
        match object.as_ref() {
            Object::Crs(Crs::Projected(crs)) => Ok(crs.clone()),
            other => Err(self.unexpected(code, "projected CRS", other)),
        }
    }

    pub fn create_compound_crs(&self, code: &str) -> Result<CompoundCrs> {
        let object = self.cached("compound_crs", code, || {
            let (_, row): (ObjectKey, CompoundCrsRow) =
                self.row("compound_crs", "Compound CRS", code)?;
            let horizontal = self
                .for_authority(&row.horiz_crs_auth_name)
                .create_coordinate_reference_system(&row.horiz_crs_code)?;
            let vertical = self
                .for_authority(&row.vertical_crs_auth_name)
                .create_vertical_crs(&row.vertical_crs_code)?;
            Ok(Object::Crs(Crs::Compound(CompoundCrs {
                ids: vec![self.identifier(code)],
                usage: self.usage_of("compound_crs", code)?,
                ..CompoundCrs::new(&row.name, vec![horizontal, Crs::Vertical(vertical)])
            })))
        })?;
        match object.as_ref() {
            Object::Crs(Crs::Compound(crs)) => Ok(crs.clone()),
            other => Err(self.unexpected(code, "compound CRS", other)),
        }
    }

    /// Any CRS, looked up in the geodetic, projected, vertical and compound
    /// tables in that order.
    pub fn create_coordinate_reference_system(&self, code: &str) -> Result<Crs> {
        for table in CRS_TABLES {
            if self.exists(table, code)? {
                return match self.create_object_from_table(table, code)? {
                    Object::Crs(crs) => Ok(crs),
                    other => Err(self.unexpected(code, "CRS", &other)),
                };
            }
        }
        Err(self.no_such_code("CRS", code))
    }

    /// Any coordinate operation. With `use_proj_alternative_grid_names`,
    /// grid file parameters name the local replacement of the official grid
    /// when one is registered.
    pub fn create_coordinate_operation(
        &self,
        code: &str,
        use_proj_alternative_grid_names: bool,
    ) -> Result<CoordinateOperation> {
        if self.exists("conversion", code)? {
            return Ok(CoordinateOperation::Conversion(self.create_conversion(code)?));
        }
        for table in TRANSFORMATION_TABLES {
            if self.exists(table, code)? {
                return Ok(CoordinateOperation::Transformation(
                    self.create_transformation(table, code, use_proj_alternative_grid_names)?,
                ));
            }
        }
        if self.exists("concatenated_operation", code)? {
            return Ok(CoordinateOperation::Concatenated(
                self.create_concatenated_operation(code, use_proj_alternative_grid_names)?,
            ));
        }
        Err(self.no_such_code("Coordinate operation", code))
    }

    pub(crate) fn create_transformation(
        &self,
        table: &str,
        code: &str,
        use_proj_alternative_grid_names: bool,
    ) -> Result<Transformation> {
        let cache_table = grid_cache_table(table, use_proj_alternative_grid_names);
        let object = self.cached(&cache_table, code, || {
            let (key, row): (ObjectKey, OperationRow) = self.row(table, "Transformation", code)?;
            let method_name = row.method_name.as_deref().ok_or_else(|| {
                Error::factory(format!(
                    "Transformation {}:{} has no method",
                    self.authority, code
                ))
            })?;
            let method = operation_method(method_name, &row.method_auth_name, &row.method_code);
            let source = self
                .for_authority(&row.source_crs_auth_name)
                .create_coordinate_reference_system(&row.source_crs_code)?;
            let target = self
                .for_authority(&row.target_crs_auth_name)
                .create_coordinate_reference_system(&row.target_crs_code)?;
            let mut parameters = self.build_parameters(&row.parameters, code)?;
            if use_proj_alternative_grid_names {
                for parameter in &mut parameters {
                    let alternative = match &parameter.value {
                        ParameterValue::File(name) => self.db.look_for_grid_alternative(name)?,
                        _ => None,
                    };
                    if let Some(alternative) = alternative {
                        parameter.value = ParameterValue::File(alternative.proj_filename);
                    }
                }
            }
            Ok(Object::CoordinateOperation(CoordinateOperation::Transformation(
                Transformation {
                    accuracy: row.accuracy,
                    ids: vec![self.identifier(code)],
                    usage: self.usage_of(table, code)?,
                    deprecated: key.deprecated,
                    ..Transformation::new(
                        &row.name,
                        Arc::new(source),
                        Arc::new(target),
                        method,
                        parameters,
                    )
                },
            )))
        })?;
        match object.as_ref() {
            Object::CoordinateOperation(CoordinateOperation::Transformation(t)) => Ok(t.clone()),
            other => Err(self.unexpected(code, "transformation", other)),
        }
    }

    pub(crate) fn create_concatenated_operation(
        &self,
        code: &str,
        use_proj_alternative_grid_names: bool,
    ) -> Result<ConcatenatedOperation> {
        let cache_table = grid_cache_table("concatenated_operation", use_proj_alternative_grid_names);
        let object = self.cached(&cache_table, code, || {
            let (key, row): (ObjectKey, OperationRow) =
                self.row("concatenated_operation", "Concatenated operation", code)?;
            if row.steps.is_empty() {
                return Err(Error::factory(format!(
                    "Concatenated operation {}:{} has no steps",
                    self.authority, code
                )));
            }
            let mut current = Identifier::new(&row.source_crs_auth_name, &row.source_crs_code);
            let mut operations = Vec::with_capacity(row.steps.len());
            for step in &row.steps {
                let mut op = self
                    .for_authority(&step.auth_name)
                    .create_coordinate_operation(&step.code, use_proj_alternative_grid_names)?;
                let starts_here = op
                    .source_crs()
                    .map(|crs| has_id(crs.ids(), &current))
                    .unwrap_or(true);
                let ends_here = op
                    .target_crs()
                    .is_some_and(|crs| has_id(crs.ids(), &current));
                if !starts_here && ends_here {
                    op = op.inverse();
                }
                if let Some(next) = op.target_crs().and_then(|crs| crs.ids().first()) {
                    current = next.clone();
                }
                operations.push(op);
            }
            Ok(Object::CoordinateOperation(CoordinateOperation::Concatenated(
                ConcatenatedOperation {
                    ids: vec![self.identifier(code)],
                    usage: self.usage_of("concatenated_operation", code)?,
                    deprecated: key.deprecated,
                    ..ConcatenatedOperation::new(&row.name, operations)
                },
            )))
        })?;
        match object.as_ref() {
            Object::CoordinateOperation(CoordinateOperation::Concatenated(op)) => Ok(op.clone()),
            other => Err(self.unexpected(code, "concatenated operation", other)),
        }
    }

    /// The object registered as `code`, whatever its kind. CRS tables are
    /// searched first, then operations, datums and the remaining tables.
    pub fn create_object(&self, code: &str) -> Result<Object> {
        for table in CREATE_OBJECT_TABLES {
            if self.exists(table, code)? {
                return self.create_object_from_table(table, code);
            }
        }
        Err(self.no_such_code("Object", code))
    }

    pub(crate) fn create_object_from_table(&self, table: &str, code: &str) -> Result<Object> {
        Ok(match table {
            "unit_of_measure" => Object::Unit(self.create_unit_of_measure(code)?),
            "extent" => Object::Extent(self.create_extent(code)?),
            "prime_meridian" => Object::PrimeMeridian(self.create_prime_meridian(code)?),
            "ellipsoid" => Object::Ellipsoid(self.create_ellipsoid(code)?),
            "geodetic_datum" => Object::Datum(Datum::Geodetic(self.create_geodetic_datum(code)?)),
            "vertical_datum" => Object::Datum(Datum::Vertical(self.create_vertical_datum(code)?)),
            "coordinate_system" => Object::CoordinateSystem(self.create_coordinate_system(code)?),
            "geodetic_crs" => Object::Crs(Crs::Geodetic(self.create_geodetic_crs(code)?)),
            "projected_crs" => Object::Crs(Crs::Projected(self.create_projected_crs(code)?)),
            "vertical_crs" => Object::Crs(Crs::Vertical(self.create_vertical_crs(code)?)),
            "compound_crs" => Object::Crs(Crs::Compound(self.create_compound_crs(code)?)),
            "conversion" => Object::CoordinateOperation(CoordinateOperation::Conversion(
                self.create_conversion(code)?,
            )),
            "helmert_transformation" | "grid_transformation" | "other_transformation" => {
                Object::CoordinateOperation(CoordinateOperation::Transformation(
                    self.create_transformation(table, code, false)?,
                ))
            }
            "concatenated_operation" => Object::CoordinateOperation(
                CoordinateOperation::Concatenated(self.create_concatenated_operation(code, false)?),
            ),
            other => {
                return Err(Error::factory(format!(
                    "Objects of table '{}' cannot be built",
                    other
                )))
            }
        })
    }

    /// Codes of every object of `object_type`, sorted.
    pub fn get_authority_codes(
        &self,
        object_type: ObjectType,
        allow_deprecated: bool,
    ) -> Result<BTreeSet<String>> {
        let store = self.db.store()?;
        let mut codes = BTreeSet::new();
        for table in object_type.tables() {
            for row in store.rows(table)? {
                if !self.authority.is_empty()
                    && str_col(row, "auth_name") != Some(self.authority.as_str())
                {
                    continue;
                }
                if !object_type.accepts(table, row) {
                    continue;
                }
                let deprecated = row
                    .get("deprecated")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if deprecated && !allow_deprecated {
                    continue;
                }
                if let Some(code) = str_col(row, "code") {
                    codes.insert(code.to_string());
                }
            }
        }
        Ok(codes)
    }

    /// Name of the object registered as `code`.
    pub fn get_description_text(&self, code: &str) -> Result<String> {
        for table in OBJECT_TABLES {
            if let Some((key, _)) = self.db.find_object::<ObjectKey>(table, &self.authority, code)? {
                return Ok(key.name);
            }
        }
        Err(self.no_such_code("Object", code))
    }

    /// Official name of the object known as `alias` by `source`.
    pub fn get_official_name_from_alias(
        &self,
        alias: &str,
        table: &str,
        source: &str,
    ) -> Result<Option<String>> {
        self.db.get_official_name_from_alias(alias, table, source)
    }
}

fn operation_method(name: &str, auth: &Option<String>, code: &Option<String>) -> OperationMethod {
    let ids = match (auth, code) {
        (Some(auth), Some(code)) => vec![Identifier::new(auth, code)],
        _ => Vec::new(),
    };
    OperationMethod {
        ids,
        ..OperationMethod::new(name)
    }
}

fn grid_cache_table(table: &str, use_proj_alternative_grid_names: bool) -> String {
    if use_proj_alternative_grid_names {
        format!("{}#proj_grids", table)
    } else {
        table.to_string()
    }
}

fn has_id(ids: &[Identifier], wanted: &Identifier) -> bool {
    ids.iter()
        .any(|id| id.authority == wanted.authority && id.code == wanted.code)
}
