//! # Pipeline String Parser
//!
//! Builds domain objects from pipeline strings. Single steps naming a
//! geographic, geocentric or known projection become CRSs; every other
//! step and every pipeline becomes a [`ProjBasedOperation`] keeping the
//! normalized text.
//!
//! ## Shorthands
//!
//! `+datum=` and `+ellps=` are resolved through the built-in tables. With
//! PROJ.4 init rules and an attached repository they are first looked up
//! among the repository aliases registered for the `PROJ` source, falling
//! back to the built-in tables with a warning.
//!
//! ## Warnings
//!
//! Duplicate, empty and unknown parameters and ignored `+towgs84=` /
//! `+nadgrids=` clauses are logged and recorded in
//! [`ProjStringParser::warning_list`]. In strict mode they are parse errors.

use std::collections::HashSet;
use std::sync::Arc;

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::factory::{AuthorityFactory, ObjectType};
use crate::mappings::{self, MethodMapping, EPSG_LCC_1SP, EPSG_LCC_2SP, EPSG_MERCATOR_A, EPSG_PSEUDO_MERCATOR, EPSG_TRANSVERSE_MERCATOR};
use crate::model::{
    Conversion, CoordinateOperation, CoordinateSystem, Crs, Datum, Ellipsoid, GeodeticCrs,
    GeodeticReferenceFrame, Identifier, Object, OperationMethod, OperationParameter,
    ParameterValue, PrimeMeridian, ProjBasedOperation, ProjectedCrs, UnitKind, UnitOfMeasure,
};

use super::tokens::{tokenize, ProjTokens, Step};

/// Name given to operations only known through their pipeline string.
const PROJ_BASED_OPERATION_NAME: &str = "PROJ-based coordinate operation";

/// Parameters understood on every CRS step.
const CRS_KEYS: &[&str] = &[
    "datum", "ellps", "a", "b", "rf", "f", "R", "pm", "towgs84", "nadgrids", "no_defs", "type",
    "wktext", "units", "to_meter", "axis", "over", "title", "vunits", "vto_meter",
];

/// Extra parameters of projection steps.
const PROJECTION_KEYS: &[&str] = &["zone", "south", "k_0", "approx", "lat_ts"];

fn is_geographic_step(name: &str) -> bool {
    matches!(name, "longlat" | "lonlat" | "latlong" | "latlon")
}

/// Builds domain objects from pipeline strings.
#[derive(Debug, Default)]
pub struct ProjStringParser {
    db: Option<Arc<DatabaseContext>>,
    use_proj4_init_rules: bool,
    strict: bool,
    warnings: Vec<String>,
}

impl ProjStringParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository used for `+init=` references and PROJ.4 init rules.
    pub fn attach_database_context(&mut self, db: Option<Arc<DatabaseContext>>) -> &mut Self {
        self.db = db;
        self
    }

    /// Resolve shorthands through the repository and return `+init=` CRSs
    /// in longitude/latitude order, like PROJ.4 did.
    pub fn set_use_proj4_init_rules(&mut self, enabled: bool) -> &mut Self {
        self.use_proj4_init_rules = enabled;
        self
    }

    /// In strict mode every warning is a parse error.
    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Warnings of the last
    /// [`create_from_proj_string`](Self::create_from_proj_string) call.
    pub fn warning_list(&self) -> &[String] {
        &self.warnings
    }

    /// Parse `text` into an object.
    pub fn create_from_proj_string(&mut self, text: &str) -> Result<Object> {
        self.warnings.clear();
        let tokens = tokenize(text)?;
        for step in &tokens.steps {
            self.check_params(step)?;
        }
        let is_crs = tokens
            .global_params
            .iter()
            .chain(tokens.steps.iter().flat_map(|step| step.params.iter()))
            .any(|p| p.key == "type" && p.value.as_deref() == Some("crs"));

        if tokens.pipeline {
            if is_crs {
                return Err(Error::parse("A pipeline cannot be used as a CRS"));
            }
            return Ok(proj_based(&tokens));
        }

        let step = &tokens.steps[0];
        if let Some(init) = step.value("init") {
            return self.resolve_init(step, init);
        }
        if step.inverted {
            if is_crs {
                return Err(Error::parse("An inverted step cannot be used as a CRS"));
            }
            return Ok(proj_based(&tokens));
        }

        let name = step.name.as_str();
        if is_geographic_step(name) {
            return Ok(Object::Crs(Crs::Geodetic(self.geographic_crs(step)?)));
        }
        if matches!(name, "geocent" | "cart") && is_crs {
            return Ok(Object::Crs(Crs::Geodetic(self.geocentric_crs(step)?)));
        }
        if let Some(crs) = self.projected_crs(step)? {
            return Ok(Object::Crs(Crs::Projected(crs)));
        }
        if is_crs {
            return Err(Error::parse(format!(
                "+proj={} cannot be expressed as a CRS",
                name
            )));
        }
        Ok(proj_based(&tokens))
    }

    fn warn(&mut self, message: String) -> Result<()> {
        if self.strict {
            return Err(Error::parse(message));
        }
        log::warn!("{}", message);
        self.warnings.push(message);
        Ok(())
    }

    fn check_params(&mut self, step: &Step) -> Result<()> {
        let mut seen = HashSet::new();
        for param in &step.params {
            if !seen.insert(param.key.as_str()) {
                self.warn(format!(
                    "Duplicate parameter +{} in step '{}'",
                    param.key, step.name
                ))?;
            }
            if param.value.as_deref() == Some("") {
                self.warn(format!("Parameter +{} has an empty value", param.key))?;
            }
        }
        Ok(())
    }

    fn warn_unknown_params(&mut self, step: &Step, known: &[&str]) -> Result<()> {
        for param in &step.params {
            let key = param.key.as_str();
            if !CRS_KEYS.contains(&key) && !known.contains(&key) {
                self.warn(format!(
                    "Unknown parameter +{} of +proj={} ignored",
                    key, step.name
                ))?;
            }
        }
        Ok(())
    }

    fn resolve_init(&mut self, step: &Step, init: &str) -> Result<Object> {
        let Some(db) = self.db.clone() else {
            return Err(Error::parse(format!(
                "+init={} requires a metadata repository",
                init
            )));
        };
        let (authority, code) = init
            .split_once(':')
            .ok_or_else(|| Error::parse(format!("+init={} is not of the form AUTHORITY:CODE", init)))?;
        let object = AuthorityFactory::create(db, &authority.to_ascii_uppercase())
            .create_object(code)
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    Error::parse(format!("Cannot resolve +init={}: {}", init, e))
                }
            })?;
        for param in &step.params {
            if !matches!(param.key.as_str(), "init" | "no_defs" | "type" | "wktext") {
                self.warn(format!("Parameter +{} ignored next to +init=", param.key))?;
            }
        }
        match object {
            Object::Crs(crs) if self.use_proj4_init_rules => {
                Ok(Object::Crs(crs.normalized_for_visualization()))
            }
            other => Ok(other),
        }
    }

    fn number(&self, step: &Step, key: &str) -> Result<Option<f64>> {
        match step.value(key) {
            None | Some("") => Ok(None),
            Some(text) => text.trim().parse().map(Some).map_err(|_| {
                Error::parse(format!("Invalid value for +{}: '{}'", key, text))
            }),
        }
    }

    /// The object registered under the PROJ alias `alias` in `table`.
    fn registered(&mut self, alias: &str, table: &str, object_type: ObjectType) -> Result<Option<Object>> {
        let Some(db) = self.db.clone() else {
            return Ok(None);
        };
        let Some(official) = db.get_official_name_from_alias(alias, table, "PROJ")? else {
            return Ok(None);
        };
        let factory = AuthorityFactory::create(Arc::clone(&db), "");
        let Some(found) = factory
            .search_names(&official, &[object_type], false, 1)?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        AuthorityFactory::create(db, &found.authority)
            .create_object_from_table(found.table, &found.code)
            .map(Some)
    }

    fn ellipsoid(&mut self, step: &Step) -> Result<Ellipsoid> {
        if let Some(name) = step.value("ellps") {
            if self.use_proj4_init_rules && self.db.is_some() {
                if let Some(Object::Ellipsoid(ellipsoid)) =
                    self.registered(name, "ellipsoid", ObjectType::Ellipsoid)?
                {
                    return Ok(ellipsoid);
                }
                self.warn(format!(
                    "Ellipsoid '{}' is not registered; using the built-in definition",
                    name
                ))?;
            }
            return builtin_ellipsoid(name);
        }
        if let Some(radius) = self.number(step, "R")? {
            return Ok(Ellipsoid::new("unknown", radius, 0.0));
        }
        if let Some(a) = self.number(step, "a")? {
            let rf = if let Some(rf) = self.number(step, "rf")? {
                rf
            } else if let Some(b) = self.number(step, "b")? {
                if b == a {
                    0.0
                } else {
                    a / (a - b)
                }
            } else if let Some(f) = self.number(step, "f")? {
                if f == 0.0 {
                    0.0
                } else {
                    1.0 / f
                }
            } else {
                return Err(Error::parse("+a= requires one of +b=, +rf= or +f="));
            };
            return Ok(Ellipsoid::new("unknown", a, rf));
        }
        Ok(Ellipsoid::grs1980())
    }

    fn datum_from_shorthand(&mut self, name: &str) -> Result<GeodeticReferenceFrame> {
        if self.use_proj4_init_rules && self.db.is_some() {
            if let Some(Object::Datum(Datum::Geodetic(datum))) =
                self.registered(name, "geodetic_datum", ObjectType::GeodeticReferenceFrame)?
            {
                return Ok(datum);
            }
            self.warn(format!(
                "Datum '{}' is not registered; using the built-in definition",
                name
            ))?;
        }
        let known = mappings::datum_by_proj_name(name)
            .ok_or_else(|| Error::parse(format!("Unknown datum '{}'", name)))?;
        Ok(GeodeticReferenceFrame {
            name: known.name.to_string(),
            ellipsoid: builtin_ellipsoid(known.ellipsoid)?,
            prime_meridian: PrimeMeridian::greenwich(),
            anchor: None,
            ids: vec![Identifier::new("EPSG", &known.epsg_code.to_string())],
        })
    }

    fn prime_meridian(&self, step: &Step) -> Result<PrimeMeridian> {
        let Some(value) = step.value("pm") else {
            return Ok(PrimeMeridian::greenwich());
        };
        if let Some((name, longitude)) = mappings::prime_meridian_by_proj_name(value) {
            return Ok(PrimeMeridian {
                name: name.to_string(),
                longitude,
                unit: UnitOfMeasure::degree(),
                ids: Vec::new(),
            });
        }
        let longitude: f64 = value
            .parse()
            .map_err(|_| Error::parse(format!("Unknown prime meridian '{}'", value)))?;
        Ok(PrimeMeridian {
            name: "unknown".to_string(),
            longitude,
            unit: UnitOfMeasure::degree(),
            ids: Vec::new(),
        })
    }

    fn geodetic_datum(&mut self, step: &Step) -> Result<GeodeticReferenceFrame> {
        let mut datum = match step.value("datum") {
            Some(name) => self.datum_from_shorthand(name)?,
            None => {
                let ellipsoid = self.ellipsoid(step)?;
                let name = if ellipsoid.name == "unknown" {
                    "unknown".to_string()
                } else {
                    format!("Unknown based on {} ellipsoid", ellipsoid.name)
                };
                GeodeticReferenceFrame {
                    name,
                    ellipsoid,
                    prime_meridian: PrimeMeridian::greenwich(),
                    anchor: None,
                    ids: Vec::new(),
                }
            }
        };
        let prime_meridian = self.prime_meridian(step)?;
        if !prime_meridian.is_greenwich() {
            datum.prime_meridian = prime_meridian;
        }
        if let Some(towgs84) = step.value("towgs84") {
            self.warn(format!("+towgs84={} ignored", towgs84))?;
        }
        if let Some(grids) = step.value("nadgrids").filter(|grids| *grids != "@null") {
            self.warn(format!("+nadgrids={} ignored", grids))?;
        }
        Ok(datum)
    }

    fn linear_unit(&self, step: &Step, key: &str, factor_key: &str) -> Result<UnitOfMeasure> {
        if let Some(name) = step.value(key) {
            return mappings::linear_unit_by_proj_name(name)
                .ok_or_else(|| Error::parse(format!("Unknown unit +{}={}", key, name)));
        }
        match self.number(step, factor_key)? {
            Some(factor) if factor > 0.0 => Ok(UnitOfMeasure::new("unknown", factor, UnitKind::Linear)),
            Some(factor) => Err(Error::parse(format!("Invalid +{}={}", factor_key, factor))),
            None => Ok(UnitOfMeasure::metre()),
        }
    }

    fn geographic_crs(&mut self, step: &Step) -> Result<GeodeticCrs> {
        self.warn_unknown_params(step, &[])?;
        let datum = self.geodetic_datum(step)?;
        let cs = match step.value("axis") {
            None | Some("enu") => CoordinateSystem::ellipsoidal_lon_lat(UnitOfMeasure::degree()),
            Some("neu") => CoordinateSystem::ellipsoidal_lat_lon(UnitOfMeasure::degree()),
            Some(other) => {
                self.warn(format!("+axis={} is not supported; using enu", other))?;
                CoordinateSystem::ellipsoidal_lon_lat(UnitOfMeasure::degree())
            }
        };
        Ok(GeodeticCrs::new("unknown", datum, cs))
    }

    fn geocentric_crs(&mut self, step: &Step) -> Result<GeodeticCrs> {
        self.warn_unknown_params(step, &[])?;
        let datum = self.geodetic_datum(step)?;
        let unit = self.linear_unit(step, "units", "to_meter")?;
        Ok(GeodeticCrs::new(
            "unknown",
            datum,
            CoordinateSystem::geocentric(unit),
        ))
    }

    /// Parameter values of a mapped method, read from `step` with the
    /// method defaults for absent ones.
    fn method_values(&self, step: &Step, mapping: &MethodMapping) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(mapping.params.len());
        for mp in mapping.params {
            let mut value = self.number(step, mp.proj_key)?;
            if value.is_none() && mp.proj_key == "k" {
                value = self.number(step, "k_0")?;
            }
            values.push(value.unwrap_or_else(|| mp.param.default_value()));
        }
        Ok(values)
    }

    fn projected_crs(&mut self, step: &Step) -> Result<Option<ProjectedCrs>> {
        let method_keys: Vec<&str> = mappings::METHODS
            .iter()
            .filter(|m| m.proj_name == step.name)
            .flat_map(|m| m.params.iter().map(|p| p.proj_key))
            .collect();

        let (mapping, name, values) = match step.name.as_str() {
            "utm" => {
                let zone: i32 = step
                    .value("zone")
                    .and_then(|z| z.parse().ok())
                    .filter(|z| (1..=60).contains(z))
                    .ok_or_else(|| Error::parse("+proj=utm requires +zone= between 1 and 60"))?;
                let south = step.has("south");
                let mapping = method(EPSG_TRANSVERSE_MERCATOR)?;
                let y_0 = if south { 10_000_000.0 } else { 0.0 };
                let values = vec![0.0, f64::from(zone * 6 - 183), 0.9996, 500_000.0, y_0];
                let name = format!("UTM zone {}{}", zone, if south { "S" } else { "N" });
                (mapping, name, values)
            }
            "tmerc" | "etmerc" => {
                let mapping = method(EPSG_TRANSVERSE_MERCATOR)?;
                (mapping, "unknown".to_string(), self.method_values(step, mapping)?)
            }
            "lcc" => {
                let lat_1 = self.number(step, "lat_1")?.unwrap_or_default();
                let lat_2 = self.number(step, "lat_2")?.unwrap_or(lat_1);
                if lat_1 == lat_2 {
                    let mapping = method(EPSG_LCC_1SP)?;
                    let mut values = self.method_values(step, mapping)?;
                    values[0] = lat_1;
                    (mapping, "unknown".to_string(), values)
                } else {
                    let mapping = method(EPSG_LCC_2SP)?;
                    (mapping, "unknown".to_string(), self.method_values(step, mapping)?)
                }
            }
            "merc" if is_web_mercator(step) => {
                let mapping = method(EPSG_PSEUDO_MERCATOR)?;
                let values = self.method_values(step, mapping)?;
                let base = GeodeticCrs::new(
                    "unknown",
                    GeodeticReferenceFrame::wgs84(),
                    CoordinateSystem::ellipsoidal_lon_lat(UnitOfMeasure::degree()),
                );
                let unit = self.linear_unit(step, "units", "to_meter")?;
                return Ok(Some(ProjectedCrs::new(
                    "unknown",
                    base,
                    conversion("unknown", mapping, &values),
                    CoordinateSystem::easting_northing(unit),
                )));
            }
            "merc" => {
                if self.number(step, "lat_ts")?.is_some_and(|lat_ts| lat_ts != 0.0) {
                    return Ok(None);
                }
                let mapping = method(EPSG_MERCATOR_A)?;
                (mapping, "unknown".to_string(), self.method_values(step, mapping)?)
            }
            other => match mappings::method_by_proj_name(other) {
                Some(mapping) => (mapping, "unknown".to_string(), self.method_values(step, mapping)?),
                None => return Ok(None),
            },
        };

        let mut known = method_keys;
        known.extend_from_slice(PROJECTION_KEYS);
        self.warn_unknown_params(step, &known)?;

        let datum = self.geodetic_datum(step)?;
        let base = GeodeticCrs::new(
            "unknown",
            datum,
            CoordinateSystem::ellipsoidal_lon_lat(UnitOfMeasure::degree()),
        );
        let unit = self.linear_unit(step, "units", "to_meter")?;
        Ok(Some(ProjectedCrs::new(
            "unknown",
            base,
            conversion(&name, mapping, &values),
            CoordinateSystem::easting_northing(unit),
        )))
    }
}

fn method(epsg_code: i32) -> Result<&'static MethodMapping> {
    mappings::method_by_code(epsg_code)
        .ok_or_else(|| Error::parse(format!("Method EPSG:{} is not mapped", epsg_code)))
}

fn conversion(name: &str, mapping: &MethodMapping, values: &[f64]) -> Conversion {
    let parameters = mapping
        .params
        .iter()
        .zip(values)
        .map(|(mp, value)| {
            OperationParameter::epsg(
                mp.param.epsg_name,
                mp.param.epsg_code,
                ParameterValue::measure(*value, mp.param.default_unit()),
            )
        })
        .collect();
    Conversion::new(
        name,
        OperationMethod::epsg(mapping.epsg_name, mapping.epsg_code),
        parameters,
    )
}

/// `+proj=merc` on a sphere of radius 6378137 with `+nadgrids=@null`, the
/// PROJ.4 spelling of Web Mercator.
fn is_web_mercator(step: &Step) -> bool {
    step.value("a") == Some("6378137")
        && step.value("b") == Some("6378137")
        && step.value("nadgrids") == Some("@null")
}

fn builtin_ellipsoid(name: &str) -> Result<Ellipsoid> {
    let known = mappings::ellipsoid_by_proj_name(name)
        .ok_or_else(|| Error::parse(format!("Unknown ellipsoid '{}'", name)))?;
    Ok(Ellipsoid {
        ids: vec![Identifier::new("EPSG", &known.epsg_code.to_string())],
        ..Ellipsoid::new(known.name, known.semi_major_axis, known.inverse_flattening)
    })
}

fn proj_based(tokens: &ProjTokens) -> Object {
    Object::CoordinateOperation(CoordinateOperation::ProjBased(ProjBasedOperation::new(
        PROJ_BASED_OPERATION_NAME,
        &tokens.to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::tests::fixture;
    use crate::pipeline::ProjConvention;

    fn parse(text: &str) -> Object {
        ProjStringParser::new().create_from_proj_string(text).unwrap()
    }

    fn geodetic(object: &Object) -> &GeodeticCrs {
        match object {
            Object::Crs(Crs::Geodetic(crs)) => crs,
            other => panic!("not a geodetic CRS: {other:?}"),
        }
    }

    fn projected(object: &Object) -> &ProjectedCrs {
        match object {
            Object::Crs(Crs::Projected(crs)) => crs,
            other => panic!("not a projected CRS: {other:?}"),
        }
    }

    #[test]
    fn test_longlat_round_trip() {
        let object = parse("+proj=longlat +datum=WGS84");

        let crs = geodetic(&object);
        assert!(crs.is_geographic());
        assert!(!crs.cs.is_north_first());
        assert_eq!(crs.datum.name, "World Geodetic System 1984");

        let text = object.to_proj_string(ProjConvention::Proj5).unwrap();
        assert_eq!(text, "+proj=longlat +datum=WGS84 +no_defs +type=crs");
        let reparsed = parse(&text);
        assert!(reparsed.is_equivalent_to(&object));
    }

    #[test]
    fn test_geographic_spellings() {
        for name in ["longlat", "lonlat", "latlong", "latlon"] {
            let object = parse(&format!("+proj={} +ellps=GRS80", name));
            assert_eq!(geodetic(&object).datum.name, "Unknown based on GRS 1980 ellipsoid");
        }
    }

    #[test]
    fn test_ellipsoid_forms() {
        let sphere = parse("+proj=longlat +R=6371000");
        assert!(geodetic(&sphere).datum.ellipsoid.is_sphere());
        assert_eq!(geodetic(&sphere).datum.name, "unknown");

        let from_b = parse("+proj=longlat +a=6378249.2 +b=6356515");
        assert!((geodetic(&from_b).datum.ellipsoid.inverse_flattening - 293.466021293627).abs() < 1e-9);

        let default = parse("+proj=longlat");
        assert!(geodetic(&default)
            .datum
            .ellipsoid
            .is_equivalent_to(&Ellipsoid::grs1980()));

        let err = ProjStringParser::new()
            .create_from_proj_string("+proj=longlat +a=6378137")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_prime_meridian() {
        let object = parse("+proj=longlat +ellps=intl +pm=paris");
        assert_eq!(geodetic(&object).datum.prime_meridian.name, "Paris");

        let numeric = parse("+proj=longlat +ellps=intl +pm=-9.5");
        assert_eq!(geodetic(&numeric).datum.prime_meridian.longitude, -9.5);

        assert!(ProjStringParser::new()
            .create_from_proj_string("+proj=longlat +pm=atlantis")
            .is_err());
    }

    #[test]
    fn test_geocentric_needs_type_crs() {
        let crs = parse("+proj=geocent +datum=WGS84 +units=m +type=crs");
        assert!(geodetic(&crs).is_geocentric());

        let op = parse("+proj=cart +ellps=GRS80");
        assert!(matches!(
            op,
            Object::CoordinateOperation(CoordinateOperation::ProjBased(_))
        ));
    }

    #[test]
    fn test_utm() {
        let object = parse("+proj=utm +zone=32 +south +ellps=GRS80 +units=m +no_defs");

        let crs = projected(&object);
        assert_eq!(crs.conversion.name, "UTM zone 32S");
        let lon_0 = crs.conversion.parameter(8802, "Longitude of natural origin").unwrap();
        assert_eq!(lon_0.value.value_in(&UnitOfMeasure::degree()), Some(9.0));
        let y_0 = crs.conversion.parameter(8807, "False northing").unwrap();
        assert_eq!(y_0.value.value_in(&UnitOfMeasure::metre()), Some(10_000_000.0));

        assert_eq!(
            object.to_proj_string(ProjConvention::Proj4).unwrap(),
            "+proj=utm +zone=32 +south +ellps=GRS80 +units=m +no_defs"
        );

        for bad in ["+proj=utm", "+proj=utm +zone=61", "+proj=utm +zone=x"] {
            assert!(ProjStringParser::new().create_from_proj_string(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_tmerc_and_units() {
        let object = parse("+proj=tmerc +lat_0=0 +lon_0=9 +k_0=1 +x_0=3500000 +y_0=0 +ellps=bessel +units=us-ft");

        let crs = projected(&object);
        assert_eq!(crs.conversion.method.epsg_code(), Some(EPSG_TRANSVERSE_MERCATOR));
        assert_eq!(crs.cs.linear_unit(), Some(&UnitOfMeasure::us_survey_foot()));
        assert_eq!(
            object.to_proj_string(ProjConvention::Proj5).unwrap(),
            "+proj=tmerc +lat_0=0 +lon_0=9 +k=1 +x_0=3500000 +y_0=0 +ellps=bessel +units=us-ft +no_defs +type=crs"
        );
    }

    #[test]
    fn test_lcc_variants() {
        let one = parse("+proj=lcc +lat_1=46.8 +lon_0=2.33 +k_0=0.99987742 +x_0=600000 +y_0=2200000 +ellps=clrk66");
        assert_eq!(projected(&one).conversion.method.epsg_code(), Some(EPSG_LCC_1SP));
        let lat_0 = projected(&one).conversion.parameter(8801, "Latitude of natural origin").unwrap();
        assert_eq!(lat_0.value.value_in(&UnitOfMeasure::degree()), Some(46.8));

        let two = parse("+proj=lcc +lat_1=49 +lat_2=44 +lat_0=46.5 +lon_0=3 +x_0=700000 +y_0=6600000 +ellps=GRS80");
        assert_eq!(projected(&two).conversion.method.epsg_code(), Some(EPSG_LCC_2SP));
    }

    #[test]
    fn test_web_mercator_spellings() {
        let proj4 = parse("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs");
        assert_eq!(projected(&proj4).conversion.method.epsg_code(), Some(EPSG_PSEUDO_MERCATOR));
        assert_eq!(projected(&proj4).base.datum.name, "World Geodetic System 1984");

        let webmerc = parse("+proj=webmerc +datum=WGS84");
        assert!(projected(&webmerc)
            .conversion
            .is_equivalent_to(&projected(&proj4).conversion));
    }

    #[test]
    fn test_mercator_variant_b_is_not_mapped() {
        let op = parse("+proj=merc +lat_ts=45 +ellps=WGS84");
        assert!(matches!(op, Object::CoordinateOperation(CoordinateOperation::ProjBased(_))));

        let err = ProjStringParser::new()
            .create_from_proj_string("+proj=merc +lat_ts=45 +type=crs")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_pipeline_is_proj_based_operation() {
        let text = "+proj=pipeline +step +inv +proj=utm +zone=31 +ellps=GRS80 +step +proj=helmert +x=1";
        let object = parse(text);

        match &object {
            Object::CoordinateOperation(CoordinateOperation::ProjBased(op)) => {
                assert_eq!(op.name, PROJ_BASED_OPERATION_NAME);
                assert_eq!(op.definition, text);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(object.to_proj_string(ProjConvention::Proj5).unwrap(), text);

        let err = ProjStringParser::new()
            .create_from_proj_string("+proj=pipeline +step +proj=cart +type=crs")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_type_crs_on_unmappable_step() {
        let err = ProjStringParser::new()
            .create_from_proj_string("+proj=robin +type=crs")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        assert!(matches!(
            parse("+proj=robin"),
            Object::CoordinateOperation(CoordinateOperation::ProjBased(_))
        ));
    }

    #[test]
    fn test_warnings_and_strict_mode() {
        let mut parser = ProjStringParser::new();
        parser
            .create_from_proj_string("+proj=longlat +ellps=GRS80 +ellps=GRS80 +towgs84=1,2,3 +foo=1")
            .unwrap();
        assert_eq!(parser.warning_list().len(), 3);

        parser.create_from_proj_string("+proj=longlat").unwrap();
        assert!(parser.warning_list().is_empty(), "warnings reset per call");

        parser.set_strict(true);
        let err = parser
            .create_from_proj_string("+proj=longlat +datum=WGS84 +datum=WGS84")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_init_requires_repository() {
        let err = ProjStringParser::new()
            .create_from_proj_string("+init=epsg:4326")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_init_through_repository() {
        let mut parser = ProjStringParser::new();
        parser.attach_database_context(Some(fixture()));

        let object = parser.create_from_proj_string("+init=epsg:4326").unwrap();
        assert!(geodetic(&object).cs.is_north_first());

        parser.set_use_proj4_init_rules(true);
        let object = parser.create_from_proj_string("+init=epsg:4326 +no_defs").unwrap();
        assert_eq!(geodetic(&object).name, "WGS 84");
        assert!(!geodetic(&object).cs.is_north_first());

        let err = parser.create_from_proj_string("+init=epsg:999999999").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_init_rules_resolve_aliases() {
        let mut parser = ProjStringParser::new();
        parser
            .attach_database_context(Some(fixture()))
            .set_use_proj4_init_rules(true);

        let object = parser
            .create_from_proj_string("+proj=longlat +datum=potsdam")
            .unwrap();
        assert_eq!(geodetic(&object).datum.name, "Deutsches Hauptdreiecksnetz");
        assert!(parser.warning_list().is_empty());

        let object = parser
            .create_from_proj_string("+proj=longlat +ellps=bessel")
            .unwrap();
        assert_eq!(geodetic(&object).datum.ellipsoid.name, "Bessel 1841");
        assert_eq!(geodetic(&object).datum.ellipsoid.ids, vec![Identifier::new("EPSG", "7004")]);

        let object = parser
            .create_from_proj_string("+proj=longlat +datum=NAD27")
            .unwrap();
        assert_eq!(geodetic(&object).datum.name, "North American Datum 1927");
        assert_eq!(parser.warning_list().len(), 1);
    }

    #[test]
    fn test_without_init_rules_potsdam_is_unknown() {
        let err = ProjStringParser::new()
            .create_from_proj_string("+proj=longlat +datum=potsdam")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
