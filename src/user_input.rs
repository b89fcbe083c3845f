//! Object creation from free-form user input.
//!
//! Accepted forms, tried in order:
//!
//! - `urn:ogc:def:<type>:AUTH:[VERSION]:CODE`
//! - `AUTH:CODE`, e.g. `EPSG:4326`
//! - pipeline strings, starting with `+` or `proj=`
//! - WKT in any recognized dialect
//! - the exact name of a registered object, e.g. `WGS 84`
//!
//! Codes and names need a metadata repository.

use std::sync::Arc;

use regex::Regex;

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::factory::AuthorityFactory;
use crate::model::{Crs, Datum, Object};
use crate::pipeline::ProjStringParser;
use crate::wkt::{guess_dialect, WktDialect, WktParser};

const AUTH_CODE_PATTERN: &str = r"^([A-Za-z][A-Za-z0-9_.-]*):([A-Za-z0-9_.-]+)$";

fn repository(db: Option<Arc<DatabaseContext>>, text: &str) -> Result<Arc<DatabaseContext>> {
    db.ok_or_else(|| Error::parse(format!("'{}' requires a metadata repository", text)))
}

/// Create an object from `text`.
///
/// `use_proj4_init_rules` applies to pipeline strings, see
/// [`ProjStringParser::set_use_proj4_init_rules`].
pub fn create_from_user_input(
    text: &str,
    db: Option<Arc<DatabaseContext>>,
    use_proj4_init_rules: bool,
) -> Result<Object> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::parse("Empty input"));
    }

    if text
        .get(..12)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:ogc:def:"))
    {
        return from_urn(text, repository(db, text)?);
    }

    if text.starts_with('+') || text.starts_with("proj=") {
        let mut parser = ProjStringParser::new();
        parser
            .attach_database_context(db)
            .set_use_proj4_init_rules(use_proj4_init_rules);
        return parser.create_from_proj_string(text);
    }

    let auth_code = Regex::new(AUTH_CODE_PATTERN)?;
    if let Some(captures) = auth_code.captures(text) {
        let db = repository(db, text)?;
        log::debug!("Resolving '{}' as an authority code", text);
        return AuthorityFactory::create(db, &captures[1]).create_object(&captures[2]);
    }

    if guess_dialect(text) != WktDialect::NotRecognized {
        let mut parser = WktParser::new();
        parser.attach_database_context(db);
        return parser.create_from_wkt(text);
    }

    if let Some(db) = db {
        let found = AuthorityFactory::create(db, "").create_objects_from_name(text, &[], false, 1)?;
        if let Some(object) = found.into_iter().next() {
            log::debug!("'{}' matched {} '{}'", text, object.kind_name(), object.name());
            return Ok(object);
        }
    }
    Err(Error::parse(format!(
        "'{}' is neither WKT, a pipeline string, an authority code nor a registered name",
        text
    )))
}

/// `urn:ogc:def:<type>:<authority>:[<version>]:<code>`
fn from_urn(text: &str, db: Arc<DatabaseContext>) -> Result<Object> {
    let parts: Vec<&str> = text.split(':').collect();
    let [_, _, _, object_type, authority, _version, code] = parts[..] else {
        return Err(Error::parse(format!("Malformed URN '{}'", text)));
    };
    if authority.is_empty() || code.is_empty() {
        return Err(Error::parse(format!("Malformed URN '{}'", text)));
    }
    let factory = AuthorityFactory::create(db, authority);
    match object_type {
        "crs" => factory
            .create_coordinate_reference_system(code)
            .map(Object::Crs),
        "datum" => factory.create_datum(code).map(Object::Datum),
        "ellipsoid" => factory.create_ellipsoid(code).map(Object::Ellipsoid),
        "meridian" => factory.create_prime_meridian(code).map(Object::PrimeMeridian),
        "cs" => factory.create_coordinate_system(code).map(Object::CoordinateSystem),
        "uom" => factory.create_unit_of_measure(code).map(Object::Unit),
        "coordinateOperation" => factory
            .create_coordinate_operation(code, true)
            .map(Object::CoordinateOperation),
        other => Err(Error::parse(format!(
            "Unsupported object type '{}' in URN '{}'",
            other, text
        ))),
    }
}

/// Convenience for callers that only accept CRSs.
pub fn crs_from_user_input(text: &str, db: Option<Arc<DatabaseContext>>) -> Result<Crs> {
    let object = create_from_user_input(text, db, false)?;
    let kind = object.kind_name();
    object
        .into_crs()
        .ok_or_else(|| Error::parse(format!("'{}' is a {}, not a CRS", text, kind)))
}

/// Geodetic datum of `text` when it names one, directly or through a CRS.
pub fn datum_from_user_input(text: &str, db: Option<Arc<DatabaseContext>>) -> Result<Datum> {
    match create_from_user_input(text, db, false)? {
        Object::Datum(datum) => Ok(datum),
        Object::Crs(crs) => crs
            .geodetic()
            .map(|g| Datum::Geodetic(g.datum.clone()))
            .ok_or_else(|| Error::parse(format!("'{}' has no geodetic datum", text))),
        other => Err(Error::parse(format!(
            "'{}' is a {}, not a datum",
            text,
            other.kind_name()
        ))),
    }
}
