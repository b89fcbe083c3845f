//! Registered objects equivalent to a given one.
//!
//! Candidates are narrowed with the reference columns of their rows, then
//! built and compared with `is_equivalent_to`. Deprecated rows are never
//! returned. With an empty authority name rows of every authority are
//! candidates.

use super::AuthorityFactory;
use crate::database::rows::ObjectKey;
use crate::database::{str_col, Row};
use crate::error::Result;
use crate::model::{CompoundCrs, Ellipsoid, GeodeticCrs, ProjectedCrs};

fn is_deprecated(row: &Row) -> bool {
    row.get("deprecated")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// True when the `<prefix>_auth_name`/`<prefix>_code` columns of `row` name
/// `auth:code`.
fn references(row: &Row, prefix: &str, auth: &str, code: &str) -> bool {
    str_col(row, &format!("{}_auth_name", prefix)) == Some(auth)
        && str_col(row, &format!("{}_code", prefix)) == Some(code)
}

fn has_type(row: &Row, crs_type: Option<&str>) -> bool {
    crs_type.map_or(true, |t| str_col(row, "type") == Some(t))
}

impl AuthorityFactory {
    /// Keys of the current rows of `table` of this authority accepted by
    /// `filter`, in table order.
    fn current_keys(&self, table: &str, filter: impl Fn(&Row) -> bool) -> Result<Vec<ObjectKey>> {
        self.db.query(table, |row| {
            !is_deprecated(row)
                && (self.authority.is_empty()
                    || str_col(row, "auth_name") == Some(self.authority.as_str()))
                && filter(row)
        })
    }

    /// Registered ellipsoids with the same defining parameters as
    /// `ellipsoid`. Names are not compared.
    pub fn create_ellipsoid_from_existing(&self, ellipsoid: &Ellipsoid) -> Result<Vec<Ellipsoid>> {
        let mut found = Vec::new();
        for key in self.current_keys("ellipsoid", |_| true)? {
            let candidate = self.for_authority(&key.auth_name).create_ellipsoid(&key.code)?;
            if candidate.is_equivalent_to(ellipsoid) {
                found.push(candidate);
            }
        }
        Ok(found)
    }

    /// Geodetic CRSs built on the datum `datum_auth:datum_code`, restricted
    /// to one value of the `type` column (`geographic 2D`, `geographic 3D`,
    /// `geocentric`) when `crs_type` is given.
    pub fn create_geodetic_crs_from_datum(
        &self,
        datum_auth: &str,
        datum_code: &str,
        crs_type: Option<&str>,
    ) -> Result<Vec<GeodeticCrs>> {
        self.current_keys("geodetic_crs", |row| {
            references(row, "datum", datum_auth, datum_code) && has_type(row, crs_type)
        })?
        .iter()
        .map(|key| self.for_authority(&key.auth_name).create_geodetic_crs(&key.code))
        .collect()
    }

    /// Geodetic CRSs whose datum uses the ellipsoid
    /// `ellipsoid_auth:ellipsoid_code`.
    pub fn create_geodetic_crs_from_ellipsoid(
        &self,
        ellipsoid_auth: &str,
        ellipsoid_code: &str,
        crs_type: Option<&str>,
    ) -> Result<Vec<GeodeticCrs>> {
        // Datums of any authority may carry the ellipsoid
        let datums: Vec<ObjectKey> = self.db.query("geodetic_datum", |row| {
            !is_deprecated(row) && references(row, "ellipsoid", ellipsoid_auth, ellipsoid_code)
        })?;
        if datums.is_empty() {
            return Ok(Vec::new());
        }
        self.current_keys("geodetic_crs", |row| {
            has_type(row, crs_type)
                && datums
                    .iter()
                    .any(|d| references(row, "datum", &d.auth_name, &d.code))
        })?
        .iter()
        .map(|key| self.for_authority(&key.auth_name).create_geodetic_crs(&key.code))
        .collect()
    }

    /// Registered projected CRSs on an equivalent datum with an equivalent
    /// conversion. Names and coordinate systems are not compared.
    pub fn create_projected_crs_from_existing(&self, crs: &ProjectedCrs) -> Result<Vec<ProjectedCrs>> {
        let mut found = Vec::new();
        for key in self.current_keys("projected_crs", |_| true)? {
            let candidate = self
                .for_authority(&key.auth_name)
                .create_projected_crs(&key.code)?;
            if candidate.base.datum.is_equivalent_to(&crs.base.datum)
                && candidate.conversion.is_equivalent_to(&crs.conversion)
            {
                found.push(candidate);
            }
        }
        Ok(found)
    }

    /// Registered compound CRSs whose components are equivalent, in order,
    /// to those of `crs`. The compound name is not compared.
    pub fn create_compound_crs_from_existing(&self, crs: &CompoundCrs) -> Result<Vec<CompoundCrs>> {
        let mut found = Vec::new();
        for key in self.current_keys("compound_crs", |_| true)? {
            let candidate = self
                .for_authority(&key.auth_name)
                .create_compound_crs(&key.code)?;
            let same_components = candidate.components.len() == crs.components.len()
                && candidate
                    .components
                    .iter()
                    .zip(&crs.components)
                    .all(|(a, b)| a.is_equivalent_to(b));
            if same_components {
                found.push(candidate);
            }
        }
        Ok(found)
    }
}
