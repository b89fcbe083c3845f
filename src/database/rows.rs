//! Typed rows of the metadata tables.
//!
//! Every row is deserialized on demand from the store's JSON objects, so a
//! row type only names the columns it needs; unknown columns are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::store::Row;
use crate::error::{Error, Result};

/// Decode a raw row into `T`, naming `table` in the error.
pub(crate) fn decode<T: DeserializeOwned>(table: &str, row: &Row) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(row.clone())).map_err(|e| {
        Error::factory(format!("Malformed row in table '{}': {}", table, e))
    })
}

/// Columns shared by every object table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectKey {
    pub auth_name: String,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataRow {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitRow {
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub conv_factor: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtentRow {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub south_lat: Option<f64>,
    pub north_lat: Option<f64>,
    pub west_lon: Option<f64>,
    pub east_lon: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimeMeridianRow {
    pub name: String,
    pub longitude: f64,
    pub uom_auth_name: String,
    pub uom_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EllipsoidRow {
    pub name: String,
    pub semi_major_axis: f64,
    pub uom_auth_name: String,
    pub uom_code: String,
    #[serde(default)]
    pub inv_flattening: Option<f64>,
    #[serde(default)]
    pub semi_minor_axis: Option<f64>,
    #[serde(default = "default_body")]
    pub celestial_body: String,
}

fn default_body() -> String {
    "Earth".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CelestialBodyRow {
    pub name: String,
    pub semi_major_axis: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeodeticDatumRow {
    pub name: String,
    pub ellipsoid_auth_name: String,
    pub ellipsoid_code: String,
    pub prime_meridian_auth_name: String,
    pub prime_meridian_code: String,
    #[serde(default)]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerticalDatumRow {
    pub name: String,
    #[serde(default)]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinateSystemRow {
    #[serde(rename = "type")]
    pub cs_type: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AxisRow {
    pub name: String,
    pub abbrev: String,
    pub orientation: String,
    pub coordinate_system_auth_name: String,
    pub coordinate_system_code: String,
    pub coordinate_system_order: usize,
    pub uom_auth_name: String,
    pub uom_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeodeticCrsRow {
    pub name: String,
    #[serde(rename = "type")]
    pub crs_type: String,
    #[serde(default)]
    pub coordinate_system_auth_name: Option<String>,
    #[serde(default)]
    pub coordinate_system_code: Option<String>,
    #[serde(default)]
    pub datum_auth_name: Option<String>,
    #[serde(default)]
    pub datum_code: Option<String>,
    #[serde(default)]
    pub text_definition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerticalCrsRow {
    pub name: String,
    pub coordinate_system_auth_name: String,
    pub coordinate_system_code: String,
    pub datum_auth_name: String,
    pub datum_code: String,
}

/// One stored parameter of a conversion or transformation.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterRow {
    #[serde(default)]
    pub auth_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub uom_auth_name: Option<String>,
    #[serde(default)]
    pub uom_code: Option<String>,
    /// Grid file name, for grid based transformations
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionRow {
    pub name: String,
    #[serde(default)]
    pub method_auth_name: Option<String>,
    #[serde(default)]
    pub method_code: Option<String>,
    pub method_name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectedCrsRow {
    pub name: String,
    #[serde(default)]
    pub coordinate_system_auth_name: Option<String>,
    #[serde(default)]
    pub coordinate_system_code: Option<String>,
    #[serde(default)]
    pub geodetic_crs_auth_name: Option<String>,
    #[serde(default)]
    pub geodetic_crs_code: Option<String>,
    #[serde(default)]
    pub conversion_auth_name: Option<String>,
    #[serde(default)]
    pub conversion_code: Option<String>,
    #[serde(default)]
    pub text_definition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompoundCrsRow {
    pub name: String,
    pub horiz_crs_auth_name: String,
    pub horiz_crs_code: String,
    pub vertical_crs_auth_name: String,
    pub vertical_crs_code: String,
}

/// Reference to another stored object.
#[derive(Debug, Clone, Deserialize)]
pub struct StepRow {
    pub auth_name: String,
    pub code: String,
}

/// Rows of the transformation and concatenated operation tables.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRow {
    pub name: String,
    pub source_crs_auth_name: String,
    pub source_crs_code: String,
    pub target_crs_auth_name: String,
    pub target_crs_code: String,
    #[serde(default)]
    pub method_auth_name: Option<String>,
    #[serde(default)]
    pub method_code: Option<String>,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterRow>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub steps: Vec<StepRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageRow {
    pub object_table_name: String,
    pub object_auth_name: String,
    pub object_code: String,
    pub extent_auth_name: String,
    pub extent_code: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasRow {
    pub table_name: String,
    pub auth_name: String,
    pub code: String,
    pub alt_name: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridAlternativeRow {
    pub original_grid_name: String,
    pub proj_grid_name: String,
    #[serde(default)]
    pub proj_grid_format: Option<String>,
    #[serde(default)]
    pub inverse_direction: bool,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub direct_download: bool,
    #[serde(default)]
    pub open_license: bool,
}
