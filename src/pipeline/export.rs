//! Pipeline string export of CRSs and coordinate operations.
//!
//! CRSs become a single step (`longlat`, `geocent` or a projection) with
//! datum shorthands. Transformations become a pipeline going from the
//! source CRS to geocentric or radian coordinates, through the method step,
//! and back out through the inverse of the target CRS steps.

use crate::error::{Error, Result};
use crate::mappings::{self, MethodMapping, EPSG_LCC_1SP, EPSG_PSEUDO_MERCATOR, EPSG_TRANSVERSE_MERCATOR};
use crate::model::{
    CompoundCrs, Conversion, CoordinateOperation, CoordinateSystem, Crs, Ellipsoid, GeodeticCrs,
    GeodeticReferenceFrame, Object, ParameterValue, PrimeMeridian, ProjectedCrs, Transformation,
    UnitKind, UnitOfMeasure, VerticalCrs,
};

use super::formatter::{ProjConvention, ProjStringFormatter};

impl Object {
    /// Write this object into `formatter`.
    pub fn export_to_proj_string(&self, formatter: &mut ProjStringFormatter) -> Result<()> {
        match self {
            Object::Crs(crs) => write_crs(formatter, crs),
            Object::CoordinateOperation(op) => {
                if formatter.convention() == ProjConvention::Proj4
                    && !matches!(op, CoordinateOperation::Conversion(_))
                {
                    return Err(Error::format(format!(
                        "'{}' can only be exported as a PROJ5 pipeline",
                        op.name()
                    )));
                }
                write_operation(formatter, op)
            }
            other => Err(Error::format(format!(
                "A {} cannot be exported as a pipeline string",
                other.kind_name()
            ))),
        }
    }

    /// Export as a pipeline string under `convention`, with default
    /// formatter settings.
    pub fn to_proj_string(&self, convention: ProjConvention) -> Result<String> {
        let mut formatter = ProjStringFormatter::create(convention);
        self.export_to_proj_string(&mut formatter)?;
        debug_assert_eq!(formatter.open_contexts(), 0);
        Ok(formatter.to_string())
    }
}

fn write_crs(f: &mut ProjStringFormatter, crs: &Crs) -> Result<()> {
    write_crs_definition(f, crs)?;
    if f.get_add_no_defs() {
        f.add_param("no_defs");
    }
    if f.convention() == ProjConvention::Proj5 {
        f.add_param_value("type", "crs");
    }
    Ok(())
}

fn write_crs_definition(f: &mut ProjStringFormatter, crs: &Crs) -> Result<()> {
    match crs {
        Crs::Geodetic(crs) => write_geodetic_crs(f, crs),
        Crs::Projected(crs) => write_projected_crs(f, crs),
        Crs::Vertical(crs) => {
            f.add_step("");
            write_vertical_units(f, crs);
            Ok(())
        }
        Crs::Compound(crs) => write_compound_crs(f, crs),
    }
}

fn write_geodetic_crs(f: &mut ProjStringFormatter, crs: &GeodeticCrs) -> Result<()> {
    if crs.is_geographic() {
        f.add_step("longlat");
        write_datum(f, &crs.datum);
        Ok(())
    } else if crs.is_geocentric() {
        f.add_step("geocent");
        write_datum(f, &crs.datum);
        write_linear_units(f, "units", "to_meter", crs.cs.linear_unit());
        Ok(())
    } else {
        Err(Error::format(format!(
            "Geodetic CRS '{}' is neither geographic nor geocentric",
            crs.name
        )))
    }
}

fn write_datum(f: &mut ProjStringFormatter, datum: &GeodeticReferenceFrame) {
    let shorthand = mappings::datum_by_name(&datum.name).filter(|known| {
        mappings::ellipsoid_by_proj_name(known.ellipsoid).is_some_and(|e| {
            Ellipsoid::new(e.name, e.semi_major_axis, e.inverse_flattening)
                .is_equivalent_to(&datum.ellipsoid)
        })
    });
    match shorthand {
        Some(known) => f.add_param_value("datum", known.proj_name),
        None => write_ellipsoid(f, &datum.ellipsoid),
    }
    write_prime_meridian(f, &datum.prime_meridian);
}

fn write_ellipsoid(f: &mut ProjStringFormatter, ellipsoid: &Ellipsoid) {
    let a = ellipsoid.semi_major_axis_in_metres();
    if let Some(known) = mappings::ellipsoid_by_parameters(a, ellipsoid.inverse_flattening) {
        f.add_param_value("ellps", known.proj_name);
    } else if ellipsoid.is_sphere() {
        f.add_param_value("R", a);
    } else {
        f.add_param_value("a", a);
        f.add_param_value("rf", ellipsoid.inverse_flattening);
    }
}

fn write_prime_meridian(f: &mut ProjStringFormatter, pm: &PrimeMeridian) {
    if pm.is_greenwich() {
        return;
    }
    let longitude = pm.longitude_in_degrees();
    match mappings::prime_meridian_proj_name(longitude) {
        Some(name) => f.add_param_value("pm", name),
        None => f.add_param_value("pm", longitude),
    }
}

fn write_linear_units(
    f: &mut ProjStringFormatter,
    key: &str,
    factor_key: &str,
    unit: Option<&UnitOfMeasure>,
) {
    let metre = UnitOfMeasure::metre();
    let unit = unit.unwrap_or(&metre);
    match mappings::linear_unit_proj_name(unit) {
        Some(name) => f.add_param_value(key, name),
        None => f.add_param_value(factor_key, unit.conversion_to_si),
    }
}

fn write_vertical_units(f: &mut ProjStringFormatter, crs: &VerticalCrs) {
    write_linear_units(f, "vunits", "vto_meter", crs.cs.linear_unit());
}

fn write_compound_crs(f: &mut ProjStringFormatter, crs: &CompoundCrs) -> Result<()> {
    match crs.components.as_slice() {
        [horizontal @ (Crs::Geodetic(_) | Crs::Projected(_)), Crs::Vertical(vertical)] => {
            write_crs_definition(f, horizontal)?;
            write_vertical_units(f, vertical);
            Ok(())
        }
        _ => Err(Error::format(format!(
            "Compound CRS '{}' is not a horizontal CRS plus a vertical CRS",
            crs.name
        ))),
    }
}

fn conversion_mapping(conversion: &Conversion) -> Result<&'static MethodMapping> {
    conversion
        .method
        .epsg_code()
        .and_then(mappings::method_by_code)
        .or_else(|| mappings::method_by_name(&conversion.method.name))
        .ok_or_else(|| {
            Error::format(format!(
                "Method '{}' has no pipeline equivalent",
                conversion.method.name
            ))
        })
}

/// Parameter values of `conversion` in PROJ units (degrees, metres,
/// unity), keyed by PROJ parameter name.
fn conversion_values(conversion: &Conversion, mapping: &MethodMapping) -> Vec<(&'static str, f64)> {
    mapping
        .params
        .iter()
        .map(|mp| {
            let value = conversion
                .parameter(mp.param.epsg_code, mp.param.epsg_name)
                .and_then(|p| p.value.value_in(&mp.param.default_unit()))
                .unwrap_or_else(|| mp.param.default_value());
            (mp.proj_key, value)
        })
        .collect()
}

fn value_of(values: &[(&str, f64)], key: &str) -> f64 {
    values
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or_default()
}

/// UTM zone and hemisphere of Transverse Mercator parameters, if they
/// match a UTM zone exactly.
fn utm_zone(values: &[(&str, f64)]) -> Option<(i32, bool)> {
    let south = match value_of(values, "y_0") {
        y if y == 0.0 => false,
        y if y == 10_000_000.0 => true,
        _ => return None,
    };
    let zone = (value_of(values, "lon_0") + 183.0) / 6.0;
    let standard = value_of(values, "lat_0") == 0.0
        && (value_of(values, "k") - 0.9996).abs() < 1e-10
        && value_of(values, "x_0") == 500_000.0
        && zone.fract() == 0.0
        && (1.0..=60.0).contains(&zone);
    standard.then_some((zone as i32, south))
}

fn write_projection_step(
    f: &mut ProjStringFormatter,
    mapping: &MethodMapping,
    values: &[(&'static str, f64)],
) {
    if mapping.epsg_code == EPSG_TRANSVERSE_MERCATOR {
        if let Some((zone, south)) = utm_zone(values) {
            f.add_step("utm");
            f.add_param_value("zone", zone);
            if south {
                f.add_param("south");
            }
            return;
        }
        match (f.convention(), f.use_etmerc_for_tmerc()) {
            (ProjConvention::Proj4, Some(true)) => f.add_step("etmerc"),
            (ProjConvention::Proj5, Some(false)) => {
                f.add_step("tmerc");
                f.add_param("approx");
            }
            _ => f.add_step("tmerc"),
        }
    } else {
        f.add_step(mapping.proj_name);
    }
    if mapping.epsg_code == EPSG_LCC_1SP {
        f.add_param_value("lat_1", value_of(values, "lat_0"));
    }
    for (key, value) in values {
        f.add_param_value(key, *value);
    }
}

fn write_projected_crs(f: &mut ProjStringFormatter, crs: &ProjectedCrs) -> Result<()> {
    let mapping = conversion_mapping(&crs.conversion)?;
    let values = conversion_values(&crs.conversion, mapping);
    if mapping.epsg_code == EPSG_PSEUDO_MERCATOR && f.convention() == ProjConvention::Proj4 {
        // spherical Mercator on the semi-major axis, without datum shift
        let a = crs.base.datum.ellipsoid.semi_major_axis_in_metres();
        f.add_step("merc");
        f.add_param_value("a", a);
        f.add_param_value("b", a);
        f.add_param_value("lat_ts", value_of(&values, "lat_0"));
        for key in ["lon_0", "x_0", "y_0"] {
            f.add_param_value(key, value_of(&values, key));
        }
        f.add_param_value("k", 1.0);
        write_linear_units(f, "units", "to_meter", crs.cs.linear_unit());
        f.add_param_value("nadgrids", "@null");
        f.add_param("wktext");
        return Ok(());
    }
    write_projection_step(f, mapping, &values);
    write_datum(f, &crs.base.datum);
    write_linear_units(f, "units", "to_meter", crs.cs.linear_unit());
    Ok(())
}

fn write_operation(f: &mut ProjStringFormatter, op: &CoordinateOperation) -> Result<()> {
    match op {
        CoordinateOperation::Conversion(conversion) => write_conversion(f, conversion),
        CoordinateOperation::Transformation(transformation) => {
            write_transformation(f, transformation)
        }
        CoordinateOperation::Concatenated(concat) => {
            for step in &concat.operations {
                write_operation(f, step)?;
            }
            Ok(())
        }
        CoordinateOperation::ProjBased(op) => {
            if op.inverted {
                f.start_inversion();
            }
            f.ingest_proj_string(&op.definition)?;
            if op.inverted {
                f.stop_inversion();
            }
            Ok(())
        }
    }
}

fn write_conversion(f: &mut ProjStringFormatter, conversion: &Conversion) -> Result<()> {
    let mapping = conversion_mapping(conversion)?;
    let values = conversion_values(conversion, mapping);
    if conversion.inverted {
        f.start_inversion();
    }
    write_projection_step(f, mapping, &values);
    if conversion.inverted {
        f.stop_inversion();
    }
    Ok(())
}

/// How a transformation method is expressed as a pipeline step.
enum MethodStep {
    /// `helmert`, with its rotation convention when rotations are present
    Helmert(Option<&'static str>),
    HorizontalGrid,
    VerticalGrid,
}

fn method_step(transformation: &Transformation) -> Option<MethodStep> {
    match transformation.method.epsg_code() {
        Some(9603 | 1031 | 1035) => Some(MethodStep::Helmert(None)),
        Some(9606 | 1033 | 1037) => Some(MethodStep::Helmert(Some("position_vector"))),
        Some(9607 | 1032 | 1038) => Some(MethodStep::Helmert(Some("coordinate_frame"))),
        Some(9613 | 9614 | 9615) => Some(MethodStep::HorizontalGrid),
        _ if transformation.method.name.contains("GravityRelatedHeight") => {
            Some(MethodStep::VerticalGrid)
        }
        _ => None,
    }
}

/// Steps taking coordinates of `crs` to geocentric (`cartesian`) or
/// longitude/latitude radians.
fn write_to_radians_or_cartesian(
    f: &mut ProjStringFormatter,
    crs: &GeodeticCrs,
    cartesian: bool,
) -> Result<()> {
    if crs.is_geocentric() {
        if cartesian {
            return Ok(());
        }
        return Err(Error::format(format!(
            "Geocentric CRS '{}' cannot be used with a grid based method",
            crs.name
        )));
    }
    if crs.cs.is_north_first() {
        f.add_step("axisswap");
        f.add_param_value("order", "2,1");
    }
    write_angular_unitconvert(f, &crs.cs)?;
    if cartesian {
        f.add_step("cart");
        write_ellipsoid(f, &crs.datum.ellipsoid);
    }
    Ok(())
}

fn write_angular_unitconvert(f: &mut ProjStringFormatter, cs: &CoordinateSystem) -> Result<()> {
    let degree = UnitOfMeasure::degree();
    let unit = cs.angular_unit().unwrap_or(&degree);
    let name = if unit.is_equivalent_to(&degree) {
        "deg"
    } else if unit.is_equivalent_to(&UnitOfMeasure::radian()) {
        return Ok(());
    } else if unit.is_equivalent_to(&UnitOfMeasure::new(
        "grad",
        std::f64::consts::PI / 200.0,
        UnitKind::Angular,
    )) {
        "grad"
    } else {
        return Err(Error::format(format!(
            "Angular unit '{}' has no pipeline equivalent",
            unit.name
        )));
    };
    f.add_step("unitconvert");
    f.add_param_value("xy_in", name);
    f.add_param_value("xy_out", "rad");
    Ok(())
}

fn geodetic_end<'a>(crs: &'a Crs, transformation: &Transformation) -> Result<&'a GeodeticCrs> {
    crs.geodetic().ok_or_else(|| {
        Error::format(format!(
            "'{}' relates a {} which has no pipeline equivalent",
            transformation.name,
            crs.kind_name()
        ))
    })
}

/// Grid file name, replaced by its local alternative when the formatter
/// has a repository.
fn grid_name(f: &ProjStringFormatter, transformation: &Transformation) -> Result<String> {
    let file = transformation
        .parameters
        .iter()
        .find_map(|p| match &p.value {
            ParameterValue::File(name) => Some(name.clone()),
            _ => None,
        })
        .ok_or_else(|| {
            Error::format(format!("'{}' does not reference a grid", transformation.name))
        })?;
    if let Some(db) = f.database() {
        if let Some(alternative) = db.look_for_grid_alternative(&file)? {
            return Ok(alternative.proj_filename);
        }
    }
    Ok(file)
}

fn write_transformation(f: &mut ProjStringFormatter, transformation: &Transformation) -> Result<()> {
    let method = method_step(transformation).ok_or_else(|| {
        Error::format(format!(
            "Method '{}' has no pipeline equivalent",
            transformation.method.name
        ))
    })?;
    let source = geodetic_end(&transformation.source, transformation)?;
    let target = geodetic_end(&transformation.target, transformation)?;
    let cartesian = matches!(method, MethodStep::Helmert(_));

    write_to_radians_or_cartesian(f, source, cartesian)?;
    match method {
        MethodStep::Helmert(convention) => {
            f.add_step("helmert");
            let params: &[(i32, &str, &str, UnitOfMeasure)] = &[
                (8605, "X-axis translation", "x", UnitOfMeasure::metre()),
                (8606, "Y-axis translation", "y", UnitOfMeasure::metre()),
                (8607, "Z-axis translation", "z", UnitOfMeasure::metre()),
                (8608, "X-axis rotation", "rx", UnitOfMeasure::arc_second()),
                (8609, "Y-axis rotation", "ry", UnitOfMeasure::arc_second()),
                (8610, "Z-axis rotation", "rz", UnitOfMeasure::arc_second()),
                (8611, "Scale difference", "s", UnitOfMeasure::parts_per_million()),
            ];
            for (code, name, key, unit) in params {
                if let Some(value) = transformation
                    .parameter(*code, name)
                    .and_then(|p| p.value.value_in(unit))
                {
                    f.add_param_value(key, value);
                }
            }
            if let Some(convention) = convention {
                f.add_param_value("convention", convention);
            }
        }
        MethodStep::HorizontalGrid => {
            let grid = grid_name(f, transformation)?;
            f.add_step("hgridshift");
            f.add_param_value("grids", grid);
            f.set_current_step_inverted(transformation.inverted);
        }
        MethodStep::VerticalGrid => {
            let grid = grid_name(f, transformation)?;
            f.add_step("vgridshift");
            f.add_param_value("grids", grid);
            f.add_param_value("multiplier", 1.0);
            f.set_current_step_inverted(transformation.inverted);
        }
    }
    f.start_inversion();
    write_to_radians_or_cartesian(f, target, cartesian)?;
    f.stop_inversion();
    Ok(())
}
