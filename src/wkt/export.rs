//! WKT export of every object kind.
//!
//! One exhaustive `match` per object family: adding an object kind without
//! teaching the exporter about it does not compile.

use crate::error::{Error, Result};
use crate::mappings::{self, MethodMapping};
use crate::model::{
    Axis, CompoundCrs, ConcatenatedOperation, Conversion, CoordinateOperation, CoordinateSystem,
    Crs, Datum, Ellipsoid, GeodeticCrs, GeodeticReferenceFrame, Identifier, Object,
    OperationMethod, OperationParameter, ParameterValue, PrimeMeridian, ProjBasedOperation,
    ProjectedCrs, Transformation, UnitKind, UnitOfMeasure, Usage, VerticalCrs,
    VerticalReferenceFrame,
};

use super::esri;
use super::formatter::{OutputAxisRule, WktConvention, WktFormatter, WktVersion};

/// Method name prefix of operations only known through a pipeline string.
pub(crate) const PROJ_BASED_METHOD_PREFIX: &str = "PROJ-based operation method: ";

/// Name prefix of operations used in their reverse direction.
pub(crate) const INVERSE_OF: &str = "Inverse of ";

impl Object {
    /// Write this object into `formatter`.
    pub fn export_to_wkt(&self, formatter: &mut WktFormatter) -> Result<()> {
        match self {
            Object::Unit(unit) => {
                write_unit(formatter, unit);
                Ok(())
            }
            Object::PrimeMeridian(pm) => {
                write_prime_meridian(formatter, pm);
                Ok(())
            }
            Object::Ellipsoid(ellipsoid) => {
                write_ellipsoid(formatter, ellipsoid);
                Ok(())
            }
            Object::Datum(Datum::Geodetic(datum)) => {
                write_geodetic_datum(formatter, datum);
                Ok(())
            }
            Object::Datum(Datum::Vertical(datum)) => {
                write_vertical_datum(formatter, datum);
                Ok(())
            }
            Object::CoordinateSystem(_) => Err(Error::format(
                "A coordinate system cannot be exported on its own as WKT",
            )),
            Object::Crs(crs) => write_crs(formatter, crs),
            Object::CoordinateOperation(op) => write_operation(formatter, op),
            Object::Extent(_) => Err(Error::format("An extent cannot be exported as WKT")),
        }
    }

    /// Export as WKT under `convention`, with default formatter settings.
    pub fn to_wkt(&self, convention: WktConvention) -> Result<String> {
        let mut formatter = WktFormatter::create(convention);
        self.export_to_wkt(&mut formatter)?;
        debug_assert_eq!(formatter.open_contexts(), 0);
        Ok(formatter.into_string())
    }
}

fn write_ids(f: &mut WktFormatter, ids: &[Identifier]) {
    if !f.output_id() {
        return;
    }
    match f.version() {
        // WKT1 has room for a single AUTHORITY node
        WktVersion::Wkt1 => {
            if let Some(id) = ids.first() {
                f.start_node("AUTHORITY", false);
                f.add_quoted_string(&id.authority);
                f.add_quoted_string(&id.code);
                f.end_node();
            }
        }
        WktVersion::Wkt2 => {
            for id in ids {
                f.start_node("ID", false);
                f.add_quoted_string(&id.authority);
                if !id.code.is_empty() && id.code.bytes().all(|b| b.is_ascii_digit()) {
                    f.add(&id.code);
                } else {
                    f.add_quoted_string(&id.code);
                }
                if let Some(version) = &id.version {
                    f.add_quoted_string(version);
                }
                f.end_node();
            }
        }
    }
}

fn unit_keyword(f: &WktFormatter, unit: &UnitOfMeasure) -> &'static str {
    if f.version() == WktVersion::Wkt1 || f.force_unit_keyword() {
        return "UNIT";
    }
    match unit.kind {
        UnitKind::Linear => "LENGTHUNIT",
        UnitKind::Angular => "ANGLEUNIT",
        UnitKind::Scale => "SCALEUNIT",
        UnitKind::Time => "TIMEUNIT",
        UnitKind::Parametric => "PARAMETRICUNIT",
        UnitKind::None => "UNIT",
    }
}

fn write_unit(f: &mut WktFormatter, unit: &UnitOfMeasure) {
    let keyword = unit_keyword(f, unit);
    f.start_node(keyword, unit.id.is_some());
    if f.use_esri_dialect() {
        f.add_quoted_string(&esri::esri_unit_name(&unit.name));
    } else {
        f.add_quoted_string(&unit.name);
    }
    f.add_number(unit.conversion_to_si);
    if let Some(id) = &unit.id {
        write_ids(f, std::slice::from_ref(id));
    }
    f.end_node();
}

fn write_ellipsoid(f: &mut WktFormatter, ellipsoid: &Ellipsoid) {
    let wkt1 = f.version() == WktVersion::Wkt1;
    f.start_node(if wkt1 { "SPHEROID" } else { "ELLIPSOID" }, !ellipsoid.ids.is_empty());
    if f.use_esri_dialect() {
        let name = f
            .esri_alias(&ellipsoid.name, "ellipsoid")
            .unwrap_or_else(|| esri::esri_ellipsoid_name(&ellipsoid.name));
        f.add_quoted_string(&name);
    } else {
        f.add_quoted_string(&ellipsoid.name);
    }
    if wkt1 {
        f.add_number(ellipsoid.semi_major_axis_in_metres());
        f.add_number(ellipsoid.inverse_flattening);
    } else {
        f.add_number(ellipsoid.semi_major_axis);
        f.add_number(ellipsoid.inverse_flattening);
        let is_metre = ellipsoid.unit.is_equivalent_to(&UnitOfMeasure::metre());
        if !(f.ellipsoid_unit_omitted_if_metre() && is_metre) {
            write_unit(f, &ellipsoid.unit);
        }
    }
    write_ids(f, &ellipsoid.ids);
    f.end_node();
}

fn write_prime_meridian(f: &mut WktFormatter, pm: &PrimeMeridian) {
    f.start_node("PRIMEM", !pm.ids.is_empty());
    f.add_quoted_string(&pm.name);
    if f.prime_meridian_in_degree() {
        f.add_number(pm.longitude_in_degrees());
    } else if f.version() == WktVersion::Wkt1 {
        let unit = f.axis_angular_unit().clone();
        f.add_number(pm.unit.convert(pm.longitude, &unit));
    } else {
        f.add_number(pm.longitude);
        let same_as_axis = pm.unit.is_equivalent_to(f.axis_angular_unit());
        if !(f.prime_meridian_or_parameter_unit_omitted_if_same_as_axis() && same_as_axis) {
            write_unit(f, &pm.unit);
        }
    }
    write_ids(f, &pm.ids);
    f.end_node();
}

fn write_geodetic_datum(f: &mut WktFormatter, datum: &GeodeticReferenceFrame) {
    f.start_node("DATUM", !datum.ids.is_empty());
    let name = if f.use_esri_dialect() {
        f.esri_alias(&datum.name, "geodetic_datum")
            .unwrap_or_else(|| esri::esri_datum_name(&datum.name))
    } else if f.version() == WktVersion::Wkt1 {
        mappings::wkt1_datum_name(&datum.name)
    } else {
        datum.name.clone()
    };
    f.add_quoted_string(&name);
    write_ellipsoid(f, &datum.ellipsoid);
    if f.is_wkt2() {
        if let Some(anchor) = &datum.anchor {
            f.start_node("ANCHOR", false);
            f.add_quoted_string(anchor);
            f.end_node();
        }
    }
    write_ids(f, &datum.ids);
    f.end_node();
}

fn write_vertical_datum(f: &mut WktFormatter, datum: &VerticalReferenceFrame) {
    let gdal = f.version() == WktVersion::Wkt1 && !f.use_esri_dialect();
    f.start_node(if gdal { "VERT_DATUM" } else { "VDATUM" }, !datum.ids.is_empty());
    if f.use_esri_dialect() {
        let name = f
            .esri_alias(&datum.name, "vertical_datum")
            .unwrap_or_else(|| esri::morph_name_to_esri(&datum.name));
        f.add_quoted_string(&name);
    } else {
        f.add_quoted_string(&datum.name);
    }
    if gdal {
        // Orthometric vertical datum type
        f.add_integer(2005);
    }
    if f.is_wkt2() {
        if let Some(anchor) = &datum.anchor {
            f.start_node("ANCHOR", false);
            f.add_quoted_string(anchor);
            f.end_node();
        }
    }
    write_ids(f, &datum.ids);
    f.end_node();
}

/// Axis name as written in WKT2: lower-cased name followed by the
/// abbreviation in parentheses, or the abbreviation alone for the
/// conventional Cartesian names.
pub(crate) fn wkt2_axis_name(axis: &Axis) -> String {
    if axis.abbreviation.is_empty() {
        return axis.name.clone();
    }
    let bare = ["", "easting", "northing", "geocentric x", "geocentric y", "geocentric z"];
    if bare.contains(&axis.name.to_ascii_lowercase().as_str()) {
        return format!("({})", axis.abbreviation);
    }
    let mut chars = axis.name.chars();
    let name = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} ({})", name, axis.abbreviation)
}

fn wkt1_axis_name(axis: &Axis) -> &str {
    match axis.name.as_str() {
        "Geodetic latitude" => "Latitude",
        "Geodetic longitude" => "Longitude",
        other => other,
    }
}

fn write_axis_wkt2(f: &mut WktFormatter, axis: &Axis, order: usize) {
    f.start_node("AXIS", false);
    f.add_quoted_string(&wkt2_axis_name(axis));
    f.add(axis.direction.wkt2_name());
    if f.output_axis_order() {
        f.start_node("ORDER", false);
        f.add_integer(order as i64);
        f.end_node();
    }
    if f.output_unit() {
        write_unit(f, &axis.unit);
    }
    f.end_node();
}

fn write_cs_wkt2(f: &mut WktFormatter, cs: &CoordinateSystem) {
    f.start_node("CS", false);
    f.add(cs.kind.wkt_name());
    f.add_integer(cs.dimension() as i64);
    f.end_node();

    let output_axes = f.output_axis() != OutputAxisRule::No;
    let shared_unit = if f.output_cs_unit_only_once_if_same() || !output_axes {
        cs.common_unit().or_else(|| cs.axes.first().map(|a| &a.unit))
    } else {
        None
    };
    if output_axes {
        f.push_output_unit(shared_unit.is_none());
        for (i, axis) in cs.axes.iter().enumerate() {
            write_axis_wkt2(f, axis, i + 1);
        }
        f.pop_output_unit();
    }
    if let Some(unit) = shared_unit {
        write_unit(f, unit);
    }
}

fn write_axes_wkt1(f: &mut WktFormatter, cs: &CoordinateSystem) {
    for axis in &cs.axes {
        f.start_node("AXIS", false);
        f.add_quoted_string(wkt1_axis_name(axis));
        f.add(axis.direction.wkt1_name());
        f.end_node();
    }
}

fn write_usage(f: &mut WktFormatter, usage: &Usage) {
    if !f.is_wkt2() || usage.is_empty() {
        return;
    }
    let wrap = f.use_2018_keywords();
    if wrap {
        f.start_node("USAGE", false);
    }
    if let Some(scope) = &usage.scope {
        f.start_node("SCOPE", false);
        f.add_quoted_string(scope);
        f.end_node();
    }
    if let Some(extent) = &usage.extent {
        if let Some(description) = &extent.description {
            f.start_node("AREA", false);
            f.add_quoted_string(description);
            f.end_node();
        }
        if let Some(bbox) = &extent.bbox {
            f.start_node("BBOX", false);
            f.add_number(bbox.south);
            f.add_number(bbox.west);
            f.add_number(bbox.north);
            f.add_number(bbox.east);
            f.end_node();
        }
    }
    if wrap {
        f.end_node();
    }
}

/// Trailing usage, identifiers and remarks shared by CRSs and operations.
fn write_object_usage(f: &mut WktFormatter, usage: &Usage, ids: &[Identifier], remarks: Option<&str>) {
    write_usage(f, usage);
    write_ids(f, ids);
    if let (true, Some(remarks)) = (f.is_wkt2(), remarks) {
        f.start_node("REMARK", false);
        f.add_quoted_string(remarks);
        f.end_node();
    }
}

fn write_crs(f: &mut WktFormatter, crs: &Crs) -> Result<()> {
    match crs {
        Crs::Geodetic(c) => write_geodetic_crs(f, c),
        Crs::Projected(c) => write_projected_crs(f, c),
        Crs::Vertical(c) => {
            write_vertical_crs(f, c);
            Ok(())
        }
        Crs::Compound(c) => write_compound_crs(f, c),
    }
}

fn push_cs_units(f: &mut WktFormatter, cs: &CoordinateSystem) {
    f.push_axis_angular_unit(cs.angular_unit().cloned().unwrap_or_else(UnitOfMeasure::degree));
    f.push_axis_linear_unit(cs.linear_unit().cloned().unwrap_or_else(UnitOfMeasure::metre));
}

fn pop_cs_units(f: &mut WktFormatter) {
    f.pop_axis_linear_unit();
    f.pop_axis_angular_unit();
}

fn write_geodetic_crs(f: &mut WktFormatter, crs: &GeodeticCrs) -> Result<()> {
    if f.version() == WktVersion::Wkt1 {
        return write_geodetic_crs_wkt1(f, crs, false);
    }
    let keyword = if crs.is_geographic() && f.use_2018_keywords() {
        "GEOGCRS"
    } else {
        "GEODCRS"
    };
    f.start_node(keyword, !crs.ids.is_empty());
    f.add_quoted_string(&crs.name);
    write_geodetic_datum(f, &crs.datum);
    push_cs_units(f, &crs.cs);
    let pm = &crs.datum.prime_meridian;
    if !(pm.is_greenwich() && f.prime_meridian_omitted_if_greenwich()) {
        write_prime_meridian(f, pm);
    }
    write_cs_wkt2(f, &crs.cs);
    pop_cs_units(f);
    write_object_usage(f, &crs.usage, &crs.ids, crs.remarks.as_deref());
    f.end_node();
    Ok(())
}

fn write_base_crs_wkt2(f: &mut WktFormatter, base: &GeodeticCrs) {
    let keyword = if f.use_2018_keywords() && base.is_geographic() {
        "BASEGEOGCRS"
    } else {
        "BASEGEODCRS"
    };
    f.start_node(keyword, !base.ids.is_empty());
    f.add_quoted_string(&base.name);
    write_geodetic_datum(f, &base.datum);
    let angular = base.cs.angular_unit().cloned().unwrap_or_else(UnitOfMeasure::degree);
    f.push_axis_angular_unit(angular.clone());
    let pm = &base.datum.prime_meridian;
    if !(pm.is_greenwich() && f.prime_meridian_omitted_if_greenwich()) {
        write_prime_meridian(f, pm);
    }
    f.pop_axis_angular_unit();
    if !angular.is_equivalent_to(&UnitOfMeasure::degree()) {
        write_unit(f, &angular);
    }
    write_ids(f, &base.ids);
    f.end_node();
}

fn write_geodetic_crs_wkt1(f: &mut WktFormatter, crs: &GeodeticCrs, is_base: bool) -> Result<()> {
    if crs.is_geographic() && crs.cs.dimension() == 3 {
        f.lenient(format!(
            "{} is a 3D geographic CRS, which WKT1 cannot express",
            crs.name
        ))?;
    }
    let keyword = if crs.is_geocentric() { "GEOCCS" } else { "GEOGCS" };
    f.start_node(keyword, !crs.ids.is_empty());
    let name = if f.use_esri_dialect() {
        let table = "geodetic_crs";
        f.esri_alias(&crs.name, table).unwrap_or_else(|| {
            if crs.is_geographic() {
                esri::esri_geographic_crs_name(&crs.name)
            } else {
                esri::esri_crs_name(&crs.name)
            }
        })
    } else {
        crs.name.clone()
    };
    f.add_quoted_string(&name);
    write_geodetic_datum(f, &crs.datum);
    push_cs_units(f, &crs.cs);
    write_prime_meridian(f, &crs.datum.prime_meridian);
    let unit = if crs.is_geographic() {
        f.axis_angular_unit().clone()
    } else {
        f.axis_linear_unit().clone()
    };
    pop_cs_units(f);
    write_unit(f, &unit);
    let output_axes = match f.output_axis() {
        OutputAxisRule::Yes => true,
        OutputAxisRule::No => false,
        OutputAxisRule::Wkt1GdalEpsgStyle => !is_base,
    };
    if output_axes && !f.use_esri_dialect() {
        write_axes_wkt1(f, &crs.cs);
    }
    write_ids(f, &crs.ids);
    f.end_node();
    Ok(())
}

fn write_method_wkt2(f: &mut WktFormatter, method: &OperationMethod, inverted: bool) {
    f.start_node("METHOD", !method.ids.is_empty() && !inverted);
    if inverted {
        f.add_quoted_string(&format!("{}{}", INVERSE_OF, method.name));
    } else {
        f.add_quoted_string(&method.name);
        write_ids(f, &method.ids);
    }
    f.end_node();
}

fn write_parameter_wkt2(f: &mut WktFormatter, parameter: &OperationParameter) {
    let has_id = !parameter.ids.is_empty();
    match &parameter.value {
        ParameterValue::File(filename) => {
            f.start_node("PARAMETERFILE", has_id);
            f.add_quoted_string(&parameter.name);
            f.add_quoted_string(filename);
        }
        ParameterValue::Measure { value, unit } => {
            f.start_node("PARAMETER", has_id);
            f.add_quoted_string(&parameter.name);
            f.add_number(*value);
            let same_as_axis = match unit.kind {
                UnitKind::Angular => unit.is_equivalent_to(f.axis_angular_unit()),
                UnitKind::Linear => unit.is_equivalent_to(f.axis_linear_unit()),
                _ => false,
            };
            if !(f.prime_meridian_or_parameter_unit_omitted_if_same_as_axis() && same_as_axis) {
                write_unit(f, unit);
            }
        }
        ParameterValue::Integer(value) => {
            f.start_node("PARAMETER", has_id);
            f.add_quoted_string(&parameter.name);
            f.add_integer(*value);
        }
        ParameterValue::Text(text) => {
            f.start_node("PARAMETER", has_id);
            f.add_quoted_string(&parameter.name);
            f.add_quoted_string(text);
        }
    }
    write_ids(f, &parameter.ids);
    f.end_node();
}

fn write_conversion_wkt2(f: &mut WktFormatter, conversion: &Conversion) {
    f.start_node("CONVERSION", !conversion.ids.is_empty());
    f.add_quoted_string(&conversion.name);
    write_method_wkt2(f, &conversion.method, conversion.inverted);
    for parameter in &conversion.parameters {
        write_parameter_wkt2(f, parameter);
    }
    write_ids(f, &conversion.ids);
    f.end_node();
}

fn write_projected_crs(f: &mut WktFormatter, crs: &ProjectedCrs) -> Result<()> {
    if f.version() == WktVersion::Wkt1 {
        return write_projected_crs_wkt1(f, crs);
    }
    f.start_node("PROJCRS", !crs.ids.is_empty());
    f.add_quoted_string(&crs.name);
    write_base_crs_wkt2(f, &crs.base);
    f.push_axis_angular_unit(
        crs.base
            .cs
            .angular_unit()
            .cloned()
            .unwrap_or_else(UnitOfMeasure::degree),
    );
    f.push_axis_linear_unit(crs.cs.linear_unit().cloned().unwrap_or_else(UnitOfMeasure::metre));
    write_conversion_wkt2(f, &crs.conversion);
    write_cs_wkt2(f, &crs.cs);
    pop_cs_units(f);
    write_object_usage(f, &crs.usage, &crs.ids, crs.remarks.as_deref());
    f.end_node();
    Ok(())
}

fn method_mapping(method: &OperationMethod) -> Option<&'static MethodMapping> {
    method
        .epsg_code()
        .and_then(mappings::method_by_code)
        .or_else(|| mappings::method_by_name(&method.name))
}

/// WKT1 parameter spelling and value converted to the CRS units.
fn wkt1_parameters(
    f: &WktFormatter,
    conversion: &Conversion,
    mapping: Option<&'static MethodMapping>,
    angular: &UnitOfMeasure,
    linear: &UnitOfMeasure,
) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    for parameter in &conversion.parameters {
        let known = mapping.and_then(|m| {
            parameter
                .epsg_code()
                .and_then(|code| m.param_by_code(code))
                .or_else(|| m.param_by_name(&parameter.name))
        });
        let name = match known {
            Some(p) if f.use_esri_dialect() => p.param.esri_name.to_string(),
            Some(p) => p.param.wkt1_name.to_string(),
            None => parameter.name.replace(' ', "_").to_ascii_lowercase(),
        };
        let value = match &parameter.value {
            ParameterValue::Measure { value, unit } => match unit.kind {
                UnitKind::Angular => unit.convert(*value, angular),
                UnitKind::Linear => unit.convert(*value, linear),
                _ => *value,
            },
            ParameterValue::Integer(i) => *i as f64,
            ParameterValue::File(_) | ParameterValue::Text(_) => continue,
        };
        out.push((name, value));
    }
    if f.use_esri_dialect() {
        // ESRI lists false easting and northing first and latitude of origin last
        let rank = |name: &str| match name {
            "False_Easting" => 0,
            "False_Northing" => 1,
            "Latitude_Of_Origin" => 3,
            _ => 2,
        };
        out.sort_by_key(|(name, _)| rank(name));
    }
    out
}

fn write_projected_crs_wkt1(f: &mut WktFormatter, crs: &ProjectedCrs) -> Result<()> {
    let mapping = method_mapping(&crs.conversion.method);
    let projection = match (mapping, f.use_esri_dialect()) {
        (Some(m), false) => m.wkt1_name.to_string(),
        (Some(MethodMapping { esri_name: Some(name), .. }), true) => name.to_string(),
        _ => {
            f.lenient(format!(
                "Method '{}' has no {} equivalent",
                crs.conversion.method.name,
                f.convention()
            ))?;
            crs.conversion.method.name.replace(' ', "_")
        }
    };

    f.start_node("PROJCS", !crs.ids.is_empty());
    let name = if f.use_esri_dialect() {
        f.esri_alias(&crs.name, "projected_crs")
            .unwrap_or_else(|| esri::esri_crs_name(&crs.name))
    } else {
        crs.name.clone()
    };
    f.add_quoted_string(&name);
    write_geodetic_crs_wkt1(f, &crs.base, true)?;

    f.start_node("PROJECTION", false);
    f.add_quoted_string(&projection);
    f.end_node();

    let angular = crs
        .base
        .cs
        .angular_unit()
        .cloned()
        .unwrap_or_else(UnitOfMeasure::degree);
    let linear = crs.cs.linear_unit().cloned().unwrap_or_else(UnitOfMeasure::metre);
    for (param_name, value) in wkt1_parameters(f, &crs.conversion, mapping, &angular, &linear) {
        f.start_node("PARAMETER", false);
        f.add_quoted_string(&param_name);
        f.add_number(value);
        f.end_node();
    }
    write_unit(f, &linear);
    if matches!(f.output_axis(), OutputAxisRule::Yes | OutputAxisRule::Wkt1GdalEpsgStyle)
        && !f.use_esri_dialect()
    {
        write_axes_wkt1(f, &crs.cs);
    }
    write_ids(f, &crs.ids);
    f.end_node();
    Ok(())
}

fn write_vertical_crs(f: &mut WktFormatter, crs: &VerticalCrs) {
    let unit = crs
        .cs
        .linear_unit()
        .cloned()
        .unwrap_or_else(UnitOfMeasure::metre);
    match (f.version(), f.use_esri_dialect()) {
        (WktVersion::Wkt2, _) => {
            f.start_node("VERTCRS", !crs.ids.is_empty());
            f.add_quoted_string(&crs.name);
            write_vertical_datum(f, &crs.datum);
            f.push_axis_linear_unit(unit);
            write_cs_wkt2(f, &crs.cs);
            f.pop_axis_linear_unit();
            write_object_usage(f, &crs.usage, &crs.ids, crs.remarks.as_deref());
        }
        (WktVersion::Wkt1, false) => {
            f.start_node("VERT_CS", !crs.ids.is_empty());
            f.add_quoted_string(&crs.name);
            write_vertical_datum(f, &crs.datum);
            write_unit(f, &unit);
            if f.output_axis() != OutputAxisRule::No {
                write_axes_wkt1(f, &crs.cs);
            }
            write_ids(f, &crs.ids);
        }
        (WktVersion::Wkt1, true) => {
            f.start_node("VERTCS", false);
            let name = f
                .esri_alias(&crs.name, "vertical_crs")
                .unwrap_or_else(|| esri::morph_name_to_esri(&crs.name));
            f.add_quoted_string(&name);
            write_vertical_datum(f, &crs.datum);
            f.start_node("PARAMETER", false);
            f.add_quoted_string("Vertical_Shift");
            f.add_number(0.0);
            f.end_node();
            f.start_node("PARAMETER", false);
            f.add_quoted_string("Direction");
            f.add_number(if crs.is_depth() { -1.0 } else { 1.0 });
            f.end_node();
            write_unit(f, &unit);
        }
    }
    f.end_node();
}

fn write_compound_crs(f: &mut WktFormatter, crs: &CompoundCrs) -> Result<()> {
    if f.use_esri_dialect() {
        return Err(Error::format(format!(
            "Compound CRS '{}' cannot be exported as WKT1_ESRI",
            crs.name
        )));
    }
    let keyword = if f.is_wkt2() { "COMPOUNDCRS" } else { "COMPD_CS" };
    f.start_node(keyword, !crs.ids.is_empty());
    f.add_quoted_string(&crs.name);
    for component in &crs.components {
        write_crs(f, component)?;
    }
    write_object_usage(f, &crs.usage, &crs.ids, crs.remarks.as_deref());
    f.end_node();
    Ok(())
}

fn write_operation(f: &mut WktFormatter, op: &CoordinateOperation) -> Result<()> {
    if f.version() == WktVersion::Wkt1 {
        return Err(Error::format(format!(
            "Coordinate operation '{}' cannot be exported as {}",
            op.name(),
            f.convention()
        )));
    }
    match op {
        CoordinateOperation::Conversion(conversion) => {
            write_conversion_wkt2(f, conversion);
            Ok(())
        }
        CoordinateOperation::Transformation(transformation) => {
            write_transformation(f, transformation)
        }
        CoordinateOperation::Concatenated(concatenated) => write_concatenated(f, concatenated),
        CoordinateOperation::ProjBased(proj_based) => {
            write_proj_based(f, proj_based);
            Ok(())
        }
    }
}

fn write_wrapped_crs(f: &mut WktFormatter, keyword: &str, crs: &Crs) -> Result<()> {
    f.start_node(keyword, false);
    write_crs(f, crs)?;
    f.end_node();
    Ok(())
}

fn write_transformation(f: &mut WktFormatter, op: &Transformation) -> Result<()> {
    f.start_node("COORDINATEOPERATION", !op.ids.is_empty());
    f.add_quoted_string(&op.name);
    write_wrapped_crs(f, "SOURCECRS", &op.source)?;
    write_wrapped_crs(f, "TARGETCRS", &op.target)?;
    write_method_wkt2(f, &op.method, op.inverted);
    let source_units = op.source.geodetic().map(|g| g.cs.clone());
    if let Some(cs) = &source_units {
        push_cs_units(f, cs);
    }
    for parameter in &op.parameters {
        write_parameter_wkt2(f, parameter);
    }
    if source_units.is_some() {
        pop_cs_units(f);
    }
    if let Some(accuracy) = op.accuracy {
        f.start_node("OPERATIONACCURACY", false);
        f.add_number(accuracy);
        f.end_node();
    }
    write_object_usage(f, &op.usage, &op.ids, None);
    f.end_node();
    Ok(())
}

fn write_concatenated(f: &mut WktFormatter, op: &ConcatenatedOperation) -> Result<()> {
    if !f.use_2018_keywords() {
        return Err(Error::format(format!(
            "Concatenated operation '{}' cannot be exported as {}",
            op.name,
            f.convention()
        )));
    }
    let wrapped = CoordinateOperation::Concatenated(op.clone());
    let (Some(source), Some(target)) = (wrapped.source_crs(), wrapped.target_crs()) else {
        return Err(Error::format(format!(
            "Concatenated operation '{}' has no source or target CRS",
            op.name
        )));
    };
    f.start_node("CONCATENATEDOPERATION", !op.ids.is_empty());
    f.add_quoted_string(&op.name);
    write_wrapped_crs(f, "SOURCECRS", source)?;
    write_wrapped_crs(f, "TARGETCRS", target)?;
    for step in &op.operations {
        f.start_node("STEP", false);
        write_operation(f, step)?;
        f.end_node();
    }
    write_object_usage(f, &op.usage, &op.ids, None);
    f.end_node();
    Ok(())
}

fn write_proj_based(f: &mut WktFormatter, op: &ProjBasedOperation) {
    f.start_node("CONVERSION", !op.ids.is_empty());
    f.add_quoted_string(&op.name);
    f.start_node("METHOD", false);
    let method = format!("{}{}", PROJ_BASED_METHOD_PREFIX, op.definition);
    if op.inverted {
        f.add_quoted_string(&format!("{}{}", INVERSE_OF, method));
    } else {
        f.add_quoted_string(&method);
    }
    f.end_node();
    write_ids(f, &op.ids);
    f.end_node();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AxisDirection, Extent, GeographicBoundingBox};

    fn utm31() -> ProjectedCrs {
        let degree = UnitOfMeasure::degree();
        let metre = UnitOfMeasure::metre();
        let conversion = Conversion {
            ids: vec![Identifier::new("EPSG", "16031")],
            ..Conversion::new(
                "UTM zone 31N",
                OperationMethod::epsg("Transverse Mercator", 9807),
                vec![
                    OperationParameter::epsg("Latitude of natural origin", 8801, ParameterValue::measure(0.0, degree.clone())),
                    OperationParameter::epsg("Longitude of natural origin", 8802, ParameterValue::measure(3.0, degree)),
                    OperationParameter::epsg("Scale factor at natural origin", 8805, ParameterValue::measure(0.9996, UnitOfMeasure::unity())),
                    OperationParameter::epsg("False easting", 8806, ParameterValue::measure(500000.0, metre.clone())),
                    OperationParameter::epsg("False northing", 8807, ParameterValue::measure(0.0, metre.clone())),
                ],
            )
        };
        ProjectedCrs {
            ids: vec![Identifier::new("EPSG", "32631")],
            ..ProjectedCrs::new(
                "WGS 84 / UTM zone 31N",
                GeodeticCrs::epsg_4326(),
                conversion,
                CoordinateSystem::easting_northing(metre),
            )
        }
    }

    fn single_line(object: &Object, convention: WktConvention) -> String {
        let mut f = WktFormatter::create(convention);
        f.set_multi_line(false);
        object.export_to_wkt(&mut f).unwrap();
        assert_eq!(f.open_contexts(), 0);
        f.into_string()
    }

    #[test]
    fn test_geographic_crs_wkt2_2018() {
        let crs = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let wkt = single_line(&crs, WktConvention::Wkt2_2018);
        assert_eq!(
            wkt,
            concat!(
                r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],"#,
                r#"PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],CS[ellipsoidal,2],"#,
                r#"AXIS["geodetic latitude (Lat)",north,ORDER[1],ANGLEUNIT["degree",0.0174532925199433]],"#,
                r#"AXIS["geodetic longitude (Lon)",east,ORDER[2],ANGLEUNIT["degree",0.0174532925199433]],"#,
                r#"ID["EPSG",4326]]"#
            )
        );
    }

    #[test]
    fn test_geographic_crs_simplified() {
        let crs = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let wkt = single_line(&crs, WktConvention::Wkt2_2015Simplified);
        assert_eq!(
            wkt,
            concat!(
                r#"GEODCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563]],"#,
                r#"CS[ellipsoidal,2],AXIS["geodetic latitude (Lat)",north],AXIS["geodetic longitude (Lon)",east],"#,
                r#"UNIT["degree",0.0174532925199433],ID["EPSG",4326]]"#
            )
        );
    }

    #[test]
    fn test_geographic_crs_wkt1_gdal() {
        let crs = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let wkt = single_line(&crs, WktConvention::Wkt1Gdal);
        assert_eq!(
            wkt,
            concat!(
                r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],"#,
                r#"PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],"#,
                r#"AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#
            )
        );
    }

    #[test]
    fn test_geographic_crs_esri() {
        let crs = Object::Crs(Crs::Geodetic(GeodeticCrs::epsg_4326()));
        let wkt = single_line(&crs, WktConvention::Wkt1Esri);
        assert_eq!(
            wkt,
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#
        );
    }

    #[test]
    fn test_projected_crs_ids_and_method() {
        let crs = Object::Crs(Crs::Projected(utm31()));
        let wkt = single_line(&crs, WktConvention::Wkt2_2018);
        assert!(wkt.starts_with(r#"PROJCRS["WGS 84 / UTM zone 31N",BASEGEOGCRS["WGS 84","#));
        assert!(wkt.contains(r#"METHOD["Transverse Mercator",ID["EPSG",9807]]"#));
        assert!(wkt.contains(r#"PARAMETER["Scale factor at natural origin",0.9996,SCALEUNIT["unity",1],ID["EPSG",8805]]"#));
        assert!(wkt.contains(r#"AXIS["(E)",east,ORDER[1],LENGTHUNIT["metre",1]]"#));
        assert!(wkt.ends_with(r#"ID["EPSG",32631]]"#));
        assert!(!wkt.contains(r#"ID["EPSG",4326]"#), "base CRS id hidden under PROJCRS id");
        assert!(!wkt.contains(r#"ID["EPSG",16031]"#));
    }

    #[test]
    fn test_projected_crs_simplified_omits_parameter_units() {
        let crs = Object::Crs(Crs::Projected(utm31()));
        let wkt = single_line(&crs, WktConvention::Wkt2_2018Simplified);
        assert!(wkt.contains(r#"PARAMETER["Longitude of natural origin",3]"#));
        assert!(wkt.contains(r#"PARAMETER["False easting",500000]"#));
        assert!(wkt.contains(r#"PARAMETER["Scale factor at natural origin",0.9996,UNIT["unity",1]]"#));
        assert!(!wkt.contains("ID[\"EPSG\",9807]"));
    }

    #[test]
    fn test_projected_crs_wkt1_gdal() {
        let crs = Object::Crs(Crs::Projected(utm31()));
        let wkt = single_line(&crs, WktConvention::Wkt1Gdal);
        assert!(wkt.starts_with(r#"PROJCS["WGS 84 / UTM zone 31N",GEOGCS["WGS 84""#));
        assert!(wkt.contains(r#"PROJECTION["Transverse_Mercator"]"#));
        assert!(wkt.contains(r#"PARAMETER["central_meridian",3]"#));
        assert!(wkt.contains(r#"UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","32631"]]"#));
        assert!(!wkt.contains(r#"AXIS["Latitude",NORTH]"#), "no axes on the base GEOGCS");
    }

    #[test]
    fn test_projected_crs_esri_parameter_order() {
        let crs = Object::Crs(Crs::Projected(utm31()));
        let wkt = single_line(&crs, WktConvention::Wkt1Esri);
        assert!(wkt.starts_with(r#"PROJCS["WGS_1984_UTM_Zone_31N",GEOGCS["GCS_WGS_1984""#));
        assert!(wkt.contains(concat!(
            r#"PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],"#,
            r#"PARAMETER["Central_Meridian",3.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#
        )));
    }

    #[test]
    fn test_unmapped_method_strictness() {
        let mut crs = utm31();
        crs.conversion.method = OperationMethod::new("Fancy Projection");
        let object = Object::Crs(Crs::Projected(crs));

        let mut strict = WktFormatter::create(WktConvention::Wkt1Gdal);
        assert!(matches!(object.export_to_wkt(&mut strict), Err(Error::Format { .. })));

        let mut lenient = WktFormatter::create(WktConvention::Wkt1Gdal);
        lenient.set_strict(false);
        object.export_to_wkt(&mut lenient).unwrap();
        assert!(lenient.as_str().contains(r#"PROJECTION["Fancy_Projection"]"#));
    }

    #[test]
    fn test_usage_2015_vs_2018() {
        let mut crs = GeodeticCrs::epsg_4326();
        crs.usage = Usage {
            scope: Some("Horizontal component of 3D system.".to_string()),
            extent: Some(Extent {
                description: Some("World.".to_string()),
                bbox: Some(GeographicBoundingBox::new(-180.0, -90.0, 180.0, 90.0)),
                ids: Vec::new(),
            }),
        };
        let object = Object::Crs(Crs::Geodetic(crs));
        let wkt2018 = single_line(&object, WktConvention::Wkt2_2018);
        assert!(wkt2018.contains(r#"USAGE[SCOPE["Horizontal component of 3D system."],AREA["World."],BBOX[-90,-180,90,180]],ID["EPSG",4326]"#));
        let wkt2015 = single_line(&object, WktConvention::Wkt2_2015);
        assert!(wkt2015.contains(r#"SCOPE["Horizontal component of 3D system."],AREA["World."],BBOX[-90,-180,90,180],ID["EPSG",4326]"#));

        let wkt1 = single_line(&object, WktConvention::Wkt1Gdal);
        assert!(!wkt1.contains("SCOPE"));
    }

    #[test]
    fn test_operations_not_in_wkt1() {
        let op = Object::CoordinateOperation(CoordinateOperation::ProjBased(ProjBasedOperation::new(
            "noop",
            "+proj=noop",
        )));
        assert!(matches!(op.to_wkt(WktConvention::Wkt1Gdal), Err(Error::Format { .. })));
        let wkt = single_line(&op, WktConvention::Wkt2_2018);
        assert_eq!(wkt, r#"CONVERSION["noop",METHOD["PROJ-based operation method: +proj=noop"]]"#);
    }

    #[test]
    fn test_concatenated_needs_2018() {
        let op = Object::CoordinateOperation(CoordinateOperation::Concatenated(
            ConcatenatedOperation::new("empty", Vec::new()),
        ));
        assert!(matches!(op.to_wkt(WktConvention::Wkt2_2015), Err(Error::Format { .. })));
        assert!(matches!(op.to_wkt(WktConvention::Wkt2_2018), Err(Error::Format { .. })));
    }

    #[test]
    fn test_compound_not_in_esri() {
        let compound = Object::Crs(Crs::Compound(CompoundCrs::new(
            "x",
            vec![Crs::Geodetic(GeodeticCrs::epsg_4326())],
        )));
        assert!(matches!(compound.to_wkt(WktConvention::Wkt1Esri), Err(Error::Format { .. })));
        assert!(compound.to_wkt(WktConvention::Wkt1Gdal).unwrap().starts_with("COMPD_CS["));
    }

    #[test]
    fn test_wkt2_axis_names() {
        let unit = UnitOfMeasure::metre();
        assert_eq!(wkt2_axis_name(&Axis::new("Easting", "E", AxisDirection::East, unit.clone())), "(E)");
        assert_eq!(
            wkt2_axis_name(&Axis::new("Gravity-related height", "H", AxisDirection::Up, unit.clone())),
            "gravity-related height (H)"
        );
        assert_eq!(wkt2_axis_name(&Axis::new("Custom", "", AxisDirection::Up, unit)), "Custom");
    }

    #[test]
    fn test_standalone_objects() {
        assert_eq!(
            single_line(&Object::Unit(UnitOfMeasure::metre()), WktConvention::Wkt2_2018),
            r#"LENGTHUNIT["metre",1,ID["EPSG",9001]]"#
        );
        assert!(Object::CoordinateSystem(CoordinateSystem::easting_northing(UnitOfMeasure::metre()))
            .to_wkt(WktConvention::Wkt2_2018)
            .is_err());
    }
}
