//! Coordinate operations: conversions, transformations, concatenations and
//! operations only known through a pipeline string.

use std::sync::Arc;

use super::common::{names_match, numbers_match, Identifier, UnitOfMeasure, Usage};
use super::crs::Crs;

/// Method of a conversion or transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMethod {
    pub name: String,
    pub ids: Vec<Identifier>,
}

impl OperationMethod {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ids: Vec::new(),
        }
    }

    pub fn epsg(name: &str, code: i32) -> Self {
        Self {
            name: name.to_string(),
            ids: vec![Identifier::new("EPSG", &code.to_string())],
        }
    }

    /// EPSG code of the method, when it carries one.
    pub fn epsg_code(&self) -> Option<i32> {
        epsg_code_of(&self.ids)
    }
}

pub(crate) fn epsg_code_of(ids: &[Identifier]) -> Option<i32> {
    ids.iter()
        .find(|id| id.authority.eq_ignore_ascii_case("EPSG"))
        .and_then(|id| id.code.parse().ok())
}

/// Value of an operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Measure { value: f64, unit: UnitOfMeasure },
    File(String),
    Integer(i64),
    Text(String),
}

impl ParameterValue {
    pub fn measure(value: f64, unit: UnitOfMeasure) -> Self {
        ParameterValue::Measure { value, unit }
    }

    /// Numeric value converted to `unit`, if this is a measure.
    pub fn value_in(&self, unit: &UnitOfMeasure) -> Option<f64> {
        match self {
            ParameterValue::Measure { value, unit: own } => Some(own.convert(*value, unit)),
            ParameterValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn negated(&self) -> Self {
        match self {
            ParameterValue::Measure { value, unit } => ParameterValue::Measure {
                value: if *value == 0.0 { 0.0 } else { -*value },
                unit: unit.clone(),
            },
            other => other.clone(),
        }
    }

    fn is_equivalent_to(&self, other: &ParameterValue) -> bool {
        match (self, other) {
            (
                ParameterValue::Measure { value: a, unit: ua },
                ParameterValue::Measure { value: b, unit: ub },
            ) => ua.kind == ub.kind && numbers_match(ua.convert(*a, ub), *b),
            (ParameterValue::File(a), ParameterValue::File(b)) => a == b,
            (ParameterValue::Integer(a), ParameterValue::Integer(b)) => a == b,
            (ParameterValue::Text(a), ParameterValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

/// A named parameter and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationParameter {
    pub name: String,
    pub value: ParameterValue,
    pub ids: Vec<Identifier>,
}

impl OperationParameter {
    pub fn new(name: &str, value: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            value,
            ids: Vec::new(),
        }
    }

    pub fn epsg(name: &str, code: i32, value: ParameterValue) -> Self {
        Self {
            ids: vec![Identifier::new("EPSG", &code.to_string())],
            ..Self::new(name, value)
        }
    }

    pub fn epsg_code(&self) -> Option<i32> {
        epsg_code_of(&self.ids)
    }
}

/// Find a parameter by EPSG code, falling back to its name.
fn find_parameter<'a>(
    parameters: &'a [OperationParameter],
    epsg_code: i32,
    name: &str,
) -> Option<&'a OperationParameter> {
    parameters
        .iter()
        .find(|p| p.epsg_code() == Some(epsg_code))
        .or_else(|| parameters.iter().find(|p| names_match(&p.name, name)))
}

fn parameters_equivalent(a: &[OperationParameter], b: &[OperationParameter]) -> bool {
    a.len() == b.len()
        && a.iter().all(|pa| {
            let counterpart = match pa.epsg_code() {
                Some(code) => find_parameter(b, code, &pa.name),
                None => b.iter().find(|pb| names_match(&pa.name, &pb.name)),
            };
            counterpart.is_some_and(|pb| pa.value.is_equivalent_to(&pb.value))
        })
}

/// A map projection or other conversion without datum change.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub name: String,
    pub method: OperationMethod,
    pub parameters: Vec<OperationParameter>,
    pub ids: Vec<Identifier>,
    /// True when the conversion is used in its reverse direction
    pub inverted: bool,
}

impl Conversion {
    pub fn new(name: &str, method: OperationMethod, parameters: Vec<OperationParameter>) -> Self {
        Self {
            name: name.to_string(),
            method,
            parameters,
            ids: Vec::new(),
            inverted: false,
        }
    }

    pub fn parameter(&self, epsg_code: i32, name: &str) -> Option<&OperationParameter> {
        find_parameter(&self.parameters, epsg_code, name)
    }

    /// Names of conversions are not defining.
    pub fn is_equivalent_to(&self, other: &Conversion) -> bool {
        let same_method = match (self.method.epsg_code(), other.method.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => names_match(&self.method.name, &other.method.name),
        };
        same_method
            && self.inverted == other.inverted
            && parameters_equivalent(&self.parameters, &other.parameters)
    }
}

/// Geocentric translations, position vector and coordinate frame methods
/// in their geographic 2D, 3D and geocentric flavours.
const HELMERT_METHODS: &[i32] = &[9603, 9606, 9607, 1031, 1032, 1033, 1035, 1037, 1038];

/// A datum change between two CRSs.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub name: String,
    pub source: Arc<Crs>,
    pub target: Arc<Crs>,
    pub method: OperationMethod,
    pub parameters: Vec<OperationParameter>,
    /// Accuracy in metres, when known
    pub accuracy: Option<f64>,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub deprecated: bool,
    /// True when the stored operation is used in its reverse direction
    pub inverted: bool,
}

impl Transformation {
    pub fn new(
        name: &str,
        source: Arc<Crs>,
        target: Arc<Crs>,
        method: OperationMethod,
        parameters: Vec<OperationParameter>,
    ) -> Self {
        Self {
            name: name.to_string(),
            source,
            target,
            method,
            parameters,
            accuracy: None,
            ids: Vec::new(),
            usage: Usage::default(),
            deprecated: false,
            inverted: false,
        }
    }

    pub fn parameter(&self, epsg_code: i32, name: &str) -> Option<&OperationParameter> {
        find_parameter(&self.parameters, epsg_code, name)
    }

    pub fn is_helmert(&self) -> bool {
        self.method
            .epsg_code()
            .is_some_and(|code| HELMERT_METHODS.contains(&code))
    }

    /// Grid files referenced by file parameters.
    pub fn grid_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter_map(|p| match &p.value {
                ParameterValue::File(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Reverse transformation. Helmert parameters are negated; other methods
    /// keep their parameters and flip the `inverted` flag.
    pub fn inverse(&self) -> Transformation {
        let mut out = self.clone();
        out.source = Arc::clone(&self.target);
        out.target = Arc::clone(&self.source);
        out.name = inverse_name(&self.name);
        if self.is_helmert() {
            out.parameters = self
                .parameters
                .iter()
                .map(|p| OperationParameter {
                    value: p.value.negated(),
                    ..p.clone()
                })
                .collect();
        } else {
            out.inverted = !self.inverted;
        }
        out
    }

    pub fn is_equivalent_to(&self, other: &Transformation) -> bool {
        self.source.is_equivalent_to(&other.source)
            && self.target.is_equivalent_to(&other.target)
            && names_match(&self.method.name, &other.method.name)
            && self.inverted == other.inverted
            && parameters_equivalent(&self.parameters, &other.parameters)
    }
}

fn inverse_name(name: &str) -> String {
    match name.strip_prefix("Inverse of ") {
        Some(original) => original.to_string(),
        None => format!("Inverse of {}", name),
    }
}

/// Sequence of operations applied one after the other.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatenatedOperation {
    pub name: String,
    pub operations: Vec<CoordinateOperation>,
    pub ids: Vec<Identifier>,
    pub usage: Usage,
    pub deprecated: bool,
}

impl ConcatenatedOperation {
    pub fn new(name: &str, operations: Vec<CoordinateOperation>) -> Self {
        Self {
            name: name.to_string(),
            operations,
            ids: Vec::new(),
            usage: Usage::default(),
            deprecated: false,
        }
    }

    pub fn inverse(&self) -> ConcatenatedOperation {
        let mut out = self.clone();
        out.name = inverse_name(&self.name);
        out.operations = self
            .operations
            .iter()
            .rev()
            .map(CoordinateOperation::inverse)
            .collect();
        out
    }
}

/// An operation only known through its pipeline string.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjBasedOperation {
    pub name: String,
    pub definition: String,
    pub inverted: bool,
    pub ids: Vec<Identifier>,
}

impl ProjBasedOperation {
    pub fn new(name: &str, definition: &str) -> Self {
        Self {
            name: name.to_string(),
            definition: definition.to_string(),
            inverted: false,
            ids: Vec::new(),
        }
    }
}

/// Any coordinate operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateOperation {
    Conversion(Conversion),
    Transformation(Transformation),
    Concatenated(ConcatenatedOperation),
    ProjBased(ProjBasedOperation),
}

impl CoordinateOperation {
    pub fn name(&self) -> &str {
        match self {
            CoordinateOperation::Conversion(op) => &op.name,
            CoordinateOperation::Transformation(op) => &op.name,
            CoordinateOperation::Concatenated(op) => &op.name,
            CoordinateOperation::ProjBased(op) => &op.name,
        }
    }

    pub fn ids(&self) -> &[Identifier] {
        match self {
            CoordinateOperation::Conversion(op) => &op.ids,
            CoordinateOperation::Transformation(op) => &op.ids,
            CoordinateOperation::Concatenated(op) => &op.ids,
            CoordinateOperation::ProjBased(op) => &op.ids,
        }
    }

    pub fn ids_mut(&mut self) -> &mut Vec<Identifier> {
        match self {
            CoordinateOperation::Conversion(op) => &mut op.ids,
            CoordinateOperation::Transformation(op) => &mut op.ids,
            CoordinateOperation::Concatenated(op) => &mut op.ids,
            CoordinateOperation::ProjBased(op) => &mut op.ids,
        }
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        match self {
            CoordinateOperation::Transformation(op) => Some(&op.source),
            CoordinateOperation::Concatenated(op) => op.operations.first()?.source_crs(),
            _ => None,
        }
    }

    pub fn target_crs(&self) -> Option<&Arc<Crs>> {
        match self {
            CoordinateOperation::Transformation(op) => Some(&op.target),
            CoordinateOperation::Concatenated(op) => op.operations.last()?.target_crs(),
            _ => None,
        }
    }

    /// Accuracy in metres. A concatenation has a known accuracy only when
    /// every step has one; accuracies add up.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            CoordinateOperation::Conversion(_) => Some(0.0),
            CoordinateOperation::Transformation(op) => op.accuracy,
            CoordinateOperation::Concatenated(op) => op
                .operations
                .iter()
                .map(CoordinateOperation::accuracy)
                .sum(),
            CoordinateOperation::ProjBased(_) => None,
        }
    }

    pub fn usage(&self) -> Option<&Usage> {
        match self {
            CoordinateOperation::Transformation(op) => Some(&op.usage),
            CoordinateOperation::Concatenated(op) => Some(&op.usage),
            _ => None,
        }
    }

    /// Area of use in square degrees. Concatenations without their own area
    /// take the smallest area of their steps.
    pub fn area_of_use(&self) -> f64 {
        let own = self
            .usage()
            .and_then(|u| u.extent.as_ref())
            .map(|e| e.area())
            .unwrap_or(0.0);
        match self {
            CoordinateOperation::Concatenated(op) if own == 0.0 => op
                .operations
                .iter()
                .map(CoordinateOperation::area_of_use)
                .filter(|a| *a > 0.0)
                .fold(0.0, |acc: f64, a| if acc == 0.0 { a } else { acc.min(a) }),
            _ => own,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        match self {
            CoordinateOperation::Transformation(op) => op.deprecated,
            CoordinateOperation::Concatenated(op) => {
                op.deprecated || op.operations.iter().any(CoordinateOperation::is_deprecated)
            }
            _ => false,
        }
    }

    pub fn step_count(&self) -> usize {
        match self {
            CoordinateOperation::Concatenated(op) => op
                .operations
                .iter()
                .map(CoordinateOperation::step_count)
                .sum(),
            _ => 1,
        }
    }

    pub fn grid_names(&self) -> Vec<String> {
        match self {
            CoordinateOperation::Transformation(op) => op.grid_names(),
            CoordinateOperation::Concatenated(op) => op
                .operations
                .iter()
                .flat_map(CoordinateOperation::grid_names)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn inverse(&self) -> CoordinateOperation {
        match self {
            CoordinateOperation::Conversion(op) => {
                let mut out = op.clone();
                out.name = inverse_name(&op.name);
                out.inverted = !op.inverted;
                CoordinateOperation::Conversion(out)
            }
            CoordinateOperation::Transformation(op) => {
                CoordinateOperation::Transformation(op.inverse())
            }
            CoordinateOperation::Concatenated(op) => CoordinateOperation::Concatenated(op.inverse()),
            CoordinateOperation::ProjBased(op) => {
                let mut out = op.clone();
                out.name = inverse_name(&op.name);
                out.inverted = !op.inverted;
                CoordinateOperation::ProjBased(out)
            }
        }
    }

    pub fn is_equivalent_to(&self, other: &CoordinateOperation) -> bool {
        match (self, other) {
            (CoordinateOperation::Conversion(a), CoordinateOperation::Conversion(b)) => {
                a.is_equivalent_to(b)
            }
            (CoordinateOperation::Transformation(a), CoordinateOperation::Transformation(b)) => {
                a.is_equivalent_to(b)
            }
            (CoordinateOperation::Concatenated(a), CoordinateOperation::Concatenated(b)) => {
                a.operations.len() == b.operations.len()
                    && a.operations
                        .iter()
                        .zip(&b.operations)
                        .all(|(x, y)| x.is_equivalent_to(y))
            }
            (CoordinateOperation::ProjBased(a), CoordinateOperation::ProjBased(b)) => {
                a.definition == b.definition && a.inverted == b.inverted
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Extent, GeodeticCrs, GeographicBoundingBox};

    fn helmert() -> Transformation {
        let metre = UnitOfMeasure::metre();
        Transformation::new(
            "ED50 to WGS 84 (1)",
            Arc::new(Crs::Geodetic(GeodeticCrs::epsg_4326())),
            Arc::new(Crs::Geodetic(GeodeticCrs::epsg_4326())),
            OperationMethod::epsg("Geocentric translations (geog2D domain)", 9603),
            vec![
                OperationParameter::epsg("X-axis translation", 8605, ParameterValue::measure(-87.0, metre.clone())),
                OperationParameter::epsg("Y-axis translation", 8606, ParameterValue::measure(-98.0, metre.clone())),
                OperationParameter::epsg("Z-axis translation", 8607, ParameterValue::measure(-121.0, metre)),
            ],
        )
    }

    #[test]
    fn test_helmert_inverse_negates_parameters() {
        let forward = helmert();
        let inverse = forward.inverse();
        assert_eq!(inverse.name, "Inverse of ED50 to WGS 84 (1)");
        let tx = inverse.parameter(8605, "X-axis translation").map(|p| &p.value);
        assert_eq!(tx, Some(&ParameterValue::measure(87.0, UnitOfMeasure::metre())));
        assert!(!inverse.inverted);
        assert_eq!(inverse.inverse().name, forward.name);
    }

    #[test]
    fn test_grid_inverse_flips_flag() {
        let mut grid = helmert();
        grid.method = OperationMethod::epsg("NTv2", 9615);
        grid.parameters = vec![OperationParameter::epsg(
            "Latitude and longitude difference file",
            8656,
            ParameterValue::File("OSTN15_NTv2_OSGBtoETRS.gsb".to_string()),
        )];
        let inverse = grid.inverse();
        assert!(inverse.inverted);
        assert_eq!(inverse.grid_names(), vec!["OSTN15_NTv2_OSGBtoETRS.gsb"]);
    }

    #[test]
    fn test_concatenated_accuracy_and_area() {
        let mut first = helmert();
        first.accuracy = Some(1.0);
        first.usage.extent = Some(Extent {
            bbox: Some(GeographicBoundingBox::new(-10.0, 35.0, 30.0, 70.0)),
            ..Extent::default()
        });
        let mut second = helmert();
        second.accuracy = Some(2.0);
        let concat = CoordinateOperation::Concatenated(ConcatenatedOperation::new(
            "chain",
            vec![
                CoordinateOperation::Transformation(first.clone()),
                CoordinateOperation::Transformation(second.clone()),
            ],
        ));
        assert_eq!(concat.accuracy(), Some(3.0));
        assert_eq!(concat.area_of_use(), 1400.0);
        assert_eq!(concat.step_count(), 2);

        second.accuracy = None;
        let unknown = CoordinateOperation::Concatenated(ConcatenatedOperation::new(
            "chain",
            vec![
                CoordinateOperation::Transformation(first),
                CoordinateOperation::Transformation(second),
            ],
        ));
        assert_eq!(unknown.accuracy(), None);
    }

    #[test]
    fn test_parameter_equivalence_across_units() {
        let a = ParameterValue::measure(1.0, UnitOfMeasure::degree());
        let b = ParameterValue::measure(3600.0, UnitOfMeasure::arc_second());
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&ParameterValue::measure(1.0, UnitOfMeasure::metre())));
    }
}
