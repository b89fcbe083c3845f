//! # Pipeline String Formatter
//!
//! A stateful writer producing pipeline strings under one
//! [`ProjConvention`]. The object visitor in `export.rs` drives it through
//! `add_step` and `add_param*` calls; the formatter owns the step list and
//! the final rewriting passes.
//!
//! ## Key Components
//!
//! - **`ProjConvention`**: `Proj5` pipelines (CRS exports end with
//!   `+type=crs`) or the `Proj4` style of GDAL's `exportToProj4`.
//! - **`ParamValue`**: a parameter value rendered as text.
//! - **`ProjStringFormatter`**: the writer, with an inversion stack used to
//!   emit the reverse of a sub-pipeline.
//!
//! ## Inversion
//!
//! Steps added between [`ProjStringFormatter::start_inversion`] and
//! [`ProjStringFormatter::stop_inversion`] are reversed and their direction
//! flipped when the inversion is closed. Inversions nest.
//!
//! ## Rewriting
//!
//! When rendered, inverted `unitconvert` and self-inverse `axisswap` steps
//! are rewritten in the forward direction, identity steps are dropped and
//! adjacent mutually inverse steps cancel out. Both passes can be disabled.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::wkt::format_number;

use super::tokens::{tokenize, Param, Step};

/// Pipeline string conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjConvention {
    /// `+proj=pipeline` strings; CRSs carry `+type=crs`
    #[default]
    Proj5,
    /// Single step strings as written by GDAL
    Proj4,
}

impl ProjConvention {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace(['-', '.'], "_").as_str() {
            "PROJ5" | "PROJ_5" | "PROJ" => Some(ProjConvention::Proj5),
            "PROJ4" | "PROJ_4" => Some(ProjConvention::Proj4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjConvention::Proj5 => "PROJ5",
            ProjConvention::Proj4 => "PROJ4",
        }
    }

    pub fn all() -> &'static [ProjConvention] {
        &[ProjConvention::Proj5, ProjConvention::Proj4]
    }
}

impl fmt::Display for ProjConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text of a parameter value. Numbers use the `%.15g` layout and lists are
/// comma separated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue(String);

impl ParamValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue(format_number(value))
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue(value.to_string())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue(value)
    }
}

impl From<&[f64]> for ParamValue {
    fn from(values: &[f64]) -> Self {
        ParamValue(
            values
                .iter()
                .map(|v| format_number(*v))
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Parameters naming grid files.
const GRID_KEYS: &[&str] = &["grids", "geoidgrids", "file", "hgrids"];

/// Stateful pipeline string writer.
#[derive(Debug)]
pub struct ProjStringFormatter {
    convention: ProjConvention,
    db: Option<Arc<DatabaseContext>>,
    steps: Vec<Step>,
    /// Index of the first step of every open inversion
    inversion_stack: Vec<usize>,
    add_no_defs: bool,
    use_etmerc_for_tmerc: Option<bool>,
    optimizations: bool,
    elide_noop_steps: bool,
}

impl ProjStringFormatter {
    pub fn create(convention: ProjConvention) -> Self {
        Self::create_with_database(convention, None)
    }

    /// Formatter with a repository attached, used to name grids by their
    /// local replacement.
    pub fn create_with_database(
        convention: ProjConvention,
        db: Option<Arc<DatabaseContext>>,
    ) -> Self {
        Self {
            convention,
            db,
            steps: Vec::new(),
            inversion_stack: Vec::new(),
            add_no_defs: true,
            use_etmerc_for_tmerc: None,
            optimizations: true,
            elide_noop_steps: true,
        }
    }

    pub fn convention(&self) -> ProjConvention {
        self.convention
    }

    pub fn database(&self) -> Option<&Arc<DatabaseContext>> {
        self.db.as_ref()
    }

    /// Start a new step named `name`. An empty name starts a step that only
    /// carries parameters.
    pub fn add_step(&mut self, name: &str) {
        self.steps.push(Step::new(name));
    }

    pub fn set_current_step_inverted(&mut self, inverted: bool) {
        if let Some(step) = self.steps.last_mut() {
            step.inverted = inverted;
        }
    }

    fn current_step(&mut self) -> &mut Step {
        if self.steps.is_empty() {
            self.steps.push(Step::default());
        }
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Add a `+name` flag to the current step.
    pub fn add_param(&mut self, name: &str) {
        self.current_step().params.push(Param::flag(name));
    }

    /// Add `+name=value` to the current step.
    pub fn add_param_value(&mut self, name: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        self.current_step()
            .params
            .push(Param::with_value(name, value.as_str()));
    }

    /// True when the current step carries `name`.
    pub fn has_param(&self, name: &str) -> bool {
        self.steps.last().is_some_and(|step| step.has(name))
    }

    pub fn start_inversion(&mut self) {
        self.inversion_stack.push(self.steps.len());
    }

    pub fn stop_inversion(&mut self) {
        debug_assert!(!self.inversion_stack.is_empty(), "unbalanced stop_inversion");
        let Some(start) = self.inversion_stack.pop() else {
            return;
        };
        let inverted = &mut self.steps[start..];
        inverted.reverse();
        for step in inverted {
            step.inverted = !step.inverted;
        }
    }

    /// True inside an odd number of open inversions.
    pub fn is_inverted(&self) -> bool {
        self.inversion_stack.len() % 2 == 1
    }

    /// Number of inversions not yet closed.
    pub fn open_contexts(&self) -> usize {
        self.inversion_stack.len()
    }

    /// Whether CRS exports end with `+no_defs`.
    pub fn add_no_defs(&mut self, add: bool) -> &mut Self {
        self.add_no_defs = add;
        self
    }

    pub fn get_add_no_defs(&self) -> bool {
        self.add_no_defs
    }

    /// Grid files referenced by the steps written so far.
    pub fn get_used_grid_names(&self) -> BTreeSet<String> {
        self.steps
            .iter()
            .flat_map(|step| step.params.iter())
            .filter(|param| GRID_KEYS.contains(&param.key.as_str()))
            .filter_map(|param| param.value.as_deref())
            .flat_map(|value| value.split(','))
            .map(|grid| grid.trim_start_matches('@'))
            .filter(|grid| !grid.is_empty() && *grid != "null")
            .map(str::to_string)
            .collect()
    }

    /// Write Transverse Mercator as `etmerc` (PROJ.4 convention) or force
    /// the approximate `tmerc` algorithm (`false`, PROJ 5 convention).
    pub fn set_use_etmerc_for_tmerc(&mut self, use_etmerc: bool) -> &mut Self {
        self.use_etmerc_for_tmerc = Some(use_etmerc);
        self
    }

    pub fn use_etmerc_for_tmerc(&self) -> Option<bool> {
        self.use_etmerc_for_tmerc
    }

    pub fn set_coordinate_operation_optimizations(&mut self, enabled: bool) -> &mut Self {
        self.optimizations = enabled;
        self
    }

    pub fn set_elide_noop_steps(&mut self, enabled: bool) -> &mut Self {
        self.elide_noop_steps = enabled;
        self
    }

    /// Append the steps of an existing pipeline string. Parameters written
    /// before the first `+step` of a pipeline are copied into every step.
    pub fn ingest_proj_string(&mut self, text: &str) -> Result<()> {
        let tokens = tokenize(text)?;
        for mut step in tokens.steps {
            if step.name.is_empty() {
                return Err(Error::format(format!(
                    "Cannot ingest '{}': steps need a +proj= name",
                    text
                )));
            }
            for global in &tokens.global_params {
                if !step.has(&global.key) {
                    step.params.push(global.clone());
                }
            }
            self.steps.push(step);
        }
        Ok(())
    }

    /// Steps as they will be rendered.
    fn rendered_steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self.steps.clone();
        if self.optimizations {
            for step in &mut steps {
                forward_direction(step);
            }
        }
        if self.elide_noop_steps {
            steps.retain(|step| !is_noop(step));
        }
        if self.optimizations {
            let mut kept: Vec<Step> = Vec::with_capacity(steps.len());
            for step in steps {
                if kept.last().is_some_and(|previous| cancels(previous, &step)) {
                    kept.pop();
                } else {
                    kept.push(step);
                }
            }
            steps = kept;
        }
        steps
    }
}

impl fmt::Display for ProjStringFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = self.rendered_steps();
        match steps.as_slice() {
            [] if self.steps.is_empty() => Ok(()),
            [] => f.write_str("+proj=noop"),
            [step] => write!(f, "{}", step),
            steps => {
                f.write_str("+proj=pipeline")?;
                for step in steps {
                    write!(f, " +step {}", step)?;
                }
                Ok(())
            }
        }
    }
}

fn swap_values(step: &mut Step, a: &str, b: &str) {
    let (Some(value_a), Some(value_b)) = (
        step.value(a).map(str::to_string),
        step.value(b).map(str::to_string),
    ) else {
        return;
    };
    for param in &mut step.params {
        if param.key == a {
            param.value = Some(value_b.clone());
        } else if param.key == b {
            param.value = Some(value_a.clone());
        }
    }
}

fn axis_order(step: &Step) -> Option<Vec<i32>> {
    step.value("order")?
        .split(',')
        .map(|v| v.trim().parse().ok())
        .collect()
}

/// True when applying the `axisswap` permutation twice is the identity.
fn is_self_inverse_order(order: &[i32]) -> bool {
    order.iter().enumerate().all(|(i, &target)| {
        let j = target.unsigned_abs() as usize;
        j >= 1
            && j <= order.len()
            && order[j - 1].unsigned_abs() as usize == i + 1
            && order[j - 1].signum() == target.signum()
    })
}

/// Rewrite inverted steps whose forward form is known.
fn forward_direction(step: &mut Step) {
    if !step.inverted {
        return;
    }
    match step.name.as_str() {
        "unitconvert" => {
            swap_values(step, "xy_in", "xy_out");
            swap_values(step, "z_in", "z_out");
            step.inverted = false;
        }
        "axisswap" if axis_order(step).is_some_and(|order| is_self_inverse_order(&order)) => {
            step.inverted = false;
        }
        _ => {}
    }
}

fn is_noop(step: &Step) -> bool {
    match step.name.as_str() {
        "noop" => step.params.is_empty(),
        "unitconvert" => {
            step.value("xy_in") == step.value("xy_out") && step.value("z_in") == step.value("z_out")
        }
        "axisswap" => axis_order(step).is_some_and(|order| {
            order.iter().enumerate().all(|(i, &v)| v == i as i32 + 1)
        }),
        _ => false,
    }
}

/// True when `b` undoes `a`.
fn cancels(a: &Step, b: &Step) -> bool {
    if a.name.is_empty() || a.name != b.name {
        return false;
    }
    if a.inverted != b.inverted && a.params == b.params {
        return true;
    }
    if a.inverted || b.inverted {
        return false;
    }
    match a.name.as_str() {
        "unitconvert" => {
            a.value("xy_in") == b.value("xy_out")
                && a.value("xy_out") == b.value("xy_in")
                && a.value("z_in") == b.value("z_out")
                && a.value("z_out") == b.value("z_in")
        }
        "axisswap" => {
            a.params == b.params && axis_order(a).is_some_and(|order| is_self_inverse_order(&order))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geographic_to_radians(f: &mut ProjStringFormatter) {
        f.add_step("axisswap");
        f.add_param_value("order", "2,1");
        f.add_step("unitconvert");
        f.add_param_value("xy_in", "deg");
        f.add_param_value("xy_out", "rad");
    }

    #[test]
    fn test_single_step() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("longlat");
        f.add_param_value("datum", "WGS84");
        f.add_param("no_defs");
        f.add_param_value("type", "crs");

        assert_eq!(f.to_string(), "+proj=longlat +datum=WGS84 +no_defs +type=crs");
        assert!(f.has_param("datum"));
        assert!(!f.has_param("ellps"));
    }

    #[test]
    fn test_param_values() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("helmert");
        f.add_param_value("x", 598.1);
        f.add_param_value("zone", 31);
        f.add_param_value("towgs84", &[1.0, -2.5, 0.0][..]);
        f.add_param_value("convention", String::from("position_vector"));

        assert_eq!(
            f.to_string(),
            "+proj=helmert +x=598.1 +zone=31 +towgs84=1,-2.5,0 +convention=position_vector"
        );
    }

    #[test]
    fn test_inversion_reverses_and_flips() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.set_coordinate_operation_optimizations(false);
        f.add_step("a");
        f.start_inversion();
        assert!(f.is_inverted());
        f.add_step("b");
        f.add_step("c");
        f.set_current_step_inverted(true);
        f.stop_inversion();
        assert!(!f.is_inverted());
        assert_eq!(f.open_contexts(), 0);

        assert_eq!(
            f.to_string(),
            "+proj=pipeline +step +proj=a +step +proj=c +step +inv +proj=b"
        );
    }

    #[test]
    fn test_nested_inversions_cancel() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.start_inversion();
        f.add_step("a");
        f.start_inversion();
        assert!(!f.is_inverted());
        f.add_step("b");
        f.stop_inversion();
        f.stop_inversion();

        assert_eq!(f.to_string(), "+proj=pipeline +step +proj=b +step +inv +proj=a");
    }

    #[test]
    fn test_inverse_of_geographic_steps_is_rewritten_forward() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("cart");
        f.add_param_value("ellps", "GRS80");
        f.start_inversion();
        geographic_to_radians(&mut f);
        f.stop_inversion();

        assert_eq!(
            f.to_string(),
            "+proj=pipeline +step +proj=cart +ellps=GRS80 \
             +step +proj=unitconvert +xy_in=rad +xy_out=deg \
             +step +proj=axisswap +order=2,1"
        );
    }

    #[test]
    fn test_adjacent_inverse_steps_cancel() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        geographic_to_radians(&mut f);
        f.add_step("cart");
        f.add_param_value("ellps", "GRS80");
        f.start_inversion();
        geographic_to_radians(&mut f);
        f.add_step("cart");
        f.add_param_value("ellps", "GRS80");
        f.stop_inversion();

        assert_eq!(f.to_string(), "+proj=noop");

        f.set_coordinate_operation_optimizations(false);
        assert!(f.to_string().starts_with("+proj=pipeline"));
    }

    #[test]
    fn test_noop_steps_elided() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("unitconvert");
        f.add_param_value("xy_in", "deg");
        f.add_param_value("xy_out", "deg");
        f.add_step("axisswap");
        f.add_param_value("order", "1,2");
        f.add_step("merc");

        assert_eq!(f.to_string(), "+proj=merc");

        f.set_elide_noop_steps(false);
        assert_eq!(
            f.to_string(),
            "+proj=pipeline +step +proj=unitconvert +xy_in=deg +xy_out=deg \
             +step +proj=axisswap +order=1,2 +step +proj=merc"
        );
    }

    #[test]
    fn test_self_inverse_orders() {
        assert!(is_self_inverse_order(&[2, 1]));
        assert!(is_self_inverse_order(&[1, -2]));
        assert!(!is_self_inverse_order(&[2, -1]));
        assert!(is_self_inverse_order(&[3, 2, 1]));
        assert!(!is_self_inverse_order(&[2, 3, 1]));
    }

    #[test]
    fn test_used_grid_names() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("hgridshift");
        f.add_param_value("grids", "@a.tif,b.gsb");
        f.add_step("vgridshift");
        f.add_param_value("grids", "egm96_15.gtx");
        f.add_step("merc");
        f.add_param_value("nadgrids", "@null");

        let grids: Vec<String> = f.get_used_grid_names().into_iter().collect();
        assert_eq!(grids, vec!["a.tif", "b.gsb", "egm96_15.gtx"]);
    }

    #[test]
    fn test_ingest_proj_string() {
        let mut f = ProjStringFormatter::create(ProjConvention::Proj5);
        f.add_step("noop");
        f.add_param_value("title", "first");
        f.ingest_proj_string("+proj=pipeline +ellps=GRS80 +step +proj=cart +step +proj=helmert +x=1")
            .unwrap();

        assert_eq!(
            f.to_string(),
            "+proj=pipeline +step +proj=noop +title=first +step +proj=cart +ellps=GRS80 \
             +step +proj=helmert +x=1 +ellps=GRS80"
        );
        assert!(f.ingest_proj_string("+init=epsg:4326").is_err());
    }

    #[test]
    fn test_empty_formatter() {
        let f = ProjStringFormatter::create(ProjConvention::Proj4);
        assert_eq!(f.to_string(), "");
        assert!(f.get_add_no_defs());
        assert_eq!(f.use_etmerc_for_tmerc(), None);
    }

    #[test]
    fn test_convention_names() {
        assert_eq!(ProjConvention::parse("proj4"), Some(ProjConvention::Proj4));
        assert_eq!(ProjConvention::parse("PROJ.5"), Some(ProjConvention::Proj5));
        assert_eq!(ProjConvention::parse("wkt"), None);
        assert_eq!(ProjConvention::default(), ProjConvention::Proj5);
    }
}
