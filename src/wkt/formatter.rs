//! # WKT Formatter
//!
//! A stateful writer producing WKT text under one [`WktConvention`]. The
//! object visitor in `export.rs` drives it through `start_node`/`end_node`
//! pairs and value emitters; the formatter owns every convention-dependent
//! decision so the visitor never re-derives them per node.
//!
//! ## Key Components
//!
//! - **`WktConvention`**: the closed set of output conventions. Each one
//!   selects a bundle of policies, fixed when the formatter is created.
//! - **`OutputAxisRule`**: whether `AXIS` nodes are written.
//! - **`WktFormatter`**: the writer itself, with explicit context stacks for
//!   identifier output, unit output and the current axis units.
//!
//! ## Identifier Rules
//!
//! - ESRI output never carries identifiers.
//! - WKT1 writes an `AUTHORITY` node on every object that has one.
//! - WKT2 writes `ID` on a node only when no enclosing node has one, except
//!   `METHOD` and `PARAMETER` nodes which keep theirs in the non simplified
//!   conventions.
//! - [`WktFormatter::simul_cur_node_has_id`] makes the current node behave
//!   as if it had written an identifier, hiding those of its children.

use std::fmt;
use std::sync::Arc;

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::model::UnitOfMeasure;

/// WKT output conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WktConvention {
    /// ISO 19162:2015
    Wkt2_2015,
    Wkt2_2015Simplified,
    /// ISO 19162:2019
    Wkt2_2018,
    Wkt2_2018Simplified,
    /// The WKT1 variant written by GDAL
    Wkt1Gdal,
    /// The WKT1 variant written by ESRI software
    Wkt1Esri,
}

impl WktConvention {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace('-', "_").as_str() {
            "WKT2" | "WKT2_2015" => Some(WktConvention::Wkt2_2015),
            "WKT2_SIMPLIFIED" | "WKT2_2015_SIMPLIFIED" => Some(WktConvention::Wkt2_2015Simplified),
            "WKT2_2018" | "WKT2_2019" => Some(WktConvention::Wkt2_2018),
            "WKT2_2018_SIMPLIFIED" | "WKT2_2019_SIMPLIFIED" => {
                Some(WktConvention::Wkt2_2018Simplified)
            }
            "WKT1" | "WKT1_GDAL" => Some(WktConvention::Wkt1Gdal),
            "WKT1_ESRI" | "ESRI" => Some(WktConvention::Wkt1Esri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WktConvention::Wkt2_2015 => "WKT2_2015",
            WktConvention::Wkt2_2015Simplified => "WKT2_2015_SIMPLIFIED",
            WktConvention::Wkt2_2018 => "WKT2_2018",
            WktConvention::Wkt2_2018Simplified => "WKT2_2018_SIMPLIFIED",
            WktConvention::Wkt1Gdal => "WKT1_GDAL",
            WktConvention::Wkt1Esri => "WKT1_ESRI",
        }
    }

    pub fn all() -> &'static [WktConvention] {
        &[
            WktConvention::Wkt2_2015,
            WktConvention::Wkt2_2015Simplified,
            WktConvention::Wkt2_2018,
            WktConvention::Wkt2_2018Simplified,
            WktConvention::Wkt1Gdal,
            WktConvention::Wkt1Esri,
        ]
    }
}

impl fmt::Display for WktConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `AXIS` nodes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAxisRule {
    Yes,
    No,
    /// Axes on every CRS except the base geographic CRS of a projected CRS,
    /// like GDAL writes EPSG definitions.
    Wkt1GdalEpsgStyle,
}

/// Major WKT version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WktVersion {
    Wkt1,
    Wkt2,
}

/// Policies derived from the convention.
#[derive(Debug, Clone)]
struct Params {
    convention: WktConvention,
    version: WktVersion,
    use_2018_keywords: bool,
    use_esri_dialect: bool,
    multi_line: bool,
    indentation_width: usize,
    output_axis: OutputAxisRule,
    strict: bool,
    output_axis_order: bool,
    prime_meridian_omitted_if_greenwich: bool,
    ellipsoid_unit_omitted_if_metre: bool,
    force_unit_keyword: bool,
    prime_meridian_or_parameter_unit_omitted_if_same_as_axis: bool,
    prime_meridian_in_degree: bool,
    output_cs_unit_only_once_if_same: bool,
    id_on_top_level_only: bool,
}

impl Params {
    fn for_convention(convention: WktConvention) -> Self {
        let mut params = Params {
            convention,
            version: WktVersion::Wkt2,
            use_2018_keywords: false,
            use_esri_dialect: false,
            multi_line: true,
            indentation_width: 4,
            output_axis: OutputAxisRule::Yes,
            strict: true,
            output_axis_order: true,
            prime_meridian_omitted_if_greenwich: false,
            ellipsoid_unit_omitted_if_metre: false,
            force_unit_keyword: false,
            prime_meridian_or_parameter_unit_omitted_if_same_as_axis: false,
            prime_meridian_in_degree: false,
            output_cs_unit_only_once_if_same: false,
            id_on_top_level_only: false,
        };
        match convention {
            WktConvention::Wkt2_2015 => {}
            WktConvention::Wkt2_2018 => params.use_2018_keywords = true,
            WktConvention::Wkt2_2015Simplified | WktConvention::Wkt2_2018Simplified => {
                params.use_2018_keywords = convention == WktConvention::Wkt2_2018Simplified;
                params.simplify();
            }
            WktConvention::Wkt1Gdal => {
                params.version = WktVersion::Wkt1;
                params.output_axis = OutputAxisRule::Wkt1GdalEpsgStyle;
                params.simplify();
                params.prime_meridian_omitted_if_greenwich = false;
            }
            WktConvention::Wkt1Esri => {
                params.version = WktVersion::Wkt1;
                params.use_esri_dialect = true;
                params.multi_line = false;
                params.output_axis = OutputAxisRule::No;
                params.simplify();
                params.prime_meridian_omitted_if_greenwich = false;
                params.prime_meridian_in_degree = true;
            }
        }
        params
    }

    fn simplify(&mut self) {
        self.id_on_top_level_only = true;
        self.output_axis_order = false;
        self.prime_meridian_omitted_if_greenwich = true;
        self.ellipsoid_unit_omitted_if_metre = true;
        self.force_unit_keyword = true;
        self.prime_meridian_or_parameter_unit_omitted_if_same_as_axis = true;
        self.output_cs_unit_only_once_if_same = true;
    }
}

/// Format a number like C's `%.15g`: 15 significant digits, trailing zeros
/// removed, exponent notation outside `[1e-5, 1e15)`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let scientific = format!("{:.14e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if !(-5..15).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    let decimals = (14 - exponent).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Stateful WKT writer.
#[derive(Debug)]
pub struct WktFormatter {
    params: Params,
    db: Option<Arc<DatabaseContext>>,
    text: String,
    level: usize,
    stack_has_child: Vec<bool>,
    stack_has_id: Vec<bool>,
    output_id_stack: Vec<bool>,
    output_unit_stack: Vec<bool>,
    axis_linear_unit_stack: Vec<UnitOfMeasure>,
    axis_angular_unit_stack: Vec<UnitOfMeasure>,
}

impl WktFormatter {
    /// Create a formatter bound to `convention`.
    pub fn create(convention: WktConvention) -> Self {
        Self::create_with_database(convention, None)
    }

    /// Create a formatter that can look up ESRI aliases in `db`.
    pub fn create_with_database(
        convention: WktConvention,
        db: Option<Arc<DatabaseContext>>,
    ) -> Self {
        let params = Params::for_convention(convention);
        let output_id = !params.use_esri_dialect;
        Self {
            params,
            db,
            text: String::new(),
            level: 0,
            stack_has_child: Vec::new(),
            stack_has_id: vec![false],
            output_id_stack: vec![output_id],
            output_unit_stack: vec![true],
            axis_linear_unit_stack: vec![UnitOfMeasure::metre()],
            axis_angular_unit_stack: vec![UnitOfMeasure::degree()],
        }
    }

    pub fn convention(&self) -> WktConvention {
        self.params.convention
    }

    pub fn database(&self) -> Option<&Arc<DatabaseContext>> {
        self.db.as_ref()
    }

    pub fn set_multi_line(&mut self, multi_line: bool) -> &mut Self {
        self.params.multi_line = multi_line;
        self
    }

    pub fn set_indentation_width(&mut self, width: usize) -> &mut Self {
        self.params.indentation_width = width;
        self
    }

    pub fn set_output_axis(&mut self, rule: OutputAxisRule) -> &mut Self {
        self.params.output_axis = rule;
        self
    }

    /// In strict mode, objects that cannot be faithfully represented under
    /// the convention are a formatting error.
    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.params.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.params.strict
    }

    /// Enable or disable identifier output for the whole document.
    pub fn set_output_id(&mut self, output_id: bool) -> &mut Self {
        if let Some(first) = self.output_id_stack.first_mut() {
            *first = output_id && !self.params.use_esri_dialect;
        }
        self
    }

    pub fn output_axis(&self) -> OutputAxisRule {
        self.params.output_axis
    }

    pub fn output_axis_order(&self) -> bool {
        self.params.output_axis_order
    }

    pub fn prime_meridian_omitted_if_greenwich(&self) -> bool {
        self.params.prime_meridian_omitted_if_greenwich
    }

    pub fn ellipsoid_unit_omitted_if_metre(&self) -> bool {
        self.params.ellipsoid_unit_omitted_if_metre
    }

    pub fn force_unit_keyword(&self) -> bool {
        self.params.force_unit_keyword
    }

    pub fn prime_meridian_or_parameter_unit_omitted_if_same_as_axis(&self) -> bool {
        self.params.prime_meridian_or_parameter_unit_omitted_if_same_as_axis
    }

    pub fn prime_meridian_in_degree(&self) -> bool {
        self.params.prime_meridian_in_degree
    }

    pub fn output_cs_unit_only_once_if_same(&self) -> bool {
        self.params.output_cs_unit_only_once_if_same
    }

    pub fn version(&self) -> WktVersion {
        self.params.version
    }

    pub fn use_2018_keywords(&self) -> bool {
        self.params.use_2018_keywords
    }

    pub fn use_esri_dialect(&self) -> bool {
        self.params.use_esri_dialect
    }

    pub fn is_wkt2(&self) -> bool {
        self.params.version == WktVersion::Wkt2
    }

    /// Open `keyword[`. `has_id` tells whether the object being written
    /// carries an identifier.
    pub fn start_node(&mut self, keyword: &str, has_id: bool) {
        self.start_new_child();
        if self.params.multi_line && self.level > 0 {
            self.text.push('\n');
            let indent = self.level * self.params.indentation_width;
            self.text.extend(std::iter::repeat(' ').take(indent));
        }
        self.text.push_str(keyword);
        self.text.push('[');
        self.level += 1;
        self.stack_has_child.push(false);

        let ancestor_has_id = self.stack_has_id.last().copied().unwrap_or(false);
        let document_output_id = self.output_id_stack.first().copied().unwrap_or(false);
        let output_id = if self.params.use_esri_dialect {
            false
        } else if self.params.version == WktVersion::Wkt1 || self.level < 2 {
            self.output_id()
        } else if !self.params.id_on_top_level_only
            && (keyword == "METHOD" || keyword == "PARAMETER")
        {
            document_output_id
        } else {
            document_output_id && !ancestor_has_id
        };
        self.output_id_stack.push(output_id);
        self.stack_has_id.push(has_id || ancestor_has_id);
    }

    /// Close the node opened by the matching [`start_node`](Self::start_node).
    pub fn end_node(&mut self) {
        debug_assert!(self.level > 0, "end_node without start_node");
        self.text.push(']');
        self.level = self.level.saturating_sub(1);
        self.stack_has_child.pop();
        self.output_id_stack.pop();
        self.stack_has_id.pop();
    }

    /// Make the current node behave as if it had written an identifier.
    pub fn simul_cur_node_has_id(&mut self) {
        if let Some(top) = self.stack_has_id.last_mut() {
            *top = true;
        }
    }

    /// Whether the node being written should emit its identifiers.
    pub fn output_id(&self) -> bool {
        !self.params.use_esri_dialect && self.output_id_stack.last().copied().unwrap_or(false)
    }

    pub fn push_output_id(&mut self, output_id: bool) {
        self.output_id_stack.push(output_id);
    }

    pub fn pop_output_id(&mut self) {
        debug_assert!(self.output_id_stack.len() > 1, "unbalanced pop_output_id");
        if self.output_id_stack.len() > 1 {
            self.output_id_stack.pop();
        }
    }

    pub fn output_unit(&self) -> bool {
        self.output_unit_stack.last().copied().unwrap_or(true)
    }

    pub fn push_output_unit(&mut self, output_unit: bool) {
        self.output_unit_stack.push(output_unit);
    }

    pub fn pop_output_unit(&mut self) {
        debug_assert!(self.output_unit_stack.len() > 1, "unbalanced pop_output_unit");
        if self.output_unit_stack.len() > 1 {
            self.output_unit_stack.pop();
        }
    }

    pub fn axis_linear_unit(&self) -> &UnitOfMeasure {
        // The stack is seeded with metre and never popped below it.
        &self.axis_linear_unit_stack[self.axis_linear_unit_stack.len() - 1]
    }

    pub fn push_axis_linear_unit(&mut self, unit: UnitOfMeasure) {
        self.axis_linear_unit_stack.push(unit);
    }

    pub fn pop_axis_linear_unit(&mut self) {
        debug_assert!(self.axis_linear_unit_stack.len() > 1, "unbalanced pop_axis_linear_unit");
        if self.axis_linear_unit_stack.len() > 1 {
            self.axis_linear_unit_stack.pop();
        }
    }

    pub fn axis_angular_unit(&self) -> &UnitOfMeasure {
        &self.axis_angular_unit_stack[self.axis_angular_unit_stack.len() - 1]
    }

    pub fn push_axis_angular_unit(&mut self, unit: UnitOfMeasure) {
        self.axis_angular_unit_stack.push(unit);
    }

    pub fn pop_axis_angular_unit(&mut self) {
        debug_assert!(self.axis_angular_unit_stack.len() > 1, "unbalanced pop_axis_angular_unit");
        if self.axis_angular_unit_stack.len() > 1 {
            self.axis_angular_unit_stack.pop();
        }
    }

    /// Number of context entries pushed and not yet popped, all stacks
    /// combined. Zero once a document is complete.
    pub fn open_contexts(&self) -> usize {
        self.level
            + (self.output_id_stack.len() - 1)
            + (self.output_unit_stack.len() - 1)
            + (self.axis_linear_unit_stack.len() - 1)
            + (self.axis_angular_unit_stack.len() - 1)
    }

    fn start_new_child(&mut self) {
        if let Some(has_child) = self.stack_has_child.last_mut() {
            if *has_child {
                self.text.push(',');
            } else {
                *has_child = true;
            }
        }
    }

    /// Append a quoted string, doubling embedded quotes.
    pub fn add_quoted_string(&mut self, value: &str) {
        self.start_new_child();
        self.text.push('"');
        self.text.push_str(&value.replace('"', "\"\""));
        self.text.push('"');
    }

    /// Append a bare token, such as an axis direction or a CS type.
    pub fn add(&mut self, token: &str) {
        self.start_new_child();
        self.text.push_str(token);
    }

    pub fn add_number(&mut self, value: f64) {
        let mut text = format_number(value);
        if self.params.use_esri_dialect && !text.contains(['.', 'e', 'n', 'i']) {
            text.push_str(".0");
        }
        self.add(&text);
    }

    pub fn add_integer(&mut self, value: i64) {
        self.add(&value.to_string());
    }

    /// Look up the ESRI spelling of `official` in the attached repository.
    pub(crate) fn esri_alias(&self, official: &str, table: &str) -> Option<String> {
        let db = self.db.as_ref()?;
        match db.get_alias_from_official_name(official, table, "ESRI") {
            Ok(alias) => alias,
            Err(e) => {
                log::debug!("ESRI alias lookup for '{}' failed: {}", official, e);
                None
            }
        }
    }

    /// Fail in strict mode, otherwise log and continue.
    pub(crate) fn lenient(&self, message: String) -> Result<()> {
        if self.params.strict {
            Err(Error::format(message))
        } else {
            log::warn!("{}", message);
            Ok(())
        }
    }

    /// Text written so far. Only a complete document once the top-level
    /// object has been exported.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for WktFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_like_printf_g15() {
        assert_eq!(format_number(6378137.0), "6378137");
        assert_eq!(format_number(298.257223563), "298.257223563");
        assert_eq!(format_number(std::f64::consts::PI / 180.0), "0.0174532925199433");
        assert_eq!(format_number(0.9996), "0.9996");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e-6), "1e-06");
        assert_eq!(format_number(1.5e20), "1.5e+20");
        assert_eq!(format_number(-87.5), "-87.5");
        assert_eq!(format_number(0.3048006096012192), "0.304800609601219");
    }

    #[test]
    fn test_convention_parse() {
        assert_eq!(WktConvention::parse("wkt2_2018"), Some(WktConvention::Wkt2_2018));
        assert_eq!(WktConvention::parse("WKT2-2019-SIMPLIFIED"), Some(WktConvention::Wkt2_2018Simplified));
        assert_eq!(WktConvention::parse("WKT1_ESRI"), Some(WktConvention::Wkt1Esri));
        assert_eq!(WktConvention::parse("WKT3"), None);
        for convention in WktConvention::all() {
            assert_eq!(WktConvention::parse(convention.as_str()), Some(*convention));
        }
    }

    #[test]
    fn test_convention_policies() {
        let full = WktFormatter::create(WktConvention::Wkt2_2018);
        assert!(full.use_2018_keywords());
        assert!(full.output_axis_order());
        assert!(!full.force_unit_keyword());
        assert_eq!(full.output_axis(), OutputAxisRule::Yes);

        let simplified = WktFormatter::create(WktConvention::Wkt2_2015Simplified);
        assert!(!simplified.use_2018_keywords());
        assert!(simplified.prime_meridian_omitted_if_greenwich());
        assert!(simplified.output_cs_unit_only_once_if_same());

        let gdal = WktFormatter::create(WktConvention::Wkt1Gdal);
        assert_eq!(gdal.version(), WktVersion::Wkt1);
        assert_eq!(gdal.output_axis(), OutputAxisRule::Wkt1GdalEpsgStyle);
        assert!(!gdal.prime_meridian_omitted_if_greenwich());

        let esri = WktFormatter::create(WktConvention::Wkt1Esri);
        assert!(esri.use_esri_dialect());
        assert_eq!(esri.output_axis(), OutputAxisRule::No);
        assert!(esri.prime_meridian_in_degree());
        assert!(!esri.output_id());
    }

    #[test]
    fn test_nodes_and_separators() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018);
        f.set_multi_line(false);
        f.start_node("UNIT", false);
        f.add_quoted_string("metre");
        f.add_number(1.0);
        f.end_node();
        assert_eq!(f.to_string(), r#"UNIT["metre",1]"#);
        assert_eq!(f.open_contexts(), 0);
    }

    #[test]
    fn test_multi_line_indentation() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018);
        f.set_indentation_width(2);
        f.start_node("A", false);
        f.add_quoted_string("x");
        f.start_node("B", false);
        f.add_number(1.0);
        f.end_node();
        f.end_node();
        assert_eq!(f.as_str(), "A[\"x\",\n  B[1]]");
    }

    #[test]
    fn test_id_suppressed_under_node_with_id() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018);
        f.start_node("PROJCRS", true);
        assert!(f.output_id());
        f.start_node("BASEGEOGCRS", true);
        assert!(!f.output_id());
        f.end_node();
        f.start_node("CONVERSION", false);
        f.start_node("METHOD", true);
        assert!(f.output_id(), "METHOD keeps its ID in full WKT2");
        f.end_node();
        f.end_node();
        f.end_node();
        assert_eq!(f.open_contexts(), 0);
    }

    #[test]
    fn test_id_rules_simplified_and_wkt1() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018Simplified);
        f.start_node("PROJCRS", true);
        f.start_node("CONVERSION", false);
        f.start_node("METHOD", true);
        assert!(!f.output_id());
        f.end_node();
        f.end_node();
        f.end_node();

        let mut gdal = WktFormatter::create(WktConvention::Wkt1Gdal);
        gdal.start_node("PROJCS", true);
        gdal.start_node("GEOGCS", true);
        assert!(gdal.output_id(), "WKT1 writes AUTHORITY on nested nodes");
        gdal.end_node();
        gdal.end_node();
    }

    #[test]
    fn test_simul_cur_node_has_id() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018);
        f.start_node("GEOGCRS", false);
        f.simul_cur_node_has_id();
        f.start_node("DATUM", true);
        assert!(!f.output_id());
        f.end_node();
        f.end_node();
    }

    #[test]
    fn test_push_pop_balance() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2015);
        f.push_output_unit(false);
        f.push_axis_angular_unit(UnitOfMeasure::radian());
        assert!(!f.output_unit());
        assert_eq!(f.axis_angular_unit(), &UnitOfMeasure::radian());
        assert_eq!(f.open_contexts(), 2);
        f.pop_axis_angular_unit();
        f.pop_output_unit();
        assert_eq!(f.open_contexts(), 0);
        assert_eq!(f.axis_angular_unit(), &UnitOfMeasure::degree());
    }

    #[test]
    fn test_esri_numbers_have_decimal_point() {
        let mut f = WktFormatter::create(WktConvention::Wkt1Esri);
        f.start_node("PRIMEM", false);
        f.add_quoted_string("Greenwich");
        f.add_number(0.0);
        f.end_node();
        assert_eq!(f.as_str(), r#"PRIMEM["Greenwich",0.0]"#);
    }

    #[test]
    fn test_set_output_id_disables_ids() {
        let mut f = WktFormatter::create(WktConvention::Wkt2_2018);
        f.set_output_id(false);
        f.start_node("GEOGCRS", true);
        assert!(!f.output_id());
        f.end_node();
    }
}
