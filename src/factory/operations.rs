//! Coordinate operation path resolution.
//!
//! Direct operations are read from the transformation and concatenated
//! operation tables in both directions; rows stored from target to source
//! are returned inverted. Paths through intermediate CRSs chain two direct
//! operations into one concatenated operation.

use std::sync::Arc;

use super::ranking::{sort_operations, DefaultOperationComparator, OperationComparator};
use super::{AuthorityFactory, TRANSFORMATION_TABLES};
use crate::database::rows::ObjectKey;
use crate::database::{str_col, Row};
use crate::error::Result;
use crate::model::{ConcatenatedOperation, CoordinateOperation};

/// Options of an operation search.
#[derive(Debug, Clone)]
pub struct OperationSearch {
    /// Name grids by their local replacement when one is registered
    pub use_proj_alternative_grid_names: bool,
    /// Drop operations referencing a grid that is not available locally
    pub discard_if_missing_grid: bool,
    /// With `discard_if_missing_grid`, keep operations whose grids are
    /// registered for download even if not present locally
    pub consider_known_grids_as_available: bool,
    pub comparator: Arc<dyn OperationComparator>,
}

impl Default for OperationSearch {
    fn default() -> Self {
        Self {
            use_proj_alternative_grid_names: true,
            discard_if_missing_grid: false,
            consider_known_grids_as_available: false,
            comparator: Arc::new(DefaultOperationComparator),
        }
    }
}

fn ends_are(row: &Row, from: (&str, &str), to: (&str, &str)) -> bool {
    str_col(row, "source_crs_auth_name") == Some(from.0)
        && str_col(row, "source_crs_code") == Some(from.1)
        && str_col(row, "target_crs_auth_name") == Some(to.0)
        && str_col(row, "target_crs_code") == Some(to.1)
}

fn steps_of(op: &CoordinateOperation) -> Vec<CoordinateOperation> {
    match op {
        CoordinateOperation::Concatenated(concat) => concat.operations.clone(),
        other => vec![other.clone()],
    }
}

impl AuthorityFactory {
    /// Operations between two CRSs of this factory's authority.
    pub fn create_from_coordinate_reference_system_codes(
        &self,
        source_code: &str,
        target_code: &str,
    ) -> Result<Vec<CoordinateOperation>> {
        let authority = self.authority.clone();
        self.create_from_crs_codes(
            &authority,
            source_code,
            &authority,
            target_code,
            &OperationSearch::default(),
        )
    }

    /// Operations registered between `source_auth:source_code` and
    /// `target_auth:target_code`, best first.
    pub fn create_from_crs_codes(
        &self,
        source_auth: &str,
        source_code: &str,
        target_auth: &str,
        target_code: &str,
        options: &OperationSearch,
    ) -> Result<Vec<CoordinateOperation>> {
        let ops = self.direct_operations(
            (source_auth, source_code),
            (target_auth, target_code),
            options,
        )?;
        log::debug!(
            "{} direct operations from {}:{} to {}:{}",
            ops.len(),
            source_auth,
            source_code,
            target_auth,
            target_code
        );
        self.finish(ops, options)
    }

    /// Operations going through one of `intermediates`. Direct operations
    /// are not included; no intermediates means no result.
    pub fn create_from_crs_codes_with_intermediates(
        &self,
        source_auth: &str,
        source_code: &str,
        target_auth: &str,
        target_code: &str,
        intermediates: &[(String, String)],
        options: &OperationSearch,
    ) -> Result<Vec<CoordinateOperation>> {
        let source = (source_auth, source_code);
        let target = (target_auth, target_code);
        let mut ops = Vec::new();
        for (auth, code) in intermediates {
            let middle = (auth.as_str(), code.as_str());
            if middle == source || middle == target {
                continue;
            }
            let first = self.direct_operations(source, middle, options)?;
            if first.is_empty() {
                continue;
            }
            let second = self.direct_operations(middle, target, options)?;
            for a in &first {
                for b in &second {
                    let mut operations = steps_of(a);
                    operations.extend(steps_of(b));
                    ops.push(CoordinateOperation::Concatenated(ConcatenatedOperation {
                        deprecated: a.is_deprecated() || b.is_deprecated(),
                        ..ConcatenatedOperation::new(
                            &format!("{} + {}", a.name(), b.name()),
                            operations,
                        )
                    }));
                }
            }
        }
        log::debug!(
            "{} operations from {}:{} to {}:{} through {} intermediates",
            ops.len(),
            source_auth,
            source_code,
            target_auth,
            target_code,
            intermediates.len()
        );
        self.finish(ops, options)
    }

    fn direct_operations(
        &self,
        source: (&str, &str),
        target: (&str, &str),
        options: &OperationSearch,
    ) -> Result<Vec<CoordinateOperation>> {
        let mut ops = Vec::new();
        if source == target {
            return Ok(ops);
        }
        let owned = |row: &Row| {
            self.authority.is_empty() || str_col(row, "auth_name") == Some(self.authority.as_str())
        };
        for table in TRANSFORMATION_TABLES
            .iter()
            .chain(std::iter::once(&"concatenated_operation"))
        {
            let forward: Vec<ObjectKey> =
                self.db.query(table, |row| owned(row) && ends_are(row, source, target))?;
            for key in forward {
                ops.push(self.operation_in_table(table, &key, options)?);
            }
            let reverse: Vec<ObjectKey> =
                self.db.query(table, |row| owned(row) && ends_are(row, target, source))?;
            for key in reverse {
                ops.push(self.operation_in_table(table, &key, options)?.inverse());
            }
        }
        Ok(ops)
    }

    fn operation_in_table(
        &self,
        table: &str,
        key: &ObjectKey,
        options: &OperationSearch,
    ) -> Result<CoordinateOperation> {
        let factory = self.for_authority(&key.auth_name);
        let use_alternatives = options.use_proj_alternative_grid_names;
        if table == "concatenated_operation" {
            Ok(CoordinateOperation::Concatenated(
                factory.create_concatenated_operation(&key.code, use_alternatives)?,
            ))
        } else {
            Ok(CoordinateOperation::Transformation(
                factory.create_transformation(table, &key.code, use_alternatives)?,
            ))
        }
    }

    fn finish(
        &self,
        ops: Vec<CoordinateOperation>,
        options: &OperationSearch,
    ) -> Result<Vec<CoordinateOperation>> {
        let mut kept = Vec::with_capacity(ops.len());
        for op in ops {
            if !options.discard_if_missing_grid || self.grids_available(&op, options)? {
                kept.push(op);
            }
        }
        sort_operations(&mut kept, options.comparator.as_ref());
        Ok(kept)
    }

    fn grids_available(&self, op: &CoordinateOperation, options: &OperationSearch) -> Result<bool> {
        for grid in op.grid_names() {
            let info = self.db.look_for_grid_info(&grid)?;
            if info.available {
                continue;
            }
            let alternative = self.db.look_for_grid_alternative(&grid)?;
            if alternative.as_ref().is_some_and(|a| a.available) {
                continue;
            }
            let known = alternative.is_some() || !info.url.is_empty() || !info.package_name.is_empty();
            if options.consider_known_grids_as_available && known {
                continue;
            }
            log::debug!("Discarding '{}': grid {} is not available", op.name(), grid);
            return Ok(false);
        }
        Ok(true)
    }
}
