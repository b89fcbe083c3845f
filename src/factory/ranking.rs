//! Ordering of candidate coordinate operations.
//!
//! The default order, first difference wins:
//!
//! 1. non deprecated before deprecated
//! 2. known accuracy before unknown
//! 3. smaller accuracy
//! 4. larger area of use
//! 5. fewer steps
//! 6. name
//! 7. authority, then code of the first identifier

use std::cmp::Ordering;
use std::fmt;

use crate::model::CoordinateOperation;

/// Decides which of two operations is more suitable. `Less` means `a`
/// comes first.
pub trait OperationComparator: fmt::Debug + Send + Sync {
    fn compare(&self, a: &CoordinateOperation, b: &CoordinateOperation) -> Ordering;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOperationComparator;

impl OperationComparator for DefaultOperationComparator {
    fn compare(&self, a: &CoordinateOperation, b: &CoordinateOperation) -> Ordering {
        a.is_deprecated()
            .cmp(&b.is_deprecated())
            .then_with(|| compare_accuracy(a.accuracy(), b.accuracy()))
            .then_with(|| b.area_of_use().total_cmp(&a.area_of_use()))
            .then_with(|| a.step_count().cmp(&b.step_count()))
            .then_with(|| a.name().cmp(b.name()))
            .then_with(|| {
                let key = |op: &CoordinateOperation| {
                    op.ids()
                        .first()
                        .map(|id| (id.authority.clone(), id.code.clone()))
                };
                key(a).cmp(&key(b))
            })
    }
}

fn compare_accuracy(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of `operations`, most suitable first.
pub fn sort_operations(operations: &mut [CoordinateOperation], comparator: &dyn OperationComparator) {
    operations.sort_by(|a, b| comparator.compare(a, b));
}
