//! Date alignment across containers.

use ikaros_primitives::{Date, DateIndexed};

use crate::ModelError;

/// Dates present in every container, in increasing order.
///
/// # Errors
/// Returns `ModelError::EmptyIntersection` if there are no containers or no
/// date is shared by all of them.
pub fn common_dates(items: &[&dyn DateIndexed]) -> Result<Vec<Date>, ModelError> {
    let Some((first, rest)) = items.split_first() else {
        return Err(ModelError::EmptyIntersection);
    };
    let mut dates = first.dates().to_vec();
    for item in rest {
        let other = item.dates();
        dates.retain(|d| other.binary_search(d).is_ok());
    }
    if dates.is_empty() {
        return Err(ModelError::EmptyIntersection);
    }
    Ok(dates)
}

/// Restrict every container to the dates they all share.
///
/// # Errors
/// Returns `ModelError::EmptyIntersection` if the intersection is empty.
pub fn align<T: DateIndexed>(items: &[T]) -> Result<Vec<T>, ModelError> {
    let refs: Vec<&dyn DateIndexed> = items.iter().map(|i| i as &dyn DateIndexed).collect();
    let dates = common_dates(&refs)?;
    Ok(items.iter().map(|i| i.restrict_to(&dates)).collect())
}
