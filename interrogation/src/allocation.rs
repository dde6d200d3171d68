//! Randomized allocation without replacement.
//!
//! Values are drawn uniformly from a source slice and rejected when an
//! equal value has already been drawn, so duplicates in the source can
//! only appear once in the output while still weighting the draw. The
//! result is in draw order.
//!
//! Rejection sampling only terminates when enough distinct values exist,
//! so the distinct count is checked up front and an
//! [`AllocationError::Unsatisfiable`] is returned instead of looping.

use rand::Rng;

use crate::error::AllocationError;

/// Counts the distinct values in `source`, by equality.
#[must_use]
pub fn distinct_count<T: PartialEq>(source: &[T]) -> usize {
    source
        .iter()
        .enumerate()
        .filter(|(i, item)| !source[..*i].contains(item))
        .count()
}

/// Draws `k` distinct values from `source` into `destination`.
///
/// `destination` is cleared first, and stays empty on error.
///
/// # Errors
///
/// Returns [`AllocationError::Unsatisfiable`] if `source` holds fewer
/// than `k` distinct values.
pub fn sample_into<T, R>(
    source: &[T],
    destination: &mut Vec<T>,
    k: usize,
    rng: &mut R,
) -> Result<(), AllocationError>
where
    T: PartialEq + Clone,
    R: Rng + ?Sized,
{
    destination.clear();

    let available = distinct_count(source);
    if k > available {
        return Err(AllocationError::Unsatisfiable {
            requested: k,
            available,
        });
    }

    while destination.len() < k {
        let selection = &source[rng.random_range(0..source.len())];
        if destination.contains(selection) {
            continue;
        }
        destination.push(selection.clone());
    }

    Ok(())
}

/// Draws `k` distinct values from `source`.
///
/// # Errors
///
/// Returns [`AllocationError::Unsatisfiable`] if `source` holds fewer
/// than `k` distinct values.
pub fn sample<T, R>(source: &[T], k: usize, rng: &mut R) -> Result<Vec<T>, AllocationError>
where
    T: PartialEq + Clone,
    R: Rng + ?Sized,
{
    let mut drawn = Vec::with_capacity(k);
    sample_into(source, &mut drawn, k, rng)?;
    Ok(drawn)
}
