//! Overflow-safe increment for 32-bit step counters.

use crate::operations::map;
use crate::tensor::DenseTensor;

/// Largest value that can still be incremented without overflow.
const MAX_SAFE: i32 = i32::MAX - 1;

/// Increment a single counter, saturating at `i32::MAX`.
///
/// ```
/// use ndnumerics::numerics::safe_int32_increment_scalar;
///
/// assert_eq!(safe_int32_increment_scalar(3), 4);
/// assert_eq!(safe_int32_increment_scalar(i32::MAX), i32::MAX);
/// ```
#[inline]
pub fn safe_int32_increment_scalar(count: i32) -> i32 {
    count + i32::from(count <= MAX_SAFE)
}

/// Increment every element by one, leaving `i32::MAX` unchanged.
///
/// Elements that would overflow are not incremented.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::numerics::safe_int32_increment;
///
/// let counts = Tensor::from_vec(vec![0, 41, i32::MAX - 1, i32::MAX], &[4]).unwrap();
/// assert_eq!(
///     safe_int32_increment(&counts).data(),
///     &[1, 42, i32::MAX, i32::MAX]
/// );
/// ```
pub fn safe_int32_increment(count: &DenseTensor<i32>) -> DenseTensor<i32> {
    map(count, safe_int32_increment_scalar)
}
