//! Differentiable masking for reductions with a singular point.
//!
//! A reduction such as a norm is not differentiable where it is zero. To
//! report a floor value there instead, the input lanes that would be floored
//! are replaced by a placeholder *before* the reduction runs:
//!
//! ```text
//! n        = reduce(x)
//! selected = n <= floor
//! masked_x = where(broadcast(selected), 1, x)
//! out      = where(selected, floor, reduce(masked_x))
//! ```
//!
//! The reduction is then only ever evaluated (and differentiated) at
//! `masked_x`, which is regular, and gradients for the selected lanes come
//! from the constant branch.

use log::trace;

use crate::error::TensorError;
use crate::operations::{LaneReduction, map, where_scalar};
use crate::scalar::{Element, RealOf, Scalar};
use crate::tensor::DenseTensor;

/// Result of [`safe_select`].
#[derive(Debug, Clone)]
pub struct SafeSelect<T: Scalar> {
    /// The floored reduction, shaped like the reduction output.
    pub value: DenseTensor<RealOf<T>>,
    /// Which output elements report the floor.
    pub selected: DenseTensor<bool>,
    /// The input with every selected lane replaced by ones.
    pub masked_input: DenseTensor<T>,
}

impl<T: Scalar> SafeSelect<T> {
    /// Number of output elements that were floored.
    pub fn num_selected(&self) -> usize {
        self.selected.data().iter().filter(|&&s| s).count()
    }
}

/// Evaluate `plan` on `x`, reporting `floor` for every lane whose value is
/// `<= floor`.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::numerics::safe_select;
/// use ndnumerics::operations::{Axis, NormPlan};
///
/// // columns [0, 0] and [3, 4]
/// let x = Tensor::from_vec(vec![0.0, 0.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let plan = NormPlan::new(x.shape(), None, Some(Axis::Single(0)), false).unwrap();
/// let out = safe_select(&plan, &x, 1.0).unwrap();
/// assert_eq!(out.value.data(), &[1.0, 5.0]);
/// assert_eq!(out.selected.data(), &[true, false]);
/// assert_eq!(out.masked_input.data(), &[1.0, 1.0, 3.0, 4.0]);
/// ```
pub fn safe_select<T: Scalar, P: LaneReduction>(
    plan: &P,
    x: &DenseTensor<T>,
    floor: RealOf<T>,
) -> Result<SafeSelect<T>, TensorError> {
    let reduced = plan.evaluate(x)?;
    let selected = map(&reduced, |n| n <= floor);
    let masked_input = where_scalar(&plan.layout().broadcast(&selected)?, T::one(), x)?;
    let actual = plan.evaluate(&masked_input)?;
    let value = where_scalar(&selected, floor, &actual)?;

    let out = SafeSelect {
        value,
        selected,
        masked_input,
    };
    trace!(
        "safe_select: {} of {} {} lanes floored at {:?}",
        out.num_selected(),
        out.selected.len(),
        T::DTYPE,
        floor
    );
    Ok(out)
}

/// Zero out `values` wherever `selected` holds.
#[cfg_attr(not(feature = "autodiff"), allow(dead_code))]
pub(crate) fn zero_where<E: Element>(
    selected: &DenseTensor<bool>,
    values: &DenseTensor<E>,
) -> Result<DenseTensor<E>, TensorError> {
    where_scalar(selected, E::zero(), values)
}
