//! Norms and root-mean-squares with a zero gradient at the zero input.

use crate::error::TensorError;
use crate::numerics::mask::safe_select;
use crate::operations::{Axis, NormOrd, NormPlan, RootMeanSquare};
use crate::scalar::{RealOf, Scalar};
use crate::tensor::DenseTensor;

/// Norm of `x` that reports `min_norm` for every slice whose norm is at most
/// `min_norm`.
///
/// `ord`, `axis` and `keepdims` are interpreted exactly as in
/// [`norm`](crate::operations::norm), and its errors are propagated. The
/// gradient with respect to `x` is zero for floored slices, including the
/// all-zero slice, and the ordinary norm gradient elsewhere.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::numerics::safe_norm;
/// use ndnumerics::operations::Axis;
///
/// let x = Tensor::from_vec(vec![0.0, 0.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let n = safe_norm(&x, 0.5, None, Some(Axis::Single(0)), false).unwrap();
/// assert_eq!(n.data(), &[0.5, 5.0]);
/// ```
pub fn safe_norm<T: Scalar>(
    x: &DenseTensor<T>,
    min_norm: RealOf<T>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<DenseTensor<RealOf<T>>, TensorError> {
    let plan = NormPlan::new(x.shape(), ord, axis, keepdims)?;
    Ok(safe_select(&plan, x, min_norm)?.value)
}

/// Root-mean-square of all elements of `x`, floored at `min_rms`.
///
/// Returns a rank-0 tensor. The gradient at a floored input (in particular
/// at zero) is zero.
///
/// # Errors
///
/// Returns `TensorError::InvalidOperation` for an empty input.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::numerics::safe_root_mean_squares;
///
/// let zero = Tensor::scalar(0.0);
/// assert_eq!(safe_root_mean_squares(&zero, 3.0).unwrap().item(), Some(3.0));
///
/// let x = Tensor::from_vec(vec![2.0, -2.0], &[2]).unwrap();
/// assert_eq!(safe_root_mean_squares(&x, 1.0).unwrap().item(), Some(2.0));
/// ```
pub fn safe_root_mean_squares<T: Scalar>(
    x: &DenseTensor<T>,
    min_rms: RealOf<T>,
) -> Result<DenseTensor<RealOf<T>>, TensorError> {
    let plan = RootMeanSquare::new(x.shape());
    Ok(safe_select(&plan, x, min_rms)?.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c64;
    use crate::operations::norm;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_input_reports_floor() {
        let x = DenseTensor::<f64>::zeros(&[3, 4]);
        for min_norm in [0.0, 3.0] {
            let n = safe_norm(&x, min_norm, None, None, false).unwrap();
            assert_eq!(n.item(), Some(min_norm));
        }
    }

    #[test]
    fn test_zero_floor_matches_norm() {
        let x = DenseTensor::from_vec(vec![1.0, -2.0, 0.5, 4.0, -3.0, 0.0], &[2, 3]).unwrap();
        for (ord, axis) in [
            (None, None),
            (Some(NormOrd::P(1.0)), Some(Axis::Single(1))),
            (Some(NormOrd::Nuc), Some(Axis::Pair(0, 1))),
            (Some(NormOrd::NegInf), Some(Axis::Single(0))),
        ] {
            let safe = safe_norm(&x, 0.0, ord, axis, true).unwrap();
            let plain = norm(&x, ord, axis, true).unwrap();
            assert_eq!(safe.shape(), plain.shape());
            for (a, b) in safe.data().iter().zip(plain.data()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_per_slice_floor() {
        // rows [1, 0, 0] and [0, 0, 5]
        let x = DenseTensor::from_vec(vec![1.0, 0.0, 0.0, 0.0, 0.0, 5.0], &[2, 3]).unwrap();
        let n = safe_norm(&x, 2.0, None, Some(Axis::Single(1)), false).unwrap();
        assert_eq!(n.data(), &[2.0, 5.0]);
    }

    #[test]
    fn test_complex_input() {
        let x = DenseTensor::from_vec(vec![c64::new(3.0, 4.0), c64::new(0.0, 0.0)], &[2]).unwrap();
        let n = safe_norm(&x, 1.0, None, None, false).unwrap();
        assert_relative_eq!(n.item().unwrap(), 5.0);
        let r = safe_root_mean_squares(&x, 0.0).unwrap();
        assert_relative_eq!(r.item().unwrap(), 12.5_f64.sqrt());
    }

    #[test]
    fn test_errors_propagate() {
        let x = DenseTensor::<f64>::ones(&[3, 4]);
        assert!(matches!(
            safe_norm(&x, 0.0, Some(NormOrd::Fro), Some(Axis::Single(0)), false),
            Err(TensorError::InvalidNormOrder { .. })
        ));
        assert!(safe_root_mean_squares(&DenseTensor::<f64>::zeros(&[0]), 0.0).is_err());
    }
}
