//! Elementwise maps, selects and the real/complex part extractors.
//!
//! All of these preserve shape; the binary ones require equal shapes and
//! never broadcast.

use crate::error::TensorError;
use crate::scalar::{Element, RealOf, Scalar};
use crate::tensor::DenseTensor;
use std::ops::Mul;

fn check_same_shape<A: Element, B: Element>(
    a: &DenseTensor<A>,
    b: &DenseTensor<B>,
) -> Result<(), TensorError> {
    if a.shape() != b.shape() {
        return Err(TensorError::IncompatibleShapes {
            left: a.shape().to_vec(),
            right: b.shape().to_vec(),
        });
    }
    Ok(())
}

/// Apply a function to each element, possibly changing the element type.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::map;
///
/// let t = Tensor::from_vec(vec![1.0, -2.0, 0.0], &[3]).unwrap();
/// let positive = map(&t, |x| x > 0.0);
/// assert_eq!(positive.data(), &[true, false, false]);
/// ```
pub fn map<A: Element, B: Element, F>(tensor: &DenseTensor<A>, f: F) -> DenseTensor<B>
where
    F: Fn(A) -> B,
{
    let data: Vec<B> = tensor.data().iter().map(|&x| f(x)).collect();
    DenseTensor::from_vec(data, tensor.shape()).expect("map: shape unchanged")
}

/// [`map`] without a change of element type.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::apply;
///
/// let t = Tensor::from_vec(vec![-1.5, 0.0, 2.0], &[3]).unwrap();
/// assert_eq!(apply(&t, |x: f64| x.max(0.0)).data(), &[0.0, 0.0, 2.0]);
/// ```
pub fn apply<ElT: Element, F>(tensor: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT) -> ElT,
{
    map(tensor, f)
}

/// Combine two equally shaped tensors pairwise.
///
/// # Errors
///
/// `IncompatibleShapes` when the shapes differ.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::apply_binary;
///
/// // cotangent of x^2
/// let x = Tensor::from_vec(vec![3.0, -0.5], &[2]).unwrap();
/// let g = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
/// let dx = apply_binary(&g, &x, |g, x| 2.0 * x * g).unwrap();
/// assert_eq!(dx.data(), &[6.0, -2.0]);
/// ```
pub fn apply_binary<ElT: Element, F>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
    f: F,
) -> Result<DenseTensor<ElT>, TensorError>
where
    F: Fn(ElT, ElT) -> ElT,
{
    check_same_shape(a, b)?;
    let data: Vec<ElT> = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Ok(DenseTensor::from_vec(data, a.shape()).expect("apply_binary: shape unchanged"))
}

/// Elementwise select: `on_true` where `condition` holds, `on_false` elsewhere.
///
/// All three tensors must have the same shape.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::where_select;
///
/// let cond = Tensor::from_vec(vec![true, false], &[2]).unwrap();
/// let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
/// let b = Tensor::from_vec(vec![10.0, 20.0], &[2]).unwrap();
/// assert_eq!(where_select(&cond, &a, &b).unwrap().data(), &[1.0, 20.0]);
/// ```
pub fn where_select<ElT: Element>(
    condition: &DenseTensor<bool>,
    on_true: &DenseTensor<ElT>,
    on_false: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    check_same_shape(condition, on_true)?;
    check_same_shape(condition, on_false)?;
    let data: Vec<ElT> = condition
        .data()
        .iter()
        .zip(on_true.data().iter().zip(on_false.data().iter()))
        .map(|(&c, (&t, &f))| if c { t } else { f })
        .collect();
    Ok(DenseTensor::from_vec(data, condition.shape()).expect("where_select: shape unchanged"))
}

/// Select a scalar where `condition` holds and keep `tensor` elsewhere.
pub fn where_scalar<ElT: Element>(
    condition: &DenseTensor<bool>,
    on_true: ElT,
    tensor: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    where_select(condition, &DenseTensor::full(condition.shape(), on_true), tensor)
}

/// Elementwise square `x * x`.
///
/// For complex input this is the complex square, not the squared magnitude;
/// see [`abs_sq`] for the latter.
pub fn square<ElT: Element + Mul<Output = ElT>>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    map(tensor, |x| x * x)
}

/// Elementwise squared magnitude `|x|^2`, returned as a real tensor.
///
/// Dispatches statically on the element type through [`Scalar::abs_sq`]:
/// real elements are squared, complex elements use `re^2 + im^2`.
///
/// # Example
///
/// ```
/// use ndnumerics::{Tensor, c64};
/// use ndnumerics::operations::abs_sq;
///
/// let t = Tensor::from_vec(vec![c64::new(3.0, 1.0)], &[1]).unwrap();
/// assert_eq!(abs_sq(&t).data(), &[10.0]);
/// ```
pub fn abs_sq<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<RealOf<ElT>> {
    map(tensor, Scalar::abs_sq)
}

/// Complex conjugate; a copy for real elements.
pub fn conj<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    map(tensor, Scalar::conjugate)
}

/// Real part, as a real tensor.
///
///
/// ```
/// use ndnumerics::{Tensor, c64};
/// use ndnumerics::operations::real;
///
/// let t = Tensor::from_vec(vec![c64::new(1.0, 2.0), c64::new(3.0, 4.0)], &[2]).unwrap();
/// assert_eq!(real(&t).data(), &[1.0, 3.0]);
/// ```
pub fn real<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<RealOf<ElT>> {
    map(tensor, Scalar::real_part)
}

/// Imaginary part, as a real tensor (zeros for real input).
pub fn imag<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<RealOf<ElT>> {
    map(tensor, Scalar::imag_part)
}

/// `alpha * x` elementwise.
pub fn scale<ElT: Element + Mul<Output = ElT>>(
    tensor: &DenseTensor<ElT>,
    alpha: ElT,
) -> DenseTensor<ElT> {
    map(tensor, |x| x * alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c64;

    #[test]
    fn test_map_changes_type() {
        let t = DenseTensor::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let f = map(&t, |x| x as f64 * 0.5);
        assert_eq!(f.data(), &[0.5, 1.0, 1.5]);
        assert_eq!(f.shape(), &[3]);
    }

    #[test]
    fn test_binary_ops_never_broadcast() {
        let row = DenseTensor::from_vec(vec![1.0, 2.0], &[1, 2]).unwrap();
        let flat = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        assert!(matches!(
            apply_binary(&row, &flat, |x, y| x + y),
            Err(TensorError::IncompatibleShapes { .. })
        ));
    }

    #[test]
    fn test_where_select() {
        let cond = DenseTensor::from_vec(vec![true, false, true], &[3]).unwrap();
        let a = DenseTensor::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let b = DenseTensor::from_vec(vec![-1, -2, -3], &[3]).unwrap();
        assert_eq!(where_select(&cond, &a, &b).unwrap().data(), &[1, -2, 3]);
    }

    #[test]
    fn test_where_select_shape_mismatch() {
        let cond = DenseTensor::from_vec(vec![true, false], &[2]).unwrap();
        let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        assert!(where_select(&cond, &a, &a).is_err());
    }

    #[test]
    fn test_where_scalar() {
        let cond = DenseTensor::from_vec(vec![false, true], &[2]).unwrap();
        let x = DenseTensor::from_vec(vec![5.0, 6.0], &[2]).unwrap();
        assert_eq!(where_scalar(&cond, 0.0, &x).unwrap().data(), &[5.0, 0.0]);
    }

    #[test]
    fn test_square_complex_is_complex_square() {
        let t = DenseTensor::from_vec(vec![c64::new(0.0, 1.0)], &[1]).unwrap();
        assert_eq!(square(&t).data(), &[c64::new(-1.0, 0.0)]);
    }

    #[test]
    fn test_abs_sq_real_matches_square() {
        let t = DenseTensor::from_vec(vec![4.0, 5.2, -3.0], &[3]).unwrap();
        assert_eq!(abs_sq(&t), square(&t));
    }

    #[test]
    fn test_abs_sq_complex() {
        let t =
            DenseTensor::from_vec(vec![c64::new(4.0, 1.0), c64::new(0.0, 1.0)], &[2]).unwrap();
        assert_eq!(abs_sq(&t).data(), &[17.0, 1.0]);
    }

    #[test]
    fn test_abs_sq_is_z_times_conj_z() {
        let z = DenseTensor::from_vec(vec![c64::new(5.2, 1.0), c64::new(-2.0, 0.5)], &[2]).unwrap();
        let product = apply_binary(&z, &conj(&z), |a, b| a * b).unwrap();
        assert_eq!(real(&product), abs_sq(&z));
        assert_eq!(imag(&product).data(), &[0.0, 0.0]);

        let r = DenseTensor::from_vec(vec![-0.5, 2.0], &[2]).unwrap();
        assert_eq!(conj(&r), r);
        assert_eq!(imag(&r).data(), &[0.0, 0.0]);
        assert_eq!(scale(&r, -2.0).data(), &[1.0, -4.0]);
    }
}
