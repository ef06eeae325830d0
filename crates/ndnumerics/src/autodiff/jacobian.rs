//! Full Jacobians from forward mode (one tangent per input element) or
//! reverse mode (one cotangent per output element).
//!
//! Both return a tensor of shape `output_shape ++ input_shape`, so entry
//! `[o..., i...]` is `d out[o...] / d x[i...]`. Storage is column-major like
//! every other tensor, which makes each input element's column contiguous.

use super::backward::backward_with;
use super::dual::DualTensor;
use super::graph::with_graph_f64;
use super::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::tensor::DenseTensor;

fn unit(shape: &[usize], index: usize) -> DenseTensor<f64> {
    let mut t = DenseTensor::zeros(shape);
    t.data_mut()[index] = 1.0;
    t
}

fn jacobian_shape(output_shape: &[usize], input_shape: &[usize]) -> Vec<usize> {
    output_shape.iter().chain(input_shape).copied().collect()
}

/// Jacobian of `f` at `x` by forward mode.
///
/// `f` is evaluated once per element of `x`, each time with a unit tangent.
/// A constant output (no tangent) contributes a zero column.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{dual_safe_norm, jacfwd};
///
/// let zero = Tensor::<f64>::zeros(&[3]);
/// let j = jacfwd(|x| dual_safe_norm(x, 0.0, None, None, false), &zero).unwrap();
/// assert_eq!(j.shape(), &[3]);
/// assert!(j.data().iter().all(|&d| d == 0.0));
/// ```
pub fn jacfwd<F>(f: F, x: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError>
where
    F: Fn(&DualTensor<f64>) -> Result<DualTensor<f64>, TensorError>,
{
    let mut output_shape: Option<Vec<usize>> = None;
    let mut data = Vec::new();
    for i in 0..x.len() {
        let y = f(&DualTensor::seeded(x.clone(), i)?)?;
        match &output_shape {
            Some(shape) if shape.as_slice() != y.shape() => {
                return Err(TensorError::IncompatibleShapes {
                    left: shape.clone(),
                    right: y.shape().to_vec(),
                });
            }
            Some(_) => {}
            None => output_shape = Some(y.shape().to_vec()),
        }
        data.extend_from_slice(y.tangent_or_zeros().data());
    }
    let output_shape = match output_shape {
        Some(shape) => shape,
        None => f(&DualTensor::new(x.clone()))?.shape().to_vec(),
    };
    DenseTensor::from_vec(data, &jacobian_shape(&output_shape, x.shape()))
}

/// Jacobian of `f` at `x` by reverse mode.
///
/// `f` is evaluated once; the backward pass runs once per output element.
/// Nodes recorded by `f` are dropped afterwards.
pub fn jacrev<F>(f: F, x: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError>
where
    F: FnOnce(&TrackedTensor<f64>) -> Result<TrackedTensor<f64>, TensorError>,
{
    let mark = with_graph_f64(|g| g.len());
    let result = (|| -> Result<DenseTensor<f64>, TensorError> {
        let leaf = TrackedTensor::leaf(x.clone());
        let y = f(&leaf)?;
        let shape = jacobian_shape(y.shape(), x.shape());
        let mut jac = DenseTensor::zeros(&shape);
        let (Some(leaf_id), Some(_)) = (leaf.node_id(), y.node_id()) else {
            return Ok(jac);
        };
        let rows = y.len();
        for o in 0..rows {
            let mut grads = backward_with(&y, unit(y.shape(), o))?;
            if let Some(g) = grads.remove(leaf_id) {
                let data = jac.data_mut();
                for (i, &v) in g.data().iter().enumerate() {
                    data[o + rows * i] = v;
                }
            }
        }
        Ok(jac)
    })();
    with_graph_f64(|g| g.truncate(mark));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::{dual_abs_sq, dual_norm, tracked_abs_sq, tracked_norm};
    use crate::operations::{Axis, NormOrd};
    use approx::assert_relative_eq;

    #[test]
    fn test_jacfwd_abs_sq_is_diagonal() {
        let x = DenseTensor::from_vec(vec![1.0, -2.0, 3.0], &[3]).unwrap();
        let j = jacfwd(dual_abs_sq, &x).unwrap();
        assert_eq!(j.shape(), &[3, 3]);
        for o in 0..3 {
            for i in 0..3 {
                let expected = if o == i { 2.0 * x.data()[i] } else { 0.0 };
                assert_eq!(*j.get(&[o, i]).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_jacfwd_matches_jacrev() {
        // columns [3, 4] and [1, -1]
        let x = DenseTensor::from_vec(vec![3.0, 4.0, 1.0, -1.0], &[2, 2]).unwrap();
        for ord in [None, Some(NormOrd::P(1.0)), Some(NormOrd::P(3.0))] {
            let axis = Some(Axis::Single(0));
            let fwd = jacfwd(|t| dual_norm(t, ord, axis, false), &x).unwrap();
            let rev = jacrev(|t| tracked_norm(t, ord, axis, false), &x).unwrap();
            assert_eq!(fwd.shape(), &[2, 2, 2]);
            assert_eq!(fwd.shape(), rev.shape());
            for (a, b) in fwd.data().iter().zip(rev.data()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_jacrev_layout() {
        let x = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let j = jacrev(tracked_abs_sq, &x).unwrap();
        assert_eq!(j.data(), &[2.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_constant_function() {
        let x = DenseTensor::<f64>::ones(&[2]);
        let j = jacfwd(|t| Ok(t.detach()), &x).unwrap();
        assert_eq!(j.data(), &[0.0; 4]);

        let j = jacrev(|t| Ok(t.detach()), &x).unwrap();
        assert_eq!(j.data(), &[0.0; 4]);
    }

    #[test]
    fn test_empty_input() {
        let x = DenseTensor::<f64>::zeros(&[0]);
        let j = jacfwd(dual_abs_sq, &x).unwrap();
        assert_eq!(j.shape(), &[0, 0]);
    }
}
