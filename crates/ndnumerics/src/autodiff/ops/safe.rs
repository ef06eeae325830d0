//! Differentiable safe norms, root-mean-squares and squared magnitudes.

use super::select::{dual_safe_select, tracked_safe_select};
use crate::autodiff::dual::DualTensor;
use crate::autodiff::graph::{GradFn, NodeId};
use crate::autodiff::saved_tensor::SavedTensor;
use crate::autodiff::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::{Axis, NormOrd, NormPlan, RootMeanSquare, abs_sq, apply_binary};
use crate::tensor::DenseTensor;

/// Tracked [`safe_norm`](crate::numerics::safe_norm).
///
/// The gradient is zero for every slice whose norm is at most `min_norm`.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{grad, tracked_safe_norm};
///
/// let g = grad(|x| tracked_safe_norm(x, 0.0, None, None, false), &Tensor::zeros(&[3])).unwrap();
/// assert_eq!(g.data(), &[0.0, 0.0, 0.0]);
/// ```
pub fn tracked_safe_norm(
    x: &TrackedTensor<f64>,
    min_norm: f64,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<TrackedTensor<f64>, TensorError> {
    let plan = NormPlan::new(x.shape(), ord, axis, keepdims)?;
    tracked_safe_select(plan, x, min_norm, "safe_norm")
}

/// Forward-mode [`safe_norm`](crate::numerics::safe_norm).
pub fn dual_safe_norm(
    x: &DualTensor<f64>,
    min_norm: f64,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<DualTensor<f64>, TensorError> {
    let plan = NormPlan::new(x.shape(), ord, axis, keepdims)?;
    dual_safe_select(&plan, x, min_norm)
}

/// Tracked [`safe_root_mean_squares`](crate::numerics::safe_root_mean_squares).
pub fn tracked_safe_root_mean_squares(
    x: &TrackedTensor<f64>,
    min_rms: f64,
) -> Result<TrackedTensor<f64>, TensorError> {
    tracked_safe_select(RootMeanSquare::new(x.shape()), x, min_rms, "safe_root_mean_squares")
}

/// Forward-mode [`safe_root_mean_squares`](crate::numerics::safe_root_mean_squares).
pub fn dual_safe_root_mean_squares(
    x: &DualTensor<f64>,
    min_rms: f64,
) -> Result<DualTensor<f64>, TensorError> {
    dual_safe_select(&RootMeanSquare::new(x.shape()), x, min_rms)
}

/// Backward function for `|x|^2`: `grad = 2 x g`.
#[derive(Debug)]
pub struct AbsSqBackward {
    saved_input: SavedTensor<f64>,
    input_id: NodeId,
}

impl GradFn<f64> for AbsSqBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<f64>,
    ) -> Result<Vec<(NodeId, DenseTensor<f64>)>, TensorError> {
        let grad = apply_binary(self.saved_input.get(), grad_output, |x, g| 2.0 * x * g)?;
        Ok(vec![(self.input_id, grad)])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input_id]
    }

    fn name(&self) -> &'static str {
        "abs_sq"
    }
}

/// Tracked [`abs_sq`].
pub fn tracked_abs_sq(x: &TrackedTensor<f64>) -> Result<TrackedTensor<f64>, TensorError> {
    let result = abs_sq(x.tensor());
    Ok(TrackedTensor::record(x, result, |input_id| {
        Box::new(AbsSqBackward {
            saved_input: SavedTensor::new(x.tensor().clone()),
            input_id,
        })
    }))
}

/// Forward-mode [`abs_sq`]: tangent `2 x t`.
pub fn dual_abs_sq(x: &DualTensor<f64>) -> Result<DualTensor<f64>, TensorError> {
    let primal = abs_sq(x.primal());
    let tangent = x
        .tangent()
        .map(|t| apply_binary(x.primal(), t, |x, t| 2.0 * x * t))
        .transpose()?;
    Ok(DualTensor::from_primal_tangent(primal, tangent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;
    use crate::autodiff::{backward, clear_graph, grad, jacfwd, tracked_sum};
    use approx::assert_relative_eq;

    #[test]
    fn test_safe_norm_gradient_at_zero() {
        for min_norm in [0.0, 3.0] {
            let g = grad(
                |x| tracked_safe_norm(x, min_norm, None, None, false),
                &Tensor::zeros(&[3, 4]),
            )
            .unwrap();
            assert!(g.data().iter().all(|&d| d == 0.0));
        }
    }

    #[test]
    fn test_safe_norm_gradient_away_from_zero() {
        let x = Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap();
        let g = grad(|t| tracked_safe_norm(t, 1.0, None, None, false), &x).unwrap();
        assert_relative_eq!(g.data()[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(g.data()[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_safe_rms_gradient() {
        for min_rms in [0.0, 3.0] {
            let g = grad(
                |x| tracked_safe_root_mean_squares(x, min_rms),
                &Tensor::scalar(0.0),
            )
            .unwrap();
            assert_eq!(g.item(), Some(0.0));
        }
        let x = Tensor::from_vec(vec![2.0, -2.0], &[2]).unwrap();
        let g = grad(|t| tracked_safe_root_mean_squares(t, 1.0), &x).unwrap();
        assert_eq!(g.data(), &[0.5, -0.5]);
    }

    #[test]
    fn test_dual_safe_rms_at_zero() {
        let j = jacfwd(|x| dual_safe_root_mean_squares(x, 0.0), &Tensor::zeros(&[2, 2])).unwrap();
        assert_eq!(j.shape(), &[2, 2]);
        assert!(j.data().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_abs_sq_gradient() {
        clear_graph();

        let x = TrackedTensor::leaf(Tensor::from_vec(vec![1.0, -3.0], &[2]).unwrap());
        let loss = tracked_sum(&tracked_abs_sq(&x).unwrap()).unwrap();
        assert_eq!(loss.data(), &[10.0]);
        let grads = backward(&loss).unwrap();
        assert_eq!(grads.wrt(&x).unwrap().data(), &[2.0, -6.0]);
    }

    #[test]
    fn test_dual_abs_sq() {
        let x = DualTensor::with_tangent(Tensor::scalar(3.0), Tensor::scalar(0.5)).unwrap();
        let y = dual_abs_sq(&x).unwrap();
        assert_eq!(y.primal().item(), Some(9.0));
        assert_eq!(y.tangent().unwrap().item(), Some(3.0));
    }
}
