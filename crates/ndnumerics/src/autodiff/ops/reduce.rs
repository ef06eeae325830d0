//! Tracked and dual reductions: norms, root-mean-square and sum.
//!
//! These differentiate the plain reduction, singular points included: the
//! gradient of the Euclidean norm at zero is NaN here. The floored versions
//! in [`super::safe`] avoid that.

use std::fmt::Debug;

use crate::autodiff::dual::DualTensor;
use crate::autodiff::graph::{GradFn, NodeId};
use crate::autodiff::saved_tensor::SavedTensor;
use crate::autodiff::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::{Axis, LaneReduction, NormOrd, NormPlan, RootMeanSquare, sum};
use crate::tensor::DenseTensor;

/// Backward function for any [`LaneReduction`].
#[derive(Debug)]
pub struct ReductionBackward<P> {
    plan: P,
    saved_input: SavedTensor<f64>,
    input_id: NodeId,
    name: &'static str,
}

impl<P: LaneReduction + Debug> GradFn<f64> for ReductionBackward<P> {
    fn backward(
        &self,
        grad_output: &DenseTensor<f64>,
    ) -> Result<Vec<(NodeId, DenseTensor<f64>)>, TensorError> {
        let grad = self.plan.vjp(self.saved_input.get(), grad_output)?;
        Ok(vec![(self.input_id, grad)])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input_id]
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn tracked_reduction<P: LaneReduction + Debug + 'static>(
    plan: P,
    x: &TrackedTensor<f64>,
    name: &'static str,
) -> Result<TrackedTensor<f64>, TensorError> {
    let result = plan.evaluate(x.tensor())?;
    Ok(TrackedTensor::record(x, result, |input_id| {
        Box::new(ReductionBackward {
            plan,
            saved_input: SavedTensor::new(x.tensor().clone()),
            input_id,
            name,
        })
    }))
}

fn dual_reduction<P: LaneReduction>(
    plan: &P,
    x: &DualTensor<f64>,
) -> Result<DualTensor<f64>, TensorError> {
    let primal = plan.evaluate(x.primal())?;
    let tangent = x
        .tangent()
        .map(|t| plan.jvp(x.primal(), t))
        .transpose()?;
    Ok(DualTensor::from_primal_tangent(primal, tangent))
}

/// Tracked [`norm`](crate::operations::norm).
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{backward, clear_graph, tracked_norm, TrackedTensor};
///
/// clear_graph();
/// let x = TrackedTensor::leaf(Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap());
/// let n = tracked_norm(&x, None, None, false).unwrap();
/// let grads = backward(&n).unwrap();
/// assert_eq!(grads.wrt(&x).unwrap().data(), &[0.6, 0.8]);
/// ```
pub fn tracked_norm(
    x: &TrackedTensor<f64>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<TrackedTensor<f64>, TensorError> {
    let plan = NormPlan::new(x.shape(), ord, axis, keepdims)?;
    tracked_reduction(plan, x, "norm")
}

/// Forward-mode [`norm`](crate::operations::norm).
pub fn dual_norm(
    x: &DualTensor<f64>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<DualTensor<f64>, TensorError> {
    let plan = NormPlan::new(x.shape(), ord, axis, keepdims)?;
    dual_reduction(&plan, x)
}

/// Tracked [`root_mean_squares`](crate::operations::root_mean_squares).
pub fn tracked_root_mean_squares(
    x: &TrackedTensor<f64>,
) -> Result<TrackedTensor<f64>, TensorError> {
    tracked_reduction(RootMeanSquare::new(x.shape()), x, "root_mean_squares")
}

/// Forward-mode [`root_mean_squares`](crate::operations::root_mean_squares).
pub fn dual_root_mean_squares(x: &DualTensor<f64>) -> Result<DualTensor<f64>, TensorError> {
    dual_reduction(&RootMeanSquare::new(x.shape()), x)
}

/// Backward function for summing every element.
#[derive(Debug)]
pub struct SumBackward {
    input_shape: Vec<usize>,
    input_id: NodeId,
}

impl GradFn<f64> for SumBackward {
    fn backward(
        &self,
        grad_output: &DenseTensor<f64>,
    ) -> Result<Vec<(NodeId, DenseTensor<f64>)>, TensorError> {
        let g = grad_output.item().ok_or_else(|| TensorError::ShapeMismatch {
            expected: 1,
            actual: grad_output.len(),
        })?;
        Ok(vec![(self.input_id, DenseTensor::full(&self.input_shape, g))])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input_id]
    }

    fn name(&self) -> &'static str {
        "sum"
    }
}

/// Tracked sum of every element, as a rank-0 tensor.
///
/// Turns a tensor-valued result into a scalar loss for [`backward`](crate::autodiff::backward).
pub fn tracked_sum(x: &TrackedTensor<f64>) -> Result<TrackedTensor<f64>, TensorError> {
    let result = sum(x.tensor(), &[], false)?;
    Ok(TrackedTensor::record(x, result, |input_id| {
        Box::new(SumBackward {
            input_shape: x.shape().to_vec(),
            input_id,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;
    use crate::autodiff::{backward, backward_with, clear_graph};
    use approx::assert_relative_eq;

    #[test]
    fn test_tracked_norm_axis_gradient() {
        clear_graph();

        // columns [3, 4] and [0, 2]
        let x = TrackedTensor::leaf(Tensor::from_vec(vec![3.0, 4.0, 0.0, 2.0], &[2, 2]).unwrap());
        let n = tracked_norm(&x, None, Some(Axis::Single(0)), false).unwrap();
        assert_eq!(n.data(), &[5.0, 2.0]);

        let grads = backward_with(&n, Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap()).unwrap();
        let g = grads.wrt(&x).unwrap();
        let expected = [0.6, 0.8, 0.0, 2.0];
        for (a, b) in g.data().iter().zip(expected) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tracked_norm_at_zero_is_nan() {
        clear_graph();

        let x = TrackedTensor::leaf(Tensor::<f64>::zeros(&[2]));
        let n = tracked_norm(&x, None, None, false).unwrap();
        let grads = backward(&n).unwrap();
        assert!(grads.wrt(&x).unwrap().data().iter().all(|d| d.is_nan()));
    }

    #[test]
    fn test_constant_input_is_not_recorded() {
        clear_graph();

        let x = TrackedTensor::new(Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap());
        let n = tracked_norm(&x, None, None, false).unwrap();
        assert!(!n.requires_grad());
        assert_eq!(n.data(), &[5.0]);
    }

    #[test]
    fn test_tracked_root_mean_squares() {
        clear_graph();

        let x = TrackedTensor::leaf(Tensor::from_vec(vec![2.0, -2.0], &[2]).unwrap());
        let r = tracked_root_mean_squares(&x).unwrap();
        assert_eq!(r.data(), &[2.0]);
        let grads = backward(&r).unwrap();
        assert_eq!(grads.wrt(&x).unwrap().data(), &[0.5, -0.5]);
    }

    #[test]
    fn test_tracked_sum() {
        clear_graph();

        let x = TrackedTensor::leaf(Tensor::from_vec(vec![3.0, 4.0, 6.0, 8.0], &[2, 2]).unwrap());
        let n = tracked_norm(&x, None, Some(Axis::Single(0)), false).unwrap();
        let loss = tracked_sum(&n).unwrap();
        assert_eq!(loss.data(), &[15.0]);

        let grads = backward(&loss).unwrap();
        let g = grads.wrt(&x).unwrap();
        for (a, b) in g.data().iter().zip([0.6, 0.8, 0.6, 0.8]) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dual_norm() {
        let x = DualTensor::with_tangent(
            Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap(),
            Tensor::from_vec(vec![1.0, 0.0], &[2]).unwrap(),
        )
        .unwrap();
        let n = dual_norm(&x, None, None, false).unwrap();
        assert_eq!(n.primal().data(), &[5.0]);
        assert_relative_eq!(n.tangent().unwrap().data()[0], 0.6, epsilon = 1e-12);

        let c = dual_root_mean_squares(&x.detach()).unwrap();
        assert!(!c.has_tangent());
    }
}
