//! Differentiating through [`safe_select`].
//!
//! Only the reduction evaluated at the masked input carries a derivative;
//! floored lanes come from a constant. Both rules zero the floored lanes by
//! selection rather than by multiplication, so a non-finite lane gradient
//! can never leak into them.

use std::fmt::Debug;

use log::trace;

use crate::autodiff::dual::DualTensor;
use crate::autodiff::graph::{GradFn, NodeId};
use crate::autodiff::saved_tensor::SavedTensor;
use crate::autodiff::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::numerics::{safe_select, zero_where};
use crate::operations::LaneReduction;
use crate::tensor::DenseTensor;

/// Backward function for a floored reduction.
#[derive(Debug)]
pub struct SafeSelectBackward<P> {
    plan: P,
    masked_input: SavedTensor<f64>,
    selected: SavedTensor<bool>,
    input_id: NodeId,
    name: &'static str,
}

impl<P: LaneReduction + Debug> GradFn<f64> for SafeSelectBackward<P> {
    fn backward(
        &self,
        grad_output: &DenseTensor<f64>,
    ) -> Result<Vec<(NodeId, DenseTensor<f64>)>, TensorError> {
        let cotangent = zero_where(self.selected.get(), grad_output)?;
        let grad = self.plan.vjp(self.masked_input.get(), &cotangent)?;
        let floored = self.plan.layout().broadcast(self.selected.get())?;
        Ok(vec![(self.input_id, zero_where(&floored, &grad)?)])
    }

    fn inputs(&self) -> Vec<NodeId> {
        vec![self.input_id]
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Tracked [`safe_select`]. The floor is treated as a constant.
pub fn tracked_safe_select<P: LaneReduction + Debug + 'static>(
    plan: P,
    x: &TrackedTensor<f64>,
    floor: f64,
    name: &'static str,
) -> Result<TrackedTensor<f64>, TensorError> {
    let out = safe_select(&plan, x.tensor(), floor)?;
    Ok(TrackedTensor::record(x, out.value, |input_id| {
        Box::new(SafeSelectBackward {
            plan,
            masked_input: SavedTensor::new(out.masked_input),
            selected: SavedTensor::new(out.selected),
            input_id,
            name,
        })
    }))
}

/// Forward-mode [`safe_select`]. The floor is treated as a constant.
pub fn dual_safe_select<P: LaneReduction>(
    plan: &P,
    x: &DualTensor<f64>,
    floor: f64,
) -> Result<DualTensor<f64>, TensorError> {
    let out = safe_select(plan, x.primal(), floor)?;
    let Some(tangent) = x.tangent() else {
        return Ok(DualTensor::new(out.value));
    };
    let floored = plan.layout().broadcast(&out.selected)?;
    let pushed = plan.jvp(&out.masked_input, &zero_where(&floored, tangent)?)?;
    trace!("dual_safe_select: {} lanes with zero tangent", out.num_selected());
    Ok(DualTensor::from_primal_tangent(
        out.value,
        Some(zero_where(&out.selected, &pushed)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;
    use crate::autodiff::{backward_with, clear_graph};
    use crate::operations::{Axis, NormPlan, RootMeanSquare};

    #[test]
    fn test_backward_zeroes_floored_lanes() {
        clear_graph();

        // columns [0, 0] and [3, 4]
        let x = TrackedTensor::leaf(Tensor::from_vec(vec![0.0, 0.0, 3.0, 4.0], &[2, 2]).unwrap());
        let plan = NormPlan::new(x.shape(), None, Some(Axis::Single(0)), false).unwrap();
        let n = tracked_safe_select(plan, &x, 0.0, "safe_norm").unwrap();
        assert_eq!(n.data(), &[0.0, 5.0]);

        let grads = backward_with(&n, Tensor::ones(&[2])).unwrap();
        let g = grads.wrt(&x).unwrap();
        assert_eq!(g.data(), &[0.0, 0.0, 0.6, 0.8]);
    }

    #[test]
    fn test_dual_zeroes_floored_lanes() {
        let x = DualTensor::with_tangent(Tensor::scalar(0.0), Tensor::scalar(1.0)).unwrap();
        let plan = RootMeanSquare::new(x.shape());
        let r = dual_safe_select(&plan, &x, 0.0).unwrap();
        assert_eq!(r.primal().item(), Some(0.0));
        assert_eq!(r.tangent().unwrap().item(), Some(0.0));
    }

    #[test]
    fn test_dual_constant_has_no_tangent() {
        let x = DualTensor::new(Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
        let plan = RootMeanSquare::new(x.shape());
        assert!(!dual_safe_select(&plan, &x, 0.0).unwrap().has_tangent());
    }
}
