//! Backward pass execution for reverse-mode automatic differentiation.

use super::gradients::Gradients;
use super::graph::{ComputationGraph, NodeId, with_graph_f64};
use super::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use log::debug;
use std::collections::BTreeSet;

/// Execute the backward pass from a scalar loss.
///
/// The loss must hold exactly one element (of any rank); its cotangent is
/// seeded with one.
///
/// # Errors
/// Returns error if:
/// - Loss is not a single element
/// - Loss is not in the computation graph
/// - A backward function fails
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{
///     TrackedTensor, backward, clear_graph, tracked_safe_root_mean_squares,
/// };
///
/// clear_graph();
/// let x = TrackedTensor::leaf(Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap());
/// let rms = tracked_safe_root_mean_squares(&x, 0.0).unwrap();
/// let grads = backward(&rms).unwrap();
/// assert!(grads.wrt(&x).is_some());
/// ```
pub fn backward(loss: &TrackedTensor<f64>) -> Result<Gradients<f64>, TensorError> {
    if loss.len() != 1 {
        return Err(TensorError::InvalidOperation(format!(
            "backward() requires scalar loss, got {} elements",
            loss.len()
        )));
    }
    backward_with(loss, DenseTensor::ones(loss.shape()))
}

/// Execute the backward pass seeded with an explicit cotangent.
///
/// `seed` must have the shape of `output`. The result is the vector-Jacobian
/// product `seed^T J` for every node reachable from `output`.
pub fn backward_with(
    output: &TrackedTensor<f64>,
    seed: DenseTensor<f64>,
) -> Result<Gradients<f64>, TensorError> {
    if seed.shape() != output.shape() {
        return Err(TensorError::IncompatibleShapes {
            left: output.shape().to_vec(),
            right: seed.shape().to_vec(),
        });
    }
    let output_id = output.node_id().ok_or_else(|| {
        TensorError::InvalidOperation(
            "backward() called on tensor not in computation graph".to_string(),
        )
    })?;

    let mut gradients = Gradients::new();
    gradients.accumulate(output_id, seed)?;

    with_graph_f64(|graph| -> Result<Gradients<f64>, TensorError> {
        if !graph.contains(output_id) {
            return Err(TensorError::InvalidOperation(format!(
                "node {} was dropped from the computation graph",
                output_id.index()
            )));
        }
        let order = reverse_topological_order(graph, output_id);
        debug!("backward: {} reachable nodes from {}", order.len(), output_id.index());
        for node_id in order {
            let Some(grad_fn) = graph.grad_fn(node_id) else {
                // leaf: keep the accumulated gradient for the caller
                continue;
            };
            let Some(grad_output) = gradients.remove(node_id) else {
                continue;
            };
            for (input_id, input_grad) in grad_fn.backward(&grad_output)? {
                gradients.accumulate(input_id, input_grad)?;
            }
        }
        Ok(gradients)
    })
}

/// Nodes reachable from `start`, consumers before their inputs.
///
/// Inputs always have smaller ids than the nodes computed from them, so
/// descending id order is a topological order of the reversed graph.
fn reverse_topological_order<T: Scalar>(graph: &ComputationGraph<T>, start: NodeId) -> Vec<NodeId> {
    let mut reachable = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(node_id) = stack.pop() {
        if !reachable.insert(node_id) {
            continue;
        }
        if let Some(grad_fn) = graph.grad_fn(node_id) {
            stack.extend(grad_fn.inputs());
        }
    }
    reachable.into_iter().rev().collect()
}

/// Gradient of a scalar-valued function at `x`.
///
/// `f` receives `x` as a fresh leaf. Nodes recorded while evaluating `f`
/// are dropped from the thread-local graph afterwards. When no gradient
/// reaches the leaf (the output does not depend on it) the gradient is zero.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{grad, tracked_safe_root_mean_squares};
///
/// let g = grad(|x| tracked_safe_root_mean_squares(x, 3.0), &Tensor::scalar(0.0)).unwrap();
/// assert_eq!(g.item(), Some(0.0));
/// ```
pub fn grad<F>(f: F, x: &DenseTensor<f64>) -> Result<DenseTensor<f64>, TensorError>
where
    F: FnOnce(&TrackedTensor<f64>) -> Result<TrackedTensor<f64>, TensorError>,
{
    let mark = with_graph_f64(|g| g.len());
    let result = (|| -> Result<DenseTensor<f64>, TensorError> {
        let leaf = TrackedTensor::leaf(x.clone());
        let output = f(&leaf)?;
        if output.node_id().is_none() {
            return Ok(DenseTensor::zeros(x.shape()));
        }
        let mut grads = backward(&output)?;
        let leaf_id = leaf
            .node_id()
            .ok_or_else(|| TensorError::InvalidOperation("leaf is not tracked".into()))?;
        Ok(grads
            .remove(leaf_id)
            .unwrap_or_else(|| DenseTensor::zeros(x.shape())))
    })();
    with_graph_f64(|g| g.truncate(mark));
    result
}
