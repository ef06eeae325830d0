//! Values recorded on the reverse-mode tape.

use super::graph::{GradFn, NodeId, clear_graph_f64, with_graph_f64};
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// A tensor together with the tape node that produced it.
///
/// Leaves are the inputs to differentiate with respect to; results of
/// `tracked_*` operations carry the node recording how they were computed.
/// Tensors built with [`TrackedTensor::new`] are constants and record
/// nothing, and neither does any operation applied only to constants.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::autodiff::{TrackedTensor, tracked_abs_sq};
///
/// let x = TrackedTensor::leaf(Tensor::ones(&[2, 3]));
/// assert!(x.requires_grad());
///
/// let c = TrackedTensor::new(Tensor::ones(&[2, 3]));
/// assert!(!tracked_abs_sq(&c).unwrap().requires_grad());
/// ```
#[derive(Debug, Clone)]
pub struct TrackedTensor<T: Scalar> {
    tensor: DenseTensor<T>,
    node: Option<NodeId>,
}

impl<T: Scalar> TrackedTensor<T> {
    /// A constant.
    pub fn new(tensor: DenseTensor<T>) -> Self {
        Self { tensor, node: None }
    }

    /// Attach `tensor` to an existing tape node.
    pub fn from_node(tensor: DenseTensor<T>, node: NodeId) -> Self {
        Self {
            tensor,
            node: Some(node),
        }
    }

    pub fn tensor(&self) -> &DenseTensor<T> {
        &self.tensor
    }

    pub fn into_tensor(self) -> DenseTensor<T> {
        self.tensor
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether gradients flow into this tensor.
    pub fn requires_grad(&self) -> bool {
        self.node.is_some()
    }

    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    pub fn data(&self) -> &[T] {
        self.tensor.data()
    }

    /// Same values, cut off from the tape.
    pub fn detach(&self) -> Self {
        Self::new(self.tensor.clone())
    }
}

impl TrackedTensor<f64> {
    /// A new leaf on this thread's tape.
    pub fn leaf(tensor: DenseTensor<f64>) -> Self {
        let node = with_graph_f64(|g| g.create_leaf());
        Self::from_node(tensor, node)
    }

    /// Record `result` as computed from `input` by `grad_fn`.
    ///
    /// Returns an untracked constant when `input` is itself a constant.
    pub(crate) fn record(
        input: &TrackedTensor<f64>,
        result: DenseTensor<f64>,
        grad_fn: impl FnOnce(NodeId) -> Box<dyn GradFn<f64>>,
    ) -> Self {
        match input.node {
            None => Self::new(result),
            Some(id) => {
                let node = with_graph_f64(|g| g.create_node(grad_fn(id)));
                Self::from_node(result, node)
            }
        }
    }
}

/// Drop every node on this thread's tape. Ids held by existing
/// [`TrackedTensor`]s become dangling.
pub fn clear_graph() {
    clear_graph_f64();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;

    #[test]
    fn test_constant_records_nothing() {
        clear_graph();

        let t: DenseTensor<f64> = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let tracked = TrackedTensor::new(t.clone());
        assert!(!tracked.requires_grad());
        assert_eq!(tracked.data(), t.data());
        assert_eq!(with_graph_f64(|g| g.len()), 0);
    }

    #[test]
    fn test_leaves_get_consecutive_ids() {
        clear_graph();

        let a = TrackedTensor::leaf(Tensor::ones(&[2, 3]));
        let b = TrackedTensor::leaf(Tensor::ones(&[3]));
        assert_eq!(a.node_id().unwrap().index(), 0);
        assert_eq!(b.node_id().unwrap().index(), 1);
        assert!(with_graph_f64(|g| g.is_leaf(b.node_id().unwrap())));
    }

    #[test]
    fn test_detach() {
        clear_graph();

        let tracked = TrackedTensor::leaf(Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
        let detached = tracked.detach();
        assert!(!detached.requires_grad());
        assert_eq!(detached.into_tensor(), *tracked.tensor());
    }
}
