//! Result of a backward pass.

use super::graph::NodeId;
use super::tensor::TrackedTensor;
use crate::error::TensorError;
use crate::operations::apply_binary;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use std::collections::BTreeMap;

/// Cotangents keyed by tape node, summed over every path that reaches the
/// node. Iteration follows tape order.
#[derive(Debug)]
pub struct Gradients<T: Scalar> {
    grads: BTreeMap<NodeId, DenseTensor<T>>,
}

impl<T: Scalar> Gradients<T> {
    pub fn new() -> Self {
        Self {
            grads: BTreeMap::new(),
        }
    }

    /// Add `grad` to whatever is stored for `id`.
    ///
    /// # Errors
    ///
    /// `IncompatibleShapes` if a cotangent of another shape is already
    /// stored.
    pub fn accumulate(&mut self, id: NodeId, grad: DenseTensor<T>) -> Result<(), TensorError> {
        match self.grads.get_mut(&id) {
            Some(existing) => *existing = apply_binary(existing, &grad, |a, b| a + b)?,
            None => {
                self.grads.insert(id, grad);
            }
        }
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<&DenseTensor<T>> {
        self.grads.get(&id)
    }

    /// Gradient with respect to `x`; `None` for constants and for tensors
    /// the output does not depend on.
    ///
    /// ```
    /// use ndnumerics::Tensor;
    /// use ndnumerics::autodiff::{TrackedTensor, backward, tracked_safe_root_mean_squares};
    ///
    /// let x = TrackedTensor::leaf(Tensor::scalar(-2.0));
    /// let unused = TrackedTensor::leaf(Tensor::scalar(1.0));
    /// let grads = backward(&tracked_safe_root_mean_squares(&x, 0.0).unwrap()).unwrap();
    /// assert_eq!(grads.wrt(&x).unwrap().item(), Some(-1.0));
    /// assert!(grads.wrt(&unused).is_none());
    /// ```
    pub fn wrt(&self, x: &TrackedTensor<T>) -> Option<&DenseTensor<T>> {
        x.node_id().and_then(|id| self.get(id))
    }

    pub fn remove(&mut self, id: NodeId) -> Option<DenseTensor<T>> {
        self.grads.remove(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.grads.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &DenseTensor<T>)> {
        self.grads.iter()
    }
}

impl<T: Scalar> Default for Gradients<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;

    #[test]
    fn test_accumulate_sums_paths() {
        let mut grads: Gradients<f64> = Gradients::default();
        assert!(grads.is_empty());

        let id = NodeId::new_for_test(0);
        grads
            .accumulate(id, Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap())
            .unwrap();
        grads
            .accumulate(id, Tensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap())
            .unwrap();
        assert_eq!(grads.get(id).unwrap().data(), &[5.0, 7.0, 9.0]);
        assert!(matches!(
            grads.accumulate(id, Tensor::ones(&[2])),
            Err(TensorError::IncompatibleShapes { .. })
        ));
    }

    #[test]
    fn test_iterates_in_tape_order() {
        let mut grads: Gradients<f64> = Gradients::new();
        for index in [4, 1, 3] {
            grads
                .accumulate(NodeId::new_for_test(index), Tensor::scalar(index as f64))
                .unwrap();
        }
        let order: Vec<usize> = grads.iter().map(|(id, _)| id.index()).collect();
        assert_eq!(order, vec![1, 3, 4]);

        assert!(grads.remove(NodeId::new_for_test(3)).is_some());
        assert!(!grads.contains(NodeId::new_for_test(3)));
        assert_eq!(grads.len(), 2);
    }

    #[test]
    fn test_wrt_constant_is_none() {
        let grads: Gradients<f64> = Gradients::new();
        assert!(grads.wrt(&TrackedTensor::new(Tensor::scalar(1.0))).is_none());
    }
}
