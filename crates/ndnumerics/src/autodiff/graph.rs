//! The reverse-mode tape.
//!
//! One append-only list of nodes per thread. A node is either a leaf (an
//! input to differentiate with respect to) or the result of an operation,
//! in which case it owns the [`GradFn`] that pulls its cotangent back to
//! its inputs. Constants are never recorded.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use log::trace;
use std::cell::RefCell;
use std::fmt::Debug;

/// Position of a node on the tape.
///
/// Ids are handed out in creation order, so every node's inputs have
/// smaller ids than the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(index: usize) -> Self {
        Self(index)
    }
}

/// Vector-Jacobian product of one recorded operation.
pub trait GradFn<T: Scalar>: Debug {
    /// Cotangents of the inputs given the cotangent of the output, paired
    /// with the input they belong to.
    fn backward(
        &self,
        grad_output: &DenseTensor<T>,
    ) -> Result<Vec<(NodeId, DenseTensor<T>)>, TensorError>;

    fn inputs(&self) -> Vec<NodeId>;

    /// Short operation name for logs.
    fn name(&self) -> &'static str;
}

/// Append-only tape of leaves and operation nodes.
pub struct ComputationGraph<T: Scalar> {
    // None marks a leaf
    nodes: Vec<Option<Box<dyn GradFn<T>>>>,
}

impl<T: Scalar> ComputationGraph<T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, node: Option<Box<dyn GradFn<T>>>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_leaf(&mut self) -> NodeId {
        let id = self.push(None);
        trace!("graph: leaf {}", id.index());
        id
    }

    pub fn create_node(&mut self, grad_fn: Box<dyn GradFn<T>>) -> NodeId {
        trace!(
            "graph: node {} = {}({:?})",
            self.nodes.len(),
            grad_fn.name(),
            grad_fn.inputs().iter().map(NodeId::index).collect::<Vec<_>>()
        );
        self.push(Some(grad_fn))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// The backward rule of an operation node; `None` for leaves and for
    /// ids no longer on the tape.
    pub fn grad_fn(&self, id: NodeId) -> Option<&dyn GradFn<T>> {
        self.nodes.get(id.index()).and_then(|n| n.as_deref())
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(None))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Drop every node recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Scalar> Default for ComputationGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Debug for ComputationGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationGraph")
            .field("num_nodes", &self.nodes.len())
            .finish()
    }
}

thread_local! {
    static GRAPH_F64: RefCell<ComputationGraph<f64>> = RefCell::new(ComputationGraph::new());
}

/// Run `f` against this thread's `f64` tape.
///
/// Must not be re-entered from inside `f`.
pub fn with_graph_f64<R>(f: impl FnOnce(&mut ComputationGraph<f64>) -> R) -> R {
    GRAPH_F64.with(|g| f(&mut g.borrow_mut()))
}

pub fn clear_graph_f64() {
    with_graph_f64(|g| g.clear());
}
