//! Saved tensor for backward pass.

use crate::scalar::Element;
use crate::tensor::DenseTensor;
use std::ops::Deref;
use std::rc::Rc;

/// Forward-pass value kept alive for a backward function.
///
/// Uses `Rc`: the computation graph is thread-local, so clones share one
/// allocation without atomics.
#[derive(Debug, PartialEq)]
pub struct SavedTensor<T: Element> {
    data: Rc<DenseTensor<T>>,
}

impl<T: Element> SavedTensor<T> {
    pub fn new(tensor: DenseTensor<T>) -> Self {
        Self {
            data: Rc::new(tensor),
        }
    }

    /// Borrow the saved tensor.
    pub fn get(&self) -> &DenseTensor<T> {
        &self.data
    }
}

impl<T: Element> Clone for SavedTensor<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}

impl<T: Element> Deref for SavedTensor<T> {
    type Target = DenseTensor<T>;

    fn deref(&self) -> &DenseTensor<T> {
        &self.data
    }
}
