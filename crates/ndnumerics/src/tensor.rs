//! Column-major dense tensors.
//!
//! Every primitive in this crate consumes and produces a [`Tensor`]: a flat
//! `Vec` of elements plus a shape. The empty shape `[]` is a rank-0 scalar
//! holding exactly one element; a shape containing a zero extent holds none.
//!
//! ```text
//! shape [2, 3]      data [a, b, c, d, e, f]
//!
//!   a  c  e         element (i, j) lives at i + 2 * j
//!   b  d  f
//! ```

use crate::error::TensorError;
use crate::scalar::{DType, Element};
use crate::strides::{cartesian_to_linear, compute_strides, shape_len};

/// A dense n-dimensional tensor in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<E: Element> {
    data: Vec<E>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

/// The tensor type taken and returned by the safe primitives.
pub type DenseTensor<E> = Tensor<E>;

impl<E: Element> Tensor<E> {
    /// Build a tensor from column-major `data`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` when `data` does not hold exactly `shape_len(shape)`
    /// elements.
    ///
    /// ```
    /// use ndnumerics::{DenseTensor, Tensor};
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let t: DenseTensor<f64> = Tensor::from_vec(data, &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0));
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<E>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = shape_len(shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Every element set to `value`.
    pub fn full(shape: &[usize], value: E) -> Self {
        Self {
            data: vec![value; shape_len(shape)],
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// The additive identity of `E` everywhere (`false` for masks).
    ///
    /// ```
    /// use ndnumerics::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, E::zero())
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, E::one())
    }

    /// A rank-0 tensor.
    pub fn scalar(value: E) -> Self {
        Self {
            data: vec![value],
            shape: Vec::new(),
            strides: Vec::new(),
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Element type tag, as printed in staged programs.
    #[inline]
    pub fn dtype(&self) -> DType {
        E::DTYPE
    }

    /// Elements in column-major order.
    #[inline]
    pub fn data(&self) -> &[E] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [E] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<E> {
        self.data
    }

    /// The value of a one-element tensor of any rank, `None` otherwise.
    pub fn item(&self) -> Option<E> {
        match self.data.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Element at `indices`, or `None` for a wrong rank or an index past
    /// its extent.
    pub fn get(&self, indices: &[usize]) -> Option<&E> {
        self.linear_index(indices).ok().map(|i| &self.data[i])
    }

    /// # Errors
    ///
    /// `WrongNumberOfIndices` or `IndexOutOfBounds`.
    pub fn set(&mut self, indices: &[usize], value: E) -> Result<(), TensorError> {
        let i = self.linear_index(indices)?;
        self.data[i] = value;
        Ok(())
    }

    fn linear_index(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        if let Some((&index, &dim_size)) = indices
            .iter()
            .zip(&self.shape)
            .find(|&(&index, &dim)| index >= dim)
        {
            return Err(TensorError::IndexOutOfBounds { index, dim_size });
        }
        Ok(cartesian_to_linear(indices, &self.strides))
    }
}
