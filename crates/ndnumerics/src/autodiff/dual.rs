//! Forward mode values.
//!
//! A [`DualTensor`] pairs a primal value with the directional derivative of
//! that value along one input direction. Every `dual_*` operation maps
//! `(x, ẋ)` to `(f(x), J_f(x) ẋ)`; [`jacfwd`](super::jacfwd) seeds one unit
//! direction per input element and stacks the resulting tangents.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Primal value plus an optional tangent.
///
/// A missing tangent stands for the zero tangent, so constants never
/// allocate one.
#[derive(Debug, Clone)]
pub struct DualTensor<T: Scalar> {
    primal: DenseTensor<T>,
    tangent: Option<DenseTensor<T>>,
}

impl<T: Scalar> DualTensor<T> {
    /// A constant.
    ///
    /// ```
    /// use ndnumerics::Tensor;
    /// use ndnumerics::autodiff::DualTensor;
    ///
    /// let c = DualTensor::new(Tensor::<f64>::ones(&[2, 3]));
    /// assert!(!c.has_tangent());
    /// assert_eq!(c.tangent_or_zeros(), Tensor::zeros(&[2, 3]));
    /// ```
    pub fn new(primal: DenseTensor<T>) -> Self {
        Self {
            primal,
            tangent: None,
        }
    }

    /// # Errors
    ///
    /// `InvalidOperation` when the tangent is shaped differently from the
    /// primal.
    pub fn with_tangent(
        primal: DenseTensor<T>,
        tangent: DenseTensor<T>,
    ) -> Result<Self, TensorError> {
        if primal.shape() != tangent.shape() {
            return Err(TensorError::InvalidOperation(format!(
                "tangent shape {:?} must match primal shape {:?}",
                tangent.shape(),
                primal.shape()
            )));
        }
        Ok(Self {
            primal,
            tangent: Some(tangent),
        })
    }

    /// `primal` seeded along the unit direction of element `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when `index` is not below `primal.len()`.
    pub fn seeded(primal: DenseTensor<T>, index: usize) -> Result<Self, TensorError> {
        if index >= primal.len() {
            return Err(TensorError::IndexOutOfBounds {
                index,
                dim_size: primal.len(),
            });
        }
        let mut tangent = DenseTensor::zeros(primal.shape());
        tangent.data_mut()[index] = T::one();
        Ok(Self {
            primal,
            tangent: Some(tangent),
        })
    }

    pub(crate) fn from_primal_tangent(
        primal: DenseTensor<T>,
        tangent: Option<DenseTensor<T>>,
    ) -> Self {
        Self { primal, tangent }
    }

    pub fn primal(&self) -> &DenseTensor<T> {
        &self.primal
    }

    pub fn tangent(&self) -> Option<&DenseTensor<T>> {
        self.tangent.as_ref()
    }

    pub fn tangent_or_zeros(&self) -> DenseTensor<T> {
        self.tangent
            .clone()
            .unwrap_or_else(|| DenseTensor::zeros(self.primal.shape()))
    }

    pub fn has_tangent(&self) -> bool {
        self.tangent.is_some()
    }

    pub fn shape(&self) -> &[usize] {
        self.primal.shape()
    }

    pub fn len(&self) -> usize {
        self.primal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primal.is_empty()
    }

    /// Same value, treated as a constant from here on.
    pub fn detach(&self) -> Self {
        Self::new(self.primal.clone())
    }
}
