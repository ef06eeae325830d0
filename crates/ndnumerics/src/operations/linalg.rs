//! Singular value decomposition of matrices, backed by faer.
//!
//! Both ndnumerics and faer store matrices column-major, so a rank-2 tensor
//! (or a matrix lane of a reduction) is viewed by faer without copying.

use faer::MatRef;
use faer::linalg::solvers::{Svd, SvdError};

use crate::error::TensorError;
use crate::scalar::{RealOf, Scalar};
use crate::tensor::DenseTensor;

/// Thin SVD `A = U diag(S) V^H` of an `m x n` matrix, `k = min(m, n)`.
#[derive(Debug, Clone)]
pub struct MatrixSvd<ElT: Scalar> {
    /// Left singular vectors, shape `[m, k]`.
    pub u: DenseTensor<ElT>,
    /// Singular values in non-increasing order, shape `[k]`.
    pub s: DenseTensor<RealOf<ElT>>,
    /// Right singular vectors (not conjugated), shape `[n, k]`.
    pub v: DenseTensor<ElT>,
}

impl<ElT: Scalar> MatrixSvd<ElT> {
    /// Number of singular values, `min(m, n)`.
    pub fn rank(&self) -> usize {
        self.s.len()
    }
}

fn check_matrix<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> Result<(usize, usize), TensorError> {
    match *tensor.shape() {
        [m, n] => Ok((m, n)),
        _ => Err(TensorError::InvalidOperation(format!(
            "expected a matrix, got shape {:?}",
            tensor.shape()
        ))),
    }
}

/// Thin SVD of the column-major `nrows x ncols` matrix stored in `data`.
pub(crate) fn svd_column_major<ElT: Scalar>(
    data: &[ElT],
    nrows: usize,
    ncols: usize,
) -> Result<MatrixSvd<ElT>, TensorError> {
    let k = nrows.min(ncols);
    if k == 0 {
        return Ok(MatrixSvd {
            u: DenseTensor::zeros(&[nrows, 0]),
            s: DenseTensor::zeros(&[0]),
            v: DenseTensor::zeros(&[ncols, 0]),
        });
    }

    let mat = MatRef::from_column_major_slice(data, nrows, ncols);
    let svd: Svd<ElT> = Svd::new_thin(mat).map_err(|e: SvdError| TensorError::SvdError {
        message: format!("{:?}", e),
    })?;

    let u_mat = svd.U();
    let s_diag = svd.S();
    let v_mat = svd.V();

    let mut u_data = Vec::with_capacity(nrows * k);
    let mut v_data = Vec::with_capacity(ncols * k);
    for j in 0..k {
        for i in 0..nrows {
            u_data.push(u_mat[(i, j)]);
        }
        for i in 0..ncols {
            v_data.push(v_mat[(i, j)]);
        }
    }
    // singular values are real but stored as ElT
    let s_data: Vec<RealOf<ElT>> = (0..k).map(|j| Scalar::real_part(s_diag[j])).collect();

    Ok(MatrixSvd {
        u: DenseTensor::from_vec(u_data, &[nrows, k])?,
        s: DenseTensor::from_vec(s_data, &[k])?,
        v: DenseTensor::from_vec(v_data, &[ncols, k])?,
    })
}

/// Compute the thin SVD of a rank-2 tensor.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::svd_thin;
///
/// let t = Tensor::from_vec(vec![3.0, 0.0, 0.0, -2.0], &[2, 2]).unwrap();
/// let svd = svd_thin(&t).unwrap();
/// assert_eq!(svd.rank(), 2);
/// assert!((svd.s.data()[0] - 3.0).abs() < 1e-12);
/// assert!((svd.s.data()[1] - 2.0).abs() < 1e-12);
/// ```
pub fn svd_thin<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> Result<MatrixSvd<ElT>, TensorError> {
    let (m, n) = check_matrix(tensor)?;
    svd_column_major(tensor.data(), m, n)
}

/// Singular values of a rank-2 tensor in non-increasing order.
pub fn singular_values<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
) -> Result<DenseTensor<RealOf<ElT>>, TensorError> {
    Ok(svd_thin(tensor)?.s)
}
