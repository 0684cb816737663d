//! Dense Householder QR factorization with execution-path dispatch.
//!
//! [`factor_qr`] factors an m x n strided matrix in place into R (on and
//! above the diagonal) and encoded Householder reflectors (below it), one
//! scalar per reflector in `tau`, following the LAPACK `geqrf` convention.
//! The call is routed to exactly one of two implementations:
//!
//! - a vendor host routine (`?geqrf`, feature `lapack`) when the execution
//!   context is the plain sequential host and the buffer layout qualifies,
//! - the generic Householder kernel otherwise, which runs under any
//!   execution context including a cooperative worker team
//!   (feature `parallel`).
//!
//! Both paths encode identical factors up to floating-point rounding, so the
//! choice is only ever a performance difference.
//!
//! # Example
//!
//! ```
//! use qrkit::{factor_qr, Member};
//! use qrkit_view::{Matrix, Vector};
//!
//! // 3x2 column-major matrix
//! let mut a = Matrix::<f64>::from_fn_col_major(3, 2, |i, j| (3 * i + j + 1) as f64);
//! let a0 = a.clone();
//! let mut tau = Vector::<f64>::zeros(2);
//! let mut work = Vector::<f64>::zeros(2);
//!
//! factor_qr(
//!     &Member::host_serial(),
//!     &mut a.view_mut(),
//!     &mut tau.view_mut(),
//!     &mut work.view_mut(),
//! )
//! .unwrap();
//!
//! // |r00| is the norm of the first column
//! let c0 = (0..3).map(|i| a0.get(i, 0).powi(2)).sum::<f64>().sqrt();
//! assert!((a.get(0, 0).abs() - c0).abs() < 1e-12);
//! ```

pub mod backend;
mod qr_householder;
#[cfg(feature = "lapack")]
pub mod qr_lapack;
mod reconstruct;
mod team;

pub use backend::{BackendConfig, HouseholderBackend, QrBackend};
#[cfg(feature = "lapack")]
pub use backend::LapackBackend;
#[cfg(feature = "lapack")]
pub use qr_lapack::LapackQr;
pub use reconstruct::form_q;
pub use team::Member;

use num_complex::{Complex32, Complex64};
use qrkit_view::{MatrixViewMut, VectorViewMut};

/// Shared trait bounds for element types usable with the factorization
/// kernels, independent of the vendor backend.
///
/// The single `T` across the matrix, tau, and workspace arguments of
/// [`factor_qr`] is what makes a value-type mismatch a compile-time failure
/// rather than a runtime check.
pub trait ScalarBase:
    Copy
    + Send
    + Sync
    + PartialEq
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + num_traits::Zero
    + num_traits::One
    + 'static
{
    /// The real type underlying the element type.
    type Real: num_traits::Float + Send + Sync + 'static;

    /// Complex conjugate (identity for real types).
    fn conj(self) -> Self;
    /// Real part.
    fn re(self) -> Self::Real;
    /// Imaginary part (zero for real types).
    fn im(self) -> Self::Real;
    /// Embed a real value.
    fn from_real(r: Self::Real) -> Self;
}

impl ScalarBase for f32 {
    type Real = f32;

    fn conj(self) -> Self {
        self
    }
    fn re(self) -> f32 {
        self
    }
    fn im(self) -> f32 {
        0.0
    }
    fn from_real(r: f32) -> Self {
        r
    }
}

impl ScalarBase for f64 {
    type Real = f64;

    fn conj(self) -> Self {
        self
    }
    fn re(self) -> f64 {
        self
    }
    fn im(self) -> f64 {
        0.0
    }
    fn from_real(r: f64) -> Self {
        r
    }
}

impl ScalarBase for Complex32 {
    type Real = f32;

    fn conj(self) -> Self {
        num_complex::Complex::conj(&self)
    }
    fn re(self) -> f32 {
        self.re
    }
    fn im(self) -> f32 {
        self.im
    }
    fn from_real(r: f32) -> Self {
        Complex32::new(r, 0.0)
    }
}

impl ScalarBase for Complex64 {
    type Real = f64;

    fn conj(self) -> Self {
        num_complex::Complex::conj(&self)
    }
    fn re(self) -> f64 {
        self.re
    }
    fn im(self) -> f64 {
        self.im
    }
    fn from_real(r: f64) -> Self {
        Complex64::new(r, 0.0)
    }
}

/// Trait alias for element types supported by [`factor_qr`].
///
/// With the `lapack` feature this additionally requires [`LapackQr`] so that
/// every scalar can be dispatched to the vendor path when eligible.
#[cfg(feature = "lapack")]
pub trait Scalar: ScalarBase + qr_lapack::LapackQr {}

#[cfg(feature = "lapack")]
impl<T> Scalar for T where T: ScalarBase + qr_lapack::LapackQr {}

/// Trait alias for element types supported by [`factor_qr`].
#[cfg(not(feature = "lapack"))]
pub trait Scalar: ScalarBase {}

#[cfg(not(feature = "lapack"))]
impl<T> Scalar for T where T: ScalarBase {}

/// Errors specific to the factorization entry points.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    /// Tau vector shorter than min(m, n).
    #[error("tau vector too short: len {len}, need {required}")]
    TauTooShort { len: usize, required: usize },

    /// Workspace vector shorter than the trailing update needs.
    #[error("workspace too short: len {len}, need {required}")]
    WorkTooShort { len: usize, required: usize },

    /// An output matrix has the wrong shape.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// Nonzero status from the vendor routine, passed through unchanged.
    #[cfg(feature = "lapack")]
    #[error("lapack geqrf returned info = {info}")]
    Lapack { info: i32 },

    #[error(transparent)]
    View(#[from] qrkit_view::ViewError),
}

/// Convenience alias for `Result<T, QrError>`.
pub type Result<T> = std::result::Result<T, QrError>;

/// In-place QR factorization of `a`, dispatched to the vendor host routine or
/// the generic Householder kernel.
///
/// On success `a` holds R in its upper triangle and the reflector vectors
/// below the diagonal, and `tau[0..min(m, n)]` holds one scalar per reflector
/// (`geqrf` encoding: H_j = I - tau[j] * v * v^H, v[0] = 1 implicit).
/// `work` is scratch for the trailing updates and carries no meaning after
/// the call; it must have unit stride and at least n elements.
///
/// Selection policy, evaluated once per call:
/// 1. `lapack` feature enabled, `member` is the plain sequential host, the
///    matrix is row- or column-major (one unit stride with a valid leading
///    dimension), and `tau` has unit stride: vendor routine.
/// 2. Otherwise: generic kernel, cooperatively executed when `member` is a
///    team.
///
/// A zero-norm subcolumn is not an error: the step stores `tau[j] = 0` (the
/// identity reflector) and moves on, so rank-deficient input factors fine.
pub fn factor_qr<T: Scalar>(
    member: &Member,
    a: &mut MatrixViewMut<'_, T>,
    tau: &mut VectorViewMut<'_, T>,
    work: &mut VectorViewMut<'_, T>,
) -> Result<()> {
    let (m, n) = a.dims();
    let k = m.min(n);
    if tau.len() < k {
        return Err(QrError::TauTooShort {
            len: tau.len(),
            required: k,
        });
    }
    if work.len() < n {
        return Err(QrError::WorkTooShort {
            len: work.len(),
            required: n,
        });
    }
    debug_assert_eq!(work.stride(), 1, "workspace must have unit stride");
    if k == 0 {
        return Ok(());
    }

    #[cfg(feature = "lapack")]
    {
        let host_ok = !LapackBackend::HOST_ONLY || member.is_host_serial();
        let layout_ok = !LapackBackend::REQUIRES_UNIT_STRIDE
            || (tau.stride() == 1
                && qr_lapack::lapack_layout(m, n, a.row_stride(), a.col_stride()).is_some());
        if host_ok && layout_ok {
            return LapackBackend::factor(member, a, tau, work);
        }
    }

    HouseholderBackend::factor(member, a, tau, work)
}
