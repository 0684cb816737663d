//! Backend abstraction for QR execution-path dispatch.
//!
//! Two strategies implement [`QrBackend`]: [`HouseholderBackend`], the
//! generic kernel that runs under any execution context, and
//! [`LapackBackend`] (feature `lapack`), a call-through to the vendor host
//! routine. [`crate::factor_qr`] is the single selection point: vendor
//! availability is a compile-time feature, eligibility (execution context,
//! stride layout) is a per-call predicate.

use crate::team::Member;
use crate::{Result, Scalar};
use qrkit_view::{MatrixViewMut, VectorViewMut};

/// Static capability flags of a QR backend.
///
/// Each backend declares its requirements so the dispatcher's eligibility
/// predicate has one place to consult.
pub trait BackendConfig {
    /// Whether the backend needs at least one unit stride on the matrix and
    /// a unit-stride tau vector.
    const REQUIRES_UNIT_STRIDE: bool;

    /// Whether the backend can only run on the plain sequential host (no
    /// cooperative team contexts).
    const HOST_ONLY: bool;
}

/// Strategy interface for one in-place QR factorization call.
///
/// Both implementations produce the same tau/reflector encoding (the LAPACK
/// `geqrf` convention), so callers observe no behavioral difference based on
/// which one runs, only a performance difference.
pub trait QrBackend<T: Scalar>: BackendConfig {
    /// Factor `a` in place, writing min(m, n) reflector scalars to `tau`.
    ///
    /// `work` must hold at least n unit-stride scratch elements; its contents
    /// are meaningless after the call.
    fn factor(
        member: &Member,
        a: &mut MatrixViewMut<'_, T>,
        tau: &mut VectorViewMut<'_, T>,
        work: &mut VectorViewMut<'_, T>,
    ) -> Result<()>;
}

/// Generic Householder kernel, usable on any execution context and stride
/// layout. Implementation in `qr_householder`.
pub struct HouseholderBackend;

impl BackendConfig for HouseholderBackend {
    const REQUIRES_UNIT_STRIDE: bool = false;
    const HOST_ONLY: bool = false;
}

/// Vendor host routine (`?geqrf`) call-through. Implementation in
/// [`crate::qr_lapack`].
#[cfg(feature = "lapack")]
pub struct LapackBackend;

#[cfg(feature = "lapack")]
impl BackendConfig for LapackBackend {
    const REQUIRES_UNIT_STRIDE: bool = true;
    const HOST_ONLY: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_backend_has_no_requirements() {
        assert!(!HouseholderBackend::REQUIRES_UNIT_STRIDE);
        assert!(!HouseholderBackend::HOST_ONLY);
    }

    #[cfg(feature = "lapack")]
    #[test]
    fn test_vendor_backend_requirements() {
        assert!(LapackBackend::REQUIRES_UNIT_STRIDE);
        assert!(LapackBackend::HOST_ONLY);
    }
}
