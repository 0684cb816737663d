//! LAPACK-backed host QR (the vendor path, feature `lapack`).
//!
//! A thin call-through to `?geqrf`: faithful parameter translation (layout
//! probe, leading dimension, workspace query) and unchanged status
//! propagation. No algorithmic logic lives here; correctness delegates
//! entirely to the vendor routine.

use num_complex::{Complex32, Complex64};
use num_traits::Zero;
use qrkit_view::{MatrixViewMut, VectorViewMut};

use crate::backend::{LapackBackend, QrBackend};
use crate::team::Member;
use crate::{QrError, Result, Scalar};

/// Layout of a vendor-eligible matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LapackLayout {
    /// row_stride == 1; leading dimension is the column stride.
    ColMajor { ld: i32 },
    /// col_stride == 1; leading dimension is the row stride.
    RowMajor { ld: i32 },
}

/// Probe whether a (dims, strides) combination can be handed to `?geqrf`.
///
/// Column-major needs row_stride == 1 and col_stride >= nrows; row-major
/// needs col_stride == 1 and row_stride >= ncols. Returns `None` otherwise,
/// in which case the dispatcher falls back to the generic kernel.
pub(crate) fn lapack_layout(
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
) -> Option<LapackLayout> {
    if row_stride == 1 && col_stride >= nrows.max(1) as isize {
        return Some(LapackLayout::ColMajor {
            ld: col_stride as i32,
        });
    }
    if col_stride == 1 && row_stride >= ncols.max(1) as isize {
        return Some(LapackLayout::RowMajor {
            ld: row_stride as i32,
        });
    }
    None
}

/// Type-level dispatch to the vendor factorization routine.
///
/// Implemented for `f32`/`f64` via `sgeqrf`/`dgeqrf` and
/// `Complex32`/`Complex64` via `cgeqrf`/`zgeqrf`.
pub trait LapackQr: Sized {
    /// Call the vendor `geqrf` routine on a column-major matrix.
    ///
    /// # Safety
    ///
    /// `a` must hold an lda-by-n column-major matrix, `tau` at least
    /// min(m, n) elements, and `work` at least max(1, lwork) elements
    /// (`lwork = -1` performs a workspace-size query).
    unsafe fn geqrf(
        m: i32,
        n: i32,
        a: &mut [Self],
        lda: i32,
        tau: &mut [Self],
        work: &mut [Self],
        lwork: i32,
        info: &mut i32,
    );

    /// Decode the optimal workspace length reported by a query call.
    fn decode_lwork(value: Self) -> usize;
}

impl LapackQr for f32 {
    unsafe fn geqrf(
        m: i32,
        n: i32,
        a: &mut [f32],
        lda: i32,
        tau: &mut [f32],
        work: &mut [f32],
        lwork: i32,
        info: &mut i32,
    ) {
        lapack::sgeqrf(m, n, a, lda, tau, work, lwork, info);
    }

    fn decode_lwork(value: f32) -> usize {
        value as usize
    }
}

impl LapackQr for f64 {
    unsafe fn geqrf(
        m: i32,
        n: i32,
        a: &mut [f64],
        lda: i32,
        tau: &mut [f64],
        work: &mut [f64],
        lwork: i32,
        info: &mut i32,
    ) {
        lapack::dgeqrf(m, n, a, lda, tau, work, lwork, info);
    }

    fn decode_lwork(value: f64) -> usize {
        value as usize
    }
}

impl LapackQr for Complex32 {
    unsafe fn geqrf(
        m: i32,
        n: i32,
        a: &mut [Complex32],
        lda: i32,
        tau: &mut [Complex32],
        work: &mut [Complex32],
        lwork: i32,
        info: &mut i32,
    ) {
        // Reinterpret as the binding's complex type; both are a (re, im)
        // pair of f32 with C layout.
        let a = std::slice::from_raw_parts_mut(a.as_mut_ptr() as *mut lapack::c32, a.len());
        let tau = std::slice::from_raw_parts_mut(tau.as_mut_ptr() as *mut lapack::c32, tau.len());
        let work =
            std::slice::from_raw_parts_mut(work.as_mut_ptr() as *mut lapack::c32, work.len());
        lapack::cgeqrf(m, n, a, lda, tau, work, lwork, info);
    }

    fn decode_lwork(value: Complex32) -> usize {
        value.re as usize
    }
}

impl LapackQr for Complex64 {
    unsafe fn geqrf(
        m: i32,
        n: i32,
        a: &mut [Complex64],
        lda: i32,
        tau: &mut [Complex64],
        work: &mut [Complex64],
        lwork: i32,
        info: &mut i32,
    ) {
        let a = std::slice::from_raw_parts_mut(a.as_mut_ptr() as *mut lapack::c64, a.len());
        let tau = std::slice::from_raw_parts_mut(tau.as_mut_ptr() as *mut lapack::c64, tau.len());
        let work =
            std::slice::from_raw_parts_mut(work.as_mut_ptr() as *mut lapack::c64, work.len());
        lapack::zgeqrf(m, n, a, lda, tau, work, lwork, info);
    }

    fn decode_lwork(value: Complex64) -> usize {
        value.re as usize
    }
}

/// Factor a vendor-eligible matrix in place, passing the status through.
///
/// Column-major input is handed to `?geqrf` directly on the caller's buffer.
/// Row-major input is round-tripped through a column-major scratch copy, the
/// same stride-induced transpose LAPACKE performs internally; the observable
/// result (R, reflectors, tau) is identical either way.
pub(crate) fn factor<T: Scalar>(
    a: &mut MatrixViewMut<'_, T>,
    tau: &mut VectorViewMut<'_, T>,
) -> Result<()> {
    let (m, n) = a.dims();
    let k = m.min(n);
    let layout = match lapack_layout(m, n, a.row_stride(), a.col_stride()) {
        Some(layout) => layout,
        // The dispatcher only routes here after a successful probe.
        None => panic!("qr_lapack: matrix layout is not vendor-eligible"),
    };
    debug_assert_eq!(tau.stride(), 1, "vendor path needs unit-stride tau");
    let tau_slice = unsafe { std::slice::from_raw_parts_mut(tau.as_mut_ptr(), k) };

    match layout {
        LapackLayout::ColMajor { ld } => {
            let len = (n - 1) * ld as usize + m;
            let a_slice = unsafe { std::slice::from_raw_parts_mut(a.as_mut_ptr(), len) };
            geqrf_in_place(m, n, a_slice, ld, tau_slice)
        }
        LapackLayout::RowMajor { ld } => {
            let ld = ld as isize;
            let mut scratch: Vec<T> = Vec::with_capacity(m * n);
            let p = a.as_mut_ptr();
            unsafe {
                for j in 0..n {
                    for i in 0..m {
                        scratch.push(*p.offset(i as isize * ld + j as isize));
                    }
                }
            }
            let result = geqrf_in_place(m, n, &mut scratch, m.max(1) as i32, tau_slice);
            unsafe {
                for j in 0..n {
                    for i in 0..m {
                        *p.offset(i as isize * ld + j as isize) = scratch[j * m + i];
                    }
                }
            }
            result
        }
    }
}

/// Workspace query followed by the factorization call.
fn geqrf_in_place<T: Scalar>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: i32,
    tau: &mut [T],
) -> Result<()> {
    let mi = m as i32;
    let ni = n as i32;
    let mut info = 0i32;

    let mut work = vec![T::zero(); 1];
    unsafe {
        T::geqrf(mi, ni, a, lda, tau, &mut work, -1, &mut info);
    }
    if info != 0 {
        return Err(QrError::Lapack { info });
    }

    let lwork = T::decode_lwork(work[0]).max(n.max(1));
    work.resize(lwork, T::zero());
    unsafe {
        T::geqrf(mi, ni, a, lda, tau, &mut work, lwork as i32, &mut info);
    }
    if info == 0 {
        Ok(())
    } else {
        Err(QrError::Lapack { info })
    }
}

impl<T: Scalar> QrBackend<T> for LapackBackend {
    fn factor(
        _member: &Member,
        a: &mut MatrixViewMut<'_, T>,
        tau: &mut VectorViewMut<'_, T>,
        _work: &mut VectorViewMut<'_, T>,
    ) -> Result<()> {
        // The vendor routine manages its own workspace.
        self::factor(a, tau)
    }
}
