//! Generic Householder QR kernel (the device-portable path).
//!
//! Factors A in place, one column step at a time: generate the reflector that
//! annihilates the subdiagonal of column j, then apply it to the trailing
//! submatrix as a rank-1 correction through the caller's workspace. Steps are
//! strictly ordered; within a step the trailing columns are split across the
//! execution context's workers, with the block barrier of
//! [`Member::for_each_column_block`] separating step j from step j+1.
//!
//! Reflector generation follows LAPACK `?larfg` (sign convention, tau range,
//! safe-minimum rescaling), so the encoding is interchangeable with the
//! vendor path's `?geqrf` output.

use num_traits::{Float, One, Zero};
use qrkit_view::{MatrixViewMut, VectorViewMut};

use crate::backend::{HouseholderBackend, QrBackend};
use crate::team::Member;
use crate::{Result, Scalar, ScalarBase};

impl<T: Scalar> QrBackend<T> for HouseholderBackend {
    fn factor(
        member: &Member,
        a: &mut MatrixViewMut<'_, T>,
        tau: &mut VectorViewMut<'_, T>,
        work: &mut VectorViewMut<'_, T>,
    ) -> Result<()> {
        let (m, n) = a.dims();
        let (as0, as1) = a.strides();
        let ts = tau.stride();
        unsafe {
            factor_in_place(
                member,
                m,
                n,
                a.as_mut_ptr(),
                as0,
                as1,
                tau.as_mut_ptr(),
                ts,
                work.as_mut_ptr(),
            );
        }
        Ok(())
    }
}

/// Factorization loop over raw strided storage.
///
/// # Safety
///
/// `a` must cover an m x n matrix with strides (as0, as1), `tau` a
/// min(m, n)-element vector with stride ts, and `work` n unit-stride
/// elements, all mutually disjoint.
#[allow(clippy::too_many_arguments)]
unsafe fn factor_in_place<T: Scalar>(
    member: &Member,
    m: usize,
    n: usize,
    a: *mut T,
    as0: isize,
    as1: isize,
    tau: *mut T,
    ts: isize,
    work: *mut T,
) {
    let k = m.min(n);
    for j in 0..k {
        // Reflector annihilating A[j+1.., j]; the diagonal becomes beta.
        let col_j = a.offset(j as isize * (as0 + as1));
        let tau_j = generate_reflector(m - j, col_j, as0);
        *tau.offset(j as isize * ts) = tau_j;

        // Rank-1 correction of the trailing submatrix A[j.., j+1..]. The
        // factorization applies H^H, hence the conjugated scalar; forming Q
        // later applies H itself.
        let trailing = n - j - 1;
        if trailing > 0 && tau_j != T::zero() {
            let c = a.offset(j as isize * as0 + (j + 1) as isize * as1);
            apply_reflector(
                member,
                m - j,
                trailing,
                col_j,
                as0,
                tau_j.conj(),
                c,
                as0,
                as1,
                work,
            );
        }
    }
}

/// LAPACK `?larfg`: generate an elementary reflector H such that
/// H^H x = beta e1.
///
/// On entry `x` points at alpha, followed by len-1 subdiagonal elements at
/// stride `inc`. On exit alpha holds beta (real) and the tail holds the
/// defining vector (v[0] = 1 implicit). Returns tau; tau = 0 encodes the
/// identity reflector, which is what a zero subcolumn produces.
unsafe fn generate_reflector<T: Scalar>(len: usize, x: *mut T, inc: isize) -> T {
    if len == 0 {
        return T::zero();
    }
    let tail = len - 1;
    let mut alpha = *x;
    let mut xnorm = nrm2(tail, x.offset(inc), inc);
    if xnorm.is_zero() && alpha.im().is_zero() {
        return T::zero();
    }

    let lapy = lapy3(alpha.re(), alpha.im(), xnorm);
    let mut beta = if alpha.re() >= T::Real::zero() {
        -lapy
    } else {
        lapy
    };

    // Rescale pathologically small columns before forming the reflector.
    let safmin = T::Real::min_positive_value() / T::Real::epsilon();
    let mut knt = 0;
    if beta.abs() < safmin {
        let rsafmn = T::Real::one() / safmin;
        while beta.abs() < safmin && knt < 20 {
            knt += 1;
            scal(tail, T::from_real(rsafmn), x.offset(inc), inc);
            beta = beta * rsafmn;
            alpha = alpha * T::from_real(rsafmn);
        }
        xnorm = nrm2(tail, x.offset(inc), inc);
        let lapy = lapy3(alpha.re(), alpha.im(), xnorm);
        beta = if alpha.re() >= T::Real::zero() {
            -lapy
        } else {
            lapy
        };
    }

    let tau = (T::from_real(beta) - alpha) / T::from_real(beta);
    scal(tail, T::one() / (alpha - T::from_real(beta)), x.offset(inc), inc);
    for _ in 0..knt {
        beta = beta * safmin;
    }
    *x = T::from_real(beta);
    tau
}

/// LAPACK `?larf` (left side): C := (I - tau v v^H) C.
///
/// `v` points at the reflector column (v[0] = 1 implicit, tail at stride
/// `vinc`); `c` is the rows x cols trailing submatrix with strides
/// (cs0, cs1); `work[0..cols]` holds the intermediate products v^H C.
/// Columns are split across the member's workers; each block touches only its
/// own slice of C and `work`, and the enclosing barrier orders this update
/// before the next factorization step.
#[allow(clippy::too_many_arguments)]
unsafe fn apply_reflector<T: Scalar>(
    member: &Member,
    rows: usize,
    cols: usize,
    v: *const T,
    vinc: isize,
    tau: T,
    c: *mut T,
    cs0: isize,
    cs1: isize,
    work: *mut T,
) {
    // Raw pointers are not Send; carry base addresses into the team closure.
    let v_addr = v as usize;
    let c_addr = c as usize;
    let w_addr = work as usize;
    member.for_each_column_block(0..cols, move |block| {
        let v = v_addr as *const T;
        let c = c_addr as *mut T;
        let w = w_addr as *mut T;
        unsafe {
            // w[l] = v^H C[:, l]
            for l in block.clone() {
                let col = c.offset(l as isize * cs1);
                let mut s = *col;
                for i in 1..rows {
                    s = s + (*v.offset(i as isize * vinc)).conj() * *col.offset(i as isize * cs0);
                }
                *w.add(l) = s;
            }
            // C[:, l] -= tau * v * w[l]
            for l in block {
                let s = tau * *w.add(l);
                let col = c.offset(l as isize * cs1);
                *col = *col - s;
                for i in 1..rows {
                    let p = col.offset(i as isize * cs0);
                    *p = *p - *v.offset(i as isize * vinc) * s;
                }
            }
        }
    });
}

/// Overflow-safe Euclidean norm over the real and imaginary components of a
/// strided vector (the `?nrm2` scale/ssq recurrence).
unsafe fn nrm2<T: Scalar>(n: usize, x: *const T, inc: isize) -> T::Real {
    let mut scale = T::Real::zero();
    let mut ssq = T::Real::one();
    for i in 0..n {
        let xi = *x.offset(i as isize * inc);
        for comp in [xi.re(), xi.im()] {
            if !comp.is_zero() {
                let a = comp.abs();
                if scale < a {
                    ssq = T::Real::one() + ssq * (scale / a).powi(2);
                    scale = a;
                } else {
                    ssq = ssq + (a / scale).powi(2);
                }
            }
        }
    }
    scale * ssq.sqrt()
}

/// sqrt(x^2 + y^2 + z^2) without spurious overflow (LAPACK `dlapy3`).
fn lapy3<R: Float>(x: R, y: R, z: R) -> R {
    let w = x.abs().max(y.abs()).max(z.abs());
    if w.is_zero() {
        return R::zero();
    }
    w * ((x / w).powi(2) + (y / w).powi(2) + (z / w).powi(2)).sqrt()
}

/// x := factor * x over a strided vector.
unsafe fn scal<T: Scalar>(n: usize, factor: T, x: *mut T, inc: isize) {
    for i in 0..n {
        let p = x.offset(i as isize * inc);
        *p = *p * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;
    use qrkit_view::{Matrix, Vector};

    #[test]
    fn test_reflector_pythagorean_column() {
        // x = (3, 4): beta = -5, tau = 1.6, v = (1, 0.5); all exact.
        let mut x = [3.0f64, 4.0];
        let tau = unsafe { generate_reflector(2, x.as_mut_ptr(), 1) };
        assert_eq!(tau, 1.6);
        assert_eq!(x, [-5.0, 0.5]);
    }

    #[test]
    fn test_reflector_negative_leading_entry() {
        // Leading entry < 0 flips the sign of beta.
        let mut x = [-3.0f64, 4.0];
        let tau = unsafe { generate_reflector(2, x.as_mut_ptr(), 1) };
        assert_eq!(x[0], 5.0);
        assert_abs_diff_eq!(tau, 1.6, epsilon = 1e-15);
        assert_abs_diff_eq!(x[1], 4.0 / (-3.0 - 5.0), epsilon = 1e-15);
    }

    #[test]
    fn test_reflector_zero_column_is_identity() {
        let mut x = [0.0f64, 0.0, 0.0];
        let tau = unsafe { generate_reflector(3, x.as_mut_ptr(), 1) };
        assert_eq!(tau, 0.0);
        assert_eq!(x, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reflector_strided_column() {
        // Same 3-4-5 column stored at stride 2.
        let mut buf = [3.0f64, -1.0, 4.0, -1.0];
        let tau = unsafe { generate_reflector(2, buf.as_mut_ptr(), 2) };
        assert_eq!(tau, 1.6);
        assert_eq!(buf, [-5.0, -1.0, 0.5, -1.0]);
    }

    #[test]
    fn test_reflector_tiny_column_rescaled() {
        // Entries far below sqrt(MIN_POSITIVE); the rescaling loop must kick
        // in and still produce |beta| = ||x||.
        let t = 1e-300f64;
        let mut x = [3.0 * t, 4.0 * t];
        let tau = unsafe { generate_reflector(2, x.as_mut_ptr(), 1) };
        assert_abs_diff_eq!(x[0], -5.0 * t, epsilon = 1e-305);
        assert_abs_diff_eq!(tau, 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_reflector_complex_realifies_diagonal() {
        // alpha = 3i, tail = (4): beta = -5, tau = 1 + 0.6i,
        // v1 = 4 / (3i + 5) = (10 - 6i) / 17.
        let mut x = [Complex64::new(0.0, 3.0), Complex64::new(4.0, 0.0)];
        let tau = unsafe { generate_reflector(2, x.as_mut_ptr(), 1) };
        assert_abs_diff_eq!(x[0].re, -5.0, epsilon = 1e-14);
        assert_abs_diff_eq!(x[0].im, 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(tau.re, 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(tau.im, 0.6, epsilon = 1e-14);
        assert_abs_diff_eq!(x[1].re, 10.0 / 17.0, epsilon = 1e-14);
        assert_abs_diff_eq!(x[1].im, -6.0 / 17.0, epsilon = 1e-14);
    }

    #[test]
    fn test_factor_2x2_hand_computed() {
        // A = [[3, 4], [4, 3]] (col-major). Step 0: beta = -5, tau0 = 1.6,
        // v = (1, 0.5). H * (4, 3) = (-4.8, -1.4). Step 1: single row, tau1 = 0.
        let mut a = Matrix::<f64>::from_fn_col_major(2, 2, |i, j| [[3.0, 4.0], [4.0, 3.0]][i][j]);
        let mut tau = Vector::<f64>::zeros(2);
        let mut work = Vector::<f64>::zeros(2);
        <HouseholderBackend as QrBackend<f64>>::factor(
            &Member::host_serial(),
            &mut a.view_mut(),
            &mut tau.view_mut(),
            &mut work.view_mut(),
        )
        .unwrap();

        assert_abs_diff_eq!(a.get(0, 0), -5.0, epsilon = 1e-14);
        assert_abs_diff_eq!(a.get(0, 1), -4.8, epsilon = 1e-14);
        assert_abs_diff_eq!(a.get(1, 1), -1.4, epsilon = 1e-14);
        assert_abs_diff_eq!(a.get(1, 0), 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(tau.get(0), 1.6, epsilon = 1e-14);
        assert_eq!(tau.get(1), 0.0);
    }

    #[test]
    fn test_factor_row_major_matches_col_major() {
        let vals = |i: usize, j: usize| (2 * i + 3 * j + 1) as f64 + 1.0 / (i + j + 1) as f64;
        let mut a_col = Matrix::<f64>::from_fn_col_major(4, 3, vals);
        let mut a_row = Matrix::<f64>::from_fn_row_major(4, 3, vals);
        let mut tau_col = Vector::<f64>::zeros(3);
        let mut tau_row = Vector::<f64>::zeros(3);
        let mut work = Vector::<f64>::zeros(3);

        let member = Member::host_serial();
        <HouseholderBackend as QrBackend<f64>>::factor(
            &member,
            &mut a_col.view_mut(),
            &mut tau_col.view_mut(),
            &mut work.view_mut(),
        )
        .unwrap();
        <HouseholderBackend as QrBackend<f64>>::factor(
            &member,
            &mut a_row.view_mut(),
            &mut tau_row.view_mut(),
            &mut work.view_mut(),
        )
        .unwrap();

        for j in 0..3 {
            assert_abs_diff_eq!(tau_col.get(j), tau_row.get(j), epsilon = 1e-13);
            for i in 0..4 {
                assert_abs_diff_eq!(a_col.get(i, j), a_row.get(i, j), epsilon = 1e-13);
            }
        }
    }

    #[test]
    fn test_nrm2_extreme_values_no_overflow() {
        let x = [1e300f64, 1e300];
        let norm = unsafe { nrm2(2, x.as_ptr(), 1) };
        assert_abs_diff_eq!(norm, 1e300 * 2.0f64.sqrt(), epsilon = 1e287);
    }

    #[test]
    fn test_lapy3() {
        assert_eq!(lapy3(3.0f64, 0.0, 4.0), 5.0);
        assert_eq!(lapy3(0.0f64, 0.0, 0.0), 0.0);
    }
}
