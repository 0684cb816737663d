//! Explicit reconstruction of the orthogonal factor from encoded reflectors.
//!
//! The factorization leaves Q implicit (reflector vectors below the diagonal
//! of A, scalars in tau). Consumers that need Q as a dense matrix, the
//! round-trip tests included, materialize it here.

use num_traits::{One, Zero};
use qrkit_view::{MatrixView, MatrixViewMut, VectorView, VectorViewMut};

use crate::{QrError, Result, Scalar, ScalarBase};

/// Materialize Q from a factored matrix and its tau vector.
///
/// `a` and `tau` are the outputs of a successful factorization of an m x n
/// matrix; `q` receives the leading `q.ncols()` columns of the orthogonal
/// factor, where `min(m, n) <= q.ncols() <= m` (pass m x min(m, n) for the
/// thin factor, m x m for the full one). `work` needs `q.ncols()` unit-stride
/// scratch elements.
///
/// Q is accumulated by applying H_0 ... H_{k-1} to the identity in reverse
/// step order, touching each reflector exactly once.
pub fn form_q<T: Scalar>(
    a: &MatrixView<'_, T>,
    tau: &VectorView<'_, T>,
    q: &mut MatrixViewMut<'_, T>,
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
    let qc = q.ncols();
    if q.nrows() != m || qc < k || qc > m {
        return Err(QrError::ShapeMismatch {
            expected: (m, k),
            got: q.dims(),
        });
    }
    if work.len() < qc {
        return Err(QrError::WorkTooShort {
            len: work.len(),
            required: qc,
        });
    }
    debug_assert_eq!(work.stride(), 1, "workspace must have unit stride");

    for l in 0..qc {
        for i in 0..m {
            q.set(i, l, if i == l { T::one() } else { T::zero() });
        }
    }

    for j in (0..k).rev() {
        let tau_j = tau.get(j);
        if tau_j == T::zero() {
            continue;
        }
        // work[l] = v^H Q[j.., l] with v[0] = 1, v[i] = a[j+i, j]
        for l in 0..qc {
            let mut s = q.get(j, l);
            for i in 1..(m - j) {
                s = s + a.get(j + i, j).conj() * q.get(j + i, l);
            }
            work.set(l, s);
        }
        // Q[j.., l] -= tau * v * work[l]
        for l in 0..qc {
            let s = tau_j * work.get(l);
            q.set(j, l, q.get(j, l) - s);
            for i in 1..(m - j) {
                let updated = q.get(j + i, l) - a.get(j + i, j) * s;
                q.set(j + i, l, updated);
            }
        }
    }
    Ok(())
}
