//! Strided matrix and vector views for dense factorization kernels.
//!
//! This crate provides the handle types through which the `qrkit` kernels see
//! caller-owned buffers:
//!
//! - [`MatrixView`] / [`MatrixViewMut`]: zero-copy 2-D views exposing extents,
//!   per-dimension strides, and a raw element pointer
//! - [`VectorView`] / [`VectorViewMut`]: the 1-D equivalents
//! - [`Matrix`] / [`Vector`]: owned buffers with column-major (Fortran) and
//!   row-major (C) constructors, convenient for tests, benches, and callers
//!   that do not already own a buffer
//!
//! Views never copy or reallocate. All accessed offsets are validated against
//! the backing slice at construction time; kernels may then walk the raw
//! pointer without further checks.
//!
//! # Example
//!
//! ```rust
//! use qrkit_view::Matrix;
//!
//! // 2x3 column-major matrix: element (i, j) lives at data[i + j*2]
//! let a = Matrix::<f64>::from_fn_col_major(2, 3, |i, j| (i * 3 + j) as f64);
//! let v = a.view();
//! assert_eq!(v.dims(), (2, 3));
//! assert_eq!(v.strides(), (1, 2));
//! assert_eq!(v.get(1, 2), 5.0);
//! ```

mod view;

pub use view::{
    Matrix, MatrixView, MatrixViewMut, Vector, VectorView, VectorViewMut,
};

/// Errors that can occur when constructing a view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Some index combination would fall outside the backing slice.
    #[error("offset out of bounds while validating view extent")]
    OffsetOverflow,

    /// A mutable view would alias itself through a zero stride.
    #[error("invalid stride 0 for dim {dim} of a mutable view")]
    ZeroStride { dim: usize },
}

/// Result type for view construction.
pub type Result<T> = std::result::Result<T, ViewError>;
