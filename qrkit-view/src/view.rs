//! Rank-specialized strided view types.
//!
//! The factorization kernels consume matrices and vectors exclusively through
//! these handles: extents, per-dimension strides, and a raw element pointer.
//! Mutable views are unique borrows of the backing slice, so a kernel holding
//! one has exclusive access for the duration of the call.

use crate::{Result, ViewError};

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that every index combination of an extent/stride pair stays
/// within `[0, len)` of the backing slice.
fn validate_bounds(
    len: usize,
    dims: &[usize],
    strides: &[isize],
    offset: isize,
) -> Result<()> {
    // Empty view - no access happens.
    if dims.iter().any(|&d| d == 0) {
        return Ok(());
    }
    // Accumulate the most negative and most positive reachable offsets.
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(ViewError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 {
        return Err(ViewError::OffsetOverflow);
    }
    if max_offset as usize >= len {
        return Err(ViewError::OffsetOverflow);
    }
    Ok(())
}

/// Mutable views additionally reject zero strides on non-degenerate
/// dimensions, which would alias distinct indices onto one element.
fn validate_unique(dims: &[usize], strides: &[isize]) -> Result<()> {
    for (dim, (&d, &s)) in dims.iter().zip(strides.iter()).enumerate() {
        if d > 1 && s == 0 {
            return Err(ViewError::ZeroStride { dim });
        }
    }
    Ok(())
}

// ============================================================================
// MatrixView
// ============================================================================

/// Immutable strided view of an m x n matrix.
pub struct MatrixView<'a, T> {
    ptr: *const T,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
    _marker: std::marker::PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for MatrixView<'_, T> {}
unsafe impl<T: Sync> Sync for MatrixView<'_, T> {}

impl<T> Clone for MatrixView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for MatrixView<'_, T> {}

impl<T> std::fmt::Debug for MatrixView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixView")
            .field("dims", &(self.nrows, self.ncols))
            .field("strides", &(self.row_stride, self.col_stride))
            .finish()
    }
}

impl<'a, T> MatrixView<'a, T> {
    /// Create an immutable matrix view over a borrowed slice.
    ///
    /// `offset` is the index of element (0, 0) within `data`; element (i, j)
    /// lives at `offset + i*row_stride + j*col_stride`.
    pub fn new(
        data: &'a [T],
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(
            data.len(),
            &[nrows, ncols],
            &[row_stride, col_stride],
            offset,
        )?;
        let ptr = unsafe { data.as_ptr().offset(offset) };
        Ok(Self {
            ptr,
            nrows,
            ncols,
            row_stride,
            col_stride,
            _marker: std::marker::PhantomData,
        })
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        (self.row_stride, self.col_stride)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    /// Raw const pointer to element (0, 0).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}

impl<T: Copy> MatrixView<'_, T> {
    /// Get element (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.nrows && j < self.ncols, "matrix index out of bounds");
        unsafe {
            *self
                .ptr
                .offset(i as isize * self.row_stride + j as isize * self.col_stride)
        }
    }
}

// ============================================================================
// MatrixViewMut
// ============================================================================

/// Mutable strided view of an m x n matrix.
///
/// Holds a unique borrow of the backing slice; the kernel mutates the matrix
/// in place through this handle and never copies or reallocates it.
pub struct MatrixViewMut<'a, T> {
    ptr: *mut T,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
    _marker: std::marker::PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for MatrixViewMut<'_, T> {}

impl<T> std::fmt::Debug for MatrixViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixViewMut")
            .field("dims", &(self.nrows, self.ncols))
            .field("strides", &(self.row_stride, self.col_stride))
            .finish()
    }
}

impl<'a, T> MatrixViewMut<'a, T> {
    /// Create a mutable matrix view over a borrowed slice.
    pub fn new(
        data: &'a mut [T],
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(
            data.len(),
            &[nrows, ncols],
            &[row_stride, col_stride],
            offset,
        )?;
        validate_unique(&[nrows, ncols], &[row_stride, col_stride])?;
        let ptr = unsafe { data.as_mut_ptr().offset(offset) };
        Ok(Self {
            ptr,
            nrows,
            ncols,
            row_stride,
            col_stride,
            _marker: std::marker::PhantomData,
        })
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        (self.row_stride, self.col_stride)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    /// Raw const pointer to element (0, 0).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr as *const T
    }

    /// Raw mutable pointer to element (0, 0).
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> MatrixView<'_, T> {
        MatrixView {
            ptr: self.ptr as *const T,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Copy> MatrixViewMut<'_, T> {
    /// Get element (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.nrows && j < self.ncols, "matrix index out of bounds");
        unsafe {
            *self
                .ptr
                .offset(i as isize * self.row_stride + j as isize * self.col_stride)
        }
    }

    /// Set element (i, j).
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(i < self.nrows && j < self.ncols, "matrix index out of bounds");
        unsafe {
            *self
                .ptr
                .offset(i as isize * self.row_stride + j as isize * self.col_stride) = value;
        }
    }
}

// ============================================================================
// VectorView / VectorViewMut
// ============================================================================

/// Immutable strided view of a length-n vector.
pub struct VectorView<'a, T> {
    ptr: *const T,
    len: usize,
    stride: isize,
    _marker: std::marker::PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for VectorView<'_, T> {}
unsafe impl<T: Sync> Sync for VectorView<'_, T> {}

impl<T> Clone for VectorView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for VectorView<'_, T> {}

impl<T> std::fmt::Debug for VectorView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorView")
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<'a, T> VectorView<'a, T> {
    /// Create an immutable vector view over a borrowed slice.
    pub fn new(data: &'a [T], len: usize, stride: isize, offset: isize) -> Result<Self> {
        validate_bounds(data.len(), &[len], &[stride], offset)?;
        let ptr = unsafe { data.as_ptr().offset(offset) };
        Ok(Self {
            ptr,
            len,
            stride,
            _marker: std::marker::PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Raw const pointer to element 0.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}

impl<T: Copy> VectorView<'_, T> {
    /// Get element i.
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.len, "vector index out of bounds");
        unsafe { *self.ptr.offset(i as isize * self.stride) }
    }
}

/// Mutable strided view of a length-n vector.
pub struct VectorViewMut<'a, T> {
    ptr: *mut T,
    len: usize,
    stride: isize,
    _marker: std::marker::PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for VectorViewMut<'_, T> {}

impl<T> std::fmt::Debug for VectorViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorViewMut")
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<'a, T> VectorViewMut<'a, T> {
    /// Create a mutable vector view over a borrowed slice.
    pub fn new(data: &'a mut [T], len: usize, stride: isize, offset: isize) -> Result<Self> {
        validate_bounds(data.len(), &[len], &[stride], offset)?;
        validate_unique(&[len], &[stride])?;
        let ptr = unsafe { data.as_mut_ptr().offset(offset) };
        Ok(Self {
            ptr,
            len,
            stride,
            _marker: std::marker::PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Raw const pointer to element 0.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr as *const T
    }

    /// Raw mutable pointer to element 0.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> VectorView<'_, T> {
        VectorView {
            ptr: self.ptr as *const T,
            len: self.len,
            stride: self.stride,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Copy> VectorViewMut<'_, T> {
    /// Get element i.
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.len, "vector index out of bounds");
        unsafe { *self.ptr.offset(i as isize * self.stride) }
    }

    /// Set element i.
    pub fn set(&mut self, i: usize, value: T) {
        assert!(i < self.len, "vector index out of bounds");
        unsafe {
            *self.ptr.offset(i as isize * self.stride) = value;
        }
    }
}

// ============================================================================
// Matrix (owned)
// ============================================================================

/// Owned m x n matrix backing a strided view.
///
/// Supports both column-major (Fortran default) and row-major (C default)
/// layouts; the layout is fixed at construction and reflected in the strides
/// of the views it hands out.
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
}

impl<T: Clone> Clone for Matrix<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("dims", &(self.nrows, self.ncols))
            .field("strides", &(self.row_stride, self.col_stride))
            .finish()
    }
}

impl<T: Clone + Default> Matrix<T> {
    /// Column-major matrix filled with default values.
    pub fn col_major(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![T::default(); nrows * ncols],
            nrows,
            ncols,
            row_stride: 1,
            col_stride: nrows as isize,
        }
    }

    /// Row-major matrix filled with default values.
    pub fn row_major(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![T::default(); nrows * ncols],
            nrows,
            ncols,
            row_stride: ncols as isize,
            col_stride: 1,
        }
    }

    /// Column-major matrix with element (i, j) produced by `f(i, j)`.
    pub fn from_fn_col_major(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self {
            data,
            nrows,
            ncols,
            row_stride: 1,
            col_stride: nrows as isize,
        }
    }

    /// Row-major matrix with element (i, j) produced by `f(i, j)`.
    pub fn from_fn_row_major(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self {
            data,
            nrows,
            ncols,
            row_stride: ncols as isize,
            col_stride: 1,
        }
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        (self.row_stride, self.col_stride)
    }

    /// Backing buffer in memory order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable backing buffer in memory order.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Immutable view of the whole matrix.
    pub fn view(&self) -> MatrixView<'_, T> {
        MatrixView {
            ptr: self.data.as_ptr(),
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            _marker: std::marker::PhantomData,
        }
    }

    /// Mutable view of the whole matrix.
    pub fn view_mut(&mut self) -> MatrixViewMut<'_, T> {
        MatrixViewMut {
            ptr: self.data.as_mut_ptr(),
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Copy> Matrix<T> {
    /// Get element (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        self.view().get(i, j)
    }

    /// Set element (i, j).
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.view_mut().set(i, j, value);
    }
}

// ============================================================================
// Vector (owned)
// ============================================================================

/// Owned length-n vector with unit stride.
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T: Clone> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector").field("len", &self.data.len()).finish()
    }
}

impl<T: Clone + Default> Vector<T> {
    /// Vector of `len` default values.
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![T::default(); len],
        }
    }
}

impl<T> Vector<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Immutable unit-stride view of the whole vector.
    pub fn view(&self) -> VectorView<'_, T> {
        VectorView {
            ptr: self.data.as_ptr(),
            len: self.data.len(),
            stride: 1,
            _marker: std::marker::PhantomData,
        }
    }

    /// Mutable unit-stride view of the whole vector.
    pub fn view_mut(&mut self) -> VectorViewMut<'_, T> {
        VectorViewMut {
            ptr: self.data.as_mut_ptr(),
            len: self.data.len(),
            stride: 1,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Copy> Vector<T> {
    /// Get element i.
    pub fn get(&self, i: usize) -> T {
        self.data[i]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewError;

    #[test]
    fn test_col_major_layout() {
        let a = Matrix::<f64>::from_fn_col_major(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(a.strides(), (1, 2));
        // Memory order: columns contiguous
        assert_eq!(a.data(), &[0.0, 10.0, 1.0, 11.0, 2.0, 12.0]);
        assert_eq!(a.get(1, 2), 12.0);
    }

    #[test]
    fn test_row_major_layout() {
        let a = Matrix::<f64>::from_fn_row_major(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(a.strides(), (3, 1));
        assert_eq!(a.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(a.get(1, 2), 12.0);
    }

    #[test]
    fn test_matrix_view_mut_set_get() {
        let mut a = Matrix::<f64>::col_major(3, 3);
        let mut v = a.view_mut();
        v.set(2, 1, 7.5);
        assert_eq!(v.get(2, 1), 7.5);
        assert_eq!(a.get(2, 1), 7.5);
    }

    #[test]
    fn test_strided_submatrix_view() {
        // Every other row and column of a 4x4 col-major buffer.
        let data: Vec<f64> = (0..16).map(|x| x as f64).collect();
        let v = MatrixView::new(&data, 2, 2, 2, 8, 0).unwrap();
        assert_eq!(v.get(0, 0), 0.0);
        assert_eq!(v.get(1, 0), 2.0);
        assert_eq!(v.get(0, 1), 8.0);
        assert_eq!(v.get(1, 1), 10.0);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let data = vec![0.0f64; 6];
        // 2x3 col-major needs elements up to offset 1 + 2*2 = 5: ok
        assert!(MatrixView::new(&data, 2, 3, 1, 2, 0).is_ok());
        // 3x3 col-major needs offset 2 + 3*2 = 8: out of bounds
        assert!(matches!(
            MatrixView::new(&data, 3, 3, 1, 3, 0),
            Err(ViewError::OffsetOverflow)
        ));
    }

    #[test]
    fn test_negative_reach_rejected() {
        let data = vec![0.0f64; 8];
        assert!(matches!(
            VectorView::new(&data, 4, -1, 0),
            Err(ViewError::OffsetOverflow)
        ));
        // With a large enough offset a negative stride is fine.
        assert!(VectorView::new(&data, 4, -1, 3).is_ok());
    }

    #[test]
    fn test_zero_stride_rejected_for_mut() {
        let mut data = vec![0.0f64; 4];
        assert!(matches!(
            MatrixViewMut::new(&mut data, 2, 2, 0, 1, 0),
            Err(ViewError::ZeroStride { dim: 0 })
        ));
        // Immutable broadcast-like views are allowed.
        assert!(MatrixView::new(&data, 2, 2, 0, 1, 0).is_ok());
    }

    #[test]
    fn test_empty_view() {
        let data: Vec<f64> = vec![];
        let v = MatrixView::new(&data, 0, 3, 1, 0, 0).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn test_vector_strided() {
        let mut data: Vec<f64> = (0..8).map(|x| x as f64).collect();
        let mut v = VectorViewMut::new(&mut data, 4, 2, 1).unwrap();
        assert_eq!(v.get(0), 1.0);
        assert_eq!(v.get(3), 7.0);
        v.set(3, -1.0);
        assert_eq!(data[7], -1.0);
    }

    #[test]
    fn test_vector_owned() {
        let v = Vector::<f64>::zeros(5);
        assert_eq!(v.len(), 5);
        assert_eq!(v.view().stride(), 1);
    }

    #[test]
    fn test_as_view_reborrow() {
        let mut a = Matrix::<f64>::from_fn_row_major(2, 2, |i, j| (i + j) as f64);
        let vm = a.view_mut();
        let v = vm.as_view();
        assert_eq!(v.get(1, 1), 2.0);
        assert_eq!(v.strides(), vm.strides());
    }
}
