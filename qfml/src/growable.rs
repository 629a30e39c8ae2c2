//! Doubling buffers used while streaming the input tables.
//!
//! [`GrowableBuffer`] is a one-dimensional buffer with an explicit logical
//! capacity, and [`GrowableMatrix`] is a row-major matrix stored in a single
//! flat allocation with an explicit stride. Both grow by doubling, as decided
//! by [`next_capacity`].

use std::collections::TryReserveError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Index;

use log::debug;

/// Error returned when a buffer cannot be grown to the requested size.
#[derive(Debug)]
pub enum GrowError {
    /// The requested number of elements does not fit into `usize`.
    CapacityOverflow,
    /// The allocator refused to provide the memory.
    AllocationFailed {
        elements: usize,
        source: TryReserveError,
    },
}

impl Display for GrowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrowError::CapacityOverflow => write!(f, "Requested capacity overflows"),
            GrowError::AllocationFailed { elements, .. } => {
                write!(f, "Could not allocate memory for {} elements", elements)
            }
        }
    }
}

impl Error for GrowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GrowError::AllocationFailed { source, .. } => Some(source),
            GrowError::CapacityOverflow => None,
        }
    }
}

/// Returns the capacity a buffer of `capacity` elements grows to.
#[inline]
#[must_use]
pub fn next_capacity(capacity: usize) -> Option<usize> {
    if capacity == 0 {
        Some(1)
    } else {
        capacity.checked_mul(2)
    }
}

fn reserve_exact<T>(vec: &mut Vec<T>, total: usize) -> Result<(), GrowError> {
    let additional = total.saturating_sub(vec.len());
    vec.try_reserve_exact(additional)
        .map_err(|source| GrowError::AllocationFailed {
            elements: total,
            source,
        })
}

/// A vector with an explicit, doubling logical capacity.
///
/// `push` never grows the backing storage past the logical capacity
/// implicitly; it doubles the capacity first, so the growth policy is the
/// same for every buffer in the crate regardless of what `Vec` would do.
#[derive(Debug, Clone)]
pub struct GrowableBuffer<T> {
    items: Vec<T>,
    capacity: usize,
    initial_capacity: usize,
}

impl<T> GrowableBuffer<T> {
    /// Creates a new buffer able to hold `capacity` elements before growing.
    ///
    /// # Examples
    /// ```
    /// use qfml::growable::GrowableBuffer;
    ///
    /// let mut buffer = GrowableBuffer::with_capacity(2).unwrap();
    /// buffer.push(1).unwrap();
    /// buffer.push(2).unwrap();
    /// buffer.push(3).unwrap();
    ///
    /// assert_eq!(buffer.capacity(), 4);
    /// assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, GrowError> {
        let mut items = Vec::new();
        reserve_exact(&mut items, capacity)?;

        Ok(Self {
            items,
            capacity,
            initial_capacity: capacity,
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Doubles the logical capacity of the buffer.
    pub fn grow(&mut self) -> Result<(), GrowError> {
        let new_capacity = next_capacity(self.capacity).ok_or(GrowError::CapacityOverflow)?;
        reserve_exact(&mut self.items, new_capacity)?;
        debug!(
            "Growing buffer from {} to {} elements",
            self.capacity, new_capacity
        );
        self.capacity = new_capacity;

        Ok(())
    }

    /// Grows the buffer until it can hold at least `min_capacity` elements.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<(), GrowError> {
        while self.capacity < min_capacity {
            self.grow()?;
        }

        Ok(())
    }

    pub fn push(&mut self, item: T) -> Result<(), GrowError> {
        if self.items.len() == self.capacity {
            self.grow()?;
        }
        self.items.push(item);

        Ok(())
    }

    /// Removes all elements, keeping the current capacity for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Moves the contents out as a `Vec` and resets the buffer to its
    /// initial capacity with a fresh allocation.
    ///
    /// The returned vector never shares storage with the buffer afterwards.
    pub fn take(&mut self) -> Result<Vec<T>, GrowError> {
        let mut fresh = Vec::new();
        reserve_exact(&mut fresh, self.initial_capacity)?;
        self.capacity = self.initial_capacity;

        Ok(std::mem::replace(&mut self.items, fresh))
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Index<usize> for GrowableBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

/// Row-major matrix in a single flat allocation that grows along both axes.
///
/// Element `(row, col)` lives at `row * stride + col`, where the stride is
/// the current column capacity. Growing the columns changes the stride, so
/// every row is copied into the new layout.
#[derive(Debug, Clone)]
pub struct GrowableMatrix<T> {
    data: Vec<T>,
    row_capacity: usize,
    col_capacity: usize,
}

impl<T: Copy + Default> GrowableMatrix<T> {
    /// Creates a `rows` x `cols` matrix filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GrowError> {
        let total = rows.checked_mul(cols).ok_or(GrowError::CapacityOverflow)?;
        let mut data = Vec::new();
        reserve_exact(&mut data, total)?;
        data.resize(total, T::default());

        Ok(Self {
            data,
            row_capacity: rows,
            col_capacity: cols,
        })
    }

    #[inline]
    #[must_use]
    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    #[inline]
    #[must_use]
    pub fn col_capacity(&self) -> usize {
        self.col_capacity
    }

    /// Doubles the number of rows. Existing rows keep their position in the
    /// flat buffer; the new rows are appended and default-initialized.
    pub fn grow_rows(&mut self) -> Result<(), GrowError> {
        let new_rows = next_capacity(self.row_capacity).ok_or(GrowError::CapacityOverflow)?;
        let total = new_rows
            .checked_mul(self.col_capacity)
            .ok_or(GrowError::CapacityOverflow)?;
        reserve_exact(&mut self.data, total)?;
        self.data.resize(total, T::default());

        debug!(
            "Growing matrix rows from {} to {}",
            self.row_capacity, new_rows
        );
        self.row_capacity = new_rows;

        Ok(())
    }

    /// Doubles the number of columns and reflows every row into the new
    /// stride, so each value stays at its `(row, col)` coordinate.
    pub fn grow_columns(&mut self) -> Result<(), GrowError> {
        let new_cols = next_capacity(self.col_capacity).ok_or(GrowError::CapacityOverflow)?;
        let total = self
            .row_capacity
            .checked_mul(new_cols)
            .ok_or(GrowError::CapacityOverflow)?;

        let mut data = Vec::new();
        reserve_exact(&mut data, total)?;
        data.resize(total, T::default());
        if self.col_capacity > 0 {
            for (old_row, new_row) in self
                .data
                .chunks_exact(self.col_capacity)
                .zip(data.chunks_exact_mut(new_cols))
            {
                new_row[..old_row.len()].copy_from_slice(old_row);
            }
        }

        debug!(
            "Growing matrix columns from {} to {} ({} rows reflowed)",
            self.col_capacity, new_cols, self.row_capacity
        );
        self.data = data;
        self.col_capacity = new_cols;

        Ok(())
    }

    /// Grows the matrix until `(row, col)` is addressable. Returns the number
    /// of grow operations performed.
    pub fn ensure(&mut self, row: usize, col: usize) -> Result<usize, GrowError> {
        let mut grows = 0;
        while row >= self.row_capacity {
            self.grow_rows()?;
            grows += 1;
        }
        while col >= self.col_capacity {
            self.grow_columns()?;
            grows += 1;
        }

        Ok(grows)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.row_capacity && col < self.col_capacity);
        self.data[row * self.col_capacity + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        debug_assert!(row < self.row_capacity && col < self.col_capacity);
        self.data[row * self.col_capacity + col] = value;
    }

    /// Returns the full row, including unused trailing columns.
    #[inline]
    #[must_use]
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.col_capacity;
        &self.data[start..start + self.col_capacity]
    }
}

#[cfg(test)]
mod tests {
    use crate::growable::{next_capacity, GrowError, GrowableBuffer, GrowableMatrix};

    #[test]
    fn test_next_capacity() {
        assert_eq!(next_capacity(0), Some(1));
        assert_eq!(next_capacity(10), Some(20));
        assert_eq!(next_capacity(usize::MAX), None);
    }

    #[test]
    fn buffer_push_doubles_capacity() {
        let mut buffer = GrowableBuffer::with_capacity(3).unwrap();
        for value in 0..7 {
            buffer.push(value).unwrap();
        }

        assert_eq!(buffer.capacity(), 12);
        assert_eq!(buffer.as_slice(), &[0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn buffer_grows_from_zero_capacity() {
        let mut buffer = GrowableBuffer::with_capacity(0).unwrap();
        buffer.push('a').unwrap();
        buffer.push('b').unwrap();

        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer[1], 'b');
    }

    #[test]
    fn buffer_reserve() {
        let mut buffer: GrowableBuffer<u8> = GrowableBuffer::with_capacity(2).unwrap();
        buffer.reserve(9).unwrap();

        assert_eq!(buffer.capacity(), 16);
        assert!(buffer.is_empty());
    }

    #[test]
    fn buffer_take_resets_to_initial_capacity() {
        let mut buffer = GrowableBuffer::with_capacity(1).unwrap();
        buffer.push(1).unwrap();
        buffer.push(2).unwrap();
        buffer.push(3).unwrap();

        let taken = buffer.take().unwrap();
        buffer.push(4).unwrap();

        assert_eq!(taken, vec![1, 2, 3]);
        assert_eq!(buffer.as_slice(), &[4]);
        assert_eq!(buffer.capacity(), 1);
    }

    #[test]
    fn buffer_clear_keeps_capacity() {
        let mut buffer = GrowableBuffer::with_capacity(1).unwrap();
        buffer.push(1).unwrap();
        buffer.push(2).unwrap();
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);
    }

    #[test]
    fn matrix_starts_zeroed() {
        let matrix: GrowableMatrix<u32> = GrowableMatrix::new(2, 3).unwrap();

        assert_eq!(matrix.row(0), &[0, 0, 0]);
        assert_eq!(matrix.row(1), &[0, 0, 0]);
    }

    #[test]
    fn grow_columns_preserves_values() {
        let mut matrix = GrowableMatrix::new(3, 2).unwrap();
        for row in 0..3 {
            for col in 0..2 {
                matrix.set(row, col, (row * 10 + col) as u32);
            }
        }

        matrix.grow_columns().unwrap();

        assert_eq!(matrix.col_capacity(), 4);
        for row in 0..3 {
            for col in 0..2 {
                assert_eq!(matrix.get(row, col), (row * 10 + col) as u32);
            }
            assert_eq!(matrix.get(row, 2), 0);
            assert_eq!(matrix.get(row, 3), 0);
        }
    }

    #[test]
    fn grow_rows_preserves_values_and_adds_usable_rows() {
        let mut matrix = GrowableMatrix::new(2, 2).unwrap();
        matrix.set(0, 0, 1u32);
        matrix.set(1, 1, 2);

        matrix.grow_rows().unwrap();
        matrix.set(3, 1, 7);

        assert_eq!(matrix.row_capacity(), 4);
        assert_eq!(matrix.row(0), &[1, 0]);
        assert_eq!(matrix.row(1), &[0, 2]);
        assert_eq!(matrix.row(2), &[0, 0]);
        assert_eq!(matrix.row(3), &[0, 7]);
    }

    #[test]
    fn ensure_grows_both_axes() {
        let mut matrix = GrowableMatrix::new(1, 1).unwrap();
        matrix.set(0, 0, 9u32);

        let grows = matrix.ensure(4, 2).unwrap();
        matrix.set(4, 2, 5);

        assert_eq!(grows, 5);
        assert_eq!(matrix.row_capacity(), 8);
        assert_eq!(matrix.col_capacity(), 4);
        assert_eq!(matrix.get(0, 0), 9);
        assert_eq!(matrix.get(4, 2), 5);
    }

    #[test]
    fn grow_columns_of_empty_matrix() {
        let mut matrix: GrowableMatrix<u32> = GrowableMatrix::new(2, 0).unwrap();
        matrix.grow_columns().unwrap();

        assert_eq!(matrix.col_capacity(), 1);
        assert_eq!(matrix.row(1), &[0]);
    }

    #[test]
    fn new_rejects_overflowing_size() {
        let result: Result<GrowableMatrix<u8>, _> = GrowableMatrix::new(usize::MAX, 2);

        assert!(matches!(result, Err(GrowError::CapacityOverflow)));
    }
}
