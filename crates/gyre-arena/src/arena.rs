//! Flat element storage with a wrapping write cursor.
//!
//! An [`Arena`] never runs out: when the next allocation would not fit,
//! the cursor wraps and early storage is handed out again. Whoever still
//! holds a view into that storage sees it overwritten. That is the
//! contract, not an error path.

use std::cell::Cell;

use gyre_core::{AllocError, Scalar};

use crate::raw::{Backing, ElementPtr, RawBuffer};

/// How the cursor wraps when an allocation would run past the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    /// Cursor returns to 0 as soon as the following allocation of the
    /// same size could not fit. Used by the cyclic factory.
    Rewind,
    /// Cursor jumps to `len` and the allocation is placed at offset 0.
    /// Used by the off-heap factory.
    Reserve,
}

/// Fixed-capacity element storage for one precision.
///
/// Not synchronized: the cursor is a plain `Cell`. An arena belongs to
/// exactly one factory, and a factory to exactly one thread at a time.
pub struct Arena<T: Scalar> {
    buffer: RawBuffer<T>,
    cursor: Cell<usize>,
    wrap: WrapMode,
}

impl<T: Scalar> Arena<T> {
    /// Create a heap-backed arena of `capacity` zeroed elements.
    pub fn new(capacity: usize, wrap: WrapMode) -> Self {
        Self {
            buffer: RawBuffer::heap(capacity),
            cursor: Cell::new(0),
            wrap,
        }
    }

    /// Create an arena whose buffer is a raw off-heap allocation.
    pub fn off_heap(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            buffer: RawBuffer::off_heap(capacity)?,
            cursor: Cell::new(0),
            wrap: WrapMode::Reserve,
        })
    }

    /// Reserve `len` contiguous elements and return their starting offset.
    ///
    /// The returned range `offset..offset + len` is always inside the
    /// arena. It may overlap ranges returned earlier once the cursor has
    /// wrapped.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity. Factories check N-ary shapes
    /// before calling; fixed shapes always fit a validated config.
    pub fn allocate(&self, len: usize) -> usize {
        let capacity = self.capacity();
        assert!(
            len <= capacity,
            "allocation of {len} elements exceeds arena capacity {capacity}"
        );
        let cursor = self.cursor.get();
        match self.wrap {
            WrapMode::Rewind => {
                // A smaller shape may have left the cursor where this one
                // no longer fits.
                let offset = if cursor + len > capacity { 0 } else { cursor };
                let mut next = offset + len;
                if next > capacity - len {
                    next = 0;
                }
                self.cursor.set(next);
                offset
            }
            WrapMode::Reserve => {
                let mut end = cursor + len;
                if end > capacity {
                    end = len;
                }
                self.cursor.set(end);
                end - len
            }
        }
    }

    /// Current cursor position in elements.
    pub fn cursor(&self) -> usize {
        self.cursor.get()
    }

    /// Move the cursor. Used to rewind to a save point.
    pub(crate) fn set_cursor(&self, cursor: usize) {
        debug_assert!(cursor <= self.capacity());
        self.cursor.set(cursor);
    }

    /// Reset the cursor to zero without touching the storage.
    pub fn reset(&self) {
        self.cursor.set(0);
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The wrap discipline.
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap
    }

    /// Where the storage came from.
    pub fn backing(&self) -> Backing {
        self.buffer.backing()
    }

    /// Storage size in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.buffer.memory_bytes()
    }

    pub(crate) fn elements(&self) -> ElementPtr<T> {
        self.buffer.elements()
    }
}
