//! Low-level primitives for arena memory operations.
//!
//! This is the only module in `gyre-arena` allowed to contain `unsafe`.
//! Everything it exports is a safe, bounds-checked wrapper:
//!
//! - [`RawBuffer`]: the flat element buffer behind one arena, either a
//!   boxed slice (heap backing) or a raw zeroed allocation from the global
//!   allocator (off-heap backing).
//! - [`ElementPtr`]: a non-owning, copyable pointer into a `RawBuffer`
//!   used by mapped views. Every read and write checks the index.
//! - [`OffHeap`]: an owning pointer to a single value in its own raw
//!   allocation, freed exactly once on drop.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use gyre_core::{AllocError, Scalar};

/// Where a [`RawBuffer`]'s storage came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backing {
    /// A `Box<[T]>` released through `Box::from_raw`.
    Heap,
    /// A raw `alloc_zeroed` released through `dealloc`.
    OffHeap,
}

/// Fixed-length element storage owned by exactly one arena.
///
/// Elements are only ever accessed through `ElementPtr`s, never through
/// Rust references, so views may alias freely.
pub struct RawBuffer<T: Scalar> {
    ptr: NonNull<T>,
    len: usize,
    backing: Backing,
}

// SAFETY: a RawBuffer exclusively owns its allocation. It is moved between
// threads only together with the arena and views that point into it (all
// owned by one factory), and those are !Sync, so no two threads ever touch
// the elements at the same time.
unsafe impl<T: Scalar> Send for RawBuffer<T> {}

impl<T: Scalar> RawBuffer<T> {
    /// Allocate a zeroed buffer of `len` elements as a boxed slice.
    pub fn heap(len: usize) -> Self {
        let boxed: Box<[T]> = vec![T::ZERO; len].into_boxed_slice();
        let ptr = NonNull::from(Box::leak(boxed)).cast::<T>();
        Self {
            ptr,
            len,
            backing: Backing::Heap,
        }
    }

    /// Allocate a zeroed buffer of `len` elements outside any `Box`.
    ///
    /// Returns [`AllocError::AllocationFailed`] if the layout is invalid or
    /// the global allocator refuses the request.
    pub fn off_heap(len: usize) -> Result<Self, AllocError> {
        let layout = Layout::array::<T>(len).map_err(|_| AllocError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            align: std::mem::align_of::<T>(),
        })?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: layout has non-zero size. Zero bits are a valid f32/f64.
            let raw = unsafe { alloc::alloc_zeroed(layout) }.cast::<T>();
            NonNull::new(raw).ok_or(AllocError::AllocationFailed {
                bytes: layout.size(),
                align: layout.align(),
            })?
        };
        tracing::trace!(
            bytes = layout.size(),
            elements = len,
            "off-heap buffer allocated"
        );
        Ok(Self {
            ptr,
            len,
            backing: Backing::OffHeap,
        })
    }

    /// Element capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Where the storage came from.
    pub fn backing(&self) -> Backing {
        self.backing
    }

    /// Size of the storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// A non-owning pointer covering the whole buffer.
    pub(crate) fn elements(&self) -> ElementPtr<T> {
        ElementPtr {
            ptr: self.ptr,
            len: self.len,
        }
    }
}

impl<T: Scalar> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        match self.backing {
            Backing::Heap => {
                let slice = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
                // SAFETY: ptr/len came from Box::leak of a Box<[T]> of this length
                // and are released exactly once, here.
                drop(unsafe { Box::from_raw(slice) });
            }
            Backing::OffHeap => {
                let Ok(layout) = Layout::array::<T>(self.len) else {
                    return;
                };
                if layout.size() != 0 {
                    // SAFETY: allocated in off_heap() with this same layout.
                    unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
                }
                tracing::trace!(bytes = layout.size(), "off-heap buffer freed");
            }
        }
    }
}

impl<T: Scalar> fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("len", &self.len)
            .field("backing", &self.backing)
            .finish()
    }
}

/// Non-owning pointer to a [`RawBuffer`]'s elements.
///
/// Valid for as long as the owning buffer is alive. The crate guarantees
/// that by only storing `ElementPtr`s inside views that live in the same
/// factory as the buffer, and by only lending those views out by reference.
#[derive(Clone, Copy)]
pub(crate) struct ElementPtr<T: Scalar> {
    ptr: NonNull<T>,
    len: usize,
}

// SAFETY: see RawBuffer. An ElementPtr never leaves the factory that owns
// its buffer except behind a shared borrow of a !Sync view.
unsafe impl<T: Scalar> Send for ElementPtr<T> {}

impl<T: Scalar> ElementPtr<T> {
    /// Capacity of the underlying buffer in elements.
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Read the element at absolute position `index`.
    #[inline]
    pub fn read(&self, index: usize) -> T {
        assert!(
            index < self.len,
            "element {index} outside arena of {}",
            self.len
        );
        // SAFETY: index is in bounds; the buffer is alive and initialised.
        unsafe { self.ptr.as_ptr().add(index).read() }
    }

    /// Write the element at absolute position `index`.
    #[inline]
    pub fn write(&self, index: usize, value: T) {
        assert!(
            index < self.len,
            "element {index} outside arena of {}",
            self.len
        );
        // SAFETY: index is in bounds; no Rust reference to the element exists.
        unsafe { self.ptr.as_ptr().add(index).write(value) }
    }

    /// Copy `dest.len()` elements starting at absolute position `start`.
    pub fn copy_out(&self, start: usize, dest: &mut [T]) {
        let end = start.checked_add(dest.len()).filter(|&end| end <= self.len);
        assert!(
            end.is_some(),
            "copy of {} elements at {start} outside arena of {}",
            dest.len(),
            self.len
        );
        // SAFETY: source range is in bounds; dest is a distinct &mut slice, so
        // the ranges cannot overlap.
        unsafe {
            ptr::copy_nonoverlapping(
                self.ptr.as_ptr().add(start),
                dest.as_mut_ptr(),
                dest.len(),
            );
        }
    }

    /// Copy `src` into the buffer starting at absolute position `start`.
    pub fn copy_in(&self, start: usize, src: &[T]) {
        let end = start.checked_add(src.len()).filter(|&end| end <= self.len);
        assert!(
            end.is_some(),
            "copy of {} elements at {start} outside arena of {}",
            src.len(),
            self.len
        );
        // SAFETY: destination range is in bounds; src is a Rust slice that
        // cannot point into the arena, which is never borrowed as a slice.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.as_ptr().add(start), src.len());
        }
    }
}

/// An owning pointer to one value in its own raw allocation.
///
/// Created by an explicit allocation that can fail, freed exactly once when
/// dropped. [`OffHeap::leak`] and [`OffHeap::into_raw`] are the escape
/// hatches for storage that has to outlive the handle.
pub struct OffHeap<T> {
    ptr: NonNull<T>,
    _owns: PhantomData<T>,
}

// SAFETY: OffHeap<T> owns its T like Box<T> does.
unsafe impl<T: Send> Send for OffHeap<T> {}
// SAFETY: as above; shared access only hands out &T.
unsafe impl<T: Sync> Sync for OffHeap<T> {}

impl<T> OffHeap<T> {
    /// Move `value` into a fresh raw allocation.
    pub fn new(value: T) -> Result<Self, AllocError> {
        let layout = Layout::new::<T>();
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: layout has non-zero size.
            let raw = unsafe { alloc::alloc(layout) }.cast::<T>();
            NonNull::new(raw).ok_or(AllocError::AllocationFailed {
                bytes: layout.size(),
                align: layout.align(),
            })?
        };
        // SAFETY: ptr is valid for writes of T and properly aligned.
        unsafe { ptr.as_ptr().write(value) };
        Ok(Self {
            ptr,
            _owns: PhantomData,
        })
    }

    /// The raw address of the value.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Give up ownership without freeing. The value lives until process exit.
    pub fn leak(self) -> &'static mut T
    where
        T: 'static,
    {
        let ptr = self.into_raw();
        // SAFETY: ownership was released by into_raw; nothing will free it.
        unsafe { &mut *ptr.as_ptr() }
    }

    /// Give up ownership, returning the raw pointer.
    ///
    /// The caller becomes responsible for eventually passing it to
    /// [`OffHeap::from_raw`] exactly once.
    pub fn into_raw(self) -> NonNull<T> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    /// Re-take ownership of a pointer produced by [`OffHeap::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` and must not have been passed to
    /// `from_raw` before. Violating this is a double free.
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self {
            ptr,
            _owns: PhantomData,
        }
    }
}

impl<T> Deref for OffHeap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr is valid and initialised for the life of self.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for OffHeap<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in deref; &mut self guarantees uniqueness.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for OffHeap<T> {
    fn drop(&mut self) {
        let layout = Layout::new::<T>();
        // SAFETY: the value is initialised and owned; it is dropped once and
        // the allocation (if any) is released with the layout it was made with.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            if layout.size() != 0 {
                alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OffHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OffHeap").field(&**self).finish()
    }
}
