//! Mapped views: non-owning, remappable windows into an arena.
//!
//! A [`MappedView`] is a pointer into an arena buffer plus a current
//! element offset and shape. Factories build every view up front and
//! remap them on each issue, so handing one out costs a ring step, a
//! cursor bump and two `Cell` writes. Views never own storage and are
//! only lent out by shared reference, which ties their lifetime to the
//! factory that owns the arena.
//!
//! All element access goes through `&self`: a view is a window onto
//! shared storage that other views may alias after a wrap, so Rust
//! `&mut` exclusivity would be a lie.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;

use gyre_core::traits::flat_index;
use gyre_core::{AllocError, ElementAccess, Scalar, Shape};
use smallvec::SmallVec;

use crate::owned::OwnedAggregate;
use crate::raw::ElementPtr;

/// A remappable view of `shape.len()` contiguous arena elements.
pub struct MappedView<T: Scalar> {
    elements: ElementPtr<T>,
    offset: Cell<usize>,
    shape: Cell<Shape>,
    saved: RefCell<SmallVec<[usize; 4]>>,
}

impl<T: Scalar> MappedView<T> {
    pub(crate) fn new(elements: ElementPtr<T>, shape: Shape) -> Self {
        assert!(
            shape.len() <= elements.capacity(),
            "{shape} does not fit an arena of {}",
            elements.capacity()
        );
        Self {
            elements,
            offset: Cell::new(0),
            shape: Cell::new(shape),
            saved: RefCell::new(SmallVec::new()),
        }
    }

    /// Current shape.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape.get()
    }

    /// Element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.get().len()
    }

    /// Whether the view covers no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current element offset into the arena.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset.get()
    }

    /// Capacity of the arena this view points into.
    pub fn arena_capacity(&self) -> usize {
        self.elements.capacity()
    }

    /// Rebind the view to `offset`. O(1); element values are not copied.
    ///
    /// # Panics
    ///
    /// Panics if the view would extend past the end of the arena.
    pub fn remap(&self, offset: usize) {
        self.check_range(offset, self.len());
        self.offset.set(offset);
    }

    pub(crate) fn rebind(&self, offset: usize, shape: Shape) {
        self.check_range(offset, shape.len());
        self.shape.set(shape);
        self.offset.set(offset);
    }

    /// Move the offset by `delta` elements.
    ///
    /// Ring and arena bookkeeping are not touched; this is for stepping a
    /// view across adjacent aggregates the caller laid out itself.
    ///
    /// # Panics
    ///
    /// Panics if the result would leave the arena.
    pub fn shift(&self, delta: isize) {
        let Some(offset) = self.offset.get().checked_add_signed(delta) else {
            panic!(
                "shifting offset {} by {delta} leaves the arena",
                self.offset.get()
            );
        };
        self.remap(offset);
    }

    /// Save the current offset.
    pub fn push(&self) {
        self.saved.borrow_mut().push(self.offset.get());
    }

    /// Restore the most recently saved offset.
    ///
    /// # Panics
    ///
    /// Panics if nothing was saved. Use [`try_pop`](Self::try_pop) for a
    /// checked variant.
    pub fn pop(&self) {
        if self.try_pop().is_err() {
            panic!("pop without a matching push on a {} view", self.shape());
        }
    }

    /// Restore the most recently saved offset, or report an unbalanced
    /// scope.
    pub fn try_pop(&self) -> Result<(), AllocError> {
        let offset = self
            .saved
            .borrow_mut()
            .pop()
            .ok_or(AllocError::ScopeUnderflow)?;
        self.remap(offset);
        Ok(())
    }

    /// Number of saved offsets.
    pub fn depth(&self) -> usize {
        self.saved.borrow().len()
    }

    /// Read element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.elements.read(self.absolute(index))
    }

    /// Write element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&self, index: usize, value: T) {
        self.elements.write(self.absolute(index), value);
    }

    /// Read the element at `(row, col)`, row-major.
    pub fn get_at(&self, row: usize, col: usize) -> T {
        self.get(flat_index(self.shape(), row, col))
    }

    /// Write the element at `(row, col)`, row-major.
    pub fn set_at(&self, row: usize, col: usize, value: T) {
        self.set(flat_index(self.shape(), row, col), value);
    }

    /// Copy the first `len` elements into `dest[dest_offset..dest_offset + len]`.
    pub fn copy_to_slice(&self, dest: &mut [T], dest_offset: usize, len: usize) {
        assert!(
            len <= self.len(),
            "copy of {len} elements from a {} view",
            self.shape()
        );
        self.elements
            .copy_out(self.offset(), &mut dest[dest_offset..dest_offset + len]);
    }

    /// Overwrite every element from `src`.
    pub fn copy_from_slice(&self, src: &[T]) {
        assert_eq!(
            src.len(),
            self.len(),
            "source length does not match a {} view",
            self.shape()
        );
        self.elements.copy_in(self.offset(), src);
    }

    /// Set every element to `value`.
    pub fn fill(&self, value: T) {
        let start = self.offset();
        for index in start..start + self.len() {
            self.elements.write(index, value);
        }
    }

    /// A sub-view of `len` elements starting at element `start`.
    ///
    /// The window aliases this view's current storage; it does not follow
    /// later remaps.
    pub fn window(&self, start: usize, len: usize) -> ViewWindow<'_, T> {
        assert!(
            start.checked_add(len).is_some_and(|end| end <= self.len()),
            "window of {len} at {start} outside a {} view",
            self.shape()
        );
        ViewWindow {
            elements: self.elements,
            base: self.offset() + start,
            shape: Shape::vector(len as u32),
            _view: PhantomData,
        }
    }

    /// Row `r` of a matrix as a vector window. For a vector, row 0 is the
    /// whole view.
    pub fn row(&self, r: usize) -> ViewWindow<'_, T> {
        let shape = self.shape();
        assert!(r < shape.rows(), "row {r} outside {shape}");
        self.window(r * shape.cols(), shape.cols())
    }

    /// Copy the current contents out into an aggregate that will not be
    /// recycled.
    pub fn detach(&self) -> OwnedAggregate<T> {
        OwnedAggregate::copy_of(&self)
    }

    /// Collect the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::ZERO; self.len()];
        self.copy_to_slice(&mut out, 0, self.len());
        out
    }

    #[inline]
    fn absolute(&self, index: usize) -> usize {
        let shape = self.shape.get();
        assert!(
            index < shape.len(),
            "index {index} out of range for {shape}"
        );
        self.offset.get() + index
    }

    fn check_range(&self, offset: usize, len: usize) {
        let capacity = self.elements.capacity();
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= capacity),
            "view of {len} elements at {offset} outside arena of {capacity}"
        );
    }
}

impl<T: Scalar> fmt::Debug for MappedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedView")
            .field("shape", &self.shape())
            .field("offset", &self.offset())
            .field("depth", &self.depth())
            .finish()
    }
}

impl<T: Scalar> ElementAccess<T> for &MappedView<T> {
    fn shape(&self) -> Shape {
        MappedView::shape(self)
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        MappedView::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        MappedView::set(self, index, value);
    }

    fn copy_to_slice(&self, dest: &mut [T], dest_offset: usize, len: usize) {
        MappedView::copy_to_slice(self, dest, dest_offset, len);
    }

    fn copy_from_slice(&mut self, src: &[T]) {
        MappedView::copy_from_slice(self, src);
    }

    fn fill(&mut self, value: T) {
        MappedView::fill(self, value);
    }
}

/// A fixed sub-range of a [`MappedView`], addressed from 0.
///
/// Captures the absolute arena position at creation, so it keeps pointing
/// at the same elements if the parent view is later remapped.
pub struct ViewWindow<'a, T: Scalar> {
    elements: ElementPtr<T>,
    base: usize,
    shape: Shape,
    _view: PhantomData<&'a MappedView<T>>,
}

impl<T: Scalar> ViewWindow<'_, T> {
    /// Absolute arena offset of element 0.
    pub fn offset(&self) -> usize {
        self.base
    }

    fn absolute(&self, index: usize) -> usize {
        assert!(
            index < self.shape.len(),
            "index {index} out of range for a {} window",
            self.shape
        );
        self.base + index
    }
}

impl<T: Scalar> ElementAccess<T> for ViewWindow<'_, T> {
    fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        self.elements.read(self.absolute(index))
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self.elements.write(self.absolute(index), value);
    }
}

impl<T: Scalar> fmt::Debug for ViewWindow<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewWindow")
            .field("shape", &self.shape)
            .field("offset", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawBuffer;

    fn view_over(buffer: &RawBuffer<f32>, shape: Shape) -> MappedView<f32> {
        MappedView::new(buffer.elements(), shape)
    }

    #[test]
    fn remap_rebinds_without_copying() {
        let buffer = RawBuffer::<f32>::heap(16);
        let view = view_over(&buffer, Shape::Vec4);
        view.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        view.remap(4);
        assert_eq!(view.to_vec(), vec![0.0; 4]);
        view.remap(2);
        assert_eq!(view.to_vec(), vec![3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "outside arena")]
    fn remap_past_end_panics() {
        let buffer = RawBuffer::<f32>::heap(8);
        let view = view_over(&buffer, Shape::Vec4);
        view.remap(5);
    }

    #[test]
    fn shift_steps_between_neighbours() {
        let buffer = RawBuffer::<f64>::heap(12);
        let view = MappedView::new(buffer.elements(), Shape::Vec3);
        view.shift(3);
        view.shift(6);
        assert_eq!(view.offset(), 9);
        view.shift(-9);
        assert_eq!(view.offset(), 0);
    }

    #[test]
    #[should_panic(expected = "leaves the arena")]
    fn shift_below_zero_panics() {
        let buffer = RawBuffer::<f32>::heap(8);
        view_over(&buffer, Shape::Vec2).shift(-1);
    }

    #[test]
    fn push_pop_nests() {
        let buffer = RawBuffer::<f32>::heap(64);
        let view = view_over(&buffer, Shape::Vec2);
        for offset in [4, 8, 12, 16, 20, 24] {
            view.push();
            view.remap(offset);
        }
        assert_eq!(view.depth(), 6);
        for expected in [20, 16, 12, 8, 4, 0] {
            view.pop();
            assert_eq!(view.offset(), expected);
        }
        assert_eq!(view.depth(), 0);
    }

    #[test]
    fn try_pop_reports_underflow() {
        let buffer = RawBuffer::<f32>::heap(8);
        let view = view_over(&buffer, Shape::Vec2);
        assert_eq!(view.try_pop(), Err(AllocError::ScopeUnderflow));
    }

    #[test]
    #[should_panic(expected = "pop without a matching push")]
    fn unbalanced_pop_panics() {
        let buffer = RawBuffer::<f32>::heap(8);
        view_over(&buffer, Shape::Vec2).pop();
    }

    #[test]
    #[should_panic(expected = "out of range for vec3")]
    fn index_past_shape_panics() {
        let buffer = RawBuffer::<f32>::heap(8);
        view_over(&buffer, Shape::Vec3).get(3);
    }

    #[test]
    fn matrix_rows_alias_parent() {
        let buffer = RawBuffer::<f32>::heap(32);
        let view = view_over(&buffer, Shape::Mat3);
        view.remap(5);
        for i in 0..9 {
            view.set(i, i as f32);
        }
        let mut middle = view.row(1);
        assert_eq!(middle.shape(), Shape::Vec3);
        assert_eq!(middle.to_vec(), vec![3.0, 4.0, 5.0]);
        middle.set(2, 50.0);
        assert_eq!(view.get_at(1, 2), 50.0);
    }

    #[test]
    fn window_keeps_its_position_after_remap() {
        let buffer = RawBuffer::<f32>::heap(16);
        let view = view_over(&buffer, Shape::Vec4);
        view.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let window = view.window(1, 2);
        view.remap(8);
        assert_eq!(window.to_vec(), vec![2.0, 3.0]);
        assert_eq!(window.offset(), 1);
    }

    #[test]
    #[should_panic(expected = "outside a vec4 view")]
    fn window_length_overflow_panics() {
        let buffer = RawBuffer::<f32>::heap(16);
        let view = view_over(&buffer, Shape::Vec4);
        view.window(2, usize::MAX);
    }

    #[test]
    fn detach_survives_overwrite() {
        let buffer = RawBuffer::<f64>::heap(8);
        let view = MappedView::new(buffer.elements(), Shape::Vec2);
        view.copy_from_slice(&[1.5, 2.5]);
        let owned = view.detach();
        view.fill(0.0);
        assert_eq!(owned.as_slice(), &[1.5, 2.5]);
    }

    #[test]
    fn trait_access_through_reference() {
        let buffer = RawBuffer::<f32>::heap(8);
        let view = view_over(&buffer, Shape::Vec2);
        let mut handle: &MappedView<f32> = &view;
        ElementAccess::set(&mut handle, 1, 7.0);
        let mut out = [0.0f32; 4];
        ElementAccess::copy_to_slice(&handle, &mut out, 1, 2);
        assert_eq!(out, [0.0, 0.0, 7.0, 0.0]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pop_restores_every_pushed_offset(
                offsets in proptest::collection::vec(0usize..60, 1..32),
            ) {
                let buffer = RawBuffer::<f32>::heap(64);
                let view = view_over(&buffer, Shape::Vec4);
                let mut expected = Vec::new();
                for &offset in &offsets {
                    expected.push(view.offset());
                    view.push();
                    view.remap(offset);
                }
                while let Some(offset) = expected.pop() {
                    view.pop();
                    prop_assert_eq!(view.offset(), offset);
                }
                prop_assert_eq!(view.depth(), 0);
            }
        }
    }
}
