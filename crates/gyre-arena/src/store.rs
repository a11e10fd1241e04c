//! Per-precision state of a recycling factory: one arena plus one slot
//! ring per shape family.

use std::ops::Deref;

use gyre_core::{AllocError, PerPrecision, Precision, Scalar, Shape, ShapeKind};

use crate::arena::{Arena, WrapMode};
use crate::config::CacheConfig;
use crate::raw::OffHeap;
use crate::ring::SlotRing;
use crate::view::MappedView;

/// How a factory stores its arenas and cached views.
pub trait SlotFamily {
    /// Strategy name used in diagnostics.
    const NAME: &'static str;

    /// Owning handle for one cached view.
    type Slot<T: Scalar>: Deref<Target = MappedView<T>> + Send;

    /// Move a freshly built view into its slot storage.
    fn make<T: Scalar>(view: MappedView<T>) -> Result<Self::Slot<T>, AllocError>;

    /// Build the arena for one precision.
    fn arena<T: Scalar>(capacity: usize) -> Result<Arena<T>, AllocError>;
}

/// Views in boxes, arenas in boxed slices, cursor rewinds on wrap.
#[derive(Debug)]
pub struct HeapSlots;

impl SlotFamily for HeapSlots {
    const NAME: &'static str = "cyclic";

    type Slot<T: Scalar> = Box<MappedView<T>>;

    fn make<T: Scalar>(view: MappedView<T>) -> Result<Box<MappedView<T>>, AllocError> {
        Ok(Box::new(view))
    }

    fn arena<T: Scalar>(capacity: usize) -> Result<Arena<T>, AllocError> {
        Ok(Arena::new(capacity, WrapMode::Rewind))
    }
}

/// Every view and both arenas in individual raw allocations.
#[derive(Debug)]
pub struct OffHeapSlots;

impl SlotFamily for OffHeapSlots {
    const NAME: &'static str = "off-heap";

    type Slot<T: Scalar> = OffHeap<MappedView<T>>;

    fn make<T: Scalar>(view: MappedView<T>) -> Result<OffHeap<MappedView<T>>, AllocError> {
        OffHeap::new(view)
    }

    fn arena<T: Scalar>(capacity: usize) -> Result<Arena<T>, AllocError> {
        Arena::off_heap(capacity)
    }
}

/// Cursor and ring positions of one precision, captured by a save point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreMark {
    cursor: usize,
    positions: [usize; ShapeKind::COUNT],
}

/// One precision's arena and its eight rings.
pub struct PrecisionStore<T: Scalar, F: SlotFamily> {
    arena: Arena<T>,
    rings: Box<[SlotRing<F::Slot<T>>]>,
}

impl<T: Scalar, F: SlotFamily> PrecisionStore<T, F> {
    /// Build the arena and pre-construct every ring view.
    ///
    /// On failure everything built so far is dropped, which for the
    /// off-heap family frees each raw allocation.
    pub fn new(config: &CacheConfig) -> Result<Self, AllocError> {
        let arena = F::arena::<T>(config.arena_capacity(T::PRECISION))?;
        let elements = arena.elements();
        let mut rings = Vec::with_capacity(ShapeKind::COUNT);
        for kind in ShapeKind::ALL {
            let shape = initial_shape(kind);
            let slots = (0..config.ring_len(kind, T::PRECISION))
                .map(|_| F::make(MappedView::new(elements, shape)))
                .collect::<Result<Vec<_>, _>>()?;
            rings.push(SlotRing::new(slots));
        }
        Ok(Self {
            arena,
            rings: rings.into_boxed_slice(),
        })
    }

    /// Issue the next view for `shape`, rejecting N-ary shapes that cannot
    /// fit the arena.
    pub fn next(&self, shape: Shape) -> Result<&MappedView<T>, AllocError> {
        let capacity = self.arena.capacity();
        if shape.len() > capacity {
            return Err(AllocError::ShapeTooLarge {
                shape,
                len: shape.len(),
                capacity,
            });
        }
        Ok(self.issue(shape))
    }

    /// Issue the next view for a shape known to fit.
    #[inline]
    pub(crate) fn issue(&self, shape: Shape) -> &MappedView<T> {
        let ring = &self.rings[shape.kind().index()];
        let view: &MappedView<T> = ring.slot(ring.next_slot());
        let offset = self.arena.allocate(shape.len());
        view.rebind(offset, shape);
        view
    }

    /// The arena.
    pub fn arena(&self) -> &Arena<T> {
        &self.arena
    }

    /// The ring for `kind`.
    pub fn ring(&self, kind: ShapeKind) -> &SlotRing<F::Slot<T>> {
        &self.rings[kind.index()]
    }

    /// Total cached views across all rings.
    pub fn slot_count(&self) -> usize {
        self.rings.iter().map(SlotRing::len).sum()
    }

    pub(crate) fn mark(&self) -> StoreMark {
        let mut positions = [0; ShapeKind::COUNT];
        for (position, ring) in positions.iter_mut().zip(self.rings.iter()) {
            *position = ring.position();
        }
        StoreMark {
            cursor: self.arena.cursor(),
            positions,
        }
    }

    pub(crate) fn rewind(&self, mark: &StoreMark) {
        self.arena.set_cursor(mark.cursor);
        for (ring, &position) in self.rings.iter().zip(mark.positions.iter()) {
            ring.set_position(position);
        }
    }
}

fn initial_shape(kind: ShapeKind) -> Shape {
    match kind.fixed_shape() {
        Some(shape) => shape,
        None if kind == ShapeKind::MatN => Shape::MatN(0),
        None => Shape::VecN(0),
    }
}

/// Both precision halves of a factory.
pub struct DualStore<F: SlotFamily> {
    single: PrecisionStore<f32, F>,
    double: PrecisionStore<f64, F>,
}

impl<F: SlotFamily> DualStore<F> {
    /// Build both halves from one config.
    pub fn new(config: &CacheConfig) -> Result<Self, AllocError> {
        Ok(Self {
            single: PrecisionStore::new(config)?,
            double: PrecisionStore::new(config)?,
        })
    }

    /// Arena cursor for `precision`.
    pub fn cursor(&self, precision: Precision) -> usize {
        match precision {
            Precision::Single => self.single.arena.cursor(),
            Precision::Double => self.double.arena.cursor(),
        }
    }

    /// Arena capacity in elements for `precision`.
    pub fn capacity(&self, precision: Precision) -> usize {
        match precision {
            Precision::Single => self.single.arena.capacity(),
            Precision::Double => self.double.arena.capacity(),
        }
    }

    /// Ring length for `kind` at `precision`.
    pub fn ring_len(&self, kind: ShapeKind, precision: Precision) -> usize {
        match precision {
            Precision::Single => self.single.ring(kind).len(),
            Precision::Double => self.double.ring(kind).len(),
        }
    }

    /// Arena bytes across both precisions.
    pub fn memory_bytes(&self) -> usize {
        self.single.arena.memory_bytes() + self.double.arena.memory_bytes()
    }

    /// Cached views across both precisions.
    pub fn slot_count(&self) -> usize {
        self.single.slot_count() + self.double.slot_count()
    }

    pub(crate) fn mark(&self) -> [StoreMark; 2] {
        [self.single.mark(), self.double.mark()]
    }

    pub(crate) fn rewind(&self, marks: &[StoreMark; 2]) {
        self.single.rewind(&marks[0]);
        self.double.rewind(&marks[1]);
    }
}

impl<F: SlotFamily> PerPrecision for DualStore<F> {
    type Of<T: Scalar> = PrecisionStore<T, F>;

    fn single(&self) -> &PrecisionStore<f32, F> {
        &self.single
    }

    fn double(&self) -> &PrecisionStore<f64, F> {
        &self.double
    }
}
