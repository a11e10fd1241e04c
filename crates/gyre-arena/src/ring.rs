//! Fixed-length round-robin slot rings.

use std::cell::Cell;

/// A fixed sequence of pre-built slots handed out in strict round-robin
/// order.
///
/// After `len()` calls to [`next_slot`](SlotRing::next_slot) the ring is
/// back at slot 0 and whoever still holds that slot's view will see it
/// remapped.
pub struct SlotRing<S> {
    slots: Box<[S]>,
    next: Cell<usize>,
}

impl<S> SlotRing<S> {
    /// Build a ring from pre-constructed slots.
    ///
    /// # Panics
    ///
    /// Panics if `slots` is empty.
    pub fn new(slots: Vec<S>) -> Self {
        assert!(!slots.is_empty(), "a slot ring needs at least one slot");
        Self {
            slots: slots.into_boxed_slice(),
            next: Cell::new(0),
        }
    }

    /// Index of the slot to hand out now; advances the ring.
    #[inline]
    pub fn next_slot(&self) -> usize {
        let index = self.next.get();
        let advanced = index + 1;
        self.next
            .set(if advanced == self.slots.len() { 0 } else { advanced });
        index
    }

    /// The slot at `index`.
    #[inline]
    pub fn slot(&self, index: usize) -> &S {
        &self.slots[index]
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; rings hold at least one slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index the next call to `next_slot` will return.
    pub fn position(&self) -> usize {
        self.next.get()
    }

    pub(crate) fn set_position(&self, position: usize) {
        debug_assert!(position < self.slots.len());
        self.next.set(position);
    }

    /// Iterate every slot in ring order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wraps_after_len_calls() {
        let ring = SlotRing::new(vec!['a', 'b', 'c']);
        let order: Vec<char> = (0..7).map(|_| *ring.slot(ring.next_slot())).collect();
        assert_eq!(order, vec!['a', 'b', 'c', 'a', 'b', 'c', 'a']);
        assert_eq!(ring.position(), 1);
    }

    #[test]
    fn single_slot_ring_always_returns_zero() {
        let ring = SlotRing::new(vec![()]);
        assert_eq!(ring.next_slot(), 0);
        assert_eq!(ring.next_slot(), 0);
    }

    #[test]
    #[should_panic(expected = "at least one slot")]
    fn empty_ring_rejected() {
        let _ = SlotRing::<u8>::new(Vec::new());
    }

    #[test]
    fn set_position_resumes_sequence() {
        let ring = SlotRing::new((0..4).collect());
        ring.next_slot();
        let saved = ring.position();
        ring.next_slot();
        ring.next_slot();
        ring.set_position(saved);
        assert_eq!(ring.next_slot(), 1);
    }

    proptest! {
        #[test]
        fn sequence_is_index_mod_len(len in 1usize..64, calls in 0usize..256) {
            let ring = SlotRing::new(vec![0u8; len]);
            for call in 0..calls {
                prop_assert_eq!(ring.next_slot(), call % len);
            }
        }
    }
}
