//! Reference-counted object heap.
//!
//! A slot arena with a free list: every object lives in one slot, owns one
//! reference per outgoing edge, and is destroyed the moment its count
//! reaches zero. Freed slots are reused by later allocations, keeping
//! memory flat for workloads that repeatedly allocate and release.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::object::{HeapData, ObjRef, VisitFn};
use super::{RuntimeError, RuntimeResult};

/// One live arena slot.
struct HeapEntry {
    /// Interior-mutable so acquiring a reference needs only `&Heap`.
    refcount: AtomicUsize,
    /// Registered with the cycle collector.
    tracked: bool,
    data: HeapData,
}

/// Snapshot of heap occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Live objects.
    pub live_objects: usize,
    /// Recycled slots available for reuse.
    pub free_slots: usize,
    /// Total arena capacity (live + free).
    pub total_slots: usize,
}

/// Reference-counted slot arena backing all runtime objects.
pub struct Heap {
    entries: Vec<Option<HeapEntry>>,
    /// Slots freed by destruction, consumed by allocation.
    free_list: Vec<ObjRef>,
    /// Object limit; 0 disables the limit.
    max_objects: usize,
    live: usize,
    /// Tracked allocations since the last collection pass.
    allocs_since_collect: u32,
}

impl Heap {
    /// Create an empty heap. `max_objects == 0` means unlimited.
    pub fn new(max_objects: usize) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            max_objects,
            live: 0,
            allocs_since_collect: 0,
        }
    }

    fn entry(&self, r: ObjRef) -> &HeapEntry {
        self.entries
            .get(r.index())
            .and_then(Option::as_ref)
            .expect("Heap: stale object reference")
    }

    /// Allocate a new object with a reference count of one.
    ///
    /// `tracked` registers the object with the cycle collector. Fails with
    /// [`RuntimeError::AllocationFailure`] when the object limit is
    /// reached; nothing is allocated in that case.
    pub fn allocate(&mut self, data: HeapData, tracked: bool) -> RuntimeResult<ObjRef> {
        if self.max_objects > 0 && self.live >= self.max_objects {
            return Err(RuntimeError::AllocationFailure(format!(
                "heap limit of {} objects reached",
                self.max_objects
            )));
        }

        let entry = HeapEntry {
            refcount: AtomicUsize::new(1),
            tracked,
            data,
        };

        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(entry);
            id
        } else {
            let id = ObjRef(self.entries.len() as u32);
            self.entries.push(Some(entry));
            id
        };

        self.live += 1;
        if tracked {
            self.allocs_since_collect = self.allocs_since_collect.wrapping_add(1);
        }
        Ok(id)
    }

    /// Acquire one reference.
    ///
    /// # Panics
    /// Panics if the reference is stale.
    pub fn inc_ref(&self, r: ObjRef) {
        self.entry(r).refcount.fetch_add(1, Ordering::Relaxed);
    }

    /// Release one reference, destroying the object at zero.
    ///
    /// # Panics
    /// Panics if the reference is stale.
    pub fn dec_ref(&mut self, r: ObjRef) {
        {
            let entry = self.entry(r);
            let count = entry.refcount.load(Ordering::Relaxed);
            if count > 1 {
                entry.refcount.store(count - 1, Ordering::Relaxed);
                return;
            }
        }
        self.destroy(r);
    }

    /// Reference count reached zero: run the destroy sequence.
    ///
    /// The entry leaves the arena first (which also unregisters it from the
    /// collector), then its owned references are released (member slots
    /// before the type-descriptor reference), then the slot itself is
    /// freed. Releasing can reenter destruction for other objects; by that
    /// point this one is already invisible and untracked.
    fn destroy(&mut self, r: ObjRef) {
        let slot = self
            .entries
            .get_mut(r.index())
            .expect("Heap::destroy: slot missing");
        let mut entry = slot.take().expect("Heap::destroy: object already freed");
        self.live -= 1;

        let mut released = Vec::new();
        entry.data.release_remaining(&mut released);
        for child in released {
            self.dec_ref(child);
        }

        self.free_list.push(r);
    }

    /// Collector entrypoint: release the object's cycle-relevant references
    /// without destroying it. Safe to invoke repeatedly; later invocations
    /// are no-ops.
    pub fn clear_object(&mut self, r: ObjRef) {
        let mut released = Vec::new();
        if let Some(entry) = self.entries.get_mut(r.index()).and_then(Option::as_mut) {
            entry.data.clear(&mut released);
        }
        for child in released {
            self.dec_ref(child);
        }
    }

    /// Report every reference `r` owns to `visit`.
    pub fn trace_object(&self, r: ObjRef, visit: &mut VisitFn<'_>) -> RuntimeResult<()> {
        self.entry(r).data.trace(visit)
    }

    /// Infallible child traversal for collector internals.
    pub(crate) fn for_each_child(&self, r: ObjRef, mut f: impl FnMut(ObjRef)) {
        // The closure never fails, so neither can the trace.
        let _ = self.entry(r).data.trace(&mut |child| {
            f(child);
            Ok(())
        });
    }

    /// Current reference count.
    pub fn refcount(&self, r: ObjRef) -> usize {
        self.entry(r).refcount.load(Ordering::Relaxed)
    }

    /// Whether the slot still holds a live object.
    pub fn is_live(&self, r: ObjRef) -> bool {
        self.entries
            .get(r.index())
            .is_some_and(Option::is_some)
    }

    /// Whether the object is registered with the cycle collector.
    pub fn is_tracked(&self, r: ObjRef) -> bool {
        self.entry(r).tracked
    }

    /// All collector-tracked objects.
    pub fn tracked_ids(&self) -> Vec<ObjRef> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(entry) if entry.tracked => Some(ObjRef(index as u32)),
                _ => None,
            })
            .collect()
    }

    /// Borrow an object's payload.
    ///
    /// # Panics
    /// Panics if the reference is stale.
    pub fn get(&self, r: ObjRef) -> &HeapData {
        &self.entry(r).data
    }

    /// Mutably borrow an object's payload.
    ///
    /// # Panics
    /// Panics if the reference is stale.
    pub fn get_mut(&mut self, r: ObjRef) -> &mut HeapData {
        &mut self
            .entries
            .get_mut(r.index())
            .and_then(Option::as_mut)
            .expect("Heap: stale object reference")
            .data
    }

    /// Live object count.
    pub fn live_objects(&self) -> usize {
        self.live
    }

    /// Tracked allocations since the last collection pass.
    pub fn allocs_since_collect(&self) -> u32 {
        self.allocs_since_collect
    }

    /// Reset the allocation counter after a collection pass.
    pub(crate) fn reset_alloc_counter(&mut self) {
        self.allocs_since_collect = 0;
    }

    /// Change the object limit; 0 disables it.
    pub fn set_max_objects(&mut self, max_objects: usize) {
        self.max_objects = max_objects;
    }

    /// Occupancy snapshot.
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live_objects: self.live,
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_starts_with_one_reference() {
        let mut heap = Heap::new(0);
        let obj = heap.allocate(HeapData::Int(42), false).unwrap();
        assert_eq!(heap.refcount(obj), 1);
        assert_eq!(heap.live_objects(), 1);
        assert!(!heap.is_tracked(obj));
    }

    #[test]
    fn test_inc_dec_ref() {
        let mut heap = Heap::new(0);
        let obj = heap.allocate(HeapData::Int(1), false).unwrap();

        heap.inc_ref(obj);
        assert_eq!(heap.refcount(obj), 2);

        heap.dec_ref(obj);
        assert_eq!(heap.refcount(obj), 1);
        assert!(heap.is_live(obj));

        heap.dec_ref(obj);
        assert!(!heap.is_live(obj));
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut heap = Heap::new(0);
        let first = heap.allocate(HeapData::Int(1), false).unwrap();
        heap.dec_ref(first);

        let second = heap.allocate(HeapData::Int(2), false).unwrap();
        assert_eq!(first, second);
        assert_eq!(heap.stats().total_slots, 1);
    }

    #[test]
    fn test_object_limit() {
        let mut heap = Heap::new(1);
        let _kept = heap.allocate(HeapData::Int(1), false).unwrap();

        let err = heap.allocate(HeapData::Int(2), false).unwrap_err();
        assert!(matches!(err, RuntimeError::AllocationFailure(_)));
        assert_eq!(heap.live_objects(), 1);
    }

    #[test]
    fn test_destroy_cascades_through_owned_references() {
        let mut heap = Heap::new(0);
        let item = heap.allocate(HeapData::Int(7), false).unwrap();
        let list = heap.allocate(HeapData::List(vec![item]), true).unwrap();
        assert_eq!(heap.live_objects(), 2);

        // The list owns the only reference to the item.
        heap.dec_ref(list);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_clear_object_is_idempotent() {
        let mut heap = Heap::new(0);
        let item = heap.allocate(HeapData::Int(7), false).unwrap();
        let list = heap.allocate(HeapData::List(vec![item]), true).unwrap();

        heap.clear_object(list);
        assert!(!heap.is_live(item));
        assert!(heap.is_live(list));

        // Second clear finds nothing to release.
        heap.clear_object(list);
        assert!(heap.is_live(list));

        heap.dec_ref(list);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_tracked_ids() {
        let mut heap = Heap::new(0);
        let int = heap.allocate(HeapData::Int(1), false).unwrap();
        let list = heap.allocate(HeapData::List(Vec::new()), true).unwrap();

        let tracked = heap.tracked_ids();
        assert!(!tracked.contains(&int));
        assert!(tracked.contains(&list));
    }

    #[test]
    fn test_alloc_counter_counts_tracked_only() {
        let mut heap = Heap::new(0);
        heap.allocate(HeapData::Int(1), false).unwrap();
        assert_eq!(heap.allocs_since_collect(), 0);

        heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        assert_eq!(heap.allocs_since_collect(), 1);

        heap.reset_alloc_counter();
        assert_eq!(heap.allocs_since_collect(), 0);
    }

    #[test]
    fn test_stats_snapshot() {
        let mut heap = Heap::new(0);
        let a = heap.allocate(HeapData::Int(1), false).unwrap();
        let _b = heap.allocate(HeapData::Int(2), false).unwrap();
        heap.dec_ref(a);

        let stats = heap.stats();
        assert_eq!(stats.live_objects, 1);
        assert_eq!(stats.free_slots, 1);
        assert_eq!(stats.total_slots, 2);
    }
}
