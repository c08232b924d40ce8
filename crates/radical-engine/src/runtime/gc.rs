//! Synchronous cycle collection layered over reference counting.
//!
//! Reference counting reclaims everything except objects whose only
//! reachability is through a cycle. The collector finds those: it copies
//! every tracked object's reference count, subtracts the references held
//! from inside the tracked graph itself, marks everything reachable from
//! objects that still have outside holders, and clears the rest. Clearing
//! breaks the cycles, after which ordinary refcount decay destroys the
//! members.

use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use super::heap::Heap;
use super::object::ObjRef;

/// Collector statistics.
#[derive(Debug, Clone, Default)]
pub struct GcStats {
    /// Total number of collection passes.
    pub collections: usize,

    /// Total objects reclaimed across all passes.
    pub objects_freed: usize,

    /// Total pause time across all passes.
    pub total_pause_time: Duration,

    /// Last pass duration.
    pub last_pause_time: Duration,

    /// Maximum pass duration.
    pub max_pause_time: Duration,

    /// Cyclic garbage found in the last pass.
    pub last_unreachable: usize,

    /// Live objects after the last pass.
    pub live_objects: usize,
}

impl GcStats {
    fn update(&mut self, pause: Duration, unreachable: usize, freed: usize, live: usize) {
        self.collections += 1;
        self.objects_freed += freed;
        self.total_pause_time += pause;
        self.last_pause_time = pause;
        if pause > self.max_pause_time {
            self.max_pause_time = pause;
        }
        self.last_unreachable = unreachable;
        self.live_objects = live;
    }
}

/// Synchronous cycle collector.
///
/// Owns the pass trigger and statistics; the object graph itself lives in
/// the [`Heap`].
pub struct Collector {
    /// Tracked allocations between automatic passes.
    interval: u32,
    stats: GcStats,
}

impl Collector {
    /// Create a collector that triggers every `interval` tracked
    /// allocations.
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            stats: GcStats::default(),
        }
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Whether enough tracked allocations have happened to warrant a pass.
    pub fn should_collect(&self, heap: &Heap) -> bool {
        heap.allocs_since_collect() >= self.interval
    }

    /// Run one full pass. Returns the number of objects reclaimed.
    pub fn collect(&mut self, heap: &mut Heap) -> usize {
        let start = Instant::now();
        let live_before = heap.live_objects();
        let tracked = heap.tracked_ids();

        // Copy reference counts, then subtract every reference held from
        // inside the tracked graph. What remains per object is the number
        // of references held from outside it.
        let mut external: FxHashMap<ObjRef, usize> = tracked
            .iter()
            .map(|&r| (r, heap.refcount(r)))
            .collect();
        for &r in &tracked {
            heap.for_each_child(r, |child| {
                if let Some(count) = external.get_mut(&child) {
                    *count = count.saturating_sub(1);
                }
            });
        }

        // Mark everything reachable from objects with outside holders.
        let mut reachable: FxHashSet<ObjRef> = FxHashSet::default();
        let mut work: Vec<ObjRef> = tracked
            .iter()
            .copied()
            .filter(|r| external[r] > 0)
            .collect();
        while let Some(r) = work.pop() {
            if !reachable.insert(r) {
                continue;
            }
            heap.for_each_child(r, |child| {
                if external.contains_key(&child) && !reachable.contains(&child) {
                    work.push(child);
                }
            });
        }

        // The rest is cyclic garbage. Guard references keep every member
        // alive while the clears run; dropping the guards lets refcount
        // decay destroy them.
        let unreachable: Vec<ObjRef> = tracked
            .iter()
            .copied()
            .filter(|r| !reachable.contains(r))
            .collect();
        for &r in &unreachable {
            heap.inc_ref(r);
        }
        for &r in &unreachable {
            heap.clear_object(r);
        }
        for &r in &unreachable {
            heap.dec_ref(r);
        }

        heap.reset_alloc_counter();

        let live_after = heap.live_objects();
        let freed = live_before.saturating_sub(live_after);
        self.stats
            .update(start.elapsed(), unreachable.len(), freed, live_after);
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object::HeapData;

    fn list_push(heap: &mut Heap, list: ObjRef, item: ObjRef) {
        heap.inc_ref(item);
        if let HeapData::List(items) = heap.get_mut(list) {
            items.push(item);
        }
    }

    #[test]
    fn test_collect_on_empty_heap() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        assert_eq!(collector.collect(&mut heap), 0);
        assert_eq!(collector.stats().collections, 1);
        assert_eq!(collector.stats().objects_freed, 0);
    }

    #[test]
    fn test_externally_held_objects_survive() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        let list = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        collector.collect(&mut heap);

        assert!(heap.is_live(list));
        assert_eq!(heap.live_objects(), 1);
        heap.dec_ref(list);
    }

    #[test]
    fn test_self_cycle_is_reclaimed() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        let list = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        list_push(&mut heap, list, list);
        heap.dec_ref(list);

        // The self-reference keeps the count at one.
        assert_eq!(heap.live_objects(), 1);

        let freed = collector.collect(&mut heap);
        assert_eq!(freed, 1);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_two_object_cycle_is_reclaimed() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        let a = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        let b = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        list_push(&mut heap, a, b);
        list_push(&mut heap, b, a);
        heap.dec_ref(a);
        heap.dec_ref(b);

        assert_eq!(heap.live_objects(), 2);

        let freed = collector.collect(&mut heap);
        assert_eq!(freed, 2);
        assert_eq!(heap.live_objects(), 0);
        assert_eq!(collector.stats().last_unreachable, 2);
    }

    #[test]
    fn test_cycle_reachable_from_outside_survives() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        let a = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        let b = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        list_push(&mut heap, a, b);
        list_push(&mut heap, b, a);
        // Keep holding `a`; release only `b`.
        heap.dec_ref(b);

        collector.collect(&mut heap);
        assert_eq!(heap.live_objects(), 2);

        // Releasing the outside holder makes the next pass reclaim both.
        heap.dec_ref(a);
        collector.collect(&mut heap);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_untracked_leaves_hang_off_cycles() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        let int = heap.allocate(HeapData::Int(5), false).unwrap();
        let list = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        list_push(&mut heap, list, int);
        list_push(&mut heap, list, list);
        heap.dec_ref(int);
        heap.dec_ref(list);

        let freed = collector.collect(&mut heap);
        assert_eq!(freed, 2);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_repeated_rounds_return_to_baseline() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(4096);

        for _ in 0..10 {
            let a = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
            let b = heap.allocate(HeapData::List(Vec::new()), true).unwrap();
            list_push(&mut heap, a, b);
            list_push(&mut heap, b, a);
            heap.dec_ref(a);
            heap.dec_ref(b);

            collector.collect(&mut heap);
            assert_eq!(heap.live_objects(), 0);
        }
        assert_eq!(collector.stats().objects_freed, 20);
    }

    #[test]
    fn test_should_collect_interval() {
        let mut heap = Heap::new(0);
        let mut collector = Collector::new(2);

        assert!(!collector.should_collect(&heap));
        heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        assert!(!collector.should_collect(&heap));
        heap.allocate(HeapData::List(Vec::new()), true).unwrap();
        assert!(collector.should_collect(&heap));

        collector.collect(&mut heap);
        assert!(!collector.should_collect(&heap));
    }
}
