//! The embedder-facing runtime facade.
//!
//! A [`Runtime`] is one isolated host instance: its own heap, its own
//! collector, its own modules. Two runtimes share nothing but the process
//! id counter, so independent embeddings can coexist without interference.
//!
//! Execution is single-threaded and cooperative; no operation here blocks
//! or suspends, and the runtime performs no internal locking.

use std::sync::atomic::{AtomicU64, Ordering};

use super::args::CallArgs;
use super::defaults;
use super::gc::{Collector, GcStats};
use super::heap::{Heap, HeapStats};
use super::object::{HeapData, Instance, ModuleState, ObjRef, VisitFn};
use super::types::{TypeDescriptor, TypeSpec};
use super::{RuntimeError, RuntimeResult};

/// Process-unique identifier for one [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl RuntimeId {
    /// Allocate the next id.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Construction options for a [`Runtime`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Heap object limit; 0 disables the limit.
    pub max_objects: usize,
    /// Tracked allocations between automatic collection passes.
    pub gc_interval: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_objects: defaults::DEFAULT_MAX_HEAP_OBJECTS,
            gc_interval: defaults::DEFAULT_GC_INTERVAL,
        }
    }
}

/// One isolated host runtime.
pub struct Runtime {
    id: RuntimeId,
    heap: Heap,
    collector: Collector,
}

impl Runtime {
    /// Create a runtime with default options.
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with explicit options.
    pub fn with_options(options: RuntimeOptions) -> Self {
        Self {
            id: RuntimeId::new(),
            heap: Heap::new(options.max_objects),
            collector: Collector::new(options.gc_interval),
        }
    }

    /// This runtime's process-unique id.
    pub fn id(&self) -> RuntimeId {
        self.id
    }

    /// Allocate, running a due collection pass first.
    fn alloc(&mut self, data: HeapData, tracked: bool) -> RuntimeResult<ObjRef> {
        if tracked && self.collector.should_collect(&self.heap) {
            self.collector.collect(&mut self.heap);
        }
        self.heap.allocate(data, tracked)
    }

    fn descriptor(&self, ty: ObjRef) -> RuntimeResult<&TypeDescriptor> {
        match self.heap.get(ty) {
            HeapData::Type(td) => Ok(td),
            _ => Err(RuntimeError::TypeMismatch("type")),
        }
    }

    // ----- integers and lists -----

    /// Allocate a fresh integer object.
    pub fn new_int(&mut self, value: i64) -> RuntimeResult<ObjRef> {
        self.alloc(HeapData::Int(value), false)
    }

    /// Read an integer object's value.
    pub fn int_value(&self, obj: ObjRef) -> Option<i64> {
        match self.heap.get(obj) {
            HeapData::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Allocate an empty list.
    pub fn new_list(&mut self) -> RuntimeResult<ObjRef> {
        self.alloc(HeapData::List(Vec::new()), true)
    }

    /// Append `item` to a list, acquiring a reference to it.
    pub fn list_push(&mut self, list: ObjRef, item: ObjRef) -> RuntimeResult<()> {
        if !matches!(self.heap.get(list), HeapData::List(_)) {
            return Err(RuntimeError::TypeMismatch("list"));
        }
        self.heap.inc_ref(item);
        if let HeapData::List(items) = self.heap.get_mut(list) {
            items.push(item);
        }
        Ok(())
    }

    /// Number of elements in a list.
    pub fn list_len(&self, list: ObjRef) -> RuntimeResult<usize> {
        match self.heap.get(list) {
            HeapData::List(items) => Ok(items.len()),
            _ => Err(RuntimeError::TypeMismatch("list")),
        }
    }

    // ----- references -----

    /// Acquire one reference.
    pub fn inc_ref(&self, obj: ObjRef) {
        self.heap.inc_ref(obj);
    }

    /// Release one reference, destroying the object at zero.
    pub fn dec_ref(&mut self, obj: ObjRef) {
        self.heap.dec_ref(obj);
    }

    /// Current reference count.
    pub fn refcount(&self, obj: ObjRef) -> usize {
        self.heap.refcount(obj)
    }

    /// Whether the slot still holds a live object.
    pub fn is_live(&self, obj: ObjRef) -> bool {
        self.heap.is_live(obj)
    }

    // ----- types and instances -----

    /// Create a fresh type descriptor object from a declarative spec.
    ///
    /// Every call yields a distinct descriptor, never a shared static.
    pub fn new_type(&mut self, spec: &TypeSpec) -> RuntimeResult<ObjRef> {
        self.alloc(HeapData::Type(TypeDescriptor::from_spec(spec)), true)
    }

    /// Invoke `ty`'s constructor hook with `args`.
    pub fn construct(&mut self, ty: ObjRef, args: &CallArgs) -> RuntimeResult<ObjRef> {
        let construct = self.descriptor(ty)?.construct_fn();
        construct(self, ty, args)
    }

    /// The type-provided storage allocator for instances.
    ///
    /// Consumes one already-acquired reference per member slot and acquires
    /// the instance's own reference to `ty`. On failure every consumed
    /// reference (and the descriptor reference) is released before the
    /// error is reported, so no reference leaks from any path. On success
    /// the instance is fully initialized and, when the type says so,
    /// registered with the cycle collector.
    pub fn alloc_instance(&mut self, ty: ObjRef, slots: Vec<ObjRef>) -> RuntimeResult<ObjRef> {
        let (member_count, tracked) = match self.heap.get(ty) {
            HeapData::Type(td) => (td.members().len(), td.flags().gc_tracked),
            _ => {
                for slot in slots {
                    self.heap.dec_ref(slot);
                }
                return Err(RuntimeError::TypeMismatch("type"));
            }
        };
        if slots.len() != member_count {
            let got = slots.len();
            for slot in slots {
                self.heap.dec_ref(slot);
            }
            return Err(RuntimeError::ArgumentError(format!(
                "expected {member_count} slot values, got {got}"
            )));
        }

        let acquired = slots.clone();
        self.heap.inc_ref(ty);
        let instance = Instance {
            ty,
            slots: slots.into_iter().map(Some).collect(),
        };
        match self.alloc(HeapData::Instance(instance), tracked) {
            Ok(obj) => Ok(obj),
            Err(err) => {
                for slot in acquired {
                    self.heap.dec_ref(slot);
                }
                self.heap.dec_ref(ty);
                Err(err)
            }
        }
    }

    /// Whether `obj` is an instance of the descriptor `ty`.
    ///
    /// Descriptor identity, not name: instances of another load's
    /// descriptor do not match.
    pub fn is_instance(&self, obj: ObjRef, ty: ObjRef) -> bool {
        matches!(self.heap.get(obj), HeapData::Instance(inst) if inst.ty == ty)
    }

    /// The descriptor an instance was created from.
    pub fn instance_type(&self, obj: ObjRef) -> Option<ObjRef> {
        match self.heap.get(obj) {
            HeapData::Instance(inst) => Some(inst.ty),
            _ => None,
        }
    }

    // ----- attributes -----

    /// Read an attribute. Returns a new owned reference.
    pub fn get_attr(&self, obj: ObjRef, name: &str) -> RuntimeResult<ObjRef> {
        let value = match self.heap.get(obj) {
            HeapData::Instance(inst) => {
                let td = self.descriptor(inst.ty)?;
                let index = td
                    .member_index(name)
                    .ok_or_else(|| RuntimeError::UnknownAttribute(name.to_string()))?;
                inst.slots[index]
                    .ok_or_else(|| RuntimeError::UnknownAttribute(name.to_string()))?
            }
            HeapData::Module(state) => state
                .global(name)
                .ok_or_else(|| RuntimeError::UnknownAttribute(name.to_string()))?,
            _ => return Err(RuntimeError::UnknownAttribute(name.to_string())),
        };
        self.heap.inc_ref(value);
        Ok(value)
    }

    /// Write an attribute.
    ///
    /// A readonly member fails with [`RuntimeError::Immutable`] and has no
    /// observable effect. A writable member swaps references: the new value
    /// is acquired, the old one released. Module attributes publish into
    /// the namespace.
    pub fn set_attr(&mut self, obj: ObjRef, name: &str, value: ObjRef) -> RuntimeResult<()> {
        enum Target {
            Slot(usize),
            Namespace,
        }

        let target = match self.heap.get(obj) {
            HeapData::Instance(inst) => {
                let td = self.descriptor(inst.ty)?;
                let index = td
                    .member_index(name)
                    .ok_or_else(|| RuntimeError::UnknownAttribute(name.to_string()))?;
                if td.members()[index].readonly {
                    return Err(RuntimeError::Immutable(name.to_string()));
                }
                Target::Slot(index)
            }
            HeapData::Type(td) => {
                return if td.flags().immutable {
                    Err(RuntimeError::Immutable(name.to_string()))
                } else {
                    Err(RuntimeError::UnknownAttribute(name.to_string()))
                };
            }
            HeapData::Module(_) => Target::Namespace,
            _ => return Err(RuntimeError::UnknownAttribute(name.to_string())),
        };

        match target {
            Target::Slot(index) => {
                self.heap.inc_ref(value);
                let mut old = None;
                if let HeapData::Instance(inst) = self.heap.get_mut(obj) {
                    old = inst.slots[index].replace(value);
                }
                if let Some(old) = old {
                    self.heap.dec_ref(old);
                }
                Ok(())
            }
            Target::Namespace => self.module_set_global(obj, name, value),
        }
    }

    // ----- modules -----

    /// Create a per-load module object.
    pub fn new_module(&mut self, name: &str) -> RuntimeResult<ObjRef> {
        self.alloc(HeapData::Module(ModuleState::new(name)), true)
    }

    /// Module name, if `obj` is a module.
    pub fn module_name(&self, module: ObjRef) -> Option<&str> {
        match self.heap.get(module) {
            HeapData::Module(state) => Some(state.name()),
            _ => None,
        }
    }

    /// Move an already-owned reference into the module's per-load state.
    ///
    /// Ownership transfers to the module; on failure the caller still owns
    /// the reference.
    pub fn module_add_state_ref(&mut self, module: ObjRef, value: ObjRef) -> RuntimeResult<()> {
        match self.heap.get_mut(module) {
            HeapData::Module(state) => {
                state.state.push(value);
                Ok(())
            }
            _ => Err(RuntimeError::TypeMismatch("module")),
        }
    }

    /// Publish `value` in the module namespace, acquiring a new reference.
    /// Replacing an existing entry releases the old one.
    pub fn module_set_global(
        &mut self,
        module: ObjRef,
        name: &str,
        value: ObjRef,
    ) -> RuntimeResult<()> {
        if !matches!(self.heap.get(module), HeapData::Module(_)) {
            return Err(RuntimeError::TypeMismatch("module"));
        }
        self.heap.inc_ref(value);
        let mut old = None;
        if let HeapData::Module(state) = self.heap.get_mut(module) {
            old = state.globals.insert(name.to_string(), value);
        }
        if let Some(old) = old {
            self.heap.dec_ref(old);
        }
        Ok(())
    }

    /// Look up a published global. Returns a new owned reference.
    pub fn module_get_global(&self, module: ObjRef, name: &str) -> RuntimeResult<ObjRef> {
        match self.heap.get(module) {
            HeapData::Module(state) => {
                let value = state
                    .global(name)
                    .ok_or_else(|| RuntimeError::UnknownAttribute(name.to_string()))?;
                self.heap.inc_ref(value);
                Ok(value)
            }
            _ => Err(RuntimeError::TypeMismatch("module")),
        }
    }

    /// Tear down one load.
    ///
    /// The free step is an alias of clear: release the module's state and
    /// namespace references, then release the loader's own reference.
    /// Invoked once per load.
    pub fn unload(&mut self, module: ObjRef) {
        self.heap.clear_object(module);
        self.heap.dec_ref(module);
    }

    // ----- collector -----

    /// Force a full cycle-collection pass. Returns objects reclaimed.
    pub fn collect(&mut self) -> usize {
        self.collector.collect(&mut self.heap)
    }

    /// Collector statistics.
    pub fn gc_stats(&self) -> &GcStats {
        self.collector.stats()
    }

    /// Heap occupancy snapshot.
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Live object count.
    pub fn live_objects(&self) -> usize {
        self.heap.live_objects()
    }

    /// Whether `obj` is registered with the cycle collector.
    pub fn is_tracked(&self, obj: ObjRef) -> bool {
        self.heap.is_tracked(obj)
    }

    /// Report every reference `obj` owns to `visit`. A visitor error
    /// propagates immediately and stops the traversal.
    pub fn trace_object(&self, obj: ObjRef, visit: &mut VisitFn<'_>) -> RuntimeResult<()> {
        self.heap.trace_object(obj, visit)
    }

    /// Change the heap object limit; 0 disables it.
    pub fn set_max_objects(&mut self, max_objects: usize) {
        self.heap.set_max_objects(max_objects);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
