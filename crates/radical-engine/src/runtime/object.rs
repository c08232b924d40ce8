//! Managed object payloads and the trace/clear lifecycle protocol.
//!
//! Every composite payload that can own references implements the same
//! three-step contract the collector relies on: report owned references
//! (trace), drop the cycle-relevant ones early (clear), and drop whatever
//! remains at destruction time.

use rustc_hash::FxHashMap;

use super::types::TypeDescriptor;
use super::RuntimeResult;

/// Handle to a heap-managed object.
///
/// A `Copy` slot index into the owning [`Heap`](super::heap::Heap). Holding
/// an `ObjRef` does not by itself keep the object alive; ownership is
/// expressed through the reference count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

impl ObjRef {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Visitor invoked for every reference an object owns during a trace.
///
/// A visitor error propagates to the caller immediately and stops the
/// traversal.
pub type VisitFn<'a> = dyn FnMut(ObjRef) -> RuntimeResult<()> + 'a;

/// Instance of a dynamically created type.
pub struct Instance {
    /// Owned reference to the type descriptor that describes this instance.
    ///
    /// Descriptors are created per load and can be collected independently
    /// of their instances, so every instance keeps its own reference.
    pub ty: ObjRef,
    /// One owned reference per member slot.
    ///
    /// `None` only after the collector's clear step; ordinary callers never
    /// observe a cleared instance.
    pub slots: Box<[Option<ObjRef>]>,
}

/// State owned by one module load.
pub struct ModuleState {
    name: String,
    /// Owned references held in per-load state.
    pub(crate) state: Vec<ObjRef>,
    /// Published namespace: one owned reference per value.
    pub(crate) globals: FxHashMap<String, ObjRef>,
}

impl ModuleState {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Vec::new(),
            globals: FxHashMap::default(),
        }
    }

    /// The module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// References currently held in per-load state.
    pub fn state_refs(&self) -> &[ObjRef] {
        &self.state
    }

    /// Look up a published global without acquiring a reference.
    pub fn global(&self, name: &str) -> Option<ObjRef> {
        self.globals.get(name).copied()
    }
}

/// Payload of a heap object.
pub enum HeapData {
    /// Integer leaf. Owns no references and is never collector-tracked.
    Int(i64),
    /// Mutable sequence holding one owned reference per element.
    List(Vec<ObjRef>),
    /// Dynamically created type descriptor.
    Type(TypeDescriptor),
    /// Instance of a dynamically created type.
    Instance(Instance),
    /// Per-load module object.
    Module(ModuleState),
}

impl HeapData {
    /// Report every reference this object owns to the collector's visitor.
    ///
    /// Total and side-effect-free from the object's perspective. Instances
    /// report their type descriptor before their member slots.
    pub fn trace(&self, visit: &mut VisitFn<'_>) -> RuntimeResult<()> {
        match self {
            HeapData::Int(_) | HeapData::Type(_) => Ok(()),
            HeapData::List(items) => {
                for &item in items {
                    visit(item)?;
                }
                Ok(())
            }
            HeapData::Instance(inst) => {
                visit(inst.ty)?;
                for &slot in inst.slots.iter().flatten() {
                    visit(slot)?;
                }
                Ok(())
            }
            HeapData::Module(state) => {
                for &value in &state.state {
                    visit(value)?;
                }
                for &value in state.globals.values() {
                    visit(value)?;
                }
                Ok(())
            }
        }
    }

    /// Take the cycle-relevant owned references out of the object.
    ///
    /// Used by the collector to break a detected cycle before destruction;
    /// the object itself stays allocated. Idempotent: a second invocation
    /// finds nothing left to release. Instances keep their type-descriptor
    /// reference; it is only dropped at destruction.
    pub fn clear(&mut self, released: &mut Vec<ObjRef>) {
        match self {
            HeapData::Int(_) | HeapData::Type(_) => {}
            HeapData::List(items) => released.extend(items.drain(..)),
            HeapData::Instance(inst) => {
                released.extend(inst.slots.iter_mut().filter_map(Option::take));
            }
            HeapData::Module(state) => {
                released.extend(state.state.drain(..));
                released.extend(state.globals.drain().map(|(_, value)| value));
            }
        }
    }

    /// Take every remaining owned reference at destruction time.
    ///
    /// Member slots come first, the instance's type-descriptor reference
    /// last.
    pub(crate) fn release_remaining(&mut self, released: &mut Vec<ObjRef>) {
        self.clear(released);
        if let HeapData::Instance(inst) = self {
            released.push(inst.ty);
        }
    }
}
