//! Radicalfield host runtime.
//!
//! This module provides the runtime kernel including:
//! - Reference-counted object heap with slot reuse
//! - Synchronous cycle collector layered over the counts
//! - Dynamic type descriptors built from declarative specs
//! - Per-load module objects with their own teardown
//! - Call-argument binding for constructor hooks

pub mod args;
pub mod context;
pub mod defaults;
pub mod gc;
pub mod heap;
pub mod object;
pub mod types;

pub use args::{bind_optional, CallArgs};
pub use context::{Runtime, RuntimeId, RuntimeOptions};
pub use gc::{Collector, GcStats};
pub use heap::{Heap, HeapStats};
pub use object::{HeapData, Instance, ModuleState, ObjRef, VisitFn};
pub use types::{ConstructFn, MemberDef, TypeDescriptor, TypeFlags, TypeSpec};

/// Runtime operation errors.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A construction-path allocation failed. Every reference the failing
    /// call had acquired has been released before this surfaced.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// Bad arity or unknown argument names, detected before any reference
    /// was acquired.
    #[error("argument error: {0}")]
    ArgumentError(String),

    /// Attribute write rejected; the write had no effect.
    #[error("attribute '{0}' is read-only")]
    Immutable(String),

    /// Attribute read of a name the object does not expose.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// Operation applied to the wrong kind of object.
    #[error("expected a {0} object")]
    TypeMismatch(&'static str),
}

/// Runtime operation result.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
