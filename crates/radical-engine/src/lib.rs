//! Radicalfield Host Runtime
//!
//! This crate provides the host-object runtime native extensions embed
//! into:
//! - **Heap**: reference-counted slot arena with deterministic destruction
//! - **Collector**: synchronous cycle collection layered over the counts
//! - **Types**: dynamic type descriptors created per load from declarative
//!   specs
//! - **Modules**: per-load module objects with init/teardown symmetry
//!
//! # Example
//!
//! ```rust,ignore
//! use radical_engine::{CallArgs, Runtime};
//!
//! let mut rt = Runtime::new();
//! let ty = rt.new_type(&MY_TYPE_SPEC)?;
//! let obj = rt.construct(ty, &CallArgs::new())?;
//! // ... use obj ...
//! rt.dec_ref(obj);
//! rt.dec_ref(ty);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod runtime;

pub use runtime::{
    bind_optional, CallArgs, Collector, ConstructFn, GcStats, Heap, HeapData, HeapStats, Instance,
    MemberDef, ModuleState, ObjRef, Runtime, RuntimeError, RuntimeId, RuntimeOptions,
    RuntimeResult, TypeDescriptor, TypeFlags, TypeSpec, VisitFn,
};
