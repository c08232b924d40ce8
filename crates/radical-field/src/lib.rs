//! Radicalfield: the `QuadraticElement2` extension.
//!
//! A minimal composite value type — conceptually `a + b·root` — embedded
//! in the [`radical_engine`] host runtime. The crate provides the type's
//! declarative spec and constructor, plus the per-load module registry
//! that creates and publishes a fresh type descriptor for every load.
//!
//! # Example
//!
//! ```rust,ignore
//! use radical_engine::{CallArgs, Runtime};
//! use radical_field as field;
//!
//! let mut rt = Runtime::new();
//! let module = field::init(&mut rt)?;
//! let ty = field::resolve_type(&rt, module)?;
//!
//! let element = rt.construct(ty, &CallArgs::new())?;
//! let a = rt.get_attr(element, "a")?;
//! assert_eq!(rt.int_value(a), Some(0));
//!
//! rt.dec_ref(a);
//! rt.dec_ref(element);
//! rt.dec_ref(ty);
//! rt.unload(module);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod element;
pub mod module;

pub use element::{QUADRATIC_ELEMENT2_SPEC, TYPE_NAME};
pub use module::{init, resolve_type, MODULE_NAME};
