//! Call-argument binding.
//!
//! Arguments carry borrowed references; binding performs no allocation and
//! acquires nothing, so an `ArgumentError` always surfaces before any side
//! effect.

use super::object::ObjRef;
use super::{RuntimeError, RuntimeResult};

/// Positional and keyword arguments for a constructor call.
///
/// References held here are borrowed from the caller; the callee acquires
/// its own as needed.
#[derive(Default)]
pub struct CallArgs {
    positional: Vec<ObjRef>,
    keywords: Vec<(String, ObjRef)>,
}

impl CallArgs {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn positional(mut self, value: ObjRef) -> Self {
        self.positional.push(value);
        self
    }

    /// Append a keyword argument.
    pub fn keyword(mut self, name: impl Into<String>, value: ObjRef) -> Self {
        self.keywords.push((name.into(), value));
        self
    }

    /// Number of positional arguments.
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    /// Number of keyword arguments.
    pub fn keyword_len(&self) -> usize {
        self.keywords.len()
    }
}

/// Bind `args` onto the optional parameters `names`.
///
/// Every parameter is optional; positionals fill slots left to right and
/// keywords fill by name. Too many positionals, an unknown keyword, or a
/// keyword for an already-filled slot fail with
/// [`RuntimeError::ArgumentError`] before any reference is acquired.
pub fn bind_optional(args: &CallArgs, names: &[&str]) -> RuntimeResult<Vec<Option<ObjRef>>> {
    if args.positional.len() > names.len() {
        return Err(RuntimeError::ArgumentError(format!(
            "expected at most {} arguments, got {}",
            names.len(),
            args.positional.len()
        )));
    }

    let mut bound: Vec<Option<ObjRef>> = vec![None; names.len()];
    for (slot, &value) in bound.iter_mut().zip(&args.positional) {
        *slot = Some(value);
    }

    for (name, value) in &args.keywords {
        let index = names
            .iter()
            .position(|candidate| *candidate == name.as_str())
            .ok_or_else(|| {
                RuntimeError::ArgumentError(format!("unexpected keyword argument '{name}'"))
            })?;
        if bound[index].is_some() {
            return Err(RuntimeError::ArgumentError(format!(
                "argument '{name}' given more than once"
            )));
        }
        bound[index] = Some(*value);
    }

    Ok(bound)
}
