//! Per-load module registry for the element type.
//!
//! Each load owns one freshly created type descriptor: one reference in
//! module state, one held by the namespace entry callers resolve the
//! constructor through. Loads never share descriptor identity, and each
//! teardown releases exactly the resources its load acquired.

use radical_engine::{ObjRef, Runtime, RuntimeResult};

use crate::element::{QUADRATIC_ELEMENT2_SPEC, TYPE_NAME};

/// Name of the module each load publishes.
pub const MODULE_NAME: &str = "radicalfield.quadraticelement2";

/// Load entrypoint.
///
/// Creates this load's module object and runs its exec step. Returns an
/// owned reference to the module; tear it down once with
/// [`Runtime::unload`]. A failed exec step releases everything the load
/// had created before the error surfaces.
pub fn init(rt: &mut Runtime) -> RuntimeResult<ObjRef> {
    let module = rt.new_module(MODULE_NAME)?;
    match exec(rt, module) {
        Ok(()) => Ok(module),
        Err(err) => {
            rt.unload(module);
            Err(err)
        }
    }
}

/// Exec step: build the per-load type descriptor, keep one reference in
/// module state, and publish the type under its fixed name.
fn exec(rt: &mut Runtime, module: ObjRef) -> RuntimeResult<()> {
    let ty = rt.new_type(&QUADRATIC_ELEMENT2_SPEC)?;

    // Module state takes over the reference returned by new_type.
    if let Err(err) = rt.module_add_state_ref(module, ty) {
        rt.dec_ref(ty);
        return Err(err);
    }

    // Publishing acquires the namespace's own reference.
    rt.module_set_global(module, TYPE_NAME, ty)
}

/// Resolve the published type. Returns an owned reference callers can
/// construct through.
pub fn resolve_type(rt: &Runtime, module: ObjRef) -> RuntimeResult<ObjRef> {
    rt.module_get_global(module, TYPE_NAME)
}
