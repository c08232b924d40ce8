//! The `QuadraticElement2` value type.
//!
//! An element of the form `a + b·root`: two reference slots over arbitrary
//! host values. The type is agnostic to what `a` and `b` actually are, and
//! carries no arithmetic, comparison, hashing, or textual form — its
//! contract is construction and memory-lifecycle behavior. Any numeric
//! semantics (including what the structure constant is) belong to a future
//! extension.

use radical_engine::{
    bind_optional, CallArgs, MemberDef, ObjRef, Runtime, RuntimeResult, TypeFlags, TypeSpec,
};

/// Name the type is published under in the module namespace.
pub const TYPE_NAME: &str = "QuadraticElement2";

/// Declarative spec for the element type: two read-only reference slots,
/// collector-tracked instances, immutable type object.
pub static QUADRATIC_ELEMENT2_SPEC: TypeSpec = TypeSpec {
    name: "radicalfield.QuadraticElement2",
    members: &[
        MemberDef {
            name: "a",
            readonly: true,
        },
        MemberDef {
            name: "b",
            readonly: true,
        },
    ],
    flags: TypeFlags {
        gc_tracked: true,
        immutable: true,
    },
    construct,
};

/// Constructor hook: `QuadraticElement2(a=0, b=0)`.
///
/// Arguments bind positionally or by name before anything is allocated; a
/// missing coefficient defaults to a freshly allocated integer zero. One
/// new reference is acquired per supplied argument. Every failure path
/// releases exactly the references this call acquired — default-`b`
/// failure releases the already-acquired `a`, storage failure releases
/// both.
fn construct(rt: &mut Runtime, ty: ObjRef, args: &CallArgs) -> RuntimeResult<ObjRef> {
    let bound = bind_optional(args, &["a", "b"])?;

    let a = match bound[0] {
        Some(value) => {
            rt.inc_ref(value);
            value
        }
        None => rt.new_int(0)?,
    };
    let b = match bound[1] {
        Some(value) => {
            rt.inc_ref(value);
            value
        }
        None => match rt.new_int(0) {
            Ok(value) => value,
            Err(err) => {
                rt.dec_ref(a);
                return Err(err);
            }
        },
    };

    // The type-provided allocator releases both references itself if
    // storage cannot be obtained.
    rt.alloc_instance(ty, vec![a, b])
}
