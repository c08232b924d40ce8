//! Declarative type specs and their per-load descriptors.
//!
//! A [`TypeSpec`] is a compile-time description of a type: its name, fixed
//! member table, behavior flags, and constructor hook. Each load realizes
//! the spec into its own heap-allocated [`TypeDescriptor`] object, so
//! independent loads never share descriptor identity.

use super::args::CallArgs;
use super::context::Runtime;
use super::object::ObjRef;
use super::RuntimeResult;

/// Constructor hook invoked when a type is called.
///
/// Receives the runtime, the descriptor object the call went through, and
/// the call arguments.
pub type ConstructFn = fn(&mut Runtime, ObjRef, &CallArgs) -> RuntimeResult<ObjRef>;

/// Declarative description of one member slot.
#[derive(Debug, Clone, Copy)]
pub struct MemberDef {
    /// Attribute name the slot is exposed under.
    pub name: &'static str,
    /// Writes fail with `Immutable` when set.
    pub readonly: bool,
}

/// Behavior flags of a type.
#[derive(Debug, Clone, Copy)]
pub struct TypeFlags {
    /// Instances are registered with the cycle collector at birth.
    pub gc_tracked: bool,
    /// The type object itself rejects attribute writes.
    pub immutable: bool,
}

/// Declarative, compile-time type description.
pub struct TypeSpec {
    /// Fully qualified type name.
    pub name: &'static str,
    /// Fixed member table; slot order is the storage order.
    pub members: &'static [MemberDef],
    /// Behavior flags.
    pub flags: TypeFlags,
    /// Constructor hook.
    pub construct: ConstructFn,
}

/// Per-load realization of a [`TypeSpec`].
///
/// Lives on the heap as an ordinary refcounted, collector-tracked object.
/// Two descriptors built from the same spec are distinct objects.
pub struct TypeDescriptor {
    name: &'static str,
    members: &'static [MemberDef],
    flags: TypeFlags,
    construct: ConstructFn,
}

impl TypeDescriptor {
    pub(crate) fn from_spec(spec: &TypeSpec) -> Self {
        Self {
            name: spec.name,
            members: spec.members,
            flags: spec.flags,
            construct: spec.construct,
        }
    }

    /// The type's name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The fixed member table.
    pub fn members(&self) -> &[MemberDef] {
        self.members
    }

    /// Behavior flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Slot index of a member, by name.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    pub(crate) fn construct_fn(&self) -> ConstructFn {
        self.construct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeError;

    fn failing_construct(
        _rt: &mut Runtime,
        _ty: ObjRef,
        _args: &CallArgs,
    ) -> RuntimeResult<ObjRef> {
        Err(RuntimeError::TypeMismatch("test"))
    }

    static SPEC: TypeSpec = TypeSpec {
        name: "Pair",
        members: &[
            MemberDef {
                name: "first",
                readonly: true,
            },
            MemberDef {
                name: "second",
                readonly: false,
            },
        ],
        flags: TypeFlags {
            gc_tracked: true,
            immutable: true,
        },
        construct: failing_construct,
    };

    #[test]
    fn test_descriptor_mirrors_spec() {
        let td = TypeDescriptor::from_spec(&SPEC);
        assert_eq!(td.name(), "Pair");
        assert_eq!(td.members().len(), 2);
        assert!(td.flags().gc_tracked);
        assert!(td.flags().immutable);
    }

    #[test]
    fn test_member_index() {
        let td = TypeDescriptor::from_spec(&SPEC);
        assert_eq!(td.member_index("first"), Some(0));
        assert_eq!(td.member_index("second"), Some(1));
        assert_eq!(td.member_index("third"), None);
    }
}
