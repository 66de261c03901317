//! Procedure metadata.

use dmc_core::{ProcFlags, ProcId, TypeId};

/// Metadata for one procedure, attached to a type or global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub id: ProcId,
    pub name: String,
    /// `None` for global procs.
    pub owner: Option<TypeId>,
    pub flags: ProcFlags,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// The procedure this one overrides, called by `..()`.
    pub super_proc: Option<ProcId>,
}

impl ProcEntry {
    pub(crate) fn new(id: ProcId, name: &str, owner: Option<TypeId>, flags: ProcFlags) -> Self {
        Self {
            id,
            name: name.to_string(),
            owner,
            flags,
            params: Vec::new(),
            super_proc: None,
        }
    }

    #[inline]
    pub fn is_override(&self) -> bool {
        self.flags.is_override()
    }

    #[inline]
    pub fn is_unimplemented(&self) -> bool {
        self.flags.is_unimplemented()
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.owner.is_none()
    }
}
