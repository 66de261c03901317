//! Per-type definition records.

use std::fmt;

use rustc_hash::FxHashMap;

use dmc_core::{InternalError, ProcId, TypeId, TypePath};

use crate::ObjectTree;

/// Initial value of a type variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InitialValue {
    #[default]
    Null,
    Number(f32),
    String(String),
    /// A type path literal such as `/obj/item`.
    Path(TypePath),
}

impl fmt::Display for InitialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialValue::Null => f.write_str("null"),
            InitialValue::Number(n) => write!(f, "{n}"),
            InitialValue::String(s) => write!(f, "{s:?}"),
            InitialValue::Path(p) => write!(f, "{p}"),
        }
    }
}

/// The definition of one declared type.
///
/// Name lookups resolve in this order:
///
/// 1. the type's own overriding procedures
/// 2. the type's own procedures
/// 3. the parent record, transitively
///
/// A record without a parent ends the chain. The parent is looked up in the
/// [`ObjectTree`] passed to each lookup, which lets a specialized copy of a
/// record (see [`specialize`](Self::specialize)) keep resolving through the
/// shared hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRecord {
    pub(crate) id: TypeId,
    pub(crate) path: TypePath,
    pub(crate) parent: Option<TypeId>,
    pub(crate) procedures: FxHashMap<String, ProcId>,
    pub(crate) overriding_procedures: FxHashMap<String, ProcId>,
    pub(crate) variables: FxHashMap<String, InitialValue>,
    pub(crate) global_variables: FxHashMap<String, u32>,
    pub(crate) verbs: Vec<ProcId>,
    // Pre-order position and descendant count, assigned by `ObjectTree::finalize`.
    pub(crate) index: u32,
    pub(crate) child_count: u32,
}

impl TypeRecord {
    pub(crate) fn new(id: TypeId, path: TypePath, parent: Option<TypeId>) -> Self {
        Self {
            id,
            path,
            parent,
            procedures: FxHashMap::default(),
            overriding_procedures: FxHashMap::default(),
            variables: FxHashMap::default(),
            global_variables: FxHashMap::default(),
            verbs: Vec::new(),
            index: 0,
            child_count: 0,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn path(&self) -> &TypePath {
        &self.path
    }

    pub fn parent(&self) -> Option<TypeId> {
        self.parent
    }

    /// Procedures first declared on this type.
    pub fn own_procedures(&self) -> impl Iterator<Item = (&str, ProcId)> {
        self.procedures.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Procedures on this type that redefine an inherited one.
    pub fn overriding_procedures(&self) -> impl Iterator<Item = (&str, ProcId)> {
        self.overriding_procedures
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
    }

    pub fn variable(&self, name: &str) -> Option<&InitialValue> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &InitialValue)> {
        self.variables.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Slot of a global (static) variable in the shared global table.
    pub fn global_variable(&self, name: &str) -> Option<u32> {
        self.global_variables.get(name).copied()
    }

    pub fn verbs(&self) -> &[ProcId] {
        &self.verbs
    }

    /// Depth-first pre-order index. Zero until the tree is finalized.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Number of descendants. Zero until the tree is finalized.
    pub fn child_count(&self) -> u32 {
        self.child_count
    }

    /// Resolve `name` through overrides, own procedures and then the parent chain.
    pub fn try_get_procedure(&self, tree: &ObjectTree, name: &str) -> Option<ProcId> {
        if let Some(id) = self.overriding_procedures.get(name) {
            return Some(*id);
        }
        if let Some(id) = self.procedures.get(name) {
            return Some(*id);
        }
        let parent = tree.ty(self.parent?).ok()?;
        parent.try_get_procedure(tree, name)
    }

    /// Like [`try_get_procedure`](Self::try_get_procedure), for callers that
    /// already know the name resolves.
    pub fn get_procedure(&self, tree: &ObjectTree, name: &str) -> Result<ProcId, InternalError> {
        self.try_get_procedure(tree, name)
            .ok_or_else(|| InternalError::UnresolvedProcedure {
                type_path: self.path.to_string(),
                name: name.to_string(),
            })
    }

    /// Whether `name` is declared on this type or an ancestor.
    ///
    /// Only the own-procedure tables are consulted: every overridden name is
    /// necessarily in some ancestor's own table already.
    pub fn has_procedure(&self, tree: &ObjectTree, name: &str) -> bool {
        if self.procedures.contains_key(name) {
            return true;
        }
        match self.parent.and_then(|parent| tree.ty(parent).ok()) {
            Some(parent) => parent.has_procedure(tree, name),
            None => false,
        }
    }

    /// The procedure a new definition of `name` would override.
    pub(crate) fn override_target(
        &self,
        tree: &ObjectTree,
        name: &str,
    ) -> Result<Option<ProcId>, InternalError> {
        if self.has_procedure(tree, name) {
            self.get_procedure(tree, name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub(crate) fn clear_procedures(&mut self) {
        self.procedures.clear();
        self.overriding_procedures.clear();
    }

    pub(crate) fn insert_procedure(&mut self, name: &str, id: ProcId, overriding: bool) {
        let table = if overriding {
            &mut self.overriding_procedures
        } else {
            &mut self.procedures
        };
        table.insert(name.to_string(), id);
    }

    /// Whether this type is `ancestor` or one of its descendants.
    ///
    /// Descendants occupy the pre-order range
    /// `ancestor.index ..= ancestor.index + ancestor.child_count`; anything
    /// before the range wraps around to a huge unsigned difference. Only
    /// meaningful once the tree is finalized.
    #[inline]
    pub fn is_subtype_of(&self, ancestor: &TypeRecord) -> bool {
        self.index.wrapping_sub(ancestor.index) <= ancestor.child_count
    }

    /// A copy with independent tables that still shares the identity and
    /// parent link of this record.
    pub fn specialize(&self) -> TypeRecord {
        self.clone()
    }

    pub fn set_variable(&mut self, name: &str, value: InitialValue) {
        self.variables.insert(name.to_string(), value);
    }

    /// Copy the parent's variable defaults and global slots.
    pub(crate) fn inherit_from(&mut self, parent: &TypeRecord) {
        self.variables = parent.variables.clone();
        self.global_variables = parent.global_variables.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, child_count: u32) -> TypeRecord {
        let mut record = TypeRecord::new(TypeId::new(index), TypePath::root(), None);
        record.index = index;
        record.child_count = child_count;
        record
    }

    #[test]
    fn subtype_arithmetic() {
        let ancestor = record(4, 3);
        assert!(record(4, 0).is_subtype_of(&ancestor));
        assert!(record(7, 0).is_subtype_of(&ancestor));
        assert!(!record(8, 0).is_subtype_of(&ancestor));
    }

    #[test]
    fn subtype_wraparound_rejects_earlier_index() {
        // 2 - 4 is negative; unsigned it wraps far above any child count.
        let ancestor = record(4, u32::MAX - 10);
        assert!(!record(2, 0).is_subtype_of(&ancestor));
    }

    #[test]
    fn specialize_does_not_share_tables() {
        let mut original = record(1, 0);
        original.set_variable("hp", InitialValue::Number(10.0));

        let mut copy = original.specialize();
        copy.set_variable("hp", InitialValue::Number(99.0));
        copy.insert_procedure("Attack", ProcId::new(3), false);

        assert_eq!(original.variable("hp"), Some(&InitialValue::Number(10.0)));
        assert!(original.procedures.is_empty());
        assert_eq!(copy.id(), original.id());
        assert_eq!(copy.parent(), original.parent());
    }

    #[test]
    fn initial_value_display() {
        assert_eq!(InitialValue::Null.to_string(), "null");
        assert_eq!(InitialValue::String("a".into()).to_string(), "\"a\"");
    }
}
