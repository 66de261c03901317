//! The object tree: arenas of type records and procedures, plus the global
//! procedure table.

use rustc_hash::FxHashMap;
use tracing::debug;

use dmc_core::{InternalError, ProcFlags, ProcId, RegistryError, TypeId, TypePath};

use crate::{InitialValue, ProcEntry, TypeRecord};

/// Name of the global initializer, substituted for unknown global procs.
///
/// Not a valid identifier, so it can never collide with a user proc.
pub const GLOBAL_INIT_PROC: &str = "<global init>";

/// Owner of every type definition and procedure of a compilation.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    types: Vec<TypeRecord>,
    paths: FxHashMap<TypePath, TypeId>,
    procs: Vec<ProcEntry>,
    global_procs: FxHashMap<String, ProcId>,
    global_init: ProcId,
    /// Names of the shared global variable slots, by slot.
    global_variables: Vec<String>,
    /// Every `(type, name, proc)` registration in order, replayed at finalize.
    registrations: Vec<(TypeId, String, ProcId)>,
    finalized: bool,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTree {
    /// A tree holding only the root type `/` and the global initializer.
    pub fn new() -> Self {
        let root = TypeRecord::new(TypeId::ROOT, TypePath::root(), None);
        let global_init = ProcId::new(0);
        let mut paths = FxHashMap::default();
        paths.insert(TypePath::root(), TypeId::ROOT);

        Self {
            types: vec![root],
            paths,
            procs: vec![ProcEntry::new(
                global_init,
                GLOBAL_INIT_PROC,
                None,
                ProcFlags::empty(),
            )],
            global_procs: FxHashMap::default(),
            global_init,
            global_variables: Vec::new(),
            registrations: Vec::new(),
            finalized: false,
        }
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Declare `path`, creating any missing ancestors.
    ///
    /// Returns the existing id if the type was already declared. A new type
    /// starts with a copy of its parent's variables and global slots.
    pub fn declare(&mut self, path: &TypePath) -> Result<TypeId, RegistryError> {
        if let Some(id) = self.paths.get(path) {
            return Ok(*id);
        }
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized);
        }

        let parent_path = path.parent().unwrap_or_default();
        let parent = self.declare(&parent_path)?;

        let id = TypeId::new(self.types.len() as u32);
        let mut record = TypeRecord::new(id, path.clone(), Some(parent));
        record.inherit_from(self.ty(parent)?);
        self.types.push(record);
        self.paths.insert(path.clone(), id);
        Ok(id)
    }

    /// [`declare`](Self::declare) from path text.
    pub fn declare_str(&mut self, path: &str) -> Result<TypeId, RegistryError> {
        let path = TypePath::parse(path)?;
        self.declare(&path)
    }

    pub fn lookup_path(&self, path: &TypePath) -> Option<TypeId> {
        self.paths.get(path).copied()
    }

    /// Look up a type by path text. Malformed paths resolve to nothing.
    pub fn lookup(&self, path: &str) -> Option<TypeId> {
        self.lookup_path(&TypePath::parse(path).ok()?)
    }

    pub fn ty(&self, id: TypeId) -> Result<&TypeRecord, InternalError> {
        self.types
            .get(id.index())
            .ok_or(InternalError::UnknownType(id))
    }

    fn ty_mut(&mut self, id: TypeId) -> Result<&mut TypeRecord, InternalError> {
        self.types
            .get_mut(id.index())
            .ok_or(InternalError::UnknownType(id))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.iter()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Re-parent `ty` (DM's `parent_type`).
    ///
    /// A parent that is `ty` itself or one of its descendants is rejected.
    /// Override links of procs already registered are recomputed by
    /// [`finalize`](Self::finalize).
    pub fn set_parent_type(&mut self, ty: TypeId, parent: TypeId) -> Result<(), RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized);
        }
        if ty == TypeId::ROOT {
            return Err(RegistryError::RootHasParent);
        }
        let record = self.ty(ty)?;
        self.ty(parent)?;
        if self.is_subtype_of(parent, ty) {
            return Err(RegistryError::CircularInheritance(record.path.to_string()));
        }
        self.ty_mut(ty)?.parent = Some(parent);
        Ok(())
    }

    /// Fix the hierarchy and assign every type its pre-order index and
    /// descendant count.
    ///
    /// Procedure registrations are replayed against the final parent links,
    /// so a type re-parented after its procs were declared ends up with the
    /// same override links as if it had been declared under its new parent.
    pub fn finalize(&mut self) -> Result<(), RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized);
        }

        let count = self.types.len();
        let mut children: Vec<Vec<TypeId>> = vec![Vec::new(); count];
        for record in &self.types {
            if let Some(parent) = record.parent {
                children[parent.index()].push(record.id);
            }
        }

        let mut index = vec![u32::MAX; count];
        let mut child_count = vec![0u32; count];
        let mut next = 0u32;
        // (type, exiting): the exit marker is popped after the whole subtree.
        let mut stack = vec![(TypeId::ROOT, false)];
        while let Some((id, exiting)) = stack.pop() {
            let i = id.index();
            if exiting {
                child_count[i] = next - index[i] - 1;
                continue;
            }
            index[i] = next;
            next += 1;
            stack.push((id, true));
            stack.extend(children[i].iter().rev().map(|child| (*child, false)));
        }

        for (i, record) in self.types.iter_mut().enumerate() {
            record.index = index[i];
            record.child_count = child_count[i];
        }
        self.relink_procedures()?;
        self.finalized = true;

        debug!(
            types = self.types.len(),
            procs = self.procs.len(),
            "object tree finalized"
        );
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Whether `ty` is `ancestor` or a descendant of it.
    ///
    /// O(1) once finalized; before that the parent chain is walked.
    pub fn is_subtype_of(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let (Ok(record), Ok(ancestor_record)) = (self.ty(ty), self.ty(ancestor)) else {
            return false;
        };
        if self.finalized {
            return record.is_subtype_of(ancestor_record);
        }

        let mut current = Some(ty);
        for _ in 0..self.types.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.ty(id).ok().and_then(TypeRecord::parent),
                None => return false,
            }
        }
        false
    }

    // ==========================================================================
    // Procedures
    // ==========================================================================

    /// Allocate a procedure on `owner` and register it under `name`.
    ///
    /// If `name` is already visible on `owner` the new proc becomes an
    /// override: it gets [`ProcFlags::OVERRIDE`] and its `super_proc` link is
    /// the proc it replaces.
    pub fn new_proc(
        &mut self,
        owner: TypeId,
        name: &str,
        flags: ProcFlags,
    ) -> Result<ProcId, RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized);
        }
        self.ty(owner)?;
        let id = self.alloc_proc(name, Some(owner), flags - ProcFlags::OVERRIDE);
        self.set_procedure(owner, name, id)?;
        Ok(id)
    }

    /// Register an already allocated proc under `name` on `ty`.
    pub fn set_procedure(
        &mut self,
        ty: TypeId,
        name: &str,
        proc: ProcId,
    ) -> Result<(), RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized);
        }
        self.proc(proc)?;
        self.link_procedure(ty, name, proc)?;
        self.registrations.push((ty, name.to_string(), proc));
        Ok(())
    }

    fn link_procedure(
        &mut self,
        ty: TypeId,
        name: &str,
        proc: ProcId,
    ) -> Result<(), InternalError> {
        let overridden = self.ty(ty)?.override_target(self, name)?;
        self.ty_mut(ty)?.insert_procedure(name, proc, overridden.is_some());

        let entry = self.proc_mut(proc)?;
        entry.super_proc = overridden;
        entry.flags.set(ProcFlags::OVERRIDE, overridden.is_some());
        Ok(())
    }

    /// Rebuild every procedure table by replaying the registrations in order.
    fn relink_procedures(&mut self) -> Result<(), InternalError> {
        for record in &mut self.types {
            record.clear_procedures();
        }
        let registrations = std::mem::take(&mut self.registrations);
        let linked = registrations
            .iter()
            .try_for_each(|(ty, name, proc)| self.link_procedure(*ty, name, *proc));
        self.registrations = registrations;
        linked
    }

    /// Register a global proc. Global names are unique.
    pub fn register_global_proc(
        &mut self,
        name: &str,
        flags: ProcFlags,
    ) -> Result<ProcId, RegistryError> {
        if self.global_procs.contains_key(name) {
            return Err(RegistryError::DuplicateGlobalProc(name.to_string()));
        }
        let id = self.alloc_proc(name, None, flags - ProcFlags::OVERRIDE);
        self.global_procs.insert(name.to_string(), id);
        Ok(id)
    }

    fn alloc_proc(&mut self, name: &str, owner: Option<TypeId>, flags: ProcFlags) -> ProcId {
        let id = ProcId::new(self.procs.len() as u32);
        self.procs.push(ProcEntry::new(id, name, owner, flags));
        id
    }

    /// Set the parameter names of a proc.
    pub fn set_params<I, S>(&mut self, proc: ProcId, params: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proc_mut(proc)?.params = params.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn proc(&self, id: ProcId) -> Result<&ProcEntry, InternalError> {
        self.procs
            .get(id.index())
            .ok_or(InternalError::UnknownProc(id))
    }

    fn proc_mut(&mut self, id: ProcId) -> Result<&mut ProcEntry, InternalError> {
        self.procs
            .get_mut(id.index())
            .ok_or(InternalError::UnknownProc(id))
    }

    pub fn proc_count(&self) -> usize {
        self.procs.len()
    }

    pub fn global_proc(&self, name: &str) -> Option<ProcId> {
        self.global_procs.get(name).copied()
    }

    /// The fallback substituted for unresolved global proc names.
    pub fn global_init_proc(&self) -> ProcId {
        self.global_init
    }

    pub fn try_get_procedure(&self, ty: TypeId, name: &str) -> Option<ProcId> {
        self.ty(ty).ok()?.try_get_procedure(self, name)
    }

    pub fn get_procedure(&self, ty: TypeId, name: &str) -> Result<ProcId, InternalError> {
        self.ty(ty)?.get_procedure(self, name)
    }

    pub fn has_procedure(&self, ty: TypeId, name: &str) -> bool {
        self.ty(ty)
            .map(|record| record.has_procedure(self, name))
            .unwrap_or(false)
    }

    // ==========================================================================
    // Variables and verbs
    // ==========================================================================

    pub fn set_variable(
        &mut self,
        ty: TypeId,
        name: &str,
        value: InitialValue,
    ) -> Result<(), RegistryError> {
        self.ty_mut(ty)?.set_variable(name, value);
        Ok(())
    }

    /// Allocate a new slot in the shared global table for a static variable
    /// declared on `ty`.
    pub fn add_global_variable(&mut self, ty: TypeId, name: &str) -> Result<u32, RegistryError> {
        let slot = self.global_variables.len() as u32;
        self.ty_mut(ty)?.global_variables.insert(name.to_string(), slot);
        self.global_variables.push(name.to_string());
        Ok(slot)
    }

    pub fn global_variable_name(&self, slot: u32) -> Option<&str> {
        self.global_variables.get(slot as usize).map(String::as_str)
    }

    pub fn global_variable_count(&self) -> usize {
        self.global_variables.len()
    }

    /// Record `proc` as a verb of `ty`.
    pub fn add_verb(&mut self, ty: TypeId, proc: ProcId) -> Result<(), RegistryError> {
        self.proc_mut(proc)?.flags.insert(ProcFlags::VERB);
        self.ty_mut(ty)?.verbs.push(proc);
        Ok(())
    }
}
