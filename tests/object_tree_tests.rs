//! Integration tests for the object tree.
//!
//! These exercise declaration collection and lookup through the public API
//! only: inheritance, overrides and super links, ancestry tests, variables
//! and the global procedure table.

use dmc::registry::InitialValue;
use dmc::{ObjectTree, ProcFlags, RegistryError, TypeId};

/// Build a small hierarchy:
///
/// ```text
/// /
/// ├── /atom
/// │   ├── /atom/movable
/// │   │   ├── /atom/movable/mob
/// │   │   │   └── /atom/movable/mob/player
/// │   │   └── /atom/movable/obj
/// │   └── /atom/turf
/// └── /datum
/// ```
fn hierarchy() -> (ObjectTree, Vec<TypeId>) {
    let mut tree = ObjectTree::new();
    let ids = [
        "/atom",
        "/atom/movable",
        "/atom/movable/mob",
        "/atom/movable/mob/player",
        "/atom/movable/obj",
        "/atom/turf",
        "/datum",
    ]
    .iter()
    .map(|path| tree.declare_str(path).unwrap())
    .collect();
    (tree, ids)
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn parent_procs_are_visible_to_children() {
    let (mut tree, ids) = hierarchy();
    let (atom, mob, player) = (ids[0], ids[2], ids[3]);
    let examine = tree.new_proc(atom, "Examine", ProcFlags::empty()).unwrap();
    tree.finalize().unwrap();

    assert_eq!(tree.try_get_procedure(player, "Examine"), Some(examine));
    assert_eq!(tree.try_get_procedure(mob, "Examine"), Some(examine));
    assert_eq!(tree.try_get_procedure(ids[6], "Examine"), None);
}

#[test]
fn override_shadows_only_for_its_subtree() {
    let (mut tree, ids) = hierarchy();
    let (movable, mob, player, obj) = (ids[1], ids[2], ids[3], ids[4]);
    let base = tree.new_proc(movable, "Move", ProcFlags::empty()).unwrap();
    let mob_move = tree.new_proc(mob, "Move", ProcFlags::empty()).unwrap();
    tree.finalize().unwrap();

    assert_eq!(tree.try_get_procedure(mob, "Move"), Some(mob_move));
    assert_eq!(tree.try_get_procedure(player, "Move"), Some(mob_move));
    // The sibling keeps the parent's definition.
    assert_eq!(tree.try_get_procedure(obj, "Move"), Some(base));
    assert_eq!(tree.try_get_procedure(movable, "Move"), Some(base));
}

#[test]
fn override_links_to_previously_visible_proc() {
    let (mut tree, ids) = hierarchy();
    let (atom, mob, player) = (ids[0], ids[2], ids[3]);
    let atom_proc = tree.new_proc(atom, "Bump", ProcFlags::empty()).unwrap();
    let mob_proc = tree.new_proc(mob, "Bump", ProcFlags::empty()).unwrap();
    let player_proc = tree.new_proc(player, "Bump", ProcFlags::empty()).unwrap();

    let mob_entry = tree.proc(mob_proc).unwrap();
    assert!(mob_entry.is_override());
    assert_eq!(mob_entry.super_proc, Some(atom_proc));

    let player_entry = tree.proc(player_proc).unwrap();
    assert!(player_entry.is_override());
    assert_eq!(player_entry.super_proc, Some(mob_proc));

    let atom_entry = tree.proc(atom_proc).unwrap();
    assert!(!atom_entry.is_override());
    assert_eq!(atom_entry.super_proc, None);
}

#[test]
fn redefinition_on_same_type_overrides_it() {
    let (mut tree, ids) = hierarchy();
    let turf = ids[5];
    let first = tree.new_proc(turf, "Entered", ProcFlags::empty()).unwrap();
    let second = tree.new_proc(turf, "Entered", ProcFlags::empty()).unwrap();

    assert_eq!(tree.proc(second).unwrap().super_proc, Some(first));
    assert_eq!(tree.try_get_procedure(turf, "Entered"), Some(second));
}

#[test]
fn override_flag_cannot_be_forced() {
    let (mut tree, ids) = hierarchy();
    let proc = tree.new_proc(ids[6], "New", ProcFlags::OVERRIDE).unwrap();
    assert!(!tree.proc(proc).unwrap().is_override());
}

#[test]
fn has_procedure_sees_ancestors() {
    let (mut tree, ids) = hierarchy();
    let (atom, mob) = (ids[0], ids[2]);
    tree.new_proc(atom, "Click", ProcFlags::empty()).unwrap();
    tree.new_proc(mob, "Click", ProcFlags::empty()).unwrap();

    assert!(tree.has_procedure(mob, "Click"));
    assert!(tree.has_procedure(ids[3], "Click"));
    assert!(!tree.has_procedure(ids[6], "Click"));
}

#[test]
fn get_procedure_on_missing_name_is_internal_error() {
    let (tree, ids) = hierarchy();
    let err = tree.get_procedure(ids[0], "Nope").unwrap_err();
    assert!(err.to_string().contains("Nope"));
}

// =============================================================================
// Ancestry
// =============================================================================

#[test]
fn subtype_is_reflexive() {
    let (mut tree, ids) = hierarchy();
    tree.finalize().unwrap();
    for id in ids {
        assert!(tree.is_subtype_of(id, id));
    }
    assert!(tree.is_subtype_of(TypeId::ROOT, TypeId::ROOT));
}

#[test]
fn subtype_across_depth() {
    let (mut tree, ids) = hierarchy();
    tree.finalize().unwrap();
    let (atom, movable, mob, player, obj, turf, datum) =
        (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5], ids[6]);

    assert!(tree.is_subtype_of(player, atom));
    assert!(tree.is_subtype_of(player, movable));
    assert!(tree.is_subtype_of(player, TypeId::ROOT));
    assert!(!tree.is_subtype_of(player, obj));
    assert!(!tree.is_subtype_of(turf, movable));
    assert!(!tree.is_subtype_of(datum, atom));
    assert!(!tree.is_subtype_of(mob, player));
}

#[test]
fn types_before_the_ancestor_wrap_around() {
    let (mut tree, ids) = hierarchy();
    tree.finalize().unwrap();
    let (atom, turf, datum) = (ids[0], ids[5], ids[6]);

    // `/atom` precedes `/datum` in pre-order, so the unsigned difference wraps.
    let atom_record = tree.ty(atom).unwrap();
    let datum_record = tree.ty(datum).unwrap();
    assert!(atom_record.index() < datum_record.index());
    assert!(!tree.is_subtype_of(atom, datum));
    assert!(!tree.is_subtype_of(turf, datum));
}

#[test]
fn child_counts_cover_subtrees() {
    let (mut tree, ids) = hierarchy();
    tree.finalize().unwrap();
    assert_eq!(tree.ty(TypeId::ROOT).unwrap().child_count(), 7);
    assert_eq!(tree.ty(ids[0]).unwrap().child_count(), 5);
    assert_eq!(tree.ty(ids[1]).unwrap().child_count(), 3);
    assert_eq!(tree.ty(ids[3]).unwrap().child_count(), 0);
}

#[test]
fn subtype_before_finalize_walks_parents() {
    let (tree, ids) = hierarchy();
    assert!(tree.is_subtype_of(ids[3], ids[0]));
    assert!(!tree.is_subtype_of(ids[3], ids[6]));
}

#[test]
fn reparenting_changes_ancestry() {
    let (mut tree, ids) = hierarchy();
    let (movable, datum) = (ids[1], ids[6]);
    let area = tree.declare_str("/area").unwrap();
    tree.set_parent_type(area, movable).unwrap();
    tree.finalize().unwrap();

    assert!(tree.is_subtype_of(area, movable));
    assert!(!tree.is_subtype_of(area, datum));
}

#[test]
fn reparenting_under_a_definer_makes_an_override() {
    let mut tree = ObjectTree::new();
    let a = tree.declare_str("/a").unwrap();
    let b = tree.declare_str("/b").unwrap();
    let a_foo = tree.new_proc(a, "Foo", ProcFlags::empty()).unwrap();
    let b_foo = tree.new_proc(b, "Foo", ProcFlags::empty()).unwrap();
    tree.set_parent_type(b, a).unwrap();
    tree.finalize().unwrap();

    let entry = tree.proc(b_foo).unwrap();
    assert!(entry.is_override());
    assert_eq!(entry.super_proc, Some(a_foo));
    assert_eq!(tree.try_get_procedure(b, "Foo"), Some(b_foo));
    assert!(!tree.proc(a_foo).unwrap().is_override());
}

#[test]
fn reparenting_away_from_a_definer_drops_the_override() {
    let (mut tree, ids) = hierarchy();
    let (atom, datum) = (ids[0], ids[6]);
    let mob = ids[2];
    let atom_bump = tree.new_proc(atom, "Bump", ProcFlags::empty()).unwrap();
    let mob_bump = tree.new_proc(mob, "Bump", ProcFlags::empty()).unwrap();
    assert_eq!(tree.proc(mob_bump).unwrap().super_proc, Some(atom_bump));

    tree.set_parent_type(mob, datum).unwrap();
    tree.finalize().unwrap();

    let entry = tree.proc(mob_bump).unwrap();
    assert!(!entry.is_override());
    assert_eq!(entry.super_proc, None);
    assert_eq!(tree.try_get_procedure(mob, "Bump"), Some(mob_bump));
    // The rest of the old chain still resolves to the original.
    assert_eq!(tree.try_get_procedure(ids[4], "Bump"), Some(atom_bump));
}

#[test]
fn parent_cycle_is_rejected() {
    let (mut tree, ids) = hierarchy();
    let (atom, mob) = (ids[0], ids[2]);
    assert!(matches!(
        tree.set_parent_type(atom, mob),
        Err(RegistryError::CircularInheritance(_))
    ));
    assert!(matches!(
        tree.set_parent_type(atom, atom),
        Err(RegistryError::CircularInheritance(_))
    ));
    // The rejected link leaves the hierarchy usable.
    tree.new_proc(mob, "Life", ProcFlags::empty()).unwrap();
    tree.finalize().unwrap();
    assert!(tree.is_subtype_of(mob, atom));
}

#[test]
fn procs_cannot_be_added_after_finalize() {
    let (mut tree, ids) = hierarchy();
    tree.finalize().unwrap();
    let count = tree.proc_count();
    assert_eq!(
        tree.new_proc(ids[0], "Late", ProcFlags::empty()),
        Err(RegistryError::AlreadyFinalized)
    );
    assert_eq!(tree.proc_count(), count);
}

#[test]
fn root_cannot_be_reparented() {
    let (mut tree, ids) = hierarchy();
    assert_eq!(
        tree.set_parent_type(TypeId::ROOT, ids[0]),
        Err(RegistryError::RootHasParent)
    );
}

#[test]
fn finalized_tree_rejects_new_types() {
    let (mut tree, _) = hierarchy();
    tree.finalize().unwrap();
    assert_eq!(tree.finalize(), Err(RegistryError::AlreadyFinalized));
    assert!(tree.declare_str("/late").is_err());
}

// =============================================================================
// Variables, verbs and globals
// =============================================================================

#[test]
fn variables_are_copied_on_declare() {
    let mut tree = ObjectTree::new();
    let mob = tree.declare_str("/mob").unwrap();
    tree.set_variable(mob, "health", InitialValue::Number(100.0))
        .unwrap();
    let player = tree.declare_str("/mob/player").unwrap();
    assert_eq!(
        tree.ty(player).unwrap().variable("health"),
        Some(&InitialValue::Number(100.0))
    );
    tree.set_variable(player, "health", InitialValue::Number(150.0))
        .unwrap();

    assert_eq!(
        tree.ty(mob).unwrap().variable("health"),
        Some(&InitialValue::Number(100.0))
    );
    assert_eq!(
        tree.ty(player).unwrap().variable("health"),
        Some(&InitialValue::Number(150.0))
    );
}

#[test]
fn global_variables_share_slots() {
    let mut tree = ObjectTree::new();
    let mob = tree.declare_str("/mob").unwrap();
    let slot = tree.add_global_variable(mob, "count").unwrap();
    let player = tree.declare_str("/mob/player").unwrap();

    assert_eq!(tree.ty(player).unwrap().global_variable("count"), Some(slot));
    assert_eq!(tree.global_variable_name(slot), Some("count"));
    assert_eq!(tree.global_variable_count(), 1);
}

#[test]
fn specialized_record_is_independent() {
    let mut tree = ObjectTree::new();
    let mob = tree.declare_str("/mob").unwrap();
    let login = tree.new_proc(mob, "Login", ProcFlags::empty()).unwrap();
    let player = tree.declare_str("/mob/player").unwrap();

    let original = tree.ty(player).unwrap();
    let mut copy = original.specialize();
    copy.set_variable("name", InitialValue::String("guest".to_string()));

    assert!(original.variable("name").is_none());
    assert_eq!(copy.parent(), original.parent());
    assert_eq!(copy.try_get_procedure(&tree, "Login"), Some(login));
}

#[test]
fn verbs_are_flagged() {
    let mut tree = ObjectTree::new();
    let mob = tree.declare_str("/mob").unwrap();
    let say = tree.new_proc(mob, "Say", ProcFlags::empty()).unwrap();
    tree.add_verb(mob, say).unwrap();

    assert_eq!(tree.ty(mob).unwrap().verbs(), &[say]);
    assert!(tree.proc(say).unwrap().flags.contains(ProcFlags::VERB));
}

#[test]
fn global_proc_table() {
    let mut tree = ObjectTree::new();
    let world = tree.register_global_proc("world_log", ProcFlags::empty()).unwrap();

    assert_eq!(tree.global_proc("world_log"), Some(world));
    assert!(tree.proc(world).unwrap().is_global());
    assert_eq!(
        tree.register_global_proc("world_log", ProcFlags::empty()),
        Err(RegistryError::DuplicateGlobalProc("world_log".to_string()))
    );
    assert_ne!(tree.global_init_proc(), world);
    assert_eq!(
        tree.proc(tree.global_init_proc()).unwrap().name,
        dmc::registry::GLOBAL_INIT_PROC
    );
}
