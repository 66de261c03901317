//! The object definition model.
//!
//! [`ObjectTree`] owns every [`TypeRecord`] and [`ProcEntry`] in two arenas
//! indexed by [`TypeId`](dmc_core::TypeId) and [`ProcId`](dmc_core::ProcId).
//! Records refer to their parent by id, never by handle.
//!
//! # Phases
//!
//! The tree is built single-threaded during declaration collection:
//! types are declared (possibly ahead of their bodies), procedures and
//! variables are attached, and [`ObjectTree::finalize`] fixes the hierarchy.
//! Expression lowering then only ever borrows `&ObjectTree`, so the tree and
//! its global procedure table are read-only for the whole lowering phase and
//! can be shared between workers.
//!
//! ```
//! use dmc_core::ProcFlags;
//! use dmc_registry::ObjectTree;
//!
//! let mut tree = ObjectTree::new();
//! let mob = tree.declare_str("/mob").unwrap();
//! let player = tree.declare_str("/mob/player").unwrap();
//! let login = tree.new_proc(mob, "Login", ProcFlags::empty()).unwrap();
//! let player_login = tree.new_proc(player, "Login", ProcFlags::empty()).unwrap();
//! tree.finalize().unwrap();
//!
//! assert_eq!(tree.proc(player_login).unwrap().super_proc, Some(login));
//! assert!(tree.is_subtype_of(player, mob));
//! ```

mod proc_entry;
mod record;
mod tree;

pub use proc_entry::ProcEntry;
pub use record::{InitialValue, TypeRecord};
pub use tree::{GLOBAL_INIT_PROC, ObjectTree};
