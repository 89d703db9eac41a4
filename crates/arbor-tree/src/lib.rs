//! Arena-based observable value tree.
//!
//! A [`Tree`] owns an arena of nodes, each carrying a kind tag, an
//! insertion-ordered property map of [`serde_json::Value`]s, and an ordered
//! child list. Instead of shared pointers, all node references are
//! generational [`NodeId`] handles into the arena, so a stale handle can be
//! detected but never aliases a live node.
//!
//! Every structural or property mutation emits exactly one [`TreeEvent`] to
//! the registered listeners, synchronously, after the tree has reached its
//! new state. Mutating operations accept an optional [`UndoManager`]
//! transaction context; passing `None` makes the operation non-undoable.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`tree`] | [`Tree`], [`NodeId`], listener registry, JSON snapshots |
//! | [`events`] | [`TreeEvent`], [`ListenerId`] |
//! | [`undo`] | [`UndoManager`], transaction grouping, undo/redo replay |

pub mod events;
pub mod tree;
pub mod undo;

pub use events::{ListenerId, TreeEvent};
pub use tree::{NodeId, Tree, TreeError};
pub use undo::UndoManager;
