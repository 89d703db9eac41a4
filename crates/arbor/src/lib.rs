//! Typed convenience layer over the [`arbor_tree`] value tree.
//!
//! Application code declares wrapper types bound to tree nodes instead of
//! calling the tree API directly:
//!
//! - [`Object`] binds a node and offers capability-checked typed property
//!   access ([`Lookup`] never errors on a missing or mistyped value).
//! - [`EventRouter`] forwards the tree's synchronous change stream to the
//!   observer bound to each event's target node.
//! - [`ObjectList`] mirrors the admissible subset of one parent's children
//!   as an owned, ordered list of wrapper objects, kept consistent under
//!   child add/remove/reorder (including those replayed by undo).
//! - [`TreePath`] and [`Query`] restore kind-named path lookup and
//!   filter/sort helpers over child lists.
//!
//! Everything here is single-threaded by construction: shared observer
//! state is `Rc<RefCell<_>>`, so cross-thread use fails to compile rather
//! than race.

pub mod list;
pub mod object;
pub mod path;
pub mod query;
pub mod router;

pub use arbor_tree::{ListenerId, NodeId, Tree, TreeError, TreeEvent, UndoManager};
pub use list::{ListModel, ObjectList};
pub use object::{AttrError, Creation, Lookup, NodeBacked, Object};
pub use path::{PathError, TreePath};
pub use query::Query;
pub use router::EventRouter;
