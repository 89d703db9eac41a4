//! Node wrappers and capability-checked typed property access.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use arbor_tree::{NodeId, Tree, TreeError, UndoManager};

/// How a wrapper came to be bound to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    /// Bound to a node that already existed.
    Wrapped,
    /// Bound to a node the wrapper allocated itself.
    Initialized,
}

/// Result of a typed property read. A read never fails: a missing key or a
/// stored value that does not convert to `T` yields `Missing` carrying the
/// caller-supplied default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Missing(T),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn value(self) -> T {
        match self {
            Lookup::Found(v) | Lookup::Missing(v) => v,
        }
    }

    pub fn as_ref(&self) -> &T {
        match self {
            Lookup::Found(v) | Lookup::Missing(v) => v,
        }
    }
}

#[derive(Debug, Error)]
pub enum AttrError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("value does not serialize to JSON: {0}")]
    Serialize(String),
}

/// Seam for wrapper types that compose an [`Object`]; anything node-backed
/// can participate in an [`crate::ObjectList`].
pub trait NodeBacked {
    fn node(&self) -> NodeId;
}

/// Proxy bound 1:1 to a tree node. The binding never changes after
/// construction; equality is identity of the bound node.
#[derive(Debug, Clone, Copy)]
pub struct Object {
    node: NodeId,
    creation: Creation,
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Object {}

impl NodeBacked for Object {
    fn node(&self) -> NodeId {
        self.node
    }
}

impl Object {
    /// Binds to an existing node. No structural mutation.
    pub fn wrap(tree: &Tree, node: NodeId) -> Result<Self, TreeError> {
        if !tree.contains(node) {
            return Err(TreeError::StaleNode);
        }
        Ok(Self {
            node,
            creation: Creation::Wrapped,
        })
    }

    /// Allocates a new node of the given kind and, when `parent` is given,
    /// appends it there (exactly one child-list mutation).
    pub fn create(
        tree: &mut Tree,
        kind: &str,
        parent: Option<NodeId>,
        txn: Option<&mut UndoManager>,
    ) -> Result<Self, TreeError> {
        let node = tree.create_node(kind);
        if let Some(parent) = parent {
            tree.append_child(parent, node, txn)?;
        }
        Ok(Self {
            node,
            creation: Creation::Initialized,
        })
    }

    /// The bound node handle, for operations the wrapper API does not
    /// cover.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn creation(&self) -> Creation {
        self.creation
    }

    pub fn kind<'t>(&self, tree: &'t Tree) -> Option<&'t str> {
        tree.kind(self.node)
    }

    /// Typed property read; see [`Lookup`].
    pub fn get<T: DeserializeOwned>(&self, tree: &Tree, key: &str, default: T) -> Lookup<T> {
        match tree.property(self.node, key) {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(v) => Lookup::Found(v),
                Err(_) => Lookup::Missing(default),
            },
            None => Lookup::Missing(default),
        }
    }

    pub fn has(&self, tree: &Tree, key: &str) -> bool {
        tree.property(self.node, key).is_some()
    }

    pub fn set<T: Serialize>(
        &self,
        tree: &mut Tree,
        key: &str,
        value: T,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), AttrError> {
        let value = serde_json::to_value(value).map_err(|e| AttrError::Serialize(e.to_string()))?;
        tree.set_property(self.node, key, value, txn)?;
        Ok(())
    }

    /// Removes a property; `Ok(false)` when the key was absent.
    pub fn remove_attr(
        &self,
        tree: &mut Tree,
        key: &str,
        txn: Option<&mut UndoManager>,
    ) -> Result<bool, TreeError> {
        tree.remove_property(self.node, key, txn)
    }
}
