use crate::tree::NodeId;

/// Token returned by [`crate::Tree::on_event`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A structural or property change, delivered synchronously after the tree
/// has reached its new state. Child events report indices into the parent's
/// full child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    ChildAdded {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    ChildRemoved {
        parent: NodeId,
        child: NodeId,
        /// Index the child held before it was removed.
        old_index: usize,
    },
    ChildOrderChanged {
        parent: NodeId,
        child: NodeId,
        old_index: usize,
        new_index: usize,
    },
    PropertyChanged {
        node: NodeId,
        key: String,
    },
}

impl TreeEvent {
    /// The node an observer of this event is expected to be bound to: the
    /// parent for the three child events, the node itself for property
    /// changes.
    pub fn target(&self) -> NodeId {
        match self {
            TreeEvent::ChildAdded { parent, .. } => *parent,
            TreeEvent::ChildRemoved { parent, .. } => *parent,
            TreeEvent::ChildOrderChanged { parent, .. } => *parent,
            TreeEvent::PropertyChanged { node, .. } => *node,
        }
    }
}
