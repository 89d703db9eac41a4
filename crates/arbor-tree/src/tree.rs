use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::events::{ListenerId, TreeEvent};
use crate::undo::{TreeOp, UndoManager};

/// Generational handle to a node in a [`Tree`] arena.
///
/// Identity is handle equality. Once the node is released and its slot
/// reused, old handles become stale: every accessor treats them as unknown
/// rather than resolving them to the slot's new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("stale or unknown node handle")]
    StaleNode,
    #[error("node is not a child of the given parent")]
    NotAChild,
    #[error("child index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("node already has a parent")]
    AlreadyParented,
    #[error("operation would create a cycle")]
    Cycle,
    #[error("node is still attached to a parent")]
    StillAttached,
    #[error("invalid tree snapshot: {0}")]
    BadSnapshot(String),
}

#[derive(Debug)]
struct NodeData {
    kind: String,
    props: IndexMap<String, Value>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

type Listener = Box<dyn FnMut(&Tree, &TreeEvent)>;

/// Ordered, mutable, observable tree of kind-tagged property nodes.
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            listeners: BTreeMap::new(),
            next_listener_id: 1,
        }
    }

    // --- node allocation ---

    /// Allocates a detached node with the given kind tag. No event is
    /// emitted; the node becomes observable once inserted under a parent.
    pub fn create_node(&mut self, kind: impl Into<String>) -> NodeId {
        let data = NodeData {
            kind: kind.into(),
            props: IndexMap::new(),
            children: Vec::new(),
            parent: None,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(data);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Frees a detached subtree's slots. The node (and every descendant)
    /// becomes stale; undo history referring to it will fail with
    /// [`TreeError::StaleNode`] if replayed.
    pub fn release(&mut self, node: NodeId) -> Result<(), TreeError> {
        if self.data(node)?.parent.is_some() {
            return Err(TreeError::StillAttached);
        }
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let slot = &mut self.slots[id.index as usize];
            if let Some(data) = slot.data.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                pending.extend(data.children);
            }
        }
        Ok(())
    }

    // --- read access ---

    pub fn contains(&self, node: NodeId) -> bool {
        self.data(node).is_ok()
    }

    pub fn kind(&self, node: NodeId) -> Option<&str> {
        self.data(node).ok().map(|d| d.kind.as_str())
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).ok().and_then(|d| d.parent)
    }

    pub fn child_count(&self, parent: NodeId) -> usize {
        self.data(parent).map(|d| d.children.len()).unwrap_or(0)
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.data(parent).ok().and_then(|d| d.children.get(index).copied())
    }

    pub fn children(&self, parent: NodeId) -> &[NodeId] {
        self.data(parent).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    /// Position of `child` among `parent`'s full child list.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.data(parent)
            .ok()
            .and_then(|d| d.children.iter().position(|c| *c == child))
    }

    pub fn property(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.data(node).ok().and_then(|d| d.props.get(key))
    }

    /// Property keys in insertion order.
    pub fn property_names(&self, node: NodeId) -> Vec<String> {
        self.data(node)
            .map(|d| d.props.keys().cloned().collect())
            .unwrap_or_default()
    }

    // --- listeners ---

    pub fn on_event<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Tree, &TreeEvent) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        ListenerId(id)
    }

    pub fn off_event(&mut self, listener_id: ListenerId) -> bool {
        self.listeners.remove(&listener_id.0).is_some()
    }

    fn emit(&mut self, event: TreeEvent) {
        if self.listeners.is_empty() {
            return;
        }
        // Listeners receive `&Tree`, so none of them can register or
        // unregister during dispatch; the registry is simply moved out and
        // back around the calls.
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.values_mut() {
            listener(self, &event);
        }
        self.listeners = listeners;
    }

    // --- structural mutation ---

    pub fn append_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child, txn)
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        if self.data(child)?.parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        // Walk up from the parent; inserting an ancestor under its own
        // descendant (or a node under itself) would close a cycle.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(TreeError::Cycle);
            }
            cursor = self.data(id)?.parent;
        }
        let parent_data = self.data_mut(parent)?;
        if index > parent_data.children.len() {
            return Err(TreeError::IndexOutOfRange(index));
        }
        parent_data.children.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        if let Some(um) = txn {
            um.record(TreeOp::InsertChild { parent, index, child });
        }
        self.emit(TreeEvent::ChildAdded { parent, child, index });
        Ok(())
    }

    /// Detaches (does not free) the child at `index`. The removed subtree
    /// stays alive and can be re-inserted, which is what undo relies on.
    pub fn remove_child(
        &mut self,
        parent: NodeId,
        index: usize,
        txn: Option<&mut UndoManager>,
    ) -> Result<NodeId, TreeError> {
        let parent_data = self.data_mut(parent)?;
        if index >= parent_data.children.len() {
            return Err(TreeError::IndexOutOfRange(index));
        }
        let child = parent_data.children.remove(index);
        self.data_mut(child)?.parent = None;
        if let Some(um) = txn {
            um.record(TreeOp::RemoveChild { parent, index, child });
        }
        self.emit(TreeEvent::ChildRemoved {
            parent,
            child,
            old_index: index,
        });
        Ok(child)
    }

    /// Detaches `child` from `parent` by identity; returns the index it
    /// held.
    pub fn remove_child_node(
        &mut self,
        parent: NodeId,
        child: NodeId,
        txn: Option<&mut UndoManager>,
    ) -> Result<usize, TreeError> {
        let index = self.index_of(parent, child).ok_or(TreeError::NotAChild)?;
        self.remove_child(parent, index, txn)?;
        Ok(index)
    }

    /// Removes children from last to first, so each emitted `old_index`
    /// refers to a position that was stable when the event fired.
    pub fn remove_all_children(
        &mut self,
        parent: NodeId,
        mut txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        while self.child_count(parent) > 0 {
            let last = self.child_count(parent) - 1;
            self.remove_child(parent, last, txn.as_deref_mut())?;
        }
        Ok(())
    }

    pub fn move_child(
        &mut self,
        parent: NodeId,
        from: usize,
        to: usize,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        let parent_data = self.data_mut(parent)?;
        let len = parent_data.children.len();
        if from >= len {
            return Err(TreeError::IndexOutOfRange(from));
        }
        if to >= len {
            return Err(TreeError::IndexOutOfRange(to));
        }
        if from == to {
            return Ok(());
        }
        let child = parent_data.children.remove(from);
        parent_data.children.insert(to, child);
        if let Some(um) = txn {
            um.record(TreeOp::MoveChild { parent, from, to });
        }
        self.emit(TreeEvent::ChildOrderChanged {
            parent,
            child,
            old_index: from,
            new_index: to,
        });
        Ok(())
    }

    // --- property mutation ---

    /// Sets a property. Writing a value equal to the stored one is a silent
    /// no-op: no event, no undo record.
    pub fn set_property(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: Value,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        let key = key.into();
        let data = self.data_mut(node)?;
        let previous = data.props.get(&key).cloned();
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }
        data.props.insert(key.clone(), value.clone());
        if let Some(um) = txn {
            um.record(TreeOp::SetProperty {
                node,
                key: key.clone(),
                previous,
                next: Some(value),
            });
        }
        self.emit(TreeEvent::PropertyChanged { node, key });
        Ok(())
    }

    /// Removes a property; returns `false` (and stays silent) if the key
    /// was absent.
    pub fn remove_property(
        &mut self,
        node: NodeId,
        key: &str,
        txn: Option<&mut UndoManager>,
    ) -> Result<bool, TreeError> {
        let data = self.data_mut(node)?;
        let Some(previous) = data.props.shift_remove(key) else {
            return Ok(false);
        };
        if let Some(um) = txn {
            um.record(TreeOp::SetProperty {
                node,
                key: key.to_owned(),
                previous: Some(previous),
                next: None,
            });
        }
        self.emit(TreeEvent::PropertyChanged {
            node,
            key: key.to_owned(),
        });
        Ok(true)
    }

    /// Replay helper for the undo manager: applies `Some(value)` as a set
    /// and `None` as a removal, without recording.
    pub(crate) fn apply_property(
        &mut self,
        node: NodeId,
        key: &str,
        value: Option<Value>,
    ) -> Result<(), TreeError> {
        match value {
            Some(v) => self.set_property(node, key, v, None),
            None => self.remove_property(node, key, None).map(|_| ()),
        }
    }

    // --- JSON snapshots ---

    /// Snapshot of a subtree as `{"kind", "props", "children"}`. Replaces
    /// wire/file codecs, which this crate does not define.
    pub fn to_value(&self, node: NodeId) -> Option<Value> {
        let data = self.data(node).ok()?;
        let props: serde_json::Map<String, Value> = data
            .props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let children: Vec<Value> = data
            .children
            .iter()
            .filter_map(|c| self.to_value(*c))
            .collect();
        Some(serde_json::json!({
            "kind": data.kind,
            "props": props,
            "children": children,
        }))
    }

    /// Builds a detached subtree from a [`to_value`](Tree::to_value)-shaped
    /// snapshot. Emits no events and records no undo history.
    pub fn from_value(&mut self, value: &Value) -> Result<NodeId, TreeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TreeError::BadSnapshot("expected object".into()))?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| TreeError::BadSnapshot("missing \"kind\"".into()))?
            .to_owned();
        let node = self.create_node(kind);
        if let Some(props) = obj.get("props") {
            let props = props
                .as_object()
                .ok_or_else(|| TreeError::BadSnapshot("\"props\" must be an object".into()))?;
            let data = self.data_mut(node)?;
            for (k, v) in props {
                data.props.insert(k.clone(), v.clone());
            }
        }
        if let Some(children) = obj.get("children") {
            let children = children
                .as_array()
                .ok_or_else(|| TreeError::BadSnapshot("\"children\" must be an array".into()))?;
            for child_value in children {
                let child = self.from_value(child_value)?;
                // Direct attachment: the subtree is not observable yet.
                self.data_mut(child)?.parent = Some(node);
                self.data_mut(node)?.children.push(child);
            }
        }
        Ok(node)
    }

    // --- slot access ---

    fn data(&self, node: NodeId) -> Result<&NodeData, TreeError> {
        self.slots
            .get(node.index as usize)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.data.as_ref())
            .ok_or(TreeError::StaleNode)
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData, TreeError> {
        self.slots
            .get_mut(node.index as usize)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.data.as_mut())
            .ok_or(TreeError::StaleNode)
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &(self.slots.len() - self.free.len()))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
