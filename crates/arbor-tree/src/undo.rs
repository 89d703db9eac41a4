//! Undo/redo transaction context.
//!
//! Mutating [`Tree`] operations take an explicit `Option<&mut UndoManager>`;
//! `None` means the operation is not undoable. The manager records forward
//! ops and replays inverses (undo) or forwards (redo) through the ordinary
//! tree mutators, so listeners observe undo as a normal sequence of
//! structural events.

use serde_json::Value;

use crate::tree::{NodeId, Tree, TreeError};

#[derive(Debug, Clone)]
pub(crate) enum TreeOp {
    InsertChild {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
    RemoveChild {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },
    MoveChild {
        parent: NodeId,
        from: usize,
        to: usize,
    },
    SetProperty {
        node: NodeId,
        key: String,
        previous: Option<Value>,
        next: Option<Value>,
    },
}

#[derive(Debug, Default)]
struct Transaction {
    name: String,
    ops: Vec<TreeOp>,
}

/// Grouped undo/redo history for one [`Tree`].
///
/// Ops recorded between calls to
/// [`begin_new_transaction`](UndoManager::begin_new_transaction) form one
/// undoable unit. Recording anything clears the redo stack.
#[derive(Debug, Default)]
pub struct UndoManager {
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
    current: Option<Transaction>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the currently open op group and starts a named one.
    pub fn begin_new_transaction(&mut self, name: impl Into<String>) {
        self.commit_current();
        self.current = Some(Transaction {
            name: name.into(),
            ops: Vec::new(),
        });
    }

    pub fn can_undo(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.ops.is_empty()) || !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Name of the transaction [`undo`](UndoManager::undo) would revert.
    pub fn undo_name(&self) -> Option<&str> {
        match &self.current {
            Some(t) if !t.ops.is_empty() => Some(t.name.as_str()),
            _ => self.undo.last().map(|t| t.name.as_str()),
        }
    }

    /// Drops all history without touching the tree.
    pub fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.current = None;
    }

    /// Reverts the most recent transaction. Returns `Ok(false)` when there
    /// is nothing to undo.
    pub fn undo(&mut self, tree: &mut Tree) -> Result<bool, TreeError> {
        self.commit_current();
        let Some(txn) = self.undo.pop() else {
            return Ok(false);
        };
        for op in txn.ops.iter().rev() {
            apply_inverse(tree, op)?;
        }
        self.redo.push(txn);
        Ok(true)
    }

    /// Re-applies the most recently undone transaction. Returns `Ok(false)`
    /// when there is nothing to redo.
    pub fn redo(&mut self, tree: &mut Tree) -> Result<bool, TreeError> {
        let Some(txn) = self.redo.pop() else {
            return Ok(false);
        };
        for op in &txn.ops {
            apply_forward(tree, op)?;
        }
        self.undo.push(txn);
        Ok(true)
    }

    pub(crate) fn record(&mut self, op: TreeOp) {
        self.redo.clear();
        self.current
            .get_or_insert_with(Transaction::default)
            .ops
            .push(op);
    }

    fn commit_current(&mut self) {
        if let Some(txn) = self.current.take() {
            if !txn.ops.is_empty() {
                self.undo.push(txn);
            }
        }
    }
}

fn apply_inverse(tree: &mut Tree, op: &TreeOp) -> Result<(), TreeError> {
    match op {
        TreeOp::InsertChild { parent, index, child } => {
            let removed = tree.remove_child(*parent, *index, None)?;
            debug_assert_eq!(removed, *child, "undo history out of sync with tree");
            Ok(())
        }
        TreeOp::RemoveChild { parent, index, child } => {
            tree.insert_child(*parent, *index, *child, None)
        }
        TreeOp::MoveChild { parent, from, to } => tree.move_child(*parent, *to, *from, None),
        TreeOp::SetProperty {
            node,
            key,
            previous,
            ..
        } => tree.apply_property(*node, key, previous.clone()),
    }
}

fn apply_forward(tree: &mut Tree, op: &TreeOp) -> Result<(), TreeError> {
    match op {
        TreeOp::InsertChild { parent, index, child } => {
            tree.insert_child(*parent, *index, *child, None)
        }
        TreeOp::RemoveChild { parent, index, child } => {
            let removed = tree.remove_child(*parent, *index, None)?;
            debug_assert_eq!(removed, *child, "redo history out of sync with tree");
            Ok(())
        }
        TreeOp::MoveChild { parent, from, to } => tree.move_child(*parent, *from, *to, None),
        TreeOp::SetProperty { node, key, next, .. } => {
            tree.apply_property(*node, key, next.clone())
        }
    }
}
