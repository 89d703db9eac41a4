//! Observed collection synchronizer.
//!
//! An [`ObjectList`] owns a sequence of wrapper objects mirroring the
//! admissible subset of one parent node's children, in child order. The
//! mirror is kept consistent by handling the tree's structural events,
//! normally delivered through an [`EventRouter`] binding on the parent
//! node. Invariants:
//!
//! - one wrapper per admissible child, and vice versa (bijection);
//! - wrapper order equals child order restricted to the admissible subset;
//! - a wrapper never outlives its child's membership in the parent.
//!
//! The list must be emptied ([`ObjectList::clear`] or
//! [`ObjectList::free_objects`]) before it is dropped; dropping a populated
//! list trips a fail-fast assertion in debug builds.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use arbor_tree::{NodeId, Tree, TreeError, TreeEvent, UndoManager};

use crate::object::NodeBacked;
use crate::router::EventRouter;

/// Required overrides (admission predicate and wrapper factory) plus
/// optional lifecycle hooks. Hooks run synchronously inside the triggering
/// event's dispatch, after the mirror has reached its new consistent state.
pub trait ListModel: 'static {
    type Object: NodeBacked + 'static;

    /// Whether `child` belongs in the mirror.
    fn admits(&self, tree: &Tree, child: NodeId) -> bool;

    /// Builds the wrapper for an admitted child. Returning `None` for an
    /// admitted child is an invariant violation (asserted in debug builds);
    /// the child is excluded, and during [`ObjectList::rebuild`] scheduled
    /// for removal from the tree.
    fn create(&mut self, tree: &Tree, child: NodeId) -> Option<Self::Object>;

    fn on_object_added(&mut self, _object: &mut Self::Object) {}

    fn on_object_removed(&mut self, _object: &mut Self::Object) {}

    /// `old_index` and `new_index` are positions in the parent's **full**
    /// child list, exactly as the tree reported them, not positions in the
    /// filtered mirror.
    fn on_order_changed(&mut self, _old_index: usize, _new_index: usize) {}
}

struct ListState<M: ListModel> {
    parent: NodeId,
    model: M,
    objects: Vec<M::Object>,
}

impl<M: ListModel> ListState<M> {
    fn handle(&mut self, tree: &Tree, event: &TreeEvent) {
        match event {
            TreeEvent::ChildAdded { parent, child, index } if *parent == self.parent => {
                if !self.model.admits(tree, *child) {
                    // Non-member children are left untouched outside rebuild.
                    return;
                }
                let Some(object) = self.model.create(tree, *child) else {
                    debug_assert!(false, "factory declined an admitted child");
                    return;
                };
                let position = if *index + 1 == tree.child_count(*parent) {
                    self.objects.len()
                } else {
                    // `index` is positional among all children while the
                    // mirror holds only the admissible subset, so insert by
                    // order key instead of copying the index.
                    let parent = self.parent;
                    self.objects
                        .iter()
                        .position(|existing| {
                            tree.index_of(parent, existing.node())
                                .is_some_and(|i| i > *index)
                        })
                        .unwrap_or(self.objects.len())
                };
                self.objects.insert(position, object);
                self.model.on_object_added(&mut self.objects[position]);
            }
            TreeEvent::ChildRemoved { parent, child, .. } if *parent == self.parent => {
                // Identity lookup: a never-admitted child finds no wrapper
                // and fires no hook.
                if let Some(position) = self.objects.iter().position(|o| o.node() == *child) {
                    let mut object = self.objects.remove(position);
                    self.model.on_object_removed(&mut object);
                }
            }
            TreeEvent::ChildOrderChanged {
                parent,
                old_index,
                new_index,
                ..
            } if *parent == self.parent => {
                self.sort_by_node_order(tree);
                self.model.on_order_changed(*old_index, *new_index);
            }
            _ => {}
        }
    }

    fn sort_by_node_order(&mut self, tree: &Tree) {
        let parent = self.parent;
        self.objects
            .sort_by_key(|o| tree.index_of(parent, o.node()).unwrap_or(usize::MAX));
    }
}

/// Typed mirror of the admissible children of one parent node.
pub struct ObjectList<M: ListModel> {
    state: Rc<RefCell<ListState<M>>>,
    parent: NodeId,
}

impl<M: ListModel> ObjectList<M> {
    pub fn new(parent: NodeId, model: M) -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState {
                parent,
                model,
                objects: Vec::new(),
            })),
            parent,
        }
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Routes this parent's structural events into the mirror.
    pub fn attach(&mut self, router: &mut EventRouter) {
        let state = Rc::clone(&self.state);
        router.bind(self.parent, move |tree, event| {
            state.borrow_mut().handle(tree, event);
        });
    }

    pub fn detach(&mut self, router: &mut EventRouter) -> bool {
        router.unbind(self.parent)
    }

    /// Populates the mirror from the parent's current children, then
    /// removes rejected children from the tree in descending index order.
    /// Must be called exactly once, on an empty mirror, before structural
    /// events are expected.
    pub fn rebuild(
        &mut self,
        tree: &mut Tree,
        mut txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        let mut rejected: Vec<usize> = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            debug_assert!(
                state.objects.is_empty(),
                "rebuild called on a populated list"
            );
            let children: Vec<NodeId> = tree.children(self.parent).to_vec();
            for (index, child) in children.into_iter().enumerate() {
                if !state.model.admits(tree, child) {
                    rejected.push(index);
                    continue;
                }
                match state.model.create(tree, child) {
                    Some(object) => state.objects.push(object),
                    None => {
                        debug_assert!(false, "factory declined an admitted child");
                        rejected.push(index);
                    }
                }
            }
        }
        // A list owns its admissible subset: children that failed admission
        // are deleted from the tree, not merely skipped. Descending order
        // keeps the remaining indices valid.
        for index in rejected.into_iter().rev() {
            tree.remove_child(self.parent, index, txn.as_deref_mut())?;
        }
        Ok(())
    }

    // --- read access ---

    pub fn object_count(&self) -> usize {
        self.state.borrow().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_count() == 0
    }

    /// Wrapper at `index`; `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Ref<'_, M::Object>> {
        Ref::filter_map(self.state.borrow(), |s| s.objects.get(index)).ok()
    }

    /// Read-only view of the mirrored sequence.
    pub fn objects(&self) -> Ref<'_, [M::Object]> {
        Ref::map(self.state.borrow(), |s| s.objects.as_slice())
    }

    /// Mirror position of the wrapper bound to `node`.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.state
            .borrow()
            .objects
            .iter()
            .position(|o| o.node() == node)
    }

    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.state.borrow().objects.get(index).map(|o| o.node())
    }

    pub fn model(&self) -> Ref<'_, M> {
        Ref::map(self.state.borrow(), |s| &s.model)
    }

    // --- reordering ---

    /// Moves the wrapper at mirror index `from` to mirror index `to` by
    /// moving the backing child. Out-of-range indices are silent no-ops.
    pub fn move_object(
        &mut self,
        tree: &mut Tree,
        from: usize,
        to: usize,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        if from == to {
            return Ok(());
        }
        let (Some(from_node), Some(to_node)) = (self.node_at(from), self.node_at(to)) else {
            return Ok(());
        };
        let (Some(tree_from), Some(tree_to)) = (
            tree.index_of(self.parent, from_node),
            tree.index_of(self.parent, to_node),
        ) else {
            return Ok(());
        };
        tree.move_child(self.parent, tree_from, tree_to, txn)?;
        // When routed, the event handler has already re-sorted; when not,
        // this brings the mirror up to date. Sorting twice is harmless and
        // fires no hooks.
        self.state.borrow_mut().sort_by_node_order(tree);
        Ok(())
    }

    /// Clamped no-op at index 0.
    pub fn move_up(
        &mut self,
        tree: &mut Tree,
        index: usize,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        if index == 0 || index >= self.object_count() {
            return Ok(());
        }
        self.move_object(tree, index, index - 1, txn)
    }

    /// Clamped no-op at the last index.
    pub fn move_down(
        &mut self,
        tree: &mut Tree,
        index: usize,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        let count = self.object_count();
        if count == 0 || index >= count - 1 {
            return Ok(());
        }
        self.move_object(tree, index, index + 1, txn)
    }

    // --- removal and teardown ---

    /// Removes the backing child of the wrapper bound to `node` from the
    /// tree; the wrapper is released (with its removal hook) exactly once,
    /// whether or not the list is routed.
    pub fn remove_object(
        &mut self,
        tree: &mut Tree,
        node: NodeId,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        tree.remove_child_node(self.parent, node, txn)?;
        self.reap(node);
        Ok(())
    }

    /// Removes every child of the parent from the tree, mirrored or not.
    pub fn remove_all_children(
        &mut self,
        tree: &mut Tree,
        txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        tree.remove_all_children(self.parent, txn)?;
        self.reap_all();
        Ok(())
    }

    /// Removes every mirrored child from the tree and releases its wrapper,
    /// leaving the mirror empty.
    pub fn clear(
        &mut self,
        tree: &mut Tree,
        mut txn: Option<&mut UndoManager>,
    ) -> Result<(), TreeError> {
        while let Some(node) = self.node_at(0) {
            tree.remove_child_node(self.parent, node, txn.as_deref_mut())?;
            self.reap(node);
        }
        Ok(())
    }

    /// Releases every wrapper without touching the tree and without firing
    /// hooks. Required before drop if the mirror is still populated.
    pub fn free_objects(&mut self) {
        self.state.borrow_mut().objects.clear();
    }

    /// Drops the wrapper bound to `node`, firing its removal hook, if the
    /// routed event handler has not already done so.
    fn reap(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if let Some(position) = state.objects.iter().position(|o| o.node() == node) {
            let mut object = state.objects.remove(position);
            state.model.on_object_removed(&mut object);
        }
    }

    fn reap_all(&self) {
        let mut state = self.state.borrow_mut();
        while let Some(mut object) = state.objects.pop() {
            state.model.on_object_removed(&mut object);
        }
    }
}

impl<M: ListModel> Drop for ObjectList<M> {
    fn drop(&mut self) {
        // Skipped while unwinding: a second panic in a destructor aborts
        // the process and swallows the original panic message.
        if std::thread::panicking() {
            return;
        }
        if let Ok(state) = self.state.try_borrow() {
            debug_assert!(
                state.objects.is_empty(),
                "ObjectList dropped while populated; call clear() or free_objects() first"
            );
        }
    }
}
