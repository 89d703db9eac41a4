//! Change notification routing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use arbor_tree::{ListenerId, NodeId, Tree, TreeEvent};

type RouteHandler = Box<dyn FnMut(&Tree, &TreeEvent)>;

#[derive(Default)]
struct RouterState {
    routes: BTreeMap<NodeId, RouteHandler>,
}

/// Dispatches the tree's event stream to the handler bound to each event's
/// target node (the parent for child events, the node itself for property
/// changes). Events whose target has no binding are silently ignored: the
/// router may be one of several independent observers of a shared tree.
///
/// Dispatch is synchronous with the mutation that caused it, and handlers
/// must not re-enter the router; they receive only `&Tree` and the event.
pub struct EventRouter {
    state: Rc<RefCell<RouterState>>,
    listener: Option<ListenerId>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RouterState::default())),
            listener: None,
        }
    }

    /// Registers this router on the tree. A second call while attached is a
    /// no-op.
    pub fn attach(&mut self, tree: &mut Tree) {
        if self.listener.is_some() {
            return;
        }
        let state = Rc::clone(&self.state);
        self.listener = Some(tree.on_event(move |tree, event| {
            let target = event.target();
            let mut state = state.borrow_mut();
            if let Some(handler) = state.routes.get_mut(&target) {
                handler(tree, event);
            }
        }));
    }

    /// Unregisters from the tree; bindings are kept for a later re-attach.
    pub fn detach(&mut self, tree: &mut Tree) -> bool {
        match self.listener.take() {
            Some(id) => tree.off_event(id),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Binds `handler` to events targeting `node`, replacing any previous
    /// binding for that node.
    pub fn bind<F>(&mut self, node: NodeId, handler: F)
    where
        F: FnMut(&Tree, &TreeEvent) + 'static,
    {
        self.state
            .borrow_mut()
            .routes
            .insert(node, Box::new(handler));
    }

    pub fn unbind(&mut self, node: NodeId) -> bool {
        self.state.borrow_mut().routes.remove(&node).is_some()
    }

    pub fn binding_count(&self) -> usize {
        self.state.borrow().routes.len()
    }
}
