use std::cell::RefCell;
use std::rc::Rc;

use arbor::{EventRouter, Tree, TreeEvent};
use serde_json::json;

#[test]
fn child_events_route_to_the_parent_binding() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let root = tree.create_node("root");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    router.bind(root, move |_, event| sink.borrow_mut().push(event.clone()));
    router.attach(&mut tree);

    let child = tree.create_node("item");
    tree.append_child(root, child, None).unwrap();
    tree.remove_child(root, 0, None).unwrap();

    let log = seen.borrow();
    assert_eq!(log.len(), 2);
    assert!(matches!(log[0], TreeEvent::ChildAdded { parent, .. } if parent == root));
    assert!(matches!(log[1], TreeEvent::ChildRemoved { parent, .. } if parent == root));
}

#[test]
fn property_events_route_to_the_node_itself() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let root = tree.create_node("root");
    let child = tree.create_node("item");
    tree.append_child(root, child, None).unwrap();

    let root_hits = Rc::new(RefCell::new(0usize));
    let child_hits = Rc::new(RefCell::new(0usize));
    let root_sink = Rc::clone(&root_hits);
    let child_sink = Rc::clone(&child_hits);
    router.bind(root, move |_, _| *root_sink.borrow_mut() += 1);
    router.bind(child, move |_, _| *child_sink.borrow_mut() += 1);
    router.attach(&mut tree);

    tree.set_property(child, "name", json!("a"), None).unwrap();
    assert_eq!(*root_hits.borrow(), 0);
    assert_eq!(*child_hits.borrow(), 1);
}

#[test]
fn events_for_unbound_targets_are_silently_ignored() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let observed = tree.create_node("observed");
    let foreign = tree.create_node("foreign");

    let hits = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&hits);
    router.bind(observed, move |_, _| *sink.borrow_mut() += 1);
    router.attach(&mut tree);

    let child = tree.create_node("item");
    tree.append_child(foreign, child, None).unwrap();
    tree.set_property(foreign, "x", json!(1), None).unwrap();
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn handlers_observe_post_mutation_state() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let root = tree.create_node("root");

    let counts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&counts);
    router.bind(root, move |tree, event| {
        sink.borrow_mut().push(tree.child_count(event.target()));
    });
    router.attach(&mut tree);

    let a = tree.create_node("item");
    let b = tree.create_node("item");
    tree.append_child(root, a, None).unwrap();
    tree.append_child(root, b, None).unwrap();
    tree.remove_child(root, 0, None).unwrap();
    assert_eq!(*counts.borrow(), vec![1, 2, 1]);
}

#[test]
fn detach_stops_routing_and_keeps_bindings() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let root = tree.create_node("root");

    let hits = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&hits);
    router.bind(root, move |_, _| *sink.borrow_mut() += 1);
    router.attach(&mut tree);
    assert!(router.is_attached());

    let a = tree.create_node("item");
    tree.append_child(root, a, None).unwrap();
    assert!(router.detach(&mut tree));
    assert!(!router.is_attached());

    let b = tree.create_node("item");
    tree.append_child(root, b, None).unwrap();
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(router.binding_count(), 1);

    router.attach(&mut tree);
    let c = tree.create_node("item");
    tree.append_child(root, c, None).unwrap();
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn unbind_removes_a_single_route() {
    let mut tree = Tree::new();
    let mut router = EventRouter::new();
    let root = tree.create_node("root");
    router.bind(root, |_, _| {});
    assert_eq!(router.binding_count(), 1);
    assert!(router.unbind(root));
    assert!(!router.unbind(root));
    assert_eq!(router.binding_count(), 0);
}
