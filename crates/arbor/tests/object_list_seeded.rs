//! Seeded differential run: a random interleaving of admissible and
//! non-admissible child insertions, removals, and moves, checked after every
//! step against a reference filter of the backing child list.

use arbor::{EventRouter, ListModel, NodeBacked, NodeId, Object, ObjectList, Tree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Item {
    obj: Object,
}

impl NodeBacked for Item {
    fn node(&self) -> NodeId {
        self.obj.node()
    }
}

#[derive(Default)]
struct ItemList {
    added: usize,
    removed: usize,
}

impl ListModel for ItemList {
    type Object = Item;

    fn admits(&self, tree: &Tree, child: NodeId) -> bool {
        tree.kind(child) == Some("item")
    }

    fn create(&mut self, tree: &Tree, child: NodeId) -> Option<Item> {
        Object::wrap(tree, child).ok().map(|obj| Item { obj })
    }

    fn on_object_added(&mut self, _object: &mut Item) {
        self.added += 1;
    }

    fn on_object_removed(&mut self, _object: &mut Item) {
        self.removed += 1;
    }
}

fn admissible(tree: &Tree, parent: NodeId) -> Vec<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|c| tree.kind(*c) == Some("item"))
        .collect()
}

fn mirrored(list: &ObjectList<ItemList>) -> Vec<NodeId> {
    (0..list.object_count())
        .map(|i| list.node_at(i).unwrap())
        .collect()
}

#[test]
fn seeded_random_mutations_preserve_bijection_and_order() {
    for seed in [7u64, 1217, 90210, 8675309] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tree = Tree::new();
        let mut router = EventRouter::new();
        let root = tree.create_node("list");

        let mut list = ObjectList::new(root, ItemList::default());
        list.rebuild(&mut tree, None).unwrap();
        list.attach(&mut router);
        router.attach(&mut tree);

        let mut admitted_inserts = 0usize;
        let mut admitted_removals = 0usize;

        for step in 0..400 {
            let count = tree.child_count(root);
            match rng.gen_range(0..100) {
                // Insert at a random position, 1 in 3 non-admissible.
                0..=49 => {
                    let kind = if rng.gen_range(0..3) == 0 { "noise" } else { "item" };
                    let child = tree.create_node(kind);
                    let index = rng.gen_range(0..=count);
                    tree.insert_child(root, index, child, None).unwrap();
                    if kind == "item" {
                        admitted_inserts += 1;
                    }
                }
                // Remove a random child.
                50..=79 => {
                    if count > 0 {
                        let index = rng.gen_range(0..count);
                        let child = tree.child_at(root, index).unwrap();
                        let was_item = tree.kind(child) == Some("item");
                        tree.remove_child(root, index, None).unwrap();
                        if was_item {
                            admitted_removals += 1;
                        }
                    }
                }
                // Move a random child.
                _ => {
                    if count > 1 {
                        let from = rng.gen_range(0..count);
                        let to = rng.gen_range(0..count);
                        tree.move_child(root, from, to, None).unwrap();
                    }
                }
            }

            let expected = admissible(&tree, root);
            assert_eq!(
                mirrored(&list),
                expected,
                "mirror diverged at seed {seed} step {step}"
            );
            assert_eq!(list.object_count(), expected.len());
        }

        assert_eq!(list.model().added, admitted_inserts, "seed {seed}");
        assert_eq!(list.model().removed, admitted_removals, "seed {seed}");

        list.free_objects();
    }
}
