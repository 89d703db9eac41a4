//! Filter/sort helpers over a parent's child list.

use std::cmp::Ordering;

use arbor_tree::{NodeId, Tree};

type Predicate = Box<dyn Fn(&Tree, NodeId) -> bool>;
type Comparator = Box<dyn Fn(&Tree, NodeId, NodeId) -> Ordering>;

/// Accumulates filter clauses (ANDed) and comparators (applied
/// lexicographically, stable) over a parent's children. [`Query::search`]
/// never mutates the tree.
#[derive(Default)]
pub struct Query {
    predicates: Vec<Predicate>,
    comparators: Vec<Comparator>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Tree, NodeId) -> bool + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn order_by<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&Tree, NodeId, NodeId) -> Ordering + 'static,
    {
        self.comparators.push(Box::new(comparator));
        self
    }

    /// Children of `parent` matching every filter clause, sorted by the
    /// comparator chain. With no comparators the result keeps child order.
    pub fn search(&self, tree: &Tree, parent: NodeId) -> Vec<NodeId> {
        let mut hits: Vec<NodeId> = tree
            .children(parent)
            .iter()
            .copied()
            .filter(|child| self.predicates.iter().all(|p| p(tree, *child)))
            .collect();
        if !self.comparators.is_empty() {
            hits.sort_by(|a, b| {
                for comparator in &self.comparators {
                    match comparator(tree, *a, *b) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                Ordering::Equal
            });
        }
        hits
    }
}
