//! Kind-named path lookup.
//!
//! Paths are slash-separated node kinds resolved relative to a start node:
//! `"settings/audio/device"` descends to the first child of each named
//! kind. `".."` climbs to the parent and a leading `/` climbs to the root
//! before descending.

use thiserror::Error;

use arbor_tree::{NodeId, Tree, TreeError, UndoManager};

#[derive(Debug, Error)]
pub enum PathError {
    #[error("empty path segment")]
    EmptySegment,
    #[error("`..` segment has no parent to resolve to")]
    NoParent,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Kind(String),
    Parent,
    Root,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        let rest = match path.strip_prefix('/') {
            Some(rest) => {
                segments.push(Segment::Root);
                rest
            }
            None => path,
        };
        if !rest.is_empty() {
            for token in rest.split('/') {
                match token {
                    "" => return Err(PathError::EmptySegment),
                    ".." => segments.push(Segment::Parent),
                    kind => segments.push(Segment::Kind(kind.to_owned())),
                }
            }
        }
        Ok(Self { segments })
    }

    /// Resolves the path; `None` when any segment fails to resolve. An
    /// empty path resolves to `from`.
    pub fn find(&self, tree: &Tree, from: NodeId) -> Option<NodeId> {
        let mut cursor = from;
        for segment in &self.segments {
            cursor = match segment {
                Segment::Root => ascend(tree, cursor),
                Segment::Parent => tree.parent_of(cursor)?,
                Segment::Kind(kind) => child_of_kind(tree, cursor, kind)?,
            };
        }
        Some(cursor)
    }

    /// Resolves the path, creating missing kind-named children (appended,
    /// undoable via `txn`). `..` and `/` segments are never created: an
    /// unresolvable `..` is an error.
    pub fn find_or_create(
        &self,
        tree: &mut Tree,
        from: NodeId,
        mut txn: Option<&mut UndoManager>,
    ) -> Result<NodeId, PathError> {
        let mut cursor = from;
        for segment in &self.segments {
            cursor = match segment {
                Segment::Root => ascend(tree, cursor),
                Segment::Parent => tree.parent_of(cursor).ok_or(PathError::NoParent)?,
                Segment::Kind(kind) => match child_of_kind(tree, cursor, kind) {
                    Some(child) => child,
                    None => {
                        let child = tree.create_node(kind.clone());
                        tree.append_child(cursor, child, txn.as_deref_mut())?;
                        child
                    }
                },
            };
        }
        Ok(cursor)
    }
}

impl std::str::FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreePath::parse(s)
    }
}

fn ascend(tree: &Tree, node: NodeId) -> NodeId {
    let mut cursor = node;
    while let Some(parent) = tree.parent_of(cursor) {
        cursor = parent;
    }
    cursor
}

fn child_of_kind(tree: &Tree, parent: NodeId, kind: &str) -> Option<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .find(|child| tree.kind(*child) == Some(kind))
}
