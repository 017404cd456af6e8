//! Tree data structure implementation for MCTS
//!
//! Nodes live in a growable arena and refer to their parent and children by
//! index, so back-references for backpropagation need no shared ownership.

use std::collections::VecDeque;

/// Index of a node inside its [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the tree structure
///
/// # Type Parameters
/// - `T`: The data type stored in the node
#[derive(Debug)]
pub struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: T,
}

impl<T> Node<T> {
    /// Checks if this node is the root (has no parent)
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn get_parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.data
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Arena-backed tree. The root is always at index 0.
#[derive(Debug)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tree<T> {
    /// Creates a tree holding only a root with the given data.
    pub fn new_root(data: T) -> Self {
        Tree {
            nodes: vec![Node { parent: None, children: Vec::new(), data }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id.index()].data
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id.index()].data
    }

    /// Appends a child under `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent: Some(parent), children: Vec::new(), data });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Iterates from `id` up to the root, both included.
    pub fn path_to_root(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.node(current).parent)
    }

    /// Makes `id` the new root, dropping every node outside its subtree.
    /// Child order is preserved; ids held before the call are invalidated.
    pub fn reroot(&mut self, id: NodeId) {
        let mut slots: Vec<Option<Node<T>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes: Vec<Node<T>> = Vec::new();
        // (old id, new parent id)
        let mut queue: VecDeque<(NodeId, Option<NodeId>)> = VecDeque::from([(id, None)]);

        while let Some((old, parent)) = queue.pop_front() {
            let Some(node) = slots[old.index()].take() else { continue };
            let new_id = NodeId(nodes.len() as u32);

            if let Some(parent) = parent {
                nodes[parent.index()].children.push(new_id);
            }
            queue.extend(node.children.iter().map(|&child| (child, Some(new_id))));
            nodes.push(Node { parent, children: Vec::new(), data: node.data });
        }

        self.nodes = nodes;
    }
}
