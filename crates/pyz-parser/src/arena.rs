//! Node arena for syntax tree storage.

use crate::node::{ChildList, Node, NodeData, NodeIndex, NodeKind};
use pyz_common::TextRange;

/// Arena-based storage for syntax nodes.
/// Nodes are stored contiguously and referenced by index, in creation order.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node covering `[start, end)` and return its index.
    ///
    /// Children are always created before their parent, so this is where the
    /// parent links get filled in. The stored range is widened to cover every
    /// child.
    pub fn add(&mut self, start: u32, end: u32, data: NodeData) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        let mut lo = start;
        let mut hi = end.max(start);

        for child in data.children() {
            self.set_parent(child, index);
            if let Some(node) = self.nodes.get(child.0 as usize) {
                lo = lo.min(node.start);
                hi = hi.max(node.end());
            }
        }

        self.nodes.push(Node {
            start: lo,
            length: hi - lo,
            parent: None,
            data,
        });
        index
    }

    #[inline]
    fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(child.0 as usize) {
            node.parent = Some(parent);
        }
    }

    /// Get a node by index
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index.0 as usize)
    }

    pub fn kind(&self, index: NodeIndex) -> Option<NodeKind> {
        self.get(index).map(Node::kind)
    }

    pub fn range(&self, index: NodeIndex) -> Option<TextRange> {
        self.get(index).map(Node::range)
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.get(index).and_then(|node| node.parent)
    }

    /// Children of a node in source order.
    pub fn children(&self, index: NodeIndex) -> ChildList {
        self.get(index)
            .map(|node| node.data.children())
            .unwrap_or_default()
    }

    /// Widen a node's range. Only valid before the node has a parent.
    pub fn extend_range(&mut self, index: NodeIndex, start: u32, end: u32) {
        if let Some(node) = self.get_mut(index) {
            debug_assert!(node.parent.is_none());
            let lo = node.start.min(start);
            let hi = node.end().max(end);
            node.start = lo;
            node.length = hi - lo;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i as u32), node))
    }
}

impl std::ops::Index<NodeIndex> for NodeArena {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0 as usize]
    }
}
