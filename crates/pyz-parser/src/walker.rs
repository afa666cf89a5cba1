//! Pre-order traversal over a subtree.

use crate::arena::NodeArena;
use crate::node::NodeIndex;

/// Visits nodes in pre-order, children in source order.
///
/// Implementors override [`visit_node`](ParseTreeWalker::visit_node) and
/// return `false` to skip a node's children (for example after walking them
/// by hand).
pub trait ParseTreeWalker {
    fn visit_node(&mut self, arena: &NodeArena, node: NodeIndex) -> bool;

    fn walk(&mut self, arena: &NodeArena, node: NodeIndex) {
        if self.visit_node(arena, node) {
            self.walk_children(arena, node);
        }
    }

    fn walk_children(&mut self, arena: &NodeArena, node: NodeIndex) {
        for child in arena.children(node) {
            self.walk(arena, child);
        }
    }
}
