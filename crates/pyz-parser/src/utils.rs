//! Node lookup helpers.

use crate::arena::NodeArena;
use crate::node::{Node, NodeIndex, NodeKind};

/// Deepest node whose range covers `offset`.
///
/// The end of a node's range counts as inside it, so an offset sitting right
/// after a name still finds that name. When two siblings both qualify the
/// earlier one wins. Returns `None` if `offset` lies outside `root`.
pub fn find_node_by_offset(arena: &NodeArena, root: NodeIndex, offset: u32) -> Option<NodeIndex> {
    let covers = |idx: NodeIndex| {
        arena
            .get(idx)
            .is_some_and(|node| node.range().overlaps_offset(offset))
    };

    if !covers(root) {
        return None;
    }

    let mut current = root;
    while let Some(child) = arena.children(current).into_iter().find(|&c| covers(c)) {
        current = child;
    }
    Some(current)
}

/// Whether the node is an expression (as opposed to a statement or a
/// structural node such as `Suite`, `Argument` or `Parameter`).
pub fn is_expression_node(node: &Node) -> bool {
    is_expression_kind(node.kind())
}

pub fn is_expression_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Error
            | NodeKind::UnaryOperation
            | NodeKind::BinaryOperation
            | NodeKind::AssignmentExpression
            | NodeKind::TypeAnnotation
            | NodeKind::Await
            | NodeKind::Ternary
            | NodeKind::Unpack
            | NodeKind::Tuple
            | NodeKind::Call
            | NodeKind::ListComprehension
            | NodeKind::Index
            | NodeKind::Slice
            | NodeKind::Yield
            | NodeKind::YieldFrom
            | NodeKind::MemberAccess
            | NodeKind::Lambda
            | NodeKind::Name
            | NodeKind::Constant
            | NodeKind::Ellipsis
            | NodeKind::Number
            | NodeKind::String
            | NodeKind::FormatString
            | NodeKind::StringList
            | NodeKind::Dictionary
            | NodeKind::List
            | NodeKind::Set
    )
}
