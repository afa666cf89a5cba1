//! Syntax tree node definitions.
//!
//! Nodes are stored in a [`NodeArena`](crate::NodeArena) and refer to each
//! other through [`NodeIndex`] handles. Child links live in [`NodeData`];
//! the parent link is an optional index on [`Node`], so the tree has no
//! ownership cycles.

use pyz_common::TextRange;
use pyz_scanner::{KeywordKind, NumberValue, OperatorKind, Token};
use serde::Serialize;
use smallvec::SmallVec;

/// Index of a node in its arena. Doubles as the node's id within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NodeKind {
    Error,
    Argument,
    Assert,
    Assignment,
    AssignmentExpression,
    AugmentedAssignment,
    Await,
    BinaryOperation,
    Break,
    Call,
    Class,
    Constant,
    Continue,
    Decorator,
    Del,
    Dictionary,
    DictionaryExpandEntry,
    DictionaryKeyEntry,
    Ellipsis,
    If,
    Import,
    ImportAs,
    ImportFrom,
    ImportFromAs,
    Index,
    Except,
    For,
    FormatString,
    Function,
    Global,
    Lambda,
    List,
    ListComprehension,
    ListComprehensionFor,
    ListComprehensionIf,
    MemberAccess,
    Module,
    ModuleName,
    Name,
    Nonlocal,
    Number,
    Parameter,
    Pass,
    Raise,
    Return,
    Set,
    Slice,
    StatementList,
    StringList,
    String,
    Suite,
    Ternary,
    Tuple,
    Try,
    TypeAnnotation,
    UnaryOperation,
    Unpack,
    While,
    With,
    WithItem,
    Yield,
    YieldFrom,
}

impl NodeKind {
    pub const COUNT: usize = NodeKind::YieldFrom as usize + 1;
}

/// What the parser expected when it produced an `Error` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ErrorCategory {
    MissingIn,
    MissingElse,
    MissingExpression,
    MissingIndexOrSlice,
    MissingDecoratorCallName,
    MissingCallCloseParen,
    MissingIndexCloseBracket,
    MissingMemberAccessName,
    MissingTupleCloseParen,
    MissingListCloseBracket,
    MissingFunctionParameterList,
    MaxDepthExceeded,
}

impl ErrorCategory {
    pub const COUNT: usize = ErrorCategory::MaxDepthExceeded as usize + 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ArgumentCategory {
    Simple,
    UnpackedList,
    UnpackedDictionary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ParameterCategory {
    Simple,
    VarArgList,
    VarArgDictionary,
}

/// Kind-specific node payload. Child fields are listed in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Error {
        category: ErrorCategory,
        child: Option<NodeIndex>,
    },
    Argument {
        category: ArgumentCategory,
        name: Option<NodeIndex>,
        value: NodeIndex,
    },
    Assert {
        test: NodeIndex,
        message: Option<NodeIndex>,
    },
    Assignment {
        left: NodeIndex,
        right: NodeIndex,
    },
    AssignmentExpression {
        name: NodeIndex,
        right: NodeIndex,
    },
    AugmentedAssignment {
        operator: OperatorKind,
        left: NodeIndex,
        right: NodeIndex,
    },
    Await {
        expression: NodeIndex,
    },
    BinaryOperation {
        operator: OperatorKind,
        operator_token: Token,
        left: NodeIndex,
        right: NodeIndex,
        parenthesized: bool,
    },
    Break,
    Call {
        left: NodeIndex,
        arguments: Vec<NodeIndex>,
    },
    Class {
        decorators: Vec<NodeIndex>,
        name: NodeIndex,
        arguments: Vec<NodeIndex>,
        suite: NodeIndex,
    },
    Constant {
        keyword: KeywordKind,
    },
    Continue,
    Decorator {
        expression: NodeIndex,
    },
    Del {
        targets: Vec<NodeIndex>,
    },
    Dictionary {
        entries: Vec<NodeIndex>,
    },
    DictionaryExpandEntry {
        expression: NodeIndex,
    },
    DictionaryKeyEntry {
        key: NodeIndex,
        value: NodeIndex,
    },
    Ellipsis,
    If {
        test: NodeIndex,
        if_suite: NodeIndex,
        else_suite: Option<NodeIndex>,
    },
    Import {
        list: Vec<NodeIndex>,
    },
    ImportAs {
        module: NodeIndex,
        alias: Option<NodeIndex>,
    },
    ImportFrom {
        module: NodeIndex,
        imports: Vec<NodeIndex>,
        is_wildcard_import: bool,
        wildcard_token: Option<Token>,
        uses_parens: bool,
        missing_import_keyword: bool,
    },
    ImportFromAs {
        name: NodeIndex,
        alias: Option<NodeIndex>,
    },
    Index {
        base: NodeIndex,
        items: Vec<NodeIndex>,
    },
    Except {
        type_expression: Option<NodeIndex>,
        name: Option<NodeIndex>,
        except_suite: NodeIndex,
    },
    For {
        is_async: bool,
        target: NodeIndex,
        iterable: NodeIndex,
        for_suite: NodeIndex,
        else_suite: Option<NodeIndex>,
    },
    FormatString {
        token: Token,
        value: String,
        has_unescape_errors: bool,
    },
    Function {
        decorators: Vec<NodeIndex>,
        is_async: bool,
        name: NodeIndex,
        parameters: Vec<NodeIndex>,
        return_annotation: Option<NodeIndex>,
        suite: NodeIndex,
    },
    Global {
        names: Vec<NodeIndex>,
    },
    Lambda {
        parameters: Vec<NodeIndex>,
        expression: NodeIndex,
    },
    List {
        entries: Vec<NodeIndex>,
    },
    ListComprehension {
        expression: NodeIndex,
        comprehensions: Vec<NodeIndex>,
    },
    ListComprehensionFor {
        is_async: bool,
        target: NodeIndex,
        iterable: NodeIndex,
    },
    ListComprehensionIf {
        test: NodeIndex,
    },
    MemberAccess {
        left: NodeIndex,
        member: NodeIndex,
    },
    Module {
        statements: Vec<NodeIndex>,
    },
    ModuleName {
        leading_dots: u32,
        name_parts: Vec<NodeIndex>,
        has_trailing_dot: bool,
    },
    Name {
        token: Token,
        value: String,
    },
    Nonlocal {
        names: Vec<NodeIndex>,
    },
    Number {
        value: NumberValue,
        is_integer: bool,
        is_imaginary: bool,
    },
    Parameter {
        category: ParameterCategory,
        name: Option<NodeIndex>,
        annotation: Option<NodeIndex>,
        default_value: Option<NodeIndex>,
    },
    Pass,
    Raise {
        exception: Option<NodeIndex>,
        from: Option<NodeIndex>,
    },
    Return {
        expression: Option<NodeIndex>,
    },
    Set {
        entries: Vec<NodeIndex>,
    },
    Slice {
        start: Option<NodeIndex>,
        end: Option<NodeIndex>,
        step: Option<NodeIndex>,
    },
    StatementList {
        statements: Vec<NodeIndex>,
    },
    StringList {
        strings: Vec<NodeIndex>,
    },
    String {
        token: Token,
        value: String,
        has_unescape_errors: bool,
    },
    Suite {
        statements: Vec<NodeIndex>,
    },
    Ternary {
        if_expression: NodeIndex,
        test: NodeIndex,
        else_expression: NodeIndex,
    },
    Tuple {
        expressions: Vec<NodeIndex>,
        enclosed_in_parens: bool,
    },
    Try {
        try_suite: NodeIndex,
        except_clauses: Vec<NodeIndex>,
        else_suite: Option<NodeIndex>,
        finally_suite: Option<NodeIndex>,
    },
    TypeAnnotation {
        value_expression: NodeIndex,
        annotation: NodeIndex,
    },
    UnaryOperation {
        operator: OperatorKind,
        operator_token: Token,
        expression: NodeIndex,
    },
    Unpack {
        expression: NodeIndex,
    },
    While {
        test: NodeIndex,
        while_suite: NodeIndex,
        else_suite: Option<NodeIndex>,
    },
    With {
        is_async: bool,
        items: Vec<NodeIndex>,
        suite: NodeIndex,
    },
    WithItem {
        expression: NodeIndex,
        target: Option<NodeIndex>,
    },
    Yield {
        expression: Option<NodeIndex>,
    },
    YieldFrom {
        expression: NodeIndex,
    },
}

pub type ChildList = SmallVec<[NodeIndex; 4]>;

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Error { .. } => NodeKind::Error,
            NodeData::Argument { .. } => NodeKind::Argument,
            NodeData::Assert { .. } => NodeKind::Assert,
            NodeData::Assignment { .. } => NodeKind::Assignment,
            NodeData::AssignmentExpression { .. } => NodeKind::AssignmentExpression,
            NodeData::AugmentedAssignment { .. } => NodeKind::AugmentedAssignment,
            NodeData::Await { .. } => NodeKind::Await,
            NodeData::BinaryOperation { .. } => NodeKind::BinaryOperation,
            NodeData::Break => NodeKind::Break,
            NodeData::Call { .. } => NodeKind::Call,
            NodeData::Class { .. } => NodeKind::Class,
            NodeData::Constant { .. } => NodeKind::Constant,
            NodeData::Continue => NodeKind::Continue,
            NodeData::Decorator { .. } => NodeKind::Decorator,
            NodeData::Del { .. } => NodeKind::Del,
            NodeData::Dictionary { .. } => NodeKind::Dictionary,
            NodeData::DictionaryExpandEntry { .. } => NodeKind::DictionaryExpandEntry,
            NodeData::DictionaryKeyEntry { .. } => NodeKind::DictionaryKeyEntry,
            NodeData::Ellipsis => NodeKind::Ellipsis,
            NodeData::If { .. } => NodeKind::If,
            NodeData::Import { .. } => NodeKind::Import,
            NodeData::ImportAs { .. } => NodeKind::ImportAs,
            NodeData::ImportFrom { .. } => NodeKind::ImportFrom,
            NodeData::ImportFromAs { .. } => NodeKind::ImportFromAs,
            NodeData::Index { .. } => NodeKind::Index,
            NodeData::Except { .. } => NodeKind::Except,
            NodeData::For { .. } => NodeKind::For,
            NodeData::FormatString { .. } => NodeKind::FormatString,
            NodeData::Function { .. } => NodeKind::Function,
            NodeData::Global { .. } => NodeKind::Global,
            NodeData::Lambda { .. } => NodeKind::Lambda,
            NodeData::List { .. } => NodeKind::List,
            NodeData::ListComprehension { .. } => NodeKind::ListComprehension,
            NodeData::ListComprehensionFor { .. } => NodeKind::ListComprehensionFor,
            NodeData::ListComprehensionIf { .. } => NodeKind::ListComprehensionIf,
            NodeData::MemberAccess { .. } => NodeKind::MemberAccess,
            NodeData::Module { .. } => NodeKind::Module,
            NodeData::ModuleName { .. } => NodeKind::ModuleName,
            NodeData::Name { .. } => NodeKind::Name,
            NodeData::Nonlocal { .. } => NodeKind::Nonlocal,
            NodeData::Number { .. } => NodeKind::Number,
            NodeData::Parameter { .. } => NodeKind::Parameter,
            NodeData::Pass => NodeKind::Pass,
            NodeData::Raise { .. } => NodeKind::Raise,
            NodeData::Return { .. } => NodeKind::Return,
            NodeData::Set { .. } => NodeKind::Set,
            NodeData::Slice { .. } => NodeKind::Slice,
            NodeData::StatementList { .. } => NodeKind::StatementList,
            NodeData::StringList { .. } => NodeKind::StringList,
            NodeData::String { .. } => NodeKind::String,
            NodeData::Suite { .. } => NodeKind::Suite,
            NodeData::Ternary { .. } => NodeKind::Ternary,
            NodeData::Tuple { .. } => NodeKind::Tuple,
            NodeData::Try { .. } => NodeKind::Try,
            NodeData::TypeAnnotation { .. } => NodeKind::TypeAnnotation,
            NodeData::UnaryOperation { .. } => NodeKind::UnaryOperation,
            NodeData::Unpack { .. } => NodeKind::Unpack,
            NodeData::While { .. } => NodeKind::While,
            NodeData::With { .. } => NodeKind::With,
            NodeData::WithItem { .. } => NodeKind::WithItem,
            NodeData::Yield { .. } => NodeKind::Yield,
            NodeData::YieldFrom { .. } => NodeKind::YieldFrom,
        }
    }

    /// Child nodes in source order.
    pub fn children(&self) -> ChildList {
        let mut out = ChildList::new();
        match self {
            NodeData::Error { child, .. } => out.extend(*child),
            NodeData::Argument { name, value, .. } => {
                out.extend(*name);
                out.push(*value);
            }
            NodeData::Assert { test, message } => {
                out.push(*test);
                out.extend(*message);
            }
            NodeData::Assignment { left, right }
            | NodeData::AugmentedAssignment { left, right, .. }
            | NodeData::BinaryOperation { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeData::AssignmentExpression { name, right } => {
                out.push(*name);
                out.push(*right);
            }
            NodeData::Await { expression }
            | NodeData::Decorator { expression }
            | NodeData::DictionaryExpandEntry { expression }
            | NodeData::Unpack { expression }
            | NodeData::YieldFrom { expression }
            | NodeData::UnaryOperation { expression, .. } => out.push(*expression),
            NodeData::Break
            | NodeData::Continue
            | NodeData::Pass
            | NodeData::Ellipsis
            | NodeData::Constant { .. }
            | NodeData::Number { .. }
            | NodeData::Name { .. }
            | NodeData::String { .. }
            | NodeData::FormatString { .. } => {}
            NodeData::Call { left, arguments } => {
                out.push(*left);
                out.extend(arguments.iter().copied());
            }
            NodeData::Class {
                decorators,
                name,
                arguments,
                suite,
            } => {
                out.extend(decorators.iter().copied());
                out.push(*name);
                out.extend(arguments.iter().copied());
                out.push(*suite);
            }
            NodeData::Del { targets } => out.extend(targets.iter().copied()),
            NodeData::Dictionary { entries }
            | NodeData::List { entries }
            | NodeData::Set { entries } => out.extend(entries.iter().copied()),
            NodeData::DictionaryKeyEntry { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeData::If {
                test,
                if_suite,
                else_suite,
            } => {
                out.push(*test);
                out.push(*if_suite);
                out.extend(*else_suite);
            }
            NodeData::Import { list: items } => out.extend(items.iter().copied()),
            NodeData::ImportAs { module, alias } => {
                out.push(*module);
                out.extend(*alias);
            }
            NodeData::ImportFrom { module, imports, .. } => {
                out.push(*module);
                out.extend(imports.iter().copied());
            }
            NodeData::ImportFromAs { name, alias } => {
                out.push(*name);
                out.extend(*alias);
            }
            NodeData::Index { base, items } => {
                out.push(*base);
                out.extend(items.iter().copied());
            }
            NodeData::Except {
                type_expression,
                name,
                except_suite,
            } => {
                out.extend(*type_expression);
                out.extend(*name);
                out.push(*except_suite);
            }
            NodeData::For {
                target,
                iterable,
                for_suite,
                else_suite,
                ..
            } => {
                out.push(*target);
                out.push(*iterable);
                out.push(*for_suite);
                out.extend(*else_suite);
            }
            NodeData::Function {
                decorators,
                name,
                parameters,
                return_annotation,
                suite,
                ..
            } => {
                out.extend(decorators.iter().copied());
                out.push(*name);
                out.extend(parameters.iter().copied());
                out.extend(*return_annotation);
                out.push(*suite);
            }
            NodeData::Global { names } | NodeData::Nonlocal { names } => out.extend(names.iter().copied()),
            NodeData::Lambda {
                parameters,
                expression,
            } => {
                out.extend(parameters.iter().copied());
                out.push(*expression);
            }
            NodeData::ListComprehension {
                expression,
                comprehensions,
            } => {
                out.push(*expression);
                out.extend(comprehensions.iter().copied());
            }
            NodeData::ListComprehensionFor {
                target, iterable, ..
            } => {
                out.push(*target);
                out.push(*iterable);
            }
            NodeData::ListComprehensionIf { test } => out.push(*test),
            NodeData::MemberAccess { left, member } => {
                out.push(*left);
                out.push(*member);
            }
            NodeData::Module { statements }
            | NodeData::StatementList { statements }
            | NodeData::Suite { statements } => out.extend(statements.iter().copied()),
            NodeData::ModuleName { name_parts, .. } => out.extend(name_parts.iter().copied()),
            NodeData::Parameter {
                name,
                annotation,
                default_value,
                ..
            } => {
                out.extend(*name);
                out.extend(*annotation);
                out.extend(*default_value);
            }
            NodeData::Raise { exception, from } => {
                out.extend(*exception);
                out.extend(*from);
            }
            NodeData::Return { expression } | NodeData::Yield { expression } => {
                out.extend(*expression)
            }
            NodeData::Slice { start, end, step } => {
                out.extend(*start);
                out.extend(*end);
                out.extend(*step);
            }
            NodeData::StringList { strings } => out.extend(strings.iter().copied()),
            NodeData::Ternary {
                if_expression,
                test,
                else_expression,
            } => {
                out.push(*if_expression);
                out.push(*test);
                out.push(*else_expression);
            }
            NodeData::Tuple { expressions, .. } => out.extend(expressions.iter().copied()),
            NodeData::Try {
                try_suite,
                except_clauses,
                else_suite,
                finally_suite,
            } => {
                out.push(*try_suite);
                out.extend(except_clauses.iter().copied());
                out.extend(*else_suite);
                out.extend(*finally_suite);
            }
            NodeData::TypeAnnotation {
                value_expression,
                annotation,
            } => {
                out.push(*value_expression);
                out.push(*annotation);
            }
            NodeData::While {
                test,
                while_suite,
                else_suite,
            } => {
                out.push(*test);
                out.push(*while_suite);
                out.extend(*else_suite);
            }
            NodeData::With { items, suite, .. } => {
                out.extend(items.iter().copied());
                out.push(*suite);
            }
            NodeData::WithItem { expression, target } => {
                out.push(*expression);
                out.extend(*target);
            }
        }
        out
    }
}

/// A syntax node: kind-specific payload plus its source range and parent link.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub start: u32,
    pub length: u32,
    pub parent: Option<NodeIndex>,
    pub data: NodeData,
}

impl Node {
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.length)
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Identifier text for `Name` nodes.
    pub fn name_value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Name { value, .. } => Some(value),
            _ => None,
        }
    }
}
