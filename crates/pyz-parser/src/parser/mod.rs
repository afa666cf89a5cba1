//! Recursive-descent parser.
//!
//! `ParserState` owns the token stream for one file and builds nodes into a
//! `NodeArena` bottom-up. Statement rules live in `state_statements`,
//! expression rules in `state_expressions`.

mod state_expressions;
mod state_statements;

use crate::arena::NodeArena;
use crate::node::{ErrorCategory, NodeData, NodeIndex};
use pyz_common::LineMap;
use pyz_scanner::{
    KeywordKind, OperatorKind, Token, TokenData, TokenKind, TokenizerOutput, tokenize,
};
use serde::Serialize;
use tracing::debug;

/// A syntax error reported while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
}

/// Everything produced by parsing one file.
#[derive(Debug, Clone)]
pub struct ParseResults {
    pub file_name: String,
    pub text: String,
    pub tokenizer_output: TokenizerOutput,
    pub arena: NodeArena,
    pub parse_tree: NodeIndex,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseResults {
    pub fn tokens(&self) -> &[Token] {
        &self.tokenizer_output.tokens
    }

    pub fn lines(&self) -> &LineMap {
        &self.tokenizer_output.lines
    }
}

/// Tokenize and parse `text` in one step.
pub fn parse_file(file_name: &str, text: &str) -> ParseResults {
    let mut state = ParserState::new(file_name.to_string(), text.to_string());
    let root = state.parse_source_file();
    state.into_results(root)
}

/// Deepest expression nesting the parser descends into before giving up on
/// the rest of the line.
pub const MAX_NESTING_DEPTH: u32 = 128;

pub struct ParserState {
    pub(crate) file_name: String,
    pub(crate) source_text: String,
    pub(crate) tokenizer_output: TokenizerOutput,
    pub(crate) pos: usize,
    pub(crate) arena: NodeArena,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
    /// Current expression nesting, bounded by `MAX_NESTING_DEPTH`.
    pub(crate) recursion_depth: u32,
}

impl ParserState {
    pub fn new(file_name: String, source_text: String) -> ParserState {
        let tokenizer_output = tokenize(&source_text);
        let estimated_nodes = tokenizer_output.tokens.len();
        ParserState {
            file_name,
            source_text,
            tokenizer_output,
            pos: 0,
            arena: NodeArena::with_capacity(estimated_nodes),
            parse_diagnostics: Vec::new(),
            recursion_depth: 0,
        }
    }

    pub fn get_arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn get_diagnostics(&self) -> &[ParseDiagnostic] {
        &self.parse_diagnostics
    }

    pub fn into_results(self, parse_tree: NodeIndex) -> ParseResults {
        debug!(
            file = %self.file_name,
            nodes = self.arena.len(),
            tokens = self.tokenizer_output.count(),
            diagnostics = self.parse_diagnostics.len(),
            "parsed source file"
        );
        ParseResults {
            file_name: self.file_name,
            text: self.source_text,
            tokenizer_output: self.tokenizer_output,
            arena: self.arena,
            parse_tree,
            diagnostics: self.parse_diagnostics,
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    /// Current token. The stream always ends with `EndOfStream`, which is
    /// returned for any position past the end.
    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, ahead: usize) -> &Token {
        let tokens = &self.tokenizer_output.tokens;
        let last = tokens.len().saturating_sub(1);
        &tokens[(self.pos + ahead).min(last)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_keyword(&self, keyword: KeywordKind) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub(crate) fn at_operator(&self, operator: OperatorKind) -> bool {
        self.peek().is_operator(operator)
    }

    pub(crate) fn at_end_of_line(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::NewLine | TokenKind::EndOfStream
        )
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::EndOfStream {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn consume_keyword(&mut self, keyword: KeywordKind) -> Option<Token> {
        if self.at_keyword(keyword) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn consume_operator(&mut self, operator: OperatorKind) -> Option<Token> {
        if self.at_operator(operator) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// End offset of the most recently consumed token.
    pub(crate) fn prev_end(&self) -> u32 {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokenizer_output.tokens[prev].end(),
            None => 0,
        }
    }

    pub(crate) fn current_start(&self) -> u32 {
        self.peek().start
    }

    /// Skip the rest of the logical line, leaving the `NewLine` in place.
    pub(crate) fn skip_to_end_of_line(&mut self) {
        while !self.at_end_of_line() {
            self.advance();
        }
    }

    /// Run `parse` one nesting level down. Past `MAX_NESTING_DEPTH` the rest
    /// of the line becomes a single `Error` node.
    pub(crate) fn parse_nested(
        &mut self,
        parse: fn(&mut ParserState) -> NodeIndex,
    ) -> NodeIndex {
        if self.recursion_depth >= MAX_NESTING_DEPTH {
            debug!(file = %self.file_name, pos = self.pos, "expression nesting limit reached");
            self.parse_error_at_current("Maximum parse depth exceeded");
            let start = self.current_start();
            self.skip_to_end_of_line();
            let end = self.prev_end().max(start);
            return self.arena.add(
                start,
                end,
                NodeData::Error {
                    category: ErrorCategory::MaxDepthExceeded,
                    child: None,
                },
            );
        }
        self.recursion_depth += 1;
        let node = parse(self);
        self.recursion_depth -= 1;
        node
    }

    // =========================================================================
    // Diagnostics and node helpers
    // =========================================================================

    pub(crate) fn parse_error_at(&mut self, start: u32, length: u32, message: &str) {
        // One error per position keeps cascades out of the output.
        if self
            .parse_diagnostics
            .last()
            .is_some_and(|last| last.start == start)
        {
            return;
        }
        self.parse_diagnostics.push(ParseDiagnostic {
            start,
            length,
            message: message.to_string(),
        });
    }

    pub(crate) fn parse_error_at_current(&mut self, message: &str) {
        let token = self.peek();
        let (start, length) = (token.start, token.length);
        self.parse_error_at(start, length, message);
    }

    pub(crate) fn error_node(
        &mut self,
        category: ErrorCategory,
        child: Option<NodeIndex>,
    ) -> NodeIndex {
        let start = child
            .and_then(|idx| self.arena.range(idx))
            .map_or_else(|| self.current_start(), |range| range.start);
        let end = self.prev_end().max(start);
        self.arena.add(start, end, NodeData::Error { category, child })
    }

    pub(crate) fn make_name(&mut self, token: Token) -> NodeIndex {
        let value = token.identifier_text().unwrap_or_default().to_string();
        let (start, end) = (token.start, token.end());
        self.arena.add(start, end, NodeData::Name { token, value })
    }

    /// Consume an identifier into a `Name` node, or report `message` and
    /// synthesize an empty name at the current position.
    pub(crate) fn parse_name(&mut self, message: &str) -> NodeIndex {
        if let Some(token) = self.consume(TokenKind::Identifier) {
            return self.make_name(token);
        }
        self.parse_error_at_current(message);
        let start = self.current_start();
        let token = Token::new(
            TokenKind::Identifier,
            start,
            0,
            TokenData::Identifier {
                value: String::new(),
            },
        );
        self.make_name(token)
    }
}
