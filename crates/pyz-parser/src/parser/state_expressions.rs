//! Parser state - expression parsing methods

use super::ParserState;
use crate::node::{ArgumentCategory, ErrorCategory, NodeData, NodeIndex};
use pyz_scanner::{KeywordKind, OperatorKind, StringFlags, Token, TokenData, TokenKind};

/// Lowest precedence handled by the binary-operator climbing loop (`|`).
const BITWISE_OR_PRECEDENCE: u8 = 5;

impl ParserState {
    // =========================================================================
    // Expression lists
    // =========================================================================

    /// `a, *b, c` as a tuple, or the single expression when there is no comma.
    pub(crate) fn parse_test_or_star_list(&mut self) -> NodeIndex {
        let start = self.current_start();
        if self.is_expression_terminator() {
            self.parse_error_at_current("Expected expression");
            return self.error_node(ErrorCategory::MissingExpression, None);
        }

        let first = self.parse_test_or_star();
        if !self.at(TokenKind::Comma) {
            return first;
        }

        let mut expressions = vec![first];
        while self.consume(TokenKind::Comma).is_some() {
            if self.is_expression_terminator() {
                break;
            }
            expressions.push(self.parse_test_or_star());
        }
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::Tuple {
                expressions,
                enclosed_in_parens: false,
            },
        )
    }

    /// Comma-separated expressions without tuple wrapping (`del` targets).
    pub(crate) fn parse_expression_list_items(&mut self) -> Vec<NodeIndex> {
        let mut items = Vec::new();
        loop {
            if self.is_expression_terminator() {
                if items.is_empty() {
                    self.parse_error_at_current("Expected expression");
                    items.push(self.error_node(ErrorCategory::MissingExpression, None));
                }
                break;
            }
            items.push(self.parse_test_or_star());
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        items
    }

    /// Assignment targets of `for` and comprehension clauses; stops before `in`.
    pub(crate) fn parse_target_list(&mut self) -> NodeIndex {
        let start = self.current_start();
        let first = self.parse_star_or_bitwise_or();
        if !self.at(TokenKind::Comma) {
            return first;
        }
        let mut expressions = vec![first];
        while self.consume(TokenKind::Comma).is_some() {
            if self.at_keyword(KeywordKind::In) || self.is_expression_terminator() {
                break;
            }
            expressions.push(self.parse_star_or_bitwise_or());
        }
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::Tuple {
                expressions,
                enclosed_in_parens: false,
            },
        )
    }

    fn is_expression_terminator(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::NewLine
                | TokenKind::EndOfStream
                | TokenKind::Semicolon
                | TokenKind::CloseParenthesis
                | TokenKind::CloseBracket
                | TokenKind::CloseCurlyBrace
                | TokenKind::Colon
                | TokenKind::Indent
                | TokenKind::Dedent
        ) || self.at_operator(OperatorKind::Assign)
    }

    fn parse_test_or_star(&mut self) -> NodeIndex {
        if let Some(star) = self.consume_operator(OperatorKind::Multiply) {
            let expression = self.parse_bitwise_or();
            let end = self.prev_end();
            return self.arena.add(star.start, end, NodeData::Unpack { expression });
        }
        self.parse_test_expression()
    }

    fn parse_star_or_bitwise_or(&mut self) -> NodeIndex {
        if let Some(star) = self.consume_operator(OperatorKind::Multiply) {
            let expression = self.parse_bitwise_or();
            let end = self.prev_end();
            return self.arena.add(star.start, end, NodeData::Unpack { expression });
        }
        self.parse_bitwise_or()
    }

    // =========================================================================
    // Test expressions
    // =========================================================================

    /// `x if c else y`, `lambda`, `name := value`, or a plain `or` test.
    pub(crate) fn parse_test_expression(&mut self) -> NodeIndex {
        if self.at_keyword(KeywordKind::Lambda) {
            return self.parse_nested(Self::parse_lambda);
        }
        if self.at(TokenKind::Identifier) && self.peek_at(1).is_operator(OperatorKind::Walrus) {
            let start = self.current_start();
            let token = self.advance();
            let name = self.make_name(token);
            self.advance();
            let right = self.parse_nested(Self::parse_test_expression);
            let end = self.prev_end();
            return self
                .arena
                .add(start, end, NodeData::AssignmentExpression { name, right });
        }

        let start = self.current_start();
        let if_expression = self.parse_or_test();
        if self.consume_keyword(KeywordKind::If).is_none() {
            return if_expression;
        }

        let test = self.parse_or_test();
        let else_expression = if self.consume_keyword(KeywordKind::Else).is_some() {
            self.parse_nested(Self::parse_test_expression)
        } else {
            self.parse_error_at_current("Expected \"else\"");
            self.error_node(ErrorCategory::MissingElse, None)
        };
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::Ternary {
                if_expression,
                test,
                else_expression,
            },
        )
    }

    fn parse_lambda(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let parameters = self.parse_parameter_list(TokenKind::Colon, false);
        if self.consume(TokenKind::Colon).is_none() {
            self.parse_error_at_current("Expected \":\"");
        }
        let expression = if self.is_expression_terminator() {
            self.parse_error_at_current("Expected expression");
            self.error_node(ErrorCategory::MissingExpression, None)
        } else {
            self.parse_test_expression()
        };
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::Lambda {
                parameters,
                expression,
            },
        )
    }

    pub(crate) fn parse_yield_expression(&mut self) -> NodeIndex {
        let start = self.advance().start;
        if self.consume_keyword(KeywordKind::From).is_some() {
            let expression = self.parse_test_expression();
            let end = self.prev_end();
            return self.arena.add(start, end, NodeData::YieldFrom { expression });
        }
        let expression = if self.is_expression_terminator() {
            None
        } else {
            Some(self.parse_test_or_star_list())
        };
        let end = self.prev_end();
        self.arena.add(start, end, NodeData::Yield { expression })
    }

    fn parse_or_test(&mut self) -> NodeIndex {
        let mut left = self.parse_and_test();
        while self.at_keyword(KeywordKind::Or) {
            let operator_token = self.advance();
            let right = self.parse_and_test();
            left = self.make_binary(left, OperatorKind::Or, operator_token, right);
        }
        left
    }

    fn parse_and_test(&mut self) -> NodeIndex {
        let mut left = self.parse_not_test();
        while self.at_keyword(KeywordKind::And) {
            let operator_token = self.advance();
            let right = self.parse_not_test();
            left = self.make_binary(left, OperatorKind::And, operator_token, right);
        }
        left
    }

    fn parse_not_test(&mut self) -> NodeIndex {
        if self.at_keyword(KeywordKind::Not) {
            let operator_token = self.advance();
            let start = operator_token.start;
            let expression = self.parse_nested(Self::parse_not_test);
            let end = self.prev_end();
            return self.arena.add(
                start,
                end,
                NodeData::UnaryOperation {
                    operator: OperatorKind::Not,
                    operator_token,
                    expression,
                },
            );
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> NodeIndex {
        let mut left = self.parse_bitwise_or();
        loop {
            let token = self.peek().clone();
            let operator = match &token.data {
                TokenData::Operator(op) if op.is_comparison() => *op,
                TokenData::Keyword(KeywordKind::In) => OperatorKind::In,
                TokenData::Keyword(KeywordKind::Is) => {
                    if self.peek_at(1).is_keyword(KeywordKind::Not) {
                        self.advance();
                        OperatorKind::IsNot
                    } else {
                        OperatorKind::Is
                    }
                }
                TokenData::Keyword(KeywordKind::Not)
                    if self.peek_at(1).is_keyword(KeywordKind::In) =>
                {
                    self.advance();
                    OperatorKind::NotIn
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_bitwise_or();
            left = self.make_binary(left, operator, token, right);
        }
        left
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    fn parse_bitwise_or(&mut self) -> NodeIndex {
        self.parse_binary_at_least(BITWISE_OR_PRECEDENCE)
    }

    /// Precedence climbing over the left-associative operators `|` .. `%`.
    fn parse_binary_at_least(&mut self, min_precedence: u8) -> NodeIndex {
        let mut left = self.parse_factor();
        loop {
            let Some(operator) = self.peek().operator_kind() else {
                break;
            };
            let precedence = match operator.binary_precedence() {
                Some(p) if p >= min_precedence && operator != OperatorKind::Power => p,
                _ => break,
            };
            let operator_token = self.advance();
            let right = self.parse_binary_at_least(precedence + 1);
            left = self.make_binary(left, operator, operator_token, right);
        }
        left
    }

    /// Unary `+`, `-`, `~`.
    fn parse_factor(&mut self) -> NodeIndex {
        let operator = match self.peek().operator_kind() {
            Some(
                op @ (OperatorKind::Add | OperatorKind::Subtract | OperatorKind::BitwiseInvert),
            ) => op,
            _ => return self.parse_power(),
        };
        let operator_token = self.advance();
        let start = operator_token.start;
        let expression = self.parse_nested(Self::parse_factor);
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::UnaryOperation {
                operator,
                operator_token,
                expression,
            },
        )
    }

    /// `await x` and right-associative `**`.
    fn parse_power(&mut self) -> NodeIndex {
        let left = if let Some(await_token) = self.consume_keyword(KeywordKind::Await) {
            let expression = self.parse_nested(Self::parse_atom_expression);
            let end = self.prev_end();
            self.arena
                .add(await_token.start, end, NodeData::Await { expression })
        } else {
            self.parse_nested(Self::parse_atom_expression)
        };

        if self.at_operator(OperatorKind::Power) {
            let operator_token = self.advance();
            let right = self.parse_nested(Self::parse_factor);
            return self.make_binary(left, OperatorKind::Power, operator_token, right);
        }
        left
    }

    fn make_binary(
        &mut self,
        left: NodeIndex,
        operator: OperatorKind,
        operator_token: Token,
        right: NodeIndex,
    ) -> NodeIndex {
        let start = self.arena.range(left).map_or(operator_token.start, |r| r.start);
        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::BinaryOperation {
                operator,
                operator_token,
                left,
                right,
                parenthesized: false,
            },
        )
    }

    // =========================================================================
    // Atoms and trailers
    // =========================================================================

    /// An atom followed by any number of calls, subscripts and member accesses.
    fn parse_atom_expression(&mut self) -> NodeIndex {
        let mut expression = self.parse_atom();

        loop {
            let start = self.arena.range(expression).map_or(0, |r| r.start);
            if self.consume(TokenKind::OpenParenthesis).is_some() {
                let arguments = self.parse_argument_list();
                let closed = self.consume(TokenKind::CloseParenthesis).is_some();
                let end = self.prev_end();
                let call = self.arena.add(
                    start,
                    end,
                    NodeData::Call {
                        left: expression,
                        arguments,
                    },
                );
                if !closed {
                    self.parse_error_at_current("Expected \")\"");
                    self.skip_to_end_of_line();
                    return self.error_node(ErrorCategory::MissingCallCloseParen, Some(call));
                }
                expression = call;
            } else if self.consume(TokenKind::OpenBracket).is_some() {
                let items = self.parse_subscript_list();
                let closed = self.consume(TokenKind::CloseBracket).is_some();
                let end = self.prev_end();
                let index = self.arena.add(
                    start,
                    end,
                    NodeData::Index {
                        base: expression,
                        items,
                    },
                );
                if !closed {
                    self.parse_error_at_current("Expected \"]\"");
                    self.skip_to_end_of_line();
                    return self.error_node(ErrorCategory::MissingIndexCloseBracket, Some(index));
                }
                expression = index;
            } else if self.consume(TokenKind::Dot).is_some() {
                if !self.at(TokenKind::Identifier) {
                    self.parse_error_at_current("Expected member name after \".\"");
                    return self.error_node(ErrorCategory::MissingMemberAccessName, Some(expression));
                }
                let token = self.advance();
                let member = self.make_name(token);
                let end = self.prev_end();
                expression = self.arena.add(
                    start,
                    end,
                    NodeData::MemberAccess {
                        left: expression,
                        member,
                    },
                );
            } else {
                break;
            }
        }
        expression
    }

    /// Call arguments up to (not including) the closing parenthesis.
    pub(crate) fn parse_argument_list(&mut self) -> Vec<NodeIndex> {
        let mut arguments = Vec::new();
        while !self.at(TokenKind::CloseParenthesis) && !self.at_end_of_line() {
            let start = self.current_start();
            let category = if self.consume_operator(OperatorKind::Multiply).is_some() {
                ArgumentCategory::UnpackedList
            } else if self.consume_operator(OperatorKind::Power).is_some() {
                ArgumentCategory::UnpackedDictionary
            } else {
                ArgumentCategory::Simple
            };

            let mut name = None;
            if category == ArgumentCategory::Simple
                && self.at(TokenKind::Identifier)
                && self.peek_at(1).is_operator(OperatorKind::Assign)
            {
                let token = self.advance();
                name = Some(self.make_name(token));
                self.advance();
            }

            let mut value = self.parse_test_expression();
            if name.is_none() && category == ArgumentCategory::Simple && self.at_comprehension_start() {
                value = self.parse_comprehension(value, start);
            }

            let end = self.prev_end();
            arguments.push(self.arena.add(
                start,
                end,
                NodeData::Argument {
                    category,
                    name,
                    value,
                },
            ));

            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        arguments
    }

    /// Subscript items, each wrapped in an `Argument`.
    fn parse_subscript_list(&mut self) -> Vec<NodeIndex> {
        let mut items = Vec::new();
        loop {
            if self.at(TokenKind::CloseBracket) || self.at_end_of_line() {
                if items.is_empty() {
                    self.parse_error_at_current("Expected index or slice expression");
                    let error = self.error_node(ErrorCategory::MissingIndexOrSlice, None);
                    let range = self.arena.range(error).unwrap_or_default();
                    items.push(self.arena.add(
                        range.start,
                        range.end(),
                        NodeData::Argument {
                            category: ArgumentCategory::Simple,
                            name: None,
                            value: error,
                        },
                    ));
                }
                break;
            }

            let start = self.current_start();
            let category = if self.consume_operator(OperatorKind::Multiply).is_some() {
                ArgumentCategory::UnpackedList
            } else {
                ArgumentCategory::Simple
            };
            let value = if category == ArgumentCategory::Simple {
                self.parse_slice_or_test()
            } else {
                self.parse_bitwise_or()
            };
            let end = self.prev_end();
            items.push(self.arena.add(
                start,
                end,
                NodeData::Argument {
                    category,
                    name: None,
                    value,
                },
            ));
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        items
    }

    fn parse_slice_or_test(&mut self) -> NodeIndex {
        let start = self.current_start();
        let first = if self.at(TokenKind::Colon) {
            None
        } else {
            let test = self.parse_test_expression();
            if !self.at(TokenKind::Colon) {
                return test;
            }
            Some(test)
        };

        let mut parts = [first, None, None];
        for slot in parts.iter_mut().skip(1) {
            if self.consume(TokenKind::Colon).is_none() {
                break;
            }
            if !matches!(
                self.peek_kind(),
                TokenKind::Colon | TokenKind::Comma | TokenKind::CloseBracket
            ) && !self.at_end_of_line()
            {
                *slot = Some(self.parse_test_expression());
            }
        }

        let end = self.prev_end();
        let [start_expr, end_expr, step] = parts;
        self.arena.add(
            start,
            end,
            NodeData::Slice {
                start: start_expr,
                end: end_expr,
                step,
            },
        )
    }

    fn parse_atom(&mut self) -> NodeIndex {
        let token = self.peek().clone();
        match &token.data {
            TokenData::Identifier { .. } => {
                self.advance();
                return self.make_name(token);
            }
            TokenData::Number {
                value,
                is_integer,
                is_imaginary,
            } => {
                self.advance();
                return self.arena.add(
                    token.start,
                    token.end(),
                    NodeData::Number {
                        value: *value,
                        is_integer: *is_integer,
                        is_imaginary: *is_imaginary,
                    },
                );
            }
            TokenData::String { .. } => return self.parse_string_list(),
            TokenData::Keyword(
                keyword @ (KeywordKind::True
                | KeywordKind::False
                | KeywordKind::None
                | KeywordKind::Debug),
            ) => {
                self.advance();
                return self
                    .arena
                    .add(token.start, token.end(), NodeData::Constant { keyword: *keyword });
            }
            _ => {}
        }

        match token.kind {
            TokenKind::Ellipsis => {
                self.advance();
                self.arena.add(token.start, token.end(), NodeData::Ellipsis)
            }
            TokenKind::OpenParenthesis => self.parse_parenthesized(),
            TokenKind::OpenBracket => self.parse_list_atom(),
            TokenKind::OpenCurlyBrace => self.parse_dictionary_or_set(),
            _ => {
                self.parse_error_at_current("Expected expression");
                // Swallow one stray token so callers always make progress.
                if !self.is_expression_terminator()
                    && !matches!(token.kind, TokenKind::Comma | TokenKind::Operator)
                    && !matches!(token.data, TokenData::Keyword(_))
                {
                    self.advance();
                }
                self.error_node(ErrorCategory::MissingExpression, None)
            }
        }
    }

    fn parse_string_list(&mut self) -> NodeIndex {
        let start = self.current_start();
        let mut strings = Vec::new();
        while let TokenData::String {
            flags,
            escaped_value,
            has_unescape_errors,
        } = &self.peek().data
        {
            let (value, has_unescape_errors) = (escaped_value.clone(), *has_unescape_errors);
            let is_format = flags.contains(StringFlags::FORMAT);
            let token = self.advance();
            let (token_start, token_end) = (token.start, token.end());
            let data = if is_format {
                NodeData::FormatString {
                    token,
                    value,
                    has_unescape_errors,
                }
            } else {
                NodeData::String {
                    token,
                    value,
                    has_unescape_errors,
                }
            };
            strings.push(self.arena.add(token_start, token_end, data));
        }
        let end = self.prev_end();
        self.arena.add(start, end, NodeData::StringList { strings })
    }

    /// `( ... )`: empty tuple, yield, generator, tuple or a grouped expression.
    fn parse_parenthesized(&mut self) -> NodeIndex {
        let open = self.advance();

        let expression = if self.at(TokenKind::CloseParenthesis) {
            self.arena.add(
                open.start,
                open.end(),
                NodeData::Tuple {
                    expressions: Vec::new(),
                    enclosed_in_parens: true,
                },
            )
        } else if self.at_keyword(KeywordKind::Yield) {
            self.parse_yield_expression()
        } else {
            let first_start = self.current_start();
            let first = self.parse_test_or_star();
            if self.at_comprehension_start() {
                self.parse_comprehension(first, first_start)
            } else if self.at(TokenKind::Comma) {
                let mut expressions = vec![first];
                while self.consume(TokenKind::Comma).is_some() {
                    if self.at(TokenKind::CloseParenthesis) || self.is_expression_terminator() {
                        break;
                    }
                    expressions.push(self.parse_test_or_star());
                }
                let end = self.prev_end();
                self.arena.add(
                    first_start,
                    end,
                    NodeData::Tuple {
                        expressions,
                        enclosed_in_parens: true,
                    },
                )
            } else {
                first
            }
        };

        let closed = self.consume(TokenKind::CloseParenthesis).is_some();
        let end = self.prev_end();
        self.arena.extend_range(expression, open.start, end);
        if let Some(node) = self.arena.get_mut(expression) {
            match &mut node.data {
                NodeData::BinaryOperation { parenthesized, .. } => *parenthesized = true,
                NodeData::Tuple {
                    enclosed_in_parens, ..
                } => *enclosed_in_parens = true,
                _ => {}
            }
        }

        if !closed {
            self.parse_error_at_current("Expected \")\"");
            self.skip_to_end_of_line();
            return self.error_node(ErrorCategory::MissingTupleCloseParen, Some(expression));
        }
        expression
    }

    fn parse_list_atom(&mut self) -> NodeIndex {
        let open = self.advance();
        let mut entries = Vec::new();

        if !self.at(TokenKind::CloseBracket) {
            let first_start = self.current_start();
            let first = self.parse_test_or_star();
            if self.at_comprehension_start() {
                entries.push(self.parse_comprehension(first, first_start));
            } else {
                entries.push(first);
                while self.consume(TokenKind::Comma).is_some() {
                    if self.at(TokenKind::CloseBracket) || self.is_expression_terminator() {
                        break;
                    }
                    entries.push(self.parse_test_or_star());
                }
            }
        }

        let closed = self.consume(TokenKind::CloseBracket).is_some();
        let end = self.prev_end();
        let list = self.arena.add(open.start, end, NodeData::List { entries });
        if !closed {
            self.parse_error_at_current("Expected \"]\"");
            self.skip_to_end_of_line();
            return self.error_node(ErrorCategory::MissingListCloseBracket, Some(list));
        }
        list
    }

    fn parse_dictionary_or_set(&mut self) -> NodeIndex {
        let open = self.advance();
        let mut entries = Vec::new();
        let mut is_dictionary = true;
        let mut first_entry = true;

        while !self.at(TokenKind::CloseCurlyBrace) && !self.at_end_of_line() {
            let entry_start = self.current_start();
            let entry = if let Some(power) = self.consume_operator(OperatorKind::Power) {
                let expression = self.parse_bitwise_or();
                let end = self.prev_end();
                self.arena
                    .add(power.start, end, NodeData::DictionaryExpandEntry { expression })
            } else {
                let key = self.parse_test_or_star();
                if first_entry && !self.at(TokenKind::Colon) {
                    is_dictionary = false;
                }
                if is_dictionary {
                    if self.consume(TokenKind::Colon).is_none() {
                        self.parse_error_at_current("Expected \":\"");
                    }
                    let value = self.parse_test_expression();
                    let end = self.prev_end();
                    self.arena
                        .add(entry_start, end, NodeData::DictionaryKeyEntry { key, value })
                } else {
                    key
                }
            };

            if first_entry && self.at_comprehension_start() {
                entries.push(self.parse_comprehension(entry, entry_start));
                break;
            }
            entries.push(entry);
            first_entry = false;

            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.consume(TokenKind::CloseCurlyBrace).is_none() {
            self.parse_error_at_current("Expected \"}\"");
        }
        let end = self.prev_end();
        let data = if is_dictionary {
            NodeData::Dictionary { entries }
        } else {
            NodeData::Set { entries }
        };
        self.arena.add(open.start, end, data)
    }

    // =========================================================================
    // Comprehensions
    // =========================================================================

    fn at_comprehension_start(&self) -> bool {
        self.at_keyword(KeywordKind::For)
            || (self.at_keyword(KeywordKind::Async) && self.peek_at(1).is_keyword(KeywordKind::For))
    }

    /// `expression for target in iterable [if cond] ...`
    fn parse_comprehension(&mut self, expression: NodeIndex, start: u32) -> NodeIndex {
        let mut comprehensions = Vec::new();
        loop {
            if self.at_comprehension_start() {
                let clause_start = self.current_start();
                let is_async = self.consume_keyword(KeywordKind::Async).is_some();
                self.advance();
                let target = self.parse_target_list();
                let iterable = if self.consume_keyword(KeywordKind::In).is_some() {
                    self.parse_or_test()
                } else {
                    self.parse_error_at_current("Expected \"in\"");
                    self.error_node(ErrorCategory::MissingIn, None)
                };
                let end = self.prev_end();
                comprehensions.push(self.arena.add(
                    clause_start,
                    end,
                    NodeData::ListComprehensionFor {
                        is_async,
                        target,
                        iterable,
                    },
                ));
            } else if let Some(if_token) = self.consume_keyword(KeywordKind::If) {
                let test = self.parse_or_test();
                let end = self.prev_end();
                comprehensions.push(self.arena.add(
                    if_token.start,
                    end,
                    NodeData::ListComprehensionIf { test },
                ));
            } else {
                break;
            }
        }

        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::ListComprehension {
                expression,
                comprehensions,
            },
        )
    }
}

