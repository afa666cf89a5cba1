//! Parser state - statement parsing methods

use super::ParserState;
use crate::node::{ErrorCategory, NodeData, NodeIndex, ParameterCategory};
use pyz_scanner::{KeywordKind, OperatorKind, TokenData, TokenKind};

impl ParserState {
    /// Parse a source file
    pub fn parse_source_file(&mut self) -> NodeIndex {
        self.recursion_depth = 0;
        let mut statements = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::EndOfStream => break,
                TokenKind::NewLine => {
                    self.advance();
                }
                TokenKind::Indent => {
                    self.parse_error_at_current("Unexpected indentation");
                    self.advance();
                }
                TokenKind::Dedent => {
                    self.parse_error_at_current("Unindent not expected");
                    self.advance();
                }
                _ => statements.push(self.parse_statement()),
            }
        }

        let end = self.source_text.len() as u32;
        self.arena.add(0, end, NodeData::Module { statements })
    }

    /// Parse one compound statement or one line of simple statements.
    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        let token = self.peek().clone();
        match &token.data {
            TokenData::Keyword(KeywordKind::Def) => self.parse_function_def(Vec::new(), None),
            TokenData::Keyword(KeywordKind::Class) => self.parse_class_def(Vec::new()),
            TokenData::Keyword(KeywordKind::If) => self.parse_if_statement(),
            TokenData::Keyword(KeywordKind::While) => self.parse_while_statement(),
            TokenData::Keyword(KeywordKind::For) => self.parse_for_statement(None),
            TokenData::Keyword(KeywordKind::Try) => self.parse_try_statement(),
            TokenData::Keyword(KeywordKind::With) => self.parse_with_statement(None),
            TokenData::Keyword(KeywordKind::Async) => self.parse_async_statement(),
            TokenData::Operator(OperatorKind::MatrixMultiply) => self.parse_decorated(),
            _ => self.parse_statement_list(),
        }
    }

    fn parse_async_statement(&mut self) -> NodeIndex {
        let next = self.peek_at(1);
        if next.is_keyword(KeywordKind::Def) {
            let async_token = self.advance();
            return self.parse_function_def(Vec::new(), Some(async_token.start));
        }
        if next.is_keyword(KeywordKind::For) {
            let async_token = self.advance();
            return self.parse_for_statement(Some(async_token.start));
        }
        if next.is_keyword(KeywordKind::With) {
            let async_token = self.advance();
            return self.parse_with_statement(Some(async_token.start));
        }
        self.parse_error_at_current("Expected \"def\", \"with\" or \"for\" to follow \"async\"");
        self.parse_statement_list()
    }

    /// Simple statements separated by `;` and terminated by a newline.
    fn parse_statement_list(&mut self) -> NodeIndex {
        let start = self.current_start();
        let mut statements = Vec::new();

        loop {
            statements.push(self.parse_simple_statement());

            if self.consume(TokenKind::Semicolon).is_some() {
                if self.at_end_of_line() {
                    break;
                }
                continue;
            }
            if !self.at_end_of_line() {
                self.parse_error_at_current("Statements must be separated by newlines or semicolons");
                self.skip_to_end_of_line();
            }
            break;
        }

        let end = self.prev_end();
        let list = self.arena.add(start, end, NodeData::StatementList { statements });
        self.consume(TokenKind::NewLine);
        list
    }

    fn parse_simple_statement(&mut self) -> NodeIndex {
        let token = self.peek().clone();
        let start = token.start;
        let keyword = match token.data {
            TokenData::Keyword(keyword) => Some(keyword),
            _ => None,
        };

        match keyword {
            Some(KeywordKind::Pass) => {
                self.advance();
                self.arena.add(start, token.end(), NodeData::Pass)
            }
            Some(KeywordKind::Break) => {
                self.advance();
                self.arena.add(start, token.end(), NodeData::Break)
            }
            Some(KeywordKind::Continue) => {
                self.advance();
                self.arena.add(start, token.end(), NodeData::Continue)
            }
            Some(KeywordKind::Return) => {
                self.advance();
                let expression = if self.at_end_of_line() || self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_test_or_star_list())
                };
                let end = self.prev_end();
                self.arena.add(start, end, NodeData::Return { expression })
            }
            Some(KeywordKind::Raise) => self.parse_raise_statement(),
            Some(KeywordKind::Del) => {
                self.advance();
                let targets = self.parse_expression_list_items();
                let end = self.prev_end();
                self.arena.add(start, end, NodeData::Del { targets })
            }
            Some(KeywordKind::Global) | Some(KeywordKind::Nonlocal) => {
                self.advance();
                let mut names = vec![self.parse_name("Expected identifier")];
                while self.consume(TokenKind::Comma).is_some() {
                    names.push(self.parse_name("Expected identifier"));
                }
                let end = self.prev_end();
                let data = if keyword == Some(KeywordKind::Global) {
                    NodeData::Global { names }
                } else {
                    NodeData::Nonlocal { names }
                };
                self.arena.add(start, end, data)
            }
            Some(KeywordKind::Import) => self.parse_import_statement(),
            Some(KeywordKind::From) => self.parse_from_statement(),
            Some(KeywordKind::Assert) => {
                self.advance();
                let test = self.parse_test_expression();
                let message = if self.consume(TokenKind::Comma).is_some() {
                    Some(self.parse_test_expression())
                } else {
                    None
                };
                let end = self.prev_end();
                self.arena.add(start, end, NodeData::Assert { test, message })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_raise_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let mut exception = None;
        let mut from = None;
        if !self.at_end_of_line() && !self.at(TokenKind::Semicolon) {
            exception = Some(self.parse_test_expression());
            if self.consume_keyword(KeywordKind::From).is_some() {
                from = Some(self.parse_test_expression());
            }
        }
        let end = self.prev_end();
        self.arena.add(start, end, NodeData::Raise { exception, from })
    }

    /// Expression statements, including the assignment forms.
    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.current_start();
        let left = if self.at_keyword(KeywordKind::Yield) {
            self.parse_yield_expression()
        } else {
            self.parse_test_or_star_list()
        };

        if self.consume(TokenKind::Colon).is_some() {
            let annotation = self.parse_test_expression();
            let end = self.prev_end();
            let annotated = self.arena.add(
                start,
                end,
                NodeData::TypeAnnotation {
                    value_expression: left,
                    annotation,
                },
            );
            if self.consume_operator(OperatorKind::Assign).is_none() {
                return annotated;
            }
            let right = self.parse_assignment_source();
            let end = self.prev_end();
            return self.arena.add(
                start,
                end,
                NodeData::Assignment {
                    left: annotated,
                    right,
                },
            );
        }

        if self.consume_operator(OperatorKind::Assign).is_some() {
            return self.parse_chained_assignment(start, left);
        }

        if let Some(operator) = self.peek().operator_kind()
            && operator.is_augmented_assignment()
        {
            self.advance();
            let right = self.parse_assignment_source();
            let end = self.prev_end();
            return self.arena.add(
                start,
                end,
                NodeData::AugmentedAssignment {
                    operator,
                    left,
                    right,
                },
            );
        }

        left
    }

    /// `a = b = c` nests to the right: `Assignment(a, Assignment(b, c))`.
    fn parse_chained_assignment(&mut self, start: u32, left: NodeIndex) -> NodeIndex {
        let right_start = self.current_start();
        let mut right = self.parse_assignment_source();
        if self.consume_operator(OperatorKind::Assign).is_some() {
            right = self.parse_chained_assignment(right_start, right);
        }
        let end = self.prev_end();
        self.arena.add(start, end, NodeData::Assignment { left, right })
    }

    fn parse_assignment_source(&mut self) -> NodeIndex {
        if self.at_keyword(KeywordKind::Yield) {
            self.parse_yield_expression()
        } else {
            self.parse_test_or_star_list()
        }
    }

    // =========================================================================
    // Imports
    // =========================================================================

    fn parse_import_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let mut list = Vec::new();
        loop {
            let item_start = self.current_start();
            let module = self.parse_module_name(false);
            let alias = if self.consume_keyword(KeywordKind::As).is_some() {
                Some(self.parse_name("Expected alias name"))
            } else {
                None
            };
            let end = self.prev_end();
            list.push(
                self.arena
                    .add(item_start, end, NodeData::ImportAs { module, alias }),
            );
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.prev_end();
        self.arena.add(start, end, NodeData::Import { list })
    }

    fn parse_from_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let module = self.parse_module_name(true);
        let mut imports = Vec::new();
        let mut is_wildcard_import = false;
        let mut wildcard_token = None;
        let mut uses_parens = false;
        let mut missing_import_keyword = false;

        if self.consume_keyword(KeywordKind::Import).is_none() {
            self.parse_error_at_current("Expected \"import\"");
            missing_import_keyword = true;
        } else if let Some(star) = self.consume_operator(OperatorKind::Multiply) {
            is_wildcard_import = true;
            wildcard_token = Some(star);
        } else {
            uses_parens = self.consume(TokenKind::OpenParenthesis).is_some();
            loop {
                if !self.at(TokenKind::Identifier) {
                    if imports.is_empty() {
                        self.parse_error_at_current("Expected one or more symbol names after import");
                    }
                    break;
                }
                let item_start = self.current_start();
                let name = self.parse_name("Expected import symbol name");
                let alias = if self.consume_keyword(KeywordKind::As).is_some() {
                    Some(self.parse_name("Expected alias symbol name"))
                } else {
                    None
                };
                let end = self.prev_end();
                imports.push(
                    self.arena
                        .add(item_start, end, NodeData::ImportFromAs { name, alias }),
                );
                if self.consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
            if uses_parens && self.consume(TokenKind::CloseParenthesis).is_none() {
                self.parse_error_at_current("Expected \")\"");
            }
        }

        let end = self.prev_end();
        self.arena.add(
            start,
            end,
            NodeData::ImportFrom {
                module,
                imports,
                is_wildcard_import,
                wildcard_token,
                uses_parens,
                missing_import_keyword,
            },
        )
    }

    /// Dotted module name. Leading dots are only legal after `from`.
    fn parse_module_name(&mut self, allow_relative: bool) -> NodeIndex {
        let start = self.current_start();
        let mut leading_dots = 0u32;
        let mut name_parts = Vec::new();
        let mut has_trailing_dot = false;

        if allow_relative {
            loop {
                if self.consume(TokenKind::Dot).is_some() {
                    leading_dots += 1;
                } else if self.consume(TokenKind::Ellipsis).is_some() {
                    leading_dots += 3;
                } else {
                    break;
                }
            }
        }

        loop {
            if !self.at(TokenKind::Identifier) {
                if leading_dots == 0 && name_parts.is_empty() || has_trailing_dot {
                    self.parse_error_at_current("Expected module name");
                }
                break;
            }
            has_trailing_dot = false;
            let token = self.advance();
            name_parts.push(self.make_name(token));
            if self.consume(TokenKind::Dot).is_none() {
                break;
            }
            has_trailing_dot = true;
        }

        let end = self.prev_end().max(start);
        self.arena.add(
            start,
            end,
            NodeData::ModuleName {
                leading_dots,
                name_parts,
                has_trailing_dot,
            },
        )
    }

    // =========================================================================
    // Compound statements
    // =========================================================================

    /// `:` followed by an indented block or a single line of statements.
    /// The suite's range starts at the colon.
    pub(crate) fn parse_suite(&mut self) -> NodeIndex {
        let start = self.current_start();
        let colon_end = match self.consume(TokenKind::Colon) {
            Some(colon) => colon.end(),
            None => {
                self.parse_error_at_current("Expected \":\"");
                start
            }
        };

        let mut statements = Vec::new();
        if self.consume(TokenKind::NewLine).is_none() {
            if !self.at_end_of_line() {
                statements.push(self.parse_statement_list());
            }
            let end = colon_end;
            return self.arena.add(start, end, NodeData::Suite { statements });
        }

        if self.consume(TokenKind::Indent).is_none() {
            self.parse_error_at_current("Expected indented block");
            let end = colon_end;
            return self.arena.add(start, end, NodeData::Suite { statements });
        }

        loop {
            match self.peek_kind() {
                TokenKind::EndOfStream => break,
                TokenKind::Dedent => {
                    let dedent = self.advance();
                    if let TokenData::Dedent {
                        matches_indent: false,
                        ..
                    } = dedent.data
                    {
                        self.parse_error_at(
                            dedent.start,
                            dedent.length,
                            "Unindent amount does not match previous indent",
                        );
                    }
                    break;
                }
                TokenKind::Indent => {
                    self.parse_error_at_current("Unexpected indentation");
                    self.advance();
                }
                TokenKind::NewLine => {
                    self.advance();
                }
                _ => statements.push(self.parse_statement()),
            }
        }

        let end = statements
            .last()
            .and_then(|&last| self.arena.range(last))
            .map_or(start, |range| range.end());
        self.arena.add(start, end, NodeData::Suite { statements })
    }

    fn parse_decorated(&mut self) -> NodeIndex {
        let mut decorators = Vec::new();
        while let Some(at) = self.consume_operator(OperatorKind::MatrixMultiply) {
            let expression = if self.at_end_of_line() {
                self.parse_error_at_current("Expected decorator name");
                self.error_node(ErrorCategory::MissingDecoratorCallName, None)
            } else {
                self.parse_test_expression()
            };
            let end = self.prev_end();
            decorators.push(self.arena.add(at.start, end, NodeData::Decorator { expression }));
            if !self.at_end_of_line() {
                self.parse_error_at_current("Expected new line at end of decorator");
                self.skip_to_end_of_line();
            }
            self.consume(TokenKind::NewLine);
        }

        if self.at_keyword(KeywordKind::Def) {
            return self.parse_function_def(decorators, None);
        }
        if self.at_keyword(KeywordKind::Class) {
            return self.parse_class_def(decorators);
        }
        if self.at_keyword(KeywordKind::Async) && self.peek_at(1).is_keyword(KeywordKind::Def) {
            let async_token = self.advance();
            return self.parse_function_def(decorators, Some(async_token.start));
        }

        self.parse_error_at_current("Expected function or class declaration after decorator");
        // Keep the decorators in the tree even though nothing follows them.
        let start = decorators
            .first()
            .and_then(|&first| self.arena.range(first))
            .map_or_else(|| self.current_start(), |range| range.start);
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::StatementList {
                statements: decorators,
            },
        )
    }

    fn parse_function_def(&mut self, decorators: Vec<NodeIndex>, async_start: Option<u32>) -> NodeIndex {
        let def_token = self.advance();
        let start = async_start.unwrap_or(def_token.start);
        let name = self.parse_name("Expected function name after \"def\"");

        if self.consume(TokenKind::OpenParenthesis).is_none() {
            self.parse_error_at_current("Expected \"(\"");
            let error = self.error_node(ErrorCategory::MissingFunctionParameterList, Some(name));
            self.skip_to_end_of_line();
            return error;
        }

        let parameters = self.parse_parameter_list(TokenKind::CloseParenthesis, true);
        if self.consume(TokenKind::CloseParenthesis).is_none() {
            self.parse_error_at_current("Expected \")\"");
        }

        let return_annotation = if self.consume(TokenKind::Arrow).is_some() {
            Some(self.parse_test_expression())
        } else {
            None
        };

        let suite = self.parse_suite();
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::Function {
                decorators,
                is_async: async_start.is_some(),
                name,
                parameters,
                return_annotation,
                suite,
            },
        )
    }

    /// Parameters up to (not including) `terminator`. Lambdas pass
    /// `allow_annotations = false` since `:` ends their parameter list.
    pub(crate) fn parse_parameter_list(
        &mut self,
        terminator: TokenKind,
        allow_annotations: bool,
    ) -> Vec<NodeIndex> {
        let mut parameters = Vec::new();
        while !self.at(terminator) && !self.at_end_of_line() {
            let start = self.current_start();
            let category = if self.consume_operator(OperatorKind::Multiply).is_some() {
                ParameterCategory::VarArgList
            } else if self.consume_operator(OperatorKind::Power).is_some() {
                ParameterCategory::VarArgDictionary
            } else {
                ParameterCategory::Simple
            };

            let mut name = None;
            if self.at(TokenKind::Identifier) {
                let token = self.advance();
                name = Some(self.make_name(token));
            } else if category == ParameterCategory::Simple
                && self.consume_operator(OperatorKind::Divide).is_none()
            {
                self.parse_error_at_current("Expected parameter name");
                self.advance();
            }

            let annotation = if allow_annotations
                && name.is_some()
                && self.consume(TokenKind::Colon).is_some()
            {
                Some(self.parse_test_expression())
            } else {
                None
            };
            let default_value = if self.consume_operator(OperatorKind::Assign).is_some() {
                Some(self.parse_test_expression())
            } else {
                None
            };

            let end = self.prev_end();
            parameters.push(self.arena.add(
                start,
                end,
                NodeData::Parameter {
                    category,
                    name,
                    annotation,
                    default_value,
                },
            ));

            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        parameters
    }

    fn parse_class_def(&mut self, decorators: Vec<NodeIndex>) -> NodeIndex {
        let start = self.advance().start;
        let name = self.parse_name("Expected class name");

        let mut arguments = Vec::new();
        if self.consume(TokenKind::OpenParenthesis).is_some() {
            arguments = self.parse_argument_list();
            if self.consume(TokenKind::CloseParenthesis).is_none() {
                self.parse_error_at_current("Expected \")\"");
            }
        }

        let suite = self.parse_suite();
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::Class {
                decorators,
                name,
                arguments,
                suite,
            },
        )
    }

    /// `if` and `elif`; an `elif` becomes a nested `If` in the else slot.
    fn parse_if_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let test = self.parse_test_expression();
        let if_suite = self.parse_suite();
        let else_suite = if self.at_keyword(KeywordKind::Elif) {
            Some(self.parse_if_statement())
        } else if self.consume_keyword(KeywordKind::Else).is_some() {
            Some(self.parse_suite())
        } else {
            None
        };
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::If {
                test,
                if_suite,
                else_suite,
            },
        )
    }

    fn parse_while_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let test = self.parse_test_expression();
        let while_suite = self.parse_suite();
        let else_suite = if self.consume_keyword(KeywordKind::Else).is_some() {
            Some(self.parse_suite())
        } else {
            None
        };
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::While {
                test,
                while_suite,
                else_suite,
            },
        )
    }

    fn parse_for_statement(&mut self, async_start: Option<u32>) -> NodeIndex {
        let for_token = self.advance();
        let start = async_start.unwrap_or(for_token.start);
        let target = self.parse_target_list();
        let iterable = if self.consume_keyword(KeywordKind::In).is_some() {
            self.parse_test_or_star_list()
        } else {
            self.parse_error_at_current("Expected \"in\"");
            self.error_node(ErrorCategory::MissingIn, None)
        };
        let for_suite = self.parse_suite();
        let else_suite = if self.consume_keyword(KeywordKind::Else).is_some() {
            Some(self.parse_suite())
        } else {
            None
        };
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::For {
                is_async: async_start.is_some(),
                target,
                iterable,
                for_suite,
                else_suite,
            },
        )
    }

    fn parse_try_statement(&mut self) -> NodeIndex {
        let start = self.advance().start;
        let try_suite = self.parse_suite();

        let mut except_clauses = Vec::new();
        while let Some(except) = self.consume_keyword(KeywordKind::Except) {
            let mut type_expression = None;
            let mut name = None;
            if !self.at(TokenKind::Colon) {
                type_expression = Some(self.parse_test_expression());
                if self.consume_keyword(KeywordKind::As).is_some() {
                    name = Some(self.parse_name("Expected symbol name after \"as\""));
                }
            }
            let except_suite = self.parse_suite();
            let end = except.end();
            except_clauses.push(self.arena.add(
                except.start,
                end,
                NodeData::Except {
                    type_expression,
                    name,
                    except_suite,
                },
            ));
        }

        let else_suite = if !except_clauses.is_empty()
            && self.consume_keyword(KeywordKind::Else).is_some()
        {
            Some(self.parse_suite())
        } else {
            None
        };
        let finally_suite = if self.consume_keyword(KeywordKind::Finally).is_some() {
            Some(self.parse_suite())
        } else {
            None
        };
        if except_clauses.is_empty() && finally_suite.is_none() {
            self.parse_error_at_current("Try statement must have at least one except or finally clause");
        }

        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::Try {
                try_suite,
                except_clauses,
                else_suite,
                finally_suite,
            },
        )
    }

    fn parse_with_statement(&mut self, async_start: Option<u32>) -> NodeIndex {
        let with_token = self.advance();
        let start = async_start.unwrap_or(with_token.start);
        let mut items = Vec::new();
        loop {
            let item_start = self.current_start();
            let expression = self.parse_test_expression();
            let target = if self.consume_keyword(KeywordKind::As).is_some() {
                Some(self.parse_target_list())
            } else {
                None
            };
            let end = self.prev_end();
            items.push(
                self.arena
                    .add(item_start, end, NodeData::WithItem { expression, target }),
            );
            if self.consume(TokenKind::Comma).is_none() {
                break;
            }
        }
        let suite = self.parse_suite();
        let end = start;
        self.arena.add(
            start,
            end,
            NodeData::With {
                is_async: async_start.is_some(),
                items,
                suite,
            },
        )
    }
}
