//! Scanner implementation.
//!
//! Produces the complete token stream for a file in one pass. The scanner
//! never fails: characters it cannot classify become `Invalid` tokens and
//! strings that run off the end of a line or file are flagged `UNTERMINATED`.

use memchr::memchr2;
use pyz_common::LineMap;
use tracing::debug;

use crate::token::{
    KeywordKind, NewLineKind, NumberValue, OperatorKind, StringFlags, Token, TokenData, TokenKind,
};

/// Number of columns a tab advances indentation to (next multiple of 8).
const TAB_STOP: u32 = 8;

/// Result of tokenizing one file.
#[derive(Debug, Clone)]
pub struct TokenizerOutput {
    pub tokens: Vec<Token>,
    pub lines: LineMap,
}

impl TokenizerOutput {
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }
}

/// Tokenize `text` into a token stream ending in `EndOfStream`.
pub fn tokenize(text: &str) -> TokenizerOutput {
    Scanner::new(text).scan_all()
}

pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    paren_depth: u32,
    indent_stack: Vec<u32>,
    at_line_start: bool,
    line_has_tokens: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            paren_depth: 0,
            indent_stack: Vec::new(),
            at_line_start: true,
            line_has_tokens: false,
        }
    }

    pub fn scan_all(mut self) -> TokenizerOutput {
        while self.pos < self.bytes.len() {
            if self.at_line_start && self.paren_depth == 0 {
                self.scan_indentation();
                if self.pos >= self.bytes.len() {
                    break;
                }
            }
            self.at_line_start = false;
            self.scan_token();
        }

        let end = self.bytes.len() as u32;
        if self.line_has_tokens {
            self.push(TokenKind::NewLine, end, 0, TokenData::NewLine(NewLineKind::Implied));
        }
        while self.indent_stack.pop().is_some() {
            let amount = self.current_indent();
            self.push(
                TokenKind::Dedent,
                end,
                0,
                TokenData::Dedent {
                    amount,
                    matches_indent: true,
                },
            );
        }
        self.push(TokenKind::EndOfStream, end, 0, TokenData::None);

        debug!(tokens = self.tokens.len(), bytes = self.bytes.len(), "tokenized file");
        TokenizerOutput {
            tokens: self.tokens,
            lines: LineMap::build(self.text),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[inline]
    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn current_indent(&self) -> u32 {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn push(&mut self, kind: TokenKind, start: u32, length: u32, data: TokenData) {
        match kind {
            TokenKind::NewLine => self.line_has_tokens = false,
            TokenKind::Indent | TokenKind::Dedent | TokenKind::EndOfStream => {}
            _ => self.line_has_tokens = true,
        }
        self.tokens.push(Token::new(kind, start, length, data));
    }

    fn push_simple(&mut self, kind: TokenKind, length: usize) {
        let start = self.pos as u32;
        self.pos += length;
        self.push(kind, start, length as u32, TokenData::None);
    }

    fn push_operator(&mut self, operator: OperatorKind, length: usize) {
        let start = self.pos as u32;
        self.pos += length;
        self.push(
            TokenKind::Operator,
            start,
            length as u32,
            TokenData::Operator(operator),
        );
    }

    // =========================================================================
    // Indentation
    // =========================================================================

    /// Measure the indentation of a new logical line and emit Indent/Dedent
    /// tokens. Blank and comment-only lines leave the indentation untouched.
    fn scan_indentation(&mut self) {
        let mut width = 0u32;
        let mut cursor = self.pos;
        while let Some(&b) = self.bytes.get(cursor) {
            match b {
                b' ' => width += 1,
                b'\t' => width = (width / TAB_STOP + 1) * TAB_STOP,
                b'\x0c' => width = 0,
                _ => break,
            }
            cursor += 1;
        }
        self.pos = cursor;

        match self.bytes.get(cursor) {
            None | Some(b'\n') | Some(b'\r') | Some(b'#') => return,
            _ => {}
        }

        let current = self.current_indent();
        let start = self.pos as u32;
        if width > current {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, start, 0, TokenData::Indent { amount: width });
        } else if width < current {
            while self.current_indent() > width {
                self.indent_stack.pop();
                let amount = self.current_indent();
                // popping below the new width means no enclosing block matches it
                self.push(
                    TokenKind::Dedent,
                    start,
                    0,
                    TokenData::Dedent {
                        amount,
                        matches_indent: amount >= width,
                    },
                );
            }
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn scan_token(&mut self) {
        let b = self.peek(0);
        match b {
            b' ' | b'\t' | b'\x0c' => self.pos += 1,
            b'\n' | b'\r' => self.scan_newline(),
            b'#' => self.skip_comment(),
            b'\\' if matches!(self.peek(1), b'\n' | b'\r') => {
                // explicit line joining
                self.pos += 1;
                if self.peek(0) == b'\r' && self.peek(1) == b'\n' {
                    self.pos += 2;
                } else {
                    self.pos += 1;
                }
            }
            b'(' => {
                self.paren_depth += 1;
                self.push_simple(TokenKind::OpenParenthesis, 1);
            }
            b'[' => {
                self.paren_depth += 1;
                self.push_simple(TokenKind::OpenBracket, 1);
            }
            b'{' => {
                self.paren_depth += 1;
                self.push_simple(TokenKind::OpenCurlyBrace, 1);
            }
            b')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.push_simple(TokenKind::CloseParenthesis, 1);
            }
            b']' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.push_simple(TokenKind::CloseBracket, 1);
            }
            b'}' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.push_simple(TokenKind::CloseCurlyBrace, 1);
            }
            b',' => self.push_simple(TokenKind::Comma, 1),
            b';' => self.push_simple(TokenKind::Semicolon, 1),
            b'`' => self.push_simple(TokenKind::Backtick, 1),
            b':' => {
                if self.peek(1) == b'=' {
                    self.push_operator(OperatorKind::Walrus, 2);
                } else {
                    self.push_simple(TokenKind::Colon, 1);
                }
            }
            b'.' => {
                if self.peek(1).is_ascii_digit() {
                    self.scan_number();
                } else if self.peek(1) == b'.' && self.peek(2) == b'.' {
                    self.push_simple(TokenKind::Ellipsis, 3);
                } else {
                    self.push_simple(TokenKind::Dot, 1);
                }
            }
            b'-' if self.peek(1) == b'>' => self.push_simple(TokenKind::Arrow, 2),
            b'0'..=b'9' => self.scan_number(),
            b'"' | b'\'' => self.scan_string(self.pos, StringFlags::empty()),
            _ => {
                if let Some((operator, length)) = self.match_operator() {
                    self.push_operator(operator, length);
                } else if !self.try_identifier_or_string() {
                    let length = self.current_char().map(char::len_utf8).unwrap_or(1);
                    self.push_simple(TokenKind::Invalid, length);
                }
            }
        }
    }

    fn scan_newline(&mut self) {
        let start = self.pos as u32;
        let (kind, length) = if self.peek(0) == b'\r' {
            if self.peek(1) == b'\n' {
                (NewLineKind::CarriageReturnLineFeed, 2)
            } else {
                (NewLineKind::CarriageReturn, 1)
            }
        } else {
            (NewLineKind::LineFeed, 1)
        };
        self.pos += length as usize;

        if self.paren_depth == 0 {
            if self.line_has_tokens {
                self.push(TokenKind::NewLine, start, length, TokenData::NewLine(kind));
            }
            self.at_line_start = true;
        }
    }

    fn skip_comment(&mut self) {
        match memchr2(b'\n', b'\r', &self.bytes[self.pos..]) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.bytes.len(),
        }
    }

    fn match_operator(&self) -> Option<(OperatorKind, usize)> {
        use OperatorKind::*;
        let (b0, b1, b2) = (self.peek(0), self.peek(1), self.peek(2));
        let three = match (b0, b1, b2) {
            (b'*', b'*', b'=') => Some(PowerEqual),
            (b'/', b'/', b'=') => Some(FloorDivideEqual),
            (b'<', b'<', b'=') => Some(LeftShiftEqual),
            (b'>', b'>', b'=') => Some(RightShiftEqual),
            _ => None,
        };
        if let Some(op) = three {
            return Some((op, 3));
        }
        let two = match (b0, b1) {
            (b'*', b'*') => Some(Power),
            (b'/', b'/') => Some(FloorDivide),
            (b'<', b'<') => Some(LeftShift),
            (b'>', b'>') => Some(RightShift),
            (b'<', b'=') => Some(LessThanOrEqual),
            (b'>', b'=') => Some(GreaterThanOrEqual),
            (b'=', b'=') => Some(Equals),
            (b'!', b'=') => Some(NotEquals),
            (b'<', b'>') => Some(LessOrGreaterThan),
            (b'+', b'=') => Some(AddEqual),
            (b'-', b'=') => Some(SubtractEqual),
            (b'*', b'=') => Some(MultiplyEqual),
            (b'/', b'=') => Some(DivideEqual),
            (b'%', b'=') => Some(ModEqual),
            (b'&', b'=') => Some(BitwiseAndEqual),
            (b'|', b'=') => Some(BitwiseOrEqual),
            (b'^', b'=') => Some(BitwiseXorEqual),
            (b'@', b'=') => Some(MatrixMultiplyEqual),
            _ => None,
        };
        if let Some(op) = two {
            return Some((op, 2));
        }
        let one = match b0 {
            b'+' => Add,
            b'-' => Subtract,
            b'*' => Multiply,
            b'/' => Divide,
            b'%' => Mod,
            b'&' => BitwiseAnd,
            b'|' => BitwiseOr,
            b'^' => BitwiseXor,
            b'~' => BitwiseInvert,
            b'@' => MatrixMultiply,
            b'<' => LessThan,
            b'>' => GreaterThan,
            b'=' => Assign,
            _ => return None,
        };
        Some((one, 1))
    }

    // =========================================================================
    // Identifiers and keywords
    // =========================================================================

    fn try_identifier_or_string(&mut self) -> bool {
        let start = self.pos;
        let Some(first) = self.current_char() else {
            return false;
        };
        if first != '_' && !first.is_alphabetic() {
            return false;
        }

        let rest = &self.text[start..];
        let length = rest
            .char_indices()
            .find(|&(_, c)| c != '_' && !c.is_alphanumeric())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let word = &rest[..length];

        if matches!(self.bytes.get(start + length), Some(b'"') | Some(b'\'')) {
            if let Some(prefix) = string_prefix_flags(word) {
                self.pos = start + length;
                self.scan_string(start, prefix);
                return true;
            }
        }

        self.pos = start + length;
        let (kind, data) = match KeywordKind::from_text(word) {
            Some(keyword) => (TokenKind::Keyword, TokenData::Keyword(keyword)),
            None => (
                TokenKind::Identifier,
                TokenData::Identifier {
                    value: word.to_string(),
                },
            ),
        };
        self.push(kind, start as u32, length as u32, data);
        true
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    fn scan_number(&mut self) {
        let start = self.pos;
        let radix = match (self.peek(0), self.peek(1) | 0x20) {
            (b'0', b'x') => 16,
            (b'0', b'o') => 8,
            (b'0', b'b') => 2,
            _ => 10,
        };

        let mut is_integer = true;
        if radix != 10 {
            self.pos += 2;
            while self.peek(0) == b'_' || (self.peek(0) as char).is_digit(radix) {
                self.pos += 1;
            }
        } else {
            self.eat_digits();
            if self.peek(0) == b'.' {
                is_integer = false;
                self.pos += 1;
                self.eat_digits();
            }
            if self.peek(0) | 0x20 == b'e' {
                let sign = usize::from(matches!(self.peek(1), b'+' | b'-'));
                if self.peek(1 + sign).is_ascii_digit() {
                    is_integer = false;
                    self.pos += 1 + sign;
                    self.eat_digits();
                }
            }
        }

        let digits: String = self.text[start..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let is_imaginary = self.peek(0) | 0x20 == b'j';
        if is_imaginary {
            self.pos += 1;
        }

        let value = if is_integer {
            let body = if radix == 10 { &digits[..] } else { &digits[2..] };
            match i64::from_str_radix(body, radix) {
                Ok(v) => NumberValue::Int(v),
                Err(_) => NumberValue::Float(
                    u128::from_str_radix(body, radix)
                        .map(|v| v as f64)
                        .unwrap_or(0.0),
                ),
            }
        } else {
            NumberValue::Float(digits.parse::<f64>().unwrap_or(f64::NAN))
        };

        self.push(
            TokenKind::Number,
            start as u32,
            (self.pos - start) as u32,
            TokenData::Number {
                value,
                is_integer,
                is_imaginary,
            },
        );
    }

    fn eat_digits(&mut self) {
        while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
            self.pos += 1;
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Scan a string literal whose prefix (if any) spans `start..self.pos`.
    fn scan_string(&mut self, start: usize, mut flags: StringFlags) {
        let quote = self.peek(0);
        flags |= if quote == b'\'' {
            StringFlags::SINGLE_QUOTE
        } else {
            StringFlags::DOUBLE_QUOTE
        };
        let triple = self.peek(1) == quote && self.peek(2) == quote;
        let quote_len = if triple {
            flags |= StringFlags::TRIPLICATE;
            3
        } else {
            1
        };
        self.pos += quote_len;

        let raw = flags.contains(StringFlags::RAW);
        let bytes_literal = flags.contains(StringFlags::BYTES);
        let mut value = String::new();
        let mut has_unescape_errors = false;

        loop {
            let Some(c) = self.current_char() else {
                flags |= StringFlags::UNTERMINATED;
                break;
            };
            match c {
                '\n' | '\r' if !triple => {
                    flags |= StringFlags::UNTERMINATED;
                    break;
                }
                '\\' => {
                    self.pos += 1;
                    let Some(next) = self.current_char() else {
                        value.push('\\');
                        continue;
                    };
                    if raw {
                        value.push('\\');
                        value.push(next);
                        self.pos += next.len_utf8();
                    } else if !self.unescape(next, bytes_literal, &mut value) {
                        has_unescape_errors = true;
                    }
                }
                c if c as u32 == quote as u32 => {
                    if !triple {
                        self.pos += 1;
                        break;
                    }
                    if self.peek(1) == quote && self.peek(2) == quote {
                        self.pos += 3;
                        break;
                    }
                    value.push(c);
                    self.pos += 1;
                }
                c => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }

        self.push(
            TokenKind::String,
            start as u32,
            (self.pos - start) as u32,
            TokenData::String {
                flags,
                escaped_value: value,
                has_unescape_errors,
            },
        );
    }

    /// Decode the escape sequence starting at `next` (the character after the
    /// backslash). Returns `false` when the escape is malformed.
    fn unescape(&mut self, next: char, bytes_literal: bool, out: &mut String) -> bool {
        self.pos += next.len_utf8();
        let simple = match next {
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\x0b'),
            _ => None,
        };
        if let Some(c) = simple {
            out.push(c);
            return true;
        }

        match next {
            '\n' => true,
            '\r' => {
                if self.peek(0) == b'\n' {
                    self.pos += 1;
                }
                true
            }
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match (self.peek(0) as char).to_digit(8) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                true
            }
            'x' => self.unescape_hex(2, out),
            'u' if !bytes_literal => self.unescape_hex(4, out),
            'U' if !bytes_literal => self.unescape_hex(8, out),
            other => {
                out.push('\\');
                out.push(other);
                true
            }
        }
    }

    fn unescape_hex(&mut self, digits: usize, out: &mut String) -> bool {
        let end = self.pos + digits;
        let code = self
            .text
            .get(self.pos..end)
            .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|s| u32::from_str_radix(s, 16).ok())
            .and_then(char::from_u32);
        match code {
            Some(c) => {
                out.push(c);
                self.pos = end;
                true
            }
            None => false,
        }
    }
}

/// Interpret an identifier directly followed by a quote as a string prefix.
fn string_prefix_flags(word: &str) -> Option<StringFlags> {
    if word.len() > 2 {
        return None;
    }
    let mut flags = StringFlags::empty();
    for c in word.chars() {
        let flag = match c.to_ascii_lowercase() {
            'r' => StringFlags::RAW,
            'u' => StringFlags::UNICODE,
            'b' => StringFlags::BYTES,
            'f' => StringFlags::FORMAT,
            _ => return None,
        };
        if flags.contains(flag) {
            return None;
        }
        flags |= flag;
    }
    let invalid = (flags.contains(StringFlags::UNICODE) && flags.bits().count_ones() > 1)
        || flags.contains(StringFlags::BYTES | StringFlags::FORMAT);
    if invalid { None } else { Some(flags) }
}
