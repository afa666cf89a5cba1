//! Token definitions.
//!
//! Every enumeration here is `#[repr(u8)]` with discriminants in declaration
//! order; the raw code is what debug tooling renders when it meets a value it
//! does not recognise.

use bitflags::bitflags;
use pyz_common::TextRange;
use serde::{Serialize, Serializer};

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TokenKind {
    Invalid,
    EndOfStream,
    NewLine,
    Indent,
    Dedent,
    String,
    Number,
    Identifier,
    Keyword,
    Operator,
    Colon,
    Semicolon,
    Comma,
    OpenParenthesis,
    CloseParenthesis,
    OpenBracket,
    CloseBracket,
    OpenCurlyBrace,
    CloseCurlyBrace,
    Ellipsis,
    Dot,
    Arrow,
    Backtick,
}

impl TokenKind {
    pub const COUNT: usize = TokenKind::Backtick as usize + 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NewLineKind {
    CarriageReturn,
    LineFeed,
    CarriageReturnLineFeed,
    Implied,
}

impl NewLineKind {
    pub const COUNT: usize = NewLineKind::Implied as usize + 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum OperatorKind {
    Add,
    AddEqual,
    Assign,
    BitwiseAnd,
    BitwiseAndEqual,
    BitwiseInvert,
    BitwiseOr,
    BitwiseOrEqual,
    BitwiseXor,
    BitwiseXorEqual,
    Divide,
    DivideEqual,
    Equals,
    FloorDivide,
    FloorDivideEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LeftShift,
    LeftShiftEqual,
    LessOrGreaterThan,
    LessThan,
    LessThanOrEqual,
    MatrixMultiply,
    MatrixMultiplyEqual,
    Mod,
    ModEqual,
    Multiply,
    MultiplyEqual,
    NotEquals,
    Power,
    PowerEqual,
    RightShift,
    RightShiftEqual,
    Subtract,
    SubtractEqual,
    Walrus,
    And,
    Or,
    Not,
    Is,
    IsNot,
    In,
    NotIn,
}

impl OperatorKind {
    pub const COUNT: usize = OperatorKind::NotIn as usize + 1;

    /// Binding strength for binary operators; `None` for non-binary operators.
    pub fn binary_precedence(self) -> Option<u8> {
        use OperatorKind::*;
        Some(match self {
            Or => 1,
            And => 2,
            Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual
            | LessOrGreaterThan | Is | IsNot | In | NotIn => 4,
            BitwiseOr => 5,
            BitwiseXor => 6,
            BitwiseAnd => 7,
            LeftShift | RightShift => 8,
            Add | Subtract => 9,
            Multiply | MatrixMultiply | Divide | FloorDivide | Mod => 10,
            Power => 12,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        self.binary_precedence() == Some(4)
    }

    /// Operators written `x op= y`.
    pub fn is_augmented_assignment(self) -> bool {
        use OperatorKind::*;
        matches!(
            self,
            AddEqual
                | BitwiseAndEqual
                | BitwiseOrEqual
                | BitwiseXorEqual
                | DivideEqual
                | FloorDivideEqual
                | LeftShiftEqual
                | MatrixMultiplyEqual
                | ModEqual
                | MultiplyEqual
                | PowerEqual
                | RightShiftEqual
                | SubtractEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum KeywordKind {
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Debug,
    Def,
    Del,
    Elif,
    Else,
    Except,
    False,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    None,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    True,
    Try,
    While,
    With,
    Yield,
}

impl KeywordKind {
    pub const COUNT: usize = KeywordKind::Yield as usize + 1;

    pub fn from_text(text: &str) -> Option<KeywordKind> {
        use KeywordKind::*;
        Some(match text {
            "and" => And,
            "as" => As,
            "assert" => Assert,
            "async" => Async,
            "await" => Await,
            "break" => Break,
            "class" => Class,
            "continue" => Continue,
            "__debug__" => Debug,
            "def" => Def,
            "del" => Del,
            "elif" => Elif,
            "else" => Else,
            "except" => Except,
            "False" => False,
            "finally" => Finally,
            "for" => For,
            "from" => From,
            "global" => Global,
            "if" => If,
            "import" => Import,
            "in" => In,
            "is" => Is,
            "lambda" => Lambda,
            "None" => None,
            "nonlocal" => Nonlocal,
            "not" => Not,
            "or" => Or,
            "pass" => Pass,
            "raise" => Raise,
            "return" => Return,
            "True" => True,
            "try" => Try,
            "while" => While,
            "with" => With,
            "yield" => Yield,
            _ => return Option::None,
        })
    }
}

bitflags! {
    /// Prefix and quoting information for a string token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StringFlags: u32 {
        const SINGLE_QUOTE = 1 << 0;
        const DOUBLE_QUOTE = 1 << 1;
        const TRIPLICATE = 1 << 2;
        const RAW = 1 << 3;
        const UNICODE = 1 << 4;
        const BYTES = 1 << 5;
        const FORMAT = 1 << 6;
        const UNTERMINATED = 1 << 16;
    }
}

fn serialize_string_flags<S: Serializer>(flags: &StringFlags, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u32(flags.bits())
}

/// Numeric literal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for NumberValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberValue::Int(v) => write!(f, "{v}"),
            NumberValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Kind-specific token payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TokenData {
    None,
    NewLine(NewLineKind),
    Operator(OperatorKind),
    Keyword(KeywordKind),
    Identifier {
        value: String,
    },
    String {
        #[serde(serialize_with = "serialize_string_flags")]
        flags: StringFlags,
        escaped_value: String,
        has_unescape_errors: bool,
    },
    Number {
        value: NumberValue,
        is_integer: bool,
        is_imaginary: bool,
    },
    Indent {
        amount: u32,
    },
    Dedent {
        amount: u32,
        matches_indent: bool,
    },
}

impl TokenData {
    pub fn is_none(&self) -> bool {
        matches!(self, TokenData::None)
    }
}

/// A single token. Offsets are byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub length: u32,
    #[serde(flatten, skip_serializing_if = "TokenData::is_none")]
    pub data: TokenData,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, length: u32, data: TokenData) -> Self {
        Token {
            kind,
            start,
            length,
            data,
        }
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.length)
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn new_line_kind(&self) -> Option<NewLineKind> {
        match self.data {
            TokenData::NewLine(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn operator_kind(&self) -> Option<OperatorKind> {
        match self.data {
            TokenData::Operator(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn keyword_kind(&self) -> Option<KeywordKind> {
        match self.data {
            TokenData::Keyword(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn string_flags(&self) -> Option<StringFlags> {
        match self.data {
            TokenData::String { flags, .. } => Some(flags),
            _ => None,
        }
    }

    pub fn identifier_text(&self) -> Option<&str> {
        match &self.data {
            TokenData::Identifier { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: KeywordKind) -> bool {
        self.keyword_kind() == Some(keyword)
    }

    pub fn is_operator(&self, operator: OperatorKind) -> bool {
        self.operator_kind() == Some(operator)
    }
}
