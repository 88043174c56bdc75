use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Let,
    Const,
    Var,
    If,
    Else,
    While,
    For,
    Function,
    Return,
    Class,
    This,
    Print,
    Try,
    Catch,
    Finally,
    Extends,
    Public,
    Private,
    Protected,
    Enum,
    Interface,
    Type,
    Namespace,
    Import,
    Export,
    As,
    Break,
    Continue,

    // Builtin type names, only meaningful inside annotations
    StringType,
    NumberType,
    BooleanType,
    VoidType,
    AnyType,
    NeverType,

    // Literals
    NumberLiteral,
    FloatLiteral,
    StringLiteral,
    TrueLiteral,
    FalseLiteral,
    NullLiteral,
    UndefinedLiteral,
    // `{}` scanned as a single token
    ObjectLiteral,
    // Never produced by the scanner, used as the kind of `[...]` literal expressions
    ListLiteral,

    Identifier,

    // Punctuation
    LeftParen,
    RightParen,
    LeftCurlyBrace,
    RightCurlyBrace,
    LeftSquareBrace,
    RightSquareBrace,
    Comma,
    Dot,
    SemiColon,
    Colon,
    QuestionMark,

    // Operators
    Equal,
    EqualEqual,
    Not,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Increment,
    PlusEqual,
    Minus,
    Decrement,
    MinusEqual,
    Asterisk,
    AsteriskEqual,
    Slash,
    SlashEqual,
    And,
    LogicalAnd,
    Pipe,
    LogicalOr,
    Arrow,

    NewLine,
    Eof,
    Unknown,
}

impl TokenKind {
    /// Kinds that end a statement under the flexible semicolon rule.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::SemiColon | TokenKind::NewLine | TokenKind::Eof | TokenKind::RightCurlyBrace
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(String::from(value))
    }
}

macro_rules! impl_from_num_for_literal {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Literal {
                fn from(n: $t) -> Literal {
                    Literal::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_literal!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenIndex(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
    pub length: usize,
    pub idx: TokenIndex,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: String,
        line: usize,
        col: usize,
        idx: usize,
        literal: Option<Literal>,
    ) -> Self {
        Token {
            kind,
            length: lexeme.chars().count(),
            lexeme,
            line,
            col,
            idx: TokenIndex(idx),
            literal,
        }
    }

    /// A token that never came out of the scanner, e.g. the `+` of a desugared `x += 1`.
    pub fn synthetic(kind: TokenKind, lexeme: &str, at: &Token) -> Self {
        Token {
            kind,
            lexeme: String::from(lexeme),
            line: at.line,
            col: at.col,
            length: at.length,
            idx: at.idx,
            literal: None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::NewLine => write!(f, "newline"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
