use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Literal, Token, TokenKind};

pub struct Scanner;

impl Scanner {
    const KEYWORDS: Map<&'static str, TokenKind> = phf_map! {
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "return" => TokenKind::Return,
        "class" => TokenKind::Class,
        "this" => TokenKind::This,
        "print" => TokenKind::Print,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "extends" => TokenKind::Extends,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "enum" => TokenKind::Enum,
        "interface" => TokenKind::Interface,
        "type" => TokenKind::Type,
        "namespace" => TokenKind::Namespace,
        "import" => TokenKind::Import,
        "export" => TokenKind::Export,
        "as" => TokenKind::As,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "string" => TokenKind::StringType,
        "number" => TokenKind::NumberType,
        "boolean" => TokenKind::BooleanType,
        "void" => TokenKind::VoidType,
        "any" => TokenKind::AnyType,
        "never" => TokenKind::NeverType,
        "true" => TokenKind::TrueLiteral,
        "false" => TokenKind::FalseLiteral,
        "null" => TokenKind::NullLiteral,
        "undefined" => TokenKind::UndefinedLiteral,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens<'a, 'b>(&'a mut self, src: &'b str) -> TokenStream
    where
        'b: 'a,
    {
        TokenStream::new(src)
    }
}

/// Scans the whole source, returning every token up to and including the trailing `Eof`.
#[tracing::instrument(level = "debug", skip_all, fields(len = src.len()))]
pub fn tokenize(src: &str) -> Result<Vec<Token>, Error> {
    let mut scanner = Scanner::new();
    drain(scanner.scan_tokens(src))
}

/// Like [`tokenize`], with line numbers counted from `first_line`. Used when the source is
/// one segment of a larger text.
pub fn tokenize_from_line(src: &str, first_line: usize) -> Result<Vec<Token>, Error> {
    drain(TokenStream::starting_at_line(src, first_line))
}

fn drain(mut stream: TokenStream) -> Result<Vec<Token>, Error> {
    let tokens: Vec<Token> = stream.by_ref().collect();

    match stream.error() {
        Some(err) => Err(err.clone()),
        None => {
            tracing::trace!(count = tokens.len(), "scanned tokens");
            Ok(tokens)
        }
    }
}

pub struct TokenStream {
    src: Vec<char>,

    // `start` and `current` points to the start and end of the token being scanned
    start: usize,
    current: usize,

    // Position of `current`, and of `start` once a token begins
    line: usize,
    col: usize,
    start_line: usize,
    start_col: usize,

    // This represents a token's index in the token stream
    index: usize,

    // Set once the eof token has been emitted, so the iterator can tell "reached the end" apart
    // from "reached the end and already said so".
    eof: bool,
    error: Option<Error>,
}

impl TokenStream {
    pub fn new(src: &str) -> Self {
        TokenStream::starting_at_line(src, 1)
    }

    pub fn starting_at_line(src: &str, line: usize) -> Self {
        TokenStream {
            src: src.chars().collect(),
            start: 0,
            current: 0,
            line,
            col: 1,
            start_line: line,
            start_col: 1,
            index: 0,
            eof: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = self.advance();

        let token = match c {
            '(' => Some(self.make_token(TokenKind::LeftParen)),
            ')' => Some(self.make_token(TokenKind::RightParen)),
            '[' => Some(self.make_token(TokenKind::LeftSquareBrace)),
            ']' => Some(self.make_token(TokenKind::RightSquareBrace)),
            '{' => {
                if self.match_char('}') {
                    Some(self.make_token(TokenKind::ObjectLiteral))
                } else {
                    Some(self.make_token(TokenKind::LeftCurlyBrace))
                }
            }
            '}' => Some(self.make_token(TokenKind::RightCurlyBrace)),
            ',' => Some(self.make_token(TokenKind::Comma)),
            '.' => Some(self.make_token(TokenKind::Dot)),
            ';' => Some(self.make_token(TokenKind::SemiColon)),
            ':' => Some(self.make_token(TokenKind::Colon)),
            '?' => Some(self.make_token(TokenKind::QuestionMark)),

            '!' => Some(self.either('=', TokenKind::NotEqual, TokenKind::Not)),
            '<' => Some(self.either('=', TokenKind::LessThanOrEqual, TokenKind::LessThan)),
            '>' => Some(self.either('=', TokenKind::GreaterThanOrEqual, TokenKind::GreaterThan)),
            '*' => Some(self.either('=', TokenKind::AsteriskEqual, TokenKind::Asterisk)),
            '&' => Some(self.either('&', TokenKind::LogicalAnd, TokenKind::And)),
            '|' => Some(self.either('|', TokenKind::LogicalOr, TokenKind::Pipe)),

            '=' => {
                if self.match_char('=') {
                    Some(self.make_token(TokenKind::EqualEqual))
                } else if self.match_char('>') {
                    Some(self.make_token(TokenKind::Arrow))
                } else {
                    Some(self.make_token(TokenKind::Equal))
                }
            }

            '+' => {
                if self.match_char('+') {
                    Some(self.make_token(TokenKind::Increment))
                } else {
                    Some(self.either('=', TokenKind::PlusEqual, TokenKind::Plus))
                }
            }

            '-' => {
                if self.match_char('-') {
                    Some(self.make_token(TokenKind::Decrement))
                } else {
                    Some(self.either('=', TokenKind::MinusEqual, TokenKind::Minus))
                }
            }

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else if self.match_char('*') {
                    self.block_comment()?;
                    None
                } else {
                    Some(self.either('=', TokenKind::SlashEqual, TokenKind::Slash))
                }
            }

            '"' => Some(self.string()?),

            // White spaces, do nothing
            ' ' | '\t' | '\r' => None,

            // Newlines are significant, they terminate statements
            '\n' => {
                let token = self.make_token(TokenKind::NewLine);
                self.line += 1;
                self.col = 1;
                Some(token)
            }

            _ => {
                if c.is_ascii_digit() {
                    Some(self.number())
                } else if c.is_alphabetic() {
                    Some(self.identifier())
                } else {
                    return Err(Error::UnexpectedCharacter {
                        ch: c,
                        line: self.start_line,
                        col: self.start_col,
                    });
                }
            }
        };

        Ok(token)
    }

    fn either(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) -> Token {
        if self.match_char(next) {
            self.make_token(matched)
        } else {
            self.make_token(otherwise)
        }
    }

    fn block_comment(&mut self) -> Result<(), Error> {
        while !self.is_at_end() {
            let now = self.advance();
            if now == '\n' {
                self.line += 1;
                self.col = 1;
            } else if now == '*' && self.peek() == '/' {
                self.advance();
                return Ok(());
            }
        }

        Err(Error::UnterminatedBlockComment {
            line: self.start_line,
            col: self.start_col,
        })
    }

    fn string(&mut self) -> Result<Token, Error> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.advance() == '\n' {
                self.line += 1;
                self.col = 1;
            }
        }

        if self.is_at_end() {
            return Err(Error::UnterminatedString {
                line: self.start_line,
                col: self.start_col,
            });
        }

        // consume the closing "
        self.advance();
        let value: String = self.src[self.start + 1..self.current - 1].iter().collect();
        Ok(self.make_token_with_val(TokenKind::StringLiteral, Some(Literal::from(value))))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut kind = TokenKind::NumberLiteral;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            kind = TokenKind::FloatLiteral;
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // A run of ascii digits with at most one inner dot always parses
        let text: String = self.src[self.start..self.current].iter().collect();
        let value = text.parse::<f64>().unwrap_or_default();
        self.make_token_with_val(kind, Some(Literal::Num(value)))
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.src[self.start..self.current].iter().collect();

        match Scanner::KEYWORDS.get(text.as_str()) {
            None => self.make_token(TokenKind::Identifier),
            Some(TokenKind::TrueLiteral) => {
                self.make_token_with_val(TokenKind::TrueLiteral, Some(Literal::Bool(true)))
            }
            Some(TokenKind::FalseLiteral) => {
                self.make_token_with_val(TokenKind::FalseLiteral, Some(Literal::Bool(false)))
            }
            Some(keyword) => self.make_token(*keyword),
        }
    }

    fn peek(&self) -> char {
        self.src.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.src.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let res = self.peek();
        self.current += 1;
        self.col += 1;
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.peek() != c {
            false
        } else {
            self.advance();
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, kind: TokenKind) -> Token {
        self.make_token_with_val(kind, None)
    }

    fn make_token_with_val(&mut self, kind: TokenKind, literal: Option<Literal>) -> Token {
        let lexeme = match kind {
            TokenKind::Eof => String::new(),
            _ => self.src[self.start..self.current].iter().collect(),
        };

        let token = Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_col,
            self.index,
            literal,
        );
        self.index += 1;
        token
    }
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.col;

            match self.scan_token() {
                Ok(None) => continue,
                Ok(Some(token)) => return Some(token),
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }

        self.start = self.current;
        self.start_line = self.line;
        self.start_col = self.col;
        self.eof = true;
        Some(self.make_token(TokenKind::Eof))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::error::Error;
    use crate::scanner::{tokenize, tokenize_from_line, Scanner};
    use crate::token::{Literal, Token, TokenKind};

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_basic_scanning() {
        let source = "let foo = 12.45 \"hi\" true {} // this is a comment";
        let mut scanner = Scanner::new();
        let stream = scanner.scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![
                Token::new(TokenKind::Let, String::from("let"), 1, 1, 0, None),
                Token::new(TokenKind::Identifier, String::from("foo"), 1, 5, 1, None),
                Token::new(TokenKind::Equal, String::from("="), 1, 9, 2, None),
                Token::new(
                    TokenKind::FloatLiteral,
                    String::from("12.45"),
                    1,
                    11,
                    3,
                    Some(Literal::Num(12.45))
                ),
                Token::new(
                    TokenKind::StringLiteral,
                    String::from("\"hi\""),
                    1,
                    17,
                    4,
                    Some(Literal::from("hi"))
                ),
                Token::new(
                    TokenKind::TrueLiteral,
                    String::from("true"),
                    1,
                    22,
                    5,
                    Some(Literal::Bool(true))
                ),
                Token::new(TokenKind::ObjectLiteral, String::from("{}"), 1, 27, 6, None),
                Token::new(TokenKind::Eof, String::new(), 1, 50, 7, None),
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        let tokens = tokenize("42").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[0].literal, Some(Literal::Num(42.0)));
        assert_eq!(tokens[1].kind, TokenKind::Eof);

        let tokens = tokenize("3.25").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[0].literal, Some(Literal::Num(3.25)));

        // a trailing dot is not part of the number
        assert_eq!(
            kinds("7.foo"),
            vec![
                TokenKind::NumberLiteral,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= && || ++ -- += -= *= /= =>"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::LessThanOrEqual,
                TokenKind::GreaterThanOrEqual,
                TokenKind::LogicalAnd,
                TokenKind::LogicalOr,
                TokenKind::Increment,
                TokenKind::Decrement,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::AsteriskEqual,
                TokenKind::SlashEqual,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("= ! < > & | + - * /"),
            vec![
                TokenKind::Equal,
                TokenKind::Not,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::And,
                TokenKind::Pipe,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier,
                TokenKind::NewLine,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!((tokens[1].line, tokens[1].col), (1, 2));
        assert_eq!((tokens[2].line, tokens[2].col), (2, 3));

        let tokens = tokenize_from_line("a\n  b", 10).unwrap();
        assert_eq!((tokens[0].line, tokens[2].line), (10, 11));
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class this_one print null undefined false"),
            vec![
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Print,
                TokenKind::NullLiteral,
                TokenKind::UndefinedLiteral,
                TokenKind::FalseLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_object_literal_shorthand_needs_adjacent_braces() {
        assert_eq!(kinds("{}"), vec![TokenKind::ObjectLiteral, TokenKind::Eof]);
        assert_eq!(
            kinds("{ }"),
            vec![
                TokenKind::LeftCurlyBrace,
                TokenKind::RightCurlyBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_multiline_comment() {
        let source = "/*\n\
            this is a multiline comment \n\
        */x";
        let tokens = tokenize(source).unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Identifier, String::from("x"), 3, 3, 0, None),
                Token::new(TokenKind::Eof, String::new(), 3, 4, 1, None),
            ]
        );
    }

    #[test]
    fn test_unterminated_multiline_comment() {
        assert_eq!(
            tokenize("a /*"),
            Err(Error::UnterminatedBlockComment { line: 1, col: 3 })
        );
    }

    #[test]
    fn test_unterminated_string() {
        let source = "\n\"hello";
        let mut scanner = Scanner::new();
        let mut stream = scanner.scan_tokens(source);
        stream.by_ref().last();

        assert_eq!(
            stream.error().unwrap(),
            &Error::UnterminatedString { line: 2, col: 1 }
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            tokenize("let a = #"),
            Err(Error::UnexpectedCharacter {
                ch: '#',
                line: 1,
                col: 9
            })
        );
    }
}
