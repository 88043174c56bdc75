use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("[line {line}:{col}] scanner error: unterminated block comment")]
    UnterminatedBlockComment { line: usize, col: usize },

    #[error("[line {line}:{col}] scanner error: unterminated string")]
    UnterminatedString { line: usize, col: usize },

    #[error("[line {line}:{col}] scanner error: unexpected character {ch:?}")]
    UnexpectedCharacter { ch: char, line: usize, col: usize },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::UnterminatedBlockComment { line, .. } => *line,
            Error::UnterminatedString { line, .. } => *line,
            Error::UnexpectedCharacter { line, .. } => *line,
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Error::UnterminatedBlockComment { col, .. } => *col,
            Error::UnterminatedString { col, .. } => *col,
            Error::UnexpectedCharacter { col, .. } => *col,
        }
    }

    /// The message without the position prefix.
    pub fn message(&self) -> String {
        match self {
            Error::UnterminatedBlockComment { .. } => String::from("unterminated block comment"),
            Error::UnterminatedString { .. } => String::from("unterminated string"),
            Error::UnexpectedCharacter { ch, .. } => format!("unexpected character {:?}", ch),
        }
    }
}
