//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

use smol_str::SmolStr;

use crate::lex::{Token, TokenKind};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    Lex(LexError),
    Token(TokenError),
    Parse(ParseError),
    Symbol(SymbolError),
    CodeGen(CodeGenError),
    Io(io::Error),
    Multi(Vec<JackError>),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "lexical error: {}", err),
            Self::Token(err) => write!(f, "syntax error: {}", err),
            Self::Parse(err) => write!(f, "syntax error: {}", err),
            Self::Symbol(err) => write!(f, "symbol error: {}", err),
            Self::CodeGen(err) => write!(f, "code generation error: {}", err),
            Self::Io(err) => write!(f, "{}", err),
            Self::Multi(errors) => {
                // Print all errors separated with a newline
                let count = errors.len();
                for (index, err) in errors.iter().enumerate() {
                    write!(f, "{}", err)?;
                    if index + 1 < count {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for JackError {}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<TokenError> for JackError {
    fn from(err: TokenError) -> Self {
        JackError::Token(err)
    }
}

impl From<ParseError> for JackError {
    fn from(err: ParseError) -> Self {
        JackError::Parse(err)
    }
}

impl From<SymbolError> for JackError {
    fn from(err: SymbolError) -> Self {
        JackError::Symbol(err)
    }
}

impl From<CodeGenError> for JackError {
    fn from(err: CodeGenError) -> Self {
        JackError::CodeGen(err)
    }
}

/// Error produced while scanning bytes into tokens.
#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone)]
pub enum LexErrorKind {
    /// A byte that cannot start any token.
    UnexpectedByte(u8),
    /// The source ended inside a string constant or block comment.
    UnexpectedEof,
}

impl std::error::Error for LexError {}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind {
            LexErrorKind::UnexpectedByte(byte) => write!(
                f,
                "unexpected byte '{}' at line {}, column {}",
                byte.escape_ascii(),
                self.line,
                self.column
            ),
            LexErrorKind::UnexpectedEof => write!(
                f,
                "unexpected end of file at line {}, column {}",
                self.line, self.column
            ),
        }
    }
}

/// Error returned when an unexpected token type is encountered.
#[derive(Debug)]
pub enum TokenError {
    Mismatch {
        expected: TokenKind,
        encountered: TokenKind,
        line: u32,
        column: u32,
    },
    EndOfSource,
}

impl std::error::Error for TokenError {}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Mismatch {
                expected,
                encountered,
                line,
                column,
            } => write!(
                f,
                "encountered unexpected token '{}', expected '{}' at line {}, column {}",
                encountered, expected, line, column
            ),
            Self::EndOfSource => write!(f, "unexpected end of source code"),
        }
    }
}

/// Grammar-level parsing error, rendered with the offending source line.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    line_text: String,
    marker_width: usize,
}

impl ParseError {
    const MARKER: char = '^';

    /// Construct an error anchored at the given token.
    pub fn new(source_code: &str, token: &Token, message: impl ToString) -> Self {
        let line_text = source_code
            .lines()
            .nth(token.line.saturating_sub(1) as usize)
            .unwrap_or("")
            .to_string();

        Self {
            message: message.to_string(),
            line: token.line,
            column: token.column,
            line_text,
            marker_width: usize::max(1, token.value.len()),
        }
    }
}

impl std::error::Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} (line {}, column {})",
            self.message, self.line, self.column
        )?;

        let lineno = format!("{:3}", self.line);
        let margin = " ".repeat(lineno.len());
        writeln!(f, "{} |", margin)?;
        writeln!(f, "{} | {}", lineno, self.line_text.trim_end())?;

        let indent = " ".repeat(self.column.saturating_sub(1) as usize);
        let marker: String = std::iter::repeat(Self::MARKER).take(self.marker_width).collect();
        writeln!(f, "{} | {}{}", margin, indent, marker)?;

        Ok(())
    }
}

/// Error from the scoped symbol environment.
#[derive(Debug, Clone)]
pub enum SymbolError {
    /// The name already exists in the innermost table.
    DuplicateName { name: SmolStr, table: SmolStr },
    /// No declaration found in any open table.
    Undeclared { name: SmolStr },
    /// An operation required an open table, but none was.
    EmptyScope,
    /// An operation required an enclosing table, but the stack held
    /// fewer than two.
    NoParentScope,
}

impl std::error::Error for SymbolError {}

impl Display for SymbolError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::DuplicateName { name, table } => write!(
                f,
                "a variable named \"{}\" is already declared in {}",
                name, table
            ),
            Self::Undeclared { name } => {
                write!(f, "a variable named \"{}\" was not declared", name)
            }
            Self::EmptyScope => write!(f, "no symbol table is open"),
            Self::NoParentScope => write!(f, "no enclosing symbol table"),
        }
    }
}

/// Error raised while lowering the parse tree to VM instructions.
#[derive(Debug, Clone)]
pub enum CodeGenError {
    UnknownBinaryOp(SmolStr),
    UnknownUnaryOp(SmolStr),
}

impl std::error::Error for CodeGenError {}

impl Display for CodeGenError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownBinaryOp(op) => write!(f, "undefined binary operator '{}'", op),
            Self::UnknownUnaryOp(op) => write!(f, "undefined unary operator '{}'", op),
        }
    }
}
