//! Compiler for the Jack language targeting the textual instruction
//! set of the nand2tetris stack VM.
//!
//! The pipeline runs in four phases, each usable on its own:
//! lexing ([`lex`]), parsing ([`parse`]), the scoped symbol
//! environment ([`symbol`]) and code generation ([`codegen`]).
//! The [`xml`] module renders the golden-output artifacts used for
//! testing the front end.
pub mod codegen;
mod error;
pub mod lex;
pub mod parse;
pub mod symbol;
pub mod xml;

pub use self::error::{
    CodeGenError, JackError, JackResult, LexError, LexErrorKind, ParseError, SymbolError,
    TokenError,
};

use self::{
    codegen::CodeGen,
    lex::{Lexer, Token, TokenKind},
    parse::{ast::Class, Parser},
    xml::XmlBuilder,
};

/// Version of *this* implementation.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scan a whole source file into tokens. The end-of-file marker is
/// not included.
pub fn tokenize(source: &str) -> JackResult<Vec<Token>> {
    let mut tokens = Vec::new();

    for result in Lexer::new(source) {
        let token = result.map_err(JackError::Lex)?;
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Parse a source file into its class tree.
pub fn parse_str(source: &str) -> JackResult<Class> {
    // Syntactic analysis drives the lexer on demand.
    Parser::new(Lexer::new(source)).parse()
}

/// Compile a source file into VM text.
pub fn compile_str(source: &str) -> JackResult<String> {
    let class = parse_str(source)?;

    // Code generation walks the tree against a fresh symbol
    // environment.
    CodeGen::new().compile(&class)
}

/// Render the flat token-stream XML artifact (`xT.out.xml`).
pub fn tokens_xml(tokens: &[Token]) -> String {
    let mut xb = XmlBuilder::flat();
    xb.open("tokens");
    for token in tokens {
        xb.write_token(token);
    }
    xb.close();
    xb.into_string()
}

/// Render the parse-tree XML artifact (`x.out.xml`).
pub fn tree_xml(class: &Class) -> String {
    let mut xb = XmlBuilder::new();
    class.xml(&mut xb);
    xb.into_string()
}
