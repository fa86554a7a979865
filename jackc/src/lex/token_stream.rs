//! Buffered stream of tokens for look ahead.
use itertools::{multipeek, MultiPeek};

use super::{
    lexer::{Lexer, LexerIter},
    tokens::{Token, TokenKind},
};
use crate::error::{JackError, JackResult, TokenError};

/// Buffered stream of tokens with two tokens of look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer.
///
/// The peek semantics are determined by the internal `MultiPeek`,
/// whose cursor advances by one token per `peek()` call. All methods
/// here reset the cursor on entry, so [`TokenStream::peek`] and
/// [`TokenStream::peek_second`] are idempotent and always relative
/// to the next unconsumed token.
pub struct TokenStream<'a> {
    lexer: MultiPeek<LexerIter<'a>>,
    /// Keep a reference to the source so the parser can render
    /// diagnostics with the offending line.
    original: &'a str,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: multipeek(lexer),
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Consumes the current token regardless of type.
    pub fn next_token(&mut self) -> JackResult<Token> {
        match self.lexer.next() {
            Some(result) => result.map_err(JackError::Lex),
            None => Err(TokenError::EndOfSource.into()),
        }
    }

    /// Return the current token without advancing the cursor.
    pub fn peek(&mut self) -> JackResult<&Token> {
        self.lexer.reset_peek();
        match self.lexer.peek() {
            Some(result) => result.as_ref().map_err(|err| JackError::Lex(err.clone())),
            None => Err(TokenError::EndOfSource.into()),
        }
    }

    /// Return the token after the current one without advancing the
    /// cursor. This is the second and last slot of the look-ahead
    /// ring; the grammar never needs more.
    pub fn peek_second(&mut self) -> JackResult<&Token> {
        self.lexer.reset_peek();

        if let Some(Err(err)) = self.lexer.peek() {
            return Err(JackError::Lex(err.clone()));
        }

        match self.lexer.peek() {
            Some(result) => result.as_ref().map_err(|err| JackError::Lex(err.clone())),
            None => Err(TokenError::EndOfSource.into()),
        }
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Returns false when token kinds do
    /// not match, or the token stream is at the end.
    ///
    /// Does not consume the token if the kinds do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        self.lexer.reset_peek();

        match self.lexer.peek() {
            Some(Ok(token)) if token.kind == token_kind => {
                self.lexer.next();
                true
            }
            _ => {
                self.lexer.reset_peek();
                false
            }
        }
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise
    /// a token error is returned and the cursor is not advanced.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        self.lexer.reset_peek();

        match self.lexer.peek() {
            Some(Ok(token)) => {
                if token.kind != token_kind {
                    return Err(TokenError::Mismatch {
                        expected: token_kind,
                        encountered: token.kind,
                        line: token.line,
                        column: token.column,
                    }
                    .into());
                }
            }
            Some(Err(err)) => return Err(JackError::Lex(err.clone())),
            None => return Err(TokenError::EndOfSource.into()),
        }

        self.next_token()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_two_token_lookahead() {
        let lexer = Lexer::new("a [ 1 ]");
        let mut stream = TokenStream::new(lexer);

        // Peeking is idempotent and does not consume.
        assert_eq!(stream.peek().unwrap().kind, TokenKind::Ident);
        assert_eq!(stream.peek().unwrap().kind, TokenKind::Ident);
        assert_eq!(stream.peek_second().unwrap().kind, TokenKind::LeftBracket);
        assert_eq!(stream.peek().unwrap().kind, TokenKind::Ident);

        assert_eq!(stream.next_token().unwrap().kind, TokenKind::Ident);
        assert_eq!(stream.peek_second().unwrap().kind, TokenKind::IntConst);
    }

    #[test]
    fn test_consume_mismatch_does_not_advance() {
        let lexer = Lexer::new("; ;");
        let mut stream = TokenStream::new(lexer);

        let err = stream.consume(TokenKind::Comma).unwrap_err();
        assert!(matches!(err, JackError::Token(TokenError::Mismatch { .. })));

        // The mismatched token is still there.
        assert_eq!(stream.consume(TokenKind::Semicolon).unwrap().value, ";");
    }

    #[test]
    fn test_match_token() {
        let lexer = Lexer::new(", x");
        let mut stream = TokenStream::new(lexer);

        assert!(!stream.match_token(TokenKind::Dot));
        assert!(stream.match_token(TokenKind::Comma));
        assert!(stream.match_token(TokenKind::Ident));
        assert!(stream.match_token(TokenKind::Eof));
    }

    #[test]
    fn test_peek_past_end() {
        let lexer = Lexer::new("");
        let mut stream = TokenStream::new(lexer);

        assert_eq!(stream.peek().unwrap().kind, TokenKind::Eof);
        assert!(matches!(
            stream.peek_second(),
            Err(JackError::Token(TokenError::EndOfSource))
        ));
    }
}
