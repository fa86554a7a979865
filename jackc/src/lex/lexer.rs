//! Lexical analysis
use smol_str::SmolStr;

use super::{
    cursor::{Cursor, EOF_BYTE},
    tokens::{Keyword, Token, TokenKind},
};
use crate::error::{LexError, LexErrorKind};

pub struct Lexer<'a> {
    /// Byte scanner
    cursor: Cursor<'a>,
    /// Keep a reference to the source so the parser can render
    /// diagnostics with the offending line.
    original: &'a str,
    /// Reusable scratch buffer for multi-byte tokens.
    buf: Vec<u8>,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source_code),
            original: source_code,
            buf: Vec::new(),
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Scan the source bytes and construct the next token.
    ///
    /// ## Implementation
    ///
    /// Each iteration starts by erasing whitespace and comments, in
    /// alternation, until the cursor rests on a byte that can start a
    /// token. The first byte then decides the token family: symbol,
    /// string constant, keyword-or-identifier word, or integer word.
    ///
    /// Once the source is exhausted an [`TokenKind::Eof`] token is
    /// returned; its position is one column past the last byte.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let byte = match self.cursor.next_byte() {
            Some(byte) => byte,
            None => return Ok(self.make_eof_token()),
        };

        // The cursor now sits on the token's first byte.
        let line = self.cursor.line();
        let column = self.cursor.column();

        if let Some(kind) = TokenKind::from_symbol(byte) {
            let value = SmolStr::from(String::from(byte as char));
            return Ok(Token {
                kind,
                value,
                line,
                column,
            });
        }

        match byte {
            b'"' => self.read_string(line, column),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                let word = self.read_word(byte);
                let kind = match Keyword::parse(&word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Ident,
                };
                Ok(Token {
                    kind,
                    value: word,
                    line,
                    column,
                })
            }
            b'0'..=b'9' => {
                let word = self.read_word(byte);
                Ok(Token {
                    kind: TokenKind::IntConst,
                    value: word,
                    line,
                    column,
                })
            }
            _ => Err(LexError {
                kind: LexErrorKind::UnexpectedByte(byte),
                line,
                column,
            }),
        }
    }

    /// Erase whitespace and comments, alternating until the next byte
    /// is neither.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.cursor.peek_byte() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.cursor.next_byte();
                }
                b'/' => match self.cursor.peek_byte2() {
                    b'/' => self.skip_line_comment(),
                    b'*' => self.skip_block_comment()?,
                    // A lone slash is the division symbol.
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    /// Erase a `//` comment up to and including the trailing newline.
    fn skip_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.peek_byte(), b'/');

        while let Some(byte) = self.cursor.next_byte() {
            if byte == b'\n' {
                break;
            }
        }
    }

    /// Erase a `/* ... */` comment. Nested blocks are not supported.
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        debug_assert_eq!(self.cursor.peek_byte(), b'/');
        debug_assert_eq!(self.cursor.peek_byte2(), b'*');

        self.cursor.next_byte();
        self.cursor.next_byte();

        loop {
            match self.cursor.next_byte() {
                Some(b'*') if self.cursor.peek_byte() == b'/' => {
                    self.cursor.next_byte();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.eof_error()),
            }
        }
    }

    /// Read a string constant. The opening quote has been consumed;
    /// the closing quote is consumed but excluded from the value.
    /// Embedded newlines are allowed and tracked by the cursor.
    fn read_string(&mut self, line: u32, column: u32) -> Result<Token, LexError> {
        self.buf.clear();

        loop {
            match self.cursor.next_byte() {
                Some(b'"') => break,
                Some(byte) => self.buf.push(byte),
                None => return Err(self.eof_error()),
            }
        }

        Ok(Token {
            kind: TokenKind::StrConst,
            value: self.take_buf(),
            line,
            column,
        })
    }

    /// Accumulate a word starting with the given byte. Words stop at
    /// whitespace, newline, a symbol byte, or end of source.
    fn read_word(&mut self, first: u8) -> SmolStr {
        self.buf.clear();
        self.buf.push(first);

        loop {
            match self.cursor.peek_byte() {
                EOF_BYTE if self.cursor.at_end() => break,
                b' ' | b'\t' | b'\r' | b'\n' => break,
                byte if TokenKind::is_symbol_byte(byte) => break,
                _ => {
                    if let Some(byte) = self.cursor.next_byte() {
                        self.buf.push(byte);
                    }
                }
            }
        }

        self.take_buf()
    }

    fn take_buf(&mut self) -> SmolStr {
        SmolStr::from(String::from_utf8_lossy(&self.buf))
    }

    fn make_eof_token(&self) -> Token {
        Token {
            kind: TokenKind::Eof,
            value: SmolStr::default(),
            line: self.cursor.line(),
            column: self.cursor.column() + 1,
        }
    }

    fn eof_error(&self) -> LexError {
        LexError {
            kind: LexErrorKind::UnexpectedEof,
            line: self.cursor.line(),
            column: self.cursor.column() + 1,
        }
    }
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Emits the final [`TokenKind::Eof`] token once, then fuses. An
/// error also fuses the iterator, matching the first-error-aborts
/// policy of the surrounding pipeline.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    lexer: Lexer<'a>,
    done: bool,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.lexer.next_token() {
            Ok(token) => {
                if token.kind == TokenKind::Eof {
                    self.done = true;
                }
                Some(Ok(token))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.expect("lexical error"))
            .filter(|token| token.kind != TokenKind::Eof)
            .collect()
    }

    fn kinds_and_values(source: &str) -> Vec<(TokenKind, String)> {
        lex(source)
            .into_iter()
            .map(|token| (token.kind, token.value.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        use TokenKind as TK;

        let cases: &[(&str, TokenKind, &str)] = &[
            ("class", TK::Keyword(Keyword::Class), "class"),
            ("a", TK::Ident, "a"),
            ("id", TK::Ident, "id"),
            ("+", TK::Plus, "+"),
            ("0", TK::IntConst, "0"),
            ("100", TK::IntConst, "100"),
            ("\"string\"", TK::StrConst, "string"),
        ];

        for (source, kind, value) in cases {
            let tokens = lex(source);
            assert_eq!(tokens.len(), 1, "{source}");
            assert_eq!(tokens[0].kind, *kind, "{source}");
            assert_eq!(tokens[0].value, *value, "{source}");
        }
    }

    #[test]
    fn test_multi_tokens() {
        use TokenKind as TK;

        let got = kinds_and_values("class MyClass();");
        let want = vec![
            (TK::Keyword(Keyword::Class), "class".to_string()),
            (TK::Ident, "MyClass".to_string()),
            (TK::LeftParen, "(".to_string()),
            (TK::RightParen, ")".to_string()),
            (TK::Semicolon, ";".to_string()),
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn test_whitespace_skipping() {
        let cases = [
            "\n\n\nclass\n\n\n;\n\n\n",
            "   class;  ",
            "\t\tclass;\t\t",
            "\t   class   ; \t ",
        ];

        for source in cases {
            let got = kinds_and_values(source);
            assert_eq!(
                got,
                vec![
                    (TokenKind::Keyword(Keyword::Class), "class".to_string()),
                    (TokenKind::Semicolon, ";".to_string()),
                ],
                "{source:?}"
            );
        }
    }

    #[test]
    fn test_comment_skipping() {
        let cases = [
            "// Comment1\n // Comment2\n class //Comment3\n",
            "// class\n class // class",
            "/* One Line */\n/** *** */\n/*one\ntwo*/\nclass",
            "// Inline comment\n /* Multi line\ncomment */ \n class // Inline",
        ];

        for source in cases {
            let got = kinds_and_values(source);
            assert_eq!(
                got,
                vec![(TokenKind::Keyword(Keyword::Class), "class".to_string())],
                "{source:?}"
            );
        }
    }

    #[test]
    fn test_positions_are_one_based() {
        let source = "class Main {\n  function void main() {\n  }\n}\n";
        for token in lex(source) {
            assert!(token.line >= 1, "{token:?}");
            assert!(token.column >= 1, "{token:?}");
        }
    }

    #[test]
    fn test_token_positions() {
        let tokens = lex("let x;\nlet y;");

        // `let` on line 1 starts at column 1, `x` at column 5.
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        // Second statement sits on line 2 again at column 1.
        assert_eq!((tokens[3].line, tokens[3].column), (2, 1));
    }

    #[test]
    fn test_string_with_newline_tracks_lines() {
        let tokens = lex("\"a\nb\" x");

        assert_eq!(tokens[0].kind, TokenKind::StrConst);
        assert_eq!(tokens[0].value, "a\nb");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        // The identifier after the literal is on line 2.
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("/* abc\ndef");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnexpectedEof));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unexpected_byte() {
        let mut lexer = Lexer::new("  ?");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnexpectedByte(b'?')));
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn test_leading_zero_integer() {
        let tokens = lex("007");
        assert_eq!(tokens[0].kind, TokenKind::IntConst);
        assert_eq!(tokens[0].value, "007");
    }

    #[test]
    fn test_slash_is_division_not_comment() {
        use TokenKind as TK;

        let got = kinds_and_values("a / b");
        assert_eq!(
            got,
            vec![
                (TK::Ident, "a".to_string()),
                (TK::Slash, "/".to_string()),
                (TK::Ident, "b".to_string()),
            ]
        );
    }
}
