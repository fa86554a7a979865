//! Syntactic analysis: recursive descent over the token stream.
pub mod ast;

use self::ast::*;
use crate::{
    error::{JackError, JackResult, ParseError},
    lex::{Keyword, Lexer, Token, TokenKind, TokenStream},
};

/// Recursive-descent parser with two tokens of look ahead.
///
/// One method per grammar production. The first unexpected token
/// aborts the parse; no recovery is attempted.
pub struct Parser<'a> {
    stream: TokenStream<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            stream: TokenStream::new(lexer),
        }
    }

    /// Parse a complete source file: one class, then end of file.
    pub fn parse(mut self) -> JackResult<Class> {
        let class = self.parse_class()?;
        self.stream.consume(TokenKind::Eof)?;
        Ok(class)
    }

    #[inline(never)]
    #[cold]
    fn error(&self, token: &Token, message: impl ToString) -> JackError {
        ParseError::new(self.stream.source_code(), token, message).into()
    }

    /// Build an error anchored at the next unconsumed token.
    fn error_at_peek(&mut self, message: &str) -> JackError {
        match self.stream.peek() {
            Ok(token) => {
                let token = token.clone();
                self.error(&token, message)
            }
            Err(err) => err,
        }
    }

    #[inline]
    fn peek_kind(&mut self) -> JackResult<TokenKind> {
        Ok(self.stream.peek()?.kind)
    }

    #[inline]
    fn peek_second_kind(&mut self) -> JackResult<TokenKind> {
        Ok(self.stream.peek_second()?.kind)
    }
}

/// Grammar productions.
impl<'a> Parser<'a> {
    /// `'class' IDENT '{' classVarDec* subroutineDec* '}'`
    fn parse_class(&mut self) -> JackResult<Class> {
        use Keyword as K;
        use TokenKind as TK;

        self.stream.consume(TK::Keyword(K::Class))?;
        let name = self.stream.consume(TK::Ident)?;
        self.stream.consume(TK::LeftBrace)?;

        let mut var_decs = Vec::new();
        while matches!(self.peek_kind()?, TK::Keyword(K::Static | K::Field)) {
            var_decs.push(self.parse_class_var_dec()?);
        }

        let mut subroutines = Vec::new();
        while matches!(
            self.peek_kind()?,
            TK::Keyword(K::Constructor | K::Function | K::Method)
        ) {
            subroutines.push(self.parse_subroutine_dec()?);
        }

        self.stream.consume(TK::RightBrace)?;

        Ok(Class {
            name,
            var_decs,
            subroutines,
        })
    }

    /// `('static'|'field') type varName (',' varName)* ';'`
    fn parse_class_var_dec(&mut self) -> JackResult<ClassVarDec> {
        let kind = self.stream.next_token()?;
        let var_type = self.parse_type()?;
        let names = self.parse_name_list()?;

        Ok(ClassVarDec {
            kind,
            var_type,
            names,
        })
    }

    /// `IDENT (',' IDENT)* ';'`
    fn parse_name_list(&mut self) -> JackResult<Vec<Token>> {
        let mut names = vec![self.stream.consume(TokenKind::Ident)?];
        while self.stream.match_token(TokenKind::Comma) {
            names.push(self.stream.consume(TokenKind::Ident)?);
        }
        self.stream.consume(TokenKind::Semicolon)?;
        Ok(names)
    }

    /// `'int'|'char'|'boolean'|IDENT`
    ///
    /// The identifier `bool` is rejected; the boolean type keyword is
    /// `boolean` and nothing else.
    fn parse_type(&mut self) -> JackResult<Token> {
        use Keyword as K;
        use TokenKind as TK;

        let token = self.stream.peek()?.clone();
        match token.kind {
            TK::Keyword(K::Int | K::Char | K::Boolean) => self.stream.next_token(),
            TK::Ident if token.value == "bool" => Err(self.error(
                &token,
                "unknown type 'bool'; the boolean type is spelled 'boolean'",
            )),
            TK::Ident => self.stream.next_token(),
            _ => Err(self.error(&token, "expected a type")),
        }
    }

    /// `('constructor'|'function'|'method') ('void'|type) IDENT
    ///  '(' parameterList ')' subroutineBody`
    fn parse_subroutine_dec(&mut self) -> JackResult<SubroutineDec> {
        use Keyword as K;
        use TokenKind as TK;

        let kind = self.stream.next_token()?;

        let return_type = if self.peek_kind()? == TK::Keyword(K::Void) {
            self.stream.next_token()?
        } else {
            self.parse_type()?
        };

        let name = self.stream.consume(TK::Ident)?;
        self.stream.consume(TK::LeftParen)?;
        let params = self.parse_parameter_list()?;
        self.stream.consume(TK::RightParen)?;
        let body = self.parse_subroutine_body()?;

        Ok(SubroutineDec {
            kind,
            return_type,
            name,
            params,
            body,
        })
    }

    /// `( type IDENT (',' type IDENT)* )?`
    fn parse_parameter_list(&mut self) -> JackResult<ParameterList> {
        let mut params = ParameterList::default();

        if self.peek_kind()? == TokenKind::RightParen {
            return Ok(params);
        }

        loop {
            let var_type = self.parse_type()?;
            let var_name = self.stream.consume(TokenKind::Ident)?;
            params.add(var_type, var_name);

            if !self.stream.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// `'{' varDec* statements '}'`
    fn parse_subroutine_body(&mut self) -> JackResult<SubroutineBody> {
        use Keyword as K;
        use TokenKind as TK;

        self.stream.consume(TK::LeftBrace)?;

        let mut var_decs = Vec::new();
        while self.peek_kind()? == TK::Keyword(K::Var) {
            var_decs.push(self.parse_var_dec()?);
        }

        let statements = self.parse_statements()?;
        self.stream.consume(TK::RightBrace)?;

        Ok(SubroutineBody {
            var_decs,
            statements,
        })
    }

    /// `'var' type varName (',' varName)* ';'`
    fn parse_var_dec(&mut self) -> JackResult<VarDec> {
        self.stream.consume(TokenKind::Keyword(Keyword::Var))?;
        let var_type = self.parse_type()?;
        let names = self.parse_name_list()?;

        Ok(VarDec { var_type, names })
    }

    /// Zero or more statements, up to the closing brace.
    fn parse_statements(&mut self) -> JackResult<Statements> {
        use Keyword as K;
        use TokenKind as TK;

        let mut statements = Statements::default();

        loop {
            let statement = match self.peek_kind()? {
                TK::Keyword(K::Let) => Statement::Let(self.parse_let_statement()?),
                TK::Keyword(K::If) => Statement::If(self.parse_if_statement()?),
                TK::Keyword(K::While) => Statement::While(self.parse_while_statement()?),
                TK::Keyword(K::Do) => Statement::Do(self.parse_do_statement()?),
                TK::Keyword(K::Return) => Statement::Return(self.parse_return_statement()?),
                TK::RightBrace => break,
                _ => return Err(self.error_at_peek("expected a statement")),
            };
            statements.list.push(statement);
        }

        Ok(statements)
    }

    /// `'let' IDENT ('[' expression ']')? '=' expression ';'`
    fn parse_let_statement(&mut self) -> JackResult<LetStatement> {
        use TokenKind as TK;

        self.stream.consume(TK::Keyword(Keyword::Let))?;
        let var_name = self.stream.consume(TK::Ident)?;

        let index = if self.stream.match_token(TK::LeftBracket) {
            let expr = self.parse_expression()?;
            self.stream.consume(TK::RightBracket)?;
            Some(expr)
        } else {
            None
        };

        self.stream.consume(TK::Eq)?;
        let value = self.parse_expression()?;
        self.stream.consume(TK::Semicolon)?;

        Ok(LetStatement {
            var_name,
            index,
            value,
        })
    }

    /// `'if' '(' expression ')' '{' statements '}'
    ///  ('else' '{' statements '}')?`
    fn parse_if_statement(&mut self) -> JackResult<IfStatement> {
        use Keyword as K;
        use TokenKind as TK;

        self.stream.consume(TK::Keyword(K::If))?;
        self.stream.consume(TK::LeftParen)?;
        let condition = self.parse_expression()?;
        self.stream.consume(TK::RightParen)?;
        self.stream.consume(TK::LeftBrace)?;
        let then_branch = self.parse_statements()?;
        self.stream.consume(TK::RightBrace)?;

        let else_branch = if self.stream.match_token(TK::Keyword(K::Else)) {
            self.stream.consume(TK::LeftBrace)?;
            let statements = self.parse_statements()?;
            self.stream.consume(TK::RightBrace)?;
            Some(statements)
        } else {
            None
        };

        Ok(IfStatement {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn parse_while_statement(&mut self) -> JackResult<WhileStatement> {
        use TokenKind as TK;

        self.stream.consume(TK::Keyword(Keyword::While))?;
        self.stream.consume(TK::LeftParen)?;
        let condition = self.parse_expression()?;
        self.stream.consume(TK::RightParen)?;
        self.stream.consume(TK::LeftBrace)?;
        let body = self.parse_statements()?;
        self.stream.consume(TK::RightBrace)?;

        Ok(WhileStatement { condition, body })
    }

    /// `'do' subroutineCall ';'`
    fn parse_do_statement(&mut self) -> JackResult<DoStatement> {
        self.stream.consume(TokenKind::Keyword(Keyword::Do))?;
        let call = self.parse_subroutine_call()?;
        self.stream.consume(TokenKind::Semicolon)?;

        Ok(DoStatement { call })
    }

    /// `'return' expression? ';'`
    fn parse_return_statement(&mut self) -> JackResult<ReturnStatement> {
        self.stream.consume(TokenKind::Keyword(Keyword::Return))?;

        let expr = if self.peek_kind()? == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.stream.consume(TokenKind::Semicolon)?;

        Ok(ReturnStatement { expr })
    }

    /// `term (op term)*`
    ///
    /// The chain is flat and strictly left-associative; there is no
    /// operator precedence in this language.
    fn parse_expression(&mut self) -> JackResult<Expression> {
        let term = self.parse_term()?;

        let mut rest = Vec::new();
        while is_binary_op(self.peek_kind()?) {
            let op = self.stream.next_token()?;
            let term = self.parse_term()?;
            rest.push((op, term));
        }

        Ok(Expression { term, rest })
    }

    /// On an identifier the second look-ahead token decides the term:
    /// `[` for an array access, `(` or `.` for a call, anything else
    /// for a plain variable reference.
    fn parse_term(&mut self) -> JackResult<Term> {
        use Keyword as K;
        use TokenKind as TK;

        match self.peek_kind()? {
            TK::IntConst => Ok(Term::IntConst(self.stream.next_token()?)),
            TK::StrConst => Ok(Term::StrConst(self.stream.next_token()?)),
            TK::Keyword(K::True | K::False | K::Null) => {
                Ok(Term::KeywordConst(self.stream.next_token()?))
            }
            TK::Keyword(K::This) => Ok(Term::This(self.stream.next_token()?)),
            TK::Minus | TK::Tilde => {
                let op = self.stream.next_token()?;
                let term = self.parse_term()?;
                Ok(Term::Unary(op, Box::new(term)))
            }
            TK::LeftParen => {
                self.stream.next_token()?;
                let expr = self.parse_expression()?;
                self.stream.consume(TK::RightParen)?;
                Ok(Term::Paren(Box::new(expr)))
            }
            TK::Ident => match self.peek_second_kind()? {
                TK::LeftBracket => {
                    let name = self.stream.next_token()?;
                    self.stream.consume(TK::LeftBracket)?;
                    let index = self.parse_expression()?;
                    self.stream.consume(TK::RightBracket)?;
                    Ok(Term::Array(name, Box::new(index)))
                }
                TK::LeftParen | TK::Dot => {
                    Ok(Term::Call(Box::new(self.parse_subroutine_call()?)))
                }
                _ => Ok(Term::Var(self.stream.next_token()?)),
            },
            _ => Err(self.error_at_peek("expected a term")),
        }
    }

    /// `IDENT ('.' IDENT)? '(' expressionList ')'`
    fn parse_subroutine_call(&mut self) -> JackResult<SubroutineCall> {
        use TokenKind as TK;

        let first = self.stream.consume(TK::Ident)?;

        let (prefix, name) = if self.stream.match_token(TK::Dot) {
            (Some(first), self.stream.consume(TK::Ident)?)
        } else {
            (None, first)
        };

        self.stream.consume(TK::LeftParen)?;
        let args = self.parse_expression_list()?;
        self.stream.consume(TK::RightParen)?;

        Ok(SubroutineCall { prefix, name, args })
    }

    /// `( expression (',' expression)* )?`
    fn parse_expression_list(&mut self) -> JackResult<ExpressionList> {
        let mut list = ExpressionList::default();

        if self.peek_kind()? == TokenKind::RightParen {
            return Ok(list);
        }

        list.exprs.push(self.parse_expression()?);
        while self.stream.match_token(TokenKind::Comma) {
            list.exprs.push(self.parse_expression()?);
        }

        Ok(list)
    }
}

/// Binary operator set: `+ - * / & | < > =`.
fn is_binary_op(kind: TokenKind) -> bool {
    use TokenKind as TK;
    matches!(
        kind,
        TK::Plus
            | TK::Minus
            | TK::Star
            | TK::Slash
            | TK::Amp
            | TK::Pipe
            | TK::Less
            | TK::Greater
            | TK::Eq
    )
}
