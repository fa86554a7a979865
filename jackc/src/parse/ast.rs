//! Parse tree nodes.
//!
//! Every node owns its children outright; the tree is acyclic by
//! construction. Each node knows how to render itself into the
//! golden parse-tree XML via [`XmlBuilder`].
use crate::lex::Token;
use crate::xml::XmlBuilder;

/// Top-level production. One class per source file.
#[derive(Debug)]
pub struct Class {
    pub name: Token,
    pub var_decs: Vec<ClassVarDec>,
    pub subroutines: Vec<SubroutineDec>,
}

impl Class {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("class");
        xb.write_keyword("class");
        xb.write_token(&self.name);
        xb.write_symbol("{");
        for var_dec in &self.var_decs {
            var_dec.xml(xb);
        }
        for subroutine in &self.subroutines {
            subroutine.xml(xb);
        }
        xb.write_symbol("}");
        xb.close();
    }
}

/// `static` or `field` declaration at class level.
#[derive(Debug)]
pub struct ClassVarDec {
    /// The `static` or `field` keyword token.
    pub kind: Token,
    pub var_type: Token,
    pub names: Vec<Token>,
}

impl ClassVarDec {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("classVarDec");
        xb.write_token(&self.kind);
        xb.write_token(&self.var_type);
        for (index, name) in self.names.iter().enumerate() {
            if index > 0 {
                xb.write_symbol(",");
            }
            xb.write_token(name);
        }
        xb.write_symbol(";");
        xb.close();
    }
}

/// Constructor, function or method declaration.
#[derive(Debug)]
pub struct SubroutineDec {
    /// The `constructor`, `function` or `method` keyword token.
    pub kind: Token,
    pub return_type: Token,
    pub name: Token,
    pub params: ParameterList,
    pub body: SubroutineBody,
}

impl SubroutineDec {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("subroutineDec");
        xb.write_token(&self.kind);
        xb.write_token(&self.return_type);
        xb.write_token(&self.name);
        xb.write_symbol("(");
        self.params.xml(xb);
        xb.write_symbol(")");
        self.body.xml(xb);
        xb.close();
    }
}

/// Parameter declarations in calling-convention order.
#[derive(Debug, Default)]
pub struct ParameterList {
    pub var_types: Vec<Token>,
    pub var_names: Vec<Token>,
}

impl ParameterList {
    pub fn add(&mut self, var_type: Token, var_name: Token) {
        self.var_types.push(var_type);
        self.var_names.push(var_name);
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.var_types.len(), self.var_names.len());
        self.var_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.var_names.is_empty()
    }

    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("parameterList");
        for index in 0..self.len() {
            if index > 0 {
                xb.write_symbol(",");
            }
            xb.write_token(&self.var_types[index]);
            xb.write_token(&self.var_names[index]);
        }
        xb.close();
    }
}

#[derive(Debug)]
pub struct SubroutineBody {
    pub var_decs: Vec<VarDec>,
    pub statements: Statements,
}

impl SubroutineBody {
    /// Total number of local slots declared in the body.
    pub fn local_var_len(&self) -> usize {
        self.var_decs.iter().map(|var_dec| var_dec.names.len()).sum()
    }

    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("subroutineBody");
        xb.write_symbol("{");
        for var_dec in &self.var_decs {
            var_dec.xml(xb);
        }
        self.statements.xml(xb);
        xb.write_symbol("}");
        xb.close();
    }
}

/// `var` declaration inside a subroutine body.
#[derive(Debug)]
pub struct VarDec {
    pub var_type: Token,
    pub names: Vec<Token>,
}

impl VarDec {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("varDec");
        xb.write_keyword("var");
        xb.write_token(&self.var_type);
        for (index, name) in self.names.iter().enumerate() {
            if index > 0 {
                xb.write_symbol(",");
            }
            xb.write_token(name);
        }
        xb.write_symbol(";");
        xb.close();
    }
}

#[derive(Debug, Default)]
pub struct Statements {
    pub list: Vec<Statement>,
}

impl Statements {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("statements");
        for statement in &self.list {
            statement.xml(xb);
        }
        xb.close();
    }
}

#[derive(Debug)]
pub enum Statement {
    Let(LetStatement),
    If(IfStatement),
    While(WhileStatement),
    Do(DoStatement),
    Return(ReturnStatement),
}

impl Statement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        match self {
            Statement::Let(stmt) => stmt.xml(xb),
            Statement::If(stmt) => stmt.xml(xb),
            Statement::While(stmt) => stmt.xml(xb),
            Statement::Do(stmt) => stmt.xml(xb),
            Statement::Return(stmt) => stmt.xml(xb),
        }
    }
}

/// `let name = expr;` or `let name[index] = expr;`
#[derive(Debug)]
pub struct LetStatement {
    pub var_name: Token,
    pub index: Option<Expression>,
    pub value: Expression,
}

impl LetStatement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("letStatement");
        xb.write_keyword("let");
        xb.write_token(&self.var_name);
        if let Some(index) = &self.index {
            xb.write_symbol("[");
            index.xml(xb);
            xb.write_symbol("]");
        }
        xb.write_symbol("=");
        self.value.xml(xb);
        xb.write_symbol(";");
        xb.close();
    }
}

#[derive(Debug)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Statements,
    pub else_branch: Option<Statements>,
}

impl IfStatement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("ifStatement");
        xb.write_keyword("if");
        xb.write_symbol("(");
        self.condition.xml(xb);
        xb.write_symbol(")");
        xb.write_symbol("{");
        self.then_branch.xml(xb);
        xb.write_symbol("}");
        if let Some(else_branch) = &self.else_branch {
            xb.write_keyword("else");
            xb.write_symbol("{");
            else_branch.xml(xb);
            xb.write_symbol("}");
        }
        xb.close();
    }
}

#[derive(Debug)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Statements,
}

impl WhileStatement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("whileStatement");
        xb.write_keyword("while");
        xb.write_symbol("(");
        self.condition.xml(xb);
        xb.write_symbol(")");
        xb.write_symbol("{");
        self.body.xml(xb);
        xb.write_symbol("}");
        xb.close();
    }
}

#[derive(Debug)]
pub struct DoStatement {
    pub call: SubroutineCall,
}

impl DoStatement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("doStatement");
        xb.write_keyword("do");
        self.call.xml(xb);
        xb.write_symbol(";");
        xb.close();
    }
}

#[derive(Debug)]
pub struct ReturnStatement {
    pub expr: Option<Expression>,
}

impl ReturnStatement {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("returnStatement");
        xb.write_keyword("return");
        if let Some(expr) = &self.expr {
            expr.xml(xb);
        }
        xb.write_symbol(";");
        xb.close();
    }
}

/// A term followed by zero or more `(op, term)` pairs.
///
/// Storing the pairs together keeps the operator and right-hand term
/// counts equal by construction. Evaluation is strictly left to
/// right; the grammar has no operator precedence.
#[derive(Debug)]
pub struct Expression {
    pub term: Term,
    pub rest: Vec<(Token, Term)>,
}

impl Expression {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("expression");
        self.term.xml(xb);
        for (op, term) in &self.rest {
            xb.write_token(op);
            term.xml(xb);
        }
        xb.close();
    }
}

#[derive(Debug, Default)]
pub struct ExpressionList {
    pub exprs: Vec<Expression>,
}

impl ExpressionList {
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("expressionList");
        for (index, expr) in self.exprs.iter().enumerate() {
            if index > 0 {
                xb.write_symbol(",");
            }
            expr.xml(xb);
        }
        xb.close();
    }
}

/// `name(args)`, `Class.name(args)` or `receiver.name(args)`.
#[derive(Debug)]
pub struct SubroutineCall {
    /// Leading class name or receiver variable, when present.
    pub prefix: Option<Token>,
    pub name: Token,
    pub args: ExpressionList,
}

impl SubroutineCall {
    // A call has no wrapper tag of its own; its children are inlined
    // into the enclosing term or doStatement.
    pub fn xml(&self, xb: &mut XmlBuilder) {
        if let Some(prefix) = &self.prefix {
            xb.write_token(prefix);
            xb.write_symbol(".");
        }
        xb.write_token(&self.name);
        xb.write_symbol("(");
        self.args.xml(xb);
        xb.write_symbol(")");
    }
}

#[derive(Debug)]
pub enum Term {
    /// Integer literal.
    IntConst(Token),
    /// String literal, quotes excluded.
    StrConst(Token),
    /// `true`, `false` or `null`.
    KeywordConst(Token),
    /// `this` is its own term; it lowers differently from the other
    /// keyword constants.
    This(Token),
    /// Plain variable reference.
    Var(Token),
    /// `name[index]`
    Array(Token, Box<Expression>),
    /// `( expression )`
    Paren(Box<Expression>),
    Call(Box<SubroutineCall>),
    /// `-term` or `~term`
    Unary(Token, Box<Term>),
}

impl Term {
    pub fn xml(&self, xb: &mut XmlBuilder) {
        xb.open("term");
        match self {
            Term::IntConst(token)
            | Term::StrConst(token)
            | Term::KeywordConst(token)
            | Term::This(token)
            | Term::Var(token) => {
                xb.write_token(token);
            }
            Term::Array(name, index) => {
                xb.write_token(name);
                xb.write_symbol("[");
                index.xml(xb);
                xb.write_symbol("]");
            }
            Term::Paren(expr) => {
                xb.write_symbol("(");
                expr.xml(xb);
                xb.write_symbol(")");
            }
            Term::Call(call) => call.xml(xb),
            Term::Unary(op, term) => {
                xb.write_token(op);
                term.xml(xb);
            }
        }
        xb.close();
    }
}
