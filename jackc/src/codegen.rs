//! VM code generation.
//!
//! A recursive walk over the parse tree appends textual VM
//! instructions to an owned buffer, one instruction per line.
//! Declarations mutate the symbol environment; statements and
//! expressions read it back to map names onto segment offsets.
use std::fmt::{self, Display, Formatter};

use log::trace;
use smol_str::SmolStr;

use crate::{
    error::{CodeGenError, JackResult},
    lex::{Keyword, Token, TokenKind},
    parse::ast::*,
    symbol::{SymbolTableList, VarKind},
};

/// Logical VM memory region addressed by `push` and `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    #[rustfmt::skip]
    fn as_str(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local    => "local",
            Segment::Argument => "argument",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
            Segment::Static   => "static",
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Segment a variable of the given kind lives in.
fn segment(kind: VarKind) -> Segment {
    match kind {
        VarKind::Field => Segment::This,
        VarKind::Static => Segment::Static,
        VarKind::Arg => Segment::Argument,
        VarKind::Local => Segment::Local,
    }
}

pub struct CodeGen {
    out: String,
    symbols: SymbolTableList,
    /// Label counters, reset at each subroutine.
    while_count: u32,
    if_count: u32,
}

impl CodeGen {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            symbols: SymbolTableList::new(),
            while_count: 0,
            if_count: 0,
        }
    }

    /// Compile a class into VM text, transferring ownership of the
    /// output buffer on success.
    pub fn compile(mut self, class: &Class) -> JackResult<String> {
        self.class(class)?;
        Ok(self.out)
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        CodeGen::new()
    }
}

/// Node walk.
impl CodeGen {
    fn class(&mut self, class: &Class) -> JackResult<()> {
        self.symbols.create_table(class.name.value.clone());

        // Class-level declarations only register symbols; they emit
        // no instructions of their own.
        for var_dec in &class.var_decs {
            self.class_var_dec(var_dec)?;
        }
        for subroutine in &class.subroutines {
            self.subroutine_dec(subroutine)?;
        }

        self.symbols.close_table();
        Ok(())
    }

    fn class_var_dec(&mut self, var_dec: &ClassVarDec) -> JackResult<()> {
        let kind = match var_dec.kind.kind {
            TokenKind::Keyword(Keyword::Field) => VarKind::Field,
            _ => VarKind::Static,
        };

        for name in &var_dec.names {
            self.symbols
                .add_var(kind, var_dec.var_type.value.clone(), name.value.clone())?;
        }
        Ok(())
    }

    fn subroutine_dec(&mut self, dec: &SubroutineDec) -> JackResult<()> {
        // The class table is still innermost here; capture what the
        // prologue needs before pushing the subroutine scope.
        let field_count = self.symbols.count(VarKind::Field)?;
        let class_name = SmolStr::from(self.symbols.name()?);
        let function_name = format!("{}.{}", class_name, dec.name.value);

        self.symbols.create_table(function_name.as_str());
        self.while_count = 0;
        self.if_count = 0;

        trace!("compiling {}", function_name);
        self.function(&function_name, dec.body.local_var_len());

        match dec.kind.kind {
            TokenKind::Keyword(Keyword::Constructor) => {
                // Allocate one word per field and aim `this` at it.
                self.push(Segment::Constant, field_count);
                self.call("Memory.alloc", 1);
                self.pop(Segment::Pointer, 0);
            }
            TokenKind::Keyword(Keyword::Method) => {
                // The receiver is a synthetic first argument.
                self.symbols
                    .add_var(VarKind::Arg, class_name.clone(), "this")?;
                self.push(Segment::Argument, 0);
                self.pop(Segment::Pointer, 0);
            }
            _ => {}
        }

        self.parameter_list(&dec.params)?;
        self.subroutine_body(&dec.body)?;

        self.symbols.close_table();
        Ok(())
    }

    fn parameter_list(&mut self, params: &ParameterList) -> JackResult<()> {
        for index in 0..params.len() {
            self.symbols.add_var(
                VarKind::Arg,
                params.var_types[index].value.clone(),
                params.var_names[index].value.clone(),
            )?;
        }
        Ok(())
    }

    fn subroutine_body(&mut self, body: &SubroutineBody) -> JackResult<()> {
        for var_dec in &body.var_decs {
            for name in &var_dec.names {
                self.symbols.add_var(
                    VarKind::Local,
                    var_dec.var_type.value.clone(),
                    name.value.clone(),
                )?;
            }
        }
        self.statements(&body.statements)
    }

    fn statements(&mut self, statements: &Statements) -> JackResult<()> {
        for statement in &statements.list {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> JackResult<()> {
        match statement {
            Statement::Let(stmt) => self.let_statement(stmt),
            Statement::If(stmt) => self.if_statement(stmt),
            Statement::While(stmt) => self.while_statement(stmt),
            Statement::Do(stmt) => self.do_statement(stmt),
            Statement::Return(stmt) => self.return_statement(stmt),
        }
    }

    fn let_statement(&mut self, stmt: &LetStatement) -> JackResult<()> {
        let info = self.symbols.var_info(&stmt.var_name.value)?.clone();
        let target = segment(info.kind);

        match &stmt.index {
            None => {
                self.expression(&stmt.value)?;
                self.pop(target, info.offset);
            }
            Some(index) => {
                // Compute the element address before evaluating the
                // value, then buffer the value through temp 0 so
                // aliasing inside the value expression cannot
                // clobber THAT.
                self.push(target, info.offset);
                self.expression(index)?;
                self.emit("add");

                self.expression(&stmt.value)?;
                self.pop(Segment::Temp, 0);

                self.pop(Segment::Pointer, 1);
                self.push(Segment::Temp, 0);
                self.pop(Segment::That, 0);
            }
        }
        Ok(())
    }

    fn if_statement(&mut self, stmt: &IfStatement) -> JackResult<()> {
        let (else_label, end_label) = self.open_if()?;

        self.expression(&stmt.condition)?;
        self.emit("not");

        match &stmt.else_branch {
            Some(else_branch) => {
                self.if_goto(&else_label);
                self.statements(&stmt.then_branch)?;
                self.goto(&end_label);
                self.label(&else_label);
                self.statements(else_branch)?;
            }
            None => {
                self.if_goto(&end_label);
                self.statements(&stmt.then_branch)?;
            }
        }

        self.label(&end_label);
        Ok(())
    }

    fn while_statement(&mut self, stmt: &WhileStatement) -> JackResult<()> {
        let (begin_label, end_label) = self.open_while()?;

        self.label(&begin_label);
        self.expression(&stmt.condition)?;
        self.emit("not");
        self.if_goto(&end_label);
        self.statements(&stmt.body)?;
        self.goto(&begin_label);
        self.label(&end_label);
        Ok(())
    }

    fn do_statement(&mut self, stmt: &DoStatement) -> JackResult<()> {
        self.subroutine_call(&stmt.call)?;
        // Discard the unused return value.
        self.pop(Segment::Temp, 0);
        Ok(())
    }

    fn return_statement(&mut self, stmt: &ReturnStatement) -> JackResult<()> {
        match &stmt.expr {
            Some(expr) => self.expression(expr)?,
            // A void subroutine still returns a word.
            None => self.push(Segment::Constant, 0),
        }
        self.emit("return");
        Ok(())
    }

    /// Terms and operators are emitted in source order: first term,
    /// then for each pair the right-hand term followed by its
    /// operator. Evaluation is strictly left to right.
    fn expression(&mut self, expr: &Expression) -> JackResult<()> {
        self.term(&expr.term)?;
        for (op, term) in &expr.rest {
            self.term(term)?;
            self.binary_op(op)?;
        }
        Ok(())
    }

    fn term(&mut self, term: &Term) -> JackResult<()> {
        match term {
            Term::IntConst(token) => {
                let instr = format!("push {} {}", Segment::Constant, token.value);
                self.emit(&instr);
            }
            Term::KeywordConst(token) => {
                // false and null are plain zero; true is all ones.
                self.push(Segment::Constant, 0);
                if token.kind == TokenKind::Keyword(Keyword::True) {
                    self.emit("not");
                }
            }
            Term::This(_) => {
                self.push(Segment::Pointer, 0);
            }
            Term::StrConst(token) => {
                // String.appendChar returns its receiver, keeping the
                // string on the stack for the next append.
                let bytes = token.value.as_bytes();
                self.push(Segment::Constant, bytes.len());
                self.call("String.new", 1);
                for byte in bytes {
                    self.push(Segment::Constant, byte);
                    self.call("String.appendChar", 2);
                }
            }
            Term::Var(token) => {
                let info = self.symbols.var_info(&token.value)?.clone();
                self.push(segment(info.kind), info.offset);
            }
            Term::Array(name, index) => {
                let info = self.symbols.var_info(&name.value)?.clone();
                self.push(segment(info.kind), info.offset);
                self.expression(index)?;
                self.emit("add");
                self.pop(Segment::Pointer, 1);
                self.push(Segment::That, 0);
            }
            Term::Paren(expr) => {
                self.expression(expr)?;
            }
            Term::Unary(op, term) => {
                self.term(term)?;
                self.unary_op(op)?;
            }
            Term::Call(call) => {
                self.subroutine_call(call)?;
            }
        }
        Ok(())
    }

    fn subroutine_call(&mut self, call: &SubroutineCall) -> JackResult<()> {
        let mut arg_count = call.args.len();

        let target = match &call.prefix {
            // A prefix naming a known variable makes this a method
            // call on that object; the receiver is pushed first and
            // the call targets the variable's class.
            Some(prefix) if self.symbols.is_var(&prefix.value) => {
                let info = self.symbols.var_info(&prefix.value)?.clone();
                self.push(segment(info.kind), info.offset);
                arg_count += 1;
                format!("{}.{}", info.var_type, call.name.value)
            }
            // Any other prefix is a class name: a plain function or
            // constructor call.
            Some(prefix) => format!("{}.{}", prefix.value, call.name.value),
            // No prefix: a method call on the current object.
            None => {
                self.push(Segment::Pointer, 0);
                arg_count += 1;
                format!("{}.{}", self.symbols.parent_name()?, call.name.value)
            }
        };

        for expr in &call.args.exprs {
            self.expression(expr)?;
        }
        self.call(&target, arg_count);
        Ok(())
    }

    fn binary_op(&mut self, op: &Token) -> JackResult<()> {
        use TokenKind as TK;

        match op.kind {
            TK::Plus => self.emit("add"),
            TK::Minus => self.emit("sub"),
            TK::Amp => self.emit("and"),
            TK::Pipe => self.emit("or"),
            TK::Eq => self.emit("eq"),
            TK::Greater => self.emit("gt"),
            TK::Less => self.emit("lt"),
            // Multiplication and division call into the OS runtime.
            TK::Star => self.call("Math.multiply", 2),
            TK::Slash => self.call("Math.divide", 2),
            _ => return Err(CodeGenError::UnknownBinaryOp(op.value.clone()).into()),
        }
        Ok(())
    }

    fn unary_op(&mut self, op: &Token) -> JackResult<()> {
        match op.kind {
            TokenKind::Tilde => self.emit("not"),
            TokenKind::Minus => self.emit("neg"),
            _ => return Err(CodeGenError::UnknownUnaryOp(op.value.clone()).into()),
        }
        Ok(())
    }
}

/// Instruction emitters and label allocation.
impl CodeGen {
    fn emit(&mut self, instr: &str) {
        self.out.push_str(instr);
        self.out.push('\n');
    }

    fn push(&mut self, segment: Segment, index: impl Display) {
        let instr = format!("push {} {}", segment, index);
        self.emit(&instr);
    }

    fn pop(&mut self, segment: Segment, index: impl Display) {
        let instr = format!("pop {} {}", segment, index);
        self.emit(&instr);
    }

    fn function(&mut self, name: &str, local_count: usize) {
        let instr = format!("function {} {}", name, local_count);
        self.emit(&instr);
    }

    fn call(&mut self, name: &str, arg_count: usize) {
        let instr = format!("call {} {}", name, arg_count);
        self.emit(&instr);
    }

    fn label(&mut self, name: &str) {
        let instr = format!("label {}", name);
        self.emit(&instr);
    }

    fn goto(&mut self, name: &str) {
        let instr = format!("goto {}", name);
        self.emit(&instr);
    }

    fn if_goto(&mut self, name: &str) {
        let instr = format!("if-goto {}", name);
        self.emit(&instr);
    }

    /// Fresh begin/end label pair for a while statement, qualified by
    /// the innermost table name.
    fn open_while(&mut self) -> JackResult<(String, String)> {
        let name = self.symbols.name()?;
        let begin = format!("{}$WHILE_BEGIN_{}", name, self.while_count);
        let end = format!("{}$WHILE_END_{}", name, self.while_count);
        self.while_count += 1;
        Ok((begin, end))
    }

    /// Fresh else/end label pair for an if statement.
    fn open_if(&mut self) -> JackResult<(String, String)> {
        let name = self.symbols.name()?;
        let els = format!("{}$ELSE_{}", name, self.if_count);
        let end = format!("{}$IF_END_{}", name, self.if_count);
        self.if_count += 1;
        Ok((els, end))
    }
}
