use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

use ahash::AHashMap;
use astrum_core::{Token, TokenKind};

use crate::ast::{
    ClassDecl, DeclarationKind, Expr, ExprVisitor, FunctionDecl, LiteralValue, NodeId, Stmt,
    StmtVisitor, Type,
};
use crate::builtins;
use crate::callable::{Callable, Class, Function, Instance, NativeFunction};
use crate::env::{EnvError, Environment};
use crate::error::{Error, RuntimeErrorKind};
use crate::limits::{MAX_CALL_DEPTH, STACK_GROWTH_SIZE, STACK_RED_ZONE};
use crate::parser::Program;
use crate::value::Value;

/// What a statement tells its enclosing block: keep going, or unwind to the nearest call
/// boundary with a value.
#[derive(Debug, PartialEq)]
pub(crate) enum Signal {
    Proceed,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    locals: AHashMap<NodeId, usize>,
    stdout: Rc<RefCell<dyn Write>>,
    stdin: Rc<RefCell<dyn BufRead>>,
    // calls currently on the stack
    depth: usize,
}

impl Interpreter {
    /// An interpreter wired to the process' stdout and stdin.
    pub fn new() -> Self {
        Interpreter::with_io(
            Rc::new(RefCell::new(io::stdout())),
            Rc::new(RefCell::new(BufReader::new(io::stdin()))),
        )
    }

    pub fn with_io(stdout: Rc<RefCell<dyn Write>>, stdin: Rc<RefCell<dyn BufRead>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        let mut interpreter = Interpreter {
            env: globals.clone(),
            globals,
            locals: AHashMap::new(),
            stdout,
            stdin,
            depth: 0,
        };
        builtins::register(&mut interpreter);
        interpreter
    }

    /// Registers a native callable in the global scope, replacing any earlier binding of the
    /// same name. The token handed to `func` is the call site.
    pub fn define_native<F>(&mut self, name: &str, arity: usize, func: F)
    where
        F: Fn(&mut Interpreter, &Token, &[Value]) -> Result<Value, Error> + 'static,
    {
        tracing::debug!(name, arity, "native registered");
        let native = NativeFunction::new(name, arity, func);
        self.globals
            .borrow_mut()
            .define_or_replace(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Runs a resolved program in the global scope and returns the value of its last top
    /// level expression statement.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.len()))]
    pub(crate) fn interpret(&mut self, program: &Program) -> Result<Value, Error> {
        let mut last = Value::Undefined;
        for stmt in &program.0 {
            if let Stmt::Expression { expression, .. } = stmt {
                last = self.visit_expr(expression)?;
            } else {
                // a top level return is rejected by the resolver
                self.visit_stmt(stmt)?;
            }
        }

        if let Err(err) = self.stdout.borrow_mut().flush() {
            tracing::warn!(%err, "could not flush output");
        }
        Ok(last)
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        stmts: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<Signal, Error> {
        let previous = std::mem::replace(&mut self.env, env);
        let res = self.execute_stmts(stmts);
        self.env = previous;
        res
    }

    pub(crate) fn evaluate_with_env(
        &mut self,
        expr: &Expr,
        env: Rc<RefCell<Environment>>,
    ) -> Result<Value, Error> {
        let previous = std::mem::replace(&mut self.env, env);
        let res = self.visit_expr(expr);
        self.env = previous;
        res
    }

    fn execute_stmts(&mut self, stmts: &[Stmt]) -> Result<Signal, Error> {
        for stmt in stmts {
            if let signal @ Signal::Return(_) = self.visit_stmt(stmt)? {
                return Ok(signal);
            }
        }
        Ok(Signal::Proceed)
    }

    pub(crate) fn resolve(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub(crate) fn depth_of(&self, id: NodeId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    fn lookup_variable(&self, id: NodeId, name: &Token) -> Result<Value, Error> {
        let value = match self.depth_of(id) {
            Some(dist) => self.env.borrow().get_at(dist, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            Error::runtime_error(
                name,
                RuntimeErrorKind::UndefinedVariable,
                &format!("Undefined variable '{}'.", name.lexeme),
            )
        })
    }

    fn assign_variable(&mut self, id: NodeId, name: &Token, value: Value) -> Result<(), Error> {
        let res = match self.depth_of(id) {
            Some(dist) => self.env.borrow_mut().assign_at(dist, &name.lexeme, value),
            None => self.globals.borrow_mut().assign(&name.lexeme, value),
        };

        res.map_err(|_| {
            Error::runtime_error(
                name,
                RuntimeErrorKind::UndefinedVariable,
                &format!("Undefined variable '{}'.", name.lexeme),
            )
        })
    }

    fn define_variable(&mut self, name: &Token, value: Value) -> Result<(), Error> {
        match self.env.borrow_mut().define(&name.lexeme, value) {
            Ok(()) => Ok(()),
            Err(EnvError::AlreadyDefined) | Err(EnvError::Undefined) => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::AlreadyDeclared,
                &format!("'{}' is already declared in this scope.", name.lexeme),
            )),
        }
    }

    /// Calls any callable value after checking the argument count. Natives use this to call
    /// back into user code.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        paren: &Token,
        args: &[Value],
    ) -> Result<Value, Error> {
        match callee {
            Value::Callable(callable) => {
                if callable.arity() != args.len() {
                    return Err(Error::runtime_error(
                        paren,
                        RuntimeErrorKind::ArityMismatch,
                        &format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                if self.depth >= MAX_CALL_DEPTH {
                    tracing::debug!(depth = self.depth, line = paren.line, "call depth exceeded");
                    return Err(Error::runtime_error(
                        paren,
                        RuntimeErrorKind::StackOverflow,
                        "Stack overflow.",
                    ));
                }

                tracing::trace!(name = callable.name(), line = paren.line, "call");
                self.depth += 1;
                let res = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
                    callable.call(self, paren, args)
                });
                self.depth -= 1;
                res
            }
            other => Err(Error::runtime_error(
                paren,
                RuntimeErrorKind::NotCallable,
                &format!("Can only call functions and classes, got {}.", other.type_name()),
            )),
        }
    }

    fn get_property(&mut self, target: Value, name: &Token) -> Result<Value, Error> {
        match target {
            Value::Instance(instance) => Instance::get(&instance, &name.lexeme).ok_or_else(|| {
                Error::runtime_error(
                    name,
                    RuntimeErrorKind::InvalidPropertyAccess,
                    &format!("Undefined property '{}'.", name.lexeme),
                )
            }),
            Value::Object(properties) => properties
                .borrow()
                .iter()
                .find(|(key, _)| *key == name.lexeme)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    Error::runtime_error(
                        name,
                        RuntimeErrorKind::InvalidPropertyAccess,
                        &format!("Object has no property '{}'.", name.lexeme),
                    )
                }),
            value @ Value::List(_) => self.get_wrapped_property("Array", value, name),
            value @ Value::Str(_) => self.get_wrapped_property("String", value, name),
            other => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidPropertyAccess,
                &format!(
                    "Only instances, objects, lists and strings have properties, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    // Lists and strings get their methods from a wrapper class constructed with the value
    fn get_wrapped_property(
        &mut self,
        class_name: &str,
        value: Value,
        name: &Token,
    ) -> Result<Value, Error> {
        let wrapper = self.globals.borrow().get(class_name);
        match wrapper {
            Some(class @ Value::Callable(Callable::Class(_))) => {
                let instance = self.call_value(&class, name, &[value])?;
                self.get_property(instance, name)
            }
            _ => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidPropertyAccess,
                &format!(
                    "Can't read '{}' of a {}, no '{}' class is defined.",
                    name.lexeme,
                    value.type_name(),
                    class_name
                ),
            )),
        }
    }

    fn list_index(&self, index: Value, name: &Token) -> Result<Option<usize>, Error> {
        match index {
            Value::Num(i) if i.fract() == 0.0 => {
                // negative indices never hit an element
                if i < 0.0 {
                    Ok(None)
                } else {
                    Ok(Some(i as usize))
                }
            }
            other => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidIndex,
                &format!("List index must be an integer, got {}.", other),
            )),
        }
    }

    fn boolean_condition(&mut self, condition: &Expr, token: &Token) -> Result<bool, Error> {
        match self.visit_expr(condition)? {
            Value::Bool(val) => Ok(val),
            other => Err(Error::runtime_error(
                token,
                RuntimeErrorKind::OperandType,
                &format!(
                    "Condition of '{}' must be a boolean, got {}.",
                    token.lexeme,
                    other.type_name()
                ),
            )),
        }
    }

    fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64), Error> {
        match (left, right) {
            (Value::Num(left), Value::Num(right)) => Ok((*left, *right)),
            _ => Err(Error::runtime_error(
                operator,
                RuntimeErrorKind::OperandType,
                &format!(
                    "Operands of '{}' must be numbers, got {} and {}.",
                    operator.lexeme,
                    left.type_name(),
                    right.type_name()
                ),
            )),
        }
    }

    fn logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let operand_error = |value: &Value| {
            Error::runtime_error(
                operator,
                RuntimeErrorKind::OperandType,
                &format!(
                    "Operands of '{}' must be booleans, got {}.",
                    operator.lexeme,
                    value.type_name()
                ),
            )
        };

        let left = match self.visit_expr(left)? {
            Value::Bool(val) => val,
            other => return Err(operand_error(&other)),
        };

        // `||` only needs the right side when the left is false, `&&` only when it is true
        if operator.kind == TokenKind::LogicalOr {
            if left {
                return Ok(Value::Bool(true));
            }
        } else if !left {
            return Ok(Value::Bool(false));
        }

        match self.visit_expr(right)? {
            val @ Value::Bool(_) => Ok(val),
            other => Err(operand_error(&other)),
        }
    }

    pub(crate) fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.stdout.borrow_mut(), "{}", text)
    }

    pub(crate) fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.stdin.borrow_mut().read_line(buf)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl ExprVisitor for Interpreter {
    type Item = Value;

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Value, Error> {
        self.visit_expr(expression)
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        if matches!(operator.kind, TokenKind::LogicalAnd | TokenKind::LogicalOr) {
            return self.logical(left, operator, right);
        }

        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        match operator.kind {
            TokenKind::Plus => match (&left, &right) {
                (Value::Num(lhs), Value::Num(rhs)) => Ok(Value::Num(lhs + rhs)),
                (Value::Str(_), Value::Str(_) | Value::Num(_))
                | (Value::Num(_), Value::Str(_)) => Ok(Value::from(format!("{}{}", left, right))),
                _ => Err(Error::runtime_error(
                    operator,
                    RuntimeErrorKind::TypeMismatch,
                    &format!(
                        "Can't add {} and {}, operands must be numbers or strings.",
                        left.type_name(),
                        right.type_name()
                    ),
                )),
            },
            TokenKind::Minus => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Num(lhs - rhs))
            }
            TokenKind::Asterisk => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Num(lhs * rhs))
            }
            TokenKind::Slash => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                if rhs == 0.0 {
                    return Err(Error::runtime_error(
                        operator,
                        RuntimeErrorKind::DivisionByZero,
                        "Division by zero.",
                    ));
                }
                Ok(Value::Num(lhs / rhs))
            }
            TokenKind::GreaterThan => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Bool(lhs > rhs))
            }
            TokenKind::GreaterThanOrEqual => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Bool(lhs >= rhs))
            }
            TokenKind::LessThan => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Bool(lhs < rhs))
            }
            TokenKind::LessThanOrEqual => {
                let (lhs, rhs) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Bool(lhs <= rhs))
            }
            TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
            TokenKind::NotEqual => Ok(Value::Bool(left != right)),
            _ => Err(Error::runtime_error(
                operator,
                RuntimeErrorKind::OperandType,
                &format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn visit_unary(&mut self, operator: &Token, operand: &Expr) -> Result<Value, Error> {
        let operand = self.visit_expr(operand)?;
        match (operator.kind, operand) {
            (TokenKind::Minus, Value::Num(val)) => Ok(Value::Num(-val)),
            (TokenKind::Not, Value::Bool(val)) => Ok(Value::Bool(!val)),
            (TokenKind::Minus, other) => Err(Error::runtime_error(
                operator,
                RuntimeErrorKind::OperandType,
                &format!("Operand of '-' must be a number, got {}.", other.type_name()),
            )),
            (_, other) => Err(Error::runtime_error(
                operator,
                RuntimeErrorKind::OperandType,
                &format!("Operand of '!' must be a boolean, got {}.", other.type_name()),
            )),
        }
    }

    fn visit_literal(&mut self, _: TokenKind, value: &LiteralValue) -> Result<Value, Error> {
        match value {
            LiteralValue::Num(val) => Ok(Value::Num(*val)),
            LiteralValue::Str(val) => Ok(Value::Str(Rc::clone(val))),
            LiteralValue::Bool(val) => Ok(Value::Bool(*val)),
            LiteralValue::Null => Ok(Value::Null),
            LiteralValue::Undefined => Ok(Value::Undefined),
            // every evaluation builds a fresh object or list
            LiteralValue::EmptyObject => Ok(Value::object(Vec::new())),
            LiteralValue::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.visit_expr(element)?);
                }
                Ok(Value::list(values))
            }
        }
    }

    fn visit_identifier(&mut self, id: NodeId, name: &Token) -> Result<Value, Error> {
        self.lookup_variable(id, name)
    }

    fn visit_this(&mut self, id: NodeId, keyword: &Token) -> Result<Value, Error> {
        self.lookup_variable(id, keyword)
    }

    fn visit_anonymous_function(
        &mut self,
        _: &Token,
        declaration: &Rc<FunctionDecl>,
    ) -> Result<Value, Error> {
        let function = Function::new(declaration, self.env.clone(), true);
        Ok(Value::Callable(Callable::Function(Rc::new(function))))
    }

    fn visit_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Result<Value, Error> {
        let callee = self.visit_expr(callee)?;
        let mut evaluated_args = Vec::with_capacity(args.len());
        for arg in args {
            evaluated_args.push(self.visit_expr(arg)?);
        }

        self.call_value(&callee, paren, &evaluated_args)
    }

    fn visit_index(&mut self, id: NodeId, name: &Token, index: &Expr) -> Result<Value, Error> {
        let target = self.lookup_variable(id, name)?;
        let index = self.visit_expr(index)?;

        match target {
            Value::List(values) => {
                let value = self
                    .list_index(index, name)?
                    .and_then(|i| values.borrow().get(i).cloned());
                Ok(value.unwrap_or(Value::Undefined))
            }
            other => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidIndexTarget,
                &format!("Only lists can be indexed, '{}' is a {}.", name.lexeme, other.type_name()),
            )),
        }
    }

    fn visit_get(&mut self, object: &Expr, name: &Token) -> Result<Value, Error> {
        let target = self.visit_expr(object)?;
        self.get_property(target, name)
    }

    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Value, Error> {
        match self.visit_expr(object)? {
            Value::Instance(instance) => {
                let value = self.visit_expr(value)?;
                instance.borrow_mut().set(&name.lexeme, value.clone());
                Ok(value)
            }
            Value::Object(properties) => {
                let value = self.visit_expr(value)?;
                let mut properties = properties.borrow_mut();
                match properties.iter_mut().find(|(key, _)| *key == name.lexeme) {
                    Some((_, slot)) => *slot = value.clone(),
                    None => properties.push((name.lexeme.clone(), value.clone())),
                }
                Ok(value)
            }
            other => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidPropertyAssignment,
                &format!(
                    "Only instances and objects have fields, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn visit_object_literal(
        &mut self,
        _: &Token,
        properties: &[(Token, Expr)],
    ) -> Result<Value, Error> {
        let mut values = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            values.push((key.lexeme.clone(), self.visit_expr(value)?));
        }
        Ok(Value::object(values))
    }

    fn visit_variable_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        value: &Expr,
    ) -> Result<Value, Error> {
        let value = self.visit_expr(value)?;
        self.assign_variable(id, name, value.clone())?;
        Ok(value)
    }
}

impl StmtVisitor for Interpreter {
    type Item = Signal;

    fn visit_empty(&mut self) -> Result<Signal, Error> {
        Ok(Signal::Proceed)
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Signal, Error> {
        let env = Rc::new(RefCell::new(Environment::with(self.env.clone())));
        self.execute_block_with_env(statements, env)
    }

    fn visit_expression(&mut self, expression: &Expr, _: &Token) -> Result<Signal, Error> {
        self.visit_expr(expression)?;
        Ok(Signal::Proceed)
    }

    fn visit_variable_declaration(
        &mut self,
        name: &Token,
        kind: DeclarationKind,
        _: Option<&Type>,
        init: Option<&Stmt>,
    ) -> Result<Signal, Error> {
        let value = match init {
            Some(Stmt::Expression { expression, .. }) => self.visit_expr(expression)?,
            Some(other) => {
                self.visit_stmt(other)?;
                Value::Undefined
            }
            None => Value::Undefined,
        };

        tracing::trace!(name = %name.lexeme, ?kind, line = name.line, "define");
        self.define_variable(name, value)?;
        Ok(Signal::Proceed)
    }

    fn visit_index_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        index: &Expr,
        value: &Expr,
    ) -> Result<Signal, Error> {
        let target = self.lookup_variable(id, name)?;
        let index = self.visit_expr(index)?;
        let value = self.visit_expr(value)?;

        let values = match target {
            Value::List(values) => values,
            other => {
                return Err(Error::runtime_error(
                    name,
                    RuntimeErrorKind::InvalidIndexTarget,
                    &format!(
                        "Only list elements can be assigned, '{}' is a {}.",
                        name.lexeme,
                        other.type_name()
                    ),
                ))
            }
        };

        let position = self.list_index(index.clone(), name)?;
        let mut values = values.borrow_mut();
        let len = values.len();
        match position.and_then(|i| values.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                Ok(Signal::Proceed)
            }
            None => Err(Error::runtime_error(
                name,
                RuntimeErrorKind::InvalidIndex,
                &format!(
                    "Index {} is out of bounds for '{}' with length {}.",
                    index, name.lexeme, len
                ),
            )),
        }
    }

    fn visit_function(&mut self, declaration: &Rc<FunctionDecl>) -> Result<Signal, Error> {
        let function = Function::new(declaration, self.env.clone(), false);
        self.define_variable(
            &declaration.name,
            Value::Callable(Callable::Function(Rc::new(function))),
        )?;
        Ok(Signal::Proceed)
    }

    fn visit_if(
        &mut self,
        keyword: &Token,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<Signal, Error> {
        if self.boolean_condition(condition, keyword)? {
            self.visit_stmt(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.visit_stmt(else_branch)
        } else {
            Ok(Signal::Proceed)
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt, token: &Token) -> Result<Signal, Error> {
        while self.boolean_condition(condition, token)? {
            if let signal @ Signal::Return(_) = self.visit_stmt(body)? {
                return Ok(signal);
            }
        }
        Ok(Signal::Proceed)
    }

    fn visit_return(&mut self, _: &Token, value: &Stmt) -> Result<Signal, Error> {
        let value = match value {
            Stmt::Expression { expression, .. } => self.visit_expr(expression)?,
            _ => Value::Undefined,
        };
        Ok(Signal::Return(value))
    }

    fn visit_object(&mut self, properties: &[(Token, Stmt)]) -> Result<Signal, Error> {
        for (_, value) in properties {
            self.visit_stmt(value)?;
        }
        Ok(Signal::Proceed)
    }

    fn visit_class(&mut self, declaration: &Rc<ClassDecl>) -> Result<Signal, Error> {
        let class = Class::new(declaration, self.env.clone());
        tracing::debug!(
            class = class.name(),
            methods = declaration.methods.len(),
            fields = declaration.fields.len(),
            "class declared"
        );
        self.define_variable(
            &declaration.name,
            Value::Callable(Callable::Class(Rc::new(class))),
        )?;
        Ok(Signal::Proceed)
    }
}
