use std::rc::Rc;

use ahash::AHashMap;
use astrum_core::{Token, TokenKind};

use crate::ast::{
    ClassDecl, DeclarationKind, Expr, ExprVisitor, FunctionDecl, LiteralValue, NodeId, Stmt,
    StmtVisitor, Type,
};
use crate::callable::CONSTRUCTOR;
use crate::error::{Error, ResolveErrorKind};
use crate::interpreter::Interpreter;
use crate::parser::Program;

#[derive(Copy, Clone, Debug, PartialEq)]
enum FunctionContext {
    None,
    Function,
    Method,
    Constructor,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum ClassContext {
    None,
    InClass,
}

/// Static pass that records, for every variable reference, how many scopes up its declaration
/// lives. References that resolve nowhere are left for a global lookup at runtime.
pub(crate) struct Resolver<'a> {
    // name -> whether its initializer has finished
    scopes: Vec<AHashMap<String, bool>>,
    interpreter: &'a mut Interpreter,
    current_fun: FunctionContext,
    current_cls: ClassContext,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(interpreter: &'a mut Interpreter) -> Self {
        Resolver {
            scopes: Vec::new(),
            interpreter,
            current_fun: FunctionContext::None,
            current_cls: ClassContext::None,
        }
    }

    /// Resolves a whole program. Top level declarations go into a tracked global scope, so
    /// they get distances like any other local.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.len()))]
    pub(crate) fn resolve(&mut self, program: &Program) -> Result<(), Error> {
        self.begin_scope();
        let res = self.resolve_stmts(&program.0);
        self.end_scope();
        res
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt]) -> Result<(), Error> {
        for stmt in stmts {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn begin_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, token: &Token) -> Result<(), Error> {
        let Some(last) = self.scopes.last_mut() else {
            return Ok(());
        };

        if last.contains_key(&token.lexeme) {
            Err(Error::resolve_error(
                token,
                ResolveErrorKind::AlreadyDeclared,
                &format!("Already a variable named '{}' in this scope.", token.lexeme),
            ))
        } else {
            last.insert(token.lexeme.clone(), false);
            Ok(())
        }
    }

    fn define(&mut self, token: &Token) {
        if let Some(last) = self.scopes.last_mut() {
            last.insert(token.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, token: &Token) {
        for i in (0..self.scopes.len()).rev() {
            if self.scopes[i].contains_key(&token.lexeme) {
                let depth = self.scopes.len() - 1 - i;
                tracing::trace!(name = %token.lexeme, line = token.line, depth, "resolved");
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }

    // Reading a name inside its own initializer
    fn check_initialized(&self, token: &Token) -> Result<(), Error> {
        if let Some(last) = self.scopes.last() {
            if let Some(false) = last.get(&token.lexeme) {
                return Err(Error::resolve_error(
                    token,
                    ResolveErrorKind::OwnInitializer,
                    "Can't read local variable in its own initializer.",
                ));
            }
        }
        Ok(())
    }

    fn resolve_function(
        &mut self,
        declaration: &FunctionDecl,
        context: FunctionContext,
    ) -> Result<(), Error> {
        let enclosing = self.current_fun;
        self.current_fun = context;

        self.begin_scope();
        let res = self.resolve_function_body(declaration);
        self.end_scope();

        self.current_fun = enclosing;
        res
    }

    fn resolve_function_body(&mut self, declaration: &FunctionDecl) -> Result<(), Error> {
        for param in &declaration.params {
            self.declare(&param.left_token)?;
            self.define(&param.left_token);
        }
        self.resolve_stmts(&declaration.body)
    }

    fn resolve_class_body(&mut self, declaration: &ClassDecl) -> Result<(), Error> {
        for field in &declaration.fields {
            self.visit_expr(&field.init)?;
        }

        for method in &declaration.methods {
            let context = if method.name.lexeme == CONSTRUCTOR {
                FunctionContext::Constructor
            } else {
                FunctionContext::Method
            };
            self.resolve_function(method, context)?;
        }
        Ok(())
    }
}

impl<'a> StmtVisitor for Resolver<'a> {
    type Item = ();

    fn visit_empty(&mut self) -> Result<Self::Item, Error> {
        Ok(())
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Self::Item, Error> {
        self.begin_scope();
        let res = self.resolve_stmts(statements);
        self.end_scope();
        res
    }

    fn visit_expression(&mut self, expression: &Expr, _: &Token) -> Result<Self::Item, Error> {
        self.visit_expr(expression)
    }

    fn visit_variable_declaration(
        &mut self,
        name: &Token,
        _: DeclarationKind,
        _: Option<&Type>,
        init: Option<&Stmt>,
    ) -> Result<Self::Item, Error> {
        self.declare(name)?;
        if let Some(init) = init {
            self.visit_stmt(init)?;
        }
        self.define(name);
        Ok(())
    }

    fn visit_index_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        index: &Expr,
        value: &Expr,
    ) -> Result<Self::Item, Error> {
        self.visit_expr(index)?;
        self.visit_expr(value)?;
        self.resolve_local(id, name);
        Ok(())
    }

    fn visit_function(&mut self, declaration: &Rc<FunctionDecl>) -> Result<Self::Item, Error> {
        self.declare(&declaration.name)?;
        self.define(&declaration.name);
        self.resolve_function(declaration, FunctionContext::Function)
    }

    fn visit_if(
        &mut self,
        _: &Token,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<Self::Item, Error> {
        self.visit_expr(condition)?;
        self.visit_stmt(then_branch)?;
        if let Some(else_branch) = else_branch {
            self.visit_stmt(else_branch)?;
        }
        Ok(())
    }

    fn visit_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        _: &Token,
    ) -> Result<Self::Item, Error> {
        self.visit_expr(condition)?;
        self.visit_stmt(body)
    }

    fn visit_return(&mut self, keyword: &Token, value: &Stmt) -> Result<Self::Item, Error> {
        match self.current_fun {
            FunctionContext::None => Err(Error::resolve_error(
                keyword,
                ResolveErrorKind::ReturnOutsideFunction,
                "Can't return from top-level code.",
            )),
            FunctionContext::Constructor => Err(Error::resolve_error(
                keyword,
                ResolveErrorKind::ReturnInConstructor,
                "Can't return from a constructor.",
            )),
            FunctionContext::Function | FunctionContext::Method => self.visit_stmt(value),
        }
    }

    fn visit_object(&mut self, properties: &[(Token, Stmt)]) -> Result<Self::Item, Error> {
        for (_, value) in properties {
            self.visit_stmt(value)?;
        }
        Ok(())
    }

    fn visit_class(&mut self, declaration: &Rc<ClassDecl>) -> Result<Self::Item, Error> {
        let enclosing = self.current_cls;
        self.current_cls = ClassContext::InClass;
        self.declare(&declaration.name)?;
        self.define(&declaration.name);

        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(String::from("this"), true);
        }
        let res = self.resolve_class_body(declaration);
        self.end_scope();

        self.current_cls = enclosing;
        res
    }
}

impl<'a> ExprVisitor for Resolver<'a> {
    type Item = ();

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(expression)
    }

    fn visit_binary(&mut self, left: &Expr, _: &Token, right: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(left)?;
        self.visit_expr(right)
    }

    fn visit_unary(&mut self, _: &Token, operand: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(operand)
    }

    fn visit_literal(&mut self, _: TokenKind, value: &LiteralValue) -> Result<Self::Item, Error> {
        if let LiteralValue::List(elements) = value {
            for element in elements {
                self.visit_expr(element)?;
            }
        }
        Ok(())
    }

    fn visit_identifier(&mut self, id: NodeId, name: &Token) -> Result<Self::Item, Error> {
        self.check_initialized(name)?;
        self.resolve_local(id, name);
        Ok(())
    }

    fn visit_this(&mut self, id: NodeId, keyword: &Token) -> Result<Self::Item, Error> {
        if let ClassContext::None = self.current_cls {
            return Err(Error::resolve_error(
                keyword,
                ResolveErrorKind::ThisOutsideClass,
                "Can't use 'this' outside of a class.",
            ));
        }

        self.resolve_local(id, keyword);
        Ok(())
    }

    fn visit_anonymous_function(
        &mut self,
        _: &Token,
        declaration: &Rc<FunctionDecl>,
    ) -> Result<Self::Item, Error> {
        self.resolve_function(declaration, FunctionContext::Function)
    }

    fn visit_call(&mut self, callee: &Expr, _: &Token, args: &[Expr]) -> Result<Self::Item, Error> {
        self.visit_expr(callee)?;
        for arg in args {
            self.visit_expr(arg)?;
        }
        Ok(())
    }

    fn visit_index(&mut self, id: NodeId, name: &Token, index: &Expr) -> Result<Self::Item, Error> {
        self.check_initialized(name)?;
        self.resolve_local(id, name);
        self.visit_expr(index)
    }

    fn visit_get(&mut self, object: &Expr, _: &Token) -> Result<Self::Item, Error> {
        self.visit_expr(object)
    }

    fn visit_set(&mut self, object: &Expr, _: &Token, value: &Expr) -> Result<Self::Item, Error> {
        self.visit_expr(value)?;
        self.visit_expr(object)
    }

    fn visit_object_literal(
        &mut self,
        _: &Token,
        properties: &[(Token, Expr)],
    ) -> Result<Self::Item, Error> {
        for (_, value) in properties {
            self.visit_expr(value)?;
        }
        Ok(())
    }

    fn visit_variable_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        value: &Expr,
    ) -> Result<Self::Item, Error> {
        self.visit_expr(value)?;
        self.resolve_local(id, name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use astrum_core::tokenize;

    use crate::ast::{Expr, NodeId, Stmt};
    use crate::error::{Error, ResolveErrorKind};
    use crate::interpreter::Interpreter;
    use crate::parser::{Parser, Program};
    use crate::resolver::Resolver;

    fn resolve(src: &str) -> (Interpreter, Program, Result<(), Error>) {
        let tokens = tokenize(src).unwrap();
        let program = Parser::new(&tokens).parse().unwrap();
        let mut interpreter = Interpreter::new();
        let res = Resolver::new(&mut interpreter).resolve(&program);
        (interpreter, program, res)
    }

    fn resolve_error(src: &str) -> Option<ResolveErrorKind> {
        resolve(src).2.err().and_then(|err| err.resolve_kind())
    }

    #[test]
    fn test_static_errors() {
        let tests = [
            ("let x = x + 1", ResolveErrorKind::OwnInitializer),
            ("{ let a = 1\n let a = 2 }", ResolveErrorKind::AlreadyDeclared),
            ("let a = 1\nlet a = 2", ResolveErrorKind::AlreadyDeclared),
            ("function f(a, a) {}", ResolveErrorKind::AlreadyDeclared),
            ("return 1", ResolveErrorKind::ReturnOutsideFunction),
            (
                "class A { constructor() { return } }",
                ResolveErrorKind::ReturnInConstructor,
            ),
            ("print(this)", ResolveErrorKind::ThisOutsideClass),
            ("function f() { return this }", ResolveErrorKind::ThisOutsideClass),
        ];

        for (src, expected) in tests {
            assert_eq!(resolve_error(src), Some(expected), "{}", src);
        }
    }

    #[test]
    fn test_valid_programs() {
        let tests = [
            "let x = 1\n{ let y = x\n let x = y }",
            "function f() { return g() }\nfunction g() { return 1 }",
            "class A { n = 1\n get() { return this.n }\n make() { return function() { return this } } }",
            "let f = function(n) { return n }",
        ];

        for src in tests {
            assert_eq!(resolve(src).2, Ok(()), "{}", src);
        }
    }

    #[test]
    fn test_distances() {
        let (interpreter, program, res) =
            resolve("let a = 1\nfunction f(b) { { return a + b } }\nprint(a)");
        res.unwrap();

        // ids are handed out in parse order: `a` and `b` in the body, then `print`, then `a`
        assert_eq!(interpreter.depth_of(NodeId(0)), Some(2));
        assert_eq!(interpreter.depth_of(NodeId(1)), Some(1));
        // natives are never declared, so they stay global lookups
        assert_eq!(interpreter.depth_of(NodeId(2)), None);
        assert_eq!(interpreter.depth_of(NodeId(3)), Some(0));

        assert!(matches!(
            &program.0[2],
            Stmt::Expression {
                expression: Expr::FunctionCall { .. },
                ..
            }
        ));
    }
}
