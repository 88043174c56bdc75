use std::rc::Rc;

use astrum_core::{Token, TokenKind};

use crate::ast::{
    ClassDecl, DeclarationKind, Expr, FieldDecl, FunctionDecl, LiteralValue, NodeId, Parameter,
    Stmt,
};
use crate::error::Error;

mod expr;
mod types;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    node_count: u32,
}

// A wrapper over vector of statements to not leak Stmt to public
#[derive(Debug, PartialEq)]
pub struct Program(pub(crate) Vec<Stmt>);

impl Program {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Helper alias for shorter return types
type BlockResult = Result<Vec<Stmt>, Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

const MAX_ARGUMENTS: usize = 255;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            current: 0,
            node_count: 0,
        }
    }

    // Ids continue from `first`, so trees parsed by one interpreter never share an id
    pub(crate) fn starting_at(tokens: &'a [Token], first: u32) -> Self {
        Parser {
            tokens,
            current: 0,
            node_count: first,
        }
    }

    pub(crate) fn next_node_id(&self) -> u32 {
        self.node_count
    }

    /// Parses the whole token stream, stopping at the first error.
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = self.tokens.len()))]
    pub fn parse(&mut self) -> Result<Program, Error> {
        let mut statements = Vec::new();
        if self.tokens.is_empty() {
            return Ok(Program(statements));
        }

        self.skip_newlines();
        while !self.is_at_end() {
            statements.push(self.statement()?);
            self.skip_newlines();
        }

        tracing::debug!(statements = statements.len(), nodes = self.node_count, "parsed");
        Ok(Program(statements))
    }

    fn statement(&mut self) -> StmtResult {
        self.skip_newlines();
        if self.match_one(TokenKind::Class) {
            self.class_declaration()
        } else if self.match_one(TokenKind::For) {
            self.for_statement()
        } else if self.match_one(TokenKind::While) {
            self.while_statement()
        } else if self.match_one(TokenKind::If) {
            self.if_statement()
        } else if self.match_either(&[TokenKind::Let, TokenKind::Const, TokenKind::Var]) {
            self.variable_declaration()
        } else if self.check(TokenKind::Function) && self.check_next(TokenKind::Identifier) {
            self.advance();
            self.function_declaration()
        } else if self.match_one(TokenKind::Return) {
            self.return_statement()
        } else if self.check(TokenKind::LeftCurlyBrace) {
            if self.check_next(TokenKind::RightCurlyBrace) {
                self.advance();
                self.advance();
                self.empty_object_statement()
            } else if self.looks_like_object(self.current + 1) {
                self.expression_statement()
            } else {
                Ok(Stmt::block(self.block()?))
            }
        } else if self.match_one(TokenKind::ObjectLiteral) {
            self.empty_object_statement()
        } else if self.is_at_end() {
            Ok(Stmt::Empty)
        } else if self.is_index_assignment() {
            self.index_assignment()
        } else {
            self.expression_statement()
        }
    }

    fn class_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(TokenKind::Identifier, "Expect class name.")?
            .clone();
        self.skip_newlines();

        let mut methods = Vec::new();
        let mut fields = Vec::new();
        if self.match_one(TokenKind::ObjectLiteral) {
            return Ok(Stmt::Class(Rc::new(ClassDecl {
                name,
                methods,
                fields,
            })));
        }

        self.consume(TokenKind::LeftCurlyBrace, "Expect '{' before class body.")?;
        self.skip_newlines();
        while !self.check(TokenKind::RightCurlyBrace) && !self.is_at_end() {
            let member = self
                .consume(TokenKind::Identifier, "Expect method or field name in class body.")?
                .clone();

            if self.check(TokenKind::LeftParen) {
                methods.push(Rc::new(self.function_rest(member)?));
            } else {
                let ty = self.type_annotation()?;
                self.consume(TokenKind::Equal, "Expect '=' after field name.")?;
                let init = self.expression()?;
                self.check_valid_end()?;
                fields.push(FieldDecl {
                    name: member,
                    ty,
                    init,
                });
            }
            self.skip_newlines();
        }
        self.consume(TokenKind::RightCurlyBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(Rc::new(ClassDecl {
            name,
            methods,
            fields,
        })))
    }

    fn function_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(TokenKind::Identifier, "Expect function name.")?
            .clone();
        Ok(Stmt::Function(Rc::new(self.function_rest(name)?)))
    }

    // Everything after the name: parameters, optional return type and the body
    fn function_rest(&mut self, name: Token) -> Result<FunctionDecl, Error> {
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let params = self.parameters()?;
        let return_type = self.type_annotation()?;
        let body = self.block()?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            return_type,
        })
    }

    // Consumes the closing ')'
    fn parameters(&mut self) -> Result<Vec<Parameter>, Error> {
        let mut params = Vec::new();
        self.skip_newlines();
        if !self.check(TokenKind::RightParen) {
            loop {
                self.skip_newlines();
                if params.len() >= MAX_ARGUMENTS {
                    return Err(Error::parse_error(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                let left_token = self
                    .consume(TokenKind::Identifier, "Expect parameter name.")?
                    .clone();
                let ty = self.type_annotation()?;
                let right_token = ty.as_ref().map(|_| self.previous().clone());
                params.push(Parameter {
                    name: left_token.lexeme.clone(),
                    ty,
                    left_token,
                    right_token,
                });

                self.skip_newlines();
                if !self.match_one(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        Ok(params)
    }

    fn block(&mut self) -> BlockResult {
        self.skip_newlines();
        if self.match_one(TokenKind::ObjectLiteral) {
            return Ok(Vec::new());
        }

        self.consume(TokenKind::LeftCurlyBrace, "Expect '{' before block.")?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RightCurlyBrace) && !self.is_at_end() {
            stmts.push(self.statement()?);
            self.skip_newlines();
        }
        self.consume(TokenKind::RightCurlyBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn empty_object_statement(&mut self) -> StmtResult {
        self.check_valid_end()?;
        Ok(Stmt::Object {
            properties: Vec::new(),
        })
    }

    fn expression_statement(&mut self) -> StmtResult {
        let token = self.peek().clone();
        let expression = self.expression()?;
        self.check_valid_end()?;
        Ok(Stmt::expression(expression, token))
    }

    fn if_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Stmt::block(self.block()?);

        // `else` may start on the next line, but whatever else follows there belongs to the
        // enclosing statement list
        let before_newlines = self.current;
        self.skip_newlines();
        let else_branch = if self.match_one(TokenKind::Else) {
            if self.match_one(TokenKind::If) {
                Some(Box::new(self.if_statement()?))
            } else {
                Some(Box::new(Stmt::block(self.block()?)))
            }
        } else {
            self.current = before_newlines;
            None
        };

        Ok(Stmt::If {
            keyword,
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn while_statement(&mut self) -> StmtResult {
        let token = self.previous().clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = self.statement()?;
        Ok(Stmt::while_(condition, body, token))
    }

    fn for_statement(&mut self) -> StmtResult {
        let token = self.previous().clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_one(TokenKind::SemiColon) {
            None
        } else if self.match_either(&[TokenKind::Let, TokenKind::Const, TokenKind::Var]) {
            Some(self.variable_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::SemiColon) {
            Expr::literal(TokenKind::TrueLiteral, LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::SemiColon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = self.statement()?;
        let while_body = match increment {
            Some(increment) => {
                Stmt::block(vec![body, Stmt::expression(increment, token.clone())])
            }
            None => body,
        };

        let mut statements = Vec::with_capacity(2);
        // initialise the variables first
        if let Some(initializer) = initializer {
            statements.push(initializer);
        }
        // after that, it's just normal while loop
        statements.push(Stmt::while_(condition, while_body, token));
        Ok(Stmt::block(statements))
    }

    fn variable_declaration(&mut self) -> StmtResult {
        let kind = match self.previous().kind {
            TokenKind::Const => DeclarationKind::Const,
            TokenKind::Var => DeclarationKind::Var,
            _ => DeclarationKind::Let,
        };
        let name = self
            .consume(TokenKind::Identifier, "Expect variable name.")?
            .clone();
        let ty = self.type_annotation()?;

        if self.peek().kind.is_terminator() {
            self.check_valid_end()?;
            return Ok(Stmt::VariableDeclaration {
                name,
                kind,
                ty,
                init: None,
            });
        }

        let equals = self
            .consume(TokenKind::Equal, "Expect '=' after variable name.")?
            .clone();
        if self.check(TokenKind::NewLine) || self.is_at_end() {
            return Err(Error::parse_error(self.peek(), "Expect expression after '='."));
        }
        let value = self.expression()?;
        self.check_valid_end()?;

        Ok(Stmt::VariableDeclaration {
            name,
            kind,
            ty,
            init: Some(Box::new(Stmt::expression(value, equals))),
        })
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let value = if self.peek().kind.is_terminator() {
            Expr::undefined()
        } else {
            self.expression()?
        };
        self.check_valid_end()?;

        Ok(Stmt::Return {
            value: Box::new(Stmt::expression(value, keyword.clone())),
            keyword,
        })
    }

    // `name[...] = value`, found by looking past the matching ']' without consuming anything
    fn is_index_assignment(&self) -> bool {
        if !(self.check(TokenKind::Identifier) && self.check_next(TokenKind::LeftSquareBrace)) {
            return false;
        }

        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.current + 1..].iter().enumerate() {
            match token.kind {
                TokenKind::LeftSquareBrace => depth += 1,
                TokenKind::RightSquareBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(self.current + 2 + offset)
                            .map_or(false, |next| next.kind == TokenKind::Equal);
                    }
                }
                TokenKind::NewLine | TokenKind::SemiColon | TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    fn index_assignment(&mut self) -> StmtResult {
        let name = self.advance().clone();
        let id = self.next_id();
        self.consume(TokenKind::LeftSquareBrace, "Expect '[' after name.")?;
        let index = self.expression()?;
        self.consume(TokenKind::RightSquareBrace, "Expect ']' after index.")?;
        self.consume(TokenKind::Equal, "Expect '=' after index.")?;
        let value = self.expression()?;
        self.check_valid_end()?;

        Ok(Stmt::IndexAssignment {
            id,
            name,
            index,
            value,
        })
    }

    // Statements end at ';' or a newline, which are consumed, or right before '}' and EOF
    fn check_valid_end(&mut self) -> Result<(), Error> {
        if self.match_either(&[TokenKind::SemiColon, TokenKind::NewLine])
            || self.is_at_end()
            || self.check(TokenKind::RightCurlyBrace)
        {
            Ok(())
        } else {
            Err(Error::parse_error(
                self.peek(),
                "Expect ';', newline or '}' after statement.",
            ))
        }
    }

    // `{` followed by `name:` (newlines allowed in between) opens an object literal.
    // `start` is the position right after the brace.
    fn looks_like_object(&self, start: usize) -> bool {
        let mut rest = self.tokens[start.min(self.tokens.len())..]
            .iter()
            .skip_while(|token| token.kind == TokenKind::NewLine);

        match (rest.next(), rest.next()) {
            (Some(key), Some(colon)) => {
                key.kind == TokenKind::Identifier && colon.kind == TokenKind::Colon
            }
            _ => false,
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.node_count);
        self.node_count += 1;
        id
    }

    fn skip_newlines(&mut self) {
        while self.match_one(TokenKind::NewLine) {}
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().kind == kind
        }
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.current + 1)
            .map_or(false, |token| token.kind == kind)
    }

    fn consume(&mut self, kind: TokenKind, msg: &str) -> Result<&Token, Error> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(Error::parse_error(self.peek(), msg))
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    // A stream without a trailing EOF ends at its last token
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn match_either(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.match_one(*kind) {
                // Already skipped in the `match_one`, just return result
                return true;
            }
        }

        false
    }

    fn match_one(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use astrum_core::{tokenize, Token, TokenKind};
    use pretty_assertions::assert_eq;

    use crate::ast::{DeclarationKind, Expr, LiteralValue, NodeId, Stmt, Type};
    use crate::error::Error;
    use crate::parser::{Parser, Program};

    macro_rules! token {
        ($kind:ident, $lex:literal, $col:literal, $idx:literal) => {
            Token::new(TokenKind::$kind, String::from($lex), 1, $col, $idx, None)
        };
    }

    fn parse(src: &str) -> Result<Program, Error> {
        let tokens = tokenize(src)?;
        Parser::new(&tokens).parse()
    }

    fn parse_expression(src: &str) -> Expr {
        let program = parse(src).unwrap();
        match program.0.into_iter().next() {
            Some(Stmt::Expression { expression, .. }) => expression,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn parse_error(src: &str) -> String {
        parse(src).unwrap_err().message()
    }

    #[test]
    fn test_expressions() {
        let tests = [
            // simple expression
            (
                "3 < 4",
                Expr::binary(
                    Expr::number(3.0),
                    token!(LessThan, "<", 3, 1),
                    Expr::number(4.0),
                ),
            ),
            // multiplication binds tighter than addition
            (
                "1 + 2 * 3",
                Expr::binary(
                    Expr::number(1.0),
                    token!(Plus, "+", 3, 1),
                    Expr::binary(
                        Expr::number(2.0),
                        token!(Asterisk, "*", 7, 3),
                        Expr::number(3.0),
                    ),
                ),
            ),
            // && binds tighter than ==
            (
                "a == 1 && b == 2",
                Expr::binary(
                    Expr::binary(
                        Expr::Identifier {
                            id: NodeId(0),
                            name: token!(Identifier, "a", 1, 0),
                        },
                        token!(EqualEqual, "==", 3, 1),
                        Expr::number(1.0),
                    ),
                    token!(LogicalAnd, "&&", 8, 3),
                    Expr::binary(
                        Expr::Identifier {
                            id: NodeId(1),
                            name: token!(Identifier, "b", 11, 4),
                        },
                        token!(EqualEqual, "==", 13, 5),
                        Expr::number(2.0),
                    ),
                ),
            ),
            // grouping and unary
            (
                "-(1 + 2)",
                Expr::unary(
                    token!(Minus, "-", 1, 0),
                    Expr::grouping(Expr::binary(
                        Expr::number(1.0),
                        token!(Plus, "+", 5, 3),
                        Expr::number(2.0),
                    )),
                ),
            ),
            // assignment is right associative
            (
                "x = y = 3",
                Expr::VariableAssignment {
                    id: NodeId(3),
                    name: token!(Identifier, "x", 1, 0),
                    value: Box::new(Expr::VariableAssignment {
                        id: NodeId(2),
                        name: token!(Identifier, "y", 5, 2),
                        value: Box::new(Expr::number(3.0)),
                    }),
                },
            ),
        ];

        for (src, expected) in tests {
            assert_eq!(parse_expression(src), expected, "{}", src);
        }
    }

    #[test]
    fn test_same_tokens_same_tree() {
        let src = "let f = function(a) { return a + 1 }\nf(2)";
        assert_eq!(parse(src).unwrap(), parse(src).unwrap());
    }

    #[test]
    fn test_statement_terminators() {
        let program = parse("let a = 1; let b = 2\nprint(a)\n\n").unwrap();
        assert_eq!(program.len(), 3);

        let program = parse("{ let a = 1 }").unwrap();
        assert!(matches!(&program.0[0], Stmt::Block { statements } if statements.len() == 1));
    }

    #[test]
    fn test_variable_declarations() {
        let program = parse("const a: number = 1\nvar b\nlet c").unwrap();
        let kinds: Vec<_> = program
            .0
            .iter()
            .map(|stmt| match stmt {
                Stmt::VariableDeclaration { kind, init, .. } => (*kind, init.is_some()),
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                (DeclarationKind::Const, true),
                (DeclarationKind::Var, false),
                (DeclarationKind::Let, false),
            ]
        );
    }

    #[test]
    fn test_for_desugars_into_while() {
        let program = parse("for (let i = 0; i < 3; i = i + 1) { print(i) }").unwrap();
        let Stmt::Block { statements } = &program.0[0] else {
            panic!("for loop should become a block");
        };

        assert!(matches!(statements[0], Stmt::VariableDeclaration { .. }));
        let Stmt::While { body, .. } = &statements[1] else {
            panic!("expected while loop");
        };
        let Stmt::Block { statements: body } = body.as_ref() else {
            panic!("expected loop body block");
        };
        assert!(matches!(body[0], Stmt::Block { .. }));
        assert!(matches!(body[1], Stmt::Expression { .. }));
    }

    #[test]
    fn test_for_without_clauses() {
        let program = parse("for (;;) { }").unwrap();
        let Stmt::Block { statements } = &program.0[0] else {
            panic!("for loop should become a block");
        };
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            &statements[0],
            Stmt::While {
                condition: Expr::Literal {
                    value: LiteralValue::Bool(true),
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_else_if_chain() {
        let program = parse("if (a) { 1 }\nelse if (b) { 2 } else { 3 }\nprint(4)").unwrap();
        assert_eq!(program.len(), 2);

        let Stmt::If { else_branch, .. } = &program.0[0] else {
            panic!("expected if statement");
        };
        let Some(nested) = else_branch.as_deref() else {
            panic!("expected else branch");
        };
        assert!(matches!(nested, Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn test_object_literal_or_block() {
        let program = parse("{ a: 1, b: \"two\" }").unwrap();
        let Stmt::Expression {
            expression: Expr::ObjectLiteral { properties, .. },
            ..
        } = &program.0[0]
        else {
            panic!("expected object literal");
        };
        let keys: Vec<_> = properties.iter().map(|(key, _)| key.lexeme.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let program = parse("{}").unwrap();
        assert_eq!(program.0, vec![Stmt::Object { properties: vec![] }]);
    }

    #[test]
    fn test_duplicate_object_keys_keep_last_value() {
        let Expr::ObjectLiteral { properties, .. } = parse_expression("{ a: 1, b: 2, a: 3 }") else {
            panic!("expected object literal");
        };
        let keys: Vec<_> = properties.iter().map(|(key, _)| key.lexeme.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(properties[0].1, Expr::number(3.0));
    }

    #[test]
    fn test_index_assignment() {
        let program = parse("xs[i + 1] = 2\nxs[0] == 1").unwrap();
        assert!(matches!(program.0[0], Stmt::IndexAssignment { .. }));
        assert!(matches!(
            &program.0[1],
            Stmt::Expression {
                expression: Expr::Binary { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_compound_assignment() {
        let expr = parse_expression("x += 2");
        let Expr::VariableAssignment { name, value, .. } = expr else {
            panic!("expected assignment");
        };
        assert_eq!(name.lexeme, "x");
        assert!(
            matches!(value.as_ref(), Expr::Binary { operator, .. } if operator.kind == TokenKind::Plus)
        );

        let expr = parse_expression("i++");
        assert!(matches!(expr, Expr::VariableAssignment { .. }));
    }

    #[test]
    fn test_class_declaration() {
        let src = "class Counter {\n  count: number = 0\n  constructor(start) { this.count = start }\n  get() { return this.count }\n}";
        let program = parse(src).unwrap();
        let Stmt::Class(class) = &program.0[0] else {
            panic!("expected class");
        };

        assert_eq!(class.name.lexeme, "Counter");
        assert_eq!(class.fields.len(), 1);
        let names: Vec<_> = class.methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(names, vec!["constructor", "get"]);
    }

    #[test]
    fn test_type_annotations() {
        let program =
            parse("let f: (a: number) => string | null = g\nfunction h(x: number[], y: Map<string, any>): void {}")
                .unwrap();

        let Stmt::VariableDeclaration { ty, .. } = &program.0[0] else {
            panic!("expected declaration");
        };
        assert!(matches!(ty, Some(Type::Function { .. })));

        let Stmt::Function(function) = &program.0[1] else {
            panic!("expected function");
        };
        assert!(matches!(function.params[0].ty, Some(Type::Array(_))));
        assert!(matches!(function.params[1].ty, Some(Type::Generic { .. })));
        assert_eq!(
            function.params[1].right_token.as_ref().map(|t| t.kind),
            Some(TokenKind::GreaterThan)
        );
    }

    #[test]
    fn test_anonymous_function() {
        let expr = parse_expression("(function(a, b) { return a + b })(1, 2)");
        let Expr::FunctionCall { callee, args, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(
            callee.as_ref(),
            Expr::Grouping { expression } if matches!(expression.as_ref(), Expr::AnonymousFunction { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        let too_many_args = format!("f({})", vec!["1"; 256].join(", "));
        let tests = [
            ("1 = 2", "Invalid assignment target."),
            ("let = 3", "Expect variable name."),
            ("let x = 1 let y = 2", "Expect ';', newline or '}' after statement."),
            ("let x =\n1", "Expect expression after '='."),
            ("(1 + 2", "Expect ')' after expression."),
            ("if (x) { 1 ", "Expect '}' after block."),
            ("xs[1", "Expect ']' after index."),
            (too_many_args.as_str(), "Can't have more than 255 arguments."),
        ];

        for (src, expected) in tests {
            assert_eq!(parse_error(src), expected, "{}", src);
        }
    }
}
