use std::rc::Rc;

use astrum_core::{Token, TokenKind};

use crate::error::Error;

// Tokens are cloned into the nodes that need them. Cloning only happens while parsing and the
// tree is never copied afterwards, so node ids stay valid for as long as the tree lives.

/// Identity of a node the resolver can annotate with a scope distance. Ids are handed out by the
/// parser in creation order, so the same tokens always produce the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclarationKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LiteralValue {
    Num(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    EmptyObject,
    List(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Grouping {
        expression: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        operand: Box<Expr>,
    },
    Literal {
        kind: TokenKind,
        value: LiteralValue,
    },
    Identifier {
        id: NodeId,
        name: Token,
    },
    This {
        id: NodeId,
        keyword: Token,
    },
    AnonymousFunction {
        token: Token,
        declaration: Rc<FunctionDecl>,
    },
    FunctionCall {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Index {
        id: NodeId,
        name: Token,
        index: Box<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    ObjectLiteral {
        brace: Token,
        properties: Vec<(Token, Expr)>,
    },
    VariableAssignment {
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },
}

pub(crate) trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, Error> {
        match expr {
            Expr::Grouping { expression } => self.visit_grouping(expression),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.visit_binary(left, operator, right),
            Expr::Unary { operator, operand } => self.visit_unary(operator, operand),
            Expr::Literal { kind, value } => self.visit_literal(*kind, value),
            Expr::Identifier { id, name } => self.visit_identifier(*id, name),
            Expr::This { id, keyword } => self.visit_this(*id, keyword),
            Expr::AnonymousFunction { token, declaration } => {
                self.visit_anonymous_function(token, declaration)
            }
            Expr::FunctionCall {
                callee,
                paren,
                args,
            } => self.visit_call(callee, paren, args),
            Expr::Index { id, name, index } => self.visit_index(*id, name, index),
            Expr::Get { object, name } => self.visit_get(object, name),
            Expr::Set {
                object,
                name,
                value,
            } => self.visit_set(object, name, value),
            Expr::ObjectLiteral { brace, properties } => {
                self.visit_object_literal(brace, properties)
            }
            Expr::VariableAssignment { id, name, value } => {
                self.visit_variable_assignment(*id, name, value)
            }
        }
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_unary(&mut self, operator: &Token, operand: &Expr) -> Result<Self::Item, Error>;
    fn visit_literal(
        &mut self,
        kind: TokenKind,
        value: &LiteralValue,
    ) -> Result<Self::Item, Error>;
    fn visit_identifier(&mut self, id: NodeId, name: &Token) -> Result<Self::Item, Error>;
    fn visit_this(&mut self, id: NodeId, keyword: &Token) -> Result<Self::Item, Error>;
    fn visit_anonymous_function(
        &mut self,
        token: &Token,
        declaration: &Rc<FunctionDecl>,
    ) -> Result<Self::Item, Error>;
    fn visit_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        args: &[Expr],
    ) -> Result<Self::Item, Error>;
    fn visit_index(
        &mut self,
        id: NodeId,
        name: &Token,
        index: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_get(&mut self, object: &Expr, name: &Token) -> Result<Self::Item, Error>;
    fn visit_set(
        &mut self,
        object: &Expr,
        name: &Token,
        value: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_object_literal(
        &mut self,
        brace: &Token,
        properties: &[(Token, Expr)],
    ) -> Result<Self::Item, Error>;
    fn visit_variable_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        value: &Expr,
    ) -> Result<Self::Item, Error>;
}

impl Expr {
    pub(crate) fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(operator: Token, operand: Expr) -> Self {
        Expr::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub(crate) fn grouping(expression: Expr) -> Self {
        Expr::Grouping {
            expression: Box::new(expression),
        }
    }

    pub(crate) fn literal(kind: TokenKind, value: LiteralValue) -> Self {
        Expr::Literal { kind, value }
    }

    pub(crate) fn number(value: f64) -> Self {
        Expr::literal(TokenKind::NumberLiteral, LiteralValue::Num(value))
    }

    pub(crate) fn undefined() -> Self {
        Expr::literal(TokenKind::UndefinedLiteral, LiteralValue::Undefined)
    }

    pub(crate) fn call(callee: Expr, paren: Token, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            callee: Box::new(callee),
            paren,
            args,
        }
    }

    pub(crate) fn get(object: Expr, name: Token) -> Self {
        Expr::Get {
            object: Box::new(object),
            name,
        }
    }
}

/// Type annotations are parsed and carried along, but nothing checks them.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Type {
    // `number`, `string`, `null`, `"literal"`, or a user name like `Node`
    Named { name: String, kind: TokenKind },
    // (x: number, y: number) => number
    Function {
        params: Vec<Parameter>,
        ret: Box<Type>,
    },
    // boolean | null
    Union(Vec<Type>),
    // A & B
    Intersection(Vec<Type>),
    // number[]
    Array(Box<Type>),
    // [boolean, number[]]
    Tuple(Vec<Type>),
    // { x: boolean, y: boolean }
    Object(Vec<(String, Type)>),
    // Map<string, number>
    Generic { name: String, args: Vec<Type> },
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameter {
    pub(crate) name: String,
    pub(crate) ty: Option<Type>,
    pub(crate) left_token: Token,
    // last token of the annotation, if there is one
    pub(crate) right_token: Option<Token>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FunctionDecl {
    pub(crate) name: Token,
    pub(crate) params: Vec<Parameter>,
    pub(crate) body: Vec<Stmt>,
    pub(crate) return_type: Option<Type>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldDecl {
    pub(crate) name: Token,
    pub(crate) ty: Option<Type>,
    pub(crate) init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClassDecl {
    pub(crate) name: Token,
    pub(crate) methods: Vec<Rc<FunctionDecl>>,
    pub(crate) fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Empty,
    Block {
        statements: Vec<Stmt>,
    },
    Expression {
        expression: Expr,
        token: Token,
    },
    VariableDeclaration {
        name: Token,
        kind: DeclarationKind,
        ty: Option<Type>,
        init: Option<Box<Stmt>>,
    },
    IndexAssignment {
        id: NodeId,
        name: Token,
        index: Expr,
        value: Expr,
    },
    Function(Rc<FunctionDecl>),
    If {
        keyword: Token,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        token: Token,
    },
    Return {
        keyword: Token,
        value: Box<Stmt>,
    },
    // only ever the empty `{}` in statement position
    Object {
        properties: Vec<(Token, Stmt)>,
    },
    Class(Rc<ClassDecl>),
}

pub(crate) trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, Error> {
        match stmt {
            Stmt::Empty => self.visit_empty(),
            Stmt::Block { statements } => self.visit_block(statements),
            Stmt::Expression { expression, token } => self.visit_expression(expression, token),
            Stmt::VariableDeclaration {
                name,
                kind,
                ty,
                init,
            } => self.visit_variable_declaration(name, *kind, ty.as_ref(), init.as_deref()),
            Stmt::IndexAssignment {
                id,
                name,
                index,
                value,
            } => self.visit_index_assignment(*id, name, index, value),
            Stmt::Function(declaration) => self.visit_function(declaration),
            Stmt::If {
                keyword,
                condition,
                then_branch,
                else_branch,
            } => self.visit_if(keyword, condition, then_branch, else_branch.as_deref()),
            Stmt::While {
                condition,
                body,
                token,
            } => self.visit_while(condition, body, token),
            Stmt::Return { keyword, value } => self.visit_return(keyword, value),
            Stmt::Object { properties } => self.visit_object(properties),
            Stmt::Class(declaration) => self.visit_class(declaration),
        }
    }

    fn visit_empty(&mut self) -> Result<Self::Item, Error>;
    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Self::Item, Error>;
    fn visit_expression(
        &mut self,
        expression: &Expr,
        token: &Token,
    ) -> Result<Self::Item, Error>;
    fn visit_variable_declaration(
        &mut self,
        name: &Token,
        kind: DeclarationKind,
        ty: Option<&Type>,
        init: Option<&Stmt>,
    ) -> Result<Self::Item, Error>;
    fn visit_index_assignment(
        &mut self,
        id: NodeId,
        name: &Token,
        index: &Expr,
        value: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_function(&mut self, declaration: &Rc<FunctionDecl>) -> Result<Self::Item, Error>;
    fn visit_if(
        &mut self,
        keyword: &Token,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<Self::Item, Error>;
    fn visit_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        token: &Token,
    ) -> Result<Self::Item, Error>;
    fn visit_return(&mut self, keyword: &Token, value: &Stmt) -> Result<Self::Item, Error>;
    fn visit_object(&mut self, properties: &[(Token, Stmt)]) -> Result<Self::Item, Error>;
    fn visit_class(&mut self, declaration: &Rc<ClassDecl>) -> Result<Self::Item, Error>;
}

impl Stmt {
    pub(crate) fn block(statements: Vec<Stmt>) -> Self {
        Stmt::Block { statements }
    }

    pub(crate) fn expression(expression: Expr, token: Token) -> Self {
        Stmt::Expression { expression, token }
    }

    pub(crate) fn while_(condition: Expr, body: Stmt, token: Token) -> Self {
        Stmt::While {
            condition,
            body: Box::new(body),
            token,
        }
    }
}
