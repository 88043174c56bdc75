use std::rc::Rc;

use astrum_core::{Literal, Token, TokenKind};

use super::{ExprResult, Parser, MAX_ARGUMENTS};
use crate::ast::{Expr, FunctionDecl, LiteralValue};
use crate::error::Error;

impl<'a> Parser<'a> {
    pub(super) fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or_expression()?;
        if self.match_one(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            match expr {
                Expr::Identifier { name, .. } => Ok(Expr::VariableAssignment {
                    id: self.next_id(),
                    name,
                    value,
                }),
                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),
                _ => Err(Error::parse_error(&equals, "Invalid assignment target.")),
            }
        } else if self.match_either(&[
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::AsteriskEqual,
            TokenKind::SlashEqual,
        ]) {
            let operator = self.previous().clone();
            let value = self.assignment()?;
            self.compound_assignment(expr, operator, value)
        } else if self.match_either(&[TokenKind::Increment, TokenKind::Decrement]) {
            let operator = self.previous().clone();
            self.compound_assignment(expr, operator, Expr::number(1.0))
        } else {
            Ok(expr)
        }
    }

    // `x op= v`, `x++` and `x--` become `x = x op v`
    fn compound_assignment(&mut self, target: Expr, operator: Token, value: Expr) -> ExprResult {
        let (kind, lexeme) = match operator.kind {
            TokenKind::PlusEqual | TokenKind::Increment => (TokenKind::Plus, "+"),
            TokenKind::MinusEqual | TokenKind::Decrement => (TokenKind::Minus, "-"),
            TokenKind::AsteriskEqual => (TokenKind::Asterisk, "*"),
            _ => (TokenKind::Slash, "/"),
        };
        let binary_operator = Token::synthetic(kind, lexeme, &operator);

        match target {
            Expr::Identifier { id, name } => {
                let current = Expr::Identifier {
                    id,
                    name: name.clone(),
                };
                Ok(Expr::VariableAssignment {
                    id: self.next_id(),
                    name,
                    value: Box::new(Expr::binary(current, binary_operator, value)),
                })
            }
            // the object expression is evaluated twice, once to read and once to write
            Expr::Get { object, name } => {
                let current = Expr::Get {
                    object: object.clone(),
                    name: name.clone(),
                };
                Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(Expr::binary(current, binary_operator, value)),
                })
            }
            _ => Err(Error::parse_error(&operator, "Invalid assignment target.")),
        }
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while self.match_one(TokenKind::LogicalOr) {
            let operator = self.previous().clone();
            let right = self.and_expression()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_one(TokenKind::LogicalAnd) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.match_either(&[TokenKind::NotEqual, TokenKind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.match_either(&[
            TokenKind::GreaterThan,
            TokenKind::GreaterThanOrEqual,
            TokenKind::LessThan,
            TokenKind::LessThanOrEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.match_either(&[TokenKind::Plus, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.match_either(&[TokenKind::Slash, TokenKind::Asterisk]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_either(&[TokenKind::Not, TokenKind::Minus]) {
            let operator = self.previous().clone();
            Ok(Expr::unary(operator, self.unary()?))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        loop {
            if self.match_one(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_one(TokenKind::Dot) {
                let name = self
                    .consume(TokenKind::Identifier, "Expect property name after '.'.")?
                    .clone();
                expr = Expr::get(expr, name);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut args: Vec<Expr> = Vec::new();
        self.skip_newlines();
        if !self.check(TokenKind::RightParen) {
            loop {
                self.skip_newlines();
                if args.len() >= MAX_ARGUMENTS {
                    return Err(Error::parse_error(
                        self.peek(),
                        "Can't have more than 255 arguments.",
                    ));
                }

                args.push(self.expression()?);
                self.skip_newlines();
                if !self.match_one(TokenKind::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::call(callee, paren.clone(), args))
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_either(&[TokenKind::NumberLiteral, TokenKind::FloatLiteral]) {
            let token = self.previous();
            let value = match token.literal {
                Some(Literal::Num(n)) => n,
                _ => return Err(Error::parse_error(token, "Malformed number literal.")),
            };
            Ok(Expr::literal(token.kind, LiteralValue::Num(value)))
        } else if self.match_one(TokenKind::StringLiteral) {
            let token = self.previous();
            let value: Rc<str> = match &token.literal {
                Some(Literal::Str(s)) => Rc::from(s.as_str()),
                _ => Rc::from(""),
            };
            Ok(Expr::literal(TokenKind::StringLiteral, LiteralValue::Str(value)))
        } else if self.match_one(TokenKind::TrueLiteral) {
            Ok(Expr::literal(TokenKind::TrueLiteral, LiteralValue::Bool(true)))
        } else if self.match_one(TokenKind::FalseLiteral) {
            Ok(Expr::literal(TokenKind::FalseLiteral, LiteralValue::Bool(false)))
        } else if self.match_one(TokenKind::NullLiteral) {
            Ok(Expr::literal(TokenKind::NullLiteral, LiteralValue::Null))
        } else if self.match_one(TokenKind::UndefinedLiteral) {
            Ok(Expr::undefined())
        } else if self.match_one(TokenKind::ObjectLiteral) {
            Ok(Expr::literal(TokenKind::ObjectLiteral, LiteralValue::EmptyObject))
        } else if self.match_one(TokenKind::Function) {
            self.anonymous_function()
        } else if self.match_one(TokenKind::This) {
            Ok(Expr::This {
                keyword: self.previous().clone(),
                id: self.next_id(),
            })
        } else if self.match_either(&[TokenKind::Identifier, TokenKind::Print]) {
            // `print` is a keyword, but at runtime it is just a global native
            let name = self.previous().clone();
            let id = self.next_id();
            if self.match_one(TokenKind::LeftSquareBrace) {
                let index = self.expression()?;
                self.consume(TokenKind::RightSquareBrace, "Expect ']' after index.")?;
                Ok(Expr::Index {
                    id,
                    name,
                    index: Box::new(index),
                })
            } else {
                Ok(Expr::Identifier { id, name })
            }
        } else if self.match_one(TokenKind::LeftParen) {
            self.skip_newlines();
            let expr = self.expression()?;
            self.skip_newlines();
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::grouping(expr))
        } else if self.match_one(TokenKind::LeftSquareBrace) {
            self.list_literal()
        } else if self.check(TokenKind::LeftCurlyBrace)
            && (self.looks_like_object(self.current + 1) || self.empty_braces_ahead())
        {
            let brace = self.advance().clone();
            self.object_literal(brace)
        } else {
            Err(Error::parse_error(self.peek(), "Expect expression."))
        }
    }

    fn anonymous_function(&mut self) -> ExprResult {
        let token = self.previous().clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'function'.")?;
        let params = self.parameters()?;
        let return_type = self.type_annotation()?;
        let body = self.block()?;

        Ok(Expr::AnonymousFunction {
            declaration: Rc::new(FunctionDecl {
                name: token.clone(),
                params,
                body,
                return_type,
            }),
            token,
        })
    }

    fn list_literal(&mut self) -> ExprResult {
        let mut elements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RightSquareBrace) && !self.is_at_end() {
            elements.push(self.expression()?);
            self.skip_newlines();
            if !self.match_one(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.consume(TokenKind::RightSquareBrace, "Expect ']' after list elements.")?;

        Ok(Expr::literal(TokenKind::ListLiteral, LiteralValue::List(elements)))
    }

    // Keys keep the position of their first appearance, later values win
    fn object_literal(&mut self, brace: Token) -> ExprResult {
        let mut properties: Vec<(Token, Expr)> = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RightCurlyBrace) && !self.is_at_end() {
            let key = self
                .consume(TokenKind::Identifier, "Expect property name in object literal.")?
                .clone();
            self.consume(TokenKind::Colon, "Expect ':' after property name.")?;
            self.skip_newlines();
            let value = self.expression()?;

            match properties.iter_mut().find(|(k, _)| k.lexeme == key.lexeme) {
                Some(slot) => slot.1 = value,
                None => properties.push((key, value)),
            }

            self.skip_newlines();
            if !self.match_one(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.consume(TokenKind::RightCurlyBrace, "Expect '}' after object literal.")?;

        Ok(Expr::ObjectLiteral { brace, properties })
    }

    // `{` and `}` with only newlines or spaces between them
    fn empty_braces_ahead(&self) -> bool {
        self.tokens
            .iter()
            .skip(self.current + 1)
            .find(|token| token.kind != TokenKind::NewLine)
            .map_or(false, |token| token.kind == TokenKind::RightCurlyBrace)
    }
}
