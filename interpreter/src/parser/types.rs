use astrum_core::TokenKind;

use super::Parser;
use crate::ast::Type;
use crate::error::Error;

type TypeResult = Result<Type, Error>;

// Annotations are accepted and kept on the tree, the evaluator ignores them
impl<'a> Parser<'a> {
    /// `: T` if the next token is a colon.
    pub(super) fn type_annotation(&mut self) -> Result<Option<Type>, Error> {
        if self.match_one(TokenKind::Colon) {
            Ok(Some(self.union_type()?))
        } else {
            Ok(None)
        }
    }

    fn union_type(&mut self) -> TypeResult {
        let first = self.intersection_type()?;
        if !self.check(TokenKind::Pipe) {
            return Ok(first);
        }

        let mut members = vec![first];
        while self.match_one(TokenKind::Pipe) {
            members.push(self.intersection_type()?);
        }
        Ok(Type::Union(members))
    }

    fn intersection_type(&mut self) -> TypeResult {
        let first = self.array_type()?;
        if !self.check(TokenKind::And) {
            return Ok(first);
        }

        let mut members = vec![first];
        while self.match_one(TokenKind::And) {
            members.push(self.array_type()?);
        }
        Ok(Type::Intersection(members))
    }

    fn array_type(&mut self) -> TypeResult {
        let mut ty = self.primary_type()?;
        while self.check(TokenKind::LeftSquareBrace) && self.check_next(TokenKind::RightSquareBrace) {
            self.advance();
            self.advance();
            ty = Type::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn primary_type(&mut self) -> TypeResult {
        if self.match_either(&[
            TokenKind::StringType,
            TokenKind::NumberType,
            TokenKind::BooleanType,
            TokenKind::VoidType,
            TokenKind::AnyType,
            TokenKind::NeverType,
            TokenKind::NullLiteral,
            TokenKind::UndefinedLiteral,
            TokenKind::StringLiteral,
            TokenKind::NumberLiteral,
            TokenKind::FloatLiteral,
            TokenKind::TrueLiteral,
            TokenKind::FalseLiteral,
        ]) {
            let token = self.previous();
            Ok(Type::Named {
                name: token.lexeme.clone(),
                kind: token.kind,
            })
        } else if self.match_one(TokenKind::Identifier) {
            let name = self.previous().lexeme.clone();
            if !self.match_one(TokenKind::LessThan) {
                return Ok(Type::Named {
                    name,
                    kind: TokenKind::Identifier,
                });
            }

            let mut args = vec![self.union_type()?];
            while self.match_one(TokenKind::Comma) {
                args.push(self.union_type()?);
            }
            self.consume(TokenKind::GreaterThan, "Expect '>' after type arguments.")?;
            Ok(Type::Generic { name, args })
        } else if self.match_one(TokenKind::LeftParen) {
            let params = self.parameters()?;
            self.consume(TokenKind::Arrow, "Expect '=>' after function type parameters.")?;
            let ret = self.union_type()?;
            Ok(Type::Function {
                params,
                ret: Box::new(ret),
            })
        } else if self.match_one(TokenKind::LeftSquareBrace) {
            let mut elements = Vec::new();
            while !self.check(TokenKind::RightSquareBrace) && !self.is_at_end() {
                elements.push(self.union_type()?);
                if !self.match_one(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RightSquareBrace, "Expect ']' after tuple type.")?;
            Ok(Type::Tuple(elements))
        } else if self.match_one(TokenKind::ObjectLiteral) {
            Ok(Type::Object(Vec::new()))
        } else if self.match_one(TokenKind::LeftCurlyBrace) {
            self.object_type()
        } else {
            Err(Error::parse_error(self.peek(), "Expect type."))
        }
    }

    // { x: number, y: string; z: boolean }
    fn object_type(&mut self) -> TypeResult {
        let mut properties = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::RightCurlyBrace) && !self.is_at_end() {
            let name = self
                .consume(TokenKind::Identifier, "Expect property name in object type.")?
                .lexeme
                .clone();
            self.consume(TokenKind::Colon, "Expect ':' after property name.")?;
            properties.push((name, self.union_type()?));

            self.match_either(&[TokenKind::Comma, TokenKind::SemiColon]);
            self.skip_newlines();
        }
        self.consume(TokenKind::RightCurlyBrace, "Expect '}' after object type.")?;
        Ok(Type::Object(properties))
    }
}

#[cfg(test)]
mod tests {
    use astrum_core::{tokenize, TokenKind};
    use pretty_assertions::assert_eq;

    use crate::ast::{Stmt, Type};
    use crate::parser::Parser;

    fn declared_type(src: &str) -> Option<Type> {
        let tokens = tokenize(src).unwrap();
        let program = Parser::new(&tokens).parse().unwrap();
        match program.0.into_iter().next() {
            Some(Stmt::VariableDeclaration { ty, .. }) => ty,
            other => panic!("expected a declaration, got {:?}", other),
        }
    }

    fn named(name: &str, kind: TokenKind) -> Type {
        Type::Named {
            name: String::from(name),
            kind,
        }
    }

    #[test]
    fn test_union_and_array() {
        assert_eq!(
            declared_type("let a: number[] | null"),
            Some(Type::Union(vec![
                Type::Array(Box::new(named("number", TokenKind::NumberType))),
                named("null", TokenKind::NullLiteral),
            ]))
        );
    }

    #[test]
    fn test_tuple_and_object() {
        assert_eq!(
            declared_type("let p: [boolean, string]"),
            Some(Type::Tuple(vec![
                named("boolean", TokenKind::BooleanType),
                named("string", TokenKind::StringType),
            ]))
        );

        assert_eq!(
            declared_type("let o: { x: number, y: Node }"),
            Some(Type::Object(vec![
                (String::from("x"), named("number", TokenKind::NumberType)),
                (String::from("y"), named("Node", TokenKind::Identifier)),
            ]))
        );
    }

    #[test]
    fn test_intersection_and_generic() {
        assert_eq!(
            declared_type("let x: A & Box<string>"),
            Some(Type::Intersection(vec![
                named("A", TokenKind::Identifier),
                Type::Generic {
                    name: String::from("Box"),
                    args: vec![named("string", TokenKind::StringType)],
                },
            ]))
        );
    }

    #[test]
    fn test_missing_type() {
        let tokens = tokenize("let x: = 1").unwrap();
        let err = Parser::new(&tokens).parse().unwrap_err();
        assert_eq!(err.message(), "Expect type.");
    }
}
