//! Recursive descent over the grammar below (whitespace and comments are
//! already gone). One function per nonterminal, no backtracking.
//!
//! ```text
//! program        → declaration* EOF
//! declaration    → varDecl | fnDecl | statement
//! varDecl        → "var" IDENT ( "=" expression )? ";"
//! fnDecl         → "fn" IDENT "(" params? ")" "{" declaration* "}"
//! params         → IDENT ( "," IDENT )*
//! statement      → ifStmt | block | printStmt | whileStmt
//!                  | forStmt | returnStmt | exprStmt
//! block          → "{" declaration* "}"
//! ifStmt         → "si" "(" expression ")" statement ( "nope" statement )?
//! whileStmt      → "mientras" "(" expression ")" statement
//! forStmt        → "por" "(" (varDecl | exprStmt | ";") expression? ";" expression? ")" statement
//! printStmt      → "servir" expression ";"
//! returnStmt     → "sazonar" expression? ";"
//! exprStmt       → expression ";"
//! expression     → assignment
//! assignment     → IDENT "=" assignment | logic_or
//! logic_or       → logic_and ( "o" logic_and )*
//! logic_and      → equality ( "y" equality )*
//! equality       → comparison ( ("!="|"==") comparison )*
//! comparison     → addition ( ("<"|"<="|">"|">=") addition )*
//! addition       → multiplication ( ("+"|"-") multiplication )*
//! multiplication → exponentiation ( ("*"|"/"|"%") exponentiation )*
//! exponentiation → unary ( "^" unary )*
//! unary          → ("!"|"-") unary | call
//! call           → primary ( "(" args? ")" )*
//! args           → expression ( "," expression )*
//! primary        → "verdadero" | "falso" | "nulo"
//!                  | NUMBER | STRING | IDENT
//!                  | "(" expression ")"
//! ```

use std::collections::VecDeque;
use std::rc::Rc;

use crate::{
    error,
    expr::Expr,
    stmt::Stmt,
    token::{Literal, Token},
    token_type::TokenType,
};

pub struct Parser {
    tokens: VecDeque<Token>,
}

#[derive(Debug)]
struct ParseError;

fn error<T>(token: &Token, message: &str) -> Result<T, ParseError> {
    error::error_token(token, message);
    Err(ParseError)
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens: VecDeque::from(tokens),
        }
    }

    pub fn parse(mut self) -> Option<Vec<Stmt>> {
        let mut statements = vec![];
        let mut has_errored = false;

        while !self.is_at_end() {
            match self.declaration() {
                Some(stmt) => {
                    statements.push(stmt);
                }
                None => {
                    // A declaration failed to parse; the statement list is
                    // no longer trustworthy.
                    has_errored = true;
                }
            };
        }

        match has_errored {
            true => None,
            false => Some(statements),
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        match self.declaration_impl() {
            Ok(val) => Some(val),
            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn declaration_impl(&mut self) -> Result<Stmt, ParseError> {
        if self.match_token(TokenType::Var).is_some() {
            return self.var_declaration();
        }
        if self.match_token(TokenType::Fn).is_some() {
            return self.function_declaration();
        }
        self.statement()
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenType::Identifier, "Se esperaba un nombre de variable.")?;

        let mut initializer = None;
        if self.match_token(TokenType::Equal).is_some() {
            initializer = Some(self.expression()?);
        }

        self.consume(
            TokenType::Semicolon,
            "Se esperaba ';' después de la declaración de variable.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn function_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenType::Identifier, "Se esperaba un nombre de función.")?;

        self.consume(
            TokenType::LeftParen,
            "Se esperaba '(' después del nombre de función.",
        )?;

        let mut params = vec![];
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(self.consume(
                    TokenType::Identifier,
                    "Se esperaba un nombre de parámetro.",
                )?);

                if self.match_token(TokenType::Comma).is_none() {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RightParen,
            "Se esperaba ')' después de los parámetros.",
        )?;
        self.consume(
            TokenType::LeftBrace,
            "Se esperaba '{' antes del cuerpo de la función.",
        )?;

        let body = self.block_statements()?;

        Ok(Stmt::Function {
            name,
            params,
            body: Rc::new(body),
        })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_token(TokenType::If).is_some() {
            return self.if_statement();
        }
        if self.match_token(TokenType::While).is_some() {
            return self.while_statement();
        }
        if self.match_token(TokenType::For).is_some() {
            return self.for_statement();
        }
        if self.match_token(TokenType::Print).is_some() {
            return self.print_statement();
        }
        if self.match_token(TokenType::Return).is_some() {
            return self.return_statement();
        }
        if self.match_token(TokenType::LeftBrace).is_some() {
            return Ok(Stmt::Block {
                statements: self.block_statements()?,
            });
        }
        self.expression_statement()
    }

    fn block_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![];

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RightBrace, "Se esperaba '}' después del bloque.")?;

        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenType::LeftParen, "Se esperaba '(' después de 'si'.")?;
        let condition = self.expression()?;
        self.consume(
            TokenType::RightParen,
            "Se esperaba ')' después de la condición.",
        )?;

        let then_branch = Box::new(self.statement()?);
        let mut else_branch = None;
        if self.match_token(TokenType::Else).is_some() {
            else_branch = Some(Box::new(self.statement()?));
        }

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenType::LeftParen, "Se esperaba '(' después de 'mientras'.")?;
        let condition = self.expression()?;
        self.consume(
            TokenType::RightParen,
            "Se esperaba ')' después de la condición.",
        )?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// `por` has no node of its own: it is rewritten here into the
    /// equivalent block/while shape.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(TokenType::LeftParen, "Se esperaba '(' después de 'por'.")?;

        let initializer = if self.match_token(TokenType::Semicolon).is_some() {
            None
        } else if self.match_token(TokenType::Var).is_some() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenType::Semicolon,
            "Se esperaba ';' después de la condición del ciclo.",
        )?;

        let increment = if !self.check(TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenType::RightParen,
            "Se esperaba ')' después de las cláusulas del ciclo.",
        )?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expr: increment }],
            };
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: Literal::Boolean(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block {
                statements: vec![initializer, body],
            };
        }

        Ok(body)
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Se esperaba ';' después del valor.")?;
        Ok(Stmt::Print { expr: value })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let mut value = None;
        if !self.check(TokenType::Semicolon) {
            value = Some(self.expression()?);
        }

        self.consume(TokenType::Semicolon, "Se esperaba ';' después de 'sazonar'.")?;

        Ok(Stmt::Return { value })
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Se esperaba ';' después de la expresión.")?;
        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or_expression()?;

        if let Some(equals) = self.match_token(TokenType::Equal) {
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name } => {
                    return Ok(Expr::Assign {
                        name,
                        value: Box::new(value),
                    })
                }
                _ => {
                    // Report at the '=' and keep going with what we have;
                    // the surrounding declaration is still parseable.
                    error::error_token(&equals, "Objetivo de asignación inválido.");
                }
            }
        }

        Ok(expr)
    }

    fn or_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_expression()?;

        while let Some(operator) = self.match_token(TokenType::Or) {
            let right = self.and_expression()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;

        while let Some(operator) = self.match_token(TokenType::And) {
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;

        while let Some(operator) =
            self.match_tokens(vec![TokenType::BangEqual, TokenType::EqualEqual])
        {
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;

        while let Some(operator) = self.match_tokens(vec![
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.match_tokens(vec![TokenType::Minus, TokenType::Plus]) {
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.exponent()?;

        while let Some(operator) = self.match_tokens(vec![
            TokenType::Slash,
            TokenType::Star,
            TokenType::Percent,
        ]) {
            let right = self.exponent()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    /// Exponentiation associates to the left: `2 ^ 3 ^ 2` is `(2 ^ 3) ^ 2`.
    fn exponent(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;

        while let Some(operator) = self.match_token(TokenType::Caret) {
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(operator) = self.match_tokens(vec![TokenType::Bang, TokenType::Minus]) {
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        while self.match_token(TokenType::LeftParen).is_some() {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = vec![];

        if !self.check(TokenType::RightParen) {
            loop {
                arguments.push(self.expression()?);

                if self.match_token(TokenType::Comma).is_none() {
                    break;
                }
            }
        }

        let closing_paren = self.consume(
            TokenType::RightParen,
            "Se esperaba ')' después de los argumentos.",
        )?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            closing_paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(TokenType::False).is_some() {
            return Ok(Expr::Literal {
                value: Literal::Boolean(false),
            });
        }
        if self.match_token(TokenType::True).is_some() {
            return Ok(Expr::Literal {
                value: Literal::Boolean(true),
            });
        }
        if self.match_token(TokenType::Nil).is_some() {
            return Ok(Expr::Literal {
                value: Literal::Nil,
            });
        }

        if self.check(TokenType::Number) || self.check(TokenType::String) {
            let token = self.advance();
            let value = token
                .literal
                .expect("los tokens literales llevan su valor decodificado");
            return Ok(Expr::Literal { value });
        }

        if let Some(token) = self.match_token(TokenType::Identifier) {
            return Ok(Expr::Variable { name: token });
        }

        if self.match_token(TokenType::LeftParen).is_some() {
            let expr = self.expression()?;
            self.consume(
                TokenType::RightParen,
                "Se esperaba ')' después de la expresión.",
            )?;

            return Ok(Expr::Grouping {
                expression: Box::new(expr),
            });
        }

        error(self.peek(), "Se esperaba una expresión.")
    }

    // After a parse error, tokens are discarded until a declaration boundary:
    // just past a ';' or just before a statement keyword.
    fn synchronize(&mut self) {
        let mut previous = self.advance();

        while !self.is_at_end() {
            if previous.token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Fn
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => {
                    return;
                }
                _ => {}
            }

            previous = self.advance();
        }
    }

    fn consume(&mut self, t: TokenType, error_msg: &str) -> Result<Token, ParseError> {
        if self.check(t) {
            return Ok(self.advance());
        }

        error(self.peek(), error_msg)?
    }

    fn match_tokens(&mut self, types: Vec<TokenType>) -> Option<Token> {
        for t in types {
            if self.check(t) {
                let token = self.advance();
                return Some(token);
            }
        }

        None
    }

    fn match_token(&mut self, t: TokenType) -> Option<Token> {
        if self.check(t) {
            let token = self.advance();
            return Some(token);
        }

        None
    }

    fn check(&self, t: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == t
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            return self.tokens.pop_front().unwrap();
        }

        // Nothing left to consume but the EOF token.
        self.peek().clone()
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        self.tokens.front().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Lexer::new(source).scan_tokens();
        Parser::new(tokens).parse().expect("el programa debe parsear")
    }

    #[test]
    fn test_multiplication_groups_before_addition() {
        let statements = parse("1 + 2 * 3;");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Binary { left, operator, right } = expr else {
            panic!("se esperaba una expresión binaria");
        };

        assert_eq!(operator.token_type, TokenType::Plus);
        assert!(matches!(**left, Expr::Literal { .. }));
        assert!(matches!(**right, Expr::Binary { .. }));
    }

    #[test]
    fn test_exponent_binds_tighter_than_multiplication() {
        let statements = parse("2 * 3 ^ 4;");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Binary { operator, right, .. } = expr else {
            panic!("se esperaba una expresión binaria");
        };

        assert_eq!(operator.token_type, TokenType::Star);
        let Expr::Binary { operator, .. } = right.as_ref() else {
            panic!("se esperaba '^' a la derecha");
        };
        assert_eq!(operator.token_type, TokenType::Caret);
    }

    #[test]
    fn test_assignment_associates_to_the_right() {
        let statements = parse("a = b = 1;");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Assign { name, value } = expr else {
            panic!("se esperaba una asignación");
        };

        assert_eq!(name.lexeme, "a");
        assert!(matches!(**value, Expr::Assign { .. }));
    }

    #[test]
    fn test_else_binds_to_the_nearest_if() {
        let statements = parse("si (1) si (2) servir 3; nope servir 4;");

        let Stmt::If { then_branch, else_branch, .. } = &statements[0] else {
            panic!("se esperaba un 'si'");
        };

        assert!(else_branch.is_none());
        assert!(matches!(
            **then_branch,
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_for_desugars_to_block_and_while() {
        let statements = parse("por (var i = 0; i < 2; i = i + 1) servir i;");

        let Stmt::Block { statements } = &statements[0] else {
            panic!("se esperaba un bloque");
        };

        assert!(matches!(statements[0], Stmt::Var { .. }));
        let Stmt::While { body, .. } = &statements[1] else {
            panic!("se esperaba un 'mientras'");
        };
        let Stmt::Block { statements } = body.as_ref() else {
            panic!("se esperaba el cuerpo con incremento");
        };
        assert!(matches!(statements[1], Stmt::Expression { .. }));
    }

    #[test]
    fn test_for_without_clauses_is_a_bare_while() {
        let statements = parse("por (;;) servir 1;");

        let Stmt::While { condition, .. } = &statements[0] else {
            panic!("se esperaba un 'mientras'");
        };
        assert!(matches!(
            condition,
            Expr::Literal {
                value: Literal::Boolean(true)
            }
        ));
    }

    #[test]
    fn test_call_arguments_are_collected_in_order() {
        let statements = parse("suma(1, 2, 3);");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Call { arguments, .. } = expr else {
            panic!("se esperaba una llamada");
        };

        assert_eq!(arguments.len(), 3);
    }

    #[test]
    fn test_chained_calls() {
        let statements = parse("f(1)(2);");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Call { callee, .. } = expr else {
            panic!("se esperaba una llamada");
        };
        assert!(matches!(**callee, Expr::Call { .. }));
    }

    #[test]
    fn test_function_declaration_shape() {
        let statements = parse("fn suma(a, b) { sazonar a + b; }");

        let Stmt::Function { name, params, body } = &statements[0] else {
            panic!("se esperaba una declaración de función");
        };

        assert_eq!(name.lexeme, "suma");
        assert_eq!(params.len(), 2);
        assert!(matches!(body[0], Stmt::Return { .. }));
    }

    #[test]
    fn test_var_without_initializer() {
        let statements = parse("var x;");

        let Stmt::Var { initializer, .. } = &statements[0] else {
            panic!("se esperaba una declaración de variable");
        };
        assert!(initializer.is_none());
    }

    #[test]
    fn test_logical_precedence_or_over_and() {
        // a o b y c parses as a o (b y c)
        let statements = parse("a o b y c;");

        let Stmt::Expression { expr } = &statements[0] else {
            panic!("se esperaba una expresión");
        };
        let Expr::Logical { operator, right, .. } = expr else {
            panic!("se esperaba una expresión lógica");
        };

        assert_eq!(operator.token_type, TokenType::Or);
        let Expr::Logical { operator, .. } = right.as_ref() else {
            panic!("se esperaba 'y' a la derecha");
        };
        assert_eq!(operator.token_type, TokenType::And);
    }
}
