use crate::{
    error,
    token::{Literal, Token},
    token_type::TokenType,
};

/// Single-pass scanner. Characters are read as Unicode scalar values but
/// classified by ASCII ranges only, so accented text is legal inside string
/// literals and comments without ever forming an identifier.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens
            .push(Token::new(TokenType::Eof, String::from("~EOF~"), self.line));

        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            ';' => self.add_token(TokenType::Semicolon),
            ',' => self.add_token(TokenType::Comma),
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '+' => self.add_token(TokenType::Plus),
            '-' => self.add_token(TokenType::Minus),
            '*' => self.add_token(TokenType::Star),
            '%' => self.add_token(TokenType::Percent),
            '^' => self.add_token(TokenType::Caret),

            '!' => {
                if self.matches('=') {
                    self.add_token(TokenType::BangEqual)
                } else {
                    self.add_token(TokenType::Bang)
                }
            }
            '=' => {
                if self.matches('=') {
                    self.add_token(TokenType::EqualEqual)
                } else {
                    self.add_token(TokenType::Equal)
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add_token(TokenType::LessEqual)
                } else {
                    self.add_token(TokenType::Less)
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add_token(TokenType::GreaterEqual)
                } else {
                    self.add_token(TokenType::Greater)
                }
            }
            '/' => {
                if self.matches('/') {
                    // Comment runs to the end of the line. The newline itself
                    // is left for the whitespace arm so the line counter
                    // advances in exactly one place.
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(),

            '0'..='9' => self.number(),

            c if c.is_ident_start() => self.identifier(),

            c => {
                error::syntax_error(self.line, &format!("Caracter desconocido: {}", c));
            }
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_ident_part() {
            self.advance();
        }

        let text = self.lexeme();

        match keyword(&text) {
            Some(token_type) => self.add_token(token_type),
            None => self.add_token(TokenType::Identifier),
        };
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A trailing '.' without a following digit is not part of the number.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme = self.lexeme();
        let value: f64 = lexeme.parse().unwrap();
        self.tokens.push(Token::with_literal(
            TokenType::Number,
            lexeme,
            Literal::Number(value),
            self.line,
        ));
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            error::unexpected_eof(
                self.line,
                "Se esperaba terminar una cadena, pero el archivo se acabó.",
            );
            return;
        }

        // The closing quote.
        self.advance();

        let value: String = self.chars[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.tokens.push(Token::with_literal(
            TokenType::String,
            self.lexeme(),
            Literal::String(value),
            self.line,
        ));
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        if self.chars[self.current] != expected {
            return false;
        }

        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }

        self.chars[self.current]
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.chars.len() {
            return '\0';
        }

        self.chars[self.current + 1]
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.lexeme();
        self.tokens.push(Token::new(token_type, text, self.line));
    }
}

fn keyword(text: &str) -> Option<TokenType> {
    match text {
        "nulo" => Some(TokenType::Nil),
        "var" => Some(TokenType::Var),
        "verdadero" => Some(TokenType::True),
        "falso" => Some(TokenType::False),
        "si" => Some(TokenType::If),
        "nope" => Some(TokenType::Else),
        "fn" => Some(TokenType::Fn),
        "por" => Some(TokenType::For),
        "mientras" => Some(TokenType::While),
        "sazonar" => Some(TokenType::Return),
        "servir" => Some(TokenType::Print),
        "y" => Some(TokenType::And),
        "o" => Some(TokenType::Or),
        _ => None,
    }
}

trait IdentStart {
    fn is_ident_start(&self) -> bool;
}

trait IdentPart {
    fn is_ident_part(&self) -> bool;
}

impl IdentStart for char {
    fn is_ident_start(&self) -> bool {
        self.is_ascii_alphabetic() || *self == '_'
    }
}

impl IdentPart for char {
    fn is_ident_part(&self) -> bool {
        self.is_ascii_alphanumeric() || *self == '_'
    }
}
