//! Byte-level scanner for Fireball source text.
//!
//! The scanner is a finite-state consumer over a UTF-8 byte string:
//! keywords and identifiers are ASCII, so classification works on bytes.
//! [`Scanner::next`] skips whitespace and comments, then classifies one
//! token and returns it. After the end of input it returns [`TokenKind::Eof`]
//! forever.
//!
//! Failures never abort the scan: an unterminated string, an empty or
//! malformed character literal, or an unknown character produce a token of
//! kind [`TokenKind::Error`] whose lexeme carries the message, and scanning
//! continues at the next byte.
//!
//! | Input | Token |
//! |-------|-------|
//! | `42`, `3.5`, `1.5f`, `-7` | `Number` |
//! | `0xFF` | `Hex` |
//! | `0b101` | `Binary` |
//! | `'a'`, `'\n'` | `Character` |
//! | `"text"` | `String` (no escape processing) |
//! | `<<=` `>>=` `+=` `==` `=>` … | operator kinds via lookahead |
//! | `func` `struct` `enum` … | keyword kinds |

use crate::token::{Token, TokenKind};
use fireball_base::Interner;

/// Scans one token at a time out of a source buffer.
pub struct Scanner<'s> {
    text: &'s str,
    bytes: &'s [u8],
    interner: &'s mut Interner,

    start: usize,
    current: usize,

    line: u32,
    line_start: usize,

    token_line: u32,
    token_column: u32,
}

impl<'s> Scanner<'s> {
    pub fn new(text: &'s str, interner: &'s mut Interner) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            interner,
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            token_line: 1,
            token_column: 0,
        }
    }

    /// Scans and returns the next token.
    pub fn next(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.current;
        self.token_line = self.line;
        self.token_column = (self.start - self.line_start) as u32;

        if self.is_at_end() {
            return self.make(TokenKind::Eof);
        }

        let c = self.advance();

        if is_alpha(c) {
            return self.identifier();
        }
        if is_digit(c) || (c == b'-' && is_digit(self.peek())) {
            return self.number(c);
        }

        match c {
            b'(' => self.make(TokenKind::LeftParen),
            b')' => self.make(TokenKind::RightParen),
            b'{' => self.make(TokenKind::LeftBrace),
            b'}' => self.make(TokenKind::RightBrace),
            b'[' => self.make(TokenKind::LeftBracket),
            b']' => self.make(TokenKind::RightBracket),

            b'.' => self.make(TokenKind::Dot),
            b',' => self.make(TokenKind::Comma),
            b':' => self.make(TokenKind::Colon),
            b';' => self.make(TokenKind::Semicolon),

            b'+' => {
                if self.match_char(b'+') {
                    self.make(TokenKind::PlusPlus)
                } else {
                    self.match_token(b'=', TokenKind::PlusEqual, TokenKind::Plus)
                }
            }
            b'-' => {
                if self.match_char(b'-') {
                    self.make(TokenKind::MinusMinus)
                } else {
                    self.match_token(b'=', TokenKind::MinusEqual, TokenKind::Minus)
                }
            }
            b'*' => self.match_token(b'=', TokenKind::StarEqual, TokenKind::Star),
            b'/' => self.match_token(b'=', TokenKind::SlashEqual, TokenKind::Slash),
            b'%' => self.match_token(b'=', TokenKind::PercentageEqual, TokenKind::Percentage),

            b'=' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::EqualEqual)
                } else {
                    self.match_token(b'>', TokenKind::FuncPtr, TokenKind::Equal)
                }
            }
            b'!' => self.match_token(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'<' => {
                if self.match_char(b'<') {
                    self.match_token(b'=', TokenKind::LessLessEqual, TokenKind::LessLess)
                } else {
                    self.match_token(b'=', TokenKind::LessEqual, TokenKind::Less)
                }
            }
            b'>' => {
                if self.match_char(b'>') {
                    self.match_token(b'=', TokenKind::GreaterGreaterEqual, TokenKind::GreaterGreater)
                } else {
                    self.match_token(b'=', TokenKind::GreaterEqual, TokenKind::Greater)
                }
            }

            b'|' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::PipeEqual)
                } else {
                    self.match_token(b'|', TokenKind::Or, TokenKind::Pipe)
                }
            }
            b'^' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::XorEqual)
                } else {
                    self.make(TokenKind::Xor)
                }
            }
            b'&' => {
                if self.match_char(b'=') {
                    self.make(TokenKind::AmpersandEqual)
                } else {
                    self.match_token(b'&', TokenKind::And, TokenKind::Ampersand)
                }
            }

            b'#' => self.make(TokenKind::Hashtag),

            b'\'' => self.character(),
            b'"' => self.string(),

            _ => self.error("Unexpected character."),
        }
    }

    fn identifier(&mut self) -> Token {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.advance();
        }

        self.make(self.identifier_kind())
    }

    fn identifier_kind(&self) -> TokenKind {
        match &self.text[self.start..self.current] {
            "as" => TokenKind::As,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "else" => TokenKind::Else,
            "enum" => TokenKind::Enum,
            "extern" => TokenKind::Extern,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "if" => TokenKind::If,
            "impl" => TokenKind::Impl,
            "nil" => TokenKind::Nil,
            "return" => TokenKind::Return,
            "static" => TokenKind::Static,
            "struct" => TokenKind::Struct,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => TokenKind::Identifier,
        }
    }

    fn number(&mut self, c: u8) -> Token {
        let next = self.peek();

        if c == b'0' && (next == b'x' || next == b'X') {
            self.advance();
            return self.hex();
        }

        if c == b'0' && (next == b'b' || next == b'B') {
            self.advance();
            return self.binary();
        }

        self.integer_or_float()
    }

    fn integer_or_float(&mut self) -> Token {
        while is_digit(self.peek()) {
            self.advance();
        }

        if self.peek() == b'.' && is_digit(self.peek_next()) {
            self.advance();

            while is_digit(self.peek()) {
                self.advance();
            }
        }

        if self.peek() == b'f' || self.peek() == b'F' {
            self.advance();
        }

        self.make(TokenKind::Number)
    }

    fn hex(&mut self) -> Token {
        while is_hex(self.peek()) {
            self.advance();
        }

        self.make(TokenKind::Hex)
    }

    fn binary(&mut self) -> Token {
        while is_binary(self.peek()) {
            self.advance();
        }

        self.make(TokenKind::Binary)
    }

    fn string(&mut self) -> Token {
        while self.peek() != b'"' && !self.is_at_end() {
            self.advance();
        }

        if self.is_at_end() {
            return self.error("Unterminated string.");
        }

        self.advance();
        self.make(TokenKind::String)
    }

    fn character(&mut self) -> Token {
        if self.is_at_end() || self.peek() == b'\'' {
            return self.error("Empty character.");
        }

        if self.advance() == b'\\' && !self.is_at_end() {
            let c = self.advance();

            if c != b'\'' && c != b'0' && c != b'n' && c != b'r' && c != b't' {
                return self.error("Unexpected character.");
            }
        }

        if self.peek() != b'\'' {
            return self.error("Unterminated character.");
        }

        self.advance();
        self.make(TokenKind::Character)
    }

    fn match_token(&mut self, expected: u8, kind_true: TokenKind, kind_false: TokenKind) -> Token {
        if self.match_char(expected) {
            self.make(kind_true)
        } else {
            self.make(kind_false)
        }
    }

    fn match_char(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }

        self.advance();
        true
    }

    fn skip_whitespace(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }

            match self.peek() {
                b' ' | b'\r' | b'\t' | b'\n' => {
                    self.advance();
                }

                b'/' => {
                    if self.peek_next() == b'/' {
                        while !self.is_at_end() && self.peek() != b'\n' {
                            self.advance();
                        }
                    } else if self.peek_next() == b'*' {
                        self.advance();
                        self.advance();

                        // Unterminated block comments are tolerated.
                        while !self.is_at_end()
                            && !(self.peek() == b'*' && self.peek_next() == b'/')
                        {
                            self.advance();
                        }

                        if !self.is_at_end() {
                            self.advance();
                            self.advance();
                        }
                    } else {
                        return;
                    }
                }

                _ => return,
            }
        }
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            return 0;
        }

        self.bytes[self.current]
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.bytes.len() {
            return 0;
        }

        self.bytes[self.current + 1]
    }

    fn advance(&mut self) -> u8 {
        let c = self.bytes[self.current];
        self.current += 1;

        if c == b'\n' {
            self.line += 1;
            self.line_start = self.current;
        }

        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn make(&mut self, kind: TokenKind) -> Token {
        let lexeme = self.interner.intern(&self.text[self.start..self.current]);

        Token::new(
            kind,
            lexeme,
            self.token_line,
            self.token_column,
            self.start,
            self.current - self.start,
        )
    }

    /// Resolves a symbol interned by this scanner.
    pub fn resolve(&self, sym: fireball_base::Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn error(&mut self, msg: &str) -> Token {
        let lexeme = self.interner.intern(msg);

        Token::new(
            TokenKind::Error,
            lexeme,
            self.token_line,
            self.token_column,
            self.start,
            self.current - self.start,
        )
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_uppercase() || c == b'_'
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_hex(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn is_binary(c: u8) -> bool {
    c == b'0' || c == b'1'
}
