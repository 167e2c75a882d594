use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    String(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Bang,
    LParen,
    RParen,
    Comma,
    Greater,
    Less,
    Ge,
    Le,
    EqEq,
    NotEq,
    Eof,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    last_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            last_start: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        // Slices always start and end on ASCII bytes, so they are valid UTF-8.
        std::str::from_utf8(&self.input[start..end]).unwrap_or("")
    }

    fn number(&mut self, start: usize) -> Result<Token, Error> {
        let mut has_dot = self.input[start] == b'.';
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !has_dot => {
                    has_dot = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    // Exponent only when digits follow, otherwise leave it for the identifier rule
                    let digits_at = match self.peek_at(1) {
                        Some(b'+' | b'-') => 2,
                        _ => 1,
                    };
                    if matches!(self.peek_at(digits_at), Some(b'0'..=b'9')) {
                        self.pos += digits_at + 1;
                        while matches!(self.peek(), Some(b'0'..=b'9')) {
                            self.pos += 1;
                        }
                    }
                    break;
                }
                _ => break,
            }
        }
        let s = self.text(start, self.pos);
        let n: f64 = s
            .parse()
            .map_err(|_| Error::syntax("Invalid number", start))?;
        Ok(Token::Number(n))
    }

    fn identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let s = self.text(start, self.pos);
        match s.to_ascii_uppercase().as_str() {
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            _ => Token::Identifier(s.to_string()),
        }
    }

    fn string(&mut self, quote: u8, start: usize) -> Result<Token, Error> {
        // consume until matching quote, support escapes \" \' \\ \n \t; preserve UTF-8 bytes
        let mut buf: Vec<u8> = Vec::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return String::from_utf8(buf)
                    .map(Token::String)
                    .map_err(|_| Error::syntax("Invalid UTF-8 in string", start));
            }
            if c == b'\\' {
                match self.bump() {
                    Some(b'n') => buf.push(b'\n'),
                    Some(b't') => buf.push(b'\t'),
                    Some(x) => buf.push(x),
                    None => return Err(Error::syntax("Unterminated escape in string", self.pos)),
                }
            } else {
                buf.push(c);
            }
        }
        Err(Error::syntax("Unterminated string literal", start))
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_ws();
        let start = self.pos;
        self.last_start = start;
        let ch = match self.bump() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let tok = match ch {
            b'0'..=b'9' => return self.number(start),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => return self.number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(start),
            b'"' | b'\'' => return self.string(ch, start),
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'^' => Token::Caret,
            b'&' => Token::Amp,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            b'!' => {
                if matches!(self.peek(), Some(b'=')) {
                    self.bump();
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            b'>' => {
                if matches!(self.peek(), Some(b'=')) {
                    self.bump();
                    Token::Ge
                } else {
                    Token::Greater
                }
            }
            b'<' => match self.peek() {
                Some(b'=') => {
                    self.bump();
                    Token::Le
                }
                Some(b'>') => {
                    self.bump();
                    Token::NotEq
                }
                _ => Token::Less,
            },
            b'=' => {
                // Both '=' and '==' compare; the dialect marker is stripped before lexing
                if matches!(self.peek(), Some(b'=')) {
                    self.bump();
                }
                Token::EqEq
            }
            _ => return Err(Error::syntax("Unexpected character", start)),
        };
        Ok(tok)
    }

    /// Byte offset where the most recently returned token starts.
    pub fn last_start(&self) -> usize {
        self.last_start
    }
}
