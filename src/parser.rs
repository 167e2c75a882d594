use crate::ast::{BinaryOp, Dialect, Expr, UnaryOp};
use crate::error::Error;
use crate::lexer::{Lexer, Token};

/// Deepest nesting of parentheses, calls and unary operators a formula may use.
pub const MAX_NESTING: usize = 64;

/// Tallest expression tree the parser builds and the evaluator walks.
pub const MAX_DEPTH: usize = 256;

/// An expression and the height of its tree.
type Parsed = (Expr, usize);

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    look_pos: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input);
        let lookahead = lexer.next_token()?;
        let look_pos = lexer.last_start();
        Ok(Self { lexer, lookahead, look_pos, nesting: 0 })
    }

    fn bump(&mut self) -> Result<(), Error> {
        self.lookahead = self.lexer.next_token()?;
        self.look_pos = self.lexer.last_start();
        Ok(())
    }

    fn err_here<T>(&self, msg: &str) -> Result<T, Error> {
        Err(Error::syntax(msg, self.look_pos))
    }

    /// Height of a new node over children of height `child`.
    fn grow(&self, child: usize) -> Result<usize, Error> {
        if child >= MAX_DEPTH {
            return Err(Error::NestingTooDeep);
        }
        Ok(child + 1)
    }

    /// Parse a complete expression; anything left over is an error.
    pub fn parse(&mut self) -> Result<Expr, Error> {
        let (expr, _) = self.parse_expr()?;
        match self.lookahead {
            Token::Eof => Ok(expr),
            _ => self.err_here("Unexpected trailing input"),
        }
    }

    /// Parse a bare comma-separated argument list (no surrounding parentheses).
    pub fn parse_argument_list(&mut self) -> Result<Vec<Expr>, Error> {
        if let Token::Eof = self.lookahead {
            return Ok(Vec::new());
        }
        let (args, _) = self.parse_args_until(&Token::Eof)?;
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Parsed, Error> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Parsed, Error> {
        let (mut node, mut height) = self.parse_concat()?;
        loop {
            let op = match self.lookahead {
                Token::Greater => BinaryOp::Gt,
                Token::Less => BinaryOp::Lt,
                Token::Ge => BinaryOp::Ge,
                Token::Le => BinaryOp::Le,
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.bump()?;
            let (rhs, rh) = self.parse_concat()?;
            height = self.grow(height.max(rh))?;
            node = Expr::Binary(Box::new(node), op, Box::new(rhs));
        }
        Ok((node, height))
    }

    fn parse_concat(&mut self) -> Result<Parsed, Error> {
        let (mut node, mut height) = self.parse_additive()?;
        while let Token::Amp = self.lookahead {
            self.bump()?;
            let (rhs, rh) = self.parse_additive()?;
            height = self.grow(height.max(rh))?;
            node = Expr::Binary(Box::new(node), BinaryOp::Concat, Box::new(rhs));
        }
        Ok((node, height))
    }

    fn parse_additive(&mut self) -> Result<Parsed, Error> {
        let (mut node, mut height) = self.parse_multiplicative()?;
        loop {
            let op = match self.lookahead {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump()?;
            let (rhs, rh) = self.parse_multiplicative()?;
            height = self.grow(height.max(rh))?;
            node = Expr::Binary(Box::new(node), op, Box::new(rhs));
        }
        Ok((node, height))
    }

    fn parse_multiplicative(&mut self) -> Result<Parsed, Error> {
        let (mut node, mut height) = self.parse_unary()?;
        loop {
            let op = match self.lookahead {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.bump()?;
            let (rhs, rh) = self.parse_unary()?;
            height = self.grow(height.max(rh))?;
            node = Expr::Binary(Box::new(node), op, Box::new(rhs));
        }
        Ok((node, height))
    }

    /// Every nested construct (parentheses, call arguments, unary chains, exponents)
    /// re-enters here, so this is where nesting is counted.
    fn parse_unary(&mut self) -> Result<Parsed, Error> {
        if self.nesting >= MAX_NESTING {
            return Err(Error::NestingTooDeep);
        }
        self.nesting += 1;
        let parsed = self.parse_prefixed();
        self.nesting -= 1;
        parsed
    }

    fn parse_prefixed(&mut self) -> Result<Parsed, Error> {
        let op = match self.lookahead {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        self.bump()?;
        let (expr, height) = self.parse_unary()?;
        Ok((Expr::Unary(op, Box::new(expr)), self.grow(height)?))
    }

    fn parse_power(&mut self) -> Result<Parsed, Error> {
        // Right associative with higher precedence than unary
        let (left, lh) = self.parse_atom()?;
        if let Token::Caret = self.lookahead {
            self.bump()?;
            let (right, rh) = self.parse_unary()?; // exponent can be unary like -2
            let height = self.grow(lh.max(rh))?;
            Ok((Expr::Binary(Box::new(left), BinaryOp::Pow, Box::new(right)), height))
        } else {
            Ok((left, lh))
        }
    }

    fn parse_atom(&mut self) -> Result<Parsed, Error> {
        match self.lookahead.clone() {
            Token::Number(n) => {
                self.bump()?;
                Ok((Expr::Number(n), 1))
            }
            Token::String(s) => {
                self.bump()?;
                Ok((Expr::Str(s), 1))
            }
            Token::True => {
                self.bump()?;
                Ok((Expr::Bool(true), 1))
            }
            Token::False => {
                self.bump()?;
                Ok((Expr::Bool(false), 1))
            }
            Token::LParen => {
                self.bump()?;
                let parsed = self.parse_expr()?;
                match self.lookahead {
                    Token::RParen => {
                        self.bump()?;
                        Ok(parsed)
                    }
                    _ => self.err_here("Expected ')'"),
                }
            }
            Token::Identifier(name) => {
                self.bump()?; // consume ident
                match self.lookahead {
                    Token::LParen => {
                        self.bump()?; // '('
                        let (args, tallest) = if let Token::RParen = self.lookahead {
                            (Vec::new(), 0)
                        } else {
                            self.parse_args_until(&Token::RParen)?
                        };
                        self.bump()?; // consume ')'
                        Ok((Expr::Call { name: name.to_uppercase(), args }, self.grow(tallest)?))
                    }
                    // Cell references (A1) and field names both resolve through the context
                    _ => Ok((Expr::FieldRef(name), 1)),
                }
            }
            other => Err(Error::syntax(format!("Unexpected token: {:?}", other), self.look_pos)),
        }
    }

    /// Comma-separated arguments up to (not consuming) `end`; blank slots become `Expr::Empty`.
    ///
    /// Also returns the height of the tallest argument.
    fn parse_args_until(&mut self, end: &Token) -> Result<(Vec<Expr>, usize), Error> {
        let mut args = Vec::new();
        let mut tallest = 0;
        loop {
            let arg = if self.lookahead == Token::Comma || &self.lookahead == end {
                Expr::Empty
            } else {
                let (arg, height) = self.parse_expr()?;
                tallest = tallest.max(height);
                arg
            };
            args.push(arg);
            if self.lookahead == Token::Comma {
                self.bump()?;
            } else if &self.lookahead == end {
                break;
            } else {
                return self.err_here("Expected ',' or ')' in argument list");
            }
        }
        Ok((args, tallest))
    }
}

/// Split a formula into its dialect and body AST.
pub fn parse_formula(input: &str) -> Result<(Dialect, Expr), Error> {
    let trimmed = input.trim();
    let (dialect, body) = match trimmed.strip_prefix('=') {
        Some(rest) => (Dialect::Excel, rest),
        None => (Dialect::Legacy, trimmed),
    };
    if body.trim().is_empty() {
        return Ok((dialect, Expr::Empty));
    }
    let expr = Parser::new(body)?.parse()?;
    Ok((dialect, expr))
}

/// Parse the inside of a call's parentheses, e.g. `'yes', "q", SUM(a, b)`.
///
/// Commas inside quotes or nested parentheses never split. When the whole list does not
/// parse, each top-level segment is parsed on its own and a segment that still fails is
/// kept as its raw text, so one bad argument does not take the others down with it.
pub fn parse_arguments(args: &str) -> Vec<Expr> {
    match Parser::new(args).and_then(|mut p| p.parse_argument_list()) {
        Ok(list) => list,
        Err(_) => split_arguments(args)
            .into_iter()
            .map(|segment| {
                if segment.trim().is_empty() {
                    return Expr::Empty;
                }
                Parser::new(segment)
                    .and_then(|mut p| p.parse())
                    .unwrap_or_else(|_| Expr::Str(segment.trim().to_string()))
            })
            .collect(),
    }
}

/// Split an argument list at top-level commas.
///
/// Quoted text (with backslash escapes) and parenthesised groups are never split, and an
/// unbalanced `)` is treated as plain text.
pub fn split_arguments(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&args[start..]);
    segments
}

/// Salvage a legacy formula that is one call with a malformed argument list,
/// such as `COUNT('yes'` or `SUM(a, b c)`.
///
/// The body must be `NAME(` followed by arguments that never close the call early; a
/// single trailing `)` is dropped. Returns `None` for anything else, e.g. `SUM(1,2) +`.
pub fn recover_call(body: &str) -> Option<Expr> {
    let body = body.trim();
    let open = body.find('(')?;
    let name = body[..open].trim_end();
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let rest = &body[open + 1..];
    let inner = rest.strip_suffix(')').unwrap_or(rest);
    if paren_depth(inner)? >= MAX_NESTING {
        return None;
    }
    Some(Expr::Call { name: name.to_uppercase(), args: parse_arguments(inner) })
}

/// Deepest parenthesis nesting outside quotes, or `None` when a `)` closes a group
/// that `text` never opened.
fn paren_depth(text: &str) -> Option<usize> {
    let mut deepest = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' if depth == 0 => return None,
            ')' => depth -= 1,
            _ => {}
        }
    }
    Some(deepest)
}
