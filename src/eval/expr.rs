// eval/expr.rs - Custom equation lexer + recursive-descent parser
//
// Turns user equation text into a small expression tree. Nothing here
// executes anything: the tree is later resolved by `compiled.rs` and
// interpreted over f64, so the only reachable operations are the ones
// the grammar spells out.
//
// Grammar (lowest to highest precedence):
//
//   expr        := comparison ( '?' expr ':' expr )?
//   comparison  := additive ( ('<' | '<=' | '>' | '>=') additive )*
//   additive    := term ( ('+' | '-') term )*
//   term        := unary ( ('*' | '/') unary )*
//   unary       := '-' unary | '+' unary | power
//   power       := primary ( ('^' | '**') unary )?      right associative
//   primary     := number | ident | ident '(' args ')' | '(' expr ')'

use crate::error::ParseError;

/// Nesting limit for parenthesised / unary / conditional recursion.
pub const MAX_DEPTH: usize = 64;

// ── AST ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    Variable(String),
    Neg(Box<Ast>),
    BinaryOp(BinOp, Box<Ast>, Box<Ast>),
    Call(String, Vec<Ast>),
    /// `cond ? then : otherwise`, where any non-zero condition is true.
    Conditional(Box<Ast>, Box<Ast>, Box<Ast>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    #[inline(always)]
    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            BinOp::Pow => l.powf(r),
            BinOp::Lt => bool_to_f64(l < r),
            BinOp::Le => bool_to_f64(l <= r),
            BinOp::Gt => bool_to_f64(l > r),
            BinOp::Ge => bool_to_f64(l >= r),
        }
    }
}

#[inline(always)]
fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Ast {
    /// Every identifier in the tree, call names included, in source order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Ast::Number(_) => {}
            Ast::Variable(name) => out.push(name),
            Ast::Neg(inner) => inner.collect_identifiers(out),
            Ast::BinaryOp(_, l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
            Ast::Call(name, args) => {
                out.push(name);
                for a in args {
                    a.collect_identifiers(out);
                }
            }
            Ast::Conditional(c, a, b) => {
                c.collect_identifiers(out);
                a.collect_identifiers(out);
                b.collect_identifiers(out);
            }
        }
    }
}

// ── Lexer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,
    LParen,
    RParen,
    Comma,
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                self.next_char();
            } else {
                break;
            }
        }

        // Exponent part only when digits follow, so `2E` stays `2` then `E`.
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let digit_at = match self.peek_nth(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.next_char();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.next_char();
                }
            }
        }

        let s = &self.input[start..self.pos];
        s.parse()
            .map_err(|_| ParseError::InvalidNumber(s.to_string()))
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// Consume `c` and return `tok`.
    fn single(&mut self, tok: Token) -> Result<Token, ParseError> {
        self.next_char();
        Ok(tok)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        match c {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => {
                self.next_char();
                if self.peek_char() == Some('*') {
                    self.next_char();
                    Ok(Token::Caret)
                } else {
                    Ok(Token::Star)
                }
            }
            '/' => self.single(Token::Slash),
            '^' => self.single(Token::Caret),
            '<' => {
                self.next_char();
                if self.peek_char() == Some('=') {
                    self.next_char();
                    Ok(Token::Le)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.next_char();
                if self.peek_char() == Some('=') {
                    self.next_char();
                    Ok(Token::Ge)
                } else {
                    Ok(Token::Gt)
                }
            }
            '?' => self.single(Token::Question),
            ':' => self.single(Token::Colon),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ',' => self.single(Token::Comma),
            '0'..='9' | '.' => Ok(Token::Number(self.read_number()?)),
            'a'..='z' | 'A'..='Z' | '_' => Ok(Token::Ident(self.read_ident())),
            _ => Err(ParseError::UnexpectedChar(c, self.pos)),
        }
    }
}

// ── Parser ──────────────────────────────────────────────────────────

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.current == expected {
            self.advance()
        } else if self.current == Token::Eof {
            Err(ParseError::UnexpectedEnd)
        } else {
            Err(ParseError::UnexpectedToken(format!("{:?}", self.current)))
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr(&mut self) -> Result<Ast, ParseError> {
        self.enter()?;
        let cond = self.parse_comparison()?;
        let result = if self.current == Token::Question {
            self.advance()?;
            let then = self.parse_expr()?;
            self.expect(Token::Colon)?;
            let otherwise = self.parse_expr()?;
            Ast::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            cond
        };
        self.leave();
        Ok(result)
    }

    fn parse_comparison(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Ast::BinaryOp(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_term()?;
            left = Ast::BinaryOp(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Ast::BinaryOp(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Ast, ParseError> {
        match self.current {
            Token::Minus => {
                self.advance()?;
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(Ast::Neg(Box::new(inner)))
            }
            Token::Plus => {
                self.advance()?;
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(inner)
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Ast, ParseError> {
        let base = self.parse_primary()?;

        if self.current == Token::Caret {
            self.advance()?;
            self.enter()?;
            // Exponent binds through unary minus: 2^-1, and right-assoc: 2^3^2.
            let exp = self.parse_unary()?;
            self.leave();
            Ok(Ast::BinaryOp(BinOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> Result<Ast, ParseError> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Ast::Number(n))
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;

                if self.current == Token::LParen {
                    self.advance()?;
                    let mut args = Vec::new();
                    if self.current != Token::RParen {
                        args.push(self.parse_expr()?);
                        while self.current == Token::Comma {
                            self.advance()?;
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Ast::Call(name, args))
                } else {
                    Ok(Ast::Variable(name))
                }
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Eof => Err(ParseError::UnexpectedEnd),
            other => Err(ParseError::UnexpectedToken(format!("{:?}", other))),
        }
    }
}

/// Parse equation text into an expression tree.
pub fn parse(input: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(input)?;
    let ast = parser.parse_expr()?;
    if parser.current != Token::Eof {
        return Err(ParseError::UnexpectedToken(format!("{:?}", parser.current)));
    }
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Ast> {
        Box::new(Ast::Number(n))
    }

    fn var(name: &str) -> Box<Ast> {
        Box::new(Ast::Variable(name.to_string()))
    }

    #[test]
    fn parse_number_forms() {
        assert_eq!(parse("42").unwrap(), Ast::Number(42.0));
        assert_eq!(parse(".5").unwrap(), Ast::Number(0.5));
        assert_eq!(parse("1e3").unwrap(), Ast::Number(1000.0));
        assert_eq!(parse("2.5E-1").unwrap(), Ast::Number(0.25));
    }

    #[test]
    fn number_followed_by_constant_e() {
        // `2E` is not exponent notation without a digit after it
        assert!(matches!(parse("2E"), Err(ParseError::UnexpectedToken(_))));
        assert_eq!(
            parse("2*E").unwrap(),
            Ast::BinaryOp(BinOp::Mul, num(2.0), var("E"))
        );
    }

    #[test]
    fn precedence_mul_over_add() {
        assert_eq!(
            parse("1 + 2 * x").unwrap(),
            Ast::BinaryOp(
                BinOp::Add,
                num(1.0),
                Box::new(Ast::BinaryOp(BinOp::Mul, num(2.0), var("x")))
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse("2 ^ 3 ^ 2").unwrap(),
            Ast::BinaryOp(
                BinOp::Pow,
                num(2.0),
                Box::new(Ast::BinaryOp(BinOp::Pow, num(3.0), num(2.0)))
            )
        );
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(parse("x ** 2").unwrap(), parse("x ^ 2").unwrap());
    }

    #[test]
    fn negation_binds_looser_than_power() {
        // -x^2 == -(x^2)
        assert_eq!(
            parse("-x^2").unwrap(),
            Ast::Neg(Box::new(Ast::BinaryOp(BinOp::Pow, var("x"), num(2.0))))
        );
    }

    #[test]
    fn call_with_arguments() {
        assert_eq!(
            parse("atan2(z, x)").unwrap(),
            Ast::Call("atan2".into(), vec![Ast::Variable("z".into()), Ast::Variable("x".into())])
        );
        assert_eq!(parse("f()").unwrap(), Ast::Call("f".into(), vec![]));
    }

    #[test]
    fn conditional_and_comparison() {
        let ast = parse("abs(x) < L/2 ? 1 : 0").unwrap();
        match ast {
            Ast::Conditional(cond, a, b) => {
                assert!(matches!(*cond, Ast::BinaryOp(BinOp::Lt, _, _)));
                assert_eq!(*a, Ast::Number(1.0));
                assert_eq!(*b, Ast::Number(0.0));
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn rejects_statement_syntax() {
        assert!(matches!(
            parse("while(true){}"),
            Err(ParseError::UnexpectedChar('{', _))
        ));
        assert!(matches!(parse("x; y"), Err(ParseError::UnexpectedChar(';', _))));
        assert!(parse("a = 1").is_err());
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert_eq!(parse("(x + 1"), Err(ParseError::UnexpectedEnd));
        assert!(matches!(parse("x + 1)"), Err(ParseError::UnexpectedToken(_))));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("   "), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn depth_limit_stops_runaway_nesting() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH + 5), ")".repeat(MAX_DEPTH + 5));
        assert_eq!(parse(&deep), Err(ParseError::TooDeep(MAX_DEPTH)));

        let minus = format!("{}x", "-".repeat(MAX_DEPTH * 2));
        assert_eq!(parse(&minus), Err(ParseError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn identifiers_in_source_order() {
        let ast = parse("A * sin(f * x) + t").unwrap();
        assert_eq!(ast.identifiers(), vec!["A", "sin", "f", "x", "t"]);
    }
}
