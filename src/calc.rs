//! Restricted arithmetic evaluator behind `=` commands.
//!
//! Only literals, arithmetic operators, parentheses and a fixed set of math
//! names are understood. Anything else is an [`EvalError`], which callers show
//! as [`INVALID`] instead of propagating.
//!
//! Integer operands stay integral: `10/4` floors to `2` while `10.0/4` gives
//! `2.5`. Math functions other than `abs` always yield floats.

use std::f64::consts;
use std::fmt;
use thiserror::Error;

/// Marker shown in place of a result when evaluation fails.
pub const INVALID: &str = "invalid syntax!";

const MAX_DEPTH: usize = 64;

/// Precision floats are rendered with.
const SIGNIFICANT_DIGITS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("name `{0}` is not allowed")]
    UnknownName(String),
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity { name: String, expected: &'static str, got: usize },
    #[error("{0}() expects an integer argument")]
    IntegerRequired(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("math domain error")]
    Domain,
    #[error("expression too deeply nested")]
    TooDeep,
}

/// Evaluate `expression`, returning its value or why it was rejected.
pub fn evaluate(expression: &str) -> Result<Value, EvalError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
    }
}

/// Evaluate `expression` and render it for display, or [`INVALID`].
pub fn calculate(expression: &str) -> String {
    match evaluate(expression) {
        Ok(value) => value.to_string(),
        Err(err) => {
            log::debug!("calc: {:?} rejected: {}", expression, err);
            INVALID.to_string()
        }
    }
}

/// `%.12g`, with `.0` appended when the result would read as an integer.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= SIGNIFICANT_DIGITS as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs());
    }
    let decimals = (SIGNIFICANT_DIGITS as i32 - 1 - exp) as usize;
    let plain = format!("{x:.decimals$}");
    let plain = trim_fraction(&plain);
    if plain.contains('.') { plain.to_string() } else { format!("{plain}.0") }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

// -------------------------------------------------------------------
// Tokens
// -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Value),
    Name(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "number {v}"),
            Token::Name(n) => write!(f, "name `{n}`"),
            Token::Plus => f.write_str("`+`"),
            Token::Minus => f.write_str("`-`"),
            Token::Star => f.write_str("`*`"),
            Token::StarStar => f.write_str("`**`"),
            Token::Slash => f.write_str("`/`"),
            Token::SlashSlash => f.write_str("`//`"),
            Token::Percent => f.write_str("`%`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::Comma => f.write_str("`,`"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch.is_ascii_digit() || ch == '.' {
            let mut text = String::new();
            let mut is_float = false;
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                } else if c == '.' && !is_float {
                    is_float = true;
                    text.push(c);
                } else {
                    break;
                }
                chars.next();
            }
            if matches!(chars.peek(), Some(&('e' | 'E'))) {
                is_float = true;
                text.push('e');
                chars.next();
                if let Some(&sign @ ('+' | '-')) = chars.peek() {
                    text.push(sign);
                    chars.next();
                }
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
            }
            tokens.push(Token::Num(parse_number(&text, is_float)?));
        } else if ch.is_ascii_alphabetic() || ch == '_' {
            let mut name = read_name(&mut chars);
            if name == "math" && chars.peek() == Some(&'.') {
                chars.next();
                name = read_name(&mut chars);
                if name.is_empty() {
                    return Err(EvalError::UnexpectedChar('.'));
                }
            }
            tokens.push(Token::Name(name));
        } else {
            chars.next();
            let tok = match ch {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    Token::StarStar
                }
                '*' => Token::Star,
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    Token::SlashSlash
                }
                '/' => Token::Slash,
                '%' => Token::Percent,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                other => return Err(EvalError::UnexpectedChar(other)),
            };
            tokens.push(tok);
        }
    }
    Ok(tokens)
}

fn read_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn parse_number(text: &str, is_float: bool) -> Result<Value, EvalError> {
    let bad = || EvalError::UnexpectedToken(format!("literal `{text}`"));
    if is_float {
        return text.parse::<f64>().map(Value::Float).map_err(|_| bad());
    }
    match text.parse::<i64>() {
        Ok(i) => Ok(Value::Int(i)),
        // Too wide for i64: keep going as a float.
        Err(_) => text.parse::<f64>().map(Value::Float).map_err(|_| bad()),
    }
}

// -------------------------------------------------------------------
// Parser / evaluator
// -------------------------------------------------------------------

type BinaryOp = fn(Value, Value) -> Result<Value, EvalError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), EvalError> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, EvalError>) -> Result<T, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Value, EvalError> {
        let mut left = self.term()?;
        loop {
            let op: BinaryOp = match self.peek() {
                Some(Token::Plus) => add,
                Some(Token::Minus) => sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = op(left, right)?;
        }
    }

    // term := factor (('*' | '/' | '//' | '%') factor)*
    fn term(&mut self) -> Result<Value, EvalError> {
        let mut left = self.factor()?;
        loop {
            let op: BinaryOp = match self.peek() {
                Some(Token::Star) => mul,
                Some(Token::Slash) => div,
                Some(Token::SlashSlash) => floor_div,
                Some(Token::Percent) => rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = op(left, right)?;
        }
    }

    // factor := ('+' | '-') factor | power
    fn factor(&mut self) -> Result<Value, EvalError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::factor)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                let v = self.nested(Self::factor)?;
                Ok(match v {
                    Value::Int(i) => i.checked_neg().map_or(Value::Float(-(i as f64)), Value::Int),
                    Value::Float(f) => Value::Float(-f),
                })
            }
            _ => self.power(),
        }
    }

    // power := primary ['**' factor]
    fn power(&mut self) -> Result<Value, EvalError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::StarStar) {
            self.pos += 1;
            let exp = self.nested(Self::factor)?;
            return pow(base, exp);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Value, EvalError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::LParen) => {
                let v = self.nested(Self::expr)?;
                self.expect(Token::RParen)?;
                Ok(v)
            }
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.nested(Self::arguments)?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(tok) => Err(EvalError::UnexpectedToken(tok.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    // Everything after the opening parenthesis of a call.
    fn arguments(&mut self) -> Result<Vec<Value>, EvalError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(tok) => return Err(EvalError::UnexpectedToken(tok.to_string())),
                None => return Err(EvalError::UnexpectedEnd),
            }
        }
    }
}

// -------------------------------------------------------------------
// Arithmetic
// -------------------------------------------------------------------

fn int_or_float(
    a: Value,
    b: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        if let Some(r) = int_op(x, y) {
            return Value::Int(r);
        }
    }
    Value::Float(float_op(a.as_f64(), b.as_f64()))
}

fn add(a: Value, b: Value) -> Result<Value, EvalError> {
    Ok(int_or_float(a, b, i64::checked_add, |x, y| x + y))
}

fn sub(a: Value, b: Value) -> Result<Value, EvalError> {
    Ok(int_or_float(a, b, i64::checked_sub, |x, y| x - y))
}

fn mul(a: Value, b: Value) -> Result<Value, EvalError> {
    Ok(int_or_float(a, b, i64::checked_mul, |x, y| x * y))
}

fn is_zero(v: Value) -> bool {
    match v {
        Value::Int(i) => i == 0,
        Value::Float(f) => f == 0.0,
    }
}

fn int_floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) { Some(q - 1) } else { Some(q) }
}

fn int_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) { Some(r + b) } else { Some(r) }
}

fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }
}

// `/` floors between integers and divides exactly otherwise.
fn div(a: Value, b: Value) -> Result<Value, EvalError> {
    if is_zero(b) {
        return Err(EvalError::DivisionByZero);
    }
    Ok(int_or_float(a, b, int_floor_div, |x, y| x / y))
}

fn floor_div(a: Value, b: Value) -> Result<Value, EvalError> {
    if is_zero(b) {
        return Err(EvalError::DivisionByZero);
    }
    Ok(int_or_float(a, b, int_floor_div, |x, y| (x / y).floor()))
}

fn rem(a: Value, b: Value) -> Result<Value, EvalError> {
    if is_zero(b) {
        return Err(EvalError::DivisionByZero);
    }
    Ok(int_or_float(a, b, int_mod, float_mod))
}

fn pow(base: Value, exp: Value) -> Result<Value, EvalError> {
    if is_zero(base) && exp.as_f64() < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if let (Value::Int(b), Value::Int(e)) = (base, exp) {
        if e >= 0 {
            if let Some(r) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
                return Ok(Value::Int(r));
            }
        }
    }
    checked_float(&[base.as_f64(), exp.as_f64()], base.as_f64().powf(exp.as_f64()))
}

// A non-finite result from finite inputs is a domain or range error.
fn checked_float(inputs: &[f64], result: f64) -> Result<Value, EvalError> {
    if !result.is_finite() && inputs.iter().all(|x| x.is_finite()) {
        return Err(EvalError::Domain);
    }
    Ok(Value::Float(result))
}

// -------------------------------------------------------------------
// Allowed names
// -------------------------------------------------------------------

fn constant(name: &str) -> Result<Value, EvalError> {
    match name {
        "pi" => Ok(Value::Float(consts::PI)),
        "e" => Ok(Value::Float(consts::E)),
        _ => Err(EvalError::UnknownName(name.to_string())),
    }
}

const UNARY: &[(&str, fn(f64) -> f64)] = &[
    ("acos", f64::acos),
    ("asin", f64::asin),
    ("atan", f64::atan),
    ("ceil", f64::ceil),
    ("cos", f64::cos),
    ("cosh", f64::cosh),
    ("degrees", f64::to_degrees),
    ("exp", f64::exp),
    ("fabs", f64::abs),
    ("floor", f64::floor),
    ("log10", f64::log10),
    ("radians", f64::to_radians),
    ("sin", f64::sin),
    ("sinh", f64::sinh),
    ("sqrt", f64::sqrt),
    ("tan", f64::tan),
    ("tanh", f64::tanh),
];

const BINARY: &[(&str, fn(f64, f64) -> f64)] = &[
    ("atan2", f64::atan2),
    ("fmod", fmod),
    ("hypot", f64::hypot),
    ("pow", f64::powf),
];

fn fmod(x: f64, y: f64) -> f64 {
    x % y
}

fn arity(name: &str, expected: &'static str, got: usize) -> EvalError {
    EvalError::Arity { name: name.to_string(), expected, got }
}

fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    if let Some((_, f)) = UNARY.iter().find(|(n, _)| *n == name) {
        let [x] = args else { return Err(arity(name, "1", args.len())) };
        let x = x.as_f64();
        return checked_float(&[x], f(x));
    }
    if let Some((_, f)) = BINARY.iter().find(|(n, _)| *n == name) {
        let [x, y] = args else { return Err(arity(name, "2", args.len())) };
        let (x, y) = (x.as_f64(), y.as_f64());
        return checked_float(&[x, y], f(x, y));
    }
    match name {
        "abs" => match args {
            [Value::Int(i)] => Ok(i.checked_abs().map_or(Value::Float((*i as f64).abs()), Value::Int)),
            [Value::Float(f)] => Ok(Value::Float(f.abs())),
            _ => Err(arity(name, "1", args.len())),
        },
        "log" => match args {
            [x] => log_base(x.as_f64(), consts::E),
            [x, base] => log_base(x.as_f64(), base.as_f64()),
            _ => Err(arity(name, "1 or 2", args.len())),
        },
        "ldexp" => match args {
            [x, Value::Int(i)] => {
                let i = i32::try_from(*i).map_err(|_| EvalError::Domain)?;
                checked_float(&[x.as_f64()], x.as_f64() * 2f64.powi(i))
            }
            [_, Value::Float(_)] => Err(EvalError::IntegerRequired(name.to_string())),
            _ => Err(arity(name, "2", args.len())),
        },
        _ => Err(EvalError::UnknownName(name.to_string())),
    }
}

fn log_base(x: f64, base: f64) -> Result<Value, EvalError> {
    if x <= 0.0 || base <= 0.0 {
        return Err(EvalError::Domain);
    }
    let denom = base.ln();
    if denom == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    checked_float(&[x, base], x.ln() / denom)
}
