//! Boolean row expressions for expression-driven selections.
//!
//! Expressions use the column names after [`clean_name`], for example
//! `Fuel_Price > 3 & (Lanes == 2 | ~Toll)`. The text is parsed into a small
//! AST, lowered to a polars expression and evaluated over the dataset.
//!
//! Supported syntax, loosest binding first:
//!
//! | level | operators |
//! |-------|-----------|
//! | or | `\|`, `or` |
//! | and | `&`, `and` |
//! | not | `~`, `not` |
//! | comparison | `<` `<=` `>` `>=` `==` `!=` |
//! | sum | `+` `-` |
//! | product | `*` `/` |
//! | unary | `-` |
//!
//! Atoms are numbers, quoted strings, `True`/`False`, identifiers and
//! parenthesized expressions.

use crate::error::{ExploreError, Result};
use crate::types::Mask;
use crate::utils::clean_name;
use polars::prelude::*;
use std::collections::HashMap;

const RESULT_COLUMN: &str = "__selection__";

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Str(String),
    Bool(bool),
    Column(String),
    Not(Box<Node>),
    Neg(Box<Node>),
    Binary(&'static str, Box<Node>, Box<Node>),
}

/// A parsed row expression, bound to the columns of one dataset.
#[derive(Debug, Clone)]
pub struct RowExpression {
    text: String,
    root: Node,
}

impl RowExpression {
    /// Parse `text`, resolving identifiers against the cleaned names of
    /// `columns`.
    pub fn parse<S: AsRef<str>>(text: &str, columns: &[S]) -> Result<Self> {
        let names: HashMap<String, String> = columns
            .iter()
            .map(|c| (clean_name(c.as_ref()), c.as_ref().to_string()))
            .collect();
        let tokens = tokenize(text).map_err(|reason| invalid(text, reason))?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            names: &names,
        };
        let root = parser.or_expr().map_err(|reason| invalid(text, reason))?;
        if let Some(tok) = parser.peek() {
            return Err(invalid(text, format!("unexpected token {tok:?}")));
        }
        Ok(Self {
            text: text.to_string(),
            root,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against `data`; null results count as unselected.
    pub fn evaluate(&self, data: &DataFrame) -> Result<Mask> {
        let expr = lower(&self.root)
            .cast(DataType::Boolean)
            .fill_null(lit(false))
            .alias(RESULT_COLUMN);
        let out = data
            .clone()
            .lazy()
            .with_column(expr)
            .select([col(RESULT_COLUMN)])
            .collect()
            .map_err(|e| invalid(&self.text, e.to_string()))?;
        let mask = out
            .column(RESULT_COLUMN)?
            .as_materialized_series()
            .bool()
            .map_err(|e| invalid(&self.text, e.to_string()))?
            .clone();
        Ok(mask)
    }
}

/// Parse and evaluate in one step.
pub fn evaluate_expression(text: &str, data: &DataFrame) -> Result<Mask> {
    let columns: Vec<String> = data
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    RowExpression::parse(text, &columns)?.evaluate(data)
}

fn invalid(text: &str, reason: impl Into<String>) -> ExploreError {
    ExploreError::InvalidExpression {
        expression: text.to_string(),
        reason: reason.into(),
    }
}

fn lower(node: &Node) -> Expr {
    match node {
        Node::Number(v) => lit(*v),
        Node::Str(s) => lit(s.as_str()),
        Node::Bool(b) => lit(*b),
        Node::Column(name) => col(name.as_str()),
        Node::Not(inner) => lower(inner).not(),
        Node::Neg(inner) => lit(0.0) - lower(inner),
        Node::Binary(op, lhs, rhs) => {
            let (l, r) = (lower(lhs), lower(rhs));
            match *op {
                "|" => l.or(r),
                "&" => l.and(r),
                "<" => l.lt(r),
                "<=" => l.lt_eq(r),
                ">" => l.gt(r),
                ">=" => l.gt_eq(r),
                "==" => l.eq(r),
                "!=" => l.neq(r),
                "+" => l + r,
                "-" => l - r,
                "*" => l * r,
                _ => l / r,
            }
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or_else(|| "unterminated string".to_string())?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() || (c == '.' && next_is_digit(&chars, i)) => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_digit()
                        || chars[i] == '.'
                        || matches!(chars[i], 'e' | 'E')
                        || (matches!(chars[i], '+' | '-')
                            && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("bad number '{literal}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::Op("&"),
                    "or" => Token::Op("|"),
                    "not" => Token::Op("~"),
                    _ => Token::Ident(word),
                });
            }
            _ => {
                let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                let op = match two.as_str() {
                    "<=" => Some("<="),
                    ">=" => Some(">="),
                    "==" => Some("=="),
                    "!=" => Some("!="),
                    _ => None,
                };
                if let Some(op) = op {
                    tokens.push(Token::Op(op));
                    i += 2;
                    continue;
                }
                let op = match c {
                    '<' => "<",
                    '>' => ">",
                    '&' => "&",
                    '|' => "|",
                    '~' => "~",
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    other => return Err(format!("unexpected character '{other}'")),
                };
                tokens.push(Token::Op(op));
                i += 1;
            }
        }
    }
    Ok(tokens)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    names: &'a HashMap<String, String>,
}

type ParseResult = std::result::Result<Node, String>;

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn take_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn binary_level(
        &mut self,
        ops: &[&'static str],
        next: fn(&mut Self) -> ParseResult,
    ) -> ParseResult {
        let mut lhs = next(self)?;
        while let Some(op) = self.take_op(ops) {
            let rhs = next(self)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn or_expr(&mut self) -> ParseResult {
        self.binary_level(&["|"], Self::and_expr)
    }

    fn and_expr(&mut self) -> ParseResult {
        self.binary_level(&["&"], Self::not_expr)
    }

    fn not_expr(&mut self) -> ParseResult {
        if self.take_op(&["~"]).is_some() {
            return Ok(Node::Not(Box::new(self.not_expr()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult {
        let lhs = self.sum()?;
        match self.take_op(&["<", "<=", ">", ">=", "==", "!="]) {
            Some(op) => Ok(Node::Binary(op, Box::new(lhs), Box::new(self.sum()?))),
            None => Ok(lhs),
        }
    }

    fn sum(&mut self) -> ParseResult {
        self.binary_level(&["+", "-"], Self::product)
    }

    fn product(&mut self) -> ParseResult {
        self.binary_level(&["*", "/"], Self::unary)
    }

    fn unary(&mut self) -> ParseResult {
        if self.take_op(&["-"]).is_some() {
            return Ok(Node::Neg(Box::new(self.unary()?)));
        }
        if self.take_op(&["~"]).is_some() {
            return Ok(Node::Not(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> ParseResult {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        self.pos += 1;
        match token {
            Token::Number(v) => Ok(Node::Number(v)),
            Token::Str(s) => Ok(Node::Str(s)),
            Token::Ident(word) => match word.as_str() {
                "True" | "true" => Ok(Node::Bool(true)),
                "False" | "false" => Ok(Node::Bool(false)),
                _ => self
                    .names
                    .get(&word)
                    .map(|name| Node::Column(name.clone()))
                    .ok_or_else(|| format!("unknown name '{word}'")),
            },
            Token::LParen => {
                let inner = self.or_expr()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err("missing ')'".to_string()),
                }
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}
