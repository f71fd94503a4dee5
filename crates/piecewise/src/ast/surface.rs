//! Surface AST - what the parser produces
//!
//! This mirrors the source syntax closely, including constructs the
//! compilers will later reject (calls, `**`, `not`, assignments).

use super::{BinOp, BoolOp, CmpOp, UnaryOp};

/// `def name(param): body...`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub param: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `if test: return then` with an optional `elif`/`else` continuation.
    /// An `elif` is an `If` in `orelse`; an `else` is a `Return` in `orelse`.
    If {
        test: Expr,
        then: Expr,
        orelse: Option<Box<Stmt>>,
    },

    /// `return expr`
    Return(Expr),

    /// `name = expr`
    Assign(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier: `x`, `t`, `abs`
    Ident(String),

    /// Non-negative numeric literal; signs are unary operators
    Number(f64),

    /// Unary operation: `-x`, `+x`, `not x`
    UnaryOp(UnaryOp, Box<Expr>),

    /// Binary arithmetic: `a + b`, `a ** b`
    BinaryOp(Box<Expr>, BinOp, Box<Expr>),

    /// Comparison chain: `a < x <= b` is `Compare(a, [(Lt, x), (Le, b)])`
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),

    /// Boolean operation over two or more operands: `a and b and c`
    BoolOp(BoolOp, Vec<Expr>),

    /// Call: `abs(x)`
    Call(Box<Expr>, Vec<Expr>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn binop(self, op: BinOp, rhs: Expr) -> Self {
        Expr::BinaryOp(Box::new(self), op, Box::new(rhs))
    }

    pub fn neg(self) -> Self {
        Expr::UnaryOp(UnaryOp::Neg, Box::new(self))
    }
}
