//! Core AST - what the compilers consume
//!
//! A [`Definition`] is a function body decomposed into ordered guard trees
//! and ordered return trees. Transform produces it from a parsed
//! definition; callers can also build one by hand with the helpers below.
//!
//! `Unsupported` variants hold the rendered source of a construct the front
//! end accepted but the compilers reject.

use super::{BinOp, CmpOp};

/// Arithmetic operators allowed in return expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn from_bin_op(op: BinOp) -> Option<Self> {
        match op {
            BinOp::Add => Some(ArithOp::Add),
            BinOp::Sub => Some(ArithOp::Sub),
            BinOp::Mul => Some(ArithOp::Mul),
            BinOp::Div => Some(ArithOp::Div),
            BinOp::Mod | BinOp::Pow => None,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
            ArithOp::Div => lhs / rhs,
        }
    }
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The free variable
    Variable,
    Constant(f64),
    Neg(Box<Operand>),
    Unsupported(String),
}

impl Operand {
    pub fn var() -> Self {
        Operand::Variable
    }

    /// Negative values become `Neg(Constant(|value|))`, as parsed source would.
    pub fn num(value: f64) -> Self {
        if value.is_sign_negative() && value != 0.0 {
            Operand::Neg(Box::new(Operand::Constant(-value)))
        } else {
            Operand::Constant(value)
        }
    }
}

/// `first op0 second [op1 third ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub first: Operand,
    pub rest: Vec<(CmpOp, Operand)>,
}

impl Comparison {
    /// Number of terms once linearized: operands plus operators.
    pub fn token_count(&self) -> usize {
        1 + 2 * self.rest.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardExpr {
    /// Conjunction: every child holds
    And(Vec<GuardExpr>),

    /// Disjunction: at least one child holds
    Or(Vec<GuardExpr>),

    Compare(Comparison),

    Unsupported(String),
}

impl GuardExpr {
    /// `lhs op rhs`
    pub fn cmp(lhs: Operand, op: CmpOp, rhs: Operand) -> Self {
        GuardExpr::Compare(Comparison {
            first: lhs,
            rest: vec![(op, rhs)],
        })
    }

    /// `lower op0 x op1 upper`
    pub fn chain(lower: f64, op0: CmpOp, op1: CmpOp, upper: f64) -> Self {
        GuardExpr::Compare(Comparison {
            first: Operand::num(lower),
            rest: vec![(op0, Operand::Variable), (op1, Operand::num(upper))],
        })
    }

    /// `x op bound`
    pub fn var_cmp(op: CmpOp, bound: f64) -> Self {
        Self::cmp(Operand::Variable, op, Operand::num(bound))
    }

    pub fn and(self, rhs: GuardExpr) -> Self {
        match self {
            GuardExpr::And(mut children) => {
                children.push(rhs);
                GuardExpr::And(children)
            }
            lhs => GuardExpr::And(vec![lhs, rhs]),
        }
    }

    pub fn or(self, rhs: GuardExpr) -> Self {
        match self {
            GuardExpr::Or(mut children) => {
                children.push(rhs);
                GuardExpr::Or(children)
            }
            lhs => GuardExpr::Or(vec![lhs, rhs]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnExpr {
    Constant(f64),

    /// The free variable
    Variable,

    /// Unary negation: `-x`, `-5`
    Neg(Box<ReturnExpr>),

    /// Binary arithmetic: `a + b`, `a / b`
    Binary(Box<ReturnExpr>, ArithOp, Box<ReturnExpr>),

    Unsupported(String),
}

impl ReturnExpr {
    pub fn var() -> Self {
        ReturnExpr::Variable
    }

    pub fn num(value: f64) -> Self {
        ReturnExpr::Constant(value)
    }

    pub fn neg(self) -> Self {
        ReturnExpr::Neg(Box::new(self))
    }

    pub fn binop(self, op: ArithOp, rhs: ReturnExpr) -> Self {
        ReturnExpr::Binary(Box::new(self), op, Box::new(rhs))
    }

    pub fn add(self, rhs: ReturnExpr) -> Self {
        self.binop(ArithOp::Add, rhs)
    }

    pub fn sub(self, rhs: ReturnExpr) -> Self {
        self.binop(ArithOp::Sub, rhs)
    }

    pub fn mul(self, rhs: ReturnExpr) -> Self {
        self.binop(ArithOp::Mul, rhs)
    }

    pub fn div(self, rhs: ReturnExpr) -> Self {
        self.binop(ArithOp::Div, rhs)
    }
}

/// A function body decomposed into branches.
///
/// `returns` has either as many entries as `guards`, or exactly one more
/// (the otherwise branch).
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub guards: Vec<GuardExpr>,
    pub returns: Vec<ReturnExpr>,
}

impl Definition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guards: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// Add an explicit branch: `if guard: return value`
    pub fn branch(mut self, guard: GuardExpr, value: ReturnExpr) -> Self {
        self.guards.push(guard);
        self.returns.push(value);
        self
    }

    /// Add the trailing otherwise branch: `return value`
    pub fn otherwise(mut self, value: ReturnExpr) -> Self {
        self.returns.push(value);
        self
    }
}
