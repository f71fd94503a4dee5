//! AST types for piecewise definitions
//!
//! Split into:
//! - `surface`: What the parser produces (raw syntax of a function definition)
//! - `core`: What the compilers consume (guard and return trees, decomposed per branch)

pub mod core;
pub mod surface;

// Shared operator types used by both surface and core ASTs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    /// The operator seen from the other side: `b < x` is `x > b`.
    pub fn flip(self) -> Self {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ne => CmpOp::Ne,
        }
    }

    pub fn is_less(self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Le)
    }

    pub fn is_greater(self) -> bool {
        matches!(self, CmpOp::Gt | CmpOp::Ge)
    }

    pub fn is_inclusive(self) -> bool {
        matches!(self, CmpOp::Le | CmpOp::Ge | CmpOp::Eq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}
