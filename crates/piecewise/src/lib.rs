//! Piecewise - compile guarded function definitions into piecewise functions
//!
//! A definition is a single-parameter function whose body is an
//! `if`/`elif`/`else` chain of `return` statements. Each guard compiles to a
//! set of reals, each return to a first-degree polynomial, and the branches
//! are checked to be pairwise disjoint before evaluation.
//!
//! ## Quick Start
//!
//! ```ignore
//! use piecewise::{compile, Extremum};
//!
//! let f = compile(
//!     "def demo(x):
//!         if x < 0:
//!             return -x
//!         elif x == 6:
//!             return 7 / 8
//!         return 5",
//! )?;
//!
//! let ys: Vec<_> = f.apply([-6.0, 2.0, 0.3]).collect::<Result<_, _>>()?;
//! assert_eq!(ys, vec![Some(6.0), Some(5.0), Some(5.0)]);
//!
//! let max = f.extremum([-6.0, 2.0, 0.3], Extremum::Max)?;
//! ```
//!
//! ## Hand-built domains
//!
//! Intervals and evaluators can be supplied directly; one extra evaluator
//! becomes the otherwise branch on the complement of the given domains.
//!
//! ```ignore
//! use piecewise::{evaluator, Interval, PiecewiseFunction};
//!
//! let f = PiecewiseFunction::new(
//!     vec![Interval::open(1.0, 2.0), Interval::closed_open(-1.0, 0.0)],
//!     vec![evaluator(|x| x), evaluator(|_| 1.0), evaluator(|x| 2.0 * x + 1.0)],
//! )?;
//! ```
//!
//! ## Columns
//!
//! `apply_series` and `extremum_series` evaluate a polars Series, with
//! undefined results as nulls.

mod ast;
mod batch;
mod compile;
mod eval;
mod interval;
mod parse;
mod piecewise;
mod pretty;
mod transform;

use thiserror::Error;

// ============ Primary Public API ============

pub use compile::{Evaluator, evaluator};
pub use eval::{Apply, Extremum, ExtremumResult, ToReal};
pub use interval::{Atomic, Bound, Interval};
pub use piecewise::{Branch, PiecewiseFunction};

/// Parse, transform, compile and assemble a definition
pub fn compile(source: &str) -> Result<PiecewiseFunction, PiecewiseError> {
    let surface = parse::parse(source)?;
    let core = transform::transform(surface)?;
    PiecewiseFunction::from_definition(&core)
}

// ============ Errors ============

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PiecewiseError {
    #[error("Parse error: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Transform error: {0}")]
    Transform(#[from] transform::TransformError),
    #[error("Compile error: {0}")]
    Compile(#[from] compile::CompileError),
    #[error("Assemble error: {0}")]
    Assemble(#[from] piecewise::AssembleError),
    #[error("Eval error: {0}")]
    Eval(#[from] eval::EvalError),
}

pub use compile::CompileError;
pub use eval::EvalError;
pub use parse::ParseError;
pub use piecewise::AssembleError;
pub use transform::TransformError;

// ============ Advanced: AST Access ============

/// Low-level AST types and passes (for hand-built definitions or introspection)
pub mod advanced {
    pub use crate::ast::core::{
        ArithOp, Comparison, Definition, GuardExpr, Operand, ReturnExpr,
    };
    pub use crate::ast::surface::{Expr as SurfaceExpr, FunctionDef, Stmt};
    pub use crate::ast::{BinOp, BoolOp, CmpOp, UnaryOp};
    pub use crate::compile::{compile_guard, compile_return};
    pub use crate::parse::{parse, parse_expr};
    pub use crate::transform::transform;
}
