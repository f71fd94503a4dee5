//! Transform surface AST to core AST
//!
//! This pass:
//! - Flattens the if/elif/else chain into ordered guards and returns
//! - Resolves the parameter name to the free variable
//! - Marks constructs the compilers cannot handle as `Unsupported`

use thiserror::Error;

use crate::ast::core::{ArithOp, Comparison, Definition, GuardExpr, Operand, ReturnExpr};
use crate::ast::surface::{Expr as SurfaceExpr, FunctionDef, Stmt};
use crate::ast::{BoolOp, UnaryOp};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error(
        "Function {0} is malformed: its body must start with an if/elif/else chain or a return"
    )]
    Malformed(String),
}

/// Decompose a parsed definition into ordered guards and returns
pub fn transform(def: FunctionDef) -> Result<Definition, TransformError> {
    let FunctionDef { name, param, body } = def;
    let mut out = Definition::new(name);

    'walk: for stmt in body {
        let mut current = stmt;
        loop {
            match current {
                Stmt::If { test, then, orelse } => {
                    out.guards.push(guard_expr(test, &param));
                    out.returns.push(return_expr(then, &param));
                    match orelse {
                        Some(next) => current = *next,
                        // No else: the walk continues with the next top-level statement
                        None => continue 'walk,
                    }
                }
                // An else or a bare return closes the chain; anything after it is unreachable
                Stmt::Return(value) => {
                    out.returns.push(return_expr(value, &param));
                    break 'walk;
                }
                Stmt::Assign(..) => break 'walk,
            }
        }
    }

    if out.guards.is_empty() && out.returns.is_empty() {
        return Err(TransformError::Malformed(out.name));
    }

    log::trace!(
        "transformed {}: {} guards, {} returns",
        out.name,
        out.guards.len(),
        out.returns.len()
    );
    Ok(out)
}

fn guard_expr(expr: SurfaceExpr, param: &str) -> GuardExpr {
    match expr {
        SurfaceExpr::BoolOp(BoolOp::And, operands) => GuardExpr::And(
            operands
                .into_iter()
                .map(|e| guard_expr(e, param))
                .collect(),
        ),
        SurfaceExpr::BoolOp(BoolOp::Or, operands) => GuardExpr::Or(
            operands
                .into_iter()
                .map(|e| guard_expr(e, param))
                .collect(),
        ),
        SurfaceExpr::Compare(first, rest) => GuardExpr::Compare(Comparison {
            first: operand(*first, param),
            rest: rest
                .into_iter()
                .map(|(op, e)| (op, operand(e, param)))
                .collect(),
        }),
        other => GuardExpr::Unsupported(other.to_string()),
    }
}

fn operand(expr: SurfaceExpr, param: &str) -> Operand {
    match expr {
        SurfaceExpr::Ident(ref name) if name == param => Operand::Variable,
        SurfaceExpr::Number(value) => Operand::Constant(value),
        SurfaceExpr::UnaryOp(UnaryOp::Neg, inner) => Operand::Neg(Box::new(operand(*inner, param))),
        SurfaceExpr::UnaryOp(UnaryOp::Pos, inner) => operand(*inner, param),
        other => Operand::Unsupported(other.to_string()),
    }
}

fn return_expr(expr: SurfaceExpr, param: &str) -> ReturnExpr {
    match expr {
        SurfaceExpr::Ident(ref name) if name == param => ReturnExpr::Variable,
        SurfaceExpr::Number(value) => ReturnExpr::Constant(value),
        SurfaceExpr::UnaryOp(UnaryOp::Neg, inner) => {
            ReturnExpr::Neg(Box::new(return_expr(*inner, param)))
        }
        SurfaceExpr::UnaryOp(UnaryOp::Pos, inner) => return_expr(*inner, param),
        SurfaceExpr::BinaryOp(lhs, op, rhs) => match ArithOp::from_bin_op(op) {
            Some(op) => ReturnExpr::Binary(
                Box::new(return_expr(*lhs, param)),
                op,
                Box::new(return_expr(*rhs, param)),
            ),
            None => ReturnExpr::Unsupported(SurfaceExpr::BinaryOp(lhs, op, rhs).to_string()),
        },
        other => ReturnExpr::Unsupported(other.to_string()),
    }
}
