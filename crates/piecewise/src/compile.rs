//! Compilers from core expression trees to domains and evaluators
//!
//! - Guards become [`Interval`]s: `and` intersects, `or` unions, and each
//!   comparison becomes a half-line, a point, or a bounded interval.
//! - Returns become [`Evaluator`]s after the tree is checked to be a
//!   polynomial of degree at most one in the free variable.

use std::sync::Arc;

use thiserror::Error;

use crate::ast::CmpOp;
use crate::ast::core::{ArithOp, Comparison, GuardExpr, Operand, ReturnExpr};
use crate::interval::{Bound, Interval};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Malformed guard: {0}")]
    MalformedGuard(String),

    #[error("Unsupported return expression: {0}")]
    UnsupportedExpression(String),

    #[error("Division by zero in return expression: {0}")]
    DivisionByZero(String),
}

type Result<T> = std::result::Result<T, CompileError>;

/// Scalar function of the free variable attached to a branch
pub type Evaluator = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Wrap a closure as an [`Evaluator`]
pub fn evaluator(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Evaluator {
    Arc::new(f)
}

// ============ Guards ============

/// Compile a guard tree into the set of values satisfying it
pub fn compile_guard(expr: &GuardExpr) -> Result<Interval> {
    let interval = match expr {
        GuardExpr::And(children) => reduce(children, Interval::intersection)?,
        GuardExpr::Or(children) => reduce(children, Interval::union)?,
        GuardExpr::Compare(cmp) => compile_comparison(cmp)?,
        GuardExpr::Unsupported(src) => {
            return Err(CompileError::MalformedGuard(format!(
                "`{src}` is not a comparison or a boolean combination of comparisons"
            )));
        }
    };
    log::trace!("guard {expr} -> {interval}");
    Ok(interval)
}

/// Pairwise reduction; no children reduces to the empty interval
fn reduce(
    children: &[GuardExpr],
    combine: fn(&Interval, &Interval) -> Interval,
) -> Result<Interval> {
    let mut compiled = children.iter().map(compile_guard);
    let Some(first) = compiled.next() else {
        return Ok(Interval::empty());
    };
    compiled.try_fold(first?, |acc, next| Ok(combine(&acc, &next?)))
}

/// A comparison operand resolved to either the variable or a number
#[derive(Debug, Clone, Copy, PartialEq)]
enum Term {
    Var,
    Bound(f64),
}

fn term(operand: &Operand, cmp: &Comparison) -> Result<Term> {
    match operand {
        Operand::Variable => Ok(Term::Var),
        Operand::Constant(value) => Ok(Term::Bound(*value)),
        Operand::Neg(inner) => match term(inner, cmp)? {
            Term::Bound(value) => Ok(Term::Bound(-value)),
            Term::Var => Err(malformed(cmp, "the variable cannot be negated")),
        },
        Operand::Unsupported(src) => Err(malformed(
            cmp,
            &format!("`{src}` is neither the variable nor a number"),
        )),
    }
}

fn malformed(cmp: &Comparison, reason: &str) -> CompileError {
    CompileError::MalformedGuard(format!(
        "`{cmp}`: {reason}; expected `x op c`, `c op x` or `c op x op c`"
    ))
}

fn compile_comparison(cmp: &Comparison) -> Result<Interval> {
    match cmp.rest.as_slice() {
        // x op c | c op x
        [(op, rhs)] => {
            let lhs = term(&cmp.first, cmp)?;
            let rhs = term(rhs, cmp)?;
            match (lhs, rhs) {
                (Term::Var, Term::Bound(bound)) => Ok(half_line(*op, bound)),
                (Term::Bound(bound), Term::Var) => Ok(half_line(op.flip(), bound)),
                _ => Err(malformed(cmp, "exactly one side must be the variable")),
            }
        }
        // c0 op0 x op1 c1
        [(op0, middle), (op1, outer)] => {
            if term(middle, cmp)? != Term::Var {
                return Err(malformed(cmp, "the middle term must be the variable"));
            }
            let (Term::Bound(first), Term::Bound(last)) =
                (term(&cmp.first, cmp)?, term(outer, cmp)?)
            else {
                return Err(malformed(cmp, "the outer terms must be numbers"));
            };
            let side = |op: CmpOp| {
                if op.is_inclusive() {
                    Bound::Closed
                } else {
                    Bound::Open
                }
            };

            if op0.is_less() && op1.is_less() {
                Ok(Interval::from_bounds(side(*op0), first, last, side(*op1)))
            } else if op0.is_greater() && op1.is_greater() {
                Ok(Interval::from_bounds(side(*op1), last, first, side(*op0)))
            } else {
                Err(malformed(
                    cmp,
                    "both operators of a chained comparison must point the same direction",
                ))
            }
        }
        _ => Err(malformed(
            cmp,
            &format!("found {} terms", cmp.token_count()),
        )),
    }
}

/// Values of `x` satisfying `x op bound`
fn half_line(op: CmpOp, bound: f64) -> Interval {
    match op {
        CmpOp::Lt => Interval::less_than(bound),
        CmpOp::Le => Interval::at_most(bound),
        CmpOp::Gt => Interval::greater_than(bound),
        CmpOp::Ge => Interval::at_least(bound),
        CmpOp::Eq => Interval::singleton(bound),
        CmpOp::Ne => !Interval::singleton(bound),
    }
}

// ============ Returns ============

/// Compile a return tree into an evaluator
///
/// The tree is validated once here; the evaluator then substitutes its
/// argument for the variable and walks the tree on every call.
pub fn compile_return(expr: &ReturnExpr) -> Result<Evaluator> {
    let degree = degree(expr)?;
    log::trace!("return {expr} (degree {degree})");

    let tree = Arc::new(expr.clone());
    Ok(Arc::new(move |x| substitute(&tree, x)))
}

/// Polynomial degree in the free variable, rejecting anything above one
fn degree(expr: &ReturnExpr) -> Result<u32> {
    let unsupported = CompileError::UnsupportedExpression;

    match expr {
        ReturnExpr::Constant(_) => Ok(0),
        ReturnExpr::Variable => Ok(1),
        ReturnExpr::Neg(inner) => match inner.as_ref() {
            ReturnExpr::Constant(_) | ReturnExpr::Variable => degree(inner),
            other => Err(unsupported(format!(
                "`-({other})`: negation applies only to the variable or a number"
            ))),
        },
        ReturnExpr::Binary(lhs, op, rhs) => {
            let (left, right) = (degree(lhs)?, degree(rhs)?);
            let combined = match op {
                ArithOp::Add | ArithOp::Sub => left.max(right),
                ArithOp::Mul => left + right,
                ArithOp::Div => {
                    if right > 0 {
                        return Err(unsupported(format!(
                            "`{expr}`: the variable cannot appear in a denominator"
                        )));
                    }
                    if substitute(rhs, 0.0) == 0.0 {
                        return Err(CompileError::DivisionByZero(format!("`{expr}`")));
                    }
                    left
                }
            };
            if combined > 1 {
                return Err(unsupported(format!(
                    "`{expr}` is not a zero or first degree polynomial"
                )));
            }
            Ok(combined)
        }
        ReturnExpr::Unsupported(src) => Err(unsupported(format!(
            "`{src}`: only numbers, the variable, unary minus and + - * / are supported"
        ))),
    }
}

fn substitute(expr: &ReturnExpr, x: f64) -> f64 {
    match expr {
        ReturnExpr::Constant(value) => *value,
        ReturnExpr::Variable => x,
        ReturnExpr::Neg(inner) => -substitute(inner, x),
        ReturnExpr::Binary(lhs, op, rhs) => op.apply(substitute(lhs, x), substitute(rhs, x)),
        // Rejected by `degree` before any evaluator exists
        ReturnExpr::Unsupported(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::core::Definition;
    use crate::parse::parse;
    use crate::transform::transform;

    fn definition(src: &str) -> Definition {
        transform(parse(src).unwrap()).unwrap()
    }

    fn guard(cond: &str) -> Result<Interval> {
        let def = definition(&format!("def f(x):\n  if {cond}:\n    return 0"));
        compile_guard(&def.guards[0])
    }

    fn ret(value: &str) -> Result<Evaluator> {
        let def = definition(&format!("def f(x):\n  return {value}"));
        compile_return(&def.returns[0])
    }

    #[test]
    fn half_lines_follow_variable_side() {
        assert_eq!(guard("x < 0").unwrap(), Interval::less_than(0.0));
        assert_eq!(guard("0 < x").unwrap(), Interval::greater_than(0.0));
        assert_eq!(guard("x >= 1.5").unwrap(), Interval::at_least(1.5));
        assert_eq!(guard("-2 >= x").unwrap(), Interval::at_most(-2.0));
    }

    #[test]
    fn equality_and_inequality() {
        assert_eq!(guard("x == -6").unwrap(), Interval::singleton(-6.0));
        assert_eq!(guard("6 == x").unwrap(), Interval::singleton(6.0));
        assert_eq!(
            guard("x != 3").unwrap(),
            Interval::less_than(3.0) | Interval::greater_than(3.0)
        );
    }

    #[test]
    fn chained_comparisons() {
        assert_eq!(guard("-5 < x < 0").unwrap(), Interval::open(-5.0, 0.0));
        assert_eq!(guard("1 <= x < 2").unwrap(), Interval::closed_open(1.0, 2.0));
        assert_eq!(guard("1 < x <= 2").unwrap(), Interval::open_closed(1.0, 2.0));
        assert_eq!(guard("1 <= x <= 2").unwrap(), Interval::closed(1.0, 2.0));
        assert_eq!(guard("20 > x >= 10").unwrap(), Interval::closed_open(10.0, 20.0));
        assert_eq!(guard("2 >= x > 0").unwrap(), Interval::open_closed(0.0, 2.0));
        assert!(guard("5 < x < 1").unwrap().is_empty());
    }

    #[test]
    fn boolean_combinations() {
        assert_eq!(
            guard("x < -4 and -10 <= x < 5 and x > -5").unwrap(),
            Interval::open(-5.0, -4.0)
        );
        assert_eq!(
            guard("x == 5 or x < -4 or 20 > x >= 10 or x == -0.2").unwrap(),
            Interval::singleton(5.0)
                | Interval::less_than(-4.0)
                | Interval::closed_open(10.0, 20.0)
                | Interval::singleton(-0.2)
        );
        assert!(guard("x == 5 and x < -4").unwrap().is_empty());
    }

    #[test]
    fn empty_children_reduce_to_empty() {
        assert!(compile_guard(&GuardExpr::And(vec![])).unwrap().is_empty());
        assert!(compile_guard(&GuardExpr::Or(vec![])).unwrap().is_empty());
    }

    #[test]
    fn malformed_guards() {
        assert!(matches!(guard("x"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("2 > abs(x) > 0"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("1 < x > 0"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("1 < 2 < x"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("x < x"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("1 < 2"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("0 < x < 1 < 2"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("-x < 1"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("x < t"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(guard("0 == x == 1"), Err(CompileError::MalformedGuard(_))));
        assert!(matches!(
            guard("x < 0 or not x > 1"),
            Err(CompileError::MalformedGuard(_))
        ));
    }

    #[test]
    fn negated_bounds() {
        assert_eq!(guard("x > -(-3)").unwrap(), Interval::greater_than(3.0));
        assert_eq!(guard("x <= +2").unwrap(), Interval::at_most(2.0));
        assert_eq!(guard("-1.5 < x").unwrap(), Interval::greater_than(-1.5));
    }

    #[test]
    fn linear_returns_evaluate() {
        assert_eq!(ret("6.").unwrap()(1.0), 6.0);
        assert_eq!(ret("2*x + 1").unwrap()(1.0), 3.0);
        assert_eq!(ret("-x").unwrap()(-20.0), 20.0);
        assert_eq!(ret("-5 - 10/2*x").unwrap()(5.0), -30.0);
        assert_eq!(ret("9*x - 6./3. - 8.5*x").unwrap()(-2.0), -3.0);
        assert_eq!(ret("3/4*x").unwrap()(4.0), 3.0);
        assert_eq!(ret("x / 2").unwrap()(3.0), 1.5);
        assert_eq!(ret("(x + 1) * 2").unwrap()(1.0), 4.0);
    }

    #[test]
    fn nonlinear_returns_are_rejected() {
        for src in [
            "x * x",
            "x**2",
            "abs(x)",
            "1 / x",
            "x / x",
            "2 * x * (x + 1)",
            "-(-x)",
            "-(x + 1)",
            "x % 2",
            "t",
        ] {
            assert!(
                matches!(ret(src), Err(CompileError::UnsupportedExpression(_))),
                "{src} should be rejected"
            );
        }
    }

    #[test]
    fn constant_zero_denominators_are_rejected() {
        for src in ["x / 0", "x / (1 - 1)", "3 / (2*0)"] {
            assert!(
                matches!(ret(src), Err(CompileError::DivisionByZero(_))),
                "{src} should be rejected"
            );
        }
        assert_eq!(ret("x / (1 - 2)").unwrap()(3.0), -3.0);
    }

    #[test]
    fn hand_built_trees() {
        let guard = GuardExpr::chain(-5.0, CmpOp::Lt, CmpOp::Lt, 0.0)
            .or(GuardExpr::chain(1.0, CmpOp::Le, CmpOp::Lt, 2.0));
        assert_eq!(
            compile_guard(&guard).unwrap(),
            Interval::open(-5.0, 0.0) | Interval::closed_open(1.0, 2.0)
        );

        let value = ReturnExpr::num(3.0).mul(ReturnExpr::var()).sub(ReturnExpr::num(1.0));
        assert_eq!(compile_return(&value).unwrap()(2.0), 5.0);
    }
}
