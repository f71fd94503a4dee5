//! Pretty printing for definitions, expression trees and domains
//!
//! Surface definitions print back as parseable source, inserting
//! parentheses only where precedence requires them. Core trees print the
//! free variable as `x`.

use std::fmt::{self, Display};

use crate::ast::core::{ArithOp, Comparison, GuardExpr, Operand, ReturnExpr};
use crate::ast::surface::{Expr, FunctionDef, Stmt};
use crate::ast::{BinOp, BoolOp, CmpOp, UnaryOp};
use crate::interval::{Atomic, Bound, Interval};
use crate::piecewise::PiecewiseFunction;

const INDENT: &str = "    ";

// ============ Operators ============

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        };
        write!(f, "{}", s)
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

impl Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "and"),
            BoolOp::Or => write!(f, "or"),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Pos => write!(f, "+"),
            UnaryOp::Not => write!(f, "not "),
        }
    }
}

impl Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

// ============ Surface AST ============

/// Binding strength, loosest first; mirrors the parser's precedence ladder
mod prec {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const CMP: u8 = 4;
    pub const ADD: u8 = 5;
    pub const MUL: u8 = 6;
    pub const UNARY: u8 = 7;
    pub const POW: u8 = 8;
    pub const ATOM: u8 = 9;
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::BoolOp(BoolOp::Or, _) => prec::OR,
        Expr::BoolOp(BoolOp::And, _) => prec::AND,
        Expr::UnaryOp(UnaryOp::Not, _) => prec::NOT,
        Expr::Compare(..) => prec::CMP,
        Expr::BinaryOp(_, BinOp::Add | BinOp::Sub, _) => prec::ADD,
        Expr::BinaryOp(_, BinOp::Mul | BinOp::Div | BinOp::Mod, _) => prec::MUL,
        Expr::UnaryOp(UnaryOp::Neg | UnaryOp::Pos, _) => prec::UNARY,
        Expr::BinaryOp(_, BinOp::Pow, _) => prec::POW,
        Expr::Ident(_) | Expr::Number(_) | Expr::Call(..) => prec::ATOM,
    }
}

/// Write `expr`, parenthesized if it binds looser than `min`
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if precedence(expr) < min {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Number(value) => write!(f, "{}", value),
            Expr::UnaryOp(op, inner) => {
                let min = match op {
                    UnaryOp::Not => prec::NOT,
                    UnaryOp::Neg | UnaryOp::Pos => prec::UNARY,
                };
                write!(f, "{}", op)?;
                write_operand(f, inner, min)
            }
            Expr::BinaryOp(lhs, op, rhs) => {
                // Left-associative except `**`, whose base is a postfix expression
                let (left_min, right_min) = match op {
                    BinOp::Add | BinOp::Sub => (prec::ADD, prec::MUL),
                    BinOp::Mul | BinOp::Div | BinOp::Mod => (prec::MUL, prec::UNARY),
                    BinOp::Pow => (prec::ATOM, prec::UNARY),
                };
                write_operand(f, lhs, left_min)?;
                write!(f, " {} ", op)?;
                write_operand(f, rhs, right_min)
            }
            Expr::Compare(first, rest) => {
                write_operand(f, first, prec::ADD)?;
                for (op, operand) in rest {
                    write!(f, " {} ", op)?;
                    write_operand(f, operand, prec::ADD)?;
                }
                Ok(())
            }
            Expr::BoolOp(op, operands) => {
                let min = precedence(self) + 1;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    write_operand(f, operand, min)?;
                }
                Ok(())
            }
            Expr::Call(callee, args) => {
                write_operand(f, callee, prec::ATOM)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    let body = INDENT.repeat(depth + 1);
    match stmt {
        Stmt::If { test, then, orelse } => {
            write!(f, "{indent}if {test}:\n{body}return {then}")?;
            let mut tail = orelse.as_deref();
            while let Some(next) = tail {
                match next {
                    Stmt::If { test, then, orelse } => {
                        write!(f, "\n{indent}elif {test}:\n{body}return {then}")?;
                        tail = orelse.as_deref();
                    }
                    Stmt::Return(value) => {
                        write!(f, "\n{indent}else:\n{body}return {value}")?;
                        tail = None;
                    }
                    Stmt::Assign(..) => {
                        writeln!(f, "\n{indent}else:")?;
                        write_stmt(f, next, depth + 1)?;
                        tail = None;
                    }
                }
            }
            Ok(())
        }
        Stmt::Return(value) => write!(f, "{indent}return {value}"),
        Stmt::Assign(name, value) => write!(f, "{indent}{name} = {value}"),
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def {}({}):", self.name, self.param)?;
        for stmt in &self.body {
            writeln!(f)?;
            write_stmt(f, stmt, 1)?;
        }
        Ok(())
    }
}

// ============ Core AST ============

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable => write!(f, "x"),
            Operand::Constant(value) => write!(f, "{}", value),
            Operand::Neg(inner) => write!(f, "-{}", inner),
            Operand::Unsupported(src) => write!(f, "{}", src),
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, operand) in &self.rest {
            write!(f, " {} {}", op, operand)?;
        }
        Ok(())
    }
}

impl Display for GuardExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardExpr::And(children) => write_children(f, children, "and"),
            GuardExpr::Or(children) => write_children(f, children, "or"),
            GuardExpr::Compare(cmp) => write!(f, "{}", cmp),
            GuardExpr::Unsupported(src) => write!(f, "{}", src),
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[GuardExpr], op: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        match child {
            // `or` binds looser than `and`, and nested groups keep their shape
            GuardExpr::And(_) | GuardExpr::Or(_) => write!(f, "({})", child)?,
            _ => write!(f, "{}", child)?,
        }
    }
    Ok(())
}

fn return_precedence(expr: &ReturnExpr) -> u8 {
    match expr {
        ReturnExpr::Binary(_, ArithOp::Add | ArithOp::Sub, _) => prec::ADD,
        ReturnExpr::Binary(_, ArithOp::Mul | ArithOp::Div, _) => prec::MUL,
        ReturnExpr::Neg(_) => prec::UNARY,
        ReturnExpr::Constant(_) | ReturnExpr::Variable => prec::ATOM,
        ReturnExpr::Unsupported(_) => 0,
    }
}

fn write_return_operand(f: &mut fmt::Formatter<'_>, expr: &ReturnExpr, min: u8) -> fmt::Result {
    if return_precedence(expr) < min {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl Display for ReturnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnExpr::Constant(value) => write!(f, "{}", value),
            ReturnExpr::Variable => write!(f, "x"),
            ReturnExpr::Neg(inner) => {
                write!(f, "-")?;
                write_return_operand(f, inner, prec::UNARY)
            }
            ReturnExpr::Binary(lhs, op, rhs) => {
                let (left_min, right_min) = match op {
                    ArithOp::Add | ArithOp::Sub => (prec::ADD, prec::MUL),
                    ArithOp::Mul | ArithOp::Div => (prec::MUL, prec::UNARY),
                };
                write_return_operand(f, lhs, left_min)?;
                write!(f, " {} ", op)?;
                write_return_operand(f, rhs, right_min)
            }
            ReturnExpr::Unsupported(src) => write!(f, "{}", src),
        }
    }
}

// ============ Domains ============

fn write_endpoint(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == f64::INFINITY {
        write!(f, "+inf")
    } else if value == f64::NEG_INFINITY {
        write!(f, "-inf")
    } else {
        write!(f, "{}", value)
    }
}

impl Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower() == self.upper() {
            return write!(f, "{{{}}}", self.lower());
        }
        let open = match self.left() {
            Bound::Open => '(',
            Bound::Closed => '[',
        };
        let close = match self.right() {
            Bound::Open => ')',
            Bound::Closed => ']',
        };
        write!(f, "{open}")?;
        write_endpoint(f, self.lower())?;
        write!(f, ",")?;
        write_endpoint(f, self.upper())?;
        write!(f, "{close}")
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "()");
        }
        for (i, atom) in self.atoms().iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", atom)?;
        }
        Ok(())
    }
}

impl Display for PiecewiseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.len().saturating_sub(1);
        for (i, branch) in self.branches().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} -> branch {}", branch.domain(), i)?;
            if i == last && self.has_otherwise() {
                write!(f, " (otherwise)")?;
            }
        }
        Ok(())
    }
}
