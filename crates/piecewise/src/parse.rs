//! Parser for piecewise function definitions
//!
//! Accepts a Python-like definition whose body is an `if`/`elif`/`else`
//! chain of single `return` statements:
//!
//! ```text
//! def f(x):
//!     if -5 < x < 0 or 1 <= x < 2:
//!         return 2
//!     elif x == -6:
//!         return 7 / 8
//!     return 3/4*x
//! ```
//!
//! Indentation is not significant because every branch body is exactly one
//! `return`. Produces surface::FunctionDef which is then transformed into a
//! core::Definition before compilation.

use winnow::ascii::{digit0, digit1, multispace0, space0};
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::ast::surface::{Expr, FunctionDef, Stmt};
use crate::ast::{BinOp, BoolOp, CmpOp, UnaryOp};

type PResult<T> = winnow::ModalResult<T>;

const KEYWORDS: &[&str] = &["def", "if", "elif", "else", "return", "and", "or", "not"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {}, offset {})",
            self.message, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for ParseError {}

/// Parse a function definition from source text
pub fn parse(input: &str) -> Result<FunctionDef, ParseError> {
    let mut stream = input;
    match function_def.parse_next(&mut stream) {
        Ok(parsed) => {
            if stream.trim().is_empty() {
                Ok(parsed)
            } else {
                let offset = trailing_input_offset(input, stream);
                Err(build_parse_error(
                    "unexpected trailing input".to_string(),
                    input,
                    offset,
                ))
            }
        }
        Err(e) => {
            let offset = input.len().saturating_sub(stream.len());
            Err(build_parse_error(describe(&e), input, offset))
        }
    }
}

/// Parse a standalone expression (a guard or a return value)
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut stream = input.trim();
    let trimmed = stream;
    match expr.parse_next(&mut stream) {
        Ok(parsed) if stream.trim().is_empty() => Ok(parsed),
        Ok(_) => {
            let offset = trailing_input_offset(trimmed, stream);
            Err(build_parse_error(
                "unexpected trailing input".to_string(),
                trimmed,
                offset,
            ))
        }
        Err(e) => {
            let offset = trimmed.len().saturating_sub(stream.len());
            Err(build_parse_error(describe(&e), trimmed, offset))
        }
    }
}

fn describe(err: &ErrMode<ContextError>) -> String {
    match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let message = e.to_string();
            if message.is_empty() {
                "invalid syntax".to_string()
            } else {
                message.replace('\n', "; ")
            }
        }
        ErrMode::Incomplete(_) => "incomplete input".to_string(),
    }
}

fn build_parse_error(message: String, input: &str, offset: usize) -> ParseError {
    let (line, column) = offset_to_line_column(input, offset);
    ParseError {
        message,
        offset,
        line,
        column,
    }
}

fn offset_to_line_column(input: &str, offset: usize) -> (usize, usize) {
    let bounded = offset.min(input.len());
    let mut line = 1usize;
    let mut column = 1usize;

    for ch in input[..bounded].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

fn trailing_input_offset(input: &str, trailing: &str) -> usize {
    let base = input.len().saturating_sub(trailing.len());
    let non_ws = trailing
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    base + non_ws
}

// ============ Definition and statements ============

fn function_def(input: &mut &str) -> PResult<FunctionDef> {
    ws.parse_next(input)?;
    keyword("def").parse_next(input)?;
    hs.parse_next(input)?;
    let name = cut_err(ident_str)
        .context(StrContext::Label("function name"))
        .parse_next(input)?;
    (hs, '(', hs).parse_next(input)?;
    let param = cut_err(ident_str)
        .context(StrContext::Label("parameter"))
        .parse_next(input)?;
    opt(annotation).parse_next(input)?;
    (hs, ')').parse_next(input)?;
    opt((hs, "->", hs, ident_str)).parse_next(input)?;
    (hs, ':').parse_next(input)?;

    let body: Vec<Stmt> = repeat(1.., preceded(ws, stmt))
        .context(StrContext::Label("function body"))
        .parse_next(input)?;
    ws.parse_next(input)?;

    Ok(FunctionDef { name, param, body })
}

/// Type annotation on the parameter: `x: float`
fn annotation(input: &mut &str) -> PResult<String> {
    preceded((hs, ':', hs), ident_str).parse_next(input)
}

fn stmt(input: &mut &str) -> PResult<Stmt> {
    alt((if_stmt, return_stmt, assign_stmt))
        .context(StrContext::Label("statement"))
        .parse_next(input)
}

fn if_stmt(input: &mut &str) -> PResult<Stmt> {
    let (test, then) = preceded(keyword("if"), cut_err(branch)).parse_next(input)?;
    let elifs: Vec<(Expr, Expr)> =
        repeat(0.., preceded((ws, keyword("elif")), cut_err(branch))).parse_next(input)?;
    let otherwise: Option<Expr> = opt(preceded(
        (ws, keyword("else")),
        cut_err(preceded((hs, ':', ws), return_body)),
    ))
    .parse_next(input)?;

    // elif chains nest right-to-left: `if a .. elif b .. else c` is If(a, orelse: If(b, orelse: c))
    let tail = otherwise.map(|value| Box::new(Stmt::Return(value)));
    let orelse = elifs.into_iter().rev().fold(tail, |orelse, (test, then)| {
        Some(Box::new(Stmt::If { test, then, orelse }))
    });

    Ok(Stmt::If { test, then, orelse })
}

/// `<test>: return <value>`
fn branch(input: &mut &str) -> PResult<(Expr, Expr)> {
    (hs, expr, hs, ':', ws, return_body)
        .map(|(_, test, _, _, _, then)| (test, then))
        .parse_next(input)
}

fn return_body(input: &mut &str) -> PResult<Expr> {
    preceded((keyword("return"), hs), cut_err(expr))
        .context(StrContext::Label("return statement"))
        .parse_next(input)
}

fn return_stmt(input: &mut &str) -> PResult<Stmt> {
    return_body.map(Stmt::Return).parse_next(input)
}

fn assign_stmt(input: &mut &str) -> PResult<Stmt> {
    (ident_str, hs, '=', not('='), hs, cut_err(expr))
        .map(|(name, _, _, _, _, value)| Stmt::Assign(name, value))
        .parse_next(input)
}

// ============ Expressions (handles precedence) ============

fn expr(input: &mut &str) -> PResult<Expr> {
    or_expr.parse_next(input)
}

fn or_expr(input: &mut &str) -> PResult<Expr> {
    let first = and_expr.parse_next(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((hs, keyword("or"), hs), and_expr)).parse_next(input)?;
    Ok(bool_op(BoolOp::Or, first, rest))
}

fn and_expr(input: &mut &str) -> PResult<Expr> {
    let first = not_expr.parse_next(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((hs, keyword("and"), hs), not_expr)).parse_next(input)?;
    Ok(bool_op(BoolOp::And, first, rest))
}

fn bool_op(op: BoolOp, first: Expr, rest: Vec<Expr>) -> Expr {
    if rest.is_empty() {
        return first;
    }
    let mut operands = Vec::with_capacity(rest.len() + 1);
    operands.push(first);
    operands.extend(rest);
    Expr::BoolOp(op, operands)
}

fn not_expr(input: &mut &str) -> PResult<Expr> {
    alt((
        preceded((keyword("not"), hs), not_expr)
            .map(|e| Expr::UnaryOp(UnaryOp::Not, Box::new(e))),
        cmp_expr,
    ))
    .parse_next(input)
}

fn cmp_expr(input: &mut &str) -> PResult<Expr> {
    let first = add_expr.parse_next(input)?;
    let rest: Vec<(CmpOp, Expr)> =
        repeat(0.., (hs, cmp_op, hs, add_expr).map(|(_, op, _, e)| (op, e))).parse_next(input)?;
    if rest.is_empty() {
        Ok(first)
    } else {
        Ok(Expr::Compare(Box::new(first), rest))
    }
}

fn cmp_op(input: &mut &str) -> PResult<CmpOp> {
    alt((
        "==".value(CmpOp::Eq),
        "!=".value(CmpOp::Ne),
        "<=".value(CmpOp::Le),
        ">=".value(CmpOp::Ge),
        "<".value(CmpOp::Lt),
        ">".value(CmpOp::Gt),
    ))
    .parse_next(input)
}

fn add_expr(input: &mut &str) -> PResult<Expr> {
    let first = mul_expr.parse_next(input)?;
    let rest: Vec<(BinOp, Expr)> =
        repeat(0.., (hs, add_op, hs, mul_expr).map(|(_, op, _, e)| (op, e))).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, (op, r)| {
        Expr::BinaryOp(Box::new(l), op, Box::new(r))
    }))
}

fn add_op(input: &mut &str) -> PResult<BinOp> {
    alt(('+'.value(BinOp::Add), '-'.value(BinOp::Sub))).parse_next(input)
}

fn mul_expr(input: &mut &str) -> PResult<Expr> {
    let first = unary_expr.parse_next(input)?;
    let rest: Vec<(BinOp, Expr)> = repeat(
        0..,
        (hs, mul_op, hs, unary_expr).map(|(_, op, _, e)| (op, e)),
    )
    .parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, (op, r)| {
        Expr::BinaryOp(Box::new(l), op, Box::new(r))
    }))
}

fn mul_op(input: &mut &str) -> PResult<BinOp> {
    alt((
        terminated('*', not('*')).value(BinOp::Mul),
        terminated('/', not('/')).value(BinOp::Div),
        '%'.value(BinOp::Mod),
    ))
    .parse_next(input)
}

fn unary_expr(input: &mut &str) -> PResult<Expr> {
    alt((
        preceded(('-', hs), unary_expr).map(|e| Expr::UnaryOp(UnaryOp::Neg, Box::new(e))),
        preceded(('+', hs), unary_expr).map(|e| Expr::UnaryOp(UnaryOp::Pos, Box::new(e))),
        power_expr,
    ))
    .parse_next(input)
}

/// `base ** exponent`, right-associative and tighter than a leading unary minus
fn power_expr(input: &mut &str) -> PResult<Expr> {
    let base = postfix_expr.parse_next(input)?;
    let exponent = opt(preceded((hs, "**", hs), unary_expr)).parse_next(input)?;
    Ok(match exponent {
        Some(exp) => Expr::BinaryOp(Box::new(base), BinOp::Pow, Box::new(exp)),
        None => base,
    })
}

fn postfix_expr(input: &mut &str) -> PResult<Expr> {
    let base = primary.parse_next(input)?;
    let calls: Vec<Vec<Expr>> = repeat(0.., preceded(hs, call_args)).parse_next(input)?;
    Ok(calls
        .into_iter()
        .fold(base, |callee, args| Expr::Call(Box::new(callee), args)))
}

fn call_args(input: &mut &str) -> PResult<Vec<Expr>> {
    delimited(
        ('(', ws),
        opt(terminated(
            separated(1.., expr, (hs, ',', ws)),
            opt((hs, ',')), // trailing comma
        ))
        .map(|args: Option<Vec<Expr>>| args.unwrap_or_default()),
        (ws, ')'),
    )
    .parse_next(input)
}

// ============ Primary expressions ============

fn primary(input: &mut &str) -> PResult<Expr> {
    alt((
        paren_expr,
        number.map(Expr::Number),
        ident_str.map(Expr::Ident),
    ))
    .context(StrContext::Label("expression"))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> PResult<Expr> {
    delimited(('(', ws), expr, (ws, ')')).parse_next(input)
}

/// `12`, `6.`, `.5`, `8.5`, `1e-3`
fn number(input: &mut &str) -> PResult<f64> {
    alt((
        (digit1, opt(('.', digit0)), opt(exponent)).take(),
        ('.', digit1, opt(exponent)).take(),
    ))
    .try_map(|s: &str| s.parse::<f64>())
    .parse_next(input)
}

fn exponent(input: &mut &str) -> PResult<()> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)
        .void()
        .parse_next(input)
}

// ============ Identifiers and keywords ============

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident_str(input: &mut &str) -> PResult<String> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .verify(|s: &str| !KEYWORDS.contains(&s))
        .map(str::to_string)
        .parse_next(input)
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut &'a str) -> PResult<&'a str> {
    move |input: &mut &'a str| terminated(kw, not(one_of(is_ident_char))).parse_next(input)
}

// ============ Whitespace ============

/// Horizontal whitespace inside a line
fn hs(input: &mut &str) -> PResult<()> {
    space0.void().parse_next(input)
}

/// Any whitespace, newlines and `#` comments between statements
fn ws(input: &mut &str) -> PResult<()> {
    loop {
        multispace0.void().parse_next(input)?;
        match input.strip_prefix('#') {
            Some(rest) => {
                let end = rest.find('\n').unwrap_or(rest.len());
                *input = &rest[end..];
            }
            None => return Ok(()),
        }
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs

#[cfg(test)]
mod tests {
    use super::*;

    fn single_return(src: &str) -> Expr {
        let def = parse(src).unwrap();
        match def.body.as_slice() {
            [Stmt::Return(e)] => e.clone(),
            other => panic!("Expected a single return, got {:?}", other),
        }
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_expr("12").unwrap(), Expr::Number(12.0));
        assert_eq!(parse_expr("6.").unwrap(), Expr::Number(6.0));
        assert_eq!(parse_expr(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse_expr("1e-3").unwrap(), Expr::Number(0.001));
    }

    #[test]
    fn parse_operator_precedence() {
        // 3*x - 1 should parse as (3 * x) - 1
        let result = parse_expr("3*x - 1").unwrap();
        if let Expr::BinaryOp(left, BinOp::Sub, _) = result {
            assert!(matches!(*left, Expr::BinaryOp(_, BinOp::Mul, _)));
        } else {
            panic!("Expected Sub at top level");
        }

        // a and b or c should parse as (a and b) or c
        let result = parse_expr("x > 1 and x < 2 or x == 5").unwrap();
        if let Expr::BoolOp(BoolOp::Or, operands) = result {
            assert!(matches!(operands[0], Expr::BoolOp(BoolOp::And, _)));
        } else {
            panic!("Expected Or at top level");
        }

        // -x**2 is -(x**2)
        let result = parse_expr("-x**2").unwrap();
        assert!(matches!(
            result,
            Expr::UnaryOp(UnaryOp::Neg, ref inner) if matches!(**inner, Expr::BinaryOp(_, BinOp::Pow, _))
        ));
    }

    #[test]
    fn parse_comparison_chain() {
        let result = parse_expr("-5 < x <= 0").unwrap();
        if let Expr::Compare(first, rest) = result {
            assert_eq!(*first, Expr::Number(5.0).neg());
            assert_eq!(rest.len(), 2);
            assert_eq!(rest[0].0, CmpOp::Lt);
            assert_eq!(rest[1].0, CmpOp::Le);
        } else {
            panic!("Expected comparison");
        }
    }

    #[test]
    fn parse_bool_chain_is_flat() {
        let result = parse_expr("x == 5 or x < -4 or x == 1").unwrap();
        assert!(matches!(result, Expr::BoolOp(BoolOp::Or, ref v) if v.len() == 3));
    }

    #[test]
    fn parse_if_elif_else() {
        let def = parse(
            "def f(x):
                if x < 0:
                    return -x
                elif x == 6:
                    return 7 / 8
                else:
                    return 5",
        )
        .unwrap();
        assert_eq!(def.name, "f");
        assert_eq!(def.param, "x");
        assert_eq!(def.body.len(), 1);

        let Stmt::If { orelse, .. } = &def.body[0] else {
            panic!("Expected if statement");
        };
        let Some(elif) = orelse else {
            panic!("Expected elif");
        };
        assert!(matches!(
            elif.as_ref(),
            Stmt::If { orelse: Some(tail), .. } if matches!(tail.as_ref(), Stmt::Return(_))
        ));
    }

    #[test]
    fn parse_annotations_and_comments() {
        let def = parse(
            "# leading comment
            def ret_lin(x: float) -> float:
                return 2*x + 1  # trailing comment",
        )
        .unwrap();
        assert_eq!(def.name, "ret_lin");
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn parse_one_line_branches() {
        let def = parse("def f(x):\n  if x >= 0: return 1\n  return 0").unwrap();
        assert_eq!(def.body.len(), 2);
    }

    #[test]
    fn parse_assignment_statement() {
        let def = parse("def f(x):\n  t = -1\n  return 7.").unwrap();
        assert!(matches!(def.body[0], Stmt::Assign(ref name, _) if name == "t"));
    }

    #[test]
    fn parse_call() {
        let result = single_return("def f(x):\n  return abs(x)");
        assert!(matches!(result, Expr::Call(_, ref args) if args.len() == 1));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(parse_expr("x and").is_err());
        assert!(matches!(parse_expr("android").unwrap(), Expr::Ident(ref s) if s == "android"));
    }

    #[test]
    fn parse_error_reports_position() {
        let err = parse("def f(x):\n  if x < 0:\n    return $").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.column > 1);
    }

    #[test]
    fn parse_rejects_lambda() {
        assert!(parse("f = lambda x: x").is_err());
    }
}
