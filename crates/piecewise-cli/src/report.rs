//! Evaluation report rendered as text or JSON

use std::fmt;

use piecewise::{ExtremumResult, PiecewiseFunction};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    pub name: String,
    pub branches: Vec<BranchReport>,
    pub values: Vec<Option<f64>>,
    pub argmin: Option<ExtremumReport>,
    pub argmax: Option<ExtremumReport>,
}

#[derive(Debug, Serialize)]
pub struct BranchReport {
    pub domain: String,
    pub otherwise: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtremumReport {
    pub index: usize,
    pub value: Option<f64>,
}

impl From<ExtremumResult> for ExtremumReport {
    fn from(result: ExtremumResult) -> Self {
        Self {
            index: result.index,
            value: result.value,
        }
    }
}

impl Report {
    pub fn new(
        name: impl Into<String>,
        function: &PiecewiseFunction,
        values: Vec<Option<f64>>,
        argmin: Option<ExtremumResult>,
        argmax: Option<ExtremumResult>,
    ) -> Self {
        let last = function.len().saturating_sub(1);
        let branches = function
            .domains()
            .into_iter()
            .enumerate()
            .map(|(i, domain)| BranchReport {
                domain: domain.to_string(),
                otherwise: function.has_otherwise() && i == last,
            })
            .collect();

        Self {
            name: name.into(),
            branches,
            values,
            argmin: argmin.map(Into::into),
            argmax: argmax.map(Into::into),
        }
    }
}

struct Value(Option<f64>);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "undefined"),
        }
    }
}

fn write_extremum(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    result: &Option<ExtremumReport>,
) -> fmt::Result {
    match result {
        Some(r) => writeln!(f, "{label}: index {}, value {}", r.index, Value(r.value)),
        None => writeln!(f, "{label}: no input"),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (i, branch) in self.branches.iter().enumerate() {
            let marker = if branch.otherwise { " (otherwise)" } else { "" };
            writeln!(f, "  branch {i}: {}{marker}", branch.domain)?;
        }
        if self.values.is_empty() {
            return Ok(());
        }

        let values: Vec<String> = self.values.iter().map(|v| Value(*v).to_string()).collect();
        writeln!(f, "values: {}", values.join(" "))?;
        write_extremum(f, "argmin", &self.argmin)?;
        write_extremum(f, "argmax", &self.argmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> PiecewiseFunction {
        piecewise::compile(
            "def demo(x):
                if x < 0:
                    return -x
                elif x == 6:
                    return 7 / 8",
        )
        .unwrap()
    }

    #[test]
    fn text_report_shows_undefined() {
        let f = demo();
        let xs = [-2.0, 3.0];
        let values = f.apply(xs).collect::<Result<Vec<_>, _>>().unwrap();
        let report = Report::new(
            "demo",
            &f,
            values,
            f.argmin(xs).unwrap(),
            f.argmax(xs).unwrap(),
        );

        let text = report.to_string();
        assert!(text.starts_with("demo\n  branch 0: (-inf,0)\n  branch 1: {6}\n"));
        assert!(text.contains("values: 2 undefined"));
        assert!(text.contains("argmin: index 0, value 2"));
        assert!(!text.contains("otherwise"));
    }

    #[test]
    fn json_report_uses_null_for_undefined() {
        let f = piecewise::compile("def g(x):\n    if x > 1:\n        return x\n    return 0")
            .unwrap();
        let report = Report::new("g", &f, vec![Some(2.0), None], None, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["values"], serde_json::json!([2.0, null]));
        assert_eq!(json["branches"][1]["otherwise"], serde_json::json!(true));
        assert_eq!(json["branches"][1]["domain"], serde_json::json!("(-inf,1]"));
        assert!(json["argmin"].is_null());
    }
}
