//! Piecewise CLI
//!
//! Compiles a definition file and evaluates it over inline values or a
//! column of a tabular file.

mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use piecewise::{Extremum, ExtremumResult, PiecewiseFunction};
use polars::prelude::*;

use crate::report::Report;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "piecewise")]
#[command(about = "Compile and evaluate piecewise function definitions")]
#[command(after_help = "\
EXAMPLES:
    # Show the branch domains of a definition
    piecewise demos/demo.def

    # Evaluate inline values
    piecewise demos/demo.def --values=-6,2,3,5,5,7,0.3

    # Evaluate a column of a csv/parquet/ipc file, as JSON
    piecewise demos/demo.def --input demos/samples.csv --column x --format json
")]
struct Args {
    /// File holding a single `def name(x): ...` definition
    definition: PathBuf,

    /// Comma-separated inputs to evaluate
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "input")]
    values: Vec<String>,

    /// Parquet/csv/ipc file to read inputs from
    #[arg(long, requires = "column")]
    input: Option<PathBuf>,

    /// Column of --input to evaluate
    #[arg(long, requires = "input")]
    column: Option<String>,

    /// Value compared in place of undefined results when selecting the minimum
    #[arg(long, allow_hyphen_values = true, default_value_t = f64::INFINITY)]
    min_sentinel: f64,

    /// Value compared in place of undefined results when selecting the maximum
    #[arg(long, allow_hyphen_values = true, default_value_t = f64::NEG_INFINITY)]
    max_sentinel: f64,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

struct Evaluation {
    values: Vec<Option<f64>>,
    argmin: Option<ExtremumResult>,
    argmax: Option<ExtremumResult>,
}

impl Evaluation {
    /// Select both extrema from results evaluated once
    fn new(values: Vec<Option<f64>>, args: &Args) -> Self {
        let argmin = Extremum::Min.select(values.iter().copied(), args.min_sentinel);
        let argmax = Extremum::Max.select(values.iter().copied(), args.max_sentinel);
        Self {
            values,
            argmin,
            argmax,
        }
    }
}

/// Scan a parquet, csv or ipc file, picked by extension
fn scan_table(path: &Path) -> anyhow::Result<LazyFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    let lf = match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(pl_path, Default::default())?,
        Some("csv") => LazyCsvReader::new(pl_path).finish()?,
        Some("ipc" | "arrow") => {
            LazyFrame::scan_ipc(pl_path, Default::default(), Default::default())?
        }
        Some(ext) => bail!("unsupported input format `.{ext}` (expected parquet, csv or ipc)"),
        None => bail!("cannot infer the input format without a file extension"),
    };
    Ok(lf)
}

fn evaluate_values(function: &PiecewiseFunction, args: &Args) -> anyhow::Result<Evaluation> {
    let values = function
        .apply(&args.values)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Evaluation::new(values, args))
}

fn evaluate_column(
    function: &PiecewiseFunction,
    args: &Args,
    input: &Path,
    column: &str,
) -> anyhow::Result<Evaluation> {
    // Only the evaluated column is materialized.
    let df = scan_table(input)
        .and_then(|lf| Ok(lf.select([col(column)]).collect()?))
        .with_context(|| format!("Failed to load column `{column}` of {}", input.display()))?;
    log::info!("Loaded {} rows from {}", df.height(), input.display());

    let series = function.apply_column(&df, column)?;
    let values = series.f64()?.into_iter().collect();
    Ok(Evaluation::new(values, args))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let source = std::fs::read_to_string(&args.definition)
        .with_context(|| format!("Failed to read {}", args.definition.display()))?;
    let surface = piecewise::advanced::parse(&source)
        .with_context(|| format!("Failed to parse {}", args.definition.display()))?;
    let definition = piecewise::advanced::transform(surface)?;
    let name = definition.name.clone();
    let function = PiecewiseFunction::from_definition(&definition)
        .with_context(|| format!("Failed to compile {name}"))?;
    log::info!("Compiled {} with {} branches", name, function.len());

    let evaluation = match (&args.input, &args.column) {
        (Some(input), Some(column)) => evaluate_column(&function, &args, input, column)?,
        _ => evaluate_values(&function, &args)?,
    };

    let report = Report::new(
        name,
        &function,
        evaluation.values,
        evaluation.argmin,
        evaluation.argmax,
    );
    match args.format {
        Format::Text => print!("{report}"),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(["piecewise", "demo.def"].into_iter().chain(extra.iter().copied()))
    }

    #[test]
    fn extrema_come_from_one_evaluation() {
        let function = piecewise::compile(
            "def f(x):
                if x > 0:
                    return x
                elif x < -5:
                    return 0",
        )
        .unwrap();
        let args = args(&["--values=-1,3,-6,2"]);

        let evaluation = evaluate_values(&function, &args).unwrap();
        assert_eq!(evaluation.values, vec![None, Some(3.0), Some(0.0), Some(2.0)]);
        assert_eq!(evaluation.argmin.map(|r| r.index), Some(2));
        assert_eq!(evaluation.argmax.map(|r| r.index), Some(1));
    }

    #[test]
    fn sentinels_come_from_arguments() {
        let values = vec![Some(1.0), None];
        let evaluation = Evaluation::new(values, &args(&["--min-sentinel=-1"]));
        assert_eq!(evaluation.argmin.map(|r| r.index), Some(1));
        assert_eq!(evaluation.argmax.map(|r| r.index), Some(0));
    }

    #[test]
    fn unknown_table_formats_are_rejected() {
        let err = scan_table(Path::new("inputs.xlsx")).err().expect("expected an error");
        assert!(err.to_string().contains("`.xlsx`"));
        assert!(scan_table(Path::new("inputs")).is_err());
    }
}
