//! Columnar evaluation over polars Series
//!
//! Numeric columns are cast to `Float64`; string columns are parsed per row.
//! Null entries are not real numbers and fail with the row position, like
//! `None` does for [`PiecewiseFunction::apply`].

use polars::prelude::*;

use crate::eval::{EvalError, Extremum, ExtremumResult};
use crate::piecewise::PiecewiseFunction;

type Result<T> = std::result::Result<T, EvalError>;

impl PiecewiseFunction {
    /// Evaluate every row of `input`
    ///
    /// Returns a `Float64` Series with the input's name where undefined
    /// results are null.
    pub fn apply_series(&self, input: &Series) -> Result<Series> {
        let values = self.series_values(input)?;
        log::debug!(
            "applied {}-branch function to {} rows of '{}'",
            self.len(),
            values.len(),
            input.name()
        );
        Ok(Series::new(input.name().clone(), values))
    }

    /// Evaluate a named column of `df`
    pub fn apply_column(&self, df: &DataFrame, column: &str) -> Result<Series> {
        let column = df.column(column).map_err(|_| EvalError::MissingColumn {
            column: column.to_string(),
        })?;
        self.apply_series(column.as_materialized_series())
    }

    /// Leftmost extremum over the rows of `input`
    pub fn extremum_series(
        &self,
        input: &Series,
        sense: Extremum,
    ) -> Result<Option<ExtremumResult>> {
        self.extremum_series_with_sentinel(input, sense, sense.sentinel())
    }

    pub fn extremum_series_with_sentinel(
        &self,
        input: &Series,
        sense: Extremum,
        sentinel: f64,
    ) -> Result<Option<ExtremumResult>> {
        let values = self.series_values(input)?;
        Ok(sense.select(values, sentinel))
    }

    fn series_values(&self, input: &Series) -> Result<Vec<Option<f64>>> {
        let column_type = || EvalError::ColumnType {
            column: input.name().to_string(),
            dtype: input.dtype().to_string(),
        };

        match input.dtype() {
            DataType::String => {
                let strings = input.str().map_err(|_| column_type())?;
                self.apply(strings.iter()).collect()
            }
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => {
                let cast = input
                    .cast(&DataType::Float64)
                    .map_err(|_| column_type())?;
                let floats = cast.f64().map_err(|_| column_type())?;
                self.apply(floats.iter()).collect()
            }
            _ => Err(column_type()),
        }
    }
}
