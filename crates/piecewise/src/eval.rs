//! Evaluation engine
//!
//! Applies a [`PiecewiseFunction`] to scalar or batch input. Each input is
//! cast to `f64`, routed to the first branch whose domain contains it, and
//! evaluated. Inputs outside every domain yield `None` ("undefined"); inputs
//! that are not real numbers yield [`EvalError::InputType`] and end the
//! sequence.

use std::fmt;
use std::iter;

use thiserror::Error;

use crate::piecewise::PiecewiseFunction;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Input at position {index} is not a real number: {value}")]
    InputType { index: usize, value: String },

    #[error("Column '{column}' of type {dtype} cannot be read as real numbers")]
    ColumnType { column: String, dtype: String },

    #[error("Column '{column}' not found")]
    MissingColumn { column: String },
}

type Result<T> = std::result::Result<T, EvalError>;

// ============ Casting input ============

/// Values that may be interpreted as a real number
pub trait ToReal: fmt::Debug {
    /// `None` when the value has no real interpretation
    fn to_real(&self) -> Option<f64>;
}

macro_rules! impl_to_real_lossless {
    ($($ty:ty),*) => {
        $(
            impl ToReal for $ty {
                fn to_real(&self) -> Option<f64> {
                    Some(f64::from(*self))
                }
            }
        )*
    };
}

macro_rules! impl_to_real_as {
    ($($ty:ty),*) => {
        $(
            impl ToReal for $ty {
                fn to_real(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

impl_to_real_lossless!(f64, f32, i8, i16, i32, u8, u16, u32);
impl_to_real_as!(i64, u64, i128, u128, isize, usize);

impl ToReal for str {
    fn to_real(&self) -> Option<f64> {
        self.trim().parse().ok()
    }
}

impl ToReal for String {
    fn to_real(&self) -> Option<f64> {
        self.as_str().to_real()
    }
}

impl<T: ToReal> ToReal for Option<T> {
    fn to_real(&self) -> Option<f64> {
        self.as_ref().and_then(ToReal::to_real)
    }
}

impl<T: ToReal + ?Sized> ToReal for &T {
    fn to_real(&self) -> Option<f64> {
        (**self).to_real()
    }
}

impl ToReal for serde_json::Value {
    fn to_real(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.to_real(),
            _ => None,
        }
    }
}

// ============ Apply ============

/// Lazy, single-pass evaluation over an input sequence
///
/// Yields one `Ok(Some(value))` or `Ok(None)` per input, in input order.
/// After the first input that is not a real number it yields that error
/// and then nothing more.
pub struct Apply<'a, I> {
    function: &'a PiecewiseFunction,
    input: I,
    index: usize,
    failed: bool,
}

impl<I> Iterator for Apply<'_, I>
where
    I: Iterator,
    I::Item: ToReal,
{
    type Item = Result<Option<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.input.next()?;
        let index = self.index;
        self.index += 1;

        match item.to_real() {
            Some(x) => Some(Ok(self.function.evaluate(x))),
            None => {
                self.failed = true;
                Some(Err(EvalError::InputType {
                    index,
                    value: format!("{item:?}"),
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, self.input.size_hint().1)
        }
    }
}

impl<I> iter::FusedIterator for Apply<'_, I>
where
    I: iter::FusedIterator,
    I::Item: ToReal,
{
}

impl PiecewiseFunction {
    /// Evaluate at a real `x`: `None` when no domain contains it
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        self.branch_for(x).map(|branch| branch.evaluate(x))
    }

    /// Cast and evaluate a single value
    pub fn eval<T: ToReal>(&self, x: T) -> Result<Option<f64>> {
        self.apply_scalar(x).next().unwrap_or(Ok(None))
    }

    /// Lazily evaluate every element of `input`
    pub fn apply<I>(&self, input: I) -> Apply<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: ToReal,
    {
        Apply {
            function: self,
            input: input.into_iter(),
            index: 0,
            failed: false,
        }
    }

    /// A scalar as a one-element sequence
    pub fn apply_scalar<T: ToReal>(&self, x: T) -> Apply<'_, iter::Once<T>> {
        self.apply(iter::once(x))
    }

    // ============ Extremum ============

    /// Position and value of the smallest or largest result
    ///
    /// Undefined results compare as [`Extremum::sentinel`]. Returns `None`
    /// for empty input.
    pub fn extremum<I>(&self, input: I, sense: Extremum) -> Result<Option<ExtremumResult>>
    where
        I: IntoIterator,
        I::Item: ToReal,
    {
        self.extremum_with_sentinel(input, sense, sense.sentinel())
    }

    /// Like [`extremum`](Self::extremum), comparing undefined results as `sentinel`
    pub fn extremum_with_sentinel<I>(
        &self,
        input: I,
        sense: Extremum,
        sentinel: f64,
    ) -> Result<Option<ExtremumResult>>
    where
        I: IntoIterator,
        I::Item: ToReal,
    {
        let values = self.apply(input).collect::<Result<Vec<_>>>()?;
        Ok(sense.select(values, sentinel))
    }

    pub fn argmin<I>(&self, input: I) -> Result<Option<ExtremumResult>>
    where
        I: IntoIterator,
        I::Item: ToReal,
    {
        self.extremum(input, Extremum::Min)
    }

    pub fn argmax<I>(&self, input: I) -> Result<Option<ExtremumResult>>
    where
        I: IntoIterator,
        I::Item: ToReal,
    {
        self.extremum(input, Extremum::Max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    /// Stand-in for undefined results: `+inf` for min, `-inf` for max
    pub fn sentinel(self) -> f64 {
        match self {
            Extremum::Min => f64::INFINITY,
            Extremum::Max => f64::NEG_INFINITY,
        }
    }

    /// Leftmost extremum of already evaluated `values`
    ///
    /// Undefined entries compare as `sentinel`. On equal keys a defined value
    /// wins over an undefined one, and a NaN result is selected only when
    /// every key is NaN. Returns `None` for empty input.
    pub fn select(
        self,
        values: impl IntoIterator<Item = Option<f64>>,
        sentinel: f64,
    ) -> Option<ExtremumResult> {
        let mut best: Option<(ExtremumResult, f64)> = None;

        for (index, value) in values.into_iter().enumerate() {
            let key = value.unwrap_or(sentinel);
            let replace = match &best {
                None => true,
                Some((current, best_key)) => {
                    (best_key.is_nan() && !key.is_nan())
                        || self.improves(key, *best_key)
                        || (key == *best_key && current.value.is_none() && value.is_some())
                }
            };
            if replace {
                best = Some((ExtremumResult { index, value }, key));
            }
        }

        best.map(|(result, _)| result)
    }

    /// Strictly better, so ties keep the earlier position
    fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Extremum::Min => candidate < best,
            Extremum::Max => candidate > best,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremumResult {
    pub index: usize,
    /// `None` when the selected position is undefined
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::evaluator;
    use crate::interval::Interval;

    fn abs_like() -> PiecewiseFunction {
        PiecewiseFunction::new(
            vec![Interval::less_than(0.0), Interval::at_least(0.0)],
            vec![evaluator(|x| -x), evaluator(|_| 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn apply_mixed_numeric_types() {
        let pw = abs_like();
        let ys: Vec<_> = pw.apply([-20, 0, 20]).collect::<Result<_>>().unwrap();
        assert_eq!(ys, vec![Some(20.0), Some(1.0), Some(1.0)]);

        let ys: Vec<_> = pw.apply(vec![-2.5f32]).collect::<Result<_>>().unwrap();
        assert_eq!(ys, vec![Some(2.5)]);

        assert_eq!(pw.eval("-3").unwrap(), Some(3.0));
        assert_eq!(pw.eval(&serde_json::json!(-4)).unwrap(), Some(4.0));
    }

    #[test]
    fn scalar_is_single_element_sequence() {
        let pw = abs_like();
        let ys: Vec<_> = pw.apply_scalar(-7.0).collect();
        assert_eq!(ys, vec![Ok(Some(7.0))]);
    }

    #[test]
    fn non_real_input_stops_the_sequence() {
        let pw = abs_like();
        let mut it = pw.apply([Some(1.0), None, Some(2.0)]);
        assert_eq!(it.next(), Some(Ok(Some(1.0))));
        assert!(matches!(
            it.next(),
            Some(Err(EvalError::InputType { index: 1, .. }))
        ));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn unparseable_strings_are_rejected() {
        let pw = abs_like();
        assert!(matches!(pw.eval("abc"), Err(EvalError::InputType { .. })));
        assert!(matches!(
            pw.eval(serde_json::Value::Null),
            Err(EvalError::InputType { .. })
        ));
    }

    #[test]
    fn nan_input_is_undefined() {
        let pw = abs_like();
        assert_eq!(pw.eval(f64::NAN).unwrap(), None);
    }

    #[test]
    fn select_prefers_leftmost() {
        let values = [Some(3.0), Some(1.0), Some(1.0), None];
        assert_eq!(
            Extremum::Min.select(values, f64::INFINITY),
            Some(ExtremumResult {
                index: 1,
                value: Some(1.0)
            })
        );
        assert_eq!(
            Extremum::Max.select(values, f64::NEG_INFINITY),
            Some(ExtremumResult {
                index: 0,
                value: Some(3.0)
            })
        );
    }

    #[test]
    fn select_all_undefined() {
        let values = [None, None, None];
        for sense in [Extremum::Min, Extremum::Max] {
            assert_eq!(
                sense.select(values, sense.sentinel()),
                Some(ExtremumResult {
                    index: 0,
                    value: None
                })
            );
        }
        assert_eq!(Extremum::Min.select([], 0.0), None);
    }

    #[test]
    fn custom_sentinel_can_select_undefined() {
        let values = [Some(3.0), None, Some(-1.0)];
        assert_eq!(
            Extremum::Min.select(values, -10.0),
            Some(ExtremumResult {
                index: 1,
                value: None
            })
        );
    }

    #[test]
    fn nan_never_holds_the_best_slot() {
        let values = [Some(f64::NAN), Some(0.0), Some(f64::NAN), Some(-1.0)];
        assert_eq!(
            Extremum::Min.select(values, f64::INFINITY),
            Some(ExtremumResult {
                index: 3,
                value: Some(-1.0)
            })
        );
        assert_eq!(
            Extremum::Max.select(values, f64::NEG_INFINITY),
            Some(ExtremumResult {
                index: 1,
                value: Some(0.0)
            })
        );

        let all_nan = Extremum::Min.select([Some(f64::NAN), Some(f64::NAN)], f64::INFINITY);
        assert_eq!(all_nan.map(|r| r.index), Some(0));
    }

    #[test]
    fn defined_infinity_beats_undefined() {
        let values = [None, Some(f64::INFINITY), None];
        assert_eq!(
            Extremum::Min.select(values, f64::INFINITY),
            Some(ExtremumResult {
                index: 1,
                value: Some(f64::INFINITY)
            })
        );

        let values = [None, Some(f64::NEG_INFINITY)];
        assert_eq!(
            Extremum::Max.select(values, f64::NEG_INFINITY),
            Some(ExtremumResult {
                index: 1,
                value: Some(f64::NEG_INFINITY)
            })
        );
    }
}
