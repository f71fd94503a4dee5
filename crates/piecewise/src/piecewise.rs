//! Piecewise function assembly and validation
//!
//! A [`PiecewiseFunction`] pairs each domain with the evaluator that follows
//! it in source order. When one fewer domain than evaluators is supplied,
//! the last evaluator gets the complement of all explicit domains. Domains
//! are checked once for pairwise disjointness; an instance that exists is
//! valid and never changes.

use std::fmt;

use thiserror::Error;

use crate::PiecewiseError;
use crate::ast::core::Definition;
use crate::compile::{Evaluator, compile_guard, compile_return};
use crate::interval::Interval;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssembleError {
    #[error("At least one branch evaluator is required")]
    Arity,

    #[error(
        "Expected {intervals} or {} evaluators for {intervals} domains, got {evaluators}",
        .intervals + 1
    )]
    ArityMismatch { intervals: usize, evaluators: usize },

    #[error("Branch domains intersect: {}", describe_pairs(.pairs))]
    OverlappingDomain { pairs: Vec<(usize, usize)> },
}

fn describe_pairs(pairs: &[(usize, usize)]) -> String {
    pairs
        .iter()
        .map(|(i, j)| format!("branches {i} and {j}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A domain paired with the evaluator active on it
#[derive(Clone)]
pub struct Branch {
    domain: Interval,
    evaluator: Evaluator,
}

impl Branch {
    pub fn domain(&self) -> &Interval {
        &self.domain
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        (self.evaluator)(x)
    }
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Ordered, pairwise-disjoint branches
#[derive(Debug, Clone)]
pub struct PiecewiseFunction {
    branches: Vec<Branch>,
    has_otherwise: bool,
}

impl PiecewiseFunction {
    /// Assemble and validate a piecewise function
    ///
    /// `evaluators` must hold as many entries as `intervals`, or one more
    /// for an otherwise branch.
    pub fn new(
        intervals: Vec<Interval>,
        evaluators: Vec<Evaluator>,
    ) -> Result<Self, AssembleError> {
        if evaluators.is_empty() {
            return Err(AssembleError::Arity);
        }
        let has_otherwise = match evaluators.len().checked_sub(intervals.len()) {
            Some(0) => false,
            Some(1) => true,
            _ => {
                return Err(AssembleError::ArityMismatch {
                    intervals: intervals.len(),
                    evaluators: evaluators.len(),
                });
            }
        };

        let mut intervals = intervals;
        if has_otherwise {
            let otherwise = !Interval::union_all(&intervals);
            log::debug!("synthesized otherwise domain {otherwise}");
            intervals.push(otherwise);
        }

        check_disjoint(&intervals)?;

        let branches: Vec<Branch> = intervals
            .into_iter()
            .zip(evaluators)
            .map(|(domain, evaluator)| Branch { domain, evaluator })
            .collect();
        log::debug!(
            "assembled piecewise function with {} branches{}",
            branches.len(),
            if has_otherwise { " (incl. otherwise)" } else { "" }
        );

        Ok(Self {
            branches,
            has_otherwise,
        })
    }

    /// Compile every guard and return of `def`, then assemble
    pub fn from_definition(def: &Definition) -> Result<Self, PiecewiseError> {
        let intervals = def
            .guards
            .iter()
            .map(compile_guard)
            .collect::<Result<Vec<_>, _>>()?;
        let evaluators = def
            .returns
            .iter()
            .map(compile_return)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "compiled {}: {} domains, {} evaluators",
            def.name,
            intervals.len(),
            evaluators.len()
        );
        Ok(Self::new(intervals, evaluators)?)
    }

    /// Parse, transform, compile and assemble a definition given as source text
    pub fn from_source(source: &str) -> Result<Self, PiecewiseError> {
        crate::compile(source)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Branch domains in order, including a synthesized otherwise domain
    pub fn domains(&self) -> Vec<&Interval> {
        self.branches.iter().map(Branch::domain).collect()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Whether the last branch was synthesized as the complement of the others
    pub fn has_otherwise(&self) -> bool {
        self.has_otherwise
    }

    /// The first branch whose domain contains `x`
    pub fn branch_for(&self, x: f64) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.domain.contains(x))
    }
}

/// Every unordered pair of domains must have an empty intersection
fn check_disjoint(intervals: &[Interval]) -> Result<(), AssembleError> {
    let mut pairs = Vec::new();
    for (i, a) in intervals.iter().enumerate() {
        for (j, b) in intervals.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }

    if pairs.is_empty() {
        Ok(())
    } else {
        Err(AssembleError::OverlappingDomain { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::evaluator;

    const INF: f64 = f64::INFINITY;

    #[test]
    fn empty_intervals_get_full_otherwise() {
        let pw = PiecewiseFunction::new(vec![], vec![evaluator(|x| x)]).unwrap();
        assert_eq!(pw.domains(), vec![&Interval::full()]);
        assert!(pw.has_otherwise());
    }

    #[test]
    fn otherwise_is_complement_of_union() {
        let pw = PiecewiseFunction::new(
            vec![Interval::open(1.0, 2.0), Interval::closed_open(-1.0, 0.0)],
            vec![evaluator(|x| x), evaluator(|_| 1.0), evaluator(|x| 2.0 * x + 1.0)],
        )
        .unwrap();
        let expected = Interval::less_than(-1.0)
            | Interval::closed(0.0, 1.0)
            | Interval::closed_open(2.0, INF);
        assert_eq!(pw.domains()[2], &expected);
        assert_eq!(pw.len(), 3);
    }

    #[test]
    fn no_evaluators_is_arity_error() {
        assert_eq!(
            PiecewiseFunction::new(vec![], vec![]).unwrap_err(),
            AssembleError::Arity
        );
    }

    #[test]
    fn too_many_evaluators_is_mismatch() {
        let err = PiecewiseFunction::new(
            vec![Interval::open(1.0, 2.0)],
            vec![evaluator(|x| x), evaluator(|_| 1.0), evaluator(|x| 2.0 * x + 1.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssembleError::ArityMismatch {
                intervals: 1,
                evaluators: 3
            }
        );
    }

    #[test]
    fn too_few_evaluators_is_mismatch() {
        let err = PiecewiseFunction::new(
            vec![Interval::open(1.0, 2.0), Interval::open(3.0, 4.0)],
            vec![evaluator(|x| x)],
        )
        .unwrap_err();
        assert!(matches!(err, AssembleError::ArityMismatch { .. }));
    }

    #[test]
    fn overlapping_domains_are_rejected() {
        let err = PiecewiseFunction::new(
            vec![Interval::at_least(0.0), Interval::less_than(1.0)],
            vec![evaluator(|_| 1.0), evaluator(|_| 0.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssembleError::OverlappingDomain {
                pairs: vec![(0, 1)]
            }
        );
        assert_eq!(
            err.to_string(),
            "Branch domains intersect: branches 0 and 1"
        );
    }

    #[test]
    fn adjacent_domains_share_no_boundary() {
        let pw = PiecewiseFunction::new(
            vec![Interval::closed_open(0.0, 1.0), Interval::closed_open(1.0, 2.0)],
            vec![evaluator(|_| 1.0), evaluator(|_| 2.0)],
        )
        .unwrap();
        assert_eq!(pw.branch_for(1.0).map(|b| b.evaluate(1.0)), Some(2.0));

        let err = PiecewiseFunction::new(
            vec![Interval::closed(0.0, 1.0), Interval::closed_open(1.0, 2.0)],
            vec![evaluator(|_| 1.0), evaluator(|_| 2.0)],
        )
        .unwrap_err();
        assert!(matches!(err, AssembleError::OverlappingDomain { .. }));
    }

    #[test]
    fn every_overlapping_pair_is_reported() {
        let err = PiecewiseFunction::new(
            vec![
                Interval::closed(0.0, 10.0),
                Interval::singleton(5.0),
                Interval::open(20.0, 30.0),
                Interval::closed(9.0, 25.0),
            ],
            vec![
                evaluator(|_| 0.0),
                evaluator(|_| 1.0),
                evaluator(|_| 2.0),
                evaluator(|_| 3.0),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssembleError::OverlappingDomain {
                pairs: vec![(0, 1), (0, 3), (2, 3)]
            }
        );
    }
}
