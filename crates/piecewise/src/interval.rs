//! Interval sets over the real line
//!
//! An [`Interval`] is a union of disjoint atomic intervals, each with an open
//! or closed endpoint on either side. Values are normalized on construction,
//! so structural equality is set equality.
//!
//! - `|` is union, `&` is intersection, `!` is complement
//! - Infinite endpoints are always open
//! - `NaN` is never a member

use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr, Not};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Open,
    Closed,
}

impl Bound {
    fn flip(self) -> Self {
        match self {
            Bound::Open => Bound::Closed,
            Bound::Closed => Bound::Open,
        }
    }

    fn is_closed(self) -> bool {
        self == Bound::Closed
    }
}

/// A single connected interval. Never empty once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atomic {
    left: Bound,
    lower: f64,
    upper: f64,
    right: Bound,
}

impl Atomic {
    /// Returns `None` when the bounds describe an empty set.
    fn new(left: Bound, lower: f64, upper: f64, right: Bound) -> Option<Self> {
        if lower.is_nan() || upper.is_nan() {
            return None;
        }
        let left = if lower.is_infinite() { Bound::Open } else { left };
        let right = if upper.is_infinite() { Bound::Open } else { right };
        // `-0.0 + 0.0` is `0.0`, so both zeros sort and print alike.
        let (lower, upper) = (lower + 0.0, upper + 0.0);

        match lower.partial_cmp(&upper)? {
            Ordering::Greater => None,
            Ordering::Equal if !(left.is_closed() && right.is_closed()) => None,
            _ => Some(Self {
                left,
                lower,
                upper,
                right,
            }),
        }
    }

    pub fn left(&self) -> Bound {
        self.left
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn right(&self) -> Bound {
        self.right
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = self.lower < value || (self.left.is_closed() && self.lower == value);
        let below = value < self.upper || (self.right.is_closed() && value == self.upper);
        above && below
    }

    fn intersect(&self, other: &Atomic) -> Option<Atomic> {
        let (lower, left) = match self.lower.partial_cmp(&other.lower)? {
            Ordering::Greater => (self.lower, self.left),
            Ordering::Less => (other.lower, other.left),
            Ordering::Equal => (self.lower, min_bound(self.left, other.left)),
        };
        let (upper, right) = match self.upper.partial_cmp(&other.upper)? {
            Ordering::Less => (self.upper, self.right),
            Ordering::Greater => (other.upper, other.right),
            Ordering::Equal => (self.upper, min_bound(self.right, other.right)),
        };
        Atomic::new(left, lower, upper, right)
    }

    /// True when `next` (sorted after `self`) overlaps or touches it without a gap.
    fn joins(&self, next: &Atomic) -> bool {
        next.lower < self.upper
            || (next.lower == self.upper && (self.right.is_closed() || next.left.is_closed()))
    }
}

fn min_bound(a: Bound, b: Bound) -> Bound {
    if a.is_closed() && b.is_closed() {
        Bound::Closed
    } else {
        Bound::Open
    }
}

/// Union of disjoint atomic intervals, sorted by lower endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interval {
    atoms: Vec<Atomic>,
}

impl Interval {
    // ============ Constructors ============

    pub fn empty() -> Self {
        Self { atoms: Vec::new() }
    }

    /// The whole real line `(-inf, +inf)`
    pub fn full() -> Self {
        Self::open(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn from_bounds(left: Bound, lower: f64, upper: f64, right: Bound) -> Self {
        Self {
            atoms: Atomic::new(left, lower, upper, right).into_iter().collect(),
        }
    }

    pub fn open(lower: f64, upper: f64) -> Self {
        Self::from_bounds(Bound::Open, lower, upper, Bound::Open)
    }

    pub fn closed(lower: f64, upper: f64) -> Self {
        Self::from_bounds(Bound::Closed, lower, upper, Bound::Closed)
    }

    pub fn open_closed(lower: f64, upper: f64) -> Self {
        Self::from_bounds(Bound::Open, lower, upper, Bound::Closed)
    }

    pub fn closed_open(lower: f64, upper: f64) -> Self {
        Self::from_bounds(Bound::Closed, lower, upper, Bound::Open)
    }

    pub fn singleton(value: f64) -> Self {
        Self::closed(value, value)
    }

    /// `(-inf, bound)`
    pub fn less_than(bound: f64) -> Self {
        Self::open(f64::NEG_INFINITY, bound)
    }

    /// `(-inf, bound]`
    pub fn at_most(bound: f64) -> Self {
        Self::open_closed(f64::NEG_INFINITY, bound)
    }

    /// `(bound, +inf)`
    pub fn greater_than(bound: f64) -> Self {
        Self::open(bound, f64::INFINITY)
    }

    /// `[bound, +inf)`
    pub fn at_least(bound: f64) -> Self {
        Self::closed_open(bound, f64::INFINITY)
    }

    fn from_atoms(mut atoms: Vec<Atomic>) -> Self {
        // Closed lower bounds sort first so a merge keeps the wider left edge.
        atoms.sort_by(|a, b| {
            a.lower
                .partial_cmp(&b.lower)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.left.is_closed().cmp(&a.left.is_closed()))
        });

        let mut merged: Vec<Atomic> = Vec::with_capacity(atoms.len());
        for atom in atoms {
            match merged.last_mut() {
                Some(last) if last.joins(&atom) => {
                    if atom.upper > last.upper {
                        last.upper = atom.upper;
                        last.right = atom.right;
                    } else if atom.upper == last.upper && atom.right.is_closed() {
                        last.right = Bound::Closed;
                    }
                }
                _ => merged.push(atom),
            }
        }
        Self { atoms: merged }
    }

    // ============ Queries ============

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atomic] {
        &self.atoms
    }

    pub fn contains(&self, value: f64) -> bool {
        self.atoms.iter().any(|atom| atom.contains(value))
    }

    // ============ Set operations ============

    pub fn union(&self, other: &Interval) -> Interval {
        let atoms = self.atoms.iter().chain(other.atoms.iter()).copied().collect();
        Self::from_atoms(atoms)
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        let atoms = self
            .atoms
            .iter()
            .flat_map(|a| other.atoms.iter().filter_map(move |b| a.intersect(b)))
            .collect();
        Self::from_atoms(atoms)
    }

    pub fn complement(&self) -> Interval {
        let mut gaps = Vec::with_capacity(self.atoms.len() + 1);
        let mut cursor = (f64::NEG_INFINITY, Bound::Open);

        for atom in &self.atoms {
            gaps.extend(Atomic::new(cursor.1, cursor.0, atom.lower, atom.left.flip()));
            cursor = (atom.upper, atom.right.flip());
        }
        gaps.extend(Atomic::new(cursor.1, cursor.0, f64::INFINITY, Bound::Open));

        Self { atoms: gaps }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Union of every interval in `intervals`; empty when there are none.
    pub fn union_all<'a>(intervals: impl IntoIterator<Item = &'a Interval>) -> Interval {
        let atoms = intervals
            .into_iter()
            .flat_map(|ival| ival.atoms.iter().copied())
            .collect();
        Self::from_atoms(atoms)
    }
}

impl BitOr for Interval {
    type Output = Interval;

    fn bitor(self, rhs: Interval) -> Interval {
        self.union(&rhs)
    }
}

impl BitOr for &Interval {
    type Output = Interval;

    fn bitor(self, rhs: &Interval) -> Interval {
        self.union(rhs)
    }
}

impl BitAnd for Interval {
    type Output = Interval;

    fn bitand(self, rhs: Interval) -> Interval {
        self.intersection(&rhs)
    }
}

impl BitAnd for &Interval {
    type Output = Interval;

    fn bitand(self, rhs: &Interval) -> Interval {
        self.intersection(rhs)
    }
}

impl Not for Interval {
    type Output = Interval;

    fn not(self) -> Interval {
        self.complement()
    }
}

impl Not for &Interval {
    type Output = Interval;

    fn not(self) -> Interval {
        self.complement()
    }
}
