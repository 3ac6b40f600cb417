//! Fold strategies used to merge per-DAO results of a fan-out into one value.

use std::marker::PhantomData;

/// Result of one fold step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fold<A> {
    /// Keep folding with the remaining DAOs.
    Continue(A),
    /// Stop here; the accumulator is the final result.
    Stop(A),
}

impl<A> Fold<A> {
    pub fn into_inner(self) -> A {
        match self {
            Self::Continue(acc) | Self::Stop(acc) => acc,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// Combines the running accumulator `A` with one DAO's step result `S`.
pub trait Combinator<A, S> {
    fn combine(&self, acc: A, step: S) -> Fold<A>;
}

/// Concatenates row lists in fan-out order. Never stops early.
#[derive(Debug)]
pub struct ListCombinator<T> {
    _rows: PhantomData<fn() -> T>,
}

impl<T> ListCombinator<T> {
    pub fn new() -> Self {
        Self { _rows: PhantomData }
    }
}

impl<T> Default for ListCombinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Combinator<Vec<T>, Vec<T>> for ListCombinator<T> {
    fn combine(&self, mut acc: Vec<T>, step: Vec<T>) -> Fold<Vec<T>> {
        acc.extend(step);
        Fold::Continue(acc)
    }
}

/// A step with nothing to contribute is the empty list.
impl<T> Combinator<Vec<T>, Option<Vec<T>>> for ListCombinator<T> {
    fn combine(&self, acc: Vec<T>, step: Option<Vec<T>>) -> Fold<Vec<T>> {
        self.combine(acc, step.unwrap_or_default())
    }
}

/// Adds counts. Never stops early.
#[derive(Debug, Default, Clone, Copy)]
pub struct SumCombinator;

impl Combinator<u64, u64> for SumCombinator {
    fn combine(&self, acc: u64, step: u64) -> Fold<u64> {
        Fold::Continue(acc.saturating_add(step))
    }
}

/// Logical AND that stops at the first `false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllTrueCombinator;

impl Combinator<bool, bool> for AllTrueCombinator {
    fn combine(&self, acc: bool, step: bool) -> Fold<bool> {
        if acc && step {
            Fold::Continue(true)
        } else {
            Fold::Stop(false)
        }
    }
}
