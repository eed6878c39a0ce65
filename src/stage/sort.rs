//! Stateful ordering barrier.
//!
//! `accept` only buffers. `finish` orders the buffer once with a stable merge
//! sort and then releases elements one at a time, each travelling the rest of
//! the pipeline before the next one leaves the buffer.
//!
//! Comparators are fallible, so ordering goes through a local merge sort that
//! aborts on the first fault instead of `slice::sort_by`.

use crate::{
    context::Context,
    error::{BoxError, PipelineError},
    stage::{Sink, Stage, StageInfo, StageKind},
};
use std::cmp::Ordering;
use tracing::debug;

/// Why two elements could not be ordered.
pub enum CompareFault {
    /// The element type has no ordering between these two values.
    Unordered,
    Callback(BoxError),
}

type Comparator<'a, T> = Box<dyn FnMut(&T, &T) -> Result<Ordering, CompareFault> + 'a>;

pub struct Sort<'a, T> {
    compare: Comparator<'a, T>,
    buffer: Vec<T>,
}

impl<'a, T: 'a> Sort<'a, T> {
    fn with_comparator(compare: Comparator<'a, T>) -> Self {
        Self {
            compare,
            buffer: Vec::new(),
        }
    }

    /// Natural ordering of `T`.
    pub fn natural() -> Self
    where
        T: Ord,
    {
        Self::with_comparator(Box::new(|a: &T, b: &T| {
            Ok::<_, CompareFault>(a.cmp(b))
        }))
    }

    /// Partial ordering of `T`; incomparable pairs fail the stage.
    pub fn partial() -> Self
    where
        T: PartialOrd,
    {
        Self::with_comparator(Box::new(|a: &T, b: &T| {
            a.partial_cmp(b).ok_or(CompareFault::Unordered)
        }))
    }

    pub fn by<F>(mut compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering + 'a,
    {
        Self::with_comparator(Box::new(move |a: &T, b: &T| {
            Ok::<_, CompareFault>(compare(a, b))
        }))
    }

    pub fn by_key<K, F>(mut key: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K + 'a,
    {
        Self::with_comparator(Box::new(move |a: &T, b: &T| {
            Ok::<_, CompareFault>(key(a).cmp(&key(b)))
        }))
    }

    pub fn try_by<F, E>(mut compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Result<Ordering, E> + 'a,
        E: Into<BoxError>,
    {
        Self::with_comparator(Box::new(move |a: &T, b: &T| {
            compare(a, b).map_err(|e| CompareFault::Callback(e.into()))
        }))
    }
}

impl<'a, T> Stage<T> for Sort<'a, T> {
    type Out = T;

    fn kind(&self) -> StageKind {
        StageKind::Sort
    }

    #[inline(always)]
    fn accept(
        &mut self,
        item: T,
        _info: StageInfo,
        _down: &mut dyn Sink<T>,
        _ctx: &Context,
    ) -> Result<(), PipelineError> {
        self.buffer.push(item);
        Ok(())
    }

    fn finish(
        &mut self,
        info: StageInfo,
        down: &mut dyn Sink<T>,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        let buffered = std::mem::take(&mut self.buffer);
        debug!(stage = %info, buffered = buffered.len(), "barrier reached, ordering buffer");

        let ordered = stable_sort(buffered, &mut self.compare).map_err(|fault| match fault {
            CompareFault::Unordered => PipelineError::Type {
                stage: info,
                reason: "elements have no ordering relative to each other".to_string(),
            },
            CompareFault::Callback(e) => PipelineError::callback(info, e),
        })?;

        for item in ordered {
            ctx.checkpoint()?;
            down.accept(item, ctx)?;
        }
        Ok(())
    }
}

/// Top-down merge sort that keeps equal elements in their input order and
/// stops at the first comparator failure.
pub(crate) fn stable_sort<T, E>(
    mut items: Vec<T>,
    compare: &mut impl FnMut(&T, &T) -> Result<Ordering, E>,
) -> Result<Vec<T>, E> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = stable_sort(items, compare)?;
    let right = stable_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Right wins only when strictly smaller; ties go left.
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l)? == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    Ok(merged)
}
