//! Core stage abstraction.
//!
//! # Push evaluation
//!
//! Stages never pull from upstream. When the terminal runs, the typed stage
//! chain is linked back to front into a chain of [`Sink`]s and every source
//! element is *pushed* into the head:
//!
//! * `accept` – a stateless stage (filter, map, peek) handles the element and
//!   forwards zero or one element downstream before returning. The element has
//!   therefore travelled the whole barrier-free part of the pipeline before the
//!   next source element is touched.
//!
//! * `finish` – called once after the last element. A stateful stage (sort)
//!   buffers in `accept` and only releases its elements here, which is what
//!   makes it a barrier.
//!
//! Errors raised by user callbacks are wrapped with the [`StageInfo`] of the
//! stage that ran them, so the caller learns *where* the pipeline failed.

pub mod filter;
pub mod for_each;
pub mod map;
pub mod peek;
pub mod sort;

use crate::{context::Context, error::PipelineError};
use std::fmt;

/// What a stage does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Filter,
    Map,
    Peek,
    Sort,
    ForEach,
}

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Map => "map",
            Self::Peek => "peek",
            Self::Sort => "sort",
            Self::ForEach => "for_each",
        }
    }

    /// Must observe every element before producing output.
    #[inline]
    pub fn is_stateful(self) -> bool {
        matches!(self, Self::Sort)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ForEach)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind and insertion position of a stage. The terminal sits one past the
/// last intermediate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageInfo {
    pub kind: StageKind,
    pub position: usize,
}

impl StageInfo {
    #[inline]
    pub fn new(kind: StageKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for StageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage #{} (`{}`)", self.position, self.kind)
    }
}

/// Push side of a pipeline: receives elements one at a time.
pub trait Sink<T> {
    fn accept(&mut self, item: T, ctx: &Context) -> Result<(), PipelineError>;

    /// No more elements will arrive.
    fn end(&mut self, _ctx: &Context) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// A single intermediate pipeline step.
pub trait Stage<In> {
    type Out;

    fn kind(&self) -> StageKind;

    /// Handle one element, forwarding whatever survives to `down`.
    fn accept(
        &mut self,
        item: In,
        info: StageInfo,
        down: &mut dyn Sink<Self::Out>,
        ctx: &Context,
    ) -> Result<(), PipelineError>;

    /// Flush buffered elements into `down`. The downstream `end` is called by
    /// the linking sink afterwards, never by the stage.
    fn finish(
        &mut self,
        _info: StageInfo,
        _down: &mut dyn Sink<Self::Out>,
        _ctx: &Context,
    ) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// A stage bound to its downstream sink.
pub(crate) struct Linked<'a, S, O> {
    pub(crate) stage: S,
    pub(crate) info: StageInfo,
    pub(crate) down: Box<dyn Sink<O> + 'a>,
}

impl<'a, In, O, S> Sink<In> for Linked<'a, S, O>
where
    S: Stage<In, Out = O>,
{
    #[inline(always)]
    fn accept(&mut self, item: In, ctx: &Context) -> Result<(), PipelineError> {
        self.stage.accept(item, self.info, self.down.as_mut(), ctx)
    }

    fn end(&mut self, ctx: &Context) -> Result<(), PipelineError> {
        self.stage.finish(self.info, self.down.as_mut(), ctx)?;
        self.down.end(ctx)
    }
}
