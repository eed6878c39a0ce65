//! Process abstraction
//! `ChainedProcess` is monomorphised – every `map` changes the element type
//! and the compiler tracks it through the chain, so a pipeline that does not
//! type-check downstream of a `map` never builds.
//! Nothing runs while the chain grows. `link` turns it into a chain of sinks,
//! back to front, only when the terminal runs.
use crate::stage::{Linked, Sink, Stage, StageInfo};

pub trait Process<'a, Src> {
    /// Element type leaving the last stage.
    type Out;

    /// Bind the whole chain to `down` and return the sink that accepts
    /// source elements.
    fn link(self, down: Box<dyn Sink<Self::Out> + 'a>) -> Box<dyn Sink<Src> + 'a>;
}

pub struct EmptyProcess;

impl<'a, Src: 'a> Process<'a, Src> for EmptyProcess {
    type Out = Src;

    #[inline(always)]
    fn link(self, down: Box<dyn Sink<Src> + 'a>) -> Box<dyn Sink<Src> + 'a> {
        down
    }
}

pub struct ChainedProcess<S, P> {
    pub stage: S,
    pub info: StageInfo,
    pub previous: P,
}

impl<'a, Src, S, P> Process<'a, Src> for ChainedProcess<S, P>
where
    P: Process<'a, Src>,
    P::Out: 'a,
    S: Stage<P::Out> + 'a,
    S::Out: 'a,
{
    type Out = S::Out;

    fn link(self, down: Box<dyn Sink<S::Out> + 'a>) -> Box<dyn Sink<Src> + 'a> {
        let here = Linked {
            stage: self.stage,
            info: self.info,
            down,
        };
        self.previous.link(Box::new(here))
    }
}
