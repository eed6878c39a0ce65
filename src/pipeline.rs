// src/pipeline.rs
use crate::{
    context::{CancelToken, Context, DEFAULT_NAME},
    error::{BoxError, PipelineError},
    plan::Plan,
    process::{ChainedProcess, EmptyProcess, Process},
    stage::{
        Sink, Stage, StageInfo, StageKind, filter::Filter, for_each::ForEach, map::Map,
        peek::Peek, sort::Sort,
    },
};
use smallvec::SmallVec;
use std::{cmp::Ordering, marker::PhantomData};
use tracing::{debug, debug_span, trace, warn};

/// Pipeline after one more stage has been appended.
pub type Appended<'a, Src, S, P> = Pipeline<'a, Src, ChainedProcess<S, P>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Ready,
    Consumed,
    AppendedAfterTerminal,
}

impl Lifecycle {
    fn rejection(self) -> Option<&'static str> {
        match self {
            Self::Ready => None,
            Self::Consumed => Some("terminal operation already invoked on this pipeline"),
            Self::AppendedAfterTerminal => Some("stage appended after the terminal operation ran"),
        }
    }
}

/// A lazy, single-use chain of stages over a materialized source.
///
/// Appending a stage records it and returns the extended pipeline; nothing is
/// evaluated until [`for_each`](Pipeline::for_each) runs.
pub struct Pipeline<'a, Src, P = EmptyProcess> {
    source: Vec<Src>,
    process: Option<P>,
    stages: SmallVec<[StageInfo; 8]>,
    ctx: Context,
    lifecycle: Lifecycle,
    _scope: PhantomData<&'a ()>,
}

impl<'a, Src: 'a> Pipeline<'a, Src> {
    /// Pipeline over `source` with the default context.
    pub fn new(source: impl IntoIterator<Item = Src>) -> Self {
        PipelineBuilder::default().source(source)
    }

    fn with_context(source: Vec<Src>, ctx: Context) -> Self {
        Self {
            source,
            process: Some(EmptyProcess),
            stages: SmallVec::new(),
            ctx,
            lifecycle: Lifecycle::Ready,
            _scope: PhantomData,
        }
    }
}

impl<'a, Src, P> Pipeline<'a, Src, P>
where
    Src: 'a,
    P: Process<'a, Src>,
    P::Out: 'a,
{
    pub fn add_stage<S>(self, stage: S) -> Appended<'a, Src, S, P>
    where
        S: Stage<P::Out> + 'a,
        S::Out: 'a,
    {
        let Self {
            source,
            process,
            mut stages,
            ctx,
            mut lifecycle,
            ..
        } = self;

        let info = StageInfo::new(stage.kind(), stages.len());
        if lifecycle != Lifecycle::Ready {
            warn!(pipeline = ctx.name(), stage = %info, "stage appended to a consumed pipeline");
            lifecycle = Lifecycle::AppendedAfterTerminal;
        }
        stages.push(info);

        Pipeline {
            source,
            process: process.map(|previous| ChainedProcess {
                stage,
                info,
                previous,
            }),
            stages,
            ctx,
            lifecycle,
            _scope: PhantomData,
        }
    }

    // ──────────────────────────────────────────────────────────────
    //  Stateless stages
    // ──────────────────────────────────────────────────────────────

    pub fn filter<F>(self, predicate: F) -> Appended<'a, Src, Filter<'a, P::Out>, P>
    where
        F: FnMut(&P::Out) -> bool + 'a,
    {
        self.add_stage(Filter::new(predicate))
    }

    pub fn try_filter<F, E>(self, predicate: F) -> Appended<'a, Src, Filter<'a, P::Out>, P>
    where
        F: FnMut(&P::Out) -> Result<bool, E> + 'a,
        E: Into<BoxError>,
    {
        self.add_stage(Filter::try_new(predicate))
    }

    pub fn map<U, F>(self, transform: F) -> Appended<'a, Src, Map<'a, P::Out, U>, P>
    where
        U: 'a,
        F: FnMut(P::Out) -> U + 'a,
    {
        self.add_stage(Map::new(transform))
    }

    pub fn try_map<U, F, E>(self, transform: F) -> Appended<'a, Src, Map<'a, P::Out, U>, P>
    where
        U: 'a,
        F: FnMut(P::Out) -> Result<U, E> + 'a,
        E: Into<BoxError>,
    {
        self.add_stage(Map::try_new(transform))
    }

    pub fn peek<F>(self, observer: F) -> Appended<'a, Src, Peek<'a, P::Out>, P>
    where
        F: FnMut(&P::Out) + 'a,
    {
        self.add_stage(Peek::new(observer))
    }

    pub fn try_peek<F, E>(self, observer: F) -> Appended<'a, Src, Peek<'a, P::Out>, P>
    where
        F: FnMut(&P::Out) -> Result<(), E> + 'a,
        E: Into<BoxError>,
    {
        self.add_stage(Peek::try_new(observer))
    }

    // ──────────────────────────────────────────────────────────────
    //  Stateful barrier
    // ──────────────────────────────────────────────────────────────

    /// Natural ordering. Stable: equal elements keep their arrival order.
    pub fn sorted(self) -> Appended<'a, Src, Sort<'a, P::Out>, P>
    where
        P::Out: Ord,
    {
        self.add_stage(Sort::natural())
    }

    /// Ordering for types that are only partially ordered. Fails with
    /// [`PipelineError::Type`] when two buffered elements are incomparable.
    pub fn sorted_partial(self) -> Appended<'a, Src, Sort<'a, P::Out>, P>
    where
        P::Out: PartialOrd,
    {
        self.add_stage(Sort::partial())
    }

    pub fn sorted_by<F>(self, compare: F) -> Appended<'a, Src, Sort<'a, P::Out>, P>
    where
        F: FnMut(&P::Out, &P::Out) -> Ordering + 'a,
    {
        self.add_stage(Sort::by(compare))
    }

    pub fn sorted_by_key<K, F>(self, key: F) -> Appended<'a, Src, Sort<'a, P::Out>, P>
    where
        K: Ord,
        F: FnMut(&P::Out) -> K + 'a,
    {
        self.add_stage(Sort::by_key(key))
    }

    pub fn try_sorted_by<F, E>(self, compare: F) -> Appended<'a, Src, Sort<'a, P::Out>, P>
    where
        F: FnMut(&P::Out, &P::Out) -> Result<Ordering, E> + 'a,
        E: Into<BoxError>,
    {
        self.add_stage(Sort::try_by(compare))
    }

    // ──────────────────────────────────────────────────────────────
    //  Terminal
    // ──────────────────────────────────────────────────────────────

    /// Drive the pipeline, handing every surviving element to `action`.
    ///
    /// A pipeline runs at most once; later calls fail with
    /// [`PipelineError::IllegalState`].
    pub fn for_each<F>(&mut self, action: F) -> Result<(), PipelineError>
    where
        F: FnMut(P::Out) + 'a,
    {
        let terminal = ForEach::new(action, self.terminal_info());
        self.drive(Box::new(terminal))
    }

    pub fn try_for_each<F, E>(&mut self, action: F) -> Result<(), PipelineError>
    where
        F: FnMut(P::Out) -> Result<(), E> + 'a,
        E: Into<BoxError>,
    {
        let terminal = ForEach::try_new(action, self.terminal_info());
        self.drive(Box::new(terminal))
    }

    fn terminal_info(&self) -> StageInfo {
        StageInfo::new(StageKind::ForEach, self.stages.len())
    }

    fn drive(&mut self, terminal: Box<dyn Sink<P::Out> + 'a>) -> Result<(), PipelineError> {
        if let Some(reason) = self.lifecycle.rejection() {
            return Err(PipelineError::IllegalState(reason));
        }
        let Some(process) = self.process.take() else {
            return Err(PipelineError::IllegalState(
                "terminal operation already invoked on this pipeline",
            ));
        };
        self.lifecycle = Lifecycle::Consumed;
        let source = std::mem::take(&mut self.source);

        let span = debug_span!("pipeline", name = self.ctx.name());
        let _guard = span.enter();
        debug!(plan = %self.plan(), elements = source.len(), "driving pipeline");

        let head = process.link(terminal);
        match push_all(head, source, &self.ctx) {
            Ok(()) => {
                debug!("pipeline drained");
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "pipeline aborted");
                Err(e)
            }
        }
    }

    // ──────────────────────────────────────────────────────────────
    //  Introspection
    // ──────────────────────────────────────────────────────────────

    pub fn stages(&self) -> &[StageInfo] {
        &self.stages
    }

    pub fn plan(&self) -> Plan<'_> {
        Plan::of(&self.stages)
    }

    pub fn is_consumed(&self) -> bool {
        self.lifecycle != Lifecycle::Ready
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

fn push_all<'a, Src>(
    mut head: Box<dyn Sink<Src> + 'a>,
    source: Vec<Src>,
    ctx: &Context,
) -> Result<(), PipelineError> {
    for (index, item) in source.into_iter().enumerate() {
        ctx.checkpoint()?;
        trace!(index, "pushing source element");
        head.accept(item, ctx)?;
    }
    head.end(ctx)
}

/// Collects pipeline configuration before the source is attached.
pub struct PipelineBuilder {
    name: &'static str,
    cancel: Option<CancelToken>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME,
            cancel: None,
        }
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported in logs and in [`PipelineError::Cancelled`].
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn source<'a, Src: 'a>(self, source: impl IntoIterator<Item = Src>) -> Pipeline<'a, Src> {
        let mut ctx = Context::new(self.name);
        if let Some(token) = self.cancel {
            ctx = ctx.with_cancel_token(token);
        }
        Pipeline::with_context(source.into_iter().collect(), ctx)
    }
}
