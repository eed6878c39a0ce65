use crate::{
    context::Context,
    error::{BoxError, PipelineError},
    stage::{Sink, Stage, StageInfo, StageKind},
};
use std::convert::Infallible;

/// Drops every element the predicate rejects.
pub struct Filter<'a, T> {
    predicate: Box<dyn FnMut(&T) -> Result<bool, BoxError> + 'a>,
}

impl<'a, T> Filter<'a, T> {
    pub fn new<F>(mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'a,
    {
        Self::try_new(move |item: &T| Ok::<_, Infallible>(predicate(item)))
    }

    pub fn try_new<F, E>(mut predicate: F) -> Self
    where
        F: FnMut(&T) -> Result<bool, E> + 'a,
        E: Into<BoxError>,
    {
        Self {
            predicate: Box::new(move |item: &T| {
                predicate(item).map_err(Into::<BoxError>::into)
            }),
        }
    }
}

impl<'a, T> Stage<T> for Filter<'a, T> {
    type Out = T;

    fn kind(&self) -> StageKind {
        StageKind::Filter
    }

    #[inline(always)]
    fn accept(
        &mut self,
        item: T,
        info: StageInfo,
        down: &mut dyn Sink<T>,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        let keep = (self.predicate)(&item).map_err(|e| PipelineError::callback(info, e))?;
        if !keep {
            return Ok(());
        }
        down.accept(item, ctx)
    }
}
