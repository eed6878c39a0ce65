use crate::{
    context::Context,
    error::{BoxError, PipelineError},
    stage::{Sink, Stage, StageInfo, StageKind},
};
use std::convert::Infallible;

/// Observes each element and passes it on untouched.
pub struct Peek<'a, T> {
    observer: Box<dyn FnMut(&T) -> Result<(), BoxError> + 'a>,
}

impl<'a, T> Peek<'a, T> {
    pub fn new<F>(mut observer: F) -> Self
    where
        F: FnMut(&T) + 'a,
    {
        Self::try_new(move |item: &T| {
            observer(item);
            Ok::<_, Infallible>(())
        })
    }

    pub fn try_new<F, E>(mut observer: F) -> Self
    where
        F: FnMut(&T) -> Result<(), E> + 'a,
        E: Into<BoxError>,
    {
        Self {
            observer: Box::new(move |item: &T| {
                observer(item).map_err(Into::<BoxError>::into)
            }),
        }
    }
}

impl<'a, T> Stage<T> for Peek<'a, T> {
    type Out = T;

    fn kind(&self) -> StageKind {
        StageKind::Peek
    }

    #[inline(always)]
    fn accept(
        &mut self,
        item: T,
        info: StageInfo,
        down: &mut dyn Sink<T>,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        (self.observer)(&item).map_err(|e| PipelineError::callback(info, e))?;
        down.accept(item, ctx)
    }
}
