use crate::{
    context::Context,
    error::{BoxError, PipelineError},
    stage::{Sink, Stage, StageInfo, StageKind},
};
use std::convert::Infallible;

/// Transforms `T` into `U`. Everything downstream sees `U`.
pub struct Map<'a, T, U> {
    transform: Box<dyn FnMut(T) -> Result<U, BoxError> + 'a>,
}

impl<'a, T, U> Map<'a, T, U> {
    pub fn new<F>(mut transform: F) -> Self
    where
        F: FnMut(T) -> U + 'a,
    {
        Self::try_new(move |item: T| Ok::<_, Infallible>(transform(item)))
    }

    pub fn try_new<F, E>(mut transform: F) -> Self
    where
        F: FnMut(T) -> Result<U, E> + 'a,
        E: Into<BoxError>,
    {
        Self {
            transform: Box::new(move |item: T| {
                transform(item).map_err(Into::<BoxError>::into)
            }),
        }
    }
}

impl<'a, T, U> Stage<T> for Map<'a, T, U> {
    type Out = U;

    fn kind(&self) -> StageKind {
        StageKind::Map
    }

    #[inline(always)]
    fn accept(
        &mut self,
        item: T,
        info: StageInfo,
        down: &mut dyn Sink<U>,
        ctx: &Context,
    ) -> Result<(), PipelineError> {
        let mapped = (self.transform)(item).map_err(|e| PipelineError::callback(info, e))?;
        down.accept(mapped, ctx)
    }
}
