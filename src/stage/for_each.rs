//! Terminal sink. It is not a [`Stage`](crate::stage::Stage): nothing sits
//! downstream of it.

use crate::{
    context::Context,
    error::{BoxError, PipelineError},
    stage::{Sink, StageInfo},
};
use std::convert::Infallible;

pub struct ForEach<'a, T> {
    action: Box<dyn FnMut(T) -> Result<(), BoxError> + 'a>,
    info: StageInfo,
}

impl<'a, T> ForEach<'a, T> {
    pub fn new<F>(mut action: F, info: StageInfo) -> Self
    where
        F: FnMut(T) + 'a,
    {
        Self::try_new(
            move |item: T| {
                action(item);
                Ok::<_, Infallible>(())
            },
            info,
        )
    }

    pub fn try_new<F, E>(mut action: F, info: StageInfo) -> Self
    where
        F: FnMut(T) -> Result<(), E> + 'a,
        E: Into<BoxError>,
    {
        Self {
            action: Box::new(move |item: T| {
                action(item).map_err(Into::<BoxError>::into)
            }),
            info,
        }
    }
}

impl<'a, T> Sink<T> for ForEach<'a, T> {
    #[inline(always)]
    fn accept(&mut self, item: T, _ctx: &Context) -> Result<(), PipelineError> {
        (self.action)(item).map_err(|e| PipelineError::callback(self.info, e))
    }
}
