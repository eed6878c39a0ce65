// src/context.rs
// Everything a stage may consult while the terminal is driving the pipeline.
// It is cheap to clone and carries no per-element state.

use crate::error::PipelineError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub const DEFAULT_NAME: &str = "pipeline";

/// Cooperative cancellation flag shared between a pipeline and its owner.
///
/// Cloning shares the flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runtime context passed to every stage and sink.
///
/// Contains:
/// - `name`: human identifier (for logging and error messages)
/// - `cancel`: optional token consulted between per-element steps
#[derive(Debug, Clone)]
pub struct Context {
    name: &'static str,
    cancel: Option<CancelToken>,
}

impl Default for Context {
    #[inline(always)]
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Context {
    #[inline(always)]
    pub fn new(name: &'static str) -> Self {
        Self { name, cancel: None }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Fails with [`PipelineError::Cancelled`] once the token has fired.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), PipelineError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(PipelineError::Cancelled(self.name)),
            _ => Ok(()),
        }
    }
}
