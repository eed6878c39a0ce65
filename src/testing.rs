//! Helpers for asserting on the side-effect stream of a pipeline.

pub mod recorder;

pub use recorder::Recorder;
