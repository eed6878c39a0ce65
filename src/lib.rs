pub mod context;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod process;
pub mod stage;
pub mod testing;

pub use context::{CancelToken, Context};
pub use error::{BoxError, PipelineError};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use plan::Plan;
pub use stage::{Sink, Stage, StageInfo, StageKind};
pub use testing::Recorder;
