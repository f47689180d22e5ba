mod cache;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session runner subsystem.
pub use crate::error::RunnerError;
pub use cache::QuestionCache;
pub use progress::RunnerProgress;
pub use service::{RunnerState, TestRunner};
pub use view::{IndicatorView, OptionView, QuestionView};
pub use workflow::RunnerWorkflow;
