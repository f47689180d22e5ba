#![forbid(unsafe_code)]

pub mod collector_service;
pub mod error;
pub mod runner;
pub mod timer;

pub use exam_core::Clock;

pub use collector_service::CollectorService;
pub use error::{CollectorError, RunnerError};
pub use runner::{
    IndicatorView, OptionView, QuestionView, RunnerProgress, RunnerState, RunnerWorkflow,
    TestRunner,
};
pub use timer::{SessionTimer, format_elapsed};
