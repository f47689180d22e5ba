mod answers;
mod config;
mod ids;
mod question;
mod results;
mod summary;

pub use answers::AnswerSheet;
pub use config::{
    ConfigError, ConfigOptions, Domain, MAX_QUESTIONS, MIN_QUESTIONS, TestConfig,
    subjects_for_class,
};
pub use ids::SessionId;
pub use question::{AnswerLetter, OPTION_COUNT, Question, QuestionError};
pub use results::{QuestionResult, TestResults};
pub use summary::SessionSummary;
