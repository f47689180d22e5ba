#![forbid(unsafe_code)]

pub mod http;
pub mod remote;
pub mod session_ref;

pub use http::HttpExamApi;
pub use remote::{ApiError, CreatedSession, ExamApi, FetchedQuestion, InMemoryExamApi};
pub use session_ref::{FileSessionRefStore, InMemorySessionRefStore, SessionRefStore, StoreError};
