//! Interview sessions and the registry that owns them.

pub mod interview;
pub mod registry;

pub use interview::{Interview, Question, QuestionKind};
pub use registry::{InterviewRegistry, MAX_CODE_ATTEMPTS};
