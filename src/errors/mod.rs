//! Structured errors rendered as RFC 7807 problem documents

pub mod media_type;
pub mod problem;
pub mod problem_type;
pub mod response;

pub use media_type::UnsupportedMediaType;
pub use problem::{
    log_problem, problem_or_fallback, register_problem, AnyProblem, BasicProblem, BoxError, Problem, ProblemData,
};
pub use problem_type::{log_level_for, InvalidStatus, ProblemType};
pub use response::{ProblemJson, APPLICATION_PROBLEM_JSON};
