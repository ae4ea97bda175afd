//! The problem contract and its generic implementations

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::sync::{PoisonError, RwLock};
use tracing::Level;

use super::media_type::UnsupportedMediaType;
use super::problem_type::ProblemType;

/// Extra JSON members attached to a problem
pub type ProblemData = Map<String, Value>;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error message that can be returned from an HTTP API, following RFC 7807.
///
/// `Display` is the internal message used in logs and is never sent to the client.
/// Every method must be free of side effects; the writer may call them in any order.
pub trait Problem: StdError + Send + Sync + 'static {
    /// Type of the problem, including the status code
    fn problem_type(&self) -> ProblemType;

    /// URI identifying this occurrence of the problem, may be blank
    fn problem_instance(&self) -> String {
        String::new()
    }

    /// Human-readable message returned to the client
    fn problem_detail(&self) -> String;

    /// Set any headers required for the response
    fn set_problem_headers(&self, _headers: &mut HeaderMap) {}

    /// Members inlined at the top level of the response body
    fn problem_data(&self) -> ProblemData {
        ProblemData::new()
    }

    /// Fields added to the log record only
    fn error_data(&self) -> ProblemData {
        ProblemData::new()
    }
}

/// Generic problem: a message, a type, and optionally the error that caused it.
#[derive(Debug)]
pub struct BasicProblem {
    pub ptype: ProblemType,
    pub instance: String,
    pub detail: String,
    pub internal_message: String,
    pub source: Option<BoxError>,
}

impl BasicProblem {
    /// Detail and internal message are both `message`.
    pub fn new(ptype: ProblemType, instance: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ptype,
            instance: instance.into(),
            detail: message.clone(),
            internal_message: message,
            source: None,
        }
    }

    /// Keep `err` reachable through `Error::source`. The detail is left as is.
    pub fn with_source<E>(mut self, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(err.into());
        self
    }
}

impl fmt::Display for BasicProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.internal_message)
    }
}

impl StdError for BasicProblem {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl Problem for BasicProblem {
    fn problem_type(&self) -> ProblemType {
        self.ptype.clone()
    }

    fn problem_instance(&self) -> String {
        self.instance.clone()
    }

    fn problem_detail(&self) -> String {
        self.detail.clone()
    }
}

/// Build a [`BasicProblem`] from a format string.
///
/// ```
/// use problem_kit::{problemf, ProblemType};
///
/// let problem = problemf!(ProblemType::not_found(), "/users/7", "user {} does not exist", 7);
/// assert_eq!(problem.detail, "user 7 does not exist");
/// ```
#[macro_export]
macro_rules! problemf {
    ($ptype:expr, $instance:expr, $($arg:tt)+) => {
        $crate::errors::BasicProblem::new($ptype, $instance, ::std::format!($($arg)+))
    };
}

/// Owned, type-erased problem.
///
/// Every [`Problem`] converts into this with `?`. It is also a plain error, so it can
/// sit inside other error types and still be found by [`problem_or_fallback`].
pub struct AnyProblem(Box<dyn Problem>);

impl AnyProblem {
    pub fn new<P: Problem>(problem: P) -> Self {
        Self(Box::new(problem))
    }

    pub fn as_problem(&self) -> &dyn Problem {
        self.0.as_ref()
    }
}

impl<P: Problem> From<P> for AnyProblem {
    fn from(problem: P) -> Self {
        Self::new(problem)
    }
}

impl Deref for AnyProblem {
    type Target = dyn Problem;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for AnyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for AnyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for AnyProblem {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

type TakeFn = fn(BoxError) -> Result<AnyProblem, BoxError>;
type FindFn = for<'a> fn(&'a (dyn StdError + 'static)) -> Option<&'a dyn Problem>;

/// Downcasts for one concrete problem type, by value and by reference.
#[derive(Clone, Copy)]
struct Recognizer {
    type_id: TypeId,
    take: TakeFn,
    find: FindFn,
}

impl Recognizer {
    fn of<P: Problem>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            take: take_problem::<P>,
            find: find_problem::<P>,
        }
    }
}

fn take_problem<P: Problem>(err: BoxError) -> Result<AnyProblem, BoxError> {
    err.downcast::<P>().map(|problem| AnyProblem::new(*problem))
}

fn find_problem<'a, P: Problem>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Problem> {
    err.downcast_ref::<P>().map(|problem| problem as &dyn Problem)
}

fn take_any(err: BoxError) -> Result<AnyProblem, BoxError> {
    err.downcast::<AnyProblem>().map(|problem| *problem)
}

fn find_any<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Problem> {
    err.downcast_ref::<AnyProblem>().map(AnyProblem::as_problem)
}

lazy_static::lazy_static! {
    static ref RECOGNIZERS: RwLock<Vec<Recognizer>> = RwLock::new(vec![
        Recognizer {
            type_id: TypeId::of::<AnyProblem>(),
            take: take_any,
            find: find_any,
        },
        Recognizer::of::<BasicProblem>(),
        Recognizer::of::<UnsupportedMediaType>(),
    ]);
}

/// Let [`problem_or_fallback`] recognise `P` passed directly or anywhere in a `source()` chain.
///
/// [`AnyProblem`], [`BasicProblem`] and [`UnsupportedMediaType`] are always recognised.
/// Registering a type again has no effect.
pub fn register_problem<P: Problem>() {
    let mut recognizers = RECOGNIZERS.write().unwrap_or_else(PoisonError::into_inner);
    if recognizers
        .iter()
        .all(|recognizer| recognizer.type_id != TypeId::of::<P>())
    {
        recognizers.push(Recognizer::of::<P>());
    }
}

fn recognizers() -> Vec<Recognizer> {
    RECOGNIZERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Answers of a problem found deeper in an error chain.
#[derive(Debug)]
struct Snapshot {
    message: String,
    ptype: ProblemType,
    instance: String,
    detail: String,
    headers: HeaderMap,
    data: ProblemData,
    error_data: ProblemData,
}

impl Snapshot {
    fn of(problem: &dyn Problem) -> Self {
        let mut headers = HeaderMap::new();
        problem.set_problem_headers(&mut headers);
        Self {
            message: problem.to_string(),
            ptype: problem.problem_type(),
            instance: problem.problem_instance(),
            detail: problem.problem_detail(),
            headers,
            data: problem.problem_data(),
            error_data: problem.error_data(),
        }
    }
}

/// A nested problem lifted to the top, keeping the error that carried it.
#[derive(Debug)]
struct SurfacedProblem {
    snapshot: Snapshot,
    outer: BoxError,
}

impl fmt::Display for SurfacedProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot.message)
    }
}

impl StdError for SurfacedProblem {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.outer.as_ref())
    }
}

impl Problem for SurfacedProblem {
    fn problem_type(&self) -> ProblemType {
        self.snapshot.ptype.clone()
    }

    fn problem_instance(&self) -> String {
        self.snapshot.instance.clone()
    }

    fn problem_detail(&self) -> String {
        self.snapshot.detail.clone()
    }

    fn set_problem_headers(&self, headers: &mut HeaderMap) {
        for name in self.snapshot.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &self.snapshot.headers {
            headers.append(name.clone(), value.clone());
        }
    }

    fn problem_data(&self) -> ProblemData {
        self.snapshot.data.clone()
    }

    fn error_data(&self) -> ProblemData {
        self.snapshot.error_data.clone()
    }
}

/// Return the problem already carried by `err`, or wrap `err` in a generic one.
///
/// `err` itself and every error in its `source()` chain is checked. The first problem found
/// answers exactly as it did before. Otherwise the result shows `fallback_detail` to the client
/// and logs `"{fallback_detail}: {err}"`, keeping `err` as its source.
///
/// Caller-defined problem types are recognised either after [`register_problem`] or once they
/// have been converted into [`AnyProblem`].
pub fn problem_or_fallback<E>(
    err: E,
    fallback_type: ProblemType,
    fallback_instance: impl Into<String>,
    fallback_detail: impl Into<String>,
) -> AnyProblem
where
    E: Into<BoxError>,
{
    let recognizers = recognizers();

    let mut err: BoxError = err.into();
    for recognizer in &recognizers {
        err = match (recognizer.take)(err) {
            Ok(problem) => return problem,
            Err(err) => err,
        };
    }

    let surfaced = std::iter::successors(err.source(), |cause| (*cause).source())
        .find_map(|cause| {
            recognizers
                .iter()
                .find_map(|recognizer| (recognizer.find)(cause))
        })
        .map(Snapshot::of);
    if let Some(snapshot) = surfaced {
        return AnyProblem::new(SurfacedProblem { snapshot, outer: err });
    }

    let fallback_detail = fallback_detail.into();
    AnyProblem::new(BasicProblem {
        ptype: fallback_type,
        instance: fallback_instance.into(),
        internal_message: format!("{fallback_detail}: {err}"),
        detail: fallback_detail,
        source: Some(err),
    })
}

macro_rules! problem_event {
    ($level:expr, $($rest:tt)+) => {
        if $level == Level::ERROR {
            tracing::error!($($rest)+)
        } else if $level == Level::WARN {
            tracing::warn!($($rest)+)
        } else if $level == Level::INFO {
            tracing::info!($($rest)+)
        } else if $level == Level::DEBUG {
            tracing::debug!($($rest)+)
        } else {
            tracing::trace!($($rest)+)
        }
    };
}

/// Emit one log record for `problem` at its type's log level.
pub fn log_problem(endpoint: &str, problem: &dyn Problem) {
    let ptype = problem.problem_type();
    let instance = problem.problem_instance();
    let detail = problem.problem_detail();
    let error_data = Value::Object(problem.error_data());

    problem_event!(
        ptype.log_level,
        endpoint = %endpoint,
        status = ptype.status.as_u16(),
        title = %ptype.title,
        problem_type = %ptype.uri,
        instance = %instance,
        detail = %detail,
        error_data = %error_data,
        "{}",
        problem
    );
}
