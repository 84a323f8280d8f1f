//! Wraps a user callable into a `Generator<CaseDescription>`: the seam
//! between "a function that returns something testable" and the driver's
//! uniform case loop.
//!
//! The assertion-macro surface a user writes properties in is explicitly
//! out of scope here (it is an external collaborator); this module only
//! fixes the few return shapes the driver needs to understand, plus a
//! thread-local tagging/discard context a thin macro layer could sit on.

use crate::arbitrary::Arbitrary;
use crate::error::GenerationFailure;
use crate::generate::Gen;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// The verdict of a single property case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseResult {
    Success,
    Failure(String),
    Discard(String),
}

impl CaseResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseResult::Failure(_))
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, CaseResult::Discard(_))
    }
}

/// A case's result, the tags it was classified under, and a deferred
/// renderer for its arguments — paid for only when the case is actually
/// reported.
#[derive(Clone)]
pub struct CaseDescription {
    pub result: CaseResult,
    pub tags: Vec<String>,
    example: std::rc::Rc<dyn Fn() -> Vec<(String, String)>>,
}

impl CaseDescription {
    pub fn new(result: CaseResult) -> Self {
        Self::with_example(result, Vec::new(), || Vec::new())
    }

    pub fn with_example<F>(result: CaseResult, tags: Vec<String>, example: F) -> Self
    where
        F: Fn() -> Vec<(String, String)> + 'static,
    {
        Self {
            result,
            tags,
            example: std::rc::Rc::new(example),
        }
    }

    /// Renders `[(type_name, rendered_value)]` for the arguments that
    /// produced this case. Only called by the driver when a case is
    /// actually reported (on failure, or for the final counter-example).
    pub fn example(&self) -> Vec<(String, String)> {
        (self.example)()
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_failure()
    }

    /// The human-readable message carried by this case's result: the
    /// failure or discard reason, or an empty string on success.
    pub fn result_message(&self) -> String {
        match &self.result {
            CaseResult::Success => String::new(),
            CaseResult::Failure(message) | CaseResult::Discard(message) => message.clone(),
        }
    }
}

/// Converts a property callable's return value into a [`CaseResult`].
pub trait IntoCaseResult {
    fn into_case_result(self) -> CaseResult;
}

impl IntoCaseResult for CaseResult {
    fn into_case_result(self) -> CaseResult {
        self
    }
}

impl IntoCaseResult for () {
    fn into_case_result(self) -> CaseResult {
        CaseResult::Success
    }
}

impl IntoCaseResult for bool {
    fn into_case_result(self) -> CaseResult {
        if self {
            CaseResult::Success
        } else {
            CaseResult::Failure("property returned false".to_string())
        }
    }
}

impl IntoCaseResult for String {
    fn into_case_result(self) -> CaseResult {
        if self.is_empty() {
            CaseResult::Success
        } else {
            CaseResult::Failure(self)
        }
    }
}

impl<E: std::fmt::Display> IntoCaseResult for Result<(), E> {
    fn into_case_result(self) -> CaseResult {
        match self {
            Ok(()) => CaseResult::Success,
            Err(error) => CaseResult::Failure(error.to_string()),
        }
    }
}

thread_local! {
    static TAGS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Classifies the currently-executing property case under `label`, for
/// distribution reporting on success. A no-op outside of a case.
pub fn tag(label: impl Into<String>) {
    TAGS.with(|cell| cell.borrow_mut().push(label.into()));
}

fn take_tags() -> Vec<String> {
    TAGS.with(|cell| std::mem::take(&mut cell.borrow_mut()))
}

/// Discards the current case if `condition` holds — the precondition
/// helper a thin assertion-macro layer would build `assume!` on top of.
/// Discard dominates failure: raising this before any assertion runs
/// means the case is never evaluated as a failure.
pub fn discard_if(condition: bool) {
    if condition {
        std::panic::panic_any(GenerationFailure::new("property precondition was not satisfied"));
    }
}

fn interpret_outcome<R: IntoCaseResult>(outcome: std::thread::Result<R>) -> CaseResult {
    match outcome {
        Ok(value) => value.into_case_result(),
        Err(payload) => {
            if let Some(failure) = payload.downcast_ref::<GenerationFailure>() {
                CaseResult::Discard(failure.to_string())
            } else if let Some(message) = payload.downcast_ref::<String>() {
                CaseResult::Failure(message.clone())
            } else if let Some(message) = payload.downcast_ref::<&str>() {
                CaseResult::Failure((*message).to_string())
            } else {
                CaseResult::Failure("property panicked with a non-string payload".to_string())
            }
        }
    }
}

/// Wraps `property` into a generator of [`CaseDescription`]: `T` is
/// generated via its [`Arbitrary`] instance (typically a tuple, covering
/// the "multiple arguments" case), `property` is invoked once per node of
/// the resulting tree, and its outcome — including any panic — is
/// captured rather than propagated.
pub fn to_property<T, R, F>(property: F) -> Gen<CaseDescription>
where
    T: Arbitrary + std::fmt::Debug,
    R: IntoCaseResult,
    F: Fn(T) -> R + Clone + 'static,
{
    T::arbitrary().map(move |value| {
        let property = property.clone();
        let for_example = value.clone();
        let outcome = catch_unwind(AssertUnwindSafe(|| property(value.clone())));
        let tags = take_tags();
        let result = interpret_outcome(outcome);
        CaseDescription::with_example(result, tags, move || {
            vec![(std::any::type_name::<T>().to_string(), format!("{for_example:?}"))]
        })
    })
}
