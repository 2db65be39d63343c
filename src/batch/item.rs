//! Work items and their outcomes.

use crate::error::Failure;

/// One row value queued for a remote call.
///
/// `index` is the row's position in the original request, which may differ
/// from its position in the dispatched list once invalid rows are filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub index: usize,
    pub value: String,
}

impl WorkItem {
    pub fn new(index: usize, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(f) => Some(f),
            Outcome::Success(_) => None,
        }
    }
}

impl From<Result<String, Failure>> for Outcome {
    fn from(r: Result<String, Failure>) -> Self {
        match r {
            Ok(s) => Outcome::Success(s),
            Err(f) => Outcome::Failure(f),
        }
    }
}

/// Outcome tagged with the originating row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    pub index: usize,
    pub outcome: Outcome,
}
