//! Error types for Beacon Core.
//!
//! Signal errors and pathfinding errors are kept apart: a caller of the
//! signal registry never needs to match on navigation failures and vice
//! versa.
//!
//! | Error | Recoverable |
//! |-------|-------------|
//! | [`PathError::PathNotFound`] | Yes |
//! | [`PathError::ExpansionLimit`] | Yes |
//! | [`PathError::OutsideNavigation`] | Yes |
//! | [`PathError::AlgorithmNotImplemented`] | No |
//! | [`PathError::MissingPortal`] | No |
//! | [`SignalError::ValueAlreadySet`] | No |
//!
//! Recoverable means a retry or replan with different inputs may succeed.

use thiserror::Error;

use crate::pathfinding::Point;
use crate::signals::SignalKind;

/// Boxed error returned by a failing listener callback.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the signal registry and its helpers.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("signal kind `{0}` has not been declared")]
    UnknownSignal(SignalKind),

    #[error("signal kind `{0}` is already declared")]
    DuplicateSignal(SignalKind),

    #[error("value already set")]
    ValueAlreadySet,

    /// A listener failed. Dispatch to the remaining listeners of the pass
    /// was abandoned.
    #[error("listener for `{kind}` failed: {source}")]
    Listener {
        kind: SignalKind,
        #[source]
        source: ListenerError,
    },
}

impl SignalError {
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Errors raised while searching for or refining a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("couldn't find path for given nodes")]
    PathNotFound,

    #[error("search gave up after expanding {0} nodes")]
    ExpansionLimit(usize),

    #[error("couldn't find {0} resolution finder algorithm")]
    AlgorithmNotImplemented(&'static str),

    #[error("point ({}, {}) is outside the navigation graph", .0.x, .0.y)]
    OutsideNavigation(Point),

    #[error("no portal between consecutive corridor nodes at index {0}")]
    MissingPortal(usize),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PathError {
    /// Whether replanning with other inputs may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PathError::PathNotFound | PathError::ExpansionLimit(_) | PathError::OutsideNavigation(_)
        )
    }
}

impl From<serde_json::Error> for PathError {
    fn from(e: serde_json::Error) -> Self {
        PathError::Config(e.to_string())
    }
}

pub type SignalResult<T> = std::result::Result<T, SignalError>;
pub type PathResult<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability() {
        assert!(PathError::PathNotFound.is_recoverable());
        assert!(PathError::ExpansionLimit(10).is_recoverable());
        assert!(!PathError::AlgorithmNotImplemented("low").is_recoverable());
        assert!(!PathError::MissingPortal(0).is_recoverable());
        assert!(!SignalError::ValueAlreadySet.is_recoverable());
    }

    #[test]
    fn messages() {
        assert_eq!(SignalError::ValueAlreadySet.to_string(), "value already set");
        assert_eq!(
            PathError::AlgorithmNotImplemented("high").to_string(),
            "couldn't find high resolution finder algorithm"
        );
        assert_eq!(
            PathError::OutsideNavigation(Point::new(1.5, -2.0)).to_string(),
            "point (1.5, -2) is outside the navigation graph"
        );
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err: PathError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, PathError::Config(_)));
    }
}
