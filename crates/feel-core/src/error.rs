#![forbid(unsafe_code)]

//! Error taxonomy shared by every Feel crate.
//!
//! Every public operation returns [`Result`]. Errors are raised to the
//! immediate caller; nothing in the framework retries or recovers.

use crate::guard::Kind;

/// Errors raised by the state store, the router and the DOM helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeelError {
    /// A dynamic argument had the wrong shape.
    #[error("{argument} must be {expected}, found {found}")]
    InvalidArgumentType {
        /// Name of the offending argument.
        argument: &'static str,
        /// Kind the operation requires.
        expected: Kind,
        /// Kind that was actually supplied.
        found: Kind,
    },
    /// A read, dispatch or subscription referenced a state that was never added.
    #[error("unknown state `{0}`")]
    UnknownState(String),
    /// A link or navigation was used before `initialize_router` completed.
    #[error("the router is not initialized; call initialize_router first")]
    RouterNotInitialized,
    /// `initialize_router` was called on a router that is already running.
    #[error("router is already initialized")]
    RouterAlreadyInitialized,
    /// Rendering was attempted before the root container was created.
    #[error("the root container is missing; call initialize first")]
    RootMissing,
    /// The route list handed to the router was not an array.
    #[error("routes must be an array, found {found}")]
    InvalidRouteList {
        /// Kind that was supplied instead.
        found: Kind,
    },
    /// A required string argument was empty.
    #[error("{0} must not be blank")]
    BlankArgument(&'static str),
    /// A node was appended under itself or one of its descendants.
    #[error("a node cannot be appended under itself or one of its descendants")]
    HierarchyRequest,
    /// A configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Crate-wide result alias.
pub type Result<T, E = FeelError> = std::result::Result<T, E>;
