#![forbid(unsafe_code)]

//! Core types for Feel.
//!
//! - [`Value`]: the dynamically typed value stored in state slots, with
//!   strict (identity-based) equality for compound values.
//! - [`Node`]: a shared handle to a document node.
//! - [`guard`]: argument shape checks for data that arrives untyped.
//! - [`FeelError`]: the error taxonomy every crate returns.

pub mod error;
pub mod guard;
pub mod node;
pub mod value;

pub use error::{FeelError, Result};
pub use guard::{Kind, Typed};
pub use node::{ClickHandler, Event, Node, NodeKind};
pub use value::{Value, ValueMap};
