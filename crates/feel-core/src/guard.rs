#![forbid(unsafe_code)]

//! Argument shape checks for dynamic data.
//!
//! Statically typed entry points need no checking; the guard covers the
//! places where data arrives as a [`Value`] or a JSON document: history
//! payloads, route lists, link state, style maps and the state slots the
//! router owns.
//!
//! # Invariants
//!
//! 1. [`verify`] is all-or-nothing: it returns `true` only when every pair
//!    matches.
//! 2. [`expect`] never inspects more than the top-level kind.
//! 3. The JSON and [`Value`] kind mappings agree: a JSON array is a
//!    [`Kind::List`], a JSON object is a [`Kind::Map`].

use std::fmt;

use crate::error::{FeelError, Result};
use crate::value::{Value, ValueMap};

/// The top-level shape of a dynamic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null` / no value.
    Null,
    /// `true` / `false`.
    Bool,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An ordered sequence.
    List,
    /// A string-keyed mapping.
    Map,
    /// A list of DOM nodes.
    Nodes,
    /// A host value the framework does not look inside.
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "a boolean",
            Self::Number => "a number",
            Self::String => "a string",
            Self::List => "an array",
            Self::Map => "an object",
            Self::Nodes => "a node list",
            Self::Opaque => "an opaque value",
        };
        f.write_str(name)
    }
}

/// Anything whose top-level shape can be classified.
pub trait Typed {
    /// The kind of this value.
    fn kind(&self) -> Kind;
}

impl Typed for Value {
    fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::Str(_) => Kind::String,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Nodes(_) => Kind::Nodes,
            Self::Opaque(_) => Kind::Opaque,
        }
    }
}

impl Typed for serde_json::Value {
    fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::Array(_) => Kind::List,
            Self::Object(_) => Kind::Map,
        }
    }
}

/// Whether `value` has the given kind.
#[inline]
pub fn matches(value: &dyn Typed, kind: Kind) -> bool {
    value.kind() == kind
}

/// Check a batch of `(value, kind)` pairs; `true` only if all match.
pub fn verify(args: &[(&dyn Typed, Kind)]) -> bool {
    args.iter().all(|(value, kind)| matches(*value, *kind))
}

/// Fail with [`FeelError::InvalidArgumentType`] unless `value` has `kind`.
pub fn expect(argument: &'static str, value: &dyn Typed, kind: Kind) -> Result<()> {
    let found = value.kind();
    if found == kind {
        Ok(())
    } else {
        Err(FeelError::InvalidArgumentType {
            argument,
            expected: kind,
            found,
        })
    }
}

/// Borrow `value` as a string slice or fail.
pub fn expect_str<'a>(argument: &'static str, value: &'a Value) -> Result<&'a str> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => Err(mismatch(argument, Kind::String, other)),
    }
}

/// Borrow `value` as a map or fail.
pub fn expect_map<'a>(argument: &'static str, value: &'a Value) -> Result<&'a ValueMap> {
    match value {
        Value::Map(map) => Ok(&**map),
        other => Err(mismatch(argument, Kind::Map, other)),
    }
}

/// Borrow a JSON value as a string slice or fail.
pub fn expect_json_str<'a>(argument: &'static str, value: &'a serde_json::Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| mismatch(argument, Kind::String, value))
}

/// Borrow a JSON value as an array or fail.
pub fn expect_json_array<'a>(
    argument: &'static str,
    value: &'a serde_json::Value,
) -> Result<&'a [serde_json::Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(argument, Kind::List, value))
}

/// Borrow a JSON value as an object or fail.
pub fn expect_json_object<'a>(
    argument: &'static str,
    value: &'a serde_json::Value,
) -> Result<&'a serde_json::Map<String, serde_json::Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch(argument, Kind::Map, value))
}

fn mismatch(argument: &'static str, expected: Kind, value: &dyn Typed) -> FeelError {
    FeelError::InvalidArgumentType {
        argument,
        expected,
        found: value.kind(),
    }
}
