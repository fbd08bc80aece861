#![forbid(unsafe_code)]

//! Document model for Feel.
//!
//! This crate provides:
//! - [`create_element`] and [`ElementSpec`] for building element trees
//! - [`Document`] with the root container, head helpers and
//!   [`render_to_dom`]

pub mod document;
pub mod element;
pub mod render;

pub use document::{DEFAULT_FAVICON_TYPE, Document, ROOT_ID};
pub use element::{ElementProps, ElementSpec, StyleValue, create_element};
pub use render::{Renderable, render_to_dom};
