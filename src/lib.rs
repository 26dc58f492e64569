//! sectional: heading outlines and section operations for paragraph documents.
//!
//! A document is a flat list of paragraphs, some styled as headings. [`outline::build_outline`]
//! turns that list into a navigable outline, [`resolve`] works out which paragraphs belong to a
//! heading, and [`operations::SectionOperations`] applies hide/show, formatting, comments and
//! selection to them through a batched [`document::DocumentHost`].
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod credentials;
pub mod document;
pub mod edit_plan;
pub mod error;
pub mod formats;
pub mod memory;
pub mod operations;
pub mod outline;
pub mod paragraph;
pub mod resolve;
pub mod section;
pub mod session;
pub mod tag;
pub mod transform;
pub mod ui;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
