//! Markdown checklist extraction and Plane sync.
//!
//! The pipeline is pure-to-impure, left to right: `reader` loads a checklist
//! file, `tree` parses it into a syntax tree, the extractors (`modules`,
//! `labels`, `issues`, `sub_issues`) turn the tree into typed values,
//! `records` shapes them into JSON exports, and `sync` pushes the records to
//! a Plane project through `plane` with the `batch` rate limiter.

pub mod batch;
pub mod config;
pub mod grammar;
pub mod issues;
pub mod labels;
pub mod modules;
pub mod plane;
pub mod reader;
pub mod records;
pub mod sub_issues;
pub mod sync;
pub mod tree;

pub use config::AppConfig;
pub use grammar::Priority;
pub use issues::Issue;
pub use modules::{Module, ModuleDepths};
pub use reader::ReadError;
pub use sub_issues::SubIssue;
pub use tree::SyntaxNode;
