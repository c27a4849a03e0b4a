//! File dependency graph engine.
//!
//! Scans workspace roots for source files, extracts import and reference
//! specifiers with a registry of pattern rules, resolves them to files on disk
//! and publishes the result as an immutable [`graph::GraphSnapshot`] behind
//! the stateful [`engine::DependencyGraphEngine`].

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod language;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod walker;
pub mod watcher;

pub use engine::DependencyGraphEngine;
pub use error::{FileDepError, Result};
