//! Core types and trait definitions for the subvers subtitle store.
//!
//! Subtitles are versioned like source code: a [`language::SubtitleLanguage`]
//! is a branch for one (video, language) pair and every
//! [`version::SubtitleVersion`] is an immutable commit on it. Versions may
//! have parents on other branches (translations), and each version carries a
//! [`lineage::Lineage`] summarising its whole ancestry.
//!
//! This crate is deliberately free of HTTP, database and codec dependencies.

pub mod catalog;
pub mod collaborator;
pub mod dag;
pub mod document;
pub mod error;
pub mod guard;
pub mod history;
pub mod language;
pub mod lineage;
pub mod store;
pub mod version;

pub use error::{Classify, Error, ErrorKind, Result};
